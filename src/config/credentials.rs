//! Secrets read from the environment, never from config files.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::PipelineError;

pub const HUGGING_FACE_TOKEN: &str = "HUGGING_FACE_TOKEN";
pub const SENDER_EMAIL: &str = "SENDER_EMAIL";
pub const SENDER_APP_PASSWORD: &str = "SENDER_APP_PASSWORD";
pub const RECIPIENT_EMAILS: &str = "RECIPIENT_EMAILS";
pub const RECIPIENT_EMAIL: &str = "RECIPIENT_EMAIL";

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub hugging_face_token: Option<String>,
    pub sender_email: Option<String>,
    pub sender_app_password: Option<String>,
    pub recipients: Vec<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("hugging_face_token", &self.hugging_face_token.as_deref().map(mask_secret))
            .field("sender_email", &self.sender_email)
            .field("sender_app_password", &self.sender_app_password.as_deref().map(mask_secret))
            .field("recipients", &self.recipients)
            .finish()
    }
}

/// One row of the credential report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub name: &'static str,
    /// Display value, masked for secrets; `None` when unset
    pub value: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset. `RECIPIENT_EMAILS`
    /// is comma separated; `RECIPIENT_EMAIL` is used only when it is absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let recipients = match get(RECIPIENT_EMAILS) {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_string)
                .collect(),
            None => get(RECIPIENT_EMAIL).into_iter().collect(),
        };

        Self {
            hugging_face_token: get(HUGGING_FACE_TOKEN),
            sender_email: get(SENDER_EMAIL),
            sender_app_password: get(SENDER_APP_PASSWORD),
            recipients,
        }
    }

    /// The backend token; runs cannot start without it.
    pub fn require_token(&self) -> Result<&str, PipelineError> {
        self.hugging_face_token.as_deref().ok_or_else(|| {
            PipelineError::Config(format!("{} is not set", HUGGING_FACE_TOKEN))
        })
    }

    /// Every known variable with a display value.
    pub fn report(&self) -> Vec<CredentialStatus> {
        let recipients = if self.recipients.is_empty() {
            None
        } else {
            Some(self.recipients.join(", "))
        };
        vec![
            CredentialStatus {
                name: HUGGING_FACE_TOKEN,
                value: self.hugging_face_token.as_deref().map(mask_secret),
            },
            CredentialStatus {
                name: SENDER_EMAIL,
                value: self.sender_email.clone(),
            },
            CredentialStatus {
                name: SENDER_APP_PASSWORD,
                value: self.sender_app_password.as_deref().map(mask_secret),
            },
            CredentialStatus {
                name: RECIPIENT_EMAILS,
                value: recipients,
            },
        ]
    }
}

/// First eight characters then `...`; short values become `***`.
pub fn mask_secret(value: &str) -> String {
    if value.chars().count() > 8 {
        let head: String = value.chars().take(8).collect();
        format!("{}...", head)
    } else {
        "***".to_string()
    }
}

/// Load `<workspace>/.env`, falling back to a `.env` found from the current
/// directory upward. Existing variables are not overwritten.
pub fn load_dotenv(workspace_root: &Path) -> Option<PathBuf> {
    let local = workspace_root.join(".env");
    if local.exists() {
        match dotenvy::from_path(&local) {
            Ok(()) => return Some(local),
            Err(err) => debug!(path = %local.display(), error = %err, "Failed to load .env"),
        }
    }
    dotenvy::dotenv().ok()
}
