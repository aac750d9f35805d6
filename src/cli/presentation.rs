//! CLI presentation: text formatters for run summaries, prompt lists and the
//! environment check.

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::{CredentialStatus, HUGGING_FACE_TOKEN};
use crate::delivery::DeliveryReceipt;
use crate::pipeline::RunResult;
use crate::types::ImagePrompt;

/// Summary of a delivered run: header, image table, bundle location.
pub fn format_run_summary(result: &RunResult, receipt: &DeliveryReceipt, kept: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} Successfully generated content for '{}'!\n",
        "✅".green(),
        result.topic
    ));
    out.push_str(&format!("Run: {}\n", result.run_id));
    if result.text.is_fallback() {
        out.push_str(&format!(
            "{}\n",
            "Text backend unavailable; used the offline script.".yellow()
        ));
    }
    out.push_str(&format!(
        "Images: {} of {} prompts\n",
        result.images.len(),
        result.prompts.len()
    ));

    if !result.images.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["#", "Prompt", "Backend", "Bytes", "File"]);
        for asset in &result.images {
            table.add_row(vec![
                asset.prompt.number().to_string(),
                truncate(&asset.prompt.description, 48),
                asset.backend.clone(),
                asset.size().to_string(),
                asset.file_name(),
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push_str(&format!("Bundle: {}\n", receipt.location.display()));
    if receipt.recipients.is_empty() {
        out.push_str("Recipients: none configured\n");
    } else {
        out.push_str(&format!("Recipients: {}\n", receipt.recipients.join(", ")));
    }
    if kept {
        out.push_str(&format!("Run files kept in {}", result.run_dir.display()));
    } else {
        out.push_str("Run files cleaned up");
    }
    out
}

pub fn format_prompts_text(prompts: &[ImagePrompt]) -> String {
    if prompts.is_empty() {
        return "No image prompts found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Prompt"]);
    for prompt in prompts {
        table.add_row(vec![prompt.number().to_string(), prompt.description.clone()]);
    }
    format!("{} image prompts\n{}", prompts.len(), table)
}

/// Environment check for `shortsmith check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub workspace: PathBuf,
    pub config_file: Option<PathBuf>,
    pub dotenv: Option<PathBuf>,
    pub credentials: Vec<CredentialStatus>,
    pub config_errors: Vec<String>,
    /// `None` when the text backend is disabled
    pub text_endpoint: Option<String>,
    pub image_backends: Vec<String>,
}

impl CheckReport {
    /// Runs can start: the token is present and the configuration is valid.
    pub fn is_ready(&self) -> bool {
        self.config_errors.is_empty()
            && self
                .credentials
                .iter()
                .any(|c| c.name == HUGGING_FACE_TOKEN && c.value.is_some())
    }
}

pub fn format_check_report(report: &CheckReport) -> String {
    let mut out = String::new();
    out.push_str("🔍 Environment check\n");
    out.push_str(&format!("Workspace: {}\n", report.workspace.display()));
    out.push_str(&format!(
        "Config file: {}\n",
        report
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(layered defaults)".to_string())
    ));
    out.push_str(&format!(
        ".env: {}\n\n",
        report
            .dotenv
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not found".to_string())
    ));

    for status in &report.credentials {
        match &status.value {
            Some(value) => out.push_str(&format!("{} {}: {}\n", "✅".green(), status.name, value)),
            None => out.push_str(&format!("{} {}: not set\n", "❌".red(), status.name)),
        }
    }

    out.push('\n');
    match &report.text_endpoint {
        Some(endpoint) => out.push_str(&format!("Text backend: {}\n", endpoint)),
        None => out.push_str("Text backend: disabled (offline script)\n"),
    }
    out.push_str(&format!("Image backends ({}):\n", report.image_backends.len()));
    for (i, name) in report.image_backends.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, name));
    }

    if !report.config_errors.is_empty() {
        out.push('\n');
        for error in &report.config_errors {
            out.push_str(&format!("{} {}\n", "❌".red(), error));
        }
    }

    out.push('\n');
    if report.is_ready() {
        out.push_str(&format!("{}", "Ready to generate.".green()));
    } else {
        out.push_str(&format!("{}", "Not ready: fix the items marked ❌.".red()));
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}
