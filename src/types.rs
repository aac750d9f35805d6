//! Core value types passed between pipeline stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::PipelineError;

/// Subject of a run. Trimmed, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PipelineError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PipelineError::InvalidTopic("Topic is required".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase with spaces removed, for hashtags.
    pub fn slug(&self) -> String {
        self.0.to_lowercase().replace(' ', "")
    }

    /// Topic as a file-name component; anything outside `[A-Za-z0-9_-]` becomes `_`.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Topic {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::new(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

/// Where a piece of generated text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Backend,
    Fallback,
}

/// Script text produced for a topic. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGeneratedText")]
pub struct GeneratedText {
    body: String,
    source: TextSource,
}

#[derive(Deserialize)]
struct RawGeneratedText {
    body: String,
    source: TextSource,
}

impl TryFrom<RawGeneratedText> for GeneratedText {
    type Error = String;

    fn try_from(raw: RawGeneratedText) -> Result<Self, Self::Error> {
        GeneratedText::new(raw.body, raw.source)
            .ok_or_else(|| "generated text must not be blank".to_string())
    }
}

impl GeneratedText {
    /// Returns `None` for blank text.
    pub fn new(body: impl Into<String>, source: TextSource) -> Option<Self> {
        let body = body.into();
        if body.trim().is_empty() {
            None
        } else {
            Some(Self { body, source })
        }
    }

    /// Fallback scripts always embed the topic and fixed text.
    pub(crate) fn fallback(body: String) -> Self {
        Self {
            body,
            source: TextSource::Fallback,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    pub fn source(&self) -> TextSource {
        self.source
    }

    pub fn is_fallback(&self) -> bool {
        self.source == TextSource::Fallback
    }
}

/// One `[IMAGE_PROMPT: ...]` marker, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePrompt {
    /// Zero-based position among the extracted prompts
    pub index: usize,
    pub description: String,
}

impl ImagePrompt {
    /// One-based number used in file names and progress messages.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// A successfully generated image and the file it was written to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub prompt: ImagePrompt,
    pub path: PathBuf,
    /// Name of the backend that produced the image
    pub backend: String,
    /// Size of the written file
    pub bytes: usize,
    /// Image bytes; emptied once a finished run is parked in a progress store
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl ImageAsset {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn size(&self) -> usize {
        self.bytes
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("prompt", &self.prompt)
            .field("path", &self.path)
            .field("backend", &self.backend)
            .field("bytes", &self.bytes)
            .finish()
    }
}
