//! Email drafts for a finished run.
//!
//! Only the message is built here: addresses, subject, an HTML body that points
//! at inline images through `cid:` references, and the inline parts themselves.
//! Sending is left to whoever picks the draft up.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{Credentials, DeliveryConfig};
use crate::content::ContentSections;
use crate::pipeline::RunResult;

/// Addresses and subject line for drafts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSettings {
    pub sender: Option<String>,
    pub recipients: Vec<String>,
    pub subject_prefix: String,
}

impl EmailSettings {
    /// Config values win; the environment fills in what config leaves empty.
    pub fn resolve(config: &DeliveryConfig, credentials: &Credentials) -> Self {
        let recipients = if config.recipients.is_empty() {
            credentials.recipients.clone()
        } else {
            config.recipients.clone()
        };
        Self {
            sender: config.sender.clone().or_else(|| credentials.sender_email.clone()),
            recipients,
            subject_prefix: config.subject_prefix.clone(),
        }
    }
}

/// An image attached inline and referenced as `cid:{content_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineImage {
    pub content_id: String,
    pub path: PathBuf,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailDraft {
    pub from: Option<String>,
    pub to: Vec<String>,
    pub subject: String,
    #[serde(skip)]
    pub html: String,
    pub inline_images: Vec<InlineImage>,
}

impl EmailDraft {
    pub fn from_run(result: &RunResult, settings: &EmailSettings) -> Self {
        let sections = ContentSections::parse(result.text.as_str());
        let inline_images = result
            .images
            .iter()
            .enumerate()
            .map(|(i, asset)| InlineImage {
                content_id: format!("image{}", i + 1),
                path: asset.path.clone(),
                bytes: asset.size(),
            })
            .collect::<Vec<_>>();

        let html = render_html(
            result.topic.as_str(),
            &sections,
            &inline_images,
            result.generated_at,
        );

        Self {
            from: settings.sender.clone(),
            to: settings.recipients.clone(),
            subject: format!("{}: {}", settings.subject_prefix, result.topic),
            html,
            inline_images,
        }
    }

    pub fn has_recipients(&self) -> bool {
        !self.to.is_empty()
    }
}

fn render_html(
    topic: &str,
    sections: &ContentSections,
    images: &[InlineImage],
    generated_at: DateTime<Utc>,
) -> String {
    let mut image_blocks = String::new();
    for (i, image) in images.iter().enumerate() {
        image_blocks.push_str(&format!(
            "<div class=\"image\"><h4>Generated Image {n}:</h4>\
             <img src=\"cid:{cid}\" alt=\"YouTube Shorts Image {n}\"></div>\n",
            n = i + 1,
            cid = image.content_id,
        ));
    }

    format!(
        "<!DOCTYPE html>
<html>
<head><meta charset=\"utf-8\"><title>{topic}</title></head>
<body>
<h1>🎬 YouTube Shorts Content Generated</h1>
<h2>Topic: {topic}</h2>
<p class=\"timestamp\"><strong>Generated on:</strong> {generated}</p>
<div class=\"section script\"><h2>🧠 Video Script &amp; Facts</h2><pre>{script}</pre></div>
<div class=\"section title\"><h2>🎬 YouTube Title</h2><pre>{title}</pre></div>
<div class=\"section description\"><h2>📄 Video Description</h2><pre>{description}</pre></div>
<div class=\"section hashtags\"><h2>🏷️ Tags &amp; Hashtags</h2><pre>{hashtags}</pre></div>
<div class=\"section images\"><h2>🖼️ Generated Images for Video</h2>
{images}</div>
</body>
</html>
",
        topic = escape_html(topic),
        generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
        script = escape_html(&sections.script),
        title = escape_html(&sections.title),
        description = escape_html(&sections.description),
        hashtags = escape_html(&sections.hashtags),
        images = image_blocks,
    )
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
