//! Image prompt extraction from `[IMAGE_PROMPT: ...]` markers.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::ImagePrompt;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    // `.` stops at newlines: a marker lives on one line, the text may have many.
    MARKER.get_or_init(|| Regex::new(r"(?i)\[IMAGE_PROMPT:\s*(.*?)\]").expect("Valid marker regex"))
}

/// All image prompts in document order. Duplicates are kept; no markers gives an
/// empty list.
pub fn extract_prompts(text: &str) -> Vec<ImagePrompt> {
    marker_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .enumerate()
        .map(|(index, description)| ImagePrompt {
            index,
            description: description.as_str().trim().to_string(),
        })
        .collect()
}

/// Text with every marker removed, for display.
pub fn strip_markers(text: &str) -> String {
    marker_regex().replace_all(text, "").into_owned()
}
