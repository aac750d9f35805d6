//! Splitting generated text into the parts a video upload needs.

use serde::{Deserialize, Serialize};

use crate::generation::strip_markers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Script,
    Title,
    Description,
    Hashtags,
}

impl Section {
    /// Section a heading line opens, if it is one.
    fn heading(line: &str) -> Option<Section> {
        if line.contains('🎬') || line.contains("YOUTUBE SHORTS TITLE") {
            Some(Section::Title)
        } else if line.contains('📄') || line.contains("VIDEO DESCRIPTION") {
            Some(Section::Description)
        } else if line.contains('🏷') || line.contains("META TAGS") || line.contains("HASHTAGS") {
            Some(Section::Hashtags)
        } else {
            None
        }
    }
}

/// Script, title, description and hashtags of a generated text. Text with no
/// headings is all script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSections {
    pub script: String,
    pub title: String,
    pub description: String,
    pub hashtags: String,
}

impl ContentSections {
    /// Heading lines are dropped, as are blank lines. Image prompt markers are
    /// removed from the script.
    pub fn parse(text: &str) -> Self {
        let mut sections = ContentSections::default();
        let mut current = Section::Script;

        for line in text.lines() {
            if let Some(next) = Section::heading(line) {
                current = next;
                continue;
            }
            let line = if current == Section::Script {
                strip_markers(line)
            } else {
                line.to_string()
            };
            if line.trim().is_empty() {
                continue;
            }
            let target = match current {
                Section::Script => &mut sections.script,
                Section::Title => &mut sections.title,
                Section::Description => &mut sections.description,
                Section::Hashtags => &mut sections.hashtags,
            };
            target.push_str(line.trim_end());
            target.push('\n');
        }

        for part in [
            &mut sections.script,
            &mut sections.title,
            &mut sections.description,
            &mut sections.hashtags,
        ] {
            let trimmed = part.trim().to_string();
            *part = trimmed;
        }
        sections
    }

    /// Title without surrounding quotes.
    pub fn clean_title(&self) -> &str {
        self.title.trim().trim_matches('"')
    }

    /// Individual `#tags` in order.
    pub fn tags(&self) -> Vec<&str> {
        self.hashtags
            .split_whitespace()
            .filter(|word| word.starts_with('#') && word.len() > 1)
            .collect()
    }
}
