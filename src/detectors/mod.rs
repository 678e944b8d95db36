pub mod dialogue;
pub mod elite;
pub mod interiority;
pub mod literary;
pub mod scene;

use serde::Serialize;

/// A literal excerpt backing a detector claim. Every asserted pattern carries
/// one of these; only pure statistics (sentence-length counts and the like)
/// are exempt.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Excerpt {
    pub text: String,
    pub paragraph: usize,
}

impl Excerpt {
    pub fn new(text: impl Into<String>, paragraph: usize) -> Self {
        Self {
            text: text.into(),
            paragraph,
        }
    }
}

/// The joined output of all five detectors, handed to the scorer as one
/// bundle and embedded verbatim in the final report.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DetectorOutputs {
    pub scene: scene::SceneSignals,
    pub dialogue: dialogue::DialogueSignals,
    pub interiority: interiority::InterioritySignals,
    pub elite_patterns: elite::ElitePatternSignals,
    pub literary: literary::LiterarySignals,
}

/// Map a byte offset in the raw text to the index of the paragraph that
/// contains it. Paragraphs are trimmed copies, so this walks them in order
/// and relocates each one in the raw string.
pub(crate) fn paragraph_index_at(text: &crate::text::SourceText, offset: usize) -> usize {
    let raw = text.raw();
    let mut cursor = 0usize;
    for (idx, paragraph) in text.paragraphs().iter().enumerate() {
        if let Some(pos) = raw[cursor..].find(paragraph.as_str()) {
            let start = cursor + pos;
            let end = start + paragraph.len();
            if offset < end {
                return idx;
            }
            cursor = end;
        }
    }
    text.paragraphs().len().saturating_sub(1)
}

/// Truncate an excerpt candidate to a displayable length without splitting a
/// char.
pub(crate) fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    format!("{}...", clipped.trim_end())
}
