use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Segmentation patterns
// ---------------------------------------------------------------------------

static PARAGRAPH_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]["'\u{201D}\u{2019})\]]*(?:\s+|$)"#).unwrap());

static DOUBLE_QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"|\u{201C}([^\u{201C}\u{201D}]+)\u{201D}"#).unwrap());

// Single-quoted spans must be bounded by whitespace/punctuation and at least
// three chars long, so contractions and possessives never match.
static SINGLE_QUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s(\u{2014}])'([^']{3,}?)'(?:[\s).,;:!?\u{2014}]|$)").unwrap());

const SPAN_CONTEXT_CHARS: usize = 80;

// ---------------------------------------------------------------------------
// SourceText
// ---------------------------------------------------------------------------

/// Immutable analysis input: the raw string plus cached segmentations.
///
/// Every detector reads the same paragraph and sentence lists, so positional
/// evidence (paragraph indices) lines up across detectors without any
/// re-segmentation.
#[derive(Debug, Clone)]
pub struct SourceText {
    raw: String,
    paragraphs: Vec<String>,
    sentences: Vec<String>,
    word_count: usize,
}

impl SourceText {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            paragraphs: segment_paragraphs(raw),
            sentences: segment_sentences(raw),
            word_count: raw.split_whitespace().count(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }
}

// ---------------------------------------------------------------------------
// Pure segmentation functions
// ---------------------------------------------------------------------------

/// Split on blank lines, trim, drop empty paragraphs.
pub fn segment_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_SPLIT_RE
        .split(text)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split on terminal punctuation followed by whitespace or end of input.
pub fn segment_sentences(text: &str) -> Vec<String> {
    SENTENCE_END_RE
        .split(text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// A quoted span with a character window of surrounding text.
#[derive(Debug, Clone)]
pub struct QuotedSpan {
    pub quote: String,
    pub context: String,
    pub offset: usize,
}

/// Double-quoted spans (straight or curly) plus single-quoted spans of
/// length >= 3.
pub fn extract_quoted_spans(text: &str) -> Vec<QuotedSpan> {
    let mut spans = Vec::new();

    for caps in DOUBLE_QUOTE_RE.captures_iter(text) {
        let inner = caps.get(1).or_else(|| caps.get(2));
        if let (Some(m), Some(full)) = (inner, caps.get(0)) {
            let quote = m.as_str().trim().to_string();
            if quote.is_empty() {
                continue;
            }
            spans.push(QuotedSpan {
                quote,
                context: char_window(text, full.start(), full.end(), SPAN_CONTEXT_CHARS),
                offset: full.start(),
            });
        }
    }

    for caps in SINGLE_QUOTE_RE.captures_iter(text) {
        if let (Some(m), Some(full)) = (caps.get(1), caps.get(0)) {
            spans.push(QuotedSpan {
                quote: m.as_str().trim().to_string(),
                context: char_window(text, full.start(), full.end(), SPAN_CONTEXT_CHARS),
                offset: full.start(),
            });
        }
    }

    spans.sort_by_key(|s| s.offset);
    spans
}

/// The sentence containing `char_index` plus `sentence_radius` sentences on
/// each side, joined with single spaces.
pub fn context_window(text: &str, char_index: usize, sentence_radius: usize) -> String {
    let spans = sentence_spans(text);
    if spans.is_empty() {
        return text.trim().to_string();
    }

    let idx = spans
        .iter()
        .position(|&(start, end)| char_index >= start && char_index < end)
        .unwrap_or_else(|| if char_index >= text.len() { spans.len() - 1 } else { 0 });

    let lo = idx.saturating_sub(sentence_radius);
    let hi = std::cmp::min(spans.len(), idx + sentence_radius + 1);

    spans[lo..hi]
        .iter()
        .map(|&(start, end)| text[start..end].trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    for m in SENTENCE_END_RE.find_iter(text) {
        if m.end() > start {
            spans.push((start, m.end()));
        }
        start = m.end();
    }
    if start < text.len() {
        spans.push((start, text.len()));
    }
    spans
}

/// A flat character window around [start, end), snapped to char boundaries,
/// with newlines collapsed and ellipses marking truncation.
pub fn char_window(text: &str, start: usize, end: usize, width: usize) -> String {
    let mid = (start + end) / 2;
    let half = width / 2;
    let ctx_start = snap_to_char_boundary(text, mid.saturating_sub(half), false);
    let ctx_end = snap_to_char_boundary(text, std::cmp::min(text.len(), mid + half), true);

    let snippet = text[ctx_start..ctx_end].replace('\n', " ");
    let prefix = if ctx_start > 0 { "..." } else { "" };
    let suffix = if ctx_end < text.len() { "..." } else { "" };
    format!("{prefix}{snippet}{suffix}")
}

fn snap_to_char_boundary(text: &str, pos: usize, forward: bool) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    if forward {
        while p < text.len() && !text.is_char_boundary(p) {
            p += 1;
        }
    } else {
        while p > 0 && !text.is_char_boundary(p) {
            p -= 1;
        }
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_drop_empties() {
        let paras = segment_paragraphs("First.\n\n\n\nSecond.\n\n   \n\nThird.");
        assert_eq!(paras, vec!["First.", "Second.", "Third."]);
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let sents = segment_sentences("I ran. Did I win? Yes! The end");
        assert_eq!(sents, vec!["I ran", "Did I win", "Yes", "The end"]);
    }

    #[test]
    fn contractions_are_not_quotes() {
        let spans = extract_quoted_spans("I can't say it. She said, \"go home.\"");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].quote, "go home.");
    }

    #[test]
    fn single_quoted_phrase_is_captured() {
        let spans = extract_quoted_spans("He called it 'the long walk' and laughed.");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].quote, "the long walk");
    }

    #[test]
    fn context_window_spans_neighbors() {
        let text = "One here. Two here. Three here. Four here. Five here.";
        let idx = text.find("Three").unwrap();
        let window = context_window(text, idx, 1);
        assert!(window.contains("Two here"));
        assert!(window.contains("Three here"));
        assert!(window.contains("Four here"));
        assert!(!window.contains("Five"));
    }

    #[test]
    fn char_window_survives_multibyte() {
        let text = "préamble — “quoted” — afterward";
        let w = char_window(text, 5, 9, 10);
        assert!(!w.is_empty());
    }
}
