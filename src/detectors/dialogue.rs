use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::detectors::{paragraph_index_at, Excerpt};
use crate::text::{extract_quoted_spans, QuotedSpan, SourceText};

// ---------------------------------------------------------------------------
// Classification lexicons
// ---------------------------------------------------------------------------

static TENSION_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:snapped|shouted|yelled|demanded|hissed|spat|interrupted|slammed",
        r"|accused|warned|argued|glared|refused)\b"
    ))
    .unwrap()
});

static PLOT_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:decided|announced|offered|agreed|asked me to|told (?:me|us) to",
        r"|we need|let's|you should|from now on|starting (?:today|tomorrow))\b"
    ))
    .unwrap()
});

static ATTRIBUTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:said|says|asked|replied|muttered|whispered|murmured|laughed",
        r"|sighed|added|answered|repeated|called|told)\b"
    ))
    .unwrap()
});

static REFUSAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:^|\b)(?:no|not|never|but|can't|cannot|won't|don't|wrong|stop",
        r"|i refuse|you're wrong|that's not)\b"
    ))
    .unwrap()
});

// Spans this close together are treated as an exchange between speakers.
const EXCHANGE_GAP_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// What a quoted span does for the narrative. Only non-decorative spans count
/// toward the dialogue dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteFunction {
    Decorative,
    Characterizing,
    PlotAdvancing,
    TensionBuilding,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedQuote {
    pub quote: String,
    pub function: QuoteFunction,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct DialogueSignals {
    pub has_dialogue: bool,
    pub span_count: usize,
    pub working_count: usize,
    pub has_confrontation: bool,
    pub quotes: Vec<ClassifiedQuote>,
    pub sub_score: f64,
    pub evidence: Vec<Excerpt>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

fn classify(span: &QuotedSpan) -> QuoteFunction {
    if TENSION_CONTEXT_RE.is_match(&span.context) || REFUSAL_RE.is_match(&span.quote) {
        QuoteFunction::TensionBuilding
    } else if PLOT_CONTEXT_RE.is_match(&span.context) || PLOT_CONTEXT_RE.is_match(&span.quote) {
        QuoteFunction::PlotAdvancing
    } else if ATTRIBUTION_RE.is_match(&span.context) && span.quote.split_whitespace().count() >= 3 {
        QuoteFunction::Characterizing
    } else {
        QuoteFunction::Decorative
    }
}

pub fn detect(text: &SourceText) -> DialogueSignals {
    let mut out = DialogueSignals::default();
    let spans = extract_quoted_spans(text.raw());
    out.span_count = spans.len();
    out.has_dialogue = !spans.is_empty();

    for span in &spans {
        let function = classify(span);
        if function != QuoteFunction::Decorative {
            out.working_count += 1;
            out.evidence.push(Excerpt::new(
                span.quote.clone(),
                paragraph_index_at(text, span.offset),
            ));
        }
        out.quotes.push(ClassifiedQuote {
            quote: span.quote.clone(),
            function,
        });
    }

    // Confrontation: a refusal inside one quote with a second speaker's quote
    // close enough to read as the same exchange.
    for pair in spans.windows(2) {
        let gap = pair[1].offset.saturating_sub(pair[0].offset);
        if gap <= EXCHANGE_GAP_CHARS
            && (REFUSAL_RE.is_match(&pair[0].quote) || REFUSAL_RE.is_match(&pair[1].quote))
        {
            out.has_confrontation = true;
            break;
        }
    }

    out.sub_score = (out.working_count as f64 * 3.0).min(6.0);
    if out.has_confrontation {
        out.sub_score = (out.sub_score + 2.0).min(8.0);
    }

    if out.working_count > 0 {
        out.strengths.push(format!(
            "{} quoted line(s) doing narrative work",
            out.working_count
        ));
    }
    if !out.has_dialogue {
        out.gaps
            .push("No quoted speech; a single line of dialogue can ground a key moment".to_string());
    } else if out.working_count == 0 {
        out.gaps
            .push("Quotes present but decorative; give them tension or consequence".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decorative_quote_does_not_count() {
        let text = SourceText::new("The program was called \"Bridge Builders\" by the district.");
        let out = detect(&text);
        assert!(out.has_dialogue);
        assert_eq!(out.working_count, 0);
    }

    #[test]
    fn refusal_across_adjacent_quotes_is_confrontation() {
        let text = SourceText::new(
            "\"You have to sit this one out,\" Coach said. \"No. I can't quit now,\" I said.",
        );
        let out = detect(&text);
        assert!(out.has_confrontation);
        assert!(out.working_count >= 1);
    }
}
