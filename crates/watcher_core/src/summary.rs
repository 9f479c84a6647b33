use serde::{Deserialize, Serialize};

use crate::text::{split_sentences, truncate_chars};

/// Upper bound on summary length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthBound {
    Sentences(usize),
    Chars(usize),
}

impl LengthBound {
    pub fn fits(&self, text: &str) -> bool {
        match *self {
            LengthBound::Sentences(max) => split_sentences(text).len() <= max,
            LengthBound::Chars(max) => text.chars().count() <= max,
        }
    }

    /// Cuts `text` down to the bound. Text that already fits is returned as-is.
    pub fn truncate(&self, text: &str) -> String {
        if self.fits(text) {
            return text.to_string();
        }
        match *self {
            LengthBound::Sentences(max) => split_sentences(text)
                .into_iter()
                .take(max)
                .collect::<Vec<_>>()
                .join(" "),
            LengthBound::Chars(max) => truncate_chars(text, max),
        }
    }
}

impl Default for LengthBound {
    fn default() -> Self {
        LengthBound::Sentences(3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// Produced by a summarization strategy.
    Summarized,
    /// Input was trivial and passed through untouched.
    Unchanged,
    /// The strategy failed; this is the raw body cut to the bound.
    RawFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    text: String,
    bound: LengthBound,
    source: SummarySource,
}

impl Summary {
    /// Builds a summary, truncating `text` if it exceeds `bound`.
    pub fn bounded(text: impl Into<String>, bound: LengthBound, source: SummarySource) -> Self {
        let text = text.into();
        let text = if bound.fits(&text) {
            text
        } else {
            bound.truncate(&text)
        };
        Self {
            text,
            bound,
            source,
        }
    }

    /// Trivial input is kept verbatim, even if it exceeds a character bound.
    pub fn unchanged(text: impl Into<String>, bound: LengthBound) -> Self {
        Self {
            text: text.into(),
            bound,
            source: SummarySource::Unchanged,
        }
    }

    pub fn raw_fallback(text: &str, bound: LengthBound) -> Self {
        Self::bounded(text, bound, SummarySource::RawFallback)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bound(&self) -> LengthBound {
        self.bound
    }

    pub fn source(&self) -> SummarySource {
        self.source
    }

    pub fn sentence_count(&self) -> usize {
        split_sentences(&self.text).len()
    }
}
