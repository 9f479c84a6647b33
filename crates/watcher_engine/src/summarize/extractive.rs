use std::collections::{HashMap, HashSet};

use watcher_core::text::split_sentences;
use watcher_core::{LengthBound, Summary, SummarySource};
use watcher_logging::watcher_debug;

use super::{passthrough, SummarizationError, Summarizer};

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "being", "but", "by", "can", "could", "do", "does", "each", "for", "from", "had",
    "has", "have", "he", "her", "his", "however", "if", "in", "into", "is", "it", "its", "may",
    "more", "most", "must", "no", "not", "of", "on", "or", "other", "our", "shall", "she", "should",
    "so", "such", "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "those", "through", "to", "under", "upon", "was", "we", "were", "which", "while", "who", "will",
    "with", "would", "you",
];

/// Sentences with fewer content words than this are not candidates.
const MIN_SENTENCE_WORDS: usize = 4;

/// Deterministic sentence ranking by normalized content-word frequency.
/// Picked sentences keep their document order.
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    min_input_words: usize,
    stopwords: HashSet<&'static str>,
}

impl ExtractiveSummarizer {
    pub fn new(min_input_words: usize) -> Self {
        Self {
            min_input_words,
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    fn content_words<'a>(&'a self, sentence: &'a str) -> impl Iterator<Item = String> + 'a {
        sentence
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 1)
            .map(str::to_lowercase)
            .filter(move |w| !self.stopwords.contains(w.as_str()))
    }

    /// Sentence indices ordered best first; ties keep document order.
    ///
    /// Sentences with fewer than [`MIN_SENTENCE_WORDS`] content words are
    /// headings or fragments and are left out, unless nothing else remains.
    /// A score is the summed normalized frequency over the square root of the
    /// content-word count.
    fn rank(&self, sentences: &[&str]) -> Vec<usize> {
        let words: Vec<Vec<String>> = sentences
            .iter()
            .map(|sentence| self.content_words(sentence).collect())
            .collect();

        let mut freq: HashMap<&str, f64> = HashMap::new();
        for word in words.iter().flatten() {
            *freq.entry(word.as_str()).or_insert(0.0) += 1.0;
        }
        let max = freq.values().copied().fold(1.0_f64, f64::max);

        let scores: Vec<f64> = words
            .iter()
            .map(|sentence| {
                if sentence.is_empty() {
                    return 0.0;
                }
                let total: f64 = sentence
                    .iter()
                    .map(|w| freq.get(w.as_str()).copied().unwrap_or(0.0) / max)
                    .sum();
                total / (sentence.len() as f64).sqrt()
            })
            .collect();

        let mut order: Vec<usize> = (0..sentences.len())
            .filter(|&idx| words[idx].len() >= MIN_SENTENCE_WORDS)
            .collect();
        if order.is_empty() {
            order = (0..sentences.len()).collect();
        }
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        order
    }

    fn select(&self, sentences: &[&str], bound: LengthBound) -> Vec<usize> {
        let ranked = self.rank(sentences);
        let mut picked = match bound {
            LengthBound::Sentences(max) => ranked.into_iter().take(max).collect::<Vec<_>>(),
            LengthBound::Chars(max) => {
                let mut used = 0;
                let mut picked = Vec::new();
                for idx in ranked {
                    let len = sentences[idx].chars().count();
                    let extra = if picked.is_empty() { len } else { len + 1 };
                    if used + extra <= max {
                        used += extra;
                        picked.push(idx);
                    }
                }
                picked
            }
        };
        picked.sort_unstable();
        picked
    }
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self::new(40)
    }
}

#[async_trait::async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> &'static str {
        "extractive"
    }

    async fn summarize(
        &self,
        text: &str,
        bound: LengthBound,
    ) -> Result<Summary, SummarizationError> {
        if let Some(summary) = passthrough(text, bound, self.min_input_words) {
            return Ok(summary);
        }

        let sentences = split_sentences(text);
        let picked = self.select(&sentences, bound);
        watcher_debug!(
            "extractive summary picked {} of {} sentence(s)",
            picked.len(),
            sentences.len()
        );

        let joined = if picked.is_empty() {
            // Nothing fits a char bound whole; cut the top sentence instead.
            self.rank(&sentences)
                .first()
                .map(|&idx| sentences[idx].to_string())
                .unwrap_or_default()
        } else {
            picked
                .iter()
                .map(|&idx| sentences[idx])
                .collect::<Vec<_>>()
                .join(" ")
        };
        Ok(Summary::bounded(joined, bound, SummarySource::Summarized))
    }
}
