//! Plain-text helpers shared by the extractor and the summarizers.

/// Appended when text is cut to fit a character bound.
pub const TRUNCATION_MARKER: char = '…';

/// Collapses every run of whitespace into a single space and trims the ends.
pub fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Abbreviations, lowercased and without their final period, that never end
/// a sentence.
const ABBREVIATIONS: &[&str] = &[
    "sec", "secs", "no", "nos", "art", "pt", "u.s", "u.s.c", "mr", "mrs", "ms", "dr", "st", "inc",
    "e.g", "i.e", "v", "vs",
];

/// Words that a section number follows, as in "Section 1." or "Sec. 2.".
const NUMBERED_HEADINGS: &[&str] = &["sec", "secs", "section", "part", "article", "title"];

/// Splits text into sentences. A sentence ends at `.`, `!` or `?` followed by
/// whitespace or the end of input; terminators stay with their sentence.
/// A period after a known abbreviation or a heading number does not end one,
/// so "Sec. 2. Policy." stays whole.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars
            .peek()
            .map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary && !(ch == '.' && period_continues(&text[start..idx])) {
            let end = idx + ch.len_utf8();
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

/// True when the word right before a period is an abbreviation or a heading
/// number. `before` is the sentence so far, without the period.
fn period_continues(before: &str) -> bool {
    let mut words = before.split_whitespace().rev();
    let Some(word) = words.next() else {
        return false;
    };
    let word = word
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if ABBREVIATIONS.contains(&word.as_str()) {
        return true;
    }
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    words.next().is_some_and(|previous| {
        let previous = previous.trim_end_matches('.').to_lowercase();
        NUMBERED_HEADINGS.contains(&previous.as_str())
    })
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

/// Cuts `text` to at most `max_chars` characters, replacing the tail with
/// [`TRUNCATION_MARKER`] when anything was removed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut kept: String = text.chars().take(max_chars - 1).collect();
    let trimmed_len = kept.trim_end().len();
    kept.truncate(trimmed_len);
    kept.push(TRUNCATION_MARKER);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_internal_whitespace() {
        assert_eq!(normalize_whitespace("  a\n\tb   c "), "a b c");
    }

    #[test]
    fn splits_on_terminators_followed_by_space() {
        let text = "First one. Second one!  Third? Version 1.5 stays whole.";
        assert_eq!(
            split_sentences(text),
            vec!["First one.", "Second one!", "Third?", "Version 1.5 stays whole."]
        );
    }

    #[test]
    fn headings_and_abbreviations_do_not_split() {
        let text = "Section 1. Purpose. Agencies act. Sec. 2. Policy. The U.S. Code applies. See No. 5 below.";
        assert_eq!(
            split_sentences(text),
            vec![
                "Section 1. Purpose.",
                "Agencies act.",
                "Sec. 2. Policy.",
                "The U.S. Code applies.",
                "See No. 5 below."
            ]
        );
    }

    #[test]
    fn numbers_outside_headings_still_end_sentences() {
        assert_eq!(
            split_sentences("Reports are due in 2026. Agencies comply."),
            vec!["Reports are due in 2026.", "Agencies comply."]
        );
    }

    #[test]
    fn trailing_fragment_is_a_sentence() {
        assert_eq!(split_sentences("Done. and more"), vec!["Done.", "and more"]);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "héllo wörld";
        let cut = truncate_chars(text, 6);
        assert!(cut.chars().count() <= 6);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(truncate_chars(text, 50), text);
        assert_eq!(truncate_chars(text, 0), "");
    }
}
