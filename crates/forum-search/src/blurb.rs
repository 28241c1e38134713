//! Contextual excerpts for post results.

use regex::RegexBuilder;

/// Default excerpt length in characters.
pub const DEFAULT_BLURB_LENGTH: usize = 200;

/// Produces a short excerpt of a body around the first match of a term.
///
/// The term's words are located in sequence first, then the earliest single
/// word, each matched case-insensitively as whole words. The window is `length` characters (or the match length if longer), centered
/// on the match and shifted to stay inside the body. With no match the
/// excerpt is taken from the start. The result is always a trimmed
/// substring of the body.
#[derive(Debug, Clone, Copy)]
pub struct BlurbGenerator {
    length: usize,
}

impl Default for BlurbGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BLURB_LENGTH)
    }
}

impl BlurbGenerator {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn generate(&self, body: &str, term: &str) -> String {
        let chars: Vec<usize> = body.char_indices().map(|(offset, _)| offset).collect();
        let total = chars.len();

        let (match_start, match_len) = match locate(body, term) {
            Some((start, end)) => (body[..start].chars().count(), body[start..end].chars().count()),
            None => (0, 0),
        };

        let window = self.length.max(match_len);
        if total <= window {
            return body.trim().to_string();
        }

        let lead = (window - match_len) / 2;
        let end = (match_start.saturating_sub(lead) + window).min(total);
        let start = end - window;

        let byte_start = chars[start];
        let byte_end = if end == total { body.len() } else { chars[end] };
        body[byte_start..byte_end].trim().to_string()
    }
}

/// Characters that separate index tokens.
const SEPARATOR: &str = r"[^\p{L}\p{N}]";

/// Byte range of the first match: the term's words in sequence, else the
/// earliest single word.
///
/// Words are the alphanumeric runs of the term, the same units the index
/// matches on, so quotes and punctuation in the term never prevent a match.
fn locate(body: &str, term: &str) -> Option<(usize, usize)> {
    let words: Vec<String> = term
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    if words.is_empty() {
        return None;
    }

    let sequence = words.join(&format!("{}+", SEPARATOR));
    find_word(body, &sequence).or_else(|| find_word(body, &words.join("|")))
}

/// First match of `pattern` that starts and ends on a word boundary.
fn find_word(body: &str, pattern: &str) -> Option<(usize, usize)> {
    let bounded = format!(
        "(?:^|{sep})({pattern})(?:{sep}|$)",
        sep = SEPARATOR,
        pattern = pattern
    );
    let re = RegexBuilder::new(&bounded)
        .case_insensitive(true)
        .build()
        .ok()?;
    re.captures(body)
        .and_then(|caps| caps.get(1))
        .map(|found| (found.start(), found.end()))
}
