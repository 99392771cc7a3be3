//! Small string helpers used by the extractors.

/// Words that show up after "I'm", "from", "at" and friends but are never
/// part of a person or company name.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "here", "there", "this", "that", "it", "just", "not", "so", "very",
    "really", "also", "still", "now", "currently", "looking", "trying", "interested", "curious",
    "wondering", "new", "from", "at", "with", "for", "in", "on", "of", "and", "or", "but", "to",
    "i", "im", "me", "my", "we", "our", "us", "you", "your", "hi", "hello", "hey", "thanks",
    "thank", "ok", "okay", "yes", "no", "sure", "fine", "good", "great", "well", "glad",
    "happy", "sorry", "going", "working", "calling", "reaching", "home", "work", "least",
    "moment", "all", "some", "any", "what", "how", "why", "when", "who", "which", "is", "are",
    "was", "be", "been", "evaluating", "considering", "responsible", "in-charge", "based",
];

/// True when `word` (any casing, surrounding punctuation ignored) is a stopword.
#[must_use]
pub fn is_stopword(word: &str) -> bool {
    let cleaned = word
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
        .to_lowercase()
        .replace('\'', "");
    cleaned.is_empty() || STOPWORDS.contains(&cleaned.as_str())
}

/// Re-case each whitespace-separated word as `Xxxx`, keeping hyphen and
/// apostrophe boundaries (`o'brien-smith` → `O'Brien-Smith`).
#[must_use]
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut capitalize_next = true;
    for c in word.chars() {
        if capitalize_next {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        capitalize_next = c == '-' || c == '\'';
    }
    out
}

/// Lowercase and collapse whitespace; the form all keyword matching runs on.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when any keyword occurs in `haystack` on word boundaries.
///
/// `haystack` is expected to be [`normalize`]d. Keywords may span several
/// words ("soc 2") and may carry their own punctuation.
#[must_use]
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    let bytes = haystack.as_bytes();
    haystack.match_indices(keyword).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = start == 0 || !is_word_byte(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_word_byte(bytes[end]);
        before_ok && after_ok
    })
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
