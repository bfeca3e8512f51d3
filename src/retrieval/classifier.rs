//! Greeting detection
//!
//! A substring heuristic, not an NLP classifier. Longer questions that merely
//! contain a greeting word ("which algorithm ...") are classified as greetings;
//! that behavior is kept as-is for compatibility.

/// Phrases that mark a message as a greeting wherever they appear
const GREETING_PHRASES: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "how are you",
    "good morning",
    "good afternoon",
    "good evening",
    "what's up",
    "sup",
];

/// Whole-message greetings for very short inputs
const SHORT_GREETINGS: &[&str] = &["hi", "hello", "hey", "yo"];

/// Maximum word count for the whole-message check
const SHORT_GREETING_MAX_WORDS: usize = 3;

/// True when `text` looks like a conversational opener
pub fn is_greeting(text: &str) -> bool {
    let normalized = text.trim().to_lowercase();

    if GREETING_PHRASES
        .iter()
        .any(|phrase| normalized.contains(phrase))
    {
        return true;
    }

    text.split_whitespace().count() <= SHORT_GREETING_MAX_WORDS
        && SHORT_GREETINGS.contains(&normalized.as_str())
}
