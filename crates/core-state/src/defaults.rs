//! Offline word lists, ordered by frequency. Used at startup, after each sentence, and when
//! a refresh is requested without a backend.

use crate::layout::WORD_SLOTS;

pub const SENTENCE_STARTERS: [&str; WORD_SLOTS] = [
    "I", "The", "It", "You", "We", "This", "That", "My", "What", "How", "Can", "Do", "Is", "Are",
    "Would",
];

pub const CONTINUATION_WORDS: [&str; WORD_SLOTS] = [
    "want", "need", "have", "feel", "think", "am", "is", "are", "was", "will", "can", "could",
    "would", "should", "might",
];

pub fn sentence_starters() -> Vec<String> {
    SENTENCE_STARTERS.iter().map(|w| w.to_string()).collect()
}

pub fn continuation_words() -> Vec<String> {
    CONTINUATION_WORDS.iter().map(|w| w.to_string()).collect()
}
