//! Chat transcript and the sentence under construction.
//!
//! `add_word` is the only way a sentence completes, and it reports completion through its
//! return value; callers drive the grid's mode transition from that value directly.

use core_wire::WireChatMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub is_user: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
        }
    }

    pub fn partner(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
        }
    }
}

impl From<&ChatMessage> for WireChatMessage {
    fn from(msg: &ChatMessage) -> Self {
        WireChatMessage {
            text: msg.text.clone(),
            is_user: msg.is_user,
        }
    }
}

/// True when the last character is `.`, `!` or `?`.
pub fn ends_sentence(word: &str) -> bool {
    matches!(word.chars().last(), Some('.' | '!' | '?'))
}

#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
    current_sentence: Vec<String>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn current_sentence(&self) -> &[String] {
        &self.current_sentence
    }

    /// Append a message from the conversation partner (or any externally produced line).
    pub fn push_message(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
    }

    /// Append `word` to the sentence. Returns true when the word ended the sentence, in which
    /// case the sentence has been committed as a user message and the in-progress list cleared.
    pub fn add_word(&mut self, word: &str) -> bool {
        self.current_sentence.push(word.to_string());
        if !ends_sentence(word) {
            return false;
        }
        let text = self.current_sentence.join(" ");
        self.current_sentence.clear();
        tracing::debug!(
            target: "chat",
            message_len = text.len(),
            messages = self.messages.len() + 1,
            "sentence_committed"
        );
        self.messages.push(ChatMessage::user(text));
        true
    }

    pub fn history(&self) -> Vec<WireChatMessage> {
        self.messages.iter().map(WireChatMessage::from).collect()
    }
}
