//! Request/response bodies exchanged with the prediction backend.
//!
//! Field names are the backend's snake_case JSON keys; the structs serialize verbatim.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireChatMessage {
    pub text: String,
    pub is_user: bool,
}

/// Shared body of `/api/words`, `/api/refresh` and `/api/generate-cache`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub chat_history: Vec<WireChatMessage>,
    pub current_sentence: Vec<String>,
    pub is_sentence_start: bool,
}

impl PredictionRequest {
    pub fn new(
        chat_history: Vec<WireChatMessage>,
        current_sentence: Vec<String>,
        is_sentence_start: bool,
    ) -> Self {
        Self {
            chat_history,
            current_sentence,
            is_sentence_start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub words: Vec<String>,
    #[serde(default)]
    pub cached_words: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_step_predictions: Option<HashMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_step_time_ms: Option<f64>,
}

impl PredictionResponse {
    /// Lookahead latency in whole milliseconds. Zero or negative reports count as absent.
    pub fn latency_ms(&self) -> Option<u64> {
        self.two_step_time_ms
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .map(|ms| ms.round() as u64)
    }

    /// Two-step predictions, or an empty map when the backend sent none.
    pub fn lookahead(&self) -> HashMap<String, Vec<String>> {
        self.two_step_predictions.clone().unwrap_or_default()
    }
}

/// `GET /api/cache` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(default)]
    pub cached_words: Vec<String>,
    #[serde(default)]
    pub used_words: Vec<String>,
}

/// `POST /api/reset-branch` body: the standard context plus the branch's first word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetBranchRequest {
    #[serde(flatten)]
    pub context: PredictionRequest,
    pub first_word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResetBranchResponse {
    pub words: Vec<String>,
}
