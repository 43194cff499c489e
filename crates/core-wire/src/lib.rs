//! Wire client for the word prediction backend (JSON over HTTP).
//!
//! Stateless: every call serializes one request and parses one response. Retry, sequencing and
//! reconciliation belong to `core-generation`; this crate only reports success or a
//! `WireError`. Non-2xx statuses are errors even when the body would parse.

mod client;
mod error;
mod types;

pub use client::{HttpPredictionClient, PredictionService};
pub use error::{FailureKind, WireError};
pub use types::{
    CacheSnapshot, PredictionRequest, PredictionResponse, ResetBranchRequest,
    ResetBranchResponse, WireChatMessage,
};
