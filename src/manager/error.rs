use thiserror::Error;

use crate::engine::EngineError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The coordinator task is gone (shutdown or panic); callers treat this
    /// as the manager being unavailable, not as a record-level failure.
    #[error("download manager unavailable")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, ManagerError>;

/// Guidance substituted for the provider age-gate failure.
pub const AGE_GATE_GUIDANCE: &str = "This video requires authentication. Please add your \
    YouTube cookies in the Settings > Authentication section to download age-restricted content.";

const AGE_GATE_PHRASE: &str = "Sign in to confirm your age";

/// Rewrite known provider-specific failures into actionable user messages;
/// everything else passes through verbatim.
pub fn sanitize_engine_message(url: &str, message: &str) -> String {
    if message.contains(AGE_GATE_PHRASE)
        && (url.to_lowercase().contains("youtube") || message.contains("[youtube]"))
    {
        AGE_GATE_GUIDANCE.to_string()
    } else {
        message.to_string()
    }
}
