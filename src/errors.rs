use thiserror::Error;

/// Errors that cross the pipeline boundary. Tool failures (grep could
/// not run, a group could not be attributed to a file) are recovered
/// inside the search layer as empty results and never surface here.
#[derive(Debug, Error)]
pub enum QaError {
    /// The language-model call failed (network, auth, rate limit).
    #[error("language model call failed: {0}")]
    Service(#[source] anyhow::Error),

    /// The refinement step returned indices that are not integers or
    /// fall outside the result list.
    #[error("invalid result selection: {0}")]
    Selection(String),
}
