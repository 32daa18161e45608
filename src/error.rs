//! Error taxonomy for the tool surface.
//!
//! Only these four kinds fail an operation outright. Partial results
//! (degraded ladders, exhausted upstreams) are reported in-band on the
//! response with a `message`, never as an `Err`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Validation failed: malformed domain/URL, out-of-range integers,
    /// oversized strings.
    #[error("invalid input: {0}")]
    BadInput(String),

    /// Domain token(s) matched no configured site.
    #[error("no configured site matches: {0}")]
    NoMatch(String),

    /// Per-domain sliding window exhausted.
    #[error("rate limit exceeded for {domain}, retry after {retry_after_secs}s")]
    RateLimited { domain: String, retry_after_secs: u64 },

    /// Invariant violation inside the engine.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Stable machine-readable code, used in serialized errors and in
    /// metrics counter names.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::BadInput(_) => "bad_input",
            ToolError::NoMatch(_) => "no_match",
            ToolError::RateLimited { .. } => "rate_limited",
            ToolError::Internal(_) => "internal",
        }
    }
}
