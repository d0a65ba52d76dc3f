//! Shared error taxonomy for the workflow engine.
//!
//! DESIGN
//! ======
//! Every module-local error enum derives `thiserror::Error` and implements
//! `ErrorCode` so handlers and logs can key off a stable, grepable code
//! without string-matching the display message.

/// Grepable error code and retryable flag for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// The closed taxonomy of failures a block or the engine can raise.
///
/// `UpstreamFailure` never escapes a block: enrichment blocks absorb it
/// per row and keep going. Every other kind terminates the current block
/// and fails the workflow.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("missing required config key: {0}")]
    ConfigMissing(String),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("file not found: {0}")]
    IoNotFound(String),

    #[error("io failure: {0}")]
    IoFailure(String),

    #[error("empty input frame")]
    EmptyInput,

    #[error("upstream enrichment failure: {0}")]
    UpstreamFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for ExecutionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) => "CONFIG_MISSING",
            Self::ConfigInvalid(_) => "CONFIG_INVALID",
            Self::IoNotFound(_) => "IO_NOT_FOUND",
            Self::IoFailure(_) => "IO_FAILURE",
            Self::EmptyInput => "EMPTY_INPUT",
            Self::UpstreamFailure(_) => "UPSTREAM_FAILURE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::UpstreamFailure(_) | Self::IoFailure(_))
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
