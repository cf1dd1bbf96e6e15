use thiserror::Error;

/// Pipeline-level failures. Only an invalid address aborts an analysis;
/// everything else degrades a single report field instead.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
}

/// Failures of a single upstream source (RPC node, block explorer, or
/// platform API). Callers convert these into absent report fields.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Timeout, non-2xx status, malformed payload, or a chain with no
    /// configured upstream for the requested operation.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    /// The upstream answered but has no matching record.
    #[error("no matching record upstream")]
    NotFound,
}
