//! Error handling for the portsweep scanner
//!
//! Only precondition failures surface as errors. Anything that goes wrong
//! while talking to an individual port is folded into [`PortState::Closed`]
//! by the probe and never reaches this type.
//!
//! [`PortState::Closed`]: crate::network::PortState::Closed

use thiserror::Error;

/// Main error type for scanning operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanError {
    /// The target could not be turned into an IPv4 address.
    #[error("Failed to resolve hostname '{host}': {reason}")]
    UnresolvableHost { host: String, reason: String },

    /// A port specification token or range was rejected. Carries the token.
    #[error("Invalid port specification: {0}")]
    InvalidPortSpec(String),

    #[error("Timeout must be greater than 0 (got {0})")]
    InvalidTimeout(f64),

    /// The caller cancelled the scan before every probe was issued.
    #[error("Scan interrupted after {completed} of {total} ports")]
    Interrupted { completed: usize, total: usize },
}

impl ScanError {
    pub(crate) fn unresolvable(host: impl Into<String>, reason: impl ToString) -> Self {
        ScanError::UnresolvableHost {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised before any network I/O took place.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidPortSpec(_) | ScanError::InvalidTimeout(_)
        )
    }
}

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;
