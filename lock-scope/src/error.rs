use std::time::Duration;

use thiserror::Error;

use crate::mode::LockMode;

/// Everything that can go wrong when building a factory or acquiring a scope.
///
/// Only [`AcquisitionTimeout`](LockError::AcquisitionTimeout) is worth
/// retrying as-is; the others describe a caller mistake that a retry will not
/// fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LockError {
    /// The acquisition timeout was zero.
    #[error("invalid lock timeout {timeout:?}: must be greater than zero")]
    InvalidConfiguration { timeout: Duration },

    /// A mode value outside `{Read, Write}` reached a conversion boundary.
    #[error("invalid lock mode `{value}`: expected read or write")]
    InvalidMode { value: String },

    /// The lock a scope was requested from no longer exists.
    #[error("missing {what}: the lock scope factory has been torn down")]
    MissingDependency { what: &'static str },

    /// The bounded wait elapsed before the hold became available.
    #[error("timed out after {timeout:?} waiting for a {mode} lock")]
    AcquisitionTimeout { mode: LockMode, timeout: Duration },
}

impl LockError {
    /// `true` when the same request may succeed if issued again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LockError::AcquisitionTimeout { .. })
    }
}

/// Rejects a zero timeout.
pub(crate) fn validate_timeout(timeout: Duration) -> Result<Duration, LockError> {
    if timeout.is_zero() {
        Err(LockError::InvalidConfiguration { timeout })
    } else {
        Ok(timeout)
    }
}
