//! Error types for resource pools and connector registries.

use thiserror::Error;

/// Errors returned by [`ResourcePool`](crate::ResourcePool) and
/// [`ConnectorRegistry`](crate::ConnectorRegistry).
///
/// `E` is the error type of the creator callback. Creation failures are
/// surfaced to the caller of `get` unchanged and are never cached.
#[derive(Debug, Error)]
pub enum PoolError<E> {
    /// The creator callback failed for the given key.
    #[error("failed to create resource for {key}: {source}")]
    Creation {
        /// Debug rendering of the key that was being created.
        key: String,
        /// The error returned by the creator.
        #[source]
        source: E,
    },

    /// Connector options were rejected at registration time.
    #[error("invalid options for connector '{name}': {reason}")]
    InvalidOptions {
        /// The connector name.
        name: String,
        /// Why the options were rejected.
        reason: String,
    },

    /// No options were registered under the requested connector name.
    #[error("connector not registered: {name}")]
    UnknownConnector {
        /// The connector name that was requested.
        name: String,
    },
}

impl<E> PoolError<E> {
    /// Returns true if this error came from the creator callback.
    #[must_use]
    pub const fn is_creation(&self) -> bool {
        matches!(self, Self::Creation { .. })
    }
}

impl<E> PoolError<PoolError<E>> {
    /// Collapses a pool error whose creator itself returns pool errors.
    ///
    /// Registries run their factories behind an inner pool; the inner
    /// error is what callers care about.
    #[must_use]
    pub fn flatten(self) -> PoolError<E> {
        match self {
            Self::Creation { source, .. } => source,
            Self::InvalidOptions { name, reason } => PoolError::InvalidOptions { name, reason },
            Self::UnknownConnector { name } => PoolError::UnknownConnector { name },
        }
    }
}

/// Result type for pool operations.
pub type PoolResult<T, E> = Result<T, PoolError<E>>;
