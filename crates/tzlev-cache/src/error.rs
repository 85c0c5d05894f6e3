//! Storage and cache error types.

/// Errors from the underlying key-value store.
///
/// A store error always means infrastructure trouble (connectivity, pool
/// exhaustion, a failed command). A missing key is never a `StoreError`;
/// reads report absence through `Option`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to acquire or create a connection.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// A store command failed after a connection was established.
    #[error("Command failed: {message}")]
    Command {
        /// Description of the command failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Command` error.
    #[must_use]
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_timeout() {
            Self::connection(err.to_string())
        } else {
            Self::command(err.to_string())
        }
    }
}

impl From<deadpool_redis::PoolError> for StoreError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::connection(err.to_string())
    }
}

/// Errors from the cache manager.
///
/// `Miss` is an expected control-flow signal ("fall back to the source of
/// truth"), not a failure; callers should branch on [`CacheError::is_miss`]
/// rather than surfacing it.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The key is not present (or has expired).
    #[error("Cache miss: {key}")]
    Miss {
        /// The logical (un-namespaced) cache key.
        key: String,
    },

    /// The value could not be serialized for storage.
    #[error("Failed to serialize cache value: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// The stored bytes could not be parsed as the requested type.
    #[error("Failed to deserialize cache value: {message}")]
    Deserialization {
        /// Description of the deserialization failure.
        message: String,
    },

    /// The underlying store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CacheError {
    /// Creates a new `Miss` error.
    #[must_use]
    pub fn miss(key: impl Into<String>) -> Self {
        Self::Miss { key: key.into() }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `Deserialization` error.
    #[must_use]
    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::Deserialization {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a cache miss.
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }

    /// Returns `true` if this is a data-integrity error (bad encoding in
    /// either direction).
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Serialization { .. } | Self::Deserialization { .. })
    }

    /// Returns `true` if the underlying store failed.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
