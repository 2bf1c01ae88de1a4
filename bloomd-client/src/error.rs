//! Error types for the bloomd client.

use std::time::Duration;

use bloomd_common::Verb;

/// Result type for the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network or IO failure while dialing, reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The daemon closed the stream before a full response arrived.
    #[error("connection closed by daemon")]
    ConnectionClosed,

    /// Address could not be resolved into a socket address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The per-call deadline elapsed before a response was parsed.
    #[error("{verb} timed out after {after:?}")]
    Timeout { verb: Verb, after: Duration },

    /// The response did not match the grammar expected for the verb.
    #[error("unexpected {verb} response: {response:?}")]
    Protocol { verb: Verb, response: String },

    /// The daemon reports the named filter is absent.
    #[error("{verb}: filter does not exist")]
    FilterNotExist { verb: Verb },

    /// A filter of the same name is still being deleted.
    #[error("delete in progress")]
    DeleteInProgress,

    /// `clear` refused because the filter is still resident in memory.
    #[error("filter is not proxied, close it first")]
    FilterNotProxied,

    /// Caller supplied an argument the protocol cannot carry.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Client configuration was rejected.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// No connection became available within the wait.
    #[error("connection pool exhausted (max connections: {max})")]
    PoolExhausted { max: usize },

    /// The client has been shut down.
    #[error("connection pool closed")]
    PoolClosed,

    /// The blocking worker running the command panicked or was cancelled.
    #[error("dispatch task failed: {0}")]
    Task(String),
}

impl ClientError {
    /// Dial, read or write failures.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_) | ClientError::ConnectionClosed | ClientError::InvalidAddress(_)
        )
    }

    /// Errors after which repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::DeleteInProgress
                | ClientError::Timeout { .. }
                | ClientError::PoolExhausted { .. }
                | ClientError::Io(_)
                | ClientError::ConnectionClosed
        )
    }
}
