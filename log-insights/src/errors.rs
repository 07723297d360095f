use thiserror::Error;

/// Result type alias for log query operations
pub type Result<T, E = LogQueryError> = std::result::Result<T, E>;

/// Errors that can occur while querying or writing access log entries
#[derive(Error, Debug)]
pub enum LogQueryError {
    #[error("Failed to submit query: {0}")]
    SubmitFailed(String),

    #[error("Failed to fetch query results for {handle}: {message}")]
    FetchFailed { handle: String, message: String },

    #[error("Backend returned no query id")]
    MissingQueryId,

    #[error("Unknown query handle: {0}")]
    UnknownHandle(String),

    /// The poll budget ran out before the backend reported a terminal status.
    #[error("Query {handle} timed out after {attempts} polls")]
    QueryTimedOut { handle: String, attempts: u32 },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
