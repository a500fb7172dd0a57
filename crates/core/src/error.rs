//! One error enum per concern, plus [`Error`] wrapping them for callers that
//! only need to propagate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("Tool registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the inference service. Any of these ends a turn with a
/// synthetic failure answer; the core never retries.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// Per-invocation failures. The dispatcher turns every one of these into a
/// failure-flagged tool result; they never abort a turn.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("tool '{0}' not found")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Error: {reason}")]
    Upstream { reason: String },
}

/// Failures reported by the cluster inspection client.
#[derive(Debug, Clone, Error)]
pub enum ClusterError {
    /// The Kubernetes API rejected or failed the call.
    #[error("{reason}")]
    Api { reason: String },

    /// No usable cluster configuration or the API server is unreachable.
    #[error("cluster connection failed: {0}")]
    Connection(String),
}

/// Startup-time registration failures. These are fatal configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a tool named '{0}' is already registered")]
    Duplicate(String),

    #[error("tool '{0}' is not read-only and cannot be registered")]
    Mutating(String),
}

/// Failures surfaced at the turn-controller boundary.
#[derive(Debug, Clone, Error)]
pub enum TurnError {
    #[error("No question provided")]
    EmptyInput,

    #[error("The request took longer than {timeout_secs}s and was aborted")]
    DeadlineExceeded { timeout_secs: u64 },

    #[error("Conversation invariant violated: {0}")]
    Invariant(String),
}
