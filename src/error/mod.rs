use std::io;
use std::path::PathBuf;

/// Errors in fireclient
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configure: {0}")]
    Config(String),
    #[error("Fail to connect {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{endpoint}: transport: {message}")]
    Transport { endpoint: String, message: String },
    /// Firecracker answered with a non-2xx status.
    #[error("{endpoint}: firecracker returned {status} ({kind:?}): {fault_message}")]
    Api {
        endpoint: String,
        status: u16,
        kind: ApiErrorKind,
        fault_message: String,
    },
    #[error("{endpoint}: fail to decode response: {message}")]
    Decode { endpoint: String, message: String },
    #[error("Fail to encode structs: {0}")]
    Encode(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Fail to launch {}: {source}", bin.display())]
    Launch {
        bin: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Supervisor: {0}")]
    Supervisor(String),
    #[error("Filesys I/O: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of a fault reported by the Firecracker API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// The request is not allowed in the current microVM state,
    /// e.g. a pre-boot only field after `InstanceStart`.
    InvalidState,
    /// The referenced resource does not exist.
    NotFound,
    /// The request body was rejected.
    Validation,
    /// Server side failure.
    Internal,
}

impl ApiErrorKind {
    pub fn classify(status: u16, fault_message: &str) -> Self {
        let msg = fault_message.to_lowercase();
        if status == 404
            || msg.contains("not found")
            || msg.contains("invalid block device id")
            || msg.contains("does not exist")
        {
            ApiErrorKind::NotFound
        } else if msg.contains("after starting")
            || msg.contains("before starting")
            || msg.contains("not allowed")
            || msg.contains("pre-boot")
            || msg.contains("post-boot")
            || msg.contains("already running")
        {
            ApiErrorKind::InvalidState
        } else if status >= 500 {
            ApiErrorKind::Internal
        } else {
            ApiErrorKind::Validation
        }
    }
}

impl Error {
    /// Returns the API fault kind if this is an API error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether retrying the same call later could succeed, e.g. the socket
    /// is not bound yet. Validation and state errors are permanent.
    /// After a `Transport` or `Timeout` the retry needs a new connection.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connect { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::NotFound
                    | io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::WouldBlock
            ),
            Error::Transport { .. } | Error::Timeout(_) => true,
            Error::Api { kind, .. } => *kind == ApiErrorKind::Internal,
            _ => false,
        }
    }

    /// Process exit code used by the command line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 1,
            Error::Launch { .. } | Error::Supervisor(_) => 3,
            _ => 2,
        }
    }
}
