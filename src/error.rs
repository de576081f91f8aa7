//! Error types for the redisio client and its command-line tool.

use thiserror::Error;

/// Errors returned by the client.
///
/// Server-reported errors are kept apart from connection and protocol
/// failures so callers can tell "the server rejected my command" from
/// "the stream is broken".
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a `-` reply.
    #[error("server error: {0}")]
    Server(String),

    /// The reply stream could not be parsed. The connection is dropped.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The caller's command could not be built or parsed. Nothing was sent.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Connecting or writing failed, including the single retry.
    #[error("connection error: {0}")]
    Connection(#[source] std::io::Error),

    /// AUTH or SELECT failed while establishing the connection.
    #[error("handshake {command} failed: {reason}")]
    Handshake {
        command: &'static str,
        reason: String,
    },

    /// The peer closed the stream while a reply was still owed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Reading a reply failed. Reads are never retried.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for failures that leave the client without a usable connection.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Error::Connection(_) | Error::Handshake { .. } | Error::ConnectionClosed
        )
    }

    /// True if the server rejected the command.
    pub fn is_server(&self) -> bool {
        matches!(self, Error::Server(_))
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("file error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// Telemetry initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("metrics initialization failed: {0}")]
    MetricsInit(String),
}

/// Top-level error type for the `redisio` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
