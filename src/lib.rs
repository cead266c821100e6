//! WhatsApp Dashboard - live-sync client core for a chatbot operator console
//!
//! This library keeps an operator's view of chatbot conversations consistent
//! while data arrives from three directions at once: paginated REST fetches,
//! two push transports (core API and bot service), and optimistic local sends.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod dashboard;
pub mod format;
pub mod models;
pub mod pagination;
pub mod protocol;
pub mod read_position;
pub mod reconcile;
pub mod refresh;
pub mod rooms;
pub mod storage;
pub mod transport;
pub mod tui;

#[cfg(test)]
mod tests;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dashboard operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Push transport error (connect, handshake, link loss)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed Engine.IO / Socket.IO packet
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// REST endpoint answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message reported by the server, or the status reason
        message: String,
    },

    /// Request or handshake exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Settings or preferences persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl Error {
    /// Whether the failed operation may succeed if simply tried again
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Transport(_) | Error::WebSocket(_) => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Initialize logging to stdout
pub fn init() {
    tracing_subscriber::fmt::init();
}

/// Initialize logging into a file, for front-ends that own the terminal
pub fn init_with_writer(file: std::fs::File) {
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}
