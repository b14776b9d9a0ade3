//! IMAP side error types.

use thiserror::Error;

/// Errors raised while talking to the IMAP server.
#[derive(Error, Debug)]
pub enum ImapError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Password could not be resolved from the configured source.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// An operation was attempted without a logged-in session.
    #[error("Not connected to the IMAP server")]
    NotConnected,

    /// Folder not found.
    #[error("IMAP folder '{0}' not found")]
    FolderNotFound(String),

    /// Creating or subscribing a required folder failed.
    #[error("Failed to set up IMAP folder '{folder}': {reason}")]
    FolderSetup { folder: String, reason: String },
}

impl From<async_native_tls::Error> for ImapError {
    fn from(err: async_native_tls::Error) -> Self {
        ImapError::TlsError(err.to_string())
    }
}

/// Result type for IMAP operations.
pub type Result<T> = std::result::Result<T, ImapError>;
