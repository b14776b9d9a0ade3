//! SMTP side of the relay: fan-out delivery to list members.

pub mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{SmtpClient, SmtpConnection};

/// Errors that make an SMTP session unusable.
#[derive(Error, Debug)]
pub enum SmtpError {
    /// Transport could not be configured (bad host, TLS parameters).
    #[error("SMTP setup failed: {0}")]
    Setup(String),

    /// Password could not be resolved from the configured source.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// Connecting or logging in failed.
    #[error("SMTP connection failed: {0}")]
    ConnectionFailed(String),

    /// The session broke down mid-use.
    #[error("SMTP session failed: {0}")]
    Session(String),

    /// The session was already closed.
    #[error("SMTP session is closed")]
    Closed,
}

/// Outcome of a failed single-recipient send.
#[derive(Error, Debug)]
pub enum SendError {
    /// The server (or address validation) refused this one recipient. The
    /// session is still usable.
    #[error("delivery to {recipient} rejected: {reason}")]
    Rejected { recipient: String, reason: String },

    /// The session itself failed; nothing more can be sent on it.
    #[error(transparent)]
    Session(#[from] SmtpError),
}

/// Opens SMTP sessions on demand.
#[async_trait]
pub trait SmtpConnector: Send + Sync {
    type Session: SmtpSession;

    /// Connects and authenticates.
    async fn connect(&self) -> Result<Self::Session, SmtpError>;
}

/// An open, authenticated SMTP session.
#[async_trait]
pub trait SmtpSession: Send {
    /// Sends `raw` with envelope `sender` → `recipient`.
    async fn send(&mut self, sender: &str, recipient: &str, raw: &[u8]) -> Result<(), SendError>;

    /// Releases the session. Later sends fail with [`SmtpError::Closed`].
    async fn close(&mut self) -> Result<(), SmtpError>;
}
