use std::path::PathBuf;
use thiserror::Error;

use crate::imap::ImapError;
use crate::secrets::SecretError;
use crate::smtp::SmtpError;

#[derive(Error, Debug)]
pub enum MailboyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IMAP error: {0}")]
    Imap(#[from] ImapError),

    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Failed to read recipient list '{path}': {source}")]
    ReadRecipients {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credentials for {account} could not be resolved: {source}")]
    Secret {
        account: String,
        #[source]
        source: SecretError,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MessageError {
    #[error("Message has no header fields")]
    MissingHeaders,
}

pub type Result<T> = std::result::Result<T, MailboyError>;
