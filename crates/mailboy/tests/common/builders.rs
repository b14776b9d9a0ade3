//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use std::time::Duration;

use mailboy::config::{FolderSet, ImapSettings, RunConfig, SmtpSettings};
use mailboy::secrets::PasswordSource;
use mailboy::{RecipientSource, RunMode};

pub const LIST_ADDRESS: &str = "list@example.org";
pub const ACCEPTED: &str = "Accepted";
pub const PUBLISHED: &str = "Published";

/// Builder for creating `RunConfig` instances.
pub struct RunConfigBuilder {
    mode: RunMode,
    prefix: String,
    recipients: Vec<String>,
    poll_interval: Duration,
    idle_timeout: Duration,
}

impl RunConfigBuilder {
    /// Create a new builder with test-friendly defaults: single mode, prefix
    /// "[list]", no recipients, millisecond timings.
    pub fn new() -> Self {
        Self {
            mode: RunMode::Single,
            prefix: "[list]".to_string(),
            recipients: Vec::new(),
            poll_interval: Duration::from_millis(5),
            idle_timeout: Duration::from_millis(50),
        }
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn recipients(mut self, recipients: &[&str]) -> Self {
        self.recipients = recipients.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(self) -> RunConfig {
        let auth = PasswordSource {
            password: Some("secret".to_string()),
            ..Default::default()
        };
        RunConfig {
            imap: ImapSettings {
                host: "imap.example.org".to_string(),
                port: 993,
                username: LIST_ADDRESS.to_string(),
                auth: auth.clone(),
            },
            smtp: SmtpSettings {
                host: "smtp.example.org".to_string(),
                port: 465,
                username: LIST_ADDRESS.to_string(),
                auth,
                list_address: LIST_ADDRESS.to_string(),
            },
            folders: FolderSet {
                accepted: ACCEPTED.to_string(),
                published: PUBLISHED.to_string(),
            },
            subject_prefix: self.prefix,
            recipients: RecipientSource::Cached(self.recipients),
            mode: self.mode,
            poll_interval: self.poll_interval,
            idle_timeout: self.idle_timeout,
        }
    }
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw RFC 5322 message with the given author and subject.
pub fn raw_message(from: &str, subject: &str) -> Vec<u8> {
    format!(
        "From: {from}\r\nTo: {LIST_ADDRESS}\r\nSubject: {subject}\r\n\
         Message-ID: <{}@example.org>\r\n\r\nHello list,\r\nsome text.\r\n",
        subject.len()
    )
    .into_bytes()
}
