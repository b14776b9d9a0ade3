use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::secrets::PasswordSource;

/// Contents of `mailboy.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub imap: ImapSettings,
    pub smtp: SmtpSettings,
    #[serde(default)]
    pub folders: FolderSet,
    pub mailing_list: MailingListSettings,
    /// Upper bound in seconds for one IMAP IDLE wait before it is refreshed.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
}

fn default_idle_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImapSettings {
    /// IMAP server hostname (e.g., "imap.example.org").
    pub host: String,

    /// IMAP server port (default: 993 for IMAPS).
    #[serde(default = "default_imap_port")]
    pub port: u16,

    /// Login name, typically the list's own address.
    pub username: String,

    #[serde(flatten)]
    pub auth: PasswordSource,
}

fn default_imap_port() -> u16 {
    993
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettings {
    /// SMTP server hostname.
    pub host: String,

    /// SMTP port (default: 465, implicit TLS).
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    pub username: String,

    #[serde(flatten)]
    pub auth: PasswordSource,

    /// The list's own address. Set as `Reply-To` on every published message
    /// and used as envelope sender when `From` cannot be parsed.
    pub list_address: String,
}

fn default_smtp_port() -> u16 {
    465
}

/// The two IMAP folders the relay works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSet {
    /// Folder the moderator moves approved messages into.
    #[serde(default = "default_accepted_folder")]
    pub accepted: String,

    /// Folder published messages are moved to.
    #[serde(default = "default_published_folder")]
    pub published: String,
}

fn default_accepted_folder() -> String {
    "Accepted".to_string()
}

fn default_published_folder() -> String {
    "Published".to_string()
}

impl Default for FolderSet {
    fn default() -> Self {
        Self {
            accepted: default_accepted_folder(),
            published: default_published_folder(),
        }
    }
}

impl FolderSet {
    /// Folder names in bootstrap order.
    pub fn names(&self) -> [&str; 2] {
        [self.accepted.as_str(), self.published.as_str()]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailingListSettings {
    /// Tag put in front of every published subject, e.g. "[HB2.0]".
    pub subject_prefix: String,

    /// Recipient list file; relative paths resolve against the config directory.
    #[serde(default = "default_recipients_file")]
    pub recipients: PathBuf,

    /// Re-read the recipient list on every pass instead of once at startup.
    #[serde(default = "default_true")]
    pub reload_recipients: bool,
}

fn default_recipients_file() -> PathBuf {
    PathBuf::from("recipients.txt")
}

fn default_true() -> bool {
    true
}
