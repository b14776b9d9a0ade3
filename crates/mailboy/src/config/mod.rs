pub mod loader;
pub mod schema;

use std::time::Duration;

pub use loader::{load_run_config, load_settings, load_settings_from_str, CONFIG_FILE_NAME};
pub use schema::{FolderSet, ImapSettings, MailingListSettings, Settings, SmtpSettings};

use crate::recipients::RecipientSource;
use crate::worker::RunMode;

/// Everything one invocation needs, built once at startup and passed by
/// reference to every component.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub imap: ImapSettings,
    pub smtp: SmtpSettings,
    pub folders: FolderSet,
    pub subject_prefix: String,
    pub recipients: RecipientSource,
    pub mode: RunMode,
    pub poll_interval: Duration,
    pub idle_timeout: Duration,
}
