//! Recipient list loading.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::ConfigError;

/// Parses a newline-delimited address list.
///
/// Lines are trimmed; blank lines and lines starting with `#` are skipped.
/// Order is preserved and duplicates are kept.
pub fn parse_recipients(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads and parses the recipient list at `path`.
pub fn load_recipients(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadRecipients {
        path: path.to_path_buf(),
        source: e,
    })?;
    let recipients = parse_recipients(&content);
    debug!(
        "Loaded {} recipients from {}",
        recipients.len(),
        path.display()
    );
    Ok(recipients)
}

/// Where the pipeline gets its recipients from on each pass.
#[derive(Debug, Clone)]
pub enum RecipientSource {
    /// Re-read the file on every non-empty pass, picking up edits.
    Reload(PathBuf),
    /// List read once at startup.
    Cached(Vec<String>),
}

impl RecipientSource {
    /// Builds the source for `path`, reading it up front when caching.
    pub fn from_path(path: PathBuf, reload: bool) -> Result<Self, ConfigError> {
        if reload {
            Ok(Self::Reload(path))
        } else {
            Ok(Self::Cached(load_recipients(&path)?))
        }
    }

    /// Returns the current recipient list.
    pub fn recipients(&self) -> Result<Vec<String>, ConfigError> {
        match self {
            Self::Reload(path) => load_recipients(path),
            Self::Cached(list) => Ok(list.clone()),
        }
    }
}
