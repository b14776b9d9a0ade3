//! Password resolution for the IMAP and SMTP accounts.
//!
//! A password can come from three places, checked in priority order:
//!
//! 1. **Direct value** - for quick local testing (`password: "hunter2"`)
//! 2. **File reference** - for Docker secrets (`passwordFile: /run/secrets/imap`)
//! 3. **Env var reference** - for Kubernetes/systemd (`passwordEnvVar: MAILBOY_IMAP_PASSWORD`)

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: password, passwordFile, or passwordEnvVar)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where an account password is read from. Flattened into the account settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSource {
    /// Direct password value.
    /// WARNING: storing passwords directly in config files is insecure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// File containing the password (trimmed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<String>,

    /// Environment variable containing the password (trimmed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env_var: Option<String>,
}

impl PasswordSource {
    /// Resolves the password, warning when the insecure direct value is used.
    pub fn resolve(&self) -> Result<SecretString> {
        if self.password.as_deref().is_some_and(|p| !p.is_empty()) {
            log::warn!(
                "Using a direct password value is not recommended. \
                 Consider using passwordEnvVar or passwordFile instead."
            );
        }
        resolve_secret(
            self.password.as_deref(),
            self.password_file.as_deref(),
            self.password_env_var.as_deref(),
        )
    }

    /// Returns true if at least one non-empty source is configured.
    pub fn is_configured(&self) -> bool {
        has_secret_source(
            self.password.as_deref(),
            self.password_file.as_deref(),
            self.password_env_var.as_deref(),
        )
    }
}

/// Resolves a secret from the first non-empty source: direct value, file
/// contents, then environment variable.
///
/// # Examples
///
/// ```ignore
/// use mailboy::secrets::resolve_secret;
///
/// // File path used if no direct value
/// let secret = resolve_secret(None, Some("~/.secrets/imap"), Some("IMAP_PASSWORD"))?;
/// ```
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct {
        if !value.is_empty() {
            return Ok(SecretString::from(value.to_string()));
        }
    }

    if let Some(path) = file_path {
        if !path.is_empty() {
            let expanded = expand_home(path);
            return match fs::read_to_string(&expanded) {
                Ok(content) => Ok(SecretString::from(content.trim().to_string())),
                Err(e) => Err(SecretError::FileReadError {
                    path: expanded,
                    source: e,
                }),
            };
        }
    }

    if let Some(var_name) = env_var {
        if !var_name.is_empty() {
            return match std::env::var(var_name) {
                // Env vars may carry a trailing newline when set from files
                Ok(value) => Ok(SecretString::from(value.trim().to_string())),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: var_name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: var_name.to_string(),
                }),
            };
        }
    }

    Err(SecretError::NoSourceProvided)
}

/// Checks if any secret source is configured (non-empty).
pub fn has_secret_source(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> bool {
    direct.is_some_and(|s| !s.is_empty())
        || file_path.is_some_and(|s| !s.is_empty())
        || env_var.is_some_and(|s| !s.is_empty())
}

fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
