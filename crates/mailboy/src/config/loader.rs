use std::path::Path;
use std::time::Duration;

use crate::config::schema::Settings;
use crate::config::RunConfig;
use crate::error::ConfigError;
use crate::recipients::RecipientSource;
use crate::worker::RunMode;

/// Name of the settings file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "mailboy.yaml";

pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_settings_from_str(&content)
}

pub fn load_settings_from_str(content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = serde_yaml::from_str(content)?;

    validate_settings(&settings)?;

    Ok(settings)
}

/// Loads `mailboy.yaml` and the recipient list from `config_dir` and combines
/// them with the run options into a [`RunConfig`].
pub fn load_run_config(
    config_dir: &Path,
    mode: RunMode,
    poll_interval: Duration,
) -> Result<RunConfig, ConfigError> {
    let settings = load_settings(config_dir.join(CONFIG_FILE_NAME))?;

    let recipients_path = if settings.mailing_list.recipients.is_absolute() {
        settings.mailing_list.recipients.clone()
    } else {
        config_dir.join(&settings.mailing_list.recipients)
    };

    // A missing list is a setup error even when it is re-read on every pass
    if !recipients_path.is_file() {
        return Err(ConfigError::ReadRecipients {
            path: recipients_path,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    let recipients =
        RecipientSource::from_path(recipients_path, settings.mailing_list.reload_recipients)?;

    Ok(RunConfig {
        imap: settings.imap,
        smtp: settings.smtp,
        folders: settings.folders,
        subject_prefix: settings.mailing_list.subject_prefix,
        recipients,
        mode,
        poll_interval,
        idle_timeout: Duration::from_secs(settings.idle_timeout),
    })
}

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    require_non_empty("imap.host", &settings.imap.host)?;
    require_non_empty("imap.username", &settings.imap.username)?;
    require_non_empty("smtp.host", &settings.smtp.host)?;
    require_non_empty("smtp.username", &settings.smtp.username)?;
    require_non_empty("folders.accepted", &settings.folders.accepted)?;
    require_non_empty("folders.published", &settings.folders.published)?;
    require_non_empty(
        "mailingList.subjectPrefix",
        settings.mailing_list.subject_prefix.trim(),
    )?;

    if !settings.imap.auth.is_configured() {
        return Err(ConfigError::Validation {
            message: "imap: one of password, passwordFile or passwordEnvVar is required"
                .to_string(),
        });
    }
    if !settings.smtp.auth.is_configured() {
        return Err(ConfigError::Validation {
            message: "smtp: one of password, passwordFile or passwordEnvVar is required"
                .to_string(),
        });
    }

    if settings.folders.accepted == settings.folders.published {
        return Err(ConfigError::Validation {
            message: format!(
                "accepted and published folders must differ (both are '{}')",
                settings.folders.accepted
            ),
        });
    }

    if settings.idle_timeout == 0 {
        return Err(ConfigError::Validation {
            message: "idleTimeout must be at least one second".to_string(),
        });
    }

    if let Err(e) = settings.smtp.list_address.parse::<lettre::Address>() {
        return Err(ConfigError::Validation {
            message: format!(
                "smtp.listAddress '{}' is not a valid address: {}",
                settings.smtp.list_address, e
            ),
        });
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation {
            message: format!("{} must not be empty", field),
        });
    }
    Ok(())
}
