//! Folder bootstrap.

use log::{debug, info};

use crate::config::FolderSet;

use super::error::{ImapError, Result};
use super::MailStore;

/// Makes sure the accepted and published folders exist.
///
/// Missing folders are created and subscribed; existing ones are left alone,
/// so running this against a set-up account issues no writes. Failures are
/// returned as [`ImapError::FolderSetup`] and are not retried.
pub async fn ensure_folders<S: MailStore + ?Sized>(store: &mut S, folders: &FolderSet) -> Result<()> {
    for folder in folders.names() {
        debug!("Checking if folder '{}' exists", folder);
        if store.folder_exists(folder).await? {
            continue;
        }

        info!("Creating IMAP folder '{}'", folder);
        store
            .create_folder(folder)
            .await
            .map_err(|e| setup_error(folder, e))?;
        store
            .subscribe_folder(folder)
            .await
            .map_err(|e| setup_error(folder, e))?;
    }
    Ok(())
}

fn setup_error(folder: &str, err: ImapError) -> ImapError {
    ImapError::FolderSetup {
        folder: folder.to_string(),
        reason: err.to_string(),
    }
}
