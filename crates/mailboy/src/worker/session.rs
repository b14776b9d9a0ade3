//! Session lifecycle around the run loop.

use log::{info, warn};

use crate::config::RunConfig;
use crate::error::Result;
use crate::imap::{ensure_folders, ImapClient, MailStore};
use crate::smtp::{SmtpClient, SmtpConnector};

use super::run_loop::{RunLoop, RunSummary};
use super::shutdown::Shutdown;

/// Connects to the configured accounts and runs until done or interrupted.
pub async fn run(config: &RunConfig, shutdown: Shutdown) -> Result<RunSummary> {
    info!("Starting mailboy in {} mode", config.mode);

    let mut client = ImapClient::new(config.imap.clone());
    client.connect().await?;
    let connector = SmtpClient::new(config.smtp.clone());

    run_session(&mut client, &connector, config, shutdown, None).await
}

/// Bootstraps folders, selects the accepted folder and hands over to the run
/// loop. The store is logged out on every exit path.
pub async fn run_session<S, C>(
    store: &mut S,
    connector: &C,
    config: &RunConfig,
    shutdown: Shutdown,
    max_passes: Option<usize>,
) -> Result<RunSummary>
where
    S: MailStore + ?Sized,
    C: SmtpConnector,
{
    let result = drive(store, connector, config, shutdown, max_passes).await;

    if let Err(e) = store.logout().await {
        warn!("IMAP logout failed: {}", e);
    }
    result
}

async fn drive<S, C>(
    store: &mut S,
    connector: &C,
    config: &RunConfig,
    shutdown: Shutdown,
    max_passes: Option<usize>,
) -> Result<RunSummary>
where
    S: MailStore + ?Sized,
    C: SmtpConnector,
{
    ensure_folders(store, &config.folders).await?;
    store.select_folder(&config.folders.accepted).await?;

    let mut run_loop = RunLoop::new(config, connector, shutdown);
    if let Some(max) = max_passes {
        run_loop = run_loop.with_max_passes(max);
    }
    run_loop.run(store).await
}
