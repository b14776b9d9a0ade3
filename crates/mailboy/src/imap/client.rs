//! IMAP client for the list mailbox.

use std::time::Duration;

use async_imap::extensions::idle::IdleResponse;
use async_imap::types::Fetch;
use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use secrecy::ExposeSecret;

use crate::config::ImapSettings;
use crate::worker::Shutdown;

use super::error::{ImapError, Result};
use super::{IdleEvent, MailStore, Uid};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// IMAP client holding one logged-in session.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    settings: ImapSettings,
    selected_folder: Option<String>,
}

impl ImapClient {
    /// Creates a new IMAP client with the given settings.
    pub fn new(settings: ImapSettings) -> Self {
        Self {
            session: None,
            settings,
            selected_folder: None,
        }
    }

    /// Connects to the IMAP server over implicit TLS and logs in.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        info!("Connecting to IMAP account at {}", addr);

        // Establish TCP connection using std::net and wrap with async-io
        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| ImapError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| ImapError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| ImapError::ConnectionFailed(e.to_string()))?;

        let tls_stream = TlsConnector::new()
            .connect(&self.settings.host, tcp_stream)
            .await?;

        let client = async_imap::Client::new(tls_stream);

        let password = self
            .settings
            .auth
            .resolve()
            .map_err(|e| ImapError::CredentialsNotFound(e.to_string()))?;

        debug!("Login to IMAP with user {}", self.settings.username);
        let session = client
            .login(&self.settings.username, password.expose_secret())
            .await
            .map_err(|(e, _)| ImapError::AuthenticationFailed(e.to_string()))?;

        info!("Successfully authenticated to IMAP server");
        self.session = Some(session);
        Ok(())
    }

    /// Checks if the client is currently connected.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Folder chosen by the last successful select.
    pub fn selected_folder(&self) -> Option<&str> {
        self.selected_folder.as_deref()
    }

    fn session(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session.as_mut().ok_or(ImapError::NotConnected)
    }
}

fn protocol(err: async_imap::error::Error) -> ImapError {
    ImapError::ProtocolError(err.to_string())
}

/// Drains a UID FETCH response.
///
/// An error item fails the whole fetch; an item without UID or body is skipped.
async fn collect_fetched<S, T, F>(mut items: S, extract: F) -> Result<Vec<(Uid, Vec<u8>)>>
where
    S: Stream<Item = std::result::Result<T, async_imap::error::Error>> + Unpin,
    F: Fn(&T) -> Option<(Uid, Vec<u8>)>,
{
    let mut results = Vec::new();
    while let Some(item) = items.next().await {
        let item = item.map_err(|e| {
            warn!("Error fetching message: {}", e);
            protocol(e)
        })?;
        match extract(&item) {
            Some(entry) => results.push(entry),
            None => warn!("Fetched message missing UID or body"),
        }
    }
    Ok(results)
}

#[async_trait]
impl MailStore for ImapClient {
    async fn folder_exists(&mut self, folder: &str) -> Result<bool> {
        let session = self.session()?;

        let names = session
            .list(Some(""), Some(folder))
            .await
            .map_err(protocol)?;
        futures_util::pin_mut!(names);

        // Drain the whole response before issuing the next command
        let mut exists = false;
        while let Some(name) = names.next().await {
            if name.map_err(protocol)?.name() == folder {
                exists = true;
            }
        }
        Ok(exists)
    }

    async fn create_folder(&mut self, folder: &str) -> Result<()> {
        self.session()?.create(folder).await.map_err(protocol)
    }

    async fn subscribe_folder(&mut self, folder: &str) -> Result<()> {
        self.session()?.subscribe(folder).await.map_err(protocol)
    }

    async fn select_folder(&mut self, folder: &str) -> Result<()> {
        let session = self.session()?;

        info!("Selecting folder: {}", folder);
        let mailbox = session.select(folder).await.map_err(|e| {
            if e.to_string().contains("NO") {
                ImapError::FolderNotFound(folder.to_string())
            } else {
                protocol(e)
            }
        })?;
        debug!("Folder '{}' holds {} messages", folder, mailbox.exists);

        self.selected_folder = Some(folder.to_string());
        Ok(())
    }

    async fn search_all(&mut self) -> Result<Vec<Uid>> {
        let uids = self.session()?.uid_search("ALL").await.map_err(protocol)?;

        let mut uid_list: Vec<Uid> = uids.into_iter().collect();
        uid_list.sort_unstable();
        debug!("Found {} messages in selected folder", uid_list.len());
        Ok(uid_list)
    }

    async fn fetch_raw(&mut self, uids: &[Uid]) -> Result<Vec<(Uid, Vec<u8>)>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.session()?;

        // Build UID set (e.g., "1,2,5,10")
        let uid_set = uids
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(",");

        debug!("Fetching {} messages with UIDs: {}", uids.len(), uid_set);

        let messages = session
            .uid_fetch(&uid_set, "(UID BODY[])")
            .await
            .map_err(protocol)?;

        let results = collect_fetched(messages, |message: &Fetch| {
            message
                .uid
                .zip(message.body())
                .map(|(uid, body)| (uid, body.to_vec()))
        })
        .await?;

        debug!("Successfully fetched {} messages", results.len());
        Ok(results)
    }

    async fn move_message(&mut self, uid: Uid, folder: &str) -> Result<()> {
        debug!("Moving UID {} into '{}'", uid, folder);
        self.session()?
            .uid_mv(uid.to_string(), folder)
            .await
            .map_err(protocol)
    }

    async fn idle_wait(&mut self, timeout: Duration, shutdown: &mut Shutdown) -> Result<IdleEvent> {
        let session = self.session.take().ok_or(ImapError::NotConnected)?;

        let mut handle = session.idle();
        handle.init().await.map_err(protocol)?;

        let response = {
            let (idle_wait, interrupt) = handle.wait_with_timeout(timeout);
            futures_util::pin_mut!(idle_wait);
            let mut interrupt = Some(interrupt);

            loop {
                tokio::select! {
                    response = &mut idle_wait => break response,
                    _ = shutdown.triggered(), if interrupt.is_some() => {
                        debug!("Shutdown requested, interrupting IDLE");
                        // Dropping the stop source ends the wait with ManualInterrupt
                        interrupt.take();
                    }
                }
            }
        };

        // DONE goes out even when the wait itself failed
        let session = handle.done().await.map_err(protocol)?;
        self.session = Some(session);

        match response.map_err(protocol)? {
            IdleResponse::NewData(_) => Ok(IdleEvent::Activity),
            IdleResponse::Timeout => Ok(IdleEvent::Timeout),
            IdleResponse::ManualInterrupt => Ok(IdleEvent::Interrupted),
        }
    }

    async fn logout(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Logging out from IMAP server");
            session.logout().await.map_err(protocol)?;
        }
        self.selected_folder = None;
        Ok(())
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit logout - session will be closed");
        }
    }
}
