//! IMAP side of the relay: the mailbox the moderator works in.
//!
//! The pipeline only talks to the [`MailStore`] trait; [`ImapClient`] is the
//! production implementation on top of `async-imap`.

pub mod client;
pub mod error;
pub mod folders;

use std::time::Duration;

use async_trait::async_trait;

use crate::worker::Shutdown;

pub use client::ImapClient;
pub use error::ImapError;
pub use folders::ensure_folders;

/// Server-assigned message identifier, unique within a folder.
pub type Uid = u32;

/// How an IDLE wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// The server pushed an update (new mail, expunge, flag change).
    Activity,
    /// The wait reached its timeout without any update.
    Timeout,
    /// Shutdown was requested while waiting.
    Interrupted,
}

/// Mailbox operations the publication engine needs from an IMAP account.
///
/// Implementations hold a logged-in session. Every method but `logout` fails
/// with [`ImapError::NotConnected`] once the session is gone.
#[async_trait]
pub trait MailStore: Send {
    async fn folder_exists(&mut self, folder: &str) -> error::Result<bool>;

    async fn create_folder(&mut self, folder: &str) -> error::Result<()>;

    async fn subscribe_folder(&mut self, folder: &str) -> error::Result<()>;

    /// Selects `folder`; later searches, fetches and moves act on it.
    async fn select_folder(&mut self, folder: &str) -> error::Result<()>;

    /// UIDs of every message in the selected folder.
    async fn search_all(&mut self) -> error::Result<Vec<Uid>>;

    /// Fetches full raw messages for `uids` in one round trip.
    async fn fetch_raw(&mut self, uids: &[Uid]) -> error::Result<Vec<(Uid, Vec<u8>)>>;

    /// Moves one message out of the selected folder into `folder`.
    async fn move_message(&mut self, uid: Uid, folder: &str) -> error::Result<()>;

    /// Enters IDLE and waits for server activity, `timeout`, or shutdown.
    ///
    /// IDLE is always terminated (DONE sent) before this returns, so the
    /// session is usable for regular commands afterwards.
    async fn idle_wait(
        &mut self,
        timeout: Duration,
        shutdown: &mut Shutdown,
    ) -> error::Result<IdleEvent>;

    /// Logs out and releases the session. Safe to call more than once.
    async fn logout(&mut self) -> error::Result<()>;
}
