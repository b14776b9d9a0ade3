//! In-memory stand-ins for the IMAP and SMTP accounts.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use mailboy::imap::error::Result as ImapResult;
use mailboy::{
    IdleEvent, ImapError, MailStore, SendError, Shutdown, SmtpConnector, SmtpError, SmtpSession,
    Uid,
};

/// One call made against [`FakeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    FolderExists(String),
    CreateFolder(String),
    Subscribe(String),
    Select(String),
    SearchAll,
    Fetch(Vec<Uid>),
    Move(Uid, String),
    IdleWait,
    Logout,
}

/// Mailbox with an accepted folder held in memory.
#[derive(Default)]
pub struct FakeStore {
    pub calls: Vec<StoreCall>,
    pub folders: HashSet<String>,
    /// Messages currently in the accepted folder.
    pub accepted: Vec<(Uid, Vec<u8>)>,
    /// Messages moved out, with their target folder.
    pub moved: Vec<(Uid, String)>,
    /// Events returned by successive IDLE waits; `Interrupted` once drained.
    pub idle_script: VecDeque<IdleEvent>,
    /// Messages that arrive with each `Activity` event.
    pub arrivals: VecDeque<Vec<(Uid, Vec<u8>)>>,
    /// Makes `search_all` fail.
    pub fail_search: bool,
    /// Makes `create_folder` fail.
    pub fail_create: bool,
    /// Makes `fetch_raw` return every message twice.
    pub duplicate_fetch: bool,
    /// Makes `move_message` fail.
    pub fail_move: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose account already has both folders.
    pub fn with_folders(folders: &[&str]) -> Self {
        Self {
            folders: folders.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn accept(mut self, uid: Uid, raw: Vec<u8>) -> Self {
        self.accepted.push((uid, raw));
        self
    }

    pub fn idle_events(mut self, events: &[IdleEvent]) -> Self {
        self.idle_script = events.iter().copied().collect();
        self
    }

    pub fn count(&self, wanted: &StoreCall) -> usize {
        self.calls.iter().filter(|c| *c == wanted).count()
    }

    pub fn searches(&self) -> usize {
        self.count(&StoreCall::SearchAll)
    }

    pub fn moves(&self) -> Vec<(Uid, String)> {
        self.moved.clone()
    }

    fn protocol(reason: &str) -> ImapError {
        ImapError::ProtocolError(reason.to_string())
    }
}

#[async_trait]
impl MailStore for FakeStore {
    async fn folder_exists(&mut self, folder: &str) -> ImapResult<bool> {
        self.calls.push(StoreCall::FolderExists(folder.to_string()));
        Ok(self.folders.contains(folder))
    }

    async fn create_folder(&mut self, folder: &str) -> ImapResult<()> {
        self.calls.push(StoreCall::CreateFolder(folder.to_string()));
        if self.fail_create {
            return Err(Self::protocol("NO [CANNOT] create not permitted"));
        }
        self.folders.insert(folder.to_string());
        Ok(())
    }

    async fn subscribe_folder(&mut self, folder: &str) -> ImapResult<()> {
        self.calls.push(StoreCall::Subscribe(folder.to_string()));
        Ok(())
    }

    async fn select_folder(&mut self, folder: &str) -> ImapResult<()> {
        self.calls.push(StoreCall::Select(folder.to_string()));
        if !self.folders.contains(folder) {
            return Err(ImapError::FolderNotFound(folder.to_string()));
        }
        Ok(())
    }

    async fn search_all(&mut self) -> ImapResult<Vec<Uid>> {
        self.calls.push(StoreCall::SearchAll);
        if self.fail_search {
            return Err(Self::protocol("connection reset"));
        }
        Ok(self.accepted.iter().map(|(uid, _)| *uid).collect())
    }

    async fn fetch_raw(&mut self, uids: &[Uid]) -> ImapResult<Vec<(Uid, Vec<u8>)>> {
        self.calls.push(StoreCall::Fetch(uids.to_vec()));
        let mut out: Vec<(Uid, Vec<u8>)> = self
            .accepted
            .iter()
            .filter(|(uid, _)| uids.contains(uid))
            .cloned()
            .collect();
        if self.duplicate_fetch {
            let again = out.clone();
            out.extend(again);
        }
        Ok(out)
    }

    async fn move_message(&mut self, uid: Uid, folder: &str) -> ImapResult<()> {
        self.calls.push(StoreCall::Move(uid, folder.to_string()));
        if self.fail_move {
            return Err(Self::protocol("BYE connection lost"));
        }
        let before = self.accepted.len();
        self.accepted.retain(|(u, _)| *u != uid);
        if self.accepted.len() == before {
            return Err(Self::protocol("NO no such message"));
        }
        self.moved.push((uid, folder.to_string()));
        Ok(())
    }

    async fn idle_wait(
        &mut self,
        _timeout: Duration,
        shutdown: &mut Shutdown,
    ) -> ImapResult<IdleEvent> {
        self.calls.push(StoreCall::IdleWait);
        if shutdown.is_triggered() {
            return Ok(IdleEvent::Interrupted);
        }
        let event = self
            .idle_script
            .pop_front()
            .unwrap_or(IdleEvent::Interrupted);
        if event == IdleEvent::Activity {
            if let Some(batch) = self.arrivals.pop_front() {
                self.accepted.extend(batch);
            }
        }
        Ok(event)
    }

    async fn logout(&mut self) -> ImapResult<()> {
        self.calls.push(StoreCall::Logout);
        Ok(())
    }
}

/// A message handed to the fake SMTP server.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub sender: String,
    pub recipient: String,
    pub raw: Vec<u8>,
}

/// Everything the fake SMTP server saw, shared between connector and sessions.
#[derive(Debug, Default)]
pub struct SmtpLog {
    pub connects: usize,
    pub closes: usize,
    pub sent: Vec<SentMail>,
    pub rejected: Vec<String>,
}

/// Connector whose sessions record sends and refuse listed recipients.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub log: Arc<Mutex<SmtpLog>>,
    refuse: Vec<String>,
    fail_connect: bool,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recipients the server answers with a 550.
    pub fn refusing(recipients: &[&str]) -> Self {
        Self {
            refuse: recipients.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Default::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.log.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.log.lock().unwrap().sent.clone()
    }

    pub fn rejected(&self) -> Vec<String> {
        self.log.lock().unwrap().rejected.clone()
    }
}

#[async_trait]
impl SmtpConnector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self) -> Result<FakeSession, SmtpError> {
        if self.fail_connect {
            return Err(SmtpError::ConnectionFailed("connection refused".to_string()));
        }
        self.log.lock().unwrap().connects += 1;
        Ok(FakeSession {
            log: Arc::clone(&self.log),
            refuse: self.refuse.clone(),
            open: true,
        })
    }
}

pub struct FakeSession {
    log: Arc<Mutex<SmtpLog>>,
    refuse: Vec<String>,
    open: bool,
}

#[async_trait]
impl SmtpSession for FakeSession {
    async fn send(&mut self, sender: &str, recipient: &str, raw: &[u8]) -> Result<(), SendError> {
        if !self.open {
            return Err(SendError::Session(SmtpError::Closed));
        }
        let mut log = self.log.lock().unwrap();
        if self.refuse.iter().any(|r| r == recipient) {
            log.rejected.push(recipient.to_string());
            return Err(SendError::Rejected {
                recipient: recipient.to_string(),
                reason: "550 5.1.1 mailbox unavailable".to_string(),
            });
        }
        log.sent.push(SentMail {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            raw: raw.to_vec(),
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SmtpError> {
        if self.open {
            self.open = false;
            self.log.lock().unwrap().closes += 1;
        }
        Ok(())
    }
}
