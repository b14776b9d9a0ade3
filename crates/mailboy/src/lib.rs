//! mailboy: a small mailing-list relay.
//!
//! A moderator moves messages into an IMAP "accepted" folder; mailboy sends
//! each one to every list member over SMTP, rewriting the subject and
//! `Reply-To`, then files it under "published".

pub mod config;
pub mod distributor;
pub mod error;
pub mod imap;
pub mod logging;
pub mod message;
pub mod pipeline;
pub mod recipients;
pub mod secrets;
pub mod smtp;
pub mod transform;
pub mod worker;

pub use config::{load_run_config, load_settings, RunConfig, Settings};
pub use distributor::{distribute, DeliveryReport, FailedDelivery};
pub use error::{ConfigError, MailboyError, MessageError, Result};
pub use imap::{IdleEvent, ImapClient, ImapError, MailStore, Uid};
pub use message::{Header, Message};
pub use pipeline::{PassReport, PublicationPipeline};
pub use recipients::RecipientSource;
pub use secrets::{resolve_secret, PasswordSource, SecretError};
pub use smtp::{SendError, SmtpClient, SmtpConnector, SmtpError, SmtpSession};
pub use worker::{RunLoop, RunMode, RunState, RunSummary, Shutdown, ShutdownTrigger};
