//! Shared test utilities for mailboy integration tests.
//!
//! This module provides:
//! - In-memory `MailStore` and `SmtpConnector` fakes that record every call
//! - Builders for run configurations and raw messages

pub mod builders;
pub mod fakes;

pub use builders::*;
pub use fakes::*;
