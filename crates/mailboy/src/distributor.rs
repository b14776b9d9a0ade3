//! Per-recipient fan-out of one published message.

use log::{debug, error};

use crate::message::Message;
use crate::smtp::{SendError, SmtpError, SmtpSession};
use crate::transform::recipient_messages;

/// A recipient the server refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelivery {
    pub recipient: String,
    pub reason: String,
}

/// Per-recipient outcome of distributing one or more messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Recipients that accepted the message, in send order.
    pub delivered: Vec<String>,
    /// Recipients that were rejected, in send order.
    pub failed: Vec<FailedDelivery>,
}

impl DeliveryReport {
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Number of send attempts covered by this report.
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered.extend(other.delivered);
        self.failed.extend(other.failed);
    }
}

/// Sends `message` to every recipient, one SMTP transaction each, in order.
///
/// A rejected recipient is logged and recorded and the loop moves on; only a
/// broken session aborts the distribution.
pub async fn distribute<S: SmtpSession + ?Sized>(
    session: &mut S,
    sender: &str,
    message: &Message,
    recipients: &[String],
) -> Result<DeliveryReport, SmtpError> {
    let mut report = DeliveryReport::default();

    for (variant, recipient) in recipient_messages(message, recipients) {
        match session.send(sender, recipient, &variant.to_bytes()).await {
            Ok(()) => {
                debug!("Sent mail to {}", recipient);
                report.delivered.push(recipient.to_string());
            }
            Err(SendError::Rejected { reason, .. }) => {
                error!("Failed to send message to {}: {}", recipient, reason);
                report.failed.push(FailedDelivery {
                    recipient: recipient.to_string(),
                    reason,
                });
            }
            Err(SendError::Session(e)) => return Err(e),
        }
    }

    Ok(report)
}
