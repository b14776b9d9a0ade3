use std::collections::HashSet;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::RunConfig;
use crate::distributor::{distribute, DeliveryReport};
use crate::error::Result;
use crate::imap::{MailStore, Uid};
use crate::message::Message;
use crate::smtp::{SmtpConnector, SmtpSession};
use crate::transform::{cleanup_subject, stamp_reply_to};

/// What one publication pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// UIDs found in the accepted folder.
    pub discovered: usize,
    /// UIDs sent out and moved to the published folder, in processing order.
    pub published: Vec<Uid>,
    /// UIDs left in place because they could not be parsed.
    pub skipped: Vec<Uid>,
    /// Per-recipient outcomes across all published messages.
    pub deliveries: DeliveryReport,
}

impl PassReport {
    pub fn is_empty(&self) -> bool {
        self.discovered == 0
    }
}

/// Publishes everything a moderator dropped into the accepted folder.
pub struct PublicationPipeline<'a, C: SmtpConnector> {
    config: &'a RunConfig,
    connector: &'a C,
}

impl<'a, C: SmtpConnector> PublicationPipeline<'a, C> {
    pub fn new(config: &'a RunConfig, connector: &'a C) -> Self {
        Self { config, connector }
    }

    /// Runs one pass over the selected accepted folder.
    ///
    /// An empty folder returns straight away without touching SMTP. Otherwise
    /// every fetched message is rewritten, sent to each recipient and moved to
    /// the published folder, whatever the individual deliveries did.
    pub async fn publish_accepted<S: MailStore + ?Sized>(&self, store: &mut S) -> Result<PassReport> {
        let span = info_span!("publish", folder = %self.config.folders.accepted);
        self.run_pass(store).instrument(span).await
    }

    async fn run_pass<S: MailStore + ?Sized>(&self, store: &mut S) -> Result<PassReport> {
        let uids = store.search_all().await?;
        if uids.is_empty() {
            debug!("No accepted messages waiting");
            return Ok(PassReport::default());
        }
        info!("Found {} accepted messages", uids.len());

        let recipients = self.config.recipients.recipients()?;
        if recipients.is_empty() {
            warn!("Recipient list is empty; messages will be moved without being sent");
        }

        let mut session = self.connector.connect().await?;
        let result = self
            .publish_batch(store, &mut session, &uids, &recipients)
            .await;

        if let Err(e) = session.close().await {
            warn!("Failed to close SMTP session: {}", e);
        }
        result
    }

    async fn publish_batch<S: MailStore + ?Sized>(
        &self,
        store: &mut S,
        session: &mut C::Session,
        uids: &[Uid],
        recipients: &[String],
    ) -> Result<PassReport> {
        let fetched = store.fetch_raw(uids).await?;
        let mut report = PassReport {
            discovered: uids.len(),
            ..Default::default()
        };
        let mut seen = HashSet::with_capacity(fetched.len());

        for (uid, raw) in fetched {
            if !seen.insert(uid) {
                debug!("UID {} fetched twice, ignoring the repeat", uid);
                continue;
            }

            let mut message = match Message::parse(&raw) {
                Ok(message) => message,
                Err(e) => {
                    error!("Leaving UID {} in place, cannot parse it: {}", uid, e);
                    report.skipped.push(uid);
                    continue;
                }
            };

            stamp_reply_to(&mut message, &self.config.smtp.list_address);
            info!("Publishing UID {}: {}", uid, message.display_subject());
            cleanup_subject(&mut message, &self.config.subject_prefix);

            let sender = message
                .sender_address()
                .unwrap_or_else(|| self.config.smtp.list_address.clone());
            let deliveries = distribute(session, &sender, &message, recipients).await?;
            info!(
                "UID {} delivered to {} of {} recipients",
                uid,
                deliveries.delivered_count(),
                deliveries.attempted()
            );

            store
                .move_message(uid, &self.config.folders.published)
                .await?;
            report.published.push(uid);
            report.deliveries.merge(deliveries);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_report_is_empty() {
        let report = PassReport::default();
        assert!(report.is_empty());
        assert!(report.published.is_empty());
        assert_eq!(report.deliveries.attempted(), 0);
    }

    #[test]
    fn test_report_with_discoveries_is_not_empty() {
        let report = PassReport {
            discovered: 2,
            published: vec![1],
            skipped: vec![2],
            deliveries: DeliveryReport::default(),
        };
        assert!(!report.is_empty());
    }
}
