//! Repeats publication passes according to the run mode.

use std::fmt;

use log::{debug, info};

use crate::config::RunConfig;
use crate::error::Result;
use crate::imap::{IdleEvent, MailStore};
use crate::pipeline::{PassReport, PublicationPipeline};
use crate::smtp::SmtpConnector;

use super::shutdown::Shutdown;

/// How often the accepted folder gets processed.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One pass, then exit.
    #[default]
    Single,
    /// A pass every poll interval.
    Poll,
    /// A pass whenever the server reports activity (IMAP IDLE).
    Idle,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunMode::Single => "single",
            RunMode::Poll => "poll",
            RunMode::Idle => "idle",
        };
        f.write_str(name)
    }
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not started.
    Idle,
    /// Running passes, possibly sleeping between them.
    Polling,
    /// Parked in IMAP IDLE.
    IdleWait,
    Stopped,
}

/// Totals over every pass of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passes: usize,
    pub published: usize,
    pub skipped: usize,
    pub delivered: usize,
    pub failed: usize,
    /// The run ended because shutdown was requested.
    pub interrupted: bool,
}

impl RunSummary {
    fn record(&mut self, report: &PassReport) {
        self.passes += 1;
        self.published += report.published.len();
        self.skipped += report.skipped.len();
        self.delivered += report.deliveries.delivered_count();
        self.failed += report.deliveries.failed_count();
    }
}

/// Drives passes over an already selected accepted folder.
pub struct RunLoop<'a, C: SmtpConnector> {
    config: &'a RunConfig,
    pipeline: PublicationPipeline<'a, C>,
    shutdown: Shutdown,
    max_passes: Option<usize>,
    state: RunState,
    summary: RunSummary,
}

impl<'a, C: SmtpConnector> RunLoop<'a, C> {
    pub fn new(config: &'a RunConfig, connector: &'a C, shutdown: Shutdown) -> Self {
        Self {
            config,
            pipeline: PublicationPipeline::new(config, connector),
            shutdown,
            max_passes: None,
            state: RunState::Idle,
            summary: RunSummary::default(),
        }
    }

    /// Stops after `max` passes in poll and idle mode. Single mode always
    /// runs exactly one.
    pub fn with_max_passes(mut self, max: usize) -> Self {
        self.max_passes = Some(max);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Runs until the mode's end condition, a shutdown request, or an error.
    pub async fn run<S: MailStore + ?Sized>(&mut self, store: &mut S) -> Result<RunSummary> {
        info!("Run loop starting in {} mode", self.config.mode);
        let result = match self.config.mode {
            RunMode::Single => self.poll_loop(store, Some(1)).await,
            RunMode::Poll => self.poll_loop(store, self.max_passes).await,
            RunMode::Idle => self.idle_loop(store).await,
        };
        self.state = RunState::Stopped;
        result?;

        info!(
            "Run loop stopped after {} passes: {} published, {} deliveries, {} failures",
            self.summary.passes, self.summary.published, self.summary.delivered, self.summary.failed
        );
        Ok(self.summary.clone())
    }

    async fn pass<S: MailStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        let report = self.pipeline.publish_accepted(store).await?;
        self.summary.record(&report);
        Ok(())
    }

    fn reached_max(&self, max: Option<usize>) -> bool {
        max.is_some_and(|max| self.summary.passes >= max)
    }

    async fn poll_loop<S: MailStore + ?Sized>(&mut self, store: &mut S, max: Option<usize>) -> Result<()> {
        self.state = RunState::Polling;
        loop {
            self.pass(store).await?;
            if self.reached_max(max) {
                return Ok(());
            }

            debug!("Sleeping {:?} until the next pass", self.config.poll_interval);
            let interrupted = tokio::select! {
                biased;
                _ = self.shutdown.triggered() => true,
                _ = tokio::time::sleep(self.config.poll_interval) => false,
            };
            if interrupted {
                info!("Shutdown requested, leaving poll loop");
                self.summary.interrupted = true;
                return Ok(());
            }
        }
    }

    async fn idle_loop<S: MailStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        self.state = RunState::Polling;
        // Catch up on anything accepted while nobody was listening
        self.pass(store).await?;

        loop {
            if self.reached_max(self.max_passes) {
                return Ok(());
            }
            if self.shutdown.is_triggered() {
                info!("Shutdown requested, not re-entering IDLE");
                self.summary.interrupted = true;
                return Ok(());
            }

            self.state = RunState::IdleWait;
            debug!("Entering IDLE for up to {:?}", self.config.idle_timeout);
            let event = store
                .idle_wait(self.config.idle_timeout, &mut self.shutdown)
                .await?;

            match event {
                IdleEvent::Activity => {
                    debug!("Server reported activity");
                    self.state = RunState::Polling;
                    self.pass(store).await?;
                }
                IdleEvent::Timeout => {
                    debug!("IDLE timed out, refreshing");
                }
                IdleEvent::Interrupted => {
                    info!("Shutdown requested, IDLE terminated");
                    self.summary.interrupted = true;
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributor::{DeliveryReport, FailedDelivery};

    #[test]
    fn test_run_mode_display() {
        assert_eq!(RunMode::Single.to_string(), "single");
        assert_eq!(RunMode::Poll.to_string(), "poll");
        assert_eq!(RunMode::Idle.to_string(), "idle");
        assert_eq!(RunMode::default(), RunMode::Single);
    }

    #[test]
    fn test_run_mode_parses_from_cli_value() {
        use clap::ValueEnum;
        assert_eq!(RunMode::from_str("idle", true).unwrap(), RunMode::Idle);
        assert!(RunMode::from_str("daemon", true).is_err());
    }

    #[test]
    fn test_summary_records_pass() {
        let mut summary = RunSummary::default();
        summary.record(&PassReport {
            discovered: 3,
            published: vec![1, 2],
            skipped: vec![3],
            deliveries: DeliveryReport {
                delivered: vec!["a@x.com".to_string(), "a@x.com".to_string()],
                failed: vec![FailedDelivery {
                    recipient: "b@x.com".to_string(),
                    reason: "550".to_string(),
                }],
            },
        });
        summary.record(&PassReport::default());

        assert_eq!(summary.passes, 2);
        assert_eq!(summary.published, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.interrupted);
    }
}
