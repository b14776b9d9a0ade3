//! Shutdown token shared by the poll sleep and the IDLE wait.

use log::info;
use tokio::sync::watch;

/// Creates a linked trigger/token pair. The token starts untriggered.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Sending half; fires the shutdown once.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Requests shutdown. Safe to call repeatedly.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Hands the trigger to a handler for Ctrl-C, SIGTERM and SIGHUP.
    pub fn install_ctrlc(self) -> Result<(), ctrlc::Error> {
        ctrlc::set_handler(move || {
            info!("Interrupt received, stopping after the current step");
            self.trigger();
        })
    }
}

/// Receiving half, cloned into whatever needs to wait on it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown has been requested.
    ///
    /// If the trigger is dropped without firing, this never resolves.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
