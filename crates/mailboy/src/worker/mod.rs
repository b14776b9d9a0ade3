//! Long-running side of the relay: run modes, shutdown and session lifecycle.

pub mod run_loop;
pub mod session;
pub mod shutdown;

pub use run_loop::{RunLoop, RunMode, RunState, RunSummary};
pub use session::{run, run_session};
pub use shutdown::{Shutdown, ShutdownTrigger};
