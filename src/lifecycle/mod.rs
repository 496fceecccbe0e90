//! Process lifecycle: startup orchestration, signal handling, graceful
//! shutdown with a bounded drain window.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, StartupError};
