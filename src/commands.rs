//! Async commands pattern for side effects.
//!
//! Commands represent async operations that run outside the control loop.
//! The App spawns them, tracks them until completion and receives their
//! results as [`AppMessage`]s.

mod clipboard;
mod env;
mod run_action;
mod tracker;

use crate::app::AppMessage;
use async_trait::async_trait;
pub use clipboard::CopyToClipboardCmd;
pub use env::CommandEnv;
pub use run_action::RunActionCmd;
pub use tracker::{CommandId, CommandTracker};

/// Async commands that perform side effects.
///
/// Commands are spawned by the App and tracked until they complete.
/// They send results back to the App through [`CommandEnv`].
#[async_trait]
pub trait Command: Send + 'static {
    /// Human-readable name for logging.
    /// Include context like the command line being run.
    fn name(&self) -> String;

    /// Execute the command.
    async fn execute(self: Box<Self>) -> color_eyre::Result<()>;
}
