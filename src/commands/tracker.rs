use std::time::{Duration, Instant};

use tracing::debug;

/// Unique identifier for a tracked command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A running command being tracked.
#[derive(Debug)]
struct RunningCommand {
    id: CommandId,
    name: String,
    started_at: Instant,
}

/// Tracks running commands so the App knows when all work is done.
#[derive(Debug, Default)]
pub struct CommandTracker {
    running: Vec<RunningCommand>,
    next_id: u64,
}

impl CommandTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new command, returns its ID.
    pub fn start(&mut self, name: String) -> CommandId {
        let id = CommandId(self.next_id);
        self.next_id += 1;
        debug!(%id, name = %name, "Command started");
        self.running.push(RunningCommand {
            id,
            name,
            started_at: Instant::now(),
        });
        id
    }

    /// Mark a command as completed, returning how long it ran.
    ///
    /// Unknown IDs are ignored.
    pub fn complete(&mut self, id: CommandId, success: bool) -> Option<Duration> {
        let pos = self.running.iter().position(|c| c.id == id)?;
        let cmd = self.running.remove(pos);
        let elapsed = cmd.started_at.elapsed();
        debug!(%id, name = %cmd.name, success, ?elapsed, "Command completed");
        Some(elapsed)
    }

    /// Check if any commands are running.
    pub fn has_running(&self) -> bool {
        !self.running.is_empty()
    }
}
