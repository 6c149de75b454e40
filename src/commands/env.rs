use std::sync::{Arc, Mutex};

use arboard::Clipboard;
use tokio::sync::mpsc::UnboundedSender;

use crate::app::AppMessage;

/// Shared environment for commands.
///
/// Provides access to shared resources like clipboard and app messaging.
/// Clone is cheap (Arc-based) so it can be passed to multiple commands.
#[derive(Clone)]
pub struct CommandEnv {
    clipboard: Arc<Mutex<Option<Clipboard>>>,
    app_tx: UnboundedSender<AppMessage>,
}

impl CommandEnv {
    pub fn new(app_tx: UnboundedSender<AppMessage>) -> Self {
        Self {
            clipboard: Arc::new(Mutex::new(None)),
            app_tx,
        }
    }

    /// Copy text to the system clipboard.
    ///
    /// On Linux, the clipboard is held by the application, so the text is
    /// only available while clipaction is running.
    pub fn set_clipboard(&self, text: &str) -> color_eyre::Result<()> {
        let mut guard = self
            .clipboard
            .lock()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to lock clipboard: {}", e))?;

        // Create clipboard on first use (lazy initialization)
        if guard.is_none() {
            *guard = Some(Clipboard::new()?);
        }

        if let Some(clipboard) = guard.as_mut() {
            clipboard.set_text(text)?;
        }

        Ok(())
    }

    /// Send a message to the App.
    ///
    /// Messages sent after the App stopped listening are dropped.
    pub fn send(&self, message: AppMessage) {
        let _ = self.app_tx.send(message);
    }

    /// Show an informational notice.
    pub fn notify(&self, message: impl Into<String>) {
        self.send(AppMessage::Notify(message.into()));
    }
}
