use crate::commands::Command;
use crate::commands::CommandEnv;
use async_trait::async_trait;

/// Command to copy action items to the system clipboard.
///
/// Items are joined with newlines into a single clipboard entry.
pub struct CopyToClipboardCmd {
    text: String,
    count: usize,
    env: CommandEnv,
}

impl CopyToClipboardCmd {
    pub fn new(items: &[String], env: CommandEnv) -> Self {
        Self {
            text: items.join("\n"),
            count: items.len(),
            env,
        }
    }
}

#[async_trait]
impl Command for CopyToClipboardCmd {
    fn name(&self) -> String {
        format!("Copying {} item(s) to clipboard", self.count)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        self.env.set_clipboard(&self.text)?;
        self.env
            .notify(format!("Copied {} item(s) to clipboard", self.count));
        Ok(())
    }
}
