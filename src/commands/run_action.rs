use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::action::{ActionEvent, ActionExecutor, ActionRequest};
use crate::app::AppMessage;
use crate::commands::{Command, CommandEnv, CommandId};

/// Command that runs one action and forwards its events to the App.
pub struct RunActionCmd {
    id: CommandId,
    executor: ActionExecutor,
    env: CommandEnv,
}

impl RunActionCmd {
    pub fn new(id: CommandId, request: ActionRequest, env: CommandEnv) -> Self {
        Self {
            id,
            executor: ActionExecutor::new(request),
            env,
        }
    }
}

#[async_trait]
impl Command for RunActionCmd {
    fn name(&self) -> String {
        format!("Running `{}`", self.executor.request().command)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self { id, executor, env } = *self;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = executor.start(tx);

        while let Some(event) = rx.recv().await {
            let message = match event {
                ActionEvent::Error(text) => AppMessage::ActionError { id, text },
                ActionEvent::Finished(result) => AppMessage::ActionFinished { id, result },
            };
            env.send(message);
        }

        handle.await?;
        Ok(())
    }
}
