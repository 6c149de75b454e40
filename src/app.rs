use std::collections::HashMap;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, warn};

use crate::action::{ActionError, ActionForm, ActionRequest, ActionResult};
use crate::commands::{
    Command, CommandEnv, CommandId, CommandTracker, CopyToClipboardCmd, RunActionCmd,
};
use crate::config::AppConfig;
use crate::history::HistoryStore;

/// Messages carrying the outcome of asynchronous work back to the App.
///
/// Everything that touches shared state, such as the command history,
/// happens while handling one of these on the control loop.
#[derive(Debug, Clone)]
pub enum AppMessage {
    // === Actions ===
    /// Non-terminal diagnostic from a running action
    ActionError { id: CommandId, text: String },
    /// An action's process exited (or never started)
    ActionFinished { id: CommandId, result: ActionResult },

    // === Commands ===
    /// A command's `execute` returned
    CommandCompleted { id: CommandId, success: bool },

    // === Feedback ===
    /// Display an error to the user
    DisplayError(String),
    /// Display an informational notice to the user
    Notify(String),
}

/// A finished action together with the template it was started from.
#[derive(Debug, Clone)]
pub struct Completion {
    pub id: CommandId,
    pub template: String,
    pub result: ActionResult,
}

/// Everything that happened during one [`App::run`].
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Finished actions, in completion order.
    pub completions: Vec<Completion>,
    /// Number of errors displayed to the user.
    pub errors: usize,
}

impl RunSummary {
    pub const fn has_failures(&self) -> bool {
        self.errors > 0
    }
}

/// Control loop owning the command history.
///
/// Actions are submitted synchronously and run in the background. Their
/// results come back as [`AppMessage`]s and are handled one at a time in
/// [`App::run`], so the history is only ever touched from here.
pub struct App {
    config: AppConfig,
    history: HistoryStore,
    tracker: CommandTracker,
    env: CommandEnv,
    app_rx: UnboundedReceiver<AppMessage>,
    templates: HashMap<CommandId, String>,
    summary: RunSummary,
}

impl App {
    pub fn new(config: AppConfig, history: HistoryStore) -> Self {
        let (app_tx, app_rx) = mpsc::unbounded_channel();
        Self {
            config,
            history,
            tracker: CommandTracker::new(),
            env: CommandEnv::new(app_tx),
            app_rx,
            templates: HashMap::new(),
            summary: RunSummary::default(),
        }
    }

    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Resolve and start an action.
    ///
    /// The raw template is recorded in history once the action has been
    /// accepted. Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error without starting anything if the template is empty
    /// or needs input that was not given.
    pub fn submit(&mut self, form: ActionForm) -> Result<CommandId, ActionError> {
        let request = ActionRequest::prepare(&form).inspect_err(|err| {
            warn!(template = %form.template, %err, "Rejected action");
        })?;

        self.history.add(form.template.clone());

        let id = self
            .tracker
            .start(format!("Running `{}`", request.command));
        self.templates.insert(id, form.template);
        self.spawn(id, Box::new(RunActionCmd::new(id, request, self.env.clone())));
        Ok(id)
    }

    /// Handle messages until every started command has completed, then
    /// persist the history.
    pub async fn run(&mut self) -> RunSummary {
        while self.tracker.has_running() {
            let Some(message) = self.app_rx.recv().await else {
                break;
            };
            self.handle_message(message);
        }

        self.history.save();
        std::mem::take(&mut self.summary)
    }

    fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::ActionError { id, text } => {
                debug!(%id, "Action reported an error");
                self.display_error(text);
            }
            AppMessage::ActionFinished { id, result } => self.handle_finished(id, result),
            AppMessage::CommandCompleted { id, success } => {
                self.tracker.complete(id, success);
            }
            AppMessage::DisplayError(text) => self.display_error(text),
            AppMessage::Notify(text) => {
                info!(%text, "Notice");
                eprintln!("{text}");
            }
        }
    }

    fn handle_finished(&mut self, id: CommandId, result: ActionResult) {
        let template = self.templates.remove(&id).unwrap_or_default();
        info!(
            %id,
            template = %template,
            items = result.items.len(),
            success = result.is_success(),
            exit_code = ?result.exit_code,
            "Action finished"
        );

        if let Some(error) = &result.error {
            self.display_error(error.clone());
        }

        if self.config.copy_items && !result.items.is_empty() {
            let cmd = CopyToClipboardCmd::new(&result.item_strings(), self.env.clone());
            let copy_id = self.tracker.start(cmd.name());
            self.spawn(copy_id, Box::new(cmd));
        }

        self.summary.completions.push(Completion {
            id,
            template,
            result,
        });
    }

    fn spawn(&self, id: CommandId, command: Box<dyn Command>) {
        let env = self.env.clone();
        tokio::spawn(async move {
            let result = command.execute().await;
            if let Err(err) = &result {
                env.send(AppMessage::DisplayError(format!("{err:#}")));
            }
            env.send(AppMessage::CommandCompleted {
                id,
                success: result.is_ok(),
            });
        });
    }

    fn display_error(&mut self, text: String) {
        error!(%text, "Displaying error");
        eprintln!("error: {text}");
        self.summary.errors += 1;
    }
}
