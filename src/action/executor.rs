//! Process lifecycle for a single action run.
//!
//! The executor spawns the resolved command through the system shell, feeds
//! it the input, drains stdout and stderr concurrently and reports exactly
//! one [`ActionEvent::Finished`] once the process has exited.
//!
//! Background processes started by the command inherit its pipes. Reading
//! stops [`DRAIN_WINDOW`] after the shell exits, so they cannot hold back
//! the result; output they write later is discarded.
//!
//! There is no timeout and no cancellation: dropping the handle returned by
//! [`ActionExecutor::start`] stops listening but leaves the process running.

use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::{ActionError, ActionRequest, ActionResult, split};

/// How long pipes are still read after the process has exited.
pub const DRAIN_WINDOW: Duration = Duration::from_millis(100);

/// Notifications emitted while an action runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    /// Non-terminal diagnostic, e.g. a failed stdin write.
    Error(String),
    /// Terminal event, sent exactly once per run.
    Finished(ActionResult),
}

/// Shell used to interpret resolved commands.
#[derive(Debug, Clone)]
struct Shell {
    program: String,
    flag: &'static str,
}

impl Shell {
    #[cfg(windows)]
    fn system() -> Self {
        Self {
            program: "cmd".to_string(),
            flag: "/C",
        }
    }

    #[cfg(not(windows))]
    fn system() -> Self {
        Self {
            program: "sh".to_string(),
            flag: "-c",
        }
    }

    fn command(&self, line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(self.flag).arg(line);
        cmd
    }
}

/// Runs one [`ActionRequest`] to completion.
pub struct ActionExecutor {
    request: ActionRequest,
    shell: Shell,
}

impl ActionExecutor {
    pub fn new(request: ActionRequest) -> Self {
        Self {
            request,
            shell: Shell::system(),
        }
    }

    pub const fn request(&self) -> &ActionRequest {
        &self.request
    }

    /// Run the action on the tokio runtime without blocking the caller.
    ///
    /// Events are delivered on `events`; the last one is always
    /// [`ActionEvent::Finished`], after which the sender is dropped.
    pub fn start(self, events: UnboundedSender<ActionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let result = self.run(&events).await;
            let _ = events.send(ActionEvent::Finished(result));
        })
    }

    /// Run the action and return its result.
    ///
    /// Non-terminal errors are sent on `events`; the terminal result is
    /// returned rather than sent.
    pub async fn run(self, events: &UnboundedSender<ActionEvent>) -> ActionResult {
        let command = self.request.command.as_str();
        debug!(command, capture = self.request.capture_output, "Starting action");

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(command, %err, "Failed to spawn action");
                return ActionResult::spawn_failed(&err);
            }
        };

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let exited = CancellationToken::new();
        let (status, (), output, errors) = tokio::join!(
            async {
                let status = child.wait().await;
                exited.cancel();
                status
            },
            write_input(stdin, self.request.input.clone(), events, &exited),
            read_stream(stdout, "stdout", events, &exited),
            read_stream(stderr, "stderr", events, &exited),
        );

        let items = if self.request.capture_output {
            split::split(&output, &self.request.separator)
        } else {
            Vec::new()
        };

        match status {
            Ok(status) => finish(status, items, &errors),
            Err(err) => {
                warn!(command, %err, "Failed to wait for action");
                ActionResult {
                    items,
                    error: Some(format!("Failed to wait for command: {err}")),
                    exit_code: None,
                }
            }
        }
    }

    fn spawn(&self) -> Result<Child, ActionError> {
        let stdin = if self.request.input.is_empty() {
            Stdio::null()
        } else {
            Stdio::piped()
        };
        let stdout = if self.request.capture_output {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        self.shell
            .command(&self.request.command)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ActionError::Spawn)
    }
}

fn finish(status: ExitStatus, items: Vec<Bytes>, errors: &[u8]) -> ActionResult {
    debug!(%status, items = items.len(), "Action finished");

    if status.success() {
        if !errors.is_empty() {
            debug!(stderr = %String::from_utf8_lossy(errors), "Action wrote to stderr");
        }
        return ActionResult {
            items,
            error: None,
            exit_code: status.code(),
        };
    }

    let text = String::from_utf8_lossy(errors);
    let text = text.trim_end_matches(['\n', '\r']);
    let error = if text.is_empty() {
        format!("Command failed with {status}")
    } else {
        text.to_string()
    };

    ActionResult {
        items,
        error: Some(error),
        exit_code: status.code(),
    }
}

/// Resolves once the drain window after process exit has passed.
async fn drained(exited: &CancellationToken) {
    exited.cancelled().await;
    tokio::time::sleep(DRAIN_WINDOW).await;
}

async fn write_input(
    stdin: Option<ChildStdin>,
    input: Bytes,
    events: &UnboundedSender<ActionEvent>,
    exited: &CancellationToken,
) {
    let Some(mut stdin) = stdin else {
        return;
    };

    let written = tokio::select! {
        written = stdin.write_all(&input) => written,
        () = drained(exited) => {
            debug!("Action exited before reading all input");
            return;
        }
    };

    match written {
        Ok(()) => trace!(bytes = input.len(), "Wrote action input"),
        // The process exited or closed stdin without reading everything.
        Err(err) if err.kind() == ErrorKind::BrokenPipe => {
            debug!("Action closed stdin before reading all input");
        }
        Err(err) => {
            let _ = events.send(ActionEvent::Error(format!(
                "Failed to write input to command: {err}"
            )));
        }
    }
    // Dropping stdin closes the pipe and signals end of input.
}

async fn read_stream<R: AsyncRead + Unpin>(
    stream: Option<R>,
    name: &'static str,
    events: &UnboundedSender<ActionEvent>,
    exited: &CancellationToken,
) -> Vec<u8> {
    let mut buffer = Vec::new();
    let Some(mut stream) = stream else {
        return buffer;
    };

    let deadline = drained(exited);
    tokio::pin!(deadline);

    loop {
        let read = tokio::select! {
            read = stream.read_buf(&mut buffer) => read,
            () = &mut deadline => {
                debug!(stream = name, "Pipe still open after action exited");
                break;
            }
        };

        match read {
            Ok(0) => break,
            Ok(read) => trace!(stream = name, bytes = read, "Read action output"),
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => {
                let _ = events.send(ActionEvent::Error(format!(
                    "Failed to read command {name}: {err}"
                )));
                break;
            }
        }
    }
    buffer
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Instant;

    use tokio::sync::mpsc;

    use super::*;

    fn request(command: &str, input: &str) -> ActionRequest {
        ActionRequest {
            command: command.to_string(),
            input: Bytes::copy_from_slice(input.as_bytes()),
            capture_output: true,
            separator: "\n".to_string(),
        }
    }

    async fn run(request: ActionRequest) -> (ActionResult, Vec<ActionEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = ActionExecutor::new(request).run(&tx).await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (result, events)
    }

    #[tokio::test]
    async fn test_output_is_split_into_items() {
        let (result, events) = run(request("printf 'line1\\nline2\\n'", "")).await;

        assert_eq!(result.item_strings(), vec!["line1", "line2"]);
        assert_eq!(result.error, None);
        assert_eq!(result.exit_code, Some(0));
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_failure_reports_stderr() {
        let (result, _) = run(request("printf boom >&2; exit 1", "")).await;

        assert!(result.items.is_empty());
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(result.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_output() {
        let (result, _) = run(request("echo partial; echo broken >&2; exit 2", "")).await;

        assert_eq!(result.item_strings(), vec!["partial"]);
        assert_eq!(result.error.as_deref(), Some("broken"));
        assert_eq!(result.exit_code, Some(2));
    }

    #[tokio::test]
    async fn test_failure_without_stderr_is_not_silent() {
        let (result, _) = run(request("exit 3", "")).await;

        let error = result.error.unwrap();
        assert!(error.contains('3'), "unexpected error text: {error}");
    }

    #[tokio::test]
    async fn test_input_is_written_to_stdin() {
        let (result, _) = run(request("cat", "a\nb")).await;

        assert_eq!(result.item_strings(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_uncaptured_output_yields_no_items() {
        let mut request = request("echo hi", "");
        request.capture_output = false;

        let (result, _) = run(request).await;
        assert!(result.items.is_empty());
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_stderr_captured_without_output_capture() {
        let mut request = request("echo out; echo err >&2; false", "");
        request.capture_output = false;

        let (result, _) = run(request).await;
        assert!(result.items.is_empty());
        assert_eq!(result.error.as_deref(), Some("err"));
    }

    #[tokio::test]
    async fn test_unknown_command_fails() {
        let (result, _) = run(request("clipaction-no-such-command-xyz", "")).await;

        assert_eq!(result.exit_code, Some(127));
        assert!(result.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_unread_input_is_not_an_error() {
        let input = "x".repeat(1 << 20);
        let (result, events) = run(request("true", &input)).await;

        assert!(result.is_success());
        assert!(events.is_empty(), "unexpected events: {events:?}");
    }

    #[tokio::test]
    async fn test_spawn_failure_has_no_exit_code() {
        let executor = ActionExecutor {
            request: request("echo hi", ""),
            shell: Shell {
                program: "/nonexistent-shell".to_string(),
                flag: "-c",
            },
        };
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = executor.run(&tx).await;

        assert!(result.items.is_empty());
        assert!(result.error.is_some());
        assert_eq!(result.exit_code, None);
    }

    #[tokio::test]
    async fn test_background_process_does_not_delay_result() {
        let started = Instant::now();
        let (result, _) = run(request("sleep 3 & echo hi", "")).await;

        assert_eq!(result.item_strings(), vec!["hi"]);
        assert!(result.is_success());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_background_process_holding_stderr_does_not_delay_result() {
        let mut request = request("sleep 3 >/dev/null & echo hi", "");
        request.capture_output = false;

        let started = Instant::now();
        let (result, _) = run(request).await;

        assert!(result.is_success());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_start_emits_single_finished_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ActionExecutor::new(request("echo done", "")).start(tx);

        let Some(ActionEvent::Finished(result)) = rx.recv().await else {
            panic!("expected a finished event");
        };
        assert_eq!(result.item_strings(), vec!["done"]);
        assert!(rx.recv().await.is_none());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_large_output_does_not_deadlock() {
        let (result, _) = run(request("cat", &"line\n".repeat(100_000))).await;

        assert_eq!(result.items.len(), 100_000);
    }
}
