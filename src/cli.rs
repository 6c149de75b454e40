use clap::Parser;

use crate::action::{ActionForm, ActionOptions};
use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "clipaction",
    version,
    about = "Run command templates against text and split the output into items"
)]
pub struct Args {
    /// Command templates to run; `%s` is replaced by the input text
    #[arg(required_unless_present_any = ["history", "complete"])]
    pub commands: Vec<String>,

    /// Input text (use "-" to read it from stdin)
    #[arg(short, long, default_value = "")]
    pub input: String,

    /// Do not pass the input text to the command's stdin
    #[arg(long)]
    pub no_stdin: bool,

    /// Do not capture the command's output
    #[arg(long)]
    pub no_output: bool,

    /// Separator for splitting output into items (defaults to a newline)
    #[arg(short, long)]
    pub separator: Option<String>,

    /// Copy the resulting items to the clipboard
    ///
    /// On Linux (X11 and Wayland) the clipboard is served by clipaction
    /// itself, so the copied items are lost once it exits.
    #[arg(long)]
    pub copy: bool,

    /// Print items as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the command history, most recent first
    #[arg(long, conflicts_with = "complete")]
    pub history: bool,

    /// Print history entries matching a pattern, best match first
    #[arg(long, value_name = "PATTERN")]
    pub complete: Option<String>,
}

impl Args {
    /// Apply command line overrides to the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(separator) = &self.separator {
            config.separator.clone_from(separator);
        }
        if self.copy {
            config.copy_items = true;
        }
    }

    /// Build one form per command template.
    pub fn forms(&self, input: &str, config: &AppConfig) -> Vec<ActionForm> {
        let options = ActionOptions {
            pass_input: !self.no_stdin,
            capture_output: !self.no_output,
            separator: config.separator.clone(),
        };

        self.commands
            .iter()
            .map(|template| ActionForm {
                template: template.clone(),
                input: input.to_string(),
                options: options.clone(),
            })
            .collect()
    }

    pub fn reads_input_from_stdin(&self) -> bool {
        self.input == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forms_use_config_separator() {
        let args = Args::parse_from(["clipaction", "-i", "text", "--no-stdin", "wc -c %s", "cat"]);
        let mut config = AppConfig::default();
        config.separator = ",".to_string();

        let forms = args.forms(&args.input, &config);
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[0].template, "wc -c %s");
        assert_eq!(forms[1].input, "text");
        assert!(!forms[0].options.pass_input);
        assert!(forms[0].options.capture_output);
        assert_eq!(forms[0].options.separator, ",");
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["clipaction", "--copy", "-s", "|", "ls"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert!(config.copy_items);
        assert_eq!(config.separator, "|");
    }

    #[test]
    fn test_history_needs_no_command() {
        assert!(Args::try_parse_from(["clipaction", "--history"]).is_ok());
        assert!(Args::try_parse_from(["clipaction", "--complete", "gr"]).is_ok());
        assert!(Args::try_parse_from(["clipaction"]).is_err());
    }

    #[test]
    fn test_copy_help_mentions_linux_clipboard() {
        use clap::CommandFactory;

        let command = Args::command();
        let copy = command
            .get_arguments()
            .find(|arg| arg.get_id() == "copy")
            .unwrap();
        let help = copy.get_long_help().unwrap().to_string();
        assert!(help.contains("lost once it exits"), "{help}");
    }

    #[test]
    fn test_stdin_input() {
        let args = Args::parse_from(["clipaction", "-i", "-", "cat"]);
        assert!(args.reads_input_from_stdin());
    }
}
