use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::Result;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::{App, Completion};
use crate::history::HistoryStore;

mod action;
mod app;
mod cli;
mod commands;
mod config;
mod history;
mod search;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let _guard = initialize_logging()?;
    info!("Starting clipaction");

    let args = cli::Args::parse();

    let mut config = config::load()?;
    args.apply(&mut config);

    let mut history = HistoryStore::new(config.history_capacity(), config::history_path());
    history.load();

    if args.history {
        print_lines(history.recent().iter().map(String::as_str))?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(pattern) = &args.complete {
        print_lines(history.suggestions(pattern))?;
        return Ok(ExitCode::SUCCESS);
    }

    let input = if args.reads_input_from_stdin() {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        input
    } else {
        args.input.clone()
    };

    let forms = args.forms(&input, &config);
    let mut app = App::new(config, history);
    let mut rejected = false;
    let mut order = Vec::new();
    for form in forms {
        let template = form.template.clone();
        match app.submit(form) {
            Ok(id) => order.push(id),
            Err(err) => {
                eprintln!("error: `{template}`: {err}");
                rejected = true;
            }
        }
    }

    let mut summary = app.run().await;
    info!(
        completed = summary.completions.len(),
        history = app.history().len(),
        "All actions finished"
    );
    summary
        .completions
        .sort_by_key(|c| order.iter().position(|id| *id == c.id));

    if args.json {
        print_json(&summary.completions)?;
    } else {
        print_items(&summary.completions)?;
    }

    if rejected || summary.has_failures() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Serialize)]
struct CompletionOutput<'a> {
    command: &'a str,
    items: Vec<String>,
    error: Option<&'a str>,
    exit_code: Option<i32>,
}

fn print_json(completions: &[Completion]) -> Result<()> {
    let output: Vec<CompletionOutput<'_>> = completions
        .iter()
        .map(|c| CompletionOutput {
            command: &c.template,
            items: c.result.item_strings(),
            error: c.result.error.as_deref(),
            exit_code: c.result.exit_code,
        })
        .collect();

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}

fn print_items(completions: &[Completion]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for item in completions.iter().flat_map(|c| &c.result.items) {
        stdout.write_all(item)?;
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

fn print_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}

fn initialize_logging() -> Result<WorkerGuard> {
    let directory = dirs::data_local_dir().map_or_else(
        || std::path::PathBuf::from("logs"),
        |path| path.join("clipaction").join("logs"),
    );
    std::fs::create_dir_all(&directory)?;

    let file_appender = tracing_appender::rolling::daily(&directory, "clipaction.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(guard)
}
