// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use futures::StreamExt;
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use clap::Parser;
use cli::{Cli, Commands};
use crew_client::{AgentId, StreamEvent, StreamTransport, TodoItem, WorkflowApi, WorkflowClient};
use crew_config::Config;
use crew_tui::chat::markdown::system_info_markdown;
use crew_tui::{App, AppOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    init_logging(cli.verbose, cli.log_file.as_deref(), cli.command.is_none())?;

    // Subcommands that need neither config nor backend.
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            cli::print_completions(*shell);
            return Ok(());
        }
        Some(Commands::Agents) => {
            for agent in AgentId::KNOWN.iter() {
                println!("{:<16} {}", agent.as_str(), agent.display_name());
            }
            return Ok(());
        }
        _ => {}
    }

    let mut config = crew_config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.server {
        config.server.base_url = url.clone();
    }

    match cli.command.take() {
        None => run_tui(&cli, config).await,
        Some(Commands::ShowConfig) => {
            println!("{}", toml::to_string_pretty(&config).context("serializing config")?);
            Ok(())
        }
        Some(cmd) => run_command(cmd, &config).await,
    }
}

/// Run one backend operation headlessly and print the result.
async fn run_command(cmd: Commands, config: &Config) -> anyhow::Result<()> {
    let client = WorkflowClient::from_config(&config.server).context("building HTTP client")?;
    debug!(base = %client.base_url(), "headless command");

    match cmd {
        Commands::Init { request, no_auto_start } => {
            let request = request.or_else(|| config.server.user_request.clone());
            let init = client
                .initialize(!no_auto_start, request.as_deref())
                .await
                .context("initializing workflow")?;
            if let Some(message) = &init.message {
                println!("{message}");
            }
            if let Some(agent) = &init.current_agent {
                println!("Current agent: {}", agent.display_name());
            }
            if let Some(id) = &init.response_id {
                println!("Opening response: {id}");
            }
        }
        Commands::Send { message } => send_turn(&client, &message).await?,
        Commands::Switch { agent } => {
            let agent = AgentId::from(agent.as_str());
            let switched = client.switch_agent(&agent).await.context("switching agent")?;
            let name = switched.agent_name.as_deref().unwrap_or(agent.display_name());
            println!("Switched to {name}");
        }
        Commands::Todo => {
            let items = client.todo_list().await.context("loading to-do list")?;
            print_todos(&items)?;
        }
        Commands::Complete { task_number } => {
            let task_number = usize::try_from(task_number).context("task number out of range")?;
            let ack = client.complete_task(task_number).await.context("completing task")?;
            println!("{}", ack.message.as_deref().unwrap_or("Task marked complete"));
            let items = client.todo_list().await.context("loading to-do list")?;
            print_todos(&items)?;
        }
        Commands::Browse { path } => {
            let entries = client.browse_files(path.as_deref()).await.context("browsing files")?;
            let mut out = io::stdout().lock();
            for e in entries {
                let kind = if e.is_dir() { "dir " } else { "file" };
                writeln!(out, "{kind}  {}", e.path)?;
            }
        }
        Commands::Read { path } => {
            let content = client.read_file(&path).await.with_context(|| format!("reading {path}"))?;
            print!("{content}");
        }
        Commands::Exec { command } => {
            let command = command.join(" ");
            let output = client
                .execute_command(&command)
                .await
                .with_context(|| format!("executing `{command}`"))?;
            print!("{output}");
        }
        Commands::Sysinfo => {
            let info = client.system_info().await.context("loading system info")?;
            print!("{}", system_info_markdown(&info));
        }
        Commands::Cleanup => {
            let ack = client.cleanup().await.context("cleaning up backend resources")?;
            println!("{}", ack.message.as_deref().unwrap_or("Resources cleaned up"));
        }
        Commands::Agents | Commands::ShowConfig | Commands::Completions { .. } => {}
    }
    Ok(())
}

/// Submit one message and copy the response stream to stdout.
async fn send_turn(client: &WorkflowClient, message: &str) -> anyhow::Result<()> {
    let message = message.trim();
    anyhow::ensure!(!message.is_empty(), "message is empty");

    let started = client.submit_turn(message).await.context("submitting message")?;
    let mut stream = client
        .open(&started.response_id)
        .await
        .context("opening response stream")?;

    let mut out = io::stdout();
    while let Some(item) = stream.next().await {
        match item.context("response stream interrupted")? {
            StreamEvent::Fragment(text) => {
                out.write_all(text.as_bytes())?;
                out.flush()?;
            }
            StreamEvent::Completed(done) => {
                writeln!(out)?;
                if let Some(next) = &done.next_agent {
                    let name = done.next_agent_name.as_deref().unwrap_or(next.display_name());
                    writeln!(out, "\nNext agent: {name}")?;
                }
                if let Some(items) = &done.todo_items {
                    writeln!(out)?;
                    print_todos(items)?;
                }
                return Ok(());
            }
        }
    }
    anyhow::bail!("response stream ended before completion")
}

fn print_todos(items: &[TodoItem]) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if items.is_empty() {
        writeln!(out, "No tasks")?;
    }
    for (i, item) in items.iter().enumerate() {
        let mark = if item.is_completed() { "x" } else { " " };
        writeln!(out, "{}. [{mark}] {}: {}", i + 1, item.agent.display_name(), item.description)?;
    }
    Ok(())
}

async fn run_tui(cli: &Cli, mut config: Config) -> anyhow::Result<()> {
    anyhow::ensure!(
        is_stdin_tty(),
        "the TUI needs an interactive terminal; see `crew --help` for headless commands"
    );
    if cli.no_auto_start {
        config.server.auto_start = false;
    }
    if let Some(request) = &cli.request {
        config.server.user_request = Some(request.clone());
    }

    let client = WorkflowClient::from_config(&config.server).context("building HTTP client")?;
    let options = AppOptions::from_config(&config);
    let app = App::new(config, options, client);

    let terminal = ratatui::init();
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}

fn init_logging(verbosity: u8, log_file: Option<&Path>, tui: bool) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        // stderr would draw over the TUI.
        None if tui => registry.init(),
        None => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init(),
    }
    Ok(())
}

fn is_stdin_tty() -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        unsafe { libc::isatty(io::stdin().as_raw_fd()) != 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
