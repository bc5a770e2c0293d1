// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "crew",
    about = "Terminal client for a multi-agent workflow backend",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL, e.g. http://127.0.0.1:5001 (overrides server.base_url)
    #[arg(long, short = 's', env = "CREW_SERVER_URL", global = true)]
    pub server: Option<String>,

    /// Path to config file (layered on top of auto-discovered files)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Do not ask the backend for an opening response when the TUI starts
    #[arg(long)]
    pub no_auto_start: bool,

    /// Initial request sent with workflow initialization
    #[arg(long, value_name = "TEXT")]
    pub request: Option<String>,

    /// Append logs to this file.  Without it the TUI does not log at all.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the workflow and print the backend's answer
    Init {
        /// Initial request forwarded to the backend
        #[arg(long, value_name = "TEXT")]
        request: Option<String>,
        /// Do not start an opening agent response
        #[arg(long)]
        no_auto_start: bool,
    },
    /// Send one message and stream the agent's response to stdout
    Send {
        #[arg(value_name = "MESSAGE")]
        message: String,
    },
    /// Switch the current agent (id such as `ceo` or `web_searcher`)
    Switch {
        #[arg(value_name = "AGENT")]
        agent: String,
    },
    /// Print the to-do list
    Todo,
    /// Mark a task complete by its 1-based number in the to-do list
    Complete {
        #[arg(value_name = "TASK_NUMBER", value_parser = clap::value_parser!(u64).range(1..))]
        task_number: u64,
    },
    /// List a backend directory (default: the backend's root)
    Browse {
        #[arg(value_name = "PATH")]
        path: Option<String>,
    },
    /// Print a backend file
    Read {
        #[arg(value_name = "PATH")]
        path: String,
    },
    /// Run a command on the backend host and print its output
    Exec {
        #[arg(value_name = "COMMAND", required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Print backend host information
    Sysinfo,
    /// Ask the backend to release its resources
    Cleanup,
    /// List the agents the client knows about
    Agents,
    /// Print the effective configuration and exit
    ShowConfig,
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "crew", &mut std::io::stdout());
}
