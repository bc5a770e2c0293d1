// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde default helper — returns `true`.
///
/// `#[serde(default)]` on a `bool` always falls back to `false`, so fields
/// that are on unless switched off need a named function.
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tui: TuiConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Where the workflow backend lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:5001`.
    /// A path prefix is allowed (`http://host/crew`); endpoint paths are
    /// appended to it.
    pub base_url: String,
    /// Timeout for a single request/response call (0 = no limit).
    /// Event streams are not covered by this timeout.
    pub request_timeout_secs: u64,
    /// Abort a response stream when no bytes arrive for this many seconds
    /// (0 = wait forever).
    pub stream_idle_timeout_secs: u64,
    /// Ask the backend for an opening agent response when the TUI starts.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    /// Initial request forwarded to `/initialize_workflow`.
    pub user_request: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".into(),
            request_timeout_secs: 30,
            stream_idle_timeout_secs: 0,
            auto_start: true,
            user_request: None,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.request_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.stream_idle_timeout_secs)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Width used for markdown wrapping (0 = chat pane width)
    pub wrap_width: u16,
    /// Use plain ASCII borders/indicators instead of Unicode box-drawing
    /// characters.  Can also be forced with `CREW_ASCII_BORDERS=1`.
    pub ascii_borders: bool,
    /// Highlight fenced code blocks in agent responses and attached files.
    #[serde(default = "default_true")]
    pub syntax_highlight: bool,
    /// syntect theme used for code highlighting.
    pub theme: String,
    /// Seconds a notification toast stays on screen.
    pub notification_secs: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            wrap_width: 0,
            ascii_borders: false,
            syntax_highlight: true,
            theme: "base16-ocean.dark".into(),
            notification_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory conversation exports are written to.  `~` and environment
    /// variables are expanded.  Defaults to the working directory.
    pub directory: Option<String>,
    /// File name prefix; the export date and `.md` are appended.
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: "conversation".into(),
        }
    }
}

impl ExportConfig {
    /// Resolve the export directory, expanding `~` and `$VARS`.
    pub fn resolved_directory(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => {
                let expanded = shellexpand::full(dir)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| dir.clone());
                PathBuf::from(expanded)
            }
            None => PathBuf::from("."),
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
