// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Conversation → Markdown: the body each segment shows in the chat pane and
//! the exported conversation document.

use std::path::Path;

use crew_client::SystemInfo;

use crate::chat::segment::ChatSegment;

pub const EXPORT_TITLE: &str = "# Multi-agent workflow conversation history";

// ── Format helpers ────────────────────────────────────────────────────────────

/// Fence language for a file attached from the browser, by extension.
pub fn language_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("js") => "javascript",
        Some("py") => "python",
        Some("html") => "html",
        Some("css") => "css",
        Some("json") => "json",
        Some("md") => "markdown",
        _ => "plaintext",
    }
}

/// Human-readable byte count with 1024-based units.
///
/// Two decimals, trailing zeros trimmed: `1536` → `1.5 KB`, `0` → `0 Bytes`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exp = 0usize;
    let mut scaled = bytes;
    while scaled >= 1024 && exp < UNITS.len() - 1 {
        scaled /= 1024;
        exp += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exp])
}

pub fn system_info_markdown(info: &SystemInfo) -> String {
    let interfaces = if info.network_interfaces.is_empty() {
        "none".to_string()
    } else {
        info.network_interfaces.join(", ")
    };
    format!(
        "- **System:** {} {}\n- **Hostname:** {}\n- **Processor:** {}\n- **CPU cores:** {}\n\
         - **Memory:** {} available of {}\n- **Network interfaces:** {}\n",
        info.system,
        info.release,
        info.hostname,
        info.processor,
        info.cpu_count,
        format_bytes(info.memory_available),
        format_bytes(info.memory_total),
        interfaces,
    )
}

/// Markdown body of a segment as shown in the chat pane (headers are drawn
/// separately).
pub fn segment_body_markdown(seg: &ChatSegment) -> String {
    match seg {
        ChatSegment::User(text) => text.clone(),
        ChatSegment::Agent { text, .. } => text.clone(),
        ChatSegment::Error(msg) => format!("**Error**: {msg}"),
        ChatSegment::File { content, language, .. } => fenced(language, content),
        ChatSegment::Terminal { command, output } => {
            fenced("bash", &format!("$ {command}\n{output}"))
        }
        ChatSegment::SystemInfo(info) => system_info_markdown(info),
    }
}

/// Header label of a segment.
pub fn segment_title(seg: &ChatSegment) -> String {
    match seg {
        ChatSegment::User(_) => "User".to_string(),
        ChatSegment::Agent { header, .. } => header.clone(),
        ChatSegment::Error(_) => "Error".to_string(),
        ChatSegment::File { name, .. } => format!("File: {name}"),
        ChatSegment::Terminal { .. } => "Terminal".to_string(),
        ChatSegment::SystemInfo(_) => "System information".to_string(),
    }
}

fn fenced(language: &str, body: &str) -> String {
    let body = body.strip_suffix('\n').unwrap_or(body);
    format!("```{language}\n{body}\n```")
}

// ── Export ────────────────────────────────────────────────────────────────────

/// Render the exported conversation document.
///
/// Only user messages and agent responses are exported, in chronological
/// order.
pub fn export_markdown(segments: &[ChatSegment]) -> String {
    let mut doc = format!("{EXPORT_TITLE}\n\n");
    for seg in segments {
        match seg {
            ChatSegment::User(text) => {
                doc.push_str(&format!("## User\n\n{text}\n\n---\n\n"));
            }
            ChatSegment::Agent { header, text, .. } => {
                doc.push_str(&format!("## {header}\n\n{text}\n\n---\n\n"));
            }
            _ => {}
        }
    }
    doc
}

/// `<prefix>_<YYYY-MM-DD>.md`
pub fn export_file_name(prefix: &str, date: chrono::NaiveDate) -> String {
    format!("{prefix}_{}.md", date.format("%Y-%m-%d"))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
