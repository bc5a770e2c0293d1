// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Core chat data: the `ChatSegment` enum and helpers that operate on segment
//! slices.

use crew_client::{AgentId, SystemInfo};

/// Appended to an agent response whose stream broke off.
pub const CONNECTION_INTERRUPTED: &str = "Connection interrupted, please retry.";

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatSegment {
    User(String),
    Agent {
        agent: AgentId,
        /// "<name> responding..." while streaming, the display name after.
        header: String,
        text: String,
        streaming: bool,
    },
    Error(String),
    /// A backend file pulled into the conversation from the file browser.
    File { name: String, language: &'static str, content: String },
    Terminal { command: String, output: String },
    SystemInfo(SystemInfo),
}

impl ChatSegment {
    /// A fresh, empty response for `agent` that is still streaming.
    pub fn responding(agent: AgentId, name: Option<&str>) -> Self {
        let header = format!("{} responding...", name.unwrap_or(agent.display_name()));
        ChatSegment::Agent { agent, header, text: String::new(), streaming: true }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, ChatSegment::Agent { streaming: true, .. })
    }
}

/// Append a fragment to the agent response at `index`.  Returns `false` when
/// that segment is not an agent response.
pub fn append_fragment(segments: &mut [ChatSegment], index: usize, fragment: &str) -> bool {
    match segments.get_mut(index) {
        Some(ChatSegment::Agent { text, .. }) => {
            text.push_str(fragment);
            true
        }
        _ => false,
    }
}

/// Stop streaming the response at `index` and label it with its agent's
/// display name.
pub fn finalize_response(segments: &mut [ChatSegment], index: usize) {
    if let Some(ChatSegment::Agent { agent, header, streaming, .. }) = segments.get_mut(index) {
        *header = agent.display_name().to_string();
        *streaming = false;
    }
}

/// Finalize the response at `index` and append the interruption notice.
pub fn interrupt_response(segments: &mut [ChatSegment], index: usize) {
    if let Some(ChatSegment::Agent { text, .. }) = segments.get_mut(index) {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(CONNECTION_INTERRUPTED);
    }
    finalize_response(segments, index);
}
