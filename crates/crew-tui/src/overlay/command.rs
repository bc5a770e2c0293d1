// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Terminal-command prompt modal.

use crate::input::InputBuffer;

#[derive(Debug, Default)]
pub struct CommandPrompt {
    pub buffer: InputBuffer,
}

impl CommandPrompt {
    /// Trimmed command, or `None` when nothing was entered.
    pub fn command(&self) -> Option<String> {
        let cmd = self.buffer.as_str().trim();
        (!cmd.is_empty()).then(|| cmd.to_string())
    }
}
