// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
pub mod command;
pub mod file_browser;

use command::CommandPrompt;
use file_browser::FileBrowser;

/// The modal dialog currently on top of the chat, if any.
#[derive(Debug)]
pub enum Overlay {
    FileBrowser(FileBrowser),
    Command(CommandPrompt),
}
