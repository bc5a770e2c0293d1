// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::Focus;

/// All logical actions the TUI can perform, independent of key binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    CycleFocus,
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,

    // Input
    InputChar(char),
    InputBackspace,
    InputDelete,
    InputMoveCursorLeft,
    InputMoveCursorRight,
    InputMoveLineStart,
    InputMoveLineEnd,
    Submit,

    // To-do panel
    TodoUp,
    TodoDown,
    CompleteTodo,

    // Toolbar
    BrowseFiles,
    TerminalCommand,
    Export,
    SystemInfo,
    RefreshTodos,
    /// Index into `AgentId::KNOWN`.
    SwitchAgent(usize),

    // Modals
    ModalUp,
    ModalDown,
    ModalSelect,
    ModalBack,
    ModalChar(char),
    ModalBackspace,
    CloseModals,

    // App
    Quit,
    Help,
}

/// Which modal, if any, receives keys before the panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Help,
    FileBrowser,
    Command,
}

/// Map a raw key event to an [`Action`], depending on the open modal and
/// which pane has focus.
pub fn map_key(event: KeyEvent, focus: Focus, modal: Option<Modal>) -> Option<Action> {
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);
    let plain = !ctrl && !alt;

    // ── Always available ─────────────────────────────────────────────────────
    match event.code {
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => return Some(Action::Quit),
        KeyCode::Esc => return Some(Action::CloseModals),
        _ => {}
    }

    if let Some(modal) = modal {
        return map_modal_key(event, modal, plain);
    }

    match event.code {
        // ── Toolbar ──────────────────────────────────────────────────────────
        KeyCode::Char('b') if ctrl => Some(Action::BrowseFiles),
        KeyCode::Char('t') if ctrl => Some(Action::TerminalCommand),
        KeyCode::Char('e') if ctrl => Some(Action::Export),
        // Ctrl+I only arrives as such with keyboard enhancement; F9 always works.
        KeyCode::Char('i') if ctrl => Some(Action::SystemInfo),
        KeyCode::F(9) => Some(Action::SystemInfo),
        KeyCode::Char('r') if ctrl => Some(Action::RefreshTodos),
        KeyCode::F(1) => Some(Action::Help),
        KeyCode::F(n @ 2..=8) => Some(Action::SwitchAgent(usize::from(n - 2))),
        KeyCode::Char(c @ '1'..='7') if alt => Some(Action::SwitchAgent(c as usize - '1' as usize)),
        KeyCode::Tab => Some(Action::CycleFocus),

        // ── Input pane ───────────────────────────────────────────────────────
        KeyCode::Enter if focus == Focus::Input => Some(Action::Submit),
        KeyCode::Backspace if focus == Focus::Input => Some(Action::InputBackspace),
        KeyCode::Delete if focus == Focus::Input => Some(Action::InputDelete),
        KeyCode::Left if focus == Focus::Input => Some(Action::InputMoveCursorLeft),
        KeyCode::Right if focus == Focus::Input => Some(Action::InputMoveCursorRight),
        KeyCode::Home if focus == Focus::Input => Some(Action::InputMoveLineStart),
        KeyCode::End if focus == Focus::Input => Some(Action::InputMoveLineEnd),
        KeyCode::Char(c) if focus == Focus::Input && plain => Some(Action::InputChar(c)),

        // ── To-do pane ───────────────────────────────────────────────────────
        KeyCode::Up | KeyCode::Char('k') if focus == Focus::Todo && plain => Some(Action::TodoUp),
        KeyCode::Down | KeyCode::Char('j') if focus == Focus::Todo && plain => Some(Action::TodoDown),
        KeyCode::Enter if focus == Focus::Todo => Some(Action::CompleteTodo),

        // ── Chat pane ────────────────────────────────────────────────────────
        KeyCode::Up | KeyCode::Char('k') if focus == Focus::Chat && plain => Some(Action::ScrollUp),
        KeyCode::Down | KeyCode::Char('j') if focus == Focus::Chat && plain => Some(Action::ScrollDown),
        KeyCode::PageUp => Some(Action::ScrollPageUp),
        KeyCode::PageDown => Some(Action::ScrollPageDown),

        _ => None,
    }
}

fn map_modal_key(event: KeyEvent, modal: Modal, plain: bool) -> Option<Action> {
    match modal {
        // Any key dismisses the help screen.
        Modal::Help => Some(Action::CloseModals),
        Modal::FileBrowser => match event.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ModalUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ModalDown),
            KeyCode::Enter => Some(Action::ModalSelect),
            KeyCode::Backspace => Some(Action::ModalBack),
            _ => None,
        },
        Modal::Command => match event.code {
            KeyCode::Enter => Some(Action::ModalSelect),
            KeyCode::Backspace => Some(Action::ModalBackspace),
            KeyCode::Char(c) if plain => Some(Action::ModalChar(c)),
            _ => None,
        },
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
