// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Top-level TUI application: terminal event loop and frame drawing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crew_client::{StreamTransport, WorkflowApi, WorkflowClient};
use crew_config::Config;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use futures::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::controller::{AppOptions, Controller, ControllerEvent, Focus};
use crate::keys::{map_key, Action};
use crate::layout::AppLayout;
use crate::markdown::{RenderOptions, StyledLines};
use crate::overlay::Overlay;
use crate::widgets::{
    chat_lines, draw_chat, draw_command_prompt, draw_file_browser, draw_help, draw_input,
    draw_notifications, draw_status, draw_switcher, draw_todo,
};

/// How often expired notifications are swept.
const TICK: Duration = Duration::from_millis(250);

pub struct App {
    config: Arc<Config>,
    controller: Controller,
    events: mpsc::Receiver<ControllerEvent>,
    /// Cached chat render and the (revision, width) it was built for.
    chat_lines: StyledLines,
    rendered_for: Option<(u64, u16)>,
    scroll_offset: u16,
    /// Keep the view pinned to the newest line.
    follow: bool,
    chat_height: u16,
}

impl App {
    /// Build the app on top of the HTTP client.
    pub fn new(config: Config, options: AppOptions, client: WorkflowClient) -> Self {
        let client = Arc::new(client);
        Self::with_backend(config, options, client.clone(), client)
    }

    /// Build the app on top of any request and stream implementation.
    pub fn with_backend(
        config: Config,
        options: AppOptions,
        api: Arc<dyn WorkflowApi>,
        transport: Arc<dyn StreamTransport>,
    ) -> Self {
        let (controller, events) = Controller::new(api, transport, &config, options);
        Self {
            config: Arc::new(config),
            controller,
            events,
            chat_lines: Vec::new(),
            rendered_for: None,
            scroll_offset: 0,
            follow: true,
            chat_height: 0,
        }
    }

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> anyhow::Result<()> {
        let _keyboard = KeyboardEnhancement::push();
        self.controller.initialize();
        let mut crossterm_events = EventStream::new();
        let mut tick = tokio::time::interval(TICK);

        loop {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                Some(event) = self.events.recv() => {
                    self.controller.handle_event(event);
                }
                Some(Ok(term_event)) = crossterm_events.next() => {
                    if !self.handle_term_event(term_event) { break; }
                }
                _ = tick.tick() => {
                    self.controller.notifications_mut().prune(Instant::now());
                }
            }
        }

        debug!("TUI loop finished");
        Ok(())
    }

    /// Returns `false` when the app should quit.
    fn handle_term_event(&mut self, event: Event) -> bool {
        let Event::Key(key) = event else {
            // Resizes are picked up by the width check on the next draw.
            return true;
        };
        if key.kind != KeyEventKind::Press {
            return true;
        }
        let Some(action) = map_key(key, self.controller.focus(), self.controller.modal()) else {
            return true;
        };
        match action {
            Action::ScrollUp => self.scroll_up(1),
            Action::ScrollDown => self.scroll_down(1),
            Action::ScrollPageUp => self.scroll_up(self.chat_height.max(1)),
            Action::ScrollPageDown => self.scroll_down(self.chat_height.max(1)),
            other => return self.controller.dispatch(other),
        }
        true
    }

    fn scroll_up(&mut self, rows: u16) {
        self.follow = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
    }

    fn scroll_down(&mut self, rows: u16) {
        // Clamped, and `follow` re-armed, on the next draw.
        self.scroll_offset = self.scroll_offset.saturating_add(rows);
    }

    fn ascii(&self) -> bool {
        if std::env::var("CREW_ASCII_BORDERS").as_deref() == Ok("1") {
            return true;
        }
        self.config.tui.ascii_borders
    }

    fn refresh_chat_lines(&mut self, pane_width: u16) {
        let width = match self.config.tui.wrap_width {
            0 => pane_width,
            w => w,
        };
        let key = (self.controller.revision(), width);
        if self.rendered_for == Some(key) {
            return;
        }
        let theme = self.config.tui.theme.as_str();
        let opts = RenderOptions {
            width,
            ascii: self.ascii(),
            highlight_theme: self.config.tui.syntax_highlight.then_some(theme),
        };
        self.chat_lines = chat_lines(self.controller.segments(), opts);
        self.rendered_for = Some(key);
    }

    fn draw(&mut self, frame: &mut Frame) {
        let layout = AppLayout::compute(frame.area());
        let ascii = self.ascii();

        self.refresh_chat_lines(layout.chat_inner_width());
        self.chat_height = layout.chat_inner_height();
        let total = u16::try_from(self.chat_lines.len()).unwrap_or(u16::MAX);
        let max_scroll = total.saturating_sub(self.chat_height);
        if self.follow || self.scroll_offset >= max_scroll {
            self.scroll_offset = max_scroll;
            self.follow = true;
        }

        let c = &self.controller;
        let session = c.session();
        let focus = c.focus();
        draw_status(frame, layout.status_bar, session, ascii);
        draw_switcher(frame, layout.switcher, &session.current_agent, ascii);
        draw_chat(
            frame,
            layout.chat_pane,
            &self.chat_lines,
            self.scroll_offset,
            focus == Focus::Chat,
            ascii,
        );
        draw_todo(
            frame,
            layout.todo_pane,
            &session.todos,
            c.todo_selected(),
            focus == Focus::Todo,
            ascii,
        );
        draw_input(
            frame,
            layout.input_pane,
            c.input(),
            session.input_enabled(),
            focus == Focus::Input && c.modal().is_none(),
            ascii,
        );
        match c.overlay() {
            Some(Overlay::FileBrowser(browser)) => draw_file_browser(frame, browser, ascii),
            Some(Overlay::Command(prompt)) => draw_command_prompt(frame, prompt, ascii),
            None => {}
        }
        if c.help_visible() {
            draw_help(frame, ascii);
        }
        draw_notifications(frame, c.notifications(), ascii);
    }
}

/// Asks the terminal to report Ctrl+letter chords distinctly (so Ctrl+I is not
/// read as Tab) for as long as the guard lives.
struct KeyboardEnhancement {
    pushed: bool,
}

impl KeyboardEnhancement {
    fn push() -> Self {
        let supported = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if !supported {
            debug!("terminal has no keyboard enhancement; Ctrl+I arrives as Tab, use F9");
            return Self { pushed: false };
        }
        let pushed = crossterm::execute!(
            std::io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .map_err(|e| warn!("enabling keyboard enhancement failed: {e}"))
        .is_ok();
        Self { pushed }
    }
}

impl Drop for KeyboardEnhancement {
    fn drop(&mut self) {
        if self.pushed {
            let _ = crossterm::execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        }
    }
}

// ── Test helpers ──────────────────────────────────────────────────────────────
