// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// The regions that make up the TUI layout.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub status_bar: Rect,
    pub switcher: Rect,
    pub chat_pane: Rect,
    pub todo_pane: Rect,
    pub input_pane: Rect,
}

impl AppLayout {
    /// Below this width the to-do pane is hidden and chat takes the row.
    const MIN_SPLIT_WIDTH: u16 = 60;

    /// Calculate layout regions from a `Rect` (terminal area).
    pub fn compute(area: Rect) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(area);

        let (chat_pane, todo_pane) = if area.width >= Self::MIN_SPLIT_WIDTH {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(vertical[2]);
            (body[0], body[1])
        } else {
            (vertical[2], Rect::new(vertical[2].x, vertical[2].y, 0, 0))
        };

        AppLayout {
            status_bar: vertical[0],
            switcher: vertical[1],
            chat_pane,
            todo_pane,
            input_pane: vertical[3],
        }
    }

    /// Text rows visible inside the chat pane's border.
    pub fn chat_inner_height(&self) -> u16 {
        self.chat_pane.height.saturating_sub(2)
    }

    /// Text columns inside the chat pane's border.
    pub fn chat_inner_width(&self) -> u16 {
        self.chat_pane.width.saturating_sub(2)
    }
}
