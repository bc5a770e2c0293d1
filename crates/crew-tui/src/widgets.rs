// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crew_client::{AgentId, FileKind, TodoItem};

use crate::chat::markdown::{segment_body_markdown, segment_title};
use crate::chat::segment::ChatSegment;
use crate::input::InputBuffer;
use crate::markdown::{render_markdown, RenderOptions, StyledLines};
use crate::notify::{Level, Notifications};
use crate::overlay::command::CommandPrompt;
use crate::overlay::file_browser::FileBrowser;
use crate::state::SessionState;

// ── Character sets ────────────────────────────────────────────────────────────

fn sep(ascii: bool) -> &'static str {
    if ascii { "|" } else { "│" }
}
fn busy_char(ascii: bool) -> &'static str {
    if ascii { "* " } else { "⠿ " }
}
fn rule_char(ascii: bool) -> char {
    if ascii { '-' } else { '─' }
}
fn blockquote_prefix(ascii: bool) -> &'static str {
    if ascii { "> " } else { "▌ " }
}
fn bullet(ascii: bool) -> &'static str {
    if ascii { "- " } else { "• " }
}
fn check_box(done: bool, ascii: bool) -> &'static str {
    match (done, ascii) {
        (true, true) => "[x]",
        (false, true) => "[ ]",
        (true, false) => "☑",
        (false, false) => "☐",
    }
}
fn dir_marker(kind: FileKind, ascii: bool) -> &'static str {
    match (kind, ascii) {
        (FileKind::Directory, true) => "[D] ",
        (FileKind::Directory, false) => "▸ ",
        (_, true) => "    ",
        (_, false) => "  ",
    }
}
fn border_type(ascii: bool) -> BorderType {
    if ascii { BorderType::Plain } else { BorderType::Rounded }
}

// ── Line builders ─────────────────────────────────────────────────────────────

/// The agent switcher row; the current agent's entry is drawn reversed.
pub fn switcher_line(current: &AgentId, ascii: bool) -> Line<'static> {
    let active = current.switcher_index();
    let mut spans = Vec::with_capacity(AgentId::KNOWN.len() * 2 + 1);
    for (i, agent) in AgentId::KNOWN.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(sep(ascii), Style::default().fg(Color::DarkGray)));
        }
        let style = if active == Some(i) {
            Style::default().fg(Color::LightCyan).add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" F{} {} ", i + 2, agent.display_name()), style));
    }
    if active.is_none() {
        spans.push(Span::styled(
            format!(" {} ", current.display_name()),
            Style::default().add_modifier(Modifier::REVERSED),
        ));
    }
    Line::from(spans)
}

/// One numbered line per to-do item; numbers are the 1-based task numbers
/// sent to `complete_task`.
pub fn todo_lines(todos: &[TodoItem], ascii: bool) -> Vec<Line<'static>> {
    todos
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let done = item.is_completed();
            let text_style = if done {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(format!("{}. {} ", i + 1, check_box(done, ascii))),
                Span::styled(
                    format!("{}: ", item.agent.display_name()),
                    Style::default().fg(Color::LightCyan),
                ),
                Span::styled(item.description.clone(), text_style),
            ])
        })
        .collect()
}

/// Render the whole conversation into chat pane lines.
pub fn chat_lines(segments: &[ChatSegment], opts: RenderOptions<'_>) -> StyledLines {
    let mut lines = Vec::new();
    for (i, seg) in segments.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(segment_title(seg), header_style(seg))));
        lines.extend(render_markdown(&segment_body_markdown(seg), opts));
    }
    lines
}

fn header_style(seg: &ChatSegment) -> Style {
    let base = Style::default().add_modifier(Modifier::BOLD);
    match seg {
        ChatSegment::User(_) => base.fg(Color::LightGreen),
        ChatSegment::Agent { streaming: true, .. } => base.fg(Color::Yellow),
        ChatSegment::Agent { .. } => base.fg(Color::LightCyan),
        ChatSegment::Error(_) => base.fg(Color::Red),
        _ => base.fg(Color::LightMagenta),
    }
}

// ── Draw functions ────────────────────────────────────────────────────────────

/// Draw the status bar at the top.
pub fn draw_status(frame: &mut Frame, area: Rect, session: &SessionState, ascii: bool) {
    let busy = session.is_busy();
    let busy_indicator = if busy { busy_char(ascii) } else { "  " };
    let line = Line::from(vec![
        Span::styled(
            format!(" {busy_indicator}"),
            Style::default().fg(if busy { Color::Yellow } else { Color::DarkGray }),
        ),
        Span::styled(format!(" {} ", session.status_label()), Style::default().fg(Color::LightCyan)),
        Span::styled(sep(ascii), Style::default().fg(Color::DarkGray)),
        Span::styled(
            "  F1:help  Tab:focus  ^B:files  ^T:terminal  ^E:export  F9:sysinfo  ^R:todo  ^Q:quit",
            Style::default().fg(Color::Gray),
        ),
    ]);
    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}

pub fn draw_switcher(frame: &mut Frame, area: Rect, current: &AgentId, ascii: bool) {
    frame.render_widget(Paragraph::new(switcher_line(current, ascii)), area);
}

/// Draw the chat scroll pane.
pub fn draw_chat(
    frame: &mut Frame,
    area: Rect,
    lines: &StyledLines,
    scroll_offset: u16,
    focused: bool,
    ascii: bool,
) {
    let block = pane_block("Chat", focused, ascii);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible: Vec<Line<'static>> = lines
        .iter()
        .skip(scroll_offset as usize)
        .take(inner.height as usize)
        .cloned()
        .collect();
    frame.render_widget(Paragraph::new(visible).wrap(Wrap { trim: false }), inner);
}

pub fn draw_todo(
    frame: &mut Frame,
    area: Rect,
    todos: &[TodoItem],
    selected: usize,
    focused: bool,
    ascii: bool,
) {
    if area.width == 0 {
        return;
    }
    let pending = todos.iter().filter(|t| !t.is_completed()).count();
    let block = pane_block(&format!("To-do  [{pending} pending]"), focused, ascii);
    if todos.is_empty() {
        let para = Paragraph::new(Span::styled("No tasks", Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(para, area);
        return;
    }
    let items: Vec<ListItem> = todo_lines(todos, ascii).into_iter().map(ListItem::new).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    if focused {
        state.select(Some(selected.min(todos.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the input box at the bottom.
pub fn draw_input(
    frame: &mut Frame,
    area: Rect,
    input: &InputBuffer,
    enabled: bool,
    focused: bool,
    ascii: bool,
) {
    let title = if enabled {
        "Input  [Enter:send]"
    } else {
        "Input  [waiting for agent...]"
    };
    let block = pane_block(title, focused && enabled, ascii);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let style = if enabled { Style::default() } else { Style::default().fg(Color::DarkGray) };
    let col = input.cursor_column() as u16;
    // Keep the cursor inside the single visible row.
    let hscroll = col.saturating_sub(inner.width.saturating_sub(1));
    frame.render_widget(Paragraph::new(input.as_str()).style(style).scroll((0, hscroll)), inner);

    if focused && enabled {
        frame.set_cursor_position((inner.x + col - hscroll, inner.y));
    }
}

pub fn draw_file_browser(frame: &mut Frame, browser: &FileBrowser, ascii: bool) {
    let area = centered(frame.area(), 70, 20);
    frame.render_widget(Clear, area);
    let block = modal_block(&browser.title(), ascii)
        .title_bottom(" Enter:open  Backspace:up  Esc:close ");

    if browser.is_loading() && browser.depth() == 0 {
        frame.render_widget(Paragraph::new("Loading...").block(block), area);
        return;
    }
    if browser.entries().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("Empty directory", Style::default().fg(Color::DarkGray)))
                .block(block),
            area,
        );
        return;
    }
    let items: Vec<ListItem> = browser
        .entries()
        .iter()
        .map(|e| {
            let style = if e.is_dir() {
                Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::raw(dir_marker(e.kind, ascii)),
                Span::styled(e.name.clone(), style),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(Some(browser.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

pub fn draw_command_prompt(frame: &mut Frame, prompt: &CommandPrompt, ascii: bool) {
    let full = frame.area();
    let width = 70u16.min(full.width);
    let area = Rect::new(
        full.width.saturating_sub(width) / 2,
        full.height.saturating_sub(3) / 2,
        width,
        3u16.min(full.height),
    );
    frame.render_widget(Clear, area);
    let block = modal_block("Terminal command", ascii).title_bottom(" Enter:run  Esc:cancel ");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let line = Line::from(vec![
        Span::styled("$ ", Style::default().fg(Color::Green)),
        Span::raw(prompt.buffer.as_str().to_string()),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
    let col = 2 + prompt.buffer.cursor_column() as u16;
    if col < inner.width {
        frame.set_cursor_position((inner.x + col, inner.y));
    }
}

/// Draw the help overlay.
pub fn draw_help(frame: &mut Frame, ascii: bool) {
    let area = frame.area();
    let help_text = vec![
        Line::from(Span::styled(
            "  crew Key Bindings",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::LightBlue),
        )),
        Line::default(),
        Line::from(" Enter      Send message / complete selected task"),
        Line::from(" Tab        Cycle focus: input, to-do, chat"),
        Line::from(" j/k Up/Dn  Scroll chat or move to-do selection"),
        Line::from(" PgUp/PgDn  Scroll chat by a page"),
        Line::from(" F2..F8     Switch agent (also Alt+1..7)"),
        Line::from(" ^B         Browse backend files"),
        Line::from(" ^T         Run a terminal command"),
        Line::from(" ^E         Export conversation to Markdown"),
        Line::from(" F9 / ^I    Show system information"),
        Line::from(" ^R         Refresh to-do list"),
        Line::from(" Esc        Close dialogs"),
        Line::from(" ^Q / ^C    Quit"),
        Line::from(" F1         Toggle this help"),
        Line::default(),
        Line::from(Span::styled(
            " Press any key to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let width = 60u16.min(area.width);
    let height = (help_text.len() as u16 + 2).min(area.height);
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    let overlay = Rect::new(x, y, width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type(ascii))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(overlay);
    frame.render_widget(Clear, overlay);
    frame.render_widget(block, overlay);
    frame.render_widget(Paragraph::new(help_text), inner);
}

/// Toasts stacked in the top-right corner, newest at the bottom.
pub fn draw_notifications(frame: &mut Frame, notes: &Notifications, ascii: bool) {
    let area = frame.area();
    let mut y = 2u16;
    for note in notes.iter() {
        let colour = match note.level {
            Level::Info => Color::LightBlue,
            Level::Success => Color::Green,
            Level::Error => Color::Red,
        };
        let width = (unicode_width::UnicodeWidthStr::width(note.text.as_str()) as u16 + 4)
            .min(area.width.saturating_sub(2))
            .max(10);
        if y + 3 > area.height {
            break;
        }
        let rect = Rect::new(area.width.saturating_sub(width + 1), y, width, 3);
        frame.render_widget(Clear, rect);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type(ascii))
            .border_style(Style::default().fg(colour));
        frame.render_widget(
            Paragraph::new(Span::styled(note.text.clone(), Style::default().fg(colour))).block(block),
            rect,
        );
        y += 3;
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

pub(crate) fn pane_block(title: &str, focused: bool, ascii: bool) -> Block<'static> {
    let border_style = if focused {
        Style::default().fg(Color::LightBlue)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            if focused {
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .fg(Color::LightBlue)
            } else {
                Style::default().fg(Color::Gray)
            },
        ))
        .borders(Borders::ALL)
        .border_type(border_type(ascii))
        .border_style(border_style)
}

fn modal_block(title: &str, ascii: bool) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_type(border_type(ascii))
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black))
}

fn centered(area: Rect, max_w: u16, max_h: u16) -> Rect {
    let w = max_w.min(area.width.saturating_sub(4)).max(20.min(area.width));
    let h = max_h.min(area.height.saturating_sub(2)).max(5.min(area.height));
    Rect::new(
        area.x + area.width.saturating_sub(w) / 2,
        area.y + area.height.saturating_sub(h) / 2,
        w,
        h,
    )
}

pub(crate) fn md_rule_char(ascii: bool) -> char { rule_char(ascii) }
pub(crate) fn md_blockquote(ascii: bool) -> &'static str { blockquote_prefix(ascii) }
pub(crate) fn md_bullet(ascii: bool) -> &'static str { bullet(ascii) }
