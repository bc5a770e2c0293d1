// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::highlight::highlight_code;
use crate::widgets::{md_blockquote, md_bullet, md_rule_char};

/// A styled line ready for Ratatui rendering.
pub type StyledLines = Vec<Line<'static>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions<'a> {
    /// Wrap column; 0 falls back to 80.
    pub width: u16,
    /// Plain ASCII glyphs instead of Unicode bullets and rules.
    pub ascii: bool,
    /// syntect theme for fenced code; `None` disables highlighting.
    pub highlight_theme: Option<&'a str>,
}

/// Convert a markdown string into a list of styled [`Line`]s for Ratatui.
pub fn render_markdown(md: &str, opts: RenderOptions<'_>) -> StyledLines {
    let width = if opts.width == 0 { 80 } else { opts.width as usize };
    let ascii = opts.ascii;
    let mut lines: StyledLines = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![Style::default()];
    // Open fenced block: (language, collected text).
    let mut code_block: Option<(String, String)> = None;

    let push_line = |lines: &mut StyledLines, spans: &mut Vec<Span<'static>>| {
        if spans.is_empty() {
            lines.push(Line::default());
        } else {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    let parser = Parser::new(md);
    for event in parser {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                push_line(&mut lines, &mut current_spans);
                style_stack.push(heading_style(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                push_line(&mut lines, &mut current_spans);
                lines.push(Line::default());
            }
            Event::Start(Tag::Strong) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.add_modifier(Modifier::BOLD));
            }
            Event::End(TagEnd::Strong) => { style_stack.pop(); }
            Event::Start(Tag::Emphasis) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::Emphasis) => { style_stack.pop(); }
            Event::Start(Tag::CodeBlock(kind)) => {
                if !current_spans.is_empty() {
                    push_line(&mut lines, &mut current_spans);
                }
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                code_block = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = code_block.take() {
                    lines.extend(code_lines(&code, &lang, opts.highlight_theme));
                }
                lines.push(Line::default());
            }
            Event::Start(Tag::List(_)) => {
                if !current_spans.is_empty() {
                    push_line(&mut lines, &mut current_spans);
                }
            }
            Event::End(TagEnd::List(_)) => {
                lines.push(Line::default());
            }
            Event::Start(Tag::Item) => {
                current_spans.push(Span::raw(format!("  {}", md_bullet(ascii))));
            }
            Event::End(TagEnd::Item) => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::Start(Tag::BlockQuote(_)) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.fg(Color::DarkGray));
                current_spans.push(Span::raw(md_blockquote(ascii).to_string()));
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                push_line(&mut lines, &mut current_spans);
                style_stack.pop();
                lines.push(Line::default());
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                push_line(&mut lines, &mut current_spans);
                lines.push(Line::default());
            }
            Event::Text(t) => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&t);
                    continue;
                }
                let style = *style_stack.last().unwrap_or(&Style::default());
                let mut col = current_col(&current_spans);
                let mut buf = String::new();
                for word in t.split_inclusive(' ') {
                    let w = word.width();
                    if col + w > width && !buf.is_empty() {
                        current_spans.push(Span::styled(std::mem::take(&mut buf), style));
                        push_line(&mut lines, &mut current_spans);
                        col = 0;
                    }
                    buf.push_str(word);
                    col += w;
                }
                if !buf.is_empty() {
                    current_spans.push(Span::styled(buf, style));
                }
            }
            Event::Code(t) => {
                let style = Style::default().fg(Color::Yellow).bg(Color::DarkGray);
                current_spans.push(Span::styled(format!("`{t}`"), style));
            }
            Event::SoftBreak => {
                current_spans.push(Span::raw(" "));
            }
            Event::HardBreak => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::Rule => {
                if !current_spans.is_empty() {
                    push_line(&mut lines, &mut current_spans);
                }
                lines.push(Line::from(Span::styled(
                    md_rule_char(ascii).to_string().repeat(width),
                    Style::default().fg(Color::DarkGray),
                )));
                lines.push(Line::default());
            }
            // HTML is shown as written.
            Event::Start(Tag::HtmlBlock) => {
                if !current_spans.is_empty() {
                    push_line(&mut lines, &mut current_spans);
                }
            }
            Event::End(TagEnd::HtmlBlock) => {
                lines.push(Line::default());
            }
            Event::Html(t) => {
                let style = Style::default().fg(Color::Gray);
                for l in t.lines() {
                    lines.push(Line::from(Span::styled(l.to_string(), style)));
                }
            }
            Event::InlineHtml(t) => {
                let style = *style_stack.last().unwrap_or(&Style::default());
                current_spans.push(Span::styled(t.to_string(), style));
            }
            _ => {}
        }
    }

    // A stream can stop in the middle of a fence.
    if let Some((lang, code)) = code_block.take() {
        lines.extend(code_lines(&code, &lang, opts.highlight_theme));
    }
    if !current_spans.is_empty() {
        lines.push(Line::from(current_spans));
    }
    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }

    lines
}

fn code_lines(code: &str, lang: &str, theme: Option<&str>) -> StyledLines {
    if let Some(lines) = theme.and_then(|t| highlight_code(code, lang, t)) {
        return lines;
    }
    let style = Style::default().fg(Color::Cyan);
    code.lines()
        .map(|l| Line::from(Span::styled(l.to_string(), style)))
        .collect()
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD),
        HeadingLevel::H2 => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        HeadingLevel::H3 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}

fn current_col(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}
