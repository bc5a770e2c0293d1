// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! syntect-backed highlighting for fenced code blocks.

use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SynStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();
static THEMES: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn themes() -> &'static ThemeSet {
    THEMES.get_or_init(ThemeSet::load_defaults)
}

fn theme(name: &str) -> Option<&'static Theme> {
    let ts = themes();
    ts.themes.get(name).or_else(|| ts.themes.values().next())
}

fn syntax_for_lang<'a>(ps: &'a SyntaxSet, lang: &str) -> &'a SyntaxReference {
    let lang = match lang.trim() {
        "plaintext" | "text" | "" => return ps.find_syntax_plain_text(),
        "bash" | "shell" | "sh" => "sh",
        other => other,
    };
    ps.find_syntax_by_token(lang)
        .or_else(|| ps.find_syntax_by_extension(lang))
        .or_else(|| ps.find_syntax_by_name(lang))
        .unwrap_or_else(|| ps.find_syntax_plain_text())
}

fn span_from_syn((SynStyle { foreground, font_style, .. }, text): (SynStyle, &str)) -> Span<'static> {
    let mut style = Style::default().fg(Color::Rgb(foreground.r, foreground.g, foreground.b));
    if font_style.contains(FontStyle::BOLD) {
        style = style.add_modifier(Modifier::BOLD);
    }
    if font_style.contains(FontStyle::ITALIC) {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if font_style.contains(FontStyle::UNDERLINE) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    let content = text.strip_suffix('\n').unwrap_or(text);
    Span::styled(content.to_string(), style)
}

/// Highlight `code` as `lang` using the syntect theme `theme_name`.
///
/// Returns `None` when no theme is available so the caller can fall back to
/// its plain code style.  The text of every line is preserved exactly.
pub fn highlight_code(code: &str, lang: &str, theme_name: &str) -> Option<Vec<Line<'static>>> {
    let ps = syntax_set();
    let theme = theme(theme_name)?;
    let mut highlighter = HighlightLines::new(syntax_for_lang(ps, lang), theme);
    let mut out = Vec::new();
    for line in LinesWithEndings::from(code) {
        let spans: Vec<Span<'static>> = match highlighter.highlight_line(line, ps) {
            Ok(ranges) => ranges.into_iter().map(span_from_syn).collect(),
            Err(_) => vec![Span::raw(line.trim_end_matches('\n').to_string())],
        };
        out.push(Line::from(spans));
    }
    Some(out)
}
