use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthStr;

use super::theme::ThemeColors;

// Layout constants
pub const BORDER_PADDING: u16 = 4; // Total horizontal padding from borders (2 per side)

/// Upload time as a calendar date; unparseable values are shown as they came.
pub fn format_uploaded_at(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => match raw.parse::<chrono::DateTime<chrono::Utc>>() {
            Ok(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
            Err(_) => raw.to_string(),
        },
        None => String::new(),
    }
}

pub fn format_likes(likes: i64) -> String {
    match likes {
        1 => "1 like".to_string(),
        n => format!("{} likes", n),
    }
}

/// Cut `text` to `max_width` display columns, ending in an ellipsis.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Caption lines with mention and hashtag highlighting, wrapped to `max_width`.
pub fn format_caption_with_width(
    caption: &str,
    is_selected: bool,
    theme: &ThemeColors,
    max_width: usize,
) -> Vec<Line<'static>> {
    let mut lines = vec![];
    let wrap_width = max_width.saturating_sub(4).max(1);

    for line in caption.lines() {
        for wrapped_line in textwrap::wrap(line, wrap_width) {
            let mut spans = vec![Span::raw("  ")];
            for (i, word) in wrapped_line.split(' ').enumerate() {
                if i > 0 {
                    spans.push(Span::raw(" "));
                }
                spans.push(styled_word(word, is_selected, theme));
            }
            lines.push(Line::from(spans));
        }
    }

    lines
}

fn styled_word(word: &str, is_selected: bool, theme: &ThemeColors) -> Span<'static> {
    let style = if word.starts_with('#') || word.starts_with('@') {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else if is_selected {
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };
    Span::styled(word.to_string(), style)
}

/// Plain wrapped paragraph, at least one line.
pub fn format_wrapped(text: &str, max_width: usize, style: Style) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = text
        .lines()
        .flat_map(|line| textwrap::wrap(line, max_width.max(1)))
        .map(|piece| Line::from(Span::styled(piece.into_owned(), style)))
        .collect();

    if lines.is_empty() {
        lines.push(Line::from(""));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uploaded_at() {
        assert_eq!(
            format_uploaded_at(Some("2024-03-01T10:15:00Z")),
            "2024-03-01 10:15"
        );
        assert_eq!(format_uploaded_at(Some("yesterday")), "yesterday");
        assert_eq!(format_uploaded_at(None), "");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("a longer caption", 8), "a longe…");
    }

    #[test]
    fn test_format_likes() {
        assert_eq!(format_likes(1), "1 like");
        assert_eq!(format_likes(0), "0 likes");
    }
}
