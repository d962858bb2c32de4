use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::super::formatting::truncate_to_width;
use super::super::theme::theme_colors;
use super::utils::centered_rect;
use crate::app::{App, Dialog};

pub fn render_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let Some(dialog) = &app.dialog else {
        return;
    };
    let theme = theme_colors(app.color_scheme);
    let modal_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, modal_area);

    let (title, content, border) = match dialog {
        Dialog::ConfirmDelete { caption, .. } => (
            " Delete Post ".to_string(),
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Are you sure you want to delete this post?",
                    Style::default().fg(theme.text),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("\"{}\"", truncate_to_width(caption, 40)),
                    Style::default().fg(theme.text_dim),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Y", Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
                    Span::styled(": Delete  ", Style::default().fg(theme.text)),
                    Span::styled("N", Style::default().fg(theme.success).add_modifier(Modifier::BOLD)),
                    Span::styled(": Keep", Style::default().fg(theme.text)),
                ]),
            ],
            theme.warning,
        ),
        Dialog::Error { title, message } => (
            format!(" {} ", title),
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled("Press Enter to close", Style::default().fg(theme.text_dim))),
            ],
            theme.error,
        ),
    };

    let modal = Paragraph::new(content)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border).add_modifier(Modifier::BOLD))
                .style(Style::default().bg(theme.background)),
        );
    frame.render_widget(modal, modal_area);
}
