use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::super::theme::theme_colors;
use super::utils::centered_rect;
use crate::app::{App, Screen};

type ShortcutGroup = (&'static str, Vec<(&'static str, &'static str)>);

/// Render help modal
pub fn render_help_modal(frame: &mut Frame, app: &App, area: Rect) {
    let theme = theme_colors(app.color_scheme);
    let modal_area = centered_rect(80, 85, area);
    frame.render_widget(Clear, modal_area);

    let mut lines = vec![Line::from("")];
    for (category, items) in shortcuts_for_context(app) {
        lines.push(Line::from(Span::styled(
            category,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));

        for (key, description) in items {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<15}", key), Style::default().fg(theme.success)),
                Span::styled(description, Style::default().fg(theme.text)),
            ]));
        }
        lines.push(Line::from(""));
    }

    let help_content = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
                .title(" Keyboard Shortcuts ")
                .title_alignment(Alignment::Center)
                .style(Style::default().bg(theme.background)),
        )
        .wrap(ratatui::widgets::Wrap { trim: false });

    frame.render_widget(help_content, modal_area);
}

/// Shortcuts relevant to what is on screen
pub fn shortcuts_for_context(app: &App) -> Vec<ShortcutGroup> {
    let mut shortcuts = vec![(
        "Global",
        vec![
            ("?", "Toggle this help"),
            ("Ctrl+C", "Quit"),
        ],
    )];

    if app.detail.is_some() {
        shortcuts.push((
            "Media Detail",
            vec![
                ("↓/j ↑/k", "Move between comments"),
                ("l", "Like (once per visit)"),
                ("c", "Write a comment"),
                ("r", "Reply to selected comment"),
                ("o", "Open media in browser"),
                ("p", "View author profile"),
                ("Esc / q", "Close"),
            ],
        ));
        return shortcuts;
    }

    match app.screen {
        Screen::Feed | Screen::Creator => {
            shortcuts.push((
                "Feed",
                vec![
                    ("↓/j ↑/k", "Move between posts"),
                    ("Enter/Space", "Open post"),
                    ("l", "Like"),
                    ("d", "Delete (asks first)"),
                    ("c", "Generate AI caption"),
                    ("/", "Filter locally"),
                    ("S", "Search on the server"),
                    ("r", "Reload"),
                    ("h", "Clear filters"),
                    ("p / P", "Author / your profile"),
                    ("o", "Open media in browser"),
                    ("t", "Switch colour scheme"),
                    ("Shift+L", "Logout"),
                    ("q / Esc", "Quit"),
                ],
            ));
            if app.screen == Screen::Feed {
                shortcuts.push(("Consumer", vec![("a", "Only this author")]));
            } else {
                shortcuts.push(("Creator", vec![("u", "Upload new media")]));
            }
        }
        Screen::Upload => shortcuts.push((
            "Upload",
            vec![
                ("Tab", "Next field"),
                ("Enter", "Load file / start upload"),
                ("Ctrl+U", "Start upload"),
                ("Ctrl+G", "Suggest a caption"),
                ("Ctrl+T", "Toggle square crop"),
                ("Ctrl+X / Esc", "Cancel running upload"),
            ],
        )),
        Screen::Profile => shortcuts.push((
            "Profile",
            vec![
                ("↓/j ↑/k", "Move between posts"),
                ("f", "Choose a new picture"),
                ("x", "Toggle square crop"),
                ("u / Enter", "Upload picture"),
                ("Backspace", "Discard chosen picture"),
                ("r", "Reload"),
                ("Esc / q", "Back"),
            ],
        )),
        Screen::Login => {}
    }

    shortcuts
}
