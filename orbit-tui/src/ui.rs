// UI module - split into cohesive submodules for maintainability
pub mod theme;
mod formatting;
mod modals;
mod screens;

// Re-export main render function
pub use self::render_main::render;

// Main render logic
mod render_main {
    use ratatui::{
        layout::Alignment,
        style::{Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Clear, Paragraph},
        Frame,
    };

    use super::modals::{render_detail_modal, render_dialog, render_help_modal};
    use super::screens::{
        render_feed_screen, render_login_screen, render_main_layout, render_profile_screen,
        render_upload_screen,
    };
    use super::theme::theme_colors;
    use crate::app::{App, Screen};

    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 20;

    /// Render the UI
    pub fn render(app: &mut App, frame: &mut Frame) {
        let area = frame.area();
        let theme = theme_colors(app.color_scheme);

        frame.render_widget(Clear, area);
        let background = Block::default().style(Style::default().bg(theme.background));
        frame.render_widget(background, area);

        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            let warning = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Terminal Too Small",
                    Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    format!("Minimum size: {}x{}", MIN_WIDTH, MIN_HEIGHT),
                    Style::default().fg(theme.text),
                )),
                Line::from(Span::styled(
                    format!("Current size: {}x{}", area.width, area.height),
                    Style::default().fg(theme.warning),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Please resize your terminal window",
                    Style::default().fg(theme.text_dim),
                )),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.error)),
            );

            frame.render_widget(warning, area);
            return;
        }

        if app.screen == Screen::Login {
            render_login_screen(frame, app);
        } else {
            let body = render_main_layout(frame, app);
            match app.screen {
                Screen::Feed | Screen::Creator => render_feed_screen(frame, app, body),
                Screen::Upload => render_upload_screen(frame, app, body),
                Screen::Profile => render_profile_screen(frame, app, body),
                Screen::Login => {}
            }
        }

        // Overlays, lowest first
        if app.detail.is_some() {
            render_detail_modal(frame, app, area);
        }
        if app.dialog.is_some() {
            render_dialog(frame, app, area);
        }
        if app.show_help {
            render_help_modal(frame, app, area);
        }
    }
}
