use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::formatting::{
    format_caption_with_width, format_likes, format_uploaded_at, truncate_to_width, BORDER_PADDING,
};
use super::theme::{theme_colors, ThemeColors};
use crate::app::{App, AuthField, AuthMode, InputMode, Screen, StatusKind};
use crate::feed::LoadPhase;
use crate::upload::UploadField;

const LOGO_LINES: &[&str] = &[
    "   ____       __    _ __ ",
    "  / __ \\_____/ /_  (_) /_",
    " / / / / ___/ __ \\/ / __/",
    "/ /_/ / /  / /_/ / / /_  ",
    "\\____/_/  /_.___/_/\\__/  ",
];

pub fn render_login_screen(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let theme = theme_colors(app.color_scheme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let header = Paragraph::new("Orbit - Media Feed")
        .style(Style::default().fg(theme.primary).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(header, chunks[0]);

    let auth = &app.auth_state;
    let mut lines = vec![Line::from("")];
    for logo_line in LOGO_LINES {
        lines.push(Line::from(Span::styled(
            *logo_line,
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));

    let title = match auth.mode {
        AuthMode::Login => "Sign in",
        AuthMode::Register => "Create an account",
    };
    lines.push(Line::from(Span::styled(
        title,
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    lines.push(form_field(
        "Username",
        &auth.username,
        auth.field == AuthField::Username,
        &theme,
    ));
    lines.push(form_field(
        "Password",
        &"*".repeat(auth.password.chars().count()),
        auth.field == AuthField::Password,
        &theme,
    ));
    if auth.mode == AuthMode::Register {
        lines.push(form_field(
            "Role",
            &format!("< {} >", auth.role.as_str()),
            auth.field == AuthField::Role,
            &theme,
        ));
    }
    lines.push(Line::from(""));

    if auth.loading {
        lines.push(Line::from(Span::styled(
            "Working...",
            Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(error) = &auth.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )));
    }
    if let Some(notice) = &auth.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(theme.success),
        )));
    }

    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(body, chunks[1]);

    let switch_hint = match auth.mode {
        AuthMode::Login => "Ctrl+R: Register",
        AuthMode::Register => "Ctrl+R: Back to login",
    };
    let footer = Paragraph::new(format!("Tab: Next field | Enter: Submit | {} | Esc: Quit", switch_hint))
        .style(Style::default().fg(theme.text_dim))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(theme.border)));
    frame.render_widget(footer, chunks[2]);
}

fn form_field(label: &str, value: &str, focused: bool, theme: &ThemeColors) -> Line<'static> {
    let value_style = if focused {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };
    let cursor = if focused { "▏" } else { " " };
    Line::from(vec![
        Span::styled(format!("{:>10}: ", label), Style::default().fg(theme.text_dim)),
        Span::styled(format!("{:<24}", format!("{}{}", value, cursor)), value_style),
    ])
}

/// Header, body, status line and key hints shared by the signed-in screens.
pub fn render_main_layout(frame: &mut Frame, app: &App) -> Rect {
    let area = frame.area();
    let theme = theme_colors(app.color_scheme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = match app.screen {
        Screen::Feed => "Feed",
        Screen::Creator => "Creator Dashboard",
        Screen::Upload => "Upload",
        Screen::Profile => "Profile",
        Screen::Login => "",
    };
    let user = app
        .current_username()
        .map(|u| format!("@{} ({})", u, app.current_role().as_str()))
        .unwrap_or_default();

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" Orbit ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::styled(format!("│ {} ", title), Style::default().fg(theme.text)),
        Span::styled(format!("│ {}", user), Style::default().fg(theme.text_dim)),
        Span::styled(
            if app.is_busy() { " │ working..." } else { "" },
            Style::default().fg(theme.warning),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    frame.render_widget(header, chunks[0]);

    render_status_line(frame, app, chunks[2], &theme);

    let hints = Paragraph::new(action_bar_text(app))
        .style(Style::default().fg(theme.text_dim))
        .alignment(Alignment::Center);
    frame.render_widget(hints, chunks[3]);

    chunks[1]
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect, theme: &ThemeColors) {
    let Some(status) = &app.status else {
        return;
    };
    let color = match status.kind {
        StatusKind::Info => theme.text,
        StatusKind::Success => theme.success,
        StatusKind::Error => theme.error,
    };
    let line = Paragraph::new(status.text.clone())
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(line, area);
}

pub fn action_bar_text(app: &App) -> &'static str {
    if app.detail.as_ref().is_some_and(|d| d.composer.active) {
        return "Enter: Send | Alt+Enter: New line | Esc: Cancel";
    }
    if app.detail.is_some() {
        return "l: Like | c: Comment | r: Reply | o: Open | p: Profile | Esc: Close";
    }
    match app.screen {
        Screen::Feed if app.searching => "Type to filter | Enter: Done | Esc: Clear",
        Screen::Feed => "j/k: Move | Enter: Open | l: Like | d: Delete | /: Search | a: Author | p: Profile | ?: Help",
        Screen::Creator => "j/k: Move | Enter: Open | u: Upload | d: Delete | c: AI caption | ?: Help",
        Screen::Upload => "Tab: Field | Enter: Select/Upload | Ctrl+T: Crop | Ctrl+G: Caption | Esc: Back/Cancel",
        Screen::Profile => "j/k: Move | f: Choose picture | x: Crop | u: Upload | r: Reload | Esc: Back",
        Screen::Login => "",
    }
}

pub fn render_feed_screen(frame: &mut Frame, app: &App, area: Rect) {
    let theme = theme_colors(app.color_scheme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    // Search bar
    let search_style = if app.searching {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.border)
    };
    let search_text = if app.feed.query.is_empty() && !app.searching {
        Span::styled("Press / to search", Style::default().fg(theme.text_dim))
    } else {
        Span::styled(app.feed.query.clone(), Style::default().fg(theme.text))
    };
    let search = Paragraph::new(Line::from(search_text)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(search_style)
            .title(" Search "),
    );
    frame.render_widget(search, chunks[0]);

    let posts_area = chunks[1];
    let title = match (&app.screen, &app.feed.author_filter) {
        (Screen::Creator, _) => " Your posts ".to_string(),
        (_, Some(author)) => format!(" @{} ", author),
        _ => " Media Feed ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(title);

    if app.feed.is_loading() && app.feed.posts.is_empty() {
        let loading = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "⟳ Loading posts...",
                Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(loading, posts_area);
        return;
    }

    let visible = app.feed.visible_posts();
    if visible.is_empty() {
        let message = match &app.feed.error {
            Some(error) => Span::styled(
                format!("Failed to load posts: {}", error),
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            ),
            None => Span::styled(
                "No posts to show",
                Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
            ),
        };
        let empty = Paragraph::new(vec![Line::from(""), Line::from(message)])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(empty, posts_area);
        return;
    }

    let avatars = app.feed.profile_pictures();
    let post_width = posts_area.width.saturating_sub(BORDER_PADDING) as usize;

    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(i, post)| {
            let is_selected = i == app.feed.selected;
            let header_style = if is_selected {
                Style::default().fg(theme.success).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.primary)
            };
            let prefix = if is_selected { "▶ " } else { "  " };
            let avatar = if avatars.contains_key(post.username.as_str()) {
                "◉ "
            } else {
                "○ "
            };
            let kind = if post.is_video() { " [video]" } else { "" };

            let mut lines = vec![Line::from(vec![
                Span::styled(prefix, header_style),
                Span::styled(avatar, Style::default().fg(theme.accent)),
                Span::styled(format!("@{}", post.username), header_style),
                Span::styled(kind, Style::default().fg(theme.warning)),
                Span::raw("  "),
                Span::styled(
                    format_uploaded_at(post.uploaded_at.as_deref()),
                    Style::default().fg(theme.text_dim),
                ),
            ])];

            if let Some(title) = post.title.as_deref().filter(|t| !t.is_empty()) {
                lines.push(Line::from(Span::styled(
                    format!("  {}", truncate_to_width(title, post_width)),
                    Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
                )));
            }
            lines.extend(format_caption_with_width(
                post.display_caption(),
                is_selected,
                &theme,
                post_width,
            ));

            let mut meta = vec![
                Span::raw("  "),
                Span::styled(format!("♥ {}", format_likes(post.likes)), Style::default().fg(theme.error)),
            ];
            if app.feed.likes_in_flight.contains(&post.name) {
                meta.push(Span::styled(" …", Style::default().fg(theme.text_dim)));
            }
            if let Some(location) = post.location.as_deref().filter(|l| !l.is_empty()) {
                meta.push(Span::styled(
                    format!("  ⌖ {}", location),
                    Style::default().fg(theme.text_dim),
                ));
            }
            if !post.tagged_people.is_empty() {
                meta.push(Span::styled(
                    format!("  with {}", post.tagged_people.join(", ")),
                    Style::default().fg(theme.text_dim),
                ));
            }
            lines.push(Line::from(meta));
            lines.push(Line::from(""));

            ListItem::new(lines)
        })
        .collect();

    let mut list_state = ListState::default().with_selected(Some(app.feed.selected));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme.highlight_bg));
    frame.render_stateful_widget(list, posts_area, &mut list_state);
}

pub fn render_upload_screen(frame: &mut Frame, app: &App, area: Rect) {
    let theme = theme_colors(app.color_scheme);
    let upload = &app.upload;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let field_block = |title: &'static str, focused: bool| {
        let color = if focused && app.input_mode == InputMode::Typing {
            theme.accent
        } else {
            theme.border
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title)
    };

    let path = Paragraph::new(upload.path_input.clone())
        .style(Style::default().fg(theme.text))
        .block(field_block(" Image path ", upload.focus == UploadField::Path));
    frame.render_widget(path, chunks[0]);

    let username = Paragraph::new(upload.username.clone())
        .style(Style::default().fg(theme.text))
        .block(field_block(" Username ", upload.focus == UploadField::Username));
    frame.render_widget(username, chunks[1]);

    let caption = Paragraph::new(upload.caption.clone())
        .style(Style::default().fg(theme.text))
        .wrap(Wrap { trim: false })
        .block(field_block(" Caption ", upload.focus == UploadField::Caption));
    frame.render_widget(caption, chunks[2]);

    let file_line = match &upload.file {
        Some(file) => format!(
            "{}  {}  {} KB",
            file.file_name(),
            file.mime_type.as_deref().unwrap_or("unknown type"),
            file.data.len().div_ceil(1024)
        ),
        None => "No image selected".to_string(),
    };
    let crop = if upload.crop_to_square { "[x]" } else { "[ ]" };
    let info = Paragraph::new(Line::from(vec![
        Span::styled(file_line, Style::default().fg(theme.text)),
        Span::styled(format!("   {} Crop to square", crop), Style::default().fg(theme.text_dim)),
    ]))
    .block(field_block(" File ", false));
    frame.render_widget(info, chunks[3]);

    let gauge = Gauge::default()
        .block(field_block(" Progress ", false))
        .gauge_style(Style::default().fg(theme.accent).bg(theme.highlight_bg))
        .percent(u16::from(upload.progress.min(100)))
        .label(format!("{}%", upload.progress));
    frame.render_widget(gauge, chunks[4]);

    let status_color = if upload.status.contains("failed") || upload.status.starts_with("Failed") {
        theme.error
    } else {
        theme.text
    };
    let status = Paragraph::new(upload.status.clone())
        .style(Style::default().fg(status_color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[5]);
}

pub fn render_profile_screen(frame: &mut Frame, app: &App, area: Rect) {
    let theme = theme_colors(app.color_scheme);
    let Some(profile) = &app.profile else {
        return;
    };
    let own = profile.is_own(app.current_username().as_deref());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(0)])
        .split(area);

    // Left: avatar and picture controls
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("( {} )", profile.initial()),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("@{}", profile.username),
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    match &profile.listing.picture_url {
        Some(url) => lines.push(Line::from(Span::styled(
            truncate_to_width(url, 32),
            Style::default().fg(theme.text_dim),
        ))),
        None => lines.push(Line::from(Span::styled(
            "No profile picture",
            Style::default().fg(theme.text_dim),
        ))),
    }

    if own {
        lines.push(Line::from(""));
        let path_style = if profile.editing_path {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.text)
        };
        let path = if profile.path_input.is_empty() && !profile.editing_path {
            "f: choose a picture".to_string()
        } else {
            truncate_to_width(&profile.path_input, 30)
        };
        lines.push(Line::from(Span::styled(path, path_style)));

        if let Some(file) = &profile.file {
            lines.push(Line::from(Span::styled(
                file.file_name(),
                Style::default().fg(theme.text),
            )));
        }
        if let Some(preview) = &profile.preview {
            let text = if profile.crop_to_square {
                format!(
                    "{}x{} → {}x{}",
                    preview.width, preview.height, preview.side, preview.side
                )
            } else {
                format!("{}x{}", preview.width, preview.height)
            };
            lines.push(Line::from(Span::styled(text, Style::default().fg(theme.success))));
        }
        let crop = if profile.crop_to_square { "[x]" } else { "[ ]" };
        lines.push(Line::from(Span::styled(
            format!("{} Crop to square", crop),
            Style::default().fg(theme.text_dim),
        )));
        if profile.is_uploading() {
            lines.push(Line::from(Span::styled(
                format!("Uploading {}%", profile.progress),
                Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
            )));
        }
    }

    let side = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title(" Profile "),
    );
    frame.render_widget(side, chunks[0]);

    // Right: the user's posts
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(format!(" Posts ({}) ", profile.listing.posts.len()));

    if profile.phase == LoadPhase::Loading {
        let loading = Paragraph::new(Span::styled(
            "⟳ Loading...",
            Style::default().fg(theme.warning),
        ))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(loading, chunks[1]);
        return;
    }

    let width = chunks[1].width.saturating_sub(BORDER_PADDING) as usize;
    let items: Vec<ListItem> = profile
        .listing
        .posts
        .iter()
        .map(|post| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    truncate_to_width(post.display_caption(), width),
                    Style::default().fg(theme.text),
                )),
                Line::from(Span::styled(
                    format!("♥ {}  {}", format_likes(post.likes), post.name),
                    Style::default().fg(theme.text_dim),
                )),
            ])
        })
        .collect();

    let mut list_state = ListState::default().with_selected(Some(profile.selected));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme.highlight_bg))
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, chunks[1], &mut list_state);
}
