use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::super::formatting::{format_likes, format_uploaded_at, format_wrapped};
use super::super::theme::theme_colors;
use super::utils::centered_rect;
use crate::app::App;
use crate::feed::LoadPhase;

/// Post detail: media info, like count, threaded comments and the composer.
pub fn render_detail_modal(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = theme_colors(app.color_scheme);
    let Some(detail) = app.detail.as_mut() else {
        return;
    };

    let modal_area = centered_rect(85, 85, area);
    frame.render_widget(Clear, modal_area);

    let composer_height = if detail.composer.active { 6 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Min(0),
            Constraint::Length(composer_height),
        ])
        .split(modal_area);

    // Media header
    let post = &detail.post;
    let inner_width = chunks[0].width.saturating_sub(4) as usize;
    let media = if post.is_video() { "Video" } else { "Image" };
    let like_style = if detail.liked {
        Style::default().fg(theme.error).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_dim)
    };

    let mut header = vec![Line::from(vec![
        Span::styled(format!("@{}", post.username), Style::default().fg(theme.primary).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}  ", media), Style::default().fg(theme.warning)),
        Span::styled(format_uploaded_at(post.uploaded_at.as_deref()), Style::default().fg(theme.text_dim)),
    ])];
    header.extend(format_wrapped(post.display_caption(), inner_width, Style::default().fg(theme.text)));
    header.push(Line::from(vec![
        Span::styled(format!("♥ {}", format_likes(detail.like_count)), like_style),
        Span::styled(format!("   {}", post.url), Style::default().fg(theme.text_dim)),
    ]));

    let header_widget = Paragraph::new(header).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .title(format!(" {} ", post.title.as_deref().unwrap_or(&post.name)))
            .style(Style::default().bg(theme.background)),
    );
    frame.render_widget(header_widget, chunks[0]);

    // Comment thread
    let rows = detail.rows();
    let comments_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(format!(" Comments ({}) ", detail.comments.len()))
        .style(Style::default().bg(theme.background));

    if detail.comments_phase == LoadPhase::Loading {
        let loading = Paragraph::new(Span::styled("⟳ Loading comments...", Style::default().fg(theme.warning)))
            .block(comments_block);
        frame.render_widget(loading, chunks[1]);
    } else if rows.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No comments yet. Press c to write one.",
            Style::default().fg(theme.text_dim),
        ))
        .block(comments_block);
        frame.render_widget(empty, chunks[1]);
    } else {
        let width = chunks[1].width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = rows
            .iter()
            .map(|(depth, comment)| {
                let indent = "  ".repeat(*depth);
                let marker = if *depth > 0 { "↳ " } else { "" };
                let mut lines = vec![Line::from(vec![
                    Span::raw(format!("{}{}", indent, marker)),
                    Span::styled(
                        format!("@{}", comment.username),
                        Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", comment.posted_on().unwrap_or_default()),
                        Style::default().fg(theme.text_dim),
                    ),
                ])];
                let body_width = width.saturating_sub(indent.len() + 2);
                for line in format_wrapped(&comment.comment, body_width, Style::default().fg(theme.text)) {
                    let mut spans = vec![Span::raw(format!("{}  ", indent))];
                    spans.extend(line.spans);
                    lines.push(Line::from(spans));
                }
                ListItem::new(lines)
            })
            .collect();

        let mut list_state = ListState::default().with_selected(Some(detail.selected_comment));
        let list = List::new(items)
            .block(comments_block)
            .highlight_style(Style::default().bg(theme.highlight_bg));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }

    // Composer
    if detail.composer.active {
        let title = match detail.reply_target() {
            Some(target) => format!(" Reply to @{} ", target.username),
            None => " New comment ".to_string(),
        };
        detail.composer.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent))
                .title(title)
                .style(Style::default().bg(theme.background)),
        );
        detail.composer.textarea.set_style(Style::default().fg(theme.text));
        frame.render_widget(&detail.composer.textarea, chunks[2]);
    }
}
