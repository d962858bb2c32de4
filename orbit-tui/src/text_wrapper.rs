//! Soft wrapping for the comment composer.
use tui_textarea::{CursorMove, TextArea};

/// Configuration for text wrapping behavior
#[derive(Debug, Clone, Copy)]
pub struct WrapConfig {
    /// Maximum line width in characters
    pub wrap_width: usize,
}

impl WrapConfig {
    /// Comment composer inside the detail modal
    pub const COMMENT: Self = Self { wrap_width: 72 };
}

/// Split `line` into pieces no wider than `width`, breaking at spaces.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }
    textwrap::wrap(line, width.max(1))
        .into_iter()
        .map(|piece| piece.into_owned())
        .collect()
}

/// Re-wrap the cursor's line once it grows past the configured width.
///
/// The cursor stays at the end of the wrapped text when it was typing at the
/// end of the line, which is the common case while composing.
pub fn wrap_textarea_if_needed(textarea: &mut TextArea<'static>, config: WrapConfig) {
    let (row, col) = textarea.cursor();
    let lines: Vec<String> = textarea.lines().to_vec();
    let Some(current) = lines.get(row) else {
        return;
    };
    if current.chars().count() <= config.wrap_width {
        return;
    }

    let at_end = col >= current.chars().count();
    let pieces = wrap_line(current, config.wrap_width);
    let added = pieces.len().saturating_sub(1);
    let last_len = pieces.last().map(|p| p.chars().count()).unwrap_or(0);

    let mut rebuilt: Vec<String> = Vec::with_capacity(lines.len() + added);
    rebuilt.extend(lines[..row].iter().cloned());
    rebuilt.extend(pieces);
    rebuilt.extend(lines[row + 1..].iter().cloned());

    *textarea = TextArea::new(rebuilt);
    textarea.set_hard_tab_indent(true);

    let (target_row, target_col) = if at_end {
        (row + added, last_len)
    } else {
        (row, col.min(config.wrap_width))
    };
    textarea.move_cursor(CursorMove::Jump(target_row as u16, target_col as u16));
}
