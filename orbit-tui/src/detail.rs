//! Media detail modal: one post, its like button and the threaded comments.

use orbit_types::{Comment, CommentId, Post};
use tui_textarea::TextArea;

use crate::comments::{build_comment_tree, flatten, CommentNode};
use crate::feed::LoadPhase;

/// Comment composer backed by tui-textarea.
pub struct CommentComposer {
    pub textarea: TextArea<'static>,
    pub active: bool,
}

impl CommentComposer {
    pub fn new() -> Self {
        let mut textarea = TextArea::default();
        textarea.set_hard_tab_indent(true);
        Self {
            textarea,
            active: false,
        }
    }

    pub fn content(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Trimmed body, or `None` when there is nothing worth sending.
    pub fn submittable(&self) -> Option<String> {
        let content = self.content();
        let trimmed = content.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn clear(&mut self) {
        *self = Self {
            active: self.active,
            ..Self::new()
        };
    }
}

impl Default for CommentComposer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DetailState {
    pub post: Post,
    pub like_count: i64,
    /// Set once per open modal; a failed like clears it again.
    pub liked: bool,
    pub comments: Vec<Comment>,
    pub tree: Vec<CommentNode>,
    pub comments_phase: LoadPhase,
    pub selected_comment: usize,
    pub reply_to: Option<CommentId>,
    pub composer: CommentComposer,
    /// A comment from this modal is on its way to the server
    pub submitting: bool,
}

impl DetailState {
    pub fn new(post: Post) -> Self {
        Self {
            like_count: post.likes,
            post,
            liked: false,
            comments: Vec::new(),
            tree: Vec::new(),
            comments_phase: LoadPhase::Idle,
            selected_comment: 0,
            reply_to: None,
            composer: CommentComposer::new(),
            submitting: false,
        }
    }

    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.tree = build_comment_tree(&comments);
        self.comments = comments;
        self.comments_phase = LoadPhase::Loaded;
        let rows = self.rows().len();
        self.selected_comment = self.selected_comment.min(rows.saturating_sub(1));
    }

    /// Display rows of the comment tree with their depth.
    pub fn rows(&self) -> Vec<(usize, &Comment)> {
        flatten(&self.tree)
    }

    pub fn selected_comment(&self) -> Option<&Comment> {
        self.rows().get(self.selected_comment).map(|(_, c)| *c)
    }

    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.selected_comment = (self.selected_comment + 1).min(len - 1);
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_comment = self.selected_comment.saturating_sub(1);
    }

    /// Author being replied to, for the composer title.
    pub fn reply_target(&self) -> Option<&Comment> {
        let id = self.reply_to.as_ref()?;
        self.comments.iter().find(|c| &c.id == id)
    }

    /// Returns false if this modal already liked the post.
    pub fn begin_like(&mut self) -> bool {
        if self.liked {
            return false;
        }
        self.liked = true;
        self.like_count += 1;
        true
    }

    pub fn confirm_like(&mut self, server_likes: Option<i64>) {
        if let Some(likes) = server_likes {
            self.like_count = likes;
        }
    }

    pub fn revert_like(&mut self) {
        self.liked = false;
        self.like_count = (self.like_count - 1).max(0);
    }
}
