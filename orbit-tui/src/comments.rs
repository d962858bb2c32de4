//! Threaded comment assembly from the flat list the API returns.

use std::collections::HashMap;

use orbit_types::{Comment, CommentId};

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Build the comment tree in two passes.
///
/// Comments without a parent become roots. A reply whose parent is not in the
/// list is dropped from display. Siblings keep input order.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let index: HashMap<&CommentId, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (&c.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();

    for (i, comment) in comments.iter().enumerate() {
        match comment.parent() {
            None => roots.push(i),
            Some(parent) => {
                if let Some(&p) = index.get(parent) {
                    children[p].push(i);
                }
            }
        }
    }

    roots
        .into_iter()
        .map(|i| assemble(i, comments, &children))
        .collect()
}

fn assemble(i: usize, comments: &[Comment], children: &[Vec<usize>]) -> CommentNode {
    CommentNode {
        comment: comments[i].clone(),
        replies: children[i]
            .iter()
            .map(|&c| assemble(c, comments, children))
            .collect(),
    }
}

/// Depth-first rows for display: `(depth, comment)`.
pub fn flatten(tree: &[CommentNode]) -> Vec<(usize, &Comment)> {
    fn walk<'a>(nodes: &'a [CommentNode], depth: usize, out: &mut Vec<(usize, &'a Comment)>) {
        for node in nodes {
            out.push((depth, &node.comment));
            walk(&node.replies, depth + 1, out);
        }
    }

    let mut rows = Vec::new();
    walk(tree, 0, &mut rows);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, parent: Option<i64>) -> Comment {
        Comment {
            id: CommentId::Num(id),
            parent_id: parent.map(CommentId::Num),
            username: "luna".to_string(),
            comment: format!("comment {}", id),
            timestamp: None,
            media_name: Some("a.jpg".to_string()),
        }
    }

    #[test]
    fn test_orphan_reply_is_dropped() {
        let tree = build_comment_tree(&[
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(99)),
        ]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, CommentId::Num(1));
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].comment.id, CommentId::Num(2));
        assert!(flatten(&tree).iter().all(|(_, c)| c.id != CommentId::Num(3)));
    }

    #[test]
    fn test_siblings_keep_input_order() {
        let tree = build_comment_tree(&[
            comment(1, None),
            comment(5, Some(1)),
            comment(3, Some(1)),
            comment(2, None),
        ]);
        let roots: Vec<_> = tree.iter().map(|n| n.comment.id.clone()).collect();
        assert_eq!(roots, vec![CommentId::Num(1), CommentId::Num(2)]);
        let replies: Vec<_> = tree[0].replies.iter().map(|n| n.comment.id.clone()).collect();
        assert_eq!(replies, vec![CommentId::Num(5), CommentId::Num(3)]);
    }

    #[test]
    fn test_reply_listed_before_parent_is_attached() {
        let tree = build_comment_tree(&[comment(2, Some(1)), comment(1, None)]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].replies.len(), 1);
    }

    #[test]
    fn test_nested_depths() {
        let tree = build_comment_tree(&[
            comment(1, None),
            comment(2, Some(1)),
            comment(3, Some(2)),
        ]);
        let depths: Vec<usize> = flatten(&tree).iter().map(|(d, _)| *d).collect();
        assert_eq!(depths, vec![0, 1, 2]);
    }

    #[test]
    fn test_cycle_is_not_displayed() {
        let tree = build_comment_tree(&[comment(1, Some(2)), comment(2, Some(1))]);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(build_comment_tree(&[]).is_empty());
    }
}
