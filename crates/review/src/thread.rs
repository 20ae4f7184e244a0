//! Nesting a flat comment list into a reply tree.

use std::collections::{HashMap, HashSet, VecDeque};

use cadence_core::types::DbId;
use cadence_db::models::comment::Comment;
use serde::Serialize;

/// A comment with its direct replies.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Deepest nesting level a thread renders with. Replies below it are
/// listed flat, in thread order, under their ancestor one level up.
pub const MAX_THREAD_DEPTH: usize = 32;

/// Nest `comments` (oldest first) under their parents.
///
/// Sibling order follows input order. A comment whose parent is not in the
/// list is treated as top-level. Built without recursion, so reply chains
/// of any length are safe.
pub fn build_thread(comments: Vec<Comment>) -> Vec<CommentNode> {
    let ids: HashSet<DbId> = comments.iter().map(|c| c.id).collect();

    let mut children: HashMap<Option<DbId>, Vec<Comment>> = HashMap::new();
    for comment in comments {
        let parent = comment.parent_id.filter(|p| ids.contains(p));
        children.entry(parent).or_default().push(comment);
    }

    let mut roots = Vec::new();
    for root in children.remove(&None).unwrap_or_default() {
        let mut stack = vec![Frame::open(root, &mut children)];
        loop {
            let depth = stack.len();
            let Some(frame) = stack.last_mut() else {
                break;
            };
            match frame.pending.pop_front() {
                Some(child) if depth + 1 < MAX_THREAD_DEPTH => {
                    let next = Frame::open(child, &mut children);
                    stack.push(next);
                }
                Some(child) => {
                    let below = children.remove(&Some(child.id)).unwrap_or_default();
                    for reply in below.into_iter().rev() {
                        frame.pending.push_front(reply);
                    }
                    frame.replies.push(CommentNode {
                        comment: child,
                        replies: Vec::new(),
                    });
                }
                None => {
                    let Some(done) = stack.pop() else {
                        break;
                    };
                    let node = CommentNode {
                        comment: done.comment,
                        replies: done.replies,
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.replies.push(node),
                        None => roots.push(node),
                    }
                }
            }
        }
    }
    roots
}

/// A comment whose replies are still being attached.
struct Frame {
    comment: Comment,
    pending: VecDeque<Comment>,
    replies: Vec<CommentNode>,
}

impl Frame {
    fn open(comment: Comment, children: &mut HashMap<Option<DbId>, Vec<Comment>>) -> Self {
        let pending = children.remove(&Some(comment.id)).unwrap_or_default().into();
        Self {
            comment,
            pending,
            replies: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn comment(id: DbId, parent_id: Option<DbId>) -> Comment {
        Comment {
            id,
            approval_id: 1,
            author_id: 1,
            parent_id,
            content: format!("c{id}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn shape(nodes: &[CommentNode]) -> Vec<(DbId, Vec<DbId>)> {
        nodes
            .iter()
            .map(|n| (n.comment.id, n.replies.iter().map(|r| r.comment.id).collect()))
            .collect()
    }

    #[test]
    fn replies_nest_under_parent_in_order() {
        let tree = build_thread(vec![
            comment(1, None),
            comment(2, Some(1)),
            comment(3, None),
            comment(4, Some(1)),
            comment(5, Some(2)),
        ]);

        assert_eq!(shape(&tree), vec![(1, vec![2, 4]), (3, vec![])]);
        assert_eq!(tree[0].replies[0].replies[0].comment.id, 5);
    }

    #[test]
    fn orphaned_reply_is_top_level() {
        let tree = build_thread(vec![comment(2, Some(1)), comment(3, None)]);
        assert_eq!(shape(&tree), vec![(2, vec![]), (3, vec![])]);
    }

    #[test]
    fn empty_thread() {
        assert!(build_thread(Vec::new()).is_empty());
    }

    /// `n` comments, each replying to the one before.
    fn chain(n: DbId) -> Vec<Comment> {
        (1..=n)
            .map(|id| comment(id, (id > 1).then(|| id - 1)))
            .collect()
    }

    #[test]
    fn deep_chain_is_capped_and_keeps_every_comment() {
        let tree = build_thread(chain(100));
        assert_eq!(tree.len(), 1);

        let mut levels = 1;
        let mut node = &tree[0];
        while node.replies.len() == 1 {
            node = &node.replies[0];
            levels += 1;
        }

        assert_eq!(levels, MAX_THREAD_DEPTH - 1);
        let flattened: Vec<DbId> = node.replies.iter().map(|r| r.comment.id).collect();
        assert_eq!(flattened, (MAX_THREAD_DEPTH as DbId..=100).collect::<Vec<_>>());
        assert!(node.replies.iter().all(|r| r.replies.is_empty()));
    }

    #[test]
    fn very_long_chain_builds_and_serializes() {
        let tree = build_thread(chain(20_000));
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json[0]["id"], 1);
    }

    #[test]
    fn flattened_replies_keep_thread_order() {
        let mut comments = chain(MAX_THREAD_DEPTH as DbId);
        let last = MAX_THREAD_DEPTH as DbId;
        comments.push(comment(last + 1, Some(last - 1)));
        // Below the cap: lifted next to its parent.
        comments.push(comment(last + 2, Some(last)));

        let tree = build_thread(comments);
        let mut node = &tree[0];
        while node.replies.len() == 1 {
            node = &node.replies[0];
        }
        let ids: Vec<DbId> = node.replies.iter().map(|r| r.comment.id).collect();
        assert_eq!(ids, vec![last, last + 2, last + 1]);
    }
}
