//! Forum entities.
//!
//! Field names follow the backend's camelCase JSON. Counters are unsigned so
//! the non-negativity of `likesCount` and `commentsCount` is carried by the
//! type; every decrement elsewhere in the workspace saturates at zero.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Forum post identifier.
pub type ForumId = u64;

/// Comment identifier.
pub type CommentId = u64;

/// User identifier.
pub type UserId = u64;

/// A user-authored topic in the discussion board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumPost {
    /// Stable post identifier.
    pub forum_id: ForumId,
    /// Post title.
    pub title: String,
    /// Rich-text (HTML) body.
    #[serde(default)]
    pub content: String,
    /// Ordered tags. Duplicates are not removed.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author's first name.
    #[serde(default)]
    pub author_first_name: String,
    /// Author's last name.
    #[serde(default)]
    pub author_last_name: String,
    /// Author's e-mail address.
    #[serde(default)]
    pub author_email: String,
    /// Author's user ID.
    pub author_user_id: UserId,
    /// Creation time. `None` if the backend omitted it.
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Last modification time. `None` if never updated.
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    /// Number of likes.
    #[serde(default)]
    pub likes_count: u64,
    /// Number of comments, replies included.
    #[serde(default)]
    pub comments_count: u64,
}

impl ForumPost {
    /// Author display name ("First Last"), trimmed.
    pub fn author_name(&self) -> String {
        format!("{} {}", self.author_first_name, self.author_last_name).trim().to_string()
    }
}

/// A comment on a forum post, possibly a reply to another comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Stable comment identifier.
    pub comment_id: CommentId,
    /// Owning forum post.
    pub forum_id: ForumId,
    /// Author's user ID.
    pub author_user_id: UserId,
    /// Comment body.
    pub text: String,
    /// Creation time. `None` if the backend omitted it.
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// Parent comment. `None` for top-level comments.
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    /// Direct replies, oldest first.
    #[serde(default)]
    pub replies: Vec<Comment>,
    /// Users who liked this comment.
    #[serde(default)]
    pub liked_by: BTreeSet<UserId>,
}

impl Comment {
    /// Whether this comment replies to another one.
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Find this comment or one of its (transitive) replies by ID.
    pub fn find(&self, comment_id: CommentId) -> Option<&Comment> {
        if self.comment_id == comment_id {
            return Some(self);
        }
        self.replies.iter().find_map(|reply| reply.find(comment_id))
    }

    /// Mutable variant of [`Comment::find`].
    pub fn find_mut(&mut self, comment_id: CommentId) -> Option<&mut Comment> {
        if self.comment_id == comment_id {
            return Some(self);
        }
        self.replies.iter_mut().find_map(|reply| reply.find_mut(comment_id))
    }

    /// Number of comments in this thread: this comment plus all transitive
    /// replies.
    pub fn thread_len(&self) -> u64 {
        1 + self.replies.iter().map(Comment::thread_len).sum::<u64>()
    }

    /// Remove a transitive reply by ID. Returns the removed reply.
    pub fn remove_reply(&mut self, comment_id: CommentId) -> Option<Comment> {
        if let Some(pos) = self.replies.iter().position(|r| r.comment_id == comment_id) {
            return Some(self.replies.remove(pos));
        }
        self.replies.iter_mut().find_map(|reply| reply.remove_reply(comment_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(comment_id: CommentId, parent_id: Option<CommentId>) -> Comment {
        Comment {
            comment_id,
            forum_id: 1,
            author_user_id: 7,
            text: format!("comment {comment_id}"),
            created_at: None,
            parent_id,
            replies: Vec::new(),
            liked_by: BTreeSet::new(),
        }
    }

    #[test]
    fn forum_post_decodes_backend_json() {
        let json = serde_json::json!({
            "forumId": 12,
            "title": "Best kibble for senior dogs?",
            "content": "<p>My lab is 11</p>",
            "tags": ["dog", "food", "dog"],
            "authorFirstName": "Sam",
            "authorLastName": "Lee",
            "authorEmail": "sam@example.com",
            "authorUserId": 3,
            "createdAt": "2024-03-01T09:30:00",
            "likesCount": 4,
            "commentsCount": 2
        });

        let post: ForumPost = serde_json::from_value(json).unwrap();
        assert_eq!(post.forum_id, 12);
        assert_eq!(post.tags, vec!["dog", "food", "dog"]);
        assert_eq!(post.author_name(), "Sam Lee");
        assert!(post.created_at.is_some());
        assert!(post.updated_at.is_none());
        assert_eq!(post.likes_count, 4);
    }

    #[test]
    fn missing_counters_default_to_zero() {
        let json = serde_json::json!({ "forumId": 1, "title": "t", "authorUserId": 1 });
        let post: ForumPost = serde_json::from_value(json).unwrap();
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.comments_count, 0);
    }

    #[test]
    fn nested_reply_lookup_and_removal() {
        let mut root = comment(1, None);
        let mut child = comment(2, Some(1));
        child.replies.push(comment(3, Some(2)));
        root.replies.push(child);

        assert!(root.find(3).is_some());
        assert!(root.find(9).is_none());

        root.find_mut(3).unwrap().text = "edited".into();
        assert_eq!(root.find(3).unwrap().text, "edited");

        let removed = root.remove_reply(3).unwrap();
        assert_eq!(removed.comment_id, 3);
        assert!(root.find(3).is_none());
        assert!(root.find(2).is_some());
    }
}
