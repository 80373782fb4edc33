//! Mutation effects.
//!
//! A [`CountChange`] is relative and is applied once, to the canonical post in
//! the cache. What views receive is a [`ForumDelta`] carrying absolute values
//! read back from the cache, so every view converges on the same numbers no
//! matter how many times it is notified.

use petboard_proto::ForumPost;

/// Relative counter change caused by a successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountChange {
    /// The viewer liked the post.
    Liked,
    /// The viewer removed their like.
    Unliked,
    /// A comment or reply was created.
    CommentAdded,
    /// A comment was deleted together with its replies. Carries the number
    /// of comments removed.
    CommentsRemoved(u64),
}

impl CountChange {
    /// Apply to a post. Decrements saturate at zero.
    pub fn apply(self, post: &mut ForumPost) {
        match self {
            Self::Liked => post.likes_count = post.likes_count.saturating_add(1),
            Self::Unliked => post.likes_count = post.likes_count.saturating_sub(1),
            Self::CommentAdded => post.comments_count = post.comments_count.saturating_add(1),
            Self::CommentsRemoved(n) => post.comments_count = post.comments_count.saturating_sub(n),
        }
    }
}

/// Change a view must apply to its copy of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForumDelta {
    /// Counters changed.
    Counts {
        /// New like count
        likes_count: u64,
        /// New comment count
        comments_count: u64,
    },
    /// Content was edited; replaces the whole record.
    Replaced(ForumPost),
    /// The post no longer exists.
    Deleted,
}

impl ForumDelta {
    /// Counters of `post` as a delta.
    pub fn counts_of(post: &ForumPost) -> Self {
        Self::Counts { likes_count: post.likes_count, comments_count: post.comments_count }
    }

    /// Patch a view's copy in place. [`ForumDelta::Deleted`] is handled by the
    /// view, which drops the entry instead.
    pub fn patch(&self, post: &mut ForumPost) {
        match self {
            Self::Counts { likes_count, comments_count } => {
                post.likes_count = *likes_count;
                post.comments_count = *comments_count;
            },
            Self::Replaced(updated) => *post = updated.clone(),
            Self::Deleted => {},
        }
    }

    /// Whether this delta removes the post.
    pub fn is_deletion(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}
