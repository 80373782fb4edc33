//! Request completions.
//!
//! This module defines [`AppEvent`], the completions that drive the
//! [`crate::ForumApp`] coordinator. Each variant echoes the routing data of
//! the [`crate::ApiCall`] that produced it, so the app can tell a current
//! completion from a stale one.

use petboard_core::{CommentTicket, ForumError, ListTicket, Revision, ViewToken};
use petboard_proto::{Comment, CommentId, ForumId, ForumPost, LikeOutcome, Page};

/// Completions processed by the app state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A list page arrived.
    ListLoaded {
        /// Target the load was issued for.
        ticket: ListTicket,
        /// Cache revision when the load was issued.
        revision: Revision,
        /// Normalized page or error.
        result: Result<Page<ForumPost>, ForumError>,
    },

    /// The detail view's post arrived.
    ForumLoaded {
        /// Detail focus the fetch was issued for.
        token: ViewToken,
        /// Cache revision when the fetch was issued.
        revision: Revision,
        /// Post or error.
        result: Result<ForumPost, ForumError>,
    },

    /// A comment page arrived.
    CommentsLoaded {
        /// Detail focus the fetch was issued for.
        token: ViewToken,
        /// Page and comment-write generation the fetch targeted.
        ticket: CommentTicket,
        /// Normalized page or error.
        result: Result<Page<Comment>, ForumError>,
    },

    /// The viewer's like state arrived.
    LikeStatusLoaded {
        /// Detail focus the check was issued for.
        token: ViewToken,
        /// Like flag or error.
        result: Result<bool, ForumError>,
    },

    /// A comment was created.
    CommentCreated {
        /// Detail focus the request was issued from.
        token: ViewToken,
        /// Owning post.
        forum_id: ForumId,
        /// Server record or error.
        result: Result<Comment, ForumError>,
    },

    /// A comment was edited.
    CommentUpdated {
        /// Detail focus the request was issued from.
        token: ViewToken,
        /// Owning post.
        forum_id: ForumId,
        /// Server record or error.
        result: Result<Comment, ForumError>,
    },

    /// A comment was deleted.
    CommentDeleted {
        /// Detail focus the request was issued from.
        token: ViewToken,
        /// Owning post.
        forum_id: ForumId,
        /// Deleted comment.
        comment_id: CommentId,
        /// Outcome.
        result: Result<(), ForumError>,
    },

    /// A like toggle completed.
    LikeToggled {
        /// Detail focus the request was issued from.
        token: ViewToken,
        /// Toggled post.
        forum_id: ForumId,
        /// Which way the toggle went, or error.
        result: Result<LikeOutcome, ForumError>,
    },

    /// A forum post was created.
    ForumCreated {
        /// Server record or error.
        result: Result<ForumPost, ForumError>,
    },

    /// A forum post was edited.
    ForumUpdated {
        /// Edited post.
        forum_id: ForumId,
        /// Server record or error.
        result: Result<ForumPost, ForumError>,
    },

    /// A forum post was deleted.
    ForumDeleted {
        /// Deleted post.
        forum_id: ForumId,
        /// Outcome.
        result: Result<(), ForumError>,
    },
}

impl AppEvent {
    /// Cache revision of the read this event completes, for events whose
    /// result is merged against the cache.
    pub fn read_revision(&self) -> Option<Revision> {
        match self {
            Self::ListLoaded { revision, .. } | Self::ForumLoaded { revision, .. } => {
                Some(*revision)
            },
            _ => None,
        }
    }
}
