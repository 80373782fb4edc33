//! Application side-effects.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::ForumApp`] state machine for the runtime to
//! execute.

use petboard_core::{DetailRequest, ListTicket, Revision};
use petboard_proto::{CreateForum, ForumId, UpdateForum};

/// Actions produced by the app state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// State changed; redraw.
    Render,

    /// Perform a backend request.
    Request(ApiCall),
}

/// A backend request, tagged with what its completion needs to be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// Load one list page.
    LoadList {
        /// Target the response belongs to.
        ticket: ListTicket,
        /// Cache revision when the load was issued.
        revision: Revision,
    },

    /// Detail view request.
    Detail {
        /// Request, carrying the detail view token.
        request: DetailRequest,
        /// Cache revision when the request was issued.
        revision: Revision,
    },

    /// Create a forum post.
    CreateForum {
        /// Validated body.
        body: CreateForum,
    },

    /// Edit a forum post.
    UpdateForum {
        /// Post to edit.
        forum_id: ForumId,
        /// Validated body.
        body: UpdateForum,
    },

    /// Delete a forum post.
    DeleteForum {
        /// Post to delete.
        forum_id: ForumId,
    },
}

impl ApiCall {
    /// Whether the call changes server state.
    pub fn is_write(&self) -> bool {
        match self {
            Self::LoadList { .. } => false,
            Self::Detail { request, .. } => matches!(
                request,
                DetailRequest::CreateComment { .. }
                    | DetailRequest::UpdateComment { .. }
                    | DetailRequest::DeleteComment { .. }
                    | DetailRequest::ToggleLike { .. }
            ),
            Self::CreateForum { .. } | Self::UpdateForum { .. } | Self::DeleteForum { .. } => true,
        }
    }
}
