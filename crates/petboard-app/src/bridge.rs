//! Request execution layer.
//!
//! The [`Bridge`] wraps the typed [`ForumApi`] and adapts it to the app
//! lifecycle: an [`ApiCall`] goes in, the matching [`AppEvent`] comes out.
//!
//! # Responsibilities
//!
//! - Routes each call to the right endpoint method.
//! - Echoes the call's routing data (ticket, view token, revision) into the
//!   completion so the app can reject stale results.
//! - Produces owned futures so many requests can be in flight at once.

use futures::{FutureExt, future::BoxFuture};
use petboard_client::{ForumApi, Transport};
use petboard_core::{DetailRequest, Revision};

use crate::{ApiCall, AppEvent};

/// Bridge between app actions and the forum API.
///
/// Generic over [`Transport`] to support both production and simulation.
#[derive(Debug, Clone)]
pub struct Bridge<T> {
    api: ForumApi<T>,
}

impl<T: Transport> Bridge<T> {
    /// Create a bridge over `transport`.
    pub fn new(transport: T) -> Self {
        Self { api: ForumApi::new(transport) }
    }

    /// Typed API in use.
    pub fn api(&self) -> &ForumApi<T> {
        &self.api
    }

    /// Execute `call`. The returned future owns everything it needs.
    pub fn execute(&self, call: ApiCall) -> BoxFuture<'static, AppEvent> {
        let api = self.api.clone();
        async move { perform(&api, call).await }.boxed()
    }
}

async fn perform<T: Transport>(api: &ForumApi<T>, call: ApiCall) -> AppEvent {
    match call {
        ApiCall::LoadList { ticket, revision } => {
            let result = api.list_forums(ticket.kind, &ticket.query).await;
            AppEvent::ListLoaded { ticket, revision, result }
        },
        ApiCall::Detail { request, revision } => perform_detail(api, request, revision).await,
        ApiCall::CreateForum { body } => {
            AppEvent::ForumCreated { result: api.create_forum(&body).await }
        },
        ApiCall::UpdateForum { forum_id, body } => {
            AppEvent::ForumUpdated { forum_id, result: api.update_forum(forum_id, &body).await }
        },
        ApiCall::DeleteForum { forum_id } => {
            AppEvent::ForumDeleted { forum_id, result: api.delete_forum(forum_id).await }
        },
    }
}

async fn perform_detail<T: Transport>(
    api: &ForumApi<T>,
    request: DetailRequest,
    revision: Revision,
) -> AppEvent {
    match request {
        DetailRequest::FetchForum { token, forum_id } => {
            AppEvent::ForumLoaded { token, revision, result: api.get_forum(forum_id).await }
        },
        DetailRequest::FetchComments { token, forum_id, ticket, size } => {
            let result = api.list_comments(forum_id, ticket.page, size).await;
            AppEvent::CommentsLoaded { token, ticket, result }
        },
        DetailRequest::CheckLike { token, forum_id } => {
            AppEvent::LikeStatusLoaded { token, result: api.check_like(forum_id).await }
        },
        DetailRequest::CreateComment { token, forum_id, body } => {
            let result = api.create_comment(forum_id, &body).await;
            AppEvent::CommentCreated { token, forum_id, result }
        },
        DetailRequest::UpdateComment { token, forum_id, comment_id, body } => {
            let result = api.update_comment(forum_id, comment_id, &body).await;
            AppEvent::CommentUpdated { token, forum_id, result }
        },
        DetailRequest::DeleteComment { token, forum_id, comment_id } => {
            let result = api.delete_comment(forum_id, comment_id).await;
            AppEvent::CommentDeleted { token, forum_id, comment_id, result }
        },
        DetailRequest::ToggleLike { token, forum_id } => {
            AppEvent::LikeToggled { token, forum_id, result: api.toggle_like(forum_id).await }
        },
    }
}
