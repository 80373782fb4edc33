//! Application state machine.
//!
//! This module defines [`ForumApp`], which owns every piece of forum state
//! the client displays and is completely decoupled from I/O.
//!
//! User intents are methods that return [`AppAction`]s. Completions of the
//! requested work come back through [`ForumApp::handle`] (see the
//! coordinator), which is the only place the entity cache is written.
//!
//! # Responsibilities
//!
//! - Holds one [`ListView`] per [`ListKind`] and the single [`DetailView`].
//! - Validates drafts and checks authorship before any request is issued.
//! - Tracks a transient status message for the last mutation outcome.

use std::collections::BTreeMap;

use petboard_client::ClientConfig;
use petboard_core::{
    CommentDraft, DetailRequest, DetailView, EntityCache, ForumDraft, ForumError, ListTicket,
    ListView,
};
use petboard_proto::{
    CommentId, ForumId, ForumPost, ListKind, SortBy, SortDir, UpdateComment, UserId,
};

use crate::{ApiCall, AppAction};

/// Application state machine.
///
/// Pure state machine that turns intents and completions into actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct ForumApp {
    /// Signed-in user. `None` for an anonymous viewer.
    pub(crate) viewer: Option<UserId>,
    /// Canonical records.
    pub(crate) cache: EntityCache,
    /// One view per list surface.
    pub(crate) lists: BTreeMap<ListKind, ListView>,
    /// The focused post.
    pub(crate) detail: DetailView,
    /// Posts per list page.
    pub(crate) page_size: u32,
    /// Transient status message. `None` if no message.
    pub(crate) status_message: Option<String>,
}

impl ForumApp {
    /// Create the app for `viewer`, sized by `config`.
    pub fn new(viewer: Option<UserId>, config: &ClientConfig) -> Self {
        let lists = ListKind::ALL
            .into_iter()
            .map(|kind| (kind, ListView::new(kind, config.page_size)))
            .collect();
        Self {
            viewer,
            cache: EntityCache::new(),
            lists,
            detail: DetailView::new(config.comment_page_size),
            page_size: config.page_size,
            status_message: None,
        }
    }

    /// Reload a list surface's current target.
    pub fn load_list(&mut self, kind: ListKind) -> Vec<AppAction> {
        self.list_request(kind, |view| Some(view.refresh()))
    }

    /// Move a list to `page`. Out-of-range pages are ignored.
    pub fn set_page(&mut self, kind: ListKind, page: u32) -> Vec<AppAction> {
        self.list_request(kind, |view| view.set_page(page))
    }

    /// Change a list's sort. Returns to the first page.
    pub fn set_sort(
        &mut self,
        kind: ListKind,
        sort_by: SortBy,
        sort_dir: SortDir,
    ) -> Vec<AppAction> {
        self.list_request(kind, |view| Some(view.set_sort(sort_by, sort_dir)))
    }

    /// Change a list's free-text search. Returns to the first page.
    pub fn set_search_term(&mut self, kind: ListKind, term: &str) -> Vec<AppAction> {
        self.list_request(kind, |view| Some(view.set_search_term(term)))
    }

    /// Change a list's tag search. Returns to the first page.
    pub fn set_tag_search_term(&mut self, kind: ListKind, term: &str) -> Vec<AppAction> {
        self.list_request(kind, |view| Some(view.set_tag_search_term(term)))
    }

    /// Focus the detail view on `forum_id`.
    pub fn open_forum(&mut self, forum_id: ForumId) -> Vec<AppAction> {
        self.cache.retain_comments_of(forum_id);
        let requests = self.detail.open(forum_id, self.viewer);
        let mut actions: Vec<_> = requests.into_iter().map(|r| self.detail_call(r)).collect();
        actions.push(AppAction::Render);
        actions
    }

    /// Leave the detail view. In-flight detail completions become stale.
    pub fn close_forum(&mut self) -> Vec<AppAction> {
        self.detail.reset();
        vec![AppAction::Render]
    }

    /// Show another page of the focused post's comments.
    pub fn load_comments(&mut self, page: u32) -> Vec<AppAction> {
        let result = self.detail.load_comments(page);
        self.detail_result(result)
    }

    /// Toggle the viewer's like on the focused post.
    ///
    /// Does nothing for anonymous viewers or while a toggle is in flight.
    pub fn toggle_like(&mut self) -> Vec<AppAction> {
        match self.detail.toggle_like() {
            Some(request) => vec![self.detail_call(request), AppAction::Render],
            None => Vec::new(),
        }
    }

    /// Post a comment or reply on the focused post.
    ///
    /// Does nothing for anonymous viewers.
    pub fn add_comment(&mut self, draft: &CommentDraft) -> Vec<AppAction> {
        if self.viewer.is_none() {
            tracing::debug!("ignoring comment from anonymous viewer");
            return Vec::new();
        }
        let result = draft
            .validate()
            .map_err(ForumError::from)
            .and_then(|body| self.detail.add_comment(body));
        self.detail_result(result)
    }

    /// Edit one of the viewer's comments on the focused post.
    pub fn update_comment(&mut self, comment_id: CommentId, text: &str) -> Vec<AppAction> {
        let result = CommentDraft::new(text)
            .validate()
            .map_err(ForumError::from)
            .and_then(|body| {
                self.detail.update_comment(comment_id, UpdateComment { text: body.text })
            });
        self.detail_result(result)
    }

    /// Delete a comment on the focused post.
    pub fn delete_comment(&mut self, comment_id: CommentId) -> Vec<AppAction> {
        let result = self.detail.delete_comment(comment_id);
        self.detail_result(result)
    }

    /// Create a forum post.
    pub fn create_forum(&mut self, draft: &ForumDraft) -> Vec<AppAction> {
        let result = self
            .require_viewer("create forum posts")
            .and_then(|_| draft.validate().map_err(ForumError::from));
        match result {
            Ok(body) => {
                self.status_message = Some("Publishing forum post...".to_string());
                vec![AppAction::Request(ApiCall::CreateForum { body }), AppAction::Render]
            },
            Err(err) => self.reject(&err),
        }
    }

    /// Edit one of the viewer's forum posts.
    pub fn update_forum(&mut self, forum_id: ForumId, draft: &ForumDraft) -> Vec<AppAction> {
        let result = self
            .require_author(forum_id, "edit this forum post")
            .and_then(|()| draft.validate().map_err(ForumError::from));
        match result {
            Ok(body) => {
                vec![AppAction::Request(ApiCall::UpdateForum { forum_id, body }), AppAction::Render]
            },
            Err(err) => self.reject(&err),
        }
    }

    /// Delete one of the viewer's forum posts.
    pub fn delete_forum(&mut self, forum_id: ForumId) -> Vec<AppAction> {
        match self.require_author(forum_id, "delete this forum post") {
            Ok(()) => {
                vec![AppAction::Request(ApiCall::DeleteForum { forum_id }), AppAction::Render]
            },
            Err(err) => self.reject(&err),
        }
    }

    /// Sign in or out.
    ///
    /// Any change of viewer clears the "my forums" list and drops its loads
    /// in flight. Signing out clears the detail like flag. Signing in
    /// re-checks the like state of the focused post.
    pub fn set_viewer(&mut self, viewer: Option<UserId>) -> Vec<AppAction> {
        if viewer != self.viewer {
            self.list_mut(ListKind::Mine).reset();
        }
        self.viewer = viewer;
        let mut actions = Vec::new();
        if let Some(request) = self.detail.set_viewer(viewer) {
            actions.push(self.detail_call(request));
        }
        actions.push(AppAction::Render);
        actions
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Signed-in user, if any.
    pub fn viewer(&self) -> Option<UserId> {
        self.viewer
    }

    /// Canonical records.
    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    /// View of one list surface.
    pub fn list(&self, kind: ListKind) -> Option<&ListView> {
        self.lists.get(&kind)
    }

    /// All list views.
    pub fn lists(&self) -> impl Iterator<Item = &ListView> {
        self.lists.values()
    }

    /// The detail view.
    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Issue a list load produced by `f`, or report why it cannot be issued.
    fn list_request(
        &mut self,
        kind: ListKind,
        f: impl FnOnce(&mut ListView) -> Option<ListTicket>,
    ) -> Vec<AppAction> {
        if kind == ListKind::Mine && self.viewer.is_none() {
            let err = ForumError::Unauthenticated("view your forum posts");
            self.list_mut(kind).fail(&err);
            return vec![AppAction::Render];
        }
        match f(self.list_mut(kind)) {
            Some(ticket) => vec![self.list_call(ticket), AppAction::Render],
            None => Vec::new(),
        }
    }

    pub(crate) fn list_mut(&mut self, kind: ListKind) -> &mut ListView {
        let page_size = self.page_size;
        self.lists.entry(kind).or_insert_with(|| ListView::new(kind, page_size))
    }

    pub(crate) fn list_call(&mut self, ticket: ListTicket) -> AppAction {
        AppAction::Request(ApiCall::LoadList { ticket, revision: self.cache.begin_read() })
    }

    /// Post fetches are merged against the cache, so they register as reads.
    pub(crate) fn detail_call(&mut self, request: DetailRequest) -> AppAction {
        let revision = match request {
            DetailRequest::FetchForum { .. } => self.cache.begin_read(),
            _ => self.cache.revision(),
        };
        AppAction::Request(ApiCall::Detail { request, revision })
    }

    fn detail_result(&mut self, result: Result<DetailRequest, ForumError>) -> Vec<AppAction> {
        match result {
            Ok(request) => vec![self.detail_call(request), AppAction::Render],
            Err(err) => {
                self.detail.fail(&err);
                self.reject(&err)
            },
        }
    }

    /// Record a rejected intent. Nothing is sent.
    fn reject(&mut self, err: &ForumError) -> Vec<AppAction> {
        tracing::warn!(error = %err, "operation rejected");
        self.status_message = Some(err.user_message());
        vec![AppAction::Render]
    }

    fn require_viewer(&self, action: &'static str) -> Result<UserId, ForumError> {
        self.viewer.ok_or(ForumError::Unauthenticated(action))
    }

    /// The viewer must be signed in and, when the post is known, its author.
    fn require_author(&self, forum_id: ForumId, action: &'static str) -> Result<(), ForumError> {
        let viewer = self.require_viewer(action)?;
        match self.known_post(forum_id) {
            Some(post) if post.author_user_id != viewer => Err(ForumError::Forbidden(action)),
            _ => Ok(()),
        }
    }

    /// Best local copy of a post: cache first, then any view holding it.
    pub(crate) fn known_post(&self, forum_id: ForumId) -> Option<&ForumPost> {
        self.cache
            .get(forum_id)
            .or_else(|| self.detail.forum().filter(|f| f.forum_id == forum_id))
            .or_else(|| {
                self.lists
                    .values()
                    .find_map(|l| l.content().iter().find(|p| p.forum_id == forum_id))
            })
    }
}
