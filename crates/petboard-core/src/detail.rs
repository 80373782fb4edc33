//! Detail view controller.
//!
//! One focused forum post with a single page of its top-level comments and
//! the viewer's like state.
//!
//! # Identity token
//!
//! Every request carries the [`ViewToken`] current when it was issued.
//! Opening another post or navigating away bumps the token, so completions
//! for the old focus are dropped instead of leaking into the new one. The
//! network call itself is never cancelled.
//!
//! Comment pages additionally carry a [`CommentTicket`]. A page fetched
//! before a comment write was confirmed no longer matches the server, so it
//! is dropped and fetched again rather than shown.
//!
//! # Like toggling
//!
//! Toggling is single-flight: while a toggle is in flight `like_processing`
//! is set and further toggles are dropped, not queued. Otherwise two rapid
//! clicks could leave the server's toggle state and the displayed flag out of
//! step.

use petboard_proto::{
    Comment, CommentId, CreateComment, ForumId, ForumPost, LikeOutcome, Page, UpdateComment,
    UserId, total_pages_for,
};

use crate::{Completion, ForumDelta, ForumError, ValidationError};

/// Comments shown per page.
pub const COMMENT_PAGE_SIZE: u32 = 5;

/// Identity of the detail view's current focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ViewToken(u64);

impl ViewToken {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Identifies one comment page load. Hand it back with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommentTicket {
    /// 0-based comment page.
    pub page: u32,
    /// Comment writes confirmed when the load was issued.
    pub writes: u64,
}

/// Requests the detail view needs performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRequest {
    /// Fetch the focused post.
    FetchForum {
        /// Focus the request belongs to.
        token: ViewToken,
        /// Post to fetch.
        forum_id: ForumId,
    },
    /// Fetch one page of top-level comments.
    FetchComments {
        /// Focus the request belongs to.
        token: ViewToken,
        /// Owning post.
        forum_id: ForumId,
        /// Page and write generation the load targets.
        ticket: CommentTicket,
        /// Comments per page.
        size: u32,
    },
    /// Ask whether the viewer likes the post.
    CheckLike {
        /// Focus the request belongs to.
        token: ViewToken,
        /// Post to check.
        forum_id: ForumId,
    },
    /// Create a comment or reply.
    CreateComment {
        /// Focus the request belongs to.
        token: ViewToken,
        /// Owning post.
        forum_id: ForumId,
        /// Validated body.
        body: CreateComment,
    },
    /// Edit a comment.
    UpdateComment {
        /// Focus the request belongs to.
        token: ViewToken,
        /// Owning post.
        forum_id: ForumId,
        /// Comment to edit.
        comment_id: CommentId,
        /// Validated body.
        body: UpdateComment,
    },
    /// Delete a comment.
    DeleteComment {
        /// Focus the request belongs to.
        token: ViewToken,
        /// Owning post.
        forum_id: ForumId,
        /// Comment to delete.
        comment_id: CommentId,
    },
    /// Toggle the viewer's like.
    ToggleLike {
        /// Focus the request belongs to.
        token: ViewToken,
        /// Post to toggle.
        forum_id: ForumId,
    },
}

impl DetailRequest {
    /// Focus the request was issued for.
    pub fn token(&self) -> ViewToken {
        match self {
            Self::FetchForum { token, .. }
            | Self::FetchComments { token, .. }
            | Self::CheckLike { token, .. }
            | Self::CreateComment { token, .. }
            | Self::UpdateComment { token, .. }
            | Self::DeleteComment { token, .. }
            | Self::ToggleLike { token, .. } => *token,
        }
    }
}

/// State of the detail view.
#[derive(Debug, Clone)]
pub struct DetailView {
    token: ViewToken,
    forum_id: Option<ForumId>,
    forum: Option<ForumPost>,
    comments: Vec<Comment>,
    /// Target comment page. Responses for other pages are stale.
    comment_page: u32,
    comment_size: u32,
    /// Confirmed comment creates, edits and deletions on this focus.
    comment_writes: u64,
    total_comment_pages: u32,
    total_comment_elements: u64,
    is_liked: bool,
    like_processing: bool,
    viewer: Option<UserId>,
    loading: bool,
    error: Option<String>,
}

impl Default for DetailView {
    fn default() -> Self {
        Self::new(COMMENT_PAGE_SIZE)
    }
}

impl DetailView {
    /// Create an empty view showing `comment_size` comments per page.
    pub fn new(comment_size: u32) -> Self {
        Self {
            token: ViewToken::default(),
            forum_id: None,
            forum: None,
            comments: Vec::new(),
            comment_page: 0,
            comment_size: comment_size.max(1),
            comment_writes: 0,
            total_comment_pages: 1,
            total_comment_elements: 0,
            is_liked: false,
            like_processing: false,
            viewer: None,
            loading: false,
            error: None,
        }
    }

    /// Focus `forum_id`.
    ///
    /// Fetches the post and its first comment page, plus the like state when
    /// a viewer is signed in. Anonymous viewers always see `is_liked = false`.
    pub fn open(&mut self, forum_id: ForumId, viewer: Option<UserId>) -> Vec<DetailRequest> {
        self.reset();
        self.forum_id = Some(forum_id);
        self.viewer = viewer;
        self.loading = true;
        tracing::debug!(forum_id, token = self.token.0, "detail open");

        let token = self.token;
        let mut requests = vec![
            DetailRequest::FetchForum { token, forum_id },
            self.fetch_comments(token, forum_id),
        ];
        if viewer.is_some() {
            requests.push(DetailRequest::CheckLike { token, forum_id });
        }
        requests
    }

    /// Clear all state. Completions for the previous focus become stale.
    pub fn reset(&mut self) {
        let token = self.token.next();
        let viewer = self.viewer;
        *self = Self::new(self.comment_size);
        self.token = token;
        self.viewer = viewer;
    }

    /// Update the viewer (sign-in or sign-out).
    ///
    /// Signing out clears the like flag. Signing in re-checks it for the
    /// open post.
    pub fn set_viewer(&mut self, viewer: Option<UserId>) -> Option<DetailRequest> {
        self.viewer = viewer;
        if viewer.is_none() {
            self.is_liked = false;
            return None;
        }
        self.forum_id.map(|forum_id| DetailRequest::CheckLike { token: self.token, forum_id })
    }

    /// Move to another comment page.
    pub fn load_comments(&mut self, page: u32) -> Result<DetailRequest, ForumError> {
        let forum_id = self.require_open()?;
        self.comment_page = page;
        Ok(self.fetch_comments(self.token, forum_id))
    }

    /// Target of the next comment page response.
    pub fn comment_ticket(&self) -> CommentTicket {
        CommentTicket { page: self.comment_page, writes: self.comment_writes }
    }

    /// Fetch the current comment page again if the response for `ticket` was
    /// issued before a comment write the view has since confirmed.
    ///
    /// Returns `None` when the response is current or belongs to another
    /// focus or page.
    pub fn refetch_superseded(
        &self,
        token: ViewToken,
        ticket: CommentTicket,
    ) -> Option<DetailRequest> {
        if !self.is_current(token)
            || ticket.page != self.comment_page
            || ticket.writes == self.comment_writes
        {
            return None;
        }
        tracing::debug!(page = ticket.page, "comment page predates a comment write");
        self.forum_id.map(|forum_id| self.fetch_comments(token, forum_id))
    }

    /// Request a new comment or reply.
    ///
    /// Nothing is inserted until the server confirms, so the view never shows
    /// a comment with a made-up ID.
    pub fn add_comment(&mut self, body: CreateComment) -> Result<DetailRequest, ForumError> {
        let forum_id = self.require_loaded()?;
        self.require_viewer("comment")?;
        if let Some(parent_id) = body.parent_id
            && self.find_comment(parent_id).is_none()
        {
            return Err(ValidationError::UnknownParent(parent_id).into());
        }
        Ok(DetailRequest::CreateComment { token: self.token, forum_id, body })
    }

    /// Request an edit of one of the viewer's comments.
    pub fn update_comment(
        &mut self,
        comment_id: CommentId,
        body: UpdateComment,
    ) -> Result<DetailRequest, ForumError> {
        let forum_id = self.require_loaded()?;
        let viewer = self.require_viewer("edit comments")?;
        let comment = self.find_comment(comment_id).ok_or_else(|| missing_comment(comment_id))?;
        if comment.author_user_id != viewer {
            return Err(ForumError::Forbidden("edit this comment"));
        }
        Ok(DetailRequest::UpdateComment { token: self.token, forum_id, comment_id, body })
    }

    /// Request deletion of a comment.
    ///
    /// Allowed for the comment's author and the post's author.
    pub fn delete_comment(&mut self, comment_id: CommentId) -> Result<DetailRequest, ForumError> {
        let forum_id = self.require_loaded()?;
        let viewer = self.require_viewer("delete comments")?;
        let comment = self.find_comment(comment_id).ok_or_else(|| missing_comment(comment_id))?;
        let owns_post = self.forum.as_ref().is_some_and(|f| f.author_user_id == viewer);
        if comment.author_user_id != viewer && !owns_post {
            return Err(ForumError::Forbidden("delete this comment"));
        }
        Ok(DetailRequest::DeleteComment { token: self.token, forum_id, comment_id })
    }

    /// Request a like toggle.
    ///
    /// Returns `None` (and sends nothing) while another toggle is in flight,
    /// for anonymous viewers, and before the post has loaded.
    pub fn toggle_like(&mut self) -> Option<DetailRequest> {
        if self.like_processing {
            tracing::debug!(forum_id = ?self.forum_id, "like toggle already in flight");
            return None;
        }
        if self.viewer.is_none() {
            return None;
        }
        let forum_id = self.forum.as_ref()?.forum_id;
        self.like_processing = true;
        Some(DetailRequest::ToggleLike { token: self.token, forum_id })
    }

    /// Whether a completion for `token` would be applied.
    pub fn is_current(&self, token: ViewToken) -> bool {
        token == self.token && self.forum_id.is_some()
    }

    /// Feed the post fetch.
    pub fn complete_forum(
        &mut self,
        token: ViewToken,
        result: Result<ForumPost, ForumError>,
    ) -> Completion {
        if !self.accepts(token) {
            return Completion::Stale;
        }
        self.loading = false;
        match result {
            Ok(post) => {
                self.forum = Some(post);
                Completion::Applied
            },
            Err(err) => self.store_error(&err),
        }
    }

    /// Whether a comment page response for `ticket` would be applied.
    pub fn accepts_comments(&self, token: ViewToken, ticket: CommentTicket) -> bool {
        self.is_current(token) && ticket == self.comment_ticket()
    }

    /// Feed the comment page fetch for `ticket`.
    pub fn complete_comments(
        &mut self,
        token: ViewToken,
        ticket: CommentTicket,
        result: Result<Page<Comment>, ForumError>,
    ) -> Completion {
        if !self.accepts(token) || ticket != self.comment_ticket() {
            return Completion::Stale;
        }
        match result {
            Ok(loaded) => {
                self.total_comment_pages = loaded.total_pages_for(self.comment_size);
                self.total_comment_elements = loaded.total_elements;
                self.comments = loaded.content;
                self.comments.truncate(self.comment_size as usize);
                Completion::Applied
            },
            Err(err) => self.store_error(&err),
        }
    }

    /// Feed the like-status check.
    pub fn complete_like_status(
        &mut self,
        token: ViewToken,
        result: Result<bool, ForumError>,
    ) -> Completion {
        if !self.accepts(token) {
            return Completion::Stale;
        }
        match result {
            Ok(liked) => {
                self.is_liked = liked && self.viewer.is_some();
                Completion::Applied
            },
            Err(err) => self.store_error(&err),
        }
    }

    /// Feed a comment creation.
    ///
    /// A new top-level comment is shown only while page 0 is displayed. A
    /// reply is attached to its parent when the parent is on screen. The
    /// post's comment count increments either way.
    pub fn complete_add_comment(
        &mut self,
        token: ViewToken,
        result: Result<Comment, ForumError>,
    ) -> Completion {
        if !self.accepts(token) {
            return Completion::Stale;
        }
        let comment = match result {
            Ok(comment) => comment,
            Err(err) => return self.store_error(&err),
        };
        self.comment_writes += 1;

        match comment.parent_id {
            Some(parent_id) => {
                if let Some(parent) = self.find_comment_mut(parent_id) {
                    parent.replies.push(comment);
                }
            },
            None => {
                self.total_comment_elements = self.total_comment_elements.saturating_add(1);
                self.total_comment_pages =
                    total_pages_for(self.total_comment_elements, self.comment_size, 0);
                if self.comment_page == 0 {
                    self.comments.insert(0, comment);
                    self.comments.truncate(self.comment_size as usize);
                }
            },
        }
        if let Some(forum) = self.forum.as_mut() {
            forum.comments_count = forum.comments_count.saturating_add(1);
        }
        self.error = None;
        Completion::Applied
    }

    /// Feed a comment edit.
    pub fn complete_update_comment(
        &mut self,
        token: ViewToken,
        result: Result<Comment, ForumError>,
    ) -> Completion {
        if !self.accepts(token) {
            return Completion::Stale;
        }
        match result {
            Ok(updated) => {
                self.comment_writes += 1;
                if let Some(existing) = self.find_comment_mut(updated.comment_id) {
                    existing.text = updated.text;
                }
                self.error = None;
                Completion::Applied
            },
            Err(err) => self.store_error(&err),
        }
    }

    /// Feed a comment deletion.
    ///
    /// The post's comment count drops by the size of the removed thread,
    /// floored at zero.
    pub fn complete_delete_comment(
        &mut self,
        token: ViewToken,
        comment_id: CommentId,
        result: Result<(), ForumError>,
    ) -> Completion {
        if !self.accepts(token) {
            return Completion::Stale;
        }
        if let Err(err) = result {
            return self.store_error(&err);
        }
        self.comment_writes += 1;

        let removed = self.remove_comment(comment_id).map_or(1, |c| c.thread_len());
        if let Some(forum) = self.forum.as_mut() {
            forum.comments_count = forum.comments_count.saturating_sub(removed);
        }
        self.error = None;
        Completion::Applied
    }

    /// Feed a like toggle.
    ///
    /// Clears `like_processing` whether the toggle succeeded or not.
    pub fn complete_toggle_like(
        &mut self,
        token: ViewToken,
        result: Result<LikeOutcome, ForumError>,
    ) -> Completion {
        if !self.accepts(token) {
            return Completion::Stale;
        }
        self.like_processing = false;
        match result {
            Ok(outcome) => {
                self.is_liked = outcome.is_liked();
                if let Some(forum) = self.forum.as_mut() {
                    forum.likes_count = match outcome {
                        LikeOutcome::Liked => forum.likes_count.saturating_add(1),
                        LikeOutcome::Unliked => forum.likes_count.saturating_sub(1),
                    };
                }
                self.error = None;
                Completion::Applied
            },
            Err(err) => self.store_error(&err),
        }
    }

    /// Reflect a mutation performed elsewhere.
    ///
    /// Returns true if the focused post was affected. A deletion clears the
    /// view and leaves an explanatory error.
    pub fn apply_external_mutation(&mut self, forum_id: ForumId, delta: &ForumDelta) -> bool {
        if self.forum_id != Some(forum_id) {
            return false;
        }
        if delta.is_deletion() {
            self.reset();
            self.error = Some("This forum post has been deleted.".to_string());
            return true;
        }
        match self.forum.as_mut() {
            Some(forum) => {
                delta.patch(forum);
                true
            },
            None => false,
        }
    }

    /// Record an error that happened before any request was made.
    pub fn fail(&mut self, err: &ForumError) {
        self.error = Some(err.user_message());
    }

    /// Current focus token.
    pub fn token(&self) -> ViewToken {
        self.token
    }

    /// Focused post ID, set as soon as the view is opened.
    pub fn forum_id(&self) -> Option<ForumId> {
        self.forum_id
    }

    /// Focused post, once loaded.
    pub fn forum(&self) -> Option<&ForumPost> {
        self.forum.as_ref()
    }

    /// Comments on the current page.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Current 0-based comment page.
    pub fn comment_page(&self) -> u32 {
        self.comment_page
    }

    /// Comments per page.
    pub fn comment_size(&self) -> u32 {
        self.comment_size
    }

    /// Displayed comment page count. Always at least 1.
    pub fn total_comment_pages(&self) -> u32 {
        self.total_comment_pages
    }

    /// Total top-level comments.
    pub fn total_comment_elements(&self) -> u64 {
        self.total_comment_elements
    }

    /// Whether the viewer likes the focused post.
    pub fn is_liked(&self) -> bool {
        self.is_liked
    }

    /// Whether a like toggle is in flight.
    pub fn is_like_processing(&self) -> bool {
        self.like_processing
    }

    /// Whether the post fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Viewer the view was opened for.
    pub fn viewer(&self) -> Option<UserId> {
        self.viewer
    }

    /// User-facing error of the last failed operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Find a comment on the current page, replies included.
    pub fn find_comment(&self, comment_id: CommentId) -> Option<&Comment> {
        self.comments.iter().find_map(|c| c.find(comment_id))
    }

    /// Take a comment (or reply) off the current page.
    fn remove_comment(&mut self, comment_id: CommentId) -> Option<Comment> {
        if let Some(pos) = self.comments.iter().position(|c| c.comment_id == comment_id) {
            self.total_comment_elements = self.total_comment_elements.saturating_sub(1);
            self.total_comment_pages =
                total_pages_for(self.total_comment_elements, self.comment_size, 0);
            return Some(self.comments.remove(pos));
        }
        self.comments.iter_mut().find_map(|c| c.remove_reply(comment_id))
    }

    fn find_comment_mut(&mut self, comment_id: CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find_map(|c| c.find_mut(comment_id))
    }

    fn accepts(&self, token: ViewToken) -> bool {
        let current = self.is_current(token);
        if !current {
            tracing::debug!(
                token = token.0,
                current = self.token.0,
                "dropping stale detail completion"
            );
        }
        current
    }

    fn fetch_comments(&self, token: ViewToken, forum_id: ForumId) -> DetailRequest {
        let ticket = self.comment_ticket();
        DetailRequest::FetchComments { token, forum_id, ticket, size: self.comment_size }
    }

    fn store_error(&mut self, err: &ForumError) -> Completion {
        tracing::warn!(forum_id = ?self.forum_id, error = %err, "detail operation failed");
        self.error = Some(err.user_message());
        Completion::Failed
    }

    fn require_open(&self) -> Result<ForumId, ForumError> {
        self.forum_id.ok_or_else(|| ForumError::StateConflict("no forum post is open".into()))
    }

    fn require_loaded(&self) -> Result<ForumId, ForumError> {
        self.forum
            .as_ref()
            .map(|f| f.forum_id)
            .ok_or_else(|| ForumError::StateConflict("the forum post has not loaded yet".into()))
    }

    fn require_viewer(&self, action: &'static str) -> Result<UserId, ForumError> {
        self.viewer.ok_or(ForumError::Unauthenticated(action))
    }
}

fn missing_comment(comment_id: CommentId) -> ForumError {
    ForumError::StateConflict(format!("comment {comment_id} is not on the current page"))
}
