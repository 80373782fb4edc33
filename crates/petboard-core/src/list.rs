//! List view controller.
//!
//! One paginated, sortable, filterable projection of forum posts. The three
//! list surfaces (all, mine, featured) are three instances of [`ListView`]
//! that differ only in their [`ListKind`].
//!
//! # Stale responses
//!
//! Every load returns a [`ListTicket`] carrying the query that initiated it.
//! A response is applied only while that query is still the view's target,
//! so a slow response for page 2 cannot overwrite page 3 after the user has
//! moved on. [`ListView::reset`] starts a new epoch, which also strands every
//! load issued before it, even for an identical query.

use petboard_proto::{
    ForumId, ForumPost, ListKind, ListQuery, Page, SortBy, SortDir, total_pages_for,
};

use crate::{Completion, ForumDelta, ForumError};

/// Identifies one list load. Hand it back with the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListTicket {
    /// Surface the load belongs to.
    pub kind: ListKind,
    /// Query the load was issued for.
    pub query: ListQuery,
    /// Reset count of the view when the load was issued.
    pub epoch: u64,
}

/// State of one list surface.
#[derive(Debug, Clone)]
pub struct ListView {
    kind: ListKind,
    /// Current target. Responses for any other query are stale.
    query: ListQuery,
    content: Vec<ForumPost>,
    total_pages: u32,
    total_elements: u64,
    loading: bool,
    /// At least one load has been applied.
    loaded: bool,
    error: Option<String>,
    epoch: u64,
}

impl ListView {
    /// Create an empty, never-loaded view with `size` posts per page.
    pub fn new(kind: ListKind, size: u32) -> Self {
        Self {
            kind,
            query: ListQuery::with_size(size),
            content: Vec::new(),
            total_pages: 1,
            total_elements: 0,
            loading: false,
            loaded: false,
            error: None,
            epoch: 0,
        }
    }

    /// Forget all content and the current query, and strand every load in
    /// flight.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self { epoch, ..Self::new(self.kind, self.query.size) };
        tracing::debug!(kind = %self.kind, epoch, "list reset");
    }

    /// Start loading `query`.
    ///
    /// Previously loaded content stays visible until the response lands.
    pub fn load(&mut self, query: ListQuery) -> ListTicket {
        tracing::debug!(kind = %self.kind, page = query.page, "list load");
        self.query = query;
        self.loading = true;
        ListTicket { kind: self.kind, query: self.query.clone(), epoch: self.epoch }
    }

    /// Reload the current target.
    pub fn refresh(&mut self) -> ListTicket {
        self.load(self.query.clone())
    }

    /// Move to page `page`. Pages outside `0..total_pages` are ignored.
    pub fn set_page(&mut self, page: u32) -> Option<ListTicket> {
        if page >= self.total_pages {
            tracing::debug!(
                kind = %self.kind,
                page,
                total_pages = self.total_pages,
                "page out of range"
            );
            return None;
        }
        let query = ListQuery { page, ..self.query.clone() };
        Some(self.load(query))
    }

    /// Change the sort order and return to the first page.
    pub fn set_sort(&mut self, sort_by: SortBy, sort_dir: SortDir) -> ListTicket {
        let query = ListQuery { page: 0, sort_by, sort_dir, ..self.query.clone() };
        self.load(query)
    }

    /// Change the free-text search and return to the first page.
    ///
    /// Ignored by the backend while a tag search is active.
    pub fn set_search_term(&mut self, term: impl Into<String>) -> ListTicket {
        let query = ListQuery { page: 0, search_term: term.into(), ..self.query.clone() };
        self.load(query)
    }

    /// Change the tag search and return to the first page.
    pub fn set_tag_search_term(&mut self, term: impl Into<String>) -> ListTicket {
        let query = ListQuery { page: 0, tag_search_term: term.into(), ..self.query.clone() };
        self.load(query)
    }

    /// Whether a response for `ticket` would still be applied.
    pub fn is_current(&self, ticket: &ListTicket) -> bool {
        ticket.kind == self.kind && ticket.epoch == self.epoch && ticket.query == self.query
    }

    /// Feed the response for `ticket`.
    pub fn complete(
        &mut self,
        ticket: &ListTicket,
        result: Result<Page<ForumPost>, ForumError>,
    ) -> Completion {
        if !self.is_current(ticket) {
            tracing::debug!(
                kind = %self.kind,
                page = ticket.query.page,
                "dropping stale list response"
            );
            return Completion::Stale;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.total_elements = page.total_elements;
                self.total_pages = page.total_pages_for(self.query.size);
                self.content = page.content;
                self.loaded = true;
                self.error = None;
                Completion::Applied
            },
            Err(err) => {
                tracing::warn!(kind = %self.kind, error = %err, "list load failed");
                self.error = Some(err.user_message());
                Completion::Failed
            },
        }
    }

    /// Record an error that happened before any request was made.
    pub fn fail(&mut self, err: &ForumError) {
        self.error = Some(err.user_message());
    }

    /// Reflect a mutation performed elsewhere.
    ///
    /// Counts and edits are patched in place. A deletion drops the entry and
    /// shrinks the totals; if that empties a page other than the first, the
    /// view steps back one page and returns the reload to perform.
    pub fn apply_external_mutation(
        &mut self,
        forum_id: ForumId,
        delta: &ForumDelta,
    ) -> Option<ListTicket> {
        let pos = self.content.iter().position(|p| p.forum_id == forum_id)?;

        if !delta.is_deletion() {
            delta.patch(&mut self.content[pos]);
            return None;
        }

        self.content.remove(pos);
        self.total_elements = self.total_elements.saturating_sub(1);
        self.total_pages = total_pages_for(self.total_elements, self.query.size, 0);

        if self.content.is_empty() && self.query.page > 0 {
            let page = (self.query.page - 1).min(self.total_pages - 1);
            let query = ListQuery { page, ..self.query.clone() };
            return Some(self.load(query));
        }
        None
    }

    /// Whether the current page holds `forum_id`.
    pub fn contains(&self, forum_id: ForumId) -> bool {
        self.content.iter().any(|p| p.forum_id == forum_id)
    }

    /// List surface.
    pub fn kind(&self) -> ListKind {
        self.kind
    }

    /// Current target query.
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Current 0-based page.
    pub fn page(&self) -> u32 {
        self.query.page
    }

    /// Posts on the current page.
    pub fn content(&self) -> &[ForumPost] {
        &self.content
    }

    /// Displayed page count. Always at least 1.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Total matching posts.
    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Whether a load for the current target is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether at least one load has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// User-facing error of the last failed operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
