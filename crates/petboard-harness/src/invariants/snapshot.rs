//! Observable state extracted for invariant checks.

use std::collections::BTreeMap;

use petboard_app::{ForumApp, Runtime};
use petboard_client::Transport;
use petboard_core::{DetailView, ListView};
use petboard_proto::{ForumId, ForumPost};
use serde::Serialize;

use crate::SimBackend;

/// The two counters every view must agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Likes.
    pub likes: u64,
    /// Comments, replies included.
    pub comments: u64,
}

impl Counts {
    /// Counters of `post`.
    pub fn of(post: &ForumPost) -> Self {
        Self { likes: post.likes_count, comments: post.comments_count }
    }
}

/// One list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSnapshot {
    /// List surface name.
    pub kind: String,
    /// Target page.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Displayed page count.
    pub total_pages: u32,
    /// Displayed post count.
    pub total_elements: u64,
    /// Whether a load for the target is outstanding.
    pub loading: bool,
    /// Displayed posts in order.
    pub posts: Vec<(ForumId, Counts)>,
}

impl ListSnapshot {
    /// Capture `view`.
    pub fn of(view: &ListView) -> Self {
        Self {
            kind: view.kind().to_string(),
            page: view.page(),
            size: view.query().size,
            total_pages: view.total_pages(),
            total_elements: view.total_elements(),
            loading: view.is_loading(),
            posts: view.content().iter().map(|p| (p.forum_id, Counts::of(p))).collect(),
        }
    }
}

/// The detail view, when focused on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailSnapshot {
    /// Focused post.
    pub forum_id: ForumId,
    /// Displayed counters, once the post has loaded.
    pub counts: Option<Counts>,
    /// Whether the post fetch is outstanding.
    pub loading: bool,
    /// Whether a like toggle is outstanding.
    pub like_processing: bool,
    /// Target comment page.
    pub comment_page: u32,
    /// Displayed comment page count.
    pub total_comment_pages: u32,
}

impl DetailSnapshot {
    /// Capture `view`. `None` if nothing is focused.
    pub fn of(view: &DetailView) -> Option<Self> {
        let forum_id = view.forum_id()?;
        Some(Self {
            forum_id,
            counts: view.forum().map(Counts::of),
            loading: view.is_loading(),
            like_processing: view.is_like_processing(),
            comment_page: view.comment_page(),
            total_comment_pages: view.total_comment_pages(),
        })
    }
}

/// Complete observable state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemSnapshot {
    /// Every list view.
    pub lists: Vec<ListSnapshot>,
    /// The detail view.
    pub detail: Option<DetailSnapshot>,
    /// Cached counters per post.
    pub cache: BTreeMap<ForumId, Counts>,
    /// Requests still in flight.
    pub in_flight: usize,
    /// Server counters per post. Only captured once the runtime is idle.
    pub backend: Option<BTreeMap<ForumId, Counts>>,
}

impl SystemSnapshot {
    /// Snapshot with no views, no cache and nothing in flight.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the app's views and cache.
    pub fn from_app(app: &ForumApp) -> Self {
        Self {
            lists: app.lists().map(ListSnapshot::of).collect(),
            detail: DetailSnapshot::of(app.detail()),
            cache: app.cache().posts().map(|p| (p.forum_id, Counts::of(p))).collect(),
            in_flight: 0,
            backend: None,
        }
    }

    /// Capture the runtime's app and its in-flight count.
    pub fn from_runtime<T: Transport>(runtime: &Runtime<T>) -> Self {
        Self { in_flight: runtime.in_flight(), ..Self::from_app(runtime.app()) }
    }

    /// Add the server's counters.
    #[must_use]
    pub fn with_backend(mut self, backend: &SimBackend) -> Self {
        self.backend =
            Some(backend.forums().iter().map(|p| (p.forum_id, Counts::of(p))).collect());
        self
    }

    /// Add a list view.
    #[must_use]
    pub fn with_list(mut self, list: ListSnapshot) -> Self {
        self.lists.push(list);
        self
    }

    /// Add a cached post.
    #[must_use]
    pub fn with_cached(mut self, forum_id: ForumId, counts: Counts) -> Self {
        self.cache.insert(forum_id, counts);
        self
    }
}
