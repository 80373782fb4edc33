//! In-memory forum backend.
//!
//! [`SimBackend`] implements [`Transport`] by routing each [`ApiRequest`] to
//! an in-process rendition of the REST backend. State changes when a request
//! arrives; the response is then held back for the request's latency. Several
//! requests in flight with different latencies therefore complete out of
//! order while the server applied them in send order, as over a real network.
//!
//! Latency per request is the next delay scripted with
//! [`SimBackend::delay_next`], or else the base latency plus seeded jitter.
//! Clones share one backend.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use petboard_client::{ApiResponse, Transport, TransportError};
use petboard_core::{COMMENT_PAGE_SIZE, Identity, SharedIdentity};
use petboard_proto::{
    ApiRequest, Comment, CommentId, CreateComment, CreateForum, DEFAULT_PAGE_SIZE, ForumId,
    ForumPost, Method, SortBy, SortDir, UpdateComment, UpdateForum, UserId, endpoints::FORUMS,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

/// How paginated responses are laid out.
///
/// The backend has shipped all three shapes at some point; clients must
/// accept each of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageShape {
    /// Totals next to `content`.
    #[default]
    Flat,
    /// Totals under a `page` object.
    Nested,
    /// A flat page inside an `{ message, data }` envelope.
    Wrapped,
}

/// A scripted failure for the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The request never reaches the server.
    Offline,
    /// The request times out before reaching the server.
    Timeout,
    /// The server answers with an error status without changing state.
    Status {
        /// HTTP status
        status: u16,
        /// Error message in the body
        message: String,
    },
}

struct BackendState {
    posts: BTreeMap<ForumId, ForumPost>,
    /// Top-level comments per post, oldest first. Replies nest inside.
    comments: BTreeMap<ForumId, Vec<Comment>>,
    likes: BTreeSet<(ForumId, UserId)>,
    featured: BTreeSet<ForumId>,
    next_forum_id: ForumId,
    next_comment_id: CommentId,
    shape: PageShape,
    failures: VecDeque<Failure>,
    delays: VecDeque<Duration>,
    latency: Duration,
    jitter: Duration,
    rng: ChaCha8Rng,
    log: Vec<ApiRequest>,
}

/// Shared in-memory backend. See the module documentation.
#[derive(Clone)]
pub struct SimBackend {
    state: Arc<Mutex<BackendState>>,
    identity: SharedIdentity,
}

impl SimBackend {
    /// Empty backend that authenticates requests as `identity`.
    pub fn new(identity: SharedIdentity) -> Self {
        Self::with_seed(identity, 0)
    }

    /// Empty backend whose latency jitter is drawn from `seed`.
    pub fn with_seed(identity: SharedIdentity, seed: u64) -> Self {
        let state = BackendState {
            posts: BTreeMap::new(),
            comments: BTreeMap::new(),
            likes: BTreeSet::new(),
            featured: BTreeSet::new(),
            next_forum_id: 1,
            next_comment_id: 1,
            shape: PageShape::default(),
            failures: VecDeque::new(),
            delays: VecDeque::new(),
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(seed),
            log: Vec::new(),
        };
        Self { state: Arc::new(Mutex::new(state)), identity }
    }

    /// Session the backend authenticates requests with.
    pub fn identity(&self) -> &SharedIdentity {
        &self.identity
    }

    /// Lay out paginated responses as `shape`.
    pub fn set_page_shape(&self, shape: PageShape) {
        self.lock().shape = shape;
    }

    /// Delay every response by `base` plus up to `jitter`.
    pub fn set_latency(&self, base: Duration, jitter: Duration) {
        let mut state = self.lock();
        state.latency = base;
        state.jitter = jitter;
    }

    /// Delay the next unscripted request by exactly `delay`.
    pub fn delay_next(&self, delay: Duration) {
        self.lock().delays.push_back(delay);
    }

    /// Fail the next request that has no failure scripted yet.
    pub fn fail_next(&self, failure: Failure) {
        self.lock().failures.push_back(failure);
    }

    /// Add a post by `author`.
    pub fn seed_forum(&self, author: UserId, title: &str, tags: &[&str]) -> ForumId {
        let body = CreateForum {
            title: title.to_string(),
            content: format!("<p>{title}</p>"),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        };
        self.lock().insert_forum(author, body).forum_id
    }

    /// Add a comment, or a reply to `parent_id`. `None` if the post or the
    /// parent does not exist.
    pub fn seed_comment(
        &self,
        forum_id: ForumId,
        author: UserId,
        text: &str,
        parent_id: Option<CommentId>,
    ) -> Option<CommentId> {
        let body = CreateComment { text: text.to_string(), parent_id };
        self.lock().insert_comment(forum_id, author, body).map(|c| c.comment_id)
    }

    /// Make `user` like `forum_id`. Returns `false` if the like already
    /// existed or the post does not.
    pub fn seed_like(&self, forum_id: ForumId, user: UserId) -> bool {
        let mut state = self.lock();
        if !state.posts.contains_key(&forum_id) || state.likes.contains(&(forum_id, user)) {
            return false;
        }
        state.toggle_like(forum_id, user)
    }

    /// Put `forum_id` on the featured list.
    pub fn feature(&self, forum_id: ForumId) {
        self.lock().featured.insert(forum_id);
    }

    /// Current server copy of a post.
    pub fn forum(&self, forum_id: ForumId) -> Option<ForumPost> {
        self.lock().posts.get(&forum_id).cloned()
    }

    /// Every post, by ID.
    pub fn forums(&self) -> Vec<ForumPost> {
        self.lock().posts.values().cloned().collect()
    }

    /// Every post ID, ascending.
    pub fn forum_ids(&self) -> Vec<ForumId> {
        self.lock().posts.keys().copied().collect()
    }

    /// Top-level comments of a post, oldest first, replies nested.
    pub fn comments(&self, forum_id: ForumId) -> Vec<Comment> {
        self.lock().comments.get(&forum_id).cloned().unwrap_or_default()
    }

    /// Whether `user` likes `forum_id`.
    pub fn is_liked(&self, forum_id: ForumId, user: UserId) -> bool {
        self.lock().likes.contains(&(forum_id, user))
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().log.clone()
    }

    /// Number of `method` requests whose path ends with `path_suffix`.
    pub fn request_count(&self, method: Method, path_suffix: &str) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|r| r.method == method && r.path.ends_with(path_suffix))
            .count()
    }

    /// Forget the request log.
    pub fn clear_requests(&self) {
        self.lock().log.clear();
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SimBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SimBackend")
            .field("posts", &state.posts.len())
            .field("likes", &state.likes.len())
            .field("requests", &state.log.len())
            .finish_non_exhaustive()
    }
}

impl Transport for SimBackend {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let viewer = self.identity.user_id();
        let (outcome, delay) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.log.push(request.clone());
            let delay = state.next_delay();
            let outcome = match state.failures.pop_front() {
                Some(Failure::Offline) => {
                    Err(TransportError::Connection("simulated outage".to_string()))
                },
                Some(Failure::Timeout) => Err(TransportError::Timeout),
                Some(Failure::Status { status, message }) => Ok(error(status, &message)),
                None => Ok(state.route(viewer, &request)),
            };
            (outcome, delay)
        };

        tracing::trace!(
            %request,
            status = ?outcome.as_ref().ok().map(|r| r.status),
            delay_ms = delay.as_millis() as u64,
            "sim backend"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

impl BackendState {
    fn next_delay(&mut self) -> Duration {
        if let Some(delay) = self.delays.pop_front() {
            return delay;
        }
        if self.jitter.is_zero() {
            return self.latency;
        }
        let jitter_ms = self.rng.gen_range(0..=self.jitter.as_millis() as u64);
        self.latency + Duration::from_millis(jitter_ms)
    }

    fn route(&mut self, viewer: Option<UserId>, request: &ApiRequest) -> ApiResponse {
        let Some(rest) = request.path.strip_prefix(FORUMS) else {
            return error(404, "No such endpoint");
        };
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

        match (request.method, segments.as_slice()) {
            (Method::Get, []) => self.list(request, |_| true),
            (Method::Get, ["search"]) => {
                let term = request.query_value("searchTerm").unwrap_or_default().to_lowercase();
                self.list(request, |post| {
                    post.title.to_lowercase().contains(&term)
                        || post.content.to_lowercase().contains(&term)
                })
            },
            (Method::Get, ["search", "tags"]) => {
                let tags: Vec<String> =
                    request.query_values("tags").map(str::to_lowercase).collect();
                self.list(request, |post| {
                    post.tags.iter().any(|t| tags.contains(&t.to_lowercase()))
                })
            },
            (Method::Get, ["my-forums"]) => match viewer {
                Some(user) => self.list(request, |post| post.author_user_id == user),
                None => unauthorized(),
            },
            (Method::Get, ["featured"]) => {
                self.list(request, |post| self.featured.contains(&post.forum_id))
            },
            (Method::Post, []) => self.create_forum(viewer, request),
            (method, [id, rest @ ..]) => match id.parse::<ForumId>() {
                Ok(forum_id) if self.posts.contains_key(&forum_id) => {
                    self.route_forum(viewer, method, forum_id, rest, request)
                },
                Ok(_) => error(404, "Forum not found"),
                Err(_) => error(404, "No such endpoint"),
            },
            _ => error(404, "No such endpoint"),
        }
    }

    fn route_forum(
        &mut self,
        viewer: Option<UserId>,
        method: Method,
        forum_id: ForumId,
        rest: &[&str],
        request: &ApiRequest,
    ) -> ApiResponse {
        match (method, rest) {
            (Method::Get, []) => {
                envelope(200, "Forum retrieved successfully", &self.posts.get(&forum_id))
            },
            (Method::Put, []) => self.update_forum(viewer, forum_id, request),
            (Method::Delete, []) => self.delete_forum(viewer, forum_id),
            (Method::Get, ["comments"]) => self.list_comments(forum_id, request),
            (Method::Post, ["comments"]) => self.create_comment(viewer, forum_id, request),
            (Method::Put, ["comments", id]) => match id.parse() {
                Ok(comment_id) => self.update_comment(viewer, forum_id, comment_id, request),
                Err(_) => error(404, "Comment not found"),
            },
            (Method::Delete, ["comments", id]) => match id.parse() {
                Ok(comment_id) => self.delete_comment(viewer, forum_id, comment_id),
                Err(_) => error(404, "Comment not found"),
            },
            (Method::Get, ["likes", "check"]) => match viewer {
                Some(user) => envelope(
                    200,
                    "Like status retrieved successfully",
                    &self.likes.contains(&(forum_id, user)),
                ),
                None => unauthorized(),
            },
            (Method::Post, ["likes", "toggle"]) => match viewer {
                Some(user) => {
                    let message = if self.toggle_like(forum_id, user) {
                        "Forum liked successfully"
                    } else {
                        "Forum unliked successfully"
                    };
                    ApiResponse::ok(json!({ "message": message, "data": null }))
                },
                None => unauthorized(),
            },
            _ => error(404, "No such endpoint"),
        }
    }

    fn list(&self, request: &ApiRequest, keep: impl Fn(&ForumPost) -> bool) -> ApiResponse {
        let sort_by: SortBy =
            request.query_value("sortBy").and_then(|v| v.parse().ok()).unwrap_or_default();
        let sort_dir: SortDir =
            request.query_value("sortDir").and_then(|v| v.parse().ok()).unwrap_or_default();

        let mut posts: Vec<&ForumPost> = self.posts.values().filter(|p| keep(p)).collect();
        posts.sort_by_key(|p| (sort_key(p, sort_by), p.forum_id));
        if sort_dir == SortDir::Desc {
            posts.reverse();
        }

        let (page, size) = page_params(request, DEFAULT_PAGE_SIZE);
        ApiResponse::ok(self.page_body(posts, page, size, "Forums retrieved successfully"))
    }

    fn list_comments(&self, forum_id: ForumId, request: &ApiRequest) -> ApiResponse {
        let newest_first: Vec<&Comment> =
            self.comments.get(&forum_id).map(|c| c.iter().rev().collect()).unwrap_or_default();
        let (page, size) = page_params(request, COMMENT_PAGE_SIZE);
        ApiResponse::ok(self.page_body(newest_first, page, size, "Comments retrieved successfully"))
    }

    fn page_body<T: Serialize>(&self, items: Vec<T>, page: u32, size: u32, message: &str) -> Value {
        let total_elements = items.len() as u64;
        let total_pages = total_elements.div_ceil(u64::from(size));
        let content: Vec<T> =
            items.into_iter().skip(page as usize * size as usize).take(size as usize).collect();

        let flat = json!({
            "content": content,
            "number": page,
            "size": size,
            "totalElements": total_elements,
            "totalPages": total_pages,
        });
        match self.shape {
            PageShape::Flat => flat,
            PageShape::Nested => json!({
                "content": flat["content"],
                "page": {
                    "number": page,
                    "size": size,
                    "totalElements": total_elements,
                    "totalPages": total_pages,
                },
            }),
            PageShape::Wrapped => json!({ "message": message, "data": flat }),
        }
    }

    fn create_forum(&mut self, viewer: Option<UserId>, request: &ApiRequest) -> ApiResponse {
        let Some(author) = viewer else {
            return unauthorized();
        };
        let body: CreateForum = match decode(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        if body.title.trim().is_empty() {
            return error(400, "Title is required");
        }
        let post = self.insert_forum(author, body);
        envelope(201, "Forum created successfully", &post)
    }

    fn update_forum(
        &mut self,
        viewer: Option<UserId>,
        forum_id: ForumId,
        request: &ApiRequest,
    ) -> ApiResponse {
        let Some(user) = viewer else {
            return unauthorized();
        };
        let body: UpdateForum = match decode(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let Some(post) = self.posts.get_mut(&forum_id) else {
            return error(404, "Forum not found");
        };
        if post.author_user_id != user {
            return error(403, "You can only edit your own forum posts");
        }
        post.title = body.title;
        post.content = body.content;
        post.tags = body.tags;
        envelope(200, "Forum updated successfully", &*post)
    }

    fn delete_forum(&mut self, viewer: Option<UserId>, forum_id: ForumId) -> ApiResponse {
        let Some(user) = viewer else {
            return unauthorized();
        };
        if self.posts.get(&forum_id).is_some_and(|p| p.author_user_id != user) {
            return error(403, "You can only delete your own forum posts");
        }
        self.posts.remove(&forum_id);
        self.comments.remove(&forum_id);
        self.featured.remove(&forum_id);
        self.likes.retain(|(liked, _)| *liked != forum_id);
        ApiResponse::ok(json!({ "message": "Forum deleted successfully", "data": null }))
    }

    fn create_comment(
        &mut self,
        viewer: Option<UserId>,
        forum_id: ForumId,
        request: &ApiRequest,
    ) -> ApiResponse {
        let Some(author) = viewer else {
            return unauthorized();
        };
        let body: CreateComment = match decode(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        if body.text.trim().is_empty() {
            return error(400, "Comment text is required");
        }
        match self.insert_comment(forum_id, author, body) {
            Some(comment) => envelope(201, "Comment created successfully", &comment),
            None => error(404, "Parent comment not found"),
        }
    }

    fn update_comment(
        &mut self,
        viewer: Option<UserId>,
        forum_id: ForumId,
        comment_id: CommentId,
        request: &ApiRequest,
    ) -> ApiResponse {
        let Some(user) = viewer else {
            return unauthorized();
        };
        let body: UpdateComment = match decode(request) {
            Ok(body) => body,
            Err(response) => return response,
        };
        let Some(comment) = self
            .comments
            .get_mut(&forum_id)
            .and_then(|thread| thread.iter_mut().find_map(|c| c.find_mut(comment_id)))
        else {
            return error(404, "Comment not found");
        };
        if comment.author_user_id != user {
            return error(403, "You can only edit your own comments");
        }
        comment.text = body.text;
        envelope(200, "Comment updated successfully", &*comment)
    }

    fn delete_comment(
        &mut self,
        viewer: Option<UserId>,
        forum_id: ForumId,
        comment_id: CommentId,
    ) -> ApiResponse {
        let Some(user) = viewer else {
            return unauthorized();
        };
        let post_author = self.posts.get(&forum_id).map(|p| p.author_user_id);
        let Some(comment_author) = self
            .comments
            .get(&forum_id)
            .and_then(|thread| thread.iter().find_map(|c| c.find(comment_id)))
            .map(|c| c.author_user_id)
        else {
            return error(404, "Comment not found");
        };
        if comment_author != user && post_author != Some(user) {
            return error(403, "You can only delete your own comments");
        }

        let removed = self.remove_comment(forum_id, comment_id).map_or(0, |c| c.thread_len());
        if let Some(post) = self.posts.get_mut(&forum_id) {
            post.comments_count = post.comments_count.saturating_sub(removed);
        }
        ApiResponse::ok(json!({ "message": "Comment deleted successfully", "data": null }))
    }

    fn insert_forum(&mut self, author: UserId, body: CreateForum) -> ForumPost {
        let forum_id = self.next_forum_id;
        self.next_forum_id += 1;
        let post = ForumPost {
            forum_id,
            title: body.title,
            content: body.content,
            tags: body.tags,
            author_first_name: "User".to_string(),
            author_last_name: author.to_string(),
            author_email: format!("user{author}@petboard.test"),
            author_user_id: author,
            created_at: None,
            updated_at: None,
            likes_count: 0,
            comments_count: 0,
        };
        self.posts.insert(forum_id, post.clone());
        post
    }

    fn insert_comment(
        &mut self,
        forum_id: ForumId,
        author: UserId,
        body: CreateComment,
    ) -> Option<Comment> {
        let post = self.posts.get_mut(&forum_id)?;
        let comment = Comment {
            comment_id: self.next_comment_id,
            forum_id,
            author_user_id: author,
            text: body.text,
            created_at: None,
            parent_id: body.parent_id,
            replies: Vec::new(),
            liked_by: BTreeSet::new(),
        };

        let thread = self.comments.entry(forum_id).or_default();
        match body.parent_id {
            Some(parent_id) => {
                let parent = thread.iter_mut().find_map(|c| c.find_mut(parent_id))?;
                parent.replies.push(comment.clone());
            },
            None => thread.push(comment.clone()),
        }
        post.comments_count += 1;
        self.next_comment_id += 1;
        Some(comment)
    }

    fn remove_comment(&mut self, forum_id: ForumId, comment_id: CommentId) -> Option<Comment> {
        let thread = self.comments.get_mut(&forum_id)?;
        if let Some(pos) = thread.iter().position(|c| c.comment_id == comment_id) {
            return Some(thread.remove(pos));
        }
        thread.iter_mut().find_map(|c| c.remove_reply(comment_id))
    }

    /// Flip `user`'s like on `forum_id`. Returns whether the post is now liked.
    fn toggle_like(&mut self, forum_id: ForumId, user: UserId) -> bool {
        let liked = !self.likes.remove(&(forum_id, user));
        if liked {
            self.likes.insert((forum_id, user));
        }
        if let Some(post) = self.posts.get_mut(&forum_id) {
            post.likes_count =
                if liked { post.likes_count + 1 } else { post.likes_count.saturating_sub(1) };
        }
        liked
    }
}

fn sort_key(post: &ForumPost, sort_by: SortBy) -> u64 {
    match sort_by {
        // IDs are assigned in creation order.
        SortBy::CreatedAt => post.forum_id,
        SortBy::LikesCount => post.likes_count,
        SortBy::CommentsCount => post.comments_count,
    }
}

fn page_params(request: &ApiRequest, default_size: u32) -> (u32, u32) {
    let page = request.query_value("page").and_then(|v| v.parse().ok()).unwrap_or(0);
    let size = request.query_value("size").and_then(|v| v.parse().ok()).unwrap_or(default_size);
    (page, size.max(1))
}

fn decode<T: DeserializeOwned>(request: &ApiRequest) -> Result<T, ApiResponse> {
    let body = request.body.clone().ok_or_else(|| error(400, "Request body is required"))?;
    serde_json::from_value(body).map_err(|e| error(400, &format!("Malformed request body: {e}")))
}

fn envelope(status: u16, message: &str, data: &impl Serialize) -> ApiResponse {
    ApiResponse::new(status, json!({ "message": message, "data": data }))
}

fn error(status: u16, message: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "message": message }))
}

fn unauthorized() -> ApiResponse {
    error(401, "Authentication required")
}

#[cfg(test)]
mod tests {
    use petboard_core::Viewer;
    use petboard_proto::{ListKind, ListQuery, endpoints};

    use super::*;

    const ALICE: UserId = 1;
    const BOB: UserId = 2;

    fn backend_as(user: UserId) -> SimBackend {
        SimBackend::new(SharedIdentity::signed_in(Viewer::new(user, format!("token-{user}"))))
    }

    #[tokio::test]
    async fn lists_sort_and_paginate() {
        let backend = backend_as(ALICE);
        let quiet = backend.seed_forum(ALICE, "Quiet cat", &["cat"]);
        let popular = backend.seed_forum(BOB, "Popular dog", &["dog"]);
        backend.seed_like(popular, ALICE);
        backend.seed_like(popular, BOB);
        backend.seed_like(quiet, BOB);
        backend.seed_forum(BOB, "Fresh hamster", &["hamster"]);

        let query = ListQuery {
            size: 2,
            sort_by: SortBy::LikesCount,
            sort_dir: SortDir::Desc,
            ..ListQuery::default()
        };
        let response =
            backend.send(endpoints::list_forums(ListKind::All, &query)).await.unwrap();

        assert_eq!(response.body["totalElements"], 3);
        assert_eq!(response.body["totalPages"], 2);
        let ids: Vec<u64> = response.body["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["forumId"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![popular, quiet]);
    }

    #[tokio::test]
    async fn deleting_a_comment_removes_its_thread() {
        let backend = backend_as(ALICE);
        let forum_id = backend.seed_forum(ALICE, "Litter advice", &[]);
        let root = backend.seed_comment(forum_id, BOB, "Try pine", None).unwrap();
        let reply = backend.seed_comment(forum_id, ALICE, "Thanks", Some(root)).unwrap();
        backend.seed_comment(forum_id, BOB, "Welcome", Some(reply)).unwrap();
        backend.seed_comment(forum_id, BOB, "Also clay", None).unwrap();
        assert_eq!(backend.forum(forum_id).unwrap().comments_count, 4);

        let response = backend.send(endpoints::delete_comment(forum_id, root)).await.unwrap();

        assert!(response.is_success());
        assert_eq!(backend.forum(forum_id).unwrap().comments_count, 1);
        assert_eq!(backend.comments(forum_id).len(), 1);
    }

    #[tokio::test]
    async fn toggle_flips_and_reports_direction() {
        let backend = backend_as(ALICE);
        let forum_id = backend.seed_forum(BOB, "Parrot words", &[]);

        let first = backend.send(endpoints::toggle_like(forum_id)).await.unwrap();
        let second = backend.send(endpoints::toggle_like(forum_id)).await.unwrap();

        assert_eq!(first.body["message"], "Forum liked successfully");
        assert_eq!(second.body["message"], "Forum unliked successfully");
        assert_eq!(backend.forum(forum_id).unwrap().likes_count, 0);
        assert_eq!(backend.request_count(Method::Post, "/likes/toggle"), 2);
    }

    #[tokio::test]
    async fn authorship_and_authentication_are_enforced() {
        let backend = backend_as(BOB);
        let forum_id = backend.seed_forum(ALICE, "Alice's post", &[]);

        let delete = backend.send(endpoints::delete_forum(forum_id)).await.unwrap();
        assert_eq!(delete.status, 403);
        assert!(backend.forum(forum_id).is_some());

        backend.identity().set(None);
        let mine = backend
            .send(endpoints::list_forums(ListKind::Mine, &ListQuery::default()))
            .await
            .unwrap();
        assert_eq!(mine.status, 401);
    }

    #[tokio::test]
    async fn scripted_failure_leaves_state_untouched() {
        let backend = backend_as(ALICE);
        let forum_id = backend.seed_forum(BOB, "Gerbil wheel", &[]);
        backend.fail_next(Failure::Offline);

        let result = backend.send(endpoints::toggle_like(forum_id)).await;

        assert!(matches!(result, Err(TransportError::Connection(_))));
        assert!(!backend.is_liked(forum_id, ALICE));
    }

    #[tokio::test]
    async fn nested_shape_moves_totals_under_page() {
        let backend = backend_as(ALICE);
        backend.seed_forum(ALICE, "Fish tank", &[]);
        backend.set_page_shape(PageShape::Nested);

        let response = backend
            .send(endpoints::list_forums(ListKind::All, &ListQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.body["page"]["totalElements"], 1);
        assert!(response.body.get("totalElements").is_none());
    }
}
