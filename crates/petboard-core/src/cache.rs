//! Canonical entity store.
//!
//! The same post can sit in several list pages and the detail view at once.
//! The cache holds the one record those copies are reconciled against. It is
//! written only by completion handlers, never by view code.
//!
//! # Revisions
//!
//! Every local write (count change, edit, deletion) bumps the cache
//! [`Revision`] and stamps the post it touched. Reads remember the revision
//! they were issued at, and [`EntityCache::merge_fetched`] refuses to let a
//! read overwrite a post that was written after the read left.
//!
//! Reads are registered with [`EntityCache::begin_read`] and retired with
//! [`EntityCache::end_read`]. Write and deletion stamps are kept only while
//! some read in flight is older than them, so the bookkeeping stays
//! proportional to the reads outstanding rather than to the session.

use std::collections::{BTreeMap, HashMap};

use petboard_proto::{Comment, CommentId, ForumId, ForumPost};

use crate::{CountChange, ForumDelta};

/// Monotonic counter of local writes.
pub type Revision = u64;

/// Forum posts and comments keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    posts: HashMap<ForumId, ForumPost>,
    comments: HashMap<CommentId, Comment>,
    revision: Revision,
    /// Revision of the last local write per post.
    written: HashMap<ForumId, Revision>,
    /// Posts deleted through this cache, with the deletion's revision.
    deleted: HashMap<ForumId, Revision>,
    /// Reads in flight, counted by the revision they were issued at.
    reads: BTreeMap<Revision, usize>,
}

impl EntityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a post with server data.
    pub fn upsert(&mut self, post: ForumPost) {
        self.deleted.remove(&post.forum_id);
        self.posts.insert(post.forum_id, post);
    }

    /// Insert or replace several posts.
    pub fn upsert_many(&mut self, posts: impl IntoIterator<Item = ForumPost>) {
        for post in posts {
            self.upsert(post);
        }
    }

    /// Merge a post returned by a read issued at revision `since`.
    ///
    /// Returns the record views should display: the fetched post, or the
    /// cached one if a local write landed after the read was issued. Returns
    /// `None` for posts deleted through this cache.
    pub fn merge_fetched(&mut self, post: ForumPost, since: Revision) -> Option<ForumPost> {
        let forum_id = post.forum_id;
        if self.deleted.contains_key(&forum_id) {
            tracing::debug!(forum_id, "ignoring fetched copy of deleted post");
            return None;
        }
        let written_after = self.written.get(&forum_id).is_some_and(|rev| *rev > since);
        if written_after && let Some(cached) = self.posts.get(&forum_id) {
            tracing::debug!(forum_id, since, "keeping newer local write over fetched post");
            return Some(cached.clone());
        }
        self.posts.insert(forum_id, post.clone());
        Some(post)
    }

    /// Replace a post with the server's record of a local edit.
    pub fn record_edit(&mut self, post: ForumPost) {
        self.touch(post.forum_id);
        self.upsert(post);
    }

    /// Remove a deleted post and every cached comment that belongs to it.
    pub fn remove(&mut self, forum_id: ForumId) -> Option<ForumPost> {
        self.touch(forum_id);
        self.deleted.insert(forum_id, self.revision);
        self.comments.retain(|_, c| c.forum_id != forum_id);
        self.posts.remove(&forum_id)
    }

    /// Cached post by ID.
    pub fn get(&self, forum_id: ForumId) -> Option<&ForumPost> {
        self.posts.get(&forum_id)
    }

    /// Whether a post is cached.
    pub fn contains(&self, forum_id: ForumId) -> bool {
        self.posts.contains_key(&forum_id)
    }

    /// Whether a post was deleted through this cache.
    pub fn is_deleted(&self, forum_id: ForumId) -> bool {
        self.deleted.contains_key(&forum_id)
    }

    /// Apply a relative counter change.
    ///
    /// Returns the absolute counts to broadcast, or `None` if the post is not
    /// cached.
    pub fn apply_change(&mut self, forum_id: ForumId, change: CountChange) -> Option<ForumDelta> {
        self.touch(forum_id);
        let post = self.posts.get_mut(&forum_id)?;
        change.apply(post);
        Some(ForumDelta::counts_of(post))
    }

    /// Insert or replace a comment.
    ///
    /// Replies are indexed individually and linked to their parent through
    /// `parent_id`, so a reply created later still counts towards the thread.
    pub fn upsert_comment(&mut self, mut comment: Comment) {
        for reply in std::mem::take(&mut comment.replies) {
            self.upsert_comment(reply);
        }
        self.comments.insert(comment.comment_id, comment);
    }

    /// Insert or replace several comments.
    pub fn upsert_comments(&mut self, comments: impl IntoIterator<Item = Comment>) {
        for comment in comments {
            self.upsert_comment(comment);
        }
    }

    /// Remove a comment and every cached reply under it. Returns how many
    /// comments were removed.
    pub fn remove_thread(&mut self, comment_id: CommentId) -> u64 {
        let ids = self.thread_ids(comment_id);
        for id in &ids {
            self.comments.remove(id);
        }
        ids.len() as u64
    }

    /// Size of the cached thread rooted at `comment_id`. `None` if the
    /// comment is not cached.
    pub fn thread_len(&self, comment_id: CommentId) -> Option<u64> {
        self.comments
            .contains_key(&comment_id)
            .then(|| self.thread_ids(comment_id).len() as u64)
    }

    /// Drop every cached comment that does not belong to `forum_id`.
    pub fn retain_comments_of(&mut self, forum_id: ForumId) {
        self.comments.retain(|_, c| c.forum_id == forum_id);
    }

    /// Number of cached comments.
    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Cached comment by ID.
    pub fn comment(&self, comment_id: CommentId) -> Option<&Comment> {
        self.comments.get(&comment_id)
    }

    /// Whether `comment_id` is a cached comment of `forum_id`.
    pub fn has_comment_on(&self, forum_id: ForumId, comment_id: CommentId) -> bool {
        self.comments.get(&comment_id).is_some_and(|c| c.forum_id == forum_id)
    }

    /// All cached posts, in no particular order.
    pub fn posts(&self) -> impl Iterator<Item = &ForumPost> {
        self.posts.values()
    }

    /// Number of cached posts.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Whether no posts are cached.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Current revision. Stamp reads with it when they are issued.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Register a read issued now and return the revision to stamp it with.
    pub fn begin_read(&mut self) -> Revision {
        *self.reads.entry(self.revision).or_default() += 1;
        self.revision
    }

    /// Retire a read issued at `since`, after its result has been merged.
    ///
    /// Forgets write and deletion stamps that no read still in flight can
    /// predate.
    pub fn end_read(&mut self, since: Revision) {
        if let Some(count) = self.reads.get_mut(&since) {
            *count -= 1;
            if *count == 0 {
                self.reads.remove(&since);
            }
        }
        let floor = self.reads.keys().next().copied().unwrap_or(self.revision);
        self.written.retain(|_, rev| *rev > floor);
        self.deleted.retain(|_, rev| *rev > floor);
    }

    /// Number of posts with a write or deletion stamp still tracked.
    pub fn tracked_writes(&self) -> usize {
        self.written.len()
    }

    fn thread_ids(&self, root: CommentId) -> Vec<CommentId> {
        if !self.comments.contains_key(&root) {
            return Vec::new();
        }
        let mut ids = vec![root];
        let mut next = 0;
        while let Some(&parent) = ids.get(next) {
            ids.extend(
                self.comments
                    .values()
                    .filter(|c| c.parent_id == Some(parent))
                    .map(|c| c.comment_id),
            );
            next += 1;
        }
        ids
    }

    fn touch(&mut self, forum_id: ForumId) {
        self.revision += 1;
        self.written.insert(forum_id, self.revision);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn post(forum_id: ForumId, likes_count: u64, comments_count: u64) -> ForumPost {
        ForumPost {
            forum_id,
            title: format!("post {forum_id}"),
            content: String::new(),
            tags: Vec::new(),
            author_first_name: String::new(),
            author_last_name: String::new(),
            author_email: String::new(),
            author_user_id: 1,
            created_at: None,
            updated_at: None,
            likes_count,
            comments_count,
        }
    }

    fn comment(comment_id: CommentId, forum_id: ForumId) -> Comment {
        Comment {
            comment_id,
            forum_id,
            author_user_id: 1,
            text: String::new(),
            created_at: None,
            parent_id: None,
            replies: Vec::new(),
            liked_by: BTreeSet::new(),
        }
    }

    #[test]
    fn counter_changes_saturate() {
        let mut cache = EntityCache::new();
        cache.upsert(post(1, 0, 1));

        assert_eq!(
            cache.apply_change(1, CountChange::Unliked),
            Some(ForumDelta::Counts { likes_count: 0, comments_count: 1 })
        );
        cache.apply_change(1, CountChange::CommentsRemoved(1));
        let delta = cache.apply_change(1, CountChange::CommentsRemoved(1));
        assert_eq!(delta, Some(ForumDelta::Counts { likes_count: 0, comments_count: 0 }));
    }

    #[test]
    fn change_on_unknown_post_is_none() {
        let mut cache = EntityCache::new();
        assert_eq!(cache.apply_change(9, CountChange::Liked), None);
    }

    #[test]
    fn removing_a_post_drops_its_comments() {
        let mut cache = EntityCache::new();
        cache.upsert_many([post(1, 0, 0), post(2, 0, 0)]);
        cache.upsert_comments([comment(10, 1), comment(11, 2)]);

        assert!(cache.remove(1).is_some());
        assert!(!cache.contains(1));
        assert!(cache.comment(10).is_none());
        assert!(cache.has_comment_on(2, 11));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn replies_are_indexed() {
        let mut cache = EntityCache::new();
        let mut parent = comment(10, 1);
        let mut reply = comment(11, 1);
        reply.parent_id = Some(10);
        parent.replies.push(reply);
        cache.upsert_comment(parent);

        assert!(cache.has_comment_on(1, 11));
        assert!(!cache.has_comment_on(2, 11));
        assert!(cache.comment(10).unwrap().replies.is_empty());
    }

    #[test]
    fn threads_follow_parent_links() {
        let mut cache = EntityCache::new();
        let mut parent = comment(10, 1);
        let mut reply = comment(11, 1);
        reply.parent_id = Some(10);
        parent.replies.push(reply);
        cache.upsert_comment(parent);

        // A reply-to-reply created after the page was fetched.
        let mut late = comment(12, 1);
        late.parent_id = Some(11);
        cache.upsert_comment(late);
        cache.upsert_comment(comment(13, 1));

        assert_eq!(cache.thread_len(10), Some(3));
        assert_eq!(cache.thread_len(11), Some(2));
        assert_eq!(cache.thread_len(99), None);

        assert_eq!(cache.remove_thread(10), 3);
        assert!(cache.comment(12).is_none());
        assert!(cache.comment(13).is_some());
        assert_eq!(cache.remove_thread(10), 0);
    }

    #[test]
    fn reads_older_than_a_write_keep_the_write() {
        let mut cache = EntityCache::new();
        cache.upsert(post(1, 3, 0));
        let issued = cache.revision();

        cache.apply_change(1, CountChange::Liked);
        let merged = cache.merge_fetched(post(1, 3, 0), issued).unwrap();

        assert_eq!(merged.likes_count, 4);
        assert_eq!(cache.get(1).unwrap().likes_count, 4);
    }

    #[test]
    fn reads_issued_after_a_write_replace_it() {
        let mut cache = EntityCache::new();
        cache.upsert(post(1, 3, 0));
        cache.apply_change(1, CountChange::Liked);
        let issued = cache.revision();

        let merged = cache.merge_fetched(post(1, 7, 2), issued).unwrap();

        assert_eq!(merged.likes_count, 7);
        assert_eq!(cache.get(1).unwrap().comments_count, 2);
    }

    #[test]
    fn deleted_posts_are_not_resurrected() {
        let mut cache = EntityCache::new();
        cache.upsert(post(1, 0, 0));
        let issued = cache.revision();
        cache.remove(1);

        assert!(cache.merge_fetched(post(1, 0, 0), issued).is_none());
        assert!(cache.is_deleted(1));
        assert!(!cache.contains(1));
    }

    #[test]
    fn stamps_live_only_while_an_older_read_is_in_flight() {
        let mut cache = EntityCache::new();
        cache.upsert(post(1, 3, 0));
        cache.upsert(post(2, 0, 0));
        let first = cache.begin_read();
        cache.apply_change(1, CountChange::Liked);
        let second = cache.begin_read();
        cache.remove(2);

        // The second read predates the deletion but not the like.
        cache.end_read(first);
        assert_eq!(cache.tracked_writes(), 1);
        assert!(cache.is_deleted(2));
        assert_eq!(cache.merge_fetched(post(1, 9, 0), second).unwrap().likes_count, 9);
        assert!(cache.merge_fetched(post(2, 0, 0), second).is_none());

        cache.end_read(second);
        assert_eq!(cache.tracked_writes(), 0);
        assert!(!cache.is_deleted(2));
    }

    #[test]
    fn write_during_a_read_survives_until_the_read_retires() {
        let mut cache = EntityCache::new();
        cache.upsert(post(1, 3, 0));
        let issued = cache.begin_read();
        cache.apply_change(1, CountChange::Liked);

        // Retiring an unknown read prunes nothing the pending read needs.
        cache.end_read(issued + 10);
        assert_eq!(cache.merge_fetched(post(1, 3, 0), issued).unwrap().likes_count, 4);
        cache.end_read(issued);
        assert_eq!(cache.tracked_writes(), 0);
    }

    #[test]
    fn comments_of_other_posts_can_be_dropped() {
        let mut cache = EntityCache::new();
        cache.upsert_comments([comment(10, 1), comment(11, 1), comment(20, 2)]);

        cache.retain_comments_of(1);

        assert_eq!(cache.comment_count(), 2);
        assert!(cache.has_comment_on(1, 10));
        assert!(cache.comment(20).is_none());
    }
}
