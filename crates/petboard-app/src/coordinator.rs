//! Mutation coordinator.
//!
//! Completions enter the app here. Every successful mutation is applied once
//! to the [`petboard_core::EntityCache`] as a relative [`CountChange`]; what
//! the views receive is the resulting absolute [`ForumDelta`], so a post that
//! sits in several lists and the detail view shows the same counts
//! everywhere without a refetch.
//!
//! Reads go through [`petboard_core::EntityCache::merge_fetched`], which
//! keeps a local write over a read that was issued before it.

use petboard_core::{Completion, CountChange, ForumDelta, ForumError, ListTicket, Revision};
use petboard_proto::{Comment, CommentId, ForumId, ForumPost, ListKind, Page};

use crate::{AppAction, AppEvent, ForumApp};

impl ForumApp {
    /// Process a completion and return follow-up actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        let read = event.read_revision();
        let actions = self.apply_event(event);
        if let Some(since) = read {
            self.cache.end_read(since);
        }
        actions
    }

    fn apply_event(&mut self, event: AppEvent) -> Vec<AppAction> {
        let mut actions = match event {
            AppEvent::ListLoaded { ticket, revision, result } => {
                self.on_list_loaded(&ticket, revision, result)
            },
            AppEvent::ForumLoaded { token, revision, result } => {
                if !self.detail.is_current(token) {
                    tracing::debug!("dropping stale forum fetch");
                    return Vec::new();
                }
                let result = result.and_then(|post| {
                    self.cache.merge_fetched(post, revision).ok_or_else(|| {
                        ForumError::StateConflict("this forum post has been deleted".into())
                    })
                });
                let counts =
                    result.as_ref().ok().map(|post| (post.forum_id, ForumDelta::counts_of(post)));
                if self.detail.complete_forum(token, result).is_applied()
                    && let Some((forum_id, delta)) = counts
                {
                    self.broadcast_lists(forum_id, &delta, None)
                } else {
                    Vec::new()
                }
            },
            AppEvent::CommentsLoaded { token, ticket, result } => {
                if let Some(request) = self.detail.refetch_superseded(token, ticket) {
                    return vec![self.detail_call(request)];
                }
                if let Ok(loaded) = &result
                    && self.detail.accepts_comments(token, ticket)
                {
                    self.cache.upsert_comments(loaded.content.iter().cloned());
                }
                self.detail.complete_comments(token, ticket, result);
                Vec::new()
            },
            AppEvent::LikeStatusLoaded { token, result } => {
                self.detail.complete_like_status(token, result);
                Vec::new()
            },
            AppEvent::LikeToggled { token, forum_id, result } => match result {
                Ok(outcome) => {
                    let change =
                        if outcome.is_liked() { CountChange::Liked } else { CountChange::Unliked };
                    let actions = self.apply_count_change(forum_id, change);
                    self.detail.complete_toggle_like(token, Ok(outcome));
                    self.sync_detail(forum_id);
                    actions
                },
                Err(err) => {
                    self.detail.complete_toggle_like(token, Err(err.clone()));
                    self.report(&err)
                },
            },
            AppEvent::CommentCreated { token, forum_id, result } => match result {
                Ok(comment) => {
                    self.cache.upsert_comment(comment.clone());
                    let actions = self.apply_count_change(forum_id, CountChange::CommentAdded);
                    self.detail.complete_add_comment(token, Ok(comment));
                    self.sync_detail(forum_id);
                    actions
                },
                Err(err) => {
                    self.detail.complete_add_comment(token, Err(err.clone()));
                    self.report(&err)
                },
            },
            AppEvent::CommentUpdated { token, forum_id, result } => {
                if let Ok(comment) = &result {
                    tracing::debug!(forum_id, comment_id = comment.comment_id, "comment edited");
                    self.cache.upsert_comment(comment.clone());
                }
                let failure = result.as_ref().err().cloned();
                self.detail.complete_update_comment(token, result);
                failure.map(|err| self.report(&err)).unwrap_or_default()
            },
            AppEvent::CommentDeleted { token, forum_id, comment_id, result } => match result {
                Ok(()) => {
                    let removed = self.removed_thread_len(comment_id);
                    self.cache.remove_thread(comment_id);
                    let change = CountChange::CommentsRemoved(removed);
                    let actions = self.apply_count_change(forum_id, change);
                    self.detail.complete_delete_comment(token, comment_id, Ok(()));
                    self.sync_detail(forum_id);
                    actions
                },
                Err(err) => {
                    self.detail.complete_delete_comment(token, comment_id, Err(err.clone()));
                    self.report(&err)
                },
            },
            AppEvent::ForumCreated { result } => match result {
                Ok(post) => self.on_forum_created(post),
                Err(err) => self.report(&err),
            },
            AppEvent::ForumUpdated { forum_id, result } => match result {
                Ok(post) => {
                    self.cache.record_edit(post.clone());
                    self.status_message = Some("Forum post updated.".to_string());
                    self.broadcast(forum_id, &ForumDelta::Replaced(post))
                },
                Err(err) => self.report(&err),
            },
            AppEvent::ForumDeleted { forum_id, result } => match result {
                Ok(()) => {
                    self.cache.remove(forum_id);
                    self.status_message = Some("Forum post deleted.".to_string());
                    self.broadcast(forum_id, &ForumDelta::Deleted)
                },
                Err(err) => self.report(&err),
            },
        };
        actions.push(AppAction::Render);
        actions
    }

    fn on_list_loaded(
        &mut self,
        ticket: &ListTicket,
        revision: Revision,
        result: Result<Page<ForumPost>, ForumError>,
    ) -> Vec<AppAction> {
        if ticket.kind == ListKind::Mine && self.viewer.is_none() {
            tracing::debug!("dropping personal list page after sign-out");
            return Vec::new();
        }
        if !self.list_mut(ticket.kind).is_current(ticket) {
            tracing::debug!(
                kind = %ticket.kind,
                page = ticket.query.page,
                "dropping stale list page"
            );
            return Vec::new();
        }

        let mut actions = Vec::new();
        let result = result.map(|page| {
            let (page, reconcile) = self.merge_page(page, revision);
            for (forum_id, delta) in reconcile {
                actions.extend(self.broadcast_lists(forum_id, &delta, Some(ticket.kind)));
                if self.detail.forum_id() == Some(forum_id) {
                    self.detail.apply_external_mutation(forum_id, &delta);
                }
            }
            page
        });

        let view = self.list_mut(ticket.kind);
        let completion = view.complete(ticket, result);
        let error = view.error().map(str::to_string);
        // Other writers can shrink the result set under the current page.
        let step_back = (completion == Completion::Applied
            && view.page() > 0
            && view.page() >= view.total_pages())
        .then(|| view.set_page(view.total_pages() - 1))
        .flatten();

        if completion == Completion::Failed {
            self.status_message = error;
        }
        if let Some(ticket) = step_back {
            tracing::debug!(
                kind = %ticket.kind,
                page = ticket.query.page,
                "page out of range, stepping back"
            );
            actions.push(self.list_call(ticket));
        }
        actions
    }

    /// Merge a fetched page into the cache.
    ///
    /// Posts deleted locally are dropped from the page. Returns the page to
    /// display and the counts other views should converge on.
    fn merge_page(
        &mut self,
        page: Page<ForumPost>,
        since: Revision,
    ) -> (Page<ForumPost>, Vec<(ForumId, ForumDelta)>) {
        let fetched = page.content.len();
        let mut content = Vec::with_capacity(fetched);
        for post in page.content {
            if let Some(merged) = self.cache.merge_fetched(post, since) {
                content.push(merged);
            }
        }
        let dropped = (fetched - content.len()) as u64;
        let reconcile = content.iter().map(|p| (p.forum_id, ForumDelta::counts_of(p))).collect();
        let page = Page {
            content,
            total_elements: page.total_elements.saturating_sub(dropped),
            number: page.number,
            size: page.size,
            total_pages: page.total_pages,
        };
        (page, reconcile)
    }

    fn on_forum_created(&mut self, post: ForumPost) -> Vec<AppAction> {
        tracing::debug!(forum_id = post.forum_id, "forum created");
        self.cache.upsert(post);
        self.status_message = Some("Forum post created.".to_string());

        let mut tickets = Vec::new();
        for kind in [ListKind::All, ListKind::Mine] {
            let view = self.list_mut(kind);
            if view.is_loaded() || view.is_loading() {
                tickets.push(view.refresh());
            }
        }
        tickets.into_iter().map(|t| self.list_call(t)).collect()
    }

    /// Apply a relative change to the cache and push the absolute counts to
    /// every list.
    fn apply_count_change(&mut self, forum_id: ForumId, change: CountChange) -> Vec<AppAction> {
        self.seed_cache(forum_id);
        match self.cache.apply_change(forum_id, change) {
            Some(delta) => self.broadcast_lists(forum_id, &delta, None),
            None => {
                tracing::debug!(forum_id, ?change, "count change for post no view holds");
                Vec::new()
            },
        }
    }

    /// Make sure the cache holds `forum_id` before a relative change lands,
    /// copying it from whichever view has it.
    fn seed_cache(&mut self, forum_id: ForumId) {
        if self.cache.contains(forum_id) || self.cache.is_deleted(forum_id) {
            return;
        }
        if let Some(post) = self.known_post(forum_id).cloned() {
            self.cache.upsert(post);
        }
    }

    /// Overwrite the detail view's counts with the cache's.
    fn sync_detail(&mut self, forum_id: ForumId) {
        if let Some(post) = self.cache.get(forum_id) {
            let delta = ForumDelta::counts_of(post);
            self.detail.apply_external_mutation(forum_id, &delta);
        }
    }

    /// Number of comments a deletion of `comment_id` removes.
    ///
    /// The cache sees every reply this client created, including ones whose
    /// parent was off screen, so it is asked first.
    fn removed_thread_len(&self, comment_id: CommentId) -> u64 {
        self.cache
            .thread_len(comment_id)
            .or_else(|| self.detail.find_comment(comment_id).map(Comment::thread_len))
            .unwrap_or(1)
    }

    /// Push `delta` to every list and the detail view.
    fn broadcast(&mut self, forum_id: ForumId, delta: &ForumDelta) -> Vec<AppAction> {
        let actions = self.broadcast_lists(forum_id, delta, None);
        self.detail.apply_external_mutation(forum_id, delta);
        actions
    }

    /// Push `delta` to every list except `except`. Returns reloads for lists
    /// that stepped back a page.
    fn broadcast_lists(
        &mut self,
        forum_id: ForumId,
        delta: &ForumDelta,
        except: Option<ListKind>,
    ) -> Vec<AppAction> {
        let tickets: Vec<_> = self
            .lists
            .values_mut()
            .filter(|view| Some(view.kind()) != except)
            .filter_map(|view| view.apply_external_mutation(forum_id, delta))
            .collect();
        tickets.into_iter().map(|ticket| self.list_call(ticket)).collect()
    }

    fn report(&mut self, err: &ForumError) -> Vec<AppAction> {
        tracing::warn!(error = %err, "request failed");
        self.status_message = Some(err.user_message());
        Vec::new()
    }
}
