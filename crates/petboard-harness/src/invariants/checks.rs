//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use super::{Invariant, InvariantKind, InvariantResult, SystemSnapshot, Violation};

/// Page totals are well formed.
///
/// Every list and the detail view's comments report at least one page, and
/// exactly one when all elements fit on the first page. An empty result is
/// still one (empty) page.
pub struct ListPagination;

impl Invariant for ListPagination {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ListPagination
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for list in &state.lists {
            if list.total_pages == 0 {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("{}: total_pages is 0", list.kind),
                });
            }
            if list.total_elements <= u64::from(list.size) && list.total_pages != 1 {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "{}: {} elements fit one page of {} but total_pages is {}",
                        list.kind, list.total_elements, list.size, list.total_pages
                    ),
                });
            }
        }
        if let Some(detail) = &state.detail
            && detail.total_comment_pages == 0
        {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("forum {}: total_comment_pages is 0", detail.forum_id),
            });
        }
        Ok(())
    }
}

/// A list that is not loading shows a page that exists.
///
/// Holds once loads have landed: a deletion that empties the last page, or a
/// reload that comes back shorter, moves the list back a page.
pub struct PageInRange;

impl Invariant for PageInRange {
    fn kind(&self) -> InvariantKind {
        InvariantKind::PageInRange
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for list in state.lists.iter().filter(|l| !l.loading) {
            if list.page > 0 && list.page >= list.total_pages {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("{}: page {} of {}", list.kind, list.page, list.total_pages),
                });
            }
        }
        Ok(())
    }
}

/// Every view shows the cache's counts.
///
/// A post displayed by a list or the detail view must be cached, and its
/// like and comment counts must equal the cached ones. This is what makes a
/// like in the detail view show up in every list without a refetch.
pub struct ViewsAgreeWithCache;

impl Invariant for ViewsAgreeWithCache {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ViewsAgreeWithCache
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let in_lists = state.lists.iter().flat_map(|list| {
            list.posts.iter().map(move |(id, counts)| (list.kind.as_str(), *id, *counts))
        });
        let in_detail =
            state.detail.iter().filter_map(|d| d.counts.map(|c| ("detail", d.forum_id, c)));

        for (view, forum_id, counts) in in_lists.chain(in_detail) {
            match state.cache.get(&forum_id) {
                None => {
                    return Err(Violation {
                        invariant: self.kind(),
                        message: format!("{view}: shows forum {forum_id} which is not cached"),
                    });
                },
                Some(cached) if *cached != counts => {
                    return Err(Violation {
                        invariant: self.kind(),
                        message: format!(
                            "{view}: forum {forum_id} shows {counts:?}, cache has {cached:?}"
                        ),
                    });
                },
                Some(_) => {},
            }
        }
        Ok(())
    }
}

/// Nothing is left half-done once the runtime is idle.
///
/// No request in flight, no list or detail fetch pending, and no like toggle
/// stuck in processing.
pub struct Quiescent;

impl Invariant for Quiescent {
    fn kind(&self) -> InvariantKind {
        InvariantKind::Quiescent
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let fail = |message: String| Err(Violation { invariant: self.kind(), message });

        if state.in_flight > 0 {
            return fail(format!("{} requests still in flight", state.in_flight));
        }
        if let Some(list) = state.lists.iter().find(|l| l.loading) {
            return fail(format!("{}: still loading", list.kind));
        }
        if let Some(detail) = &state.detail {
            if detail.loading {
                return fail(format!("forum {}: detail still loading", detail.forum_id));
            }
            if detail.like_processing {
                return fail(format!("forum {}: like toggle never completed", detail.forum_id));
            }
        }
        Ok(())
    }
}

/// The cache converged on the server.
///
/// Once nothing is in flight, every cached post exists on the server with the
/// same like and comment counts. Skipped when the snapshot carries no
/// backend state.
pub struct CacheAgreesWithBackend;

impl Invariant for CacheAgreesWithBackend {
    fn kind(&self) -> InvariantKind {
        InvariantKind::CacheAgreesWithBackend
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(backend) = &state.backend else {
            return Ok(());
        };
        for (forum_id, cached) in &state.cache {
            match backend.get(forum_id) {
                None => {
                    return Err(Violation {
                        invariant: self.kind(),
                        message: format!("forum {forum_id} is cached but gone from the server"),
                    });
                },
                Some(server) if server != cached => {
                    return Err(Violation {
                        invariant: self.kind(),
                        message: format!(
                            "forum {forum_id}: cache has {cached:?}, server has {server:?}"
                        ),
                    });
                },
                Some(_) => {},
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::invariants::{Counts, DetailSnapshot, ListSnapshot};

    fn list(page: u32, total_pages: u32, total_elements: u64) -> ListSnapshot {
        ListSnapshot {
            kind: "all".into(),
            page,
            size: 10,
            total_pages,
            total_elements,
            loading: false,
            posts: Vec::new(),
        }
    }

    fn counts(likes: u64, comments: u64) -> Counts {
        Counts { likes, comments }
    }

    #[test]
    fn empty_list_is_one_page() {
        let ok = SystemSnapshot::empty().with_list(list(0, 1, 0));
        assert!(ListPagination.check(&ok).is_ok());

        let zero = SystemSnapshot::empty().with_list(list(0, 0, 0));
        assert!(ListPagination.check(&zero).is_err());

        let padded = SystemSnapshot::empty().with_list(list(0, 2, 10));
        assert!(ListPagination.check(&padded).is_err());
    }

    #[test]
    fn page_past_the_end_is_flagged_unless_loading() {
        let stuck = SystemSnapshot::empty().with_list(list(3, 2, 15));
        assert!(PageInRange.check(&stuck).is_err());

        let mut reloading = list(3, 2, 15);
        reloading.loading = true;
        assert!(PageInRange.check(&SystemSnapshot::empty().with_list(reloading)).is_ok());
    }

    #[test]
    fn diverging_counts_are_flagged() {
        let mut shown = list(0, 1, 1);
        shown.posts.push((4, counts(2, 0)));

        let agreeing =
            SystemSnapshot::empty().with_list(shown.clone()).with_cached(4, counts(2, 0));
        assert!(ViewsAgreeWithCache.check(&agreeing).is_ok());

        let stale = SystemSnapshot::empty().with_list(shown.clone()).with_cached(4, counts(3, 0));
        let violation = ViewsAgreeWithCache.check(&stale).unwrap_err();
        assert!(violation.message.contains("forum 4"));

        let uncached = SystemSnapshot::empty().with_list(shown);
        assert!(ViewsAgreeWithCache.check(&uncached).is_err());
    }

    #[test]
    fn stuck_like_toggle_is_not_quiescent() {
        let mut snapshot = SystemSnapshot::empty();
        snapshot.detail = Some(DetailSnapshot {
            forum_id: 1,
            counts: Some(counts(0, 0)),
            loading: false,
            like_processing: true,
            comment_page: 0,
            total_comment_pages: 1,
        });
        assert!(Quiescent.check(&snapshot).is_err());
    }

    #[test]
    fn cache_must_match_server() {
        let snapshot = SystemSnapshot::empty().with_cached(1, counts(1, 2));
        assert!(CacheAgreesWithBackend.check(&snapshot).is_ok());

        let mut diverged = snapshot.clone();
        diverged.backend = Some(BTreeMap::from([(1, counts(2, 2))]));
        assert!(CacheAgreesWithBackend.check(&diverged).is_err());

        let mut deleted = snapshot;
        deleted.backend = Some(BTreeMap::new());
        assert!(CacheAgreesWithBackend.check(&deleted).is_err());
    }
}
