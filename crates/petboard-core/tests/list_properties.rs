//! Property tests for list pagination.
//!
//! These tests verify:
//! - `total_pages` is never below 1 and equals 1 whenever one page suffices
//! - Filter and sort changes always return to page 0
//! - Out-of-order responses never overwrite a newer target
//! - Deletions keep the displayed page in range

use petboard_core::{
    Completion, ForumDelta, ListView,
    proto::{ForumPost, ListKind, Page, SortBy, SortDir},
};
use proptest::prelude::*;

fn post(forum_id: u64) -> ForumPost {
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
        likes_count: 0,
        comments_count: 0,
    }
}

/// Server page `number` over `total` posts with IDs `1..=total`.
fn server_page(number: u32, size: u32, total: u64, server_total_pages: u32) -> Page<ForumPost> {
    let start = u64::from(number) * u64::from(size);
    let end = (start + u64::from(size)).min(total);
    let content = (start..end).map(|i| post(i + 1)).collect();
    Page { content, number, size, total_elements: total, total_pages: server_total_pages }
}

fn sort_strategy() -> impl Strategy<Value = (SortBy, SortDir)> {
    (
        prop_oneof![Just(SortBy::CreatedAt), Just(SortBy::LikesCount), Just(SortBy::CommentsCount)],
        prop_oneof![Just(SortDir::Asc), Just(SortDir::Desc)],
    )
}

proptest! {
    #[test]
    fn prop_total_pages_at_least_one(
        size in 1u32..20,
        total in 0u64..200,
        server_total_pages in 0u32..30,
    ) {
        let mut view = ListView::new(ListKind::All, size);
        let ticket = view.refresh();
        view.complete(&ticket, Ok(server_page(0, size, total, server_total_pages)));

        prop_assert!(view.total_pages() >= 1);
        if total <= u64::from(size) {
            prop_assert_eq!(view.total_pages(), 1);
        }
    }

    #[test]
    fn prop_filter_changes_reset_page(
        total in 30u64..100,
        page in 1u32..3,
        sort in sort_strategy(),
        term in "[a-z]{0,8}",
    ) {
        let mut view = ListView::new(ListKind::All, 10);
        let ticket = view.refresh();
        view.complete(&ticket, Ok(server_page(0, 10, total, 0)));

        let ticket = view.set_page(page).unwrap();
        view.complete(&ticket, Ok(server_page(page, 10, total, 0)));
        prop_assert_eq!(view.page(), page);

        view.set_sort(sort.0, sort.1);
        prop_assert_eq!(view.page(), 0);

        view.set_page(page).unwrap();
        view.set_search_term(&term);
        prop_assert_eq!(view.page(), 0);
    }

    #[test]
    fn prop_only_latest_target_is_applied(pages in prop::collection::vec(0u32..5, 1..8)) {
        let total = 50;
        let mut view = ListView::new(ListKind::All, 10);
        let first = view.refresh();
        view.complete(&first, Ok(server_page(0, 10, total, 5)));

        let tickets: Vec<_> = pages.iter().filter_map(|p| view.set_page(*p)).collect();
        let Some(latest) = tickets.last().cloned() else {
            return Ok(());
        };

        // Deliver in reverse so the newest response lands first.
        for ticket in tickets.iter().rev() {
            let result = Ok(server_page(ticket.query.page, 10, total, 5));
            let outcome = view.complete(ticket, result);
            if ticket.query == latest.query {
                prop_assert_ne!(outcome, Completion::Stale);
            }
        }

        prop_assert_eq!(view.page(), latest.query.page);
        let first_id = u64::from(latest.query.page) * 10 + 1;
        prop_assert_eq!(view.content()[0].forum_id, first_id);
    }

    #[test]
    fn prop_deletions_keep_page_in_range(
        total in 1u64..40,
        deletions in prop::collection::vec(1u64..40, 0..40),
    ) {
        let size = 5;
        let last_page = (total.div_ceil(5) - 1) as u32;
        let mut view = ListView::new(ListKind::Mine, size);
        let ticket = view.refresh();
        view.complete(&ticket, Ok(server_page(0, size, total, 0)));
        if let Some(ticket) = view.set_page(last_page) {
            view.complete(&ticket, Ok(server_page(last_page, size, total, 0)));
        }

        for id in deletions {
            view.apply_external_mutation(id, &ForumDelta::Deleted);
            prop_assert!(view.total_pages() >= 1);
            prop_assert!(view.page() < view.total_pages());
        }
    }
}
