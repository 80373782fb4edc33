//! Property tests for the wire layer.
//!
//! These tests verify:
//! - The displayed page count is never below 1 and covers every element
//! - Tag input always parses to trimmed, non-empty tags
//! - Query parameters keep their canonical order and never mix filters
//! - Every supported page shape normalizes to the same content

use petboard_proto::{
    Filter, ListQuery, Page, SortBy, SortDir, normalize_page, parse_tags, total_pages_for,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn query_strategy() -> impl Strategy<Value = ListQuery> {
    (
        0u32..50,
        1u32..40,
        prop_oneof![Just(SortBy::CreatedAt), Just(SortBy::LikesCount), Just(SortBy::CommentsCount)],
        prop_oneof![Just(SortDir::Asc), Just(SortDir::Desc)],
        "[a-z &]{0,12}",
        "[a-z ,]{0,16}",
    )
        .prop_map(|(page, size, sort_by, sort_dir, search_term, tag_search_term)| ListQuery {
            page,
            size,
            sort_by,
            sort_dir,
            search_term,
            tag_search_term,
        })
}

/// The same page laid out the ways the backend is known to send it.
fn shaped(content: &[u32], total: u64, shape: u8) -> Value {
    match shape {
        0 => json!({ "content": content, "totalElements": total, "totalPages": 0 }),
        1 => json!({ "content": content, "page": { "totalElements": total } }),
        2 => json!({ "message": "ok", "data": { "content": content, "totalElements": total } }),
        _ => json!({ "data": { "data": { "content": content, "totalElements": total } } }),
    }
}

proptest! {
    #[test]
    fn prop_page_count_covers_every_element(
        total in 0u64..10_000,
        size in 0u32..60,
        server_total_pages in 0u32..400,
    ) {
        let pages = total_pages_for(total, size, server_total_pages);

        prop_assert!(pages >= 1);
        let size = u64::from(size.max(1));
        if total <= size {
            prop_assert_eq!(pages, 1);
        } else if server_total_pages == 0 {
            prop_assert!(u64::from(pages) * size >= total);
            prop_assert!(u64::from(pages - 1) * size < total);
        } else {
            prop_assert_eq!(pages, server_total_pages);
        }
    }

    #[test]
    fn prop_parsed_tags_are_clean_and_stable(input in "[a-z ,]{0,40}") {
        let tags = parse_tags(&input);

        for tag in &tags {
            prop_assert!(!tag.is_empty());
            prop_assert_eq!(tag.trim(), tag.as_str());
            prop_assert!(!tag.contains(','));
        }
        prop_assert_eq!(parse_tags(&tags.join(",")), tags);
    }

    #[test]
    fn prop_query_pairs_are_canonical(query in query_strategy()) {
        let pairs = query.query_pairs();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();

        prop_assert_eq!(&keys[..4], &["page", "size", "sortBy", "sortDir"][..]);
        prop_assert_eq!(&pairs[0].1, &query.page.to_string());
        let searches = keys.iter().filter(|k| **k == "searchTerm").count();
        let tags = keys.iter().filter(|k| **k == "tags").count();
        match query.filter() {
            Filter::None => prop_assert_eq!(pairs.len(), 4),
            Filter::Search(_) => prop_assert_eq!((searches, tags), (1, 0)),
            Filter::Tags(expected) => prop_assert_eq!((searches, tags), (0, expected.len())),
        }

        let encoded = query.to_query_string();
        prop_assert_eq!(encoded.split('&').count(), pairs.len());
        prop_assert!(encoded.chars().all(|c| c.is_ascii_alphanumeric() || "%=&".contains(c)));
    }

    #[test]
    fn prop_every_page_shape_normalizes_alike(
        content in prop::collection::vec(any::<u32>(), 0..12),
        extra in 0u64..100,
        shape in 0u8..4,
    ) {
        let total = content.len() as u64 + extra;
        let page: Page<u32> = normalize_page(shaped(&content, total, shape)).unwrap();

        prop_assert_eq!(page.total_elements, total);
        prop_assert_eq!(&page.content, &content);
        prop_assert!(page.total_pages_for(5) >= 1);
    }

    #[test]
    fn prop_bare_array_counts_its_items(content in prop::collection::vec(any::<u32>(), 0..12)) {
        let page: Page<u32> = normalize_page(json!(content)).unwrap();

        prop_assert_eq!(page.total_elements, content.len() as u64);
        prop_assert_eq!(page.content, content);
        prop_assert_eq!(page.total_pages, 0);
    }
}
