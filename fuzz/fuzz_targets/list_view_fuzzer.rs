//! Fuzz target for the list view state machine
//!
//! Ensure the last intent wins however responses interleave (HIGH priority)
//!
//! # Strategy
//!
//! - Intents: reload, page changes (in and out of range), sort and search
//! - Responses: any previously issued ticket, answered in any order, with
//!   arbitrary totals or a failure
//! - External deletions of posts on the current page
//!
//! # Invariants
//!
//! - Only a response for the current target is applied
//! - The displayed page count is never zero
//! - A successful response for the current target clears `loading`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use petboard_core::{Completion, ForumDelta, ForumError, ListTicket, ListView};
use petboard_proto::{ForumId, ForumPost, ListKind, Page, SortBy, SortDir};

#[derive(Debug, Clone, Arbitrary)]
enum ListOp {
    Refresh,
    SetPage(u8),
    SetSort { likes: bool, asc: bool },
    Search(SearchTerm),
    Respond { ticket: u8, response: Response },
    Delete { index: u8 },
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum SearchTerm {
    Empty,
    Dog,
    Cat,
}

#[derive(Debug, Clone, Arbitrary)]
enum Response {
    Page { items: u8, total_elements: u16, total_pages: u8 },
    Failure,
}

fuzz_target!(|ops: Vec<ListOp>| {
    let mut view = ListView::new(ListKind::All, 5);
    let mut issued: Vec<ListTicket> = Vec::new();
    let mut next_id: ForumId = 1;

    for op in ops {
        match op {
            ListOp::Refresh => issued.push(view.refresh()),
            ListOp::SetPage(page) => {
                let before = view.query().clone();
                match view.set_page(u32::from(page)) {
                    Some(ticket) => issued.push(ticket),
                    None => assert_eq!(view.query(), &before),
                }
            },
            ListOp::SetSort { likes, asc } => {
                let sort_by = if likes { SortBy::LikesCount } else { SortBy::CreatedAt };
                let sort_dir = if asc { SortDir::Asc } else { SortDir::Desc };
                let ticket = view.set_sort(sort_by, sort_dir);
                assert_eq!(ticket.query.page, 0);
                issued.push(ticket);
            },
            ListOp::Search(term) => {
                let term = match term {
                    SearchTerm::Empty => "",
                    SearchTerm::Dog => "dog",
                    SearchTerm::Cat => "cat",
                };
                let ticket = view.set_search_term(term);
                assert_eq!(ticket.query.page, 0);
                issued.push(ticket);
            },
            ListOp::Respond { ticket, response } => {
                if issued.is_empty() {
                    continue;
                }
                let ticket = issued.remove(usize::from(ticket) % issued.len());
                let current = view.is_current(&ticket);
                let result = match response {
                    Response::Page { items, total_elements, total_pages } => {
                        let content = (0..items % 8)
                            .map(|_| {
                                next_id += 1;
                                post(next_id)
                            })
                            .collect();
                        Ok(Page {
                            content,
                            number: ticket.query.page,
                            size: ticket.query.size,
                            total_elements: u64::from(total_elements),
                            total_pages: u32::from(total_pages),
                        })
                    },
                    Response::Failure => Err(ForumError::Transport("reset".into())),
                };
                let outcome = view.complete(&ticket, result);
                assert_eq!(outcome == Completion::Stale, !current);
                if outcome == Completion::Applied {
                    assert!(view.is_loaded());
                    assert!(view.error().is_none());
                }
            },
            ListOp::Delete { index } => {
                if view.content().is_empty() {
                    continue;
                }
                let forum_id = view.content()[usize::from(index) % view.content().len()].forum_id;
                if let Some(ticket) = view.apply_external_mutation(forum_id, &ForumDelta::Deleted) {
                    issued.push(ticket);
                }
                assert!(!view.contains(forum_id));
            },
        }

        assert!(view.total_pages() >= 1);
    }
});

fn post(forum_id: ForumId) -> ForumPost {
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
