//! Petboard wire protocol
//!
//! Types exchanged with the petboard REST backend: forum entities, response
//! envelopes, paginated results, list query parameters and request
//! descriptors. Nothing in this crate performs I/O; a request is described by
//! an [`ApiRequest`] and executed by whatever transport the caller provides.
//!
//! # Components
//!
//! - [`ForumPost`], [`Comment`]: entities as the backend serializes them
//! - [`Envelope`], [`Page`], [`normalize_page`]: response shapes
//! - [`ListQuery`]: pagination/sort/filter value object
//! - [`endpoints`]: builders for every consumed endpoint

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod entity;
mod envelope;
mod error;
mod payloads;
mod query;
mod request;

pub mod endpoints;

pub use entity::{Comment, CommentId, ForumId, ForumPost, UserId};
pub use envelope::{Envelope, Page, error_message, normalize_page, total_pages_for};
pub use error::ProtocolError;
pub use payloads::{
    CreateComment, CreateForum, LikeOutcome, UpdateComment, UpdateForum, like_status,
};
pub use query::{DEFAULT_PAGE_SIZE, Filter, ListKind, ListQuery, SortBy, SortDir, parse_tags};
pub use request::{ApiRequest, Method};
