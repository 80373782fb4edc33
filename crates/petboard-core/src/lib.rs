//! Forum state core
//!
//! Pure state machines for the client-side forum layer. Nothing here performs
//! I/O: every operation either returns a request descriptor for the caller to
//! execute, or consumes the result of one. This keeps every ordering question
//! (stale responses, single-flight likes, navigation during a request)
//! testable without a network.
//!
//! # Components
//!
//! - [`EntityCache`]: canonical posts and comments keyed by ID
//! - [`ListView`]: one paginated, sorted, filtered projection (all/mine/featured)
//! - [`DetailView`]: one focused post with its comment page and like state
//! - [`ForumDelta`], [`CountChange`]: how mutations propagate between views
//! - [`ForumError`]: error taxonomy shared by every layer

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod completion;
mod delta;
mod detail;
mod error;
mod identity;
mod list;
mod validate;

pub use cache::{EntityCache, Revision};
pub use completion::Completion;
pub use delta::{CountChange, ForumDelta};
pub use detail::{COMMENT_PAGE_SIZE, CommentTicket, DetailRequest, DetailView, ViewToken};
pub use error::ForumError;
pub use identity::{Identity, SharedIdentity, Viewer};
pub use list::{ListTicket, ListView};
pub use petboard_proto as proto;
pub use validate::{CommentDraft, ForumDraft, ValidationError};
