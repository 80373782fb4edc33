//! Application layer for petboard
//!
//! The forum state machine, the mutation coordinator that keeps every view
//! consistent, and a generic async runtime that executes requests. The same
//! code runs against the HTTP backend and against the in-memory simulation.
//!
//! # Components
//!
//! - [`ForumApp`]: Owns the entity cache, the three list views and the detail
//!   view; user intents produce [`AppAction`]s, completions arrive as
//!   [`AppEvent`]s
//! - [`Bridge`]: Executes an [`ApiCall`] through the typed API and turns the
//!   result into an [`AppEvent`]
//! - [`Runtime`]: Keeps requests in flight concurrently and feeds their
//!   completions back into the app in arrival order

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod coordinator;
mod event;
mod runtime;

pub use action::{ApiCall, AppAction};
pub use app::ForumApp;
pub use bridge::Bridge;
pub use event::AppEvent;
pub use runtime::{Intent, Runtime};
