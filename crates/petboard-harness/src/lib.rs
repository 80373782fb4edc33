//! Deterministic simulation harness for petboard testing.
//!
//! An in-memory implementation of the forum backend behind the
//! [`petboard_client::Transport`] trait, so the real app and runtime can be
//! driven without a network, with scripted latency and failures.
//!
//! # Model-Based Testing
//!
//! The `model` module generates random operation sequences (user intents
//! interleaved with single request deliveries) and applies them to a
//! [`SimWorld`].
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] after every
//! completion and [`InvariantRegistry::settled()`] once nothing is in flight.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod sim_backend;

pub use invariants::{
    CacheAgreesWithBackend, Counts, DetailSnapshot, Invariant, InvariantKind, InvariantRegistry,
    InvariantResult, ListPagination, ListSnapshot, PageInRange, Quiescent, SystemSnapshot,
    ViewsAgreeWithCache, Violation,
};
pub use model::{ModelList, ModelSort, ModelTerm, Operation, SimWorld, Slot};
pub use sim_backend::{Failure, PageShape, SimBackend};
