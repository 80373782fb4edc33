//! Model-based testing support.
//!
//! [`Operation`]s describe user actions and network deliveries. A
//! [`SimWorld`] applies them to the real app running over the simulated
//! backend, and the invariant registries judge the result.

mod operation;
mod world;

pub use operation::{ModelList, ModelSort, ModelTerm, Operation, Slot};
pub use world::SimWorld;
