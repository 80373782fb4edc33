//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The invariant system extracts observable state from the app (and, once
//! the runtime has settled, from the simulated backend) into a
//! [`SystemSnapshot`], then runs registered [`Invariant`] checks against it.
//!
//! Two registries are provided. [`InvariantRegistry::standard()`] holds
//! properties that hold after every single completion;
//! [`InvariantRegistry::settled()`] adds the ones that only hold once nothing
//! is in flight.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SystemSnapshot::from_app(runtime.app());
//! registry.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    CacheAgreesWithBackend, ListPagination, PageInRange, Quiescent, ViewsAgreeWithCache,
};
pub use snapshot::{Counts, DetailSnapshot, ListSnapshot, SystemSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Which invariant was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// Page totals are well formed.
    ListPagination,
    /// A settled list shows a page that exists.
    PageInRange,
    /// Every view shows the cache's counts.
    ViewsAgreeWithCache,
    /// The cache converged on the server's counts.
    CacheAgreesWithBackend,
    /// Nothing is left loading once the runtime is idle.
    Quiescent,
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ListPagination => "list_pagination",
            Self::PageInRange => "page_in_range",
            Self::ViewsAgreeWithCache => "views_agree_with_cache",
            Self::CacheAgreesWithBackend => "cache_agrees_with_backend",
            Self::Quiescent => "quiescent",
        };
        f.write_str(name)
    }
}

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// The violated invariant.
    pub invariant: InvariantKind,
    /// Description of what went wrong.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against system state.
///
/// Invariants are behavioral properties that must always hold.
/// They capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Which invariant this is, for error reporting.
    fn kind(&self) -> InvariantKind;

    /// Check the invariant against the current state.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Invariants that hold after every completion.
    ///
    /// Includes:
    /// - [`ListPagination`]: `total_pages >= 1`, and exactly 1 when everything
    ///   fits on one page
    /// - [`ViewsAgreeWithCache`]: lists and detail show the cached counts
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ListPagination);
        registry.add(ViewsAgreeWithCache);
        registry
    }

    /// [`InvariantRegistry::standard()`] plus invariants that hold once the
    /// runtime is idle.
    ///
    /// Adds:
    /// - [`PageInRange`]: every list shows an existing page
    /// - [`Quiescent`]: nothing in flight, nothing loading
    /// - [`CacheAgreesWithBackend`]: cached counts equal the server's
    pub fn settled() -> Self {
        let mut registry = Self::standard();
        registry.add(PageInRange);
        registry.add(Quiescent);
        registry.add(CacheAgreesWithBackend);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation found.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registries_have_invariants() {
        assert_eq!(InvariantRegistry::standard().len(), 2);
        assert_eq!(InvariantRegistry::settled().len(), 5);
        assert!(InvariantRegistry::new().is_empty());
    }

    #[test]
    fn empty_snapshot_passes_invariants() {
        let snapshot = SystemSnapshot::empty();
        assert!(InvariantRegistry::settled().check_all(&snapshot).is_ok());
    }

    #[test]
    fn violations_name_their_invariant() {
        let violation =
            Violation { invariant: InvariantKind::PageInRange, message: "all: page 3 of 2".into() };
        assert_eq!(violation.to_string(), "page_in_range: all: page 3 of 2");
    }
}
