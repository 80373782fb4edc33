//! Viewer identity.
//!
//! The session itself (login, token refresh) lives outside this crate. The
//! state layer only needs to know who is looking: an absent viewer is an
//! anonymous one, which disables like and comment mutations without being an
//! error.

use std::sync::{Arc, PoisonError, RwLock};

use petboard_proto::UserId;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    /// User ID.
    pub user_id: UserId,
    /// Bearer token attached to requests.
    pub token: String,
}

impl Viewer {
    /// Create a viewer.
    pub fn new(user_id: UserId, token: impl Into<String>) -> Self {
        Self { user_id, token: token.into() }
    }
}

/// Supplies the current viewer, or `None` for an anonymous one.
pub trait Identity: Send + Sync {
    /// Current viewer.
    fn viewer(&self) -> Option<Viewer>;

    /// Current viewer's user ID.
    fn user_id(&self) -> Option<UserId> {
        self.viewer().map(|v| v.user_id)
    }
}

/// Shared, swappable identity handle.
///
/// Clones observe the same session, so the transport and the state layer see
/// sign-in and sign-out at the same time.
#[derive(Debug, Clone, Default)]
pub struct SharedIdentity {
    inner: Arc<RwLock<Option<Viewer>>>,
}

impl SharedIdentity {
    /// Anonymous session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Session already signed in as `viewer`.
    pub fn signed_in(viewer: Viewer) -> Self {
        Self { inner: Arc::new(RwLock::new(Some(viewer))) }
    }

    /// Replace the current viewer.
    pub fn set(&self, viewer: Option<Viewer>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = viewer;
    }
}

impl Identity for SharedIdentity {
    fn viewer(&self) -> Option<Viewer> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Identity for Option<Viewer> {
    fn viewer(&self) -> Option<Viewer> {
        self.clone()
    }
}
