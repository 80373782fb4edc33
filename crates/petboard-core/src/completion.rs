//! Result of feeding a response into a view.

/// What a view did with a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response was applied to the view.
    Applied,
    /// The request failed; the view stored a user-facing error.
    Failed,
    /// The view's target changed since the request was issued; ignored.
    Stale,
}

impl Completion {
    /// Whether the view's state changed.
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}
