//! Operations for model-based testing.
//!
//! Operations represent every user action plus the passage of network time.
//! They are generated randomly (by proptest or from a seed) and applied to a
//! [`crate::SimWorld`]. Targets are small slots resolved against live state
//! when the operation is applied, so every generated sequence is meaningful.

use arbitrary::{Arbitrary, Unstructured};
use petboard_proto::{ListKind, SortBy, SortDir};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Index into live state (posts on the server, comments on screen), taken
/// modulo the number of candidates.
pub type Slot = u8;

/// List surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelList {
    /// Every post.
    All,
    /// The viewer's posts.
    Mine,
    /// Featured posts.
    Featured,
}

impl From<ModelList> for ListKind {
    fn from(list: ModelList) -> Self {
        match list {
            ModelList::All => ListKind::All,
            ModelList::Mine => ListKind::Mine,
            ModelList::Featured => ListKind::Featured,
        }
    }
}

/// Sort choice offered by the list UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelSort {
    /// Newest first.
    Newest,
    /// Oldest first.
    Oldest,
    /// Most liked first.
    MostLiked,
    /// Most discussed first.
    MostDiscussed,
}

impl ModelSort {
    /// Sort key and direction.
    pub fn params(self) -> (SortBy, SortDir) {
        match self {
            Self::Newest => (SortBy::CreatedAt, SortDir::Desc),
            Self::Oldest => (SortBy::CreatedAt, SortDir::Asc),
            Self::MostLiked => (SortBy::LikesCount, SortDir::Desc),
            Self::MostDiscussed => (SortBy::CommentsCount, SortDir::Desc),
        }
    }
}

/// Search input, drawn from a vocabulary that matches some fixture posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum ModelTerm {
    /// Empty input (clears the filter).
    Clear,
    /// Matches dog posts.
    Dog,
    /// Matches cat posts.
    Cat,
    /// Matches nothing.
    Nothing,
}

impl ModelTerm {
    /// Text typed into the search box.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "",
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Nothing => "zebra",
        }
    }
}

/// Operations that can be applied to the system.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Reload a list's current target.
    LoadList {
        /// List to reload.
        list: ModelList,
    },

    /// Move a list to another page. Out-of-range pages are ignored.
    SetPage {
        /// Target list.
        list: ModelList,
        /// Requested page (taken modulo 4).
        page: u8,
    },

    /// Change a list's sort.
    SetSort {
        /// Target list.
        list: ModelList,
        /// New sort.
        sort: ModelSort,
    },

    /// Change a list's free-text search.
    Search {
        /// Target list.
        list: ModelList,
        /// Search input.
        term: ModelTerm,
    },

    /// Change a list's tag search.
    SearchTags {
        /// Target list.
        list: ModelList,
        /// Tag input.
        term: ModelTerm,
    },

    /// Focus the detail view on a server post.
    OpenForum {
        /// Post to open.
        slot: Slot,
    },

    /// Leave the detail view.
    CloseForum,

    /// Show another comment page (taken modulo 3).
    LoadComments {
        /// Requested page.
        page: u8,
    },

    /// Toggle the viewer's like on the focused post.
    ToggleLike,

    /// Comment on the focused post, or reply to a comment on screen.
    AddComment {
        /// Comment to reply to. `None` for a top-level comment.
        reply_to: Option<Slot>,
    },

    /// Edit a comment on screen.
    EditComment {
        /// Comment to edit.
        slot: Slot,
    },

    /// Delete a comment on screen.
    DeleteComment {
        /// Comment to delete.
        slot: Slot,
    },

    /// Publish a new post.
    CreateForum {
        /// Tags of the new post.
        tags: ModelTerm,
    },

    /// Edit a server post.
    UpdateForum {
        /// Post to edit.
        slot: Slot,
    },

    /// Delete a server post.
    DeleteForum {
        /// Post to delete.
        slot: Slot,
    },

    /// Sign the viewer out.
    SignOut,

    /// Sign the viewer back in.
    SignIn,

    /// Deliver one completed request.
    Step,

    /// Deliver every outstanding request.
    Settle,
}

impl Operation {
    /// Deterministic sequence of up to `len` operations derived from `seed`.
    pub fn random_sequence(seed: u64, len: usize) -> Vec<Operation> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut bytes = vec![0u8; len * 8];
        rng.fill(bytes.as_mut_slice());

        let mut input = Unstructured::new(&bytes);
        (0..len).map_while(|_| Operation::arbitrary(&mut input).ok()).collect()
    }
}
