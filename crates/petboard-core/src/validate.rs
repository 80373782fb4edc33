//! Local input validation.
//!
//! Drafts are what a form produces; validating one yields the request body
//! or a [`ValidationError`] that never reaches the network.

use petboard_proto::{CommentId, CreateComment, CreateForum, parse_tags};
use thiserror::Error;

/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;
/// Maximum post body length in characters.
pub const CONTENT_MAX: usize = 20_000;
/// Maximum comment length in characters.
pub const COMMENT_MAX: usize = 2_000;
/// Maximum number of tags per post.
pub const TAGS_MAX: usize = 10;

/// Input rejected before any request was made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is blank.
    #[error("{field} must not be empty")]
    Empty {
        /// Field name
        field: &'static str,
    },

    /// A field exceeds its length limit.
    #[error("{field} exceeds {max} characters")]
    TooLong {
        /// Field name
        field: &'static str,
        /// Limit in characters
        max: usize,
    },

    /// Too many tags.
    #[error("too many tags: {count} (max {max})")]
    TooManyTags {
        /// Tags supplied
        count: usize,
        /// Limit
        max: usize,
    },

    /// Reply target is not a comment of the open forum.
    #[error("comment {0} is not part of this forum")]
    UnknownParent(CommentId),
}

/// Unvalidated forum form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForumDraft {
    /// Title as typed.
    pub title: String,
    /// Body as typed.
    pub content: String,
    /// Comma-separated tags as typed.
    pub tags: String,
}

impl ForumDraft {
    /// Validate into a create/update body.
    pub fn validate(&self) -> Result<CreateForum, ValidationError> {
        let title = required("title", &self.title, TITLE_MAX)?;
        let content = required("content", &self.content, CONTENT_MAX)?;
        let tags = parse_tags(&self.tags);
        if tags.len() > TAGS_MAX {
            return Err(ValidationError::TooManyTags { count: tags.len(), max: TAGS_MAX });
        }
        Ok(CreateForum { title, content, tags })
    }
}

/// Unvalidated comment form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    /// Text as typed.
    pub text: String,
    /// Comment being replied to.
    pub parent_id: Option<CommentId>,
}

impl CommentDraft {
    /// Top-level comment draft.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), parent_id: None }
    }

    /// Reply draft.
    pub fn reply(parent_id: CommentId, text: impl Into<String>) -> Self {
        Self { text: text.into(), parent_id: Some(parent_id) }
    }

    /// Validate into a create body.
    pub fn validate(&self) -> Result<CreateComment, ValidationError> {
        let text = required("comment", &self.text, COMMENT_MAX)?;
        Ok(CreateComment { text, parent_id: self.parent_id })
    }
}

pub(crate) fn required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value.to_string())
}
