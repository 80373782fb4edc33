//! Request bodies and small response payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CommentId, ProtocolError};

/// Body of a "create forum" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateForum {
    /// Post title.
    pub title: String,
    /// Rich-text body.
    pub content: String,
    /// Tags in display order.
    pub tags: Vec<String>,
}

/// Body of an "update forum" request. Replaces all editable fields.
pub type UpdateForum = CreateForum;

/// Body of a "create comment" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComment {
    /// Comment body.
    pub text: String,
    /// Comment being replied to. `None` for a top-level comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

/// Body of an "update comment" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateComment {
    /// New comment body.
    pub text: String,
}

/// Which branch a like toggle took on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeOutcome {
    /// The viewer now likes the post.
    Liked,
    /// The viewer no longer likes the post.
    Unliked,
}

impl LikeOutcome {
    /// Interpret a toggle response.
    ///
    /// An explicit boolean (`data: true`, `data.liked` or `data.isLiked`) wins.
    /// Otherwise the envelope message is matched word by word: a word such
    /// as "unliked", "disliked" or "removed" is [`LikeOutcome::Unliked`],
    /// otherwise the word "like" or "liked" is [`LikeOutcome::Liked`].
    /// Words that merely contain "like" ("likely", "dislike") never count
    /// as a like.
    pub fn from_response(message: &str, data: &Value) -> Result<Self, ProtocolError> {
        if let Some(liked) = explicit_flag(data) {
            return Ok(if liked { Self::Liked } else { Self::Unliked });
        }

        let words: Vec<String> = message
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect();
        let any = |set: &[&str]| words.iter().any(|word| set.contains(&word.as_str()));
        if any(&["unlike", "unliked", "dislike", "disliked", "removed", "deleted"]) {
            Ok(Self::Unliked)
        } else if any(&["like", "liked"]) {
            Ok(Self::Liked)
        } else {
            Err(ProtocolError::UnrecognizedLikeResponse(message.to_string()))
        }
    }

    /// Whether the viewer likes the post after this outcome.
    pub fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }
}

/// Interpret a "check like" response payload.
pub fn like_status(data: &Value) -> Result<bool, ProtocolError> {
    explicit_flag(data).ok_or_else(|| ProtocolError::Decode {
        what: "like status",
        reason: format!("expected a boolean, got {data}"),
    })
}

fn explicit_flag(data: &Value) -> Option<bool> {
    match data {
        Value::Bool(b) => Some(*b),
        Value::Object(map) => {
            map.get("liked").or_else(|| map.get("isLiked")).and_then(Value::as_bool)
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn explicit_flag_beats_message() {
        let outcome = LikeOutcome::from_response("Forum liked", &json!({ "liked": false }));
        assert_eq!(outcome, Ok(LikeOutcome::Unliked));

        let outcome = LikeOutcome::from_response("", &json!(true));
        assert_eq!(outcome, Ok(LikeOutcome::Liked));
    }

    #[test]
    fn message_contract() {
        assert_eq!(
            LikeOutcome::from_response("Forum liked successfully", &Value::Null),
            Ok(LikeOutcome::Liked)
        );
        assert_eq!(
            LikeOutcome::from_response("Forum unliked successfully", &Value::Null),
            Ok(LikeOutcome::Unliked)
        );
        assert_eq!(
            LikeOutcome::from_response("Like removed", &json!("ok")),
            Ok(LikeOutcome::Unliked)
        );
        assert!(LikeOutcome::from_response("Done", &Value::Null).is_err());
    }

    #[test]
    fn like_message_matches_whole_words() {
        assert_eq!(
            LikeOutcome::from_response("Forum disliked", &Value::Null),
            Ok(LikeOutcome::Unliked)
        );
        assert_eq!(
            LikeOutcome::from_response("LIKED: forum #4", &Value::Null),
            Ok(LikeOutcome::Liked)
        );
        assert!(LikeOutcome::from_response("Likely cached", &Value::Null).is_err());
        assert!(LikeOutcome::from_response("Businesslike reply", &Value::Null).is_err());
    }

    #[test]
    fn like_status_shapes() {
        assert_eq!(like_status(&json!(true)), Ok(true));
        assert_eq!(like_status(&json!({ "isLiked": false })), Ok(false));
        assert!(like_status(&json!("yes")).is_err());
    }

    #[test]
    fn top_level_comment_omits_parent() {
        let body = CreateComment { text: "hi".into(), parent_id: None };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "text": "hi" }));

        let reply = CreateComment { text: "hi".into(), parent_id: Some(4) };
        assert_eq!(serde_json::to_value(&reply).unwrap(), json!({ "text": "hi", "parentId": 4 }));
    }
}
