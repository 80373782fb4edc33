//! Typed forum API.

use petboard_core::ForumError;
use petboard_proto::{
    ApiRequest, Comment, CommentId, CreateComment, CreateForum, Envelope, ForumId, ForumPost,
    LikeOutcome, ListKind, ListQuery, Page, UpdateComment, UpdateForum, endpoints, error_message,
    like_status, normalize_page,
};
use serde_json::Value;

use crate::{ApiResponse, Transport, TransportError};

/// Typed access to every forum endpoint.
///
/// Cloning is cheap: clones share the transport.
#[derive(Debug, Clone)]
pub struct ForumApi<T> {
    transport: T,
}

impl<T: Transport> ForumApi<T> {
    /// API over `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One page of a list surface.
    pub async fn list_forums(
        &self,
        kind: ListKind,
        query: &ListQuery,
    ) -> Result<Page<ForumPost>, ForumError> {
        let body = self.execute(endpoints::list_forums(kind, query)).await?;
        Ok(normalize_page(body)?)
    }

    /// One forum post.
    pub async fn get_forum(&self, forum_id: ForumId) -> Result<ForumPost, ForumError> {
        let body = self.execute(endpoints::get_forum(forum_id)).await?;
        Ok(Envelope::from_body(body)?.data)
    }

    /// Create a forum post. Returns the server's record.
    pub async fn create_forum(&self, body: &CreateForum) -> Result<ForumPost, ForumError> {
        let body = self.execute(endpoints::create_forum(body)?).await?;
        Ok(Envelope::from_body(body)?.data)
    }

    /// Replace a forum post's editable fields. Returns the server's record.
    pub async fn update_forum(
        &self,
        forum_id: ForumId,
        body: &UpdateForum,
    ) -> Result<ForumPost, ForumError> {
        let body = self.execute(endpoints::update_forum(forum_id, body)?).await?;
        Ok(Envelope::from_body(body)?.data)
    }

    /// Delete a forum post.
    pub async fn delete_forum(&self, forum_id: ForumId) -> Result<(), ForumError> {
        self.execute(endpoints::delete_forum(forum_id)).await?;
        Ok(())
    }

    /// One page of top-level comments.
    pub async fn list_comments(
        &self,
        forum_id: ForumId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, ForumError> {
        let body = self.execute(endpoints::list_comments(forum_id, page, size)).await?;
        Ok(normalize_page(body)?)
    }

    /// Create a comment or reply. Returns the server's record.
    pub async fn create_comment(
        &self,
        forum_id: ForumId,
        body: &CreateComment,
    ) -> Result<Comment, ForumError> {
        let body = self.execute(endpoints::create_comment(forum_id, body)?).await?;
        Ok(Envelope::from_body(body)?.data)
    }

    /// Edit a comment. Returns the server's record.
    pub async fn update_comment(
        &self,
        forum_id: ForumId,
        comment_id: CommentId,
        body: &UpdateComment,
    ) -> Result<Comment, ForumError> {
        let request = endpoints::update_comment(forum_id, comment_id, body)?;
        let body = self.execute(request).await?;
        Ok(Envelope::from_body(body)?.data)
    }

    /// Delete a comment.
    pub async fn delete_comment(
        &self,
        forum_id: ForumId,
        comment_id: CommentId,
    ) -> Result<(), ForumError> {
        self.execute(endpoints::delete_comment(forum_id, comment_id)).await?;
        Ok(())
    }

    /// Whether the viewer likes `forum_id`.
    pub async fn check_like(&self, forum_id: ForumId) -> Result<bool, ForumError> {
        let body = self.execute(endpoints::check_like(forum_id)).await?;
        let envelope = Envelope::<Value>::from_body(body)?;
        Ok(like_status(&envelope.data)?)
    }

    /// Toggle the viewer's like on `forum_id`.
    pub async fn toggle_like(&self, forum_id: ForumId) -> Result<LikeOutcome, ForumError> {
        let body = self.execute(endpoints::toggle_like(forum_id)).await?;
        let envelope = Envelope::<Value>::from_body(body)?;
        Ok(LikeOutcome::from_response(&envelope.message, &envelope.data)?)
    }

    /// Send `request` and return the body of a successful response.
    async fn execute(&self, request: ApiRequest) -> Result<Value, ForumError> {
        let label = request.to_string();
        tracing::debug!(request = %label, "sending");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(request = %label, error = %e, "transport failure");
            transport_error(&e)
        })?;

        check_status(response).inspect_err(|e| {
            tracing::warn!(request = %label, error = %e, "request rejected");
        })
    }
}

fn transport_error(err: &TransportError) -> ForumError {
    ForumError::Transport(err.to_string())
}

fn check_status(response: ApiResponse) -> Result<Value, ForumError> {
    if response.is_success() {
        return Ok(response.body);
    }
    let message = error_message(&response.body).unwrap_or_default();
    Err(ForumError::Server { status: response.status, message })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    #[test]
    fn error_envelope_message_is_surfaced() {
        let response = ApiResponse::new(400, json!({ "message": "Title is required" }));
        let err = check_status(response).unwrap_err();
        assert_eq!(err, ForumError::Server { status: 400, message: "Title is required".into() });
        assert_eq!(err.user_message(), "Title is required");
    }

    #[test]
    fn empty_error_body_falls_back_to_status() {
        let err = check_status(ApiResponse::new(502, Value::Null)).unwrap_err();
        assert_eq!(err.user_message(), "Request failed (status 502).");
        assert!(err.is_transient());
    }

    #[test]
    fn transport_errors_are_transient() {
        let err = transport_error(&TransportError::Timeout);
        assert!(err.is_transient());
        assert!(matches!(err, ForumError::Transport(_)));
    }

    proptest! {
        #[test]
        fn prop_status_decides_success(status in 100u16..600, message in "[A-Za-z]{1,20}") {
            let body = json!({ "message": message, "data": null });
            let result = check_status(ApiResponse::new(status, body.clone()));

            if (200..300).contains(&status) {
                prop_assert_eq!(result, Ok(body));
            } else {
                let expected = ForumError::Server { status, message: message.clone() };
                prop_assert_eq!(result.as_ref(), Err(&expected));
                prop_assert_eq!(expected.user_message(), message);
            }
        }
    }
}
