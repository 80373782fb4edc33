//! Builders for every backend endpoint the forum state layer consumes.
//!
//! | operation      | request                                              |
//! |----------------|------------------------------------------------------|
//! | list           | `GET /api/forums`                                    |
//! | search         | `GET /api/forums/search?searchTerm=..`               |
//! | tag search     | `GET /api/forums/search/tags?tags=a&tags=b`          |
//! | my forums      | `GET /api/forums/my-forums`                          |
//! | featured       | `GET /api/forums/featured`                           |
//! | forum CRUD     | `GET/PUT/DELETE /api/forums/{id}`, `POST /api/forums` |
//! | comments       | `GET/POST /api/forums/{id}/comments`                 |
//! | comment edit   | `PUT/DELETE /api/forums/{id}/comments/{commentId}`   |
//! | like status    | `GET /api/forums/{id}/likes/check`                   |
//! | like toggle    | `POST /api/forums/{id}/likes/toggle`                 |

use crate::{
    ApiRequest, CommentId, CreateComment, CreateForum, Filter, ForumId, ListKind, ListQuery,
    Method, ProtocolError, UpdateComment, UpdateForum,
};

/// Root of the forum resource.
pub const FORUMS: &str = "/api/forums";

/// List one page of a list surface.
///
/// On the `All` surface the filter selects the search or tag-search endpoint;
/// the other surfaces pass the same parameters to their own endpoint.
pub fn list_forums(kind: ListKind, query: &ListQuery) -> ApiRequest {
    let path = match (kind, query.filter()) {
        (ListKind::All, Filter::None) => FORUMS.to_string(),
        (ListKind::All, Filter::Search(_)) => format!("{FORUMS}/search"),
        (ListKind::All, Filter::Tags(_)) => format!("{FORUMS}/search/tags"),
        (ListKind::Mine, _) => format!("{FORUMS}/my-forums"),
        (ListKind::Featured, _) => format!("{FORUMS}/featured"),
    };
    ApiRequest::get(path).with_query(query.query_pairs())
}

/// Fetch one forum post.
pub fn get_forum(forum_id: ForumId) -> ApiRequest {
    ApiRequest::get(forum_path(forum_id))
}

/// Create a forum post.
pub fn create_forum(body: &CreateForum) -> Result<ApiRequest, ProtocolError> {
    ApiRequest::new(Method::Post, FORUMS).with_json(body)
}

/// Replace a forum post's editable fields.
pub fn update_forum(forum_id: ForumId, body: &UpdateForum) -> Result<ApiRequest, ProtocolError> {
    ApiRequest::new(Method::Put, forum_path(forum_id)).with_json(body)
}

/// Delete a forum post.
pub fn delete_forum(forum_id: ForumId) -> ApiRequest {
    ApiRequest::delete(forum_path(forum_id))
}

/// Fetch one page of top-level comments, newest first.
pub fn list_comments(forum_id: ForumId, page: u32, size: u32) -> ApiRequest {
    ApiRequest::get(comments_path(forum_id)).with_query([
        ("page".to_string(), page.to_string()),
        ("size".to_string(), size.to_string()),
    ])
}

/// Create a comment or reply.
pub fn create_comment(
    forum_id: ForumId,
    body: &CreateComment,
) -> Result<ApiRequest, ProtocolError> {
    ApiRequest::new(Method::Post, comments_path(forum_id)).with_json(body)
}

/// Edit a comment's text.
pub fn update_comment(
    forum_id: ForumId,
    comment_id: CommentId,
    body: &UpdateComment,
) -> Result<ApiRequest, ProtocolError> {
    let path = format!("{}/{comment_id}", comments_path(forum_id));
    ApiRequest::new(Method::Put, path).with_json(body)
}

/// Delete a comment.
pub fn delete_comment(forum_id: ForumId, comment_id: CommentId) -> ApiRequest {
    ApiRequest::delete(format!("{}/{comment_id}", comments_path(forum_id)))
}

/// Ask whether the viewer likes a post.
pub fn check_like(forum_id: ForumId) -> ApiRequest {
    ApiRequest::get(format!("{}/likes/check", forum_path(forum_id)))
}

/// Toggle the viewer's like; the server decides the direction.
pub fn toggle_like(forum_id: ForumId) -> ApiRequest {
    ApiRequest::new(Method::Post, format!("{}/likes/toggle", forum_path(forum_id)))
}

fn forum_path(forum_id: ForumId) -> String {
    format!("{FORUMS}/{forum_id}")
}

fn comments_path(forum_id: ForumId) -> String {
    format!("{}/comments", forum_path(forum_id))
}
