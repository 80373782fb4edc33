//! Tests for response interpretation in `ForumApi`.
//!
//! A scripted transport replays canned responses and records the requests it
//! was asked to send.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use petboard_client::{ApiResponse, ForumApi, ForumError, Transport, TransportError};
use petboard_proto::{
    ApiRequest, CreateComment, LikeOutcome, ListKind, ListQuery, Method, ProtocolError,
};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Scripted {
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, TransportError>>>>,
    sent: Arc<Mutex<Vec<ApiRequest>>>,
}

impl Scripted {
    fn reply(self, status: u16, body: Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    fn fail(self, err: TransportError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for Scripted {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().unwrap().push(request);
        self.responses.lock().unwrap().pop_front().expect("no scripted response left")
    }
}

fn forum_json(forum_id: u64, likes: u64) -> Value {
    json!({
        "forumId": forum_id,
        "title": "Best harness for a puppy?",
        "content": "Looking for something that will not chafe.",
        "tags": ["dog", "gear"],
        "authorFirstName": "Sam",
        "authorLastName": "Lee",
        "authorEmail": "sam@example.com",
        "authorUserId": 3,
        "createdAt": "2024-05-01T10:00:00",
        "likesCount": likes,
        "commentsCount": 0
    })
}

#[tokio::test]
async fn nested_page_inside_data_is_normalized() {
    let transport = Scripted::default().reply(
        200,
        json!({
            "message": "ok",
            "data": {
                "content": [forum_json(1, 2), forum_json(2, 0)],
                "page": { "number": 0, "size": 5, "totalElements": 2, "totalPages": 1 }
            }
        }),
    );
    let api = ForumApi::new(transport.clone());

    let page = api.list_forums(ListKind::All, &ListQuery::with_size(5)).await.unwrap();

    assert_eq!(page.content.len(), 2);
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.total_pages_for(5), 1);
    let sent = transport.sent();
    assert_eq!(sent[0].path, "/api/forums");
    assert_eq!(sent[0].query_value("size"), Some("5"));
}

#[tokio::test]
async fn tag_search_hits_tag_endpoint() {
    let transport = Scripted::default().reply(200, json!([]));
    let api = ForumApi::new(transport.clone());
    let query = ListQuery { tag_search_term: "dog, , cat".into(), ..ListQuery::default() };

    let page = api.list_forums(ListKind::All, &query).await.unwrap();

    assert!(page.content.is_empty());
    let sent = transport.sent();
    assert_eq!(sent[0].path, "/api/forums/search/tags");
    assert_eq!(sent[0].query_values("tags").collect::<Vec<_>>(), ["dog", "cat"]);
}

#[tokio::test]
async fn forum_is_unwrapped_from_envelope() {
    let transport =
        Scripted::default().reply(200, json!({ "message": "found", "data": forum_json(9, 4) }));
    let api = ForumApi::new(transport);

    let forum = api.get_forum(9).await.unwrap();

    assert_eq!(forum.forum_id, 9);
    assert_eq!(forum.likes_count, 4);
    assert_eq!(forum.author_name(), "Sam Lee");
}

#[tokio::test]
async fn like_toggle_reads_message_when_data_is_absent() {
    let transport = Scripted::default()
        .reply(200, json!({ "message": "Forum liked successfully", "data": null }))
        .reply(200, json!({ "message": "Forum unliked successfully", "data": null }))
        .reply(200, json!({ "message": "Like removed", "data": { "liked": true } }));
    let api = ForumApi::new(transport.clone());

    assert_eq!(api.toggle_like(1).await.unwrap(), LikeOutcome::Liked);
    assert_eq!(api.toggle_like(1).await.unwrap(), LikeOutcome::Unliked);
    // An explicit flag wins over the message.
    assert_eq!(api.toggle_like(1).await.unwrap(), LikeOutcome::Liked);
    assert!(transport.sent().iter().all(|r| r.method == Method::Post));
}

#[tokio::test]
async fn unrecognized_like_message_is_a_protocol_error() {
    let transport = Scripted::default().reply(200, json!({ "message": "done", "data": null }));
    let api = ForumApi::new(transport);

    let err = api.toggle_like(1).await.unwrap_err();

    assert_eq!(err, ForumError::Protocol(ProtocolError::UnrecognizedLikeResponse("done".into())));
}

#[tokio::test]
async fn check_like_accepts_bare_boolean() {
    let transport = Scripted::default().reply(200, json!({ "message": "", "data": true }));
    let api = ForumApi::new(transport);

    assert!(api.check_like(1).await.unwrap());
}

#[tokio::test]
async fn server_errors_carry_envelope_message() {
    let transport =
        Scripted::default().reply(403, json!({ "message": "You can only edit your own comments" }));
    let api = ForumApi::new(transport);

    let err = api.create_comment(1, &CreateComment { text: "hi".into(), parent_id: None }).await;

    assert_eq!(
        err.unwrap_err(),
        ForumError::Server { status: 403, message: "You can only edit your own comments".into() }
    );
}

#[tokio::test]
async fn transport_failures_map_to_transport_errors() {
    let transport = Scripted::default().fail(TransportError::Connection("refused".into()));
    let api = ForumApi::new(transport);

    let err = api.delete_forum(1).await.unwrap_err();

    assert!(matches!(err, ForumError::Transport(_)));
    assert_eq!(
        err.user_message(),
        "Unable to reach the server. Check your connection and try again."
    );
}

#[tokio::test]
async fn undecodable_forum_is_a_protocol_error() {
    let transport = Scripted::default().reply(200, json!({ "data": { "title": 5 } }));
    let api = ForumApi::new(transport);

    let err = api.get_forum(1).await.unwrap_err();

    assert!(matches!(err, ForumError::Protocol(ProtocolError::Decode { .. })));
}
