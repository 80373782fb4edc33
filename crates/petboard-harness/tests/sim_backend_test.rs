//! The app and typed API against the simulated backend.

use petboard_app::{ForumApp, Runtime};
use petboard_client::{ClientConfig, ForumApi};
use petboard_core::{ForumError, SharedIdentity, Viewer};
use petboard_harness::{Failure, PageShape, SimBackend, SystemSnapshot};
use petboard_proto::{ListKind, ListQuery, UserId};

const VIEWER: UserId = 1;
const OTHER: UserId = 2;

fn backend() -> SimBackend {
    SimBackend::new(SharedIdentity::signed_in(Viewer::new(VIEWER, "token")))
}

#[tokio::test]
async fn every_page_shape_normalizes_to_the_same_page() {
    let mut pages = Vec::new();
    for shape in [PageShape::Flat, PageShape::Nested, PageShape::Wrapped] {
        let backend = backend();
        for n in 0..7 {
            backend.seed_forum(OTHER, &format!("Post {n}"), &["dog"]);
        }
        backend.set_page_shape(shape);

        let api = ForumApi::new(backend);
        let query = ListQuery { page: 1, ..ListQuery::with_size(3) };
        let page = api.list_forums(ListKind::All, &query).await.unwrap();
        assert_eq!(page.total_elements, 7, "{shape:?}");
        assert_eq!(page.total_pages_for(3), 3, "{shape:?}");
        pages.push(page);
    }

    let ids: Vec<Vec<u64>> =
        pages.iter().map(|p| p.content.iter().map(|f| f.forum_id).collect()).collect();
    assert_eq!(ids, vec![vec![4, 3, 2]; 3]);
}

#[tokio::test]
async fn empty_result_is_one_empty_page() {
    let api = ForumApi::new(backend());
    let page = api.list_forums(ListKind::Featured, &ListQuery::default()).await.unwrap();
    assert!(page.content.is_empty());
    assert_eq!(page.total_pages_for(10), 1);
}

#[tokio::test]
async fn failures_reach_the_caller_as_typed_errors() {
    let backend = backend();
    let forum_id = backend.seed_forum(OTHER, "Post", &[]);
    let api = ForumApi::new(backend.clone());

    backend.fail_next(Failure::Offline);
    assert!(matches!(api.get_forum(forum_id).await, Err(ForumError::Transport(_))));

    backend.fail_next(Failure::Status { status: 500, message: "Database unavailable".into() });
    let err = api.get_forum(forum_id).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.user_message(), "Database unavailable");

    let err = api.delete_forum(forum_id).await.unwrap_err();
    assert!(matches!(err, ForumError::Server { status: 403, .. }));
    assert!(backend.forum(forum_id).is_some());
}

#[tokio::test]
async fn failed_reload_keeps_previous_page() {
    let backend = backend();
    for n in 0..3 {
        backend.seed_forum(OTHER, &format!("Post {n}"), &["cat"]);
    }
    let app = ForumApp::new(Some(VIEWER), &ClientConfig::default());
    let mut runtime = Runtime::new(app, backend.clone());
    runtime.apply(|app| app.load_list(ListKind::All));
    runtime.settle().await;

    backend.fail_next(Failure::Timeout);
    runtime.apply(|app| app.load_list(ListKind::All));
    runtime.settle().await;

    let list = runtime.app().list(ListKind::All).unwrap();
    assert_eq!(list.content().len(), 3);
    assert!(!list.is_loading());
    assert_eq!(
        list.error(),
        Some("Unable to reach the server. Check your connection and try again.")
    );
}

#[tokio::test]
async fn settled_snapshot() {
    let backend = backend();
    let dog = backend.seed_forum(OTHER, "Dog question", &["dog"]);
    backend.seed_forum(VIEWER, "Cat question", &["cat"]);
    backend.seed_like(dog, OTHER);
    backend.seed_comment(dog, OTHER, "Try a harness", None);

    let app = ForumApp::new(Some(VIEWER), &ClientConfig::default());
    let mut runtime = Runtime::new(app, backend.clone());
    runtime.apply(|app| app.load_list(ListKind::All));
    runtime.settle().await;

    let snapshot = SystemSnapshot::from_runtime(&runtime).with_backend(&backend);
    insta::assert_json_snapshot!(snapshot, @r#"
    {
      "lists": [
        {
          "kind": "all",
          "page": 0,
          "size": 10,
          "total_pages": 1,
          "total_elements": 2,
          "loading": false,
          "posts": [
            [
              2,
              {
                "likes": 0,
                "comments": 0
              }
            ],
            [
              1,
              {
                "likes": 1,
                "comments": 1
              }
            ]
          ]
        },
        {
          "kind": "mine",
          "page": 0,
          "size": 10,
          "total_pages": 1,
          "total_elements": 0,
          "loading": false,
          "posts": []
        },
        {
          "kind": "featured",
          "page": 0,
          "size": 10,
          "total_pages": 1,
          "total_elements": 0,
          "loading": false,
          "posts": []
        }
      ],
      "detail": null,
      "cache": {
        "1": {
          "likes": 1,
          "comments": 1
        },
        "2": {
          "likes": 0,
          "comments": 0
        }
      },
      "in_flight": 0,
      "backend": {
        "1": {
          "likes": 1,
          "comments": 1
        },
        "2": {
          "likes": 0,
          "comments": 0
        }
      }
    }
    "#);
}
