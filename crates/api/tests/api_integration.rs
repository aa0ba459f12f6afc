//! API integration tests.
//!
//! These drive the full router against a migrated in-memory database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use humap_api::{AppState, StreamingState, app};
use humap_common::config::StreamingConfig;
use humap_core::{
    ActivityService, EventPublisherService, LikeService, ListEntryService, ReviewService,
    UserService,
};
use humap_db::{
    repositories::{ActivityRepository, ListEntryRepository, ReviewRepository, UserRepository},
    test_utils::TestDatabase,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    _db: TestDatabase,
    router: Router,
    streaming: StreamingState,
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDatabase::in_memory().await.unwrap();
        let user_repo = UserRepository::new(db.connection());
        let activity_repo = ActivityRepository::new(db.connection());
        let review_repo = ReviewRepository::new(db.connection());
        let list_repo = ListEntryRepository::new(db.connection());

        let streaming = StreamingState::new(&StreamingConfig::default());
        let publisher: EventPublisherService = std::sync::Arc::new(streaming.clone());

        let mut activity_service = ActivityService::new(activity_repo.clone());
        activity_service.set_event_publisher(publisher.clone());
        let mut review_service =
            ReviewService::new(review_repo, activity_repo.clone(), user_repo.clone());
        review_service.set_event_publisher(publisher.clone());
        let mut like_service =
            LikeService::new(list_repo.clone(), activity_repo.clone(), user_repo.clone());
        like_service.set_event_publisher(publisher);

        let state = AppState {
            user_service: UserService::new(user_repo),
            activity_service,
            review_service,
            list_entry_service: ListEntryService::new(list_repo, activity_repo),
            like_service,
            streaming: streaming.clone(),
        };

        Self {
            _db: db,
            router: app(state),
            streaming,
        }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Sign up `name` and return `(user_id, token)`.
    async fn signup(&self, name: &str) -> (String, String) {
        let (status, body) = self
            .request(
                "POST",
                "/auth/signup",
                None,
                Some(json!({
                    "username": name,
                    "email": format!("{name}@example.com"),
                    "password": "password123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["data"]["id"].as_str().unwrap().to_string(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    async fn create_activity(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/activities",
                Some(token),
                Some(json!({ "title": title, "location": "Lyon" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_signup_and_signin() {
    let app = TestApp::new().await;
    let (id, token) = app.signup("alice").await;

    let (status, body) = app
        .request(
            "POST",
            "/auth/signin",
            None,
            Some(json!({ "email": "alice@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["token"], token.as_str());

    let (status, body) = app.request("GET", "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_duplicate_signup_is_conflict() {
    let app = TestApp::new().await;
    app.signup("alice").await;

    let (status, body) = app
        .request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({
                "username": "other",
                "email": "alice@example.com",
                "password": "password123",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_requires_authentication() {
    let app = TestApp::new().await;

    let (status, _) = app.request("GET", "/lists", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("GET", "/me", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_like_toggle_notifies_owner_room() {
    let app = TestApp::new().await;
    let (bob_id, bob_token) = app.signup("bob").await;
    let (_, alice_token) = app.signup("alice").await;
    let activity_id = app.create_activity(&bob_token, "Climbing").await;

    let mut bob_socket = app.streaming.connect(None);
    bob_socket.join(&bob_id).unwrap();

    let uri = format!("/activities/{activity_id}/like");
    let (status, body) = app.request("POST", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["liked"], true);

    let event = tokio::time::timeout(Duration::from_millis(200), bob_socket.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.event, "notification:like");
    assert_eq!(event.body["actorUsername"], "alice");
    assert_eq!(event.body["activityTitle"], "Climbing");

    let (_, body) = app.request("GET", &uri, Some(&alice_token), None).await;
    assert_eq!(body["data"]["liked"], true);

    let (status, body) = app.request("POST", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["liked"], false);

    let (status, _) = app.request("DELETE", &uri, Some(&alice_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_missing_activity() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("alice").await;

    let (status, body) = app
        .request("POST", "/activities/missing/like", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_custom_list_lifecycle() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("alice").await;
    let activity_id = app.create_activity(&token, "Sailing").await;

    let create = json!({ "kind": "custom", "customName": "Weekend" });
    let (status, body) = app
        .request("POST", "/lists", Some(&token), Some(create.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let list_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["kind"], "custom");
    assert_eq!(body["data"]["customName"], "Weekend");

    let (status, body) = app.request("POST", "/lists", Some(&token), Some(create)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], list_id.as_str());

    let (status, body) = app
        .request(
            "POST",
            &format!("/lists/{list_id}"),
            Some(&token),
            Some(json!({ "activityId": activity_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            "GET",
            "/me/activities/custom?name=Weekend",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["listName"], "Weekend");
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["items"][0]["activity"]["title"], "Sailing");

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/lists/{entry_id}"),
            Some(&token),
            Some(json!({ "customName": "Holidays" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customName"], "Holidays");

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/lists/{entry_id}/activities/{activity_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request("GET", &format!("/lists/{entry_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lists_are_private() {
    let app = TestApp::new().await;
    let (_, alice) = app.signup("alice").await;
    let (_, mallory) = app.signup("mallory").await;
    let activity_id = app.create_activity(&alice, "Hiking").await;

    let (_, body) = app
        .request(
            "POST",
            "/lists",
            Some(&alice),
            Some(json!({ "kind": "history", "activityId": activity_id })),
        )
        .await;
    let list_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request("GET", &format!("/lists/{list_id}"), Some(&mallory), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = app
        .request("DELETE", &format!("/lists/{list_id}"), Some(&mallory), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "DELETE",
            &format!("/lists/{list_id}/activities/{activity_id}"),
            Some(&mallory),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request("GET", "/me/activities/history", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_list_validation() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("alice").await;

    let (status, _) = app
        .request("POST", "/lists", Some(&token), Some(json!({ "kind": "liked" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request("GET", "/me/activities/custom", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pagination_is_clamped() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("alice").await;
    for n in 0..3 {
        app.create_activity(&token, &format!("Activity {n}")).await;
    }

    let (status, body) = app
        .request("GET", "/activities?page=0&limit=1000", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 100);
    assert_eq!(body["data"]["total"], 3);

    let (_, body) = app
        .request("GET", "/activities?page=2&limit=2", None, None)
        .await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reviews() {
    let app = TestApp::new().await;
    let (_, bob) = app.signup("bob").await;
    let (_, alice) = app.signup("alice").await;
    let activity_id = app.create_activity(&bob, "Diving").await;
    let uri = format!("/activities/{activity_id}/reviews");

    let (status, body) = app
        .request(
            "POST",
            &uri,
            Some(&alice),
            Some(json!({ "ranking": 5, "comment": "Great" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["ranking"], 5);

    let (status, body) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = app
        .request("POST", &uri, Some(&alice), Some(json!({ "ranking": 9 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_by_id_lifecycle() {
    let app = TestApp::new().await;
    let (_, bob) = app.signup("bob").await;
    let (alice_id, alice) = app.signup("alice").await;
    let activity_id = app.create_activity(&bob, "Surfing").await;

    let (_, body) = app
        .request(
            "POST",
            &format!("/activities/{activity_id}/reviews"),
            Some(&alice),
            Some(json!({ "ranking": 3 })),
        )
        .await;
    let uri = format!("/reviews/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ranking"], 3);

    let (status, _) = app
        .request("PUT", &uri, Some(&bob), Some(json!({ "ranking": 1 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            "PUT",
            &uri,
            Some(&alice),
            Some(json!({ "ranking": 4, "comment": "Better second time" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ranking"], 4);
    assert_eq!(body["data"]["comment"], "Better second time");

    let (status, _) = app.request("DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.request("GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .request("GET", &format!("/users/{alice_id}"), None, None)
        .await;
    assert_eq!(body["data"]["nbReviews"], 0);
}

#[tokio::test]
async fn test_profile_update_and_delete_are_self_only() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.signup("alice").await;
    let (bob_id, bob) = app.signup("bob").await;
    let uri = format!("/users/{alice_id}");

    let (status, _) = app
        .request("PATCH", &uri, Some(&bob), Some(json!({ "username": "eve" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            "PATCH",
            &uri,
            Some(&alice),
            Some(json!({ "password": "hunter2hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request(
            "PATCH",
            &uri,
            Some(&alice),
            Some(json!({ "username": "alicia", "avatar": "https://cdn.example.com/a.png" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alicia");
    assert_eq!(body["data"]["avatar"], "https://cdn.example.com/a.png");

    let (status, _) = app
        .request("DELETE", &format!("/users/{bob_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request("DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.request("GET", "/me", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request("GET", "/me", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_attach_blank_activity_is_bad_request() {
    let app = TestApp::new().await;
    let (_, token) = app.signup("alice").await;

    let (_, body) = app
        .request(
            "POST",
            "/lists",
            Some(&token),
            Some(json!({ "kind": "custom", "customName": "Weekend" })),
        )
        .await;
    let list_id = body["data"]["id"].as_str().unwrap();

    let (status, body) = app
        .request(
            "POST",
            &format!("/lists/{list_id}"),
            Some(&token),
            Some(json!({ "activityId": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
