/// HTTP-level tests for the Workboard API
///
/// These exercise the full router (auth layer, handlers, error mapping,
/// middleware) over the in-memory store.

mod common;

use axum::http::StatusCode;
use common::{TestContext, PASSWORD};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_security_headers_on_responses() {
    let ctx = TestContext::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(ctx.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
}

#[tokio::test]
async fn test_register_validation_and_conflict() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({ "name": "A", "email": "not-an-email", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");

    let (status, _) = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({ "name": "A", "email": "a@x.com", "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.user("A").await;
    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/register",
            None,
            Some(json!({ "name": "Again", "email": "A@x.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_login_and_refresh() {
    let ctx = TestContext::new();
    ctx.user("A").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": "wrongpass" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid email or password");

    let (status, pair) = ctx
        .send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(pair["access_token"], pair["refresh_token"]);

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": pair["refresh_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expires_in"], 24 * 3600);

    let fresh = body["access_token"].as_str().unwrap();
    let (status, _) = ctx.send("GET", "/v1/projects", Some(fresh), None).await;
    assert_eq!(status, StatusCode::OK);

    // An access token is not accepted for refresh
    let (status, _) = ctx
        .send(
            "POST",
            "/v1/auth/refresh",
            None,
            Some(json!({ "refresh_token": pair["access_token"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send("GET", "/v1/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .send("GET", "/v1/tasks", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_rejected_as_bearer() {
    let ctx = TestContext::new();
    ctx.user("A").await;
    let (_, pair) = ctx
        .send(
            "POST",
            "/v1/auth/login",
            None,
            Some(json!({ "email": "a@x.com", "password": PASSWORD })),
        )
        .await;

    let (status, _) = ctx
        .send(
            "GET",
            "/v1/projects",
            Some(pair["refresh_token"].as_str().unwrap()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_path_id_is_bad_request() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;

    let (status, body) = ctx
        .send("GET", "/v1/projects/not-a-uuid", Some(&alice.token), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_project_crud_over_http() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let project_id = ctx.project(&alice, "Roadmap").await;

    let (status, body) = ctx
        .send("GET", &format!("/v1/projects/{project_id}"), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Roadmap");
    assert_eq!(body["creator"]["id"], alice.id.to_string());
    assert!(body["creator"].get("password_hash").is_none());
    assert_eq!(body["members"][0]["role"], "admin");

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/v1/projects/{project_id}"),
            Some(&alice.token),
            Some(json!({ "name": "Roadmap 2025", "status": "Paused" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Roadmap 2025");

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/v1/projects/{project_id}/favorite"),
            Some(&alice.token),
            Some(json!({ "is_favorite": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_favorite"], true);

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/v1/projects/{project_id}/activities"),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/projects/{project_id}"), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx
        .send("GET", &format!("/v1/projects/{project_id}"), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_project_validation_error() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/v1/projects",
            Some(&alice.token),
            Some(json!({ "name": "" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_unreadable_json_bodies_are_bad_request() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;

    let cases = [
        (Some("application/json"), "{not json"),
        (Some("application/json"), r#"{"name": 5}"#),
        (None, r#"{"name": "Roadmap"}"#),
    ];

    for (content_type, body) in cases {
        let (status, json) = ctx
            .send_raw(
                "POST",
                "/v1/projects",
                Some(&alice.token),
                content_type,
                body.to_string(),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(json["error"], "bad_request", "body {body:?}");
        assert!(json["message"].is_string());
    }

    let (status, json) = ctx
        .send_raw(
            "POST",
            "/v1/auth/login",
            None,
            Some("application/json"),
            "[]".to_string(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_membership_endpoints() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    let project_id = ctx.project(&alice, "Roadmap").await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{project_id}/members"),
            Some(&alice.token),
            Some(json!({ "user_id": bob.id, "role": "owner" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("owner"));

    ctx.add_member(&alice, &project_id, &bob, "viewer").await;

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/v1/projects/{project_id}/members"),
            Some(&alice.token),
            Some(json!({ "user_id": bob.id, "role": "editor" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Viewers cannot manage members
    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/v1/projects/{project_id}/members/{}", alice.id),
            Some(&bob.token),
            Some(json!({ "role": "viewer" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/v1/projects/{project_id}/members/{}", bob.id),
            Some(&alice.token),
            Some(json!({ "role": "editor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "editor");

    let (status, _) = ctx
        .send(
            "DELETE",
            &format!("/v1/projects/{project_id}/members/{}", bob.id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send("GET", &format!("/v1/projects/{project_id}"), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_change_owner_endpoint() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    let project_id = ctx.project(&alice, "Roadmap").await;

    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/v1/projects/{project_id}/owner"),
            Some(&alice.token),
            Some(json!({ "user_id": bob.id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.add_member(&alice, &project_id, &bob, "viewer").await;

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/v1/projects/{project_id}/owner"),
            Some(&alice.token),
            Some(json!({ "user_id": bob.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["creator_id"], bob.id.to_string());
}

#[tokio::test]
async fn test_task_endpoints() {
    let ctx = TestContext::new();
    let alice = ctx.user("Alice").await;
    let bob = ctx.user("Bob").await;
    let project_id = ctx.project(&alice, "Roadmap").await;
    ctx.add_member(&alice, &project_id, &bob, "viewer").await;

    let task_body = json!({
        "project_id": project_id,
        "user_id": alice.id,
        "title": "Spec draft",
    });

    let (status, _) = ctx
        .send("POST", "/v1/tasks", Some(&bob.token), Some(task_body.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, task) = ctx
        .send("POST", "/v1/tasks", Some(&alice.token), Some(task_body))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["status"], "To Do");
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/v1/projects/{project_id}/tasks"),
            Some(&bob.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/tasks/{task_id}/assign"),
            Some(&alice.token),
            Some(json!({ "user_id": bob.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], bob.id.to_string());

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/v1/tasks/{task_id}/assign"),
            Some(&alice.token),
            Some(json!({ "user_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("/v1/tasks/{task_id}"),
            Some(&alice.token),
            Some(json!({
                "project_id": project_id,
                "user_id": bob.id,
                "title": "Spec final",
                "status": "Done",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Spec final");
    assert_eq!(body["status"], "Done");

    let (status, body) = ctx.send("GET", "/v1/tasks", Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/tasks/{task_id}"), Some(&bob.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/tasks/{task_id}"), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send("GET", &format!("/v1/tasks/{task_id}"), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_collaboration_scenario_over_http() {
    let ctx = TestContext::new();
    let a = ctx.user("A").await;
    let b = ctx.user("B").await;
    let project_id = ctx.project(&a, "Roadmap").await;

    ctx.add_member(&a, &project_id, &b, "viewer").await;
    let (status, _) = ctx
        .send(
            "PUT",
            &format!("/v1/projects/{project_id}/members/{}", b.id),
            Some(&a.token),
            Some(json!({ "role": "editor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, task) = ctx
        .send(
            "POST",
            "/v1/tasks",
            Some(&b.token),
            Some(json!({ "project_id": project_id, "user_id": b.id, "title": "Spec draft" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["id"].as_str().unwrap();

    let (status, _) = ctx
        .send("DELETE", &format!("/v1/projects/{project_id}"), Some(&a.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send("GET", &format!("/v1/tasks/{task_id}"), Some(&b.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
