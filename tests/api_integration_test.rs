//! Integration tests for the HTTP API.
//! Drives the full router with an in-memory database and a stub provider standing
//! in for the model endpoint.

use async_trait::async_trait;
use axum::http::StatusCode;
use flowsmith::api::AppState;
use flowsmith::database::connect_in_memory;
use flowsmith::generation::{
    CompletionOptions, CompletionProvider, GenerationError, PromptPair, WorkflowGenerator,
};
use flowsmith::server::{build_router, build_state};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePool;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// What the stub provider answers with
#[derive(Clone)]
enum Reply {
    Content(String),
    /// Content after a pause, long enough for requests to overlap
    Delayed(String),
    Nothing,
    Down,
}

struct StubProvider {
    reply: Reply,
    calls: Mutex<Vec<PromptPair>>,
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(
        &self,
        prompts: &PromptPair,
        _options: &CompletionOptions,
    ) -> Result<Option<String>, GenerationError> {
        self.calls.lock().unwrap().push(prompts.clone());
        match &self.reply {
            Reply::Content(content) => Ok(Some(content.clone())),
            Reply::Delayed(content) => {
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                Ok(Some(content.clone()))
            }
            Reply::Nothing => Ok(None),
            Reply::Down => Err(GenerationError::GenerationUnavailable("connection refused".into())),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn good_reply() -> String {
    json!({
        "nodes": [
            { "id": "a", "name": "Webhook", "type": "n8n-nodes-base.webhook", "typeVersion": 1,
              "position": [0, 0], "parameters": { "path": "issues" } },
            { "id": "b", "name": "Slack", "type": "n8n-nodes-base.slack", "typeVersion": 2,
              "position": [200, 0], "parameters": {} }
        ],
        "connections": {
            "a": { "main": [[{ "node": "b", "type": "main", "index": 0 }]] }
        },
        "settings": { "executionOrder": "v1" }
    })
    .to_string()
}

async fn make_state(reply: Reply) -> (AppState, Arc<StubProvider>) {
    let (state, provider, _) = make_state_with_pool(reply).await;
    (state, provider)
}

async fn make_state_with_pool(reply: Reply) -> (AppState, Arc<StubProvider>, SqlitePool) {
    let provider = Arc::new(StubProvider { reply, calls: Mutex::new(Vec::new()) });
    let options = CompletionOptions { model: "stub".into(), temperature: 0.7, max_tokens: 4000 };
    let generator = Arc::new(WorkflowGenerator::new(provider.clone(), options));
    let pool = connect_in_memory().await.unwrap();
    let state = build_state(pool.clone(), generator).await.unwrap();
    (state, provider, pool)
}

async fn add_user(state: &AppState, id: &str, plan: &str) {
    let res = send(state, "PUT", &format!("/api/users/{id}"), None, Some(json!({ "plan": plan }))).await;
    assert_eq!(res.0, StatusCode::OK);
}

/// Send one request through a fresh router; returns status, headers, raw body
async fn send_raw(
    state: &AppState,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<String>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let res = build_router(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(state, method, uri, user, body.map(|b| b.to_string())).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn generate(state: &AppState, user: &str, description: &str) -> (StatusCode, Value) {
    send(
        state,
        "POST",
        "/api/workflows/generate",
        Some(user),
        Some(json!({ "description": description, "complexity": "simple", "category": "development" })),
    )
    .await
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health() {
    let (state, _) = make_state(Reply::Nothing).await;
    let (status, _, body) = send_raw(&state, "GET", "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_generate_stores_and_backfills() {
    let (state, provider) = make_state(Reply::Content(good_reply())).await;
    add_user(&state, "u1", "free").await;

    let (status, body) = generate(&state, "u1", "notify slack about new github issues").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let n8n = &body["data"]["n8nJson"];
    assert_eq!(n8n["name"], "Notify Slack About New");
    assert_eq!(n8n["active"], false);
    assert!(n8n["id"].as_str().unwrap().starts_with("workflow_"));
    assert_eq!(n8n["settings"]["executionOrder"], "v1");
    assert_eq!(body["data"]["workflow"]["title"], "Notify Slack About New");
    assert_eq!(body["data"]["workflow"]["nodeCount"], 2);

    let prompts = provider.calls.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].user.contains("Complexity: simple"));
    assert!(prompts[0].user.contains("Category: development"));

    let (status, usage) = send(&state, "GET", "/api/users/u1/usage", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage["data"]["workflowsThisMonth"], 1);
    assert_eq!(usage["data"]["remainingThisMonth"], 2);
    let activity = usage["data"]["recentActivity"].as_array().unwrap();
    assert_eq!(activity[0]["action"], "workflow_generated");
    assert_eq!(activity[0]["metadata"]["nodeCount"], 2);
}

#[tokio::test]
async fn test_generate_requires_identity_and_description() {
    let (state, provider) = make_state(Reply::Content(good_reply())).await;
    add_user(&state, "u1", "free").await;

    let (status, body) = send(
        &state,
        "POST",
        "/api/workflows/generate",
        None,
        Some(json!({ "description": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");

    let (status, body) = generate(&state, "u1", "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Workflow description is required");

    let (status, _, _) = send_raw(
        &state,
        "POST",
        "/api/workflows/generate",
        Some("u1"),
        Some("{not json".to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(provider.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_unknown_user() {
    let (state, _) = make_state(Reply::Content(good_reply())).await;
    let (status, body) = generate(&state, "ghost", "do something useful").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn test_free_plan_quota() {
    let (state, provider) = make_state(Reply::Content(good_reply())).await;
    add_user(&state, "u1", "free").await;

    for _ in 0..3 {
        let (status, _) = generate(&state, "u1", "sync sheets").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = generate(&state, "u1", "sync sheets").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Monthly workflow limit reached. Please upgrade your plan.");
    assert_eq!(provider.calls.lock().unwrap().len(), 3);

    add_user(&state, "u1", "business").await;
    let (status, _) = generate(&state, "u1", "sync sheets").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_free_plan_quota_holds_under_concurrency() {
    let (state, _) = make_state(Reply::Delayed(good_reply())).await;
    add_user(&state, "u1", "free").await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..8 {
        let state = state.clone();
        tasks.spawn(async move { generate(&state, "u1", &format!("sync sheets {i}")).await });
    }

    let mut ok = 0;
    let mut forbidden = 0;
    while let Some(joined) = tasks.join_next().await {
        let (status, body) = joined.unwrap();
        match status {
            StatusCode::OK => ok += 1,
            StatusCode::FORBIDDEN => {
                assert_eq!(body["error"], "Monthly workflow limit reached. Please upgrade your plan.");
                forbidden += 1;
            }
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(ok, 3);
    assert_eq!(forbidden, 5);

    let (_, listed) = send(&state, "GET", "/api/workflows", Some("u1"), None).await;
    assert_eq!(listed["data"]["workflows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_generate_survives_usage_log_failure() {
    let (state, _, pool) = make_state_with_pool(Reply::Content(good_reply())).await;
    add_user(&state, "u1", "free").await;
    sqlx::query("DROP TABLE usage_logs").execute(&pool).await.unwrap();

    let (status, body) = generate(&state, "u1", "sync sheets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, listed) = send(&state, "GET", "/api/workflows", Some("u1"), None).await;
    assert_eq!(listed["data"]["workflows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_model_output_is_rejected_and_logged() {
    let dangling = json!({
        "nodes": [{ "id": "a", "name": "A", "type": "t", "typeVersion": 1,
                    "position": [0, 0], "parameters": {} }],
        "connections": { "a": { "main": [[{ "node": "missing", "type": "main", "index": 0 }]] } }
    })
    .to_string();
    let (state, _) = make_state(Reply::Content(dangling)).await;
    add_user(&state, "u1", "pro").await;

    let (status, body) = generate(&state, "u1", "broken graph please").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);

    let (_, listed) = send(&state, "GET", "/api/workflows", Some("u1"), None).await;
    assert!(listed["data"]["workflows"].as_array().unwrap().is_empty());

    let (_, usage) = send(&state, "GET", "/api/users/u1/usage", None, None).await;
    let entry = &usage["data"]["recentActivity"][0];
    assert_eq!(entry["metadata"]["errorKind"], "validation_failed");
    assert!(entry["workflowId"].is_null());
}

#[tokio::test]
async fn test_provider_failures_map_to_statuses() {
    let (state, _) = make_state(Reply::Nothing).await;
    add_user(&state, "u1", "pro").await;
    let (status, _) = generate(&state, "u1", "anything").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (state, _) = make_state(Reply::Content("definitely not json".into())).await;
    add_user(&state, "u1", "pro").await;
    let (status, _) = generate(&state, "u1", "anything").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (state, _) = make_state(Reply::Down).await;
    add_user(&state, "u1", "pro").await;
    let (status, body) = generate(&state, "u1", "anything").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

// ---------------------------------------------------------------------------
// Stored workflows
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_get_and_download_are_owner_scoped() {
    let (state, _) = make_state(Reply::Content(good_reply())).await;
    add_user(&state, "u1", "pro").await;
    add_user(&state, "u2", "pro").await;

    let (_, body) = generate(&state, "u1", "notify slack about new github issues").await;
    let id = body["data"]["workflow"]["id"].as_str().unwrap().to_string();

    let (status, listed) = send(&state, "GET", "/api/workflows", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"]["workflows"][0]["id"], id.as_str());

    let (_, other) = send(&state, "GET", "/api/workflows", Some("u2"), None).await;
    assert!(other["data"]["workflows"].as_array().unwrap().is_empty());

    let (status, fetched) = send(&state, "GET", &format!("/api/workflows/{id}"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["n8nJson"]["nodes"][1]["name"], "Slack");

    let (status, _) = send(&state, "GET", &format!("/api/workflows/{id}"), Some("u2"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, headers, bytes) =
        send_raw(&state, "GET", &format!("/api/workflows/{id}/download"), Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"notify_slack_about_new.json\"; filename*=UTF-8''notify_slack_about_new.json"
    );
    let downloaded: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(downloaded, body["data"]["n8nJson"]);
    assert!(downloaded.get("success").is_none());
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_template_search() {
    let (state, _) = make_state(Reply::Nothing).await;

    let (status, body) = send(&state, "GET", "/api/templates", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["templates"].as_array().unwrap().len(), 6);

    let (_, body) = send(&state, "GET", "/api/templates?search=Slack&category=all", None, None).await;
    let found = body["data"]["templates"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["category"], "development");
    assert_eq!(found[0]["isPremium"], false);

    let (_, body) = send(&state, "GET", "/api/templates?category=social-media", None, None).await;
    assert_eq!(body["data"]["templates"][0]["id"], "5");

    let (status, _) = send(&state, "GET", "/api/templates?category=astrology", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_template_download_respects_plan() {
    let (state, _) = make_state(Reply::Nothing).await;
    add_user(&state, "free-user", "free").await;
    add_user(&state, "pro-user", "pro").await;

    let (status, headers, bytes) =
        send_raw(&state, "GET", "/api/templates/1/download", Some("free-user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"slack_notification_for_github_issues.json\"; filename*=UTF-8''slack_notification_for_github_issues.json"
    );
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["nodes"].as_array().unwrap().len(), 4);
    assert!(flowsmith::validate(&doc));

    let (status, _) = send(&state, "GET", "/api/templates/2/download", Some("free-user"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send_raw(&state, "GET", "/api/templates/2/download", Some("pro-user"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&state, "GET", "/api/templates/99/download", Some("pro-user"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(state.templates.get("1").unwrap().usage_count, 246);
}
