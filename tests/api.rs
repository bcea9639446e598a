use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pr_council::config::AppConfig;
use pr_council::error::{AppError, Result};
use pr_council::llm::{CompletionRequest, LlmClient};
use pr_council::platform::types::PullRequestInfo;
use pr_council::platform::Platform;
use pr_council::server::{create_router, AppState};

const SQL_DIFF: &str = "\
--- a/app/users.py
+++ b/app/users.py
@@ -10,2 +10,2 @@
-    cur.execute(\"SELECT * FROM users WHERE id = %s\", (user_id,))
+    cur.execute(f\"SELECT * FROM users WHERE id = {user_id}\")
";

/// Flags injection when prompted as the security agent, otherwise finds nothing.
struct FakeLlm;

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if request.system.contains("security engineer") && request.prompt.contains("SELECT") {
            return Ok(json!({
                "issues": [{
                    "file": "app/users.py",
                    "line": 11,
                    "severity": "critical",
                    "title": "SQL injection",
                    "description": "user_id is interpolated into the query",
                    "suggestion": "Use a parameterized query"
                }],
                "summary": "One injection found."
            })
            .to_string());
        }
        Ok("No issues found.".to_string())
    }

    fn default_model(&self) -> &str {
        "fake-model"
    }
}

#[derive(Default)]
struct FakePlatform {
    missing_pr: bool,
    comments: Mutex<Vec<String>>,
}

#[async_trait]
impl Platform for FakePlatform {
    async fn get_pull_request(&self, owner: &str, repo: &str, pr_number: u64) -> Result<PullRequestInfo> {
        if self.missing_pr {
            return Err(AppError::GitHubApi(format!("{owner}/{repo}#{pr_number}: Not Found")));
        }
        Ok(PullRequestInfo {
            number: pr_number,
            title: "Refactor user lookup".into(),
            body: String::new(),
            author: "octocat".into(),
            state: "open".into(),
            head_sha: "deadbeef".into(),
            head_branch: "refactor".into(),
            base_branch: "main".into(),
            additions: 1,
            deletions: 1,
            changed_files: 1,
            html_url: None,
        })
    }

    async fn fetch_diff(&self, _owner: &str, _repo: &str, _pr_number: u64) -> Result<String> {
        Ok(SQL_DIFF.to_string())
    }

    async fn post_comment(&self, _owner: &str, _repo: &str, _pr_number: u64, body: &str) -> Result<()> {
        self.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }

    async fn get_file_content(&self, _owner: &str, _repo: &str, _path: &str, _git_ref: &str) -> Result<String> {
        Ok((1..=20).map(|n| format!("line {n}")).collect::<Vec<_>>().join("\n"))
    }
}

fn test_config() -> AppConfig {
    serde_json::from_value(json!({
        "github": {"token": "ghp_test"},
        "llm": {"api_key": "sk-test"}
    }))
    .unwrap()
}

fn app(platform: Arc<FakePlatform>) -> axum::Router {
    let state = AppState::from_parts(&test_config(), Arc::new(FakeLlm), platform);
    create_router(Arc::new(state))
}

fn make_request(method: &str, uri: &str, body: Option<Value>) -> axum::http::Request<Body> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    match body {
        Some(b) => builder.body(Body::from(serde_json::to_string(&b).unwrap())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("JSON parse error: {e}. Body: {:?}", String::from_utf8_lossy(&bytes)))
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app(Arc::default())
        .oneshot(make_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "pr-council");
    assert_eq!(body["agents"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_list_agents() {
    let response = app(Arc::default())
        .oneshot(make_request("GET", "/api/agents", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let agents: Vec<&str> = body["agents"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(agents.contains(&"security"));
    assert!(agents.contains(&"test_coverage"));
    assert!(body["descriptions"]["security"].as_str().unwrap().contains("security"));
}

#[tokio::test]
async fn test_review_diff_finds_injection() {
    let response = app(Arc::default())
        .oneshot(make_request("POST", "/api/review/diff", Some(json!({"diff": SQL_DIFF}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["agent_results"].as_object().unwrap().len(), 5);
    assert_eq!(body["total_findings"], 1);
    assert_eq!(body["findings_by_severity"]["critical"], 1);
    assert_eq!(body["recommendation"], "block");
    assert_eq!(body["pr_identifier"]["tag"], "manual");

    let security = &body["agent_results"]["security"];
    assert_eq!(security["status"], "success");
    assert_eq!(security["findings"][0]["category"], "security");
    assert_eq!(security["findings"][0]["file_path"], "app/users.py");
}

#[tokio::test]
async fn test_review_diff_agent_subset() {
    let response = app(Arc::default())
        .oneshot(make_request(
            "POST",
            "/api/review/diff",
            Some(json!({"code_diff": SQL_DIFF, "analysis_types": ["logic", "Readability"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let names: Vec<&String> = body["agent_results"].as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["logic", "readability"]);
    assert_eq!(body["total_findings"], 0);
    assert_eq!(body["recommendation"], "approve");
}

#[tokio::test]
async fn test_empty_diff_has_no_findings() {
    let response = app(Arc::default())
        .oneshot(make_request("POST", "/api/review/diff", Some(json!({"diff": ""}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["total_findings"], 0);
    assert_eq!(body["agent_results"].as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn test_invalid_requests_are_400() {
    let response = app(Arc::default())
        .oneshot(make_request(
            "POST",
            "/api/review/diff",
            Some(json!({"diff": SQL_DIFF, "agents": ["style"]})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "invalid_request");
    assert!(body["message"].as_str().unwrap().contains("style"));

    let response = app(Arc::default())
        .oneshot(make_request("POST", "/api/review/diff", Some(json!({"file_path": "a.rs"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(Arc::default())
        .oneshot(make_request("POST", "/api/review", Some(json!({"pr_url": "123"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("full GitHub PR URL"));
}

#[tokio::test]
async fn test_review_pr_posts_comment() {
    let platform = Arc::new(FakePlatform::default());
    let response = app(platform.clone())
        .oneshot(make_request(
            "POST",
            "/api/review",
            Some(json!({
                "pr_url": "https://github.com/octo/hello/pull/12",
                "post_comments": true
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["pr_identifier"]["kind"], "pull_request");
    assert_eq!(body["pr_identifier"]["number"], 12);
    assert_eq!(body["comment"]["posted"], true);
    assert_eq!(body["code_context"][0]["target_line"], "line 11");

    let comments = platform.comments.lock().unwrap();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("SQL injection"));
}

#[tokio::test]
async fn test_missing_pr_is_502() {
    let platform = Arc::new(FakePlatform {
        missing_pr: true,
        ..Default::default()
    });
    let response = app(platform)
        .oneshot(make_request(
            "POST",
            "/api/review",
            Some(json!({"owner": "octo", "repo": "hello", "pr_number": 404})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = response_json(response).await;
    assert_eq!(body["error"], "github_error");
}
