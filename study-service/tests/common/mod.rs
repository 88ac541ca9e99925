#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use study_service::config::{AssignmentUpdatePolicy, IdentitySource, StudyConfig};
use study_service::services::{InMemoryStore, StudyStore};
use study_service::{build_router, AppState};
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(StudyConfig::local("study_test"))
    }

    pub fn with_update_policy(policy: AssignmentUpdatePolicy) -> Self {
        let mut config = StudyConfig::local("study_test");
        config.assignments.update_policy = policy;
        Self::with_config(config)
    }

    pub fn with_identity_source(source: IdentitySource) -> Self {
        let mut config = StudyConfig::local("study_test");
        config.identity.source = source;
        Self::with_config(config)
    }

    pub fn with_config(config: StudyConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState {
            config,
            store: store.clone() as Arc<dyn StudyStore>,
        };
        TestApp {
            router: build_router(state),
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_as(&self, uri: &str, email: &str) -> TestResponse {
        self.send(
            Request::builder()
                .uri(uri)
                .header("X-User-Email", email)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn json(&self, method: &str, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn json_as(&self, method: &str, uri: &str, body: &Value, email: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .header("X-User-Email", email)
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Creates an assignment and returns its id.
    pub async fn create_assignment(&self, body: &Value) -> String {
        let response = self.json("POST", "/assignments", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body["insertedId"]
            .as_str()
            .expect("insertedId missing")
            .to_string()
    }

    /// Creates a submission and returns its id.
    pub async fn create_submission(&self, body: &Value) -> String {
        let response = self.json("POST", "/submissions", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body["insertedId"]
            .as_str()
            .expect("insertedId missing")
            .to_string()
    }
}

pub fn assignment_body(title: &str, level: &str) -> Value {
    json!({
        "title": title,
        "difficultyLevel": level,
        "dueDate": "2024-09-30",
        "thumbnail": "https://img.example/thumb.png",
        "marks": 50.0,
        "description": format!("{} practice set", title)
    })
}

pub fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|item| item["_id"].as_str().unwrap().to_string())
        .collect()
}
