use reqwest::StatusCode;

use super::models::{TaskStatus, User, UsersResponse};
use crate::errors::AdminError;

/// Thin client for the tracker's admin endpoints.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }

    /// `GET /admin/users` — every user with their projects and tasks.
    pub async fn list_users(&self) -> Result<Vec<User>, AdminError> {
        let url = format!("{}/admin/users", self.base_url);
        let resp = self.authorized(self.client.get(&url)).send().await?;
        let resp = check_status(resp).await?;
        let body: UsersResponse = resp.json().await?;
        Ok(body.users)
    }

    /// `PATCH /admin/tasks/{id}?status=...`
    pub async fn set_task_status(
        &self,
        task_id: i64,
        status: TaskStatus,
    ) -> Result<(), AdminError> {
        let url = format!("{}/admin/tasks/{}", self.base_url, task_id);
        let resp = self
            .authorized(self.client.patch(&url))
            .query(&[("status", status.as_str())])
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(AdminError::TaskNotFound { id: task_id });
        }
        check_status(resp).await?;
        Ok(())
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, AdminError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(AdminError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, patch},
    };
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_admin_server() -> String {
        let app = Router::new()
            .route(
                "/admin/users",
                get(|headers: HeaderMap| async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer secret");
                    if !authorized {
                        return (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"detail": "Unauthorized"})),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({"users": [{
                            "id": 1, "tg_id": "100", "name": "Alice", "email": "a@example.com",
                            "projects": [{
                                "id": 10, "title": "Bot", "description": "d",
                                "tasks": [
                                    {"id": 5, "title": "Ship", "order": 0, "status": "done"}
                                ]
                            }]
                        }]})),
                    )
                }),
            )
            .route(
                "/admin/tasks/{id}",
                patch(
                    |Path(id): Path<i64>, Query(q): Query<HashMap<String, String>>| async move {
                        if id != 5 {
                            let body = json!({"detail": "Task not found"});
                            return (StatusCode::NOT_FOUND, Json(body));
                        }
                        if q.get("status").map(String::as_str) != Some("in_progress") {
                            let body = json!({"detail": "bad status"});
                            return (StatusCode::UNPROCESSABLE_ENTITY, Json(body));
                        }
                        (StatusCode::OK, Json(json!({"ok": true})))
                    },
                ),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_list_users_sends_bearer_token() {
        let client = AdminClient::new(spawn_admin_server().await, Some("secret".to_string()));
        let users = client.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].projects[0].tasks[0].status, TaskStatus::Done);
        assert_eq!(users[0].projects[0].completion_percent(), 100);
    }

    #[tokio::test]
    async fn test_list_users_without_token_is_status_error() {
        let client = AdminClient::new(spawn_admin_server().await, None);
        let err = client.list_users().await.unwrap_err();
        match err {
            AdminError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_task_status_sends_query() {
        let client = AdminClient::new(spawn_admin_server().await, Some("secret".to_string()));
        client.set_task_status(5, TaskStatus::InProgress).await.unwrap();
        let err = client.set_task_status(5, TaskStatus::Done).await.unwrap_err();
        assert!(matches!(err, AdminError::Status { status: 422, .. }));
    }

    #[tokio::test]
    async fn test_set_task_status_unknown_task() {
        let client = AdminClient::new(spawn_admin_server().await, None);
        let err = client.set_task_status(99, TaskStatus::Done).await.unwrap_err();
        assert!(matches!(err, AdminError::TaskNotFound { id: 99 }));
    }
}
