use std::collections::HashMap;

use axum::extract::Query;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use secrecy::SecretString;
use taskdesk_agent::tasks::{HttpTaskListClient, TaskFetchError, TaskListClient};
use taskdesk_core::config::AgentConfig;
use taskdesk_core::domain::catalog::Project;

async fn tasks(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> Response {
    let project = params.get("project").cloned().unwrap_or_default();
    match project.as_str() {
        "Hakuna-Matata" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
        "BrandQt" => "not a task list".into_response(),
        _ => {
            let mut names = vec![format!("{project} kickoff"), format!("{project} review")];
            if let Some(auth) = headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()) {
                names.push(auth.to_owned());
            }
            Json(names).into_response()
        }
    }
}

async fn spawn_fixture() -> String {
    let app = Router::new().route("/api/tasks", get(tasks));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind fixture");
    let addr = listener.local_addr().expect("fixture addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn client(base_url: String, token: Option<&str>) -> HttpTaskListClient {
    let config = AgentConfig {
        base_url,
        api_token: token.map(|token| SecretString::from(token.to_owned())),
        timeout_secs: 5,
    };
    HttpTaskListClient::new(&config).expect("client")
}

#[tokio::test]
async fn fetches_task_names_for_project() {
    let base_url = spawn_fixture().await;
    let tasks = client(base_url, None).fetch_tasks(Project::HrQt).await.expect("tasks");
    assert_eq!(tasks, vec!["HRQt kickoff".to_owned(), "HRQt review".to_owned()]);
}

#[tokio::test]
async fn api_token_is_sent_as_bearer() {
    let base_url = spawn_fixture().await;
    let tasks =
        client(base_url, Some("td-token")).fetch_tasks(Project::AccQt).await.expect("tasks");
    assert_eq!(tasks.last().map(String::as_str), Some("Bearer td-token"));
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let base_url = spawn_fixture().await;
    let error =
        client(base_url, None).fetch_tasks(Project::HakunaMatata).await.expect_err("503");
    assert_eq!(error, TaskFetchError::Status { status: 503 });
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let base_url = spawn_fixture().await;
    let error = client(base_url, None).fetch_tasks(Project::BrandQt).await.expect_err("decode");
    assert!(matches!(error, TaskFetchError::Decode(_)));
}

#[tokio::test]
async fn unreachable_service_is_a_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let error = client(format!("http://{addr}"), None)
        .fetch_tasks(Project::AccQt)
        .await
        .expect_err("refused");
    assert!(matches!(error, TaskFetchError::Request(_)));
}
