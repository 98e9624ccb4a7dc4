//! End-to-end tests over HTTP against a supervised backend.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::{Value, json};
use taskboard_backend::supervisor::Phase;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

use common::RunningBackend;

/// Test the full task lifecycle through the public API.
#[tokio::test]
async fn test_task_crud_over_http() -> Result<()> {
    let backend = RunningBackend::start("sqlite::memory:").await?;

    let created: Value = backend
        .client
        .post(backend.url("/api/v1/tasks"))
        .json(&json!({ "title": "Write docs", "priority": "low" }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let id = created["data"]["_id"].as_str().unwrap_or_default().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["data"]["status"], "todo");

    let updated = backend
        .client
        .put(backend.url(&format!("/api/v1/tasks/{id}")))
        .json(&json!({ "status": "in-progress" }))
        .send()
        .await?;
    assert_eq!(updated.status(), 200);
    let updated: Value = updated.json().await?;
    assert_eq!(updated["data"]["status"], "in-progress");
    assert_eq!(updated["data"]["priority"], "low");

    let list: Value = backend
        .client
        .get(backend.url("/api/v1/tasks"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list["count"], 1);

    let deleted = backend
        .client
        .delete(backend.url(&format!("/api/v1/tasks/{id}")))
        .send()
        .await?;
    assert_eq!(deleted.status(), 200);

    let missing = backend
        .client
        .get(backend.url(&format!("/api/v1/tasks/{id}")))
        .send()
        .await?;
    assert_eq!(missing.status(), 404);

    assert_eq!(backend.shutdown().await?, Phase::Stopped);
    Ok(())
}

/// Test that probes report a live connection while serving.
#[tokio::test]
async fn test_probes_while_serving() -> Result<()> {
    let backend = RunningBackend::start("sqlite::memory:").await?;

    let health = backend.client.get(backend.url("/health")).send().await?;
    assert_eq!(health.status(), 200);
    let health: Value = health.json().await?;
    assert_eq!(health["environment"], "integration");
    assert_eq!(health["database"], "connected");

    let ready = backend.client.get(backend.url("/ready")).send().await?;
    assert_eq!(ready.status(), 200);

    assert!(matches!(backend.phase(), Phase::Serving { .. }));
    backend.shutdown().await?;
    Ok(())
}

/// Test that tasks survive a restart against a file database.
#[tokio::test]
async fn test_tasks_persist_across_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("tasks.db").display());

    let first = RunningBackend::start(&url).await?;
    let status = first
        .client
        .post(first.url("/api/v1/tasks"))
        .json(&json!({ "title": "Survive restart" }))
        .send()
        .await?
        .status();
    assert_eq!(status, 201);
    assert_eq!(first.shutdown().await?, Phase::Stopped);

    let second = RunningBackend::start(&url).await?;
    let list: Value = second
        .client
        .get(second.url("/api/v1/tasks"))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(list["count"], 1);
    assert_eq!(list["data"][0]["title"], "Survive restart");
    second.shutdown().await?;
    Ok(())
}

/// Test that an unreachable database never produces a listener.
#[tokio::test]
async fn test_startup_fails_without_database() -> Result<()> {
    let result =
        RunningBackend::start("sqlite:///taskboard-missing-dir/nested/tasks.db").await;
    assert!(result.is_err());
    Ok(())
}

const DRAIN_BODY: &str = r#"{"title":"Finished during drain"}"#;

/// Sends the head of a task POST and withholds the body, leaving the
/// request in flight until [`finish_request`] is called.
async fn begin_request(addr: SocketAddr) -> Result<TcpStream> {
    let mut stream = TcpStream::connect(addr).await?;
    let head = format!(
        "POST /api/v1/tasks HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        DRAIN_BODY.len()
    );
    stream.write_all(head.as_bytes()).await?;
    // Let the server read the head and enter the handler.
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(stream)
}

/// Sends the withheld body and returns whatever the server answers before
/// closing the connection. Write or read failures yield an empty response.
async fn finish_request(mut stream: TcpStream) -> String {
    if stream.write_all(DRAIN_BODY.as_bytes()).await.is_err() {
        return String::new();
    }
    let mut response = Vec::new();
    match tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await {
        Ok(Ok(_)) => String::from_utf8_lossy(&response).into_owned(),
        _ => String::new(),
    }
}

/// Test that shutdown waits for an in-flight request before stopping.
#[tokio::test]
async fn test_in_flight_request_completes_during_drain() -> Result<()> {
    let mut backend =
        RunningBackend::start_with("sqlite::memory:", &[("TASKBOARD_SERVER__DRAIN_TIMEOUT_SECS", "10")])
            .await?;
    let stream = begin_request(backend.addr).await?;

    backend.request_shutdown();
    backend
        .wait_for_phase(Duration::from_secs(2), |p| *p == Phase::Draining)
        .await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.phase(), Phase::Draining);

    let response = finish_request(stream).await;
    assert!(response.starts_with("HTTP/1.1 201"), "unexpected response: {response}");
    assert!(response.contains("Finished during drain"));

    let phase = backend
        .wait_for_phase(Duration::from_secs(5), |p| *p == Phase::Stopped)
        .await?;
    assert_eq!(phase, Phase::Stopped);
    assert_eq!(backend.shutdown().await?, Phase::Stopped);
    Ok(())
}

/// Test that an in-flight request cannot hold shutdown past the drain timeout.
#[tokio::test]
async fn test_drain_timeout_bounds_shutdown() -> Result<()> {
    let mut backend =
        RunningBackend::start_with("sqlite::memory:", &[("TASKBOARD_SERVER__DRAIN_TIMEOUT_SECS", "1")])
            .await?;
    let stream = begin_request(backend.addr).await?;

    let requested = Instant::now();
    backend.request_shutdown();
    backend
        .wait_for_phase(Duration::from_secs(5), |p| *p == Phase::Stopped)
        .await?;
    let waited = requested.elapsed();

    assert!(waited >= Duration::from_millis(900), "stopped after {waited:?}");
    assert!(waited < Duration::from_secs(5), "stopped after {waited:?}");

    let response = finish_request(stream).await;
    assert!(!response.starts_with("HTTP/1.1 201"), "late request succeeded: {response}");
    assert_eq!(backend.shutdown().await?, Phase::Stopped);
    Ok(())
}

/// Test that reported uptime includes time spent retrying the connection.
#[tokio::test]
async fn test_uptime_includes_connect_retries() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let nested = dir.path().join("nested");
    let url = format!("sqlite://{}?mode=rwc", nested.join("tasks.db").display());

    let create_later = nested.clone();
    let creator = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        tokio::fs::create_dir_all(create_later).await
    });

    let backend = RunningBackend::start_with(
        &url,
        &[
            ("TASKBOARD_DATABASE__MAX_ATTEMPTS", "5"),
            ("TASKBOARD_DATABASE__RETRY_DELAY_SECS", "1"),
        ],
    )
    .await?;
    creator.await??;

    let health: Value = backend
        .client
        .get(backend.url("/health"))
        .send()
        .await?
        .json()
        .await?;
    assert!(
        health["uptime"].as_f64().is_some_and(|uptime| uptime >= 1.0),
        "uptime was {}",
        health["uptime"]
    );

    backend.shutdown().await?;
    Ok(())
}
