use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
use axum::routing::post;
use bytes::Bytes;
use task_intake_probe::{Outcome, Probe, ProbeConfig, RestErrorKind, TaskRequest, run};
use tokio::net::TcpListener;
use tokio::time::sleep;

#[derive(Clone, Default)]
struct AppState {
    received: Arc<Mutex<Vec<(Option<String>, Bytes)>>>,
}

impl AppState {
    fn record(&self, headers: &HeaderMap, body: Bytes) {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        self.received
            .lock()
            .expect("received log poisoned")
            .push((content_type, body));
    }
}

async fn probe_run(endpoint: String, timeout: Duration) -> (Outcome, String) {
    let config = ProbeConfig::default()
        .with_endpoint(endpoint)
        .with_timeout(timeout);
    let probe = Probe::new(config);
    let mut out = Vec::new();
    let outcome = run(&probe, &TaskRequest::sample(), &mut out)
        .await
        .expect("writing to a Vec should not fail");
    (outcome, String::from_utf8(out).expect("report should be valid utf-8"))
}

#[tokio::test]
async fn e2e_accepted_task_prints_reply_and_banner() {
    let server = TestServer::start().await;

    let (outcome, text) = probe_run(server.url("/api-endpoint"), Duration::from_secs(10)).await;

    assert!(matches!(outcome, Outcome::Responded(ref reply) if reply.status == 200));
    assert!(text.contains("✅ Status Code: 200"));
    assert!(text.contains("{\n  \"status\": \"accepted\"\n}"));
    assert!(text.contains("Repo name will be: my-test-app-001"));
}

#[tokio::test]
async fn e2e_server_receives_exactly_the_sample_task() {
    let server = TestServer::start().await;

    let _ = probe_run(server.url("/api-endpoint"), Duration::from_secs(10)).await;

    let received = server.state.received.lock().expect("received log poisoned").clone();
    assert_eq!(received.len(), 1);
    let (content_type, body) = &received[0];
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let task: TaskRequest = sonic_rs::from_slice(body).expect("server should decode the task");
    assert_eq!(task, TaskRequest::sample());
}

#[tokio::test]
async fn e2e_rejected_task_prints_reply_without_banner() {
    let server = TestServer::start().await;

    let (outcome, text) = probe_run(server.url("/reject"), Duration::from_secs(10)).await;

    assert!(matches!(outcome, Outcome::Responded(ref reply) if reply.status == 403));
    assert!(text.contains("✅ Status Code: 403"));
    assert!(text.contains("\"detail\": \"Invalid secret\""));
    assert!(!text.contains("SUCCESS"));
}

#[tokio::test]
async fn e2e_html_reply_is_a_generic_failure() {
    let server = TestServer::start().await;

    let (outcome, text) = probe_run(server.url("/html"), Duration::from_secs(10)).await;

    match outcome {
        Outcome::Failed(err) => assert_eq!(err.kind(), RestErrorKind::Parse),
        other => panic!("expected a parse failure, got {other:?}"),
    }
    assert!(text.contains("❌ ERROR: "));
    assert!(!text.contains("Status Code"));
    assert!(!text.contains("SUCCESS"));
}

#[tokio::test]
async fn e2e_no_listener_prints_connection_hint() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let (outcome, text) = probe_run(
        format!("http://{addr}/api-endpoint"),
        Duration::from_secs(10),
    )
    .await;

    assert!(matches!(outcome, Outcome::Unreachable(_)), "{outcome:?}");
    assert!(text.contains("❌ ERROR: Cannot connect to server!"));
    assert!(text.contains("   uvicorn app.main:app --reload"));
    assert!(!text.contains("Status Code"));
}

#[tokio::test]
async fn e2e_unroutable_host_is_reported_as_unreachable() {
    // Either the handshake times out or the route is refused outright; both
    // are connect failures and get the start-server hint.
    let started = Instant::now();
    let (outcome, text) = probe_run(
        "http://10.255.255.1:8000/api-endpoint".to_string(),
        Duration::from_millis(200),
    )
    .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(
        matches!(outcome, Outcome::Unreachable(ref err) if err.kind() == RestErrorKind::Connect),
        "{outcome:?}"
    );
    assert!(text.contains("❌ ERROR: Cannot connect to server!"));
    assert!(text.contains("   uvicorn app.main:app --reload"));
}

#[tokio::test]
async fn e2e_slow_server_times_out_as_generic_failure() {
    let server = TestServer::start().await;

    let started = Instant::now();
    let (outcome, text) = probe_run(server.url("/slow"), Duration::from_millis(200)).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    match outcome {
        Outcome::Failed(err) => assert_eq!(err.kind(), RestErrorKind::Timeout),
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(text.contains("❌ ERROR: "));
    assert!(!text.contains("Cannot connect"));
    assert!(!text.contains("Status Code"));
}

struct TestServer {
    base_url: String,
    state: AppState,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/api-endpoint", post(accept_handler))
            .route("/reject", post(reject_handler))
            .route("/html", post(html_handler))
            .route("/slow", post(slow_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn accept_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    state.record(&headers, body);
    (StatusCode::OK, r#"{"status":"accepted"}"#)
}

async fn reject_handler() -> (StatusCode, &'static str) {
    (StatusCode::FORBIDDEN, r#"{"detail":"Invalid secret"}"#)
}

async fn html_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "<h1>Hello World</h1>")
}

async fn slow_handler() -> (StatusCode, &'static str) {
    sleep(Duration::from_secs(3)).await;
    (StatusCode::OK, r#"{"status":"late"}"#)
}
