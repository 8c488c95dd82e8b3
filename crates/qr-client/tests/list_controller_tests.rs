//! List controller ordering, debounce and pagination tests
//!
//! A channel-backed executor hands every request to the test, which decides
//! when and with what each one completes.

use async_trait::async_trait;
use parking_lot::Mutex;
use qr_client::list::{FetchOutcome, ListRenderer, ListView};
use qr_client::{
    ApiResponse, Error, ErrorKind, ListViewController, RequestDescriptor, RequestExecutor, Result,
    UsersAdapter,
};
use qr_common::User;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

struct PendingRequest {
    request: RequestDescriptor,
    reply: oneshot::Sender<Result<ApiResponse>>,
}

impl PendingRequest {
    fn param(&self, name: &str) -> Option<&str> {
        self.request
            .query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn respond(self, response: Result<ApiResponse>) {
        let _ = self.reply.send(response);
    }
}

struct ChannelExecutor {
    requests: mpsc::UnboundedSender<PendingRequest>,
}

#[async_trait]
impl RequestExecutor for ChannelExecutor {
    async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(PendingRequest {
                request: request.clone(),
                reply,
            })
            .expect("test dropped the request receiver");
        response.await.expect("test dropped a pending request")
    }
}

/// Answers every list request at once and records the status filter sent
#[derive(Default)]
struct CountingExecutor {
    calls: AtomicUsize,
    statuses: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl RequestExecutor for CountingExecutor {
    async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let status = request
            .query
            .iter()
            .find(|(key, _)| key == "status")
            .map(|(_, value)| value.clone());
        self.statuses.lock().push(status);
        users(&["u-1"], 1)
    }
}

#[derive(Default)]
struct RecordingRenderer {
    views: Mutex<Vec<ListView<User>>>,
    errors: Mutex<Vec<(String, ErrorKind)>>,
}

impl ListRenderer<User> for RecordingRenderer {
    fn render(&self, view: &ListView<User>) {
        self.views.lock().push(view.clone());
    }

    fn show_error(&self, context: &str, error: &Error) {
        self.errors.lock().push((context.to_string(), error.kind()));
    }
}

struct Harness {
    controller: ListViewController<UsersAdapter>,
    renderer: Arc<RecordingRenderer>,
    requests: mpsc::UnboundedReceiver<PendingRequest>,
}

impl Harness {
    fn new() -> Self {
        let (sender, requests) = mpsc::unbounded_channel();
        let renderer = Arc::new(RecordingRenderer::default());
        let controller = ListViewController::new(
            UsersAdapter,
            Arc::new(ChannelExecutor { requests: sender }),
            renderer.clone(),
        );
        Self {
            controller,
            renderer,
            requests,
        }
    }

    async fn next_request(&mut self) -> PendingRequest {
        self.requests.recv().await.expect("a request was issued")
    }

    fn assert_no_request(&mut self) {
        assert!(self.requests.try_recv().is_err(), "unexpected request");
    }

    fn spawn_fetch(&self) -> JoinHandle<FetchOutcome> {
        let controller = self.controller.clone();
        tokio::spawn(async move { controller.fetch().await })
    }

    fn spawn_set_page(&self, page: u32) -> JoinHandle<Result<FetchOutcome>> {
        let controller = self.controller.clone();
        tokio::spawn(async move { controller.set_page(page).await })
    }
}

fn users(ids: &[&str], total: u64) -> Result<ApiResponse> {
    let users: Vec<_> = ids
        .iter()
        .map(|id| json!({"id": id, "email": format!("{}@example.com", id)}))
        .collect();
    Ok(ApiResponse::json(
        200,
        json!({"users": users, "pagination": {"total": total}}),
    ))
}

fn item_ids(view: &ListView<User>) -> Vec<&str> {
    view.items.iter().map(|user| user.id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_last_issued_fetch_wins() {
    let mut harness = Harness::new();

    let first = harness.spawn_fetch();
    let first_request = harness.next_request().await;
    let second = harness.spawn_fetch();
    let second_request = harness.next_request().await;

    second_request.respond(users(&["new"], 1));
    assert_eq!(second.await.unwrap(), FetchOutcome::Applied);

    // The older response arrives last and must not overwrite newer state
    first_request.respond(users(&["old"], 1));
    assert_eq!(first.await.unwrap(), FetchOutcome::Superseded);

    assert_eq!(item_ids(&harness.controller.snapshot()), vec!["new"]);
    let views = harness.renderer.views.lock();
    assert_eq!(views.len(), 1);
    assert_eq!(item_ids(&views[0]), vec!["new"]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_error_is_not_shown() {
    let mut harness = Harness::new();

    let first = harness.spawn_fetch();
    let first_request = harness.next_request().await;
    let second = harness.spawn_fetch();
    let second_request = harness.next_request().await;

    first_request.respond(Err(Error::Server {
        status: 500,
        message: "boom".into(),
    }));
    assert_eq!(first.await.unwrap(), FetchOutcome::Superseded);
    assert!(harness.renderer.errors.lock().is_empty());

    second_request.respond(users(&["u-1"], 1));
    assert_eq!(second.await.unwrap(), FetchOutcome::Applied);
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_resets_page() {
    let mut harness = Harness::new();

    let task = harness.spawn_set_page(3);
    let request = harness.next_request().await;
    assert_eq!(request.param("page"), Some("3"));
    request.respond(users(&["u-21"], 30));
    assert_eq!(task.await.unwrap().unwrap(), FetchOutcome::Applied);

    harness.controller.set_filter("search", "acme").unwrap();
    assert_eq!(harness.controller.query().page(), 1);

    let request = harness.next_request().await;
    assert_eq!(request.param("page"), Some("1"));
    assert_eq!(request.param("search"), Some("acme"));
}

#[tokio::test(start_paused = true)]
async fn test_discrete_changes_coalesce_into_one_call() {
    let mut harness = Harness::new();

    harness.controller.set_filter("status", "in_progress").unwrap();
    harness.controller.set_filter("status", "completed").unwrap();

    let request = harness.next_request().await;
    assert_eq!(request.param("status"), Some("completed"));
    assert_eq!(request.param("page"), Some("1"));
    request.respond(users(&["u-1"], 1));

    tokio::time::sleep(Duration::from_secs(1)).await;
    harness.assert_no_request();
    assert_eq!(harness.renderer.views.lock().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_discrete_changes_coalesce_on_multi_thread_runtime() {
    let runs = (0..100).map(|_| {
        tokio::spawn(async {
            let executor = Arc::new(CountingExecutor::default());
            let controller = ListViewController::new(
                UsersAdapter,
                executor.clone(),
                Arc::new(RecordingRenderer::default()),
            );

            controller.set_filter("status", "in_progress").unwrap();
            controller.set_filter("status", "completed").unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;

            let statuses = executor.statuses.lock().clone();
            (executor.calls.load(Ordering::SeqCst), statuses)
        })
    });

    for run in futures::future::join_all(runs).await {
        let (calls, statuses) = run.unwrap();
        assert_eq!(calls, 1);
        assert_eq!(statuses, vec![Some("completed".to_string())]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_text_filter_waits_for_typing_pause() {
    let mut harness = Harness::new();

    for prefix in ["a", "ac", "acm", "acme"] {
        harness.controller.set_filter("search", prefix).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        harness.assert_no_request();
    }
    assert!(harness.controller.has_pending_fetch());

    tokio::time::sleep(Duration::from_millis(250)).await;
    let request = harness.next_request().await;
    assert_eq!(request.param("search"), Some("acme"));
    request.respond(users(&[], 0));

    tokio::time::sleep(Duration::from_secs(1)).await;
    harness.assert_no_request();
}

#[tokio::test(start_paused = true)]
async fn test_page_change_supersedes_pending_filter_fetch() {
    let mut harness = Harness::new();

    harness.controller.set_filter("search", "acme").unwrap();
    let task = harness.spawn_set_page(2);

    let request = harness.next_request().await;
    assert_eq!(request.param("search"), Some("acme"));
    assert_eq!(request.param("page"), Some("2"));
    request.respond(users(&["u-11"], 12));
    assert_eq!(task.await.unwrap().unwrap(), FetchOutcome::Applied);

    tokio::time::sleep(Duration::from_secs(1)).await;
    harness.assert_no_request();
}

#[tokio::test(start_paused = true)]
async fn test_page_beyond_last_is_clamped_and_refetched() {
    let mut harness = Harness::new();

    let task = harness.spawn_set_page(5);
    let request = harness.next_request().await;
    assert_eq!(request.param("page"), Some("5"));
    request.respond(users(&[], 12));

    let request = harness.next_request().await;
    assert_eq!(request.param("page"), Some("2"));
    request.respond(users(&["u-11", "u-12"], 12));

    assert_eq!(task.await.unwrap().unwrap(), FetchOutcome::Applied);
    let view = harness.controller.snapshot();
    assert_eq!(view.page, 2);
    assert_eq!(view.page_count, 2);
    assert_eq!(item_ids(&view), vec!["u-11", "u-12"]);
    assert_eq!(harness.renderer.views.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_error_keeps_filters_and_page() {
    let mut harness = Harness::new();

    harness.controller.set_filter("industry", "finance").unwrap();
    harness.next_request().await.respond(users(&["u-1"], 25));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let task = harness.spawn_set_page(2);
    harness.next_request().await.respond(Err(Error::Server {
        status: 503,
        message: "Service unavailable".into(),
    }));

    assert_eq!(
        task.await.unwrap().unwrap(),
        FetchOutcome::Failed(ErrorKind::ServerError)
    );
    let query = harness.controller.query();
    assert_eq!(query.page(), 2);
    assert_eq!(query.filter("industry"), Some("finance"));
    assert_eq!(
        *harness.renderer.errors.lock(),
        vec![("users".to_string(), ErrorKind::ServerError)]
    );
    // The last good page stays visible
    assert_eq!(item_ids(&harness.controller.snapshot()), vec!["u-1"]);
    assert!(!harness.controller.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_dispose_cancels_pending_fetch() {
    let mut harness = Harness::new();

    harness.controller.set_filter("search", "acme").unwrap();
    harness.controller.dispose();

    tokio::time::sleep(Duration::from_secs(1)).await;
    harness.assert_no_request();
    assert!(!harness.controller.has_pending_fetch());
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_result_after_dispose_is_dropped() {
    let mut harness = Harness::new();

    let task = harness.spawn_fetch();
    let request = harness.next_request().await;
    harness.controller.dispose();
    request.respond(users(&["u-1"], 1));

    assert_eq!(task.await.unwrap(), FetchOutcome::Superseded);
    assert!(harness.renderer.views.lock().is_empty());
}
