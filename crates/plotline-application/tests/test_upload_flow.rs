use async_trait::async_trait;
use plotline_application::pipeline_runner::{PipelineRunner, RunObserver};
use plotline_application::{AccessGuard, SessionUseCase, UploadUseCase};
use plotline_core::dashboard::{Panel, PanelKind};
use plotline_core::pipeline::{
    DashboardPayload, IngestionSummary, PipelineResult, PipelineService, StageEvent,
    StageEventReceiver, StreamItem, UploadRequest,
};
use plotline_core::retry::RetryPolicy;
use plotline_core::session::{Message, MessageDurability, SessionService};
use plotline_core::state::{keys, StateStore};
use plotline_infrastructure::{GrantStore, TomlStateStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

// Session backend that records what reaches it
#[derive(Default)]
struct RecordingBackend {
    create_count: Mutex<u32>,
    appended: Mutex<Vec<Message>>,
}

impl RecordingBackend {
    fn create_count(&self) -> u32 {
        *self.create_count.lock().unwrap()
    }

    fn appended_contents(&self) -> Vec<String> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| m.content.clone())
            .collect()
    }
}

#[async_trait]
impl SessionService for RecordingBackend {
    async fn create_session(&self, _owner_id: &str) -> anyhow::Result<String> {
        let mut count = self.create_count.lock().unwrap();
        *count += 1;
        Ok(format!("session-{}", count))
    }

    async fn fetch_messages(&self, _session_id: &str) -> anyhow::Result<Vec<Message>> {
        Ok(Vec::new())
    }

    async fn append_message(&self, _session_id: &str, message: &Message) -> anyhow::Result<()> {
        self.appended.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn update_title(&self, _session_id: &str, _title: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

// Pipeline that plays back a fixed script
struct ScriptedPipeline {
    items: Mutex<Vec<StreamItem>>,
}

impl ScriptedPipeline {
    fn new(items: Vec<StreamItem>) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(items),
        })
    }
}

#[async_trait]
impl PipelineService for ScriptedPipeline {
    async fn submit(&self, _request: &UploadRequest) -> anyhow::Result<String> {
        Ok("pipe-1".to_string())
    }

    async fn open_stream(&self, _id: &str) -> anyhow::Result<StageEventReceiver> {
        let (tx, rx) = mpsc::channel(8);
        let items: Vec<StreamItem> = self.items.lock().unwrap().drain(..).collect();
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

#[derive(Default)]
struct RecordingObserver {
    labels: Mutex<Vec<String>>,
    charts: Mutex<Vec<String>>,
}

impl RunObserver for RecordingObserver {
    fn on_stage(&self, _stage: &str, label: &str) {
        self.labels.lock().unwrap().push(label.to_string());
    }

    fn on_chart(&self, panel: &Panel) {
        self.charts.lock().unwrap().push(panel.id.clone());
    }
}

fn event(stage: &str) -> StreamItem {
    StreamItem::Event(StageEvent::stage_only(stage))
}

fn chart_event(id: &str, kind: PanelKind, title: &str) -> StreamItem {
    let mut event = StageEvent::stage_only("chart_ready");
    event.chart = Some(Panel::new(id, kind, title));
    StreamItem::Event(event)
}

fn completion(charts: Vec<Panel>) -> StreamItem {
    StreamItem::Event(StageEvent {
        stage: "pipeline_complete".to_string(),
        chart: None,
        result: Some(PipelineResult {
            ingestion: IngestionSummary {
                dataset_id: "d-42".to_string(),
                dataset_name: "sales.csv".to_string(),
                row_count: 512,
            },
            dashboard: Some(DashboardPayload {
                title: "Sales overview".to_string(),
                charts,
            }),
        }),
        message: None,
    })
}

fn policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(5))
}

async fn wait_for_appends(backend: &RecordingBackend, expected: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    loop {
        if backend.appended.lock().unwrap().len() >= expected {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Backend never received {} messages",
            expected
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_upload_reports_progress_and_delivers_a_dashboard() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(TomlStateStore::with_path(temp_dir.path().join("state.toml")));
    let backend = Arc::new(RecordingBackend::default());

    let sessions = Arc::new(SessionUseCase::new(backend.clone(), store.clone(), policy()));
    sessions
        .resume_or_create("owner-1")
        .await
        .expect("Should open a session");
    sessions
        .append_message(Message::user("analyze this file"), MessageDurability::Durable)
        .await
        .expect("Should append the user message");

    let pipeline = ScriptedPipeline::new(vec![
        event("upload_received"),
        event("reading_csv"),
        chart_event("c-preview", PanelKind::Line, "Preview"),
        completion(vec![
            Panel::new("k1", PanelKind::Kpi, "Total revenue"),
            Panel::new("k2", PanelKind::Kpi, "Rows"),
            Panel::new("b1", PanelKind::Bar, "Revenue by region"),
            Panel::new("p1", PanelKind::Pie, "Share by product"),
            Panel::new("t1", PanelKind::Table, "Top customers"),
        ]),
    ]);
    let runner = PipelineRunner::new(pipeline);
    let uploads = UploadUseCase::new(runner, sessions.clone(), store.clone());

    let observer = RecordingObserver::default();
    let message = uploads
        .handle_upload(
            &UploadRequest::new("sales.csv", b"region,revenue\n".to_vec()),
            &observer,
        )
        .await
        .expect("Should settle the upload");

    // progress surfaced in order with display labels
    let labels = observer.labels.lock().unwrap().clone();
    assert_eq!(
        labels,
        vec!["Upload received", "Reading your data", "Building charts"]
    );
    // the mid-run chart fragment reached the observer
    assert_eq!(
        observer.charts.lock().unwrap().as_slice(),
        &["c-preview".to_string()]
    );

    // the summary carries the arranged dashboard
    assert!(message.show_dashboard_button, "Should offer the dashboard");
    let payload = message.metadata.dashboard().expect("Should carry a dashboard");
    let charts = payload["charts"].as_array().expect("Should hold a chart list");
    assert_eq!(charts.len(), 5);

    // KPIs pinned on the top row
    assert_eq!(
        charts[0]["gridLayout"],
        serde_json::json!({"x": 0, "y": 0, "w": 3, "h": 1})
    );
    assert_eq!(
        charts[1]["gridLayout"],
        serde_json::json!({"x": 3, "y": 0, "w": 3, "h": 1})
    );
    // three visuals, so the first anchors the page at double width
    assert_eq!(
        charts[2]["gridLayout"],
        serde_json::json!({"x": 0, "y": 1, "w": 8, "h": 2})
    );
    assert_eq!(
        charts[3]["gridLayout"],
        serde_json::json!({"x": 8, "y": 1, "w": 4, "h": 2})
    );
    // the table does not fit the remainder and wraps to a new band
    assert_eq!(
        charts[4]["gridLayout"],
        serde_json::json!({"x": 0, "y": 3, "w": 6, "h": 2})
    );

    // the dataset identity went through the on-disk store
    let cached = store
        .get(keys::DATASET_ID)
        .await
        .expect("Should read the cache")
        .expect("Should hold the dataset id");
    assert_eq!(cached, serde_json::json!("d-42"));

    // both durable messages reach the backend in the background
    wait_for_appends(&backend, 2).await;
    let contents = backend.appended_contents();
    assert!(contents.iter().any(|c| c.contains("analyze this file")));
    assert!(contents.iter().any(|c| c.contains("dashboard is ready")));
}

#[tokio::test]
async fn test_failed_run_leaves_one_transient_notice() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(TomlStateStore::with_path(temp_dir.path().join("state.toml")));
    let backend = Arc::new(RecordingBackend::default());

    let sessions = Arc::new(SessionUseCase::new(backend.clone(), store.clone(), policy()));
    sessions
        .resume_or_create("owner-1")
        .await
        .expect("Should open a session");
    sessions
        .append_message(Message::user("analyze this file"), MessageDurability::Durable)
        .await
        .expect("Should append the user message");

    let mut error_event = StageEvent::stage_only("error");
    error_event.message = Some("header row is missing".to_string());
    let pipeline = ScriptedPipeline::new(vec![event("upload_received"), StreamItem::Event(error_event)]);
    let uploads = UploadUseCase::new(PipelineRunner::new(pipeline), sessions.clone(), store);

    let message = uploads
        .handle_upload(
            &UploadRequest::new("sales.csv", b"1,2\n".to_vec()),
            &RecordingObserver::default(),
        )
        .await
        .expect("Should settle the upload");

    let content = message.content.clone().expect("Should explain the failure");
    assert!(content.contains("header row is missing"));
    assert!(!message.show_dashboard_button);

    // the transcript holds user message and notice, the backend only
    // ever receives the durable user message
    let snapshot = sessions.snapshot().await.expect("Should have a session");
    assert_eq!(snapshot.messages.len(), 2);
    wait_for_appends(&backend, 1).await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(backend.appended_contents(), vec!["analyze this file"]);
}

#[tokio::test]
async fn test_session_survives_a_client_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.toml");
    let backend = Arc::new(RecordingBackend::default());

    let first = SessionUseCase::new(
        backend.clone(),
        Arc::new(TomlStateStore::with_path(path.clone())),
        policy(),
    );
    let original = first
        .resume_or_create("owner-1")
        .await
        .expect("Should create a session");

    // a fresh stack over the same state file picks the session back up
    let second = SessionUseCase::new(
        backend.clone(),
        Arc::new(TomlStateStore::with_path(path)),
        policy(),
    );
    let resumed = second
        .resume_or_create("owner-1")
        .await
        .expect("Should resume the session");

    assert_eq!(resumed, original);
    assert_eq!(backend.create_count(), 1, "Should not create a second session");
}

#[tokio::test]
async fn test_grant_survives_restart_until_sign_out() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("state.toml");

    let guard = AccessGuard::new(Arc::new(GrantStore::new(Arc::new(
        TomlStateStore::with_path(path.clone()),
    ))));
    guard
        .sign_in("user@example.com")
        .await
        .expect("Should record the grant");

    // the grant outlives the process that issued it
    let rebuilt = AccessGuard::new(Arc::new(GrantStore::new(Arc::new(
        TomlStateStore::with_path(path.clone()),
    ))));
    let grant = rebuilt
        .ensure_valid()
        .await
        .expect("Should still be signed in");
    assert_eq!(grant.subject, "user@example.com");

    rebuilt.sign_out().await.expect("Should clear the grant");

    // but sign-out is just as durable
    let after = AccessGuard::new(Arc::new(GrantStore::new(Arc::new(
        TomlStateStore::with_path(path),
    ))));
    assert!(after.ensure_valid().await.is_err());
}
