//! Single-flight sync runs with status and history.
//!
//! The coordinator owns the "run in progress" guard. A trigger either wins the
//! guard and spawns the run on its own tokio task, or is rejected; it is never
//! queued. The run writes its audit row at start and exactly once at the end.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::entity::sync_run::{Model as SyncRunModel, RunKind, RunStatus};
use crate::github::GitHubClient;
use crate::repository::{self, Pagination};
use crate::sync_log::{self, RunResult};

use super::error::SyncError;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::reconcile::reconcile;
use super::types::{ReconcileStats, SyncOptions};

const PHASE_IDLE: &str = "idle";
const PHASE_FETCHING: &str = "fetching starred repositories";
const PHASE_RECONCILING: &str = "reconciling local store";
const PHASE_COMPLETE: &str = "sync complete";
const PHASE_INTERRUPTED: &str = "sync interrupted";

/// Point-in-time view of the coordinator, safe to poll while a run is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Whether a run currently holds the guard.
    pub syncing: bool,
    /// Human-readable phase of the current or last run.
    pub phase: String,
    /// When this process last completed a successful run.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Records synced by that run.
    pub last_sync_count: usize,
    /// Records currently in the local store.
    pub total_repos: u64,
    /// Finish time of the newest succeeded run in the audit log.
    pub last_success_time: Option<DateTime<Utc>>,
    pub last_success_count: Option<i32>,
}

/// Presentation form of a trigger attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerResponse {
    pub accepted: bool,
    pub message: String,
}

impl TriggerResponse {
    pub fn from_result<T>(result: &Result<T, SyncError>) -> Self {
        match result {
            Ok(_) => Self {
                accepted: true,
                message: "sync started".to_string(),
            },
            Err(e) => Self {
                accepted: false,
                message: e.to_string(),
            },
        }
    }
}

/// One page of the run audit log, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct SyncHistoryPage {
    pub records: Vec<SyncRunModel>,
    pub total: u64,
    pub page_count: u64,
    /// 1-based page number actually served.
    pub current_page: u64,
}

/// Handle to a spawned run.
///
/// Dropping it detaches the run; awaiting [`RunHandle::wait`] yields the
/// finished audit row.
#[derive(Debug)]
pub struct RunHandle {
    task: JoinHandle<Result<SyncRunModel, SyncError>>,
}

impl RunHandle {
    /// Wait for the run to finish.
    ///
    /// A failed run is still `Ok`: its row has `status = failed`. `Err` means
    /// the audit row itself could not be written, or the task died.
    pub async fn wait(self) -> Result<SyncRunModel, SyncError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(SyncError::Interrupted(e.to_string())),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[derive(Debug, Clone)]
struct RunState {
    phase: String,
    last_sync_time: Option<DateTime<Utc>>,
    last_sync_count: usize,
    /// Audit row of the run in progress, until its outcome is recorded.
    current_run: Option<SyncRunModel>,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: PHASE_IDLE.to_string(),
            last_sync_time: None,
            last_sync_count: 0,
            current_run: None,
        }
    }
}

struct Inner {
    db: DatabaseConnection,
    client: GitHubClient,
    options: SyncOptions,
    running: AtomicBool,
    state: Mutex<RunState>,
    on_progress: Option<ProgressCallback>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_phase(&self, phase: impl Into<String>) {
        self.state().phase = phase.into();
    }

    /// Track the phase from engine events, then forward them to the caller.
    fn observe(&self, event: SyncProgress) {
        match &event {
            SyncProgress::FetchedPage {
                page, total_so_far, ..
            } => self.set_phase(format!(
                "{PHASE_FETCHING} (page {page}, {total_so_far} so far)"
            )),
            SyncProgress::Reconciling { .. } => self.set_phase(PHASE_RECONCILING),
            _ => {}
        }
        emit(self.on_progress.as_ref(), event);
    }
}

/// Clears the running flag however the run task ends.
struct RunGuard {
    inner: Arc<Inner>,
}

impl RunGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                inner: Arc::clone(inner),
            })
    }
}

impl RunGuard {
    /// Close the audit row of a run whose task panicked.
    fn record_interruption(&self) {
        let Some(record) = self.inner.state().current_run.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let db = self.inner.db.clone();
        runtime.spawn(async move {
            let run_id = record.id;
            let result = RunResult::Failed {
                total: 0,
                message: PHASE_INTERRUPTED.to_string(),
            };
            if let Err(e) = sync_log::finish_run(&db, record, result, Utc::now()).await {
                tracing::error!(%run_id, error = %e, "Could not record interrupted sync run");
            }
        });
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.inner.set_phase(PHASE_INTERRUPTED);
            self.record_interruption();
        }
        self.inner.running.store(false, Ordering::Release);
    }
}

/// Drives sync runs against one database and one GitHub user.
///
/// Cheap to clone; all clones share the same guard and state.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    pub fn new(
        db: DatabaseConnection,
        client: GitHubClient,
        options: SyncOptions,
        on_progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                client,
                options,
                running: AtomicBool::new(false),
                state: Mutex::new(RunState::default()),
                on_progress,
            }),
        }
    }

    /// Whether a run currently holds the guard.
    pub fn is_syncing(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Start a run on behalf of a caller.
    ///
    /// # Errors
    /// Returns [`SyncError::AlreadyRunning`] if a run is in progress.
    pub fn trigger_manual(&self) -> Result<RunHandle, SyncError> {
        self.trigger(RunKind::Manual)
    }

    /// Start a run on behalf of the scheduler.
    ///
    /// A collision with a running sync is logged and skipped.
    pub fn trigger_scheduled(&self) -> Option<RunHandle> {
        match self.trigger(RunKind::Scheduled) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping scheduled sync");
                None
            }
        }
    }

    fn trigger(&self, kind: RunKind) -> Result<RunHandle, SyncError> {
        let guard = RunGuard::acquire(&self.inner).ok_or(SyncError::AlreadyRunning)?;
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _guard = guard;
            run(&inner, kind).await
        });
        Ok(RunHandle { task })
    }

    /// Current status. Reads the store but never waits on a running sync.
    pub async fn status(&self) -> Result<SyncStatus, SyncError> {
        let syncing = self.is_syncing();
        let state = self.inner.state().clone();
        let total_repos = repository::count(&self.inner.db).await?;
        let last_success = sync_log::latest_success(&self.inner.db).await?;

        Ok(SyncStatus {
            syncing,
            phase: state.phase,
            last_sync_time: state.last_sync_time,
            last_sync_count: state.last_sync_count,
            total_repos,
            last_success_time: last_success
                .as_ref()
                .and_then(|run| run.finished_at)
                .map(|t| t.to_utc()),
            last_success_count: last_success.map(|run| run.synced_count),
        })
    }

    /// Page through the run audit log, newest first.
    ///
    /// Page numbers are 1-based; 0 is served as page 1. Page sizes are
    /// clamped to `1..=100`.
    pub async fn history(&self, page: u64, page_size: u64) -> Result<SyncHistoryPage, SyncError> {
        let result = sync_log::find_page(&self.inner.db, Pagination::new(page, page_size)).await?;
        Ok(SyncHistoryPage {
            records: result.items,
            total: result.total,
            page_count: result.total_pages,
            current_page: result.page,
        })
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("client", &self.inner.client)
            .field("options", &self.inner.options)
            .field("syncing", &self.is_syncing())
            .finish_non_exhaustive()
    }
}

async fn run(inner: &Arc<Inner>, kind: RunKind) -> Result<SyncRunModel, SyncError> {
    let record = match sync_log::start_run(&inner.db, kind, Utc::now()).await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(%kind, error = %e, "Could not record sync run start, abandoning run");
            inner.set_phase(format!("sync failed: {e}"));
            return Err(e.into());
        }
    };
    let run_id = record.id;
    inner.state().current_run = Some(record.clone());
    tracing::info!(%run_id, %kind, "Sync run started");
    emit(
        inner.on_progress.as_ref(),
        SyncProgress::RunStarted { run_id, kind },
    );

    let mut total = 0usize;
    let outcome = execute(inner, &mut total).await;

    let result = match &outcome {
        Ok(stats) => RunResult::Succeeded {
            total,
            synced: stats.synced(),
            deleted: stats.deleted,
        },
        Err(e) => RunResult::Failed {
            total,
            message: e.to_string(),
        },
    };
    let finished_at = Utc::now();
    inner.state().current_run = None;
    let finished = sync_log::finish_run(&inner.db, record, result, finished_at)
        .await
        .inspect_err(|e| {
            tracing::error!(%run_id, error = %e, "Could not record sync run outcome");
        })?;

    match outcome {
        Ok(stats) => {
            {
                let mut state = inner.state();
                state.phase = PHASE_COMPLETE.to_string();
                state.last_sync_time = Some(finished_at);
                state.last_sync_count = stats.synced();
            }
            tracing::info!(
                %run_id,
                %kind,
                total,
                inserted = stats.inserted,
                updated = stats.updated,
                deleted = stats.deleted,
                deletions_skipped = stats.deletions_skipped,
                "Sync run succeeded"
            );
        }
        Err(e) => {
            inner.set_phase(format!("sync failed: {e}"));
            tracing::error!(%run_id, %kind, error = %e, "Sync run failed");
        }
    }

    emit(
        inner.on_progress.as_ref(),
        SyncProgress::RunFinished {
            run_id,
            status: finished.status,
            error: finished.error_message.clone(),
        },
    );
    debug_assert!(finished.status != RunStatus::Running);
    Ok(finished)
}

async fn execute(inner: &Arc<Inner>, total: &mut usize) -> Result<ReconcileStats, SyncError> {
    inner.set_phase(PHASE_FETCHING);
    let tracker: ProgressCallback = {
        let inner = Arc::clone(inner);
        Box::new(move |event| inner.observe(event))
    };

    let fetch = inner.client.fetch_all_starred(Some(&tracker)).await?;
    *total = fetch.repos.len();
    if let Some(partial) = &fetch.partial {
        emit(
            Some(&tracker),
            SyncProgress::Warning {
                message: partial.to_string(),
            },
        );
    }

    reconcile(&inner.db, &fetch, &inner.options, Some(&tracker)).await
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use std::time::Duration;

    use sea_orm::{ConnectionTrait, Statement};
    use tokio::sync::Semaphore;

    use crate::connect_and_migrate;
    use crate::http::{HttpResponse, MockTransport};
    use crate::record::StarredRepo;
    use crate::retry::RetryConfig;

    const BASE: &str = "https://api.test";

    fn page_url(page: u32) -> String {
        format!("{BASE}/users/octocat/starred?per_page=100&page={page}")
    }

    fn page(names: &[&str], next: Option<u32>) -> HttpResponse {
        let items: Vec<_> = names
            .iter()
            .map(|name| serde_json::json!({"starred_at": "2024-01-01T00:00:00Z", "repo": {"full_name": name}}))
            .collect();
        let headers = next
            .map(|n| vec![("Link".to_string(), format!("<{}>; rel=\"next\"", page_url(n)))])
            .unwrap_or_default();
        HttpResponse {
            status: 200,
            headers,
            body: serde_json::to_vec(&items).expect("serialize page"),
        }
    }

    fn failure(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    async fn setup(transport: &MockTransport) -> (SyncCoordinator, DatabaseConnection) {
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");
        let client =
            GitHubClient::new_with_transport(BASE, "octocat", None, Arc::new(transport.clone()))
                .with_retry(RetryConfig::disabled());
        let coordinator = SyncCoordinator::new(db.clone(), client, SyncOptions::default(), None);
        (coordinator, db)
    }

    async fn seed(db: &DatabaseConnection, full_name: &str) {
        repository::insert(db, StarredRepo::new(full_name).to_new_active_model(Utc::now()))
            .await
            .expect("seed should insert");
    }

    async fn wait(handle: RunHandle) -> SyncRunModel {
        tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .expect("run should finish in time")
            .expect("run should record an outcome")
    }

    #[tokio::test]
    async fn test_manual_run_succeeds_and_updates_status() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), page(&["a/1", "a/2"], None));
        let (coordinator, db) = setup(&transport).await;
        seed(&db, "gone/old").await;

        let run = wait(coordinator.trigger_manual().expect("trigger accepted")).await;

        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(run.kind, RunKind::Manual);
        assert_eq!(run.total_count, 2);
        assert_eq!(run.synced_count, 2);
        assert_eq!(run.deleted_count, 1);
        assert!(run.finished_at.is_some());

        let status = coordinator.status().await.expect("status");
        assert!(!status.syncing);
        assert_eq!(status.phase, PHASE_COMPLETE);
        assert_eq!(status.total_repos, 2);
        assert_eq!(status.last_sync_count, 2);
        assert!(status.last_sync_time.is_some());
        assert_eq!(status.last_success_count, Some(2));
        assert!(status.last_success_time.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_triggers_are_rejected_while_running() {
        let gate = Arc::new(Semaphore::new(0));
        let transport = MockTransport::new().with_gate(Arc::clone(&gate));
        transport.push_response(page_url(1), page(&["a/1"], None));
        let (coordinator, db) = setup(&transport).await;

        let handle = coordinator.trigger_manual().expect("first trigger accepted");
        for _ in 0..5 {
            assert!(matches!(
                coordinator.trigger_manual(),
                Err(SyncError::AlreadyRunning)
            ));
        }
        assert!(coordinator.trigger_scheduled().is_none());
        assert!(coordinator.is_syncing());

        tokio::time::timeout(Duration::from_secs(5), async {
            while sync_log::count_running(&db).await.expect("count") == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("run row should appear");
        assert_eq!(sync_log::count_running(&db).await.expect("count"), 1);
        assert!(coordinator.status().await.expect("status").syncing);

        gate.add_permits(10);
        let run = wait(handle).await;
        assert_eq!(run.status, RunStatus::Succeeded);
        assert!(!coordinator.is_syncing());
        assert_eq!(sync_log::count_running(&db).await.expect("count"), 0);

        transport.push_response(page_url(1), page(&["a/1"], None));
        let again = coordinator
            .trigger_scheduled()
            .expect("guard released after run");
        assert_eq!(wait(again).await.kind, RunKind::Scheduled);
    }

    #[tokio::test]
    async fn test_first_page_failure_marks_run_failed_without_touching_store() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), failure(500));
        let (coordinator, db) = setup(&transport).await;
        seed(&db, "keep/me").await;

        let run = wait(coordinator.trigger_manual().expect("trigger accepted")).await;

        assert_eq!(run.status, RunStatus::Failed);
        assert!(
            run.error_message
                .as_deref()
                .is_some_and(|m| m.contains("remote unavailable"))
        );
        assert!(run.finished_at.is_some());
        assert_eq!(repository::count(&db).await.expect("count"), 1);

        let status = coordinator.status().await.expect("status");
        assert!(!status.syncing);
        assert!(status.phase.starts_with("sync failed"));
        assert!(status.last_sync_time.is_none());
        assert!(status.last_success_time.is_none());
    }

    #[tokio::test]
    async fn test_partial_fetch_succeeds_and_keeps_local_only_records() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), page(&["a/1", "a/2"], Some(2)));
        transport.push_response(page_url(2), failure(502));
        let (coordinator, db) = setup(&transport).await;
        seed(&db, "maybe/elsewhere").await;

        let run = wait(coordinator.trigger_manual().expect("trigger accepted")).await;

        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(run.total_count, 2);
        assert_eq!(run.synced_count, 2);
        assert_eq!(run.deleted_count, 0);
        assert!(
            repository::find_by_full_name(&db, "maybe/elsewhere")
                .await
                .expect("lookup")
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_store_failure_marks_run_failed_and_releases_guard() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), page(&["a/1"], None));
        let (coordinator, db) = setup(&transport).await;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "DROP TABLE starred_repositories".to_string(),
        ))
        .await
        .expect("drop table");

        let run = wait(coordinator.trigger_manual().expect("trigger accepted")).await;

        assert_eq!(run.status, RunStatus::Failed);
        assert!(
            run.error_message
                .as_deref()
                .is_some_and(|m| m.contains("store error"))
        );
        assert!(!coordinator.is_syncing());
    }

    #[tokio::test]
    async fn test_history_pages_newest_first_and_clamps_input() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), page(&["a/1"], None));
        transport.push_response(page_url(1), failure(500));
        let (coordinator, _db) = setup(&transport).await;

        wait(coordinator.trigger_manual().expect("first")).await;
        wait(coordinator.trigger_manual().expect("second")).await;

        let first = coordinator.history(1, 1).await.expect("history");
        assert_eq!(first.total, 2);
        assert_eq!(first.page_count, 2);
        assert_eq!(first.current_page, 1);
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.records[0].status, RunStatus::Failed);

        let clamped = coordinator.history(0, 0).await.expect("history");
        assert_eq!(clamped.current_page, 1);
        assert_eq!(clamped.records.len(), 1);
        assert_eq!(clamped.records[0].id, first.records[0].id);

        let beyond = coordinator.history(5, 10).await.expect("history");
        assert!(beyond.records.is_empty());
        assert_eq!(beyond.total, 2);
    }

    #[tokio::test]
    async fn test_history_with_huge_page_values_returns_empty_page() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), page(&["a/1"], None));
        let (coordinator, _db) = setup(&transport).await;
        wait(coordinator.trigger_manual().expect("trigger accepted")).await;

        let huge_size = coordinator
            .history(3, u64::MAX / 2 + 1)
            .await
            .expect("history");
        assert!(huge_size.records.is_empty());
        assert_eq!(huge_size.total, 1);
        assert_eq!(huge_size.page_count, 1);

        let huge_page = coordinator.history(u64::MAX, 100).await.expect("history");
        assert!(huge_page.records.is_empty());
        assert_eq!(huge_page.current_page, u64::MAX);

        let capped = coordinator.history(1, u64::MAX).await.expect("history");
        assert_eq!(capped.records.len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_run_is_recorded_as_failed() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), page(&["a/1"], None));
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");
        let client =
            GitHubClient::new_with_transport(BASE, "octocat", None, Arc::new(transport.clone()))
                .with_retry(RetryConfig::disabled());
        let callback: ProgressCallback = Box::new(|event| {
            if matches!(event, SyncProgress::FetchedPage { .. }) {
                panic!("progress sink failed");
            }
        });
        let coordinator =
            SyncCoordinator::new(db.clone(), client, SyncOptions::default(), Some(callback));

        let err = coordinator
            .trigger_manual()
            .expect("trigger accepted")
            .wait()
            .await
            .expect_err("a panicking run has no outcome");
        assert!(matches!(err, SyncError::Interrupted(_)));
        assert!(!coordinator.is_syncing());

        tokio::time::timeout(Duration::from_secs(5), async {
            while sync_log::count_running(&db).await.expect("count") > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("interrupted run row should be closed");

        let history = coordinator.history(1, 10).await.expect("history");
        assert_eq!(history.total, 1);
        let run = &history.records[0];
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.finished_at.is_some());
        assert_eq!(run.error_message.as_deref(), Some("sync interrupted"));
        assert_eq!(
            coordinator.status().await.expect("status").phase,
            "sync interrupted"
        );
    }

    #[tokio::test]
    async fn test_progress_callback_sees_run_lifecycle() {
        let transport = MockTransport::new();
        transport.push_response(page_url(1), page(&["a/1"], None));
        let db = connect_and_migrate("sqlite::memory:")
            .await
            .expect("test db should migrate");
        let client =
            GitHubClient::new_with_transport(BASE, "octocat", None, Arc::new(transport.clone()))
                .with_retry(RetryConfig::disabled());

        let events: Arc<Mutex<Vec<SyncProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let events_capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            events_capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });
        let coordinator = SyncCoordinator::new(db, client, SyncOptions::default(), Some(callback));

        wait(coordinator.trigger_manual().expect("trigger accepted")).await;

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert!(matches!(
            events.first(),
            Some(SyncProgress::RunStarted {
                kind: RunKind::Manual,
                ..
            })
        ));
        assert!(
            events
                .iter()
                .any(|e| matches!(e, SyncProgress::Reconciled { inserted: 1, .. }))
        );
        assert!(matches!(
            events.last(),
            Some(SyncProgress::RunFinished {
                status: RunStatus::Succeeded,
                ..
            })
        ));
    }

    #[test]
    fn test_trigger_response_from_result() {
        let rejected = TriggerResponse::from_result::<()>(&Err(SyncError::AlreadyRunning));
        assert!(!rejected.accepted);
        assert!(rejected.message.contains("already in progress"));

        let accepted = TriggerResponse::from_result(&Ok(()));
        assert!(accepted.accepted);
    }
}
