//! Service wiring
//!
//! [`ScoutSync`] builds every component over one SQLite pool, one backend and
//! one event bus, and exposes the operations a client shell calls.

use crate::connectivity::Connectivity;
use crate::fusion::DataFusionView;
use crate::model::{Assignment, CanonicalRecord, FormSchema, ObservationRecord};
use crate::reconciler::{spawn_assignment_watcher, AssignmentReconciler};
use crate::remote::RemoteStore;
use crate::reupload::{ReuploadCoordinator, ReuploadReport};
use crate::schema::SchemaService;
use crate::storage::{AssignmentCache, LocalQueue, RemoteCache, SchemaCache, SessionStore};
use crate::submission::{SubmissionCoordinator, SubmissionOutcome};
use crate::teams::TeamService;
use scout_common::config::TomlConfig;
use scout_common::db::{init_database, KvStore};
use scout_common::events::{EventBus, ScoutEvent};
use scout_common::Variant;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Runtime settings for the sync core
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub event_bus_capacity: usize,
    pub assignment_refresh: Duration,
    /// Connectivity assumed until the first probe
    pub start_online: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: 100,
            assignment_refresh: Duration::from_secs(300),
            start_online: false,
        }
    }
}

impl SyncConfig {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            event_bus_capacity: config.event_bus_capacity,
            assignment_refresh: Duration::from_secs(config.assignment_refresh_secs.max(1)),
            start_online: false,
        }
    }
}

/// Offline-first scouting sync core
pub struct ScoutSync {
    config: SyncConfig,
    event_bus: EventBus,
    connectivity: Connectivity,
    queue: LocalQueue,
    session: SessionStore,
    fusion: Arc<DataFusionView>,
    reconciler: Arc<AssignmentReconciler>,
    submission: SubmissionCoordinator,
    reupload: Arc<ReuploadCoordinator>,
    schemas: SchemaService,
    teams: TeamService,
}

impl ScoutSync {
    pub fn new(pool: SqlitePool, remote: Arc<dyn RemoteStore>, config: SyncConfig) -> Self {
        let kv = KvStore::new(pool);
        let event_bus = EventBus::new(config.event_bus_capacity);
        let connectivity = Connectivity::new(config.start_online).with_event_bus(event_bus.clone());

        let queue = LocalQueue::new(kv.clone());
        let remote_cache = RemoteCache::new(kv.clone());
        let assignment_cache = AssignmentCache::new(kv.clone());
        let session = SessionStore::new(kv.clone());

        let fusion = Arc::new(DataFusionView::new(
            Arc::clone(&remote),
            connectivity.clone(),
            remote_cache,
            queue.clone(),
        ));
        let reconciler = Arc::new(AssignmentReconciler::new(
            Arc::clone(&remote),
            connectivity.clone(),
            Arc::clone(&fusion),
            assignment_cache.clone(),
            session.clone(),
        ));
        let submission = SubmissionCoordinator::new(
            Arc::clone(&remote),
            connectivity.clone(),
            queue.clone(),
            assignment_cache,
            event_bus.clone(),
        );
        let reupload = Arc::new(ReuploadCoordinator::new(
            Arc::clone(&remote),
            connectivity.clone(),
            queue.clone(),
            session.clone(),
            event_bus.clone(),
        ));
        let schemas = SchemaService::new(Arc::clone(&remote), connectivity.clone(), SchemaCache::new(kv));
        let teams = TeamService::new(remote, connectivity.clone(), session.clone());

        Self {
            config,
            event_bus,
            connectivity,
            queue,
            session,
            fusion,
            reconciler,
            submission,
            reupload,
            schemas,
            teams,
        }
    }

    /// Open (creating if needed) the local database under `root_folder`
    pub async fn open(
        root_folder: &Path,
        toml: &TomlConfig,
        remote: Arc<dyn RemoteStore>,
    ) -> scout_common::Result<Self> {
        let db_path = toml.database_path(root_folder);
        let pool = init_database(&db_path).await?;
        info!(database = %db_path.display(), "Scout sync core ready");
        Ok(Self::new(pool, remote, SyncConfig::from_toml(toml)))
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub fn queue(&self) -> &LocalQueue {
        &self.queue
    }

    pub fn fusion(&self) -> &Arc<DataFusionView> {
        &self.fusion
    }

    pub fn reconciler(&self) -> &Arc<AssignmentReconciler> {
        &self.reconciler
    }

    pub fn reupload(&self) -> &Arc<ReuploadCoordinator> {
        &self.reupload
    }

    pub fn schemas(&self) -> &SchemaService {
        &self.schemas
    }

    pub fn teams(&self) -> &TeamService {
        &self.teams
    }

    pub fn set_online(&self, online: bool) -> bool {
        self.connectivity.set_online(online)
    }

    /// Submit on behalf of the signed-in user
    pub async fn submit(&self, record: ObservationRecord) -> SubmissionOutcome {
        let user = self.session.user().await;
        self.submission
            .submit(record, user.as_ref().map(|u| u.id.as_str()))
            .await
    }

    /// Fused records for the selected team
    pub async fn fused(&self, variant: Variant) -> Vec<CanonicalRecord> {
        match self.session.current_team_id().await {
            Some(team_id) => self.fusion.fused(variant, &team_id).await,
            None => Vec::new(),
        }
    }

    /// Outstanding assignments for the signed-in user and selected team
    pub async fn assignments(&self, variant: Variant) -> Vec<Assignment> {
        self.reconciler.reconcile_current(variant).await
    }

    pub async fn current_schema(&self, variant: Variant) -> Option<FormSchema> {
        self.schemas.current_schema(variant).await
    }

    pub async fn flush_all(&self) -> Vec<ReuploadReport> {
        self.reupload.flush_all().await
    }

    /// A screen showing `variant` regained focus
    pub fn screen_focused(&self, variant: Variant) {
        self.event_bus.emit_lossy(ScoutEvent::ScreenFocused {
            variant,
            timestamp: scout_common::time::now(),
        });
    }

    /// Background assignment list for `variant`, refreshed on events and a timer
    pub fn watch_assignments(&self, variant: Variant) -> (watch::Receiver<Vec<Assignment>>, JoinHandle<()>) {
        spawn_assignment_watcher(
            Arc::clone(&self.reconciler),
            &self.event_bus,
            variant,
            self.config.assignment_refresh,
        )
    }

    /// Background task flushing queues on every reconnect
    pub fn spawn_reupload_on_reconnect(&self) -> JoinHandle<()> {
        self.reupload.spawn_on_reconnect()
    }
}
