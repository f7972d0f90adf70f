//! View-state coordination for the server list screen.
//!
//! Every user action runs as a pipeline: take a sequence number, publish a
//! provisional state, await the directory, fold the result into the
//! [`ServerStore`], publish the final state. Pipelines never cancel each
//! other; [`OverlapPolicy`] decides whose final state stays visible.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{Server, ServerDraft, StatusFilter},
    protocol::Envelope,
};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    directory::DirectoryService,
    report::{render_table, ExportSink, FileExportSink, ReportArtifact, ReportOutcome},
    store::{ServerStore, StoreMutation},
    surface::{FormSurface, NoopFormSurface, Notifier, TracingNotifier},
};

const UPDATE_CHANNEL_CAPACITY: usize = 64;
const NOT_LOADED_MESSAGE: &str = "Server list has not been loaded yet";
const REPORT_NOTIFICATION: &str = "Report downloaded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Loaded(Envelope),
    Error(String),
}

impl ViewState {
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            ViewState::Loaded(envelope) => Some(envelope),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::Loaded(_) => "loaded",
            ViewState::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Emitted before the directory call resolves.
    Provisional,
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewUpdate {
    pub seq: u64,
    pub phase: Phase,
    pub state: ViewState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Every final state is published; the last pipeline to resolve wins.
    #[default]
    LastResolvedWins,
    /// Final states from pipelines superseded by a newer action are dropped.
    /// Their store mutations still apply.
    LatestIssuedWins,
}

#[derive(Debug, Clone)]
pub enum Action {
    Refresh,
    Ping { ip_address: String },
    Save { draft: ServerDraft },
    Filter { status: StatusFilter },
    Delete { server: Server },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Refresh => "refresh",
            Action::Ping { .. } => "ping",
            Action::Save { .. } => "save",
            Action::Filter { .. } => "filter",
            Action::Delete { .. } => "delete",
        }
    }
}

pub struct CoordinatorBuilder {
    directory: Arc<dyn DirectoryService>,
    notifier: Arc<dyn Notifier>,
    export_sink: Arc<dyn ExportSink>,
    form: Arc<dyn FormSurface>,
    policy: OverlapPolicy,
}

impl CoordinatorBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn export_sink(mut self, export_sink: Arc<dyn ExportSink>) -> Self {
        self.export_sink = export_sink;
        self
    }

    pub fn form_surface(mut self, form: Arc<dyn FormSurface>) -> Self {
        self.form = form;
        self
    }

    pub fn overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> ViewStateCoordinator {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let (current, _) = watch::channel(ViewUpdate {
            seq: 0,
            phase: Phase::Provisional,
            state: ViewState::Loading,
        });
        let (loading, _) = watch::channel(false);
        let (filter_marker, _) = watch::channel(None);

        ViewStateCoordinator {
            shared: Arc::new(Shared {
                directory: self.directory,
                notifier: self.notifier,
                export_sink: self.export_sink,
                form: self.form,
                policy: self.policy,
                store: ServerStore::new(),
                issued: AtomicU64::new(0),
                updates,
                current,
                loading,
                filter_marker,
            }),
        }
    }
}

struct Shared {
    directory: Arc<dyn DirectoryService>,
    notifier: Arc<dyn Notifier>,
    export_sink: Arc<dyn ExportSink>,
    form: Arc<dyn FormSurface>,
    policy: OverlapPolicy,
    store: ServerStore,
    issued: AtomicU64,
    updates: broadcast::Sender<ViewUpdate>,
    current: watch::Sender<ViewUpdate>,
    loading: watch::Sender<bool>,
    filter_marker: watch::Sender<Option<String>>,
}

impl Shared {
    fn begin(&self, action: &'static str) -> u64 {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, action, "pipeline started");
        seq
    }

    fn cached_view(&self) -> ViewState {
        ViewState::Loaded(self.store.snapshot_or_empty())
    }

    /// Publishes under the watch lock so the broadcast stream sees the same
    /// order as the latest-state view.
    fn publish(&self, seq: u64, phase: Phase, state: ViewState) -> ViewState {
        let update = ViewUpdate {
            seq,
            phase,
            state: state.clone(),
        };
        let published = self.current.send_if_modified(|current| {
            if phase == Phase::Final
                && self.policy == OverlapPolicy::LatestIssuedWins
                && seq < self.issued.load(Ordering::SeqCst)
            {
                return false;
            }
            *current = update.clone();
            let _ = self.updates.send(update.clone());
            true
        });

        if published {
            debug!(seq, ?phase, state = state.kind(), "view state published");
        } else {
            warn!(seq, state = state.kind(), "superseded pipeline result discarded");
        }
        state
    }

    fn fail(&self, seq: u64, action: &'static str, message: String) -> ViewState {
        warn!(seq, action, error = %message, "pipeline failed");
        self.notifier.notify_error(&message);
        self.publish(seq, Phase::Final, ViewState::Error(message))
    }
}

/// Owns the server-list screen state. Clones share the same state.
#[derive(Clone)]
pub struct ViewStateCoordinator {
    shared: Arc<Shared>,
}

impl ViewStateCoordinator {
    pub fn builder(directory: Arc<dyn DirectoryService>) -> CoordinatorBuilder {
        CoordinatorBuilder {
            directory,
            notifier: Arc::new(TracingNotifier),
            export_sink: Arc::new(FileExportSink::new(".")),
            form: Arc::new(NoopFormSurface),
            policy: OverlapPolicy::default(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewUpdate> {
        self.shared.updates.subscribe()
    }

    pub fn current(&self) -> ViewUpdate {
        self.shared.current.borrow().clone()
    }

    pub fn loading(&self) -> watch::Receiver<bool> {
        self.shared.loading.subscribe()
    }

    pub fn filter_marker(&self) -> watch::Receiver<Option<String>> {
        self.shared.filter_marker.subscribe()
    }

    pub fn snapshot(&self) -> Option<Envelope> {
        self.shared.store.snapshot()
    }

    /// Spawns `action` as an independent pipeline.
    pub fn dispatch(&self, action: Action) -> JoinHandle<ViewState> {
        debug!(action = action.name(), "dispatching action");
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.run(action).await })
    }

    pub async fn run(&self, action: Action) -> ViewState {
        match action {
            Action::Refresh => self.refresh().await,
            Action::Ping { ip_address } => self.ping_server(&ip_address).await,
            Action::Save { draft } => self.save_server(draft).await,
            Action::Filter { status } => self.filter_servers(status).await,
            Action::Delete { server } => self.delete_server(&server).await,
        }
    }

    /// Initial load of the screen.
    pub async fn activate(&self) -> ViewState {
        self.refresh().await
    }

    pub async fn refresh(&self) -> ViewState {
        let shared = &self.shared;
        let seq = shared.begin("refresh");
        shared.publish(seq, Phase::Provisional, ViewState::Loading);

        match shared.directory.list_servers().await {
            Ok(mut response) => {
                // Most recent first.
                if let Some(servers) = response.data.servers.as_mut() {
                    servers.reverse();
                }
                shared.notifier.notify_default(&response.message);
                let cached = shared.store.apply(StoreMutation::Replace(response));
                info!(seq, servers = cached.servers().len(), "server list loaded");
                shared.publish(seq, Phase::Final, ViewState::Loaded(cached))
            }
            Err(err) => shared.fail(seq, "refresh", err.to_string()),
        }
    }

    pub async fn ping_server(&self, ip_address: &str) -> ViewState {
        let shared = &self.shared;
        let seq = shared.begin("ping");
        shared.filter_marker.send_replace(Some(ip_address.to_string()));
        shared.publish(seq, Phase::Provisional, shared.cached_view());

        match shared.directory.ping(ip_address).await {
            Ok(response) => {
                let cached = match response.server() {
                    Some(server) => shared.store.apply(StoreMutation::Patch(server.clone())),
                    None => shared.store.snapshot_or_empty(),
                };
                shared.notifier.notify_default(&response.message);
                shared.filter_marker.send_replace(None);
                info!(seq, ip_address, "ping completed");
                shared.publish(seq, Phase::Final, ViewState::Loaded(cached))
            }
            Err(err) => {
                shared.filter_marker.send_replace(None);
                shared.fail(seq, "ping", err.to_string())
            }
        }
    }

    pub async fn save_server(&self, draft: ServerDraft) -> ViewState {
        let shared = &self.shared;
        let seq = shared.begin("save");
        shared.loading.send_replace(true);
        shared.publish(seq, Phase::Provisional, shared.cached_view());

        match shared.directory.save(&draft).await {
            Ok(response) => {
                let cached = match response.server().cloned() {
                    Some(server) => {
                        info!(seq, id = %server.id, "server created");
                        shared.store.apply(StoreMutation::Prepend {
                            response: response.clone(),
                            server,
                        })
                    }
                    None => shared.store.snapshot_or_empty(),
                };
                shared.notifier.notify_default(&response.message);
                shared.form.dismiss();
                shared.loading.send_replace(false);
                shared.form.reset(ServerDraft::default());
                shared.publish(seq, Phase::Final, ViewState::Loaded(cached))
            }
            Err(err) => {
                shared.loading.send_replace(false);
                shared.fail(seq, "save", err.to_string())
            }
        }
    }

    pub async fn filter_servers(&self, status: StatusFilter) -> ViewState {
        let shared = &self.shared;
        let seq = shared.begin("filter");
        shared.publish(seq, Phase::Provisional, shared.cached_view());

        let Some(current) = shared.store.snapshot() else {
            return shared.fail(seq, "filter", NOT_LOADED_MESSAGE.to_string());
        };

        match shared.directory.filter(status, &current).await {
            Ok(filtered) => {
                shared.notifier.notify_default(&filtered.message);
                debug!(seq, %status, shown = filtered.servers().len(), "servers filtered");
                shared.publish(seq, Phase::Final, ViewState::Loaded(filtered))
            }
            Err(err) => shared.fail(seq, "filter", err.to_string()),
        }
    }

    pub async fn delete_server(&self, server: &Server) -> ViewState {
        let shared = &self.shared;
        let seq = shared.begin("delete");
        shared.publish(seq, Phase::Provisional, shared.cached_view());

        match shared.directory.delete(server.id).await {
            Ok(response) => {
                shared.notifier.notify_default(&response.message);
                let cached = shared.store.apply(StoreMutation::Remove {
                    response,
                    id: server.id,
                });
                info!(seq, id = %server.id, "server deleted");
                shared.publish(seq, Phase::Final, ViewState::Loaded(cached))
            }
            Err(err) => shared.fail(seq, "delete", err.to_string()),
        }
    }

    /// Exports the table currently on screen. The "Report downloaded"
    /// notification fires even when there is no table to export.
    pub fn print_report(&self) -> ReportOutcome {
        let shared = &self.shared;
        shared.notifier.notify_default(REPORT_NOTIFICATION);

        let visible = shared.current.borrow().state.clone();
        let ViewState::Loaded(envelope) = &visible else {
            error!(state = visible.kind(), "server table is not rendered; no report produced");
            return ReportOutcome::NoTable;
        };

        let artifact = ReportArtifact::from_markup(render_table(envelope.servers()));
        match shared.export_sink.export(&artifact) {
            Ok(()) => {
                info!(rows = envelope.servers().len(), file = %artifact.file_name, "report exported");
                ReportOutcome::Exported
            }
            Err(err) => {
                error!(error = %err, "report export failed");
                shared.notifier.notify_error(&err.to_string());
                ReportOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
