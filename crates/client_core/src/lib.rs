//! Client side of the server manager: the directory contract, the owned
//! server-list store and the coordinator that turns user actions into view
//! states.

pub mod coordinator;
pub mod directory;
pub mod error;
pub mod report;
pub mod store;
pub mod surface;

pub use coordinator::{
    Action, CoordinatorBuilder, OverlapPolicy, Phase, ViewState, ViewStateCoordinator, ViewUpdate,
};
pub use directory::{filter_envelope, DirectoryService, HttpDirectoryService};
pub use error::{DirectoryError, ExportError};
pub use report::{ExportSink, FileExportSink, ReportArtifact, ReportOutcome};
pub use store::{ServerStore, StoreMutation};
pub use surface::{FormSurface, NoopFormSurface, Notifier, TracingNotifier};
