//! Presentation-side capabilities the coordinator drives but does not own.

use shared::domain::ServerDraft;
use tracing::{debug, error, info};

/// User-facing toasts. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify_default(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// The "new server" input modal.
pub trait FormSurface: Send + Sync {
    fn dismiss(&self);
    fn reset(&self, defaults: ServerDraft);
}

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_default(&self, message: &str) {
        info!(target: "notification", "{message}");
    }

    fn notify_error(&self, message: &str) {
        error!(target: "notification", "{message}");
    }
}

pub struct NoopFormSurface;

impl FormSurface for NoopFormSurface {
    fn dismiss(&self) {
        debug!("no input modal attached; dismiss ignored");
    }

    fn reset(&self, defaults: ServerDraft) {
        debug!(status = %defaults.status, "no input form attached; reset ignored");
    }
}
