use client_core::Notifier;
use tracing::debug;

/// Prints notifications inline with the rendered list.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_default(&self, message: &str) {
        debug!(target: "notification", level = "default", "{message}");
        println!("[notice] {message}");
    }

    fn notify_error(&self, message: &str) {
        debug!(target: "notification", level = "error", "{message}");
        eprintln!("[error] {message}");
    }
}
