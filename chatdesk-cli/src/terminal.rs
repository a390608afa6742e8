//! Terminal rendering of navigation and notifications

use chatdesk_client::{Navigator, Notifier};
use chatdesk_core::view::Toast;
use console::style;
use parking_lot::Mutex;

/// Prints toasts and alerts to stderr. A redirect cannot be followed from
/// a terminal, so it is remembered and reported instead.
#[derive(Default)]
pub struct TerminalSurface {
    redirects: Mutex<Vec<String>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last redirect requested, if any
    pub fn last_redirect(&self) -> Option<String> {
        self.redirects.lock().last().cloned()
    }
}

impl Navigator for TerminalSurface {
    fn redirect(&self, location: &str) {
        self.redirects.lock().push(location.to_string());
        eprintln!("{} {}", style("→").cyan(), location);
    }

    fn reload(&self) {
        eprintln!("{}", style("↻ reloaded").dim());
    }
}

impl Notifier for TerminalSurface {
    fn toast(&self, toast: Toast) {
        eprintln!("{}", style(&toast.text).red());
    }

    fn alert(&self, message: &str) {
        eprintln!("{}", style(message).yellow().bold());
    }
}
