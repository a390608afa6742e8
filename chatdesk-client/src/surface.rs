//! Collaborators outside the client: page navigation and notifications
//!
//! A browser host maps these onto `location.href`, `location.reload()`,
//! toasts and `alert`; the terminal front end prints them.

use chatdesk_core::view::Toast;
use parking_lot::Mutex;

/// Leaves or reloads the current page
pub trait Navigator: Send + Sync {
    /// Navigate to `location` (a path on the chat server)
    fn redirect(&self, location: &str);

    /// Reload the current page
    fn reload(&self);
}

/// Surfaces transient messages to the user
pub trait Notifier: Send + Sync {
    fn toast(&self, toast: Toast);

    /// Blocking message box in a browser, plain notice elsewhere
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Redirect(String),
    Reload,
    Toast(Toast),
    Alert(String),
}

/// Navigator and notifier that only records what it was asked to do.
/// Used by headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().clone()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Redirect(location) => Some(location.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Toast(toast) => Some(toast.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SurfaceEvent) {
        self.events.lock().push(event);
    }
}

impl Navigator for RecordingSurface {
    fn redirect(&self, location: &str) {
        self.record(SurfaceEvent::Redirect(location.to_string()));
    }

    fn reload(&self) {
        self.record(SurfaceEvent::Reload);
    }
}

impl Notifier for RecordingSurface {
    fn toast(&self, toast: Toast) {
        self.record(SurfaceEvent::Toast(toast));
    }

    fn alert(&self, message: &str) {
        self.record(SurfaceEvent::Alert(message.to_string()));
    }
}
