//! # Status Listeners
//!
//! Subscribers are told about three kinds of change:
//!
//! | Event | Payload | Raised by |
//! |-------|---------|-----------|
//! | [`StatusEvent::AlarmStatusChanged`] | new [`AlarmStatus`] | every alarm status write |
//! | [`StatusEvent::CatDetected`] | detection result | every processed image |
//! | [`StatusEvent::SensorStatusChanged`] | none | bulk sensor reset |
//!
//! A `SensorStatusChanged` carries no sensor data; subscribers re-read the
//! sensors from the engine. Dispatch is synchronous and the order between
//! listeners is unspecified.

use catpoint_registry::AlarmStatus;
use std::sync::Arc;

/// A change the alarm engine announces to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// The alarm status was written.
    AlarmStatusChanged(AlarmStatus),
    /// An image was analysed.
    CatDetected(bool),
    /// Every sensor was reset at once.
    SensorStatusChanged,
}

/// A subscriber to [`StatusEvent`]s.
///
/// Every handler defaults to a no-op, so implementors override only the
/// events they care about. Handlers take `&self`; listeners that keep
/// state use interior mutability.
///
/// # Example
///
/// ```rust
/// use catpoint_core::{AlarmStatus, StatusEvent, StatusListener};
/// use std::sync::Mutex;
///
/// #[derive(Default)]
/// struct Siren {
///     last: Mutex<Option<AlarmStatus>>,
/// }
///
/// impl StatusListener for Siren {
///     fn on_alarm_status_changed(&self, status: AlarmStatus) {
///         *self.last.lock().unwrap() = Some(status);
///     }
/// }
///
/// let siren = Siren::default();
/// siren.handle(&StatusEvent::CatDetected(true));
/// siren.handle(&StatusEvent::AlarmStatusChanged(AlarmStatus::Alarm));
/// assert_eq!(*siren.last.lock().unwrap(), Some(AlarmStatus::Alarm));
/// ```
pub trait StatusListener: Send + Sync {
    /// The alarm status changed.
    fn on_alarm_status_changed(&self, _status: AlarmStatus) {}

    /// An image was analysed.
    fn on_cat_detected(&self, _cat_detected: bool) {}

    /// Sensors were reset; re-read them.
    fn on_sensor_status_changed(&self) {}

    /// Dispatches an event to the matching handler.
    fn handle(&self, event: &StatusEvent) {
        match *event {
            StatusEvent::AlarmStatusChanged(status) => self.on_alarm_status_changed(status),
            StatusEvent::CatDetected(cat_detected) => self.on_cat_detected(cat_detected),
            StatusEvent::SensorStatusChanged => self.on_sensor_status_changed(),
        }
    }
}

/// Set of listeners, deduplicated by identity.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<Arc<dyn StatusListener>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener.
    ///
    /// Returns `false` if this exact listener instance is already registered.
    pub fn add(&mut self, listener: Arc<dyn StatusListener>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Returns true if this exact listener instance is registered.
    pub fn contains(&self, listener: &Arc<dyn StatusListener>) -> bool {
        self.listeners
            .iter()
            .any(|existing| same_listener(existing, listener))
    }

    /// Registered listeners.
    pub fn listeners(&self) -> &[Arc<dyn StatusListener>] {
        &self.listeners
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true if nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers `event` to every listener.
    pub fn notify(&self, event: StatusEvent) {
        for listener in &self.listeners {
            listener.handle(&event);
        }
    }
}

// Compares data pointers only; vtable pointers for one type can differ
// between codegen units.
fn same_listener(a: &Arc<dyn StatusListener>, b: &Arc<dyn StatusListener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
