use crate::model::Track;
use anyhow::Result;

/// Closed set of playback events. Using an enum instead of string keys means
/// an unknown event cannot be registered or dispatched at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TrackChanged,
    TrackLoaded,
    TrackEnded,
    TimeUpdate,
}

pub type Subscriber = Box<dyn FnMut(&Track) -> Result<()>>;

/// Ordered subscriber lists per event kind. Dispatch is synchronous and runs
/// subscribers in registration order; a failing subscriber never prevents the
/// ones after it from running.
#[derive(Default)]
pub struct EventBus {
    track_changed: Vec<Subscriber>,
    track_loaded: Vec<Subscriber>,
    track_ended: Vec<Subscriber>,
    time_update: Vec<Subscriber>,
    last_failure: Option<String>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, kind: EventKind, subscriber: Subscriber) {
        self.list_mut(kind).push(subscriber);
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::TrackChanged => self.track_changed.len(),
            EventKind::TrackLoaded => self.track_loaded.len(),
            EventKind::TrackEnded => self.track_ended.len(),
            EventKind::TimeUpdate => self.time_update.len(),
        }
    }

    /// Invokes every subscriber for `kind` with `track`. A kind with no
    /// subscribers is a no-op. Failures are recorded, not propagated; the
    /// most recent one is retrievable through `take_failure`.
    pub fn dispatch(&mut self, kind: EventKind, track: &Track) {
        let mut failure = None;
        for subscriber in self.list_mut(kind).iter_mut() {
            if let Err(err) = subscriber(track) {
                failure = Some(format!("{kind:?} subscriber failed: {err:#}"));
            }
        }
        if failure.is_some() {
            self.last_failure = failure;
        }
    }

    pub fn take_failure(&mut self) -> Option<String> {
        self.last_failure.take()
    }

    fn list_mut(&mut self, kind: EventKind) -> &mut Vec<Subscriber> {
        match kind {
            EventKind::TrackChanged => &mut self.track_changed,
            EventKind::TrackLoaded => &mut self.track_loaded,
            EventKind::TrackEnded => &mut self.track_ended,
            EventKind::TimeUpdate => &mut self.time_update,
        }
    }
}
