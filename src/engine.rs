use crate::audio::AudioBackend;
use crate::model::Track;
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    MetadataLoaded,
    TimeUpdate,
    Ended,
}

/// One playback notification, tagged with the load generation it was observed
/// under. Consumers must discard notifications whose generation no longer
/// matches `PlaybackEngine::generation` — a fast track switch can otherwise
/// apply a leftover notification from the superseded load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub generation: u64,
}

/// Adapter between the controller's abstract transport operations and the
/// audio backend. The backend is polled; `poll` turns observed state
/// transitions into the metadata-loaded / time-updated / ended channels.
pub struct PlaybackEngine {
    backend: Box<dyn AudioBackend>,
    generation: u64,
    metadata_announced: bool,
    last_whole_second: Option<u64>,
    ended_announced: bool,
}

impl PlaybackEngine {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            generation: 0,
            metadata_announced: false,
            last_whole_second: None,
            ended_announced: false,
        }
    }

    /// Replaces the current source with `track`'s media file. The new source
    /// starts paused; every load begins a new notification generation.
    pub fn load(&mut self, track: &Track) -> Result<()> {
        self.generation += 1;
        self.metadata_announced = false;
        self.last_whole_second = None;
        self.ended_announced = false;
        self.backend.load(&track.path)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn play(&mut self) {
        self.backend.play();
    }

    pub fn pause(&mut self) {
        self.backend.pause();
    }

    pub fn is_paused(&self) -> bool {
        self.backend.is_paused()
    }

    pub fn position_seconds(&self) -> f64 {
        self.backend
            .position()
            .map_or(f64::NAN, |position| position.as_secs_f64())
    }

    pub fn duration_seconds(&self) -> f64 {
        self.backend
            .duration()
            .map_or(f64::NAN, |duration| duration.as_secs_f64())
    }

    /// Seeks to `seconds` clamped to `[0, duration]` (lower bound only while
    /// the duration is still unknown). Returns the position actually applied.
    pub fn seek_seconds(&mut self, seconds: f64) -> Result<f64> {
        let mut target = seconds.max(0.0);
        if let Some(duration) = self.backend.duration() {
            target = target.min(duration.as_secs_f64());
        }
        self.backend.seek_to(Duration::from_secs_f64(target))?;
        Ok(target)
    }

    pub fn volume(&self) -> f32 {
        self.backend.volume()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.backend.set_volume(volume);
    }

    pub fn output_name(&self) -> Option<String> {
        self.backend.output_name()
    }

    /// Observes the backend and reports what changed since the last poll:
    /// the duration becoming known, the position crossing a whole second,
    /// and the stream reaching its end (once per load).
    pub fn poll(&mut self) -> Vec<Notification> {
        let mut notifications = Vec::new();
        if self.generation == 0 {
            return notifications;
        }

        if !self.metadata_announced && self.backend.duration().is_some() {
            self.metadata_announced = true;
            notifications.push(Notification {
                kind: NotificationKind::MetadataLoaded,
                generation: self.generation,
            });
        }

        if let Some(position) = self.backend.position() {
            let whole_second = position.as_secs();
            if self.last_whole_second != Some(whole_second) {
                self.last_whole_second = Some(whole_second);
                notifications.push(Notification {
                    kind: NotificationKind::TimeUpdate,
                    generation: self.generation,
                });
            }
        }

        if !self.ended_announced && self.backend.is_finished() {
            self.ended_announced = true;
            notifications.push(Notification {
                kind: NotificationKind::Ended,
                generation: self.generation,
            });
        }

        notifications
    }
}
