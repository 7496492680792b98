use anyhow::{Result, bail};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Paused,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub index: usize,
    pub title: String,
    pub artist: String,
    pub path: PathBuf,
}

/// Ordered, immutable-after-load playlist. Always holds at least one track,
/// and `tracks[n].index == n`.
#[derive(Debug, Clone)]
pub struct TrackList {
    tracks: Vec<Track>,
}

impl TrackList {
    pub fn new(mut tracks: Vec<Track>) -> Result<Self> {
        if tracks.is_empty() {
            bail!("track list is empty");
        }
        for (index, track) in tracks.iter_mut().enumerate() {
            track.index = index;
        }
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

/// Transport snapshot owned by the controller. `duration_seconds` stays NaN
/// until the engine reports metadata for the current load.
#[derive(Debug, Clone, Copy)]
pub struct TransportState {
    pub mode: TransportMode,
    pub current_index: usize,
    pub shuffle: bool,
    pub repeat: bool,
    pub position_seconds: f64,
    pub duration_seconds: f64,
}

impl TransportState {
    pub fn new() -> Self {
        Self {
            mode: TransportMode::Paused,
            current_index: 0,
            shuffle: false,
            repeat: false,
            position_seconds: 0.0,
            duration_seconds: f64::NAN,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.mode == TransportMode::Playing
    }
}

impl Default for TransportState {
    fn default() -> Self {
        Self::new()
    }
}
