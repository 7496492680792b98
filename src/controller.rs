use crate::artwork::{self, ArtGrid};
use crate::engine::{Notification, NotificationKind, PlaybackEngine};
use crate::events::{EventBus, EventKind, Subscriber};
use crate::model::{Track, TrackList, TransportMode, TransportState};
use crate::ui;
use anyhow::{Result, bail};
use rand::RngExt;
use rand::rngs::SmallRng;
use std::cell::RefCell;
use std::rc::Rc;

/// Everything the renderer reads and the UI-sync subscribers write. The
/// controller is the only other writer; bindings never touch it directly.
pub struct ViewState {
    pub now_playing: String,
    pub artist: String,
    pub position_text: String,
    pub duration_text: String,
    pub progress: Option<f64>,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub window_title: String,
    pub window_title_dirty: bool,
    pub transport_label: &'static str,
    pub art: ArtGrid,
    pub status: String,
    pub dirty: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            now_playing: String::from("-"),
            artist: String::from("-"),
            position_text: String::from("00:00"),
            duration_text: String::from("--:--"),
            progress: None,
            position_seconds: 0.0,
            duration_seconds: f64::NAN,
            window_title: String::from("Quaver"),
            window_title_dirty: true,
            transport_label: "Play",
            art: ArtGrid::default(),
            status: String::from("Ready"),
            dirty: true,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the transport state machine: mode, current index, shuffle/repeat.
/// All engine mutation and event dispatch funnels through here.
pub struct PlayerController {
    tracks: TrackList,
    state: TransportState,
    engine: PlaybackEngine,
    bus: EventBus,
    view: Rc<RefCell<ViewState>>,
    rng: SmallRng,
}

impl PlayerController {
    /// Binds the controller to track 0 and eagerly loads its source, paused,
    /// so metadata starts arriving before the first play.
    pub fn new(tracks: TrackList, engine: PlaybackEngine, view: Rc<RefCell<ViewState>>) -> Self {
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::TrackChanged, title_subscriber(Rc::clone(&view)));
        bus.subscribe(EventKind::TrackChanged, art_subscriber(Rc::clone(&view)));
        bus.subscribe(EventKind::TrackLoaded, clock_subscriber(Rc::clone(&view)));
        bus.subscribe(EventKind::TimeUpdate, clock_subscriber(Rc::clone(&view)));

        let mut controller = Self {
            tracks,
            state: TransportState::new(),
            engine,
            bus,
            view,
            rng: rand::make_rng(),
        };

        if let Some(track) = controller.tracks.get(0).cloned() {
            {
                let mut view = controller.view.borrow_mut();
                view.now_playing = track.title.clone();
                view.artist = track.artist.clone();
                view.art = artwork::for_track(&track);
            }
            if let Err(err) = controller.engine.load(&track) {
                let mut view = controller.view.borrow_mut();
                view.status = format!("playback error: {err:#}");
            }
        }

        controller
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn tracks(&self) -> &TrackList {
        &self.tracks
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.state.current_index)
    }

    /// Appends an observer after the built-in subscribers for `kind`.
    pub fn subscribe(&mut self, kind: EventKind, subscriber: Subscriber) {
        self.bus.subscribe(kind, subscriber);
    }

    pub fn play(&mut self) {
        if self.state.mode == TransportMode::Playing {
            return;
        }
        self.state.mode = TransportMode::Playing;
        self.engine.play();
        let mut view = self.view.borrow_mut();
        view.transport_label = "Pause";
        view.dirty = true;
    }

    pub fn pause(&mut self) {
        if self.state.mode == TransportMode::Paused {
            return;
        }
        self.state.mode = TransportMode::Paused;
        self.engine.pause();
        let mut view = self.view.borrow_mut();
        view.transport_label = "Play";
        view.dirty = true;
    }

    /// Single entry point for the primary transport control, the keyboard
    /// binding, and the remote surface.
    pub fn toggle(&mut self) {
        match self.state.mode {
            TransportMode::Paused => self.play(),
            TransportMode::Playing => self.pause(),
        }
    }

    /// Explicit activation of a playlist entry. Bypasses shuffle and repeat.
    pub fn select_track(&mut self, index: usize) -> Result<()> {
        if index >= self.tracks.len() {
            bail!("track index {index} out of range");
        }
        self.switch_to(index)
    }

    /// Moves to an adjacent track. Repeat forces the step to 0, the index
    /// wraps at either end, and shuffle overwrites the result last.
    pub fn navigate(&mut self, direction: i64) -> Result<()> {
        let len = self.tracks.len() as i64;
        let step = if self.state.repeat { 0 } else { direction };

        let mut next = self.state.current_index as i64 + step;
        if next < 0 {
            next = len - 1;
        }
        if next >= len {
            next = 0;
        }

        let mut index = next as usize;
        if self.state.shuffle {
            index = self.rng.random_range(0..self.tracks.len());
        }

        self.switch_to(index)
    }

    /// Absolute seek, clamped to `[0, duration]`. The position display is
    /// updated immediately instead of waiting for the next time-update.
    pub fn seek_to(&mut self, seconds: f64) -> Result<()> {
        let target = self.engine.seek_seconds(seconds)?;
        self.state.position_seconds = target;

        let mut view = self.view.borrow_mut();
        view.position_seconds = target;
        view.position_text = ui::format_clock(target);
        let duration = self.engine.duration_seconds();
        if duration.is_finite() && duration > 0.0 {
            view.progress = Some((target / duration).clamp(0.0, 1.0));
        }
        view.dirty = true;
        Ok(())
    }

    /// Relative seek; clamping happens in `seek_to`.
    pub fn skip(&mut self, delta_seconds: f64) -> Result<()> {
        let position = self.engine.position_seconds();
        let base = if position.is_finite() { position } else { 0.0 };
        self.seek_to(base + delta_seconds)
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.state.shuffle = enabled;
        self.view.borrow_mut().dirty = true;
    }

    pub fn set_repeat(&mut self, enabled: bool) {
        self.state.repeat = enabled;
        self.view.borrow_mut().dirty = true;
    }

    pub fn volume(&self) -> f32 {
        self.engine.volume()
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume);
        self.view.borrow_mut().dirty = true;
    }

    pub fn output_name(&self) -> Option<String> {
        self.engine.output_name()
    }

    /// Drains pending engine notifications. Stale generations are discarded;
    /// an end-of-stream notification is the one place that turns into a
    /// `navigate(+1)` call.
    pub fn pump(&mut self) -> Result<()> {
        let notifications = self.engine.poll();
        self.handle_notifications(notifications)
    }

    fn handle_notifications(&mut self, notifications: Vec<Notification>) -> Result<()> {
        for notification in notifications {
            if notification.generation != self.engine.generation() {
                continue;
            }
            match notification.kind {
                NotificationKind::MetadataLoaded => {
                    self.sync_clock();
                    self.dispatch_current(EventKind::TrackLoaded);
                }
                NotificationKind::TimeUpdate => {
                    self.sync_clock();
                    self.dispatch_current(EventKind::TimeUpdate);
                }
                NotificationKind::Ended => {
                    self.dispatch_current(EventKind::TrackEnded);
                    self.navigate(1)?;
                }
            }
        }
        Ok(())
    }

    /// The one pause-load-resume sequence behind both explicit selection and
    /// navigation.
    fn switch_to(&mut self, index: usize) -> Result<()> {
        let Some(track) = self.tracks.get(index).cloned() else {
            bail!("track index {index} out of range");
        };

        self.state.mode = TransportMode::Paused;
        self.engine.pause();
        self.state.current_index = index;
        self.engine.load(&track)?;
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = f64::NAN;
        self.state.mode = TransportMode::Playing;
        self.engine.play();

        {
            let mut view = self.view.borrow_mut();
            view.now_playing = track.title.clone();
            view.artist = track.artist.clone();
            view.position_seconds = 0.0;
            view.duration_seconds = f64::NAN;
            view.position_text = String::from("00:00");
            view.duration_text = String::from("--:--");
            view.progress = None;
            view.transport_label = "Pause";
            view.dirty = true;
        }

        self.dispatch(EventKind::TrackChanged, &track);
        Ok(())
    }

    fn sync_clock(&mut self) {
        self.state.position_seconds = self.engine.position_seconds();
        self.state.duration_seconds = self.engine.duration_seconds();
        let mut view = self.view.borrow_mut();
        view.position_seconds = self.state.position_seconds;
        view.duration_seconds = self.state.duration_seconds;
    }

    fn dispatch_current(&mut self, kind: EventKind) {
        let Some(track) = self.tracks.get(self.state.current_index).cloned() else {
            return;
        };
        self.dispatch(kind, &track);
    }

    fn dispatch(&mut self, kind: EventKind, track: &Track) {
        self.bus.dispatch(kind, track);
        if let Some(failure) = self.bus.take_failure() {
            let mut view = self.view.borrow_mut();
            view.status = failure;
            view.dirty = true;
        }
    }
}

fn title_subscriber(view: Rc<RefCell<ViewState>>) -> Subscriber {
    Box::new(move |track| {
        let mut view = view.borrow_mut();
        view.window_title = format!("Quaver - {}", track.title);
        view.window_title_dirty = true;
        view.dirty = true;
        Ok(())
    })
}

fn art_subscriber(view: Rc<RefCell<ViewState>>) -> Subscriber {
    Box::new(move |track| {
        let mut view = view.borrow_mut();
        view.art = artwork::for_track(track);
        view.dirty = true;
        Ok(())
    })
}

fn clock_subscriber(view: Rc<RefCell<ViewState>>) -> Subscriber {
    Box::new(move |_track| {
        let mut view = view.borrow_mut();
        if view.duration_seconds.is_nan() || view.position_seconds.is_nan() {
            return Ok(());
        }
        view.position_text = ui::format_clock(view.position_seconds);
        view.duration_text = ui::format_clock(view.duration_seconds);
        view.progress = (view.duration_seconds > 0.0)
            .then(|| (view.position_seconds / view.duration_seconds).clamp(0.0, 1.0));
        view.dirty = true;
        Ok(())
    })
}
