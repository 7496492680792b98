use anyhow::Result;
use quaver::audio::AudioBackend;
use quaver::controller::{PlayerController, ViewState};
use quaver::engine::PlaybackEngine;
use quaver::events::EventKind;
use quaver::model::{Track, TrackList, TransportMode};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

#[derive(Default)]
struct FakeState {
    loaded: Vec<PathBuf>,
    playing: bool,
    position: Duration,
    duration: Option<Duration>,
    finished: bool,
    volume: f32,
}

/// Scripted stand-in for the streaming primitive; the test keeps a clone of
/// the handle to steer duration and end-of-stream from outside.
#[derive(Clone, Default)]
struct FakeBackend(Rc<RefCell<FakeState>>);

impl AudioBackend for FakeBackend {
    fn load(&mut self, path: &Path) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.loaded.push(path.to_path_buf());
        state.playing = false;
        state.position = Duration::ZERO;
        state.duration = Some(Duration::from_secs(180));
        state.finished = false;
        Ok(())
    }

    fn play(&mut self) {
        self.0.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.0.borrow_mut().playing = false;
    }

    fn is_paused(&self) -> bool {
        !self.0.borrow().playing
    }

    fn position(&self) -> Option<Duration> {
        let state = self.0.borrow();
        (!state.loaded.is_empty()).then_some(state.position)
    }

    fn duration(&self) -> Option<Duration> {
        self.0.borrow().duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        self.0.borrow_mut().position = position;
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.0.borrow().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.borrow_mut().volume = volume;
    }

    fn output_name(&self) -> Option<String> {
        Some(String::from("fake"))
    }

    fn is_finished(&self) -> bool {
        self.0.borrow().finished
    }
}

fn four_tracks() -> TrackList {
    let tracks = (0..4)
        .map(|n| Track {
            id: format!("{n:02x}"),
            index: n,
            title: format!("song_{n}"),
            artist: format!("artist_{n}"),
            path: PathBuf::from(format!("song_{n}.mp3")),
        })
        .collect();
    TrackList::new(tracks).expect("four tracks")
}

#[test]
fn click_then_ended_twice_walks_and_wraps_the_playlist() {
    let backend = FakeBackend::default();
    let engine = PlaybackEngine::new(Box::new(backend.clone()));
    let view = Rc::new(RefCell::new(ViewState::new()));
    let mut controller = PlayerController::new(four_tracks(), engine, Rc::clone(&view));

    let changes = Rc::new(RefCell::new(Vec::new()));
    let observer = Rc::clone(&changes);
    controller.subscribe(
        EventKind::TrackChanged,
        Box::new(move |track| {
            observer.borrow_mut().push(track.index);
            Ok(())
        }),
    );

    // activating track 2 bypasses shuffle/repeat and starts playback
    controller.select_track(2).expect("select");
    assert_eq!(controller.state().current_index, 2);
    assert_eq!(controller.state().mode, TransportMode::Playing);
    assert_eq!(*changes.borrow(), vec![2]);
    assert_eq!(
        backend.0.borrow().loaded.last(),
        Some(&PathBuf::from("song_2.mp3"))
    );
    assert_eq!(view.borrow().window_title, "Quaver - song_2");

    backend.0.borrow_mut().finished = true;
    controller.pump().expect("pump");
    assert_eq!(controller.state().current_index, 3);

    backend.0.borrow_mut().finished = true;
    controller.pump().expect("pump");
    assert_eq!(controller.state().current_index, 0);

    assert_eq!(*changes.borrow(), vec![2, 3, 0]);
}

#[test]
fn ended_with_repeat_keeps_replaying_the_same_track() {
    let backend = FakeBackend::default();
    let engine = PlaybackEngine::new(Box::new(backend.clone()));
    let view = Rc::new(RefCell::new(ViewState::new()));
    let mut controller = PlayerController::new(four_tracks(), engine, Rc::clone(&view));

    controller.select_track(1).expect("select");
    controller.set_repeat(true);

    for _ in 0..3 {
        backend.0.borrow_mut().finished = true;
        controller.pump().expect("pump");
        assert_eq!(controller.state().current_index, 1);
    }

    let replays = backend
        .0
        .borrow()
        .loaded
        .iter()
        .filter(|path| *path == &PathBuf::from("song_1.mp3"))
        .count();
    assert_eq!(replays, 4);
}

#[test]
fn clock_display_tracks_the_engine_through_events() {
    let backend = FakeBackend::default();
    let engine = PlaybackEngine::new(Box::new(backend.clone()));
    let view = Rc::new(RefCell::new(ViewState::new()));
    let mut controller = PlayerController::new(four_tracks(), engine, Rc::clone(&view));

    controller.select_track(0).expect("select");
    backend.0.borrow_mut().position = Duration::from_secs(65);
    controller.pump().expect("pump");

    assert_eq!(view.borrow().position_text, "01:05");
    assert_eq!(view.borrow().duration_text, "03:00");
    let progress = view.borrow().progress.expect("progress present");
    assert!((progress - 65.0 / 180.0).abs() < 1e-9);
}
