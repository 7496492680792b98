#![no_main]

use libfuzzer_sys::fuzz_target;
use quaver::audio::NullBackend;
use quaver::controller::{PlayerController, ViewState};
use quaver::engine::PlaybackEngine;
use quaver::model::{Track, TrackList};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

fuzz_target!(|data: &[u8]| {
    let len = (data.len() % 32).max(1);
    let tracks: Vec<Track> = (0..len)
        .map(|n| Track {
            id: format!("{n:02x}"),
            index: n,
            title: format!("track_{n}"),
            artist: String::from("fuzz"),
            path: PathBuf::from(format!("track_{n}.mp3")),
        })
        .collect();
    let Ok(list) = TrackList::new(tracks) else {
        return;
    };

    let engine = PlaybackEngine::new(Box::new(NullBackend::new()));
    let view = Rc::new(RefCell::new(ViewState::new()));
    let mut controller = PlayerController::new(list, engine, Rc::clone(&view));

    for byte in data {
        match byte % 8 {
            0 => {
                let _ = controller.navigate(1);
            }
            1 => {
                let _ = controller.navigate(-1);
            }
            2 => controller.toggle(),
            3 => {
                let _ = controller.select_track(usize::from(*byte) % len);
            }
            4 => controller.set_shuffle(byte & 1 == 0),
            5 => controller.set_repeat(byte & 1 == 0),
            6 => {
                let _ = controller.seek_to(f64::from(*byte) * 3.0 - 90.0);
            }
            _ => {
                let _ = controller.pump();
            }
        }

        assert!(controller.state().current_index < len);
        assert!(controller.state().position_seconds >= 0.0 || controller.state().position_seconds.is_nan());
    }
});
