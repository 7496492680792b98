use crate::model::Track;
use souvlaki::{
    MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, MediaPosition, PlatformConfig,
};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
}

/// Handle on the platform media-key surface (MPRIS / SMTC / macOS now
/// playing). Injected as an `Option`: when the platform refuses, the player
/// simply runs without remote bindings.
pub struct RemoteControls {
    controls: MediaControls,
}

pub fn connect() -> Option<(RemoteControls, Receiver<RemoteCommand>)> {
    let config = PlatformConfig {
        dbus_name: "quaver",
        display_name: "Quaver",
        hwnd: None,
    };
    let mut controls = MediaControls::new(config).ok()?;

    let (sender, receiver) = mpsc::channel();
    controls
        .attach(move |event| {
            if let Some(command) = map_event(&event) {
                let _ = sender.send(command);
            }
        })
        .ok()?;

    Some((RemoteControls { controls }, receiver))
}

fn map_event(event: &MediaControlEvent) -> Option<RemoteCommand> {
    match event {
        MediaControlEvent::Play => Some(RemoteCommand::Play),
        MediaControlEvent::Pause => Some(RemoteCommand::Pause),
        MediaControlEvent::Toggle => Some(RemoteCommand::Toggle),
        MediaControlEvent::Next => Some(RemoteCommand::Next),
        MediaControlEvent::Previous => Some(RemoteCommand::Previous),
        _ => None,
    }
}

impl RemoteControls {
    /// Pushes the current track and transport mode out to the platform
    /// surface. Failures are swallowed; the remote display is best effort.
    pub fn update(&mut self, track: &Track, playing: bool, position_seconds: f64) {
        let _ = self.controls.set_metadata(MediaMetadata {
            title: Some(&track.title),
            artist: Some(&track.artist),
            ..MediaMetadata::default()
        });

        let progress = position_seconds
            .is_finite()
            .then(|| MediaPosition(Duration::from_secs_f64(position_seconds.max(0.0))));
        let playback = if playing {
            MediaPlayback::Playing { progress }
        } else {
            MediaPlayback::Paused { progress }
        };
        let _ = self.controls.set_playback(playback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_key_events_map_onto_transport_commands() {
        assert_eq!(
            map_event(&MediaControlEvent::Play),
            Some(RemoteCommand::Play)
        );
        assert_eq!(
            map_event(&MediaControlEvent::Pause),
            Some(RemoteCommand::Pause)
        );
        assert_eq!(
            map_event(&MediaControlEvent::Toggle),
            Some(RemoteCommand::Toggle)
        );
        assert_eq!(
            map_event(&MediaControlEvent::Next),
            Some(RemoteCommand::Next)
        );
        assert_eq!(
            map_event(&MediaControlEvent::Previous),
            Some(RemoteCommand::Previous)
        );
    }

    #[test]
    fn unrelated_events_are_ignored() {
        assert_eq!(map_event(&MediaControlEvent::Stop), None);
        assert_eq!(map_event(&MediaControlEvent::Raise), None);
    }
}
