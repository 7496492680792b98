use crate::audio::{AudioBackend, NullBackend, RodioBackend};
use crate::config::{self, Settings};
use crate::controller::{PlayerController, ViewState};
use crate::engine::PlaybackEngine;
use crate::library;
use crate::model::TransportMode;
use crate::remote::{self, RemoteCommand, RemoteControls};
use crate::ui;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::Rect;
use ratatui::widgets::ListState;
use std::cell::RefCell;
use std::io::stdout;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

pub struct AppOptions {
    pub root: PathBuf,
    pub shuffle: bool,
    pub repeat: bool,
}

pub fn run(options: AppOptions) -> Result<()> {
    let settings = config::load_settings()?;
    let tracks = library::scan(&options.root)?;

    let audio: Box<dyn AudioBackend> = match RodioBackend::new() {
        Ok(backend) => Box::new(backend),
        Err(_) => Box::new(NullBackend::new()),
    };
    let engine = PlaybackEngine::new(audio);
    let view = Rc::new(RefCell::new(ViewState::new()));
    let mut controller = PlayerController::new(tracks, engine, Rc::clone(&view));
    controller.set_volume(settings.volume);
    controller.set_shuffle(options.shuffle || settings.shuffle);
    controller.set_repeat(options.repeat || settings.repeat);
    let skip_seconds = f64::from(settings.skip_seconds);

    let (mut remote_controls, remote_commands) = match remote::connect() {
        Some((controls, commands)) => (Some(controls), Some(commands)),
        None => (None, None),
    };
    let mut last_remote_sync: Option<(usize, TransportMode)> = None;

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal_backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(terminal_backend)?;
    terminal.clear()?;

    let mut list_state = ListState::default();
    let mut last_tick = Instant::now();
    let mut playlist_area = Rect::default();
    let mut timeline_area = Rect::default();

    let result: Result<()> = loop {
        if let Some(commands) = remote_commands.as_ref() {
            drain_remote_commands(&mut controller, &view, commands);
        }

        report(&view, controller.pump());
        sync_remote(&mut remote_controls, &controller, &mut last_remote_sync);

        let pending_title = {
            let mut view_ref = view.borrow_mut();
            if view_ref.window_title_dirty {
                view_ref.window_title_dirty = false;
                Some(view_ref.window_title.clone())
            } else {
                None
            }
        };
        if let Some(title) = pending_title {
            execute!(terminal.backend_mut(), SetTitle(title))?;
        }

        if view.borrow().dirty || last_tick.elapsed() > Duration::from_millis(250) {
            terminal.draw(|frame| {
                playlist_area = ui::playlist_rect(frame.area());
                timeline_area = ui::timeline_rect(frame.area());
                let view_ref = view.borrow();
                ui::draw(
                    frame,
                    controller.tracks(),
                    controller.state(),
                    &view_ref,
                    controller.volume(),
                    &mut list_state,
                );
            })?;
            view.borrow_mut().dirty = false;
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        let event = event::read()?;
        if let Event::Mouse(mouse) = event {
            handle_mouse(
                &mut controller,
                &view,
                mouse,
                playlist_area,
                timeline_area,
                &list_state,
            );
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break Ok(()),
            KeyCode::Char('q') => break Ok(()),
            KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('c') => controller.toggle(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('k') => {
                report(&view, controller.navigate(-1));
            }
            KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('l') => {
                report(&view, controller.navigate(1));
            }
            KeyCode::Char(',') => report(&view, controller.skip(-skip_seconds)),
            KeyCode::Char('.') => report(&view, controller.skip(skip_seconds)),
            KeyCode::Char('s') => {
                let enabled = !controller.state().shuffle;
                controller.set_shuffle(enabled);
                set_status(&view, format!("Shuffle {}", on_off(enabled)));
            }
            KeyCode::Char('r') => {
                let enabled = !controller.state().repeat;
                controller.set_repeat(enabled);
                set_status(&view, format!("Repeat {}", on_off(enabled)));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let next = (controller.volume() + 0.05).clamp(0.0, 2.0);
                controller.set_volume(next);
                set_status(&view, format!("Volume: {}%", (next * 100.0).round() as u16));
            }
            KeyCode::Char('-') => {
                let next = (controller.volume() - 0.05).clamp(0.0, 2.0);
                controller.set_volume(next);
                set_status(&view, format!("Volume: {}%", (next * 100.0).round() as u16));
            }
            _ => {}
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let save_result = config::save_settings(&Settings {
        volume: controller.volume(),
        skip_seconds: settings.skip_seconds,
        shuffle: controller.state().shuffle,
        repeat: controller.state().repeat,
    });
    result?;
    save_result?;
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn report(view: &Rc<RefCell<ViewState>>, result: Result<()>) {
    if let Err(err) = result {
        let mut view = view.borrow_mut();
        view.status = format!("playback error: {err:#}");
        view.dirty = true;
    }
}

fn set_status(view: &Rc<RefCell<ViewState>>, message: String) {
    let mut view = view.borrow_mut();
    view.status = message;
    view.dirty = true;
}

fn drain_remote_commands(
    controller: &mut PlayerController,
    view: &Rc<RefCell<ViewState>>,
    commands: &Receiver<RemoteCommand>,
) {
    while let Ok(command) = commands.try_recv() {
        match command {
            RemoteCommand::Play => controller.play(),
            RemoteCommand::Pause => controller.pause(),
            RemoteCommand::Toggle => controller.toggle(),
            RemoteCommand::Next => report(view, controller.navigate(1)),
            RemoteCommand::Previous => report(view, controller.navigate(-1)),
        }
    }
}

fn sync_remote(
    remote: &mut Option<RemoteControls>,
    controller: &PlayerController,
    last_sync: &mut Option<(usize, TransportMode)>,
) {
    let Some(remote) = remote.as_mut() else {
        return;
    };
    let state = controller.state();
    let signature = (state.current_index, state.mode);
    if *last_sync == Some(signature) {
        return;
    }
    if let Some(track) = controller.current_track() {
        remote.update(track, state.is_playing(), state.position_seconds);
        *last_sync = Some(signature);
    }
}

fn handle_mouse(
    controller: &mut PlayerController,
    view: &Rc<RefCell<ViewState>>,
    mouse: MouseEvent,
    playlist_area: Rect,
    timeline_area: Rect,
    list_state: &ListState,
) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }

    if let Some(row) = playlist_row_at(mouse.column, mouse.row, playlist_area, list_state.offset())
    {
        if row < controller.tracks().len() {
            report(view, controller.select_track(row));
        }
        return;
    }

    if let Some(fraction) = timeline_fraction_at(mouse.column, mouse.row, timeline_area) {
        let duration = controller.state().duration_seconds;
        if duration.is_finite() && duration > 0.0 {
            report(view, controller.seek_to(fraction * duration));
        }
    }
}

/// Maps a click inside the playlist block onto a track index, accounting for
/// the border row and the current scroll offset.
fn playlist_row_at(x: u16, y: u16, area: Rect, offset: usize) -> Option<usize> {
    if area.width < 3 || area.height < 3 {
        return None;
    }
    let inside_x = x > area.x && x < area.x.saturating_add(area.width.saturating_sub(1));
    let inside_y = y > area.y && y < area.y.saturating_add(area.height.saturating_sub(1));
    if !inside_x || !inside_y {
        return None;
    }
    Some(offset + usize::from(y - area.y - 1))
}

/// Maps a click inside the timeline block onto a 0..=1 position fraction —
/// the commit gesture of the progress control.
fn timeline_fraction_at(x: u16, y: u16, area: Rect) -> Option<f64> {
    if area.width < 3 || area.height < 3 {
        return None;
    }
    let inside_x = x > area.x && x < area.x.saturating_add(area.width.saturating_sub(1));
    let inside_y = y > area.y && y < area.y.saturating_add(area.height.saturating_sub(1));
    if !inside_x || !inside_y {
        return None;
    }
    let span = f64::from(area.width.saturating_sub(3).max(1));
    Some((f64::from(x - area.x - 1) / span).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Track, TrackList};
    use std::sync::mpsc;

    fn controller_with_tracks(len: usize) -> (PlayerController, Rc<RefCell<ViewState>>) {
        let tracks = (0..len)
            .map(|n| Track {
                id: format!("{n:02x}"),
                index: n,
                title: format!("song_{n}"),
                artist: String::from("artist"),
                path: PathBuf::from(format!("song_{n}.flac")),
            })
            .collect();
        let list = TrackList::new(tracks).expect("tracks");
        let engine = PlaybackEngine::new(Box::new(NullBackend::new()));
        let view = Rc::new(RefCell::new(ViewState::new()));
        let controller = PlayerController::new(list, engine, Rc::clone(&view));
        (controller, view)
    }

    #[test]
    fn playlist_click_maps_to_row_inside_borders() {
        let area = Rect::new(0, 3, 40, 10);
        assert_eq!(playlist_row_at(5, 4, area, 0), Some(0));
        assert_eq!(playlist_row_at(5, 6, area, 0), Some(2));
        assert_eq!(playlist_row_at(5, 6, area, 3), Some(5));
    }

    #[test]
    fn playlist_click_outside_block_is_ignored() {
        let area = Rect::new(0, 3, 40, 10);
        assert_eq!(playlist_row_at(5, 3, area, 0), None);
        assert_eq!(playlist_row_at(5, 12, area, 0), None);
        assert_eq!(playlist_row_at(0, 5, area, 0), None);
        assert_eq!(playlist_row_at(39, 5, area, 0), None);
    }

    #[test]
    fn timeline_click_maps_to_a_clamped_fraction() {
        let area = Rect::new(0, 20, 42, 3);
        let left = timeline_fraction_at(1, 21, area).expect("fraction");
        let right = timeline_fraction_at(40, 21, area).expect("fraction");
        assert_eq!(left, 0.0);
        assert!((right - 1.0).abs() < 1e-9);
        assert!(timeline_fraction_at(5, 19, area).is_none());
    }

    #[test]
    fn remote_commands_drive_the_controller() {
        let (mut controller, view) = controller_with_tracks(3);
        let (sender, receiver) = mpsc::channel();

        sender.send(RemoteCommand::Next).expect("send");
        sender.send(RemoteCommand::Next).expect("send");
        sender.send(RemoteCommand::Pause).expect("send");
        drain_remote_commands(&mut controller, &view, &receiver);

        assert_eq!(controller.state().current_index, 2);
        assert_eq!(controller.state().mode, TransportMode::Paused);
    }

    #[test]
    fn remote_toggle_matches_transport_toggle() {
        let (mut controller, view) = controller_with_tracks(2);
        let (sender, receiver) = mpsc::channel();

        sender.send(RemoteCommand::Toggle).expect("send");
        drain_remote_commands(&mut controller, &view, &receiver);
        assert_eq!(controller.state().mode, TransportMode::Playing);

        sender.send(RemoteCommand::Toggle).expect("send");
        drain_remote_commands(&mut controller, &view, &receiver);
        assert_eq!(controller.state().mode, TransportMode::Paused);
    }
}
