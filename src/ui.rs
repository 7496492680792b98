use crate::artwork::ArtGrid;
use crate::controller::ViewState;
use crate::model::{TrackList, TransportState};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

const APP_TITLE_WITH_VERSION: &str = "Quaver v0.1.0  ";

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

fn palette() -> Palette {
    Palette {
        bg: Color::Rgb(10, 15, 24),
        panel_bg: Color::Rgb(19, 29, 43),
        panel_alt_bg: Color::Rgb(24, 38, 58),
        border: Color::Rgb(69, 121, 176),
        text: Color::Rgb(214, 228, 248),
        muted: Color::Rgb(149, 173, 204),
        accent: Color::Rgb(100, 203, 184),
        alert: Color::Rgb(249, 174, 88),
        selected_bg: Color::Rgb(34, 55, 82),
    }
}

/// Two-digit minutes and seconds, `"MM:SS"`. Minutes are not capped, so an
/// hour renders as `"60:00"`. Callers guard against NaN input.
pub fn format_clock(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    let secs = (seconds - minutes * 60.0).floor();
    format!("{:02}:{:02}", minutes as u64, secs as u64)
}

fn split_vertical(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area)
}

fn split_body(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
        .split(area)
}

/// Block area of the playlist, used by the bindings for click mapping.
pub fn playlist_rect(area: Rect) -> Rect {
    split_body(split_vertical(area)[1])[0]
}

/// Block area of the timeline bar, used by the bindings for click-to-seek.
pub fn timeline_rect(area: Rect) -> Rect {
    split_vertical(area)[2]
}

pub fn draw(
    frame: &mut Frame,
    tracks: &TrackList,
    transport: &TransportState,
    view: &ViewState,
    volume: f32,
    list_state: &mut ListState,
) {
    let colors = palette();
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = split_vertical(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            APP_TITLE_WITH_VERSION,
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("Tracks {}", tracks.len()),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!("[{}]", view.transport_label),
            Style::default().fg(colors.alert),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            format!(
                "Shuffle {}  Repeat {}",
                on_off(transport.shuffle),
                on_off(transport.repeat)
            ),
            Style::default().fg(colors.text),
        ),
    ]))
    .block(panel_block("Status", colors.panel_bg, colors.text, colors.border));
    frame.render_widget(header, vertical[0]);

    let body = split_body(vertical[1]);

    let items: Vec<ListItem> = tracks
        .tracks()
        .iter()
        .map(|track| {
            let marker = if track.index == transport.current_index {
                "  > "
            } else {
                "    "
            };
            let row_style = if track.index == transport.current_index {
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.text)
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.muted)),
                Span::styled(format!("{:>3}  ", track.index + 1), Style::default().fg(colors.muted)),
                Span::styled(track.title.clone(), row_style),
                Span::styled(
                    format!("  - {}", track.artist),
                    Style::default().fg(colors.muted),
                ),
            ]))
        })
        .collect();

    list_state.select(Some(transport.current_index));

    let list = List::new(items)
        .block(panel_block(
            "Playlist",
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("-> ");
    frame.render_stateful_widget(list, body[0], list_state);

    let mut info_text = art_lines(&view.art);
    info_text.push(Line::from(""));
    info_text.push(Line::from(vec![
        Span::styled(
            "Now",
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", view.now_playing),
            Style::default().fg(colors.text),
        ),
    ]));
    info_text.push(Line::from(Span::styled(
        format!("Artist  {}", view.artist),
        Style::default().fg(colors.muted),
    )));
    let info_block = Paragraph::new(info_text)
        .block(panel_block(
            "Now Playing",
            colors.panel_alt_bg,
            colors.text,
            colors.border,
        ))
        .wrap(Wrap { trim: true });
    frame.render_widget(info_block, body[1]);

    let timeline = Paragraph::new(Span::styled(
        timeline_line(view, volume, 26, 14),
        Style::default().fg(colors.text),
    ))
    .block(panel_block(
        "Timeline",
        colors.panel_bg,
        colors.text,
        colors.border,
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(timeline, vertical[2]);

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            "Keys: Space play/pause, h/l prev/next, ,/. skip, s shuffle, r repeat, click list or bar, q quit",
            Style::default().fg(colors.muted),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(view.status.as_str(), Style::default().fg(colors.text)),
    ]))
    .block(panel_block(
        "Message",
        colors.panel_bg,
        colors.text,
        colors.border,
    ));
    frame.render_widget(footer, vertical[3]);
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

// pairs of pixel rows collapse into one row of upper-half blocks
fn art_lines(art: &ArtGrid) -> Vec<Line<'static>> {
    if art.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut y = 0;
    while y + 1 < art.height() {
        let mut spans = Vec::with_capacity(art.width() as usize);
        for x in 0..art.width() {
            let (tr, tg, tb) = art.pixel(x, y);
            let (br, bg, bb) = art.pixel(x, y + 1);
            spans.push(Span::styled(
                "\u{2580}",
                Style::default()
                    .fg(Color::Rgb(tr, tg, tb))
                    .bg(Color::Rgb(br, bg, bb)),
            ));
        }
        lines.push(Line::from(spans));
        y += 2;
    }
    lines
}

fn progress_bar(ratio: Option<f64>, width: usize) -> String {
    let clamped = ratio.unwrap_or(0.0).clamp(0.0, 1.0);
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width + 2);
    bar.push('[');
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar.push(']');
    bar
}

fn timeline_line(
    view: &ViewState,
    volume: f32,
    timeline_bar_width: usize,
    volume_bar_width: usize,
) -> String {
    let volume_percent = (volume * 100.0).round() as u16;
    let volume_ratio = f64::from(volume.clamp(0.0, 1.0));

    format!(
        "{} / {} {}  |  Vol {} {:>3}%  +/- adjust",
        view.position_text,
        view.duration_text,
        progress_bar(view.progress, timeline_bar_width),
        progress_bar(Some(volume_ratio), volume_bar_width),
        volume_percent
    )
}
