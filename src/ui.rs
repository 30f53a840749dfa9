//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{
        Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Sparkline, Tabs,
        Wrap,
    },
};
use std::time::Duration;

use crate::app::{App, ChatLine, Field, Panel};
use crate::audio::{BAR_RANGE, MIN_BAR_HEIGHT, PlaybackInfo};
use crate::config::UiSettings;
use crate::studio::{SongDraft, WizardStep};
use crate::task::{ProgressSnapshot, TaskStatus};

const CONTROLS: &[(&str, &str)] = &[
    ("tab", "panel"),
    ("S-tab", "prev panel"),
    ("enter", "generate/play"),
    ("up/down", "select/field"),
    ("C-n/C-b", "wizard step"),
    ("C-g", "regenerate"),
    ("C-p", "pause task"),
    ("C-s", "stop task"),
    ("F5", "play/pause"),
    ("C-r", "reset studio"),
    ("esc", "quit"),
];

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Idle => "Idle",
        TaskStatus::Running => "Running",
        TaskStatus::Paused => "Paused",
        TaskStatus::Stopped => "Stopped",
        TaskStatus::Errored => "Error",
        TaskStatus::Completed => "Done",
    }
}

fn padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// "Title - Artist [01:02 / 03:04] Playing", or what is wrong with playback.
pub(crate) fn now_playing_text(info: &PlaybackInfo) -> String {
    if let Some(err) = &info.error {
        return format!("Audio unavailable: {err}");
    }
    let Some(title) = &info.title else {
        return "Nothing on deck".to_string();
    };
    let mut text = match info.artist.as_deref().map(str::trim) {
        Some(a) if !a.is_empty() => format!("{title} - {a}"),
        _ => title.clone(),
    };
    let total = info.duration.map(format_mmss).unwrap_or_else(|| "--:--".into());
    text.push_str(&format!(" [{} / {}]", format_mmss(info.elapsed), total));
    text.push_str(if info.playing { " Playing" } else { " Paused" });
    text
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    task: &ProgressSnapshot,
    playback: &PlaybackInfo,
    ui_settings: &UiSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header tabs
    let tabs = Tabs::new(Panel::ALL.iter().map(|p| p.title()))
        .select(app.panel.index())
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(ui_settings.header_text.as_str())
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(tabs, chunks[0]);

    draw_task(frame, app, task, chunks[1]);

    match app.panel {
        Panel::QuickDrop => draw_quick_drop(frame, app, chunks[2]),
        Panel::Studio => draw_studio(frame, app, chunks[2]),
        Panel::Library => draw_library(frame, app, chunks[2]),
        Panel::Chat => draw_chat(frame, app, chunks[2]),
    }

    let bars: Vec<u64> = playback.bars.iter().map(|b| b.round() as u64).collect();
    let visualizer = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title(" visualizer "))
        .max((MIN_BAR_HEIGHT + BAR_RANGE) as u64)
        .style(Style::default().fg(Color::Cyan))
        .data(bars);
    frame.render_widget(visualizer, chunks[3]);

    let now_playing = Paragraph::new(now_playing_text(playback)).block(padded(" now playing "));
    frame.render_widget(now_playing, chunks[4]);

    let footer = Paragraph::new(controls_text())
        .block(padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);
}

fn draw_task(frame: &mut Frame, app: &App, task: &ProgressSnapshot, area: Rect) {
    let mut title = format!(" {} ", status_label(task.status));
    if !task.message.is_empty() {
        title = format!(" {}: {} ", status_label(task.status), task.message);
    }
    if let Some(notice) = &app.notice {
        title.push_str(&format!("• {notice} "));
    }

    let style = match task.status {
        TaskStatus::Errored => Style::default().fg(Color::Red),
        TaskStatus::Stopped | TaskStatus::Paused => Style::default().fg(Color::Yellow),
        s if s.is_active() => Style::default().fg(Color::Green),
        _ => Style::default().fg(Color::DarkGray),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .gauge_style(style)
        .ratio((task.progress as f64 / 100.0).clamp(0.0, 1.0))
        .label(format!("{:.0}%", task.progress));
    frame.render_widget(gauge, area);
}

fn field_line(app: &App, field: Field) -> Line<'static> {
    let focused = app.active_field() == Some(field);
    let marker = if focused { "> " } else { "  " };
    let text = format!("{marker}{}: {}", field.label(), app.field_value(field));
    if focused {
        Line::from(text).bold()
    } else {
        Line::from(text)
    }
}

fn draft_lines(draft: &SongDraft) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(format!("Title: {}", draft.title)).bold(),
        Line::from(format!(
            "Style: {} • {} bpm • key {} • cover: {}",
            draft.style,
            draft.bpm,
            draft.key,
            if draft.cover.is_some() { "yes" } else { "none" }
        )),
        Line::from(""),
    ];
    lines.extend(draft.lyrics.lines().map(|l| Line::from(l.to_string())));
    lines
}

fn draw_quick_drop(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(1)])
        .split(area);

    let mut input = vec![field_line(app, Field::Idea), field_line(app, Field::Style)];
    if app.quick_drop_request().is_none() && !app.busy {
        input[0] = input[0].clone().dim();
    }
    let title = if app.ai_available {
        " quick drop "
    } else {
        " quick drop (AI offline) "
    };
    frame.render_widget(Paragraph::new(input).block(padded(title)), chunks[0]);

    let body = match &app.last_draft {
        Some(draft) => draft_lines(draft),
        None => vec![Line::from("Type an idea and press enter.").italic()],
    };
    frame.render_widget(
        Paragraph::new(body)
            .block(padded(" draft "))
            .wrap(Wrap { trim: false }),
        chunks[1],
    );
}

fn draw_studio(frame: &mut Frame, app: &App, area: Rect) {
    let wizard = &app.wizard;
    let steps = WizardStep::ALL
        .iter()
        .map(|s| {
            if *s == wizard.step() {
                format!("[{}]", s.label())
            } else {
                s.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" › ");

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    frame.render_widget(Paragraph::new(steps).alignment(Alignment::Center), chunks[0]);

    match wizard.step() {
        WizardStep::Concept => {
            let lines = vec![
                field_line(app, Field::Concept),
                field_line(app, Field::Genre),
                field_line(app, Field::Mood),
            ];
            frame.render_widget(Paragraph::new(lines).block(padded(" concept ")), chunks[1]);
        }
        WizardStep::Lyrics => {
            let items: Vec<ListItem> = wizard
                .lyric_options()
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    let chosen = if wizard.selected_lyrics() == Some(i) { "✓ " } else { "  " };
                    let first = text.lines().find(|l| !l.starts_with('[')).unwrap_or(text);
                    ListItem::new(format!("{chosen}{first}"))
                })
                .collect();
            let list = List::new(items)
                .block(padded(" lyrics (enter: generate / pick) "))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                .highlight_symbol("> ");
            let mut state = ListState::default();
            if !wizard.lyric_options().is_empty() {
                state.select(Some(app.lyric_cursor));
            }
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }
        WizardStep::Arrangement => {
            let text = match wizard.arrangement() {
                Some(a) => format!("Title: {}\nTempo: {} bpm\nKey: {}", a.title, a.bpm, a.key),
                None => "Press enter to compose an arrangement.".to_string(),
            };
            frame.render_widget(Paragraph::new(text).block(padded(" arrangement ")), chunks[1]);
        }
        WizardStep::Review => {
            let body = match wizard.draft() {
                Some(draft) => draft_lines(&draft),
                None => vec![Line::from("Nothing to review yet.")],
            };
            frame.render_widget(
                Paragraph::new(body)
                    .block(padded(" review (enter: preview) "))
                    .wrap(Wrap { trim: false }),
                chunks[1],
            );
        }
    }

    if let Some(reason) = wizard.blocked_reason() {
        frame.render_widget(Paragraph::new(reason).italic(), chunks[2]);
    }
}

fn draw_library(frame: &mut Frame, app: &App, area: Rect) {
    // Only build ListItems for the visible window, keeping the selection centred.
    let total = app.library.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = app.selected.min(total.saturating_sub(1));
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let items: Vec<ListItem> = app.library[start..end]
        .iter()
        .map(|e| ListItem::new(e.display.as_str()))
        .collect();
    let title = match &app.library_dir {
        Some(dir) => format!(" library: {dir} "),
        None => " library ".to_string(),
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn transcript_line(line: &ChatLine) -> Line<'static> {
    if line.from_user {
        Line::from(format!("you: {}", line.text)).bold()
    } else {
        Line::from(format!("  {}", line.text))
    }
}

fn draw_chat(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    // Keep the newest lines in view.
    let visible = chunks[0].height.saturating_sub(2) as usize;
    let skip = app.transcript.len().saturating_sub(visible);
    let lines: Vec<Line> = app.transcript[skip..].iter().map(transcript_line).collect();
    frame.render_widget(
        Paragraph::new(lines)
            .block(padded(" assistant "))
            .wrap(Wrap { trim: false }),
        chunks[0],
    );

    let input = if app.busy {
        Line::from("thinking...").italic()
    } else {
        field_line(app, Field::Message)
    };
    frame.render_widget(Paragraph::new(input).block(padded(" message ")), chunks[1]);
}
