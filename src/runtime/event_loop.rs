use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::app::{App, Followup, Panel, WorkerMsg};
use crate::config;
use crate::deck::Deck;
use crate::studio::WizardStep;
use crate::ui;

use super::workers::Workers;

const AI_UNAVAILABLE: &str = "AI service unavailable, check [ai] provider.";

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Set by the first Ctrl-r; the second one confirms the studio reset.
    pub confirm_reset: bool,
}

/// Main terminal event loop: handles input, drawing, and results coming back
/// from worker threads. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    deck: &Deck,
    workers: &Workers,
    worker_rx: &mpsc::Receiver<WorkerMsg>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let poll = settings.audio.frame_interval().max(Duration::from_millis(16));

    loop {
        while let Ok(msg) = worker_rx.try_recv() {
            match app.apply(msg) {
                Followup::Preview(draft) => workers.preview(draft, deck.current_track()),
                Followup::Play(track) => deck.update_track(track),
                Followup::None => {}
            }
        }

        let task = workers.controller.snapshot();
        let playback = deck
            .playback_handle()
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default();
        terminal.draw(|f| ui::draw(f, app, &task, &playback, &settings.ui))?;

        if event::poll(poll)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app, deck, workers, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns `true` when the user asked to quit.
fn handle_key_event(
    key: KeyEvent,
    app: &mut App,
    deck: &Deck,
    workers: &Workers,
    state: &mut EventLoopState,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let arming_reset = ctrl && key.code == KeyCode::Char('r');
    if !arming_reset && state.confirm_reset {
        state.confirm_reset = false;
        app.clear_notice();
    }

    match key.code {
        KeyCode::Esc => return quit(workers),
        KeyCode::Char('q') if ctrl => return quit(workers),
        KeyCode::Tab => app.next_panel(),
        KeyCode::BackTab => app.prev_panel(),
        KeyCode::Up => app.prev(),
        KeyCode::Down => app.next(),
        KeyCode::F(5) => deck.toggle_play(),
        KeyCode::Char(' ') if ctrl => deck.toggle_play(),
        KeyCode::Char('p') if ctrl => {
            let controller = &workers.controller;
            if !controller.pause() {
                controller.resume();
            }
        }
        KeyCode::Char('s') if ctrl => {
            workers.controller.stop();
        }
        KeyCode::Char('n') if ctrl && app.panel == Panel::Studio => advance_wizard(app),
        KeyCode::Char('b') if ctrl && app.panel == Panel::Studio => {
            app.wizard.back();
        }
        KeyCode::Char('g') if ctrl && app.panel == Panel::Studio => regenerate(app, workers),
        KeyCode::Char('r') if ctrl => {
            let confirmed = state.confirm_reset;
            if app.wizard.reset(|| confirmed) {
                state.confirm_reset = false;
                app.lyric_cursor = 0;
                app.set_notice("Studio reset.");
            } else {
                state.confirm_reset = true;
                app.set_notice("Press Ctrl-r again to reset the studio.");
            }
        }
        KeyCode::Enter => on_enter(app, deck, workers),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Char(c) if !ctrl && !c.is_control() => app.push_char(c),
        _ => {}
    }

    false
}

fn quit(workers: &Workers) -> bool {
    // A running worker exits at its next checkpoint.
    workers.controller.stop();
    info!("quit requested");
    true
}

fn on_enter(app: &mut App, deck: &Deck, workers: &Workers) {
    match app.panel {
        Panel::QuickDrop => {
            let Some(request) = app.quick_drop_request() else {
                debug!("quick drop disabled");
                return;
            };
            if workers.quick_drop(request) {
                app.busy = true;
                app.clear_notice();
            } else {
                app.set_notice(AI_UNAVAILABLE);
            }
        }
        Panel::Studio => match app.wizard.step() {
            WizardStep::Concept => advance_wizard(app),
            WizardStep::Lyrics if app.wizard.lyric_options().is_empty() => regenerate(app, workers),
            WizardStep::Lyrics => {
                app.wizard.select_lyrics(app.lyric_cursor);
            }
            WizardStep::Arrangement if app.wizard.arrangement().is_none() => {
                regenerate(app, workers)
            }
            WizardStep::Arrangement => advance_wizard(app),
            WizardStep::Review => {
                if let Some(draft) = app.wizard.draft() {
                    workers.preview(draft, deck.current_track());
                }
            }
        },
        Panel::Chat => {
            let Some(message) = app.take_message() else {
                return;
            };
            if workers.chat(message) {
                app.busy = true;
                app.clear_notice();
            } else {
                app.set_notice(AI_UNAVAILABLE);
            }
        }
        Panel::Library => {
            if let Some(entry) = app.selected_entry().cloned() {
                info!(path = %entry.path.display(), "loading library track");
                workers.load(entry);
            } else {
                app.set_notice("The library is empty.");
            }
        }
    }
}

fn advance_wizard(app: &mut App) {
    if app.wizard.advance() {
        app.clear_notice();
    } else if let Some(reason) = app.wizard.blocked_reason() {
        app.set_notice(reason);
    }
}

/// Run the generator for the current wizard step.
fn regenerate(app: &mut App, workers: &Workers) {
    if app.busy {
        return;
    }
    let Some(request) = app.wizard.lyrics_request() else {
        app.set_notice("Describe a concept first.");
        return;
    };

    let spawned = match app.wizard.step() {
        WizardStep::Lyrics => workers.lyric_options(request),
        WizardStep::Arrangement => {
            let lyrics = app
                .wizard
                .selected_lyrics()
                .and_then(|i| app.wizard.lyric_options().get(i))
                .cloned()
                .unwrap_or_default();
            workers.arrangement(request, lyrics)
        }
        _ => return,
    };

    if spawned {
        app.busy = true;
        app.clear_notice();
    } else {
        app.set_notice(AI_UNAVAILABLE);
    }
}
