use std::env;
use std::path::Path;
use std::sync::{Arc, mpsc};

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::ai;
use crate::app::{App, WorkerMsg};
use crate::audio::AudioPlayer;
use crate::deck::Deck;
use crate::library::scan;
use crate::studio::QuickDrop;
use crate::task::ProgressController;

mod event_loop;
mod logging;
mod settings;
mod startup;
mod workers;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_problem) = settings::load_settings();
    let log_path = logging::init_logging(&settings.logging)?;
    info!(log = ?log_path, "riffline starting");
    if let Some(msg) = &config_problem {
        warn!("{msg}");
    }

    let dir = env::args().nth(1).unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let library = scan(Path::new(&dir), &settings.library);
    let mut app = App::new(library);
    app.set_library_dir(dir);
    if let Some(msg) = config_problem {
        app.set_notice(msg);
    }

    let client = match ai::connect(&settings.ai) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "AI features disabled");
            app.ai_available = false;
            app.set_notice(e.to_string());
            None
        }
    };

    startup::restore_studio(&mut app, &settings);

    let deck = Deck::new(AudioPlayer::new(settings.audio.clone()));
    let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();
    let workers = workers::Workers {
        client,
        controller: ProgressController::new(settings.task.clone()),
        quick_drop: Arc::new(QuickDrop::default()),
        preview_seconds: settings.studio.preview_seconds,
        tx: worker_tx,
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &deck,
            &workers,
            &worker_rx,
            &mut state,
        )
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    startup::save_studio(&app, &settings);
    deck.shutdown();
    info!("riffline stopped");

    run_result
}
