use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{debug, warn};

use crate::ai::AiClient;
use crate::app::WorkerMsg;
use crate::library::{LibraryEntry, Track, load_track};
use crate::studio::{
    DropRequest, LyricsRequest, QuickDrop, SongDraft, compose_arrangement, drain_chat,
    generate_lyric_options, rerender_track,
};
use crate::task::ProgressController;

/// Everything a worker thread needs; cheap to clone into each spawn.
#[derive(Clone)]
pub struct Workers {
    pub client: Option<Arc<dyn AiClient>>,
    pub controller: ProgressController,
    pub quick_drop: Arc<QuickDrop>,
    pub preview_seconds: u64,
    pub tx: Sender<WorkerMsg>,
}

impl Workers {
    fn send(&self, msg: WorkerMsg) {
        if self.tx.send(msg).is_err() {
            warn!("UI went away before a worker finished");
        }
    }

    /// Returns `false` without spawning when no AI client is available.
    pub fn quick_drop(&self, request: DropRequest) -> bool {
        let Some(client) = self.client.clone() else {
            return false;
        };
        let this = self.clone();
        thread::spawn(move || {
            let result = this
                .quick_drop
                .generate(&request, client.as_ref(), &this.controller);
            this.send(WorkerMsg::Draft(result));
        });
        true
    }

    pub fn lyric_options(&self, request: LyricsRequest) -> bool {
        let Some(client) = self.client.clone() else {
            return false;
        };
        let this = self.clone();
        thread::spawn(move || {
            let result = generate_lyric_options(&request, client.as_ref(), &this.controller);
            this.send(WorkerMsg::LyricOptions(result));
        });
        true
    }

    pub fn arrangement(&self, request: LyricsRequest, lyrics: String) -> bool {
        let Some(client) = self.client.clone() else {
            return false;
        };
        let this = self.clone();
        thread::spawn(move || {
            let result = compose_arrangement(&request, &lyrics, client.as_ref(), &this.controller);
            this.send(WorkerMsg::Arrangement(result));
        });
        true
    }

    /// Chat replies bypass the progress controller; they only hold `busy`.
    pub fn chat(&self, message: String) -> bool {
        let Some(client) = self.client.clone() else {
            return false;
        };
        let this = self.clone();
        thread::spawn(move || {
            let result = client.stream_chat(&message).map(drain_chat);
            this.send(WorkerMsg::Chat(result));
        });
        true
    }

    /// Render `draft` to audio off the UI thread.
    pub fn preview(&self, draft: SongDraft, on_deck: Option<Track>) {
        let this = self.clone();
        thread::spawn(move || {
            debug!(title = %draft.title, "rendering preview");
            let track = rerender_track(&draft, this.preview_seconds, on_deck.as_ref());
            this.send(WorkerMsg::Track(Ok(track)));
        });
    }

    pub fn load(&self, entry: LibraryEntry) {
        let this = self.clone();
        thread::spawn(move || {
            this.send(WorkerMsg::Track(load_track(&entry)));
        });
    }
}
