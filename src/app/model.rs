//! Application model types: `App`, `Panel` and the worker message protocol.

use serde_json::Value;
use tracing::debug;

use crate::ai::ToolCall;
use crate::error::{AiError, PlaybackError, TaskError};
use crate::library::{LibraryEntry, Track};
use crate::studio::{Arrangement, ChatReply, DropRequest, SongDraft, Wizard, WizardStep};

/// Top-level tabs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    QuickDrop,
    Studio,
    Library,
    Chat,
}

impl Panel {
    pub const ALL: [Panel; 4] = [Panel::QuickDrop, Panel::Studio, Panel::Library, Panel::Chat];

    pub fn title(self) -> &'static str {
        match self {
            Panel::QuickDrop => "Quick Drop",
            Panel::Studio => "Studio",
            Panel::Library => "Library",
            Panel::Chat => "Chat",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Text fields that take keyboard input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    Idea,
    Style,
    Concept,
    Genre,
    Mood,
    Message,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Idea => "Idea",
            Field::Style => "Style",
            Field::Concept => "Concept",
            Field::Genre => "Genre",
            Field::Mood => "Mood",
            Field::Message => "You",
        }
    }
}

/// Results sent back from worker threads.
#[derive(Debug)]
pub enum WorkerMsg {
    Draft(Result<Option<SongDraft>, TaskError>),
    LyricOptions(Result<Option<Vec<String>>, TaskError>),
    Arrangement(Result<Option<Arrangement>, TaskError>),
    /// A decoded library file or rendered preview, ready for the deck.
    Track(Result<Track, PlaybackError>),
    Chat(Result<ChatReply, AiError>),
}

impl WorkerMsg {
    /// Whether this result ends the run that set `App::busy`. Track loads
    /// never set it, and a `Busy` rejection means another run still holds it.
    fn ends_busy_run(&self) -> bool {
        match self {
            WorkerMsg::Draft(Err(TaskError::Busy))
            | WorkerMsg::LyricOptions(Err(TaskError::Busy))
            | WorkerMsg::Arrangement(Err(TaskError::Busy))
            | WorkerMsg::Track(_) => false,
            WorkerMsg::Draft(_)
            | WorkerMsg::LyricOptions(_)
            | WorkerMsg::Arrangement(_)
            | WorkerMsg::Chat(_) => true,
        }
    }
}

/// What the runtime should do after a worker message was applied.
#[derive(Debug)]
pub enum Followup {
    None,
    /// Render this draft to audio and put it on the deck.
    Preview(SongDraft),
    /// Put this track on the deck.
    Play(Track),
}

/// One line of the chat transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatLine {
    pub from_user: bool,
    pub text: String,
}

/// The main application model.
pub struct App {
    pub panel: Panel,

    pub idea: String,
    pub style: String,
    drop_field: Field,
    pub last_draft: Option<SongDraft>,

    pub wizard: Wizard,
    studio_field: Field,
    /// Cursor over the lyric options at the lyrics gate.
    pub lyric_cursor: usize,

    pub library: Vec<LibraryEntry>,
    pub selected: usize,
    pub library_dir: Option<String>,

    pub message: String,
    /// Assistant replies are stored one sentence per line.
    pub transcript: Vec<ChatLine>,

    /// Message from the app itself (errors, availability), shown next to
    /// the task status.
    pub notice: Option<String>,
    /// A worker thread is running.
    pub busy: bool,
    pub ai_available: bool,
}

impl App {
    /// Create a new `App` over the scanned `library`.
    pub fn new(library: Vec<LibraryEntry>) -> Self {
        Self {
            panel: Panel::QuickDrop,
            idea: String::new(),
            style: String::new(),
            drop_field: Field::Idea,
            last_draft: None,
            wizard: Wizard::new(),
            studio_field: Field::Concept,
            lyric_cursor: 0,
            library,
            selected: 0,
            library_dir: None,
            message: String::new(),
            transcript: Vec::new(),
            notice: None,
            busy: false,
            ai_available: true,
        }
    }

    pub fn set_library_dir(&mut self, dir: String) {
        self.library_dir = Some(dir);
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn next_panel(&mut self) {
        self.panel = self.panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.panel = self.panel.prev();
    }

    /// The field receiving typed characters, if the panel has one right now.
    pub fn active_field(&self) -> Option<Field> {
        match self.panel {
            Panel::QuickDrop => Some(self.drop_field),
            Panel::Studio if self.wizard.step() == WizardStep::Concept => Some(self.studio_field),
            Panel::Chat => Some(Field::Message),
            _ => None,
        }
    }

    /// Move focus between the text fields of the current panel.
    fn step_field(&mut self, forward: bool) {
        let (fields, current): (&[Field], Field) = match self.panel {
            Panel::QuickDrop => (&[Field::Idea, Field::Style], self.drop_field),
            Panel::Studio => (&[Field::Concept, Field::Genre, Field::Mood], self.studio_field),
            Panel::Library | Panel::Chat => return,
        };
        let len = fields.len();
        let i = fields.iter().position(|f| *f == current).unwrap_or(0);
        let target = fields[if forward { (i + 1) % len } else { (i + len - 1) % len }];
        match self.panel {
            Panel::QuickDrop => self.drop_field = target,
            _ => self.studio_field = target,
        }
    }

    pub fn field_value(&self, field: Field) -> &str {
        match field {
            Field::Idea => &self.idea,
            Field::Style => &self.style,
            Field::Concept => self.wizard.concept(),
            Field::Genre => self.wizard.genre(),
            Field::Mood => self.wizard.mood(),
            Field::Message => &self.message,
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.active_field() {
            let mut value = self.field_value(field).to_string();
            value.push(c);
            self.set_field(field, value);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.active_field() {
            let mut value = self.field_value(field).to_string();
            value.pop();
            self.set_field(field, value);
        }
    }

    fn set_field(&mut self, field: Field, value: String) {
        match field {
            Field::Idea => self.idea = value,
            Field::Style => self.style = value,
            Field::Concept => self.wizard.set_concept(value),
            Field::Genre => self.wizard.set_genre(value),
            Field::Mood => self.wizard.set_mood(value),
            Field::Message => self.message = value,
        }
    }

    /// `None` while the idea is blank or a worker is already running.
    pub fn quick_drop_request(&self) -> Option<DropRequest> {
        if self.busy {
            return None;
        }
        DropRequest::new(&self.idea, &self.style)
    }

    /// Move the typed message into the transcript and return it for sending.
    /// `None` while the message is blank or a worker is already running.
    pub fn take_message(&mut self) -> Option<String> {
        if self.busy || self.message.trim().is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.message).trim().to_string();
        self.transcript.push(ChatLine {
            from_user: true,
            text: text.clone(),
        });
        Some(text)
    }

    /// Down: next library entry, lyric option or text field.
    pub fn next(&mut self) {
        match self.panel {
            Panel::QuickDrop | Panel::Studio if self.active_field().is_some() => {
                self.step_field(true)
            }
            Panel::Library if !self.library.is_empty() => {
                self.selected = (self.selected + 1) % self.library.len();
            }
            Panel::Studio if !self.wizard.lyric_options().is_empty() => {
                self.lyric_cursor = (self.lyric_cursor + 1) % self.wizard.lyric_options().len();
            }
            _ => {}
        }
    }

    pub fn prev(&mut self) {
        match self.panel {
            Panel::QuickDrop | Panel::Studio if self.active_field().is_some() => {
                self.step_field(false)
            }
            Panel::Library if !self.library.is_empty() => {
                let len = self.library.len();
                self.selected = (self.selected + len - 1) % len;
            }
            Panel::Studio if !self.wizard.lyric_options().is_empty() => {
                let len = self.wizard.lyric_options().len();
                self.lyric_cursor = (self.lyric_cursor + len - 1) % len;
            }
            _ => {}
        }
    }

    pub fn selected_entry(&self) -> Option<&LibraryEntry> {
        self.library.get(self.selected)
    }

    /// Fold a worker result into the model.
    pub fn apply(&mut self, msg: WorkerMsg) -> Followup {
        if msg.ends_busy_run() {
            self.busy = false;
        }
        match msg {
            WorkerMsg::Draft(Ok(Some(draft))) => {
                self.last_draft = Some(draft.clone());
                Followup::Preview(draft)
            }
            WorkerMsg::LyricOptions(Ok(Some(options))) => {
                if options.is_empty() {
                    self.set_notice("No lyric options came back, try again.");
                }
                self.wizard.set_lyric_options(options);
                self.lyric_cursor = 0;
                Followup::None
            }
            WorkerMsg::Arrangement(Ok(Some(arrangement))) => {
                self.wizard.set_arrangement(arrangement);
                Followup::None
            }
            WorkerMsg::Track(Ok(track)) => Followup::Play(track),
            WorkerMsg::Track(Err(e)) => {
                self.set_notice(format!("Could not load track: {e}"));
                Followup::None
            }
            WorkerMsg::Chat(Ok(reply)) => {
                self.transcript
                    .extend(reply.sentences.into_iter().map(|text| ChatLine {
                        from_user: false,
                        text,
                    }));
                reply
                    .tool_calls
                    .iter()
                    .for_each(|call| self.run_tool(call));
                Followup::None
            }
            WorkerMsg::Chat(Err(e)) => {
                self.set_notice(format!("Chat failed: {e}"));
                Followup::None
            }
            // Stopped runs: the controller already shows the stop message.
            WorkerMsg::Draft(Ok(None))
            | WorkerMsg::LyricOptions(Ok(None))
            | WorkerMsg::Arrangement(Ok(None)) => Followup::None,
            WorkerMsg::Draft(Err(e))
            | WorkerMsg::LyricOptions(Err(e))
            | WorkerMsg::Arrangement(Err(e)) => {
                match e {
                    TaskError::Busy => self.set_notice("Another task is still running."),
                    e => self.set_notice(e.to_string()),
                }
                Followup::None
            }
        }
    }

    /// Tool calls from the assistant. `quick_drop` fills in the Quick Drop
    /// form and switches to it; anything else is ignored.
    fn run_tool(&mut self, call: &ToolCall) {
        if call.name != "quick_drop" {
            debug!(tool = %call.name, "ignoring unknown tool call");
            return;
        }
        let Some(idea) = call.args.get("idea").and_then(Value::as_str) else {
            return;
        };
        self.idea = idea.to_string();
        if let Some(style) = call.args.get("style").and_then(Value::as_str) {
            self.style = style.to_string();
        }
        self.panel = Panel::QuickDrop;
        self.set_notice("The assistant filled in Quick Drop, press enter to generate.");
    }
}
