use std::thread;
use std::time::Duration;

use serde_json::Value;

use super::synth::root_frequency;
use super::*;
use crate::ai::{AiClient, ChatStream, OfflineClient};
use crate::config::TaskSettings;
use crate::error::{AiError, SnapshotError};
use crate::task::{ProgressController, Stage, TaskStatus};

struct FailingClient;

impl AiClient for FailingClient {
    fn generate_text(&self, _prompt: &str) -> Result<String, AiError> {
        Err(AiError::Request("quota exceeded".into()))
    }

    fn generate_structured(&self, _prompt: &str, _schema: &Value) -> Result<Value, AiError> {
        Err(AiError::Request("quota exceeded".into()))
    }

    fn generate_image(&self, _prompt: &str) -> Result<Vec<u8>, AiError> {
        Err(AiError::Request("quota exceeded".into()))
    }

    fn stream_chat(&self, _message: &str) -> Result<ChatStream, AiError> {
        Err(AiError::Request("quota exceeded".into()))
    }
}

fn offline() -> OfflineClient {
    OfflineClient::new(Duration::ZERO)
}

fn controller() -> ProgressController {
    ProgressController::new(TaskSettings {
        tick_ms: 5,
        pause_poll_ms: 10,
        settle_ms: 10_000,
    })
}

fn fast_drop() -> QuickDrop {
    QuickDrop::with_stages(vec![
        Stage::millis("Writing lyrics", 5),
        Stage::millis("Composing", 5),
        Stage::millis("Designing cover", 5),
    ])
}

fn composed_wizard() -> Wizard {
    let client = offline();
    let controller = controller();
    let mut wizard = Wizard::new();
    wizard.set_concept("a lighthouse keeper's last night");
    wizard.set_genre("folk");
    assert!(wizard.advance());

    let request = wizard.lyrics_request().unwrap();
    let options = generate_lyric_options(&request, &client, &controller)
        .unwrap()
        .unwrap();
    wizard.set_lyric_options(options);
    assert!(wizard.select_lyrics(1));
    assert!(wizard.advance());

    let lyrics = wizard.lyric_options()[1].clone();
    let arrangement = compose_arrangement(&request, &lyrics, &client, &controller)
        .unwrap()
        .unwrap();
    wizard.set_arrangement(arrangement);
    wizard
}

#[test]
fn blank_idea_disables_quick_drop() {
    assert_eq!(DropRequest::new("   ", "rock"), None);

    let request = DropRequest::new("  rain on tin roofs ", "").unwrap();
    assert_eq!(request.idea, "rain on tin roofs");
    assert_eq!(request.style, "pop");
}

#[test]
fn quick_drop_produces_a_complete_draft() {
    let controller = controller();
    let request = DropRequest::new("night drive", "synthwave").unwrap();

    let draft = fast_drop()
        .generate(&request, &offline(), &controller)
        .unwrap()
        .unwrap();

    assert_ne!(draft.title, FAILED_TITLE);
    assert!(draft.lyrics.contains("[Chorus]"));
    assert!((60..=180).contains(&draft.bpm));
    assert!(draft.cover.as_deref().unwrap().starts_with(b"P6"));
    assert_eq!(draft.style, "synthwave");

    let snap = controller.snapshot();
    assert_eq!(snap.status, TaskStatus::Completed);
    assert_eq!(snap.progress, 100.0);
    assert_eq!(snap.message, "Complete!");
}

#[test]
fn quick_drop_degrades_each_call_to_a_placeholder() {
    let controller = controller();
    let request = DropRequest::new("anything", "jazz").unwrap();

    let draft = fast_drop()
        .generate(&request, &FailingClient, &controller)
        .unwrap()
        .unwrap();

    assert_eq!(draft.title, FAILED_TITLE);
    assert_eq!(draft.lyrics, FAILED_LYRICS);
    assert_eq!(draft.bpm, 100);
    assert_eq!(draft.cover, None);
    assert_eq!(controller.snapshot().status, TaskStatus::Completed);
}

#[test]
fn stopping_quick_drop_yields_nothing() {
    let controller = controller();
    let handle = controller.handle();
    let request = DropRequest::new("slow burn", "soul").unwrap();
    let slow = QuickDrop::with_stages(vec![Stage::millis("Writing lyrics", 500)]);

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        handle.stop()
    });
    let result = slow.generate(&request, &offline(), &controller).unwrap();

    assert!(stopper.join().unwrap());
    assert_eq!(result, None);
    assert_eq!(controller.snapshot().message, "Task stopped by user.");
}

#[test]
fn wizard_lyrics_step_is_a_gate() {
    let client = offline();
    let controller = controller();
    let mut wizard = Wizard::new();

    assert!(wizard.lyrics_request().is_none());
    assert!(!wizard.advance());
    wizard.set_concept("city at dawn");
    assert!(wizard.advance());
    assert_eq!(wizard.step(), WizardStep::Lyrics);

    assert_eq!(wizard.blocked_reason(), Some("Generate lyric options first."));
    assert!(!wizard.advance());

    let request = wizard.lyrics_request().unwrap();
    assert_eq!(request.genre, "pop");
    let options = generate_lyric_options(&request, &client, &controller)
        .unwrap()
        .unwrap();
    assert_eq!(options.len(), 3);
    wizard.set_lyric_options(options.clone());
    assert!(!wizard.advance());

    assert!(!wizard.select_lyrics(3));
    assert!(wizard.select_lyrics(0));
    wizard.set_lyric_options(options);
    assert_eq!(wizard.selected_lyrics(), None);
    assert!(!wizard.advance());
}

#[test]
fn failed_lyric_generation_keeps_the_gate_closed() {
    let request = LyricsRequest {
        concept: "x".into(),
        genre: "pop".into(),
        mood: "calm".into(),
    };
    let options = generate_lyric_options(&request, &FailingClient, &controller())
        .unwrap()
        .unwrap();
    assert!(options.is_empty());

    let mut wizard = Wizard::new();
    wizard.set_concept("x");
    wizard.advance();
    wizard.set_lyric_options(options);
    assert!(!wizard.select_lyrics(0));
    assert!(!wizard.advance());
}

#[test]
fn wizard_walks_to_review_and_builds_a_draft() {
    let mut wizard = composed_wizard();
    assert!(wizard.advance());
    assert_eq!(wizard.step(), WizardStep::Review);
    assert!(!wizard.advance());

    let draft = wizard.draft().unwrap();
    assert_eq!(draft.lyrics, wizard.lyric_options()[1]);
    assert_eq!(draft.style, "folk");
    assert_eq!(draft.bpm, wizard.arrangement().unwrap().bpm);

    assert!(wizard.back());
    assert_eq!(wizard.step(), WizardStep::Arrangement);
}

#[test]
fn reset_requires_confirmation() {
    let mut wizard = composed_wizard();
    let before = wizard.clone();

    assert!(!wizard.reset(|| false));
    assert_eq!(wizard, before);

    assert!(wizard.reset(|| true));
    assert_eq!(wizard, Wizard::new());
}

#[test]
fn snapshot_survives_a_save_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("studio.toml");

    let mut wizard = composed_wizard();
    wizard.advance();
    save_snapshot(&path, &wizard.snapshot()).unwrap();

    let snapshot = load_snapshot(&path).unwrap().unwrap();
    assert_eq!(snapshot.version, SNAPSHOT_VERSION);

    let mut restored = Wizard::new();
    restored.restore(&snapshot);
    assert_eq!(restored, wizard);
}

#[test]
fn missing_snapshot_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_snapshot(&dir.path().join("none.toml")).unwrap().is_none());
}

#[test]
fn snapshot_loading_is_strict() {
    let good = Wizard::new().snapshot().to_toml().unwrap();
    assert!(Snapshot::from_toml(&good).is_ok());

    let future = good.replace("version = 1", "version = 2");
    assert!(matches!(
        Snapshot::from_toml(&future),
        Err(SnapshotError::Version {
            found: 2,
            expected: 1
        })
    ));

    let unknown = format!("{good}\ntheme = \"dark\"\n");
    assert!(matches!(
        Snapshot::from_toml(&unknown),
        Err(SnapshotError::Parse(_))
    ));

    let missing: String = good
        .lines()
        .filter(|l| !l.starts_with("mood"))
        .map(|l| format!("{l}\n"))
        .collect();
    assert!(matches!(
        Snapshot::from_toml(&missing),
        Err(SnapshotError::Parse(_))
    ));
}

#[test]
fn restore_drops_values_that_no_longer_fit() {
    let mut snapshot = composed_wizard().snapshot();
    snapshot.selected_lyrics = Some(7);
    snapshot.step = WizardStep::Review;

    let mut wizard = Wizard::new();
    wizard.restore(&snapshot);

    assert_eq!(wizard.selected_lyrics(), None);
    assert_eq!(wizard.step(), WizardStep::Lyrics);
    assert_eq!(wizard.lyric_options().len(), 3);
}

#[test]
fn sentence_buffer_waits_for_whole_sentences() {
    let mut buffer = SentenceBuffer::new();
    assert_eq!(buffer.push("Hello there. How"), vec!["Hello there."]);
    assert_eq!(buffer.push(" are you? It costs 3."), vec!["How are you?"]);
    assert_eq!(buffer.push("5 dollars! Bye"), vec!["It costs 3.5 dollars!"]);
    assert!(!buffer.is_empty());
    assert_eq!(buffer.flush().as_deref(), Some("Bye"));
    assert_eq!(buffer.flush(), None);
    assert!(buffer.push("line one\nline").contains(&"line one".to_string()));
}

#[test]
fn drained_chat_is_split_for_speech() {
    let reply = drain_chat(offline().stream_chat("generate a sea shanty").unwrap());

    assert_eq!(reply.sentences.len(), 3);
    assert_eq!(reply.sentences.join(" "), reply.text);
    assert_eq!(reply.tool_calls.len(), 1);
}

#[test]
fn preview_renders_the_requested_length() {
    let draft = SongDraft {
        title: "Test".into(),
        style: "pop".into(),
        lyrics: String::new(),
        bpm: 120,
        key: "Am".into(),
        cover: None,
    };

    let audio = render_preview(&draft, 2);
    assert_eq!(audio.frames(), 2 * PREVIEW_SAMPLE_RATE as usize);
    assert!(audio.data.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert!(audio.data.iter().any(|s| s.abs() > 0.1));

    let track = draft_track(&draft, 1);
    assert_eq!(track.title, "Test");
    assert_eq!(track.duration(), Duration::from_secs(1));
}

#[test]
fn keys_map_to_root_frequencies() {
    let close = |a: f32, b: f32| (a - b).abs() < 0.05;
    assert!(close(root_frequency("A").0, 440.0));
    assert!(close(root_frequency("C").0, 261.63));
    assert!(close(root_frequency("Bb").0, 466.16));
    assert!(close(root_frequency("F#").0, 369.99));
    assert!(root_frequency("Am").1);
    assert!(!root_frequency("C").1);
}

#[test]
fn rerendering_the_track_on_deck_keeps_its_metadata() {
    let mut draft = SongDraft {
        title: "Harbor".into(),
        style: "lofi".into(),
        lyrics: String::new(),
        bpm: 90,
        key: "C".into(),
        cover: None,
    };
    let on_deck = draft_track(&draft, 1);

    let again = rerender_track(&draft, 2, Some(&on_deck));
    assert_ne!(again.id, on_deck.id);
    assert_eq!(again.title, on_deck.title);
    assert_eq!(again.artist, on_deck.artist);
    assert_eq!(again.duration(), Duration::from_secs(2));

    draft.style = "house".into();
    let other = rerender_track(&draft, 1, Some(&on_deck));
    assert_eq!(other.artist.as_deref(), Some("riffline · house"));
    assert!(rerender_track(&draft, 1, None).title == "Harbor");
}
