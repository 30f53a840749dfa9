use std::time::Duration;

use serde_json::json;

use super::*;

fn client() -> OfflineClient {
    OfflineClient::new(Duration::ZERO)
}

#[test]
fn connect_without_provider_is_unavailable() {
    let settings = AiSettings {
        provider: AiProvider::None,
        latency_ms: 0,
    };
    assert!(matches!(
        connect(&settings),
        Err(AiError::ServiceUnavailable(_))
    ));

    let settings = AiSettings {
        provider: AiProvider::Offline,
        latency_ms: 0,
    };
    let client = connect(&settings).unwrap();
    assert!(!client.generate_text("a title").unwrap().is_empty());
}

#[test]
fn text_is_deterministic_per_prompt() {
    let c = client();
    let a = c.generate_text("Song title for: rainy tokyo night").unwrap();
    let b = c.generate_text("Song title for: rainy tokyo night").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.split_whitespace().count(), 2);
}

#[test]
fn lyric_prompts_get_sections() {
    let lyrics = client().generate_text("Write lyrics about the sea").unwrap();
    assert!(lyrics.starts_with("[Verse]"));
    assert!(lyrics.contains("[Chorus]"));
    assert!(lyrics.lines().count() >= 10);
}

#[test]
fn structured_output_follows_the_schema() {
    let schema = json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "bpm": { "type": "integer", "minimum": 60, "maximum": 180 },
            "mood": { "type": "string", "enum": ["calm", "dark", "bright"] },
            "energy": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
            "explicit": { "type": "boolean" },
            "tags": { "type": "array", "items": { "type": "string" }, "maxItems": 2 }
        }
    });

    let value = client().generate_structured("synthwave", &schema).unwrap();

    assert!(value["title"].is_string());
    let bpm = value["bpm"].as_i64().unwrap();
    assert!((60..=180).contains(&bpm));
    assert!(["calm", "dark", "bright"].contains(&value["mood"].as_str().unwrap()));
    let energy = value["energy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&energy));
    assert!(value["explicit"].is_boolean());
    assert_eq!(value["tags"].as_array().unwrap().len(), 2);
}

#[test]
fn structured_rejects_bad_schemas() {
    let c = client();
    assert!(matches!(
        c.generate_structured("x", &json!("string")),
        Err(AiError::Malformed(_))
    ));
    assert!(matches!(
        c.generate_structured("x", &json!({ "type": "tuple" })),
        Err(AiError::Malformed(_))
    ));
    assert!(matches!(
        c.generate_structured("x", &json!({ "type": "array" })),
        Err(AiError::Malformed(_))
    ));
}

#[test]
fn cover_image_is_a_ppm() {
    let image = client().generate_image("cover for neon harbor").unwrap();
    let header = b"P6\n32 32\n255\n";
    assert!(image.starts_with(header));
    assert_eq!(image.len(), header.len() + 32 * 32 * 3);
}

#[test]
fn chat_streams_text_then_tool_calls() {
    let chunks: Vec<ChatChunk> = client()
        .stream_chat("generate a lofi song about rain")
        .unwrap()
        .collect();

    let text: String = chunks.iter().filter_map(|c| c.text.as_deref()).collect();
    assert!(text.starts_with("That sounds like"));
    assert!(chunks.len() > 2);

    let last = chunks.last().unwrap();
    assert!(last.text.is_none());
    assert_eq!(last.tool_calls[0].name, "quick_drop");
    assert_eq!(
        last.tool_calls[0].args["idea"],
        "generate a lofi song about rain"
    );
}

#[test]
fn plain_chat_has_no_tool_calls_and_blank_is_rejected() {
    let c = client();
    let chunks: Vec<ChatChunk> = c.stream_chat("hello there").unwrap().collect();
    assert!(chunks.iter().all(|c| c.tool_calls.is_empty()));

    assert!(matches!(c.stream_chat("   "), Err(AiError::Request(_))));
}

#[test]
fn extreme_numeric_bounds_stay_in_range() {
    let schema = json!({
        "type": "object",
        "properties": {
            "full": { "type": "integer", "minimum": i64::MIN, "maximum": i64::MAX },
            "top": { "type": "integer", "minimum": i64::MAX - 1 },
            "inverted": { "type": "integer", "minimum": 10, "maximum": 5 },
            "wide": { "type": "number", "minimum": -f64::MAX, "maximum": f64::MAX }
        }
    });

    let value = client().generate_structured("edge cases", &schema).unwrap();

    assert!(value["full"].is_i64());
    assert!(value["top"].as_i64().unwrap() >= i64::MAX - 1);
    assert_eq!(value["inverted"].as_i64(), Some(10));
    let wide = value["wide"].as_f64().unwrap();
    assert!(wide.is_finite());
}

#[test]
fn structured_output_is_deterministic_per_prompt() {
    let schema = json!({
        "type": "object",
        "properties": {
            "bpm": { "type": "integer", "minimum": 60, "maximum": 180 },
            "title": { "type": "string" }
        }
    });
    let c = client();
    assert_eq!(
        c.generate_structured("dream pop", &schema).unwrap(),
        c.generate_structured("dream pop", &schema).unwrap()
    );
}
