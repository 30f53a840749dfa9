use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::AiError;

use super::{AiClient, ChatChunk, ChatStream, ToolCall};

const ADJECTIVES: &[&str] = &[
    "Neon", "Velvet", "Midnight", "Golden", "Electric", "Hollow", "Silver", "Restless", "Crimson",
    "Paper",
];
const NOUNS: &[&str] = &[
    "Harbor", "Signal", "Skyline", "Echo", "Garden", "Highway", "Lantern", "Tide", "Static",
    "Orbit",
];
const VERBS: &[&str] = &[
    "chasing",
    "holding",
    "fading into",
    "dancing with",
    "running from",
    "waiting for",
    "singing to",
    "dreaming of",
];
const IMAGES: &[&str] = &[
    "city lights",
    "falling rain",
    "empty streets",
    "distant stars",
    "open roads",
    "quiet rooms",
    "ocean waves",
    "burning skies",
];

/// Characters per streamed chat chunk.
const CHUNK_CHARS: usize = 16;
const COVER_SIZE: usize = 32;

/// Local stand-in for a generative backend. Output is a pure function of
/// the prompt, so the same request always yields the same content.
pub struct OfflineClient {
    latency: Duration,
}

impl OfflineClient {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn delay(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }
}

impl AiClient for OfflineClient {
    fn generate_text(&self, prompt: &str) -> Result<String, AiError> {
        self.delay();
        let mut rng = seeded(prompt);
        let text = if prompt.to_lowercase().contains("lyric") {
            lyrics(&mut rng)
        } else {
            title(&mut rng)
        };
        debug!(chars = text.len(), "offline text generated");
        Ok(text)
    }

    fn generate_structured(&self, prompt: &str, schema: &Value) -> Result<Value, AiError> {
        self.delay();
        if !schema.is_object() {
            return Err(AiError::Malformed("schema must be a JSON object".to_string()));
        }
        let mut rng = seeded(prompt);
        fill(schema, "", &mut rng)
    }

    fn generate_image(&self, prompt: &str) -> Result<Vec<u8>, AiError> {
        self.delay();
        let mut rng = seeded(prompt);
        let from: [u8; 3] = rng.r#gen();
        let to: [u8; 3] = rng.r#gen();

        // Binary PPM: diagonal gradient between two prompt-derived colours.
        let mut out = format!("P6\n{COVER_SIZE} {COVER_SIZE}\n255\n").into_bytes();
        let span = (2 * (COVER_SIZE - 1)) as f32;
        for y in 0..COVER_SIZE {
            for x in 0..COVER_SIZE {
                let t = (x + y) as f32 / span;
                for c in 0..3 {
                    let v = from[c] as f32 + (to[c] as f32 - from[c] as f32) * t;
                    out.push(v.round() as u8);
                }
            }
        }
        Ok(out)
    }

    fn stream_chat(&self, message: &str) -> Result<ChatStream, AiError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AiError::Request("empty chat message".to_string()));
        }
        self.delay();

        let mut rng = seeded(message);
        let reply = format!(
            "That sounds like {}. Picture {} {}. Want me to build it out?",
            title(&mut rng),
            pick(&mut rng, VERBS),
            pick(&mut rng, IMAGES),
        );

        let chars: Vec<char> = reply.chars().collect();
        let mut chunks: Vec<ChatChunk> = chars
            .chunks(CHUNK_CHARS)
            .map(|c| ChatChunk {
                text: Some(c.iter().collect()),
                tool_calls: Vec::new(),
            })
            .collect();

        let lower = message.to_lowercase();
        if lower.contains("generate") || lower.contains("make a song") {
            chunks.push(ChatChunk {
                text: None,
                tool_calls: vec![ToolCall {
                    name: "quick_drop".to_string(),
                    args: json!({ "idea": message }),
                }],
            });
        }

        Ok(Box::new(chunks.into_iter()))
    }
}

fn fill(schema: &Value, key: &str, rng: &mut StdRng) -> Result<Value, AiError> {
    if let Some(options) = schema.get("enum").and_then(Value::as_array) {
        if options.is_empty() {
            return Err(AiError::Malformed(format!("empty enum for `{key}`")));
        }
        let i = rng.gen_range(0..options.len());
        return Ok(options[i].clone());
    }

    let kind = schema
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("string")
        .to_ascii_lowercase();

    match kind.as_str() {
        "object" => {
            let mut out = Map::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    out.insert(name.clone(), fill(prop, name, rng)?);
                }
            }
            Ok(Value::Object(out))
        }
        "array" => {
            let items = schema
                .get("items")
                .ok_or_else(|| AiError::Malformed(format!("array `{key}` has no items schema")))?;
            let min = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0);
            let max = schema.get("maxItems").and_then(Value::as_u64).unwrap_or(u64::MAX);
            let count = 3u64.clamp(min, max.max(min));
            (0..count)
                .map(|_| fill(items, key, rng))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "integer" => {
            let lo = schema.get("minimum").and_then(Value::as_i64).unwrap_or(0);
            let hi = schema
                .get("maximum")
                .and_then(Value::as_i64)
                .unwrap_or(lo.saturating_add(100));
            Ok(json!(rng.gen_range(lo..=hi.max(lo))))
        }
        "number" => {
            let lo = schema.get("minimum").and_then(Value::as_f64).unwrap_or(0.0);
            let hi = schema.get("maximum").and_then(Value::as_f64).unwrap_or(lo + 1.0);
            let hi = hi.max(lo);
            // An infinite span yields NaN or inf; `min` pulls both back to `hi`.
            let value = (lo + (hi - lo) * rng.r#gen::<f64>()).min(hi).max(lo);
            Ok(json!(value))
        }
        "boolean" => Ok(Value::Bool(rng.gen_bool(0.5))),
        "string" => Ok(Value::String(string_for(key, rng))),
        other => Err(AiError::Malformed(format!(
            "unsupported schema type `{other}` for `{key}`"
        ))),
    }
}

fn string_for(key: &str, rng: &mut StdRng) -> String {
    let key = key.to_lowercase();
    if key.contains("lyric") {
        lyrics(rng)
    } else if key.contains("title") || key.contains("name") {
        title(rng)
    } else {
        line(rng)
    }
}

fn title(rng: &mut StdRng) -> String {
    format!("{} {}", pick(rng, ADJECTIVES), pick(rng, NOUNS))
}

fn line(rng: &mut StdRng) -> String {
    let verb = pick(rng, VERBS);
    let mut chars = verb.chars();
    let verb = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{verb} {}", pick(rng, IMAGES))
}

fn lyrics(rng: &mut StdRng) -> String {
    let mut out = String::from("[Verse]\n");
    for _ in 0..4 {
        out.push_str(&line(rng));
        out.push('\n');
    }
    out.push_str("\n[Chorus]\n");
    let hook = title(rng);
    for i in 0..4 {
        if i % 2 == 0 {
            out.push_str(&hook);
        } else {
            out.push_str(&line(rng));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Generator seeded from an FNV-1a hash of `text`, so a prompt always
/// produces the same output.
fn seeded(text: &str) -> StdRng {
    let hash = text.bytes().fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    });
    StdRng::seed_from_u64(hash)
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}
