use crate::ai::{ChatStream, ToolCall};

/// Collects streamed text and hands out whole sentences for speech.
#[derive(Debug, Default)]
pub struct SentenceBuffer {
    pending: String,
}

impl SentenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every sentence it completed.
    ///
    /// A sentence ends at `.`, `!` or `?` followed by whitespace, or at a
    /// newline. A terminator at the very end of the buffer waits for the next
    /// chunk, since "3." may still become "3.5".
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let mut sentences = Vec::new();
        let mut start = 0;
        let mut chars = self.pending.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let end = match c {
                '\n' => Some(i + 1),
                '.' | '!' | '?' => match chars.peek() {
                    Some(&(_, next)) if next.is_whitespace() => Some(i + 1),
                    _ => None,
                },
                _ => None,
            };
            if let Some(end) = end {
                let sentence = self.pending[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = end;
            }
        }

        self.pending.drain(..start);
        sentences
    }

    /// Whatever is left once the stream is over.
    pub fn flush(&mut self) -> Option<String> {
        let rest = self.pending.trim().to_string();
        self.pending.clear();
        (!rest.is_empty()).then_some(rest)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.trim().is_empty()
    }
}

/// A fully consumed chat reply.
#[derive(Debug, Default, PartialEq)]
pub struct ChatReply {
    pub text: String,
    /// In speaking order.
    pub sentences: Vec<String>,
    pub tool_calls: Vec<ToolCall>,
}

/// Consume a chat stream, splitting its text into sentences as it arrives.
pub fn drain_chat(stream: ChatStream) -> ChatReply {
    let mut buffer = SentenceBuffer::new();
    let mut reply = ChatReply::default();
    for chunk in stream {
        if let Some(text) = chunk.text {
            reply.sentences.extend(buffer.push(&text));
            reply.text.push_str(&text);
        }
        reply.tool_calls.extend(chunk.tool_calls);
    }
    reply.sentences.extend(buffer.flush());
    reply
}
