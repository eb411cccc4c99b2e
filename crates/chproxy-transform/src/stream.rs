use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use chproxy_protocol::openai::chat_completions::stream::{
    ChatCompletionChunk, ChatCompletionChunkChoice, ChatCompletionChunkDelta,
    ChatCompletionChunkObjectType,
};
use chproxy_protocol::sse::SseLineParser;

use crate::frame::{FrameEvent, parse_frame};

const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// Re-shapes the upstream event stream into client-facing chunk events.
///
/// Owns the line buffer for exactly one request. Emitted frames preserve
/// the order of their source lines; a partial line is never emitted.
#[derive(Debug)]
pub struct StreamTranscoder {
    parser: SseLineParser,
    model: String,
}

impl StreamTranscoder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            parser: SseLineParser::new(),
            model: model.into(),
        }
    }

    /// Feeds one upstream byte segment and returns the fully framed client
    /// SSE events it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let payloads = self.parser.push(chunk);
        self.emit(payloads)
    }

    /// Flushes the tail and appends the terminal `[DONE]` frame once the
    /// upstream stream ends.
    pub fn finish(mut self) -> Vec<Bytes> {
        let payloads = self.parser.finish();
        let mut frames = self.emit(payloads);
        frames.push(Bytes::from_static(DONE_FRAME));
        frames
    }

    fn emit(&mut self, payloads: Vec<String>) -> Vec<Bytes> {
        let mut frames = Vec::new();
        for payload in payloads {
            match parse_frame(&payload) {
                // An upstream sentinel is forwarded but does not end the
                // loop; the final signal comes from stream end.
                Some(FrameEvent::Done) => frames.push(Bytes::from_static(DONE_FRAME)),
                Some(FrameEvent::Delta(content)) => {
                    let chunk = build_chunk(&self.model, content);
                    if let Some(frame) = sse_json_bytes(&chunk) {
                        frames.push(frame);
                    }
                }
                None => {}
            }
        }
        frames
    }
}

fn build_chunk(model: &str, content: String) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: Uuid::new_v4().to_string(),
        object: ChatCompletionChunkObjectType::ChatCompletionChunk,
        created: now_epoch_seconds(),
        model: model.to_string(),
        choices: vec![ChatCompletionChunkChoice {
            delta: ChatCompletionChunkDelta { content },
            index: 0,
            finish_reason: None,
        }],
    }
}

fn sse_json_bytes<T: Serialize>(value: &T) -> Option<Bytes> {
    let payload = serde_json::to_vec(value).ok()?;
    let mut data = Vec::with_capacity(payload.len() + 8);
    data.extend_from_slice(b"data: ");
    data.extend_from_slice(&payload);
    data.extend_from_slice(b"\n\n");
    Some(Bytes::from(data))
}

pub(crate) fn now_epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or_default()
}
