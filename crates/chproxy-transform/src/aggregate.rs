use chproxy_common::ProxyError;
use chproxy_protocol::openai::chat_completions::response::{
    ChatCompletionChoice, ChatCompletionObjectType, ChatCompletionResponse,
};
use chproxy_protocol::openai::chat_completions::types::{
    ChatCompletionFinishReason, ChatMessage, CompletionUsage,
};
use chproxy_protocol::sse::SseLineParser;
use uuid::Uuid;

use crate::frame::{FrameEvent, parse_frame};
use crate::stream::now_epoch_seconds;

/// Runs the frame-extraction contract over a fully buffered upstream body
/// and concatenates every delta into one message.
///
/// Processing stops at the first `[DONE]`; frames after it belong past the
/// logical end of the stream. An empty concatenation is a failure, never a
/// valid answer.
pub fn aggregate_response(body: &str, model: &str) -> Result<ChatCompletionResponse, ProxyError> {
    let mut parser = SseLineParser::new();
    let mut payloads = parser.push(body.as_bytes());
    payloads.extend(parser.finish());

    let mut content = String::new();
    for payload in payloads {
        match parse_frame(&payload) {
            Some(FrameEvent::Done) => break,
            Some(FrameEvent::Delta(delta)) => content.push_str(&delta),
            None => {}
        }
    }

    if content.is_empty() {
        return Err(ProxyError::EmptyUpstreamResponse);
    }

    Ok(ChatCompletionResponse {
        id: Uuid::new_v4().to_string(),
        object: ChatCompletionObjectType::ChatCompletion,
        created: now_epoch_seconds(),
        model: model.to_string(),
        choices: vec![ChatCompletionChoice {
            message: ChatMessage {
                role: "assistant".to_string(),
                content,
            },
            finish_reason: ChatCompletionFinishReason::Stop,
            index: 0,
        }],
        usage: CompletionUsage::default(),
    })
}
