use bytes::Bytes;

use chproxy_common::ProxyError;
use chproxy_protocol::openai::chat_completions::request::ChatCompletionRequestBody;
use chproxy_protocol::openai::chat_completions::stream::ChatCompletionChunk;
use chproxy_protocol::openai::chat_completions::types::ChatMessage;

use crate::aggregate::aggregate_response;
use crate::frame::{FrameEvent, parse_frame};
use crate::model_table::{DEFAULT_CHUTE, DEFAULT_MODEL, public_models, resolve_chute};
use crate::request::translate_request;
use crate::stream::StreamTranscoder;

fn message(role: &str, content: &str) -> ChatMessage {
    ChatMessage {
        role: role.to_string(),
        content: content.to_string(),
    }
}

fn chat_request(messages: Vec<ChatMessage>, model: Option<&str>) -> ChatCompletionRequestBody {
    ChatCompletionRequestBody {
        messages,
        model: model.map(str::to_string),
        stream: None,
    }
}

/// Reduces emitted client frames to their observable content so sequences
/// can be compared across runs despite fresh ids and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Emitted {
    Content(String),
    Done,
}

fn decode_frames(frames: &[Bytes]) -> Vec<Emitted> {
    frames
        .iter()
        .map(|frame| {
            let text = std::str::from_utf8(frame).expect("client frames are UTF-8");
            let payload = text
                .strip_prefix("data: ")
                .and_then(|rest| rest.strip_suffix("\n\n"))
                .expect("client frames are data-framed");
            if payload == "[DONE]" {
                return Emitted::Done;
            }
            let chunk: ChatCompletionChunk =
                serde_json::from_str(payload).expect("client frames carry chunk JSON");
            Emitted::Content(chunk.choices[0].delta.content.clone())
        })
        .collect()
}

fn run_transcoder(segments: &[&[u8]]) -> Vec<Emitted> {
    let mut transcoder = StreamTranscoder::new("test-model");
    let mut frames = Vec::new();
    for segment in segments {
        frames.extend(transcoder.push(segment));
    }
    frames.extend(transcoder.finish());
    decode_frames(&frames)
}

const DELTA_HI: &str = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;

// ---- model table ----

#[test]
fn known_models_resolve_exactly() {
    assert_eq!(
        resolve_chute("Qwen/QwQ-32B-Preview"),
        "chutes-qwq-32b-preview"
    );
    assert_eq!(resolve_chute(DEFAULT_MODEL), DEFAULT_CHUTE);
}

#[test]
fn unknown_models_fall_back_to_default_chute() {
    assert_eq!(resolve_chute("nobody/invented-this"), DEFAULT_CHUTE);
    assert_eq!(resolve_chute(""), DEFAULT_CHUTE);
}

#[test]
fn public_models_cover_the_table() {
    let models: Vec<_> = public_models().collect();
    assert_eq!(models.len(), 18);
    assert!(models.contains(&"deepseek-ai/DeepSeek-R1"));
}

// ---- request translation ----

#[test]
fn only_the_last_message_survives() {
    let body = chat_request(
        vec![
            message("system", "be terse"),
            message("user", "first"),
            message("assistant", "reply"),
            message("user", "final question"),
        ],
        Some("Qwen/QwQ-32B-Preview"),
    );
    let upstream = translate_request(&body).unwrap();
    assert_eq!(upstream.messages.len(), 1);
    assert_eq!(upstream.messages[0].role, "user");
    assert_eq!(upstream.messages[0].content, "final question");
    assert_eq!(upstream.model, "Qwen/QwQ-32B-Preview");
    assert_eq!(upstream.chute_name, "chutes-qwq-32b-preview");
}

#[test]
fn omitted_model_resolves_to_default() {
    let body = chat_request(vec![message("user", "hi")], None);
    let upstream = translate_request(&body).unwrap();
    assert_eq!(upstream.model, DEFAULT_MODEL);
    assert_eq!(upstream.chute_name, DEFAULT_CHUTE);
}

#[test]
fn empty_messages_is_a_defined_error() {
    let body = chat_request(Vec::new(), None);
    assert!(matches!(
        translate_request(&body),
        Err(ProxyError::MissingMessage)
    ));
}

#[test]
fn translated_messages_get_fresh_ids() {
    let body = chat_request(vec![message("user", "hi")], None);
    let first = translate_request(&body).unwrap();
    let second = translate_request(&body).unwrap();
    assert_ne!(first.messages[0].id, second.messages[0].id);
}

// ---- frame extraction ----

#[test]
fn frame_done_sentinel() {
    assert_eq!(parse_frame("[DONE]"), Some(FrameEvent::Done));
}

#[test]
fn frame_delta_extraction() {
    let payload = r#"{"choices":[{"delta":{"content":"abc"}}]}"#;
    assert_eq!(
        parse_frame(payload),
        Some(FrameEvent::Delta("abc".to_string()))
    );
}

#[test]
fn frame_tolerates_shape_mismatch() {
    assert_eq!(parse_frame("not json"), None);
    assert_eq!(parse_frame("{}"), None);
    assert_eq!(parse_frame(r#"{"choices":[]}"#), None);
    assert_eq!(parse_frame(r#"{"choices":[{}]}"#), None);
    assert_eq!(parse_frame(r#"{"choices":[{"delta":{}}]}"#), None);
    assert_eq!(parse_frame(r#"{"choices":[{"delta":{"content":""}}]}"#), None);
}

// ---- stream transcoding ----

#[test]
fn single_delta_then_done() {
    let emitted = run_transcoder(&[format!("{DELTA_HI}\n\ndata: [DONE]\n\n").as_bytes()]);
    assert_eq!(
        emitted,
        vec![
            Emitted::Content("Hi".to_string()),
            Emitted::Done,
            // The terminal signal at stream end.
            Emitted::Done,
        ]
    );
}

#[test]
fn stream_end_without_sentinel_still_terminates() {
    let emitted = run_transcoder(&[format!("{DELTA_HI}\n").as_bytes()]);
    assert_eq!(
        emitted,
        vec![Emitted::Content("Hi".to_string()), Emitted::Done]
    );
}

#[test]
fn transcoding_is_chunk_boundary_invariant() {
    let stream = concat!(
        r#"data: {"choices":[{"delta":{"content":"He"}}]}"#,
        "\n\n",
        r#"data: {"choices":[{"delta":{"content":"llo, wörld"}}]}"#,
        "\n\n",
        "data: [DONE]\n\n",
    )
    .as_bytes();

    let whole = run_transcoder(&[stream]);
    for cut in 0..stream.len() {
        let split = run_transcoder(&[&stream[..cut], &stream[cut..]]);
        assert_eq!(split, whole, "split at {cut} diverged");
    }
}

#[test]
fn malformed_frame_does_not_abort_the_stream() {
    let stream = concat!(
        r#"data: {"choices":[{"delta":{"content":"a"}}]}"#,
        "\n",
        "data: {broken\n",
        r#"data: {"choices":[{"delta":{"content":"b"}}]}"#,
        "\n",
    )
    .as_bytes();
    let emitted = run_transcoder(&[stream]);
    assert_eq!(
        emitted,
        vec![
            Emitted::Content("a".to_string()),
            Emitted::Content("b".to_string()),
            Emitted::Done,
        ]
    );
}

#[test]
fn emitted_chunks_carry_the_resolved_model() {
    let mut transcoder = StreamTranscoder::new("Qwen/QwQ-32B-Preview");
    let frames = transcoder.push(format!("{DELTA_HI}\n").as_bytes());
    assert_eq!(frames.len(), 1);
    let text = std::str::from_utf8(&frames[0]).unwrap();
    let chunk: ChatCompletionChunk =
        serde_json::from_str(text.strip_prefix("data: ").unwrap().trim_end()).unwrap();
    assert_eq!(chunk.model, "Qwen/QwQ-32B-Preview");
    assert_eq!(chunk.choices[0].index, 0);
    assert!(chunk.choices[0].finish_reason.is_none());
}

// ---- aggregation ----

#[test]
fn aggregation_concatenates_in_order() {
    let body = concat!(
        r#"data: {"choices":[{"delta":{"content":"one "}}]}"#,
        "\n",
        r#"data: {"choices":[{"delta":{"content":"two"}}]}"#,
        "\n",
        "data: [DONE]\n",
    );
    let response = aggregate_response(body, "test-model").unwrap();
    assert_eq!(response.choices[0].message.content, "one two");
    assert_eq!(response.choices[0].message.role, "assistant");
    assert_eq!(response.model, "test-model");
    assert_eq!(response.usage.total_tokens, 0);
}

#[test]
fn aggregation_stops_at_the_first_done() {
    let body = concat!(
        r#"data: {"choices":[{"delta":{"content":"kept"}}]}"#,
        "\n",
        "data: [DONE]\n",
        r#"data: {"choices":[{"delta":{"content":"dropped"}}]}"#,
        "\n",
    );
    let response = aggregate_response(body, "m").unwrap();
    assert_eq!(response.choices[0].message.content, "kept");
}

#[test]
fn empty_aggregation_is_an_error() {
    assert!(matches!(
        aggregate_response("data: [DONE]\n", "m"),
        Err(ProxyError::EmptyUpstreamResponse)
    ));
    assert!(matches!(
        aggregate_response("", "m"),
        Err(ProxyError::EmptyUpstreamResponse)
    ));
}

#[test]
fn malformed_frame_does_not_abort_aggregation() {
    let body = concat!(
        r#"data: {"choices":[{"delta":{"content":"a"}}]}"#,
        "\n",
        "data: {broken\n",
        r#"data: {"choices":[{"delta":{"content":"b"}}]}"#,
        "\n",
    );
    let response = aggregate_response(body, "m").unwrap();
    assert_eq!(response.choices[0].message.content, "ab");
}

// ---- round trip ----

#[test]
fn streamed_content_equals_aggregated_content() {
    let stream = concat!(
        r#"data: {"choices":[{"delta":{"content":"str"}}]}"#,
        "\n\n",
        "data: {garbled\n",
        r#"data: {"choices":[{"delta":{"content":"eam"}}]}"#,
        "\n\n",
        "data: [DONE]\n\n",
    );

    let streamed: String = run_transcoder(&[stream.as_bytes()])
        .into_iter()
        .filter_map(|event| match event {
            Emitted::Content(content) => Some(content),
            Emitted::Done => None,
        })
        .collect();

    let aggregated = aggregate_response(stream, "m").unwrap();
    assert_eq!(streamed, aggregated.choices[0].message.content);
    assert_eq!(streamed, "stream");
}
