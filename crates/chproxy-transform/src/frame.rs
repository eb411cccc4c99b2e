use chproxy_protocol::chutes::stream::ChutesStreamFrame;

pub const DONE_SENTINEL: &str = "[DONE]";

/// What one recovered upstream payload contributes to the output. Both the
/// live transcoder and the aggregator run on this single contract, so a
/// streamed run and a buffered run of the same bytes extract the same
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Done,
    Delta(String),
}

/// Malformed JSON, a shape mismatch, or an empty content field all yield
/// `None`: the frame is skipped and the stream continues.
pub fn parse_frame(payload: &str) -> Option<FrameEvent> {
    if payload == DONE_SENTINEL {
        return Some(FrameEvent::Done);
    }
    let frame: ChutesStreamFrame = serde_json::from_str(payload).ok()?;
    let content = frame.choices.into_iter().next()?.delta?.content?;
    if content.is_empty() {
        return None;
    }
    Some(FrameEvent::Delta(content))
}
