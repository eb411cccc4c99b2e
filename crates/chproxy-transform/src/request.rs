use chproxy_common::ProxyError;
use chproxy_protocol::chutes::request::{ChutesChatRequest, ChutesMessage};
use chproxy_protocol::openai::chat_completions::request::ChatCompletionRequestBody;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model_table::{DEFAULT_MODEL, resolve_chute};

/// Builds the upstream request from an inbound chat request.
///
/// The upstream API is single-turn: only the final message survives, with a
/// fresh id and timestamp. Earlier turns are discarded.
pub fn translate_request(
    body: &ChatCompletionRequestBody,
) -> Result<ChutesChatRequest, ProxyError> {
    let last = body.messages.last().ok_or(ProxyError::MissingMessage)?;
    let model = body
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let chute_name = resolve_chute(&model).to_string();

    Ok(ChutesChatRequest {
        messages: vec![ChutesMessage {
            role: last.role.clone(),
            content: last.content.clone(),
            id: Uuid::new_v4().to_string(),
            created_on: OffsetDateTime::now_utc(),
        }],
        model,
        chute_name,
    })
}
