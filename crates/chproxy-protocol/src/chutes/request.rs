use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The single synthesized message the upstream accepts. The upstream chat
/// API is single-turn; `id` and `created_on` are generated per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChutesMessage {
    pub role: String,
    pub content: String,
    pub id: String,
    #[serde(rename = "createdOn", with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChutesChatRequest {
    pub messages: Vec<ChutesMessage>,
    pub model: String,
    #[serde(rename = "chuteName")]
    pub chute_name: String,
}
