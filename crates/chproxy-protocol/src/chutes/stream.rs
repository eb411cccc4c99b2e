use serde::{Deserialize, Serialize};

/// One JSON frame from the upstream event stream. Every field defaults so
/// a shape mismatch reads as "no delta" rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChutesStreamFrame {
    #[serde(default)]
    pub choices: Vec<ChutesFrameChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChutesFrameChoice {
    #[serde(default)]
    pub delta: Option<ChutesFrameDelta>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChutesFrameDelta {
    #[serde(default)]
    pub content: Option<String>,
}
