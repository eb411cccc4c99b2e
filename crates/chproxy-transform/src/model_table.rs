/// Fixed mapping from public model ids to the chute deployments that serve
/// them. Unknown ids fall back to the default chute; lookups never fail.
const MODEL_TABLE: &[(&str, &str)] = &[
    (
        "nvidia/Llama-3.1-405B-Instruct-FP8",
        "chutes-nvidia-llama-3-1-405b-instruct-fp8",
    ),
    ("deepseek-ai/DeepSeek-R1", "chutes-deepseek-ai-deepseek-r1"),
    ("Qwen/Qwen2.5-72B-Instruct", "chutes-qwen-qwen2-5-72b-instruct"),
    (
        "Qwen/Qwen2.5-Coder-32B-Instruc",
        "chutes-qwen-qwen2-5-coder-32b-instruct",
    ),
    (
        "bytedance-research/UI-TARS-72B-DPO",
        "chutes-bytedance-research-ui-tars-72b-dpo",
    ),
    ("OpenGVLab/InternVL2_5-78B", "chutes-opengvlab-internvl2-5-78b"),
    (
        "hugging-quants/Meta-Llama-3.1-70B-Instruct-AWQ-INT4",
        "chutes-hugging-quants-meta-llama-3-1-70b-instruct-awq-int4",
    ),
    (
        "NousResearch/Hermes-3-Llama-3.1-8B",
        "cxmplexbb-nousresearch-hermes-3-llama-3-1-8b",
    ),
    ("Qwen/QVQ-72B-Preview", "chutes-qwen-qvq-72b-preview"),
    (
        "deepseek-ai/DeepSeek-R1-Distill-Qwen-32B",
        "chutes-deepseek-ai-deepseek-r1-distill-qwen-32b",
    ),
    ("jondurbin/bagel-8b-v1.0", "chutes-jondurbin-bagel-8b-v1-0"),
    ("unsloth/QwQ-32B-Preview", "cxmplexbb-unsloth-qwq-32b-preview"),
    ("Qwen/QwQ-32B-Preview", "chutes-qwq-32b-preview"),
    ("jondurbin/airoboros-34b-3.3", "chutes-jondurbin-airoboros-34b-3-3"),
    (
        "NovaSky-AI/Sky-T1-32B-Preview",
        "chutes-novasky-ai-sky-t1-32b-preview",
    ),
    ("driaforall/Dria-Agent-a-3B", "chutes-driaforall-dria-agent-a-3b"),
    (
        "NousResearch/Nous-Hermes-Llama2-13b",
        "cxmplexbb-nousresearch-nous-hermes-llama2-13b",
    ),
    (
        "unsloth/Llama-3.2-1B-Instruct",
        "chutes-unsloth-llama-3-2-1b-instruct",
    ),
];

pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1";
pub const DEFAULT_CHUTE: &str = "chutes-deepseek-ai-deepseek-r1";

pub fn resolve_chute(model: &str) -> &'static str {
    MODEL_TABLE
        .iter()
        .find(|(id, _)| *id == model)
        .map(|(_, chute)| *chute)
        .unwrap_or(DEFAULT_CHUTE)
}

/// Public model ids, in table order, for the model-listing endpoint.
pub fn public_models() -> impl Iterator<Item = &'static str> {
    MODEL_TABLE.iter().map(|(id, _)| *id)
}
