//! Static catalog of the 12 supported model variants.
//!
//! Two families x two reasoning modes x three input modes. The order is
//! fixed so the presentation layer gets a stable listing.

use crate::errors::PipelineError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    Qwen,
    Smol,
}

impl ModelFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelFamily::Qwen => "qwen",
            ModelFamily::Smol => "smol",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningMode {
    ChainOfThought,
    Direct,
}

/// Which inputs the variant's prompts are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    VideoImageInfo,
    VideoImageRaw,
    DescriptionInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelVariant {
    pub name: &'static str,
    pub family: ModelFamily,
    pub reasoning: ReasoningMode,
    pub input_mode: InputMode,
}

const fn variant(
    name: &'static str,
    family: ModelFamily,
    reasoning: ReasoningMode,
    input_mode: InputMode,
) -> ModelVariant {
    ModelVariant {
        name,
        family,
        reasoning,
        input_mode,
    }
}

pub const VARIANTS: [ModelVariant; 12] = [
    variant(
        "qwen-cot-video-image-info",
        ModelFamily::Qwen,
        ReasoningMode::ChainOfThought,
        InputMode::VideoImageInfo,
    ),
    variant(
        "qwen-cot-video-image-raw",
        ModelFamily::Qwen,
        ReasoningMode::ChainOfThought,
        InputMode::VideoImageRaw,
    ),
    variant(
        "qwen-cot-description-info",
        ModelFamily::Qwen,
        ReasoningMode::ChainOfThought,
        InputMode::DescriptionInfo,
    ),
    variant(
        "qwen-video-image-info",
        ModelFamily::Qwen,
        ReasoningMode::Direct,
        InputMode::VideoImageInfo,
    ),
    variant(
        "qwen-video-image-raw",
        ModelFamily::Qwen,
        ReasoningMode::Direct,
        InputMode::VideoImageRaw,
    ),
    variant(
        "qwen-description-info",
        ModelFamily::Qwen,
        ReasoningMode::Direct,
        InputMode::DescriptionInfo,
    ),
    variant(
        "smol-cot-video-image-info",
        ModelFamily::Smol,
        ReasoningMode::ChainOfThought,
        InputMode::VideoImageInfo,
    ),
    variant(
        "smol-cot-video-image-raw",
        ModelFamily::Smol,
        ReasoningMode::ChainOfThought,
        InputMode::VideoImageRaw,
    ),
    variant(
        "smol-cot-description-info",
        ModelFamily::Smol,
        ReasoningMode::ChainOfThought,
        InputMode::DescriptionInfo,
    ),
    variant(
        "smol-video-image-info",
        ModelFamily::Smol,
        ReasoningMode::Direct,
        InputMode::VideoImageInfo,
    ),
    variant(
        "smol-video-image-raw",
        ModelFamily::Smol,
        ReasoningMode::Direct,
        InputMode::VideoImageRaw,
    ),
    variant(
        "smol-description-info",
        ModelFamily::Smol,
        ReasoningMode::Direct,
        InputMode::DescriptionInfo,
    ),
];

/// All variants in catalog order.
pub fn variants() -> &'static [ModelVariant] {
    &VARIANTS
}

pub fn get(name: &str) -> Result<&'static ModelVariant, PipelineError> {
    VARIANTS
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| PipelineError::VariantNotFound(name.to_string()))
}

/// True if `name` is a catalog entry; used by storage discovery to skip
/// stray directories.
pub fn is_known(name: &str) -> bool {
    VARIANTS.iter().any(|v| v.name == name)
}
