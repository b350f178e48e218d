//! Prompt construction and model-output parsing shared by the describe and
//! judge executors. Chain-of-thought variants are allowed (and expected) to
//! emit reasoning text before the JSON object; direct variants are told to
//! emit JSON only. The parser tolerates both by scanning for the first
//! JSON value in the reply.

use crate::model::{DescribeRecord, ProductInfo, PullRecord, Verdict};
use crate::registry::{InputMode, ModelVariant, ReasoningMode};

const COT_PREAMBLE: &str = "Think through the evidence step by step before answering. \
     After your reasoning, output the JSON object.";
const DIRECT_PREAMBLE: &str = "Output ONLY the JSON object, with no text before or after it.";

fn reasoning_preamble(variant: &ModelVariant) -> &'static str {
    match variant.reasoning {
        ReasoningMode::ChainOfThought => COT_PREAMBLE,
        ReasoningMode::Direct => DIRECT_PREAMBLE,
    }
}

/// (system, user) pair for one describe call.
pub(crate) fn describe_prompt(variant: &ModelVariant, item: &PullRecord) -> (String, String) {
    let system = format!(
        "You review short-form product videos. Produce a factual description of the \
         video and the product it shows. Output JSON with \
         {{ \"description\": string, \"product_info\": {{ \"brand\": string, \
         \"price\": string, \"spec\": string, \"category\": string }} }}. {}",
        reasoning_preamble(variant)
    );

    let evidence = match variant.input_mode {
        InputMode::VideoImageInfo => format!(
            "Video: {}\nThumbnail: {}\nTitle: {}\nProduct id: {}",
            item.video_url, item.thumbnail_url, item.title, item.product_id
        ),
        InputMode::VideoImageRaw => {
            format!("Video: {}\nThumbnail: {}", item.video_url, item.thumbnail_url)
        }
        InputMode::DescriptionInfo => {
            format!("Title: {}\nProduct id: {}", item.title, item.product_id)
        }
    };

    let user = format!(
        "### Item {}\n{}\n\nDescribe the video and the product now.",
        item.video_id, evidence
    );
    (system, user)
}

/// (system, user) pair for one judge call.
pub(crate) fn judge_prompt(variant: &ModelVariant, item: &DescribeRecord) -> (String, String) {
    let system = format!(
        "You are a strict reviewer deciding whether a product video matches its \
         listed product. Output JSON with {{ \"verdict\": \"Yes\" | \"N/A\" | \"No\", \
         \"justification\": string }}. Use \"N/A\" when the evidence is insufficient \
         either way. {}",
        reasoning_preamble(variant)
    );

    let product_block = match (&item.product_info, variant.input_mode) {
        (_, InputMode::VideoImageRaw) => String::new(),
        (Some(info), _) => format!(
            "\n### Product info:\nbrand: {}\nprice: {}\nspec: {}\ncategory: {}",
            info.brand, info.price, info.spec, info.category
        ),
        (None, _) => String::new(),
    };

    let user = format!(
        "### Item {}\n### Description:\n<candidate_text>\n{}\n</candidate_text>{}\n\n\
         Provide your verdict now.",
        item.video_id, item.description, product_block
    );
    (system, user)
}

/// First JSON value embedded in `text`. Chain-of-thought replies put prose
/// before the object; scan for the opening brace like the judge client does.
pub(crate) fn extract_json(text: &str) -> anyhow::Result<serde_json::Value> {
    let text = text.trim();
    let start = text
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("no JSON object found in model output"))?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no JSON value found in extracted text"))?
        .map_err(|e| anyhow::anyhow!("invalid JSON in model output: {}", e))
}

pub(crate) fn parse_describe_output(text: &str) -> anyhow::Result<(String, Option<ProductInfo>)> {
    let val = extract_json(text)?;
    let description = val
        .get("description")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("describe JSON missing 'description' field"))?
        .to_string();
    let product_info = val
        .get("product_info")
        .filter(|v| !v.is_null())
        .map(|v| serde_json::from_value::<ProductInfo>(v.clone()))
        .transpose()
        .map_err(|e| anyhow::anyhow!("describe JSON has malformed 'product_info': {}", e))?;
    Ok((description, product_info))
}

pub(crate) fn parse_judge_output(text: &str) -> anyhow::Result<(Verdict, String)> {
    let val = extract_json(text)?;
    let verdict = val
        .get("verdict")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("judge JSON missing 'verdict' field"))?
        .parse::<Verdict>()
        .map_err(|e| anyhow::anyhow!("judge JSON has invalid verdict: {}", e))?;
    let justification = val
        .get("justification")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    Ok((verdict, justification))
}
