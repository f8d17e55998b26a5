//! Recovering a structured value from free-form model output.

use crate::error::PlanError;
use crate::literal::parse_literal;
use serde_json::Value;
use tracing::{debug, warn};

const FENCE: &str = "```";

/// Narrow a raw completion down to the text most likely to hold the object:
/// the first fenced block (minus a `json` tag), then the span from the first
/// `{` to the last `}`.
pub fn extract_candidate(raw: &str) -> &str {
    let mut text = raw.trim();

    if text.contains(FENCE) {
        if let Some(block) = text.split(FENCE).nth(1) {
            text = block.strip_prefix("json").unwrap_or(block);
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            text = &text[start..=end];
        }
    }

    text
}

/// Parse a completion into a value: strict JSON first, then the permissive
/// literal grammar.
pub fn parse_response(raw: &str) -> Result<Value, PlanError> {
    let candidate = extract_candidate(raw);

    let json_err = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match parse_literal(candidate) {
        Ok(value) => {
            debug!("Recovered literal-style response (JSON error: {})", json_err);
            Ok(value)
        }
        Err(literal_err) => {
            warn!("Raw invalid output: {}", candidate);
            debug!("JSON error: {}; literal error: {}", json_err, literal_err);
            Err(PlanError::Syntax {
                raw: candidate.to_string(),
            })
        }
    }
}
