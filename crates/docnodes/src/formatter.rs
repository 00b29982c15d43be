use async_trait::async_trait;
use doccore::{NodeError, NodeKind, NodeProcessor, Value};
use std::collections::HashMap;

/// Distance between a half-width ASCII alphanumeric and its full-width
/// form (e.g. 'A' U+0041 -> 'Ａ' U+FF21)
const FULLWIDTH_OFFSET: u32 = 0xFEE0;

/// Text formatting node.
///
/// `format_type` selects the transformation: `uppercase`, `lowercase`,
/// `fullwidth`, or `halfwidth`. Any other value, or none at all, leaves
/// the text unchanged.
pub struct FormatterProcessor;

#[async_trait]
impl NodeProcessor for FormatterProcessor {
    fn kind(&self) -> NodeKind {
        NodeKind::Formatter
    }

    async fn process(
        &self,
        config: &HashMap<String, Value>,
        input: Option<&str>,
    ) -> Result<String, NodeError> {
        let input = input
            .ok_or_else(|| NodeError::InvalidInput("formatter node requires input data".into()))?;

        let format_type = config.get("format_type").and_then(Value::as_str);

        let formatted = match format_type {
            Some("uppercase") => input.to_ascii_uppercase(),
            Some("lowercase") => input.to_ascii_lowercase(),
            Some("fullwidth") => to_fullwidth(input),
            Some("halfwidth") => to_halfwidth(input),
            _ => input.to_string(),
        };

        Ok(formatted)
    }
}

/// Map half-width ASCII alphanumerics onto their full-width forms
fn to_fullwidth(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '0'..='9' | 'A'..='Z' | 'a'..='z' => {
                char::from_u32(c as u32 + FULLWIDTH_OFFSET).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}

/// Inverse of [`to_fullwidth`]: full-width alphanumerics back to ASCII
fn to_halfwidth(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' | 'Ａ'..='Ｚ' | 'ａ'..='ｚ' => {
                char::from_u32(c as u32 - FULLWIDTH_OFFSET).unwrap_or(c)
            }
            _ => c,
        })
        .collect()
}
