use doccore::{NodeError, NodeKind, NodeProcessor, Value};
use docnodes::FormatterProcessor;
use std::collections::HashMap;

fn config(format_type: &str) -> HashMap<String, Value> {
    HashMap::from([("format_type".to_string(), Value::from(format_type))])
}

async fn format(config: &HashMap<String, Value>, input: &str) -> String {
    FormatterProcessor
        .process(config, Some(input))
        .await
        .expect("formatter should succeed")
}

#[tokio::test]
async fn reports_its_kind() {
    assert_eq!(FormatterProcessor.kind(), NodeKind::Formatter);
}

#[tokio::test]
async fn uppercases_ascii() {
    assert_eq!(format(&config("uppercase"), "hello world").await, "HELLO WORLD");
}

#[tokio::test]
async fn lowercases_ascii() {
    assert_eq!(format(&config("lowercase"), "HELLO World").await, "hello world");
}

#[tokio::test]
async fn converts_alphanumerics_to_fullwidth() {
    assert_eq!(
        format(&config("fullwidth"), "abc XYZ 09").await,
        "ａｂｃ ＸＹＺ ０９"
    );
}

#[tokio::test]
async fn converts_fullwidth_back_to_ascii() {
    assert_eq!(
        format(&config("halfwidth"), "１２３ＡＢＣｘｙｚ").await,
        "123ABCxyz"
    );
}

#[tokio::test]
async fn fullwidth_then_halfwidth_roundtrips() {
    let original = "The Quick 99 Brown Foxes";
    let widened = format(&config("fullwidth"), original).await;
    assert_ne!(widened, original);
    assert_eq!(format(&config("halfwidth"), &widened).await, original);
}

#[tokio::test]
async fn missing_format_type_is_identity() {
    assert_eq!(format(&HashMap::new(), "Keep Me").await, "Keep Me");
    assert_eq!(format(&HashMap::new(), "").await, "");
}

#[tokio::test]
async fn unknown_format_type_is_identity() {
    assert_eq!(format(&config("rot13"), "Keep Me").await, "Keep Me");
}

#[tokio::test]
async fn non_string_format_type_is_identity() {
    let config = HashMap::from([("format_type".to_string(), Value::from(7.0))]);
    assert_eq!(format(&config, "Keep Me").await, "Keep Me");
}

#[tokio::test]
async fn missing_input_is_rejected() {
    let result = FormatterProcessor.process(&config("uppercase"), None).await;
    assert!(matches!(result, Err(NodeError::InvalidInput(_))));
}
