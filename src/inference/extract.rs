//! Defensive extraction of structured content from model output text.
//!
//! Models regularly wrap the JSON document they were asked for in a
//! fence-delimited block, with or without a `json` tag, and sometimes with
//! prose around it. Extraction takes the substring between the first opening
//! fence and the last closing fence; with no fence present, the trimmed text
//! is used as-is.

use serde::de::DeserializeOwned;

use super::InferenceError;

const FENCE_JSON: &str = "```json";
const FENCE: &str = "```";

/// Isolate the structured payload in `text`.
///
/// Fence markers are discarded. If the closing fence does not come after the
/// opening one, the text is treated as fenceless.
pub fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(open) = trimmed.find(FENCE_JSON) {
        let start = open + FENCE_JSON.len();
        if let Some(end) = trimmed.rfind(FENCE) {
            if end > start {
                return trimmed[start..end].trim();
            }
        }
    } else if let Some(open) = trimmed.find(FENCE) {
        let start = open + FENCE.len();
        if let Some(end) = trimmed.rfind(FENCE) {
            if end > start {
                return trimmed[start..end].trim();
            }
        }
    }

    trimmed
}

/// Parse model output text into the expected document shape.
///
/// Unknown extra keys are ignored; structural and syntax failures become
/// [`InferenceError::Parse`] carrying the full raw text for diagnosis.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T, InferenceError> {
    let extracted = extract_json_block(text);
    serde_json::from_str(extracted).map_err(|e| InferenceError::Parse {
        message: e.to_string(),
        raw: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        a: i64,
    }

    #[rstest]
    #[case::tagged_fence("```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case::bare_fence("```\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case::no_fence("{\"a\":1}", "{\"a\":1}")]
    #[case::surrounding_whitespace("  \n{\"a\":1}\n  ", "{\"a\":1}")]
    #[case::prose_around_fence(
        "Here is the analysis:\n```json\n{\"a\":1}\n```\nLet me know if you need more.",
        "{\"a\":1}"
    )]
    fn extraction_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(extract_json_block(input), expected);
    }

    #[test]
    fn unterminated_fence_falls_back_to_whole_text() {
        // No closing fence after the opening one: treat as fenceless.
        let text = "```json\n{\"a\":1}";
        assert_eq!(extract_json_block(text), text.trim());
    }

    #[test]
    fn parse_accepts_fenced_document() {
        let doc: Doc = parse_payload("```json\n{\"a\": 7}\n```").unwrap();
        assert_eq!(doc, Doc { a: 7 });
    }

    #[test]
    fn parse_ignores_unknown_keys() {
        let doc: Doc = parse_payload(r#"{"a": 7, "model_notes": "extra"}"#).unwrap();
        assert_eq!(doc, Doc { a: 7 });
    }

    #[test]
    fn truncated_json_is_a_parse_error_with_raw_text() {
        let raw = "```json\n{\"a\": \n```";
        let err = parse_payload::<Doc>(raw).unwrap_err();
        match err {
            InferenceError::Parse { raw: captured, .. } => assert_eq!(captured, raw),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn wrong_top_level_shape_is_a_parse_error() {
        assert!(parse_payload::<Doc>(r#"[1, 2, 3]"#).is_err());
    }
}
