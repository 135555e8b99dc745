//! Envelope messages produced by a stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeKind {
    /// First message of a built-in stream.
    Start,
    /// One step of `streaming_count`.
    Progress,
    /// One batch of `streaming_data`.
    Chunk,
    /// Last message of a built-in stream.
    Complete,
    /// Sole message of a single-call fallback stream.
    Result,
}

/// One unit of a stream: `{ "type": .., "data": .., "final": true }`.
///
/// `final` is only serialized on the terminal envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub data: Value,
    #[serde(rename = "final", default, skip_serializing_if = "is_false")]
    pub is_final: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Envelope {
    fn new(kind: EnvelopeKind, data: Value, is_final: bool) -> Self {
        Self {
            kind,
            data,
            is_final,
        }
    }

    pub fn start(data: Value) -> Self {
        Self::new(EnvelopeKind::Start, data, false)
    }

    pub fn progress(data: Value) -> Self {
        Self::new(EnvelopeKind::Progress, data, false)
    }

    pub fn chunk(data: Value) -> Self {
        Self::new(EnvelopeKind::Chunk, data, false)
    }

    /// Terminal envelope of a built-in stream.
    pub fn complete(data: Value) -> Self {
        Self::new(EnvelopeKind::Complete, data, true)
    }

    /// Terminal envelope wrapping a single call result.
    pub fn result(data: Value) -> Self {
        Self::new(EnvelopeKind::Result, data, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_final_only_serialized_when_set() {
        let start = serde_json::to_value(Envelope::start(json!({"message": "go"}))).unwrap();
        assert_eq!(start, json!({"type": "start", "data": {"message": "go"}}));

        let done = serde_json::to_value(Envelope::complete(json!({}))).unwrap();
        assert_eq!(done, json!({"type": "complete", "data": {}, "final": true}));
    }

    #[test]
    fn test_parse_without_final() {
        let env: Envelope =
            serde_json::from_value(json!({"type": "chunk", "data": {"items": []}})).unwrap();
        assert_eq!(env.kind, EnvelopeKind::Chunk);
        assert!(!env.is_final);
    }

    #[test]
    fn test_result_is_final() {
        let env = Envelope::result(json!({"echo": "hi"}));
        assert_eq!(env.kind, EnvelopeKind::Result);
        assert!(env.is_final);
    }
}
