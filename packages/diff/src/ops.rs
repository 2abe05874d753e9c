use serde::{Deserialize, Serialize};

/// A single edit instruction over a base string.
///
/// Counts are in characters, not bytes. A negative count is unrepresentable
/// here; on the wire it is rejected at deserialization rather than clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operation {
    /// Copy `count` characters of the base unchanged.
    Retain { count: usize },
    /// Emit `text` at the current position.
    Insert { text: String },
    /// Skip `count` characters of the base without emitting them.
    Delete { count: usize },
}

/// An ordered edit script transforming a base string into a target string.
pub type OperationList = Vec<Operation>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let ops = vec![
            Operation::Retain { count: 5 },
            Operation::Insert {
                text: " world".to_string(),
            },
            Operation::Delete { count: 2 },
        ];

        let json = serde_json::to_value(&ops).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"kind": "retain", "count": 5},
                {"kind": "insert", "text": " world"},
                {"kind": "delete", "count": 2},
            ])
        );
    }

    #[test]
    fn test_wire_round_trip() {
        let ops = vec![
            Operation::Delete { count: 3 },
            Operation::Insert {
                text: "xyz".to_string(),
            },
        ];

        let json = serde_json::to_string(&ops).unwrap();
        let back: OperationList = serde_json::from_str(&json).unwrap();
        assert_eq!(ops, back);
    }

    #[test]
    fn test_negative_count_rejected() {
        let result: Result<Operation, _> =
            serde_json::from_str(r#"{"kind": "retain", "count": -1}"#);
        assert!(result.is_err(), "negative counts must fail, not clamp");

        let result: Result<Operation, _> =
            serde_json::from_str(r#"{"kind": "delete", "count": -4}"#);
        assert!(result.is_err());
    }
}
