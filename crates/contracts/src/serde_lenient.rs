//! Serde helpers for numeric fields of the externally-owned snapshot
//! document, which arrive as integers, floats, or numeric strings depending
//! on who last edited the document.

/// Accepts integers, floats (truncated), numeric strings, booleans, and
/// null; anything unparseable becomes 0. Serializes as a plain integer.
pub mod int {
    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::Deserialize;
    use serde_json::Value;

    pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(coerce(&raw))
    }

    pub(crate) fn coerce(raw: &Value) -> i64 {
        match raw {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|value| value.trunc() as i64))
                .unwrap_or(0),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map(|value| value.trunc() as i64)
                .unwrap_or(0),
            Value::Bool(flag) => i64::from(*flag),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "super::int")]
        value: i64,
    }

    fn decode(raw: &str) -> i64 {
        serde_json::from_str::<Wrapper>(raw).expect("decode").value
    }

    #[test]
    fn coerces_common_shapes() {
        assert_eq!(decode(r#"{"value": 7}"#), 7);
        assert_eq!(decode(r#"{"value": 7.9}"#), 7);
        assert_eq!(decode(r#"{"value": "-3.4"}"#), -3);
        assert_eq!(decode(r#"{"value": "12"}"#), 12);
        assert_eq!(decode(r#"{"value": "garbage"}"#), 0);
        assert_eq!(decode(r#"{"value": null}"#), 0);
        assert_eq!(decode(r#"{"value": true}"#), 1);
    }
}
