//! Purpose: Convert a classified decode record into a JSON object.
//! Exports: `to_json`.
//! Role: The only value conversion in the crate; one level deep, no recursion.
//! Invariants: Every entry is either converted or rejected; nothing is dropped silently.
//! Invariants: Integers stay 64-bit; non-finite floats become `null`.
use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};
use crate::core::record::{DynamicKey, DynamicRecord, DynamicValue};

pub fn to_json(record: DynamicRecord) -> Result<Value, Error> {
    let mut out = Map::with_capacity(record.len());
    for (key, value) in record {
        let key = match key {
            DynamicKey::Text(key) => key,
            DynamicKey::NonText { type_name } => {
                return Err(Error::new(ErrorKind::NonTextKey)
                    .with_message("record key is not text")
                    .with_type_name(type_name));
            }
        };
        let value = match value {
            DynamicValue::Text(text) => Value::String(text),
            DynamicValue::Integer(number) => Value::from(number),
            DynamicValue::Unsigned(number) => Value::from(number),
            DynamicValue::Float(number) => Value::from(number),
            DynamicValue::Unsupported { type_name } => {
                return Err(Error::new(ErrorKind::UnsupportedValueType)
                    .with_message("record value has no json form")
                    .with_key(key)
                    .with_type_name(type_name));
            }
        };
        out.insert(key, value);
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::to_json;
    use crate::core::error::ErrorKind;
    use crate::core::record::{DynamicKey, DynamicRecord, DynamicValue};
    use serde_json::json;

    #[test]
    fn scalar_record_converts_exactly() {
        let mut record = DynamicRecord::new();
        record.insert("a", "x".into());
        record.insert("b", 5i64.into());
        record.insert("c", 2.5f64.into());

        let value = to_json(record).expect("json");
        assert_eq!(value, json!({"a": "x", "b": 5, "c": 2.5}));
        assert_eq!(
            serde_json::to_string(&value).expect("encode"),
            r#"{"a":"x","b":5,"c":2.5}"#
        );
    }

    #[test]
    fn integers_are_not_truncated_to_32_bits() {
        let mut record = DynamicRecord::new();
        record.insert("big", DynamicValue::Integer(1 << 40));
        record.insert("neg", DynamicValue::Integer(i64::MIN));

        let value = to_json(record).expect("json");
        assert_eq!(value["big"].as_i64(), Some(1 << 40));
        assert_eq!(value["neg"].as_i64(), Some(i64::MIN));
        assert!(value["big"].is_i64());
    }

    #[test]
    fn unsigned_integers_above_i64_stay_exact() {
        let mut record = DynamicRecord::new();
        record.insert("n", DynamicValue::Unsigned(1 << 63));
        record.insert("max", u64::MAX.into());

        let value = to_json(record).expect("json");
        assert_eq!(value["n"].as_u64(), Some(1 << 63));
        assert_eq!(value["max"].as_u64(), Some(u64::MAX));
        assert_eq!(
            serde_json::to_string(&value).expect("encode"),
            r#"{"max":18446744073709551615,"n":9223372036854775808}"#
        );
    }

    #[test]
    fn non_finite_float_becomes_null() {
        let mut record = DynamicRecord::new();
        record.insert("x", DynamicValue::Float(f64::NAN));
        record.insert("y", DynamicValue::Float(181.0));

        let value = to_json(record).expect("json");
        assert!(value["x"].is_null());
        assert_eq!(value["y"].as_f64(), Some(181.0));
    }

    #[test]
    fn unsupported_value_names_the_key() {
        let mut record = DynamicRecord::new();
        record.insert("ok", "fine".into());
        record.insert(
            "a",
            DynamicValue::Unsupported {
                type_name: "list".to_string(),
            },
        );

        let err = to_json(record).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::UnsupportedValueType);
        assert_eq!(err.key(), Some("a"));
        assert_eq!(err.type_name(), Some("list"));
        assert!(err.is_conversion());
    }

    #[test]
    fn non_text_key_is_rejected() {
        let record: DynamicRecord = [(
            DynamicKey::NonText {
                type_name: "int".to_string(),
            },
            DynamicValue::Integer(1),
        )]
        .into_iter()
        .collect();

        let err = to_json(record).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::NonTextKey);
        assert_eq!(err.type_name(), Some("int"));
    }

    #[test]
    fn empty_record_is_empty_object() {
        let value = to_json(DynamicRecord::new()).expect("json");
        assert_eq!(value, json!({}));
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let mut record = DynamicRecord::new();
        record.insert("k", 1i64.into());
        record.insert("k", 2i64.into());
        assert_eq!(to_json(record).expect("json"), json!({"k": 2}));
    }
}
