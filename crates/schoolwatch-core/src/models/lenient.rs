//! Field deserializers for the loosely typed remote database.
//!
//! Text fields may arrive as numbers, numeric fields as strings. Anything
//! that cannot be coerced becomes the field's default.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    })
}

pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => match n.as_i64() {
            Some(v) => i32::try_from(v).unwrap_or_default(),
            None => n.as_f64().and_then(float_to_int).unwrap_or_default(),
        },
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

/// Truncates toward zero; `None` when the value has no i32 equivalent.
fn float_to_int(v: f64) -> Option<i32> {
    let v = v.trunc();
    if v.is_finite() && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
        Some(v as i32)
    } else {
        None
    }
}

/// Non-finite values ("inf", "NaN") cannot be written back as JSON, so they
/// become the default.
pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "super::int")]
        count: i32,
        #[serde(default, deserialize_with = "super::float")]
        ratio: f64,
    }

    fn parse(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_int_out_of_range_is_default() {
        assert_eq!(parse(r#"{"count": 4294967297}"#).count, 0);
        assert_eq!(parse(r#"{"count": -4294967297}"#).count, 0);
        assert_eq!(parse(r#"{"count": 1e12}"#).count, 0);
        assert_eq!(parse(r#"{"count": "99999999999"}"#).count, 0);
        assert_eq!(parse(r#"{"count": 2147483647}"#).count, i32::MAX);
        assert_eq!(parse(r#"{"count": 12.9}"#).count, 12);
    }

    #[test]
    fn test_non_finite_float_is_default() {
        assert_eq!(parse(r#"{"ratio": "inf"}"#).ratio, 0.0);
        assert_eq!(parse(r#"{"ratio": "-infinity"}"#).ratio, 0.0);
        assert_eq!(parse(r#"{"ratio": "NaN"}"#).ratio, 0.0);
        assert_eq!(parse(r#"{"ratio": " 25.5 "}"#).ratio, 25.5);
    }
}
