//! Lenient deserializers for values the API sends as either numbers or strings.
//!
//! The backend returns identifiers as integers but echoes form submissions
//! back verbatim, so `patient_id` or `montant` may arrive as `"3"` or
//! `"150.00"`.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

use crate::entity::RecordId;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(u64),
    Float(f64),
    Text(String),
}

impl NumberOrString {
    fn into_text(self) -> String {
        match self {
            NumberOrString::Int(n) => n.to_string(),
            NumberOrString::Float(f) => f.to_string(),
            NumberOrString::Text(s) => s,
        }
    }
}

/// Record identifier from a number or a numeric string.
pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordId, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => Ok(n),
        NumberOrString::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as RecordId),
        NumberOrString::Float(f) => Err(D::Error::custom(format!("invalid identifier {}", f))),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid identifier '{}'", s))),
    }
}

/// Monetary amount from a number or a decimal string.
pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => n as f64,
        NumberOrString::Float(f) => f,
        NumberOrString::Text(s) => parse_amount(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid amount '{}'", s)))?,
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(D::Error::custom("amount must be finite"))
    }
}

/// Text field that tolerates `null` and numbers.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_text)
        .unwrap_or_default())
}

/// Optional text field that tolerates numbers.
pub fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.map(NumberOrString::into_text))
}

/// Optional small count (e.g. age) from a number or a numeric string.
pub fn opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Int(n)) => Ok(u32::try_from(n).ok()),
        Some(NumberOrString::Float(f)) if f >= 0.0 => Ok(Some(f as u32)),
        Some(NumberOrString::Float(_)) => Ok(None),
        Some(NumberOrString::Text(s)) => Ok(s.trim().parse().ok()),
    }
}

/// Parse a user- or server-supplied amount. Accepts a decimal comma.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Date part of a date or datetime string (`2024-01-10T08:00:00Z` → `2024-01-10`).
pub fn date_only(raw: &str) -> String {
    match raw.split_once(|c: char| c == 'T' || c == ' ') {
        Some((date, _)) => date.to_string(),
        None => raw.to_string(),
    }
}

/// Datetime truncated to minutes in `YYYY-MM-DDTHH:MM` form.
pub fn minutes_precision(raw: &str) -> String {
    let normalized = match raw.split_once(' ') {
        Some((date, time)) => format!("{}T{}", date, time),
        None => raw.to_string(),
    };
    normalized.chars().take(16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "id")]
        id: RecordId,
        #[serde(deserialize_with = "amount")]
        amount: f64,
        #[serde(default, deserialize_with = "text")]
        text: String,
        #[serde(default, deserialize_with = "opt_count")]
        age: Option<u32>,
    }

    #[test]
    fn test_numbers_and_strings_both_accepted() {
        let a: Sample = serde_json::from_str(r#"{"id": 3, "amount": 150, "text": 7}"#).unwrap();
        let b: Sample =
            serde_json::from_str(r#"{"id": "3", "amount": "150.00", "text": "7"}"#).unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(a.amount, b.amount);
        assert_eq!(a.text, b.text);
    }

    #[test]
    fn test_null_text_is_empty() {
        let p: Sample = serde_json::from_str(r#"{"id": 1, "amount": 0, "text": null}"#).unwrap();
        assert_eq!(p.text, "");
        assert_eq!(p.age, None);
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let result: Result<Sample, _> = serde_json::from_str(r#"{"id": "abc", "amount": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_age_from_string() {
        let p: Sample = serde_json::from_str(r#"{"id": 1, "amount": 0, "age": "42"}"#).unwrap();
        assert_eq!(p.age, Some(42));
    }

    #[test]
    fn test_parse_amount_decimal_comma() {
        assert_eq!(parse_amount("12,50"), Some(12.5));
        assert_eq!(parse_amount(" 150.00 "), Some(150.0));
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_date_only() {
        assert_eq!(date_only("2024-01-10T00:00:00.000000Z"), "2024-01-10");
        assert_eq!(date_only("2024-01-10 08:30:00"), "2024-01-10");
        assert_eq!(date_only("2024-01-10"), "2024-01-10");
    }

    #[test]
    fn test_minutes_precision() {
        assert_eq!(minutes_precision("2024-03-05T14:30:00.000000Z"), "2024-03-05T14:30");
        assert_eq!(minutes_precision("2024-03-05 14:30:00"), "2024-03-05T14:30");
        assert_eq!(minutes_precision("2024-03-05T14:30"), "2024-03-05T14:30");
    }
}
