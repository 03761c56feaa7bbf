//! Request-field helpers shared by the learning endpoints.

use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

/// Accepts an id sent either as a JSON number or as a numeric string
/// (`"userId": "42"` is what browser clients lifting ids out of URLs send).
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_number(deserializer)
}

/// Like [`opt_id`] for any numeric field. Form inputs post their values as text,
/// so `"rating": "5"` and `"engagementScore": "0.8"` are read as numbers.
pub fn opt_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<N> {
        Num(N),
        Text(String),
    }

    match Option::<Raw<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid number: {s}"))),
    }
}

/// A required, positive identifier.
pub fn require_id(value: Option<i64>, field: &str) -> AppResult<i64> {
    match value {
        Some(id) if id > 0 => Ok(id),
        Some(_) => Err(AppError::invalid(format!("{field} must be a positive integer"))),
        None => Err(AppError::invalid(format!("{field} is required"))),
    }
}

/// Trims an optional text field; blank counts as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "opt_id")]
        id: Option<i64>,
    }

    fn parse(json: &str) -> Result<Body, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn ids_parse_from_numbers_and_strings() {
        assert_eq!(parse(r#"{"id": 42}"#).unwrap().id, Some(42));
        assert_eq!(parse(r#"{"id": "42"}"#).unwrap().id, Some(42));
        assert_eq!(parse(r#"{"id": ""}"#).unwrap().id, None);
        assert_eq!(parse(r#"{"id": null}"#).unwrap().id, None);
        assert_eq!(parse(r#"{}"#).unwrap().id, None);
        assert!(parse(r#"{"id": "forty-two"}"#).is_err());
    }

    #[derive(Debug, Deserialize)]
    struct Scores {
        #[serde(default, deserialize_with = "opt_number")]
        rating: Option<i32>,
        #[serde(default, deserialize_with = "opt_number")]
        engagement: Option<f64>,
    }

    #[test]
    fn numbers_parse_from_form_text() {
        let s: Scores = serde_json::from_str(r#"{"rating": "5", "engagement": "0.8"}"#).unwrap();
        assert_eq!(s.rating, Some(5));
        assert_eq!(s.engagement, Some(0.8));

        let s: Scores = serde_json::from_str(r#"{"rating": 4, "engagement": 1}"#).unwrap();
        assert_eq!(s.rating, Some(4));
        assert_eq!(s.engagement, Some(1.0));

        let s: Scores = serde_json::from_str(r#"{"rating": " ", "engagement": null}"#).unwrap();
        assert_eq!(s.rating, None);
        assert_eq!(s.engagement, None);

        assert!(serde_json::from_str::<Scores>(r#"{"rating": "five"}"#).is_err());
        assert!(serde_json::from_str::<Scores>(r#"{"rating": "4.5"}"#).is_err());
    }

    #[test]
    fn require_id_rejects_missing_and_non_positive() {
        assert_eq!(require_id(Some(7), "courseId").unwrap(), 7);
        assert!(matches!(
            require_id(None, "courseId"),
            Err(AppError::InvalidArgument(m)) if m == "courseId is required"
        ));
        assert!(require_id(Some(0), "courseId").is_err());
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(Some("  visual ".into())).as_deref(), Some("visual"));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
