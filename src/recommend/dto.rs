use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    extract::opt_id,
};

/// Field count of the recommender's positional course tuple:
/// `(course_id, course_name, category, difficulty, video_link, description)`.
pub const TUPLE_ARITY: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationItem {
    pub course_id: i64,
    pub course_name: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub video_link: Option<String>,
    pub description: Option<String>,
}

/// The positional form, as exposed on `/recommend/:type/:userId`.
pub type RecommendationRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

impl RecommendationItem {
    pub fn from_tuple(index: usize, tuple: &[Value]) -> AppResult<Self> {
        if tuple.len() != TUPLE_ARITY {
            return Err(malformed(index, format!(
                "expected {TUPLE_ARITY} fields, got {}",
                tuple.len()
            )));
        }
        let course_id = id_field(&tuple[0])
            .filter(|id| *id > 0)
            .ok_or_else(|| malformed(index, "course_id"))?;
        let course_name = match &tuple[1] {
            Value::String(s) => s.clone(),
            _ => return Err(malformed(index, "course_name")),
        };
        Ok(Self {
            course_id,
            course_name,
            category: text_field(&tuple[2]).ok_or_else(|| malformed(index, "category"))?,
            difficulty: text_field(&tuple[3]).ok_or_else(|| malformed(index, "difficulty"))?,
            video_link: text_field(&tuple[4]).ok_or_else(|| malformed(index, "video_link"))?,
            description: text_field(&tuple[5]).ok_or_else(|| malformed(index, "description"))?,
        })
    }

    pub fn into_row(self) -> RecommendationRow {
        (
            self.course_id,
            self.course_name,
            self.category,
            self.difficulty,
            self.video_link,
            self.description,
        )
    }
}

fn malformed(index: usize, what: impl std::fmt::Display) -> AppError {
    AppError::MalformedUpstreamResponse(format!("recommendation #{index}: {what}"))
}

fn id_field(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            // 2^63 itself is exactly representable, so the upper bound is exclusive
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `Some(None)` for null, `None` when the value has the wrong shape.
fn text_field(v: &Value) -> Option<Option<String>> {
    match v {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        Value::Number(n) => Some(Some(n.to_string())),
        _ => None,
    }
}

/// Recommender response body. Extra keys (the recommender echoes `user_id`) are ignored.
#[derive(Debug, Deserialize)]
pub struct UpstreamBody {
    pub recommendations: Vec<Vec<Value>>,
}

pub fn parse_upstream(body: &[u8]) -> AppResult<Vec<RecommendationItem>> {
    let parsed: UpstreamBody = serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedUpstreamResponse(e.to_string()))?;
    parsed
        .recommendations
        .iter()
        .enumerate()
        .map(|(i, tuple)| RecommendationItem::from_tuple(i, tuple))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<RecommendationRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub user_id: Option<i64>,
    #[serde(rename = "type")]
    pub strategy: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardEnrollRequest {
    #[serde(default, deserialize_with = "opt_id")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "opt_id")]
    pub course_id: Option<i64>,
    #[serde(rename = "type")]
    pub strategy: Option<String>,
}
