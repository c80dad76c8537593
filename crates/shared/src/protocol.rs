use serde::{Deserialize, Serialize};

use crate::domain::{StudentProfile, University, UniversityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Success,
    Error,
}

/// Body of `POST /predict` and `POST /recommend`.
pub type ProfileRequest = StudentProfile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdmissionChanceValue {
    Number(f64),
    Text(String),
}

impl AdmissionChanceValue {
    /// Numeric chance in percent. Text values like `"78"` or `"78.5%"` are accepted.
    pub fn as_percent(&self) -> Option<f64> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().trim_end_matches('%').trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_chance: Option<AdmissionChanceValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default)]
    pub recommendations: Vec<UniversityRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A recommendation as the service sends it. Older backends use
/// `university`/`average_fees_eur`/`field`; newer ones the `University` names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UniversityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, alias = "university")]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, alias = "average_fees_eur")]
    pub tuition_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programs_count: Option<u32>,
    #[serde(default)]
    pub top_programs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub scholarship_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_chance: Option<f64>,
}

impl From<UniversityRecord> for University {
    fn from(record: UniversityRecord) -> Self {
        let id = match record.id {
            Some(serde_json::Value::String(id)) if !id.trim().is_empty() => id,
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => slug(&record.name),
        };

        let ranking = record
            .ranking
            .filter(|rank| rank.is_finite() && *rank >= 1.0)
            .map(|rank| rank.round().min(u32::MAX as f64) as u32);

        let mut top_programs = record.top_programs;
        if top_programs.is_empty() {
            if let Some(field) = record.field.filter(|f| !f.trim().is_empty()) {
                top_programs.push(field.trim().to_string());
            }
        }

        Self {
            id: UniversityId(id),
            name: record.name,
            country: record.country,
            city: record.city,
            tuition_fee: record.tuition_fee.filter(|fee| fee.is_finite()).unwrap_or(0.0),
            ranking,
            programs_count: record.programs_count,
            top_programs,
            scholarship_available: record.scholarship_available,
            admission_chance: record
                .admission_chance
                .filter(|chance| chance.is_finite())
                .map(|chance| chance.clamp(0.0, 100.0)),
        }
    }
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct UniversitiesRequest<'a> {
    pub universities: &'a [University],
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationQualityRequest<'a> {
    pub recommendations: &'a [University],
}
