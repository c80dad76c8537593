use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniversityId(pub String);

impl fmt::Display for UniversityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Gpa,
    Ielts,
    Budget,
}

impl ProfileField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gpa => "gpa",
            Self::Ielts => "ielts",
            Self::Budget => "budget",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile fields exactly as typed into the form, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProfileInput {
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub ielts: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

impl RawProfileInput {
    pub fn new(
        gpa: impl Into<String>,
        ielts: impl Into<String>,
        budget: impl Into<String>,
    ) -> Self {
        Self {
            gpa: Some(gpa.into()),
            ielts: Some(ielts.into()),
            budget: Some(budget.into()),
            country: None,
            field: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// A validated profile. Built only by the validator; the same value is sent
/// to every remote call of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub gpa: f64,
    pub ielts: f64,
    pub budget: f64,
    pub country: Option<String>,
    pub field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct University {
    pub id: UniversityId,
    pub name: String,
    pub country: String,
    pub city: String,
    pub tuition_fee: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programs_count: Option<u32>,
    #[serde(default)]
    pub top_programs: Vec<String>,
    #[serde(default)]
    pub scholarship_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_chance: Option<f64>,
}

/// Client-side narrowing of a recommendation list.
///
/// `Default` is the all-permissive value: applying it keeps every candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub min_ranking: u32,
    pub max_ranking: u32,
    pub min_tuition: f64,
    pub max_tuition: f64,
    pub country: Option<String>,
    pub program_type: Option<String>,
    pub scholarship_only: bool,
    pub min_admission_chance: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_ranking: 1,
            max_ranking: u32::MAX,
            min_tuition: 0.0,
            max_tuition: f64::INFINITY,
            country: None,
            program_type: None,
            scholarship_only: false,
            min_admission_chance: 0.0,
        }
    }
}

impl FilterCriteria {
    /// Values the filters panel starts from and resets to.
    pub fn panel_defaults() -> Self {
        Self {
            max_ranking: 500,
            max_tuition: 50_000.0,
            ..Self::default()
        }
    }
}
