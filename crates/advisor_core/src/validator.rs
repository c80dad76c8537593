use shared::{
    domain::{ProfileField, RawProfileInput, StudentProfile},
    error::ValidationError,
};

const GPA_MAX: f64 = 4.0;
const IELTS_MAX: f64 = 9.0;

/// Turns form input into a profile. Presence of every numeric field is
/// checked before any range, so a missing budget wins over a bad gpa range.
pub fn validate(raw: &RawProfileInput) -> Result<StudentProfile, ValidationError> {
    let gpa = parse_number(raw.gpa.as_deref(), ProfileField::Gpa)?;
    let ielts = parse_number(raw.ielts.as_deref(), ProfileField::Ielts)?;
    let budget = parse_number(raw.budget.as_deref(), ProfileField::Budget)?;

    check_range(ProfileField::Gpa, gpa, 0.0, Some(GPA_MAX))?;
    check_range(ProfileField::Ielts, ielts, 0.0, Some(IELTS_MAX))?;
    check_range(ProfileField::Budget, budget, 0.0, None)?;

    Ok(StudentProfile {
        gpa,
        ielts,
        budget,
        country: optional_text(raw.country.as_deref()),
        field: optional_text(raw.field.as_deref()),
    })
}

fn parse_number(raw: Option<&str>, field: ProfileField) -> Result<f64, ValidationError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or(ValidationError::MissingField { field })
}

fn check_range(
    field: ProfileField,
    value: f64,
    min: f64,
    max: Option<f64>,
) -> Result<(), ValidationError> {
    let above_max = max.is_some_and(|max| value > max);
    if value < min || above_max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
