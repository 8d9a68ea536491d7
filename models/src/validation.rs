// models/src/validation.rs

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::errors::{ValidationError, ValidationResult};

pub const EMERGENCY_NOTES_MAX_LEN: usize = 500;
pub const DOCTOR_NOTE_MAX_LEN: usize = 1000;
pub const ALERT_TITLE_MAX_LEN: usize = 200;
pub const ALERT_MESSAGE_MAX_LEN: usize = 1000;
pub const CANCELLATION_REASON_MAX_LEN: usize = 500;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const NAME_MAX_LEN: usize = 200;

lazy_static! {
    static ref UUID_RE: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
    static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Returns the trimmed value, or `MissingField` when it is absent or blank.
pub fn require(field: &str, value: Option<&str>) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::MissingField(field.to_string())),
    }
}

/// Parses a canonical 8-4-4-4-12 hex UUID.
///
/// `Uuid::parse_str` alone also accepts braced, URN and simple forms, so the
/// string is matched against the canonical pattern first.
pub fn parse_uuid(field: &str, value: &str) -> ValidationResult<Uuid> {
    if !UUID_RE.is_match(value) {
        return Err(ValidationError::InvalidUuid(field.to_string()));
    }
    Uuid::parse_str(value).map_err(|_| ValidationError::InvalidUuid(field.to_string()))
}

pub fn parse_optional_uuid(field: &str, value: Option<&str>) -> ValidationResult<Option<Uuid>> {
    value.map(|v| parse_uuid(field, v)).transpose()
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    if !DATE_RE.is_match(value) {
        return Err(ValidationError::InvalidDateFormat(field.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDateFormat(field.to_string()))
}

pub fn check_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field: field.to_string(), max });
    }
    Ok(())
}

pub fn check_min_len(field: &str, value: &str, min: usize) -> ValidationResult<()> {
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field: field.to_string(), min });
    }
    Ok(())
}

pub fn validate_email(value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }
    Ok(trimmed.to_lowercase())
}

/// An inclusive timestamp window built from `startDate`/`endDate` query
/// parameters. The start bound is the first instant of its day and the end
/// bound the last instant of its day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn from_params(start: Option<&str>, end: Option<&str>) -> ValidationResult<Self> {
        let start = start
            .map(|s| parse_date("startDate", s))
            .transpose()?
            .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)));
        let end = end
            .map(|s| parse_date("endDate", s))
            .transpose()?
            .map(|d| {
                let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                    .unwrap_or(NaiveTime::MIN);
                Utc.from_utc_datetime(&d.and_time(last))
            });

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ValidationError::InvertedRange);
            }
        }
        Ok(DateRange { start, end })
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| *ts >= s) && self.end.is_none_or(|e| *ts <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Checks a latitude/longitude pair for presence and range.
pub fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> ValidationResult<(f64, f64)> {
    let (Some(lat), Some(lng)) = (latitude, longitude) else {
        return Err(ValidationError::MissingField("Location".to_string()));
    };
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::OutOfRange("latitude".to_string()));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::OutOfRange("longitude".to_string()));
    }
    Ok((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_canonical_uuid() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_uuid("patientId", &id).unwrap().to_string(), id);
    }

    #[test]
    fn should_reject_non_canonical_uuid() {
        let simple = Uuid::new_v4().simple().to_string();
        assert_eq!(
            parse_uuid("patientId", &simple).unwrap_err(),
            ValidationError::InvalidUuid("patientId".to_string())
        );
        assert!(parse_uuid("patientId", "not-a-uuid").is_err());
    }

    #[test]
    fn should_reject_impossible_dates() {
        assert!(parse_date("startDate", "2024-02-30").is_err());
        assert!(parse_date("startDate", "2024-1-01").is_err());
        assert!(parse_date("startDate", "2024-02-29").is_ok());
    }

    #[test]
    fn date_range_is_inclusive_on_both_days() {
        let range = DateRange::from_params(Some("2024-01-01"), Some("2024-01-31")).unwrap();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert!(range.contains(&first));
        assert!(range.contains(&last));
        assert!(!range.contains(&after));
        assert!(!range.contains(&before));
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let err = DateRange::from_params(Some("2024-02-01"), Some("2024-01-01")).unwrap_err();
        assert_eq!(err, ValidationError::InvertedRange);
    }

    #[test]
    fn should_validate_coordinates() {
        assert_eq!(validate_coordinates(Some(40.0), Some(-73.0)).unwrap(), (40.0, -73.0));
        assert!(validate_coordinates(None, Some(-73.0)).is_err());
        assert!(validate_coordinates(Some(91.0), Some(0.0)).is_err());
        assert!(validate_coordinates(Some(0.0), Some(f64::NAN)).is_err());
    }

    #[test]
    fn should_normalize_email() {
        assert_eq!(validate_email(" Jane@Example.COM ").unwrap(), "jane@example.com");
        assert!(validate_email("jane.example.com").is_err());
    }

    #[test]
    fn length_checks_count_characters() {
        assert!(check_max_len("notes", &"é".repeat(500), EMERGENCY_NOTES_MAX_LEN).is_ok());
        assert!(check_max_len("notes", &"a".repeat(501), EMERGENCY_NOTES_MAX_LEN).is_err());
        assert!(check_min_len("password", "12345", PASSWORD_MIN_LEN).is_err());
    }
}
