use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};
use uuid::Uuid;

use super::repo::ProgressEntry;
use crate::error::{AppError, AppResult, Violation};

pub const WEIGHT_RANGE: (f64, f64) = (30.0, 150.0);
pub const TRAINING_TIME_RANGE: (f64, f64) = (1.0, 240.0);

/// Body of `POST /progress`. With an `id` the sample is updated in place.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordProgressRequest {
    #[serde(default, alias = "_id")]
    pub id: Option<Uuid>,
    pub date: Option<String>,
    pub weight: Option<f64>,
    pub training_time: Option<f64>,
}

/// A request that passed the range checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSample {
    pub id: Option<Uuid>,
    pub date: Date,
    pub weight: Option<f64>,
    pub training_time: Option<f64>,
}

fn check_range(field: &str, value: Option<f64>, (min, max): (f64, f64)) -> AppResult<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => {
            Err(AppError::validation(field, Violation::OutOfRange { min, max }))
        }
        _ => Ok(()),
    }
}

impl RecordProgressRequest {
    pub fn validate(self) -> AppResult<ProgressSample> {
        let raw = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| AppError::validation("date", Violation::Required))?;
        let date = Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| AppError::validation("date", Violation::Malformed))?;

        if self.weight.is_none() && self.training_time.is_none() {
            return Err(AppError::validation("weight", Violation::Required));
        }
        check_range("weight", self.weight, WEIGHT_RANGE)?;
        check_range("trainingTime", self.training_time, TRAINING_TIME_RANGE)?;

        Ok(ProgressSample {
            id: self.id,
            date,
            weight: self.weight,
            training_time: self.training_time,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub id: Uuid,
    pub date: String,
    pub weight: Option<f64>,
    pub training_time: Option<f64>,
}

impl From<ProgressEntry> for ProgressResponse {
    fn from(e: ProgressEntry) -> Self {
        let date = e
            .date
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        Self {
            id: e.id,
            date,
            weight: e.weight,
            training_time: e.training_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn request(date: &str, weight: Option<f64>, training_time: Option<f64>) -> RecordProgressRequest {
        RecordProgressRequest {
            id: None,
            date: Some(date.into()),
            weight,
            training_time,
        }
    }

    #[test]
    fn accepts_values_inside_ranges() {
        let sample = request("2024-03-09", Some(72.5), Some(45.0)).validate().unwrap();
        assert_eq!(sample.date, date!(2024 - 03 - 09));
        assert_eq!(sample.weight, Some(72.5));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(request("2024-03-09", Some(30.0), Some(240.0)).validate().is_ok());
        assert!(request("2024-03-09", Some(150.0), Some(1.0)).validate().is_ok());
    }

    #[test]
    fn out_of_range_reports_the_field() {
        match request("2024-03-09", Some(72.0), Some(300.0)).validate() {
            Err(AppError::Validation { field, violation }) => {
                assert_eq!(field, "trainingTime");
                assert_eq!(violation, Violation::OutOfRange { min: 1.0, max: 240.0 });
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            request("2024-03-09", Some(12.0), None).validate(),
            Err(AppError::Validation { ref field, .. }) if field == "weight"
        ));
    }

    #[test]
    fn date_is_required_and_iso() {
        let mut req = request("", Some(70.0), None);
        assert!(matches!(req.validate(), Err(AppError::Validation { ref field, violation: Violation::Required }) if field == "date"));
        req = request("09/03/2024", Some(70.0), None);
        assert!(matches!(req.validate(), Err(AppError::Validation { violation: Violation::Malformed, .. })));
    }

    #[test]
    fn a_sample_needs_at_least_one_measurement() {
        assert!(request("2024-03-09", None, None).validate().is_err());
        assert!(request("2024-03-09", None, Some(30.0)).validate().is_ok());
    }
}
