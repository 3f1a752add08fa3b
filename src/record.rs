//! The inference request payload and its validation rules. The category lists
//! here mirror the training dataset; anything outside them is rejected before
//! any model work happens (the encoder itself would silently ignore it).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::preprocess::RawRow;

pub const GENDER_CATEGORIES: &[&str] = &["Female", "Male", "Other"];
pub const MARRIED_CATEGORIES: &[&str] = &["No", "Yes"];
pub const WORK_TYPE_CATEGORIES: &[&str] =
    &["Govt_job", "Never_worked", "Private", "Self-employed", "children"];
pub const RESIDENCE_CATEGORIES: &[&str] = &["Rural", "Urban"];
pub const SMOKING_CATEGORIES: &[&str] =
    &["Unknown", "formerly smoked", "never smoked", "smokes"];

/// One patient record as posted to `/api/predict`. Lives for the duration of a
/// single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub gender: String,
    pub age: f64,
    pub hypertension: i64,
    pub heart_disease: i64,
    pub ever_married: String,
    pub work_type: String,
    /// The training dataset capitalizes this column as `Residence_type`; the
    /// alias keeps old clients working.
    #[serde(alias = "Residence_type")]
    pub residence_type: String,
    #[serde(default)]
    pub avg_glucose_level: Option<f64>,
    #[serde(default)]
    pub bmi: Option<f64>,
    pub smoking_status: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be one of {allowed:?}")]
    UnknownCategory { field: &'static str, allowed: &'static [&'static str] },
    #[error("age must be between 0 and 120")]
    AgeOutOfRange,
    #[error("{field} must be 0 or 1")]
    NotBinary { field: &'static str },
}

impl PatientRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_category("gender", &self.gender, GENDER_CATEGORIES)?;
        check_category("ever_married", &self.ever_married, MARRIED_CATEGORIES)?;
        check_category("work_type", &self.work_type, WORK_TYPE_CATEGORIES)?;
        check_category("residence_type", &self.residence_type, RESIDENCE_CATEGORIES)?;
        check_category("smoking_status", &self.smoking_status, SMOKING_CATEGORIES)?;
        check_binary("hypertension", self.hypertension)?;
        check_binary("heart_disease", self.heart_disease)?;
        if !(0.0..=120.0).contains(&self.age) {
            return Err(ValidationError::AgeOutOfRange);
        }
        Ok(())
    }

    /// Assemble the raw feature row in the exact column order the bundle was
    /// trained with. Optional numerics stay absent here; the fitted imputer
    /// fills them during the transform.
    pub fn feature_row(
        &self,
        numeric_features: &[String],
        categorical_features: &[String],
    ) -> Result<RawRow, UnknownFeature> {
        let mut row = RawRow::default();
        for name in numeric_features {
            row.numeric.push(match name.as_str() {
                "age" => Some(self.age),
                "hypertension" => Some(self.hypertension as f64),
                "heart_disease" => Some(self.heart_disease as f64),
                "avg_glucose_level" => self.avg_glucose_level,
                "bmi" => self.bmi,
                other => return Err(UnknownFeature(other.to_string())),
            });
        }
        for name in categorical_features {
            row.categorical.push(Some(match name.as_str() {
                "gender" => self.gender.clone(),
                "ever_married" => self.ever_married.clone(),
                "work_type" => self.work_type.clone(),
                "Residence_type" | "residence_type" => self.residence_type.clone(),
                "smoking_status" => self.smoking_status.clone(),
                other => return Err(UnknownFeature(other.to_string())),
            }));
        }
        Ok(row)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("feature {0:?} is not part of the patient record")]
pub struct UnknownFeature(pub String);

fn check_category(
    field: &'static str,
    value: &str,
    allowed: &'static [&'static str],
) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::UnknownCategory { field, allowed })
    }
}

fn check_binary(field: &'static str, value: i64) -> Result<(), ValidationError> {
    match value {
        0 | 1 => Ok(()),
        _ => Err(ValidationError::NotBinary { field }),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_record() -> PatientRecord {
        PatientRecord {
            gender: "Female".into(),
            age: 61.0,
            hypertension: 0,
            heart_disease: 1,
            ever_married: "Yes".into(),
            work_type: "Private".into(),
            residence_type: "Urban".into(),
            avg_glucose_level: Some(202.21),
            bmi: Some(27.3),
            smoking_status: "never smoked".into(),
        }
    }

    #[test]
    fn valid_record_passes() {
        assert_eq!(valid_record().validate(), Ok(()));
    }

    #[test]
    fn unknown_gender_is_rejected() {
        let mut record = valid_record();
        record.gender = "Unknown".into();
        assert_eq!(
            record.validate(),
            Err(ValidationError::UnknownCategory { field: "gender", allowed: GENDER_CATEGORIES })
        );
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let mut record = valid_record();
        record.age = 0.0;
        assert!(record.validate().is_ok());
        record.age = 120.0;
        assert!(record.validate().is_ok());
        record.age = 120.5;
        assert_eq!(record.validate(), Err(ValidationError::AgeOutOfRange));
        record.age = -1.0;
        assert_eq!(record.validate(), Err(ValidationError::AgeOutOfRange));
    }

    #[test]
    fn flags_must_be_binary() {
        let mut record = valid_record();
        record.hypertension = 2;
        assert_eq!(record.validate(), Err(ValidationError::NotBinary { field: "hypertension" }));
        record.hypertension = 0;
        record.heart_disease = -1;
        assert_eq!(record.validate(), Err(ValidationError::NotBinary { field: "heart_disease" }));
    }

    #[test]
    fn missing_optionals_are_valid() {
        let mut record = valid_record();
        record.avg_glucose_level = None;
        record.bmi = None;
        assert!(record.validate().is_ok());
    }

    #[test]
    fn residence_type_accepts_the_capitalized_alias() {
        let json = r#"{
            "gender": "Male", "age": 40, "hypertension": 0, "heart_disease": 0,
            "ever_married": "No", "work_type": "Private",
            "Residence_type": "Rural", "smoking_status": "smokes"
        }"#;
        let record: PatientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.residence_type, "Rural");
        assert_eq!(record.bmi, None);
    }

    #[test]
    fn feature_row_follows_bundle_order() {
        let record = valid_record();
        let numeric: Vec<String> = ["bmi", "age"].iter().map(|s| s.to_string()).collect();
        let categorical: Vec<String> =
            ["Residence_type", "gender"].iter().map(|s| s.to_string()).collect();
        let row = record.feature_row(&numeric, &categorical).unwrap();
        assert_eq!(row.numeric, vec![Some(27.3), Some(61.0)]);
        assert_eq!(row.categorical, vec![Some("Urban".into()), Some("Female".into())]);
    }

    #[test]
    fn feature_row_rejects_unknown_columns() {
        let record = valid_record();
        let numeric = vec!["cholesterol".to_string()];
        assert_eq!(
            record.feature_row(&numeric, &[]),
            Err(UnknownFeature("cholesterol".into()))
        );
    }
}
