//! Stroke-risk ensemble prediction service.
//!
//! Two loosely coupled halves share one persisted artifact: the `stroke-train`
//! CLI fits a preprocessing pipeline and three classifiers (KNN, random
//! forest, logistic regression) on the stroke dataset and writes them to a
//! single bundle file; the `stroke-server` binary loads that bundle once and
//! serves blended predictions over HTTP.

pub mod api;
pub mod bundle;
pub mod error;
pub mod ml;
pub mod record;
pub mod train;

pub use api::{app, AppState};
pub use bundle::{ModelBundle, Prediction};
pub use record::PatientRecord;
