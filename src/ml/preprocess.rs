//! Column-wise preprocessing fitted at training time and replayed verbatim at
//! inference time: mean imputation plus standardization for numeric columns,
//! constant imputation plus one-hot encoding for categorical columns.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel filled in for missing categorical values before encoding.
pub const MISSING_CATEGORY: &str = "Unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("cannot fit preprocessor on an empty dataset")]
    EmptyFit,
    #[error("row has {got} numeric values, preprocessor was fitted on {expected}")]
    NumericArity { expected: usize, got: usize },
    #[error("row has {got} categorical values, preprocessor was fitted on {expected}")]
    CategoricalArity { expected: usize, got: usize },
}

/// One raw observation in training column order: numeric values first, then
/// categorical values. `None` marks a missing value in either block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub numeric: Vec<Option<f64>>,
    pub categorical: Vec<Option<String>>,
}

/// Fitted state for one numeric column. The imputation value and the scaler
/// center coincide: missing values are filled with the training mean, so they
/// standardize to exactly zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

impl NumericColumn {
    fn fit(name: &str, values: impl Iterator<Item = Option<f64>>) -> Self {
        let observed: Vec<f64> = values.flatten().collect();
        let mean = if observed.is_empty() {
            0.0
        } else {
            observed.iter().sum::<f64>() / observed.len() as f64
        };
        // Population variance over the imputed series; imputed entries sit at
        // the mean and contribute nothing.
        let std = if observed.is_empty() {
            0.0
        } else {
            let var = observed.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
                / observed.len() as f64;
            var.sqrt()
        };
        Self { name: name.to_string(), mean, std }
    }

    fn transform(&self, value: Option<f64>) -> f64 {
        let x = value.unwrap_or(self.mean);
        if self.std == 0.0 { 0.0 } else { (x - self.mean) / self.std }
    }
}

/// Fitted state for one categorical column: the categories observed during
/// training, sorted, one output column each. Values outside this list encode
/// as an all-zero block rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    fn fit<'a>(name: &str, values: impl Iterator<Item = Option<&'a str>>) -> Self {
        let mut categories: Vec<String> = values
            .map(|v| v.unwrap_or(MISSING_CATEGORY).to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Self { name: name.to_string(), categories }
    }

    fn transform(&self, value: Option<&str>, out: &mut Vec<f64>) {
        let value = value.unwrap_or(MISSING_CATEGORY);
        for category in &self.categories {
            out.push(if category == value { 1.0 } else { 0.0 });
        }
    }
}

/// The full fitted transform, applied column-wise: numeric block first, then
/// the concatenated one-hot blocks, matching the order the classifiers were
/// trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    pub fn fit(
        numeric_names: &[String],
        categorical_names: &[String],
        rows: &[RawRow],
    ) -> Result<Self, PreprocessError> {
        if rows.is_empty() {
            return Err(PreprocessError::EmptyFit);
        }
        for row in rows {
            if row.numeric.len() != numeric_names.len() {
                return Err(PreprocessError::NumericArity {
                    expected: numeric_names.len(),
                    got: row.numeric.len(),
                });
            }
            if row.categorical.len() != categorical_names.len() {
                return Err(PreprocessError::CategoricalArity {
                    expected: categorical_names.len(),
                    got: row.categorical.len(),
                });
            }
        }

        let numeric = numeric_names
            .iter()
            .enumerate()
            .map(|(i, name)| NumericColumn::fit(name, rows.iter().map(|r| r.numeric[i])))
            .collect();
        let categorical = categorical_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                CategoricalColumn::fit(name, rows.iter().map(|r| r.categorical[i].as_deref()))
            })
            .collect();

        Ok(Self { numeric, categorical })
    }

    /// Width of the transformed feature vector.
    pub fn output_width(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
    }

    pub fn transform_row(&self, row: &RawRow) -> Result<Vec<f64>, PreprocessError> {
        if row.numeric.len() != self.numeric.len() {
            return Err(PreprocessError::NumericArity {
                expected: self.numeric.len(),
                got: row.numeric.len(),
            });
        }
        if row.categorical.len() != self.categorical.len() {
            return Err(PreprocessError::CategoricalArity {
                expected: self.categorical.len(),
                got: row.categorical.len(),
            });
        }

        let mut out = Vec::with_capacity(self.output_width());
        for (column, value) in self.numeric.iter().zip(&row.numeric) {
            out.push(column.transform(*value));
        }
        for (column, value) in self.categorical.iter().zip(&row.categorical) {
            column.transform(value.as_deref(), &mut out);
        }
        Ok(out)
    }

    pub fn transform(&self, rows: &[RawRow]) -> Result<Vec<Vec<f64>>, PreprocessError> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}
