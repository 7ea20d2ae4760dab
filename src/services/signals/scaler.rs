//! Min-max scaling of feature columns and the close-price target.

use crate::error::SignalError;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where min-max bounds come from.
///
/// `PerRequest` refits on the request's own series, which is how the deployed
/// models have always been served even though it does not match the bounds
/// seen at training time. `Persisted` uses the training-time bounds exported
/// next to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingStrategy {
    #[default]
    PerRequest,
    Persisted,
}

impl FromStr for ScalingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_request" | "request" => Ok(Self::PerRequest),
            "persisted" | "training" => Ok(Self::Persisted),
            other => Err(format!("unknown scaling strategy {}", other)),
        }
    }
}

impl fmt::Display for ScalingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerRequest => f.write_str("per_request"),
            Self::Persisted => f.write_str("persisted"),
        }
    }
}

/// Column-wise min-max scaler mapping each column onto `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    max: Array1<f64>,
}

impl MinMaxScaler {
    pub fn new(min: Array1<f64>, max: Array1<f64>) -> Self {
        Self { min, max }
    }

    /// Fit bounds on the columns of `data`.
    pub fn fit(data: &Array2<f64>) -> Self {
        let min = data.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max = data.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        Self { min, max }
    }

    /// Fit bounds on a single series (the close target).
    pub fn fit_series(values: ArrayView1<f64>) -> Self {
        let column = values.to_owned().insert_axis(Axis(1));
        Self::fit(&column)
    }

    pub fn columns(&self) -> usize {
        self.min.len()
    }

    fn range(&self, col: usize) -> f64 {
        let range = self.max[col] - self.min[col];
        // Constant columns map to 0 rather than dividing by zero
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, SignalError> {
        if data.ncols() != self.columns() {
            return Err(SignalError::FeatureMismatch {
                index: data.ncols().saturating_sub(1),
                columns: self.columns(),
            });
        }
        let mut out = data.clone();
        for (col, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.min[col], self.range(col));
            column.mapv_inplace(|v| (v - min) / range);
        }
        Ok(out)
    }

    /// Map a scaled value of column `col` back to its original units.
    pub fn inverse(&self, col: usize, scaled: f64) -> f64 {
        scaled * self.range(col) + self.min[col]
    }
}

/// Training-time scaling bounds exported alongside a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedScaler {
    pub feature_min: Vec<f64>,
    pub feature_max: Vec<f64>,
    pub target_min: f64,
    pub target_max: f64,
}

impl PersistedScaler {
    pub fn feature_scaler(&self) -> MinMaxScaler {
        MinMaxScaler::new(
            Array1::from(self.feature_min.clone()),
            Array1::from(self.feature_max.clone()),
        )
    }

    pub fn target_scaler(&self) -> MinMaxScaler {
        MinMaxScaler::new(
            Array1::from(vec![self.target_min]),
            Array1::from(vec![self.target_max]),
        )
    }
}
