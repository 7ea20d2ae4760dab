//! Feature engineering: normalization, model feature selection and sequence windows.

use super::scaler::{MinMaxScaler, PersistedScaler};
use crate::error::SignalError;
use crate::types::{IndicatorRow, FEATURE_COLUMNS};
use chrono::NaiveDate;
use ndarray::{s, Array1, Array2, Array3, Axis};
use tracing::debug;

/// Raw feature matrix of an indicator series with its close target and row dates.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub dates: Vec<NaiveDate>,
    /// `[rows, FEATURE_COLUMNS.len()]`
    pub features: Array2<f64>,
    pub closes: Array1<f64>,
}

impl FeatureMatrix {
    pub fn from_rows(rows: &[IndicatorRow]) -> Self {
        let mut features = Array2::zeros((rows.len(), FEATURE_COLUMNS.len()));
        for (mut target, row) in features.axis_iter_mut(Axis(0)).zip(rows) {
            target.assign(&Array1::from(row.features().to_vec()));
        }

        Self {
            dates: rows.iter().map(|r| r.date).collect(),
            features,
            closes: rows.iter().map(|r| r.close).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Normalized, feature-selected model input for one request.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub dates: Vec<NaiveDate>,
    pub closes: Array1<f64>,
    /// `[rows, selected features]`
    pub inputs: Array2<f64>,
    /// Scaler of the close target, used to invert model output.
    pub target_scaler: MinMaxScaler,
}

impl PreparedSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Keep only the columns at `indices`, in that order.
pub fn select_features(data: &Array2<f64>, indices: &[usize]) -> Result<Array2<f64>, SignalError> {
    let columns = data.ncols();
    if let Some(&index) = indices.iter().find(|&&i| i >= columns) {
        return Err(SignalError::FeatureMismatch { index, columns });
    }
    Ok(data.select(Axis(1), indices))
}

fn ensure_rows(available: usize, window: usize) -> Result<(), SignalError> {
    if window == 0 || available < window {
        return Err(SignalError::InsufficientHistory {
            required: window.max(1),
            available,
        });
    }
    Ok(())
}

/// One window per start offset `0..rows - window`, shaped `[windows, window, features]`.
pub fn sliding_windows(data: &Array2<f64>, window: usize) -> Result<Array3<f64>, SignalError> {
    ensure_rows(data.nrows(), window)?;
    let count = data.nrows() - window;
    Ok(Array3::from_shape_fn(
        (count, window, data.ncols()),
        |(w, t, f)| data[[w + t, f]],
    ))
}

/// The trailing `window` rows as a batch of one.
pub fn last_window(data: &Array2<f64>, window: usize) -> Result<Array3<f64>, SignalError> {
    ensure_rows(data.nrows(), window)?;
    let start = data.nrows() - window;
    Ok(data.slice(s![start.., ..]).to_owned().insert_axis(Axis(0)))
}

/// Normalize and select features for `rows`.
///
/// Bounds come from `persisted` when given, otherwise they are fitted on `rows` themselves.
pub fn prepare(
    rows: &[IndicatorRow],
    selected: &[usize],
    window: usize,
    persisted: Option<&PersistedScaler>,
) -> Result<PreparedSeries, SignalError> {
    ensure_rows(rows.len(), window)?;

    let matrix = FeatureMatrix::from_rows(rows);
    let (feature_scaler, target_scaler) = match persisted {
        Some(scaler) => (scaler.feature_scaler(), scaler.target_scaler()),
        None => (
            MinMaxScaler::fit(&matrix.features),
            MinMaxScaler::fit_series(matrix.closes.view()),
        ),
    };

    let normalized = feature_scaler.transform(&matrix.features)?;
    let inputs = select_features(&normalized, selected)?;
    debug!(
        "Prepared feature matrix {:?} -> selected {:?}",
        normalized.dim(),
        inputs.dim()
    );

    Ok(PreparedSeries {
        dates: matrix.dates,
        closes: matrix.closes,
        inputs,
        target_scaler,
    })
}
