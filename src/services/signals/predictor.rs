//! Adapting raw model output into bias-corrected closing prices.

use super::scaler::MinMaxScaler;
use crate::error::SignalError;
use crate::services::model::SequenceModel;
use crate::types::ResidualStats;
use ndarray::{s, Array3};

/// One prediction per input window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePrediction {
    /// Model output mapped back to price units.
    pub raw: f64,
    /// `raw` shifted by the residual standard deviation.
    pub adjusted: f64,
}

/// Runs a [`SequenceModel`] and turns its output into price predictions.
pub struct PredictionAdapter<'a> {
    model: &'a dyn SequenceModel,
    target_scaler: &'a MinMaxScaler,
    stats: ResidualStats,
}

impl<'a> PredictionAdapter<'a> {
    pub fn new(
        model: &'a dyn SequenceModel,
        target_scaler: &'a MinMaxScaler,
        stats: ResidualStats,
    ) -> Self {
        Self {
            model,
            target_scaler,
            stats,
        }
    }

    /// Predict one closing price per window of `batch` (`[windows, timesteps, features]`).
    ///
    /// Only the last timestep of each window's output sequence is used.
    pub fn predict(&self, batch: &Array3<f64>) -> Result<Vec<PricePrediction>, SignalError> {
        let (windows, steps, _) = batch.dim();
        let output = self.model.predict(batch)?;
        let (out_windows, out_steps, out_width) = output.dim();
        if out_windows != windows || out_steps == 0 || out_width != 1 {
            return Err(SignalError::InferenceFailure(format!(
                "unexpected model output shape {:?} for input of {} windows x {} timesteps",
                output.dim(),
                windows,
                steps
            )));
        }

        Ok(output
            .slice(s![.., out_steps - 1, 0])
            .iter()
            .map(|&scaled| {
                let raw = self.target_scaler.inverse(0, scaled);
                PricePrediction {
                    raw,
                    adjusted: self.stats.correct(raw),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    /// Returns a fixed value at every timestep.
    struct FixedModel(f64);

    impl SequenceModel for FixedModel {
        fn input_size(&self) -> usize {
            2
        }

        fn predict(&self, batch: &Array3<f64>) -> Result<Array3<f64>, SignalError> {
            let (w, t, _) = batch.dim();
            Ok(Array3::from_elem((w, t, 1), self.0))
        }
    }

    /// Echoes the first feature of each timestep.
    struct EchoModel;

    impl SequenceModel for EchoModel {
        fn input_size(&self) -> usize {
            1
        }

        fn predict(&self, batch: &Array3<f64>) -> Result<Array3<f64>, SignalError> {
            Ok(batch.slice(s![.., .., 0..1]).to_owned())
        }
    }

    /// Drops the timestep axis.
    struct FlatModel;

    impl SequenceModel for FlatModel {
        fn input_size(&self) -> usize {
            1
        }

        fn predict(&self, batch: &Array3<f64>) -> Result<Array3<f64>, SignalError> {
            Ok(Array3::zeros((batch.dim().0 + 1, 1, 1)))
        }
    }

    #[test]
    fn test_inverse_scale_and_correction() {
        let scaler = MinMaxScaler::fit_series(array![100.0, 200.0].view());
        let up = ResidualStats {
            std_dev: 2.5,
            mean_residuals: 0.1,
        };
        let down = ResidualStats {
            std_dev: 2.5,
            mean_residuals: -0.1,
        };
        let batch = Array3::zeros((3, 10, 2));

        let model = FixedModel(0.4);
        let predictions = PredictionAdapter::new(&model, &scaler, up)
            .predict(&batch)
            .unwrap();
        assert_eq!(predictions.len(), 3);
        assert!((predictions[0].raw - 140.0).abs() < 1e-9);
        assert!((predictions[0].adjusted - 142.5).abs() < 1e-9);

        let predictions = PredictionAdapter::new(&model, &scaler, down)
            .predict(&batch)
            .unwrap();
        assert!((predictions[2].adjusted - 137.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_mean_residual_subtracts() {
        let scaler = MinMaxScaler::fit_series(array![0.0, 1.0].view());
        let stats = ResidualStats {
            std_dev: 0.5,
            mean_residuals: 0.0,
        };
        let model = FixedModel(1.0);
        let predictions = PredictionAdapter::new(&model, &scaler, stats)
            .predict(&Array3::zeros((1, 10, 2)))
            .unwrap();
        assert_eq!(predictions[0].adjusted, 0.5);
    }

    #[test]
    fn test_uses_last_timestep() {
        let scaler = MinMaxScaler::fit_series(array![0.0, 10.0].view());
        let stats = ResidualStats {
            std_dev: 0.0,
            mean_residuals: 0.0,
        };
        let batch = Array3::from_shape_fn((2, 4, 1), |(w, t, _)| (w * 10 + t) as f64 / 100.0);
        let predictions = PredictionAdapter::new(&EchoModel, &scaler, stats)
            .predict(&batch)
            .unwrap();
        assert!((predictions[0].raw - 0.3).abs() < 1e-9);
        assert!((predictions[1].raw - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_output_shape_mismatch() {
        let scaler = MinMaxScaler::fit_series(array![0.0, 1.0].view());
        let stats = ResidualStats {
            std_dev: 0.0,
            mean_residuals: 0.0,
        };
        assert!(matches!(
            PredictionAdapter::new(&FlatModel, &scaler, stats).predict(&Array3::zeros((2, 10, 1))),
            Err(SignalError::InferenceFailure(_))
        ));
    }
}
