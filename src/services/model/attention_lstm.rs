//! Attention-augmented LSTM evaluated natively with ndarray.
//!
//! The artifact is a JSON document holding the layer sizes and every weight
//! as a flat row-major array:
//!
//! ```json
//! {
//!   "input_size": 10,
//!   "units": 64,
//!   "bidirectional": true,
//!   "weights": {
//!     "forward/kernel": [...],            // [input_size, 4 * units]
//!     "forward/recurrent_kernel": [...],  // [units, 4 * units]
//!     "forward/bias": [...],              // [4 * units]
//!     "backward/kernel": [...],           // only when bidirectional
//!     "backward/recurrent_kernel": [...],
//!     "backward/bias": [...],
//!     "attention/kernel": [...],          // [hidden, 1]
//!     "attention/bias": [...],            // [1]
//!     "output/kernel": [...],             // [hidden, 1]
//!     "output/bias": [...]                // [1]
//!   }
//! }
//! ```
//!
//! Gates are packed in input, forget, cell, output order. `hidden` is
//! `units`, or `2 * units` when bidirectional.

use super::{SequenceModel, ATTENTION_LSTM_FORMAT};
use crate::error::SignalError;
use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Layer sizes of an attention LSTM artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttentionLstmSpec {
    pub input_size: usize,
    pub units: usize,
    #[serde(default)]
    pub bidirectional: bool,
}

impl AttentionLstmSpec {
    pub fn hidden_size(&self) -> usize {
        if self.bidirectional {
            self.units * 2
        } else {
            self.units
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    #[serde(flatten)]
    spec: AttentionLstmSpec,
    weights: HashMap<String, Vec<f64>>,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn param(
    weights: &HashMap<String, Vec<f64>>,
    name: &str,
    expected: usize,
) -> Result<Vec<f64>, String> {
    let data = weights
        .get(name)
        .ok_or_else(|| format!("missing weight {:?}", name))?;
    if data.len() != expected {
        return Err(format!(
            "weight {:?} has len {}, expected {}",
            name,
            data.len(),
            expected
        ));
    }
    Ok(data.clone())
}

fn matrix(
    weights: &HashMap<String, Vec<f64>>,
    name: &str,
    shape: (usize, usize),
) -> Result<Array2<f64>, String> {
    let data = param(weights, name, shape.0 * shape.1)?;
    Array2::from_shape_vec(shape, data).map_err(|e| e.to_string())
}

/// One LSTM direction.
#[derive(Debug, Clone)]
struct LstmLayer {
    units: usize,
    kernel: Array2<f64>,
    recurrent: Array2<f64>,
    bias: Array1<f64>,
}

impl LstmLayer {
    fn from_weights(
        weights: &HashMap<String, Vec<f64>>,
        prefix: &str,
        spec: &AttentionLstmSpec,
    ) -> Result<Self, String> {
        let gates = 4 * spec.units;
        Ok(Self {
            units: spec.units,
            kernel: matrix(weights, &format!("{}/kernel", prefix), (spec.input_size, gates))?,
            recurrent: matrix(
                weights,
                &format!("{}/recurrent_kernel", prefix),
                (spec.units, gates),
            )?,
            bias: Array1::from(param(weights, &format!("{}/bias", prefix), gates)?),
        })
    }

    /// Hidden state at every timestep, `[timesteps, units]`, aligned to input order.
    fn run(&self, sequence: ArrayView2<f64>, reverse: bool) -> Array2<f64> {
        let steps = sequence.nrows();
        let u = self.units;
        let mut h = Array1::<f64>::zeros(u);
        let mut c = Array1::<f64>::zeros(u);
        let mut out = Array2::zeros((steps, u));

        let order: Box<dyn Iterator<Item = usize>> = if reverse {
            Box::new((0..steps).rev())
        } else {
            Box::new(0..steps)
        };

        for t in order {
            let z = sequence.row(t).dot(&self.kernel) + h.dot(&self.recurrent) + &self.bias;
            let input_gate = z.slice(s![..u]).mapv(sigmoid);
            let forget_gate = z.slice(s![u..2 * u]).mapv(sigmoid);
            let candidate = z.slice(s![2 * u..3 * u]).mapv(f64::tanh);
            let output_gate = z.slice(s![3 * u..]).mapv(sigmoid);

            c = &forget_gate * &c + &input_gate * &candidate;
            h = &output_gate * &c.mapv(f64::tanh);
            out.row_mut(t).assign(&h);
        }

        out
    }
}

/// LSTM encoder followed by attention pooling and a linear read-out.
///
/// Each hidden state is scored with `sigmoid(tanh(h·w + b))`. The context is the
/// score-weighted sum of the hidden states over all timesteps, and the output
/// projection of that context is the window's single prediction.
#[derive(Debug, Clone)]
pub struct AttentionLstm {
    spec: AttentionLstmSpec,
    forward: LstmLayer,
    backward: Option<LstmLayer>,
    attention_kernel: Array1<f64>,
    attention_bias: f64,
    output_kernel: Array1<f64>,
    output_bias: f64,
}

impl AttentionLstm {
    pub fn from_weights(
        spec: AttentionLstmSpec,
        weights: &HashMap<String, Vec<f64>>,
    ) -> Result<Self, String> {
        if spec.input_size == 0 || spec.units == 0 {
            return Err("input_size and units must be positive".to_string());
        }
        let hidden = spec.hidden_size();
        let backward = if spec.bidirectional {
            Some(LstmLayer::from_weights(weights, "backward", &spec)?)
        } else {
            None
        };

        Ok(Self {
            forward: LstmLayer::from_weights(weights, "forward", &spec)?,
            backward,
            attention_kernel: Array1::from(param(weights, "attention/kernel", hidden)?),
            attention_bias: param(weights, "attention/bias", 1)?[0],
            output_kernel: Array1::from(param(weights, "output/kernel", hidden)?),
            output_bias: param(weights, "output/bias", 1)?[0],
            spec,
        })
    }

    pub fn spec(&self) -> &AttentionLstmSpec {
        &self.spec
    }

    fn encode(&self, sequence: ArrayView2<f64>) -> Result<Array2<f64>, SignalError> {
        let forward = self.forward.run(sequence, false);
        let Some(layer) = &self.backward else {
            return Ok(forward);
        };
        let backward = layer.run(sequence, true);
        ndarray::concatenate(Axis(1), &[forward.view(), backward.view()])
            .map_err(|e| SignalError::InferenceFailure(e.to_string()))
    }

    /// Prediction for a single window `[timesteps, features]`.
    fn forward_window(&self, sequence: ArrayView2<f64>) -> Result<f64, SignalError> {
        let hidden = self.encode(sequence)?;
        let scores = (hidden.dot(&self.attention_kernel) + self.attention_bias)
            .mapv(|score| sigmoid(score.tanh()));
        let context = scores.dot(&hidden);
        Ok(context.dot(&self.output_kernel) + self.output_bias)
    }
}

impl SequenceModel for AttentionLstm {
    fn input_size(&self) -> usize {
        self.spec.input_size
    }

    fn predict(&self, batch: &Array3<f64>) -> Result<Array3<f64>, SignalError> {
        let (windows, steps, features) = batch.dim();
        if features != self.spec.input_size {
            return Err(SignalError::InferenceFailure(format!(
                "model expects {} features per timestep, got {}",
                self.spec.input_size, features
            )));
        }

        if steps == 0 {
            return Err(SignalError::InferenceFailure(
                "windows must have at least one timestep".to_string(),
            ));
        }

        let mut out = Array3::zeros((windows, 1, 1));
        for (w, window) in batch.axis_iter(Axis(0)).enumerate() {
            out[[w, 0, 0]] = self.forward_window(window)?;
        }
        Ok(out)
    }
}

/// Loader for `{company}.lstm.json` artifacts.
pub struct AttentionLstmFormat;

impl super::ModelFormat for AttentionLstmFormat {
    fn name(&self) -> &str {
        ATTENTION_LSTM_FORMAT
    }

    fn extension(&self) -> &str {
        "lstm.json"
    }

    fn load(&self, path: &Path) -> Result<Arc<dyn SequenceModel>, SignalError> {
        let content = std::fs::read_to_string(path).map_err(|e| SignalError::malformed(path, e))?;
        let file: ModelFile =
            serde_json::from_str(&content).map_err(|e| SignalError::malformed(path, e))?;
        let model = AttentionLstm::from_weights(file.spec, &file.weights)
            .map_err(|e| SignalError::malformed(path, e))?;
        debug!(
            "Loaded attention LSTM from {} (input {}, units {}, bidirectional {})",
            path.display(),
            file.spec.input_size,
            file.spec.units,
            file.spec.bidirectional
        );
        Ok(Arc::new(model))
    }
}
