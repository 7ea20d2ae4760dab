//! Sequence model loading and inference.
//!
//! Models are never trained here. A [`ModelFormat`] knows how to turn a
//! per-company artifact file into a [`SequenceModel`]; formats are looked up
//! by name in a [`ModelRegistry`] so the serving code does not depend on one
//! inference runtime.

pub mod attention_lstm;

pub use attention_lstm::{AttentionLstm, AttentionLstmFormat, AttentionLstmSpec};

use crate::error::SignalError;
use ndarray::Array3;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Name of the built-in attention LSTM format.
pub const ATTENTION_LSTM_FORMAT: &str = "attention_lstm";

/// A loaded, immutable sequence model.
pub trait SequenceModel: Send + Sync {
    /// Features expected at every timestep.
    fn input_size(&self) -> usize;

    /// Run a batch `[windows, timesteps, features]` and return `[windows, steps, 1]`.
    ///
    /// `steps` is at least one; the last step holds the window's prediction.
    fn predict(&self, batch: &Array3<f64>) -> Result<Array3<f64>, SignalError>;
}

/// Loader for one serialized model format.
pub trait ModelFormat: Send + Sync {
    fn name(&self) -> &str;

    /// Suffix appended to the company id to locate the model file, e.g. `lstm.json`.
    fn extension(&self) -> &str;

    fn load(&self, path: &Path) -> Result<Arc<dyn SequenceModel>, SignalError>;
}

/// Registered model formats, keyed by name.
#[derive(Clone)]
pub struct ModelRegistry {
    formats: HashMap<String, Arc<dyn ModelFormat>>,
}

impl ModelRegistry {
    /// Registry without any format.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// Registry with the built-in formats.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(AttentionLstmFormat));
        registry
    }

    pub fn register(&mut self, format: Arc<dyn ModelFormat>) {
        self.formats.insert(format.name().to_string(), format);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ModelFormat>> {
        self.formats.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
