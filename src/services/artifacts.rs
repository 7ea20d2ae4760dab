//! Per-company model artifacts, loaded lazily and kept for the process lifetime.

use crate::config::Config;
use crate::error::{ArtifactKind, SignalError};
use crate::services::model::{ModelFormat, ModelRegistry, SequenceModel};
use crate::services::signals::{PersistedScaler, ScalingStrategy};
use crate::types::ResidualStats;
use dashmap::DashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Residual table shared by all companies.
pub const STATS_FILE: &str = "predicted.csv";

/// Everything needed to run inference for one company.
pub struct TickerArtifacts {
    pub company: String,
    /// Indices into the 12 engineered feature columns, in model input order.
    pub features: Vec<usize>,
    pub model: Arc<dyn SequenceModel>,
    pub stats: ResidualStats,
    /// Training-time scaling bounds, only loaded for [`ScalingStrategy::Persisted`].
    pub scaler: Option<PersistedScaler>,
}

impl std::fmt::Debug for TickerArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerArtifacts")
            .field("company", &self.company)
            .field("features", &self.features)
            .field("stats", &self.stats)
            .field("scaler", &self.scaler.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct StatsRow {
    #[serde(rename = "Company")]
    company: String,
    #[serde(rename = "Std_Dev")]
    std_dev: f64,
    #[serde(rename = "Mean_Residuals")]
    mean_residuals: f64,
}

type ArtifactCell = Arc<OnceCell<Arc<TickerArtifacts>>>;

/// Reads one company's artifact files from the models directory.
#[derive(Clone)]
struct ArtifactLoader {
    models_dir: PathBuf,
    format: Arc<dyn ModelFormat>,
    scaling: ScalingStrategy,
}

/// Read-through cache of [`TickerArtifacts`] keyed by company id.
///
/// Concurrent callers for the same company share a single load. A failed load
/// leaves the entry empty so the next call tries again. Files are read on the
/// blocking thread pool.
pub struct ArtifactStore {
    loader: ArtifactLoader,
    cache: DashMap<String, ArtifactCell>,
}

impl ArtifactStore {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        format: Arc<dyn ModelFormat>,
        scaling: ScalingStrategy,
    ) -> Self {
        Self {
            loader: ArtifactLoader {
                models_dir: models_dir.into(),
                format,
                scaling,
            },
            cache: DashMap::new(),
        }
    }

    /// Build the store from configuration, resolving the model format by name.
    pub fn from_config(config: &Config, registry: &ModelRegistry) -> anyhow::Result<Self> {
        let format = registry.get(&config.model_format).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown model format {:?} (available: {})",
                config.model_format,
                registry.names().join(", ")
            )
        })?;
        info!(
            "Artifact store at {} using {} models, {} scaling",
            config.models_dir.display(),
            format.name(),
            config.signals.scaling
        );
        Ok(Self::new(
            config.models_dir.clone(),
            format,
            config.signals.scaling,
        ))
    }

    pub fn models_dir(&self) -> &Path {
        &self.loader.models_dir
    }

    pub fn scaling(&self) -> ScalingStrategy {
        self.loader.scaling
    }

    /// Artifacts of `company`, loading them on first use.
    pub async fn get(&self, company: &str) -> Result<Arc<TickerArtifacts>, SignalError> {
        let cell = self
            .cache
            .entry(company.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_try_init(|| async {
            let loader = self.loader.clone();
            let owned = company.to_string();
            let artifacts = tokio::task::spawn_blocking(move || loader.load(&owned)).await??;
            info!(
                "Loaded artifacts for {} ({} features, std_dev {:.4})",
                company,
                artifacts.features.len(),
                artifacts.stats.std_dev
            );
            Ok::<_, SignalError>(Arc::new(artifacts))
        })
        .await
        .cloned()
    }

    /// Number of companies with loaded artifacts.
    pub fn loaded(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

}

impl ArtifactLoader {
    fn load(&self, company: &str) -> Result<TickerArtifacts, SignalError> {
        let features = self.load_features(company)?;

        let model_path = self
            .models_dir
            .join(format!("{}.{}", company, self.format.extension()));
        require(&model_path, ArtifactKind::Model, company)?;
        let model = self.format.load(&model_path)?;
        if model.input_size() != features.len() {
            return Err(SignalError::malformed(
                &model_path,
                format!(
                    "model expects {} features, {} selected",
                    model.input_size(),
                    features.len()
                ),
            ));
        }

        let stats = self.load_stats(company)?;
        let scaler = match self.scaling {
            ScalingStrategy::Persisted => Some(self.load_scaler(company)?),
            ScalingStrategy::PerRequest => None,
        };

        Ok(TickerArtifacts {
            company: company.to_string(),
            features,
            model,
            stats,
            scaler,
        })
    }

    fn load_features(&self, company: &str) -> Result<Vec<usize>, SignalError> {
        let path = self.models_dir.join(format!("{}_features.json", company));
        require(&path, ArtifactKind::Features, company)?;
        let content = std::fs::read_to_string(&path).map_err(|e| SignalError::malformed(&path, e))?;
        let features: Vec<usize> =
            serde_json::from_str(&content).map_err(|e| SignalError::malformed(&path, e))?;
        if features.is_empty() {
            return Err(SignalError::malformed(&path, "no features selected"));
        }
        debug!("Selected features for {}: {:?}", company, features);
        Ok(features)
    }

    fn load_stats(&self, company: &str) -> Result<ResidualStats, SignalError> {
        let path = self.models_dir.join(STATS_FILE);
        require(&path, ArtifactKind::Stats, company)?;

        let mut reader = csv::Reader::from_path(&path).map_err(|e| SignalError::malformed(&path, e))?;
        for row in reader.deserialize::<StatsRow>() {
            let row = row.map_err(|e| SignalError::malformed(&path, e))?;
            if row.company.trim() == company {
                return Ok(ResidualStats {
                    std_dev: row.std_dev,
                    mean_residuals: row.mean_residuals,
                });
            }
        }

        Err(SignalError::ArtifactNotFound {
            kind: ArtifactKind::Stats,
            company: company.to_string(),
            path,
        })
    }

    fn load_scaler(&self, company: &str) -> Result<PersistedScaler, SignalError> {
        let path = self.models_dir.join(format!("{}_scaler.json", company));
        require(&path, ArtifactKind::Scaler, company)?;
        let content = std::fs::read_to_string(&path).map_err(|e| SignalError::malformed(&path, e))?;
        let scaler: PersistedScaler =
            serde_json::from_str(&content).map_err(|e| SignalError::malformed(&path, e))?;
        if scaler.feature_min.len() != scaler.feature_max.len() {
            return Err(SignalError::malformed(
                &path,
                "feature_min and feature_max differ in length",
            ));
        }
        Ok(scaler)
    }
}

fn require(path: &Path, kind: ArtifactKind, company: &str) -> Result<(), SignalError> {
    if path.exists() {
        Ok(())
    } else {
        Err(SignalError::ArtifactNotFound {
            kind,
            company: company.to_string(),
            path: path.to_path_buf(),
        })
    }
}
