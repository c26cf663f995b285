use crate::domain::ml::model::{ActiveModel, ModelDescriptor};
use crate::domain::monitoring::baseline::BaselineDistribution;
use crate::domain::ports::ModelProvider;
use crate::infrastructure::ml::scaler::StandardScaler;
use crate::infrastructure::ml::smartcore_predictor::SmartCorePredictor;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DESCRIPTOR_FILE: &str = "descriptor.json";
pub const ESTIMATOR_FILE: &str = "estimator.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const BASELINE_FILE: &str = "baseline.json";

/// Reads a published model from a directory of JSON artifacts
pub struct FileModelProvider {
    dir: PathBuf,
}

impl FileModelProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, file: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(file);
        fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Baseline shipped next to the model, if any. A broken file is logged
    /// and ignored so drift detection degrades instead of the model load.
    pub fn load_baseline(&self) -> Option<BaselineDistribution> {
        let path = self.dir.join(BASELINE_FILE);
        if !path.exists() {
            return None;
        }
        match fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| serde_json::from_slice::<BaselineDistribution>(&raw).map_err(anyhow::Error::from))
        {
            Ok(mut baseline) => {
                let dropped = baseline.retain_usable();
                if !dropped.is_empty() {
                    warn!(
                        "Baseline {}: ignoring entries without spread: {}",
                        path.display(),
                        dropped.join(", ")
                    );
                }
                Some(baseline)
            }
            Err(e) => {
                warn!("Ignoring unreadable baseline {}: {}", path.display(), e);
                None
            }
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Persist a baseline where `FileModelProvider` will pick it up
pub fn write_baseline(dir: &Path, baseline: &BaselineDistribution) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(BASELINE_FILE);
    let raw = serde_json::to_vec_pretty(baseline).context("Failed to serialize baseline")?;
    fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

impl ModelProvider for FileModelProvider {
    fn load(&self) -> Result<ActiveModel> {
        let mut descriptor: ModelDescriptor = serde_json::from_slice(&self.read(DESCRIPTOR_FILE)?)
            .context("Failed to parse model descriptor")?;

        let estimator_raw = self.read(ESTIMATOR_FILE)?;
        let checksum = sha256_hex(&estimator_raw);
        if let Some(expected) = &descriptor.artifact_sha256
            && !expected.eq_ignore_ascii_case(&checksum)
        {
            anyhow::bail!(
                "Estimator checksum mismatch: descriptor says {}, file is {}",
                expected,
                checksum
            );
        }
        descriptor.artifact_sha256 = Some(checksum);

        let regressor = SmartCorePredictor::from_json(descriptor.estimator, &estimator_raw)?;
        let scaler: StandardScaler = serde_json::from_slice(&self.read(SCALER_FILE)?)
            .context("Failed to parse scaler")?;
        let scaler = scaler.checked()?;

        let mut model = ActiveModel::new(descriptor, Box::new(scaler), Box::new(regressor));
        if let Some(baseline) = self.load_baseline() {
            model = model.with_baseline(baseline);
        }

        info!(
            "Loaded model {} v{} ({}) from {}",
            model.descriptor.model_id,
            model.descriptor.version,
            model.descriptor.estimator,
            self.dir.display()
        );
        Ok(model)
    }

    fn source(&self) -> String {
        self.dir.display().to_string()
    }
}
