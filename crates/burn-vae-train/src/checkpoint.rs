//! Model checkpoints
//!
//! A checkpoint directory holds the training configuration as
//! `config.json` and the model record as `model.bin`. The configuration is
//! read first so the model can be rebuilt with matching dimensions before
//! its weights are loaded.
//!
//! Burn's serialization works through its `Record` trait and recorders.
//! Models that derive `Module` automatically get serialization support.
//!
//! # Example
//!
//! ```ignore
//! use burn_vae_train::checkpoint::{load_checkpoint, save_checkpoint};
//!
//! save_checkpoint("artifacts", trainer.model(), trainer.config())?;
//!
//! let (model, config) = load_checkpoint::<Backend>("artifacts", &device)?;
//! ```

use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{BinFileRecorder, FullPrecisionSettings, RecorderError};
use burn_vae::VariationalAutoEncoder;

use crate::config::TrainingConfig;

/// Configuration file name inside a checkpoint directory
pub const CONFIG_FILE: &str = "config.json";

/// Model record stem inside a checkpoint directory (the recorder adds `.bin`)
pub const MODEL_FILE: &str = "model";

/// Error type for checkpoint operations
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the Burn recorder
    #[error("Record error: {0}")]
    Record(#[from] RecorderError),

    /// Missing or malformed `config.json`
    #[error("Config error: {0}")]
    Config(String),
}

/// Create a recorder for full precision (f32) binary files
pub fn full_precision_recorder() -> BinFileRecorder<FullPrecisionSettings> {
    BinFileRecorder::new()
}

/// Path of the model record inside `dir`, without extension
pub fn model_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(MODEL_FILE)
}

/// Path of the configuration file inside `dir`
pub fn config_path(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(CONFIG_FILE)
}

/// Writes `config.json` and the model record into `dir`, creating it if needed
pub fn save_checkpoint<B: Backend>(
    dir: impl AsRef<Path>,
    model: &VariationalAutoEncoder<B>,
    config: &TrainingConfig,
) -> Result<(), CheckpointError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    config.save(config_path(dir))?;
    model
        .clone()
        .save_file(model_path(dir), &full_precision_recorder())?;

    tracing::info!(dir = %dir.display(), "checkpoint saved");
    Ok(())
}

/// Reads the configuration stored in `dir`
pub fn load_config(dir: impl AsRef<Path>) -> Result<TrainingConfig, CheckpointError> {
    TrainingConfig::load(config_path(dir)).map_err(|e| CheckpointError::Config(e.to_string()))
}

/// Rebuilds the model stored in `dir` on `device`
pub fn load_checkpoint<B: Backend>(
    dir: impl AsRef<Path>,
    device: &B::Device,
) -> Result<(VariationalAutoEncoder<B>, TrainingConfig), CheckpointError> {
    let dir = dir.as_ref();
    let config = load_config(dir)?;
    let model = config
        .model
        .init::<B>(device)
        .load_file(model_path(dir), &full_precision_recorder(), device)?;

    tracing::info!(dir = %dir.display(), "checkpoint loaded");
    Ok((model, config))
}
