//! Training configuration

use burn::optim::AdamConfig;
use burn::prelude::*;
use burn_vae::VaeConfig;

use crate::error::TrainError;

/// Hyperparameters for one training run
///
/// Serialized as `config.json` next to checkpoints so a saved model can be
/// rebuilt with the same dimensions.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Model dimensions
    pub model: VaeConfig,
    /// Adam hyperparameters (betas, epsilon, weight decay)
    pub optimizer: AdamConfig,
    #[config(default = 10)]
    pub num_epochs: usize,
    #[config(default = 256)]
    pub batch_size: usize,
    #[config(default = 1e-3)]
    pub learning_rate: f64,
    /// Seeds weight init, encoder noise, the dataset split and shuffling
    #[config(default = 0)]
    pub seed: u64,
    /// Share of the training set held out for validation
    #[config(default = 0.2)]
    pub validation_fraction: f64,
    /// Stop with [`TrainError::NonFiniteLoss`] instead of stepping on a NaN/Inf loss
    #[config(default = false)]
    pub halt_on_non_finite: bool,
}

impl TrainingConfig {
    /// MNIST defaults: 784 -> 128 -> 10, Adam(lr = 1e-3), 10 epochs of 256
    pub fn mnist() -> Self {
        Self::new(VaeConfig::mnist(), AdamConfig::new().with_epsilon(1e-8))
    }

    /// Replaces the model dimensions, keeping every other setting
    pub fn with_model(mut self, model: VaeConfig) -> Self {
        self.model = model;
        self
    }

    /// Rejects settings the trainer cannot run with
    pub fn validate(&self) -> Result<(), TrainError> {
        if self.batch_size == 0 {
            return Err(TrainError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TrainError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(TrainError::InvalidConfig(format!(
                "validation_fraction must be in [0, 1), got {}",
                self.validation_fraction
            )));
        }
        let model = &self.model;
        if model.input_dim == 0 || model.hidden_dim == 0 || model.latent_dim == 0 {
            return Err(TrainError::InvalidConfig(format!(
                "model dimensions must be non-zero, got {}/{}/{}",
                model.input_dim, model.hidden_dim, model.latent_dim
            )));
        }
        Ok(())
    }
}
