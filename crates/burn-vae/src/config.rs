//! Model configuration
//!
//! Dimensions are fixed at construction. The defaults match MNIST digits
//! flattened to 784 pixels.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::autoencoder::VariationalAutoEncoder;
use crate::decoder::Decoder;
use crate::encoder::Encoder;

/// Pixel count of a flattened 28x28 MNIST image
pub const MNIST_IMAGE_SIZE: usize = 28 * 28;

/// Side length of an MNIST image
pub const MNIST_SIDE: usize = 28;

/// Divergence penalty computed from the encoder's mean and variance
///
/// Both forms are minimized around the standard normal prior, but only
/// [`DivergenceForm::Exact`] reaches zero there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DivergenceForm {
    /// `sum(var^2 + mean^2 - ln(var) - 0.5)`
    ///
    /// Bounded below by `0.5 * ln 2` per element and equal to `0.5` per
    /// element at the prior.
    #[default]
    Biased,
    /// `sum(0.5 * (var^2 + mean^2 - 1) - ln(var))`
    ///
    /// The textbook KL divergence `KL(N(mean, var^2) || N(0, 1))`.
    Exact,
}

/// Variational autoencoder configuration
#[derive(Config, Debug)]
pub struct VaeConfig {
    /// Flattened image width (pixel count)
    #[config(default = 784)]
    pub input_dim: usize,
    /// Width of the single hidden layer in both encoder and decoder
    #[config(default = 128)]
    pub hidden_dim: usize,
    /// Latent dimensionality (one mean and one log-variance per dimension)
    #[config(default = 10)]
    pub latent_dim: usize,
    /// Divergence penalty used by the encoder
    #[config(default = "DivergenceForm::Biased")]
    pub divergence: DivergenceForm,
}

impl VaeConfig {
    /// MNIST configuration: 784 -> 128 -> 10
    pub fn mnist() -> Self {
        Self::new()
    }

    /// Initializes a fresh model with randomly initialized parameters
    pub fn init<B: Backend>(&self, device: &B::Device) -> VariationalAutoEncoder<B> {
        VariationalAutoEncoder {
            encoder: Encoder::new(self, device),
            decoder: Decoder::new(self, device),
        }
    }
}
