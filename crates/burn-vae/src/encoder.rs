//! VAE Encoder: image -> latent sample
//!
//! A tanh trunk followed by two linear heads for the mean and log-variance
//! of a diagonal Gaussian.

use burn::module::Ignored;
use burn::nn::{Linear, LinearConfig, Tanh};
use burn::prelude::*;

use crate::config::{DivergenceForm, VaeConfig};
use crate::latent::LatentDistribution;

/// Result of one encoder pass
///
/// The divergence belongs to the same pass as `latent`, so callers never
/// combine a sample with a penalty from a different batch.
#[derive(Debug, Clone)]
pub struct EncoderOutput<B: Backend> {
    /// Reparameterized latent sample, shape [batch, latent_dim]
    pub latent: Tensor<B, 2>,
    /// Distribution the sample was drawn from
    pub distribution: LatentDistribution<B>,
    /// Divergence from N(0, 1), summed over the batch (single element)
    pub divergence: Tensor<B, 1>,
}

/// VAE Encoder
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    hidden: Linear<B>,
    activation: Tanh,
    mean: Linear<B>,
    log_var: Linear<B>,
    divergence: Ignored<DivergenceForm>,
}

impl<B: Backend> Encoder<B> {
    /// Creates a new encoder
    ///
    /// # Arguments
    ///
    /// * `config` - Model configuration
    /// * `device` - Device to create tensors on
    pub fn new(config: &VaeConfig, device: &B::Device) -> Self {
        Self {
            hidden: LinearConfig::new(config.input_dim, config.hidden_dim).init(device),
            activation: Tanh::new(),
            mean: LinearConfig::new(config.hidden_dim, config.latent_dim).init(device),
            log_var: LinearConfig::new(config.hidden_dim, config.latent_dim).init(device),
            divergence: Ignored(config.divergence),
        }
    }

    /// Input width expected by the trunk
    pub fn input_dim(&self) -> usize {
        self.hidden.weight.dims()[0]
    }

    /// Width of each latent head
    pub fn latent_dim(&self) -> usize {
        self.mean.weight.dims()[1]
    }

    /// Encode to latent distribution parameters without sampling
    ///
    /// Input: [batch, input_dim]
    pub fn distribution(&self, x: Tensor<B, 2>) -> LatentDistribution<B> {
        let h = self.activation.forward(self.hidden.forward(x));
        let mean = self.mean.forward(h.clone());
        let log_var = self.log_var.forward(h);

        LatentDistribution::new(mean, log_var)
    }

    /// Encode and sample with the given standard normal noise
    ///
    /// `noise` must be shaped [batch, latent_dim].
    pub fn forward_with_noise(&self, x: Tensor<B, 2>, noise: Tensor<B, 2>) -> EncoderOutput<B> {
        self.sample(self.distribution(x), noise)
    }

    /// Encode and sample with noise drawn from the backend RNG
    ///
    /// Input: [batch, input_dim]
    /// Output latent: [batch, latent_dim]
    pub fn forward(&self, x: Tensor<B, 2>) -> EncoderOutput<B> {
        let distribution = self.distribution(x);
        let noise = distribution.noise();
        self.sample(distribution, noise)
    }

    fn sample(&self, distribution: LatentDistribution<B>, noise: Tensor<B, 2>) -> EncoderOutput<B> {
        let latent = distribution.sample_with_noise(noise);
        let divergence = distribution.divergence(*self.divergence);

        EncoderOutput {
            latent,
            distribution,
            divergence,
        }
    }

    /// Encode without sampling (returns the mean)
    pub fn encode_deterministic(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.distribution(x).mean
    }
}
