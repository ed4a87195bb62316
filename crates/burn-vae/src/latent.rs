//! Diagonal Gaussian latent distribution
//!
//! Holds the per-example mean and log-variance produced by the encoder heads
//! and implements the reparameterized sample and the divergence penalty
//! against the standard normal prior.

use burn::prelude::*;
use burn::tensor::Distribution;

use crate::config::DivergenceForm;

/// Per-example latent distribution parameters
///
/// The encoder's second head is read on a log scale, so the "variance" used
/// for sampling is always strictly positive.
#[derive(Debug, Clone)]
pub struct LatentDistribution<B: Backend> {
    /// Mean, shape [batch, latent_dim]
    pub mean: Tensor<B, 2>,
    /// Raw log-variance head output, shape [batch, latent_dim]
    pub log_var: Tensor<B, 2>,
}

impl<B: Backend> LatentDistribution<B> {
    /// Creates a distribution from the two encoder heads
    pub fn new(mean: Tensor<B, 2>, log_var: Tensor<B, 2>) -> Self {
        Self { mean, log_var }
    }

    /// Standard normal prior with `batch` rows of width `latent_dim`
    pub fn standard(batch: usize, latent_dim: usize, device: &B::Device) -> Self {
        Self {
            mean: Tensor::zeros([batch, latent_dim], device),
            log_var: Tensor::zeros([batch, latent_dim], device),
        }
    }

    /// Returns [batch, latent_dim]
    pub fn dims(&self) -> [usize; 2] {
        self.mean.dims()
    }

    /// `exp(log_var)`, strictly positive
    pub fn variance(&self) -> Tensor<B, 2> {
        self.log_var.clone().exp()
    }

    /// Draws standard normal noise shaped like the mean
    pub fn noise(&self) -> Tensor<B, 2> {
        Tensor::random(
            self.mean.shape(),
            Distribution::Normal(0.0, 1.0),
            &self.mean.device(),
        )
    }

    /// Reparameterized sample `mean + variance * noise`
    ///
    /// Gradients flow through `mean` and `variance`; `noise` is treated as a
    /// constant input.
    pub fn sample_with_noise(&self, noise: Tensor<B, 2>) -> Tensor<B, 2> {
        self.mean.clone() + self.variance() * noise
    }

    /// Reparameterized sample with freshly drawn noise
    pub fn sample(&self) -> Tensor<B, 2> {
        self.sample_with_noise(self.noise())
    }

    /// Divergence from N(0, 1), summed over batch and latent dimensions
    ///
    /// Returns a single-element tensor. Not guarded against `variance -> 0`:
    /// once the log-variance head underflows, `ln(var)` is `-inf` and the
    /// result is non-finite.
    pub fn divergence(&self, form: DivergenceForm) -> Tensor<B, 1> {
        let var = self.variance();
        let mean_sq = self.mean.clone().powi_scalar(2);
        let var_sq = var.clone().powi_scalar(2);
        let log_var = var.log();

        let per_element = match form {
            DivergenceForm::Biased => var_sq + mean_sq - log_var - 0.5,
            DivergenceForm::Exact => (var_sq + mean_sq - 1.0) * 0.5 - log_var,
        };

        per_element.sum()
    }
}
