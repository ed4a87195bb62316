//! VAE objective: summed squared reconstruction error plus divergence
//!
//! Both terms are sums over the whole batch, never averaged, so the loss
//! scales with batch size.

use burn::prelude::*;
use burn_vae::{VaeOutput, VariationalAutoEncoder};

/// Sum of squared elementwise differences over the whole batch
///
/// Returns a single-element tensor.
pub fn reconstruction_error<B: Backend>(
    input: Tensor<B, 2>,
    reconstruction: Tensor<B, 2>,
) -> Tensor<B, 1> {
    (input - reconstruction).powi_scalar(2).sum()
}

/// Loss terms of one forward pass, still attached to the autodiff graph
#[derive(Debug, Clone)]
pub struct VaeLoss<B: Backend> {
    /// `reconstruction + divergence`
    pub total: Tensor<B, 1>,
    pub reconstruction: Tensor<B, 1>,
    pub divergence: Tensor<B, 1>,
}

impl<B: Backend> VaeLoss<B> {
    /// Combines the input batch with the model output of the same pass
    pub fn new(input: Tensor<B, 2>, output: VaeOutput<B>) -> Self {
        let reconstruction = reconstruction_error(input, output.reconstruction);
        let divergence = output.divergence;
        let total = reconstruction.clone() + divergence.clone();

        Self {
            total,
            reconstruction,
            divergence,
        }
    }

    /// Reads all three terms back to the host in one transfer
    pub fn values(&self) -> LossValues {
        let data = Tensor::cat(
            vec![
                self.total.clone(),
                self.reconstruction.clone(),
                self.divergence.clone(),
            ],
            0,
        )
        .into_data();
        let mut iter = data.iter::<f32>();
        let mut next = || iter.next().unwrap_or(f32::NAN);

        LossValues {
            total: next(),
            reconstruction: next(),
            divergence: next(),
        }
    }
}

/// Host-side copy of the loss terms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossValues {
    pub total: f32,
    pub reconstruction: f32,
    pub divergence: f32,
}

impl LossValues {
    /// True when no term is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.total.is_finite() && self.reconstruction.is_finite() && self.divergence.is_finite()
    }
}

/// Forward pass plus loss with noise drawn from the backend RNG
pub fn vae_loss<B: Backend>(model: &VariationalAutoEncoder<B>, batch: Tensor<B, 2>) -> VaeLoss<B> {
    let output = model.forward(batch.clone());
    VaeLoss::new(batch, output)
}

/// Forward pass plus loss with caller-supplied encoder noise
pub fn vae_loss_with_noise<B: Backend>(
    model: &VariationalAutoEncoder<B>,
    batch: Tensor<B, 2>,
    noise: Tensor<B, 2>,
) -> VaeLoss<B> {
    let output = model.forward_with_noise(batch.clone(), noise);
    VaeLoss::new(batch, output)
}
