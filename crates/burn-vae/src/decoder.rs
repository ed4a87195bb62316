//! VAE Decoder: latent -> image
//!
//! Maps latent vectors back to flattened pixel space. The output layer has
//! no activation, so reconstructions are unbounded reals.

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::config::VaeConfig;

/// VAE Decoder
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    hidden: Linear<B>,
    activation: Relu,
    output: Linear<B>,
}

impl<B: Backend> Decoder<B> {
    /// Creates a new decoder
    ///
    /// # Arguments
    ///
    /// * `config` - Model configuration (`latent_dim -> hidden_dim -> input_dim`)
    /// * `device` - Device to create tensors on
    pub fn new(config: &VaeConfig, device: &B::Device) -> Self {
        Self {
            hidden: LinearConfig::new(config.latent_dim, config.hidden_dim).init(device),
            activation: Relu::new(),
            output: LinearConfig::new(config.hidden_dim, config.input_dim).init(device),
        }
    }

    /// Latent width accepted by the decoder
    pub fn latent_dim(&self) -> usize {
        self.hidden.weight.dims()[0]
    }

    /// Width of the decoded output
    pub fn output_dim(&self) -> usize {
        self.output.weight.dims()[1]
    }

    /// Decode latents to flattened images
    ///
    /// Input: [batch, latent_dim]
    /// Output: [batch, output_dim]
    pub fn forward(&self, z: Tensor<B, 2>) -> Tensor<B, 2> {
        let h = self.activation.forward(self.hidden.forward(z));
        self.output.forward(h)
    }
}
