//! Full variational autoencoder
//!
//! Plain composition of [`Encoder`] and [`Decoder`]. Both halves are public
//! so the decoder can be driven directly from prior noise at generation time.

use burn::prelude::*;
use burn::tensor::Distribution;

use crate::decoder::Decoder;
use crate::encoder::{Encoder, EncoderOutput};

/// Output of a full encode/decode pass
#[derive(Debug, Clone)]
pub struct VaeOutput<B: Backend> {
    /// Decoded images, shape [batch, input_dim]
    pub reconstruction: Tensor<B, 2>,
    /// Latent sample fed to the decoder, shape [batch, latent_dim]
    pub latent: Tensor<B, 2>,
    /// Divergence of this pass (single element)
    pub divergence: Tensor<B, 1>,
}

/// Variational autoencoder
#[derive(Module, Debug)]
pub struct VariationalAutoEncoder<B: Backend> {
    pub encoder: Encoder<B>,
    pub decoder: Decoder<B>,
}

impl<B: Backend> VariationalAutoEncoder<B> {
    /// Encode, sample, and decode
    ///
    /// Input: [batch, input_dim]
    pub fn forward(&self, x: Tensor<B, 2>) -> VaeOutput<B> {
        self.decode_output(self.encoder.forward(x))
    }

    /// Encode and decode using caller-supplied noise of shape [batch, latent_dim]
    pub fn forward_with_noise(&self, x: Tensor<B, 2>, noise: Tensor<B, 2>) -> VaeOutput<B> {
        self.decode_output(self.encoder.forward_with_noise(x, noise))
    }

    fn decode_output(&self, encoded: EncoderOutput<B>) -> VaeOutput<B> {
        let reconstruction = self.decoder.forward(encoded.latent.clone());

        VaeOutput {
            reconstruction,
            latent: encoded.latent,
            divergence: encoded.divergence,
        }
    }

    /// Decode latent vectors (generation path, encoder unused)
    pub fn generate(&self, latents: Tensor<B, 2>) -> Tensor<B, 2> {
        self.decoder.forward(latents)
    }

    /// Draw `count` latents from N(0, 1) and decode them
    ///
    /// Output: [count, input_dim]
    pub fn sample_prior(&self, count: usize, device: &B::Device) -> Tensor<B, 2> {
        let noise = Tensor::random(
            [count, self.decoder.latent_dim()],
            Distribution::Normal(0.0, 1.0),
            device,
        );
        self.generate(noise)
    }
}
