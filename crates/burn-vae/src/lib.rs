//! Variational Autoencoder (VAE) for Flattened Images
//!
//! This crate provides a single hidden-layer VAE over flattened images
//! (MNIST digits by default).
//!
//! # Components
//!
//! - [`Encoder`] - tanh trunk with mean and log-variance heads; returns the
//!   reparameterized latent sample together with the divergence of that pass
//! - [`Decoder`] - ReLU MLP from latent space back to pixel space
//! - [`VariationalAutoEncoder`] - composition of the two
//! - [`LatentDistribution`] - diagonal Gaussian with sampling and divergence
//!
//! # Example
//!
//! ```ignore
//! use burn_vae::VaeConfig;
//!
//! let model = VaeConfig::mnist().init::<Backend>(&device);
//!
//! // Train-time forward: reconstruction plus divergence of the same pass
//! let out = model.forward(images);
//! let loss = (images - out.reconstruction).powi_scalar(2).sum() + out.divergence;
//!
//! // Generation: decode prior noise
//! let samples = model.sample_prior(100, &device);
//! ```

pub mod autoencoder;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod latent;

pub use autoencoder::{VaeOutput, VariationalAutoEncoder};
pub use config::{DivergenceForm, MNIST_IMAGE_SIZE, MNIST_SIDE, VaeConfig};
pub use decoder::Decoder;
pub use encoder::{Encoder, EncoderOutput};
pub use latent::LatentDistribution;
