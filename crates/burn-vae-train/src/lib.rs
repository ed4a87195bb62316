//! Training and Sampling for burn-vae
//!
//! Everything around the model: MNIST loading and batching, the loss, the
//! training loop, checkpoints and rendering prior samples.
//!
//! # Modules
//!
//! - [`data`] - MNIST download, seeded train/validation split, minibatch loader
//! - [`loss`] - summed squared reconstruction error plus divergence
//! - [`trainer`] - Adam training steps, epochs and evaluation
//! - [`checkpoint`] - save/load model records with their configuration
//! - [`samples`] - prior sampling and PNG grids
//! - [`backends`] - backend selection via feature flags
//!
//! # Example
//!
//! ```ignore
//! use burn_vae_train::{ImageLoader, MnistSplits, TrainingConfig};
//! use burn_vae_train::backends::{Autodiff, NdArray, NdArrayDevice};
//!
//! let config = TrainingConfig::mnist();
//! let device = NdArrayDevice::default();
//! let splits = MnistSplits::load(config.validation_fraction, config.seed)?;
//!
//! let mut train = ImageLoader::shuffled(splits.train, config.batch_size, config.seed)?;
//! let mut validation = ImageLoader::sequential(splits.validation, config.batch_size)?;
//!
//! let mut trainer = config.init_trainer::<Autodiff<NdArray<f32>>>(&device);
//! let history = trainer.fit(&mut train, Some(&mut validation))?;
//! ```

pub mod backends;
pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod loss;
pub mod samples;
pub mod trainer;

pub use checkpoint::{CheckpointError, load_checkpoint, save_checkpoint};
pub use config::TrainingConfig;
pub use data::{ImageLoader, MnistSplits, Split, random_split};
pub use error::{DataError, TrainError};
pub use loss::{LossValues, VaeLoss, reconstruction_error, vae_loss, vae_loss_with_noise};
pub use samples::{generate_samples, image_grid, tensor_to_grid};
pub use trainer::{EpochMetrics, EpochSummary, StepInfo, TrainEvent, Trainer, evaluate};
