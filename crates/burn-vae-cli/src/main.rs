//! burn-vae CLI
//!
//! Trains the MNIST variational autoencoder and samples digits from a
//! saved checkpoint.
//!
//! Supports:
//! - Training with a validation split, test evaluation and checkpointing
//! - Sampling a PNG grid of digits from the prior

use anyhow::{Context, Result, bail};
use burn::module::AutodiffModule;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn_vae::{DivergenceForm, VaeConfig};
use burn_vae_train::{
    ImageLoader, MnistSplits, TrainEvent, TrainingConfig, evaluate, generate_samples,
    load_checkpoint, save_checkpoint, tensor_to_grid,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[cfg(any(feature = "ndarray", feature = "wgpu", feature = "cuda"))]
use burn_vae_train::backends::Autodiff;

/// Compute device for training and sampling
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum Device {
    /// Auto-detect best available (CUDA > WGPU > CPU)
    #[default]
    Auto,
    /// NVIDIA CUDA GPU
    #[cfg(feature = "cuda")]
    Cuda,
    /// WebGPU (Vulkan/Metal/DX12)
    #[cfg(feature = "wgpu")]
    Wgpu,
    /// CPU (ndarray backend)
    #[cfg(feature = "ndarray")]
    Cpu,
}

#[derive(Parser)]
#[command(name = "burn-vae")]
#[command(about = "Variational autoencoder for MNIST in pure Rust")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on MNIST, evaluate on the test set and save a checkpoint
    Train(TrainArgs),

    /// Decode random prior samples from a checkpoint into an image grid
    Sample {
        /// Checkpoint directory written by `train`
        #[arg(short, long, default_value = "artifacts")]
        checkpoint: PathBuf,

        /// Output image path
        #[arg(short, long, default_value = "samples.png")]
        output: PathBuf,

        /// Number of digits to draw
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,

        /// Digits per grid row
        #[arg(long, default_value = "10")]
        columns: usize,

        /// Random seed (optional)
        #[arg(long)]
        seed: Option<u64>,

        /// Compute device
        #[arg(long, value_enum, default_value = "auto")]
        device: Device,
    },

    /// Show available backends and model defaults
    Info,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Directory for `config.json` and the model record
    #[arg(short, long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Number of passes over the training split
    #[arg(long, default_value = "10")]
    epochs: usize,

    /// Images per optimizer step
    #[arg(long, default_value = "256")]
    batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value = "1e-3")]
    learning_rate: f64,

    /// Hidden layer width of encoder and decoder
    #[arg(long, default_value = "128")]
    hidden_dim: usize,

    /// Latent dimension
    #[arg(long, default_value = "10")]
    latent_dim: usize,

    /// Share of the training set held out for validation
    #[arg(long, default_value = "0.2")]
    validation_fraction: f64,

    /// Seed for weights, noise, split and shuffling
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Use the divergence that is zero at the prior
    #[arg(long)]
    exact_divergence: bool,

    /// Abort on a NaN/Inf loss instead of continuing
    #[arg(long)]
    halt_on_non_finite: bool,

    /// Also write a grid of prior samples after training
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Compute device
    #[arg(long, value_enum, default_value = "auto")]
    device: Device,
}

impl TrainArgs {
    fn config(&self) -> TrainingConfig {
        let divergence = if self.exact_divergence {
            DivergenceForm::Exact
        } else {
            DivergenceForm::Biased
        };
        let model = VaeConfig::mnist()
            .with_hidden_dim(self.hidden_dim)
            .with_latent_dim(self.latent_dim)
            .with_divergence(divergence);

        TrainingConfig::mnist()
            .with_model(model)
            .with_num_epochs(self.epochs)
            .with_batch_size(self.batch_size)
            .with_learning_rate(self.learning_rate)
            .with_validation_fraction(self.validation_fraction)
            .with_seed(self.seed)
            .with_halt_on_non_finite(self.halt_on_non_finite)
    }
}

/// Try to initialize CUDA and return true if successful
#[cfg(feature = "cuda")]
fn cuda_available() -> bool {
    use std::panic;
    // CudaDevice::default() will panic if CUDA is not available
    panic::catch_unwind(|| {
        let _ = burn_vae_train::backends::CudaDevice::default();
    })
    .is_ok()
}

/// Try to initialize WGPU and return true if successful
#[cfg(feature = "wgpu")]
fn wgpu_available() -> bool {
    use std::panic;
    panic::catch_unwind(|| {
        let _ = burn_vae_train::backends::WgpuDevice::default();
    })
    .is_ok()
}

/// Resolve Auto device to a concrete device
fn resolve_device(requested: Device) -> Result<Device> {
    match requested {
        Device::Auto => {
            #[cfg(feature = "cuda")]
            if cuda_available() {
                eprintln!("[device] Auto-detected CUDA");
                return Ok(Device::Cuda);
            }
            #[cfg(feature = "wgpu")]
            if wgpu_available() {
                eprintln!("[device] Auto-detected WGPU");
                return Ok(Device::Wgpu);
            }
            #[cfg(feature = "ndarray")]
            {
                eprintln!("[device] Falling back to CPU");
                return Ok(Device::Cpu);
            }
            #[allow(unreachable_code)]
            {
                bail!("No backend available. Enable 'cuda', 'wgpu', or 'ndarray' feature.")
            }
        }
        #[allow(unreachable_patterns)]
        other => Ok(other),
    }
}

/// Logs to stderr so the progress bar keeps stdout clean; `RUST_LOG` overrides
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn run_train<B: AutodiffBackend>(args: &TrainArgs, device: B::Device) -> Result<()> {
    let config = args.config();
    config.validate().context("Invalid training configuration")?;

    let splits = MnistSplits::load(config.validation_fraction, config.seed)
        .context("Failed to load MNIST")?;
    let mut train = ImageLoader::shuffled(splits.train, config.batch_size, config.seed)?;
    let mut validation = ImageLoader::sequential(splits.validation, config.batch_size)?;
    let mut test = ImageLoader::sequential(splits.test, config.batch_size)?;
    let validate = !validation.is_empty();

    println!(
        "Training {} -> {} -> {} for {} epochs ({} train / {} validation / {} test images)",
        config.model.input_dim,
        config.model.hidden_dim,
        config.model.latent_dim,
        config.num_epochs,
        train.len(),
        validation.len(),
        test.len(),
    );

    let mut trainer = config.init_trainer::<B>(&device);
    let pb = progress_bar((train.num_batches() * config.num_epochs) as u64)?;
    let num_epochs = config.num_epochs;

    trainer.fit_with_callback(
        &mut train,
        validate.then_some(&mut validation),
        |event| match event {
            TrainEvent::Step(info) => {
                pb.inc(1);
                pb.set_message(format!(
                    "epoch {}/{} batch {}/{} loss {:.1}",
                    info.epoch + 1,
                    num_epochs,
                    info.batch + 1,
                    info.total_batches,
                    info.loss.total,
                ));
            }
            TrainEvent::Epoch(summary) => {
                let line = match summary.validation {
                    Some(val) => format!(
                        "epoch {:>3}: train loss {:.3}  validation loss {:.3}",
                        summary.epoch + 1,
                        summary.train.mean_loss(),
                        val.mean_loss(),
                    ),
                    None => format!(
                        "epoch {:>3}: train loss {:.3}",
                        summary.epoch + 1,
                        summary.train.mean_loss(),
                    ),
                };
                pb.println(line);
            }
        },
    )?;
    pb.finish_and_clear();

    let model = trainer.model().valid();
    let metrics = evaluate(&model, &mut test, &device);
    println!(
        "test: loss {:.3} (reconstruction {:.3}, divergence {:.3}) per image",
        metrics.mean_loss(),
        metrics.mean_reconstruction(),
        metrics.mean_divergence(),
    );

    save_checkpoint(&args.artifacts, trainer.model(), trainer.config())
        .with_context(|| format!("Failed to save checkpoint to {}", args.artifacts.display()))?;
    println!("Saved checkpoint to: {}", args.artifacts.display());

    if let Some(output) = &args.samples {
        write_samples(&model, 100, 10, output, &device)?;
    }

    Ok(())
}

fn run_sample<B: Backend>(
    checkpoint: &Path,
    output: &Path,
    count: usize,
    columns: usize,
    seed: Option<u64>,
    device: B::Device,
) -> Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    if columns == 0 {
        bail!("--columns must be at least 1");
    }
    let (model, config) = load_checkpoint::<B>(checkpoint, &device)
        .with_context(|| format!("Failed to load checkpoint from {}", checkpoint.display()))?;
    tracing::info!(latent_dim = config.model.latent_dim, count, "sampling");

    if let Some(seed) = seed {
        B::seed(&device, seed);
    }
    write_samples(&model, count, columns, output, &device)
}

fn write_samples<B: Backend>(
    model: &burn_vae::VariationalAutoEncoder<B>,
    count: usize,
    columns: usize,
    output: &Path,
    device: &B::Device,
) -> Result<()> {
    let samples = generate_samples(model, count, device);
    let grid = tensor_to_grid(samples, columns);
    grid.save(output)
        .with_context(|| format!("Failed to save image to {}", output.display()))?;
    println!("Saved {} samples to: {}", count, output.display());
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => match resolve_device(args.device)? {
            #[cfg(feature = "ndarray")]
            Device::Cpu => {
                use burn_vae_train::backends::{NdArray, NdArrayDevice};
                run_train::<Autodiff<NdArray<f32>>>(&args, NdArrayDevice::default())
            }
            #[cfg(feature = "wgpu")]
            Device::Wgpu => {
                use burn_vae_train::backends::{Wgpu, WgpuDevice};
                run_train::<Autodiff<Wgpu>>(&args, WgpuDevice::default())
            }
            #[cfg(feature = "cuda")]
            Device::Cuda => {
                use burn_vae_train::backends::{Cuda, CudaDevice};
                run_train::<Autodiff<Cuda>>(&args, CudaDevice::default())
            }
            Device::Auto => bail!("device was not resolved"),
        },

        Commands::Sample {
            checkpoint,
            output,
            count,
            columns,
            seed,
            device,
        } => match resolve_device(device)? {
            #[cfg(feature = "ndarray")]
            Device::Cpu => {
                use burn_vae_train::backends::{NdArray, NdArrayDevice};
                run_sample::<NdArray<f32>>(
                    &checkpoint,
                    &output,
                    count,
                    columns,
                    seed,
                    NdArrayDevice::default(),
                )
            }
            #[cfg(feature = "wgpu")]
            Device::Wgpu => {
                use burn_vae_train::backends::{Wgpu, WgpuDevice};
                run_sample::<Wgpu>(&checkpoint, &output, count, columns, seed, WgpuDevice::default())
            }
            #[cfg(feature = "cuda")]
            Device::Cuda => {
                use burn_vae_train::backends::{Cuda, CudaDevice};
                run_sample::<Cuda>(&checkpoint, &output, count, columns, seed, CudaDevice::default())
            }
            Device::Auto => bail!("device was not resolved"),
        },

        Commands::Info => {
            println!("burn-vae: Variational autoencoder for MNIST in pure Rust\n");
            println!("Available backends:");

            #[cfg(feature = "ndarray")]
            println!("  - ndarray (CPU, enabled)");
            #[cfg(not(feature = "ndarray"))]
            println!("  - ndarray (CPU, not enabled)");

            #[cfg(feature = "wgpu")]
            println!("  - wgpu (WebGPU, enabled)");
            #[cfg(not(feature = "wgpu"))]
            println!("  - wgpu (WebGPU, not enabled)");

            #[cfg(feature = "cuda")]
            println!("  - cuda (NVIDIA CUDA, enabled)");
            #[cfg(not(feature = "cuda"))]
            println!("  - cuda (NVIDIA CUDA, not enabled)");

            let config = TrainingConfig::mnist();
            println!("\nDefault model:");
            println!(
                "  - {} -> {} (tanh) -> {} latent -> {} (relu) -> {}",
                config.model.input_dim,
                config.model.hidden_dim,
                config.model.latent_dim,
                config.model.hidden_dim,
                config.model.input_dim,
            );
            println!(
                "  - Adam lr {}, batch {}, {} epochs, {:.0}% validation",
                config.learning_rate,
                config.batch_size,
                config.num_epochs,
                config.validation_fraction * 100.0,
            );
            Ok(())
        }
    }
}
