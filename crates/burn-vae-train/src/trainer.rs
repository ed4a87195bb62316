//! Training loop
//!
//! One step is: forward pass, summed squared error plus the divergence of
//! the same pass, backward, one optimizer update. Burn builds a fresh
//! gradient set for every `backward()` call, so nothing accumulates across
//! steps.

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn_dataset::Dataset;
use burn_dataset::vision::MnistItem;
use burn_vae::VariationalAutoEncoder;

use crate::config::TrainingConfig;
use crate::data::ImageLoader;
use crate::error::TrainError;
use crate::loss::{LossValues, vae_loss};

/// Running sums over the batches of one pass through a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpochMetrics {
    /// Number of images seen
    pub examples: usize,
    /// Number of batches seen
    pub batches: usize,
    /// Sum of total losses
    pub total: f64,
    /// Sum of reconstruction errors
    pub reconstruction: f64,
    /// Sum of divergences
    pub divergence: f64,
}

impl EpochMetrics {
    /// Adds the loss of one batch of `batch_size` images
    pub fn record(&mut self, batch_size: usize, values: &LossValues) {
        self.examples += batch_size;
        self.batches += 1;
        self.total += values.total as f64;
        self.reconstruction += values.reconstruction as f64;
        self.divergence += values.divergence as f64;
    }

    fn per_example(&self, sum: f64) -> f64 {
        if self.examples == 0 {
            0.0
        } else {
            sum / self.examples as f64
        }
    }

    /// Mean total loss per image
    pub fn mean_loss(&self) -> f64 {
        self.per_example(self.total)
    }

    /// Mean reconstruction error per image
    pub fn mean_reconstruction(&self) -> f64 {
        self.per_example(self.reconstruction)
    }

    /// Mean divergence per image
    pub fn mean_divergence(&self) -> f64 {
        self.per_example(self.divergence)
    }
}

/// Metrics for one finished epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    /// Epoch number (0-indexed)
    pub epoch: usize,
    pub train: EpochMetrics,
    /// Present when a validation loader was supplied
    pub validation: Option<EpochMetrics>,
}

/// Information passed to the step callback
#[derive(Debug, Clone, Copy)]
pub struct StepInfo {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Current batch within the epoch (0-indexed)
    pub batch: usize,
    /// Batches per epoch
    pub total_batches: usize,
    /// Loss of this step, before the update
    pub loss: LossValues,
}

/// Events reported while fitting
#[derive(Debug, Clone, Copy)]
pub enum TrainEvent {
    /// A training step finished
    Step(StepInfo),
    /// An epoch (and its validation pass) finished
    Epoch(EpochSummary),
}

/// Owns the model and optimizer state of one training run
pub struct Trainer<B: AutodiffBackend, O> {
    model: VariationalAutoEncoder<B>,
    optimizer: O,
    config: TrainingConfig,
    device: B::Device,
}

impl<B, O> Trainer<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<VariationalAutoEncoder<B>, B>,
{
    /// Wraps an initialized model and optimizer
    pub fn new(
        model: VariationalAutoEncoder<B>,
        optimizer: O,
        config: TrainingConfig,
        device: B::Device,
    ) -> Self {
        Self {
            model,
            optimizer,
            config,
            device,
        }
    }

    /// Current parameters
    pub fn model(&self) -> &VariationalAutoEncoder<B> {
        &self.model
    }

    /// Consumes the trainer, returning the trained model
    pub fn into_model(self) -> VariationalAutoEncoder<B> {
        self.model
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Runs one training step on a [batch, input_dim] tensor
    ///
    /// `epoch` and `batch` only label errors and log events.
    pub fn step(
        &mut self,
        images: Tensor<B, 2>,
        epoch: usize,
        batch: usize,
    ) -> Result<LossValues, TrainError> {
        let loss = vae_loss(&self.model, images);
        let values = loss.values();

        if !values.is_finite() {
            if self.config.halt_on_non_finite {
                return Err(TrainError::NonFiniteLoss {
                    epoch,
                    batch,
                    value: values.total,
                });
            }
            tracing::warn!(epoch, batch, loss = values.total, "non-finite loss");
        }

        let grads = loss.total.backward();
        let grads = GradientsParams::from_grads(grads, &self.model);
        self.model = self
            .optimizer
            .step(self.config.learning_rate, self.model.clone(), grads);

        tracing::debug!(
            epoch,
            batch,
            loss = values.total,
            reconstruction = values.reconstruction,
            divergence = values.divergence,
            "step"
        );
        Ok(values)
    }

    /// Trains for one pass over `loader`
    pub fn train_epoch<D, F>(
        &mut self,
        epoch: usize,
        loader: &mut ImageLoader<D>,
        callback: &mut F,
    ) -> Result<EpochMetrics, TrainError>
    where
        D: Dataset<MnistItem>,
        F: FnMut(TrainEvent),
    {
        if loader.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        let device = self.device.clone();
        let total_batches = loader.num_batches();
        let mut metrics = EpochMetrics::default();

        for (batch, images) in loader.iter::<B>(&device).enumerate() {
            let batch_size = images.dims()[0];
            let loss = self.step(images, epoch, batch)?;
            metrics.record(batch_size, &loss);
            callback(TrainEvent::Step(StepInfo {
                epoch,
                batch,
                total_batches,
                loss,
            }));
        }

        Ok(metrics)
    }

    /// Trains for `num_epochs`, evaluating `validation` after each epoch
    pub fn fit<D, V>(
        &mut self,
        train: &mut ImageLoader<D>,
        validation: Option<&mut ImageLoader<V>>,
    ) -> Result<Vec<EpochSummary>, TrainError>
    where
        D: Dataset<MnistItem>,
        V: Dataset<MnistItem>,
    {
        self.fit_with_callback(train, validation, |_| {})
    }

    /// Like [`Trainer::fit`], reporting every step and epoch to `callback`
    pub fn fit_with_callback<D, V, F>(
        &mut self,
        train: &mut ImageLoader<D>,
        mut validation: Option<&mut ImageLoader<V>>,
        mut callback: F,
    ) -> Result<Vec<EpochSummary>, TrainError>
    where
        D: Dataset<MnistItem>,
        V: Dataset<MnistItem>,
        F: FnMut(TrainEvent),
    {
        self.config.validate()?;

        let mut history = Vec::with_capacity(self.config.num_epochs);
        for epoch in 0..self.config.num_epochs {
            let train_metrics = self.train_epoch(epoch, train, &mut callback)?;
            let validation_metrics = validation
                .as_deref_mut()
                .map(|loader| evaluate(&self.model.valid(), loader, &self.device));

            let summary = EpochSummary {
                epoch,
                train: train_metrics,
                validation: validation_metrics,
            };
            match validation_metrics {
                Some(val) => tracing::info!(
                    epoch = epoch + 1,
                    train_loss = train_metrics.mean_loss(),
                    val_loss = val.mean_loss(),
                    val_reconstruction = val.mean_reconstruction(),
                    val_divergence = val.mean_divergence(),
                    "epoch finished"
                ),
                None => tracing::info!(
                    epoch = epoch + 1,
                    train_loss = train_metrics.mean_loss(),
                    train_reconstruction = train_metrics.mean_reconstruction(),
                    train_divergence = train_metrics.mean_divergence(),
                    "epoch finished"
                ),
            }
            callback(TrainEvent::Epoch(summary));
            history.push(summary);
        }

        Ok(history)
    }
}

impl TrainingConfig {
    /// Seeds the backend, builds the model and an Adam optimizer
    pub fn init_trainer<B: AutodiffBackend>(
        &self,
        device: &B::Device,
    ) -> Trainer<B, impl Optimizer<VariationalAutoEncoder<B>, B> + use<B>> {
        B::seed(device, self.seed);
        let model = self.model.init::<B>(device);
        let optimizer = self.optimizer.init::<B, VariationalAutoEncoder<B>>();

        Trainer::new(model, optimizer, self.clone(), device.clone())
    }
}

/// Computes loss metrics over `loader` without updating parameters
///
/// Pass an inference-mode model (`model.valid()`) to skip gradient tracking.
pub fn evaluate<B, D>(
    model: &VariationalAutoEncoder<B>,
    loader: &mut ImageLoader<D>,
    device: &B::Device,
) -> EpochMetrics
where
    B: Backend,
    D: Dataset<MnistItem>,
{
    let mut metrics = EpochMetrics::default();
    for images in loader.iter::<B>(device) {
        let batch_size = images.dims()[0];
        metrics.record(batch_size, &vae_loss(model, images).values());
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_autodiff::Autodiff;
    use burn_dataset::InMemDataset;
    use burn_ndarray::NdArray;
    use burn_vae::VaeConfig;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<TestBackend>;

    fn digits(len: usize) -> InMemDataset<MnistItem> {
        let items = (0..len)
            .map(|i| {
                let mut image = [[0.0f32; 28]; 28];
                for (row, pixels) in image.iter_mut().enumerate() {
                    for (col, pixel) in pixels.iter_mut().enumerate() {
                        if (row + col + i) % 5 == 0 {
                            *pixel = 255.0;
                        }
                    }
                }
                MnistItem { image, label: 0 }
            })
            .collect();
        InMemDataset::new(items)
    }

    fn small_config() -> TrainingConfig {
        TrainingConfig::mnist()
            .with_model(VaeConfig::mnist().with_hidden_dim(16).with_latent_dim(2))
            .with_batch_size(8)
            .with_num_epochs(3)
            .with_learning_rate(1e-3)
            .with_seed(42)
    }

    #[test]
    fn test_epoch_metrics_means() {
        let mut metrics = EpochMetrics::default();
        let values = LossValues {
            total: 30.0,
            reconstruction: 20.0,
            divergence: 10.0,
        };
        metrics.record(10, &values);
        metrics.record(5, &values);

        assert_eq!(metrics.examples, 15);
        assert_eq!(metrics.batches, 2);
        assert!((metrics.mean_loss() - 4.0).abs() < 1e-12);
        assert!((metrics.mean_reconstruction() - 40.0 / 15.0).abs() < 1e-12);
        assert!((metrics.mean_divergence() - 20.0 / 15.0).abs() < 1e-12);
        assert_eq!(EpochMetrics::default().mean_loss(), 0.0);
    }

    #[test]
    fn test_step_updates_parameters() {
        let device = Default::default();
        let config = small_config();
        let mut trainer = config.init_trainer::<TestAutodiffBackend>(&device);

        let data = digits(8);
        let items: Vec<MnistItem> = (0..8).filter_map(|i| data.get(i)).collect();
        let images = crate::data::batch_images::<TestAutodiffBackend>(&items, &device);
        let latent: Tensor<TestBackend, 2> = Tensor::zeros([1, 2], &device);
        let before = trainer.model().valid().generate(latent.clone()).into_data();

        let loss = trainer.step(images, 0, 0).unwrap();
        assert!(loss.is_finite());

        let after = trainer.model().valid().generate(latent).into_data();
        assert_ne!(before, after);
    }

    #[test]
    fn test_fit_reduces_loss() {
        let device = Default::default();
        let config = small_config().with_num_epochs(15).with_learning_rate(5e-3);
        let mut trainer = config.init_trainer::<TestAutodiffBackend>(&device);
        let mut train = ImageLoader::shuffled(digits(32), 8, 0).unwrap();

        let history = trainer
            .fit::<_, InMemDataset<MnistItem>>(&mut train, None)
            .unwrap();

        assert_eq!(history.len(), 15);
        let first = history.first().unwrap().train.mean_loss();
        let last = history.last().unwrap().train.mean_loss();
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    #[test]
    fn test_fit_reports_events_and_validation() {
        let device = Default::default();
        let config = small_config().with_num_epochs(2);
        let mut trainer = config.init_trainer::<TestAutodiffBackend>(&device);
        let mut train = ImageLoader::shuffled(digits(20), 8, 0).unwrap();
        let mut validation = ImageLoader::sequential(digits(6), 8).unwrap();

        let mut steps = 0;
        let mut epochs = 0;
        let history = trainer
            .fit_with_callback(&mut train, Some(&mut validation), |event| match event {
                TrainEvent::Step(info) => {
                    assert_eq!(info.total_batches, 3);
                    steps += 1;
                }
                TrainEvent::Epoch(_) => epochs += 1,
            })
            .unwrap();

        assert_eq!(steps, 6);
        assert_eq!(epochs, 2);
        let validation = history[1].validation.unwrap();
        assert_eq!(validation.examples, 6);
        assert_eq!(history[1].train.examples, 20);
    }

    #[test]
    fn test_halt_on_non_finite() {
        let device = Default::default();
        let config = small_config().with_halt_on_non_finite(true);
        let mut trainer = config.init_trainer::<TestAutodiffBackend>(&device);

        let images = Tensor::full([2, 784], f32::NAN, &device);
        let err = trainer.step(images, 4, 9).unwrap_err();
        assert!(matches!(
            err,
            TrainError::NonFiniteLoss {
                epoch: 4,
                batch: 9,
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_loss_still_steps_by_default() {
        let device = Default::default();
        let config = small_config();
        assert!(!config.halt_on_non_finite);
        let mut trainer = config.init_trainer::<TestAutodiffBackend>(&device);

        let latent: Tensor<TestBackend, 2> = Tensor::zeros([1, 2], &device);
        let before = trainer.model().valid().generate(latent.clone()).into_data();

        let images = Tensor::full([2, 784], f32::NAN, &device);
        let loss = trainer.step(images, 0, 0).unwrap();
        assert!(!loss.is_finite());

        let after = trainer.model().valid().generate(latent).into_data();
        assert_ne!(before, after);
    }

    #[test]
    fn test_trainer_outlives_config() {
        let device = Default::default();
        let trainer = small_config().init_trainer::<TestAutodiffBackend>(&device);
        assert_eq!(trainer.config().batch_size, 8);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let device = Default::default();
        let mut trainer = small_config().init_trainer::<TestAutodiffBackend>(&device);
        let mut train = ImageLoader::sequential(digits(0), 8).unwrap();

        let err = trainer
            .fit::<_, InMemDataset<MnistItem>>(&mut train, None)
            .unwrap_err();
        assert!(matches!(err, TrainError::EmptyDataset));
    }

    #[test]
    fn test_evaluate_does_not_change_model() {
        let device = Default::default();
        let model = VaeConfig::mnist()
            .with_hidden_dim(8)
            .with_latent_dim(2)
            .init::<TestBackend>(&device);
        let mut loader = ImageLoader::sequential(digits(5), 2).unwrap();

        let latent: Tensor<TestBackend, 2> = Tensor::ones([1, 2], &device);
        let before = model.generate(latent.clone()).into_data();
        let metrics = evaluate(&model, &mut loader, &device);
        let after = model.generate(latent).into_data();

        assert_eq!(metrics.examples, 5);
        assert_eq!(metrics.batches, 3);
        assert!(metrics.mean_loss().is_finite());
        assert_eq!(before, after);
    }
}
