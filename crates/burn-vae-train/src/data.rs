//! MNIST loading, splitting and batching
//!
//! Items are 28x28 grids of raw byte intensities (0-255 stored as f32).
//! Batches are flattened to [batch, 784] and scaled to [0, 1].

use std::sync::Arc;

use burn::prelude::*;
use burn_dataset::Dataset;
use burn_dataset::transform::{PartialDataset, ShuffledDataset};
use burn_dataset::vision::{MnistDataset, MnistItem};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::DataError;

/// Divisor mapping raw intensities to [0, 1]
pub const PIXEL_SCALE: f32 = 255.0;

/// Flattens and stacks items into a [batch, 784] tensor with values in [0, 1]
pub fn batch_images<B: Backend>(items: &[MnistItem], device: &B::Device) -> Tensor<B, 2> {
    let width = burn_vae::MNIST_IMAGE_SIZE;
    let pixels: Vec<f32> = items
        .iter()
        .flat_map(|item| item.image.iter().flatten())
        .map(|&p| p / PIXEL_SCALE)
        .collect();

    Tensor::from_data(TensorData::new(pixels, [items.len(), width]), device)
}

/// One side of a [`random_split`]: a window into the shuffled dataset
pub type Split<D, I> = PartialDataset<Arc<ShuffledDataset<D, I>>, I>;

/// Randomly partitions `dataset` into (train, validation)
///
/// The validation part holds `floor(len * validation_fraction)` items; the
/// rest go to training. The permutation is fixed by `seed`.
pub fn random_split<D, I>(
    dataset: D,
    validation_fraction: f64,
    seed: u64,
) -> Result<(Split<D, I>, Split<D, I>), DataError>
where
    D: Dataset<I>,
    I: Clone + Send + Sync,
{
    if !(0.0..1.0).contains(&validation_fraction) {
        return Err(DataError::InvalidFraction(validation_fraction));
    }

    let len = dataset.len();
    let validation_len = (len as f64 * validation_fraction).floor() as usize;
    let train_len = len - validation_len;

    let shuffled = Arc::new(ShuffledDataset::with_seed(dataset, seed));
    Ok((
        PartialDataset::new(shuffled.clone(), 0, train_len),
        PartialDataset::new(shuffled, train_len, len),
    ))
}

/// Minibatch iterator over an image dataset
///
/// The last batch may be smaller than `batch_size`.
pub struct ImageLoader<D> {
    dataset: D,
    batch_size: usize,
    rng: Option<StdRng>,
}

impl<D: Dataset<MnistItem>> ImageLoader<D> {
    /// Loader visiting items in dataset order
    pub fn sequential(dataset: D, batch_size: usize) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::ZeroBatchSize);
        }
        Ok(Self {
            dataset,
            batch_size,
            rng: None,
        })
    }

    /// Loader reshuffling the visit order every epoch
    pub fn shuffled(dataset: D, batch_size: usize, seed: u64) -> Result<Self, DataError> {
        let mut loader = Self::sequential(dataset, batch_size)?;
        loader.rng = Some(StdRng::seed_from_u64(seed));
        Ok(loader)
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// True if the dataset has no items
    pub fn is_empty(&self) -> bool {
        self.dataset.len() == 0
    }

    /// Number of batches per epoch
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn epoch_order(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(rng) = self.rng.as_mut() {
            order.shuffle(rng);
        }
        order
    }

    /// Iterates one epoch of [batch, 784] tensors on `device`
    pub fn iter<'a, B: Backend>(
        &'a mut self,
        device: &'a B::Device,
    ) -> impl Iterator<Item = Tensor<B, 2>> + 'a {
        let order = self.epoch_order();
        let this: &'a Self = self;

        (0..this.num_batches()).map(move |batch| {
            let start = batch * this.batch_size;
            let end = (start + this.batch_size).min(order.len());
            let items: Vec<MnistItem> = order[start..end]
                .iter()
                .filter_map(|&index| this.dataset.get(index))
                .collect();
            batch_images(&items, device)
        })
    }
}

/// MNIST partitioned into train, validation and test sets
pub struct MnistSplits {
    pub train: Split<MnistDataset, MnistItem>,
    pub validation: Split<MnistDataset, MnistItem>,
    pub test: MnistDataset,
}

impl MnistSplits {
    /// Downloads (or reuses the cached) MNIST and splits the training set
    pub fn load(validation_fraction: f64, seed: u64) -> Result<Self, DataError> {
        tracing::info!("loading MNIST");
        let (train, validation) =
            random_split(MnistDataset::train(), validation_fraction, seed)?;
        let test = MnistDataset::test();
        tracing::info!(
            train = train.len(),
            validation = validation.len(),
            test = test.len(),
            "MNIST ready"
        );

        Ok(Self {
            train,
            validation,
            test,
        })
    }
}
