//! End-to-end run on a synthetic in-memory digit set: split, train with
//! validation, checkpoint, reload on the inference backend, sample a grid.

use burn::module::AutodiffModule;
use burn::prelude::*;
use burn::tensor::Distribution;
use burn_autodiff::Autodiff;
use burn_dataset::{Dataset, InMemDataset};
use burn_dataset::vision::MnistItem;
use burn_ndarray::NdArray;
use burn_vae::VaeConfig;
use burn_vae_train::{
    ImageLoader, Split, TrainingConfig, evaluate, load_checkpoint, random_split,
    save_checkpoint, tensor_to_grid, vae_loss_with_noise,
};

type Inference = NdArray<f32>;
type Training = Autodiff<Inference>;

/// Vertical and horizontal bars at a few positions
fn bars(len: usize) -> InMemDataset<MnistItem> {
    let items = (0..len)
        .map(|i| {
            let mut image = [[0.0f32; 28]; 28];
            let pos = 4 + (i % 5) * 4;
            for k in 0..28 {
                if i % 2 == 0 {
                    image[k][pos] = 255.0;
                } else {
                    image[pos][k] = 255.0;
                }
            }
            MnistItem {
                image,
                label: (i % 10) as u8,
            }
        })
        .collect();
    InMemDataset::new(items)
}

fn config() -> TrainingConfig {
    TrainingConfig::mnist()
        .with_model(VaeConfig::mnist().with_hidden_dim(32).with_latent_dim(4))
        .with_num_epochs(4)
        .with_batch_size(10)
        .with_learning_rate(2e-3)
        .with_seed(3)
}

fn loaders(
    config: &TrainingConfig,
) -> (
    ImageLoader<Split<InMemDataset<MnistItem>, MnistItem>>,
    ImageLoader<Split<InMemDataset<MnistItem>, MnistItem>>,
) {
    let (train, validation) = random_split(bars(50), config.validation_fraction, config.seed).unwrap();
    assert_eq!(train.len(), 40);
    assert_eq!(validation.len(), 10);

    (
        ImageLoader::shuffled(train, config.batch_size, config.seed).unwrap(),
        ImageLoader::sequential(validation, config.batch_size).unwrap(),
    )
}

#[test]
fn train_checkpoint_and_sample() {
    let config = config();
    let device = Default::default();
    let (mut train, mut validation) = loaders(&config);

    let mut trainer = config.init_trainer::<Training>(&device);
    let history = trainer.fit(&mut train, Some(&mut validation)).unwrap();

    assert_eq!(history.len(), 4);
    for summary in &history {
        assert_eq!(summary.train.examples, 40);
        assert_eq!(summary.train.batches, 4);
        let val = summary.validation.unwrap();
        assert_eq!(val.examples, 10);
        assert!(val.mean_loss().is_finite());
    }

    let dir = tempfile::tempdir().unwrap();
    save_checkpoint(dir.path(), trainer.model(), trainer.config()).unwrap();

    let (model, loaded_config) = load_checkpoint::<Inference>(dir.path(), &device).unwrap();
    assert_eq!(loaded_config.model.latent_dim, 4);
    assert_eq!(loaded_config.num_epochs, 4);

    // Reloaded weights evaluate like the in-memory ones given the same noise
    let items = bars(5);
    let items: Vec<MnistItem> = (0..5).filter_map(|i| items.get(i)).collect();
    let batch = burn_vae_train::data::batch_images::<Inference>(&items, &device);
    let noise: Tensor<Inference, 2> =
        Tensor::random([5, 4], Distribution::Normal(0.0, 1.0), &device);
    let trained = trainer.into_model().valid();
    let expected = vae_loss_with_noise(&trained, batch.clone(), noise.clone()).values();
    let actual = vae_loss_with_noise(&model, batch, noise).values();
    assert!((expected.total - actual.total).abs() <= 1e-3 * expected.total.abs().max(1.0));

    let samples = model.sample_prior(128, &device);
    assert_eq!(samples.dims(), [128, 784]);

    let grid = tensor_to_grid(samples.slice([0..100, 0..784]), 10);
    assert_eq!(grid.dimensions(), (280, 280));
    let png = dir.path().join("samples.png");
    grid.save(&png).unwrap();
    assert!(png.exists());
}

#[test]
fn validation_loss_uses_inference_model() {
    let config = config().with_num_epochs(1);
    let device = Default::default();
    let (mut train, mut validation) = loaders(&config);

    let mut trainer = config.init_trainer::<Training>(&device);
    let history = trainer.fit(&mut train, Some(&mut validation)).unwrap();

    let again = evaluate(&trainer.model().valid(), &mut validation, &device);
    assert_eq!(again.examples, history[0].validation.unwrap().examples);
    assert!(again.mean_loss().is_finite());
}

#[test]
fn split_loaders_cover_dataset_once() {
    let (train, validation) = random_split(bars(6), 0.5, 1).unwrap();

    let mut train = ImageLoader::sequential(train, 2).unwrap();
    let mut validation = ImageLoader::sequential(validation, 2).unwrap();
    assert_eq!(train.num_batches(), 2);
    assert_eq!(validation.num_batches(), 2);

    let device = Default::default();
    let sizes: Vec<usize> = train
        .iter::<Inference>(&device)
        .chain(validation.iter::<Inference>(&device))
        .map(|b| b.dims()[0])
        .collect();
    assert_eq!(sizes, vec![2, 1, 2, 1]);
}
