//! Sampling from the prior and rendering image grids
//!
//! Decoder outputs are unbounded, so every tile is min-max normalized to
//! the full 0-255 range before it is written, the way a grayscale image
//! viewer scales a float image.

use burn::prelude::*;
use burn_vae::{MNIST_SIDE, VariationalAutoEncoder};
use image::{GrayImage, Luma};

/// Draws `count` images from the model's prior
///
/// Output: [count, input_dim]
pub fn generate_samples<B: Backend>(
    model: &VariationalAutoEncoder<B>,
    count: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    model.sample_prior(count, device)
}

/// Maps a tile's values onto 0-255, constant tiles become black
fn normalize_tile(values: &[f32]) -> Vec<u8> {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    values
        .iter()
        .map(|&v| {
            if range > 0.0 && range.is_finite() {
                ((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

/// Lays out square `side`x`side` images row-major in a grid `columns` wide
///
/// `pixels` holds the flattened images back to back. Cells past the last
/// image stay black.
pub fn image_grid(pixels: &[f32], side: usize, columns: usize) -> GrayImage {
    let tile = side * side;
    let count = pixels.len() / tile;
    let columns = columns.clamp(1, count.max(1));
    let rows = count.div_ceil(columns).max(1);

    let mut grid = GrayImage::new((columns * side) as u32, (rows * side) as u32);
    for (index, image) in pixels.chunks_exact(tile).enumerate() {
        let x0 = (index % columns) * side;
        let y0 = (index / columns) * side;
        for (offset, value) in normalize_tile(image).into_iter().enumerate() {
            let x = x0 + offset % side;
            let y = y0 + offset / side;
            grid.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
    grid
}

/// Renders a [count, 784] batch of decoded MNIST images as a grid
pub fn tensor_to_grid<B: Backend>(images: Tensor<B, 2>, columns: usize) -> GrayImage {
    let pixels: Vec<f32> = images.into_data().iter::<f32>().collect();
    image_grid(&pixels, MNIST_SIDE, columns)
}
