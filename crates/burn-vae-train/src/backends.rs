//! Backend support for burn-vae
//!
//! Enable the desired backend via feature flags:
//!
//! - `ndarray`: CPU backend using ndarray (default, no GPU required)
//! - `wgpu`: WebGPU backend (cross-platform GPU support)
//! - `cuda`: Native CUDA backend (NVIDIA GPUs only)
//!
//! Training wraps the chosen backend in [`Autodiff`]; inference and
//! sampling use it directly.
//!
//! # Example
//!
//! ```ignore
//! use burn_vae_train::backends::{Autodiff, NdArray, NdArrayDevice};
//!
//! let device = NdArrayDevice::default();
//! let mut trainer = TrainingConfig::mnist().init_trainer::<Autodiff<NdArray<f32>>>(&device);
//! ```

pub use burn_autodiff::Autodiff;

#[cfg(feature = "ndarray")]
pub use burn_ndarray::{NdArray, NdArrayDevice};

#[cfg(feature = "wgpu")]
pub use burn_wgpu::{Wgpu, WgpuDevice};

#[cfg(feature = "cuda")]
pub use burn_cuda::{Cuda, CudaDevice};

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(feature = "ndarray")]
    fn test_autodiff_ndarray_backend() {
        use super::*;
        use burn::prelude::*;

        let device = NdArrayDevice::default();
        let x: Tensor<Autodiff<NdArray<f32>>, 1> = Tensor::ones([3], &device).require_grad();
        let grads = x.clone().powi_scalar(2).sum().backward();
        let grad: Vec<f32> = x.grad(&grads).unwrap().into_data().iter::<f32>().collect();
        assert_eq!(grad, vec![2.0, 2.0, 2.0]);
    }
}
