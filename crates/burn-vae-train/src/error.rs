//! Error types for training and data preparation

use thiserror::Error;

/// Errors raised while preparing datasets and loaders
#[derive(Debug, Error)]
pub enum DataError {
    /// Split fraction outside [0, 1)
    #[error("validation fraction must be in [0, 1), got {0}")]
    InvalidFraction(f64),

    /// Batch size of zero
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
}

/// Errors raised by the trainer
#[derive(Debug, Error)]
pub enum TrainError {
    /// Loss became NaN or infinite while `halt_on_non_finite` was set
    #[error("non-finite loss {value} at epoch {epoch}, batch {batch}")]
    NonFiniteLoss {
        epoch: usize,
        batch: usize,
        value: f32,
    },

    /// Training set produced no batches
    #[error("training dataset is empty")]
    EmptyDataset,

    /// Rejected training configuration
    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    /// Data preparation failure
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_display() {
        let err = TrainError::NonFiniteLoss {
            epoch: 2,
            batch: 17,
            value: f32::NAN,
        };
        let msg = err.to_string();
        assert!(msg.contains("epoch 2"));
        assert!(msg.contains("batch 17"));
        assert!(msg.contains("NaN"));
    }

    #[test]
    fn test_data_error_conversion() {
        let err: TrainError = DataError::ZeroBatchSize.into();
        assert!(matches!(err, TrainError::Data(DataError::ZeroBatchSize)));
        assert!(err.to_string().contains("batch size"));
    }
}
