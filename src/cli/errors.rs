use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("--cross expects Landsat-8 ids in --scenes, got --sensor {sensor}")]
    CrossNeedsLandsat { sensor: String },

    #[error("Cannot infer the sensor of {path}; pass --sensor")]
    UnknownSensor { path: String },

    #[error("Day difference must be positive, got: {days}")]
    InvalidDayDifference { days: i64 },

    #[error("{failed} of {total} pairs failed")]
    PairsFailed { failed: usize, total: usize },

    #[error(transparent)]
    Radval(#[from] radval::Error),
}
