pub mod metrics;
pub mod tiff;
