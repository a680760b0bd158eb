//! Synthetic measurement data.

pub mod sample;

pub use sample::{DeviceModel, SampleOptions, generate_sweep_files};
