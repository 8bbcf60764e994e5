//! Command-line arguments

use crate::inference::Device;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Compute mode selected on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    #[value(name = "CPU")]
    Cpu,
    #[value(name = "GPU")]
    Gpu,
}

/// Run a trained box-regression network over the images listed by its data
/// layer and save each image with the predicted box drawn on it.
#[derive(Parser, Debug)]
#[command(name = "detviz", author, version)]
pub struct Args {
    /// Trained weights (ONNX model)
    pub pretrained_weights: PathBuf,

    /// Network description (TOML) naming the image list and box output
    pub network_description: PathBuf,

    /// Number of forward passes to run
    pub num_mini_batches: usize,

    /// Directory to create for the annotated images; must not exist
    pub output_dir: PathBuf,

    /// Compute mode
    #[arg(value_enum, ignore_case = true, default_value_t = Mode::Cpu)]
    pub mode: Mode,

    /// GPU device id, ignored in CPU mode
    #[arg(default_value_t = 0)]
    pub device_id: u32,
}

impl Args {
    /// Device the network should run on
    pub fn device(&self) -> Device {
        match self.mode {
            Mode::Cpu => Device::Cpu,
            Mode::Gpu => Device::Gpu(self.device_id),
        }
    }
}
