//! detviz: batch bounding-box inference and visualisation
//!
//! Loads a box-regression network (ONNX weights plus a TOML network
//! description), runs it over the images listed by the description's image
//! data layer, and writes each image with its predicted box drawn on it.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod net;
pub mod overlay;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::{ChannelOrder, ImageDataConfig, ModelConfig, NetDescription};
pub use data::{DataError, ImageDataLayer, ImageEntry};
pub use error::{DetVizError, DetVizResult};
pub use inference::{Blob, Device, InferenceBackend, InferenceError, OrtBackend};
pub use metrics::RunMetrics;
pub use net::Net;
pub use overlay::{draw_box, BoxStyle};
pub use pipeline::{RunSummary, SampleCursor, Visualizer};
pub use utils::BoundingBox;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
