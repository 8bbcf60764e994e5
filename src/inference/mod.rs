//! ML inference abstractions and implementations

use ndarray::ArrayD;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub mod ort_backend;

pub use ort_backend::{OrtBackend, OrtBackendBuilder};

/// Compute device a backend runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    Gpu(u32),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "CPU"),
            Device::Gpu(id) => write!(f, "GPU:{}", id),
        }
    }
}

/// Named, shaped output buffer of a forward pass
///
/// Values are stored in row-major order; the leading dimension is the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    name: String,
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Blob {
    /// Create a blob, checking that `data` fills `shape`
    pub fn new(
        name: impl Into<String>,
        shape: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self, InferenceError> {
        let name = name.into();
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(InferenceError::InvalidOutputFormat(format!(
                "blob {} has shape {:?} but {} values",
                name,
                shape,
                data.len()
            )));
        }

        Ok(Self { name, shape, data })
    }

    /// Copy an ndarray view of any layout into a blob
    pub fn from_array(name: impl Into<String>, array: ndarray::ArrayViewD<'_, f32>) -> Self {
        Self {
            name: name.into(),
            shape: array.shape().to_vec(),
            data: array.iter().copied().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of samples (leading dimension)
    pub fn num(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Total number of values
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Values per sample, `None` for an empty batch
    pub fn dim_per_sample(&self) -> Option<usize> {
        match self.num() {
            0 => None,
            num => Some(self.count() / num),
        }
    }

    /// Index of the first value of sample `n`
    pub fn offset(&self, n: usize) -> usize {
        n * self.dim_per_sample().unwrap_or(0)
    }

    /// Values of sample `n`
    pub fn sample(&self, n: usize) -> Option<&[f32]> {
        let dim = self.dim_per_sample()?;
        let start = self.offset(n);
        self.data.get(start..start + dim)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Inference backend trait for different ML frameworks
pub trait InferenceBackend {
    /// Load trained weights from the given path
    fn load_model(&mut self, path: &Path) -> Result<(), InferenceError>;

    /// Whether weights have been loaded
    fn is_loaded(&self) -> bool;

    /// Names of the outputs a forward pass produces
    fn output_names(&self) -> Vec<String>;

    /// Run one forward pass over an NCHW batch, returning every output
    fn forward(&mut self, input: ArrayD<f32>) -> Result<Vec<Blob>, InferenceError>;

    /// Device the backend executes on
    fn device(&self) -> Device;
}

/// Inference-related errors
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model loading failed: {0}")]
    ModelLoadError(String),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid output format: {0}")]
    InvalidOutputFormat(String),

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("ORT runtime error: {0}")]
    OrtError(String),
}
