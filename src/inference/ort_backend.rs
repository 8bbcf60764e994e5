//! ONNX Runtime backend implementation

use super::{Blob, Device, InferenceBackend, InferenceError};
use ndarray::ArrayD;
use ort::{
    execution_providers::CUDAExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// ONNX Runtime inference backend
pub struct OrtBackend {
    session: Option<Session>,
    device: Device,
    input_name: Option<String>,
    intra_threads: usize,
}

impl OrtBackend {
    /// Create a new ORT backend for the given device
    pub fn new(device: Device) -> Self {
        Self {
            session: None,
            device,
            input_name: None,
            intra_threads: 4,
        }
    }

    /// Create a new ORT backend that only uses the CPU provider
    pub fn with_cpu_only() -> Self {
        Self::new(Device::Cpu)
    }

    /// Create a session on the requested device
    ///
    /// A GPU request that cannot be honoured is an error; the session never
    /// moves to the CPU on its own.
    fn create_session(
        model_path: &Path,
        device: Device,
        intra_threads: usize,
    ) -> Result<Session, InferenceError> {
        let session_builder = Session::builder()
            .map_err(|e| {
                InferenceError::OrtError(format!("Failed to create session builder: {}", e))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                InferenceError::OrtError(format!("Failed to set optimization level: {}", e))
            })?
            .with_intra_threads(intra_threads)
            .map_err(|e| InferenceError::OrtError(format!("Failed to set intra threads: {}", e)))?;

        let session_builder = match device {
            Device::Gpu(device_id) => {
                info!("Registering CUDA execution provider on device {}", device_id);
                session_builder
                    .with_execution_providers([CUDAExecutionProvider::default()
                        .with_device_id(device_id as i32)
                        .build()
                        .error_on_failure()])
                    .map_err(|e| {
                        InferenceError::ModelLoadError(format!(
                            "Failed to register CUDA execution provider on device {}: {}",
                            device_id, e
                        ))
                    })?
            }
            Device::Cpu => {
                info!("Creating session with CPU execution provider");
                session_builder
            }
        };

        session_builder.commit_from_file(model_path).map_err(|e| {
            InferenceError::ModelLoadError(format!(
                "Failed to load {} on {}: {}",
                model_path.display(),
                device,
                e
            ))
        })
    }

    /// Name of the input fed with the batch
    fn resolve_input_name(&self) -> Result<String, InferenceError> {
        if let Some(name) = &self.input_name {
            return Ok(name.clone());
        }

        let session = self.session.as_ref().ok_or(InferenceError::ModelNotLoaded)?;
        session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| InferenceError::InvalidOutputFormat("model declares no inputs".to_string()))
    }
}

impl Default for OrtBackend {
    fn default() -> Self {
        Self::with_cpu_only()
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(&mut self, path: &Path) -> Result<(), InferenceError> {
        if !path.exists() {
            return Err(InferenceError::ModelLoadError(format!(
                "Model file does not exist: {}",
                path.display()
            )));
        }

        let session = Self::create_session(path, self.device, self.intra_threads)?;
        info!(
            "Loaded {} with inputs {:?} and outputs {:?}",
            path.display(),
            session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            session.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>()
        );
        self.session = Some(session);

        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    fn output_names(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(|session| session.outputs.iter().map(|o| o.name.clone()).collect())
            .unwrap_or_default()
    }

    fn forward(&mut self, input: ArrayD<f32>) -> Result<Vec<Blob>, InferenceError> {
        let start = Instant::now();
        let input_name = self.resolve_input_name()?;
        let output_names = self.output_names();
        let input_shape = input.shape().to_vec();

        let session = self.session.as_mut().ok_or(InferenceError::ModelNotLoaded)?;

        let input_tensor = Tensor::from_array(input)
            .map_err(|e| InferenceError::OrtError(format!("Failed to create input tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| InferenceError::InferenceFailed(format!("Session run failed: {}", e)))?;

        let mut blobs = Vec::with_capacity(output_names.len());
        for name in &output_names {
            let value = outputs.get(name.as_str()).ok_or_else(|| {
                InferenceError::InvalidOutputFormat(format!("output {} missing from results", name))
            })?;
            let array = value.try_extract_array::<f32>().map_err(|e| {
                InferenceError::OrtError(format!("Failed to extract output {}: {}", name, e))
            })?;
            blobs.push(Blob::from_array(name.as_str(), array));
        }

        debug!(
            "forward input={:?} outputs={} time_ms={:.2} device={}",
            input_shape,
            blobs.len(),
            start.elapsed().as_secs_f64() * 1000.0,
            self.device
        );

        Ok(blobs)
    }

    fn device(&self) -> Device {
        self.device
    }
}

/// Builder for ORT backend configuration
pub struct OrtBackendBuilder {
    device: Device,
    input_name: Option<String>,
    intra_threads: usize,
}

impl OrtBackendBuilder {
    pub fn new() -> Self {
        Self {
            device: Device::Cpu,
            input_name: None,
            intra_threads: 4,
        }
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Feed the batch to this input instead of the model's first one
    pub fn with_input_name(mut self, name: Option<String>) -> Self {
        self.input_name = name;
        self
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads.max(1);
        self
    }

    pub fn build(self) -> OrtBackend {
        OrtBackend {
            session: None,
            device: self.device,
            input_name: self.input_name,
            intra_threads: self.intra_threads,
        }
    }
}

impl Default for OrtBackendBuilder {
    fn default() -> Self {
        Self::new()
    }
}
