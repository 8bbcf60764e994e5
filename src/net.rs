//! Network: description, image data layer and inference backend together
//!
//! A `Net` is built once from a network description, has its trained weights
//! loaded once, and afterwards only runs forward passes. Each pass pulls its
//! batch from the net's own image data layer, so callers supply no input.

use crate::config::NetDescription;
use crate::data::ImageDataLayer;
use crate::error::{DetVizError, DetVizResult};
use crate::inference::{Blob, Device, InferenceBackend, InferenceError, OrtBackendBuilder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct Net {
    description: NetDescription,
    description_path: PathBuf,
    data_layer: Option<ImageDataLayer>,
    backend: Box<dyn InferenceBackend>,
    blobs: HashMap<String, Blob>,
}

impl Net {
    /// Build a net from a description file and load weights into an ONNX
    /// Runtime session on `device`
    pub fn from_files(
        description_path: &Path,
        weights_path: &Path,
        device: Device,
    ) -> DetVizResult<Self> {
        let description = NetDescription::from_toml_file(description_path)?;
        let backend = OrtBackendBuilder::new()
            .with_device(device)
            .with_input_name(description.model.input_name.clone())
            .build();

        let mut net = Self::new(description, description_path, Box::new(backend))?;
        net.copy_trained_layers_from(weights_path)?;
        Ok(net)
    }

    /// Build a net around an existing backend
    ///
    /// The image list is read here; weights are loaded separately.
    pub fn new(
        description: NetDescription,
        description_path: &Path,
        backend: Box<dyn InferenceBackend>,
    ) -> DetVizResult<Self> {
        let data_layer = match (&description.data, description.resolve_source(description_path)) {
            (Some(config), Some(source)) => {
                Some(ImageDataLayer::from_list_file(config.clone(), &source)?)
            }
            _ => None,
        };

        info!(
            "Initialized network {:?} from {}",
            description.name,
            description_path.display()
        );

        Ok(Self {
            description,
            description_path: description_path.to_path_buf(),
            data_layer,
            backend,
            blobs: HashMap::new(),
        })
    }

    /// Load trained weights into the backend
    pub fn copy_trained_layers_from(&mut self, weights_path: &Path) -> DetVizResult<()> {
        info!("Loading trained weights from {}", weights_path.display());
        self.backend.load_model(weights_path)?;
        Ok(())
    }

    pub fn description(&self) -> &NetDescription {
        &self.description
    }

    pub fn description_path(&self) -> &Path {
        &self.description_path
    }

    /// The image data layer feeding this net, if the description declares one
    pub fn data_layer(&self) -> Option<&ImageDataLayer> {
        self.data_layer.as_ref()
    }

    pub fn device(&self) -> Device {
        self.backend.device()
    }

    /// Whether trained weights have been loaded
    pub fn is_loaded(&self) -> bool {
        self.backend.is_loaded()
    }

    /// Names of every blob a forward pass produces
    pub fn output_names(&self) -> Vec<String> {
        self.backend.output_names()
    }

    /// Whether `name` is produced by this net
    pub fn has_blob(&self, name: &str) -> bool {
        self.blobs.contains_key(name) || self.backend.output_names().iter().any(|n| n == name)
    }

    /// Blob from the last forward pass
    pub fn blob_by_name(&self, name: &str) -> Option<&Blob> {
        self.blobs.get(name)
    }

    /// Run one forward pass on the next batch of the data layer
    pub fn forward(&mut self) -> DetVizResult<()> {
        let data_layer = self
            .data_layer
            .as_mut()
            .ok_or_else(|| DetVizError::MissingDataLayer(self.description_path.clone()))?;
        if !self.backend.is_loaded() {
            return Err(InferenceError::ModelNotLoaded.into());
        }

        let batch = data_layer.next_batch()?;
        debug!("Forward pass on batch {:?}", batch.shape());

        let outputs = self.backend.forward(batch.into_dyn())?;
        self.blobs = outputs
            .into_iter()
            .map(|blob| (blob.name().to_string(), blob))
            .collect();

        Ok(())
    }
}
