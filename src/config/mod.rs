//! Network description loading and validation
//!
//! A network description is a TOML file naming the image data layer that
//! feeds the network and the model output that holds the predicted box.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the box output when the description does not override it
pub const DEFAULT_OUTPUT_BLOB: &str = "fc_8_det";

/// Channel order of the tensor produced by the image data layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Image data layer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageDataConfig {
    /// List file, one "<path> [label]" entry per line
    pub source: PathBuf,
    /// Prefix joined to every listed path when the image is opened
    pub root_folder: PathBuf,
    /// Samples per forward pass
    pub batch_size: usize,
    /// Resize target height, 0 keeps the original size
    pub new_height: u32,
    /// Resize target width, 0 keeps the original size
    pub new_width: u32,
    /// Three channels when true, one grey channel otherwise
    pub is_color: bool,
    /// Channel order for colour images
    pub channel_order: ChannelOrder,
    /// Per-channel mean subtracted before scaling (empty, one, or one per channel)
    pub mean_values: Vec<f32>,
    /// Multiplier applied after mean subtraction
    pub scale: f32,
}

impl Default for ImageDataConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            root_folder: PathBuf::new(),
            batch_size: 1,
            new_height: 0,
            new_width: 0,
            is_color: true,
            channel_order: ChannelOrder::Rgb,
            mean_values: Vec::new(),
            scale: 1.0,
        }
    }
}

impl ImageDataConfig {
    /// Number of channels in each produced sample
    pub fn channels(&self) -> usize {
        if self.is_color {
            3
        } else {
            1
        }
    }

    /// Resize target as (width, height), if resizing is enabled
    pub fn resize_to(&self) -> Option<(u32, u32)> {
        if self.new_width > 0 && self.new_height > 0 {
            Some((self.new_width, self.new_height))
        } else {
            None
        }
    }
}

/// Model input/output naming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Input fed with the data layer batch; the model's first input when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_name: Option<String>,
    /// Output holding the 4 box values per sample
    pub output_blob: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_name: None,
            output_blob: DEFAULT_OUTPUT_BLOB.to_string(),
        }
    }
}

/// Complete network description
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ImageDataConfig>,
    pub model: ModelConfig,
}

impl NetDescription {
    /// Load a description from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(path.to_path_buf(), e))?;

        let description = Self::from_toml_str(&content)?;
        Ok(description)
    }

    /// Parse and validate a description held in memory
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let description: NetDescription = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        description.validate()?;
        Ok(description)
    }

    /// Save the description to a TOML file
    pub fn to_toml_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(format!("TOML serialize error: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::FileWriteError(path.to_path_buf(), e))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.output_blob.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "model.output_blob must not be empty".to_string(),
            ));
        }

        if let Some(name) = &self.model.input_name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "model.input_name must not be empty when set".to_string(),
                ));
            }
        }

        let Some(data) = &self.data else {
            return Ok(());
        };

        if data.source.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "data.source must name a list file".to_string(),
            ));
        }

        if data.batch_size == 0 {
            return Err(ConfigError::InvalidValue(
                "data.batch_size must be greater than 0".to_string(),
            ));
        }

        // Resize needs both dimensions or neither
        if (data.new_height == 0) != (data.new_width == 0) {
            return Err(ConfigError::InvalidValue(format!(
                "data.new_height and data.new_width must both be set or both be 0, got {}x{}",
                data.new_height, data.new_width
            )));
        }

        let channels = data.channels();
        if !(data.mean_values.is_empty()
            || data.mean_values.len() == 1
            || data.mean_values.len() == channels)
        {
            return Err(ConfigError::InvalidValue(format!(
                "data.mean_values must hold 0, 1 or {} values, got {}",
                channels,
                data.mean_values.len()
            )));
        }

        if !data.scale.is_finite() {
            return Err(ConfigError::InvalidValue(format!(
                "data.scale must be finite, got {}",
                data.scale
            )));
        }

        Ok(())
    }

    /// Name of the box output
    pub fn output_blob(&self) -> &str {
        &self.model.output_blob
    }

    /// The list file path, resolved against the directory holding the description
    pub fn resolve_source(&self, description_path: &Path) -> Option<PathBuf> {
        let data = self.data.as_ref()?;
        if data.source.is_absolute() {
            return Some(data.source.clone());
        }

        let base = description_path.parent().unwrap_or_else(|| Path::new(""));
        Some(base.join(&data.source))
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read network description {0}: {1}")]
    FileReadError(PathBuf, std::io::Error),

    #[error("Failed to write network description {0}: {1}")]
    FileWriteError(PathBuf, std::io::Error),

    #[error("Network description parse error: {0}")]
    ParseError(String),

    #[error("Network description serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid network description value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
name = "det_net"

[data]
source = "lists/test.txt"
batch_size = 4
new_height = 227
new_width = 227
channel_order = "bgr"
mean_values = [104.0, 117.0, 123.0]

[model]
output_blob = "fc_8_det"
"#;

    #[test]
    fn test_default_configs() {
        let data = ImageDataConfig::default();
        assert_eq!(data.batch_size, 1);
        assert!(data.is_color);
        assert_eq!(data.scale, 1.0);
        assert_eq!(data.resize_to(), None);

        let model = ModelConfig::default();
        assert_eq!(model.output_blob, "fc_8_det");
        assert!(model.input_name.is_none());

        let description = NetDescription::default();
        assert!(description.data.is_none());
        assert!(description.validate().is_ok());
    }

    #[test]
    fn test_parse_sample_description() {
        let description = NetDescription::from_toml_str(SAMPLE).unwrap();
        let data = description.data.as_ref().unwrap();

        assert_eq!(description.name, "det_net");
        assert_eq!(data.batch_size, 4);
        assert_eq!(data.resize_to(), Some((227, 227)));
        assert_eq!(data.channel_order, ChannelOrder::Bgr);
        assert_eq!(data.mean_values, vec![104.0, 117.0, 123.0]);
        assert_eq!(description.output_blob(), "fc_8_det");
    }

    #[test]
    fn test_missing_data_section_is_allowed() {
        let description = NetDescription::from_toml_str("name = \"bare\"\n").unwrap();
        assert!(description.data.is_none());
        assert_eq!(description.resolve_source(Path::new("net.toml")), None);
    }

    #[test]
    fn test_config_validation() {
        let mut description = NetDescription::from_toml_str(SAMPLE).unwrap();
        assert!(description.validate().is_ok());

        let data = description.data.as_mut().unwrap();
        data.batch_size = 0;
        assert!(description.validate().is_err());
        description.data.as_mut().unwrap().batch_size = 4;

        // One resize dimension without the other
        description.data.as_mut().unwrap().new_width = 0;
        assert!(description.validate().is_err());
        description.data.as_mut().unwrap().new_width = 227;

        description.data.as_mut().unwrap().mean_values = vec![1.0, 2.0];
        assert!(description.validate().is_err());
        description.data.as_mut().unwrap().mean_values = vec![128.0];
        assert!(description.validate().is_ok());

        description.data.as_mut().unwrap().scale = f32::NAN;
        assert!(description.validate().is_err());
        description.data.as_mut().unwrap().scale = 0.5;

        description.model.output_blob = "  ".to_string();
        assert!(description.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = NetDescription::from_toml_str("[data\nsource = ");
        match result {
            Err(ConfigError::ParseError(message)) => assert!(message.contains("TOML")),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_source() {
        let description = NetDescription::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            description.resolve_source(Path::new("/models/det/net.toml")),
            Some(PathBuf::from("/models/det/lists/test.txt"))
        );
        assert_eq!(
            description.resolve_source(Path::new("net.toml")),
            Some(PathBuf::from("lists/test.txt"))
        );
    }

    #[test]
    fn test_description_file_serialization() {
        let description = NetDescription::from_toml_str(SAMPLE).unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        let temp_path = temp_file.path().to_path_buf();

        assert!(description.to_toml_file(&temp_path).is_ok());
        let loaded = NetDescription::from_toml_file(&temp_path).unwrap();

        assert_eq!(description, loaded);
    }

    #[test]
    fn test_missing_file() {
        let result = NetDescription::from_toml_file(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(ConfigError::FileReadError(_, _))));
    }
}
