//! Image data layer
//!
//! Holds the image list of a network and produces one NCHW batch per forward
//! pass, walking the list with a cursor that wraps back to the first entry.

use crate::config::{ChannelOrder, ImageDataConfig};
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, ImageResult};
use ndarray::Array4;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// One entry of the image list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Path as written in the list file
    pub path: PathBuf,
    /// Integer label, 0 when the line carries none
    pub label: i32,
}

/// Data layer errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to read image list {0}: {1}")]
    ListReadError(PathBuf, std::io::Error),

    #[error("Malformed image list line {line_no}: {line:?}")]
    MalformedLine { line_no: usize, line: String },

    #[error("Image list {0} is empty")]
    EmptyImageList(PathBuf),

    #[error("Could not load image {path}: {source}")]
    ImageLoadError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image {path} is {actual:?} (w, h) but the batch expects {expected:?}")]
    ShapeMismatch {
        path: PathBuf,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Failed to assemble batch tensor: {0}")]
    TensorError(String),
}

/// Decode the image at `path`, detecting its format from the file content
///
/// List entries may lack an extension or carry one that does not match the
/// encoded data.
pub fn read_image(path: &Path) -> ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

/// Parse the contents of an image list file
///
/// Each non-blank line holds a path optionally followed by an integer label.
pub fn parse_image_list(content: &str) -> Result<Vec<ImageEntry>, DataError> {
    let mut entries = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(path) = fields.next() else {
            continue;
        };

        let malformed = || DataError::MalformedLine {
            line_no: index + 1,
            line: line.to_string(),
        };

        let label = match fields.next() {
            Some(raw) => raw.parse::<i32>().map_err(|_| malformed())?,
            None => 0,
        };
        if fields.next().is_some() {
            return Err(malformed());
        }

        entries.push(ImageEntry {
            path: PathBuf::from(path),
            label,
        });
    }

    Ok(entries)
}

/// Data layer that reads images listed in a text file
#[derive(Debug)]
pub struct ImageDataLayer {
    config: ImageDataConfig,
    source: PathBuf,
    lines: Vec<ImageEntry>,
    cursor: usize,
}

impl ImageDataLayer {
    /// Build the layer by reading the list file at `source`
    pub fn from_list_file(config: ImageDataConfig, source: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(source)
            .map_err(|e| DataError::ListReadError(source.to_path_buf(), e))?;
        let lines = parse_image_list(&content)?;

        let layer = Self::from_entries(config, source, lines)?;
        info!(
            "Image data layer: {} images from {}, batch size {}",
            layer.len(),
            source.display(),
            layer.batch_size()
        );
        Ok(layer)
    }

    /// Build the layer from an already parsed list
    pub fn from_entries(
        config: ImageDataConfig,
        source: &Path,
        lines: Vec<ImageEntry>,
    ) -> Result<Self, DataError> {
        if lines.is_empty() {
            return Err(DataError::EmptyImageList(source.to_path_buf()));
        }

        Ok(Self {
            config,
            source: source.to_path_buf(),
            lines,
            cursor: 0,
        })
    }

    /// The list entries in file order
    pub fn lines(&self) -> &[ImageEntry] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Path of the list file this layer was built from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    /// Index of the next entry the layer will load
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn config(&self) -> &ImageDataConfig {
        &self.config
    }

    /// Path used to open the entry at `index`, with the root folder applied
    pub fn image_path(&self, index: usize) -> Option<PathBuf> {
        self.lines
            .get(index)
            .map(|entry| self.config.root_folder.join(&entry.path))
    }

    /// Load the next `batch_size` images into an NCHW tensor
    pub fn next_batch(&mut self) -> Result<Array4<f32>, DataError> {
        let batch_size = self.config.batch_size;
        let channels = self.config.channels();
        let mut batch: Option<Array4<f32>> = None;
        let mut expected = (0, 0);

        for item in 0..batch_size {
            let entry = &self.lines[self.cursor];
            let path = self.config.root_folder.join(&entry.path);
            let image = self.load(&path)?;
            let actual = (image.width(), image.height());

            // The first image fixes the batch geometry
            if batch.is_none() {
                expected = actual;
                batch = Some(Array4::zeros((
                    batch_size,
                    channels,
                    actual.1 as usize,
                    actual.0 as usize,
                )));
            } else if actual != expected {
                return Err(DataError::ShapeMismatch {
                    path,
                    expected,
                    actual,
                });
            }

            if let Some(tensor) = batch.as_mut() {
                self.fill_sample(tensor, item, &image);
            }

            self.cursor += 1;
            if self.cursor >= self.lines.len() {
                debug!("Restarting data prefetching from start.");
                self.cursor = 0;
            }
        }

        batch.ok_or_else(|| DataError::TensorError("batch size is 0".to_string()))
    }

    /// Open, convert and resize one image
    fn load(&self, path: &Path) -> Result<DynamicImage, DataError> {
        let image = read_image(path).map_err(|source| DataError::ImageLoadError {
            path: path.to_path_buf(),
            source,
        })?;

        let image = if self.config.is_color {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(image.to_luma8())
        };

        Ok(match self.config.resize_to() {
            Some((width, height)) => image.resize_exact(width, height, FilterType::Triangle),
            None => image,
        })
    }

    /// Write `image` into slot `item` of the batch, applying mean and scale
    fn fill_sample(&self, tensor: &mut Array4<f32>, item: usize, image: &DynamicImage) {
        let scale = self.config.scale;
        let mean = |channel: usize| -> f32 {
            match self.config.mean_values.len() {
                0 => 0.0,
                1 => self.config.mean_values[0],
                _ => self.config.mean_values[channel],
            }
        };

        match image {
            DynamicImage::ImageLuma8(grey) => {
                for (x, y, pixel) in grey.enumerate_pixels() {
                    tensor[[item, 0, y as usize, x as usize]] = (pixel[0] as f32 - mean(0)) * scale;
                }
            }
            other => {
                let rgb = other.to_rgb8();
                for (x, y, pixel) in rgb.enumerate_pixels() {
                    for channel in 0..3 {
                        let source_channel = match self.config.channel_order {
                            ChannelOrder::Rgb => channel,
                            ChannelOrder::Bgr => 2 - channel,
                        };
                        tensor[[item, channel, y as usize, x as usize]] =
                            (pixel[source_channel] as f32 - mean(channel)) * scale;
                    }
                }
            }
        }
    }
}
