//! Batch inference and box rendering loop

use crate::data::read_image;
use crate::error::{DetVizError, DetVizResult};
use crate::inference::InferenceError;
use crate::metrics::{RunMetrics, StepTimer};
use crate::net::Net;
use crate::overlay::{draw_box, BoxStyle};
use crate::utils::{BoundingBox, BOX_VALUES};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Position in the image list of the next sample to render
///
/// Advances once per rendered sample and wraps to 0 at the end of the list,
/// mirroring the data layer's own cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCursor {
    index: usize,
    len: usize,
}

impl SampleCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Move to the next entry; returns true when the list restarted
    pub fn advance(&mut self) -> bool {
        self.index += 1;
        if self.index >= self.len {
            info!("Restarting data prefetching from start.");
            self.index = 0;
            return true;
        }
        false
    }
}

/// Create the output directory, failing if it already exists
pub fn create_output_dir(path: &Path) -> DetVizResult<()> {
    let mut builder = std::fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o744);
    }

    builder.create(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::AlreadyExists {
            DetVizError::OutputDirExists(path.to_path_buf())
        } else {
            DetVizError::OutputDirectoryError {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Destination of the annotated copy of `image_path`
pub fn output_path(output_dir: &Path, image_path: &Path) -> DetVizResult<PathBuf> {
    let file_name = image_path
        .file_name()
        .ok_or_else(|| DetVizError::NoFileName(image_path.to_path_buf()))?;
    Ok(output_dir.join(file_name))
}

/// Load `image_path`, draw `bbox` and write the result to `out_path`
pub fn render_sample(
    image_path: &Path,
    out_path: &Path,
    bbox: &BoundingBox,
    style: &BoxStyle,
) -> DetVizResult<()> {
    let mut image = read_image(image_path)
        .map_err(|source| DetVizError::ImageRead {
            path: image_path.to_path_buf(),
            source,
        })?
        .to_rgb8();

    draw_box(&mut image, bbox, style);

    image.save(out_path).map_err(|source| DetVizError::ImageWrite {
        path: out_path.to_path_buf(),
        source,
    })
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub metrics: RunMetrics,
    /// Every file written, in processing order (repeats when names collide)
    pub written: Vec<PathBuf>,
}

/// Drives forward passes over a net and renders each predicted box
pub struct Visualizer<'a> {
    net: &'a mut Net,
    blob_name: String,
    style: BoxStyle,
}

impl<'a> Visualizer<'a> {
    /// Check that `net` has an image data layer, holds trained weights and
    /// produces its box output
    pub fn new(net: &'a mut Net) -> DetVizResult<Self> {
        if net.data_layer().is_none() {
            return Err(DetVizError::MissingDataLayer(
                net.description_path().to_path_buf(),
            ));
        }
        if !net.is_loaded() {
            return Err(InferenceError::ModelNotLoaded.into());
        }

        let blob_name = net.description().output_blob().to_string();
        if !net.has_blob(&blob_name) {
            return Err(DetVizError::UnknownBlob {
                blob: blob_name,
                description: net.description_path().to_path_buf(),
            });
        }

        Ok(Self {
            net,
            blob_name,
            style: BoxStyle::default(),
        })
    }

    /// Create `output_dir`, then run `num_mini_batches` forward passes and
    /// write one annotated image per sample
    pub fn run(&mut self, output_dir: &Path, num_mini_batches: usize) -> DetVizResult<RunSummary> {
        create_output_dir(output_dir)?;
        info!("Extracting Features");

        let list_len = self.net.data_layer().map(|layer| layer.len()).unwrap_or(0);
        let mut cursor = SampleCursor::new(list_len);
        let mut metrics = RunMetrics::new();
        let mut written = Vec::new();

        for batch_index in 0..num_mini_batches {
            let timer = StepTimer::start();
            self.net.forward()?;
            metrics.record_forward(timer.elapsed());

            let boxes = self.batch_boxes()?;
            debug!("Batch {} produced {} boxes", batch_index, boxes.len());

            for bbox in boxes {
                let timer = StepTimer::start();
                let image_path = self
                    .net
                    .data_layer()
                    .and_then(|layer| layer.image_path(cursor.index()))
                    .ok_or_else(|| {
                        DetVizError::MissingDataLayer(self.net.description_path().to_path_buf())
                    })?;
                let out_path = output_path(output_dir, &image_path)?;

                debug!(
                    "image_index {} {} {}",
                    cursor.index(),
                    image_path.display(),
                    bbox
                );
                render_sample(&image_path, &out_path, &bbox, &self.style)?;
                written.push(out_path);
                metrics.record_sample(timer.elapsed());

                if cursor.advance() {
                    metrics.record_restart();
                }
            }
        }

        Ok(RunSummary { metrics, written })
    }

    /// Read the box output of the last forward pass, one box per sample
    fn batch_boxes(&self) -> DetVizResult<Vec<BoundingBox>> {
        let blob = self
            .net
            .blob_by_name(&self.blob_name)
            .ok_or_else(|| DetVizError::UnknownBlob {
                blob: self.blob_name.clone(),
                description: self.net.description_path().to_path_buf(),
            })?;

        let bad_shape = || DetVizError::BadBlobShape {
            blob: self.blob_name.clone(),
            shape: blob.shape().to_vec(),
        };

        if blob.dim_per_sample() != Some(BOX_VALUES) {
            return Err(bad_shape());
        }

        if let Some(layer) = self.net.data_layer() {
            if blob.num() != layer.batch_size() {
                warn!(
                    "Blob {} holds {} samples but the data layer batch size is {}",
                    self.blob_name,
                    blob.num(),
                    layer.batch_size()
                );
            }
        }

        (0..blob.num())
            .map(|n| {
                blob.sample(n)
                    .and_then(BoundingBox::from_values)
                    .ok_or_else(bad_shape)
            })
            .collect()
    }
}
