//! Shared fixtures for integration tests

#![allow(dead_code)]

use detviz::config::{ImageDataConfig, NetDescription};
use detviz::inference::{Blob, Device, InferenceBackend, InferenceError};
use detviz::Net;
use image::{Rgb, RgbImage};
use ndarray::ArrayD;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const BLOB: &str = "fc_8_det";
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Backend that replays prepared outputs, one per forward pass
pub struct ScriptedBackend {
    outputs: VecDeque<Blob>,
    names: Vec<String>,
    loaded: bool,
}

impl ScriptedBackend {
    pub fn new(outputs: Vec<Blob>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for blob in &outputs {
            if !names.iter().any(|n| n == blob.name()) {
                names.push(blob.name().to_string());
            }
        }
        Self {
            outputs: outputs.into(),
            names,
            loaded: true,
        }
    }

    /// Backend whose model declares outputs but produces nothing
    pub fn with_names(names: &[&str]) -> Self {
        Self {
            outputs: VecDeque::new(),
            names: names.iter().map(|n| n.to_string()).collect(),
            loaded: true,
        }
    }

    /// Same backend before any weights were loaded
    pub fn unloaded(mut self) -> Self {
        self.loaded = false;
        self
    }
}

impl InferenceBackend for ScriptedBackend {
    fn load_model(&mut self, _path: &Path) -> Result<(), InferenceError> {
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn output_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn forward(&mut self, _input: ArrayD<f32>) -> Result<Vec<Blob>, InferenceError> {
        self.outputs
            .pop_front()
            .map(|blob| vec![blob])
            .ok_or_else(|| InferenceError::InferenceFailed("script exhausted".to_string()))
    }

    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// Box output for one batch, one `[x1, y1, x2, y2]` per sample
pub fn boxes(values: &[[f32; 4]]) -> Blob {
    Blob::new(
        BLOB,
        vec![values.len(), 4],
        values.iter().flatten().copied().collect(),
    )
    .unwrap()
}

/// Scratch directory with black source images and an image list
pub struct Fixture {
    pub dir: TempDir,
    pub list: Vec<PathBuf>,
}

impl Fixture {
    /// Create `width x height` black images at the given relative paths
    pub fn new(relative: &[&str], width: u32, height: u32) -> Self {
        let dir = TempDir::new().unwrap();
        let mut list = Vec::new();

        for rel in relative {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            RgbImage::from_pixel(width, height, BLACK).save(&path).unwrap();
            list.push(path);
        }

        let content: String = list
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} {}\n", p.display(), i))
            .collect();
        std::fs::write(dir.path().join("list.txt"), content).unwrap();

        Self { dir, list }
    }

    pub fn description(&self, batch_size: usize) -> NetDescription {
        NetDescription {
            name: "test_det".to_string(),
            data: Some(ImageDataConfig {
                source: PathBuf::from("list.txt"),
                batch_size,
                ..ImageDataConfig::default()
            }),
            ..NetDescription::default()
        }
    }

    pub fn description_path(&self) -> PathBuf {
        self.dir.path().join("net.toml")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn net(&self, batch_size: usize, backend: ScriptedBackend) -> Net {
        Net::new(
            self.description(batch_size),
            &self.description_path(),
            Box::new(backend),
        )
        .unwrap()
    }
}

/// Names of the files in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
