//! JSON configuration and report helpers for marker detection.

use crate::{DetectionRun, DetectorParams};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum DetectIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for a detection run over one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    pub image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub overlay_path: Option<String>,
    #[serde(default)]
    pub params: DetectorParams,
}

impl DetectConfig {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            output_path: None,
            overlay_path: None,
            params: DetectorParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("gridmark_report.json"))
    }
}

/// Serialized result of one detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReport {
    pub image_path: String,
    pub width: usize,
    pub height: usize,
    pub params: DetectorParams,
    #[serde(flatten)]
    pub run: DetectionRun,
}

impl DetectReport {
    pub fn new(
        image_path: impl Into<String>,
        width: usize,
        height: usize,
        params: DetectorParams,
        run: DetectionRun,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            width,
            height,
            params,
            run,
        }
    }

    /// Load a JSON report from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
