pub mod box_file;
pub mod bridge;
pub mod recorded;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::model::OcrOutput;

pub use bridge::TesseractCli;
pub use recorded::RecordedOcr;

pub trait OcrEngine {
    fn version(&self) -> Result<String>;
    fn recognize(&self, image: &SourceImage) -> Result<OcrOutput>;
}

/// An image opened for one recognition run.
#[derive(Debug, Clone)]
pub struct SourceImage {
    path: PathBuf,
    name: String,
    width: u32,
    height: u32,
}

impl SourceImage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            anyhow::bail!("image does not exist: {}", path.display());
        }
        let (width, height) = image::image_dimensions(&path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path,
            name,
            width,
            height,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
