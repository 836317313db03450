use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::core::model::OcrOutput;
use crate::ocr::box_file::parse_box_file;
use crate::ocr::{OcrEngine, SourceImage};

/// Replays a text/box pair saved from an earlier tesseract run.
#[derive(Debug, Clone)]
pub struct RecordedOcr {
    text_path: PathBuf,
    box_path: PathBuf,
    engine_version: String,
}

impl RecordedOcr {
    pub fn new(text_path: PathBuf, box_path: PathBuf) -> Self {
        Self {
            text_path,
            box_path,
            engine_version: "recorded".to_string(),
        }
    }

    pub fn with_engine_version(mut self, engine_version: String) -> Self {
        self.engine_version = engine_version;
        self
    }

    pub fn load(&self, image_name: &str) -> Result<OcrOutput> {
        let text = fs::read_to_string(&self.text_path)
            .with_context(|| format!("failed to read text file {}", self.text_path.display()))?;
        let boxes = fs::read_to_string(&self.box_path)
            .with_context(|| format!("failed to read box file {}", self.box_path.display()))?;
        let glyphs = parse_box_file(&boxes)
            .with_context(|| format!("failed to parse box file {}", self.box_path.display()))?;

        Ok(OcrOutput {
            engine_version: self.engine_version.clone(),
            image_name: image_name.to_string(),
            text,
            glyphs,
            image_size: None,
        })
    }
}

impl OcrEngine for RecordedOcr {
    fn version(&self) -> Result<String> {
        Ok(self.engine_version.clone())
    }

    fn recognize(&self, image: &SourceImage) -> Result<OcrOutput> {
        let mut output = self.load(image.name())?;
        output.image_size = Some(image.dimensions());
        Ok(output)
    }
}
