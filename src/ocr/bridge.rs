use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::core::model::OcrOutput;
use crate::ocr::box_file::parse_box_file;
use crate::ocr::{OcrEngine, SourceImage};

/// Drives the `tesseract` command-line engine.
///
/// Text and boxes come from two separate invocations, so they are produced
/// by independent recognition passes just like the library API would.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    lang: String,
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            lang: "eng".to_string(),
            tessdata_dir: None,
        }
    }

    pub fn with_binary(mut self, binary: PathBuf) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_tessdata_dir(mut self, tessdata_dir: Option<PathBuf>) -> Self {
        self.tessdata_dir = tessdata_dir;
        self
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    fn recognition_command(&self, image_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path).arg("stdout");
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg("-l").arg(&self.lang);
        cmd
    }

    fn run(&self, mut cmd: Command, pass: &str) -> Result<String> {
        debug!(?cmd, pass, "invoking tesseract");
        let output = cmd.output().with_context(|| {
            format!("failed to run {} (is it installed?)", self.binary.display())
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract {pass} pass failed ({}): {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub fn text(&self, image_path: &Path) -> Result<String> {
        let mut cmd = self.recognition_command(image_path);
        cmd.arg("-c").arg("page_separator=");
        self.run(cmd, "text")
    }

    pub fn box_text(&self, image_path: &Path) -> Result<String> {
        let mut cmd = self.recognition_command(image_path);
        cmd.arg("makebox");
        self.run(cmd, "box")
    }
}

impl OcrEngine for TesseractCli {
    fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .with_context(|| format!("failed to run {} --version", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract --version failed: {}", stderr.trim());
        }

        // Older releases print the banner on stderr.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("tesseract --version printed nothing"))
    }

    fn recognize(&self, image: &SourceImage) -> Result<OcrOutput> {
        let engine_version = self.version()?;
        let boxes = self.box_text(image.path())?;
        let glyphs = parse_box_file(&boxes)
            .with_context(|| format!("failed to parse box output for {}", image.name()))?;
        let text = self.text(image.path())?;

        debug!(
            image = image.name(),
            glyphs = glyphs.len(),
            text_len = text.len(),
            "tesseract recognition finished"
        );

        Ok(OcrOutput {
            engine_version,
            image_name: image.name().to_string(),
            text,
            glyphs,
            image_size: Some(image.dimensions()),
        })
    }
}
