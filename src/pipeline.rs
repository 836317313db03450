use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::model::OcrOutput;
use crate::export::{Exporter, HtmlExporter, JsonExporter, OverlayRenderer, TextExporter};
use crate::ocr::{OcrEngine, SourceImage};
use crate::reconcile::{PositionalReconciler, Reconciler, Reconciliation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
    Text,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub image: PathBuf,
    pub lookahead: usize,
}

impl PipelineConfig {
    pub fn new(image: PathBuf) -> Self {
        Self {
            image,
            lookahead: 0,
        }
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn reconciler(&self) -> PositionalReconciler {
        PositionalReconciler::new().with_lookahead(self.lookahead)
    }
}

/// Run OCR on one image and reconcile its two outputs.
///
/// The image handle lives only for the duration of this call.
pub fn build_document(config: &PipelineConfig, engine: &dyn OcrEngine) -> Result<Reconciliation> {
    let image = SourceImage::open(&config.image)?;
    let output = engine
        .recognize(&image)
        .with_context(|| format!("OCR failed for {}", image.name()))?;
    reconcile_output(&config.reconciler(), &output)
}

pub fn reconcile_output(
    reconciler: &dyn Reconciler,
    output: &OcrOutput,
) -> Result<Reconciliation> {
    let reconciliation = reconciler
        .reconcile(output)
        .with_context(|| format!("failed to reconcile OCR output for {}", output.image_name))?;

    let omitted = reconciliation.omitted();
    if omitted > 0 {
        warn!(
            image = %output.image_name,
            omitted,
            "characters omitted after text/box mismatch"
        );
    }
    let skipped = reconciliation.skipped();
    if skipped > 0 {
        warn!(
            image = %output.image_name,
            skipped,
            "box entries skipped while resynchronising"
        );
    }
    info!(
        image = %output.image_name,
        lines = reconciliation.document.lines.len(),
        characters = reconciliation.document.char_count(),
        "layout ready"
    );

    Ok(reconciliation)
}

pub fn export_document(
    reconciliation: &Reconciliation,
    output: &Path,
    formats: &[ExportFormat],
    renderer: &OverlayRenderer,
) -> Result<()> {
    for format in formats {
        let exporter: Box<dyn Exporter> = match format {
            ExportFormat::Json => Box::new(JsonExporter::new(output.to_path_buf())),
            ExportFormat::Html => {
                Box::new(HtmlExporter::new(output.to_path_buf(), renderer.clone()))
            }
            ExportFormat::Text => Box::new(TextExporter::new(output.to_path_buf())),
        };
        exporter
            .export(reconciliation)
            .with_context(|| format!("failed to export {format:?} to {}", output.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::core::model::{GlyphBox, OcrOutput};

    fn temp_output_dir(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out
    }

    struct FixedEngine(OcrOutput);

    impl OcrEngine for FixedEngine {
        fn version(&self) -> Result<String> {
            Ok(self.0.engine_version.clone())
        }

        fn recognize(&self, image: &SourceImage) -> Result<OcrOutput> {
            let mut output = self.0.clone();
            output.image_name = image.name().to_string();
            output.image_size = Some(image.dimensions());
            Ok(output)
        }
    }

    struct FailingEngine;

    impl OcrEngine for FailingEngine {
        fn version(&self) -> Result<String> {
            anyhow::bail!("no engine")
        }

        fn recognize(&self, _image: &SourceImage) -> Result<OcrOutput> {
            anyhow::bail!("failed loading language 'xyz'")
        }
    }

    fn fixed_output(text: &str, chars: &str) -> OcrOutput {
        OcrOutput {
            engine_version: "fixed".to_string(),
            image_name: String::new(),
            text: text.to_string(),
            glyphs: chars
                .chars()
                .enumerate()
                .map(|(i, c)| GlyphBox::new(c.to_string(), i as u32, 0))
                .collect(),
            image_size: None,
        }
    }

    fn write_image(dir: &Path) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("scan.png");
        image::RgbImage::new(40, 20).save(&path).unwrap();
        path
    }

    #[test]
    fn builds_document_from_engine_output() -> Result<()> {
        let dir = temp_output_dir("letterbox-pipeline-build");
        let image = write_image(&dir);
        let config = PipelineConfig::new(image);

        let result = build_document(&config, &FixedEngine(fixed_output("ab c", "abc")))?;
        assert_eq!(result.document.image_name, "scan.png");
        assert_eq!(result.document.image_size, Some((40, 20)));
        assert_eq!(result.document.lines[0].text(), "ab c");

        let _ = fs::remove_dir_all(&dir);
        Ok(())
    }

    #[test]
    fn lookahead_flows_from_config() -> Result<()> {
        let dir = temp_output_dir("letterbox-pipeline-lookahead");
        let image = write_image(&dir);
        let engine = FixedEngine(fixed_output("ab", "a.b"));

        let strict = build_document(&PipelineConfig::new(image.clone()), &engine)?;
        assert_eq!((strict.omitted(), strict.skipped()), (1, 0));

        let config = PipelineConfig::new(image).with_lookahead(2);
        let resync = build_document(&config, &engine)?;
        assert_eq!(resync.document.lines[0].text(), "ab");
        assert_eq!((resync.omitted(), resync.skipped()), (0, 1));

        let _ = fs::remove_dir_all(&dir);
        Ok(())
    }

    #[test]
    fn upstream_failure_propagates() {
        let dir = temp_output_dir("letterbox-pipeline-fail");
        let image = write_image(&dir);
        let config = PipelineConfig::new(image);

        let err = build_document(&config, &FailingEngine).unwrap_err();
        assert!(format!("{err:#}").contains("failed loading language"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn exhaustion_surfaces_as_error() {
        let reconciler = PositionalReconciler::new();
        let err = reconcile_output(&reconciler, &fixed_output("abc", "ab")).unwrap_err();
        assert!(format!("{err:#}").contains("box stream exhausted"));
    }

    #[test]
    fn export_document_writes_requested_formats() -> Result<()> {
        let output = temp_output_dir("letterbox-pipeline-export");
        let reconciliation =
            reconcile_output(&PositionalReconciler::new(), &fixed_output("hi", "hi"))?;

        export_document(
            &reconciliation,
            &output,
            &[ExportFormat::Json, ExportFormat::Html],
            &OverlayRenderer::new("."),
        )?;

        assert!(output.join("document.json").exists());
        assert!(output.join("mismatches.json").exists());
        assert!(output.join("overlay.html").exists());
        assert!(!output.join("layout.txt").exists());

        let _ = fs::remove_dir_all(&output);
        Ok(())
    }
}
