use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::export::overlay::OverlayRenderer;
use crate::export::Exporter;
use crate::reconcile::Reconciliation;

/// Writes `overlay.html`. The page expects the source image to be
/// reachable under the renderer's files prefix.
#[derive(Debug, Clone)]
pub struct HtmlExporter {
    out_dir: PathBuf,
    renderer: OverlayRenderer,
}

impl HtmlExporter {
    pub fn new(out_dir: PathBuf, renderer: OverlayRenderer) -> Self {
        Self { out_dir, renderer }
    }
}

impl Exporter for HtmlExporter {
    fn export(&self, reconciliation: &Reconciliation) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let html = self.renderer.render(&reconciliation.document);
        fs::write(self.out_dir.join("overlay.html"), html)?;
        Ok(())
    }
}
