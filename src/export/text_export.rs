use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::Document;
use crate::export::Exporter;
use crate::reconcile::Reconciliation;

/// Writes the placed characters back out as plain text, one line per
/// layout line. Characters dropped during reconciliation are absent, so
/// diffing this against the recognized text shows what was lost.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn format_document(document: &Document) -> String {
        document
            .lines
            .iter()
            .map(|line| line.text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Exporter for TextExporter {
    fn export(&self, reconciliation: &Reconciliation) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let text = Self::format_document(&reconciliation.document);
        fs::write(self.out_dir.join("layout.txt"), text)?;
        Ok(())
    }
}
