use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::export::Exporter;
use crate::reconcile::{CharacterMismatch, Reconciliation};

pub const DOCUMENT_FILE: &str = "document.json";
pub const MISMATCHES_FILE: &str = "mismatches.json";

/// Body of `mismatches.json`.
#[derive(Debug, Serialize)]
struct MismatchReport<'a> {
    image_name: &'a str,
    omitted: usize,
    skipped: usize,
    mismatches: &'a [CharacterMismatch],
}

/// Writes the layout to `document.json` and every text/box disagreement
/// found while building it to `mismatches.json`.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let data = serde_json::to_string_pretty(value)?;
        fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
    }
}

impl Exporter for JsonExporter {
    fn export(&self, reconciliation: &Reconciliation) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        Self::write_json(&self.out_dir.join(DOCUMENT_FILE), &reconciliation.document)?;

        let report = MismatchReport {
            image_name: &reconciliation.document.image_name,
            omitted: reconciliation.omitted(),
            skipped: reconciliation.skipped(),
            mismatches: &reconciliation.mismatches,
        };
        Self::write_json(&self.out_dir.join(MISMATCHES_FILE), &report)
    }
}
