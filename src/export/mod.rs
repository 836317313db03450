pub mod html_export;
pub mod json_export;
pub mod overlay;
pub mod text_export;

use anyhow::Result;

use crate::reconcile::Reconciliation;

pub use html_export::HtmlExporter;
pub use json_export::JsonExporter;
pub use overlay::OverlayRenderer;
pub use text_export::TextExporter;

/// Writes one artifact of a reconciled page into an output directory.
pub trait Exporter {
    fn export(&self, reconciliation: &Reconciliation) -> Result<()>;
}
