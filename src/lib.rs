pub mod core;
pub mod export;
pub mod ocr;
pub mod pipeline;
pub mod reconcile;
pub mod server;

pub use crate::core::error::ReconcileError;
pub use crate::core::model::{Document, GlyphBox, OcrOutput, RenderChar, RenderLine};
pub use reconcile::{PositionalReconciler, Reconciler, Reconciliation};
