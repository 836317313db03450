pub mod align;

use tracing::debug;

use crate::core::error::ReconcileError;
use crate::core::model::{Document, OcrOutput};

pub use align::{align_lines, AlignmentResult, CharacterMismatch};

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub document: Document,
    pub mismatches: Vec<CharacterMismatch>,
}

impl Reconciliation {
    /// Text characters left out of the layout.
    pub fn omitted(&self) -> usize {
        self.mismatches.iter().filter(|m| m.is_omission()).count()
    }

    /// Box entries passed over while resynchronising.
    pub fn skipped(&self) -> usize {
        self.mismatches.len() - self.omitted()
    }
}

pub trait Reconciler {
    fn reconcile(&self, output: &OcrOutput) -> Result<Reconciliation, ReconcileError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalReconciler {
    lookahead: usize,
}

impl PositionalReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow resynchronising after a mismatch by skipping up to `lookahead`
    /// box entries. Zero keeps the strict one-box-per-character policy.
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }
}

impl Reconciler for PositionalReconciler {
    fn reconcile(&self, output: &OcrOutput) -> Result<Reconciliation, ReconcileError> {
        let aligned = align::align_lines(&output.text, &output.glyphs, self.lookahead)?;
        let document = Document {
            engine_version: output.engine_version.clone(),
            image_name: output.image_name.clone(),
            full_text: output.text.clone(),
            image_size: output.image_size,
            lines: aligned.lines,
        };
        debug!(
            image = %document.image_name,
            lines = document.lines.len(),
            characters = document.char_count(),
            omitted = aligned.mismatches.iter().filter(|m| m.is_omission()).count(),
            skipped = aligned.mismatches.iter().filter(|m| m.resynced).count(),
            "reconciled OCR output"
        );
        Ok(Reconciliation {
            document,
            mismatches: aligned.mismatches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{GlyphBox, RenderLine};
    use pretty_assertions::assert_eq;

    fn output(text: &str, glyphs: Vec<GlyphBox>) -> OcrOutput {
        OcrOutput {
            engine_version: "tesseract 5.3.0".to_string(),
            image_name: "scan.png".to_string(),
            text: text.to_string(),
            glyphs,
            image_size: Some((640, 480)),
        }
    }

    fn reconcile(text: &str, glyphs: Vec<GlyphBox>) -> Result<Reconciliation, ReconcileError> {
        PositionalReconciler::new().reconcile(&output(text, glyphs))
    }

    #[test]
    fn carries_metadata_through() {
        let result = reconcile("a", vec![GlyphBox::new("a", 3, 4)]).unwrap();
        let doc = result.document;
        assert_eq!(doc.engine_version, "tesseract 5.3.0");
        assert_eq!(doc.image_name, "scan.png");
        assert_eq!(doc.full_text, "a");
        assert_eq!(doc.image_size, Some((640, 480)));
        assert_eq!(doc.lines[0].characters[0].origin_y, 4);
    }

    #[test]
    fn end_to_end_two_lines() {
        let glyphs: Vec<GlyphBox> = "hibye"
            .chars()
            .enumerate()
            .map(|(i, c)| GlyphBox::new(c.to_string(), 10 * i as u32, 7 + i as u32))
            .collect();
        let doc = reconcile("hi\nbye", glyphs.clone()).unwrap().document;

        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[0].characters.len(), 2);
        assert_eq!(doc.lines[1].characters.len(), 3);

        let placed: Vec<(String, u32, u32)> = doc
            .lines
            .iter()
            .flat_map(|line| line.characters.iter())
            .map(|c| (c.glyph.clone(), c.origin_x, c.origin_y))
            .collect();
        let expected: Vec<(String, u32, u32)> = glyphs
            .iter()
            .map(|g| (g.character.clone(), g.origin_x, g.origin_y))
            .collect();
        assert_eq!(placed, expected);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        let doc = reconcile("", vec![]).unwrap().document;
        assert_eq!(doc.lines, vec![RenderLine::default()]);
    }

    #[test]
    fn trailing_line_break_keeps_empty_segment() {
        let doc = reconcile("a\n", vec![GlyphBox::new("a", 0, 0)])
            .unwrap()
            .document;
        assert_eq!(doc.lines.len(), 2);
        assert!(doc.lines[1].is_empty());
    }

    #[test]
    fn blank_lines_are_kept() {
        let glyphs = vec![GlyphBox::new("a", 0, 0), GlyphBox::new("b", 0, 0)];
        let doc = reconcile("a\n\n\nb", glyphs).unwrap().document;
        assert_eq!(doc.lines.len(), 4);
        assert!(doc.lines[1].is_empty() && doc.lines[2].is_empty());
    }

    #[test]
    fn line_of_spaces_is_empty() {
        let doc = reconcile("   ", vec![]).unwrap().document;
        assert_eq!(doc.lines.len(), 1);
        assert!(doc.lines[0].is_empty());
    }

    #[test]
    fn leading_spaces_are_dropped() {
        let doc = reconcile("  a", vec![GlyphBox::new("a", 1, 1)])
            .unwrap()
            .document;
        assert_eq!(doc.lines[0].characters[0].glyph, "a");
    }

    #[test]
    fn mismatch_omits_character() {
        let glyphs = vec![GlyphBox::new("a", 0, 0), GlyphBox::new("x", 9, 9)];
        let result = reconcile("ab", glyphs).unwrap();
        let line = &result.document.lines[0];
        assert_eq!(line.characters.len(), 1);
        assert_eq!(line.characters[0].glyph, "a");
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].expected, 'b');
        assert_eq!(result.mismatches[0].found, "x");
        assert_eq!((result.omitted(), result.skipped()), (1, 0));
    }

    #[test]
    fn exhaustion_is_fatal() {
        let err = reconcile("abc", vec![GlyphBox::new("a", 0, 0), GlyphBox::new("b", 0, 0)])
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::BoxStreamExhausted {
                character: 'c',
                consumed: 2,
                ..
            }
        ));
    }

    #[test]
    fn space_aggregation() {
        let doc = reconcile("a b", vec![GlyphBox::new("a", 1, 2), GlyphBox::new("b", 3, 4)])
            .unwrap()
            .document;
        let line = &doc.lines[0];
        assert_eq!(line.characters.len(), 2);
        assert_eq!(line.characters[0].glyph, "a ");
        assert_eq!((line.characters[0].origin_x, line.characters[0].origin_y), (1, 2));
        assert_eq!(line.characters[1].glyph, "b");
        assert_eq!((line.characters[1].origin_x, line.characters[1].origin_y), (3, 4));
    }

    #[test]
    fn reconciling_twice_is_idempotent() {
        let glyphs = vec![
            GlyphBox::new("o", 0, 0),
            GlyphBox::new("k", 5, 0),
            GlyphBox::new("?", 9, 0),
        ];
        let first = reconcile("o k\n!", glyphs.clone()).unwrap();
        let second = reconcile("o k\n!", glyphs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn lookahead_is_opt_in() {
        let glyphs = vec![
            GlyphBox::new("a", 0, 0),
            GlyphBox::new("'", 4, 0),
            GlyphBox::new("b", 8, 0),
        ];
        let strict = reconcile("ab", glyphs.clone()).unwrap();
        assert_eq!(strict.document.lines[0].text(), "a");
        assert_eq!((strict.omitted(), strict.skipped()), (1, 0));

        let resync = PositionalReconciler::new()
            .with_lookahead(2)
            .reconcile(&output("ab", glyphs))
            .unwrap();
        assert_eq!(resync.document.lines[0].text(), "ab");
        assert_eq!(resync.document.lines[0].characters[1].origin_x, 8);
        // 'b' was placed, so the stray apostrophe is the only thing reported
        assert_eq!((resync.omitted(), resync.skipped()), (0, 1));
    }
}
