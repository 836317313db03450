use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::ReconcileError;
use crate::core::model::{GlyphBox, RenderChar, RenderLine};

/// A text character whose box entry disagreed with it.
///
/// `line` and `column` are 1-based; `column` counts characters, spaces
/// included. `resynced` is set when a later box matched within the
/// lookahead window: the character was placed and this entry was only
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterMismatch {
    pub line: usize,
    pub column: usize,
    pub expected: char,
    pub found: String,
    pub box_index: usize,
    pub resynced: bool,
}

impl CharacterMismatch {
    /// True when the text character is missing from the layout.
    pub fn is_omission(&self) -> bool {
        !self.resynced
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub lines: Vec<RenderLine>,
    pub mismatches: Vec<CharacterMismatch>,
}

/// Single forward cursor over the box stream, shared by every line.
struct BoxCursor<'a> {
    glyphs: &'a [GlyphBox],
    pos: usize,
}

impl<'a> BoxCursor<'a> {
    fn new(glyphs: &'a [GlyphBox]) -> Self {
        Self { glyphs, pos: 0 }
    }

    fn next(&mut self) -> Option<(usize, &'a GlyphBox)> {
        let glyphs = self.glyphs;
        let idx = self.pos;
        let glyph = glyphs.get(idx)?;
        self.pos += 1;
        Some((idx, glyph))
    }

    /// Index of the first upcoming box within `window` entries that matches `c`.
    fn find_ahead(&self, c: char, window: usize) -> Option<usize> {
        let end = self.pos.saturating_add(window).min(self.glyphs.len());
        (self.pos..end).find(|&idx| self.glyphs[idx].matches(c))
    }

    fn consumed(&self) -> usize {
        self.pos
    }
}

/// Walk the text and the box stream in lockstep.
///
/// Spaces are folded into the preceding character of the same line. Every
/// other character takes the next box entry whether or not it matches. With
/// `lookahead > 0`, a mismatch may skip up to `lookahead` further entries to
/// find one that matches; skipped entries are reported and never revisited.
pub fn align_lines(
    full_text: &str,
    glyphs: &[GlyphBox],
    lookahead: usize,
) -> Result<AlignmentResult, ReconcileError> {
    let mut cursor = BoxCursor::new(glyphs);
    let mut lines = Vec::new();
    let mut mismatches = Vec::new();

    for (line_idx, segment) in full_text.split('\n').enumerate() {
        let segment = segment.strip_suffix('\r').unwrap_or(segment);
        let mut line = RenderLine::default();

        for (col_idx, c) in segment.chars().enumerate() {
            if c == ' ' {
                if let Some(last) = line.characters.last_mut() {
                    last.glyph.push(' ');
                }
                continue;
            }

            let Some((box_index, glyph)) = cursor.next() else {
                return Err(ReconcileError::BoxStreamExhausted {
                    line: line_idx + 1,
                    column: col_idx + 1,
                    character: c,
                    consumed: cursor.consumed(),
                });
            };

            if glyph.matches(c) {
                line.characters.push(RenderChar::from_box(c, glyph));
                continue;
            }

            let hit = if lookahead > 0 {
                cursor.find_ahead(c, lookahead)
            } else {
                None
            };
            let resynced = hit.is_some();

            let mut mismatch = |box_index: usize, found: &GlyphBox| {
                if resynced {
                    warn!(
                        line = line_idx + 1,
                        column = col_idx + 1,
                        expected = %c,
                        found = %found.character,
                        box_index,
                        "skipping box entry to resynchronise"
                    );
                } else {
                    warn!(
                        line = line_idx + 1,
                        column = col_idx + 1,
                        expected = %c,
                        found = %found.character,
                        box_index,
                        "character mismatch, omitting character"
                    );
                }
                mismatches.push(CharacterMismatch {
                    line: line_idx + 1,
                    column: col_idx + 1,
                    expected: c,
                    found: found.character.clone(),
                    box_index,
                    resynced,
                });
            };

            mismatch(box_index, glyph);

            if let Some(hit) = hit {
                while let Some((skipped_idx, skipped)) = cursor.next() {
                    if skipped_idx == hit {
                        line.characters.push(RenderChar::from_box(c, skipped));
                        break;
                    }
                    mismatch(skipped_idx, skipped);
                }
            }
        }

        lines.push(line);
    }

    Ok(AlignmentResult { lines, mismatches })
}
