use serde::{Deserialize, Serialize};

/// One non-space character reported by the engine's box pass.
///
/// Coordinates are in image pixels with the origin at the bottom-left
/// corner, the way Tesseract writes box files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphBox {
    pub character: String,
    pub origin_x: u32,
    pub origin_y: u32,
}

impl GlyphBox {
    pub fn new(character: impl Into<String>, origin_x: u32, origin_y: u32) -> Self {
        Self {
            character: character.into(),
            origin_x,
            origin_y,
        }
    }

    pub fn matches(&self, c: char) -> bool {
        let mut chars = self.character.chars();
        chars.next() == Some(c) && chars.next().is_none()
    }
}

/// Everything the OCR collaborator hands over for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOutput {
    pub engine_version: String,
    pub image_name: String,
    pub text: String,
    pub glyphs: Vec<GlyphBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderChar {
    /// The recognized character followed by any spaces absorbed after it.
    pub glyph: String,
    pub origin_x: u32,
    pub origin_y: u32,
}

impl RenderChar {
    pub fn from_box(c: char, glyph_box: &GlyphBox) -> Self {
        Self {
            glyph: c.to_string(),
            origin_x: glyph_box.origin_x,
            origin_y: glyph_box.origin_y,
        }
    }

    /// The glyph without the absorbed trailing spaces.
    pub fn character(&self) -> &str {
        self.glyph.trim_end_matches(' ')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderLine {
    pub characters: Vec<RenderChar>,
}

impl RenderLine {
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn text(&self) -> String {
        self.characters
            .iter()
            .map(|c| c.glyph.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub engine_version: String,
    pub image_name: String,
    pub full_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<(u32, u32)>,
    pub lines: Vec<RenderLine>,
}

impl Document {
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|line| line.characters.len()).sum()
    }
}
