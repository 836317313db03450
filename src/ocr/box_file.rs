use anyhow::{Context, Result};

use crate::core::model::GlyphBox;

/// Parse Tesseract box output: `<glyph> <left> <bottom> <right> <top> <page>` per line.
///
/// The glyph is everything before the last five fields, so multi-byte
/// characters survive intact. Only the bottom-left corner is kept.
pub fn parse_box_file(contents: &str) -> Result<Vec<GlyphBox>> {
    let mut glyphs = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let glyph = parse_box_line(line)
            .with_context(|| format!("invalid box line {}: {line:?}", idx + 1))?;
        glyphs.push(glyph);
    }

    Ok(glyphs)
}

fn parse_box_line(line: &str) -> Result<GlyphBox> {
    let fields: Vec<&str> = line.rsplitn(6, ' ').collect();
    if fields.len() != 6 {
        anyhow::bail!("expected 6 fields, found {}", fields.len());
    }

    let character = fields[5];
    if character.is_empty() {
        anyhow::bail!("missing glyph");
    }

    let origin_x: u32 = fields[4]
        .parse()
        .with_context(|| format!("bad left coordinate {:?}", fields[4]))?;
    let origin_y: u32 = fields[3]
        .parse()
        .with_context(|| format!("bad bottom coordinate {:?}", fields[3]))?;
    for (name, value) in [("right", fields[2]), ("top", fields[1]), ("page", fields[0])] {
        value
            .parse::<u32>()
            .with_context(|| format!("bad {name} field {value:?}"))?;
    }

    Ok(GlyphBox::new(character, origin_x, origin_y))
}
