use std::fmt::Write as _;

use crate::core::model::{Document, RenderChar};

const PAGE_STYLE: &str = r#"html {
  -webkit-user-select: none;
  -moz-user-select: none;
  -ms-user-select: none;
  user-select: none;
}
.selectable, .selectable div {
  -webkit-user-select: all;
  -moz-user-select: all;
  -ms-user-select: all;
  user-select: all;
}
#imageBase { position: relative; }
#imageBase img { display: block; }
.character {
  position: absolute;
  display: inline;
  white-space: pre;
  color: red;
  font-weight: bold;
  background-color: rgba(255, 255, 255, 0.8);
}"#;

/// Turns a reconciled [`Document`] into an HTML page that lays each
/// character over the source image.
///
/// Built once at startup and shared; rendering does not mutate it.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    files_prefix: String,
    title: String,
}

impl OverlayRenderer {
    pub fn new(files_prefix: impl Into<String>) -> Self {
        Self {
            files_prefix: files_prefix.into().trim_end_matches('/').to_string(),
            title: "letterbox".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn image_src(&self, image_name: &str) -> String {
        if self.files_prefix.is_empty() {
            image_name.to_string()
        } else {
            format!("{}/{}", self.files_prefix, image_name)
        }
    }

    pub fn render(&self, document: &Document) -> String {
        let mut lines_html = String::new();
        for line in &document.lines {
            lines_html.push_str("<div class='line'>\n");
            for character in &line.characters {
                lines_html.push_str(&character_div(character));
                lines_html.push('\n');
            }
            lines_html.push_str("</div>\n");
        }

        let base_style = document
            .image_size
            .map(|(w, h)| format!(" style='width: {w}px; height: {h}px;'"))
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<title>{title}</title>
<style>
{style}
</style>
</head>
<body>
<div id='info'>
Engine version: {version}<br/>
Displaying image: {image_name}<br/>
</div>
<div id='imageBase'{base_style}>
<img src='{image_src}' />
<div id='lines' class='selectable'>
{lines}</div>
</div>
</body>
</html>
"#,
            title = html_escape::encode_text(&self.title),
            style = PAGE_STYLE,
            version = html_escape::encode_text(&document.engine_version),
            image_name = html_escape::encode_text(&document.image_name),
            base_style = base_style,
            image_src =
                html_escape::encode_single_quoted_attribute(&self.image_src(&document.image_name)),
            lines = lines_html,
        )
    }
}

fn character_div(character: &RenderChar) -> String {
    format!(
        "<div class='character character-{class}' style='bottom: {y}px; left: {x}px;'>{glyph}</div>",
        class = class_suffix(character.character()),
        y = character.origin_y,
        x = character.origin_x,
        glyph = html_escape::encode_text(&character.glyph),
    )
}

/// CSS-safe class suffix: ASCII alphanumerics pass through, anything else
/// becomes `u<hex>`.
fn class_suffix(glyph: &str) -> String {
    let mut out = String::new();
    for c in glyph.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            let _ = write!(out, "u{:x}", c as u32);
        }
    }
    out
}
