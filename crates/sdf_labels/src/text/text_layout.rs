//! Text layout engine
//!
//! Converts a string into per-character draw boxes against the atlas metadata.
//!
//! # Layout Coordinate System
//!
//! - Origin (0, 0) is the top-left corner of the first line
//! - +X points right, +Y points down, one line advances by the atlas line height
//! - Units are atlas pixels

use super::font_atlas::{AtlasPacker, CharacterEntry};

/// Draw box of one laid-out character
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CharBox {
    /// Left edge of the character box
    pub left: f32,
    /// Top edge of the glyph bitmap
    pub top: f32,
    /// Top edge of the line box
    pub box_top: f32,
    /// Height of the line box
    pub box_height: f32,
    /// Glyph bitmap width
    pub width: f32,
    /// Glyph bitmap height
    pub height: f32,
    /// Horizontal advance, also the box width
    pub x_advance: f32,
    /// Glyph position in the atlas
    pub atlas_x: f32,
    /// Glyph position in the atlas
    pub atlas_y: f32,
}

/// Laid-out text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutResult {
    /// Widest line
    pub width: f32,
    /// Bottom of the last line containing a character
    pub height: f32,
    /// Character boxes in input order, line breaks excluded
    pub chars: Vec<CharBox>,
}

/// Lay out `text` against the atlas
///
/// Characters without an atlas entry use the replacement glyph. Line breaks only move the
/// cursor; they never contribute to the bounds.
pub fn layout(text: &str, atlas: &AtlasPacker) -> LayoutResult {
    let metrics = atlas.line_metrics();
    let line_height = metrics.line_height as f32;
    let fallback = atlas.replacement_entry();

    let mut result = LayoutResult {
        chars: Vec::with_capacity(text.len()),
        ..LayoutResult::default()
    };
    let mut x = 0.0f32;
    let mut line_top = 0.0f32;

    for character in text.chars() {
        if character == '\n' {
            line_top += line_height;
            x = 0.0;
            continue;
        }

        let entry: &CharacterEntry = atlas.entry(character).unwrap_or(&fallback);
        result.chars.push(CharBox {
            left: x,
            top: line_top - entry.y_offset + metrics.max_ascent,
            box_top: line_top,
            box_height: line_height,
            width: entry.width as f32,
            height: entry.height as f32,
            x_advance: entry.x_advance,
            atlas_x: entry.atlas_x as f32,
            atlas_y: entry.atlas_y as f32,
        });

        x += entry.x_advance;
        result.width = result.width.max(x);
        result.height = result.height.max(line_top + line_height);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AtlasConfig;
    use crate::text::rasterizer::{FixedGlyphRasterizer, GlyphBox};
    use crate::text::REPLACEMENT_CHARACTER;
    use approx::assert_relative_eq;

    fn uniform_atlas() -> AtlasPacker {
        let config = AtlasConfig::new().with_size(128, 128);
        AtlasPacker::new(
            &config,
            Box::new(FixedGlyphRasterizer::default().with_glyph_size(6, 10)),
        )
    }

    #[test]
    fn test_line_breaks() {
        let atlas = uniform_atlas();
        let result = atlas.layout("AB\nC");

        assert_eq!(result.chars.len(), 3);
        let (a, b, c) = (result.chars[0], result.chars[1], result.chars[2]);
        assert_relative_eq!(a.top, 0.0);
        assert_relative_eq!(b.top, 0.0);
        assert_relative_eq!(c.top, 10.0);
        assert_relative_eq!(b.left, 6.0);
        assert_relative_eq!(c.left, 0.0);
        assert_relative_eq!(result.width, 12.0);
        assert_relative_eq!(result.height, 20.0);
    }

    #[test]
    fn test_trailing_newline_does_not_grow_bounds() {
        let atlas = uniform_atlas();
        let result = atlas.layout("A\n\n");
        assert_relative_eq!(result.height, 10.0);
        assert_eq!(result.chars.len(), 1);
    }

    #[test]
    fn test_empty_text() {
        let atlas = uniform_atlas();
        assert_eq!(atlas.layout(""), LayoutResult::default());
    }

    #[test]
    fn test_unknown_character_falls_back() {
        let atlas = uniform_atlas();
        let result = atlas.layout("\u{4E16}");
        let replacement = atlas.entry(REPLACEMENT_CHARACTER).copied().unwrap();

        assert_eq!(result.chars.len(), 1);
        assert_relative_eq!(result.chars[0].atlas_x, replacement.atlas_x as f32);
        assert_relative_eq!(result.chars[0].atlas_y, replacement.atlas_y as f32);
        assert_relative_eq!(result.chars[0].x_advance, replacement.x_advance);
    }

    #[test]
    fn test_baseline_alignment() {
        let config = AtlasConfig::new().with_size(128, 128).with_ascii_prepopulation(false);
        let rasterizer = FixedGlyphRasterizer::default()
            .with_glyph_size(6, 10)
            .with_glyph('g', GlyphBox::new(6, 14).with_top_bearing(8.0));
        let mut atlas = AtlasPacker::new(&config, Box::new(rasterizer));
        atlas.ensure_characters("ag");

        let result = atlas.layout("ag");
        // Max ascent is 10 from the box glyphs; 'g' starts two pixels lower
        assert_relative_eq!(result.chars[0].top, 0.0);
        assert_relative_eq!(result.chars[1].top, 2.0);
        assert_relative_eq!(result.chars[1].box_height, 14.0);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let atlas = uniform_atlas();
        assert_eq!(atlas.layout("hello\nworld"), atlas.layout("hello\nworld"));
    }
}
