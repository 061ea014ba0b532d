//! Glyph rasterization contract
//!
//! The atlas treats rasterization as a deterministic function from a character to a
//! distance-field bitmap plus metrics. Font size and family are construction parameters of
//! the rasterizer.

use std::collections::{HashMap, HashSet};

/// Errors produced while rasterizing a single glyph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterizeError {
    /// The font has no glyph for the character
    #[error("No glyph available for {0:?}")]
    MissingGlyph(char),

    /// Bitmap length does not match its reported dimensions
    #[error("Bitmap for {character:?} has {actual} bytes, expected {expected}")]
    BitmapSize {
        /// Character being rasterized
        character: char,
        /// `width * height`
        expected: usize,
        /// Actual bitmap length
        actual: usize,
    },

    /// Font loading or backend failure
    #[error("Rasterizer backend error: {0}")]
    Backend(String),
}

/// Distance-field bitmap and metrics for one character
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    /// Row-major bitmap, one byte per pixel
    pub bitmap: Vec<u8>,
    /// Bitmap width in pixels, padding included
    pub width: u32,
    /// Bitmap height in pixels, padding included
    pub height: u32,
    /// Distance from the top of the bitmap to the baseline
    pub top_bearing: f32,
    /// Natural horizontal advance of the glyph
    pub advance: f32,
    /// Distance-field padding on each side of the bitmap
    pub padding: u32,
}

impl RasterizedGlyph {
    /// Check that the bitmap length matches `width * height`
    pub fn validate(&self, character: char) -> Result<(), RasterizeError> {
        let expected = self.width as usize * self.height as usize;
        if self.bitmap.len() == expected {
            Ok(())
        } else {
            Err(RasterizeError::BitmapSize {
                character,
                expected,
                actual: self.bitmap.len(),
            })
        }
    }

    /// Horizontal advance used for layout
    ///
    /// Wide glyphs advance by their padded width less one padding so neighbouring quads
    /// never overlap; whitespace keeps its natural advance.
    pub fn layout_advance(&self) -> f32 {
        self.advance
            .max(self.width as f32 - self.padding as f32)
    }
}

/// Converts characters to distance-field bitmaps
pub trait GlyphRasterizer {
    /// Rasterize one character
    fn rasterize(&mut self, character: char) -> Result<RasterizedGlyph, RasterizeError>;

    /// Font family used by this rasterizer
    fn font_family(&self) -> &str;

    /// Font size in pixels
    fn font_size(&self) -> f32;
}

/// Metrics of a box glyph produced by [`FixedGlyphRasterizer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphBox {
    /// Bitmap width, padding included
    pub width: u32,
    /// Bitmap height, padding included
    pub height: u32,
    /// Distance from the bitmap top to the baseline
    pub top_bearing: f32,
    /// Natural advance
    pub advance: f32,
}

impl GlyphBox {
    /// A box whose baseline sits at its bottom edge
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            top_bearing: height as f32,
            advance: width as f32,
        }
    }

    /// Override the top bearing
    pub fn with_top_bearing(mut self, top_bearing: f32) -> Self {
        self.top_bearing = top_bearing;
        self
    }

    /// Override the advance
    pub fn with_advance(mut self, advance: f32) -> Self {
        self.advance = advance;
        self
    }
}

/// Deterministic rasterizer producing solid boxes
///
/// Used for headless runs and tests where no font file is available. Every character gets
/// the same box unless overridden; whitespace produces an empty bitmap.
#[derive(Debug, Clone)]
pub struct FixedGlyphRasterizer {
    font_family: String,
    font_size: f32,
    padding: u32,
    default_box: GlyphBox,
    overrides: HashMap<char, GlyphBox>,
    failures: HashSet<char>,
}

impl FixedGlyphRasterizer {
    /// Box glyphs approximating a monospace font at `font_size` pixels
    pub fn for_font_size(font_size: f32) -> Self {
        let padding = (font_size / 16.0).ceil().max(0.0) as u32;
        let glyph_width = (font_size * 0.6).ceil().max(0.0) as u32;
        let glyph_height = font_size.ceil().max(0.0) as u32;
        let default_box = GlyphBox::new(glyph_width + 2 * padding, glyph_height + 2 * padding)
            .with_top_bearing((font_size * 0.8).ceil() + padding as f32)
            .with_advance(font_size * 0.6);

        Self {
            font_family: "monospace".to_string(),
            font_size,
            padding,
            default_box,
            overrides: HashMap::new(),
            failures: HashSet::new(),
        }
    }

    /// Use the same box for every character
    pub fn with_glyph_size(mut self, width: u32, height: u32) -> Self {
        self.default_box = GlyphBox::new(width, height);
        self
    }

    /// Set the padding reported with every glyph
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Use a specific box for one character
    pub fn with_glyph(mut self, character: char, glyph: GlyphBox) -> Self {
        self.overrides.insert(character, glyph);
        self
    }

    /// Report a missing glyph for one character
    pub fn with_missing_glyph(mut self, character: char) -> Self {
        self.failures.insert(character);
        self
    }

    /// Set the reported font family
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Byte written to every pixel of a character's bitmap
    pub fn fill_value(character: char) -> u8 {
        if character.is_whitespace() {
            0
        } else {
            (u32::from(character) % 254) as u8 + 1
        }
    }
}

impl Default for FixedGlyphRasterizer {
    fn default() -> Self {
        Self::for_font_size(48.0)
    }
}

impl GlyphRasterizer for FixedGlyphRasterizer {
    fn rasterize(&mut self, character: char) -> Result<RasterizedGlyph, RasterizeError> {
        if self.failures.contains(&character) {
            return Err(RasterizeError::MissingGlyph(character));
        }

        let glyph = self
            .overrides
            .get(&character)
            .copied()
            .unwrap_or(self.default_box);
        let fill = Self::fill_value(character);

        Ok(RasterizedGlyph {
            bitmap: vec![fill; glyph.width as usize * glyph.height as usize],
            width: glyph.width,
            height: glyph.height,
            top_bearing: glyph.top_bearing,
            advance: glyph.advance,
            padding: self.padding,
        })
    }

    fn font_family(&self) -> &str {
        &self.font_family
    }

    fn font_size(&self) -> f32 {
        self.font_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_box_includes_padding() {
        let mut rasterizer = FixedGlyphRasterizer::default();
        let glyph = rasterizer.rasterize('A').unwrap();

        assert_eq!(glyph.padding, 3);
        assert_eq!(glyph.width, 29 + 6);
        assert_eq!(glyph.height, 48 + 6);
        assert!(glyph.validate('A').is_ok());
        assert!(glyph.bitmap.iter().all(|&b| b == FixedGlyphRasterizer::fill_value('A')));
    }

    #[test]
    fn test_whitespace_is_blank() {
        let mut rasterizer = FixedGlyphRasterizer::default();
        let glyph = rasterizer.rasterize(' ').unwrap();
        assert!(glyph.bitmap.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_overrides_and_failures() {
        let mut rasterizer = FixedGlyphRasterizer::default()
            .with_glyph('W', GlyphBox::new(10, 20).with_top_bearing(15.0))
            .with_missing_glyph('?');

        let wide = rasterizer.rasterize('W').unwrap();
        assert_eq!((wide.width, wide.height, wide.top_bearing), (10, 20, 15.0));
        assert_eq!(rasterizer.rasterize('?'), Err(RasterizeError::MissingGlyph('?')));
    }

    #[test]
    fn test_layout_advance_widening() {
        let glyph = RasterizedGlyph {
            bitmap: vec![0; 20 * 10],
            width: 20,
            height: 10,
            top_bearing: 8.0,
            advance: 12.0,
            padding: 3,
        };
        assert_eq!(glyph.layout_advance(), 17.0);

        let space = RasterizedGlyph { advance: 30.0, ..glyph };
        assert_eq!(space.layout_advance(), 30.0);
    }

    #[test]
    fn test_bitmap_size_mismatch() {
        let glyph = RasterizedGlyph {
            bitmap: vec![0; 5],
            width: 2,
            height: 2,
            top_bearing: 0.0,
            advance: 0.0,
            padding: 0,
        };
        assert_eq!(
            glyph.validate('x'),
            Err(RasterizeError::BitmapSize { character: 'x', expected: 4, actual: 5 })
        );
    }
}
