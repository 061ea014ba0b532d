//! Font file rasterizer
//!
//! Rasterizes coverage bitmaps from TrueType/OpenType data with `fontdue` and converts them
//! to distance fields with [`SdfGenerator`].

use fontdue::{Font, FontSettings};

use super::rasterizer::{GlyphRasterizer, RasterizeError, RasterizedGlyph};
use super::sdf::SdfGenerator;
use crate::config::AtlasConfig;

/// Distance-field rasterizer backed by a loaded font
pub struct FontdueRasterizer {
    font: Font,
    font_family: String,
    font_size: f32,
    generator: SdfGenerator,
}

impl FontdueRasterizer {
    /// Load a font from raw file bytes using the size and padding of `config`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sdf_labels::config::AtlasConfig;
    /// use sdf_labels::text::FontdueRasterizer;
    ///
    /// let font_bytes = std::fs::read("resources/fonts/default.ttf")?;
    /// let rasterizer = FontdueRasterizer::from_bytes(&font_bytes, &AtlasConfig::default())?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_bytes(font_data: &[u8], config: &AtlasConfig) -> Result<Self, RasterizeError> {
        let settings = FontSettings {
            scale: config.font_size,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(font_data, settings)
            .map_err(|e| RasterizeError::Backend(format!("fontdue error: {e}")))?;

        let font_family = font
            .name()
            .map_or_else(|| config.font_family.clone(), str::to_string);
        log::info!("Loaded font {} at {}px", font_family, config.font_size);

        Ok(Self {
            font,
            font_family,
            font_size: config.font_size,
            generator: SdfGenerator::new(config.sdf_buffer(), config.sdf_radius()),
        })
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn rasterize(&mut self, character: char) -> Result<RasterizedGlyph, RasterizeError> {
        // Control characters such as line breaks get an empty glyph
        let (coverage, width, height, top, advance) = if character.is_control() {
            (Vec::new(), 0, 0, 0.0, 0.0)
        } else {
            if self.font.lookup_glyph_index(character) == 0 {
                return Err(RasterizeError::MissingGlyph(character));
            }
            let (metrics, coverage) = self.font.rasterize(character, self.font_size);
            (
                coverage,
                metrics.width as u32,
                metrics.height as u32,
                (metrics.ymin + metrics.height as i32) as f32,
                metrics.advance_width,
            )
        };

        let bitmap = self.generator.generate(&coverage, width, height);
        let (padded_width, padded_height) = self.generator.padded_size(width, height);

        Ok(RasterizedGlyph {
            bitmap,
            width: padded_width,
            height: padded_height,
            top_bearing: top,
            advance,
            padding: self.generator.buffer(),
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
    fn test_invalid_font_data() {
        let result = FontdueRasterizer::from_bytes(&[0, 1, 2, 3], &AtlasConfig::default());
        assert!(matches!(result, Err(RasterizeError::Backend(_))));
    }
}
