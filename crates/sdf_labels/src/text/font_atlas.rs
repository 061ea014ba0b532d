//! Glyph atlas packing
//!
//! The atlas owns a fixed-size single-channel bitmap and packs each newly seen character
//! into it with a row-shelf allocator. Entries are never moved or evicted once written.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::rasterizer::{GlyphRasterizer, RasterizeError, RasterizedGlyph};
use super::text_layout::{self, LayoutResult};
use super::REPLACEMENT_CHARACTER;
use crate::config::AtlasConfig;

/// Errors reported while packing characters
///
/// None of these are fatal: the affected character falls back to the replacement glyph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AtlasError {
    /// The atlas has no room left for the character
    #[error("Unable to fit all {seen} characters in font atlas")]
    Overflow {
        /// Character that could not be placed
        character: char,
        /// Distinct characters seen so far, this one included
        seen: usize,
    },

    /// An entry for the character already exists
    #[error("Character {0:?} is already packed")]
    DuplicateCharacter(char),

    /// The rasterizer failed for the character
    #[error("Failed to rasterize {character:?}: {source}")]
    Rasterization {
        /// Character that could not be rasterized
        character: char,
        /// Rasterizer failure
        source: RasterizeError,
    },
}

impl AtlasError {
    /// Character the error refers to
    pub fn character(&self) -> char {
        match self {
            Self::Overflow { character, .. } | Self::Rasterization { character, .. } => *character,
            Self::DuplicateCharacter(character) => *character,
        }
    }
}

/// Placement and metrics of a packed character
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CharacterEntry {
    /// Left edge in the atlas bitmap
    pub atlas_x: u32,
    /// Top edge in the atlas bitmap
    pub atlas_y: u32,
    /// Bitmap width
    pub width: u32,
    /// Bitmap height
    pub height: u32,
    /// Top bearing: distance from the bitmap top to the baseline
    pub y_offset: f32,
    /// Horizontal advance used by layout
    pub x_advance: f32,
}

/// Atlas-wide line metrics
///
/// Both values only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineMetrics {
    /// Height of one text line in atlas pixels
    pub line_height: u32,
    /// Largest top bearing of any packed glyph
    pub max_ascent: f32,
}

/// Fixed-size single-channel atlas bitmap
#[derive(Clone, PartialEq, Eq)]
pub struct AtlasBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AtlasBitmap {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixel data
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pixel value, or `None` outside the bitmap
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    fn blit(&mut self, x: u32, y: u32, glyph: &RasterizedGlyph) {
        let row_len = glyph.width as usize;
        for (r, row) in glyph.bitmap.chunks_exact(row_len.max(1)).enumerate() {
            let start = (y as usize + r) * self.width as usize + x as usize;
            self.data[start..start + row_len].copy_from_slice(&row[..row_len]);
        }
    }
}

impl fmt::Debug for AtlasBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtlasBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Result of one [`AtlasPacker::ensure_characters`] call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackOutcome {
    /// Characters placed by this call, in input order
    pub placed: Vec<char>,
    /// Failures, in input order
    pub errors: Vec<AtlasError>,
}

impl PackOutcome {
    /// At least one character was placed
    pub fn atlas_changed(&self) -> bool {
        !self.placed.is_empty()
    }

    /// Number of characters that did not fit
    pub fn overflow_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, AtlasError::Overflow { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ShelfCursor {
    x: u32,
    y: u32,
    row_height: u32,
}

/// Incremental glyph atlas
pub struct AtlasPacker {
    bitmap: AtlasBitmap,
    alphabet: HashSet<char>,
    entries: HashMap<char, CharacterEntry>,
    cursor: ShelfCursor,
    metrics: LineMetrics,
    rasterizer: Box<dyn GlyphRasterizer>,
    generation: u64,
}

impl AtlasPacker {
    /// Create an atlas and pack the replacement glyph, plus newline and printable ASCII when
    /// `config.prepopulate_ascii` is set
    pub fn new(config: &AtlasConfig, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        let mut packer = Self {
            bitmap: AtlasBitmap::new(config.width, config.height),
            alphabet: HashSet::new(),
            entries: HashMap::new(),
            cursor: ShelfCursor::default(),
            metrics: LineMetrics::default(),
            rasterizer,
            generation: 0,
        };

        let mut initial = String::from(REPLACEMENT_CHARACTER);
        if config.prepopulate_ascii {
            initial.push('\n');
            initial.extend(' '..='~');
        }

        let outcome = packer.ensure_characters(&initial);
        for error in &outcome.errors {
            log::warn!("Font atlas construction: {error}");
        }

        log::info!(
            "Created {}x{} font atlas ({} {}px, {} glyphs)",
            config.width,
            config.height,
            packer.rasterizer.font_family(),
            packer.rasterizer.font_size(),
            packer.entries.len()
        );
        packer
    }

    /// Pack every character of `text` that has not been seen before
    ///
    /// Characters that fail to rasterize or fit are still recorded as seen and are never
    /// retried. Failures do not stop the rest of the batch.
    pub fn ensure_characters(&mut self, text: &str) -> PackOutcome {
        let mut outcome = PackOutcome::default();

        for character in text.chars() {
            if !self.alphabet.insert(character) {
                continue;
            }

            let glyph = match self.rasterize(character) {
                Ok(glyph) => glyph,
                Err(error) => {
                    outcome.errors.push(error);
                    continue;
                }
            };

            match self.place_glyph(character, &glyph) {
                Ok(_) => outcome.placed.push(character),
                Err(error) => outcome.errors.push(error),
            }
        }

        if outcome.atlas_changed() {
            self.generation += 1;
            log::debug!(
                "Packed {} characters into font atlas ({} total)",
                outcome.placed.len(),
                self.entries.len()
            );
        }

        outcome
    }

    fn rasterize(&mut self, character: char) -> Result<RasterizedGlyph, AtlasError> {
        self.rasterizer
            .rasterize(character)
            .and_then(|glyph| glyph.validate(character).map(|()| glyph))
            .map_err(|source| AtlasError::Rasterization { character, source })
    }

    fn place_glyph(
        &mut self,
        character: char,
        glyph: &RasterizedGlyph,
    ) -> Result<CharacterEntry, AtlasError> {
        if self.entries.contains_key(&character) {
            return Err(AtlasError::DuplicateCharacter(character));
        }

        let overflow = AtlasError::Overflow {
            character,
            seen: self.alphabet.len(),
        };
        let (width, height) = (glyph.width, glyph.height);
        if width >= self.bitmap.width || height >= self.bitmap.height {
            return Err(overflow);
        }

        if self.cursor.x + width >= self.bitmap.width {
            self.cursor.x = 0;
            self.cursor.y += self.cursor.row_height;
            self.cursor.row_height = 0;
        }
        if self.cursor.y + height >= self.bitmap.height {
            return Err(overflow);
        }

        let (x, y) = (self.cursor.x, self.cursor.y);
        self.bitmap.blit(x, y, glyph);

        let entry = CharacterEntry {
            atlas_x: x,
            atlas_y: y,
            width,
            height,
            y_offset: glyph.top_bearing,
            x_advance: glyph.layout_advance(),
        };
        self.entries.insert(character, entry);

        self.cursor.row_height = self.cursor.row_height.max(height);
        self.cursor.x += width;
        self.metrics.line_height = self.metrics.line_height.max(self.cursor.row_height);
        self.metrics.max_ascent = self.metrics.max_ascent.max(glyph.top_bearing);

        Ok(entry)
    }

    /// Lay out `text` against the current atlas contents
    pub fn layout(&self, text: &str) -> LayoutResult {
        text_layout::layout(text, self)
    }

    /// Entry for a packed character
    pub fn entry(&self, character: char) -> Option<&CharacterEntry> {
        self.entries.get(&character)
    }

    /// Entry used for characters without their own, all zero if the replacement glyph
    /// itself could not be packed
    pub fn replacement_entry(&self) -> CharacterEntry {
        self.entries
            .get(&REPLACEMENT_CHARACTER)
            .copied()
            .unwrap_or_default()
    }

    /// The character has an atlas entry
    pub fn contains(&self, character: char) -> bool {
        self.entries.contains_key(&character)
    }

    /// The character was processed before, whether or not it was placed
    pub fn has_seen(&self, character: char) -> bool {
        self.alphabet.contains(&character)
    }

    /// Iterate over all packed characters and their entries
    pub fn entries(&self) -> impl Iterator<Item = (char, &CharacterEntry)> {
        self.entries.iter().map(|(c, e)| (*c, e))
    }

    /// Number of packed characters
    pub fn glyph_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct characters processed
    pub fn seen_count(&self) -> usize {
        self.alphabet.len()
    }

    /// Current line metrics
    pub fn line_metrics(&self) -> LineMetrics {
        self.metrics
    }

    /// Atlas bitmap
    pub fn bitmap(&self) -> &AtlasBitmap {
        &self.bitmap
    }

    /// Atlas width in pixels
    pub fn width(&self) -> u32 {
        self.bitmap.width
    }

    /// Atlas height in pixels
    pub fn height(&self) -> u32 {
        self.bitmap.height
    }

    /// Incremented whenever characters are placed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Save the atlas bitmap as a grayscale image for debugging
    pub fn save_debug_image(&self, path: &str) -> Result<(), image::ImageError> {
        let image = image::GrayImage::from_raw(
            self.bitmap.width,
            self.bitmap.height,
            self.bitmap.data.clone(),
        )
        .ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;

        image.save(path)?;
        log::info!(
            "Saved {}x{} font atlas to {path}",
            self.bitmap.width,
            self.bitmap.height
        );
        Ok(())
    }
}

impl fmt::Debug for AtlasPacker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtlasPacker")
            .field("bitmap", &self.bitmap)
            .field("glyphs", &self.entries.len())
            .field("seen", &self.alphabet.len())
            .field("metrics", &self.metrics)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
