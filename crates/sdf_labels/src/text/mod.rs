//! Glyph atlas and text layout
//!
//! Characters are rasterized on first use, converted to signed distance fields and packed
//! into a single fixed-size atlas bitmap. Layout turns strings into per-character draw boxes
//! against the atlas metadata.

pub mod font_atlas;
pub mod rasterizer;
pub mod sdf;
pub mod text_layout;

#[cfg(feature = "fontdue")]
pub mod fontdue_rasterizer;

pub use font_atlas::{
    AtlasBitmap, AtlasError, AtlasPacker, CharacterEntry, LineMetrics, PackOutcome,
};
pub use rasterizer::{
    FixedGlyphRasterizer, GlyphBox, GlyphRasterizer, RasterizeError, RasterizedGlyph,
};
pub use sdf::SdfGenerator;
pub use text_layout::{CharBox, LayoutResult};

#[cfg(feature = "fontdue")]
pub use fontdue_rasterizer::FontdueRasterizer;

/// Fallback glyph for characters that are not in the atlas
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';
