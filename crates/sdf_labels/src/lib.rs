//! # SDF Labels
//!
//! Signed-distance-field text labels for 3D scenes.
//!
//! ## Features
//!
//! - **Glyph Atlas**: Incremental SDF rasterization with row-shelf packing into a fixed bitmap
//! - **Text Layout**: Per-character draw boxes with explicit line breaks and glyph fallback
//! - **Label Pooling**: Recycled label instances with grow-only instanced attribute buffers
//! - **Backend Agnostic**: Materials are supplied by a factory per render backend
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sdf_labels::prelude::*;
//!
//! let mut pool = LabelPool::new(
//!     PoolConfig::default(),
//!     UniformMaterialFactory,
//!     Box::new(FixedGlyphRasterizer::default()),
//! );
//!
//! let mut label = pool.acquire();
//! label.set_text("Hello\nworld");
//! label.set_color(1.0, 1.0, 1.0, 1.0);
//! label.set_line_height(0.5);
//!
//! // Upload `label.instance_buffer().as_bytes()` and the atlas bitmap with the host renderer.
//!
//! pool.release(label);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod labels;
pub mod text;

#[cfg(test)]
mod tests;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{AtlasConfig, Config, ConfigError, LabelStyle, PoolConfig},
        events::{EventKind, LabelEvent},
        labels::{
            Label, LabelId, LabelMaterial, LabelPool, MaterialFactory, NodeMaterialFactory,
            UniformMaterialFactory,
        },
        text::{
            AtlasError, AtlasPacker, CharacterEntry, FixedGlyphRasterizer, GlyphRasterizer,
            LayoutResult, RasterizeError, RasterizedGlyph, REPLACEMENT_CHARACTER,
        },
    };
}
