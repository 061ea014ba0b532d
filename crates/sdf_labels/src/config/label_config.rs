//! Atlas, label and pool configuration

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// # Atlas Configuration
///
/// Fixed atlas bitmap dimensions and the font parameters handed to the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Atlas bitmap width in pixels
    pub width: u32,
    /// Atlas bitmap height in pixels
    pub height: u32,
    /// Font size in pixels used for rasterization
    pub font_size: f32,
    /// Font family name reported by the rasterizer
    pub font_family: String,
    /// Pack space..tilde and newline at construction
    pub prepopulate_ascii: bool,
}

impl AtlasConfig {
    /// Create an atlas configuration with the default 1024x1024 bitmap
    pub fn new() -> Self {
        Self {
            width: 1024,
            height: 1024,
            font_size: 48.0,
            font_family: "monospace".to_string(),
            prepopulate_ascii: true,
        }
    }

    /// Set the atlas bitmap dimensions
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the rasterization font size
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Set the font family
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Enable or disable packing of the printable ASCII range at construction
    pub fn with_ascii_prepopulation(mut self, enabled: bool) -> Self {
        self.prepopulate_ascii = enabled;
        self
    }

    /// Padding around each glyph bitmap, in pixels
    pub fn sdf_buffer(&self) -> u32 {
        (self.font_size / 16.0).ceil().max(0.0) as u32
    }

    /// Maximum distance encoded by the distance field, in pixels
    pub fn sdf_radius(&self) -> f32 {
        (self.font_size / 4.0).ceil()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "atlas size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Label Style
///
/// Visual parameters applied to a label. Colors are linear RGBA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    /// Height of one text line in world units
    pub line_height: f32,
    /// Text color
    pub color: [f32; 4],
    /// Background color of each character box
    pub background_color: [f32; 4],
    /// Always face the camera
    pub billboard: bool,
    /// Scale with camera distance. Only meaningful as `false` together with `billboard`.
    pub size_attenuation: bool,
    /// Origin of the label within its bounding box, normalized 0-1
    pub anchor_point: [f32; 2],
}

impl LabelStyle {
    /// Black text on an opaque white background, anchored at the center
    pub fn new() -> Self {
        Self {
            line_height: 1.0,
            color: [0.0, 0.0, 0.0, 1.0],
            background_color: [1.0, 1.0, 1.0, 1.0],
            billboard: false,
            size_attenuation: true,
            anchor_point: [0.5, 0.5],
        }
    }

    /// Set the line height
    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    /// Set the text and background colors
    pub fn with_colors(mut self, color: [f32; 4], background_color: [f32; 4]) -> Self {
        self.color = color;
        self.background_color = background_color;
        self
    }

    /// Billboard the label, optionally with constant on-screen size
    pub fn billboarded(mut self, size_attenuation: bool) -> Self {
        self.billboard = true;
        self.size_attenuation = size_attenuation;
        self
    }

    /// Set the anchor point
    pub fn with_anchor_point(mut self, x: f32, y: f32) -> Self {
        self.anchor_point = [x, y];
        self
    }

    /// Validate the style
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.line_height.is_finite() && self.line_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "line height must be positive, got {}",
                self.line_height
            )));
        }
        if !self.size_attenuation && !self.billboard {
            log::warn!("size_attenuation = false has no effect without billboard = true");
        }
        Ok(())
    }
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self::new()
    }
}

/// # Pool Configuration
///
/// Top-level configuration of a label pool and its shared atlas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Shared atlas configuration
    pub atlas: AtlasConfig,
    /// Global scale factor applied to every label
    pub scale_factor: f32,
    /// Style applied to newly constructed labels
    pub label_style: LabelStyle,
}

impl PoolConfig {
    /// Create a pool configuration with defaults
    pub fn new() -> Self {
        Self {
            atlas: AtlasConfig::default(),
            scale_factor: 1.0,
            label_style: LabelStyle::default(),
        }
    }

    /// Set the atlas configuration
    pub fn with_atlas(mut self, atlas: AtlasConfig) -> Self {
        self.atlas = atlas;
        self
    }

    /// Set the initial scale factor
    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the style of newly constructed labels
    pub fn with_label_style(mut self, style: LabelStyle) -> Self {
        self.label_style = style;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.atlas.validate()?;
        self.label_style.validate()?;
        if !(self.scale_factor.is_finite() && self.scale_factor >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scale factor must be non-negative, got {}",
                self.scale_factor
            )));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for PoolConfig {}
