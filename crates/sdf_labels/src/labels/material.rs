//! Label material capability
//!
//! A label owns two materials from the same backend: the color material used for normal
//! drawing and a picking material that renders a flat object id. Backends implement
//! [`LabelMaterial`] and are created through a [`MaterialFactory`].

use crate::foundation::math::{is_translucent, rgba, Rgba, Vec2};

/// Backend-independent snapshot of material parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    /// Text color, linear RGBA
    pub color: Rgba,
    /// Background color, linear RGBA
    pub background_color: Rgba,
    /// Label size in atlas pixels
    pub label_size: Vec2,
    /// Atlas texture size in pixels
    pub texture_size: Vec2,
    /// Label origin within its bounds, normalized
    pub anchor_point: Vec2,
    /// World units per atlas pixel
    pub scale: f32,
    /// Always face the camera
    pub billboard: bool,
    /// Scale with camera distance
    pub size_attenuation: bool,
    /// Id rendered by the picking material
    pub object_id: Rgba,
    /// Renders object ids instead of colors
    pub picking: bool,
}

impl MaterialParams {
    /// Defaults of a freshly created material
    pub fn new(picking: bool) -> Self {
        Self {
            color: rgba(0.0, 0.0, 0.0, 1.0),
            background_color: rgba(1.0, 1.0, 1.0, 1.0),
            label_size: Vec2::zeros(),
            texture_size: Vec2::zeros(),
            anchor_point: Vec2::new(0.5, 0.5),
            scale: 0.0,
            billboard: false,
            size_attenuation: true,
            object_id: rgba(f32::NAN, f32::NAN, f32::NAN, f32::NAN),
            picking,
        }
    }

    /// Either color is partially transparent
    pub fn is_transparent(&self) -> bool {
        is_translucent(&self.color) || is_translucent(&self.background_color)
    }
}

/// Capability set every label material backend provides
pub trait LabelMaterial {
    /// Current parameters
    fn params(&self) -> MaterialParams;

    /// Set the atlas texture size
    fn set_texture_size(&mut self, width: f32, height: f32);

    /// Set the label size
    fn set_label_size(&mut self, width: f32, height: f32);

    /// Set the text color
    fn set_color(&mut self, color: Rgba);

    /// Set the background color
    fn set_background_color(&mut self, color: Rgba);

    /// Enable or disable billboarding
    fn set_billboard(&mut self, billboard: bool);

    /// Enable or disable size attenuation
    fn set_size_attenuation(&mut self, size_attenuation: bool);

    /// Set the anchor point
    fn set_anchor_point(&mut self, anchor_point: Vec2);

    /// Set world units per atlas pixel
    fn set_scale(&mut self, scale: f32);

    /// Set the id rendered when picking
    fn set_object_id(&mut self, object_id: Rgba);

    /// Release backend resources
    fn dispose(&mut self);

    /// [`Self::dispose`] was called
    fn is_disposed(&self) -> bool;

    /// Renders object ids instead of colors
    fn is_picking(&self) -> bool {
        self.params().picking
    }

    /// Draw with blending
    fn is_transparent(&self) -> bool {
        self.params().is_transparent()
    }

    /// Write depth while drawing
    fn depth_write(&self) -> bool {
        !self.is_transparent()
    }
}

/// Creates materials for one render backend
pub trait MaterialFactory {
    /// Material type produced by this factory
    type Material: LabelMaterial;

    /// Create a color material, or a picking material when `picking` is set
    fn create_material(&self, picking: bool) -> Self::Material;

    /// Backend name for diagnostics
    fn backend_name(&self) -> &'static str;
}
