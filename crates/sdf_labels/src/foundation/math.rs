//! Math utilities and types

pub use nalgebra::{Vector2, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// Linear-space RGBA color
pub type Rgba = Vec4;

/// Build a linear-space color from its components
pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Rgba {
    Rgba::new(r, g, b, a)
}

/// Whether a color is partially transparent
pub fn is_translucent(color: &Rgba) -> bool {
    color.w < 1.0
}
