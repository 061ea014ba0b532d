//! Uniform-block material backend
//!
//! Keeps all parameters in one `#[repr(C)]` block that an immediate-mode renderer uploads
//! as a single uniform buffer whenever its version changes.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Rgba, Vec2, Vec4};
use crate::labels::material::{LabelMaterial, MaterialFactory, MaterialParams};

bitflags! {
    /// Render-state switches packed into the uniform block
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// Always face the camera
        const BILLBOARD = 1 << 0;
        /// Scale with camera distance
        const SIZE_ATTENUATION = 1 << 1;
        /// Render the object id
        const PICKING = 1 << 2;
        /// Draw with blending and without depth writes
        const TRANSPARENT = 1 << 3;
    }
}

/// Uniform block layout, 16-byte aligned
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LabelUniforms {
    /// Text color
    pub color: [f32; 4],
    /// Background color
    pub background_color: [f32; 4],
    /// Picking id
    pub object_id: [f32; 4],
    /// Label size in atlas pixels
    pub label_size: [f32; 2],
    /// Atlas size in pixels
    pub texture_size: [f32; 2],
    /// Anchor point
    pub anchor_point: [f32; 2],
    /// World units per atlas pixel
    pub scale: f32,
    /// [`MaterialFlags`] bits
    pub flags: u32,
}

/// Material storing its parameters as a [`LabelUniforms`] block
#[derive(Debug, Clone)]
pub struct UniformMaterial {
    uniforms: LabelUniforms,
    version: u64,
    uploaded_version: u64,
    disposed: bool,
}

impl UniformMaterial {
    /// Create a material with default parameters
    pub fn new(picking: bool) -> Self {
        let params = MaterialParams::new(picking);
        let mut flags = MaterialFlags::empty();
        flags.set(MaterialFlags::SIZE_ATTENUATION, params.size_attenuation);
        flags.set(MaterialFlags::PICKING, picking);

        Self {
            uniforms: LabelUniforms {
                color: params.color.into(),
                background_color: params.background_color.into(),
                object_id: params.object_id.into(),
                label_size: params.label_size.into(),
                texture_size: params.texture_size.into(),
                anchor_point: params.anchor_point.into(),
                scale: params.scale,
                flags: flags.bits(),
            },
            version: 1,
            uploaded_version: 0,
            disposed: false,
        }
    }

    /// Current uniform block
    pub fn uniforms(&self) -> &LabelUniforms {
        &self.uniforms
    }

    /// Uniform block as bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniforms)
    }

    /// Render-state flags
    pub fn flags(&self) -> MaterialFlags {
        MaterialFlags::from_bits_truncate(self.uniforms.flags)
    }

    /// Incremented on every parameter change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The block changed since the last upload
    pub fn needs_update(&self) -> bool {
        self.version != self.uploaded_version
    }

    /// Record that the host uploaded the current block
    pub fn mark_uploaded(&mut self) {
        self.uploaded_version = self.version;
    }

    fn modify(&mut self, update: impl FnOnce(&mut LabelUniforms)) {
        let before = self.uniforms;
        update(&mut self.uniforms);
        if bytemuck::bytes_of(&before) != bytemuck::bytes_of(&self.uniforms) {
            self.version += 1;
        }
    }

    fn set_flag(&mut self, flag: MaterialFlags, enabled: bool) {
        self.modify(|u| {
            let mut flags = MaterialFlags::from_bits_truncate(u.flags);
            flags.set(flag, enabled);
            u.flags = flags.bits();
        });
    }

    fn refresh_transparency(&mut self) {
        let transparent = self.params().is_transparent();
        self.set_flag(MaterialFlags::TRANSPARENT, transparent);
    }
}

impl LabelMaterial for UniformMaterial {
    fn params(&self) -> MaterialParams {
        let u = &self.uniforms;
        let flags = self.flags();
        MaterialParams {
            color: Vec4::from(u.color),
            background_color: Vec4::from(u.background_color),
            label_size: Vec2::from(u.label_size),
            texture_size: Vec2::from(u.texture_size),
            anchor_point: Vec2::from(u.anchor_point),
            scale: u.scale,
            billboard: flags.contains(MaterialFlags::BILLBOARD),
            size_attenuation: flags.contains(MaterialFlags::SIZE_ATTENUATION),
            object_id: Vec4::from(u.object_id),
            picking: flags.contains(MaterialFlags::PICKING),
        }
    }

    fn set_texture_size(&mut self, width: f32, height: f32) {
        self.modify(|u| u.texture_size = [width, height]);
    }

    fn set_label_size(&mut self, width: f32, height: f32) {
        self.modify(|u| u.label_size = [width, height]);
    }

    fn set_color(&mut self, color: Rgba) {
        self.modify(|u| u.color = color.into());
        self.refresh_transparency();
    }

    fn set_background_color(&mut self, color: Rgba) {
        self.modify(|u| u.background_color = color.into());
        self.refresh_transparency();
    }

    fn set_billboard(&mut self, billboard: bool) {
        self.set_flag(MaterialFlags::BILLBOARD, billboard);
    }

    fn set_size_attenuation(&mut self, size_attenuation: bool) {
        self.set_flag(MaterialFlags::SIZE_ATTENUATION, size_attenuation);
    }

    fn set_anchor_point(&mut self, anchor_point: Vec2) {
        self.modify(|u| u.anchor_point = anchor_point.into());
    }

    fn set_scale(&mut self, scale: f32) {
        self.modify(|u| u.scale = scale);
    }

    fn set_object_id(&mut self, object_id: Rgba) {
        self.modify(|u| u.object_id = object_id.into());
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn is_transparent(&self) -> bool {
        self.flags().contains(MaterialFlags::TRANSPARENT)
    }
}

/// Factory for [`UniformMaterial`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformMaterialFactory;

impl MaterialFactory for UniformMaterialFactory {
    type Material = UniformMaterial;

    fn create_material(&self, picking: bool) -> UniformMaterial {
        UniformMaterial::new(picking)
    }

    fn backend_name(&self) -> &'static str {
        "uniform-block"
    }
}
