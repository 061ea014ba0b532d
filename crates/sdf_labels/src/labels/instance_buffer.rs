//! Per-character instanced attribute buffer
//!
//! Every character of a label is one instance of a shared unit quad. The buffer is
//! interleaved: five 2-component attributes per instance, ten floats in total.

use bytemuck::{Pod, Zeroable};

use crate::text::{CharBox, LayoutResult};

/// Number of `f32` values per character instance
pub const FLOATS_PER_CHAR: usize = 10;

/// Unit quad as two triangles
pub const QUAD_POSITIONS: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [1.0, 1.0],
];

/// Texture coordinates of [`QUAD_POSITIONS`], `(x, 1 - y)`
pub const QUAD_UVS: [[f32; 2]; 6] = [
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 1.0],
    [0.0, 0.0],
    [1.0, 0.0],
];

/// One attribute of the interleaved instance layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceAttribute {
    /// Shader attribute name
    pub name: &'static str,
    /// Offset in floats from the start of an instance
    pub offset: usize,
    /// Component count
    pub components: usize,
}

/// Interleaved attribute table, stride [`FLOATS_PER_CHAR`]
pub const INSTANCE_ATTRIBUTES: [InstanceAttribute; 5] = [
    InstanceAttribute { name: "instanceBoxPosition", offset: 0, components: 2 },
    InstanceAttribute { name: "instanceCharPosition", offset: 2, components: 2 },
    InstanceAttribute { name: "instanceUv", offset: 4, components: 2 },
    InstanceAttribute { name: "instanceBoxSize", offset: 6, components: 2 },
    InstanceAttribute { name: "instanceCharSize", offset: 8, components: 2 },
];

/// GPU instance data for one character
///
/// Positions are relative to the bottom-left corner of the label, +Y up.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CharInstance {
    /// Bottom-left corner of the line box
    pub box_position: [f32; 2],
    /// Bottom-left corner of the glyph bitmap
    pub char_position: [f32; 2],
    /// Glyph position in the atlas, in pixels
    pub uv: [f32; 2],
    /// Advance and line height
    pub box_size: [f32; 2],
    /// Glyph bitmap size
    pub char_size: [f32; 2],
}

impl CharInstance {
    /// Convert a layout box, flipping Y against the layout height
    pub fn from_layout(ch: &CharBox, layout_height: f32) -> Self {
        let box_bottom = layout_height - ch.box_top - ch.box_height;
        Self {
            box_position: [ch.left, box_bottom],
            char_position: [ch.left, box_bottom + ch.top - ch.box_top],
            uv: [ch.atlas_x, ch.atlas_y],
            box_size: [ch.x_advance, ch.box_height],
            char_size: [ch.width, ch.height],
        }
    }
}

/// Grow-only instance buffer
///
/// Capacity is exactly the largest character count ever written and never shrinks, so
/// reused labels keep their allocation.
#[derive(Debug, Default)]
pub struct InstanceBuffer {
    data: Vec<CharInstance>,
    instance_count: usize,
    needs_upload: bool,
    reallocations: u32,
}

impl InstanceBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one instance per laid-out character, growing if required
    pub fn write(&mut self, layout: &LayoutResult) {
        let required = layout.chars.len();
        if required > self.data.len() {
            self.data.resize(required, CharInstance::default());
            self.reallocations += 1;
            log::trace!("Instance buffer grown to {required} characters");
        }

        for (slot, ch) in self.data.iter_mut().zip(&layout.chars) {
            *slot = CharInstance::from_layout(ch, layout.height);
        }
        self.instance_count = required;
        self.needs_upload = true;
    }

    /// Active instances
    pub fn instances(&self) -> &[CharInstance] {
        &self.data[..self.instance_count]
    }

    /// Active instances as a flat float slice
    pub fn floats(&self) -> &[f32] {
        bytemuck::cast_slice(self.instances())
    }

    /// Whole allocation as bytes, ready for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Number of characters to draw
    pub fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// Allocated capacity in characters
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of times the allocation was replaced
    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }

    /// Contents changed since the last upload
    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    /// Record that the host uploaded the current contents
    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }

    /// Release the allocation
    pub fn dispose(&mut self) {
        self.data = Vec::new();
        self.instance_count = 0;
        self.needs_upload = false;
    }
}
