//! Node-graph material backend
//!
//! Exposes every parameter as a named uniform node with its own version counter, the shape
//! expected by renderers that build shaders from node graphs and sync uniforms by name.

use std::collections::BTreeMap;

use crate::foundation::math::{Rgba, Vec2, Vec4};
use crate::labels::material::{LabelMaterial, MaterialFactory, MaterialParams};

/// Node names
pub mod names {
    /// Billboard switch
    pub const BILLBOARD: &str = "uBillboard";
    /// Size attenuation switch
    pub const SIZE_ATTENUATION: &str = "uSizeAttenuation";
    /// World units per atlas pixel
    pub const SCALE: &str = "uScale";
    /// Label size
    pub const LABEL_SIZE: &str = "uLabelSize";
    /// Atlas size
    pub const TEXTURE_SIZE: &str = "uTextureSize";
    /// Anchor point
    pub const ANCHOR_POINT: &str = "uAnchorPoint";
    /// Text color
    pub const COLOR: &str = "uColor";
    /// Background color
    pub const BACKGROUND_COLOR: &str = "uBackgroundColor";
    /// Picking id
    pub const OBJECT_ID: &str = "uObjectId";
}

/// Value held by a uniform node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Boolean
    Bool(bool),
    /// Scalar
    Float(f32),
    /// 2-component vector
    Vec2(Vec2),
    /// 4-component vector
    Vec4(Vec4),
}

/// Named uniform with change tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformNode {
    /// Current value
    pub value: UniformValue,
    /// Incremented whenever the value changes
    pub version: u32,
}

/// Material exposing its parameters as named uniform nodes
#[derive(Debug, Clone)]
pub struct NodeMaterial {
    nodes: BTreeMap<&'static str, UniformNode>,
    picking: bool,
    transparent: bool,
    disposed: bool,
}

impl NodeMaterial {
    /// Create a material with default parameters
    pub fn new(picking: bool) -> Self {
        let params = MaterialParams::new(picking);
        let mut nodes = BTreeMap::new();
        let mut add = |name: &'static str, value: UniformValue| {
            nodes.insert(name, UniformNode { value, version: 0 });
        };
        add(names::BILLBOARD, UniformValue::Bool(params.billboard));
        add(names::SIZE_ATTENUATION, UniformValue::Bool(params.size_attenuation));
        add(names::SCALE, UniformValue::Float(params.scale));
        add(names::LABEL_SIZE, UniformValue::Vec2(params.label_size));
        add(names::TEXTURE_SIZE, UniformValue::Vec2(params.texture_size));
        add(names::ANCHOR_POINT, UniformValue::Vec2(params.anchor_point));
        add(names::COLOR, UniformValue::Vec4(params.color));
        add(names::BACKGROUND_COLOR, UniformValue::Vec4(params.background_color));
        add(names::OBJECT_ID, UniformValue::Vec4(params.object_id));

        Self {
            nodes,
            picking,
            transparent: false,
            disposed: false,
        }
    }

    /// Node by name
    pub fn node(&self, name: &str) -> Option<&UniformNode> {
        self.nodes.get(name)
    }

    /// All nodes, ordered by name
    pub fn nodes(&self) -> impl Iterator<Item = (&'static str, &UniformNode)> {
        self.nodes.iter().map(|(name, node)| (*name, node))
    }

    fn set(&mut self, name: &'static str, value: UniformValue) {
        if let Some(node) = self.nodes.get_mut(name) {
            // NaN ids never compare equal, compare bit patterns instead
            if !same_bits(&node.value, &value) {
                node.value = value;
                node.version = node.version.wrapping_add(1);
            }
        }
    }

    fn bool(&self, name: &str) -> bool {
        matches!(self.node(name).map(|n| n.value), Some(UniformValue::Bool(true)))
    }

    fn float(&self, name: &str) -> f32 {
        match self.node(name).map(|n| n.value) {
            Some(UniformValue::Float(v)) => v,
            _ => 0.0,
        }
    }

    fn vec2(&self, name: &str) -> Vec2 {
        match self.node(name).map(|n| n.value) {
            Some(UniformValue::Vec2(v)) => v,
            _ => Vec2::zeros(),
        }
    }

    fn vec4(&self, name: &str) -> Vec4 {
        match self.node(name).map(|n| n.value) {
            Some(UniformValue::Vec4(v)) => v,
            _ => Vec4::zeros(),
        }
    }
}

fn same_bits(a: &UniformValue, b: &UniformValue) -> bool {
    let bits = |v: &[f32]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
    match (a, b) {
        (UniformValue::Bool(x), UniformValue::Bool(y)) => x == y,
        (UniformValue::Float(x), UniformValue::Float(y)) => x.to_bits() == y.to_bits(),
        (UniformValue::Vec2(x), UniformValue::Vec2(y)) => bits(x.as_slice()) == bits(y.as_slice()),
        (UniformValue::Vec4(x), UniformValue::Vec4(y)) => bits(x.as_slice()) == bits(y.as_slice()),
        _ => false,
    }
}

impl LabelMaterial for NodeMaterial {
    fn params(&self) -> MaterialParams {
        MaterialParams {
            color: self.vec4(names::COLOR),
            background_color: self.vec4(names::BACKGROUND_COLOR),
            label_size: self.vec2(names::LABEL_SIZE),
            texture_size: self.vec2(names::TEXTURE_SIZE),
            anchor_point: self.vec2(names::ANCHOR_POINT),
            scale: self.float(names::SCALE),
            billboard: self.bool(names::BILLBOARD),
            size_attenuation: self.bool(names::SIZE_ATTENUATION),
            object_id: self.vec4(names::OBJECT_ID),
            picking: self.picking,
        }
    }

    fn set_texture_size(&mut self, width: f32, height: f32) {
        self.set(names::TEXTURE_SIZE, UniformValue::Vec2(Vec2::new(width, height)));
    }

    fn set_label_size(&mut self, width: f32, height: f32) {
        self.set(names::LABEL_SIZE, UniformValue::Vec2(Vec2::new(width, height)));
    }

    fn set_color(&mut self, color: Rgba) {
        self.set(names::COLOR, UniformValue::Vec4(color));
        self.transparent = self.params().is_transparent();
    }

    fn set_background_color(&mut self, color: Rgba) {
        self.set(names::BACKGROUND_COLOR, UniformValue::Vec4(color));
        self.transparent = self.params().is_transparent();
    }

    fn set_billboard(&mut self, billboard: bool) {
        self.set(names::BILLBOARD, UniformValue::Bool(billboard));
    }

    fn set_size_attenuation(&mut self, size_attenuation: bool) {
        self.set(names::SIZE_ATTENUATION, UniformValue::Bool(size_attenuation));
    }

    fn set_anchor_point(&mut self, anchor_point: Vec2) {
        self.set(names::ANCHOR_POINT, UniformValue::Vec2(anchor_point));
    }

    fn set_scale(&mut self, scale: f32) {
        self.set(names::SCALE, UniformValue::Float(scale));
    }

    fn set_object_id(&mut self, object_id: Rgba) {
        self.set(names::OBJECT_ID, UniformValue::Vec4(object_id));
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn is_picking(&self) -> bool {
        self.picking
    }

    fn is_transparent(&self) -> bool {
        self.transparent
    }
}

/// Factory for [`NodeMaterial`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeMaterialFactory;

impl MaterialFactory for NodeMaterialFactory {
    type Material = NodeMaterial;

    fn create_material(&self, picking: bool) -> NodeMaterial {
        NodeMaterial::new(picking)
    }

    fn backend_name(&self) -> &'static str {
        "node-graph"
    }
}
