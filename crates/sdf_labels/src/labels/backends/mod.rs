//! Material backends
//!
//! - **Uniform block**: one `Pod` block per material for immediate-mode renderers
//! - **Node graph**: named, individually versioned uniform nodes

pub mod node_material;
pub mod uniform_material;

pub use node_material::{NodeMaterial, NodeMaterialFactory, UniformNode, UniformValue};
pub use uniform_material::{LabelUniforms, MaterialFlags, UniformMaterial, UniformMaterialFactory};
