//! Labels, materials and pooling
//!
//! ```text
//! LabelPool
//!     ├── LabelContext (shared via Rc)
//!     │       ├── AtlasPacker
//!     │       ├── AtlasTexture
//!     │       ├── scale factor
//!     │       └── EventSystem
//!     └── available labels
//!               ↓
//!           Label ── color material, picking material, InstanceBuffer
//! ```

pub mod atlas_texture;
pub mod backends;
mod context;
pub mod instance_buffer;
pub mod label;
pub mod label_pool;
pub mod material;

pub use atlas_texture::AtlasTexture;
pub use backends::{NodeMaterial, NodeMaterialFactory, UniformMaterial, UniformMaterialFactory};
pub use instance_buffer::{
    CharInstance, InstanceAttribute, InstanceBuffer, FLOATS_PER_CHAR, INSTANCE_ATTRIBUTES,
    QUAD_POSITIONS, QUAD_UVS,
};
pub use label::{Label, LabelId, ParentId};
pub use label_pool::{LabelPool, PoolStats};
pub use material::{LabelMaterial, MaterialFactory, MaterialParams};
