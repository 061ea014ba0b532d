//! Label pooling
//!
//! The pool owns the shared atlas and scale factor and recycles released labels so their
//! materials and instance buffers are reused.
//!
//! # Usage
//!
//! ```rust
//! use sdf_labels::prelude::*;
//!
//! let mut pool = LabelPool::new(
//!     PoolConfig::default(),
//!     UniformMaterialFactory,
//!     Box::new(FixedGlyphRasterizer::default()),
//! );
//!
//! let mut label = pool.acquire();
//! label.set_text("Hello");
//! pool.release(label);
//!
//! // The released label is handed out again
//! let label = pool.acquire();
//! assert_eq!(label.text(), "Hello");
//! ```

use std::cell::Ref;
use std::rc::Rc;

use crate::config::{LabelStyle, PoolConfig};
use crate::events::{EventKind, LabelEvent};
use crate::foundation::collections::ListenerKey;
use crate::text::{AtlasPacker, GlyphRasterizer, PackOutcome};

use super::atlas_texture::AtlasTexture;
use super::context::LabelContext;
use super::label::Label;
use super::material::MaterialFactory;

/// Statistics for label pool usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Labels constructed by the pool
    pub labels_created: u64,
    /// Acquisitions served from released labels
    pub labels_reused: u64,
    /// Labels returned with [`LabelPool::release`]
    pub labels_released: u64,
    /// Labels disposed by the pool
    pub labels_disposed: u64,
    /// Labels currently waiting for reuse
    pub available: usize,
}

/// Pool of reusable labels sharing one glyph atlas
pub struct LabelPool<F: MaterialFactory>
where
    F::Material: 'static,
{
    context: Rc<LabelContext>,
    factory: F,
    available: Vec<Label<F::Material>>,
    default_style: LabelStyle,
    disposed: bool,
    stats: PoolStats,
}

impl<F: MaterialFactory> LabelPool<F>
where
    F::Material: 'static,
{
    /// Create a pool, its atlas and the initial glyph set
    pub fn new(config: PoolConfig, factory: F, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        if let Err(error) = config.validate() {
            log::warn!("Label pool created with invalid configuration: {error}");
        }

        let context = Rc::new(LabelContext::new(&config, rasterizer));
        log::info!(
            "Created label pool with {} backend, scale factor {}",
            factory.backend_name(),
            config.scale_factor
        );

        Self {
            context,
            factory,
            available: Vec::new(),
            default_style: config.label_style,
            disposed: false,
            stats: PoolStats::default(),
        }
    }

    /// Take a released label or create a new one
    pub fn acquire(&mut self) -> Label<F::Material> {
        if self.disposed {
            log::warn!("Acquiring a label from a disposed pool");
        }

        if let Some(label) = self.available.pop() {
            self.stats.labels_reused += 1;
            self.stats.available = self.available.len();
            log::debug!("Reusing {}", label.id());
            return label;
        }

        let mut label = Label::new(Rc::clone(&self.context), &self.factory);
        label.apply_style(&self.default_style);
        self.stats.labels_created += 1;
        label
    }

    /// Return a label for reuse
    ///
    /// The label is detached from its parent. Labels released into a disposed pool, or into
    /// a pool that did not create them, are disposed instead.
    pub fn release(&mut self, mut label: Label<F::Material>) {
        if self.disposed || !label.belongs_to(&self.context) {
            if !self.disposed {
                log::warn!("Released {} into a pool that did not create it", label.id());
            }
            label.dispose();
            self.stats.labels_disposed += 1;
            return;
        }

        label.remove_from_parent();
        self.available.push(label);
        self.stats.labels_released += 1;
        self.stats.available = self.available.len();
    }

    /// Change the global scale factor of every label
    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.context.set_scale_factor(scale_factor);
    }

    /// Global scale factor
    pub fn scale_factor(&self) -> f32 {
        self.context.scale_factor()
    }

    /// Pack the characters of `text` without a label
    pub fn update_atlas(&mut self, text: &str) -> PackOutcome {
        self.context.ensure_characters(text)
    }

    /// Observe atlas changes, scale factor changes or atlas errors
    pub fn add_event_listener<H>(&self, kind: EventKind, handler: H) -> ListenerKey
    where
        H: Fn(&LabelEvent) + 'static,
    {
        self.context.events().register_handler(kind, handler)
    }

    /// Stop observing. Returns false if the key was not registered.
    pub fn remove_event_listener(&self, key: ListenerKey) -> bool {
        self.context.events().unregister(key)
    }

    /// Number of listeners for a kind, labels included
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.context.events().listener_count(kind)
    }

    /// Dispose every available label and the atlas texture
    ///
    /// Labels still in use stay valid; releasing them afterwards disposes them.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        let count = self.available.len();
        for label in self.available.drain(..) {
            label.dispose();
        }
        self.stats.labels_disposed += count as u64;
        self.stats.available = 0;
        self.context.texture_mut().dispose();
        self.disposed = true;
        log::info!("Disposed label pool ({count} available labels)");
    }

    /// [`Self::dispose`] was called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Labels waiting for reuse
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Usage statistics
    pub fn stats(&self) -> PoolStats {
        self.stats.clone()
    }

    /// Style applied to newly created labels
    pub fn default_style(&self) -> &LabelStyle {
        &self.default_style
    }

    /// Shared atlas
    pub fn atlas(&self) -> Ref<'_, AtlasPacker> {
        self.context.atlas()
    }

    /// Upload state of the shared atlas texture
    pub fn atlas_texture(&self) -> Ref<'_, AtlasTexture> {
        self.context.texture()
    }

    /// Record that the host uploaded the atlas bitmap
    pub fn mark_atlas_uploaded(&mut self) {
        self.context.texture_mut().mark_uploaded();
    }

    /// Material factory
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: MaterialFactory> std::fmt::Debug for LabelPool<F>
where
    F::Material: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelPool")
            .field("backend", &self.factory.backend_name())
            .field("available", &self.available.len())
            .field("disposed", &self.disposed)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
