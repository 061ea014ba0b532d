//! State shared by a pool and every label it created

use std::cell::{Cell, Ref, RefCell};

use crate::config::PoolConfig;
use crate::events::{EventSystem, LabelEvent};
use crate::text::{AtlasPacker, GlyphRasterizer, PackOutcome};

use super::atlas_texture::AtlasTexture;

/// Atlas, texture state, scale factor and notifications of one pool
///
/// Lives behind an `Rc` so labels keep it alive after the pool is gone.
#[derive(Debug)]
pub(crate) struct LabelContext {
    atlas: RefCell<AtlasPacker>,
    texture: RefCell<AtlasTexture>,
    scale_factor: Cell<f32>,
    events: EventSystem,
    next_label_id: Cell<u64>,
}

impl LabelContext {
    pub(crate) fn new(config: &PoolConfig, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        let atlas = AtlasPacker::new(&config.atlas, rasterizer);
        let texture = AtlasTexture::new(atlas.width(), atlas.height());
        Self {
            atlas: RefCell::new(atlas),
            texture: RefCell::new(texture),
            scale_factor: Cell::new(config.scale_factor),
            events: EventSystem::new(),
            next_label_id: Cell::new(0),
        }
    }

    /// Pack new characters and notify listeners
    ///
    /// Errors are dispatched in input order, followed by a single atlas change
    /// notification. The atlas is not borrowed while listeners run.
    pub(crate) fn ensure_characters(&self, text: &str) -> PackOutcome {
        let outcome = self.atlas.borrow_mut().ensure_characters(text);

        if outcome.atlas_changed() {
            self.texture.borrow_mut().update();
        }
        for error in &outcome.errors {
            log::warn!("{error}");
            self.events.dispatch(&LabelEvent::Error(error.clone()));
        }
        if outcome.atlas_changed() {
            self.events.dispatch(&LabelEvent::AtlasChanged);
        }
        outcome
    }

    pub(crate) fn set_scale_factor(&self, scale_factor: f32) {
        self.scale_factor.set(scale_factor);
        self.events
            .dispatch(&LabelEvent::ScaleFactorChanged { scale_factor });
    }

    pub(crate) fn scale_factor(&self) -> f32 {
        self.scale_factor.get()
    }

    /// Atlas line height in pixels
    pub(crate) fn line_height(&self) -> f32 {
        self.atlas.borrow().line_metrics().line_height as f32
    }

    pub(crate) fn atlas(&self) -> Ref<'_, AtlasPacker> {
        self.atlas.borrow()
    }

    pub(crate) fn texture(&self) -> Ref<'_, AtlasTexture> {
        self.texture.borrow()
    }

    pub(crate) fn texture_mut(&self) -> std::cell::RefMut<'_, AtlasTexture> {
        self.texture.borrow_mut()
    }

    pub(crate) fn events(&self) -> &EventSystem {
        &self.events
    }

    pub(crate) fn allocate_label_id(&self) -> u64 {
        let id = self.next_label_id.get();
        self.next_label_id.set(id + 1);
        id
    }
}
