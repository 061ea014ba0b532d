//! A single text label
//!
//! Owns a color material, a picking material and a grow-only instance buffer. The buffer is
//! rebuilt whenever the text or the shared atlas changes; the material scale is re-derived
//! whenever the atlas or the pool scale factor changes.
//!
//! A notification that arrives while the label state is borrowed (for example while the host
//! holds [`Label::instance_buffer`]) is recorded and applied by the next label call.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;

use crate::config::LabelStyle;
use crate::events::{EventKind, LabelEvent};
use crate::foundation::collections::ListenerKey;
use crate::foundation::math::{rgba, Rgba, Vec2, Vec4};

use super::context::LabelContext;
use super::instance_buffer::InstanceBuffer;
use super::material::{LabelMaterial, MaterialFactory};

/// Identifier of a label, unique within its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(u64);

impl LabelId {
    /// Raw id value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "label#{}", self.0)
    }
}

/// Opaque handle of a host scene-graph node a label is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentId(pub u64);

bitflags! {
    /// Notification work a label still owes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct PendingWork: u8 {
        /// Re-derive the material scale
        const RESCALE = 1 << 0;
        /// Texture size, scale and layout after atlas growth
        const ATLAS_CHANGE = 1 << 1;
    }
}

struct LabelState<M> {
    text: String,
    buffer: InstanceBuffer,
    needs_layout: bool,
    line_height: f32,
    material: M,
    picking_material: M,
    parent: Option<ParentId>,
}

impl<M: LabelMaterial> LabelState<M> {
    fn both(&mut self, mut apply: impl FnMut(&mut M)) {
        apply(&mut self.material);
        apply(&mut self.picking_material);
    }

    fn apply_scale(&mut self, context: &LabelContext) {
        let atlas_line_height = context.line_height();
        let scale = if atlas_line_height > 0.0 {
            self.line_height * context.scale_factor() / atlas_line_height
        } else {
            0.0
        };
        self.both(|m| m.set_scale(scale));
    }

    fn handle_atlas_change(&mut self, context: &LabelContext) {
        let (width, height) = {
            let texture = context.texture();
            (texture.width() as f32, texture.height() as f32)
        };
        self.both(|m| m.set_texture_size(width, height));
        self.apply_scale(context);
        self.needs_layout = true;
        self.update_layout_if_needed(context);
    }

    fn apply_work(&mut self, work: PendingWork, context: &LabelContext) {
        if work.contains(PendingWork::ATLAS_CHANGE) {
            self.handle_atlas_change(context);
        } else if work.contains(PendingWork::RESCALE) {
            self.apply_scale(context);
        }
    }

    fn update_layout_if_needed(&mut self, context: &LabelContext) {
        if !self.needs_layout {
            return;
        }

        let layout = context.atlas().layout(&self.text);
        self.both(|m| m.set_label_size(layout.width, layout.height));
        self.buffer.write(&layout);
        self.needs_layout = false;
    }
}

/// Text label bound to the atlas of the pool that created it
///
/// Dropping a label disposes it. Labels are normally returned to their pool with
/// [`LabelPool::release`](super::LabelPool::release) instead.
pub struct Label<M: LabelMaterial + 'static> {
    id: LabelId,
    state: Rc<RefCell<LabelState<M>>>,
    context: Rc<LabelContext>,
    pending: Rc<Cell<PendingWork>>,
    listeners: Vec<ListenerKey>,
    disposed: bool,
}

impl<M: LabelMaterial + 'static> Label<M> {
    pub(crate) fn new<F>(context: Rc<LabelContext>, factory: &F) -> Self
    where
        F: MaterialFactory<Material = M>,
    {
        let state = Rc::new(RefCell::new(LabelState {
            text: String::new(),
            buffer: InstanceBuffer::new(),
            needs_layout: false,
            line_height: 1.0,
            material: factory.create_material(false),
            picking_material: factory.create_material(true),
            parent: None,
        }));

        let pending = Rc::new(Cell::new(PendingWork::empty()));
        let listeners = vec![
            Self::subscribe(
                &context,
                &state,
                &pending,
                EventKind::ScaleFactorChanged,
                PendingWork::RESCALE,
            ),
            Self::subscribe(
                &context,
                &state,
                &pending,
                EventKind::AtlasChanged,
                PendingWork::ATLAS_CHANGE,
            ),
        ];

        state.borrow_mut().handle_atlas_change(&context);

        let id = LabelId(context.allocate_label_id());
        log::debug!("Created {id} with {} materials", factory.backend_name());

        Self {
            id,
            state,
            context,
            pending,
            listeners,
            disposed: false,
        }
    }

    fn subscribe(
        context: &Rc<LabelContext>,
        state: &Rc<RefCell<LabelState<M>>>,
        pending: &Rc<Cell<PendingWork>>,
        kind: EventKind,
        work: PendingWork,
    ) -> ListenerKey {
        let weak_state: Weak<RefCell<LabelState<M>>> = Rc::downgrade(state);
        let weak_context: Weak<LabelContext> = Rc::downgrade(context);
        let pending = Rc::clone(pending);

        context.events().register_handler(kind, move |_event: &LabelEvent| {
            let (Some(state), Some(context)) = (weak_state.upgrade(), weak_context.upgrade())
            else {
                return;
            };
            match state.try_borrow_mut() {
                Ok(mut state) => state.apply_work(work, &context),
                Err(_) => {
                    log::debug!("Deferred {kind:?} for a borrowed label");
                    pending.set(pending.get() | work);
                }
            };
        })
    }

    /// Apply notifications that arrived while the state was borrowed
    fn apply_pending(&self) {
        let work = self.pending.get();
        if work.is_empty() {
            return;
        }
        if let Ok(mut state) = self.state.try_borrow_mut() {
            self.pending.set(PendingWork::empty());
            state.apply_work(work, &self.context);
        }
    }

    /// Pool-unique identifier
    pub fn id(&self) -> LabelId {
        self.id
    }

    /// Current text
    pub fn text(&self) -> String {
        self.apply_pending();
        self.state.borrow().text.clone()
    }

    /// Replace the text
    ///
    /// New characters are packed into the shared atlas, which relayouts every label of the
    /// pool. Characters that do not fit render as the replacement glyph.
    pub fn set_text(&mut self, text: &str) {
        self.apply_pending();
        {
            let mut state = self.state.borrow_mut();
            if state.text == text {
                return;
            }
            state.text = text.to_string();
            state.needs_layout = true;
        }

        self.context.ensure_characters(text);
        self.state
            .borrow_mut()
            .update_layout_if_needed(&self.context);
    }

    /// Set the text color, linear RGBA
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.apply_pending();
        self.state.borrow_mut().material.set_color(rgba(r, g, b, a));
    }

    /// Set the background color, linear RGBA
    pub fn set_background_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.apply_pending();
        self.state
            .borrow_mut()
            .material
            .set_background_color(rgba(r, g, b, a));
    }

    /// Always face the camera
    pub fn set_billboard(&mut self, billboard: bool) {
        self.apply_pending();
        self.state.borrow_mut().both(|m| m.set_billboard(billboard));
    }

    /// Scale with camera distance
    ///
    /// Disabling size attenuation only has an effect on billboarded labels.
    pub fn set_size_attenuation(&mut self, size_attenuation: bool) {
        self.apply_pending();
        self.state
            .borrow_mut()
            .both(|m| m.set_size_attenuation(size_attenuation));
    }

    /// Set the label origin within its bounds, normalized 0-1
    pub fn set_anchor_point(&mut self, x: f32, y: f32) {
        self.apply_pending();
        self.state
            .borrow_mut()
            .both(|m| m.set_anchor_point(Vec2::new(x, y)));
    }

    /// Set the height of one line in world units
    pub fn set_line_height(&mut self, line_height: f32) {
        self.apply_pending();
        let mut state = self.state.borrow_mut();
        state.line_height = line_height;
        state.apply_scale(&self.context);
    }

    /// Height of one line in world units
    pub fn line_height(&self) -> f32 {
        self.apply_pending();
        self.state.borrow().line_height
    }

    /// Set the material scale directly
    ///
    /// Overwritten by the next line height, scale factor or atlas change.
    pub fn set_scale(&mut self, scale: f32) {
        self.apply_pending();
        self.state.borrow_mut().both(|m| m.set_scale(scale));
    }

    /// Set the id rendered by the picking material
    pub fn set_object_id(&mut self, object_id: Rgba) {
        self.apply_pending();
        self.state
            .borrow_mut()
            .picking_material
            .set_object_id(object_id);
    }

    /// Apply every setting of a style
    pub fn apply_style(&mut self, style: &LabelStyle) {
        self.set_line_height(style.line_height);
        let [r, g, b, a] = style.color;
        self.set_color(r, g, b, a);
        let [r, g, b, a] = style.background_color;
        self.set_background_color(r, g, b, a);
        self.set_billboard(style.billboard);
        self.set_size_attenuation(style.size_attenuation);
        let [x, y] = style.anchor_point;
        self.set_anchor_point(x, y);
    }

    /// Attach to a host scene node
    pub fn set_parent(&mut self, parent: ParentId) {
        self.apply_pending();
        self.state.borrow_mut().parent = Some(parent);
    }

    /// Host scene node the label is attached to
    pub fn parent(&self) -> Option<ParentId> {
        self.apply_pending();
        self.state.borrow().parent
    }

    /// Detach from the host scene node
    pub fn remove_from_parent(&mut self) -> Option<ParentId> {
        self.apply_pending();
        self.state.borrow_mut().parent.take()
    }

    /// Label size in atlas pixels
    pub fn label_size(&self) -> Vec2 {
        self.apply_pending();
        self.state.borrow().material.params().label_size
    }

    /// Current text color
    pub fn color(&self) -> Vec4 {
        self.apply_pending();
        self.state.borrow().material.params().color
    }

    /// Instanced attribute buffer
    pub fn instance_buffer(&self) -> Ref<'_, InstanceBuffer> {
        self.apply_pending();
        Ref::map(self.state.borrow(), |s| &s.buffer)
    }

    /// Instanced attribute buffer, for upload bookkeeping
    pub fn instance_buffer_mut(&self) -> RefMut<'_, InstanceBuffer> {
        self.apply_pending();
        RefMut::map(self.state.borrow_mut(), |s| &mut s.buffer)
    }

    /// Number of characters to draw
    pub fn instance_count(&self) -> usize {
        self.apply_pending();
        self.state.borrow().buffer.instance_count()
    }

    /// Color material
    pub fn material(&self) -> Ref<'_, M> {
        self.apply_pending();
        Ref::map(self.state.borrow(), |s| &s.material)
    }

    /// Color material, for upload bookkeeping
    pub fn material_mut(&self) -> RefMut<'_, M> {
        self.apply_pending();
        RefMut::map(self.state.borrow_mut(), |s| &mut s.material)
    }

    /// Picking material
    pub fn picking_material(&self) -> Ref<'_, M> {
        self.apply_pending();
        Ref::map(self.state.borrow(), |s| &s.picking_material)
    }

    pub(crate) fn belongs_to(&self, context: &Rc<LabelContext>) -> bool {
        Rc::ptr_eq(&self.context, context)
    }

    /// Release materials and the instance buffer and stop receiving notifications
    pub fn dispose(mut self) {
        self.dispose_resources();
    }

    fn dispose_resources(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        for key in self.listeners.drain(..) {
            self.context.events().unregister(key);
        }
        match self.state.try_borrow_mut() {
            Ok(mut state) => {
                state.material.dispose();
                state.picking_material.dispose();
                state.buffer.dispose();
            }
            Err(_) => log::warn!("Could not release resources of borrowed {}", self.id),
        }
        log::debug!("Disposed {}", self.id);
    }
}

impl<M: LabelMaterial + 'static> Drop for Label<M> {
    fn drop(&mut self) {
        self.dispose_resources();
    }
}

impl<M: LabelMaterial + 'static> fmt::Debug for Label<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Label")
            .field("id", &self.id)
            .field("text", &state.text)
            .field("line_height", &state.line_height)
            .field("instances", &state.buffer.instance_count())
            .finish_non_exhaustive()
    }
}
