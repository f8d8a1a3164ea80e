//! Retained quad storage shared by many sprites.
//!
//! Every quad owns one slot of four [`SpriteVertex`] values. Draw lists are
//! kept per camera: each quad registers one [`RenderState`] per camera it is
//! seen through, and equal descriptors are counted once so they end up in a
//! single draw call whenever group order allows it.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::camera::CameraId;
use crate::graphics::group::Group;
use crate::graphics::interfacer::Interfacer;
use crate::graphics::state::{RenderState, StatePart, StateWall};

pub const QUAD_VERTICES: usize = 4;

//  0 ---- 1
//  |  \   |
//  |   \  |
//  3 ---- 2
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Per-vertex attributes of a sprite quad.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub translate: [f32; 2],
    pub offset: [f32; 2],
    pub flip: [f32; 2],
    pub scroll_factor: [f32; 2],
    pub origin: [f32; 2],
    pub rotation: f32,
    pub scale: [f32; 2],
    pub tex_coords: [f32; 3],
    pub color: [f32; 4],
}

/// Attribute channel of [`SpriteVertex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Position,
    Translate,
    Offset,
    Flip,
    ScrollFactor,
    Origin,
    Rotation,
    Scale,
    TexCoords,
    Color,
}

impl Channel {
    pub const ALL: [Channel; 10] = [
        Channel::Position,
        Channel::Translate,
        Channel::Offset,
        Channel::Flip,
        Channel::ScrollFactor,
        Channel::Origin,
        Channel::Rotation,
        Channel::Scale,
        Channel::TexCoords,
        Channel::Color,
    ];

    /// Components per vertex.
    pub fn components(self) -> usize {
        match self {
            Channel::Rotation => 1,
            Channel::TexCoords => 3,
            Channel::Color => 4,
            _ => 2,
        }
    }

    fn get(self, v: &SpriteVertex) -> &[f32] {
        match self {
            Channel::Position => &v.position,
            Channel::Translate => &v.translate,
            Channel::Offset => &v.offset,
            Channel::Flip => &v.flip,
            Channel::ScrollFactor => &v.scroll_factor,
            Channel::Origin => &v.origin,
            Channel::Rotation => std::slice::from_ref(&v.rotation),
            Channel::Scale => &v.scale,
            Channel::TexCoords => &v.tex_coords,
            Channel::Color => &v.color,
        }
    }

    fn get_mut(self, v: &mut SpriteVertex) -> &mut [f32] {
        match self {
            Channel::Position => &mut v.position,
            Channel::Translate => &mut v.translate,
            Channel::Offset => &mut v.offset,
            Channel::Flip => &mut v.flip,
            Channel::ScrollFactor => &mut v.scroll_factor,
            Channel::Origin => &mut v.origin,
            Channel::Rotation => std::slice::from_mut(&mut v.rotation),
            Channel::Scale => &mut v.scale,
            Channel::TexCoords => &mut v.tex_coords,
            Channel::Color => &mut v.color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfacerId(pub u64);

/// One draw call: a state switch followed by a contiguous index range.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub state: RenderState,
    /// Directives that actually change relative to the previous call.
    pub switches: Vec<StatePart>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct QuadRecord {
    slot: usize,
    group: Group,
    visible: bool,
    states: HashMap<CameraId, RenderState>,
}

/// What a quad carries when it leaves a batch.
pub(crate) struct DetachedQuad {
    pub group: Group,
    pub visible: bool,
    pub states: HashMap<CameraId, RenderState>,
    pub vertices: [SpriteVertex; QUAD_VERTICES],
}

#[derive(Debug, Default)]
struct DrawList {
    members: HashSet<InterfacerId>,
    state_refs: HashMap<RenderState, usize>,
    dirty: bool,
    calls: Vec<DrawCall>,
    indices: Vec<u32>,
}

struct BatchStorage {
    id: Uuid,
    vertices: Vec<SpriteVertex>,
    free_slots: Vec<usize>,
    quads: HashMap<InterfacerId, QuadRecord>,
    draw_lists: HashMap<CameraId, DrawList>,
    next_id: u64,
}

/// Shared handle to a batch. Clones refer to the same storage; equality is identity.
#[derive(Clone)]
pub struct Batch {
    inner: Rc<RefCell<BatchStorage>>,
}

impl Batch {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BatchStorage {
                id: Uuid::new_v4(),
                vertices: Vec::new(),
                free_slots: Vec::new(),
                quads: HashMap::new(),
                draw_lists: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.borrow().id
    }

    /// Allocates a quad under `group` with one descriptor per camera.
    pub fn add_quad(&self, group: &Group, states: HashMap<CameraId, RenderState>) -> Interfacer {
        let id = self.insert_quad(DetachedQuad {
            group: group.clone(),
            visible: true,
            states,
            vertices: [SpriteVertex::default(); QUAD_VERTICES],
        });
        Interfacer::new(self.clone(), id)
    }

    /// Number of live quads.
    pub fn quad_count(&self) -> usize {
        self.inner.borrow().quads.len()
    }

    /// Number of quad slots allocated, free or not.
    pub fn slot_capacity(&self) -> usize {
        self.inner.borrow().vertices.len() / QUAD_VERTICES
    }

    /// Distinct descriptors registered for `camera`.
    pub fn distinct_states(&self, camera: CameraId) -> usize {
        self.inner
            .borrow()
            .draw_lists
            .get(&camera)
            .map_or(0, |dl| dl.state_refs.len())
    }

    pub fn cameras(&self) -> Vec<CameraId> {
        self.inner.borrow().draw_lists.keys().copied().collect()
    }

    /// Draw calls for `camera`, rebuilt if anything changed since the last request.
    pub fn draw_calls(&self, camera: CameraId) -> Vec<DrawCall> {
        let mut storage = self.inner.borrow_mut();
        storage.rebuild_if_dirty(camera);
        storage
            .draw_lists
            .get(&camera)
            .map(|dl| dl.calls.clone())
            .unwrap_or_default()
    }

    /// Index buffer contents backing [`Batch::draw_calls`].
    pub fn indices(&self, camera: CameraId) -> Vec<u32> {
        let mut storage = self.inner.borrow_mut();
        storage.rebuild_if_dirty(camera);
        storage
            .draw_lists
            .get(&camera)
            .map(|dl| dl.indices.clone())
            .unwrap_or_default()
    }

    /// Runs `f` over the raw vertex storage, e.g. for an upload.
    pub fn with_vertices<R>(&self, f: impl FnOnce(&[SpriteVertex]) -> R) -> R {
        f(&self.inner.borrow().vertices)
    }

    pub(crate) fn contains(&self, id: InterfacerId) -> bool {
        self.inner.borrow().quads.contains_key(&id)
    }

    pub(crate) fn insert_quad(&self, quad: DetachedQuad) -> InterfacerId {
        let mut storage = self.inner.borrow_mut();
        let id = InterfacerId(storage.next_id);
        storage.next_id += 1;
        let slot = storage.allocate_slot();
        let base = slot * QUAD_VERTICES;
        storage.vertices[base..base + QUAD_VERTICES].copy_from_slice(&quad.vertices);
        let record = QuadRecord {
            slot,
            group: quad.group,
            visible: quad.visible,
            states: quad.states,
        };
        storage.register(id, &record);
        storage.quads.insert(id, record);
        id
    }

    /// Removes a quad, handing back everything needed to recreate it elsewhere.
    pub(crate) fn take_quad(&self, id: InterfacerId) -> Option<DetachedQuad> {
        let mut storage = self.inner.borrow_mut();
        let record = storage.quads.remove(&id)?;
        storage.unregister(id, &record);
        let base = record.slot * QUAD_VERTICES;
        let mut vertices = [SpriteVertex::default(); QUAD_VERTICES];
        vertices.copy_from_slice(&storage.vertices[base..base + QUAD_VERTICES]);
        storage.release_slot(record.slot);
        Some(DetachedQuad {
            group: record.group,
            visible: record.visible,
            states: record.states,
            vertices,
        })
    }

    pub(crate) fn write_channel(&self, id: InterfacerId, channel: Channel, values: &[f32]) {
        let comps = channel.components();
        debug_assert_eq!(
            values.len(),
            comps * QUAD_VERTICES,
            "channel {channel:?} expects {} values",
            comps * QUAD_VERTICES
        );
        let mut storage = self.inner.borrow_mut();
        let Some(slot) = storage.quads.get(&id).map(|r| r.slot) else {
            debug_assert!(false, "quad {id:?} is not part of this batch");
            return;
        };
        let base = slot * QUAD_VERTICES;
        for (vertex, chunk) in storage.vertices[base..base + QUAD_VERTICES]
            .iter_mut()
            .zip(values.chunks(comps))
        {
            channel.get_mut(vertex).copy_from_slice(chunk);
        }
    }

    pub(crate) fn read_channel(&self, id: InterfacerId, channel: Channel) -> Vec<f32> {
        let storage = self.inner.borrow();
        let Some(record) = storage.quads.get(&id) else {
            return Vec::new();
        };
        let base = record.slot * QUAD_VERTICES;
        storage.vertices[base..base + QUAD_VERTICES]
            .iter()
            .flat_map(|v| channel.get(v).iter().copied())
            .collect()
    }

    pub(crate) fn set_states(&self, id: InterfacerId, states: HashMap<CameraId, RenderState>) {
        self.inner.borrow_mut().update_record(id, |record| record.states = states);
    }

    pub(crate) fn set_group(&self, id: InterfacerId, group: &Group) {
        self.inner
            .borrow_mut()
            .update_record(id, |record| record.group = group.clone());
    }

    pub(crate) fn states(&self, id: InterfacerId) -> HashMap<CameraId, RenderState> {
        self.inner
            .borrow()
            .quads
            .get(&id)
            .map(|r| r.states.clone())
            .unwrap_or_default()
    }

    pub(crate) fn group(&self, id: InterfacerId) -> Option<Group> {
        self.inner.borrow().quads.get(&id).map(|r| r.group.clone())
    }

    pub(crate) fn set_visible(&self, id: InterfacerId, visible: bool) {
        let mut storage = self.inner.borrow_mut();
        let Some(record) = storage.quads.get_mut(&id) else {
            return;
        };
        if record.visible == visible {
            return;
        }
        record.visible = visible;
        let cams: Vec<CameraId> = record.states.keys().copied().collect();
        storage.mark_dirty(cams);
    }

    pub(crate) fn is_visible(&self, id: InterfacerId) -> bool {
        self.inner
            .borrow()
            .quads
            .get(&id)
            .is_some_and(|r| r.visible)
    }
}

impl BatchStorage {
    fn allocate_slot(&mut self) -> usize {
        if let Some(slot) = self.free_slots.pop() {
            return slot;
        }
        let slot = self.vertices.len() / QUAD_VERTICES;
        self.vertices
            .extend_from_slice(&[SpriteVertex::default(); QUAD_VERTICES]);
        slot
    }

    fn release_slot(&mut self, slot: usize) {
        let base = slot * QUAD_VERTICES;
        self.vertices[base..base + QUAD_VERTICES].fill(SpriteVertex::default());
        self.free_slots.push(slot);
    }

    fn register(&mut self, id: InterfacerId, record: &QuadRecord) {
        for (camera, state) in &record.states {
            let dl = self.draw_lists.entry(*camera).or_default();
            dl.members.insert(id);
            *dl.state_refs.entry(state.clone()).or_insert(0) += 1;
            dl.dirty = true;
        }
    }

    fn unregister(&mut self, id: InterfacerId, record: &QuadRecord) {
        for (camera, state) in &record.states {
            let Some(dl) = self.draw_lists.get_mut(camera) else {
                continue;
            };
            dl.members.remove(&id);
            if let Some(count) = dl.state_refs.get_mut(state) {
                *count -= 1;
                if *count == 0 {
                    dl.state_refs.remove(state);
                }
            }
            dl.dirty = true;
        }
    }

    /// Re-registers a quad around a mutation of its record.
    fn update_record(&mut self, id: InterfacerId, f: impl FnOnce(&mut QuadRecord)) {
        let Some(mut record) = self.quads.remove(&id) else {
            debug_assert!(false, "quad {id:?} is not part of this batch");
            return;
        };
        self.unregister(id, &record);
        f(&mut record);
        self.register(id, &record);
        self.quads.insert(id, record);
    }

    fn mark_dirty(&mut self, cameras: impl IntoIterator<Item = CameraId>) {
        for camera in cameras {
            if let Some(dl) = self.draw_lists.get_mut(&camera) {
                dl.dirty = true;
            }
        }
    }

    fn rebuild_if_dirty(&mut self, camera: CameraId) {
        let BatchStorage {
            quads, draw_lists, ..
        } = self;
        let Some(dl) = draw_lists.get_mut(&camera) else {
            return;
        };
        if !dl.dirty {
            return;
        }

        let mut entries: Vec<(Vec<i32>, &RenderState, usize)> = dl
            .members
            .iter()
            .filter_map(|id| quads.get(id))
            .filter(|record| record.visible)
            .filter_map(|record| {
                let state = record.states.get(&camera)?;
                Some((record.group.order_path(), state, record.slot))
            })
            .collect();
        // Equal order paths may be drawn in any order, so sort those by descriptor
        // to bring equal states next to each other.
        entries.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let mut wall = StateWall::new();
        let mut calls: Vec<DrawCall> = Vec::new();
        let mut indices = Vec::with_capacity(entries.len() * QUAD_INDICES.len());
        for (_, state, slot) in entries {
            let index_start = indices.len() as u32;
            let base = (slot * QUAD_VERTICES) as u32;
            indices.extend(QUAD_INDICES.iter().map(|i| base + i));
            match calls.last_mut() {
                Some(last) if &last.state == state => {
                    last.index_count += QUAD_INDICES.len() as u32;
                }
                _ => calls.push(DrawCall {
                    state: state.clone(),
                    switches: wall.switch(state),
                    index_start,
                    index_count: QUAD_INDICES.len() as u32,
                }),
            }
        }

        log::debug!(
            "rebuilt draw list for camera {:?}: {} calls, {} indices",
            camera,
            calls.len(),
            indices.len()
        );
        dl.calls = calls;
        dl.indices = indices;
        dl.dirty = false;
    }
}

impl Default for Batch {
    fn default() -> Self {
        Batch::new()
    }
}

impl PartialEq for Batch {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Batch {}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.inner.borrow();
        f.debug_struct("Batch")
            .field("id", &storage.id)
            .field("quads", &storage.quads.len())
            .field("cameras", &storage.draw_lists.len())
            .finish()
    }
}
