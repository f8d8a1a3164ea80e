use std::collections::HashMap;

use crate::camera::CameraId;
use crate::graphics::batch::{Batch, Channel, DetachedQuad, InterfacerId, QUAD_VERTICES};
use crate::graphics::group::Group;
use crate::graphics::state::RenderState;

/// Handle to one quad inside a [`Batch`].
///
/// Every write goes straight into the batch's vertex storage. After
/// [`Interfacer::delete`] the handle is inert: debug builds assert on further
/// use, release builds ignore it.
#[derive(Debug)]
pub struct Interfacer {
    batch: Batch,
    id: InterfacerId,
    deleted: bool,
}

impl Interfacer {
    pub(crate) fn new(batch: Batch, id: InterfacerId) -> Self {
        Self {
            batch,
            id,
            deleted: false,
        }
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn id(&self) -> InterfacerId {
        self.id
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn alive(&self) -> bool {
        debug_assert!(!self.deleted, "interfacer {:?} used after delete", self.id);
        !self.deleted
    }

    /// Writes all four vertices of `channel`; `values` holds `components * 4` floats.
    pub fn set_data(&mut self, channel: Channel, values: &[f32]) {
        if self.alive() {
            self.batch.write_channel(self.id, channel, values);
        }
    }

    /// Writes the same value to all four vertices of `channel`.
    pub fn set_vertex_attr(&mut self, channel: Channel, value: &[f32]) {
        if !self.alive() {
            return;
        }
        debug_assert_eq!(value.len(), channel.components());
        let values: Vec<f32> = value
            .iter()
            .copied()
            .cycle()
            .take(value.len() * QUAD_VERTICES)
            .collect();
        self.batch.write_channel(self.id, channel, &values);
    }

    pub fn data(&self, channel: Channel) -> Vec<f32> {
        if !self.alive() {
            return Vec::new();
        }
        self.batch.read_channel(self.id, channel)
    }

    pub fn set_states(&mut self, states: HashMap<CameraId, RenderState>) {
        if self.alive() {
            self.batch.set_states(self.id, states);
        }
    }

    pub fn states(&self) -> HashMap<CameraId, RenderState> {
        if !self.alive() {
            return HashMap::new();
        }
        self.batch.states(self.id)
    }

    pub fn group(&self) -> Option<Group> {
        if !self.alive() {
            return None;
        }
        self.batch.group(self.id)
    }

    /// Moves the quad to `batch` under `group`, keeping its vertex data.
    ///
    /// Without `states` the current descriptors are kept. Migrating within the
    /// same batch only regroups.
    pub fn migrate(
        &mut self,
        batch: &Batch,
        group: &Group,
        states: Option<HashMap<CameraId, RenderState>>,
    ) {
        if !self.alive() {
            return;
        }
        if &self.batch == batch {
            self.batch.set_group(self.id, group);
            if let Some(states) = states {
                self.batch.set_states(self.id, states);
            }
            return;
        }

        let Some(quad) = self.batch.take_quad(self.id) else {
            debug_assert!(false, "quad {:?} vanished from its batch", self.id);
            return;
        };
        let new_id = batch.insert_quad(DetachedQuad {
            group: group.clone(),
            visible: quad.visible,
            states: states.unwrap_or(quad.states),
            vertices: quad.vertices,
        });
        log::debug!(
            "migrated quad {:?} from batch {} to batch {} as {:?}",
            self.id,
            self.batch.id(),
            batch.id(),
            new_id
        );
        self.batch = batch.clone();
        self.id = new_id;
    }

    pub fn set_visibility(&mut self, visible: bool) {
        if self.alive() {
            self.batch.set_visible(self.id, visible);
        }
    }

    pub fn visible(&self) -> bool {
        self.alive() && self.batch.is_visible(self.id)
    }

    /// Frees the quad's slot. Further calls on this handle do nothing.
    pub fn delete(&mut self) {
        if self.deleted {
            return;
        }
        self.batch.take_quad(self.id);
        self.deleted = true;
    }
}
