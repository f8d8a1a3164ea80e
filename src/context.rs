use std::collections::HashSet;

use crate::camera::{Camera, CameraId};
use crate::graphics::batch::Batch;
use crate::graphics::group::Group;

/// Where an object is drawn: a batch, a group inside it and the cameras looking at it.
#[derive(Debug, Clone)]
pub struct RenderContext {
    batch: Batch,
    group: Group,
    cameras: Vec<Camera>,
}

/// Which parts of a context differ from a previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextChange {
    pub batch_changed: bool,
    pub group_changed: bool,
    pub cameras_changed: bool,
}

impl ContextChange {
    pub fn is_empty(&self) -> bool {
        !(self.batch_changed || self.group_changed || self.cameras_changed)
    }
}

impl RenderContext {
    /// Duplicate cameras are dropped, keeping the first occurrence.
    pub fn new(batch: Batch, group: Group, cameras: impl IntoIterator<Item = Camera>) -> Self {
        let mut seen = HashSet::new();
        let cameras = cameras
            .into_iter()
            .filter(|cam| seen.insert(cam.id()))
            .collect();
        Self {
            batch,
            group,
            cameras,
        }
    }

    /// Fresh batch and root group seen through `camera`.
    pub fn with_camera(camera: Camera) -> Self {
        Self::new(Batch::new(), Group::default(), [camera])
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn camera_ids(&self) -> HashSet<CameraId> {
        self.cameras.iter().map(Camera::id).collect()
    }

    /// Same batch and cameras, under a new child group of this context's group.
    pub fn child(&self, order: i32) -> RenderContext {
        Self {
            batch: self.batch.clone(),
            group: Group::child_of(&self.group, order),
            cameras: self.cameras.clone(),
        }
    }

    pub fn diff(&self, other: &RenderContext) -> ContextChange {
        ContextChange {
            batch_changed: self.batch != other.batch,
            group_changed: self.group != other.group,
            cameras_changed: self.camera_ids() != other.camera_ids(),
        }
    }

    /// The context an object owning `self` should move to when nested under `parent`.
    ///
    /// Returns `None` when `self` already hangs off `parent` with the same
    /// batch and cameras, so callers can skip the rebuild entirely.
    pub fn rebind(&self, parent: &RenderContext) -> Option<(RenderContext, ContextChange)> {
        let batch_changed = self.batch != parent.batch;
        let cameras_changed = self.camera_ids() != parent.camera_ids();
        let parent_changed = self.group.parent() != Some(&parent.group);
        if !(batch_changed || cameras_changed || parent_changed) {
            return None;
        }
        let next = parent.child(self.group.order());
        Some((
            next,
            ContextChange {
                batch_changed,
                group_changed: true,
                cameras_changed,
            },
        ))
    }
}
