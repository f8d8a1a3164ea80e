use std::cell::RefCell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use uuid::Uuid;

use crate::graphics::state::UniformBinding;
use crate::{Position, Rectangle, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub Uuid);

/// std140 layout of the per-camera uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub zoom: f32,
    pub _pad: f32,
    pub position: [f32; 2],
    pub game_dimensions: [f32; 2],
    pub dimensions: [f32; 2],
}

#[derive(Debug)]
struct CameraView {
    position: Position,
    zoom: f32,
    dimensions: Size,
    game_dimensions: Size,
    boundary: Option<Rectangle>,
    follow_target: Option<Position>,
    follow_lerp: f32,
}

/// Shared camera handle.
///
/// Clones refer to the same view. Identity (`id`) keys descriptor maps, the
/// uniform binding is what a sprite's GPU state references.
#[derive(Debug, Clone)]
pub struct Camera {
    id: CameraId,
    binding: UniformBinding,
    view: Rc<RefCell<CameraView>>,
}

impl Camera {
    pub fn new(binding: UniformBinding, dimensions: Size, game_dimensions: Size) -> Self {
        Self {
            id: CameraId(Uuid::new_v4()),
            binding,
            view: Rc::new(RefCell::new(CameraView {
                position: Position::ZERO,
                zoom: 1.0,
                dimensions,
                game_dimensions,
                boundary: None,
                follow_target: None,
                follow_lerp: 1.0,
            })),
        }
    }

    /// Camera covering the whole game area at binding 0.
    ///
    /// Scenes that draw without a real camera pass one of these explicitly.
    pub fn null(game_dimensions: Size) -> Self {
        Self::new(UniformBinding(0), game_dimensions, game_dimensions)
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    pub fn binding(&self) -> UniformBinding {
        self.binding
    }

    pub fn position(&self) -> Position {
        self.view.borrow().position
    }

    pub fn zoom(&self) -> f32 {
        self.view.borrow().zoom
    }

    pub fn set_zoom(&self, zoom: f32) {
        self.view.borrow_mut().zoom = zoom;
    }

    pub fn set_boundary(&self, boundary: Rectangle) {
        let mut view = self.view.borrow_mut();
        view.boundary = Some(boundary);
        let pos = view.position;
        view.position = view.constrain(pos);
    }

    pub fn clear_boundary(&self) {
        self.view.borrow_mut().boundary = None;
    }

    pub fn set_position(&self, new_pos: Position) {
        let mut view = self.view.borrow_mut();
        view.position = view.constrain(new_pos);
    }

    /// Centers the view on `point`.
    pub fn look_at(&self, point: Position) {
        let mut view = self.view.borrow_mut();
        let center = Position::new(view.game_dimensions.width / 2.0, view.game_dimensions.height / 2.0);
        view.position = view.constrain(point - center);
    }

    /// Makes [`Camera::update`] move the view towards `target` by `lerp` of the remaining distance.
    pub fn set_follow_target(&self, target: Option<Position>, lerp: f32) {
        let mut view = self.view.borrow_mut();
        view.follow_target = target;
        view.follow_lerp = lerp;
    }

    pub fn update(&self) {
        let mut view = self.view.borrow_mut();
        let Some(target) = view.follow_target else {
            return;
        };
        let center = Position::new(view.game_dimensions.width / 2.0, view.game_dimensions.height / 2.0);
        let goal = target - center;
        let stepped = view.position + (goal - view.position) * view.follow_lerp;
        view.position = view.constrain(stepped);
    }

    pub fn uniform(&self) -> CameraUniform {
        let view = self.view.borrow();
        CameraUniform {
            zoom: view.zoom,
            _pad: 0.0,
            position: view.position.to_array(),
            game_dimensions: [view.game_dimensions.width, view.game_dimensions.height],
            dimensions: [view.dimensions.width, view.dimensions.height],
        }
    }
}

impl CameraView {
    /// Keeps the visible area inside the boundary, if any.
    fn constrain(&self, pos: Position) -> Position {
        let Some(boundary) = &self.boundary else {
            return pos;
        };
        let view_w = self.dimensions.width / self.zoom;
        let view_h = self.dimensions.height / self.zoom;
        let max_x = (boundary.x + boundary.width - view_w).max(boundary.x);
        let max_y = (boundary.y + boundary.height - view_h).max(boundary.y);
        Position {
            x: pos.x.clamp(boundary.x, max_x),
            y: pos.y.clamp(boundary.y, max_y),
        }
    }
}

impl PartialEq for Camera {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Camera {}

impl Hash for Camera {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
