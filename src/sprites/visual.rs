use crate::anim::Ease;
use crate::context::RenderContext;
use crate::effects::{CompletionCallback, EffectHandle, TweenAttr};
use crate::error::Result;
use crate::sprites::container::SpriteContainer;
use crate::sprites::sprite::Sprite;
use crate::utils::Position;

/// Anything a scene or container can hold.
pub enum Visual {
    Leaf(Sprite),
    Composite(SpriteContainer),
}

macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            Visual::Leaf($v) => $body,
            Visual::Composite($v) => $body,
        }
    };
}

impl Visual {
    pub fn update(&mut self, dt: f32) {
        dispatch!(self, v => v.update(dt))
    }

    pub fn set_context(&mut self, parent: &RenderContext) {
        dispatch!(self, v => v.set_context(parent))
    }

    pub fn delete(&mut self) {
        dispatch!(self, v => v.delete())
    }

    pub fn position(&self) -> Position {
        dispatch!(self, v => v.position())
    }

    pub fn set_position(&mut self, position: Position) {
        dispatch!(self, v => v.set_position(position))
    }

    pub fn translate(&mut self, delta: Position) {
        match self {
            Visual::Leaf(s) => s.set_position(s.position() + delta),
            Visual::Composite(c) => c.translate(delta),
        }
    }

    pub fn x(&self) -> f32 {
        dispatch!(self, v => v.x())
    }

    pub fn y(&self) -> f32 {
        dispatch!(self, v => v.y())
    }

    pub fn width(&self) -> f32 {
        dispatch!(self, v => v.width())
    }

    pub fn height(&self) -> f32 {
        dispatch!(self, v => v.height())
    }

    pub fn opacity(&self) -> f32 {
        dispatch!(self, v => v.opacity())
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        dispatch!(self, v => v.set_opacity(opacity))
    }

    pub fn visible(&self) -> bool {
        dispatch!(self, v => v.visible())
    }

    pub fn set_visible(&mut self, visible: bool) {
        dispatch!(self, v => v.set_visible(visible))
    }

    pub fn start_tween(
        &mut self,
        ease: Ease,
        attributes: &[(TweenAttr, f32)],
        duration: f32,
        on_complete: Option<CompletionCallback>,
    ) -> Result<EffectHandle> {
        dispatch!(self, v => v.start_tween(ease, attributes, duration, on_complete))
    }

    pub fn start_flicker(
        &mut self,
        duration: f32,
        interval: f32,
        end_visibility: bool,
        on_complete: Option<CompletionCallback>,
    ) -> Result<EffectHandle> {
        dispatch!(self, v => v.start_flicker(duration, interval, end_visibility, on_complete))
    }

    pub fn start_flicker_from(
        &mut self,
        duration: f32,
        interval: f32,
        start_visibility: bool,
        end_visibility: bool,
        on_complete: Option<CompletionCallback>,
    ) -> Result<EffectHandle> {
        dispatch!(self, v => v.start_flicker_from(
            duration,
            interval,
            start_visibility,
            end_visibility,
            on_complete
        ))
    }

    pub fn remove_effect(&mut self, handles: &[EffectHandle]) {
        dispatch!(self, v => v.remove_effect(handles))
    }

    pub fn start_movement(&mut self, velocity: Position, acceleration: Option<Position>) {
        dispatch!(self, v => v.start_movement(velocity, acceleration))
    }

    pub fn stop_movement(&mut self) {
        dispatch!(self, v => v.stop_movement())
    }

    pub fn as_sprite(&self) -> Option<&Sprite> {
        match self {
            Visual::Leaf(s) => Some(s),
            Visual::Composite(_) => None,
        }
    }

    pub fn as_sprite_mut(&mut self) -> Option<&mut Sprite> {
        match self {
            Visual::Leaf(s) => Some(s),
            Visual::Composite(_) => None,
        }
    }

    pub fn as_container(&self) -> Option<&SpriteContainer> {
        match self {
            Visual::Composite(c) => Some(c),
            Visual::Leaf(_) => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut SpriteContainer> {
        match self {
            Visual::Composite(c) => Some(c),
            Visual::Leaf(_) => None,
        }
    }
}

impl From<Sprite> for Visual {
    fn from(sprite: Sprite) -> Self {
        Visual::Leaf(sprite)
    }
}

impl From<SpriteContainer> for Visual {
    fn from(container: SpriteContainer) -> Self {
        Visual::Composite(container)
    }
}
