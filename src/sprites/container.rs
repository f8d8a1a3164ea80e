//! Composite visual: a group of visuals moved, faded and hidden together.
//!
//! The container has no quad of its own. Writes to its position or opacity are
//! turned into deltas and re-dispatched to every child.

use crate::anim::Ease;
use crate::context::RenderContext;
use crate::effects::{
    self, CompletionCallback, Effect, EffectHandle, EffectSet, ToggleSpec, TweenAttr,
};
use crate::error::Result;
use crate::movement::Movement;
use crate::sprites::visual::Visual;
use crate::traits::{Accessor, Tweenable};
use crate::utils::{clamp, Position};

pub struct SpriteContainer {
    context: RenderContext,
    children: Vec<Visual>,
    position: Position,
    opacity: f32,
    visible: bool,
    movement: Option<Movement>,
    effects: EffectSet<SpriteContainer>,
}

impl SpriteContainer {
    pub fn new(position: Position, parent: &RenderContext) -> Self {
        Self {
            context: parent.child(0),
            children: Vec::new(),
            position,
            opacity: 255.0,
            visible: true,
            movement: None,
            effects: EffectSet::new(),
        }
    }

    /// Adopts `child`, shifting it by the container's position.
    pub fn add(&mut self, child: impl Into<Visual>) {
        let mut child = child.into();
        child.translate(self.position);
        child.set_context(&self.context);
        self.children.push(child);
    }

    /// Releases the child at `index`, shifted back into its own coordinates.
    ///
    /// The child keeps drawing in this container's context until the caller
    /// gives it a new one with [`Visual::set_context`].
    pub fn remove(&mut self, index: usize) -> Option<Visual> {
        if index >= self.children.len() {
            return None;
        }
        let mut child = self.children.remove(index);
        child.translate(-self.position);
        Some(child)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Visual> {
        self.children.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Visual> {
        self.children.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Visual> {
        self.children.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Visual> {
        self.children.iter_mut()
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn set_context(&mut self, parent: &RenderContext) {
        let Some((next, change)) = self.context.rebind(parent) else {
            return;
        };
        self.context = next;
        for child in &mut self.children {
            child.set_context(&self.context);
        }
        log::debug!(
            "container context changed for {} children: {change:?}",
            self.children.len()
        );
    }

    pub fn update(&mut self, dt: f32) {
        for child in &mut self.children {
            child.update(dt);
        }
        if let Some(movement) = self.movement.as_mut() {
            let delta = movement.update(dt);
            self.set_position(self.position + delta);
        }
        effects::update_effects(self, dt);
    }

    pub fn delete(&mut self) {
        self.effects.remove(&[]);
        self.movement = None;
        for child in &mut self.children {
            child.delete();
        }
        self.children.clear();
    }

    /// Moves the container and every child by `delta`.
    pub fn translate(&mut self, delta: Position) {
        self.position += delta;
        for child in &mut self.children {
            child.translate(delta);
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.translate(position - self.position);
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn set_x(&mut self, x: f32) {
        self.translate(Position::new(x - self.position.x, 0.0));
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.translate(Position::new(0.0, y - self.position.y));
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Shifts every child's opacity by the change in the container's.
    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = clamp(opacity, 0.0, 255.0);
        let delta = opacity - self.opacity;
        self.opacity = opacity;
        for child in &mut self.children {
            child.set_opacity(child.opacity() + delta);
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        for child in &mut self.children {
            child.set_visible(visible);
        }
    }

    /// Horizontal extent of the children, 0 when empty.
    pub fn width(&self) -> f32 {
        let min = self.children.iter().map(Visual::x).reduce(f32::min);
        let max = self
            .children
            .iter()
            .map(|c| c.x() + c.width())
            .reduce(f32::max);
        match (min, max) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        }
    }

    pub fn height(&self) -> f32 {
        let min = self.children.iter().map(Visual::y).reduce(f32::min);
        let max = self
            .children
            .iter()
            .map(|c| c.y() + c.height())
            .reduce(f32::max);
        match (min, max) {
            (Some(min), Some(max)) => max - min,
            _ => 0.0,
        }
    }

    /// Only `X`, `Y` and `Opacity` can be tweened on a container.
    pub fn start_tween(
        &mut self,
        ease: Ease,
        attributes: &[(TweenAttr, f32)],
        duration: f32,
        on_complete: Option<CompletionCallback>,
    ) -> Result<EffectHandle> {
        let effect = Effect::tween(self, ease, attributes, duration, on_complete)?;
        Ok(self.effects.push(effect))
    }

    pub fn start_flicker(
        &mut self,
        duration: f32,
        interval: f32,
        end_visibility: bool,
        on_complete: Option<CompletionCallback>,
    ) -> Result<EffectHandle> {
        let start_visibility = self.visible();
        self.start_flicker_from(duration, interval, start_visibility, end_visibility, on_complete)
    }

    /// Shows `start_visibility` right away, then flips every `interval` seconds.
    pub fn start_flicker_from(
        &mut self,
        duration: f32,
        interval: f32,
        start_visibility: bool,
        end_visibility: bool,
        on_complete: Option<CompletionCallback>,
    ) -> Result<EffectHandle> {
        let effect = Effect::flicker(
            interval,
            start_visibility,
            end_visibility,
            duration,
            on_complete,
        )?;
        self.set_visible(start_visibility);
        Ok(self.effects.push(effect))
    }

    pub fn start_toggle(&mut self, spec: ToggleSpec<SpriteContainer>) -> Result<EffectHandle> {
        let effect = Effect::toggle(spec)?;
        Ok(self.effects.push(effect))
    }

    pub fn remove_effect(&mut self, handles: &[EffectHandle]) {
        self.effects.remove(handles);
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn start_movement(&mut self, velocity: Position, acceleration: Option<Position>) {
        self.movement = Some(Movement::new(
            velocity,
            acceleration.unwrap_or(Position::ZERO),
        ));
    }

    pub fn stop_movement(&mut self) {
        self.movement = None;
    }
}

impl Tweenable for SpriteContainer {
    fn accessor(attr: TweenAttr) -> Option<Accessor<Self>> {
        let (get, set): (fn(&SpriteContainer) -> f32, fn(&mut SpriteContainer, f32)) = match attr
        {
            TweenAttr::X => (SpriteContainer::x, SpriteContainer::set_x),
            TweenAttr::Y => (SpriteContainer::y, SpriteContainer::set_y),
            TweenAttr::Opacity => (SpriteContainer::opacity, SpriteContainer::set_opacity),
            _ => return None,
        };
        Some(Accessor { get, set })
    }

    fn visible(&self) -> bool {
        SpriteContainer::visible(self)
    }

    fn set_visible(&mut self, visible: bool) {
        SpriteContainer::set_visible(self, visible);
    }

    fn effects_mut(&mut self) -> &mut EffectSet<Self> {
        &mut self.effects
    }
}
