//! The leaf visual.
//!
//! A [`Sprite`] keeps its transform, color and texture on the CPU side and
//! pushes every change straight into its quad through the [`Interfacer`].
//! There is no dirty tracking: the batch always holds the current values.

use std::collections::HashMap;

use crate::anim::Ease;
use crate::animation::controller::AnimationController;
use crate::camera::{Camera, CameraId};
use crate::config::EngineConfig;
use crate::context::RenderContext;
use crate::effects::{
    self, CompletionCallback, Effect, EffectHandle, EffectSet, ToggleSpec, TweenAttr,
};
use crate::error::Result;
use crate::graphics::batch::{Batch, Channel};
use crate::graphics::interfacer::Interfacer;
use crate::graphics::state::{BlendFunc, Capability, ProgramId, RenderState, StatePart};
use crate::movement::Movement;
use crate::texture::{Texture, TextureProvider};
use crate::traits::{Accessor, Tweenable};
use crate::utils::{clamp, Color, Position, Rectangle};

/// Creation-time options of a sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteOptions {
    pub program: ProgramId,
    pub blend: BlendFunc,
    /// Keep fractional vertex positions instead of truncating to whole pixels.
    pub subpixel: bool,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            program: ProgramId(0),
            blend: BlendFunc::ALPHA,
            subpixel: false,
        }
    }
}

impl From<&EngineConfig> for SpriteOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            blend: config.blend,
            subpixel: config.subpixel,
            ..Self::default()
        }
    }
}

pub struct Sprite {
    context: RenderContext,
    interfacer: Interfacer,
    animation: AnimationController,
    movement: Option<Movement>,
    effects: EffectSet<Sprite>,

    texture: Texture,
    /// Footprint of the displayed frame inside its untrimmed bounds.
    frame_source: Rectangle,
    width: f32,
    height: f32,

    position: Position,
    rotation: f32,
    scale: f32,
    scale_x: f32,
    scale_y: f32,
    scroll_factor: Position,
    origin: Position,
    offset: Position,
    flip_x: bool,
    flip_y: bool,
    color: Color,
    /// 0 to 255, kept fractional so small fade steps add up.
    opacity: f32,

    options: SpriteOptions,
}

impl Sprite {
    pub fn new(texture: Texture, position: Position, parent: &RenderContext) -> Self {
        Self::with_options(texture, position, parent, SpriteOptions::default())
    }

    /// A sprite showing the provider's fallback texture.
    pub fn with_fallback(
        provider: &dyn TextureProvider,
        position: Position,
        parent: &RenderContext,
    ) -> Self {
        Self::new(provider.fallback_texture(), position, parent)
    }

    pub fn with_options(
        texture: Texture,
        position: Position,
        parent: &RenderContext,
        options: SpriteOptions,
    ) -> Self {
        let context = parent.child(0);
        let states = Self::states_for(&context, &texture, &options);
        let interfacer = context.batch().add_quad(context.group(), states);
        let frame_source = Rectangle::new(0.0, 0.0, texture.width(), texture.height());

        let mut sprite = Self {
            context,
            interfacer,
            animation: AnimationController::new(),
            movement: None,
            effects: EffectSet::new(),
            width: frame_source.width,
            height: frame_source.height,
            texture,
            frame_source,
            position,
            rotation: 0.0,
            scale: 1.0,
            scale_x: 1.0,
            scale_y: 1.0,
            scroll_factor: Position::new(1.0, 1.0),
            origin: Position::ZERO,
            offset: Position::ZERO,
            flip_x: false,
            flip_y: false,
            color: Color::WHITE,
            opacity: 255.0,
            options,
        };
        sprite.write_all_channels();
        sprite.center_origin();
        sprite
    }

    /// GPU state for drawing this sprite through `camera`.
    pub fn build_state(&self, camera: &Camera) -> RenderState {
        Self::state_for(camera, &self.texture, &self.options)
    }

    fn state_for(camera: &Camera, texture: &Texture, options: &SpriteOptions) -> RenderState {
        RenderState::from_parts([
            StatePart::Program(options.program),
            StatePart::UniformBinding(camera.binding()),
            StatePart::TextureUnit(0),
            StatePart::Texture(texture.id()),
            StatePart::Enable(Capability::Blend),
            StatePart::BlendFunc(options.blend),
        ])
    }

    fn states_for(
        context: &RenderContext,
        texture: &Texture,
        options: &SpriteOptions,
    ) -> HashMap<CameraId, RenderState> {
        context
            .cameras()
            .iter()
            .map(|cam| (cam.id(), Self::state_for(cam, texture, options)))
            .collect()
    }

    fn rebuild_states(&mut self) {
        let states = Self::states_for(&self.context, &self.texture, &self.options);
        self.interfacer.set_states(states);
    }

    fn write_all_channels(&mut self) {
        self.update_vertex_positions();
        self.push_translate();
        self.interfacer
            .set_vertex_attr(Channel::Offset, &self.offset.to_array());
        self.push_flip();
        self.interfacer
            .set_vertex_attr(Channel::ScrollFactor, &self.scroll_factor.to_array());
        self.interfacer
            .set_vertex_attr(Channel::Origin, &self.origin.to_array());
        self.interfacer
            .set_vertex_attr(Channel::Rotation, &[self.rotation]);
        self.push_scale();
        self.interfacer
            .set_data(Channel::TexCoords, &self.texture.tex_coords());
        self.push_color();
    }

    fn update_vertex_positions(&mut self) {
        if self.texture.anchor() != Position::ZERO {
            log::warn!("ignoring non-zero texture anchor {:?}", self.texture.anchor());
        }
        let (mut w, mut h) = (self.texture.width(), self.texture.height());
        if !self.options.subpixel {
            w = w.trunc();
            h = h.trunc();
        }
        self.interfacer.set_data(
            Channel::Position,
            &[0.0, 0.0, w, 0.0, w, h, 0.0, h],
        );
    }

    fn push_translate(&mut self) {
        self.interfacer
            .set_vertex_attr(Channel::Translate, &self.position.to_array());
    }

    fn push_scale(&mut self) {
        self.interfacer.set_vertex_attr(
            Channel::Scale,
            &[self.scale * self.scale_x, self.scale * self.scale_y],
        );
    }

    fn push_flip(&mut self) {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        self.interfacer
            .set_vertex_attr(Channel::Flip, &[flag(self.flip_x), flag(self.flip_y)]);
    }

    fn push_color(&mut self) {
        let rgba = self.color.normalized(self.opacity.round() as u8);
        self.interfacer.set_vertex_attr(Channel::Color, &rgba);
    }

    /// Shows `texture` with the given frame footprint. States are only rebuilt
    /// when the GPU texture changes, vertex positions only when the size does.
    fn set_frame_texture(&mut self, texture: Texture, source: Rectangle) {
        let resized = texture.size() != self.texture.size();
        let rebind = texture.id() != self.texture.id();
        self.texture = texture;
        self.frame_source = source;
        if rebind {
            self.rebuild_states();
        }
        self.interfacer
            .set_data(Channel::TexCoords, &self.texture.tex_coords());
        if resized {
            self.update_vertex_positions();
        }
    }

    /// Replaces the displayed image, dropping every registered animation.
    pub fn set_image(&mut self, texture: Texture) {
        self.animation.clear();
        self.check_animation();
        let source = Rectangle::new(0.0, 0.0, texture.width(), texture.height());
        self.set_frame_texture(texture, source);
        self.set_dimensions_from_frame();
        self.center_origin();
    }

    /// Applies texture and offset changes the animation controller has pending.
    pub fn check_animation(&mut self) {
        if let Some(texture) = self.animation.query_new_texture() {
            let source = self
                .animation
                .current_frame()
                .map(|f| f.source)
                .unwrap_or_else(|| Rectangle::new(0.0, 0.0, texture.width(), texture.height()));
            self.set_frame_texture(texture, source);
        }
        if let Some(delta) = self.animation.query_new_offset() {
            // Deltas displace the sprite; the offset channel is subtracted.
            let scaled = Position::new(
                delta.x * self.scale * self.scale_x,
                delta.y * self.scale * self.scale_y,
            );
            self.set_offset(self.offset - scaled);
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.animation.is_set() {
            self.animation.update(dt);
            self.check_animation();
        }
        if let Some(movement) = self.movement.as_mut() {
            let delta = movement.update(dt);
            self.set_position(self.position + delta);
        }
        effects::update_effects(self, dt);
    }

    /// Moves the sprite under `parent`, migrating its quad only when the batch changes.
    pub fn set_context(&mut self, parent: &RenderContext) {
        let Some((next, change)) = self.context.rebind(parent) else {
            return;
        };
        self.context = next;
        let states = (change.batch_changed || change.cameras_changed).then(|| {
            Self::states_for(&self.context, &self.texture, &self.options)
        });
        let batch = self.context.batch().clone();
        let group = self.context.group().clone();
        self.interfacer.migrate(&batch, &group, states);
        log::debug!("sprite context changed: {change:?}");
    }

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

    /// Flickers visibility every `interval` seconds, ending at `end_visibility`.
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

    pub fn start_toggle(&mut self, spec: ToggleSpec<Sprite>) -> Result<EffectHandle> {
        let effect = Effect::toggle(spec)?;
        Ok(self.effects.push(effect))
    }

    /// Cancels effects without completion callbacks; an empty slice cancels all.
    pub fn remove_effect(&mut self, handles: &[EffectHandle]) {
        self.effects.remove(handles);
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn has_effect(&self, handle: EffectHandle) -> bool {
        self.effects.contains(handle)
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

    pub fn movement(&self) -> Option<&Movement> {
        self.movement.as_ref()
    }

    /// Turns the sprite into a `w` by `h` rectangle of the given color.
    pub fn make_rect(
        &mut self,
        provider: &dyn TextureProvider,
        color: Color,
        opacity: f32,
        w: f32,
        h: f32,
    ) {
        self.set_image(provider.pixel_texture());
        self.set_scale_x(w);
        self.set_scale_y(h);
        self.recalculate_positioning();
        self.set_rgba(color, opacity);
        // pixel centers sit at .5
        self.set_offset(Position::new(
            -((w / 2.0).floor() - 0.5).trunc(),
            -((h / 2.0).floor() - 0.5).trunc(),
        ));
    }

    /// Width and height from the displayed frame, ignoring scale.
    pub fn set_dimensions_from_frame(&mut self) {
        self.width = self.frame_source.width;
        self.height = self.frame_source.height;
    }

    /// Offset compensating the difference between the sprite's size and its frame's.
    pub fn center_offset(&mut self) {
        self.set_offset(Position::new(
            -0.5 * (self.width - self.frame_source.width),
            -0.5 * (self.height - self.frame_source.height),
        ));
    }

    pub fn center_origin(&mut self) {
        self.set_origin(Position::new(
            0.5 * self.frame_source.width,
            0.5 * self.frame_source.height,
        ));
    }

    /// Resizes to the scaled frame, then recenters offset and origin.
    ///
    /// This overwrites the offset, discarding whatever animations applied to it.
    pub fn recalculate_positioning(&mut self) {
        self.width = (self.scale * self.scale_x).abs() * self.frame_source.width;
        self.height = (self.scale * self.scale_y).abs() * self.frame_source.height;
        self.center_offset();
        self.center_origin();
    }

    pub fn set_scale_and_repos(&mut self, scale: f32) {
        self.set_scale(scale);
        self.recalculate_positioning();
    }

    pub fn set_scale_x_and_repos(&mut self, scale_x: f32) {
        self.set_scale_x(scale_x);
        self.recalculate_positioning();
    }

    pub fn set_scale_y_and_repos(&mut self, scale_y: f32) {
        self.set_scale_y(scale_y);
        self.recalculate_positioning();
    }

    /// Frees the quad. The sprite must not be used afterwards.
    pub fn delete(&mut self) {
        self.effects.remove(&[]);
        self.movement = None;
        self.interfacer.delete();
    }

    pub fn is_deleted(&self) -> bool {
        self.interfacer.is_deleted()
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn batch(&self) -> &Batch {
        self.interfacer.batch()
    }

    pub fn interfacer(&self) -> &Interfacer {
        &self.interfacer
    }

    pub fn animation(&self) -> &AnimationController {
        &self.animation
    }

    pub fn animation_mut(&mut self) -> &mut AnimationController {
        &mut self.animation
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn frame_source(&self) -> Rectangle {
        self.frame_source
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.push_translate();
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn set_x(&mut self, x: f32) {
        self.set_position(Position::new(x, self.position.y));
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.set_position(Position::new(self.position.x, y));
    }

    /// Degrees.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.interfacer
            .set_vertex_attr(Channel::Rotation, &[rotation]);
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Uniform scale, multiplied with the per-axis factors. See
    /// [`Sprite::set_scale_and_repos`] to keep origin and offset in step.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
        self.push_scale();
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn set_scale_x(&mut self, scale_x: f32) {
        self.scale_x = scale_x;
        self.push_scale();
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn set_scale_y(&mut self, scale_y: f32) {
        self.scale_y = scale_y;
        self.push_scale();
    }

    pub fn scroll_factor(&self) -> Position {
        self.scroll_factor
    }

    /// How strongly camera movement displaces the sprite.
    pub fn set_scroll_factor(&mut self, factor: Position) {
        self.scroll_factor = factor;
        self.interfacer
            .set_vertex_attr(Channel::ScrollFactor, &factor.to_array());
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    /// Pivot for rotation and scaling, in unscaled pixels.
    pub fn set_origin(&mut self, origin: Position) {
        self.origin = origin;
        self.interfacer
            .set_vertex_attr(Channel::Origin, &origin.to_array());
    }

    pub fn offset(&self) -> Position {
        self.offset
    }

    /// Shift subtracted after rotation and scaling. Animations write to it too.
    pub fn set_offset(&mut self, offset: Position) {
        self.offset = offset;
        self.interfacer
            .set_vertex_attr(Channel::Offset, &offset.to_array());
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.push_color();
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Clamped to `0..=255`; rounded only when written to the vertex color.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp(opacity, 0.0, 255.0);
        self.push_color();
    }

    pub fn set_rgba(&mut self, color: Color, opacity: f32) {
        self.color = color;
        self.set_opacity(opacity);
    }

    pub fn visible(&self) -> bool {
        self.interfacer.visible()
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.interfacer.set_visibility(visible);
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn set_flip_x(&mut self, flip: bool) {
        self.flip_x = flip;
        self.push_flip();
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn set_flip_y(&mut self, flip: bool) {
        self.flip_y = flip;
        self.push_flip();
    }

    pub fn blend(&self) -> BlendFunc {
        self.options.blend
    }

    pub fn set_blend(&mut self, blend: BlendFunc) {
        if self.options.blend == blend {
            return;
        }
        self.options.blend = blend;
        self.rebuild_states();
    }

    pub fn subpixel(&self) -> bool {
        self.options.subpixel
    }

    pub fn set_subpixel(&mut self, subpixel: bool) {
        self.options.subpixel = subpixel;
        self.update_vertex_positions();
    }
}

impl Tweenable for Sprite {
    fn accessor(attr: TweenAttr) -> Option<Accessor<Self>> {
        let (get, set): (fn(&Sprite) -> f32, fn(&mut Sprite, f32)) = match attr {
            TweenAttr::X => (Sprite::x, Sprite::set_x),
            TweenAttr::Y => (Sprite::y, Sprite::set_y),
            TweenAttr::Rotation => (Sprite::rotation, Sprite::set_rotation),
            TweenAttr::Opacity => (Sprite::opacity, Sprite::set_opacity),
            TweenAttr::Scale => (Sprite::scale, Sprite::set_scale),
            TweenAttr::ScaleX => (Sprite::scale_x, Sprite::set_scale_x),
            TweenAttr::ScaleY => (Sprite::scale_y, Sprite::set_scale_y),
        };
        Some(Accessor { get, set })
    }

    fn visible(&self) -> bool {
        Sprite::visible(self)
    }

    fn set_visible(&mut self, visible: bool) {
        Sprite::set_visible(self, visible);
    }

    fn effects_mut(&mut self) -> &mut EffectSet<Self> {
        &mut self.effects
    }
}
