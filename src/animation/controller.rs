//! Per-object animation playback.
//!
//! The controller never touches its owner. Frame changes leave a pending
//! texture and a pending offset delta behind, which the owner pulls with
//! [`AnimationController::query_new_texture`] and
//! [`AnimationController::query_new_offset`] after each update. A pending
//! texture is replaced by newer ones; pending offsets are summed until queried.

use std::collections::HashMap;

use crate::animation::frames::{Animation, AnimationFrame, FrameInfo};
use crate::error::{EngineError, Result};
use crate::texture::Texture;
use crate::utils::{Position, Rectangle, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No animation attached.
    #[default]
    Idle,
    Playing,
    Paused,
    /// A non-looping animation reached its last frame and holds it.
    Finished,
}

#[derive(Debug, Default)]
pub struct AnimationController {
    animations: HashMap<String, Animation>,
    current: Option<String>,
    state: PlaybackState,
    frame_idx: usize,
    /// Time left in the current frame.
    next_dt: f32,
    bounding_box: Option<Size>,
    /// Alignment of the frame last signalled.
    frame_align: Position,
    /// Whole-animation offset of the current animation.
    anim_offset: Position,
    pending_texture: Option<Texture>,
    pending_offset: Option<Position>,
}

impl AnimationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `frames` under `name`, each shown for `1 / fps` seconds.
    ///
    /// The first animation registered sets the bounding box unless one was set
    /// explicitly. Nothing changes when an error is returned.
    pub fn add(
        &mut self,
        name: &str,
        frames: &[FrameInfo],
        fps: f32,
        looping: bool,
        offset: Option<Position>,
        tags: &[&str],
    ) -> Result<()> {
        let animation = Animation::from_frame_infos(frames, fps, looping, offset, tags)?;
        self.add_animation(name, animation);
        Ok(())
    }

    /// Like [`AnimationController::add`], picking frames out of a loaded list by index.
    #[allow(clippy::too_many_arguments)]
    pub fn add_by_indices(
        &mut self,
        name: &str,
        frames: &[FrameInfo],
        indices: &[usize],
        fps: f32,
        looping: bool,
        offset: Option<Position>,
        tags: &[&str],
    ) -> Result<()> {
        let picked = indices
            .iter()
            .map(|&index| {
                frames.get(index).ok_or(EngineError::FrameIndexOutOfRange {
                    index,
                    len: frames.len(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let animation = Animation::from_frame_infos(picked, fps, looping, offset, tags)?;
        self.add_animation(name, animation);
        Ok(())
    }

    /// Registers a prebuilt animation. Replacing the current animation detaches it.
    pub fn add_animation(&mut self, name: &str, animation: Animation) {
        if self.current.as_deref() == Some(name) {
            self.stop();
        }
        if self.bounding_box.is_none() {
            self.bounding_box = animation.frames().first().map(|f| f.source.size());
        }
        self.animations.insert(name.to_owned(), animation);
    }

    /// Starts `name` from its first frame.
    ///
    /// Replaying the current animation without `force` leaves it alone, resumes
    /// it when paused and restarts it when finished.
    pub fn play(&mut self, name: &str, force: bool) -> Result<()> {
        let Some(animation) = self.animations.get(name) else {
            return Err(EngineError::UnknownAnimation(name.to_owned()));
        };
        if !force && self.current.as_deref() == Some(name) {
            match self.state {
                PlaybackState::Playing => return Ok(()),
                PlaybackState::Paused => {
                    self.state = PlaybackState::Playing;
                    return Ok(());
                }
                PlaybackState::Idle | PlaybackState::Finished => {}
            }
        }

        let first = animation.frames()[0].clone();
        let anim_offset = animation.offset().unwrap_or(Position::ZERO);

        let undo = self.detach();
        self.current = Some(name.to_owned());
        self.state = PlaybackState::Playing;
        self.frame_idx = 0;
        self.next_dt = first.duration;
        self.anim_offset = anim_offset;
        self.push_offset(undo - anim_offset);
        self.on_new_frame(&first);
        log::trace!("playing animation {name:?}");
        Ok(())
    }

    /// Advances playback by `dt` seconds, crossing as many frames as needed.
    pub fn update(&mut self, dt: f32) {
        if self.state != PlaybackState::Playing || !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let Some(animation) = self.current.as_ref().and_then(|n| self.animations.get(n)) else {
            return;
        };
        let frames = animation.frames();
        let looping = animation.looping();

        let start_idx = self.frame_idx;
        let mut idx = self.frame_idx;
        let mut dt = dt;
        let mut next_dt = self.next_dt;
        let mut crossed = false;
        let mut finished = false;
        // Whole loops past the current frame land back where they started.
        let cycle = animation.duration();
        if looping && dt - next_dt > cycle {
            dt = next_dt + (dt - next_dt) % cycle;
        }
        while dt > next_dt {
            dt -= next_dt;
            if idx + 1 >= frames.len() {
                if !looping {
                    finished = true;
                    break;
                }
                idx = 0;
            } else {
                idx += 1;
            }
            crossed = true;
            next_dt = frames[idx].duration;
        }

        let frame = (crossed && idx != start_idx).then(|| frames[idx].clone());
        self.frame_idx = idx;
        if finished {
            self.state = PlaybackState::Finished;
            self.next_dt = 0.0;
        } else {
            self.next_dt = next_dt - dt;
        }
        if let Some(frame) = frame {
            self.on_new_frame(&frame);
        }
    }

    /// Halts playback, keeping the current frame.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Detaches the current animation, leaving behind the offset that undoes it.
    pub fn stop(&mut self) {
        let undo = self.detach();
        if undo != Position::ZERO {
            self.push_offset(undo);
        }
    }

    /// Drops every registered animation along with the bounding box.
    pub fn clear(&mut self) {
        self.stop();
        self.animations.clear();
        self.bounding_box = None;
    }

    pub fn set_bounding_box(&mut self, size: Size) {
        self.bounding_box = Some(size);
    }

    pub fn bounding_box(&self) -> Option<Size> {
        self.bounding_box
    }

    /// Takes the texture of the latest frame change.
    pub fn query_new_texture(&mut self) -> Option<Texture> {
        self.pending_texture.take()
    }

    /// Takes the sum of offset deltas produced since the last query.
    pub fn query_new_offset(&mut self) -> Option<Position> {
        self.pending_offset.take()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Whether an animation is attached, playing or not.
    pub fn is_set(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current_animation(&self) -> Option<&Animation> {
        self.current.as_ref().and_then(|n| self.animations.get(n))
    }

    pub fn current_frame(&self) -> Option<&AnimationFrame> {
        self.current_animation()
            .and_then(|a| a.frames().get(self.frame_idx))
    }

    pub fn frame_index(&self) -> Option<usize> {
        self.current.as_ref().map(|_| self.frame_idx)
    }

    pub fn looping(&self) -> bool {
        self.current_animation().is_some_and(Animation::looping)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.current_animation().is_some_and(|a| a.has_tag(tag))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    /// Offset the current animation has applied to its owner so far.
    pub fn applied_offset(&self) -> Position {
        if self.current.is_none() {
            return Position::ZERO;
        }
        -self.frame_align - self.anim_offset
    }

    fn detach(&mut self) -> Position {
        let undo = -self.applied_offset();
        self.current = None;
        self.state = PlaybackState::Idle;
        self.frame_idx = 0;
        self.next_dt = 0.0;
        self.frame_align = Position::ZERO;
        self.anim_offset = Position::ZERO;
        undo
    }

    fn on_new_frame(&mut self, frame: &AnimationFrame) {
        let align = self.alignment(&frame.source);
        let delta = self.frame_align - align;
        self.frame_align = align;
        self.pending_texture = Some(frame.texture.clone());
        self.push_offset(delta);
        log::trace!("frame {} of {:?}", self.frame_idx, self.current);
    }

    fn push_offset(&mut self, delta: Position) {
        *self.pending_offset.get_or_insert(Position::ZERO) += delta;
    }

    /// Pixel correction keeping a trimmed frame anchored in the bounding box.
    fn alignment(&self, source: &Rectangle) -> Position {
        let bb = self.bounding_box.unwrap_or(source.size());
        Position::new(
            (source.x - ((bb.width - source.width) / 2.0).floor()).round(),
            (source.y - ((bb.height - source.height) / 2.0).floor()).round(),
        )
    }
}
