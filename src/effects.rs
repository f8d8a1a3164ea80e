//! Time-bounded mutators run on a [`Tweenable`] every tick.
//!
//! Effects live in the target's [`EffectSet`]. [`update_effects`] advances all
//! of them, reaps the finished ones and fires their completion callbacks once
//! the whole set has been updated.

use std::collections::HashSet;
use std::f32::consts::PI;
use std::mem;

use crate::anim::{ease_value, Ease};
use crate::error::{EngineError, Result};
use crate::traits::{Accessor, Tweenable};

/// Attributes a tween can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenAttr {
    X,
    Y,
    Rotation,
    Opacity,
    Scale,
    ScaleX,
    ScaleY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectHandle(u64);

pub type CompletionCallback = Box<dyn FnOnce()>;
pub type ToggleCallback<T> = Box<dyn FnMut(&mut T)>;

struct TweenTrack<T> {
    accessor: Accessor<T>,
    initial: f32,
    delta: f32,
}

enum EffectKind<T> {
    Tween {
        ease: Ease,
        tracks: Vec<TweenTrack<T>>,
    },
    Flicker {
        interval: f32,
        /// Thresholds crossed so far.
        toggles: u64,
        visible: bool,
        end_visibility: bool,
    },
    Toggle {
        /// pi / interval
        frequency: f32,
        invert: f32,
        active: bool,
        end_active: bool,
        on_toggle_on: Option<ToggleCallback<T>>,
        on_toggle_off: Option<ToggleCallback<T>>,
    },
}

pub struct Effect<T> {
    handle: EffectHandle,
    duration: f32,
    elapsed: f32,
    on_complete: Option<CompletionCallback>,
    kind: EffectKind<T>,
}

/// Parameters of a toggle effect.
pub struct ToggleSpec<T> {
    pub duration: f32,
    pub interval: f32,
    pub start_active: bool,
    pub end_active: bool,
    pub on_toggle_on: Option<ToggleCallback<T>>,
    pub on_toggle_off: Option<ToggleCallback<T>>,
    pub on_complete: Option<CompletionCallback>,
}

impl<T> ToggleSpec<T> {
    /// Starts and ends active, without callbacks.
    pub fn new(duration: f32, interval: f32) -> Self {
        Self {
            duration,
            interval,
            start_active: true,
            end_active: true,
            on_toggle_on: None,
            on_toggle_off: None,
            on_complete: None,
        }
    }

    pub fn start_active(mut self, active: bool) -> Self {
        self.start_active = active;
        self
    }

    pub fn end_active(mut self, active: bool) -> Self {
        self.end_active = active;
        self
    }

    pub fn on_toggle_on(mut self, f: impl FnMut(&mut T) + 'static) -> Self {
        self.on_toggle_on = Some(Box::new(f));
        self
    }

    pub fn on_toggle_off(mut self, f: impl FnMut(&mut T) + 'static) -> Self {
        self.on_toggle_off = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn check_duration(duration: f32) -> Result<()> {
    if !positive(duration) {
        return Err(EngineError::NonPositiveDuration(duration));
    }
    Ok(())
}

fn check_interval(interval: f32) -> Result<()> {
    if !positive(interval) {
        return Err(EngineError::NonPositiveInterval(interval));
    }
    Ok(())
}

impl<T> Effect<T> {
    pub fn handle(&self) -> EffectHandle {
        self.handle
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

impl<T: Tweenable> Effect<T> {
    /// Tweens each `(attribute, end value)` from its current value on `target`.
    pub fn tween(
        target: &T,
        ease: Ease,
        attributes: &[(TweenAttr, f32)],
        duration: f32,
        on_complete: Option<CompletionCallback>,
    ) -> Result<Self> {
        check_duration(duration)?;
        let tracks = attributes
            .iter()
            .map(|&(attr, end)| {
                let accessor =
                    T::accessor(attr).ok_or(EngineError::UnsupportedTweenAttribute(attr))?;
                let initial = (accessor.get)(target);
                Ok(TweenTrack {
                    accessor,
                    initial,
                    delta: end - initial,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_kind(
            duration,
            on_complete,
            EffectKind::Tween { ease, tracks },
        ))
    }

    /// Flips its own visibility, starting from `start_visibility`, and writes it
    /// to the target on every flip.
    pub fn flicker(
        interval: f32,
        start_visibility: bool,
        end_visibility: bool,
        duration: f32,
        on_complete: Option<CompletionCallback>,
    ) -> Result<Self> {
        check_duration(duration)?;
        check_interval(interval)?;
        Ok(Self::with_kind(
            duration,
            on_complete,
            EffectKind::Flicker {
                interval,
                toggles: 0,
                visible: start_visibility,
                end_visibility,
            },
        ))
    }

    pub fn toggle(spec: ToggleSpec<T>) -> Result<Self> {
        check_duration(spec.duration)?;
        check_interval(spec.interval)?;
        Ok(Self::with_kind(
            spec.duration,
            spec.on_complete,
            EffectKind::Toggle {
                frequency: PI / spec.interval,
                invert: if spec.start_active { 1.0 } else { -1.0 },
                active: spec.start_active,
                end_active: spec.end_active,
                on_toggle_on: spec.on_toggle_on,
                on_toggle_off: spec.on_toggle_off,
            },
        ))
    }

    fn with_kind(
        duration: f32,
        on_complete: Option<CompletionCallback>,
        kind: EffectKind<T>,
    ) -> Self {
        Self {
            handle: EffectHandle(0),
            duration,
            elapsed: 0.0,
            on_complete,
            kind,
        }
    }

    pub fn update(&mut self, dt: f32, target: &mut T) {
        self.elapsed += dt;
        let finished = self.is_finished();
        match &mut self.kind {
            EffectKind::Tween { ease, tracks } => {
                let t = self.elapsed.clamp(0.0, self.duration) / self.duration;
                let progress = ease_value(*ease, t);
                for track in tracks.iter() {
                    (track.accessor.set)(target, track.initial + track.delta * progress);
                }
            }
            EffectKind::Flicker {
                interval,
                toggles,
                visible,
                end_visibility,
            } => {
                if finished {
                    target.set_visible(*end_visibility);
                    return;
                }
                // Threshold k sits at k * interval.
                let reached = (self.elapsed / *interval).floor() as u64;
                if reached <= *toggles {
                    return;
                }
                let crossed = reached - *toggles;
                *toggles = reached;
                // Thresholds crossed in one step cancel out pairwise.
                if crossed % 2 == 1 {
                    *visible = !*visible;
                    target.set_visible(*visible);
                }
            }
            EffectKind::Toggle {
                frequency,
                invert,
                active,
                end_active,
                on_toggle_on,
                on_toggle_off,
            } => {
                let wave = (self.elapsed * *frequency).sin() * *invert;
                let mut want = wave > 0.0;
                if finished {
                    want = *end_active;
                }
                if want == *active {
                    return;
                }
                *active = want;
                let callback = if want { on_toggle_on } else { on_toggle_off };
                if let Some(callback) = callback {
                    callback(target);
                }
            }
        }
    }
}

/// The active effects of one object.
pub struct EffectSet<T> {
    active: Vec<Effect<T>>,
    next_id: u64,
    updating: bool,
    cancelled: HashSet<EffectHandle>,
    cancel_all: bool,
}

impl<T> Default for EffectSet<T> {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            next_id: 1,
            updating: false,
            cancelled: HashSet::new(),
            cancel_all: false,
        }
    }
}

impl<T> EffectSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut effect: Effect<T>) -> EffectHandle {
        effect.handle = EffectHandle(self.next_id);
        self.next_id += 1;
        let handle = effect.handle;
        self.active.push(effect);
        handle
    }

    /// Cancels the given effects without running their completion callbacks.
    ///
    /// An empty slice cancels everything. Unknown handles are ignored.
    pub fn remove(&mut self, handles: &[EffectHandle]) {
        if handles.is_empty() {
            self.active.clear();
            if self.updating {
                self.cancel_all = true;
            }
            return;
        }
        self.active.retain(|e| !handles.contains(&e.handle));
        if self.updating {
            self.cancelled.extend(handles.iter().copied());
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn contains(&self, handle: EffectHandle) -> bool {
        self.active.iter().any(|e| e.handle == handle)
    }

    fn begin(&mut self) -> Vec<Effect<T>> {
        self.updating = true;
        mem::take(&mut self.active)
    }

    /// Puts the survivors of an update back and hands out the completions to fire.
    fn end(&mut self, mut running: Vec<Effect<T>>) -> Vec<CompletionCallback> {
        if self.cancel_all {
            running.clear();
        } else {
            running.retain(|e| !self.cancelled.contains(&e.handle));
        }
        self.updating = false;
        self.cancel_all = false;
        self.cancelled.clear();

        let mut completions = Vec::new();
        running.retain_mut(|e| {
            if !e.is_finished() {
                return true;
            }
            if let Some(cb) = e.on_complete.take() {
                completions.push(cb);
            }
            false
        });
        // Effects started from callbacks during the update run from the next tick on.
        running.append(&mut self.active);
        self.active = running;
        completions
    }
}

/// Advances every effect on `target`, then fires completions of those that finished.
pub fn update_effects<T: Tweenable>(target: &mut T, dt: f32) {
    if target.effects_mut().is_empty() {
        return;
    }
    let mut running = target.effects_mut().begin();
    for effect in running.iter_mut() {
        effect.update(dt, target);
    }
    let completions = target.effects_mut().end(running);
    for callback in completions {
        callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lamp {
        level: f32,
        lit: bool,
        effects: EffectSet<Lamp>,
    }

    impl Tweenable for Lamp {
        fn accessor(attr: TweenAttr) -> Option<Accessor<Self>> {
            match attr {
                TweenAttr::Opacity => Some(Accessor {
                    get: |l: &Lamp| l.level,
                    set: |l: &mut Lamp, v| l.level = v,
                }),
                _ => None,
            }
        }

        fn visible(&self) -> bool {
            self.lit
        }

        fn set_visible(&mut self, visible: bool) {
            self.lit = visible;
        }

        fn effects_mut(&mut self) -> &mut EffectSet<Self> {
            &mut self.effects
        }
    }

    #[test]
    fn finished_effects_are_reaped_after_the_update() {
        let mut lamp = Lamp::default();
        let tween = Effect::tween(&lamp, Ease::Linear, &[(TweenAttr::Opacity, 4.0)], 1.0, None)
            .unwrap();
        let short = lamp.effects.push(tween);
        let long = lamp
            .effects
            .push(Effect::flicker(0.25, true, true, 2.0, None).unwrap());

        update_effects(&mut lamp, 1.0);
        assert!(!lamp.effects.contains(short));
        assert!(lamp.effects.contains(long));
        assert_eq!(lamp.level, 4.0);
    }

    #[test]
    fn flicker_flips_its_own_state_not_the_target() {
        let mut lamp = Lamp::default();
        assert!(!lamp.lit);
        lamp.effects
            .push(Effect::flicker(1.0, true, false, 3.5, None).unwrap());
        update_effects(&mut lamp, 1.0);
        assert!(!lamp.lit);
        update_effects(&mut lamp, 1.0);
        assert!(lamp.lit);
    }

    #[test]
    fn flicker_counts_thresholds_without_stepping() {
        let mut lamp = Lamp {
            lit: true,
            ..Lamp::default()
        };
        lamp.effects
            .push(Effect::flicker(0.5, true, false, 1.0e9, None).unwrap());
        // 2e8 thresholds at once, an even count
        update_effects(&mut lamp, 1.0e8);
        assert!(lamp.lit);
        assert_eq!(lamp.effects.len(), 1);
        update_effects(&mut lamp, 1.0e9);
        assert!(!lamp.lit);
        assert!(lamp.effects.is_empty());
    }

    #[test]
    fn nan_and_infinite_timings_are_rejected() {
        let lamp = Lamp::default();
        assert!(matches!(
            Effect::<Lamp>::flicker(f32::NAN, true, true, 1.0, None),
            Err(EngineError::NonPositiveInterval(_))
        ));
        assert!(matches!(
            Effect::tween(&lamp, Ease::Linear, &[(TweenAttr::Opacity, 1.0)], f32::NAN, None),
            Err(EngineError::NonPositiveDuration(_))
        ));
        assert!(matches!(
            Effect::<Lamp>::toggle(ToggleSpec::new(f32::INFINITY, 0.5)),
            Err(EngineError::NonPositiveDuration(_))
        ));
    }
}
