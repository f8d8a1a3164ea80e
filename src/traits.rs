use crate::effects::{EffectSet, TweenAttr};

/// Getter/setter pair for one tweenable attribute.
pub struct Accessor<T> {
    pub get: fn(&T) -> f32,
    pub set: fn(&mut T, f32),
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Accessor<T> {}

impl<T> std::fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Accessor")
    }
}

/// Something effects can run on.
pub trait Tweenable: Sized {
    /// Dispatch table entry for `attr`, or `None` if the type has no such attribute.
    fn accessor(attr: TweenAttr) -> Option<Accessor<Self>>;

    fn visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    fn effects_mut(&mut self) -> &mut EffectSet<Self>;
}
