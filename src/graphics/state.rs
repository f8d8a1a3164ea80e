//! GPU state descriptors.
//!
//! A [`RenderState`] is a value: two descriptors compare equal exactly when all
//! of their binding directives do, which is what lets a batch collapse every
//! quad sharing a descriptor into one state-change group per camera.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::texture::TextureId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Uniform buffer slot a camera's attributes are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformBinding(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Separate color/alpha blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl BlendFunc {
    /// Straight alpha blending.
    pub const ALPHA: BlendFunc =
        BlendFunc::separate(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);

    /// Color factors as given; alpha is accumulated with `One` and the color destination factor.
    pub const fn separate(src: BlendFactor, dst: BlendFactor) -> Self {
        Self {
            src,
            dst,
            src_alpha: BlendFactor::One,
            dst_alpha: dst,
        }
    }
}

impl Default for BlendFunc {
    fn default() -> Self {
        BlendFunc::ALPHA
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Blend,
}

/// Kinds of directives, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKind {
    Program,
    TextureUnit,
    Texture,
    UniformBinding,
    Enable,
    BlendFunc,
}

/// One binding directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatePart {
    Program(ProgramId),
    TextureUnit(u32),
    Texture(TextureId),
    UniformBinding(UniformBinding),
    Enable(Capability),
    BlendFunc(BlendFunc),
}

impl StatePart {
    pub fn kind(&self) -> StateKind {
        match self {
            StatePart::Program(_) => StateKind::Program,
            StatePart::TextureUnit(_) => StateKind::TextureUnit,
            StatePart::Texture(_) => StateKind::Texture,
            StatePart::UniformBinding(_) => StateKind::UniformBinding,
            StatePart::Enable(_) => StateKind::Enable,
            StatePart::BlendFunc(_) => StateKind::BlendFunc,
        }
    }

    /// Rough relative price of applying this directive.
    pub fn cost(&self) -> u32 {
        match self.kind() {
            StateKind::Program => 333,
            StateKind::TextureUnit => 5,
            StateKind::Texture => 66,
            StateKind::UniformBinding => 20,
            StateKind::Enable => 1,
            StateKind::BlendFunc => 1,
        }
    }
}

/// Immutable, comparable set of binding directives, at most one per [`StateKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RenderState {
    parts: Vec<StatePart>,
}

impl RenderState {
    /// Builds a descriptor. Later parts of the same kind replace earlier ones.
    pub fn from_parts(parts: impl IntoIterator<Item = StatePart>) -> Self {
        let mut out: Vec<StatePart> = Vec::new();
        for part in parts {
            match out.iter_mut().find(|p| p.kind() == part.kind()) {
                Some(slot) => *slot = part,
                None => out.push(part),
            }
        }
        out.sort_by_key(|p| p.kind());
        Self { parts: out }
    }

    pub fn parts(&self) -> &[StatePart] {
        &self.parts
    }

    pub fn get(&self, kind: StateKind) -> Option<&StatePart> {
        self.parts.iter().find(|p| p.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// A copy of this descriptor with `part` added or replaced.
    pub fn with(&self, part: StatePart) -> Self {
        Self::from_parts(self.parts.iter().copied().chain(std::iter::once(part)))
    }

    /// Composes two descriptors; directives of `other` win.
    pub fn merge(&self, other: &RenderState) -> Self {
        Self::from_parts(self.parts.iter().chain(other.parts.iter()).copied())
    }
}

/// Tracks the state last applied and reports which directives a switch needs.
#[derive(Debug, Default)]
pub struct StateWall {
    current: HashMap<StateKind, StatePart>,
}

impl StateWall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directives of `target` that differ from what is currently applied.
    /// The wall records `target` as applied afterwards.
    pub fn switch(&mut self, target: &RenderState) -> Vec<StatePart> {
        let mut changes = Vec::new();
        for part in target.parts() {
            if self.current.get(&part.kind()) == Some(part) {
                continue;
            }
            self.current.insert(part.kind(), *part);
            changes.push(*part);
        }
        changes
    }

    pub fn reset(&mut self) {
        self.current.clear();
    }
}

pub fn switch_cost(parts: &[StatePart]) -> u32 {
    parts.iter().map(StatePart::cost).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(texture: TextureId) -> RenderState {
        RenderState::from_parts([
            StatePart::BlendFunc(BlendFunc::ALPHA),
            StatePart::Program(ProgramId(1)),
            StatePart::Texture(texture),
            StatePart::Enable(Capability::Blend),
        ])
    }

    #[test]
    fn equality_is_structural_and_order_independent() {
        let tex = TextureId::new();
        let a = base(tex);
        let b = RenderState::from_parts(a.parts().iter().rev().copied());
        assert_eq!(a, b);
        assert_ne!(a, base(TextureId::new()));
    }

    #[test]
    fn later_parts_replace_earlier_ones() {
        let tex = TextureId::new();
        let s = base(tex).with(StatePart::Program(ProgramId(7)));
        assert_eq!(s.get(StateKind::Program), Some(&StatePart::Program(ProgramId(7))));
        assert_eq!(s.parts().len(), 4);
    }

    #[test]
    fn wall_only_reports_changed_parts() {
        let t1 = TextureId::new();
        let t2 = TextureId::new();
        let mut wall = StateWall::new();
        assert_eq!(wall.switch(&base(t1)).len(), 4);
        assert!(wall.switch(&base(t1)).is_empty());
        let changes = wall.switch(&base(t2));
        assert_eq!(changes, vec![StatePart::Texture(t2)]);
        assert_eq!(switch_cost(&changes), 66);
    }
}
