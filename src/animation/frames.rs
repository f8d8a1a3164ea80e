use std::collections::HashSet;

use crate::error::{EngineError, Result};
use crate::texture::Texture;
use crate::utils::{Position, Rectangle};

/// A frame as delivered by the atlas loader: the drawn region plus where that
/// region sits inside the untrimmed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub texture: Texture,
    pub source: Rectangle,
}

impl FrameInfo {
    pub fn new(texture: Texture, source: Rectangle) -> Self {
        Self { texture, source }
    }

    /// A frame that was not trimmed: its footprint is the texture itself.
    pub fn untrimmed(texture: Texture) -> Self {
        let source = Rectangle::new(0.0, 0.0, texture.width(), texture.height());
        Self { texture, source }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub texture: Texture,
    /// Display time in seconds.
    pub duration: f32,
    pub source: Rectangle,
}

impl AnimationFrame {
    pub fn new(texture: Texture, duration: f32, source: Rectangle) -> Self {
        Self {
            texture,
            duration,
            source,
        }
    }
}

/// Ordered frames plus loop flag, whole-animation offset and tags.
#[derive(Debug, Clone)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
    looping: bool,
    offset: Option<Position>,
    tags: HashSet<String>,
}

impl Animation {
    /// Fails on an empty frame list, a non-positive frame duration, or frames
    /// cut from different textures.
    pub fn new(
        frames: Vec<AnimationFrame>,
        looping: bool,
        offset: Option<Position>,
        tags: &[&str],
    ) -> Result<Self> {
        let first = frames.first().ok_or(EngineError::EmptyFrames)?;
        let atlas = first.texture.id();
        for frame in &frames {
            if !(frame.duration.is_finite() && frame.duration > 0.0) {
                return Err(EngineError::NonPositiveDuration(frame.duration));
            }
            if frame.texture.id() != atlas {
                return Err(EngineError::AtlasMismatch {
                    expected: atlas,
                    found: frame.texture.id(),
                });
            }
        }
        Ok(Self {
            frames,
            looping,
            offset,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    /// Frames shown for `1 / fps` seconds each.
    pub fn from_frame_infos<'a>(
        infos: impl IntoIterator<Item = &'a FrameInfo>,
        fps: f32,
        looping: bool,
        offset: Option<Position>,
        tags: &[&str],
    ) -> Result<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(EngineError::NonPositiveFps(fps));
        }
        let spf = 1.0 / fps;
        let frames = infos
            .into_iter()
            .map(|info| AnimationFrame::new(info.texture.clone(), spf, info.source))
            .collect();
        Self::new(frames, looping, offset, tags)
    }

    /// Time to show every frame once.
    pub fn duration(&self) -> f32 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false for a constructed animation.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn offset(&self) -> Option<Position> {
        self.offset
    }

    pub fn tags(&self) -> &HashSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;

    #[test]
    fn frames_from_other_atlases_are_rejected() {
        let a = Texture::new(64, 64);
        let b = Texture::new(64, 64);
        let frames = [FrameInfo::untrimmed(a), FrameInfo::untrimmed(b)];
        let err = Animation::from_frame_infos(&frames, 24.0, false, None, &[]).unwrap_err();
        assert!(matches!(err, EngineError::AtlasMismatch { .. }));
    }

    #[test]
    fn duration_is_inverse_fps() {
        let atlas = Texture::new(64, 32);
        let frames = [
            FrameInfo::untrimmed(atlas.region(Rectangle::new(0.0, 0.0, 32.0, 32.0))),
            FrameInfo::untrimmed(atlas.region(Rectangle::new(32.0, 0.0, 32.0, 32.0))),
        ];
        let anim = Animation::from_frame_infos(&frames, 4.0, true, None, &["sing"]).unwrap();
        assert_eq!(anim.len(), 2);
        assert!((anim.frames()[1].duration - 0.25).abs() < 1e-6);
        assert!(anim.has_tag("sing"));
        assert!(!anim.has_tag("idle"));
    }
}
