use thiserror::Error;

use crate::texture::TextureId;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("fps must be greater than 0, got {0}")]
    NonPositiveFps(f32),
    #[error("duration must be greater than 0, got {0}")]
    NonPositiveDuration(f32),
    #[error("interval must be greater than 0, got {0}")]
    NonPositiveInterval(f32),
    #[error("frame collections may not be empty")]
    EmptyFrames,
    #[error("frame index {index} out of range for {len} frames")]
    FrameIndexOutOfRange { index: usize, len: usize },
    #[error("no animation registered under {0:?}")]
    UnknownAnimation(String),
    #[error("attribute {0:?} can not be tweened on this object")]
    UnsupportedTweenAttribute(crate::effects::TweenAttr),
    #[error("frame texture {found} does not belong to atlas {expected}")]
    AtlasMismatch { expected: TextureId, found: TextureId },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
