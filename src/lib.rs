extern crate image;

pub mod anim;
pub mod animation {
    pub mod controller;
    pub mod frames;
}
pub mod camera;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod effects;
pub mod error;
pub mod graphics {
    pub mod batch;
    pub mod group;
    pub mod interfacer;
    pub mod state;
}
pub mod movement;
#[cfg(feature = "backend-wgpu")]
pub mod renderer;
pub mod sprites {
    pub mod container;
    pub mod sprite;
    pub mod visual;
}
pub mod texture;
pub mod traits;
pub mod utils;

pub use animation::controller::{AnimationController, PlaybackState};
pub use animation::frames::{Animation, AnimationFrame, FrameInfo};
pub use camera::Camera;
pub use config::EngineConfig;
pub use context::RenderContext;
pub use error::{EngineError, Result};
pub use graphics::batch::Batch;
pub use graphics::group::Group;
pub use sprites::{container::SpriteContainer, sprite::Sprite, visual::Visual};
pub use texture::{Texture, TextureId, TextureProvider};
pub use utils::{Color, Position, Rectangle, Size};
