use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animation::controller::AnimationController;
use crate::animation::frames::FrameInfo;
use crate::error::{EngineError, Result};
use crate::graphics::state::BlendFunc;
use crate::utils::{Position, Size};

/// How often vertex data is expected to change. Picks buffer placement on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferUsage {
    Static,
    #[default]
    Dynamic,
    Stream,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub default_fps: f32,
    pub subpixel: bool,
    pub usage: BufferUsage,
    pub blend: BlendFunc,
    pub game_width: f32,
    pub game_height: f32,
    pub debug_pane_lines: usize,
    pub log_filter: String,
    pub animations: Vec<AnimationDef>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_fps: 24.0,
            subpixel: false,
            usage: BufferUsage::Dynamic,
            blend: BlendFunc::ALPHA,
            game_width: 1280.0,
            game_height: 720.0,
            debug_pane_lines: 10,
            log_filter: "info".to_string(),
            animations: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_fps <= 0.0 {
            return Err(EngineError::NonPositiveFps(self.default_fps));
        }
        if self.game_width <= 0.0 || self.game_height <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "game dimensions must be positive, got {}x{}",
                self.game_width, self.game_height
            )));
        }
        if self.debug_pane_lines == 0 {
            return Err(EngineError::InvalidConfig(
                "debug_pane_lines must be at least 1".to_string(),
            ));
        }
        for def in &self.animations {
            def.validate()?;
        }
        Ok(())
    }

    pub fn game_dimensions(&self) -> Size {
        Size::new(self.game_width, self.game_height)
    }
}

/// An animation to register from an already loaded frame list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AnimationDef {
    pub name: String,
    pub indices: Vec<usize>,
    /// Falls back to [`EngineConfig::default_fps`].
    pub fps: Option<f32>,
    pub looping: bool,
    pub offset: Option<[f32; 2]>,
    pub tags: Vec<String>,
}

impl AnimationDef {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(EngineError::InvalidConfig(
                "animation name may not be empty".to_string(),
            ));
        }
        if self.indices.is_empty() {
            return Err(EngineError::EmptyFrames);
        }
        if let Some(fps) = self.fps.filter(|fps| *fps <= 0.0) {
            return Err(EngineError::NonPositiveFps(fps));
        }
        Ok(())
    }

    pub fn register(
        &self,
        controller: &mut AnimationController,
        frames: &[FrameInfo],
        default_fps: f32,
    ) -> Result<()> {
        self.validate()?;
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        controller.add_by_indices(
            &self.name,
            frames,
            &self.indices,
            self.fps.unwrap_or(default_fps),
            self.looping,
            self.offset.map(|[x, y]| Position::new(x, y)),
            &tags,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "default_fps": 30.0 }"#).unwrap();
        assert_eq!(config.default_fps, 30.0);
        assert_eq!(config.game_width, 1280.0);
        assert_eq!(config.usage, BufferUsage::Dynamic);
        assert_eq!(config.blend, BlendFunc::ALPHA);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "default_fps": 0.0 }"#),
            Err(EngineError::NonPositiveFps(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "animations": [{ "name": "idle", "indices": [] }] }"#),
            Err(EngineError::EmptyFrames)
        ));
        assert!(matches!(
            EngineConfig::from_json_str("{ nope"),
            Err(EngineError::Json(_))
        ));
    }

    #[test]
    fn usage_and_blend_parse_snake_case() {
        let json = r#"{
            "usage": "stream",
            "blend": { "src": "one", "dst": "one", "src_alpha": "one", "dst_alpha": "one" }
        }"#;
        let config = EngineConfig::from_json_str(json).unwrap();
        assert_eq!(config.usage, BufferUsage::Stream);
        assert_eq!(config.blend.dst, crate::graphics::state::BlendFactor::One);
    }
}
