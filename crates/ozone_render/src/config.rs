//! # Engine Configuration
//!
//! Read once at [`crate::RenderEngine::init`]. Every key is optional.
//!
//! ```toml
//! [render]
//! distance = 350.0
//! scale = 0.5
//! scale_filter = "LINEAR"
//!
//! [effects]
//! enabled = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Sampling filter used when the offscreen frame is scaled to the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScaleFilter {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Bilinear.
    Linear,
}

/// `[render]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Visibility range in open air, world units.
    pub distance: f32,
    /// Offscreen render size relative to the window.
    pub scale: f32,
    /// Filter for the scaled offscreen frame.
    pub scale_filter: ScaleFilter,
    /// Run the post-process pass.
    pub postprocess: bool,
    /// Allocate glow targets for the post-process pass.
    pub glow: bool,
    /// Reduced detail for weak devices: the sky is drawn without stars.
    pub low_detail: bool,
    /// Culling radius multiplier for objects flagged as wide.
    pub wide_cull_factor: f32,
    /// Minimum apparent size `radius / (distance * mag)` an object needs to be drawn.
    pub visibility_coefficient: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            distance: 350.0,
            scale: 1.0,
            scale_filter: ScaleFilter::Nearest,
            postprocess: true,
            glow: true,
            low_detail: false,
            wide_cull_factor: 6.0,
            visibility_coefficient: 0.002,
        }
    }
}

impl RenderConfig {
    /// True if the scene is rendered to an offscreen target first.
    #[must_use]
    pub fn is_offscreen(&self) -> bool {
        #[allow(clippy::float_cmp)]
        let unscaled = self.scale == 1.0;
        self.postprocess || !unscaled
    }
}

/// `[effects]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectsConfig {
    /// Start the effects thread on load.
    pub enabled: bool,
    /// Radius around the camera scanned for flash/shake events.
    pub distance: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            distance: 128.0,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Rendering.
    pub render: RenderConfig,
    /// Effects thread.
    pub effects: EffectsConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    /// Checks every numeric key is finite and positive.
    pub fn validate(&self) -> ConfigResult<()> {
        let checks = [
            ("render.distance", self.render.distance),
            ("render.scale", self.render.scale),
            ("render.wide_cull_factor", self.render.wide_cull_factor),
            ("render.visibility_coefficient", self.render.visibility_coefficient),
            ("effects.distance", self.effects.distance),
        ];

        for (key, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}
