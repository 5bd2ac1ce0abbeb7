//! # Render Error Types
//!
//! Everything that can fail in the render core fails during setup or
//! teardown. The per-frame path is infallible.

use thiserror::Error;

/// Errors loading or validating the engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML or has wrongly typed keys.
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A key holds a value outside its valid range.
    #[error("invalid configuration: {key} = {value}")]
    Invalid {
        /// Offending key, e.g. `render.scale`.
        key: &'static str,
        /// Offending value, formatted.
        value: String,
    },
}

/// Fatal render core errors.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The offscreen framebuffer is not complete. Rendering cannot proceed.
    #[error("{frame} framebuffer incomplete (status {status:#06x})")]
    IncompleteFramebuffer {
        /// Which framebuffer failed.
        frame: &'static str,
        /// Device status code.
        status: u32,
    },

    /// The device lacks a capability the configured pipeline requires.
    #[error("{0} not supported by the GPU device")]
    MissingExtension(&'static str),

    /// The device failed to allocate a resource.
    #[error("GPU resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for render core setup operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
