//! # OZONE Render Core
//!
//! Decides what is drawn each frame and in which order, keeps the effects
//! thread in lock-step with the frame, and owns the offscreen targets.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      RenderEngine::update                      │
//! ├───────────────────────────────────────────────────────────────┤
//! │  EffectsWorker::begin(eye) ──────────────┐                     │
//! │       │                                  │ effects thread      │
//! │  FrameCompositor::draw_orbis             │ scan_effects(orbis) │
//! │       ├─ RenderScheduler::prepare_draw   │                     │
//! │       │     Frustum span → column cull → schedule_cell        │
//! │       │     → sorted DrawLists                                 │
//! │       ├─ RenderScheduler::draw_geometry → DrawSink             │
//! │       └─ composite pass                  │                     │
//! │  DrawSink::draw_ui                       │                     │
//! │  EffectsWorker::finish ◄─────────────────┘                     │
//! │       └─ Camera::apply_effects                                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - No globals: all state lives in one [`RenderEngine`]
//! - Only init, resize and destroy can fail; every failure is fatal
//! - GPU handles are never leaked or freed twice
//! - The world is only read while a frame is prepared

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod camera;
pub mod compositor;
pub mod config;
pub mod culling;
pub mod effects;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod pipeline;

pub use camera::Camera;
pub use compositor::{FrameCompositor, FrameTargets, TargetLayout};
pub use config::{EffectsConfig, EngineConfig, RenderConfig, ScaleFilter};
pub use culling::{cull_radius, Frustum, Plane};
pub use effects::{scan_effects, EffectsScan, EffectsWorker};
pub use engine::{RenderEngine, UpdateFlags};
pub use error::{ConfigError, ConfigResult, RenderError, RenderResult};
pub use gpu::{DrawCall, DrawRecorder, DrawSink, GpuCall, GpuDevice, HeadlessDevice, MeshPass};
pub use pipeline::{DrawEntry, DrawList, DrawRef, Fog, RenderScheduler, RenderStats};
