//! # Engine Lifecycle Integration Test
//!
//! Drives `RenderEngine` through init, load, frames, unload and destroy on a
//! headless device.

use std::sync::Arc;

use ozone_core::Vec3;
use ozone_matrix::{Object, Orbis, Struct};
use ozone_render::gpu::{EXT_FRAMEBUFFER_OBJECT, EXT_TEXTURE_FLOAT};
use ozone_render::{
    scan_effects, DrawCall, DrawRecorder, EngineConfig, GpuCall, HeadlessDevice, RenderConfig, RenderEngine,
    RenderError, UpdateFlags,
};
use parking_lot::RwLock;

fn shared(orbis: Orbis) -> Arc<RwLock<Orbis>> {
    Arc::new(RwLock::new(orbis))
}

/// A small world with one flashing and one shaking object ahead of the origin.
fn eventful_world() -> Arc<RwLock<Orbis>> {
    let mut orbis = Orbis::with_cells(16);
    orbis.add_struct(Struct::new(Vec3::new(-4.0, 20.0, 0.0), Vec3::new(4.0, 28.0, 8.0)));

    let flash = orbis.add_object(Object::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.5, 0.5, 0.5)));
    let shake = orbis.add_object(Object::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.5, 0.5, 0.5)));
    if let Some(obj) = orbis.object_mut(flash) {
        obj.add_event(Object::EVENT_FLASH, 1.0);
    }
    if let Some(obj) = orbis.object_mut(shake) {
        obj.add_event(Object::EVENT_SHAKE, 50.0);
    }
    shared(orbis)
}

fn engine(config: EngineConfig, orbis: Arc<RwLock<Orbis>>) -> RenderEngine<HeadlessDevice> {
    match RenderEngine::init(config, HeadlessDevice::new(), orbis, 800, 600) {
        Ok(engine) => engine,
        Err(err) => panic!("init failed: {err}"),
    }
}

#[test]
fn test_effects_scan_every_frame() {
    let orbis = eventful_world();
    let mut engine = engine(EngineConfig::default(), Arc::clone(&orbis));
    engine.load().expect("load");

    let mut sink = DrawRecorder::new();
    let distance = engine.config().effects.distance;

    for frame in 1..=25_u64 {
        // Move the eye so every frame expects a different scan.
        #[allow(clippy::cast_precision_loss)]
        let eye = Vec3::new(0.0, frame as f32 * 0.5, 1.0);
        engine.camera_mut().p = eye;

        engine.update(UpdateFlags::EFFECTS | UpdateFlags::DRAW_ORBIS, &mut sink);

        assert_eq!(engine.effects().scans(), frame);
        assert!(!engine.effects().is_pending());

        let expected = scan_effects(&orbis.read(), eye, distance);
        assert!((engine.camera().flash() - expected.flash).abs() < 1e-6);
        assert!((engine.camera().shake() - expected.shake).abs() < 1e-6);
    }

    assert_eq!(engine.stats().frames, 25);
    engine.unload();
    assert!(!engine.effects().is_running());
}

#[test]
fn test_effects_skipped_without_flag_or_thread() {
    let orbis = eventful_world();
    let mut engine = engine(EngineConfig::default(), orbis);
    let mut sink = DrawRecorder::new();

    // Not loaded yet: the scan is skipped, drawing goes on.
    engine.update(UpdateFlags::ALL, &mut sink);
    assert_eq!(engine.effects().scans(), 0);
    assert_eq!(engine.camera().flash(), 0.0);

    engine.load().expect("load");
    engine.update(UpdateFlags::DRAW_ORBIS, &mut sink);
    assert_eq!(engine.effects().scans(), 0);

    engine.update(UpdateFlags::EFFECTS, &mut sink);
    assert_eq!(engine.effects().scans(), 1);
}

#[test]
fn test_effects_disabled_in_config() {
    let config = EngineConfig::from_toml_str("[effects]\nenabled = false\n").expect("config");
    let mut engine = engine(config, eventful_world());
    engine.load().expect("load");

    assert!(!engine.effects().is_running());
    engine.update(UpdateFlags::ALL, &mut DrawRecorder::new());
    assert_eq!(engine.effects().scans(), 0);
}

#[test]
fn test_unload_right_after_load_scans_nothing() {
    let mut engine = engine(EngineConfig::default(), eventful_world());

    engine.load().expect("load");
    engine.unload();

    assert_eq!(engine.effects().scans(), 0);
    assert!(!engine.effects().is_running());
}

#[test]
fn test_repeated_teardown() {
    let mut engine = engine(EngineConfig::default(), eventful_world());
    engine.load().expect("load");
    engine.update(UpdateFlags::ALL, &mut DrawRecorder::new());

    engine.unload();
    engine.unload();
    engine.destroy();
    engine.destroy();

    assert!(engine.is_destroyed());
    assert!(engine.compositor().targets().is_none());
    assert_eq!(engine.device().live_handles(), 0);
    assert_eq!(engine.device().invalid_deletes(), 0);

    // Everything after destroy is ignored.
    let frames = engine.stats().frames;
    engine.update(UpdateFlags::ALL, &mut DrawRecorder::new());
    engine.load().expect("load after destroy");
    engine.resize(1024, 768).expect("resize after destroy");
    assert_eq!(engine.stats().frames, frames);
    assert!(!engine.effects().is_running());
    assert_eq!(engine.device().live_handles(), 0);
}

#[test]
fn test_unload_without_load() {
    let mut engine = engine(EngineConfig::default(), eventful_world());
    engine.unload();
    engine.unload();
    assert!(!engine.effects().is_running());
}

#[test]
fn test_frame_goes_through_offscreen_target() {
    let mut engine = engine(EngineConfig::default(), eventful_world());
    engine.device_mut().take_calls();

    let mut sink = DrawRecorder::new();
    engine.update(UpdateFlags::DRAW_ORBIS | UpdateFlags::DRAW_UI, &mut sink);

    let calls = engine.device().calls();
    assert!(matches!(calls.first(), Some(GpuCall::Viewport(800, 600))));
    assert!(matches!(calls.get(1), Some(GpuCall::BindFramebuffer(Some(_)))));
    assert!(matches!(calls.last(), Some(GpuCall::Composite(pass)) if pass.glow.is_some()));

    assert_eq!(sink.calls.last(), Some(&DrawCall::Ui));
    assert_eq!(sink.count(|c| matches!(c, DrawCall::Bsp(..))), 2);
    assert_eq!(sink.count(|c| matches!(c, DrawCall::Imago(..))), 4);
}

#[test]
fn test_onscreen_frame_without_framebuffer_support() {
    let config = EngineConfig {
        render: RenderConfig {
            postprocess: false,
            ..RenderConfig::default()
        },
        ..EngineConfig::default()
    };
    let device = HeadlessDevice::new().without_extension(EXT_FRAMEBUFFER_OBJECT);
    let Ok(mut engine) = RenderEngine::init(config, device, eventful_world(), 640, 480) else {
        panic!("on-screen rendering needs no framebuffers");
    };

    engine.update(UpdateFlags::DRAW_ORBIS, &mut DrawRecorder::new());
    assert!(engine.compositor().targets().is_none());
    assert!(!engine.device().calls().iter().any(|c| matches!(c, GpuCall::BindFramebuffer(_))));
}

#[test]
fn test_resize_reallocates_targets() {
    let mut engine = engine(EngineConfig::default(), eventful_world());
    let before = engine.device().live_handles();

    engine.resize(1920, 1080).expect("resize");
    assert_eq!(engine.compositor().window_size(), (1920, 1080));
    assert_eq!(engine.camera().width(), 1920);
    assert_eq!(engine.device().live_handles(), before);
    assert_eq!(engine.device().invalid_deletes(), 0);
}

#[test]
fn test_init_missing_framebuffer_support() {
    let device = HeadlessDevice::new().without_extension(EXT_FRAMEBUFFER_OBJECT);
    let result = RenderEngine::init(EngineConfig::default(), device, eventful_world(), 800, 600);

    assert!(matches!(result, Err(RenderError::MissingExtension(ext)) if ext == EXT_FRAMEBUFFER_OBJECT));
}

#[test]
fn test_init_missing_float_textures() {
    let device = HeadlessDevice::new().without_extension(EXT_TEXTURE_FLOAT);
    let result = RenderEngine::init(EngineConfig::default(), device, eventful_world(), 800, 600);
    assert!(matches!(result, Err(RenderError::MissingExtension(ext)) if ext == EXT_TEXTURE_FLOAT));

    // Float textures only back the glow targets.
    let config = EngineConfig::from_toml_str("[render]\nglow = false\n").expect("config");
    let device = HeadlessDevice::new().without_extension(EXT_TEXTURE_FLOAT);
    assert!(RenderEngine::init(config, device, eventful_world(), 800, 600).is_ok());
}

#[test]
fn test_init_incomplete_framebuffer() {
    let device = HeadlessDevice::new().with_incomplete_framebuffers();
    let result = RenderEngine::init(EngineConfig::default(), device, eventful_world(), 800, 600);

    assert!(matches!(result, Err(RenderError::IncompleteFramebuffer { .. })));
}

#[test]
fn test_init_rejects_invalid_config() {
    let mut config = EngineConfig::default();
    config.render.scale = 0.0;

    let result = RenderEngine::init(config, HeadlessDevice::new(), eventful_world(), 800, 600);
    assert!(matches!(result, Err(RenderError::Config(_))));
}
