//! Seams to the graphics device and the model renderers.
//!
//! [`GpuDevice`] is the narrow slice of the graphics API the compositor and
//! the geometry pass need. [`DrawSink`] issues the actual model draws
//! (structures, object imagos, fragments, terrain, UI). Both run on the
//! thread that owns the graphics context.

mod headless;

pub use headless::{DrawCall, DrawRecorder, GpuCall, HeadlessDevice};

use std::num::NonZeroU32;

use ozone_matrix::{FragId, ObjectId, StructId};

use crate::config::ScaleFilter;
use crate::error::RenderResult;

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Raw device handle.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0.get()
            }
        }
    };
}

gpu_handle!(
    /// Texture handle. Never zero.
    TextureId
);
gpu_handle!(
    /// Renderbuffer handle. Never zero.
    RenderbufferId
);
gpu_handle!(
    /// Framebuffer handle. Never zero; `None` stands for the window.
    FramebufferId
);

/// Texel format of a colour target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGB, the main colour buffer.
    Rgb8,
    /// 16-bit float RGB, glow buffers.
    Rgb16F,
}

/// Colour target description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Texel format.
    pub format: TextureFormat,
    /// Sampling filter.
    pub filter: ScaleFilter,
}

/// Result of a framebuffer completeness check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Ready to render into.
    Complete,
    /// Not usable; carries the device status code.
    Incomplete(u32),
}

/// Full-screen pass from the offscreen target to the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositePass {
    /// Offscreen colour buffer.
    pub colour: TextureId,
    /// Glow buffer, when glow is enabled.
    pub glow: Option<TextureId>,
    /// Run the post-process shader instead of a plain copy.
    pub postprocess: bool,
    /// Window width.
    pub width: i32,
    /// Window height.
    pub height: i32,
}

/// Mesh parts drawn by one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshPass {
    /// Opaque parts.
    Solid,
    /// Blended parts.
    Alpha,
}

/// Device capability required by offscreen rendering.
pub const EXT_FRAMEBUFFER_OBJECT: &str = "framebuffer_object";
/// Device capability required by float glow targets.
pub const EXT_TEXTURE_FLOAT: &str = "texture_float";

/// Graphics device operations used by the render core.
pub trait GpuDevice {
    /// True if the device supports capability `name`.
    fn has_extension(&self, name: &str) -> bool;

    /// Allocates a colour texture.
    fn create_texture(&mut self, desc: TextureDesc) -> RenderResult<TextureId>;

    /// Allocates a depth renderbuffer.
    fn create_renderbuffer(&mut self, width: i32, height: i32) -> RenderResult<RenderbufferId>;

    /// Creates a framebuffer with the given attachments. Colour attachments
    /// are bound in order.
    fn create_framebuffer(
        &mut self,
        depth: Option<RenderbufferId>,
        colour: &[TextureId],
    ) -> RenderResult<FramebufferId>;

    /// Completeness of a framebuffer.
    fn framebuffer_status(&mut self, frame: FramebufferId) -> FramebufferStatus;

    /// Frees a texture.
    fn delete_texture(&mut self, id: TextureId);

    /// Frees a renderbuffer.
    fn delete_renderbuffer(&mut self, id: RenderbufferId);

    /// Frees a framebuffer.
    fn delete_framebuffer(&mut self, id: FramebufferId);

    /// Binds a framebuffer, `None` for the window.
    fn bind_framebuffer(&mut self, frame: Option<FramebufferId>);

    /// Sets the viewport.
    fn viewport(&mut self, width: i32, height: i32);

    /// Clears colour and depth.
    fn clear(&mut self, colour: [f32; 4]);

    /// Draws the offscreen target to the bound framebuffer.
    fn composite(&mut self, pass: CompositePass);
}

/// Issues model draws. Ids are valid for the current frame only.
pub trait DrawSink {
    /// Draws one pass of a structure.
    fn draw_bsp(&mut self, id: StructId, pass: MeshPass);

    /// Draws one pass of an object.
    fn draw_imago(&mut self, id: ObjectId, pass: MeshPass);

    /// Draws a fragment.
    fn draw_frag(&mut self, id: FragId);

    /// Draws the sky dome. Only called while the camera is above ground and
    /// out of any liquid. `stars` is false in low-detail mode.
    fn draw_caelum(&mut self, _stars: bool) {}

    /// Draws the terrain, between solid structures and solid objects.
    fn draw_terra(&mut self) {}

    /// Draws the terrain's water surface, after translucent objects and
    /// before translucent structures.
    fn draw_water(&mut self) {}

    /// Draws the user interface over the finished frame.
    fn draw_ui(&mut self) {}
}
