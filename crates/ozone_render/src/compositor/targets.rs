//! Offscreen render targets.

use crate::config::ScaleFilter;
use crate::error::{RenderError, RenderResult};
use crate::gpu::{
    FramebufferId, FramebufferStatus, GpuDevice, RenderbufferId, TextureDesc, TextureFormat, TextureId,
};

/// Glow is blurred at this fraction of the render size.
const MIN_GLOW_DIVISOR: i32 = 4;

/// What to allocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetLayout {
    /// Render width.
    pub width: i32,
    /// Render height.
    pub height: i32,
    /// Colour buffer filter.
    pub filter: ScaleFilter,
    /// Allocate glow and min-glow targets.
    pub glow: bool,
}

/// One generation of offscreen targets.
///
/// Every handle is `Some` exactly while the device resource exists.
/// [`FrameTargets::release`] takes each handle before deleting it, so a
/// second release frees nothing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FrameTargets {
    /// Main framebuffer: depth + colour (+ glow).
    pub main_frame: Option<FramebufferId>,
    /// Main colour attachment.
    pub colour_buffer: Option<TextureId>,
    /// Main depth attachment.
    pub depth_buffer: Option<RenderbufferId>,
    /// Glow attachment of the main framebuffer.
    pub glow_buffer: Option<TextureId>,
    /// Downsampled glow.
    pub min_glow_buffer: Option<TextureId>,
    /// Framebuffer for the downsampled glow.
    pub min_glow_frame: Option<FramebufferId>,
}

impl FrameTargets {
    /// Allocates and validates a full set of targets. On failure everything
    /// allocated so far is released before the error is returned.
    pub fn create<D: GpuDevice + ?Sized>(device: &mut D, layout: TargetLayout) -> RenderResult<Self> {
        let mut targets = Self::default();

        if let Err(err) = targets.allocate(device, layout) {
            targets.release(device);
            return Err(err);
        }
        Ok(targets)
    }

    fn allocate<D: GpuDevice + ?Sized>(&mut self, device: &mut D, layout: TargetLayout) -> RenderResult<()> {
        let TargetLayout {
            width,
            height,
            filter,
            glow,
        } = layout;

        let depth = device.create_renderbuffer(width, height)?;
        self.depth_buffer = Some(depth);

        let colour = device.create_texture(TextureDesc {
            width,
            height,
            format: TextureFormat::Rgb8,
            filter,
        })?;
        self.colour_buffer = Some(colour);

        let mut attachments = vec![colour];

        if glow {
            let glow_desc = TextureDesc {
                width,
                height,
                format: TextureFormat::Rgb16F,
                filter: ScaleFilter::Linear,
            };
            let glow_buffer = device.create_texture(glow_desc)?;
            self.glow_buffer = Some(glow_buffer);
            attachments.push(glow_buffer);

            let min_glow = device.create_texture(TextureDesc {
                width: (width / MIN_GLOW_DIVISOR).max(1),
                height: (height / MIN_GLOW_DIVISOR).max(1),
                ..glow_desc
            })?;
            self.min_glow_buffer = Some(min_glow);

            let min_glow_frame = device.create_framebuffer(None, &[min_glow])?;
            self.min_glow_frame = Some(min_glow_frame);
            check_complete(device, min_glow_frame, "min-glow")?;
        }

        let main_frame = device.create_framebuffer(Some(depth), &attachments)?;
        self.main_frame = Some(main_frame);
        check_complete(device, main_frame, "main")
    }

    /// Frees every allocated resource and nulls its handle.
    pub fn release<D: GpuDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(id) = self.main_frame.take() {
            device.delete_framebuffer(id);
        }
        if let Some(id) = self.min_glow_frame.take() {
            device.delete_framebuffer(id);
        }
        if let Some(id) = self.colour_buffer.take() {
            device.delete_texture(id);
        }
        if let Some(id) = self.glow_buffer.take() {
            device.delete_texture(id);
        }
        if let Some(id) = self.min_glow_buffer.take() {
            device.delete_texture(id);
        }
        if let Some(id) = self.depth_buffer.take() {
            device.delete_renderbuffer(id);
        }
    }

    /// True if no resource is held.
    #[must_use]
    pub fn is_released(&self) -> bool {
        *self == Self::default()
    }
}

fn check_complete<D: GpuDevice + ?Sized>(
    device: &mut D,
    frame: FramebufferId,
    name: &'static str,
) -> RenderResult<()> {
    match device.framebuffer_status(frame) {
        FramebufferStatus::Complete => Ok(()),
        FramebufferStatus::Incomplete(status) => Err(RenderError::IncompleteFramebuffer { frame: name, status }),
    }
}
