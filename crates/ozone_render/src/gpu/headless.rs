//! Device and draw sink without a graphics context.
//!
//! Used by the headless client and the tests: every call is recorded, handle
//! lifetimes are tracked, and completeness failures can be injected.

use std::collections::HashSet;
use std::num::NonZeroU32;

use ozone_matrix::{FragId, ObjectId, StructId};

use super::{
    CompositePass, DrawSink, FramebufferId, FramebufferStatus, GpuDevice, MeshPass, RenderbufferId,
    TextureDesc, TextureId,
};
use crate::error::{RenderError, RenderResult};

/// Status code reported for injected completeness failures.
const STATUS_INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;

/// A recorded device call.
#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    /// Texture allocated.
    CreateTexture(TextureId, TextureDesc),
    /// Depth renderbuffer allocated.
    CreateRenderbuffer(RenderbufferId, i32, i32),
    /// Framebuffer created.
    CreateFramebuffer(FramebufferId),
    /// Texture freed.
    DeleteTexture(TextureId),
    /// Renderbuffer freed.
    DeleteRenderbuffer(RenderbufferId),
    /// Framebuffer freed.
    DeleteFramebuffer(FramebufferId),
    /// Framebuffer bound, `None` for the window.
    BindFramebuffer(Option<FramebufferId>),
    /// Viewport set.
    Viewport(i32, i32),
    /// Target cleared.
    Clear([f32; 4]),
    /// Offscreen target composited.
    Composite(CompositePass),
}

/// Recording device.
#[derive(Debug)]
pub struct HeadlessDevice {
    next_handle: u32,
    live: HashSet<u32>,
    calls: Vec<GpuCall>,
    missing_extensions: Vec<String>,
    incomplete_framebuffers: bool,
    invalid_deletes: usize,
}

impl HeadlessDevice {
    /// Creates a device supporting every extension.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            live: HashSet::new(),
            calls: Vec::new(),
            missing_extensions: Vec::new(),
            incomplete_framebuffers: false,
            invalid_deletes: 0,
        }
    }

    /// Reports `name` as unsupported.
    #[must_use]
    pub fn without_extension(mut self, name: &str) -> Self {
        self.missing_extensions.push(name.to_owned());
        self
    }

    /// Reports every framebuffer as incomplete.
    #[must_use]
    pub fn with_incomplete_framebuffers(mut self) -> Self {
        self.incomplete_framebuffers = true;
        self
    }

    /// Calls recorded since creation or the last [`HeadlessDevice::take_calls`].
    #[must_use]
    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<GpuCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of currently allocated resources.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    /// Number of deletes of handles that were not allocated.
    #[must_use]
    pub const fn invalid_deletes(&self) -> usize {
        self.invalid_deletes
    }

    fn allocate(&mut self, width: i32, height: i32) -> RenderResult<NonZeroU32> {
        if width <= 0 || height <= 0 {
            return Err(RenderError::ResourceAllocation(format!(
                "invalid size {width}x{height}"
            )));
        }
        let handle = NonZeroU32::new(self.next_handle)
            .ok_or_else(|| RenderError::ResourceAllocation("handle space exhausted".to_owned()))?;
        self.next_handle = self.next_handle.wrapping_add(1);
        self.live.insert(handle.get());
        Ok(handle)
    }

    fn release(&mut self, handle: u32) {
        if !self.live.remove(&handle) {
            tracing::warn!(handle, "HeadlessDevice: delete of unallocated handle");
            self.invalid_deletes += 1;
        }
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDevice for HeadlessDevice {
    fn has_extension(&self, name: &str) -> bool {
        !self.missing_extensions.iter().any(|m| m == name)
    }

    fn create_texture(&mut self, desc: TextureDesc) -> RenderResult<TextureId> {
        let id = TextureId(self.allocate(desc.width, desc.height)?);
        self.calls.push(GpuCall::CreateTexture(id, desc));
        Ok(id)
    }

    fn create_renderbuffer(&mut self, width: i32, height: i32) -> RenderResult<RenderbufferId> {
        let id = RenderbufferId(self.allocate(width, height)?);
        self.calls.push(GpuCall::CreateRenderbuffer(id, width, height));
        Ok(id)
    }

    fn create_framebuffer(
        &mut self,
        depth: Option<RenderbufferId>,
        colour: &[TextureId],
    ) -> RenderResult<FramebufferId> {
        let attachments = depth.map(RenderbufferId::get).into_iter().chain(colour.iter().map(|c| c.get()));
        for handle in attachments {
            if !self.live.contains(&handle) {
                return Err(RenderError::ResourceAllocation(format!(
                    "attachment {handle} is not allocated"
                )));
            }
        }
        let id = FramebufferId(self.allocate(1, 1)?);
        self.calls.push(GpuCall::CreateFramebuffer(id));
        Ok(id)
    }

    fn framebuffer_status(&mut self, frame: FramebufferId) -> FramebufferStatus {
        if self.incomplete_framebuffers || !self.live.contains(&frame.get()) {
            FramebufferStatus::Incomplete(STATUS_INCOMPLETE_ATTACHMENT)
        } else {
            FramebufferStatus::Complete
        }
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.release(id.get());
        self.calls.push(GpuCall::DeleteTexture(id));
    }

    fn delete_renderbuffer(&mut self, id: RenderbufferId) {
        self.release(id.get());
        self.calls.push(GpuCall::DeleteRenderbuffer(id));
    }

    fn delete_framebuffer(&mut self, id: FramebufferId) {
        self.release(id.get());
        self.calls.push(GpuCall::DeleteFramebuffer(id));
    }

    fn bind_framebuffer(&mut self, frame: Option<FramebufferId>) {
        self.calls.push(GpuCall::BindFramebuffer(frame));
    }

    fn viewport(&mut self, width: i32, height: i32) {
        self.calls.push(GpuCall::Viewport(width, height));
    }

    fn clear(&mut self, colour: [f32; 4]) {
        self.calls.push(GpuCall::Clear(colour));
    }

    fn composite(&mut self, pass: CompositePass) {
        self.calls.push(GpuCall::Composite(pass));
    }
}

/// A recorded model draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawCall {
    /// Structure pass.
    Bsp(StructId, MeshPass),
    /// Object pass.
    Imago(ObjectId, MeshPass),
    /// Fragment.
    Frag(FragId),
    /// Sky, with or without stars.
    Caelum {
        /// Star field drawn.
        stars: bool,
    },
    /// Terrain.
    Terra,
    /// Water surface.
    Water,
    /// User interface.
    Ui,
}

/// Draw sink that records every call.
#[derive(Clone, Debug, Default)]
pub struct DrawRecorder {
    /// Calls in issue order.
    pub calls: Vec<DrawCall>,
}

impl DrawRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl DrawSink for DrawRecorder {
    fn draw_bsp(&mut self, id: StructId, pass: MeshPass) {
        self.calls.push(DrawCall::Bsp(id, pass));
    }

    fn draw_imago(&mut self, id: ObjectId, pass: MeshPass) {
        self.calls.push(DrawCall::Imago(id, pass));
    }

    fn draw_frag(&mut self, id: FragId) {
        self.calls.push(DrawCall::Frag(id));
    }

    fn draw_caelum(&mut self, stars: bool) {
        self.calls.push(DrawCall::Caelum { stars });
    }

    fn draw_terra(&mut self) {
        self.calls.push(DrawCall::Terra);
    }

    fn draw_water(&mut self) {
        self.calls.push(DrawCall::Water);
    }

    fn draw_ui(&mut self) {
        self.calls.push(DrawCall::Ui);
    }
}
