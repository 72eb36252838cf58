//!
//! Headless backend that records every call.
//!
//! Used by the test-suite and by hosts that only need the resource
//! bookkeeping. Texture and framebuffer names are handed out from simple
//! counters starting at 1; the log is shared through [`CallLog`] so it can
//! be inspected after the backend has been moved into a context.
//!

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{
    BackendCaps, BackendError, BackendFramebuffer, BackendTexture, BlendEquation, BlendFactor,
    FramebufferTarget, PresetProgram, Primitive, RenderBackend, TextureDesc, VertexDefinition,
};
use super::types::Rect;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    StartFrame,
    EndFrame,
    SetViewport(Rect),
    ClearColor([f32; 4]),
    Clear,
    SetScissor(Rect),
    DisableScissor,
    SetBlendModeSeparate {
        equation: BlendEquation,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    },
    SetPresetProgram(PresetProgram),
    ClearPresetProgram,
    CreateTexture {
        texture: BackendTexture,
        desc: TextureDesc,
    },
    UploadTexture {
        texture: BackendTexture,
        rect: Rect,
    },
    SetTextureWrap {
        texture: BackendTexture,
        repeat: bool,
    },
    DeleteTexture(BackendTexture),
    CreateFramebuffer {
        framebuffer: BackendFramebuffer,
        width: u32,
        height: u32,
    },
    DeleteFramebuffer(BackendFramebuffer),
    BindFramebuffer(Option<FramebufferTarget>),
    DrawVertexArray(DrawCall),
}

/// A recorded draw, with a copy of the vertex bytes it covered.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub primitive: Primitive,
    pub stride: usize,
    pub count: usize,
    pub data: Vec<u8>,
}

impl DrawCall {
    /// Read `f32` component `component` of vertex `index`.
    #[must_use]
    pub fn float(&self, index: usize, component: usize) -> f32 {
        let at = index * self.stride + component * 4;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[at..at + 4]);
        f32::from_ne_bytes(bytes)
    }

    /// Read the packed colour at byte `offset` of vertex `index`.
    #[must_use]
    pub fn color(&self, index: usize, offset: usize) -> u32 {
        let at = index * self.stride + offset;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[at..at + 4]);
        u32::from_ne_bytes(bytes)
    }
}

/// Shared view of a [`RecordingBackend`]'s call log.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<BackendCall>>>);

impl CallLog {
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.0.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Every draw recorded so far, in order.
    #[must_use]
    pub fn draws(&self) -> Vec<DrawCall> {
        self.0
            .borrow()
            .iter()
            .filter_map(|call| match call {
                BackendCall::DrawVertexArray(draw) => Some(draw.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Number of times `texture` was deleted.
    #[must_use]
    pub fn deletes_of(&self, texture: BackendTexture) -> usize {
        self.count(|c| *c == BackendCall::DeleteTexture(texture))
    }

    fn push(&self, call: BackendCall) {
        self.0.borrow_mut().push(call);
    }
}

pub struct RecordingBackend {
    log: CallLog,
    caps: BackendCaps,
    next_texture: BackendTexture,
    next_framebuffer: BackendFramebuffer,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Backend with NPOT textures, framebuffers and a 4096 texture limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_caps(BackendCaps {
            max_texture_width: 4096,
            max_texture_height: 4096,
            npot_textures: true,
            framebuffers: true,
        })
    }

    #[must_use]
    pub fn with_caps(caps: BackendCaps) -> Self {
        Self {
            log: CallLog::default(),
            caps,
            next_texture: 1,
            next_framebuffer: 1,
        }
    }

    /// Handle on the call log that stays valid after the backend is moved.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn capabilities(&self) -> BackendCaps {
        self.caps
    }

    fn start_frame(&mut self) {
        self.log.push(BackendCall::StartFrame);
    }

    fn end_frame(&mut self) {
        self.log.push(BackendCall::EndFrame);
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.log.push(BackendCall::SetViewport(rect));
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.log.push(BackendCall::ClearColor([r, g, b, a]));
    }

    fn clear(&mut self) {
        self.log.push(BackendCall::Clear);
    }

    fn set_scissor(&mut self, rect: Rect) {
        self.log.push(BackendCall::SetScissor(rect));
    }

    fn disable_scissor(&mut self) {
        self.log.push(BackendCall::DisableScissor);
    }

    fn set_blend_mode_separate(
        &mut self,
        equation: BlendEquation,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.log.push(BackendCall::SetBlendModeSeparate {
            equation,
            src_rgb,
            dst_rgb,
            src_alpha,
            dst_alpha,
        });
    }

    fn set_preset_program(&mut self, program: &PresetProgram) {
        self.log.push(BackendCall::SetPresetProgram(*program));
    }

    fn clear_preset_program(&mut self) {
        self.log.push(BackendCall::ClearPresetProgram);
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<BackendTexture, BackendError> {
        if desc.width > self.caps.max_texture_width || desc.height > self.caps.max_texture_height
        {
            return Err(BackendError::TextureTooLarge {
                width: desc.width,
                height: desc.height,
                max_width: self.caps.max_texture_width,
                max_height: self.caps.max_texture_height,
            });
        }
        let texture = self.next_texture;
        self.next_texture += 1;
        self.log.push(BackendCall::CreateTexture {
            texture,
            desc: *desc,
        });
        Ok(texture)
    }

    fn upload_texture(
        &mut self,
        texture: BackendTexture,
        rect: Rect,
        _pixels: &[u8],
        _pitch: usize,
    ) -> Result<(), BackendError> {
        self.log.push(BackendCall::UploadTexture { texture, rect });
        Ok(())
    }

    fn set_texture_wrap(&mut self, texture: BackendTexture, repeat: bool) {
        self.log.push(BackendCall::SetTextureWrap { texture, repeat });
    }

    fn delete_texture(&mut self, texture: BackendTexture) {
        self.log.push(BackendCall::DeleteTexture(texture));
    }

    fn create_framebuffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<BackendFramebuffer, BackendError> {
        if !self.caps.framebuffers {
            return Err(BackendError::FramebufferUnsupported);
        }
        let framebuffer = self.next_framebuffer;
        self.next_framebuffer += 1;
        self.log.push(BackendCall::CreateFramebuffer {
            framebuffer,
            width,
            height,
        });
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: BackendFramebuffer) {
        self.log.push(BackendCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, target: Option<FramebufferTarget>) -> Result<(), BackendError> {
        self.log.push(BackendCall::BindFramebuffer(target));
        Ok(())
    }

    fn draw_vertex_array(
        &mut self,
        definition: &'static VertexDefinition,
        data: &[u8],
        primitive: Primitive,
        start: usize,
        count: usize,
    ) {
        let from = start * definition.stride;
        let to = (from + count * definition.stride).min(data.len());
        self.log.push(BackendCall::DrawVertexArray(DrawCall {
            primitive,
            stride: definition.stride,
            count,
            data: data[from.min(to)..to].to_vec(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_names_are_sequential() {
        let mut backend = RecordingBackend::new();
        let log = backend.log();
        let desc = TextureDesc {
            width: 16,
            height: 16,
            has_alpha: true,
        };
        assert_eq!(backend.create_texture(&desc), Ok(1));
        assert_eq!(backend.create_texture(&desc), Ok(2));
        backend.delete_texture(1);
        assert_eq!(log.deletes_of(1), 1);
        assert_eq!(log.deletes_of(2), 0);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_limits_enforced() {
        let mut backend = RecordingBackend::with_caps(BackendCaps {
            max_texture_width: 64,
            max_texture_height: 64,
            npot_textures: false,
            framebuffers: false,
        });
        let desc = TextureDesc {
            width: 128,
            height: 16,
            has_alpha: false,
        };
        assert!(matches!(
            backend.create_texture(&desc),
            Err(BackendError::TextureTooLarge { width: 128, .. })
        ));
        assert_eq!(
            backend.create_framebuffer(32, 32),
            Err(BackendError::FramebufferUnsupported)
        );
        assert!(backend.log().is_empty());
    }
}
