//!
//! Texture and framebuffer registry.
//!
//! Texture references are handle-table payloads of kind
//! [`HandleKind::Texture`], reference counted by their owners (graphs,
//! screens). Framebuffers are pooled by size under
//! [`HandleKind::Framebuffer`] and counted separately: one reference per
//! texture that targets them, plus one while bound.
//!

use super::backend::{
    BackendCaps, BackendError, BackendFramebuffer, BackendTexture, FramebufferTarget,
    RenderBackend, SampledTexture, TextureDesc, TextureFilter,
};
use super::context::GraphicsError;
use super::surface;
use super::types::{FramebufferId, Rect, SurfaceId, TextureId};
use crate::handle::{HandleKind, HandleTable};

/// Registry record for one texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRef {
    /// `None` once the backend object is gone (after `clear_all_data`).
    pub texture: Option<BackendTexture>,
    pub width: i32,
    pub height: i32,
    pub tex_width: u32,
    pub tex_height: u32,
    pub x_mult: f32,
    pub y_mult: f32,
    pub has_alpha: bool,
    pub wrappable: bool,
    pub framebuffer: Option<FramebufferId>,
    pub needs_clear: bool,
    pub ref_count: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FramebufferInfo {
    framebuffer: BackendFramebuffer,
    width: u32,
    height: u32,
    ref_count: i32,
}

/// Whole-texture rectangle plus texel-to-UV multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureInfo {
    pub rect: Rect,
    pub x_mult: f32,
    pub y_mult: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundFramebuffer {
    framebuffer: FramebufferId,
    texture: BackendTexture,
}

/// Owns the backend and every texture/framebuffer created through it.
pub struct TextureRegistry {
    backend: Box<dyn RenderBackend>,
    caps: BackendCaps,
    bound: Option<BoundFramebuffer>,
}

#[must_use]
pub fn get(handles: &HandleTable, id: TextureId) -> Option<&TextureRef> {
    handles.get_data::<TextureRef>(id.id(), HandleKind::Texture)
}

fn get_mut(handles: &mut HandleTable, id: TextureId) -> Option<&mut TextureRef> {
    handles.get_data_mut::<TextureRef>(id.id(), HandleKind::Texture)
}

fn framebuffer_info(handles: &mut HandleTable, id: FramebufferId) -> Option<&mut FramebufferInfo> {
    handles.get_data_mut::<FramebufferInfo>(id.id(), HandleKind::Framebuffer)
}

/// Add an owner to a texture.
pub fn add_ref(handles: &mut HandleTable, id: TextureId) -> Result<(), GraphicsError> {
    let tex = get_mut(handles, id).ok_or(GraphicsError::InvalidHandle(id.id()))?;
    tex.ref_count += 1;
    Ok(())
}

#[must_use]
pub fn ref_count(handles: &HandleTable, id: TextureId) -> Option<i32> {
    get(handles, id).map(|t| t.ref_count)
}

/// `false` for unknown ids.
#[must_use]
pub fn has_alpha_channel(handles: &HandleTable, id: TextureId) -> bool {
    get(handles, id).is_some_and(|t| t.has_alpha)
}

#[must_use]
pub fn texture_info(handles: &HandleTable, id: TextureId) -> Option<TextureInfo> {
    get(handles, id).map(|t| TextureInfo {
        rect: Rect::new(0, 0, t.width, t.height),
        x_mult: t.x_mult,
        y_mult: t.y_mult,
    })
}

/// Backend texture and sampling filter for a preset program.
#[must_use]
pub fn sampled(handles: &HandleTable, id: TextureId, filter: TextureFilter) -> Option<SampledTexture> {
    let texture = get(handles, id)?.texture?;
    Some(SampledTexture { texture, filter })
}

#[must_use]
pub fn count(handles: &HandleTable) -> usize {
    handles.count_of(HandleKind::Texture)
}

#[must_use]
pub fn framebuffer_count(handles: &HandleTable) -> usize {
    handles.count_of(HandleKind::Framebuffer)
}

impl TextureRegistry {
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        let caps = backend.capabilities();
        log::info!(
            "Using {} backend (max texture {}x{}, npot: {}, framebuffers: {})",
            backend.name(),
            caps.max_texture_width,
            caps.max_texture_height,
            caps.npot_textures,
            caps.framebuffers
        );
        Self {
            backend,
            caps,
            bound: None,
        }
    }

    #[must_use]
    pub fn capabilities(&self) -> BackendCaps {
        self.caps
    }

    #[must_use]
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn RenderBackend {
        self.backend.as_mut()
    }

    /// Create an empty texture with a reference count of zero.
    pub fn create_from_dimensions(
        &mut self,
        handles: &mut HandleTable,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> Result<TextureId, GraphicsError> {
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(GraphicsError::InvalidDimensions { width, height });
        }

        let width_pow2 = width.next_power_of_two();
        let height_pow2 = height.next_power_of_two();
        let wrappable = width_pow2 == width && height_pow2 == height;
        let (tex_width, tex_height) = if !wrappable && self.caps.npot_textures {
            (width, height)
        } else {
            (width_pow2, height_pow2)
        };

        if tex_width > self.caps.max_texture_width || tex_height > self.caps.max_texture_height {
            log::warn!(
                "Texture {}x{} (padded {}x{}) exceeds backend limit {}x{}",
                width,
                height,
                tex_width,
                tex_height,
                self.caps.max_texture_width,
                self.caps.max_texture_height
            );
            return Err(BackendError::TextureTooLarge {
                width: tex_width,
                height: tex_height,
                max_width: self.caps.max_texture_width,
                max_height: self.caps.max_texture_height,
            }
            .into());
        }

        let texture = self.backend.create_texture(&TextureDesc {
            width: tex_width,
            height: tex_height,
            has_alpha,
        })?;
        self.backend.set_texture_wrap(texture, wrappable);

        let Some(id) = handles.acquire_id(HandleKind::Texture) else {
            self.backend.delete_texture(texture);
            return Err(GraphicsError::InvalidHandle(-1));
        };
        handles.allocate_data(
            id,
            TextureRef {
                texture: Some(texture),
                width: width as i32,
                height: height as i32,
                tex_width,
                tex_height,
                x_mult: 1.0 / tex_width as f32,
                y_mult: 1.0 / tex_height as f32,
                has_alpha,
                wrappable,
                framebuffer: None,
                needs_clear: false,
                ref_count: 0,
            },
        );

        log::debug!(
            "Created texture {} ({}x{} in {}x{})",
            id,
            width,
            height,
            tex_width,
            tex_height
        );
        Ok(TextureId::new(id))
    }

    /// Upload a surface into a new texture of the same size.
    pub fn create_from_surface(
        &mut self,
        handles: &mut HandleTable,
        surface_id: SurfaceId,
        has_alpha: bool,
    ) -> Result<TextureId, GraphicsError> {
        let (width, height) =
            surface::get_size(handles, surface_id).ok_or(GraphicsError::InvalidHandle(surface_id.id()))?;
        let id = self.create_from_dimensions(handles, width, height, has_alpha)?;
        if let Err(e) = self.blit_surface(handles, id, surface_id, None) {
            self.release(handles, id)?;
            return Err(e);
        }
        Ok(id)
    }

    /// Copy a surface's top-left corner into `rect` of a texture (whole surface for `None`).
    pub fn blit_surface(
        &mut self,
        handles: &HandleTable,
        id: TextureId,
        surface_id: SurfaceId,
        rect: Option<Rect>,
    ) -> Result<(), GraphicsError> {
        let texture = get(handles, id)
            .and_then(|t| t.texture)
            .ok_or(GraphicsError::InvalidHandle(id.id()))?;
        let surface =
            surface::get(handles, surface_id).ok_or(GraphicsError::InvalidHandle(surface_id.id()))?;

        let rect = rect.unwrap_or_else(|| {
            Rect::new(0, 0, surface.width() as i32, surface.height() as i32)
        });
        let pitch = surface.width() as usize * 4;
        self.backend
            .upload_texture(texture, rect, surface.pixels.as_raw(), pitch)?;
        Ok(())
    }

    /// Texture plus a pooled framebuffer of the same size; cleared on first bind.
    pub fn create_framebuffer(
        &mut self,
        handles: &mut HandleTable,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> Result<TextureId, GraphicsError> {
        let id = self.create_from_dimensions(handles, width, height, has_alpha)?;

        let framebuffer = match self.framebuffer_acquire(handles, width, height) {
            Ok(fb) => fb,
            Err(e) => {
                self.release(handles, id)?;
                return Err(e);
            }
        };

        if let Some(tex) = get_mut(handles, id) {
            tex.framebuffer = Some(framebuffer);
            tex.needs_clear = true;
        }
        Ok(id)
    }

    /// Drop one owner; the backend texture goes away at zero.
    pub fn release(&mut self, handles: &mut HandleTable, id: TextureId) -> Result<(), GraphicsError> {
        let tex = get_mut(handles, id).ok_or(GraphicsError::InvalidHandle(id.id()))?;
        tex.ref_count -= 1;
        if tex.ref_count > 0 {
            return Ok(());
        }

        let backend_texture = tex.texture.take();
        let framebuffer = tex.framebuffer.take();
        if let Some(texture) = backend_texture {
            self.backend.delete_texture(texture);
        }
        if let Some(fb) = framebuffer {
            self.framebuffer_release(handles, fb);
        }
        handles.release_id(id.id(), true);
        log::debug!("Destroyed texture {}", id);
        Ok(())
    }

    /// Clamp or repeat addressing; repeat only applies to power-of-two textures.
    pub fn set_wrap(
        &mut self,
        handles: &HandleTable,
        id: TextureId,
        wrap: bool,
    ) -> Result<(), GraphicsError> {
        let tex = get(handles, id).ok_or(GraphicsError::InvalidHandle(id.id()))?;
        let texture = tex.texture.ok_or(GraphicsError::InvalidHandle(id.id()))?;
        self.backend.set_texture_wrap(texture, wrap && tex.wrappable);
        Ok(())
    }

    /// Make `target` the render target, or the window for `None` / non-framebuffer textures.
    pub fn bind_framebuffer(
        &mut self,
        handles: &mut HandleTable,
        target: Option<TextureId>,
    ) -> Result<(), GraphicsError> {
        let wanted = target.and_then(|id| {
            let tex = get(handles, id)?;
            Some((tex.framebuffer?, tex.texture?, id))
        });

        let same = match (self.bound, wanted) {
            (Some(bound), Some((fb, texture, _))) => {
                bound.framebuffer == fb && bound.texture == texture
            }
            (None, None) => true,
            _ => false,
        };
        if same {
            return Ok(());
        }

        if let Some(previous) = self.bound.take() {
            self.framebuffer_release(handles, previous.framebuffer);
        }

        let Some((fb, texture, id)) = wanted else {
            self.backend.bind_framebuffer(None)?;
            return Ok(());
        };
        let Some(info) = framebuffer_info(handles, fb) else {
            self.backend.bind_framebuffer(None)?;
            return Ok(());
        };
        let (framebuffer, width, height) = (info.framebuffer, info.width, info.height);

        if let Err(e) = self.backend.bind_framebuffer(Some(FramebufferTarget {
            framebuffer,
            texture,
        })) {
            self.backend.bind_framebuffer(None)?;
            return Err(e.into());
        }
        self.backend
            .set_viewport(Rect::new(0, 0, width as i32, height as i32));

        if let Some(info) = framebuffer_info(handles, fb) {
            info.ref_count += 1;
        }
        self.bound = Some(BoundFramebuffer {
            framebuffer: fb,
            texture,
        });

        if let Some(tex) = get_mut(handles, id) {
            if tex.needs_clear {
                tex.needs_clear = false;
                let alpha = if tex.has_alpha { 0.0 } else { 1.0 };
                self.backend.clear_color(0.0, 0.0, 0.0, alpha);
                self.backend.clear();
            }
        }
        Ok(())
    }

    /// Destroy every backend object while keeping the handles alive.
    pub fn clear_all_data(&mut self, handles: &mut HandleTable) {
        if let Some(previous) = self.bound.take() {
            self.framebuffer_release(handles, previous.framebuffer);
        }
        if let Err(e) = self.backend.bind_framebuffer(None) {
            log::warn!("Could not unbind framebuffer: {}", e);
        }

        let ids: Vec<i32> = handles.ids_of(HandleKind::Texture).collect();
        for raw in ids {
            let id = TextureId::new(raw);
            let Some(tex) = get_mut(handles, id) else {
                continue;
            };
            let texture = tex.texture.take();
            let framebuffer = tex.framebuffer.take();
            if let Some(texture) = texture {
                self.backend.delete_texture(texture);
            }
            if let Some(fb) = framebuffer {
                self.framebuffer_release(handles, fb);
            }
        }
    }

    fn framebuffer_acquire(
        &mut self,
        handles: &mut HandleTable,
        width: u32,
        height: u32,
    ) -> Result<FramebufferId, GraphicsError> {
        if !self.caps.framebuffers {
            return Err(BackendError::FramebufferUnsupported.into());
        }

        let existing = handles.ids_of(HandleKind::Framebuffer).find(|&id| {
            handles
                .get_data::<FramebufferInfo>(id, HandleKind::Framebuffer)
                .is_some_and(|info| info.width == width && info.height == height)
        });
        if let Some(id) = existing {
            let id = FramebufferId::new(id);
            if let Some(info) = framebuffer_info(handles, id) {
                info.ref_count += 1;
            }
            log::debug!("Reusing framebuffer {} for {}x{}", id, width, height);
            return Ok(id);
        }

        let framebuffer = self.backend.create_framebuffer(width, height)?;
        let Some(id) = handles.acquire_id(HandleKind::Framebuffer) else {
            self.backend.delete_framebuffer(framebuffer);
            return Err(GraphicsError::InvalidHandle(-1));
        };
        handles.allocate_data(
            id,
            FramebufferInfo {
                framebuffer,
                width,
                height,
                ref_count: 1,
            },
        );
        Ok(FramebufferId::new(id))
    }

    fn framebuffer_release(&mut self, handles: &mut HandleTable, id: FramebufferId) {
        let Some(info) = framebuffer_info(handles, id) else {
            return;
        };
        info.ref_count -= 1;
        if info.ref_count <= 0 {
            let framebuffer = info.framebuffer;
            self.backend.delete_framebuffer(framebuffer);
            handles.release_id(id.id(), true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::recording::{BackendCall, CallLog, RecordingBackend};

    fn registry_with(caps: BackendCaps) -> (TextureRegistry, CallLog, HandleTable) {
        let backend = RecordingBackend::with_caps(caps);
        let log = backend.log();
        (
            TextureRegistry::new(Box::new(backend)),
            log,
            HandleTable::default(),
        )
    }

    fn caps(npot: bool) -> BackendCaps {
        BackendCaps {
            max_texture_width: 256,
            max_texture_height: 256,
            npot_textures: npot,
            framebuffers: true,
        }
    }

    #[test]
    fn test_pow2_padding_without_npot() {
        let (mut reg, _log, mut handles) = registry_with(caps(false));
        let id = reg.create_from_dimensions(&mut handles, 100, 30, true).unwrap();
        let tex = get(&handles, id).unwrap();
        assert_eq!((tex.tex_width, tex.tex_height), (128, 32));
        assert!(!tex.wrappable);
        assert_eq!(tex.ref_count, 0);
        assert_eq!(tex.framebuffer, None);

        let info = texture_info(&handles, id).unwrap();
        assert_eq!(info.rect, Rect::new(0, 0, 100, 30));
        assert_eq!(info.x_mult, 1.0 / 128.0);
        assert_eq!(info.y_mult, 1.0 / 32.0);
    }

    #[test]
    fn test_npot_keeps_size_and_pow2_is_wrappable() {
        let (mut reg, log, mut handles) = registry_with(caps(true));
        let npot = reg.create_from_dimensions(&mut handles, 100, 30, false).unwrap();
        assert_eq!(get(&handles, npot).unwrap().tex_width, 100);

        let pow2 = reg.create_from_dimensions(&mut handles, 64, 64, false).unwrap();
        assert!(get(&handles, pow2).unwrap().wrappable);

        reg.set_wrap(&handles, npot, true).unwrap();
        reg.set_wrap(&handles, pow2, true).unwrap();
        let calls = log.calls();
        assert_eq!(
            calls[calls.len() - 2],
            BackendCall::SetTextureWrap {
                texture: 1,
                repeat: false
            }
        );
        assert_eq!(
            calls[calls.len() - 1],
            BackendCall::SetTextureWrap {
                texture: 2,
                repeat: true
            }
        );
    }

    #[test]
    fn test_too_large_fails() {
        let (mut reg, log, mut handles) = registry_with(caps(false));
        let err = reg
            .create_from_dimensions(&mut handles, 257, 4, true)
            .unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::Backend(BackendError::TextureTooLarge { width: 512, .. })
        ));
        assert_eq!(count(&handles), 0);
        assert!(log.is_empty());
    }

    #[test]
    fn test_release_deletes_at_zero() {
        let (mut reg, log, mut handles) = registry_with(caps(true));
        let id = reg.create_from_dimensions(&mut handles, 8, 8, true).unwrap();
        add_ref(&mut handles, id).unwrap();
        add_ref(&mut handles, id).unwrap();

        reg.release(&mut handles, id).unwrap();
        assert_eq!(ref_count(&handles, id), Some(1));
        assert_eq!(log.deletes_of(1), 0);

        reg.release(&mut handles, id).unwrap();
        assert_eq!(ref_count(&handles, id), None);
        assert_eq!(log.deletes_of(1), 1);
        assert!(reg.release(&mut handles, id).is_err());
        assert!(!has_alpha_channel(&handles, id));
    }

    #[test]
    fn test_framebuffers_pooled_by_size() {
        let (mut reg, log, mut handles) = registry_with(caps(true));
        let a = reg.create_framebuffer(&mut handles, 32, 32, true).unwrap();
        let b = reg.create_framebuffer(&mut handles, 32, 32, false).unwrap();
        let c = reg.create_framebuffer(&mut handles, 16, 16, false).unwrap();
        assert_eq!(framebuffer_count(&handles), 2);
        assert_eq!(
            get(&handles, a).unwrap().framebuffer,
            get(&handles, b).unwrap().framebuffer
        );
        assert_ne!(
            get(&handles, a).unwrap().framebuffer,
            get(&handles, c).unwrap().framebuffer
        );

        add_ref(&mut handles, a).unwrap();
        add_ref(&mut handles, b).unwrap();
        reg.release(&mut handles, a).unwrap();
        assert_eq!(framebuffer_count(&handles), 2);
        reg.release(&mut handles, b).unwrap();
        assert_eq!(framebuffer_count(&handles), 1);
        assert_eq!(
            log.count(|c| matches!(c, BackendCall::DeleteFramebuffer(_))),
            1
        );
    }

    #[test]
    fn test_first_bind_clears_and_rebind_is_noop() {
        let (mut reg, log, mut handles) = registry_with(caps(true));
        let opaque = reg.create_framebuffer(&mut handles, 32, 32, false).unwrap();
        let clear = reg.create_framebuffer(&mut handles, 16, 16, true).unwrap();
        log.clear();

        reg.bind_framebuffer(&mut handles, Some(opaque)).unwrap();
        let calls = log.calls();
        assert!(matches!(calls[0], BackendCall::BindFramebuffer(Some(_))));
        assert_eq!(calls[1], BackendCall::SetViewport(Rect::new(0, 0, 32, 32)));
        assert_eq!(calls[2], BackendCall::ClearColor([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(calls[3], BackendCall::Clear);

        log.clear();
        reg.bind_framebuffer(&mut handles, Some(opaque)).unwrap();
        assert!(log.is_empty());

        reg.bind_framebuffer(&mut handles, Some(clear)).unwrap();
        assert!(log
            .calls()
            .contains(&BackendCall::ClearColor([0.0, 0.0, 0.0, 0.0])));

        log.clear();
        reg.bind_framebuffer(&mut handles, Some(opaque)).unwrap();
        assert!(!log.calls().contains(&BackendCall::Clear));

        reg.bind_framebuffer(&mut handles, None).unwrap();
        assert_eq!(log.calls().last(), Some(&BackendCall::BindFramebuffer(None)));
    }

    #[test]
    fn test_bound_framebuffer_outlives_texture() {
        let (mut reg, log, mut handles) = registry_with(caps(true));
        let id = reg.create_framebuffer(&mut handles, 32, 32, false).unwrap();
        add_ref(&mut handles, id).unwrap();
        reg.bind_framebuffer(&mut handles, Some(id)).unwrap();

        reg.release(&mut handles, id).unwrap();
        assert_eq!(framebuffer_count(&handles), 1);

        reg.bind_framebuffer(&mut handles, None).unwrap();
        assert_eq!(framebuffer_count(&handles), 0);
        assert_eq!(
            log.count(|c| matches!(c, BackendCall::DeleteFramebuffer(_))),
            1
        );
    }

    #[test]
    fn test_framebuffer_unsupported() {
        let (mut reg, log, mut handles) = registry_with(BackendCaps {
            framebuffers: false,
            ..caps(true)
        });
        assert!(reg.create_framebuffer(&mut handles, 8, 8, false).is_err());
        assert_eq!(count(&handles), 0);
        assert_eq!(log.deletes_of(1), 1);
    }

    #[test]
    fn test_clear_all_data_keeps_handles() {
        let (mut reg, log, mut handles) = registry_with(caps(true));
        let a = reg.create_from_dimensions(&mut handles, 8, 8, false).unwrap();
        let b = reg.create_framebuffer(&mut handles, 8, 8, false).unwrap();
        reg.clear_all_data(&mut handles);

        assert_eq!(count(&handles), 2);
        assert_eq!(framebuffer_count(&handles), 0);
        assert_eq!(get(&handles, a).unwrap().texture, None);
        assert!(sampled(&handles, b, TextureFilter::Nearest).is_none());
        assert_eq!(log.deletes_of(1), 1);
        assert_eq!(log.deletes_of(2), 1);
        assert!(reg.set_wrap(&handles, a, true).is_err());
    }
}
