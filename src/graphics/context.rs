//!
//! The graphics context.
//!
//! [`Graphics`] owns the handle table, the texture registry (and through it
//! the backend), the graph settings, the vertex cache and the draw state.
//! There are no globals: every operation goes through one of these, and
//! tests build as many as they like on top of the recording backend.
//!
//! When the backend supports framebuffers, drawing targets one of two
//! offscreen screen buffers. `screen_flip` swaps them and blits the
//! finished one to the window, letterboxed to the output size.
//!

use std::path::Path;

use thiserror::Error;

use super::backend::{
    BackendError, BlendEquation, BlendFactor, CompareFunc, Primitive, PresetProgram,
    RenderBackend, TextureFilter, TexturePreset,
};
use super::draw::DrawState;
use super::graph::{self, GraphRegistry, GraphTextureInfo};
use super::math::Matrix;
use super::surface;
use super::texture::{self, TextureRegistry};
use super::types::{GraphId, Rect, SurfaceId, TextureId};
use super::vertex::{Position2Tex2Color, Vertex};
use super::vertex_cache::VertexCache;
use crate::config::Options;
use crate::handle::HandleTable;

#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("invalid handle {0}")]
    InvalidHandle(i32),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenBuffers {
    /// Target of the frame being drawn.
    back: TextureId,
    /// Last finished frame, shown on the window.
    front: TextureId,
}

pub struct Graphics {
    pub(crate) handles: HandleTable,
    pub(crate) textures: TextureRegistry,
    pub(crate) graphs: GraphRegistry,
    pub(crate) cache: VertexCache,
    pub(crate) draw: DrawState,
    screens: Option<ScreenBuffers>,
    window_size: (u32, u32),
    output_size: (u32, u32),
    options: Options,
}

/// Largest rectangle of the back buffer's aspect ratio centred in the output.
#[must_use]
pub fn letterbox(output_w: i32, output_h: i32, window_w: i32, window_h: i32) -> Rect {
    let mut dest = Rect::new(0, 0, output_w, output_h);
    if window_w <= 0 || window_h <= 0 {
        return dest;
    }

    let aspect_w = output_h * window_w / window_h;
    if aspect_w < output_w {
        dest.x = (output_w - aspect_w) / 2;
        dest.w = aspect_w;
    } else {
        let aspect_h = output_w * window_h / window_w;
        if aspect_h < output_h {
            dest.y = (output_h - aspect_h) / 2;
            dest.h = aspect_h;
        }
    }
    dest
}

impl Graphics {
    pub fn new(options: Options, backend: Box<dyn RenderBackend>) -> Result<Self, GraphicsError> {
        let (width, height) = (options.window_width, options.window_height);
        let mut handles = HandleTable::new(options.handle_chunk);
        let mut textures = TextureRegistry::new(backend);

        let screens = if textures.capabilities().framebuffers {
            Some(Self::create_screen_buffers(
                &mut handles,
                &mut textures,
                width,
                height,
            )?)
        } else {
            log::info!("Framebuffers unavailable, drawing straight to the window");
            None
        };

        let mut gfx = Self {
            handles,
            textures,
            graphs: GraphRegistry::new(&options),
            cache: VertexCache::new(options.vertex_arena_bytes),
            draw: DrawState::new(width as i32, height as i32),
            screens,
            window_size: (width, height),
            output_size: (width, height),
            options,
        };
        gfx.reset_draw_screen()?;
        Ok(gfx)
    }

    fn create_screen_buffers(
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        width: u32,
        height: u32,
    ) -> Result<ScreenBuffers, GraphicsError> {
        let back = textures.create_framebuffer(handles, width, height, false)?;
        texture::add_ref(handles, back)?;
        let front = textures.create_framebuffer(handles, width, height, false)?;
        texture::add_ref(handles, front)?;

        // First bind clears to opaque black; the back buffer gets its turn
        // when it becomes the draw screen.
        textures.bind_framebuffer(handles, Some(front))?;
        textures.bind_framebuffer(handles, None)?;
        Ok(ScreenBuffers { back, front })
    }

    /// Tear down every graph, surface and screen buffer.
    pub fn shutdown(&mut self) -> Result<(), GraphicsError> {
        self.flush_cache()?;
        GraphRegistry::init_graph(&mut self.handles, &mut self.textures);
        surface::init_surface(&mut self.handles);

        self.textures.bind_framebuffer(&mut self.handles, None)?;
        if let Some(screens) = self.screens.take() {
            self.textures.release(&mut self.handles, screens.back)?;
            self.textures.release(&mut self.handles, screens.front)?;
        }
        self.cache.clear();
        log::info!("Graphics shut down");
        Ok(())
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Direct table access, for surface and texture helpers.
    pub fn handles_mut(&mut self) -> &mut HandleTable {
        &mut self.handles
    }

    #[must_use]
    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    #[must_use]
    pub fn draw_state(&self) -> &DrawState {
        &self.draw
    }

    #[must_use]
    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Size of the real window the back buffer is presented into.
    pub fn set_output_size(&mut self, width: u32, height: u32) {
        self.output_size = (width, height);
    }

    /// Texture the window's back buffer draws into, if offscreen.
    #[must_use]
    pub fn window_framebuffer(&self) -> Option<TextureId> {
        self.screens.map(|s| s.back)
    }

    /// Swap the screen buffers and blit the finished frame to the window.
    pub(crate) fn present(&mut self) -> Result<(), GraphicsError> {
        let Some(screens) = self.screens else {
            return Ok(());
        };
        let screens = ScreenBuffers {
            back: screens.front,
            front: screens.back,
        };
        self.screens = Some(screens);

        let (out_w, out_h) = (self.output_size.0 as i32, self.output_size.1 as i32);
        let (win_w, win_h) = (self.window_size.0 as i32, self.window_size.1 as i32);
        let target = letterbox(out_w, out_h, win_w, win_h);

        self.textures.bind_framebuffer(&mut self.handles, None)?;
        let info = texture::texture_info(&self.handles, screens.front)
            .ok_or(GraphicsError::InvalidHandle(screens.front.id()))?;
        let sampled = texture::sampled(&self.handles, screens.front, TextureFilter::Linear);

        let (x1, y1) = (target.x as f32, target.y as f32);
        let (x2, y2) = (x1 + target.w as f32, y1 + target.h as f32);
        let tx2 = info.rect.w as f32 * info.x_mult;
        let ty2 = info.rect.h as f32 * info.y_mult;
        let quad = [
            Position2Tex2Color::new(x1, y1, 0.0, 0.0, 0xffff_ffff),
            Position2Tex2Color::new(x2, y1, tx2, 0.0, 0xffff_ffff),
            Position2Tex2Color::new(x1, y2, 0.0, ty2, 0xffff_ffff),
            Position2Tex2Color::new(x2, y2, tx2, ty2, 0xffff_ffff),
        ];

        let backend = self.textures.backend_mut();
        backend.disable_scissor();
        backend.set_viewport(Rect::new(0, 0, out_w, out_h));
        backend.clear_color(0.0, 0.0, 0.0, 1.0);
        backend.clear();
        backend.set_blend_mode_separate(
            BlendEquation::Disable,
            BlendFactor::One,
            BlendFactor::Zero,
            BlendFactor::One,
            BlendFactor::Zero,
        );
        backend.set_preset_program(&PresetProgram {
            preset: TexturePreset::Modulate,
            projection: Matrix::ortho_off_center_lh(0.0, out_w as f32, out_h as f32, 0.0, 0.0, 1.0),
            view: Matrix::identity(),
            texture: sampled,
            alpha_func: CompareFunc::Always,
            alpha_ref: 0.0,
        });
        backend.draw_vertex_array(
            Position2Tex2Color::definition(),
            bytemuck::cast_slice(&quad),
            Primitive::TriangleStrip,
            0,
            4,
        );
        backend.clear_preset_program();
        Ok(())
    }

    // Graphs

    /// Flush if the open batch samples `texture`, before it can go away.
    fn flush_if_batched(&mut self, texture: TextureId) -> Result<(), GraphicsError> {
        let batched = self
            .cache
            .key()
            .is_some_and(|k| k.texture == Some(texture) && self.cache.has_pending());
        if batched {
            self.flush_cache()?;
        }
        Ok(())
    }

    pub fn load_graph(&mut self, path: impl AsRef<Path>, flip: bool) -> Result<GraphId, GraphicsError> {
        self.graphs
            .load(&mut self.handles, &mut self.textures, path.as_ref(), flip)
    }

    pub fn load_graph_from_memory(&mut self, bytes: &[u8], flip: bool) -> Result<GraphId, GraphicsError> {
        self.graphs
            .load_from_memory(&mut self.handles, &mut self.textures, bytes, flip)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn load_div_graph(
        &mut self,
        path: impl AsRef<Path>,
        count: usize,
        x_count: i32,
        y_count: i32,
        x_size: i32,
        y_size: i32,
        flip: bool,
    ) -> Result<Vec<GraphId>, GraphicsError> {
        self.graphs.load_div(
            &mut self.handles,
            &mut self.textures,
            path.as_ref(),
            count,
            x_count,
            y_count,
            x_size,
            y_size,
            flip,
        )
    }

    pub fn graph_from_surface(&mut self, surface_id: SurfaceId) -> Result<GraphId, GraphicsError> {
        self.graphs
            .create_from_surface(&mut self.handles, &mut self.textures, surface_id)
    }

    pub fn graph_from_texture(&mut self, texture: TextureId, rect: Rect) -> Result<GraphId, GraphicsError> {
        GraphRegistry::from_texture(&mut self.handles, texture, rect)
    }

    pub fn make_screen(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<GraphId, GraphicsError> {
        GraphRegistry::make_screen(&mut self.handles, &mut self.textures, width, height, has_alpha)
    }

    pub fn make_graph(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<GraphId, GraphicsError> {
        GraphRegistry::make_graph(&mut self.handles, &mut self.textures, width, height, has_alpha)
    }

    pub fn derivation_graph(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        src: GraphId,
    ) -> Result<GraphId, GraphicsError> {
        GraphRegistry::derivation(&mut self.handles, x, y, w, h, src)
    }

    pub fn delete_graph(&mut self, id: GraphId) -> Result<(), GraphicsError> {
        if let Some((texture, _)) = graph::get_texture_id(&self.handles, id) {
            self.flush_if_batched(texture)?;
        }
        GraphRegistry::delete(&mut self.handles, &mut self.textures, id)
    }

    pub fn delete_sharing_graph(&mut self, id: GraphId) -> Result<(), GraphicsError> {
        if let Some((texture, _)) = graph::get_texture_id(&self.handles, id) {
            self.flush_if_batched(texture)?;
        }
        GraphRegistry::delete_sharing_graph(&mut self.handles, &mut self.textures, id)
    }

    pub fn init_graph(&mut self) -> Result<(), GraphicsError> {
        self.flush_cache()?;
        GraphRegistry::init_graph(&mut self.handles, &mut self.textures);
        Ok(())
    }

    #[must_use]
    pub fn graph_size(&self, id: GraphId) -> Option<(i32, i32)> {
        graph::get_size(&self.handles, id)
    }

    #[must_use]
    pub fn graph_count(&self) -> usize {
        graph::count(&self.handles)
    }

    #[must_use]
    pub fn graph_texture_info(&self, id: GraphId) -> Option<GraphTextureInfo> {
        graph::get_texture_info(&self.handles, id)
    }

    pub fn set_graph_wrap(&mut self, id: GraphId, wrap: bool) -> Result<(), GraphicsError> {
        GraphRegistry::set_wrap(&self.handles, &mut self.textures, id, wrap)
    }

    #[must_use]
    pub fn graph_settings(&self) -> &GraphRegistry {
        &self.graphs
    }

    pub fn graph_settings_mut(&mut self) -> &mut GraphRegistry {
        &mut self.graphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use crate::graphics::backend::BackendCaps;
    use crate::graphics::recording::{BackendCall, CallLog, RecordingBackend};

    fn options() -> Options {
        Options {
            window_width: 320,
            window_height: 240,
            backend: BackendKind::Recording,
            ..Options::default()
        }
    }

    fn graphics_with(backend: RecordingBackend) -> (Graphics, CallLog) {
        let log = backend.log();
        (Graphics::new(options(), Box::new(backend)).unwrap(), log)
    }

    #[test]
    fn test_letterbox() {
        assert_eq!(letterbox(640, 480, 640, 480), Rect::new(0, 0, 640, 480));
        assert_eq!(letterbox(1280, 480, 640, 480), Rect::new(320, 0, 640, 480));
        assert_eq!(letterbox(640, 960, 640, 480), Rect::new(0, 240, 640, 480));
    }

    #[test]
    fn test_new_creates_screen_buffers() {
        let (gfx, log) = graphics_with(RecordingBackend::new());
        assert_eq!(texture::count(gfx.handles()), 2);
        assert_eq!(texture::framebuffer_count(gfx.handles()), 1);
        let back = gfx.window_framebuffer().unwrap();
        assert_eq!(texture::ref_count(gfx.handles(), back), Some(1));
        assert_eq!(log.count(|c| *c == BackendCall::StartFrame), 1);
        assert_eq!(gfx.draw_state().screen_size(), (320, 240));
    }

    #[test]
    fn test_new_without_framebuffers_uses_window() {
        let (gfx, log) = graphics_with(RecordingBackend::with_caps(BackendCaps {
            max_texture_width: 1024,
            max_texture_height: 1024,
            npot_textures: true,
            framebuffers: false,
        }));
        assert!(gfx.window_framebuffer().is_none());
        assert_eq!(texture::count(gfx.handles()), 0);
        assert!(log
            .calls()
            .contains(&BackendCall::SetViewport(Rect::new(0, 0, 320, 240))));
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let (mut gfx, log) = graphics_with(RecordingBackend::new());
        gfx.make_screen(64, 64, true).unwrap();
        gfx.make_graph(8, 8, false).unwrap();
        gfx.shutdown().unwrap();
        assert_eq!(texture::count(gfx.handles()), 0);
        assert_eq!(texture::framebuffer_count(gfx.handles()), 0);
        assert_eq!(gfx.graph_count(), 0);
        assert_eq!(log.count(|c| matches!(c, BackendCall::DeleteTexture(_))), 4);
    }
}
