//!
//! Draw state and the drawing operations.
//!
//! Every primitive is written straight into the vertex cache. Shapes use
//! [`Position2Color`] and always ask for blending; textured draws use
//! [`Position2Tex2Color`] and blend only when the caller asks. The current
//! blend mode is applied when a batch is flushed, not when it is filled.
//!
//! Vertex layouts below reproduce DxLib's pixel output, including the odd
//! ones (half-pixel line offsets, `DrawRectGraph` clipping).
//!

use super::backend::{CompareFunc, Primitive, PresetProgram, TextureFilter};
use super::blend::{self, DX_BLENDMODE_ALPHA, DX_BLENDMODE_NOBLEND};
use super::context::{Graphics, GraphicsError};
use super::graph::{self, GraphTextureInfo};
use super::math::Matrix;
use super::texture;
use super::types::{GraphId, Rect, TextureId};
use super::vertex::{Position2Color, Position2Tex2Color, Vertex};
use super::vertex_cache::CacheKey;

pub const DX_DRAWMODE_NEAREST: i32 = 0;
pub const DX_DRAWMODE_BILINEAR: i32 = 1;

/// Segments used for ovals and circles.
pub const OVAL_POINTS: usize = 36;

/// Pack an RGB triple the way DxLib's `GetColor` does.
#[must_use]
pub const fn get_color(r: i32, g: i32, b: i32) -> u32 {
    (r as u32 & 0xff) | ((g as u32 & 0xff) << 8) | ((b as u32 & 0xff) << 16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundScreen {
    /// Nothing bound since the last reset; binding starts a frame.
    Unbound,
    /// `None` is the window itself.
    Target(Option<TextureId>),
}

/// Blend, colour, scissor and render-target state.
#[derive(Debug, Clone)]
pub struct DrawState {
    blend_mode: i32,
    last_blend_mode: Option<i32>,
    draw_mode: i32,
    bright: [u32; 3],
    alpha: u32,
    background: [i32; 3],
    scissor: Option<Rect>,
    screen_width: i32,
    screen_height: i32,
    current: BoundScreen,
    draw_screen: Option<TextureId>,
    draw_graph: Option<GraphId>,
    projection: Matrix,
    view: Matrix,
}

impl DrawState {
    #[must_use]
    pub fn new(screen_width: i32, screen_height: i32) -> Self {
        Self {
            blend_mode: DX_BLENDMODE_NOBLEND,
            last_blend_mode: None,
            draw_mode: DX_DRAWMODE_NEAREST,
            bright: [0xff; 3],
            alpha: 0xff00_0000,
            background: [0; 3],
            scissor: None,
            screen_width,
            screen_height,
            current: BoundScreen::Unbound,
            draw_screen: None,
            draw_graph: None,
            projection: Matrix::identity(),
            view: Matrix::identity(),
        }
    }

    /// Blend, filter, bright, alpha and background back to their defaults.
    pub fn reset_settings(&mut self) {
        self.blend_mode = DX_BLENDMODE_NOBLEND;
        self.draw_mode = DX_DRAWMODE_NEAREST;
        self.last_blend_mode = None;
        self.bright = [0xff; 3];
        self.alpha = 0xff00_0000;
        self.background = [0; 3];
    }

    /// Scale a caller colour by the bright setting and attach the current alpha.
    #[must_use]
    pub fn modulate(&self, color: u32) -> u32 {
        let [br, bg, bb] = self.bright;
        let r = ((color & 0xff) * br) / 0xff;
        let g = (((color & 0xff00) * bg) / 0xff) & 0x0000_ff00;
        let b = (((color & 0x00ff_0000) * bb) / 0xff) & 0x00ff_0000;
        self.alpha | r | g | b
    }

    /// Vertex colour for textured draws.
    #[must_use]
    pub fn vertex_color(&self) -> u32 {
        let [r, g, b] = self.bright;
        r | (g << 8) | (b << 16) | self.alpha
    }

    #[must_use]
    pub fn blend_mode(&self) -> (i32, i32) {
        (self.blend_mode, (self.alpha >> 24) as i32)
    }

    /// Mode resolved by the last flush, `None` until one happens.
    #[must_use]
    pub fn last_blend_mode(&self) -> Option<i32> {
        self.last_blend_mode
    }

    #[must_use]
    pub fn draw_mode(&self) -> i32 {
        self.draw_mode
    }

    #[must_use]
    pub fn bright(&self) -> (i32, i32, i32) {
        let [r, g, b] = self.bright;
        (r as i32, g as i32, b as i32)
    }

    #[must_use]
    pub fn background_color(&self) -> (i32, i32, i32) {
        let [r, g, b] = self.background;
        (r, g, b)
    }

    #[must_use]
    pub fn scissor(&self) -> Option<Rect> {
        self.scissor
    }

    #[must_use]
    pub fn screen_size(&self) -> (i32, i32) {
        (self.screen_width, self.screen_height)
    }

    #[must_use]
    pub fn projection(&self) -> &Matrix {
        &self.projection
    }
}

/// Fill one quad as two triangles sharing the `b`/`c` diagonal.
fn quad<V: Copy>(v: &mut [V], a: V, b: V, c: V, d: V) {
    v[0] = a;
    v[1] = b;
    v[2] = c;
    v[3] = c;
    v[4] = b;
    v[5] = d;
}

/// Texture coordinates of a texel rectangle.
fn uv_rect(rect: Rect, x_mult: f32, y_mult: f32) -> (f32, f32, f32, f32) {
    let tx1 = rect.x as f32 * x_mult;
    let ty1 = rect.y as f32 * y_mult;
    (
        tx1,
        ty1,
        tx1 + rect.w as f32 * x_mult,
        ty1 + rect.h as f32 * y_mult,
    )
}

/// Rotation parameters shared by the `RotaGraph` family.
#[derive(Debug, Clone, Copy)]
struct Rotation {
    x: f32,
    y: f32,
    cx: f32,
    cy: f32,
    x_scale: f32,
    y_scale: f32,
    angle: f32,
}

impl Graphics {
    // Cache

    /// Reserve `count` vertices, flushing first if the open batch can't take them.
    fn begin_cache<V: Vertex>(
        &mut self,
        primitive: Primitive,
        texture: Option<TextureId>,
        blend: bool,
        count: usize,
    ) -> Result<&mut [V], GraphicsError> {
        let key = CacheKey::new::<V>(primitive, texture, blend);
        if !self.cache.accepts(&key, count) {
            self.flush_cache()?;
            self.cache.rebind(key);
        }
        Ok(self.cache.append::<V>(count))
    }

    /// Submit pending vertices as one draw call.
    pub fn flush_cache(&mut self) -> Result<(), GraphicsError> {
        let key = match self.cache.key() {
            Some(key) if self.cache.has_pending() => *key,
            _ => {
                self.cache.reset();
                return Ok(());
            }
        };

        self.update_draw_screen()?;

        if key.blend {
            let force = key
                .texture
                .is_some_and(|t| texture::has_alpha_channel(&self.handles, t));
            self.apply_draw_mode(self.draw.blend_mode, force, key.texture);
        } else {
            self.apply_draw_mode(DX_BLENDMODE_NOBLEND, false, key.texture);
        }

        if let Some(batch) = self.cache.pending() {
            log::trace!(
                "Flushing {} vertices as {:?}",
                batch.vertex_count,
                batch.key.primitive
            );
            let backend = self.textures.backend_mut();
            backend.draw_vertex_array(
                batch.key.definition,
                batch.data,
                batch.key.primitive,
                0,
                batch.vertex_count,
            );
            backend.clear_preset_program();
        }
        self.cache.reset();
        Ok(())
    }

    /// Push blend state and the shader preset for `mode` to the backend.
    ///
    /// `force_blend` upgrades NOBLEND to ALPHA. Unknown modes resolve to NOBLEND.
    pub(crate) fn apply_draw_mode(&mut self, mode: i32, force_blend: bool, texture: Option<TextureId>) {
        let mode = if force_blend && mode == DX_BLENDMODE_NOBLEND {
            DX_BLENDMODE_ALPHA
        } else {
            mode
        };
        let (mode, info) = blend::lookup(mode);
        self.draw.last_blend_mode = Some(mode);

        let filter = TextureFilter::from_draw_mode(self.draw.draw_mode);
        let sampled = texture.and_then(|t| texture::sampled(&self.handles, t, filter));

        let backend = self.textures.backend_mut();
        backend.set_blend_mode_separate(
            info.equation,
            info.src_rgb,
            info.dst_rgb,
            info.src_alpha,
            info.dst_alpha,
        );
        backend.set_preset_program(&PresetProgram {
            preset: info.preset,
            projection: self.draw.projection,
            view: self.draw.view,
            texture: sampled,
            alpha_func: CompareFunc::Always,
            alpha_ref: 0.0,
        });
    }

    // Screens

    /// Bind the selected draw screen if it isn't already.
    pub fn update_draw_screen(&mut self) -> Result<(), GraphicsError> {
        let target = BoundScreen::Target(self.draw.draw_screen);
        if self.draw.current == target {
            return Ok(());
        }
        if self.draw.current == BoundScreen::Unbound {
            self.textures.backend_mut().start_frame();
        }

        self.textures
            .bind_framebuffer(&mut self.handles, self.draw.draw_screen)?;
        self.draw.current = target;

        let info = self
            .draw
            .draw_screen
            .and_then(|t| texture::texture_info(&self.handles, t));
        let (width, height) = match info {
            Some(info) => (info.rect.w, info.rect.h),
            None => {
                let (w, h) = self.window_size();
                let (w, h) = (w as i32, h as i32);
                self.textures.backend_mut().set_viewport(Rect::new(0, 0, w, h));
                (w, h)
            }
        };
        self.draw.screen_width = width;
        self.draw.screen_height = height;
        self.draw.projection =
            Matrix::ortho_off_center_lh(0.0, width as f32, 0.0, height as f32, -32768.0, 32767.0);
        self.draw.view = Matrix::identity();

        self.draw.scissor = None;
        self.textures.backend_mut().disable_scissor();
        Ok(())
    }

    /// Draw into `graph`, or the back buffer for `None` and unknown graphs.
    pub fn set_draw_screen(&mut self, graph: Option<GraphId>) -> Result<(), GraphicsError> {
        let texture = graph
            .and_then(|g| graph::get_texture_id(&self.handles, g))
            .map(|(t, _)| t);

        self.flush_cache()?;

        match texture {
            Some(t) => {
                self.draw.draw_screen = Some(t);
                self.draw.draw_graph = graph;
            }
            None => {
                self.draw.draw_screen = self.window_framebuffer();
                self.draw.draw_graph = None;
            }
        }
        self.update_draw_screen()
    }

    /// Graph being drawn into; `None` for the back buffer.
    #[must_use]
    pub fn get_draw_screen(&self) -> Option<GraphId> {
        self.draw.draw_graph
    }

    #[must_use]
    pub fn get_draw_screen_size(&self) -> (i32, i32) {
        self.draw.screen_size()
    }

    /// Forget the bound target and bind the current draw screen again.
    pub fn reset_draw_screen(&mut self) -> Result<(), GraphicsError> {
        let previous = self.draw.draw_graph;
        self.draw.current = BoundScreen::Unbound;
        self.draw.draw_screen = None;
        self.draw.draw_graph = None;
        self.set_draw_screen(previous)
    }

    fn refresh_scissor(&mut self) -> Result<(), GraphicsError> {
        self.update_draw_screen()?;
        let backend = self.textures.backend_mut();
        match self.draw.scissor {
            Some(rect) => backend.set_scissor(rect),
            None => backend.disable_scissor(),
        }
        Ok(())
    }

    /// Re-push state the backend may have lost.
    pub fn force_update(&mut self) -> Result<(), GraphicsError> {
        self.draw.last_blend_mode = None;
        self.refresh_scissor()
    }

    /// Finish the frame and show it.
    pub fn screen_flip(&mut self) -> Result<(), GraphicsError> {
        self.flush_cache()?;
        self.force_update()?;
        self.textures.backend_mut().end_frame();
        self.present()?;
        self.reset_draw_screen()
    }

    // Draw properties

    /// Clip drawing to `(x1, y1)..(x2, y2)`; the whole screen turns clipping off.
    pub fn set_draw_area(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Result<(), GraphicsError> {
        self.flush_cache()?;
        let (w, h) = self.draw.screen_size();
        self.draw.scissor = if x1 == 0 && y1 == 0 && x2 == w && y2 == h {
            None
        } else {
            Some(Rect::from_edges(x1, y1, x2, y2))
        };
        self.refresh_scissor()
    }

    pub fn set_background_color(&mut self, r: i32, g: i32, b: i32) {
        self.draw.background = [r, g, b];
    }

    /// Fill the draw screen (or `rect` of it) with the background colour.
    pub fn clear_draw_screen(&mut self, rect: Option<Rect>) -> Result<(), GraphicsError> {
        self.flush_cache()?;
        self.update_draw_screen()?;

        let [r, g, b] = self.draw.background;
        let backend = self.textures.backend_mut();
        backend.clear_color(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0);
        match rect {
            Some(rect) => backend.set_scissor(rect),
            None => backend.disable_scissor(),
        }
        backend.clear();

        self.refresh_scissor()
    }

    pub fn cls_draw_screen(&mut self) -> Result<(), GraphicsError> {
        self.clear_draw_screen(None)
    }

    pub fn set_draw_mode(&mut self, mode: i32) -> Result<(), GraphicsError> {
        if mode != self.draw.draw_mode {
            self.flush_cache()?;
            self.draw.draw_mode = mode;
        }
        Ok(())
    }

    /// Changing the mode flushes; changing only the alpha does not.
    pub fn set_draw_blend_mode(&mut self, mode: i32, alpha: i32) -> Result<(), GraphicsError> {
        if mode != self.draw.blend_mode {
            self.flush_cache()?;
            self.draw.blend_mode = mode;
        }
        let alpha = if mode == DX_BLENDMODE_NOBLEND { 255 } else { alpha };
        self.draw.alpha = (alpha as u32) << 24;
        Ok(())
    }

    pub fn set_draw_bright(&mut self, r: i32, g: i32, b: i32) {
        self.draw.bright = [(r & 0xff) as u32, (g & 0xff) as u32, (b & 0xff) as u32];
    }

    /// Restore default draw settings.
    pub fn reset_draw_settings(&mut self) -> Result<(), GraphicsError> {
        self.flush_cache()?;
        self.draw.reset_settings();
        Ok(())
    }

    // Shapes

    pub fn draw_pixel(&mut self, x: f32, y: f32, color: u32) -> Result<(), GraphicsError> {
        let c = self.draw.modulate(color);
        let v = self.begin_cache::<Position2Color>(Primitive::Points, None, true, 1)?;
        v[0] = Position2Color::new(x, y, c);
        Ok(())
    }

    /// Line with half-pixel offset; thicker than 1 becomes two triangles.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: u32,
        thickness: i32,
    ) -> Result<(), GraphicsError> {
        let c = self.draw.modulate(color);
        let (x1, y1, x2, y2) = (x1 + 0.5, y1 + 0.5, x2 + 0.5, y2 + 0.5);

        if thickness <= 1 {
            let v = self.begin_cache::<Position2Color>(Primitive::Lines, None, true, 2)?;
            v[0] = Position2Color::new(x1, y1, c);
            v[1] = Position2Color::new(x2, y2, c);
            return Ok(());
        }

        let dx = x2 - x1;
        let dy = y2 - y1;
        let l = (dx * dx + dy * dy).sqrt();
        if l > 0.0 {
            let t = thickness as f32 * 0.5;
            let nx = (dx / l) * t;
            let ny = (dy / l) * t;
            let v = self.begin_cache::<Position2Color>(Primitive::Triangles, None, true, 6)?;
            quad(
                v,
                Position2Color::new(x1 - ny, y1 + nx, c),
                Position2Color::new(x2 - ny, y2 + nx, c),
                Position2Color::new(x1 + ny, y1 - nx, c),
                Position2Color::new(x2 + ny, y2 - nx, c),
            );
        }
        Ok(())
    }

    /// 36-segment ellipse. Filled ovals are a fan and flush immediately.
    pub fn draw_oval(
        &mut self,
        x: f32,
        y: f32,
        rx: f32,
        ry: f32,
        color: u32,
        fill: bool,
    ) -> Result<(), GraphicsError> {
        let c = self.draw.modulate(color);
        let step = std::f32::consts::PI * 2.0 / OVAL_POINTS as f32;
        let point = |i: usize| {
            let a = i as f32 * step;
            Position2Color::new(x + a.cos() * rx, y + a.sin() * ry, c)
        };

        if fill {
            let v = self.begin_cache::<Position2Color>(
                Primitive::TriangleFan,
                None,
                true,
                OVAL_POINTS,
            )?;
            for (i, vert) in v.iter_mut().enumerate() {
                *vert = point(i);
            }
            // A fan can't share a batch with the next shape.
            return self.flush_cache();
        }

        let v = self.begin_cache::<Position2Color>(Primitive::Lines, None, true, OVAL_POINTS * 2)?;
        v[0] = Position2Color::new(x + rx, y, c);
        for i in 1..OVAL_POINTS {
            let p = point(i);
            v[2 * i - 1] = p;
            v[2 * i] = p;
        }
        v[OVAL_POINTS * 2 - 1] = v[0];
        Ok(())
    }

    pub fn draw_circle(&mut self, x: f32, y: f32, r: f32, color: u32, fill: bool) -> Result<(), GraphicsError> {
        self.draw_oval(x, y, r, r, color, fill)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_triangle(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        color: u32,
        fill: bool,
    ) -> Result<(), GraphicsError> {
        let c = self.draw.modulate(color);
        let p1 = Position2Color::new(x1, y1, c);
        let p2 = Position2Color::new(x2, y2, c);
        let p3 = Position2Color::new(x3, y3, c);

        if fill {
            let v = self.begin_cache::<Position2Color>(Primitive::Triangles, None, true, 3)?;
            v.copy_from_slice(&[p1, p2, p3]);
        } else {
            let v = self.begin_cache::<Position2Color>(Primitive::Lines, None, true, 6)?;
            v.copy_from_slice(&[p1, p2, p2, p3, p3, p1]);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_quadrangle(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        x4: f32,
        y4: f32,
        color: u32,
        fill: bool,
    ) -> Result<(), GraphicsError> {
        let c = self.draw.modulate(color);
        let p1 = Position2Color::new(x1, y1, c);
        let p2 = Position2Color::new(x2, y2, c);
        let p3 = Position2Color::new(x3, y3, c);
        let p4 = Position2Color::new(x4, y4, c);

        if fill {
            let v = self.begin_cache::<Position2Color>(Primitive::Triangles, None, true, 6)?;
            quad(v, p1, p2, p3, p4);
        } else {
            let v = self.begin_cache::<Position2Color>(Primitive::Lines, None, true, 8)?;
            v.copy_from_slice(&[p1, p2, p2, p3, p3, p4, p4, p1]);
        }
        Ok(())
    }

    /// Axis-aligned box from `(x1, y1)` to `(x2, y2)`.
    pub fn draw_box(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: u32,
        fill: bool,
    ) -> Result<(), GraphicsError> {
        let c = self.draw.modulate(color);
        let tl = Position2Color::new(x1, y1, c);
        let tr = Position2Color::new(x2, y1, c);
        let bl = Position2Color::new(x1, y2, c);
        let br = Position2Color::new(x2, y2, c);

        if fill {
            let v = self.begin_cache::<Position2Color>(Primitive::Triangles, None, true, 6)?;
            quad(v, tl, tr, bl, br);
        } else {
            let v = self.begin_cache::<Position2Color>(Primitive::Lines, None, true, 8)?;
            v.copy_from_slice(&[tl, tr, tr, br, br, bl, bl, tl]);
        }
        Ok(())
    }

    // Graphs

    fn graph_info(&self, graph: GraphId) -> Result<GraphTextureInfo, GraphicsError> {
        graph::get_texture_info(&self.handles, graph).ok_or(GraphicsError::InvalidHandle(graph.id()))
    }

    /// Emit one textured quad: `a`..`d` are top-left, top-right, bottom-left, bottom-right.
    fn textured_quad(
        &mut self,
        texture: TextureId,
        blend: bool,
        corners: [(f32, f32, f32, f32); 4],
    ) -> Result<(), GraphicsError> {
        let c = self.draw.vertex_color();
        let [a, b, cc, d] =
            corners.map(|(x, y, tx, ty)| Position2Tex2Color::new(x, y, tx, ty, c));
        let v = self.begin_cache::<Position2Tex2Color>(Primitive::Triangles, Some(texture), blend, 6)?;
        quad(v, a, b, cc, d);
        Ok(())
    }

    /// Draw a graph at its natural size.
    pub fn draw_graph(&mut self, x: f32, y: f32, graph: GraphId, blend: bool) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let (tx1, ty1, tx2, ty2) = uv_rect(info.rect, info.x_mult, info.y_mult);
        let (x2, y2) = (x + info.rect.w as f32, y + info.rect.h as f32);
        self.textured_quad(
            info.texture,
            blend,
            [(x, y, tx1, ty1), (x2, y, tx2, ty1), (x, y2, tx1, ty2), (x2, y2, tx2, ty2)],
        )
    }

    /// Draw a graph stretched to `(x1, y1)..(x2, y2)`.
    pub fn draw_extend_graph(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        graph: GraphId,
        blend: bool,
    ) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let (tx1, ty1, tx2, ty2) = uv_rect(info.rect, info.x_mult, info.y_mult);
        self.textured_quad(
            info.texture,
            blend,
            [(x1, y1, tx1, ty1), (x2, y1, tx2, ty1), (x1, y2, tx1, ty2), (x2, y2, tx2, ty2)],
        )
    }

    /// Draw a graph mirrored horizontally.
    pub fn draw_turn_graph(&mut self, x: f32, y: f32, graph: GraphId, blend: bool) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let (tx1, ty1, tx2, ty2) = uv_rect(info.rect, info.x_mult, info.y_mult);
        let (x2, y2) = (x + info.rect.w as f32, y + info.rect.h as f32);
        self.textured_quad(
            info.texture,
            blend,
            [(x, y, tx2, ty1), (x2, y, tx1, ty1), (x, y2, tx2, ty2), (x2, y2, tx1, ty2)],
        )
    }

    /// Draw a graph onto an arbitrary quad, corners clockwise from top-left.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_modi_graph(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        x4: f32,
        y4: f32,
        graph: GraphId,
        blend: bool,
    ) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let (tx1, ty1, tx2, ty2) = uv_rect(info.rect, info.x_mult, info.y_mult);
        self.textured_quad(
            info.texture,
            blend,
            [(x1, y1, tx1, ty1), (x2, y2, tx2, ty1), (x4, y4, tx1, ty2), (x3, y3, tx2, ty2)],
        )
    }

    /// Draw `(sx, sy, sw, sh)` of a graph at `(dx, dy)`.
    ///
    /// A source rectangle reaching past the graph is not rejected: the
    /// destination is clipped to where the graph actually has texels, and a
    /// mirrored draw is offset from the right edge after that clip.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_graph(
        &mut self,
        dx: f32,
        dy: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let rect = info.rect;
        let (x_mult, y_mult) = (info.x_mult, info.y_mult);

        let (mut dx1, dy1, mut dx2, dy2);
        let (tx1, ty1, tx2, ty2);

        if sx + sw > rect.w || sy + sh > rect.h {
            let mut tx = dx - sx as f32;
            let mut ty = dy - sy as f32;

            dx1 = dx;
            dy1 = dy;
            dx2 = (tx + rect.w as f32).min(dx + sw as f32);
            dy2 = (ty + rect.h as f32).min(dy + sh as f32);
            if dx2 <= dx1 || dy2 <= dy1 {
                return Ok(());
            }

            tx -= rect.x as f32;
            ty -= rect.y as f32;
            tx1 = (dx1 - tx) * x_mult;
            ty1 = (dy1 - ty) * y_mult;
            tx2 = (dx2 - tx) * x_mult;
            ty2 = (dy2 - ty) * y_mult;

            if turn {
                dx1 = dx + sw as f32;
                dx2 = dx1 + dx - dx2;
            }
        } else {
            dx1 = dx;
            dy1 = dy;
            dx2 = dx + sw as f32;
            dy2 = dy + sh as f32;

            tx1 = (rect.x + sx) as f32 * x_mult;
            ty1 = (rect.y + sy) as f32 * y_mult;
            tx2 = tx1 + sw as f32 * x_mult;
            ty2 = ty1 + sh as f32 * y_mult;

            if turn {
                std::mem::swap(&mut dx1, &mut dx2);
            }
        }

        self.textured_quad(
            info.texture,
            blend,
            [(dx1, dy1, tx1, ty1), (dx2, dy1, tx2, ty1), (dx1, dy2, tx1, ty2), (dx2, dy2, tx2, ty2)],
        )
    }

    /// Unclipped `(sx, sy, sw, sh)` blit stretched to `dw` x `dh`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_graph_fast(
        &mut self,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: GraphId,
        blend: bool,
    ) -> Result<(), GraphicsError> {
        self.draw_rect_extend_graph(dx, dy, dx + dw, dy + dh, sx, sy, sw, sh, graph, blend, false)
    }

    /// `(sx, sy, sw, sh)` of a graph stretched to `(dx1, dy1)..(dx2, dy2)`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_extend_graph(
        &mut self,
        dx1: f32,
        dy1: f32,
        dx2: f32,
        dy2: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let src = Rect::new(info.rect.x + sx, info.rect.y + sy, sw, sh);
        let (mut tx1, ty1, mut tx2, ty2) = uv_rect(src, info.x_mult, info.y_mult);
        if turn {
            std::mem::swap(&mut tx1, &mut tx2);
        }
        self.textured_quad(
            info.texture,
            blend,
            [(dx1, dy1, tx1, ty1), (dx2, dy1, tx2, ty1), (dx1, dy2, tx1, ty2), (dx2, dy2, tx2, ty2)],
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn rota_main(
        &mut self,
        texture: TextureId,
        rect: Rect,
        x_mult: f32,
        y_mult: f32,
        r: Rotation,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        let (mut tx1, ty1, mut tx2, ty2) = uv_rect(rect, x_mult, y_mult);
        let (sin, cos) = r.angle.sin_cos();

        let half_w = rect.w as f32 * r.x_scale * 0.5;
        let half_h = rect.h as f32 * r.y_scale * 0.5;
        let cx = r.cx * r.x_scale;
        let cy = r.cy * r.y_scale;

        // Move the anchor to the quad's centre.
        let dx = half_w - cx;
        let dy = half_h - cy;
        let x = r.x + (dx * cos) - (dy * sin);
        let y = r.y + (dy * cos) + (dx * sin);

        if turn {
            std::mem::swap(&mut tx1, &mut tx2);
        }

        let xext1 = half_w * cos - half_h * sin;
        let xext2 = half_w * cos + half_h * sin;
        let yext1 = half_h * cos + half_w * sin;
        let yext2 = half_h * cos - half_w * sin;

        self.textured_quad(
            texture,
            blend,
            [
                (x - xext1, y - yext1, tx1, ty1),
                (x + xext2, y - yext2, tx2, ty1),
                (x - xext2, y + yext2, tx1, ty2),
                (x + xext1, y + yext1, tx2, ty2),
            ],
        )
    }

    /// Draw a graph scaled and rotated about its centre, placed at `(x, y)`.
    pub fn draw_rota_graph(
        &mut self,
        x: f32,
        y: f32,
        scale: f64,
        angle: f64,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let (cx, cy) = ((info.rect.w / 2) as f32, (info.rect.h / 2) as f32);
        self.draw_rota_graph3(x, y, cx, cy, scale, scale, angle, graph, blend, turn)
    }

    /// Rotation about `(cx, cy)` in graph space, which lands on `(x, y)`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph2(
        &mut self,
        x: f32,
        y: f32,
        cx: f32,
        cy: f32,
        scale: f64,
        angle: f64,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        self.draw_rota_graph3(x, y, cx, cy, scale, scale, angle, graph, blend, turn)
    }

    /// Like [`Graphics::draw_rota_graph2`] with separate x and y scales.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph3(
        &mut self,
        x: f32,
        y: f32,
        cx: f32,
        cy: f32,
        x_scale: f64,
        y_scale: f64,
        angle: f64,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        self.rota_main(
            info.texture,
            info.rect,
            info.x_mult,
            info.y_mult,
            Rotation {
                x,
                y,
                cx,
                cy,
                x_scale: x_scale as f32,
                y_scale: y_scale as f32,
                angle: angle as f32,
            },
            blend,
            turn,
        )
    }

    /// [`Graphics::draw_rota_graph`] over the `(sx, sy, sw, sh)` part of a graph.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph(
        &mut self,
        x: f32,
        y: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        scale: f64,
        angle: f64,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        let (cx, cy) = ((sw / 2) as f32, (sh / 2) as f32);
        self.draw_rect_rota_graph3(
            x, y, sx, sy, sw, sh, cx, cy, scale, scale, angle, graph, blend, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph2(
        &mut self,
        x: f32,
        y: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        cx: f32,
        cy: f32,
        scale: f64,
        angle: f64,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        self.draw_rect_rota_graph3(
            x, y, sx, sy, sw, sh, cx, cy, scale, scale, angle, graph, blend, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph3(
        &mut self,
        x: f32,
        y: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        cx: f32,
        cy: f32,
        x_scale: f64,
        y_scale: f64,
        angle: f64,
        graph: GraphId,
        blend: bool,
        turn: bool,
    ) -> Result<(), GraphicsError> {
        let info = self.graph_info(graph)?;
        let rect = Rect::new(info.rect.x + sx, info.rect.y + sy, sw, sh);
        self.rota_main(
            info.texture,
            rect,
            info.x_mult,
            info.y_mult,
            Rotation {
                x,
                y,
                cx,
                cy,
                x_scale: x_scale as f32,
                y_scale: y_scale as f32,
                angle: angle as f32,
            },
            blend,
            turn,
        )
    }
}
