//!
//! DxLib-flavoured facade.
//!
//! [`DxLib`] wraps a [`Graphics`] context with the legacy calling
//! convention: handles are plain `i32`, and every call returns `-1` on
//! failure, logging the error. The typed API in [`crate::graphics`]
//! returns the same errors as values.
//!

use std::path::Path;

use crate::config::{BackendKind, Options};
use crate::graphics::backend::{BackendError, RenderBackend};
use crate::graphics::recording::RecordingBackend;
use crate::graphics::types::{raw_or_neg, GraphId, Rect};
use crate::graphics::{Graphics, GraphicsError};
use crate::logging;

pub use crate::graphics::blend::*;
pub use crate::graphics::draw::{get_color, DX_DRAWMODE_BILINEAR, DX_DRAWMODE_NEAREST};

pub const DX_SCREEN_FRONT: i32 = 0xffff_fffc_u32 as i32;
pub const DX_SCREEN_BACK: i32 = 0xffff_fffe_u32 as i32;

/// Collapse a result to DxLib's `0` / `-1`.
fn status(result: Result<(), GraphicsError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            report(&e);
            -1
        }
    }
}

fn handle(result: Result<GraphId, GraphicsError>) -> i32 {
    raw_or_neg(result.map_err(|e| report(&e)).ok())
}

fn report(e: &GraphicsError) {
    crate::log_warning!("{}", e);
}

fn graph_id(id: i32) -> Result<GraphId, GraphicsError> {
    GraphId::from_raw(id).ok_or(GraphicsError::InvalidHandle(id))
}

pub struct DxLib {
    gfx: Graphics,
    #[cfg(feature = "sdl2")]
    window: Option<crate::graphics::window::GlWindow>,
}

impl DxLib {
    /// `DxLib_Init`: install logging and create the context `options` asks for.
    ///
    /// The OpenGL backend needs the `sdl2` feature, which opens a window;
    /// hosts with their own GL context use [`DxLib::with_backend`] instead.
    pub fn init(options: Options) -> Result<Self, GraphicsError> {
        if logging::init_logging(options.log_level).is_err() {
            crate::log_debug!("Logger already installed");
        }

        match options.backend {
            BackendKind::Recording => Self::with_backend(options, Box::new(RecordingBackend::new())),
            BackendKind::OpenGl => Self::init_opengl(options),
        }
    }

    #[cfg(feature = "sdl2")]
    fn init_opengl(options: Options) -> Result<Self, GraphicsError> {
        use crate::graphics::window::{GlWindow, WindowError};

        let title = format!("DxPortLib v{}", env!("CARGO_PKG_VERSION"));
        let opened = GlWindow::open(&title, options.window_width, options.window_height)
            .and_then(|window| {
                let gfx = window.create_graphics(options)?;
                Ok((window, gfx))
            });
        match opened {
            Ok((window, gfx)) => Ok(Self {
                gfx,
                window: Some(window),
            }),
            Err(WindowError::Graphics(e)) => Err(e),
            Err(WindowError::Backend(e)) => Err(e.into()),
            Err(e) => Err(BackendError::Unavailable(e.to_string()).into()),
        }
    }

    #[cfg(not(feature = "sdl2"))]
    fn init_opengl(_options: Options) -> Result<Self, GraphicsError> {
        Err(BackendError::Unavailable(
            "OpenGL needs the sdl2 feature or a host-supplied context".to_string(),
        )
        .into())
    }

    pub fn with_backend(options: Options, backend: Box<dyn RenderBackend>) -> Result<Self, GraphicsError> {
        Ok(Self::new(Graphics::new(options, backend)?))
    }

    #[must_use]
    pub fn new(gfx: Graphics) -> Self {
        Self {
            gfx,
            #[cfg(feature = "sdl2")]
            window: None,
        }
    }

    #[must_use]
    pub fn graphics(&self) -> &Graphics {
        &self.gfx
    }

    pub fn graphics_mut(&mut self) -> &mut Graphics {
        &mut self.gfx
    }

    /// `DxLib_End`
    pub fn end(&mut self) -> i32 {
        status(self.gfx.shutdown())
    }

    /// `ProcessMessage`: `-1` once the window was closed.
    pub fn process_message(&mut self) -> i32 {
        if self.pump_window() {
            0
        } else {
            -1
        }
    }

    #[cfg(feature = "sdl2")]
    fn pump_window(&mut self) -> bool {
        match self.window.as_mut() {
            Some(window) => window.process_events(&mut self.gfx),
            None => true,
        }
    }

    #[cfg(not(feature = "sdl2"))]
    fn pump_window(&mut self) -> bool {
        true
    }

    // Graph resources

    pub fn make_screen(&mut self, width: i32, height: i32, use_alpha: bool) -> i32 {
        if width <= 0 || height <= 0 {
            return -1;
        }
        handle(self.gfx.make_screen(width as u32, height as u32, use_alpha))
    }

    pub fn make_graph(&mut self, width: i32, height: i32, use_alpha: bool) -> i32 {
        if width <= 0 || height <= 0 {
            return -1;
        }
        handle(self.gfx.make_graph(width as u32, height as u32, use_alpha))
    }

    pub fn load_graph(&mut self, path: impl AsRef<Path>) -> i32 {
        handle(self.gfx.load_graph(path, false))
    }

    pub fn load_reverse_graph(&mut self, path: impl AsRef<Path>) -> i32 {
        handle(self.gfx.load_graph(path, true))
    }

    pub fn create_graph_from_mem(&mut self, bytes: &[u8]) -> i32 {
        handle(self.gfx.load_graph_from_memory(bytes, false))
    }

    /// Load an image cut into `x_num` x `y_num` cells of `x_size` x `y_size`.
    ///
    /// Handles are written to `handles` in row-major order; at most
    /// `all_num` and never more than `handles.len()`.
    #[allow(clippy::too_many_arguments)]
    pub fn load_div_graph(
        &mut self,
        path: impl AsRef<Path>,
        all_num: i32,
        x_num: i32,
        y_num: i32,
        x_size: i32,
        y_size: i32,
        handles: &mut [i32],
    ) -> i32 {
        self.load_div(path, all_num, x_num, y_num, x_size, y_size, handles, false)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn load_reverse_div_graph(
        &mut self,
        path: impl AsRef<Path>,
        all_num: i32,
        x_num: i32,
        y_num: i32,
        x_size: i32,
        y_size: i32,
        handles: &mut [i32],
    ) -> i32 {
        self.load_div(path, all_num, x_num, y_num, x_size, y_size, handles, true)
    }

    #[allow(clippy::too_many_arguments)]
    fn load_div(
        &mut self,
        path: impl AsRef<Path>,
        all_num: i32,
        x_num: i32,
        y_num: i32,
        x_size: i32,
        y_size: i32,
        handles: &mut [i32],
        flip: bool,
    ) -> i32 {
        let count = (all_num.max(0) as usize).min(handles.len());
        match self
            .gfx
            .load_div_graph(path, count, x_num, y_num, x_size, y_size, flip)
        {
            Ok(ids) => {
                for (slot, id) in handles.iter_mut().zip(&ids) {
                    *slot = id.id();
                }
                0
            }
            Err(e) => {
                report(&e);
                -1
            }
        }
    }

    pub fn derivation_graph(&mut self, x: i32, y: i32, w: i32, h: i32, src: i32) -> i32 {
        handle(graph_id(src).and_then(|src| self.gfx.derivation_graph(x, y, w, h, src)))
    }

    pub fn delete_graph(&mut self, graph: i32) -> i32 {
        status(graph_id(graph).and_then(|g| self.gfx.delete_graph(g)))
    }

    pub fn delete_sharing_graph(&mut self, graph: i32) -> i32 {
        status(graph_id(graph).and_then(|g| self.gfx.delete_sharing_graph(g)))
    }

    pub fn init_graph(&mut self) -> i32 {
        status(self.gfx.init_graph())
    }

    #[must_use]
    pub fn get_graph_num(&self) -> i32 {
        self.gfx.graph_count() as i32
    }

    pub fn get_graph_size(&self, graph: i32, width: &mut i32, height: &mut i32) -> i32 {
        match GraphId::from_raw(graph).and_then(|g| self.gfx.graph_size(g)) {
            Some((w, h)) => {
                *width = w;
                *height = h;
                0
            }
            None => -1,
        }
    }

    pub fn set_trans_color(&mut self, r: i32, g: i32, b: i32) -> i32 {
        self.gfx.graph_settings_mut().set_trans_color(r, g, b);
        0
    }

    pub fn get_trans_color(&self, r: &mut i32, g: &mut i32, b: &mut i32) -> i32 {
        (*r, *g, *b) = self.gfx.graph_settings().trans_color();
        0
    }

    pub fn set_use_trans_color(&mut self, flag: bool) -> i32 {
        self.gfx.graph_settings_mut().set_use_trans_color(flag);
        0
    }

    pub fn set_use_premul_alpha_convert_load(&mut self, flag: bool) -> i32 {
        self.gfx
            .graph_settings_mut()
            .set_use_premultiplied_alpha_on_load(flag);
        0
    }

    pub fn set_graph_wrap(&mut self, graph: i32, wrap: bool) -> i32 {
        status(graph_id(graph).and_then(|g| self.gfx.set_graph_wrap(g, wrap)))
    }

    // Screens and draw state

    /// `DX_SCREEN_BACK`, `DX_SCREEN_FRONT` and unknown handles all draw to the window.
    pub fn set_draw_screen(&mut self, screen: i32) -> i32 {
        let graph = match screen {
            DX_SCREEN_BACK | DX_SCREEN_FRONT => None,
            id => GraphId::from_raw(id),
        };
        status(self.gfx.set_draw_screen(graph))
    }

    #[must_use]
    pub fn get_draw_screen(&self) -> i32 {
        self.gfx.get_draw_screen().map_or(DX_SCREEN_BACK, GraphId::id)
    }

    pub fn get_draw_screen_size(&self, width: &mut i32, height: &mut i32) -> i32 {
        (*width, *height) = self.gfx.get_draw_screen_size();
        0
    }

    pub fn screen_flip(&mut self) -> i32 {
        status(self.flip_frame())
    }

    #[cfg(feature = "sdl2")]
    fn flip_frame(&mut self) -> Result<(), GraphicsError> {
        match self.window.as_mut() {
            Some(window) => window.screen_flip(&mut self.gfx),
            None => self.gfx.screen_flip(),
        }
    }

    #[cfg(not(feature = "sdl2"))]
    fn flip_frame(&mut self) -> Result<(), GraphicsError> {
        self.gfx.screen_flip()
    }

    pub fn clear_draw_screen(&mut self, rect: Option<Rect>) -> i32 {
        status(self.gfx.clear_draw_screen(rect))
    }

    pub fn cls_draw_screen(&mut self) -> i32 {
        status(self.gfx.cls_draw_screen())
    }

    pub fn set_background_color(&mut self, r: i32, g: i32, b: i32) -> i32 {
        self.gfx.set_background_color(r, g, b);
        0
    }

    pub fn set_draw_area(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
        status(self.gfx.set_draw_area(x1, y1, x2, y2))
    }

    pub fn set_draw_mode(&mut self, mode: i32) -> i32 {
        status(self.gfx.set_draw_mode(mode))
    }

    #[must_use]
    pub fn get_draw_mode(&self) -> i32 {
        self.gfx.draw_state().draw_mode()
    }

    pub fn set_draw_blend_mode(&mut self, mode: i32, param: i32) -> i32 {
        status(self.gfx.set_draw_blend_mode(mode, param))
    }

    pub fn get_draw_blend_mode(&self, mode: &mut i32, param: &mut i32) -> i32 {
        (*mode, *param) = self.gfx.draw_state().blend_mode();
        0
    }

    pub fn set_draw_bright(&mut self, r: i32, g: i32, b: i32) -> i32 {
        self.gfx.set_draw_bright(r, g, b);
        0
    }

    pub fn get_draw_bright(&self, r: &mut i32, g: &mut i32, b: &mut i32) -> i32 {
        (*r, *g, *b) = self.gfx.draw_state().bright();
        0
    }

    // Shapes

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: u32) -> i32 {
        status(self.gfx.draw_pixel(x as f32, y as f32, color))
    }

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u32, thickness: i32) -> i32 {
        self.draw_line_f(x1 as f32, y1 as f32, x2 as f32, y2 as f32, color, thickness)
    }

    pub fn draw_line_f(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: u32, thickness: i32) -> i32 {
        status(self.gfx.draw_line(x1, y1, x2, y2, color, thickness))
    }

    pub fn draw_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u32, fill: bool) -> i32 {
        self.draw_box_f(x1 as f32, y1 as f32, x2 as f32, y2 as f32, color, fill)
    }

    pub fn draw_box_f(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: u32, fill: bool) -> i32 {
        status(self.gfx.draw_box(x1, y1, x2, y2, color, fill))
    }

    pub fn draw_fill_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u32) -> i32 {
        self.draw_box(x1, y1, x2, y2, color, true)
    }

    pub fn draw_line_box(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: u32) -> i32 {
        self.draw_box(x1, y1, x2, y2, color, false)
    }

    pub fn draw_oval(&mut self, x: i32, y: i32, rx: i32, ry: i32, color: u32, fill: bool) -> i32 {
        self.draw_oval_f(x as f32, y as f32, rx as f32, ry as f32, color, fill)
    }

    pub fn draw_oval_f(&mut self, x: f32, y: f32, rx: f32, ry: f32, color: u32, fill: bool) -> i32 {
        status(self.gfx.draw_oval(x, y, rx, ry, color, fill))
    }

    pub fn draw_circle(&mut self, x: i32, y: i32, r: i32, color: u32, fill: bool) -> i32 {
        self.draw_circle_f(x as f32, y as f32, r as f32, color, fill)
    }

    pub fn draw_circle_f(&mut self, x: f32, y: f32, r: f32, color: u32, fill: bool) -> i32 {
        status(self.gfx.draw_circle(x, y, r, color, fill))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_triangle(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        x3: i32,
        y3: i32,
        color: u32,
        fill: bool,
    ) -> i32 {
        self.draw_triangle_f(
            x1 as f32, y1 as f32, x2 as f32, y2 as f32, x3 as f32, y3 as f32, color, fill,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_triangle_f(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        color: u32,
        fill: bool,
    ) -> i32 {
        status(self.gfx.draw_triangle(x1, y1, x2, y2, x3, y3, color, fill))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_quadrangle(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        x3: i32,
        y3: i32,
        x4: i32,
        y4: i32,
        color: u32,
        fill: bool,
    ) -> i32 {
        self.draw_quadrangle_f(
            x1 as f32, y1 as f32, x2 as f32, y2 as f32, x3 as f32, y3 as f32, x4 as f32,
            y4 as f32, color, fill,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_quadrangle_f(
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
    ) -> i32 {
        status(
            self.gfx
                .draw_quadrangle(x1, y1, x2, y2, x3, y3, x4, y4, color, fill),
        )
    }

    // Graphs

    pub fn draw_graph(&mut self, x: i32, y: i32, graph: i32, trans: bool) -> i32 {
        self.draw_graph_f(x as f32, y as f32, graph, trans)
    }

    pub fn draw_graph_f(&mut self, x: f32, y: f32, graph: i32, trans: bool) -> i32 {
        status(graph_id(graph).and_then(|g| self.gfx.draw_graph(x, y, g, trans)))
    }

    pub fn draw_extend_graph(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, graph: i32, trans: bool) -> i32 {
        self.draw_extend_graph_f(x1 as f32, y1 as f32, x2 as f32, y2 as f32, graph, trans)
    }

    pub fn draw_extend_graph_f(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, graph: i32, trans: bool) -> i32 {
        status(graph_id(graph).and_then(|g| self.gfx.draw_extend_graph(x1, y1, x2, y2, g, trans)))
    }

    pub fn draw_turn_graph(&mut self, x: i32, y: i32, graph: i32, trans: bool) -> i32 {
        self.draw_turn_graph_f(x as f32, y as f32, graph, trans)
    }

    pub fn draw_turn_graph_f(&mut self, x: f32, y: f32, graph: i32, trans: bool) -> i32 {
        status(graph_id(graph).and_then(|g| self.gfx.draw_turn_graph(x, y, g, trans)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_modi_graph(
        &mut self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        x3: i32,
        y3: i32,
        x4: i32,
        y4: i32,
        graph: i32,
        trans: bool,
    ) -> i32 {
        self.draw_modi_graph_f(
            x1 as f32, y1 as f32, x2 as f32, y2 as f32, x3 as f32, y3 as f32, x4 as f32,
            y4 as f32, graph, trans,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_modi_graph_f(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        x3: f32,
        y3: f32,
        x4: f32,
        y4: f32,
        graph: i32,
        trans: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx
                .draw_modi_graph(x1, y1, x2, y2, x3, y3, x4, y4, g, trans)
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_graph(
        &mut self,
        dx: i32,
        dy: i32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rect_graph_f(dx as f32, dy as f32, sx, sy, sw, sh, graph, trans, turn)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_graph_f(
        &mut self,
        dx: f32,
        dy: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx
                .draw_rect_graph(dx, dy, sx, sy, sw, sh, g, trans, turn)
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_graph_fast(
        &mut self,
        dx: i32,
        dy: i32,
        dw: i32,
        dh: i32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: i32,
        trans: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx.draw_rect_graph_fast(
                dx as f32, dy as f32, dw as f32, dh as f32, sx, sy, sw, sh, g, trans,
            )
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_extend_graph(
        &mut self,
        dx1: i32,
        dy1: i32,
        dx2: i32,
        dy2: i32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rect_extend_graph_f(
            dx1 as f32, dy1 as f32, dx2 as f32, dy2 as f32, sx, sy, sw, sh, graph, trans, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_extend_graph_f(
        &mut self,
        dx1: f32,
        dy1: f32,
        dx2: f32,
        dy2: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx
                .draw_rect_extend_graph(dx1, dy1, dx2, dy2, sx, sy, sw, sh, g, trans, turn)
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph(
        &mut self,
        x: i32,
        y: i32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rota_graph_f(x as f32, y as f32, ext_rate, angle, graph, trans, turn)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph_f(
        &mut self,
        x: f32,
        y: f32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx
                .draw_rota_graph(x, y, ext_rate, angle, g, trans, turn)
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph2(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rota_graph2_f(
            x as f32, y as f32, cx as f32, cy as f32, ext_rate, angle, graph, trans, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph2_f(
        &mut self,
        x: f32,
        y: f32,
        cx: f32,
        cy: f32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx
                .draw_rota_graph2(x, y, cx, cy, ext_rate, angle, g, trans, turn)
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph3(
        &mut self,
        x: i32,
        y: i32,
        cx: i32,
        cy: i32,
        ext_rate_x: f64,
        ext_rate_y: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rota_graph3_f(
            x as f32, y as f32, cx as f32, cy as f32, ext_rate_x, ext_rate_y, angle, graph,
            trans, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rota_graph3_f(
        &mut self,
        x: f32,
        y: f32,
        cx: f32,
        cy: f32,
        ext_rate_x: f64,
        ext_rate_y: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx.draw_rota_graph3(
                x, y, cx, cy, ext_rate_x, ext_rate_y, angle, g, trans, turn,
            )
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph(
        &mut self,
        x: i32,
        y: i32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rect_rota_graph_f(
            x as f32, y as f32, sx, sy, sw, sh, ext_rate, angle, graph, trans, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph_f(
        &mut self,
        x: f32,
        y: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx
                .draw_rect_rota_graph(x, y, sx, sy, sw, sh, ext_rate, angle, g, trans, turn)
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph2(
        &mut self,
        x: i32,
        y: i32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        cx: i32,
        cy: i32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rect_rota_graph2_f(
            x as f32, y as f32, sx, sy, sw, sh, cx as f32, cy as f32, ext_rate, angle, graph,
            trans, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph2_f(
        &mut self,
        x: f32,
        y: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        cx: f32,
        cy: f32,
        ext_rate: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx.draw_rect_rota_graph2(
                x, y, sx, sy, sw, sh, cx, cy, ext_rate, angle, g, trans, turn,
            )
        }))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph3(
        &mut self,
        x: i32,
        y: i32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        cx: i32,
        cy: i32,
        ext_rate_x: f64,
        ext_rate_y: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        self.draw_rect_rota_graph3_f(
            x as f32, y as f32, sx, sy, sw, sh, cx as f32, cy as f32, ext_rate_x, ext_rate_y,
            angle, graph, trans, turn,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect_rota_graph3_f(
        &mut self,
        x: f32,
        y: f32,
        sx: i32,
        sy: i32,
        sw: i32,
        sh: i32,
        cx: f32,
        cy: f32,
        ext_rate_x: f64,
        ext_rate_y: f64,
        angle: f64,
        graph: i32,
        trans: bool,
        turn: bool,
    ) -> i32 {
        status(graph_id(graph).and_then(|g| {
            self.gfx.draw_rect_rota_graph3(
                x, y, sx, sy, sw, sh, cx, cy, ext_rate_x, ext_rate_y, angle, g, trans, turn,
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dx() -> DxLib {
        let options = Options {
            backend: BackendKind::Recording,
            ..Options::default()
        };
        DxLib::with_backend(options, Box::new(RecordingBackend::new())).unwrap()
    }

    #[test]
    fn test_screen_constants() {
        assert_eq!(DX_SCREEN_BACK, -2);
        assert_eq!(DX_SCREEN_FRONT, -4);
    }

    #[test]
    fn test_failures_collapse_to_minus_one() {
        let mut dx = dx();
        assert_eq!(dx.draw_graph(0, 0, -1, true), -1);
        assert_eq!(dx.draw_graph(0, 0, 4000, true), -1);
        assert_eq!(dx.delete_graph(4000), -1);
        assert_eq!(dx.make_screen(0, 10, false), -1);
        assert_eq!(dx.load_graph("/definitely/not/here.png"), -1);
        assert_eq!(dx.draw_box(0, 0, 10, 10, get_color(255, 0, 0), true), 0);
    }

    #[test]
    fn test_draw_screen_round_trip() {
        let mut dx = dx();
        assert_eq!(dx.get_draw_screen(), DX_SCREEN_BACK);
        let screen = dx.make_screen(128, 64, true);
        assert!(screen >= 0);
        assert_eq!(dx.set_draw_screen(screen), 0);
        assert_eq!(dx.get_draw_screen(), screen);

        let (mut w, mut h) = (0, 0);
        dx.get_draw_screen_size(&mut w, &mut h);
        assert_eq!((w, h), (128, 64));

        assert_eq!(dx.set_draw_screen(DX_SCREEN_BACK), 0);
        assert_eq!(dx.get_draw_screen(), DX_SCREEN_BACK);
    }

    #[test]
    fn test_settings_out_params() {
        let mut dx = dx();
        dx.set_trans_color(255, 0, 255);
        let (mut r, mut g, mut b) = (0, 0, 0);
        dx.get_trans_color(&mut r, &mut g, &mut b);
        assert_eq!((r, g, b), (255, 0, 255));

        dx.set_draw_blend_mode(DX_BLENDMODE_ADD, 300);
        let (mut mode, mut param) = (0, 0);
        dx.get_draw_blend_mode(&mut mode, &mut param);
        assert_eq!(mode, DX_BLENDMODE_ADD);
        assert_eq!(param, 300 & 0xff);

        dx.set_draw_bright(0x1ff, 10, 20);
        dx.get_draw_bright(&mut r, &mut g, &mut b);
        assert_eq!((r, g, b), (0xff, 10, 20));
    }

    #[test]
    fn test_div_graph_fills_buffer() {
        let mut dx = dx();
        let mut handles = [-1; 4];
        assert_eq!(
            dx.load_div_graph("/missing.png", 4, 2, 2, 8, 8, &mut handles),
            -1
        );
        assert_eq!(handles, [-1; 4]);
    }
}
