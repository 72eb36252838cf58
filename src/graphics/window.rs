//!
//! SDL2 window with a GLES2 context, for hosts that don't bring their own.
//!

use sdl2::{
    event::{Event, WindowEvent},
    video::{GLContext, GLProfile},
    EventPump, Sdl, VideoSubsystem,
};
use thiserror::Error;

use super::backend::BackendError;
use super::context::{Graphics, GraphicsError};
use super::opengl::GlBackend;
use crate::config::Options;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("SDL init failed: {0}")]
    Init(String),
    #[error("window creation failed: {0}")]
    Creation(String),
    #[error("GL context failed: {0}")]
    GlContext(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Graphics(#[from] GraphicsError),
}

pub struct GlWindow {
    // Field order is drop order: context before window before SDL.
    gl_context: GLContext,
    window: sdl2::video::Window,
    event_pump: EventPump,
    video: VideoSubsystem,
    _sdl: Sdl,
}

impl GlWindow {
    /// Open a `width` x `height` window and make its GL context current.
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, WindowError> {
        let sdl = sdl2::init().map_err(WindowError::Init)?;
        let video = sdl.video().map_err(WindowError::Init)?;

        let gl_attr = video.gl_attr();
        gl_attr.set_context_profile(GLProfile::GLES);
        gl_attr.set_context_version(2, 0);
        gl_attr.set_depth_size(0);
        gl_attr.set_double_buffer(true);

        let window = video
            .window(title, width, height)
            .opengl()
            .resizable()
            .position_centered()
            .build()
            .map_err(|e| WindowError::Creation(e.to_string()))?;

        let gl_context = window.gl_create_context().map_err(WindowError::GlContext)?;
        window
            .gl_make_current(&gl_context)
            .map_err(|e| WindowError::GlContext(format!("make current: {}", e)))?;

        let event_pump = sdl.event_pump().map_err(WindowError::Init)?;
        log::info!("Opened {}x{} GL window", width, height);

        Ok(Self {
            gl_context,
            window,
            event_pump,
            video,
            _sdl: sdl,
        })
    }

    /// Build a graphics context drawing into this window.
    pub fn create_graphics(&self, options: Options) -> Result<Graphics, WindowError> {
        let backend = GlBackend::from_sdl(&self.video)?;
        let mut gfx = Graphics::new(options, Box::new(backend))?;
        let (w, h) = self.window.drawable_size();
        gfx.set_output_size(w, h);
        Ok(gfx)
    }

    #[must_use]
    pub fn gl_context(&self) -> &GLContext {
        &self.gl_context
    }

    /// Drain pending events. Returns `false` once the window was asked to close.
    pub fn process_events(&mut self, gfx: &mut Graphics) -> bool {
        let mut running = true;
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => running = false,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..),
                    ..
                } => {
                    let (w, h) = self.window.drawable_size();
                    log::debug!("Output resized to {}x{}", w, h);
                    gfx.set_output_size(w, h);
                }
                _ => {}
            }
        }
        running
    }

    /// Finish the frame and swap it onto the screen.
    pub fn screen_flip(&mut self, gfx: &mut Graphics) -> Result<(), GraphicsError> {
        gfx.screen_flip()?;
        self.window.gl_swap_window();
        Ok(())
    }
}
