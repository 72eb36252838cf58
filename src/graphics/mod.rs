//!
//! Graphics core: texture and graph resources, vertex batching and the
//! DxLib drawing operations, over a pluggable [`RenderBackend`].

pub mod backend;
pub mod blend;
pub mod context;
pub mod draw;
pub mod graph;
pub mod math;
pub mod opengl;
pub mod recording;
pub mod surface;
pub mod texture;
pub mod types;
pub mod vertex;
pub mod vertex_cache;
#[cfg(feature = "sdl2")]
pub mod window;

pub use backend::{BackendError, RenderBackend};
pub use context::{letterbox, Graphics, GraphicsError};
pub use draw::{get_color, DrawState, DX_DRAWMODE_BILINEAR, DX_DRAWMODE_NEAREST};
pub use opengl::GlBackend;
pub use recording::{BackendCall, CallLog, RecordingBackend};
pub use types::{GraphId, Rect, SurfaceId, TextureId};
