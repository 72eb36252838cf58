// DxPortLib core
// Handle table, texture/graph resources and batched 2D drawing

pub mod config;
pub mod dxlib;
pub mod graphics;
pub mod handle;
pub mod logging;

pub use config::Options;
pub use dxlib::DxLib;
pub use graphics::{Graphics, GraphicsError};
pub use handle::{HandleKind, HandleTable};
pub use logging::LogLevel;
