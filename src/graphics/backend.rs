//!
//! Rendering backend interface.
//!
//! Everything above this trait is backend-agnostic: the texture registry,
//! the vertex cache and the drawing layer only ever talk to a
//! [`RenderBackend`]. Backends hand out their own `u32` names for textures
//! and framebuffers; the registry maps handle-table ids onto those names.
//!

use thiserror::Error;

use super::math::Matrix;
use super::types::Rect;

/// Backend-side texture name.
pub type BackendTexture = u32;

/// Backend-side framebuffer name.
pub type BackendFramebuffer = u32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("texture {width}x{height} exceeds backend maximum {max_width}x{max_height}")]
    TextureTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("framebuffers are not supported by this backend")]
    FramebufferUnsupported,
    #[error("framebuffer is incomplete")]
    FramebufferIncomplete,
    #[error("shader error: {0}")]
    Shader(String),
    #[error("GL error 0x{0:04x}")]
    Gl(u32),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Blend factor, shared by the RGB and alpha halves of a blend function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    DstColor,
    SrcAlpha,
    DstAlpha,
    OneMinusSrcColor,
    OneMinusDstColor,
    OneMinusSrcAlpha,
    OneMinusDstAlpha,
}

/// Blend equation; `Disable` turns blending off entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Disable,
    Add,
    ReverseSubtract,
}

/// Fixed fragment programs emulating DxLib's texture/colour combiners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexturePreset {
    Modulate,
    DxMula,
    DxInvert,
    DxX4,
    DxPma,
    DxPmaInvert,
    DxPmaX4,
}

impl TexturePreset {
    pub const ALL: [TexturePreset; 7] = [
        TexturePreset::Modulate,
        TexturePreset::DxMula,
        TexturePreset::DxInvert,
        TexturePreset::DxX4,
        TexturePreset::DxPma,
        TexturePreset::DxPmaInvert,
        TexturePreset::DxPmaX4,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Primitive topology of a vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    Triangles,
    TriangleFan,
    TriangleStrip,
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
}

impl TextureFilter {
    /// Map a DxLib draw mode (`DX_DRAWMODE_*`) to a filter; unknown modes sample nearest.
    #[must_use]
    pub const fn from_draw_mode(mode: i32) -> Self {
        match mode {
            1 => TextureFilter::Linear,
            _ => TextureFilter::Nearest,
        }
    }
}

/// Alpha test comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    #[default]
    Always,
}

/// Semantic of one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    TexCoord0,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexValueType {
    Float,
    UnsignedByte,
}

impl VertexValueType {
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            VertexValueType::Float => 4,
            VertexValueType::UnsignedByte => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub attribute: VertexAttribute,
    pub components: u8,
    pub value_type: VertexValueType,
    pub offset: usize,
}

/// Interleaved vertex layout.
///
/// Definitions are `'static` and compared by address, so two layouts with
/// the same elements but different statics never batch together.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct VertexDefinition {
    pub elements: &'static [VertexElement],
    pub stride: usize,
}

impl VertexDefinition {
    #[must_use]
    pub fn element(&self, attribute: VertexAttribute) -> Option<&VertexElement> {
        self.elements.iter().find(|e| e.attribute == attribute)
    }
}

/// Limits reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCaps {
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    pub npot_textures: bool,
    pub framebuffers: bool,
}

/// Storage request for a new texture. Sizes are already padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
}

/// Texture bound to a preset program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampledTexture {
    pub texture: BackendTexture,
    pub filter: TextureFilter,
}

/// Everything a preset program needs for one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetProgram {
    pub preset: TexturePreset,
    pub projection: Matrix,
    pub view: Matrix,
    pub texture: Option<SampledTexture>,
    pub alpha_func: CompareFunc,
    pub alpha_ref: f32,
}

/// Render target: a framebuffer and the texture it draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramebufferTarget {
    pub framebuffer: BackendFramebuffer,
    pub texture: BackendTexture,
}

/// The capability table every backend implements.
pub trait RenderBackend {
    /// Short backend name, for logs.
    fn name(&self) -> &'static str;

    #[must_use]
    fn capabilities(&self) -> BackendCaps;

    fn start_frame(&mut self);
    fn end_frame(&mut self);

    fn set_viewport(&mut self, rect: Rect);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&mut self);

    fn set_scissor(&mut self, rect: Rect);
    fn disable_scissor(&mut self);

    /// Set separate RGB/alpha blend functions. `BlendEquation::Disable` turns blending off.
    fn set_blend_mode_separate(
        &mut self,
        equation: BlendEquation,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );

    fn set_preset_program(&mut self, program: &PresetProgram);
    fn clear_preset_program(&mut self);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<BackendTexture, BackendError>;

    /// Copy tightly-pitched RGBA8 rows into `rect` of `texture`.
    fn upload_texture(
        &mut self,
        texture: BackendTexture,
        rect: Rect,
        pixels: &[u8],
        pitch: usize,
    ) -> Result<(), BackendError>;

    fn set_texture_wrap(&mut self, texture: BackendTexture, repeat: bool);
    fn delete_texture(&mut self, texture: BackendTexture);

    fn create_framebuffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<BackendFramebuffer, BackendError>;
    fn delete_framebuffer(&mut self, framebuffer: BackendFramebuffer);

    /// Bind `target`, or the window's default framebuffer for `None`.
    fn bind_framebuffer(&mut self, target: Option<FramebufferTarget>) -> Result<(), BackendError>;

    /// Draw `count` vertices starting at vertex `start` of `data`.
    fn draw_vertex_array(
        &mut self,
        definition: &'static VertexDefinition,
        data: &[u8],
        primitive: Primitive,
        start: usize,
        count: usize,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_draw_mode() {
        assert_eq!(TextureFilter::from_draw_mode(0), TextureFilter::Nearest);
        assert_eq!(TextureFilter::from_draw_mode(1), TextureFilter::Linear);
        assert_eq!(TextureFilter::from_draw_mode(2), TextureFilter::Nearest);
        assert_eq!(TextureFilter::from_draw_mode(77), TextureFilter::Nearest);
    }

    #[test]
    fn test_error_display() {
        let err = BackendError::TextureTooLarge {
            width: 8192,
            height: 16,
            max_width: 4096,
            max_height: 4096,
        };
        assert_eq!(
            err.to_string(),
            "texture 8192x16 exceeds backend maximum 4096x4096"
        );
        assert_eq!(BackendError::Gl(0x502).to_string(), "GL error 0x0502");
    }
}
