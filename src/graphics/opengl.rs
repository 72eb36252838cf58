//!
//! OpenGL / GLES2 backend.
//!
//! One stock program per (preset, textured) pair, all sharing the attribute
//! slots below. Vertex data is streamed through a single VBO that is
//! re-specified on every draw.

use std::collections::HashMap;
use std::ffi::{c_void, CString};

use gl::types::{GLenum, GLint, GLsizei, GLsizeiptr, GLuint};

use super::backend::{
    BackendCaps, BackendError, BackendFramebuffer, BackendTexture, BlendEquation, BlendFactor,
    FramebufferTarget, PresetProgram, Primitive, RenderBackend, TextureDesc, TextureFilter,
    TexturePreset, VertexAttribute, VertexDefinition, VertexValueType,
};
use super::types::Rect;

const ATTRIB_POSITION: GLuint = 0;
const ATTRIB_TEXCOORD: GLuint = 1;
const ATTRIB_COLOR: GLuint = 2;

const VERT_COLOR_SRC: &str = "\
attribute vec4 position;
attribute vec4 color;
uniform mat4 modelView;
uniform mat4 projection;
varying vec4 outColor;
void main() {
    gl_Position = projection * (modelView * position);
    outColor = color;
}
";

const VERT_COLOR_TEX_SRC: &str = "\
attribute vec4 position;
attribute vec2 texcoord;
attribute vec4 color;
uniform mat4 modelView;
uniform mat4 projection;
varying vec2 outTexcoord;
varying vec4 outColor;
void main() {
    gl_Position = projection * (modelView * position);
    outColor = color;
    outTexcoord = texcoord;
}
";

const FRAG_HEADER: &str = "\
#ifdef GL_ES
precision mediump float;
#endif
varying vec4 outColor;
";

const FRAG_TEX_HEADER: &str = "\
#ifdef GL_ES
precision mediump float;
#endif
uniform sampler2D texture;
varying vec2 outTexcoord;
varying vec4 outColor;
";

/// Fragment body for `preset`, untextured or sampling `texture`.
fn fragment_body(preset: TexturePreset, textured: bool) -> &'static str {
    use TexturePreset::*;
    match (preset, textured) {
        (Modulate, false) => "gl_FragColor = outColor;",
        (Modulate, true) => "gl_FragColor = texture2D(texture, outTexcoord) * outColor;",
        (DxMula, false) => "vec4 c = outColor; gl_FragColor = vec4(c.rgb * c.a, c.a);",
        (DxMula, true) => {
            "vec4 c = texture2D(texture, outTexcoord) * outColor; \
             gl_FragColor = vec4(c.rgb * c.a, c.a);"
        }
        (DxInvert, false) => "vec4 c = outColor; gl_FragColor = vec4(1.0 - c.rgb, c.a);",
        (DxInvert, true) => {
            "vec4 c = texture2D(texture, outTexcoord); \
             gl_FragColor = vec4((1.0 - c.rgb) * (1.0 - outColor.rgb), c.a * outColor.a);"
        }
        (DxX4, false) => "vec4 c = outColor; gl_FragColor = vec4(c.rgb * 4.0, c.a);",
        (DxX4, true) => {
            "vec4 c = texture2D(texture, outTexcoord) * outColor; \
             gl_FragColor = vec4(c.rgb * 4.0, c.a);"
        }
        (DxPma, false) => "gl_FragColor = vec4(outColor.rgb * outColor.a, outColor.a);",
        (DxPma, true) => {
            "vec4 oc = vec4(outColor.rgb * outColor.a, outColor.a); \
             gl_FragColor = texture2D(texture, outTexcoord) * oc;"
        }
        (DxPmaInvert, false) => {
            "gl_FragColor = vec4((1.0 - outColor.rgb) * outColor.a, outColor.a);"
        }
        (DxPmaInvert, true) => {
            "vec4 c = texture2D(texture, outTexcoord); \
             gl_FragColor = vec4(outColor.rgb * (1.0 - c.rgb), c.a * outColor.a);"
        }
        (DxPmaX4, false) => {
            "gl_FragColor = vec4(outColor.rgb * outColor.a * 4.0, outColor.a);"
        }
        (DxPmaX4, true) => {
            "vec4 oc = vec4(outColor.rgb * outColor.a * 4.0, outColor.a); \
             gl_FragColor = texture2D(texture, outTexcoord) * oc;"
        }
    }
}

fn fragment_source(preset: TexturePreset, textured: bool) -> String {
    let header = if textured { FRAG_TEX_HEADER } else { FRAG_HEADER };
    format!(
        "{}void main() {{\n    {}\n}}\n",
        header,
        fragment_body(preset, textured)
    )
}

const fn blend_factor_to_gl(factor: BlendFactor) -> GLenum {
    match factor {
        BlendFactor::Zero => gl::ZERO,
        BlendFactor::One => gl::ONE,
        BlendFactor::SrcColor => gl::SRC_COLOR,
        BlendFactor::DstColor => gl::DST_COLOR,
        BlendFactor::SrcAlpha => gl::SRC_ALPHA,
        BlendFactor::DstAlpha => gl::DST_ALPHA,
        BlendFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
        BlendFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
        BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
        BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
    }
}

const fn primitive_to_gl(primitive: Primitive) -> GLenum {
    match primitive {
        Primitive::Points => gl::POINTS,
        Primitive::Lines => gl::LINES,
        Primitive::Triangles => gl::TRIANGLES,
        Primitive::TriangleFan => gl::TRIANGLE_FAN,
        Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
    }
}

const fn filter_to_gl(filter: TextureFilter) -> GLint {
    match filter {
        TextureFilter::Nearest => gl::NEAREST as GLint,
        TextureFilter::Linear => gl::LINEAR as GLint,
    }
}

/// Copy `rect`-sized rows out of a pitched buffer when the pitch has padding.
///
/// GLES2 has no `UNPACK_ROW_LENGTH`, so padded rows are repacked first.
fn tight_rows(pixels: &[u8], width: usize, height: usize, pitch: usize) -> Option<Vec<u8>> {
    let row = width * 4;
    if pitch == row {
        return None;
    }
    let mut out = Vec::with_capacity(row * height);
    for y in 0..height {
        let start = y * pitch;
        out.extend_from_slice(&pixels[start..start + row]);
    }
    Some(out)
}

#[derive(Debug, Clone, Copy)]
struct StockProgram {
    program: GLuint,
    projection: GLint,
    model_view: GLint,
    texture: GLint,
}

pub struct GlBackend {
    /// Indexed by `preset.index() * 2 + textured`.
    programs: Vec<StockProgram>,
    vertex_buffer: GLuint,
    caps: BackendCaps,
    /// Last filter applied to each live texture.
    filters: HashMap<BackendTexture, TextureFilter>,
    bound_texture: Option<BackendTexture>,
}

impl GlBackend {
    /// Load GL entry points through `loader` and build the stock programs.
    ///
    /// A GL context must be current on the calling thread.
    pub fn new<F>(loader: F) -> Result<Self, BackendError>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let caps = Self::query_caps();
        log::info!(
            "GL backend: max texture {}x{}, npot {}, framebuffers {}",
            caps.max_texture_width,
            caps.max_texture_height,
            caps.npot_textures,
            caps.framebuffers
        );

        let mut backend = Self {
            programs: Vec::with_capacity(TexturePreset::ALL.len() * 2),
            vertex_buffer: 0,
            caps,
            filters: HashMap::new(),
            bound_texture: None,
        };
        backend.init_programs()?;

        unsafe {
            gl::GenBuffers(1, &mut backend.vertex_buffer);
            gl::Disable(gl::DEPTH_TEST);
            gl::Disable(gl::CULL_FACE);
            gl::Disable(gl::DITHER);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
        }
        Ok(backend)
    }

    /// Create the backend from an SDL2 video subsystem whose GL context is current.
    #[cfg(feature = "sdl2")]
    pub fn from_sdl(video: &sdl2::VideoSubsystem) -> Result<Self, BackendError> {
        Self::new(|s| video.gl_get_proc_address(s) as *const c_void)
    }

    fn query_caps() -> BackendCaps {
        let mut max_size: GLint = 0;
        unsafe {
            gl::GetIntegerv(gl::MAX_TEXTURE_SIZE, &mut max_size);
        }
        let max_size = max_size.max(64) as u32;

        let extensions = unsafe {
            let ptr = gl::GetString(gl::EXTENSIONS);
            if ptr.is_null() {
                String::new()
            } else {
                std::ffi::CStr::from_ptr(ptr.cast())
                    .to_string_lossy()
                    .into_owned()
            }
        };
        let npot_textures = extensions.contains("GL_ARB_texture_non_power_of_two")
            || extensions.contains("GL_OES_texture_npot");

        BackendCaps {
            max_texture_width: max_size,
            max_texture_height: max_size,
            npot_textures,
            framebuffers: gl::GenFramebuffers::is_loaded(),
        }
    }

    fn init_programs(&mut self) -> Result<(), BackendError> {
        for preset in TexturePreset::ALL {
            for textured in [false, true] {
                let vertex = if textured {
                    VERT_COLOR_TEX_SRC
                } else {
                    VERT_COLOR_SRC
                };
                let program = Self::link_program(vertex, &fragment_source(preset, textured))
                    .inspect_err(|e| log::error!("Stock program {:?} failed: {}", preset, e))?;
                self.programs.push(program);
            }
        }
        Ok(())
    }

    fn link_program(vertex_src: &str, fragment_src: &str) -> Result<StockProgram, BackendError> {
        let vertex_shader = Self::compile_shader(gl::VERTEX_SHADER, vertex_src)?;
        let fragment_shader = match Self::compile_shader(gl::FRAGMENT_SHADER, fragment_src) {
            Ok(shader) => shader,
            Err(e) => {
                unsafe { gl::DeleteShader(vertex_shader) };
                return Err(e);
            }
        };
        let program = unsafe { gl::CreateProgram() };

        unsafe {
            gl::AttachShader(program, vertex_shader);
            gl::AttachShader(program, fragment_shader);
            gl::BindAttribLocation(program, ATTRIB_POSITION, b"position\0".as_ptr().cast());
            gl::BindAttribLocation(program, ATTRIB_TEXCOORD, b"texcoord\0".as_ptr().cast());
            gl::BindAttribLocation(program, ATTRIB_COLOR, b"color\0".as_ptr().cast());
            gl::LinkProgram(program);
        }

        let mut link_status = 0;
        unsafe {
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut link_status);
        }
        if link_status == 0 {
            let log = Self::program_info_log(program);
            unsafe {
                gl::DeleteProgram(program);
                gl::DeleteShader(vertex_shader);
                gl::DeleteShader(fragment_shader);
            }
            return Err(BackendError::Shader(format!("link failed: {}", log)));
        }

        unsafe {
            gl::DetachShader(program, vertex_shader);
            gl::DetachShader(program, fragment_shader);
            gl::DeleteShader(vertex_shader);
            gl::DeleteShader(fragment_shader);
        }

        let uniform = |name: &[u8]| unsafe { gl::GetUniformLocation(program, name.as_ptr().cast()) };
        Ok(StockProgram {
            program,
            projection: uniform(b"projection\0"),
            model_view: uniform(b"modelView\0"),
            texture: uniform(b"texture\0"),
        })
    }

    fn compile_shader(shader_type: GLenum, source: &str) -> Result<GLuint, BackendError> {
        let c_str = CString::new(source)
            .map_err(|e| BackendError::Shader(format!("source contains null: {}", e)))?;
        let shader = unsafe { gl::CreateShader(shader_type) };

        unsafe {
            gl::ShaderSource(shader, 1, &c_str.as_ptr(), std::ptr::null());
            gl::CompileShader(shader);
        }

        let mut status = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        }
        if status == 0 {
            let log = Self::shader_info_log(shader);
            unsafe {
                gl::DeleteShader(shader);
            }
            return Err(BackendError::Shader(format!("compile failed: {}", log)));
        }

        Ok(shader)
    }

    fn shader_info_log(shader: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        }
        if len <= 1 {
            return String::new();
        }

        let mut buffer = vec![0u8; len as usize];
        unsafe {
            gl::GetShaderInfoLog(shader, len, std::ptr::null_mut(), buffer.as_mut_ptr().cast());
        }
        String::from_utf8_lossy(&buffer)
            .trim_end_matches('\0')
            .to_string()
    }

    fn program_info_log(program: GLuint) -> String {
        let mut len = 0;
        unsafe {
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
        }
        if len <= 1 {
            return String::new();
        }

        let mut buffer = vec![0u8; len as usize];
        unsafe {
            gl::GetProgramInfoLog(program, len, std::ptr::null_mut(), buffer.as_mut_ptr().cast());
        }
        String::from_utf8_lossy(&buffer)
            .trim_end_matches('\0')
            .to_string()
    }

    fn check_error() -> Result<(), BackendError> {
        let err = unsafe { gl::GetError() };
        if err == gl::NO_ERROR {
            Ok(())
        } else {
            Err(BackendError::Gl(err))
        }
    }

    fn bind_texture(&mut self, texture: BackendTexture) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture) };
        self.bound_texture = Some(texture);
    }

    fn apply_filter(&mut self, texture: BackendTexture, filter: TextureFilter) {
        if self.filters.get(&texture) == Some(&filter) {
            return;
        }
        let value = filter_to_gl(filter);
        unsafe {
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, value);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, value);
        }
        self.filters.insert(texture, filter);
    }

    fn restore_bound_texture(&self) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, self.bound_texture.unwrap_or(0)) };
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        unsafe {
            for program in &self.programs {
                gl::DeleteProgram(program.program);
            }
            if self.vertex_buffer != 0 {
                gl::DeleteBuffers(1, &self.vertex_buffer);
            }
        }
    }
}

impl RenderBackend for GlBackend {
    fn name(&self) -> &'static str {
        "opengl"
    }

    fn capabilities(&self) -> BackendCaps {
        self.caps
    }

    fn start_frame(&mut self) {}

    fn end_frame(&mut self) {
        unsafe { gl::Flush() };
    }

    fn set_viewport(&mut self, rect: Rect) {
        unsafe { gl::Viewport(rect.x, rect.y, rect.w, rect.h) };
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { gl::ClearColor(r, g, b, a) };
    }

    fn clear(&mut self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT) };
    }

    fn set_scissor(&mut self, rect: Rect) {
        unsafe {
            gl::Enable(gl::SCISSOR_TEST);
            gl::Scissor(rect.x, rect.y, rect.w, rect.h);
        }
    }

    fn disable_scissor(&mut self) {
        unsafe { gl::Disable(gl::SCISSOR_TEST) };
    }

    fn set_blend_mode_separate(
        &mut self,
        equation: BlendEquation,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        let equation = match equation {
            BlendEquation::Disable => {
                unsafe { gl::Disable(gl::BLEND) };
                return;
            }
            BlendEquation::Add => gl::FUNC_ADD,
            BlendEquation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        };
        unsafe {
            gl::BlendFuncSeparate(
                blend_factor_to_gl(src_rgb),
                blend_factor_to_gl(dst_rgb),
                blend_factor_to_gl(src_alpha),
                blend_factor_to_gl(dst_alpha),
            );
            gl::BlendEquation(equation);
            gl::Enable(gl::BLEND);
        }
    }

    fn set_preset_program(&mut self, program: &PresetProgram) {
        let textured = program.texture.is_some();
        let index = program.preset.index() * 2 + usize::from(textured);
        let Some(stock) = self.programs.get(index).copied() else {
            return;
        };

        unsafe {
            gl::UseProgram(stock.program);
            gl::UniformMatrix4fv(stock.projection, 1, gl::FALSE, program.projection.as_flat().as_ptr());
            gl::UniformMatrix4fv(stock.model_view, 1, gl::FALSE, program.view.as_flat().as_ptr());
        }

        if let Some(sampled) = program.texture {
            unsafe {
                gl::ActiveTexture(gl::TEXTURE0);
                if stock.texture >= 0 {
                    gl::Uniform1i(stock.texture, 0);
                }
            }
            self.bind_texture(sampled.texture);
            self.apply_filter(sampled.texture, sampled.filter);
        }
    }

    fn clear_preset_program(&mut self) {
        if self.bound_texture.take().is_some() {
            unsafe { gl::BindTexture(gl::TEXTURE_2D, 0) };
        }
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

        let mut texture: GLuint = 0;
        unsafe {
            gl::GetError();
            gl::GenTextures(1, &mut texture);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as GLint,
                desc.width as GLsizei,
                desc.height as GLsizei,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                std::ptr::null(),
            );
        }
        self.restore_bound_texture();

        if let Err(e) = Self::check_error() {
            unsafe { gl::DeleteTextures(1, &texture) };
            return Err(e);
        }
        self.filters.insert(texture, TextureFilter::Nearest);
        log::debug!("GL texture {} created ({}x{})", texture, desc.width, desc.height);
        Ok(texture)
    }

    fn upload_texture(
        &mut self,
        texture: BackendTexture,
        rect: Rect,
        pixels: &[u8],
        pitch: usize,
    ) -> Result<(), BackendError> {
        let (w, h) = (rect.w.max(0) as usize, rect.h.max(0) as usize);
        if w == 0 || h == 0 {
            return Ok(());
        }
        let repacked = tight_rows(pixels, w, h, pitch);
        let data = repacked.as_deref().unwrap_or(pixels);

        unsafe {
            gl::GetError();
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                rect.x,
                rect.y,
                rect.w,
                rect.h,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                data.as_ptr().cast(),
            );
        }
        self.restore_bound_texture();
        Self::check_error()
    }

    fn set_texture_wrap(&mut self, texture: BackendTexture, repeat: bool) {
        let mode = (if repeat { gl::REPEAT } else { gl::CLAMP_TO_EDGE }) as GLint;
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, mode);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, mode);
        }
        self.restore_bound_texture();
    }

    fn delete_texture(&mut self, texture: BackendTexture) {
        if self.bound_texture == Some(texture) {
            self.bound_texture = None;
        }
        self.filters.remove(&texture);
        unsafe { gl::DeleteTextures(1, &texture) };
        log::debug!("GL texture {} deleted", texture);
    }

    fn create_framebuffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<BackendFramebuffer, BackendError> {
        if !self.caps.framebuffers {
            return Err(BackendError::FramebufferUnsupported);
        }
        let mut framebuffer: GLuint = 0;
        unsafe { gl::GenFramebuffers(1, &mut framebuffer) };
        log::debug!("GL framebuffer {} created for {}x{}", framebuffer, width, height);
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: BackendFramebuffer) {
        unsafe { gl::DeleteFramebuffers(1, &framebuffer) };
    }

    fn bind_framebuffer(&mut self, target: Option<FramebufferTarget>) -> Result<(), BackendError> {
        let Some(target) = target else {
            if self.caps.framebuffers {
                unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, 0) };
            }
            return Ok(());
        };

        let status = unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, target.framebuffer);
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                gl::COLOR_ATTACHMENT0,
                gl::TEXTURE_2D,
                target.texture,
                0,
            );
            gl::CheckFramebufferStatus(gl::FRAMEBUFFER)
        };
        if status != gl::FRAMEBUFFER_COMPLETE {
            unsafe { gl::BindFramebuffer(gl::FRAMEBUFFER, 0) };
            return Err(BackendError::FramebufferIncomplete);
        }
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
        let stride = definition.stride;
        let from = start * stride;
        let to = from + count * stride;
        let Some(bytes) = data.get(from..to) else {
            log::warn!("Vertex range {}..{} outside {} bytes", from, to, data.len());
            return;
        };

        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, self.vertex_buffer);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                bytes.len() as GLsizeiptr,
                bytes.as_ptr().cast(),
                gl::STREAM_DRAW,
            );
        }

        let mut enabled = Vec::with_capacity(definition.elements.len());
        for element in definition.elements {
            let (slot, normalized) = match element.attribute {
                VertexAttribute::Position => (ATTRIB_POSITION, gl::FALSE),
                VertexAttribute::TexCoord0 => (ATTRIB_TEXCOORD, gl::FALSE),
                VertexAttribute::Color => (ATTRIB_COLOR, gl::TRUE),
            };
            let value_type = match element.value_type {
                VertexValueType::Float => gl::FLOAT,
                VertexValueType::UnsignedByte => gl::UNSIGNED_BYTE,
            };
            unsafe {
                gl::VertexAttribPointer(
                    slot,
                    GLint::from(element.components),
                    value_type,
                    normalized,
                    stride as GLsizei,
                    element.offset as *const c_void,
                );
                gl::EnableVertexAttribArray(slot);
            }
            enabled.push(slot);
        }

        unsafe {
            gl::DrawArrays(primitive_to_gl(primitive), 0, count as GLsizei);
            for slot in enabled {
                gl::DisableVertexAttribArray(slot);
            }
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_has_both_variants() {
        for preset in TexturePreset::ALL {
            let plain = fragment_source(preset, false);
            let textured = fragment_source(preset, true);
            assert!(!plain.contains("texture2D"), "{:?}", preset);
            assert!(textured.contains("texture2D"), "{:?}", preset);
            assert!(plain.starts_with("#ifdef GL_ES"));
        }
    }

    #[test]
    fn test_tight_rows_strips_padding() {
        let pixels: Vec<u8> = (0..24).collect();
        assert_eq!(tight_rows(&pixels, 2, 2, 8), None);
        let packed = tight_rows(&pixels, 2, 2, 12).unwrap();
        assert_eq!(packed, [0, 1, 2, 3, 4, 5, 6, 7, 12, 13, 14, 15, 16, 17, 18, 19]);
    }

    #[test]
    fn test_enum_mapping() {
        assert_eq!(primitive_to_gl(Primitive::TriangleFan), gl::TRIANGLE_FAN);
        assert_eq!(blend_factor_to_gl(BlendFactor::OneMinusDstAlpha), gl::ONE_MINUS_DST_ALPHA);
        assert_eq!(filter_to_gl(TextureFilter::Linear), gl::LINEAR as GLint);
    }
}
