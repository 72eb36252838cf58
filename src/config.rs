use anyhow::{Context, Result};

use crate::logging::LogLevel;

/// Default back-buffer size, matching DxLib's 640x480 startup mode.
pub const DEFAULT_WINDOW_WIDTH: u32 = 640;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 480;

/// Handle table growth increment.
pub const DEFAULT_HANDLE_CHUNK: usize = 512;

/// Vertex cache flush threshold in bytes.
pub const DEFAULT_VERTEX_ARENA_BYTES: usize = 256 * 1024;

/// Settings consumed when the graphics context is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub window_width: u32,
    pub window_height: u32,
    pub handle_chunk: usize,
    pub vertex_arena_bytes: usize,
    pub backend: BackendKind,
    pub log_level: LogLevel,

    // Graph loading defaults
    pub use_trans_color: bool,
    pub trans_color: (u8, u8, u8),
    pub premultiply_on_load: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    OpenGl,
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            handle_chunk: DEFAULT_HANDLE_CHUNK,
            vertex_arena_bytes: DEFAULT_VERTEX_ARENA_BYTES,
            backend: BackendKind::OpenGl,
            log_level: LogLevel::Info,
            use_trans_color: true,
            trans_color: (0, 0, 0),
            premultiply_on_load: false,
        }
    }
}

impl Options {
    /// Build options from `key = value` text, starting from the defaults.
    ///
    /// Unknown keys are logged and skipped; a bad value for a known key is an error.
    pub fn from_propfile(data: &str) -> Result<Self> {
        let mut opts = Options::default();
        for (line_no, line) in data.lines().enumerate() {
            let line = match line.find('#') {
                Some(pos) => &line[..pos],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("Key without value on line {}", line_no + 1);
                continue;
            };
            opts.apply(key.trim(), value.trim())
                .with_context(|| format!("line {}: {}", line_no + 1, key.trim()))?;
        }
        Ok(opts)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "resolution" => {
                let res = parse_resolution(value)?;
                self.window_width = res.width;
                self.window_height = res.height;
            }
            "backend" => self.backend = parse_backend(value)?,
            "handleChunk" => {
                self.handle_chunk = parse_positive(value).context("Invalid handle chunk")?
            }
            "vertexArenaBytes" => {
                self.vertex_arena_bytes =
                    parse_positive(value).context("Invalid vertex arena size")?
            }
            "logLevel" => {
                let level: i32 = value.parse().context("Invalid log level")?;
                self.log_level = LogLevel::from_i32(level);
            }
            "useTransColor" => self.use_trans_color = parse_bool(value)?,
            "transColor" => self.trans_color = parse_rgb(value)?,
            "premultiplyOnLoad" => self.premultiply_on_load = parse_bool(value)?,
            _ => log::warn!("Ignoring unknown option '{}'", key),
        }
        Ok(())
    }
}

/// Parse a resolution string in the format "WIDTHxHEIGHT"
pub fn parse_resolution(s: &str) -> Result<Resolution> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        anyhow::bail!("Resolution must be in WIDTHxHEIGHT format");
    }

    let width: u32 = parts[0].parse().context("Invalid width value")?;
    let height: u32 = parts[1].parse().context("Invalid height value")?;

    if width == 0 || height == 0 {
        anyhow::bail!("Resolution values must be positive");
    }

    Ok(Resolution { width, height })
}

/// Parse a rendering backend name
pub fn parse_backend(s: &str) -> Result<BackendKind> {
    match s.to_ascii_lowercase().as_str() {
        "opengl" | "gl" => Ok(BackendKind::OpenGl),
        "recording" | "null" => Ok(BackendKind::Recording),
        other => anyhow::bail!("Unknown backend '{}'", other),
    }
}

/// Parse a boolean the way DxLib config flags are usually written
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean '{}'", other),
    }
}

/// Parse "R,G,B" with each component in 0..=255
pub fn parse_rgb(s: &str) -> Result<(u8, u8, u8)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        anyhow::bail!("Color must be in R,G,B format");
    }
    let r: u8 = parts[0].parse().context("Invalid red component")?;
    let g: u8 = parts[1].parse().context("Invalid green component")?;
    let b: u8 = parts[2].parse().context("Invalid blue component")?;
    Ok((r, g, b))
}

fn parse_positive(s: &str) -> Result<usize> {
    let n: usize = s.parse()?;
    if n == 0 {
        anyhow::bail!("Value must be positive");
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_resolution_valid() {
        let res = parse_resolution("800x600").unwrap();
        assert_eq!(res.width, 800);
        assert_eq!(res.height, 600);
    }

    #[rstest]
    #[case("640-480")]
    #[case("640x480x120")]
    #[case("0x480")]
    #[case("640x0")]
    #[case("abcxdef")]
    fn test_parse_resolution_invalid(#[case] input: &str) {
        assert!(parse_resolution(input).is_err());
    }

    #[rstest]
    #[case("1", true)]
    #[case("On", true)]
    #[case("false", false)]
    #[case("no", false)]
    fn test_parse_bool(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(parse_bool(input).unwrap(), expected);
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("255, 0,128").unwrap(), (255, 0, 128));
        assert!(parse_rgb("256,0,0").is_err());
        assert!(parse_rgb("1,2").is_err());
    }

    #[test]
    fn test_options_default() {
        let opts = Options::default();
        assert_eq!(opts.window_width, 640);
        assert_eq!(opts.window_height, 480);
        assert_eq!(opts.handle_chunk, 512);
        assert_eq!(opts.vertex_arena_bytes, 256 * 1024);
        assert!(opts.use_trans_color);
        assert!(!opts.premultiply_on_load);
    }

    #[test]
    fn test_from_propfile() {
        let opts = Options::from_propfile(
            "# graphics\n\
             resolution = 320x240\n\
             backend = recording   # headless\n\
             vertexArenaBytes=4096\n\
             transColor = 255,0,255\n\
             mystery = 1\n",
        )
        .unwrap();
        assert_eq!(opts.window_width, 320);
        assert_eq!(opts.window_height, 240);
        assert_eq!(opts.backend, BackendKind::Recording);
        assert_eq!(opts.vertex_arena_bytes, 4096);
        assert_eq!(opts.trans_color, (255, 0, 255));
    }

    #[test]
    fn test_from_propfile_bad_value() {
        assert!(Options::from_propfile("handleChunk = 0\n").is_err());
        assert!(Options::from_propfile("backend = vulkan\n").is_err());
    }
}
