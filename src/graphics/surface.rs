//!
//! CPU-side pixel surfaces.
//!
//! Surfaces are the staging step between an image file and a texture:
//! images are decoded into RGBA8, colour-keyed, optionally premultiplied or
//! mirrored, and then uploaded. They live in the handle table under
//! [`HandleKind::Surface`].
//!

use std::path::Path;

use image::{DynamicImage, RgbaImage};

use super::context::GraphicsError;
use super::types::SurfaceId;
use crate::handle::{HandleKind, HandleTable};

/// Decoded pixels plus whether any of them may be translucent.
#[derive(Debug, Clone)]
pub struct Surface {
    pub pixels: RgbaImage,
    pub has_transparency: bool,
}

impl Surface {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

fn store(handles: &mut HandleTable, surface: Surface) -> Result<SurfaceId, GraphicsError> {
    let id = handles
        .acquire_id(HandleKind::Surface)
        .ok_or(GraphicsError::InvalidHandle(-1))?;
    handles.allocate_data(id, surface);
    Ok(SurfaceId::new(id))
}

#[must_use]
pub fn get(handles: &HandleTable, id: SurfaceId) -> Option<&Surface> {
    handles.get_data::<Surface>(id.id(), HandleKind::Surface)
}

pub fn get_mut(handles: &mut HandleTable, id: SurfaceId) -> Option<&mut Surface> {
    handles.get_data_mut::<Surface>(id.id(), HandleKind::Surface)
}

fn get_or_err(handles: &mut HandleTable, id: SurfaceId) -> Result<&mut Surface, GraphicsError> {
    get_mut(handles, id).ok_or(GraphicsError::InvalidHandle(id.id()))
}

/// Blank, fully transparent surface.
pub fn create(handles: &mut HandleTable, width: u32, height: u32) -> Result<SurfaceId, GraphicsError> {
    if width == 0 || height == 0 {
        return Err(GraphicsError::InvalidDimensions { width, height });
    }
    store(
        handles,
        Surface {
            pixels: RgbaImage::new(width, height),
            has_transparency: true,
        },
    )
}

/// Wrap a decoded image. Formats that carry alpha are flagged as translucent.
pub fn from_image(handles: &mut HandleTable, image: DynamicImage) -> Result<SurfaceId, GraphicsError> {
    let has_transparency = image.color().has_alpha();
    store(
        handles,
        Surface {
            pixels: image.into_rgba8(),
            has_transparency,
        },
    )
}

pub fn load_from_memory(handles: &mut HandleTable, bytes: &[u8]) -> Result<SurfaceId, GraphicsError> {
    let image = image::load_from_memory(bytes)?;
    from_image(handles, image)
}

pub fn load(handles: &mut HandleTable, path: &Path) -> Result<SurfaceId, GraphicsError> {
    let bytes = std::fs::read(path)?;
    let id = load_from_memory(handles, &bytes).map_err(|e| {
        log::warn!("Could not decode {}: {}", path.display(), e);
        e
    })?;
    log::debug!("Loaded surface {} from {}", id, path.display());
    Ok(id)
}

/// Turn opaque pixels equal to `0xRRGGBB` into transparent black.
///
/// Returns the surface's resulting transparency flag.
pub fn apply_transparent_color(
    handles: &mut HandleTable,
    id: SurfaceId,
    color: u32,
) -> Result<bool, GraphicsError> {
    let surface = get_or_err(handles, id)?;
    let key = [
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
        0xff,
    ];

    let mut matched = false;
    for pixel in surface.pixels.pixels_mut() {
        if pixel.0 == key {
            pixel.0 = [0; 4];
            matched = true;
        }
    }
    if matched {
        surface.has_transparency = true;
    }
    Ok(surface.has_transparency)
}

/// Premultiply colour channels by alpha.
pub fn apply_pma(handles: &mut HandleTable, id: SurfaceId) -> Result<(), GraphicsError> {
    let surface = get_or_err(handles, id)?;
    premultiply(&mut surface.pixels);
    Ok(())
}

pub(crate) fn premultiply(pixels: &mut RgbaImage) {
    for pixel in pixels.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        match a {
            0xff => {}
            0 => pixel.0 = [0; 4],
            _ => {
                let a32 = u32::from(a);
                let scale = |c: u8| (u32::from(c) * a32 / 0xff) as u8;
                pixel.0 = [scale(r), scale(g), scale(b), a];
            }
        }
    }
}

/// Mirror the surface horizontally.
pub fn flip(handles: &mut HandleTable, id: SurfaceId) -> Result<(), GraphicsError> {
    let surface = get_or_err(handles, id)?;
    image::imageops::flip_horizontal_in_place(&mut surface.pixels);
    Ok(())
}

#[must_use]
pub fn get_size(handles: &HandleTable, id: SurfaceId) -> Option<(u32, u32)> {
    get(handles, id).map(|s| (s.width(), s.height()))
}

/// `false` for unknown ids.
#[must_use]
pub fn has_transparency(handles: &HandleTable, id: SurfaceId) -> bool {
    get(handles, id).is_some_and(|s| s.has_transparency)
}

pub fn delete(handles: &mut HandleTable, id: SurfaceId) -> Result<(), GraphicsError> {
    if get(handles, id).is_none() {
        return Err(GraphicsError::InvalidHandle(id.id()));
    }
    handles.release_id(id.id(), true);
    Ok(())
}

/// Delete every surface.
pub fn init_surface(handles: &mut HandleTable) {
    while let Some(id) = handles.first_id_of(HandleKind::Surface) {
        handles.release_id(id, true);
    }
}

#[must_use]
pub fn count(handles: &HandleTable) -> usize {
    handles.count_of(HandleKind::Surface)
}
