//!
//! Graphs: user-visible sub-images over shared textures.
//!
//! Every graph owns one reference on its texture. Graphs that share a
//! texture through derivation are chained into a sibling list with no head;
//! any member can be used to tear down the whole chain.
//!

use std::path::Path;

use super::context::GraphicsError;
use super::surface;
use super::texture::{self, TextureRegistry};
use super::types::{GraphId, Rect, SurfaceId, TextureId};
use crate::config::Options;
use crate::handle::{HandleKind, HandleTable};

/// A graph record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Graph {
    pub rect: Rect,
    pub texture: TextureId,
    pub prev: Option<GraphId>,
    pub next: Option<GraphId>,
}

/// Resolved texture information for a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphTextureInfo {
    pub texture: TextureId,
    pub rect: Rect,
    pub x_mult: f32,
    pub y_mult: f32,
}

/// Storage with index-based prev/next links.
pub trait SiblingArena {
    fn links(&self, id: GraphId) -> Option<(Option<GraphId>, Option<GraphId>)>;
    fn set_prev(&mut self, id: GraphId, prev: Option<GraphId>);
    fn set_next(&mut self, id: GraphId, next: Option<GraphId>);
}

impl SiblingArena for HandleTable {
    fn links(&self, id: GraphId) -> Option<(Option<GraphId>, Option<GraphId>)> {
        get(self, id).map(|g| (g.prev, g.next))
    }

    fn set_prev(&mut self, id: GraphId, prev: Option<GraphId>) {
        if let Some(g) = get_mut(self, id) {
            g.prev = prev;
        }
    }

    fn set_next(&mut self, id: GraphId, next: Option<GraphId>) {
        if let Some(g) = get_mut(self, id) {
            g.next = next;
        }
    }
}

/// Detach `id` from its chain, patching both neighbours.
///
/// Returns the former `(prev, next)`; `None` if `id` is not in the arena.
pub fn unlink<A: SiblingArena + ?Sized>(
    arena: &mut A,
    id: GraphId,
) -> Option<(Option<GraphId>, Option<GraphId>)> {
    let (prev, next) = arena.links(id)?;
    if let Some(p) = prev {
        arena.set_next(p, next);
    }
    if let Some(n) = next {
        arena.set_prev(n, prev);
    }
    arena.set_prev(id, None);
    arena.set_next(id, None);
    Some((prev, next))
}

/// Insert `id` directly after `after`.
pub fn link_after<A: SiblingArena + ?Sized>(arena: &mut A, id: GraphId, after: GraphId) {
    let Some((_, after_next)) = arena.links(after) else {
        return;
    };
    arena.set_prev(id, Some(after));
    arena.set_next(id, after_next);
    arena.set_next(after, Some(id));
    if let Some(n) = after_next {
        arena.set_prev(n, Some(id));
    }
}

#[must_use]
pub fn get(handles: &HandleTable, id: GraphId) -> Option<&Graph> {
    handles.get_data::<Graph>(id.id(), HandleKind::Graph)
}

fn get_mut(handles: &mut HandleTable, id: GraphId) -> Option<&mut Graph> {
    handles.get_data_mut::<Graph>(id.id(), HandleKind::Graph)
}

/// Width and height of the graph's rectangle.
#[must_use]
pub fn get_size(handles: &HandleTable, id: GraphId) -> Option<(i32, i32)> {
    get(handles, id).map(|g| (g.rect.w, g.rect.h))
}

/// Resolve a graph to its texture and sub-rectangle.
#[must_use]
pub fn get_texture_id(handles: &HandleTable, id: GraphId) -> Option<(TextureId, Rect)> {
    get(handles, id).map(|g| (g.texture, g.rect))
}

#[must_use]
pub fn get_texture_info(handles: &HandleTable, id: GraphId) -> Option<GraphTextureInfo> {
    let graph = get(handles, id)?;
    let info = texture::texture_info(handles, graph.texture)?;
    Some(GraphTextureInfo {
        texture: graph.texture,
        rect: graph.rect,
        x_mult: info.x_mult,
        y_mult: info.y_mult,
    })
}

#[must_use]
pub fn count(handles: &HandleTable) -> usize {
    handles.count_of(HandleKind::Graph)
}

/// Load-time settings and graph lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRegistry {
    trans_color: u32,
    use_trans_color: bool,
    premultiply_on_load: bool,
}

impl Default for GraphRegistry {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl GraphRegistry {
    #[must_use]
    pub fn new(options: &Options) -> Self {
        let (r, g, b) = options.trans_color;
        let mut registry = Self {
            trans_color: 0,
            use_trans_color: options.use_trans_color,
            premultiply_on_load: options.premultiply_on_load,
        };
        registry.set_trans_color(i32::from(r), i32::from(g), i32::from(b));
        registry
    }

    pub fn set_trans_color(&mut self, r: i32, g: i32, b: i32) {
        self.trans_color = ((b & 0xff) | ((g & 0xff) << 8) | ((r & 0xff) << 16)) as u32;
    }

    #[must_use]
    pub fn trans_color(&self) -> (i32, i32, i32) {
        let c = self.trans_color;
        (
            ((c >> 16) & 0xff) as i32,
            ((c >> 8) & 0xff) as i32,
            (c & 0xff) as i32,
        )
    }

    pub fn set_use_trans_color(&mut self, flag: bool) {
        self.use_trans_color = flag;
    }

    pub fn set_use_premultiplied_alpha_on_load(&mut self, flag: bool) {
        self.premultiply_on_load = flag;
    }

    pub fn reset_settings(&mut self) {
        self.trans_color = 0;
        self.use_trans_color = true;
        self.premultiply_on_load = false;
    }

    fn allocate(
        handles: &mut HandleTable,
        texture: TextureId,
        rect: Rect,
        link_to: Option<GraphId>,
    ) -> Result<GraphId, GraphicsError> {
        texture::add_ref(handles, texture)?;
        let id = handles
            .acquire_id(HandleKind::Graph)
            .map(GraphId::new)
            .ok_or(GraphicsError::InvalidHandle(-1))?;
        handles.allocate_data(
            id.id(),
            Graph {
                rect,
                texture,
                prev: None,
                next: None,
            },
        );
        if let Some(link) = link_to {
            link_after(handles, id, link);
        }
        Ok(id)
    }

    /// Wrap an existing texture as a standalone graph.
    pub fn from_texture(
        handles: &mut HandleTable,
        texture: TextureId,
        rect: Rect,
    ) -> Result<GraphId, GraphicsError> {
        Self::allocate(handles, texture, rect, None)
    }

    /// Upload a surface into a new texture and wrap it.
    pub fn create_from_surface(
        &self,
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        surface_id: SurfaceId,
    ) -> Result<GraphId, GraphicsError> {
        let has_alpha = surface::has_transparency(handles, surface_id);
        if has_alpha && self.premultiply_on_load {
            surface::apply_pma(handles, surface_id)?;
        }

        let (width, height) = surface::get_size(handles, surface_id)
            .ok_or(GraphicsError::InvalidHandle(surface_id.id()))?;
        let texture = textures.create_from_surface(handles, surface_id, has_alpha)?;
        let rect = Rect::new(0, 0, width as i32, height as i32);
        Self::allocate(handles, texture, rect, None).map_err(|e| {
            let _ = textures.release(handles, texture);
            e
        })
    }

    /// Blank graph backed by a plain texture.
    pub fn make_graph(
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> Result<GraphId, GraphicsError> {
        let texture = textures.create_from_dimensions(handles, width, height, has_alpha)?;
        let rect = Rect::new(0, 0, width as i32, height as i32);
        Self::allocate(handles, texture, rect, None).map_err(|e| {
            let _ = textures.release(handles, texture);
            e
        })
    }

    /// Render-target graph.
    pub fn make_screen(
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> Result<GraphId, GraphicsError> {
        let texture = textures.create_framebuffer(handles, width, height, has_alpha)?;
        let rect = Rect::new(0, 0, width as i32, height as i32);
        Self::allocate(handles, texture, rect, None).map_err(|e| {
            let _ = textures.release(handles, texture);
            e
        })
    }

    fn graph_from_loaded_surface(
        &self,
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        surface_id: SurfaceId,
        flip: bool,
    ) -> Result<GraphId, GraphicsError> {
        let result = self.prepare_and_upload(handles, textures, surface_id, flip);
        surface::delete(handles, surface_id)?;
        result
    }

    fn prepare_and_upload(
        &self,
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        surface_id: SurfaceId,
        flip: bool,
    ) -> Result<GraphId, GraphicsError> {
        if self.use_trans_color {
            surface::apply_transparent_color(handles, surface_id, self.trans_color)?;
        }
        if flip {
            surface::flip(handles, surface_id)?;
        }
        self.create_from_surface(handles, textures, surface_id)
    }

    /// Load an image file as a graph, optionally mirrored.
    pub fn load(
        &self,
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        path: &Path,
        flip: bool,
    ) -> Result<GraphId, GraphicsError> {
        let surface_id = surface::load(handles, path)?;
        self.graph_from_loaded_surface(handles, textures, surface_id, flip)
    }

    /// Like [`GraphRegistry::load`], from encoded image bytes.
    pub fn load_from_memory(
        &self,
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        bytes: &[u8],
        flip: bool,
    ) -> Result<GraphId, GraphicsError> {
        let surface_id = surface::load_from_memory(handles, bytes)?;
        self.graph_from_loaded_surface(handles, textures, surface_id, flip)
    }

    /// New graph over a sub-rectangle of `src`, chained after it.
    ///
    /// `x`/`y` are relative to `src`; `w`/`h` are stored as given, even past
    /// the texture's edge.
    pub fn derivation(
        handles: &mut HandleTable,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        src: GraphId,
    ) -> Result<GraphId, GraphicsError> {
        let src_graph = *get(handles, src).ok_or(GraphicsError::InvalidHandle(src.id()))?;
        let rect = Rect::new(src_graph.rect.x + x, src_graph.rect.y + y, w, h);
        Self::allocate(handles, src_graph.texture, rect, Some(src))
    }

    /// Load an image and cut it into a row-major grid of graphs.
    ///
    /// Stops after `count` graphs or at the end of the grid. The whole-image
    /// graph is deleted afterwards; the texture survives through the pieces.
    #[allow(clippy::too_many_arguments)]
    pub fn load_div(
        &self,
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        path: &Path,
        count: usize,
        x_count: i32,
        y_count: i32,
        x_size: i32,
        y_size: i32,
        flip: bool,
    ) -> Result<Vec<GraphId>, GraphicsError> {
        let base = self.load(handles, textures, path, flip)?;
        let pieces = Self::divide(handles, base, count, x_count, y_count, x_size, y_size);
        Self::delete(handles, textures, base)?;
        pieces
    }

    fn divide(
        handles: &mut HandleTable,
        base: GraphId,
        count: usize,
        x_count: i32,
        y_count: i32,
        x_size: i32,
        y_size: i32,
    ) -> Result<Vec<GraphId>, GraphicsError> {
        let mut pieces = Vec::with_capacity(count);
        for y in 0..y_count {
            for x in 0..x_count {
                if pieces.len() >= count {
                    break;
                }
                pieces.push(Self::derivation(
                    handles,
                    x * x_size,
                    y * y_size,
                    x_size,
                    y_size,
                    base,
                )?);
            }
        }
        Ok(pieces)
    }

    /// Unlink a graph, drop its texture reference and free its handle.
    pub fn delete(
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        id: GraphId,
    ) -> Result<(), GraphicsError> {
        let texture = get(handles, id)
            .map(|g| g.texture)
            .ok_or(GraphicsError::InvalidHandle(id.id()))?;
        unlink(handles, id);
        let released = textures.release(handles, texture);
        handles.release_id(id.id(), true);
        released
    }

    /// Delete `id` and every graph chained to it.
    pub fn delete_sharing_graph(
        handles: &mut HandleTable,
        textures: &mut TextureRegistry,
        id: GraphId,
    ) -> Result<(), GraphicsError> {
        let (mut prev, mut next) = handles
            .links(id)
            .ok_or(GraphicsError::InvalidHandle(id.id()))?;
        Self::delete(handles, textures, id)?;

        while let Some(current) = prev {
            let Some((p, _)) = handles.links(current) else {
                break;
            };
            prev = p;
            Self::delete(handles, textures, current)?;
        }
        while let Some(current) = next {
            let Some((_, n)) = handles.links(current) else {
                break;
            };
            next = n;
            Self::delete(handles, textures, current)?;
        }
        Ok(())
    }

    /// Delete every graph.
    pub fn init_graph(handles: &mut HandleTable, textures: &mut TextureRegistry) {
        while let Some(raw) = handles.first_id_of(HandleKind::Graph) {
            if let Err(e) = Self::delete(handles, textures, GraphId::new(raw)) {
                log::warn!("Deleting graph {} failed: {}", raw, e);
                handles.release_id(raw, true);
            }
        }
    }

    pub fn set_wrap(
        handles: &HandleTable,
        textures: &mut TextureRegistry,
        id: GraphId,
        wrap: bool,
    ) -> Result<(), GraphicsError> {
        let (texture, _) = get_texture_id(handles, id).ok_or(GraphicsError::InvalidHandle(id.id()))?;
        textures.set_wrap(handles, texture, wrap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::recording::{CallLog, RecordingBackend};
    use image::{DynamicImage, RgbaImage};

    #[derive(Default)]
    struct VecArena(Vec<(Option<GraphId>, Option<GraphId>)>);

    impl SiblingArena for VecArena {
        fn links(&self, id: GraphId) -> Option<(Option<GraphId>, Option<GraphId>)> {
            self.0.get(id.id() as usize).copied()
        }
        fn set_prev(&mut self, id: GraphId, prev: Option<GraphId>) {
            self.0[id.id() as usize].0 = prev;
        }
        fn set_next(&mut self, id: GraphId, next: Option<GraphId>) {
            self.0[id.id() as usize].1 = next;
        }
    }

    fn chain(arena: &VecArena, start: GraphId) -> Vec<i32> {
        let mut out = vec![start.id()];
        let mut cursor = arena.links(start).and_then(|l| l.1);
        while let Some(id) = cursor {
            out.push(id.id());
            cursor = arena.links(id).and_then(|l| l.1);
        }
        out
    }

    #[test]
    fn test_link_after_and_unlink_are_symmetric() {
        let mut arena = VecArena(vec![(None, None); 4]);
        let g = GraphId::new;
        link_after(&mut arena, g(1), g(0));
        link_after(&mut arena, g(2), g(0));
        link_after(&mut arena, g(3), g(1));
        assert_eq!(chain(&arena, g(0)), vec![0, 2, 1, 3]);

        assert_eq!(unlink(&mut arena, g(1)), Some((Some(g(2)), Some(g(3)))));
        assert_eq!(chain(&arena, g(0)), vec![0, 2, 3]);
        assert_eq!(arena.links(g(3)), Some((Some(g(2)), None)));
        assert_eq!(arena.links(g(1)), Some((None, None)));

        assert_eq!(unlink(&mut arena, g(0)), Some((None, Some(g(2)))));
        assert_eq!(arena.links(g(2)), Some((None, Some(g(3)))));
        assert_eq!(unlink(&mut arena, g(9)), None);
    }

    fn setup() -> (HandleTable, TextureRegistry, CallLog) {
        let backend = RecordingBackend::new();
        let log = backend.log();
        (
            HandleTable::default(),
            TextureRegistry::new(Box::new(backend)),
            log,
        )
    }

    fn blank_graph(handles: &mut HandleTable, textures: &mut TextureRegistry) -> GraphId {
        let surface = surface::from_image(handles, DynamicImage::ImageRgba8(RgbaImage::new(64, 64)))
            .unwrap();
        GraphRegistry::default()
            .create_from_surface(handles, textures, surface)
            .unwrap()
    }

    #[test]
    fn test_derivation_stores_rect_verbatim() {
        let (mut handles, mut textures, _log) = setup();
        let base = blank_graph(&mut handles, &mut textures);
        let child = GraphRegistry::derivation(&mut handles, 10, 20, 500, 7, base).unwrap();
        let grandchild = GraphRegistry::derivation(&mut handles, 1, 1, 2, 2, child).unwrap();

        assert_eq!(get(&handles, child).unwrap().rect, Rect::new(10, 20, 500, 7));
        assert_eq!(
            get(&handles, grandchild).unwrap().rect,
            Rect::new(11, 21, 2, 2)
        );
        let (texture, _) = get_texture_id(&handles, base).unwrap();
        assert_eq!(texture::ref_count(&handles, texture), Some(3));
        assert_eq!(get(&handles, base).unwrap().next, Some(child));
        assert_eq!(get(&handles, child).unwrap().next, Some(grandchild));
    }

    #[test]
    fn test_delete_sharing_graph_from_middle() {
        let (mut handles, mut textures, log) = setup();
        let base = blank_graph(&mut handles, &mut textures);
        let ids: Vec<GraphId> = (0..4)
            .map(|i| GraphRegistry::derivation(&mut handles, i, 0, 1, 1, base).unwrap())
            .collect();
        let unrelated = blank_graph(&mut handles, &mut textures);
        assert_eq!(count(&handles), 6);

        GraphRegistry::delete_sharing_graph(&mut handles, &mut textures, ids[2]).unwrap();
        assert_eq!(count(&handles), 1);
        assert!(get(&handles, base).is_none());
        assert!(ids.iter().all(|&id| get(&handles, id).is_none()));
        assert!(get(&handles, unrelated).is_some());
        assert_eq!(log.deletes_of(1), 1);
        assert_eq!(texture::count(&handles), 1);
    }

    #[test]
    fn test_delete_unknown_graph_fails() {
        let (mut handles, mut textures, _log) = setup();
        assert!(GraphRegistry::delete(&mut handles, &mut textures, GraphId::new(3)).is_err());
        assert!(
            GraphRegistry::delete_sharing_graph(&mut handles, &mut textures, GraphId::new(-1))
                .is_err()
        );
    }

    #[test]
    fn test_trans_color_settings() {
        let mut registry = GraphRegistry::default();
        registry.set_trans_color(0x1ff, 0x80, -1);
        assert_eq!(registry.trans_color(), (0xff, 0x80, 0xff));
        registry.set_use_trans_color(false);
        registry.reset_settings();
        assert_eq!(registry, GraphRegistry::default());
    }

    #[test]
    fn test_make_screen_and_init_graph() {
        let (mut handles, mut textures, _log) = setup();
        let screen = GraphRegistry::make_screen(&mut handles, &mut textures, 32, 16, true).unwrap();
        let (texture, rect) = get_texture_id(&handles, screen).unwrap();
        assert_eq!(rect, Rect::new(0, 0, 32, 16));
        assert!(texture::get(&handles, texture).unwrap().framebuffer.is_some());

        let _blank = GraphRegistry::make_graph(&mut handles, &mut textures, 8, 8, false).unwrap();
        GraphRegistry::init_graph(&mut handles, &mut textures);
        assert_eq!(count(&handles), 0);
        assert_eq!(texture::count(&handles), 0);
        assert_eq!(texture::framebuffer_count(&handles), 0);
    }
}
