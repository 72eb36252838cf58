//!
//! Rolling vertex arena that coalesces consecutive draws.
//!
//! Draw calls append vertices here as long as their layout, primitive,
//! texture and blend flag match the open batch and the arena has room.
//! Anything else closes the batch; the owner flushes it and rebinds.
//!

use super::backend::{Primitive, VertexDefinition};
use super::types::TextureId;
use super::vertex::Vertex;

/// State a batch is keyed on.
#[derive(Debug, Clone, Copy)]
pub struct CacheKey {
    pub definition: &'static VertexDefinition,
    pub primitive: Primitive,
    pub texture: Option<TextureId>,
    pub blend: bool,
}

impl CacheKey {
    #[must_use]
    pub fn new<V: Vertex>(primitive: Primitive, texture: Option<TextureId>, blend: bool) -> Self {
        Self {
            definition: V::definition(),
            primitive,
            texture,
            blend,
        }
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.definition, other.definition)
            && self.primitive == other.primitive
            && self.texture == other.texture
            && self.blend == other.blend
    }
}

/// A closed batch ready for submission.
#[derive(Debug)]
pub struct Batch<'a> {
    pub key: CacheKey,
    pub vertex_count: usize,
    pub data: &'a [u8],
}

pub struct VertexCache {
    key: Option<CacheKey>,
    vertex_count: usize,
    // Word storage keeps every vertex 4-byte aligned.
    words: Vec<u32>,
    position: usize,
    limit: usize,
}

impl VertexCache {
    /// `limit` is the flush threshold in bytes; the arena grows up to it lazily.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            key: None,
            vertex_count: 0,
            words: Vec::new(),
            position: 0,
            limit: limit.max(4),
        }
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn key(&self) -> Option<&CacheKey> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.key.is_some() && self.vertex_count > 0
    }

    /// `true` if `count` vertices under `key` can join the open batch.
    #[must_use]
    pub fn accepts(&self, key: &CacheKey, count: usize) -> bool {
        self.key.as_ref() == Some(key)
            && self.position + count * key.definition.stride <= self.limit
    }

    /// Start an empty batch under `key`. Any pending vertices are discarded.
    pub fn rebind(&mut self, key: CacheKey) {
        self.key = Some(key);
        self.vertex_count = 0;
        self.position = 0;
    }

    /// Reserve `count` vertices in the open batch.
    ///
    /// The caller must have checked [`VertexCache::accepts`] or rebound with
    /// `V`'s layout. A single request larger than the limit still succeeds;
    /// the arena grows to hold it.
    pub fn append<V: Vertex>(&mut self, count: usize) -> &mut [V] {
        let stride = V::definition().stride;
        let start = self.position;
        let end = start + count * stride;
        let end_words = end.div_ceil(4);
        if self.words.len() < end_words {
            self.words.resize(end_words, 0);
        }

        self.position = end;
        self.vertex_count += count;

        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.words[..]);
        bytemuck::cast_slice_mut(&mut bytes[start..end])
    }

    /// The open batch, if it holds any vertices.
    #[must_use]
    pub fn pending(&self) -> Option<Batch<'_>> {
        let key = self.key?;
        if self.vertex_count == 0 {
            return None;
        }
        let bytes: &[u8] = bytemuck::cast_slice(&self.words[..]);
        Some(Batch {
            key,
            vertex_count: self.vertex_count,
            data: &bytes[..self.position],
        })
    }

    /// Drop pending vertices but keep the key for the next request.
    pub fn reset(&mut self) {
        self.vertex_count = 0;
        self.position = 0;
    }

    /// Back to the unbound state, releasing the arena.
    pub fn clear(&mut self) {
        self.key = None;
        self.reset();
        self.words = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::vertex::{Position2Color, Position2Tex2Color};

    fn shape_key() -> CacheKey {
        CacheKey::new::<Position2Color>(Primitive::Triangles, None, true)
    }

    #[test]
    fn test_matching_requests_accumulate() {
        let mut cache = VertexCache::new(1024);
        let key = shape_key();
        assert!(!cache.accepts(&key, 6));

        cache.rebind(key);
        cache.append::<Position2Color>(6)[0] = Position2Color::new(1.0, 2.0, 3);
        assert!(cache.accepts(&key, 6));
        cache.append::<Position2Color>(6)[5] = Position2Color::new(4.0, 5.0, 6);

        let batch = cache.pending().unwrap();
        assert_eq!(batch.vertex_count, 12);
        assert_eq!(batch.data.len(), 12 * 12);
        let verts: &[Position2Color] = bytemuck::cast_slice(batch.data);
        assert_eq!(verts[0], Position2Color::new(1.0, 2.0, 3));
        assert_eq!(verts[11], Position2Color::new(4.0, 5.0, 6));
    }

    #[test]
    fn test_any_key_difference_rejects() {
        let mut cache = VertexCache::new(1024);
        let key = shape_key();
        cache.rebind(key);
        cache.append::<Position2Color>(3);

        let other_prim = CacheKey::new::<Position2Color>(Primitive::Lines, None, true);
        let other_blend = CacheKey::new::<Position2Color>(Primitive::Triangles, None, false);
        let other_layout = CacheKey::new::<Position2Tex2Color>(Primitive::Triangles, None, true);
        let other_tex =
            CacheKey::new::<Position2Color>(Primitive::Triangles, Some(TextureId::new(0)), true);
        for k in [other_prim, other_blend, other_layout, other_tex] {
            assert!(!cache.accepts(&k, 1));
        }
        assert!(cache.accepts(&key, 1));
    }

    #[test]
    fn test_limit_forces_new_batch() {
        let mut cache = VertexCache::new(12 * 10);
        let key = shape_key();
        cache.rebind(key);
        cache.append::<Position2Color>(6);
        assert!(cache.accepts(&key, 4));
        assert!(!cache.accepts(&key, 5));
    }

    #[test]
    fn test_oversized_request_grows_arena() {
        let mut cache = VertexCache::new(16);
        let key = CacheKey::new::<Position2Tex2Color>(Primitive::Triangles, None, false);
        cache.rebind(key);
        let verts = cache.append::<Position2Tex2Color>(6);
        assert_eq!(verts.len(), 6);
        assert_eq!(cache.pending().unwrap().data.len(), 120);
    }

    #[test]
    fn test_reset_keeps_key() {
        let mut cache = VertexCache::new(1024);
        let key = shape_key();
        cache.rebind(key);
        cache.append::<Position2Color>(3);
        cache.reset();
        assert!(!cache.has_pending());
        assert!(cache.pending().is_none());
        assert!(cache.accepts(&key, 3));

        cache.clear();
        assert!(cache.key().is_none());
        assert!(!cache.accepts(&key, 3));
    }
}
