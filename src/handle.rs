//!
//! Handle table shared by every resource kind.
//!
//! DxLib hands out small integer handles for graphs, fonts, sounds and so on,
//! and callers routinely hold on to handles after they were deleted. Slots
//! live in one growable array; each slot sits in exactly one doubly-linked
//! list, chosen by its [`HandleKind`]. The `None` list doubles as the free
//! list. Ids are never compacted, so an id stays valid across growth.
//!

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;

use crate::config::DEFAULT_HANDLE_CHUNK;

/// Observer cell set to `-1` when its slot is released.
pub type DeleteFlag = Rc<Cell<i32>>;

/// Resource kind a slot is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum HandleKind {
    /// Free slot.
    None = 0,
    Texture = 1,
    Graph = 2,
    Surface = 3,
    Font = 4,
    Sound = 5,
    File = 6,
    PlFile = 7,
    Framebuffer = 8,
    Renderbuffer = 9,
    VertexBuffer = 10,
    IndexBuffer = 11,
    Shader = 12,
    Misc = 13,
}

impl HandleKind {
    /// Number of kinds, including `None`.
    pub const COUNT: usize = 14;

    /// Create from the raw integer used by the C-style API.
    #[must_use]
    pub const fn from_raw(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::None,
            1 => Self::Texture,
            2 => Self::Graph,
            3 => Self::Surface,
            4 => Self::Font,
            5 => Self::Sound,
            6 => Self::File,
            7 => Self::PlFile,
            8 => Self::Framebuffer,
            9 => Self::Renderbuffer,
            10 => Self::VertexBuffer,
            11 => Self::IndexBuffer,
            12 => Self::Shader,
            13 => Self::Misc,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Errors from handle table operations that report failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("handle kind cannot be allocated")]
    InvalidKind,
    #[error("handle {0} is out of range")]
    OutOfRange(i32),
    #[error("handle {0} is not in use")]
    Unused(i32),
}

struct HandleSlot {
    data: Option<Box<dyn Any>>,
    delete_flag: Option<DeleteFlag>,
    kind: HandleKind,
    prev: i32,
    next: i32,
}

/// Slot allocator with per-kind intrusive lists.
pub struct HandleTable {
    slots: Vec<HandleSlot>,
    heads: [i32; HandleKind::COUNT],
    chunk: usize,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLE_CHUNK)
    }
}

impl HandleTable {
    /// Create an empty table that grows `chunk` slots at a time.
    #[must_use]
    pub fn new(chunk: usize) -> Self {
        Self {
            slots: Vec::new(),
            heads: [-1; HandleKind::COUNT],
            chunk: chunk.max(1),
        }
    }

    /// Total number of slots allocated so far.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn slot_index(&self, id: i32) -> Option<usize> {
        let index = usize::try_from(id).ok()?;
        (index < self.slots.len()).then_some(index)
    }

    fn enlarge(&mut self) {
        let first = self.slots.len();
        let n = first + self.chunk;
        log::debug!("Growing handle table from {} to {} slots", first, n);

        self.slots.reserve(self.chunk);
        for i in first..n {
            self.slots.push(HandleSlot {
                data: None,
                delete_flag: None,
                kind: HandleKind::None,
                prev: if i == first { -1 } else { i as i32 - 1 },
                next: if i + 1 == n { -1 } else { i as i32 + 1 },
            });
        }

        self.heads[HandleKind::None.index()] = first as i32;
    }

    fn unlink(&mut self, index: usize) {
        let (kind, prev, next) = {
            let slot = &self.slots[index];
            (slot.kind, slot.prev, slot.next)
        };

        if prev >= 0 {
            self.slots[prev as usize].next = next;
        } else if self.heads[kind.index()] == index as i32 {
            self.heads[kind.index()] = next;
        }
        if next >= 0 {
            self.slots[next as usize].prev = prev;
        }

        let slot = &mut self.slots[index];
        slot.prev = -1;
        slot.next = -1;
    }

    fn link(&mut self, index: usize) {
        let kind = self.slots[index].kind;
        let head = self.heads[kind.index()];

        self.slots[index].prev = -1;
        self.slots[index].next = head;
        if head >= 0 {
            self.slots[head as usize].prev = index as i32;
        }
        self.heads[kind.index()] = index as i32;
    }

    /// Take a free slot and tag it with `kind`.
    ///
    /// Returns `None` only for `HandleKind::None`; otherwise the table grows as needed.
    pub fn acquire_id(&mut self, kind: HandleKind) -> Option<i32> {
        if kind == HandleKind::None {
            return None;
        }

        if self.heads[HandleKind::None.index()] < 0 {
            self.enlarge();
        }
        let id = self.heads[HandleKind::None.index()];
        let index = id as usize;

        self.unlink(index);
        let slot = &mut self.slots[index];
        slot.kind = kind;
        slot.delete_flag = None;
        self.link(index);

        Some(id)
    }

    /// Return a slot to the free list.
    ///
    /// With `free_data` the payload is dropped; otherwise it is handed back.
    /// Out-of-range and already-free ids are ignored.
    pub fn release_id(&mut self, id: i32, free_data: bool) -> Option<Box<dyn Any>> {
        let index = self.slot_index(id)?;
        if self.slots[index].kind == HandleKind::None {
            return None;
        }

        let slot = &mut self.slots[index];
        let payload = slot.data.take();
        if let Some(flag) = slot.delete_flag.take() {
            flag.set(-1);
        }

        self.unlink(index);
        self.slots[index].kind = HandleKind::None;
        self.link(index);

        if free_data {
            None
        } else {
            payload
        }
    }

    /// Attach a payload to a slot, replacing any previous one.
    pub fn allocate_data<T: Any>(&mut self, id: i32, value: T) -> Option<&mut T> {
        let index = self.slot_index(id)?;
        let slot = &mut self.slots[index];
        slot.data = Some(Box::new(value));
        slot.data.as_mut()?.downcast_mut::<T>()
    }

    /// Payload of `id` if the slot is tagged `kind` and holds a `T`.
    #[must_use]
    pub fn get_data<T: Any>(&self, id: i32, kind: HandleKind) -> Option<&T> {
        let slot = &self.slots[self.slot_index(id)?];
        if slot.kind != kind {
            return None;
        }
        slot.data.as_ref()?.downcast_ref::<T>()
    }

    /// Mutable variant of [`HandleTable::get_data`].
    pub fn get_data_mut<T: Any>(&mut self, id: i32, kind: HandleKind) -> Option<&mut T> {
        let index = self.slot_index(id)?;
        let slot = &mut self.slots[index];
        if slot.kind != kind {
            return None;
        }
        slot.data.as_mut()?.downcast_mut::<T>()
    }

    /// Kind currently tagged on `id`.
    #[must_use]
    pub fn kind_of(&self, id: i32) -> Option<HandleKind> {
        self.slot_index(id).map(|index| self.slots[index].kind)
    }

    /// Most recently acquired id of `kind`.
    #[must_use]
    pub fn first_id_of(&self, kind: HandleKind) -> Option<i32> {
        let head = self.heads[kind.index()];
        (head >= 0).then_some(head)
    }

    #[must_use]
    pub fn next_id(&self, id: i32) -> Option<i32> {
        let next = self.slots[self.slot_index(id)?].next;
        (next >= 0).then_some(next)
    }

    #[must_use]
    pub fn prev_id(&self, id: i32) -> Option<i32> {
        let prev = self.slots[self.slot_index(id)?].prev;
        (prev >= 0).then_some(prev)
    }

    /// Iterate the ids currently tagged `kind`, newest first.
    pub fn ids_of(&self, kind: HandleKind) -> KindIds<'_> {
        KindIds {
            table: self,
            cursor: self.first_id_of(kind),
        }
    }

    #[must_use]
    pub fn count_of(&self, kind: HandleKind) -> usize {
        self.ids_of(kind).count()
    }

    /// Exchange the contents of two slots, keeping ids and list membership consistent.
    pub fn swap_handle_ids(&mut self, a: i32, b: i32) -> Result<(), HandleError> {
        let ia = self.slot_index(a).ok_or(HandleError::OutOfRange(a))?;
        let ib = self.slot_index(b).ok_or(HandleError::OutOfRange(b))?;
        if ia == ib {
            return Ok(());
        }

        self.unlink(ia);
        self.unlink(ib);

        let data_a = self.slots[ia].data.take();
        let flag_a = self.slots[ia].delete_flag.take();
        let kind_a = self.slots[ia].kind;

        let data_b = self.slots[ib].data.take();
        let flag_b = self.slots[ib].delete_flag.take();
        let kind_b = self.slots[ib].kind;

        let slot = &mut self.slots[ia];
        slot.data = data_b;
        slot.delete_flag = flag_b;
        slot.kind = kind_b;

        let slot = &mut self.slots[ib];
        slot.data = data_a;
        slot.delete_flag = flag_a;
        slot.kind = kind_a;

        self.link(ia);
        self.link(ib);
        Ok(())
    }

    /// Register an observer that is set to `-1` when `id` is released.
    ///
    /// Only one observer is kept per slot; the last registration wins.
    pub fn set_delete_flag(&mut self, id: i32, flag: DeleteFlag) -> Result<(), HandleError> {
        let index = self.slot_index(id).ok_or(HandleError::OutOfRange(id))?;
        let slot = &mut self.slots[index];
        if slot.kind == HandleKind::None {
            return Err(HandleError::Unused(id));
        }
        slot.delete_flag = Some(flag);
        Ok(())
    }

    /// Drop every slot and payload.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.heads = [-1; HandleKind::COUNT];
    }
}

/// Iterator over one kind's list.
pub struct KindIds<'a> {
    table: &'a HandleTable,
    cursor: Option<i32>,
}

impl Iterator for KindIds<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        let id = self.cursor?;
        self.cursor = self.table.next_id(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[derive(Debug, PartialEq)]
    struct Payload(u32);

    #[test]
    fn test_acquire_none_kind_fails() {
        let mut table = HandleTable::default();
        assert_eq!(table.acquire_id(HandleKind::None), None);
        assert_eq!(table.capacity(), 0);
    }

    #[test]
    fn test_first_acquire_grows_by_chunk() {
        let mut table = HandleTable::default();
        assert_eq!(table.acquire_id(HandleKind::Graph), Some(0));
        assert_eq!(table.acquire_id(HandleKind::Graph), Some(1));
        assert_eq!(table.capacity(), 512);
    }

    #[test]
    fn test_growth_keeps_existing_ids() {
        let mut table = HandleTable::new(4);
        let ids: Vec<i32> = (0..4)
            .map(|n| {
                let id = table.acquire_id(HandleKind::Texture).unwrap();
                table.allocate_data(id, Payload(n));
                id
            })
            .collect();
        assert_eq!(table.capacity(), 4);

        let extra = table.acquire_id(HandleKind::Texture).unwrap();
        assert_eq!(extra, 4);
        assert_eq!(table.capacity(), 8);
        for (n, id) in ids.iter().enumerate() {
            assert_eq!(
                table.get_data::<Payload>(*id, HandleKind::Texture),
                Some(&Payload(n as u32))
            );
        }
    }

    #[test]
    fn test_released_id_is_reused_first() {
        let mut table = HandleTable::default();
        let a = table.acquire_id(HandleKind::Sound).unwrap();
        let _b = table.acquire_id(HandleKind::Sound).unwrap();
        table.release_id(a, true);
        assert_eq!(table.acquire_id(HandleKind::Font), Some(a));
        assert_eq!(table.kind_of(a), Some(HandleKind::Font));
    }

    #[test]
    fn test_release_out_of_range_is_noop() {
        let mut table = HandleTable::default();
        let id = table.acquire_id(HandleKind::Graph).unwrap();
        assert!(table.release_id(-1, true).is_none());
        assert!(table.release_id(100_000, true).is_none());
        assert_eq!(table.kind_of(id), Some(HandleKind::Graph));
    }

    #[test]
    fn test_release_without_free_returns_payload() {
        let mut table = HandleTable::default();
        let id = table.acquire_id(HandleKind::Misc).unwrap();
        table.allocate_data(id, Payload(7));
        let payload = table.release_id(id, false).unwrap();
        assert_eq!(payload.downcast_ref::<Payload>(), Some(&Payload(7)));
        assert!(table.get_data::<Payload>(id, HandleKind::Misc).is_none());
        assert!(table.release_id(id, false).is_none());
    }

    #[test]
    fn test_get_data_checks_kind_and_type() {
        let mut table = HandleTable::default();
        let id = table.acquire_id(HandleKind::Graph).unwrap();
        table.allocate_data(id, Payload(3));
        assert!(table.get_data::<Payload>(id, HandleKind::Graph).is_some());
        assert!(table.get_data::<Payload>(id, HandleKind::Texture).is_none());
        assert!(table.get_data::<String>(id, HandleKind::Graph).is_none());
        assert!(table.get_data::<Payload>(-1, HandleKind::Graph).is_none());
    }

    #[test]
    fn test_delete_flag_signalled_on_release() {
        let mut table = HandleTable::default();
        let id = table.acquire_id(HandleKind::Font).unwrap();
        let first: DeleteFlag = Rc::new(Cell::new(0));
        let second: DeleteFlag = Rc::new(Cell::new(0));
        table.set_delete_flag(id, first.clone()).unwrap();
        table.set_delete_flag(id, second.clone()).unwrap();
        table.release_id(id, true);
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), -1);
        assert_eq!(
            table.set_delete_flag(id, first),
            Err(HandleError::Unused(id))
        );
    }

    #[test]
    fn test_kind_iteration() {
        let mut table = HandleTable::default();
        let g1 = table.acquire_id(HandleKind::Graph).unwrap();
        let _t = table.acquire_id(HandleKind::Texture).unwrap();
        let g2 = table.acquire_id(HandleKind::Graph).unwrap();
        let g3 = table.acquire_id(HandleKind::Graph).unwrap();

        let graphs: Vec<i32> = table.ids_of(HandleKind::Graph).collect();
        assert_eq!(graphs, vec![g3, g2, g1]);
        assert_eq!(table.prev_id(g2), Some(g3));
        assert_eq!(table.next_id(g1), None);

        table.release_id(g2, true);
        let graphs: Vec<i32> = table.ids_of(HandleKind::Graph).collect();
        assert_eq!(graphs, vec![g3, g1]);
        assert_eq!(table.count_of(HandleKind::Texture), 1);
    }

    #[test]
    fn test_swap_keeps_lists_consistent() {
        let mut table = HandleTable::default();
        let a = table.acquire_id(HandleKind::Graph).unwrap();
        let b = table.acquire_id(HandleKind::Graph).unwrap();
        let c = table.acquire_id(HandleKind::Texture).unwrap();
        table.allocate_data(a, Payload(1));
        table.allocate_data(c, Payload(3));

        table.swap_handle_ids(a, c).unwrap();
        assert_eq!(table.kind_of(a), Some(HandleKind::Texture));
        assert_eq!(table.kind_of(c), Some(HandleKind::Graph));
        assert_eq!(
            table.get_data::<Payload>(a, HandleKind::Texture),
            Some(&Payload(3))
        );

        let mut graphs: Vec<i32> = table.ids_of(HandleKind::Graph).collect();
        graphs.sort_unstable();
        assert_eq!(graphs, vec![b, c]);
        assert_eq!(table.ids_of(HandleKind::Texture).collect::<Vec<_>>(), vec![a]);
        assert!(table.swap_handle_ids(a, 9999).is_err());
    }

    proptest! {
        #[test]
        fn prop_acquired_ids_are_unique(kinds in prop::collection::vec(1i32..14, 1..1200)) {
            let mut table = HandleTable::default();
            let mut seen = HashSet::new();
            for raw in kinds {
                let kind = HandleKind::from_raw(raw).unwrap();
                let id = table.acquire_id(kind).unwrap();
                prop_assert!(seen.insert(id));
                prop_assert_eq!(table.kind_of(id), Some(kind));
            }
        }

        #[test]
        fn prop_get_data_is_kind_isolated(ops in prop::collection::vec((1i32..14, any::<bool>()), 1..200)) {
            let mut table = HandleTable::new(16);
            let mut live: Vec<(i32, HandleKind)> = Vec::new();
            for (raw, release) in ops {
                let kind = HandleKind::from_raw(raw).unwrap();
                let id = table.acquire_id(kind).unwrap();
                table.allocate_data(id, Payload(id as u32));
                if release {
                    table.release_id(id, true);
                } else {
                    live.push((id, kind));
                }
            }
            for id in 0..table.capacity() as i32 {
                for raw in 0..14 {
                    let kind = HandleKind::from_raw(raw).unwrap();
                    let expected = live.iter().any(|&(l, k)| l == id && k == kind);
                    prop_assert_eq!(table.get_data::<Payload>(id, kind).is_some(), expected);
                }
            }
        }
    }
}
