use std::num::NonZeroU32;

/// Handle to a node slot. `Option<NodeId>` is the same size as `NodeId`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct NodeId(NonZeroU32);

impl NodeId {
    pub(crate) const MAX: usize = (u32::MAX - 1) as usize;

    #[inline]
    fn from_index(index: usize) -> NodeId {
        if index > NodeId::MAX {
            panic!("NodeId::from_index(): index {} > NodeId::MAX", index);
        }
        match NonZeroU32::new((index + 1) as u32) {
            Some(raw) => NodeId(raw),
            None => unreachable!(),
        }
    }

    #[inline]
    fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Slot storage for tree nodes. Nodes are only ever added one at a time
/// and released all together, so there is no free list.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    live: usize,
}

impl<T> Arena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Arena<T> {
        Arena {
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn alloc(&mut self, item: T) -> NodeId {
        let id = NodeId::from_index(self.slots.len());
        self.slots.push(Some(item));
        self.live += 1;
        id
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        match self.slots.get(id.to_index()) {
            Some(Some(item)) => item,
            _ => panic!("Arena::get(): dangling {:?} ? Call the programmer", id),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        match self.slots.get_mut(id.to_index()) {
            Some(Some(item)) => item,
            _ => panic!("Arena::get_mut(): dangling {:?} ? Call the programmer", id),
        }
    }

    /// Vacate the slot, the slot itself is not reused until clear().
    pub(crate) fn take(&mut self, id: NodeId) -> T {
        match self.slots.get_mut(id.to_index()).and_then(|slot| slot.take()) {
            Some(item) => {
                self.live -= 1;
                item
            }
            None => panic!("Arena::take(): dangling {:?} ? Call the programmer", id),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::mem;

    use super::*;

    #[test]
    fn test_niche() {
        assert_eq!(mem::size_of::<NodeId>(), mem::size_of::<Option<NodeId>>());
        assert_eq!(mem::size_of::<NodeId>(), mem::size_of::<u32>());
    }

    #[test]
    fn test_handle() {
        for index in [0, 1, 1000, NodeId::MAX].iter() {
            assert_eq!(NodeId::from_index(*index).to_index(), *index);
        }
    }

    #[test]
    #[should_panic]
    fn test_handle_overflow() {
        NodeId::from_index(NodeId::MAX + 1);
    }

    #[test]
    fn test_alloc_take() {
        let mut arena: Arena<i64> = Arena::with_capacity(16);
        let ids: Vec<NodeId> = (0..10).map(|i| arena.alloc(i * 10)).collect();
        assert_eq!(arena.len(), 10);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(*arena.get(*id), (i as i64) * 10);
        }

        *arena.get_mut(ids[3]) = 333;
        assert_eq!(*arena.get(ids[3]), 333);

        assert_eq!(arena.take(ids[3]), 333);
        assert_eq!(arena.len(), 9);
        // slot is not reused
        let id = arena.alloc(11);
        assert_ne!(id, ids[3]);
        assert_eq!(arena.len(), 10);

        arena.clear();
        assert_eq!(arena.len(), 0);
    }

    #[test]
    #[should_panic]
    fn test_take_twice() {
        let mut arena: Arena<i64> = Arena::with_capacity(16);
        let id = arena.alloc(1);
        arena.take(id);
        arena.take(id);
    }

    #[test]
    #[should_panic]
    fn test_get_vacant() {
        let mut arena: Arena<i64> = Arena::with_capacity(16);
        let id = arena.alloc(1);
        arena.take(id);
        arena.get(id);
    }
}
