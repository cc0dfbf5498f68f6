use crate::entity::Entity;
use alloc::boxed::Box;
use alloc::vec::Vec;

/// Number of entries per sparse page.
pub(crate) const PAGE_SIZE: usize = 256 / core::mem::size_of::<Entity>();

/// Paged lookup half of a sparse set.
///
/// A present page holds, for every entity index in its range, the position of
/// that entity in the dense array packed together with the owner's version.
/// An absent page stands for a full page of null entries. Pages are allocated
/// lazily and never freed before the array is dropped.
pub struct SparseArray(Vec<Option<Box<[Entity; PAGE_SIZE]>>>);

impl SparseArray {
    #[inline]
    pub(crate) fn new() -> Self {
        SparseArray(Vec::new())
    }
    #[inline]
    pub(crate) fn allocate_at(&mut self, entity: Entity) {
        if entity.page() >= self.0.len() {
            self.0.resize(entity.page() + 1, None);
        }
        let page = &mut self.0[entity.page()];
        if page.is_none() {
            *page = Some(Box::new([Entity::null(); PAGE_SIZE]));
        }
    }
    /// Returns the raw slot for `entity`'s index, whatever its version.
    #[inline]
    pub(crate) fn get(&self, entity: Entity) -> Option<Entity> {
        self.0
            .get(entity.page())?
            .as_ref()
            .map(|page| page[entity.page_offset()])
    }
    /// Returns the dense position of `entity` if it is stored with a live
    /// slot matching its version.
    #[inline]
    pub(crate) fn dense_index_of(&self, entity: Entity) -> Option<usize> {
        self.get(entity).and_then(|slot| {
            if !slot.is_null() && slot.version() == entity.version() {
                Some(slot.uindex())
            } else {
                None
            }
        })
    }
    #[inline]
    pub(crate) fn contains(&self, entity: Entity) -> bool {
        self.dense_index_of(entity).is_some()
    }
    /// Points `entity`'s slot at a dense position. The page must exist.
    #[inline]
    pub(crate) fn set_index(&mut self, entity: Entity, index: usize) {
        debug_assert!(index < Entity::NULL_INDEX as usize);
        let page = self.0[entity.page()].as_mut().unwrap();
        page[entity.page_offset()] = Entity::from_parts(index as u32, entity.version());
    }
    #[inline]
    pub(crate) fn clear_at(&mut self, entity: Entity) {
        let page = self.0[entity.page()].as_mut().unwrap();
        page[entity.page_offset()] = Entity::null();
    }
}

#[test]
fn pages_are_lazy() {
    let mut sparse = SparseArray::new();
    let near = Entity::new(3);
    let far = Entity::new((PAGE_SIZE * 10) as u32);

    assert_eq!(sparse.get(near), None);
    assert_eq!(sparse.get(far), None);

    sparse.allocate_at(far);
    sparse.set_index(far, 0);

    assert_eq!(sparse.dense_index_of(far), Some(0));
    // the in-between pages stay unallocated
    assert_eq!(sparse.get(near), None);
}

#[test]
fn version_mismatch_is_absent() {
    let mut sparse = SparseArray::new();
    let entity = Entity::from_parts(5, 1);

    sparse.allocate_at(entity);
    sparse.set_index(entity, 7);

    assert_eq!(sparse.dense_index_of(entity), Some(7));
    assert_eq!(sparse.dense_index_of(Entity::from_parts(5, 2)), None);

    sparse.clear_at(entity);
    assert_eq!(sparse.dense_index_of(entity), None);
}
