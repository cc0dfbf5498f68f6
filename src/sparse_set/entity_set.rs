use super::SparseArray;
use crate::entity::Entity;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// Set of entities backed by a packed dense array and a paged sparse lookup.
///
/// Membership, insertion and removal are O(1). The dense order is
/// deterministic given the sequence of operations but is not insertion order:
/// removal moves the last element into the vacated slot.
///
/// Iteration walks the dense array back to front, the convention shared by
/// every pool-like iterator in this crate.
pub struct EntitySet {
    pub(crate) sparse: SparseArray,
    pub(crate) dense: Vec<Entity>,
}

impl Default for EntitySet {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitySet {
    #[inline]
    pub fn new() -> Self {
        EntitySet {
            sparse: SparseArray::new(),
            dense: Vec::new(),
        }
    }
    /// Returns the number of entities in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }
    /// Returns true if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }
    /// Returns `true` if `entity` is in the set.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.sparse.contains(entity)
    }
    /// Returns the dense position of `entity`.
    /// The position is only valid until the next structural change.
    #[inline]
    pub fn index_of(&self, entity: Entity) -> Option<usize> {
        self.sparse.dense_index_of(entity)
    }
    /// Returns the entity at a given dense position.
    #[inline]
    pub fn id_at(&self, index: usize) -> Option<Entity> {
        self.dense.get(index).copied()
    }
    /// Adds `entity` to the set.
    #[inline]
    pub fn insert(&mut self, entity: Entity) {
        debug_assert!(!entity.is_null());
        debug_assert!(!self.contains(entity));
        self.sparse.allocate_at(entity);
        self.sparse.set_index(entity, self.dense.len());
        self.dense.push(entity);
    }
    /// Adds every entity of `iter` to the set.
    pub fn extend(&mut self, iter: impl IntoIterator<Item = Entity>) {
        for entity in iter {
            self.insert(entity);
        }
    }
    /// Removes `entity`, returning the dense position it vacated so parallel
    /// arrays can mirror the swap-and-pop.
    #[inline]
    pub fn remove(&mut self, entity: Entity) -> Option<usize> {
        let index = self.index_of(entity)?;
        self.dense.swap_remove(index);
        if index < self.dense.len() {
            let moved = self.dense[index];
            self.sparse.set_index(moved, index);
        }
        self.sparse.clear_at(entity);
        Some(index)
    }
    /// Swaps the dense positions of two entities in the set.
    #[inline]
    pub fn swap(&mut self, a: Entity, b: Entity) {
        debug_assert!(self.contains(a));
        debug_assert!(self.contains(b));
        let index_a = self.index_of(a).unwrap();
        let index_b = self.index_of(b).unwrap();
        self.swap_indices(index_a, index_b);
    }
    #[inline]
    pub(crate) fn swap_indices(&mut self, a: usize, b: usize) {
        self.dense.swap(a, b);
        let entity_a = self.dense[a];
        let entity_b = self.dense[b];
        self.sparse.set_index(entity_a, a);
        self.sparse.set_index(entity_b, b);
    }
    /// Empties the dense array. Sparse pages are kept around.
    pub fn clear(&mut self) {
        for index in 0..self.dense.len() {
            let entity = self.dense[index];
            self.sparse.clear_at(entity);
        }
        self.dense.clear();
    }
    /// Reorders the set so that entities also present in `other` follow
    /// `other`'s iteration order, the rest trailing in unspecified order.
    ///
    /// Runs in O(len(other)) swaps but each swap is a sparse round-trip, so
    /// avoid calling it in a tight loop on large sets.
    pub fn respect(&mut self, other: &EntitySet) {
        let mut next = self.dense.len();
        for &entity in other.dense.iter().rev() {
            if next == 0 {
                break;
            }
            if let Some(index) = self.index_of(entity) {
                next -= 1;
                if entity != self.dense[next] {
                    self.swap_indices(next, index);
                }
            }
        }
    }
    /// Sorts the `[first, last)` dense subrange with `compare`.
    pub fn sort_range(
        &mut self,
        first: usize,
        last: usize,
        compare: impl FnMut(Entity, Entity) -> Ordering,
    ) {
        self.arrange(first, last, |_, _| {}, compare);
    }
    /// Sorts the `[first, last)` dense subrange with `compare`, invoking
    /// `apply` for every pairwise swap so derived pools can mirror the moves
    /// on their parallel data.
    pub fn arrange(
        &mut self,
        first: usize,
        last: usize,
        mut apply: impl FnMut(usize, usize),
        mut compare: impl FnMut(Entity, Entity) -> Ordering,
    ) {
        debug_assert!(first <= last && last <= self.dense.len());
        let mut order: Vec<usize> = (0..last - first).collect();
        order.sort_by(|&a, &b| compare(self.dense[first + a], self.dense[first + b]));
        apply_permutation(&order, |a, b| {
            self.swap_indices(first + a, first + b);
            apply(first + a, first + b);
        });
    }
    /// Iterates the set back to front.
    #[inline]
    pub fn iter(&self) -> EntitiesIter<'_> {
        EntitiesIter(self.dense.iter().rev())
    }
}

impl<'a> IntoIterator for &'a EntitySet {
    type Item = Entity;
    type IntoIter = EntitiesIter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Back-to-front iterator over the entities of a set.
pub struct EntitiesIter<'a>(core::iter::Rev<core::slice::Iter<'a, Entity>>);

impl Iterator for EntitiesIter<'_> {
    type Item = Entity;

    #[inline]
    fn next(&mut self) -> Option<Entity> {
        self.0.next().copied()
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for EntitiesIter<'_> {}

/// Reorders a slice-like structure in place, given `order[i]` = the current
/// position of the element that belongs at position `i`. Every move is a
/// pairwise swap handed to `swap` so parallel arrays can follow along.
pub(crate) fn apply_permutation(order: &[usize], mut swap: impl FnMut(usize, usize)) {
    for i in 0..order.len() {
        let mut source = order[i];
        // elements before i are already placed, chase where theirs moved to
        while source < i {
            source = order[source];
        }
        if source != i {
            swap(i, source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(indices: &[u32]) -> EntitySet {
        let mut set = EntitySet::new();
        set.extend(indices.iter().map(|&i| Entity::new(i)));
        set
    }

    #[test]
    fn insert_remove() {
        let mut set = set_of(&[0, 1, 2]);

        assert_eq!(set.len(), 3);
        assert!(set.contains(Entity::new(1)));
        assert_eq!(set.index_of(Entity::new(2)), Some(2));

        // swap-and-pop: the last entity backfills the hole
        assert_eq!(set.remove(Entity::new(0)), Some(0));
        assert_eq!(set.index_of(Entity::new(2)), Some(0));
        assert!(!set.contains(Entity::new(0)));
        assert_eq!(set.remove(Entity::new(0)), None);
    }

    #[test]
    fn back_pointers_hold() {
        let mut set = set_of(&[4, 9, 2, 7, 0]);
        set.remove(Entity::new(9));
        set.remove(Entity::new(4));
        set.insert(Entity::new(11));

        for (i, &entity) in set.dense.iter().enumerate() {
            assert_eq!(set.index_of(entity), Some(i));
        }
    }

    #[test]
    fn multiple_pages_then_clear() {
        let far = (crate::sparse_set::PAGE_SIZE * 3 + 5) as u32;
        let mut set = set_of(&[1, far]);

        assert!(set.contains(Entity::new(far)));

        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(Entity::new(1)));
        assert!(!set.contains(Entity::new(far)));

        // pages survive, reinsertion works
        set.insert(Entity::new(far));
        assert_eq!(set.index_of(Entity::new(far)), Some(0));
    }

    #[test]
    fn swap() {
        let mut set = set_of(&[3, 5]);
        set.swap(Entity::new(3), Entity::new(5));

        assert_eq!(set.index_of(Entity::new(3)), Some(1));
        assert_eq!(set.index_of(Entity::new(5)), Some(0));
    }

    #[test]
    fn respect_matches_other_order() {
        let mut set = set_of(&[0, 1, 2, 3, 4]);
        let other = set_of(&[3, 1]);

        set.respect(&other);

        // shared entities come out of iteration in `other`'s iteration order
        let shared: Vec<Entity> = set.iter().filter(|e| other.contains(*e)).collect();
        let expected: Vec<Entity> = other.iter().collect();
        assert_eq!(shared, expected);

        for (i, &entity) in set.dense.iter().enumerate() {
            assert_eq!(set.index_of(entity), Some(i));
        }
    }

    #[test]
    fn sort_range() {
        let mut set = set_of(&[4, 1, 3, 0, 2]);
        set.sort_range(0, 5, |a, b| a.index().cmp(&b.index()));

        let dense: Vec<u32> = set.dense.iter().map(|e| e.index()).collect();
        assert_eq!(dense, [0, 1, 2, 3, 4]);
        for (i, &entity) in set.dense.iter().enumerate() {
            assert_eq!(set.index_of(entity), Some(i));
        }
    }

    #[test]
    fn arrange_mirrors_swaps() {
        let mut set = set_of(&[2, 0, 1]);
        let mut mirror = alloc::vec![20usize, 0, 10];

        set.arrange(0, 3, |a, b| mirror.swap(a, b), |a, b| a.index().cmp(&b.index()));

        let dense: Vec<u32> = set.dense.iter().map(|e| e.index()).collect();
        assert_eq!(dense, [0, 1, 2]);
        assert_eq!(mirror, [0, 10, 20]);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut set = set_of(&[4, 1, 3, 0, 2]);
        set.sort_range(0, 5, |a, b| a.index().cmp(&b.index()));
        let once = set.dense.clone();
        set.sort_range(0, 5, |a, b| a.index().cmp(&b.index()));
        assert_eq!(set.dense, once);
    }
}
