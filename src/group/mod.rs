use crate::component::ComponentSet;
use crate::entity::Entity;
use crate::error;
use crate::registry::{AnyPool, PoolRecord, Registry};
use crate::sparse_set::{EntitiesIter, EntitySet};
use crate::type_id::TypeIdMap;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;
use core::cmp::Ordering;
use core::marker::PhantomData;

/// How a group keeps track of its members.
pub(crate) enum GroupKind {
    /// The first `len` slots of every owned pool are the members, identically
    /// ordered across pools.
    Owning { len: usize },
    /// Members are mirrored into a private entity set.
    NonOwning { handler: EntitySet },
}

/// Long-lived description of a group: which pools it owns, which it merely
/// observes, which exclude membership, plus its bookkeeping.
///
/// Records are kept sorted so that a group owning a superset of another's
/// pools comes first and reacts to changes before the nested one.
pub(crate) struct GroupRecord {
    pub(crate) owned: Box<[TypeId]>,
    pub(crate) get: Box<[TypeId]>,
    pub(crate) exclude: Box<[TypeId]>,
    pub(crate) kind: GroupKind,
}

impl GroupRecord {
    #[inline]
    pub(crate) fn owns(&self, type_id: TypeId) -> bool {
        self.owned.contains(&type_id)
    }
    fn observes(&self, type_id: TypeId) -> bool {
        self.owned.contains(&type_id) || self.get.contains(&type_id)
    }
    fn matches(&self, owned: &[TypeId], get: &[TypeId], exclude: &[TypeId]) -> bool {
        same_set(&self.owned, owned) && same_set(&self.get, get) && same_set(&self.exclude, exclude)
    }
    /// Membership predicate. `ignore` is the component type currently being
    /// destroyed: its destroy signal fires before the erasure, so it has to
    /// be skipped when it sits on the exclude side.
    fn satisfied(
        &self,
        pools: &[PoolRecord],
        pool_index: &TypeIdMap<usize>,
        entity: Entity,
        ignore: Option<TypeId>,
    ) -> bool {
        self.owned
            .iter()
            .chain(self.get.iter())
            .all(|&type_id| pool_contains(pools, pool_index, type_id, entity))
            && self.exclude.iter().all(|&type_id| {
                Some(type_id) == ignore || !pool_contains(pools, pool_index, type_id, entity)
            })
    }
    /// Admits `entity` if it now satisfies the predicate and is not already a
    /// member.
    fn try_admit(
        &mut self,
        pools: &mut [PoolRecord],
        pool_index: &TypeIdMap<usize>,
        entity: Entity,
        ignore: Option<TypeId>,
    ) {
        if !self.satisfied(pools, pool_index, entity, ignore) {
            return;
        }
        match &mut self.kind {
            GroupKind::Owning { len } => {
                let first = pool_index[&self.owned[0]];
                let position = pools[first].pool.index_of(entity).unwrap();
                if position < *len {
                    return;
                }
                for type_id in self.owned.iter() {
                    let pool = &mut pools[pool_index[type_id]].pool;
                    let position = pool.index_of(entity).unwrap();
                    pool.swap_at(*len, position);
                }
                *len += 1;
            }
            GroupKind::NonOwning { handler } => {
                if !handler.contains(entity) {
                    handler.insert(entity);
                }
            }
        }
    }
    /// Evicts `entity` if it is currently a member.
    fn evict(&mut self, pools: &mut [PoolRecord], pool_index: &TypeIdMap<usize>, entity: Entity) {
        match &mut self.kind {
            GroupKind::Owning { len } => {
                let first = pool_index[&self.owned[0]];
                let Some(position) = pools[first].pool.index_of(entity) else {
                    return;
                };
                if position >= *len {
                    return;
                }
                *len -= 1;
                for type_id in self.owned.iter() {
                    let pool = &mut pools[pool_index[type_id]].pool;
                    let position = pool.index_of(entity).unwrap();
                    pool.swap_at(*len, position);
                }
            }
            GroupKind::NonOwning { handler } => {
                handler.remove(entity);
            }
        }
    }
}

#[inline]
fn pool_contains(
    pools: &[PoolRecord],
    pool_index: &TypeIdMap<usize>,
    type_id: TypeId,
    entity: Entity,
) -> bool {
    pool_index
        .get(&type_id)
        .map_or(false, |&index| pools[index].pool.contains(entity))
}

fn same_set(a: &[TypeId], b: &[TypeId]) -> bool {
    a.len() == b.len() && a.iter().all(|type_id| b.contains(type_id))
}

fn shared(a: &[TypeId], b: &[TypeId]) -> usize {
    a.iter().filter(|type_id| b.contains(type_id)).count()
}

// The records are kept broadest membership first. Admissions have to walk
// them in that order and evictions in the opposite one: a nested group's
// member range sits inside its outer group's range, so entities enter
// through the outer boundary and leave through the inner one.

/// Updates every group after a component of `type_id` was added to `entity`.
/// The pool already reflects the change; user listeners have not run yet.
pub(crate) fn handle_construct(registry: &mut Registry, type_id: TypeId, entity: Entity) {
    let Registry {
        pools,
        pool_index,
        groups,
        ..
    } = registry;
    for record in groups.iter_mut().rev() {
        if record.exclude.contains(&type_id) {
            record.evict(pools, pool_index, entity);
        }
    }
    for record in groups.iter_mut() {
        if record.observes(type_id) {
            record.try_admit(pools, pool_index, entity, None);
        }
    }
}

/// Updates every group right before a component of `type_id` leaves
/// `entity`. The pool still holds the component.
pub(crate) fn handle_destroy(registry: &mut Registry, type_id: TypeId, entity: Entity) {
    let Registry {
        pools,
        pool_index,
        groups,
        ..
    } = registry;
    for record in groups.iter_mut().rev() {
        if record.observes(type_id) {
            record.evict(pools, pool_index, entity);
        }
    }
    for record in groups.iter_mut() {
        if record.exclude.contains(&type_id) {
            record.try_admit(pools, pool_index, entity, Some(type_id));
        }
    }
}

// Finds the existing record matching the description or creates it, and
// returns its position.
#[track_caller]
fn get_or_create(
    registry: &mut Registry,
    owned: Vec<TypeId>,
    get: Vec<TypeId>,
    exclude: Vec<TypeId>,
) -> usize {
    if owned.is_empty() && get.is_empty() {
        panic!("{:?}", error::Group::Empty);
    }
    if let Some(index) = registry
        .groups
        .iter()
        .position(|record| record.matches(&owned, &get, &exclude))
    {
        return index;
    }
    // groups reordering a common pool must be strictly nested: either
    // description fully contained in the other, nothing in between
    let size = owned.len() + get.len() + exclude.len();
    for record in registry.groups.iter() {
        let overlapping = shared(&record.owned, &owned);
        if overlapping == 0 {
            continue;
        }
        let common = overlapping
            + shared(&record.get, &get)
            + shared(&record.exclude, &exclude);
        let record_size = record.owned.len() + record.get.len() + record.exclude.len();
        if common != size && common != record_size {
            panic!("{:?}", error::Group::PartialOverlap);
        }
    }

    let kind = if owned.is_empty() {
        GroupKind::NonOwning {
            handler: EntitySet::new(),
        }
    } else {
        GroupKind::Owning { len: 0 }
    };
    let mut record = GroupRecord {
        owned: owned.clone().into_boxed_slice(),
        get: get.clone().into_boxed_slice(),
        exclude: exclude.clone().into_boxed_slice(),
        kind,
    };

    // seed the membership from the current pool contents
    let driver = record
        .owned
        .first()
        .or_else(|| record.get.first())
        .copied()
        .unwrap();
    let candidates: Vec<Entity> = {
        let index = registry.pool_index[&driver];
        registry.pools[index].pool.ids().dense.clone()
    };
    {
        let Registry {
            pools, pool_index, ..
        } = registry;
        for entity in candidates {
            record.try_admit(pools, pool_index, entity, None);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        owned = record.owned.len(),
        observed = record.get.len(),
        excluded = record.exclude.len(),
        "created group"
    );

    registry.groups.push(record);
    // fewer constraints means a broader membership: broadest first
    registry
        .groups
        .sort_by_key(|record| record.owned.len() + record.get.len() + record.exclude.len());
    registry
        .groups
        .iter()
        .position(|record| record.matches(&owned, &get, &exclude))
        .unwrap()
}

/// Handle over a group of entities, typed by its owned, observed and
/// excluded component tuples.
///
/// Owning groups iterate as a packed walk over the front of their owned
/// pools; non-owning groups drive iteration from their membership set.
pub struct Group<'a, O: ComponentSet, G: ComponentSet = (), X: ComponentSet = ()> {
    registry: &'a mut Registry,
    index: usize,
    _marker: PhantomData<(O, G, X)>,
}

impl<'a, O: ComponentSet, G: ComponentSet, X: ComponentSet> Group<'a, O, G, X> {
    #[track_caller]
    pub(crate) fn fetch(registry: &'a mut Registry) -> Self {
        O::assure(registry);
        G::assure(registry);
        X::assure(registry);

        let mut owned = Vec::new();
        O::type_ids(&mut owned);
        let mut get = Vec::new();
        G::type_ids(&mut get);
        let mut exclude = Vec::new();
        X::type_ids(&mut exclude);

        let index = get_or_create(registry, owned, get, exclude);
        Group {
            registry,
            index,
            _marker: PhantomData,
        }
    }
    fn record(&self) -> &GroupRecord {
        &self.registry.groups[self.index]
    }
    /// Returns the number of entities in the group.
    pub fn len(&self) -> usize {
        match &self.record().kind {
            GroupKind::Owning { len } => *len,
            GroupKind::NonOwning { handler } => handler.len(),
        }
    }
    /// Returns true if the group is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Returns `true` if `entity` belongs to the group.
    pub fn contains(&self, entity: Entity) -> bool {
        match &self.record().kind {
            GroupKind::Owning { len } => {
                let first = self.registry.pool_index[&self.record().owned[0]];
                self.registry.pools[first]
                    .pool
                    .index_of(entity)
                    .map_or(false, |position| position < *len)
            }
            GroupKind::NonOwning { handler } => handler.contains(entity),
        }
    }
    /// Iterates the group's entities back to front.
    pub fn iter(&self) -> GroupIter<'_> {
        match &self.record().kind {
            GroupKind::Owning { len } => {
                let first = self.registry.pool_index[&self.record().owned[0]];
                GroupIter {
                    inner: GroupIterInner::Owning {
                        pool: &*self.registry.pools[first].pool,
                        remaining: *len,
                    },
                }
            }
            GroupKind::NonOwning { handler } => GroupIter {
                inner: GroupIterInner::NonOwning(handler.iter()),
            },
        }
    }
    /// Visits every member with its owned and observed components.
    ///
    /// For owning groups the owned components are read by dense position,
    /// the packed walk the group exists for; observed components go through
    /// a sparse lookup.
    pub fn each(&self, mut f: impl FnMut(Entity, O::Refs<'_>, G::Refs<'_>)) {
        let registry = &*self.registry;
        match &self.record().kind {
            GroupKind::Owning { len } => {
                let first = registry.pool_index[&self.record().owned[0]];
                let pool = &registry.pools[first].pool;
                for position in (0..*len).rev() {
                    let entity = pool.id_at(position).unwrap();
                    f(
                        entity,
                        O::refs_at(registry, position),
                        G::refs(registry, entity).unwrap(),
                    );
                }
            }
            GroupKind::NonOwning { handler } => {
                for entity in handler.iter() {
                    f(
                        entity,
                        O::refs(registry, entity).unwrap(),
                        G::refs(registry, entity).unwrap(),
                    );
                }
            }
        }
    }
    /// Sorts the group's members with `compare`.
    ///
    /// Owning groups reorder the member range of every owned pool in
    /// lockstep; non-owning groups only reorder their membership set.
    pub fn sort_by(&mut self, mut compare: impl FnMut(Entity, Entity) -> Ordering) {
        let Registry {
            pools,
            pool_index,
            groups,
            ..
        } = &mut *self.registry;
        let record = &mut groups[self.index];
        match &mut record.kind {
            GroupKind::Owning { len } => {
                let first = pool_index[&record.owned[0]];
                let mut order: Vec<usize> = (0..*len).collect();
                order.sort_by(|&a, &b| {
                    compare(
                        pools[first].pool.id_at(a).unwrap(),
                        pools[first].pool.id_at(b).unwrap(),
                    )
                });
                crate::sparse_set::apply_permutation(&order, |a, b| {
                    for type_id in record.owned.iter() {
                        pools[pool_index[type_id]].pool.swap_at(a, b);
                    }
                });
            }
            GroupKind::NonOwning { handler } => {
                let len = handler.len();
                handler.sort_range(0, len, compare);
            }
        }
    }
    /// Reorders a non-owning group's membership set to follow pool `C`'s
    /// order.
    ///
    /// ### Panics
    ///
    /// - The group owns pools: their order belongs to the group itself, sort
    ///   with [`sort_by`](Group::sort_by) instead.
    #[track_caller]
    pub fn sort_as<C: 'static>(&mut self) {
        let Registry {
            pools,
            pool_index,
            groups,
            ..
        } = &mut *self.registry;
        let record = &mut groups[self.index];
        match &mut record.kind {
            GroupKind::Owning { .. } => panic!("{:?}", error::Group::NotOwning),
            GroupKind::NonOwning { handler } => {
                if let Some(&index) = pool_index.get(&TypeId::of::<C>()) {
                    handler.respect(pools[index].pool.ids());
                }
            }
        }
    }
}

/// Back-to-front iterator over a group's entities.
pub struct GroupIter<'a> {
    inner: GroupIterInner<'a>,
}

enum GroupIterInner<'a> {
    Owning {
        pool: &'a dyn AnyPool,
        remaining: usize,
    },
    NonOwning(EntitiesIter<'a>),
}

impl Iterator for GroupIter<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        match &mut self.inner {
            GroupIterInner::Owning { pool, remaining } => {
                if *remaining == 0 {
                    return None;
                }
                *remaining -= 1;
                pool.id_at(*remaining)
            }
            GroupIterInner::NonOwning(iter) => iter.next(),
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            GroupIterInner::Owning { remaining, .. } => (*remaining, Some(*remaining)),
            GroupIterInner::NonOwning(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for GroupIter<'_> {}
