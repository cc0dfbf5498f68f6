mod borrow;
mod entities;
mod pool;

pub use borrow::MultiStorage;

pub(crate) use pool::{AnyPool, PoolRecord, SignalKind};

use crate::component::ComponentSet;
use crate::entity::Entity;
use crate::error;
use crate::group::{self, GroupRecord};
use crate::handle::Handle;
use crate::observer::{Collector, Observer};
use crate::runtime_view::RuntimeView;
use crate::signal::Sink;
use crate::sparse_set::SparseSet;
use crate::type_id::TypeIdMap;
use crate::view::{ExcludeTuple, View, ViewTuple};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{type_name, Any, TypeId};
use core::cmp::Ordering;
use entities::Entities;

/// `Registry` owns the entities and every component pool, and ties them to
/// the machinery observing them: change signals, groups and observers.
///
/// Pools are created lazily the first time a component type is used and live
/// as long as the registry. A registry is single-threaded by design, there is
/// no internal synchronization; distinct registries are fully independent.
pub struct Registry {
    pub(crate) entities: Entities,
    pub(crate) pools: Vec<PoolRecord>,
    pub(crate) pool_index: TypeIdMap<usize>,
    pub(crate) groups: Vec<GroupRecord>,
    pub(crate) vars: TypeIdMap<Box<dyn Any>>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            entities: Entities::new(),
            pools: Vec::new(),
            pool_index: TypeIdMap::default(),
            groups: Vec::new(),
            vars: TypeIdMap::default(),
        }
    }
}

impl Registry {
    /// Creates an empty `Registry`.
    pub fn new() -> Registry {
        Default::default()
    }

    /// Creates a new entity, recycling a destroyed index when one is
    /// available.
    ///
    /// ### Example
    /// ```
    /// use rivet::Registry;
    ///
    /// let mut registry = Registry::new();
    ///
    /// let entity = registry.create();
    /// assert!(registry.valid(entity));
    /// ```
    #[inline]
    pub fn create(&mut self) -> Entity {
        self.entities.create()
    }
    /// Creates the requested identifier if its index is free.
    ///
    /// When the index is already in use the hint is **not** honored and a
    /// plain [`create`](Registry::create) happens instead. A hint past the
    /// current capacity grows the entity slab, every in-between index
    /// becoming recyclable.
    #[inline]
    pub fn create_hint(&mut self, hint: Entity) -> Entity {
        self.entities.create_hint(hint)
    }
    /// Destroys an entity: removes every component it holds, firing the
    /// destroy signals, then recycles its index with a bumped version.
    ///
    /// ### Panics
    ///
    /// - `entity` is not alive.
    #[track_caller]
    pub fn destroy(&mut self, entity: Entity) {
        if !self.valid(entity) {
            panic!("{:?}", error::DeadEntity { id: entity });
        }
        self.remove_all(entity);
        self.entities.destroy(entity, None);
    }
    /// Same as [`destroy`](Registry::destroy) but the recycled slot gets the
    /// caller-supplied version instead of the bumped one.
    #[track_caller]
    pub fn destroy_with_version(&mut self, entity: Entity, version: u32) {
        if !self.valid(entity) {
            panic!("{:?}", error::DeadEntity { id: entity });
        }
        self.remove_all(entity);
        self.entities.destroy(entity, Some(version));
    }
    /// Returns `true` if `entity` matches a living entity.
    #[inline]
    pub fn valid(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }
    /// Returns the version currently associated with an index.
    #[inline]
    pub fn current(&self, index: u32) -> Option<u32> {
        self.entities.current(index)
    }
    /// Returns the number of living entities.
    #[inline]
    pub fn alive(&self) -> usize {
        self.entities.alive()
    }
    /// Visits every living entity.
    pub fn each_entity(&self, mut f: impl FnMut(Entity)) {
        for entity in self.entities.iter() {
            f(entity);
        }
    }
    /// Destroys every living entity, signals included.
    pub fn clear(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(entities = self.alive(), "clearing registry");
        let living: Vec<Entity> = self.entities.iter().collect();
        for entity in living {
            self.destroy(entity);
        }
    }

    /// Adds `component` to `entity` and raises the construct signal.
    ///
    /// ### Panics
    ///
    /// - `entity` is not alive.
    /// - `entity` already has a component of this type, use
    ///   [`insert_or_replace`](Registry::insert_or_replace) to overwrite.
    ///
    /// ### Example
    /// ```
    /// use rivet::Registry;
    ///
    /// let mut registry = Registry::new();
    ///
    /// let entity = registry.create();
    /// registry.insert(entity, 7u32);
    /// assert_eq!(registry.get::<u32>(entity), &7);
    /// ```
    #[track_caller]
    pub fn insert<C: 'static>(&mut self, entity: Entity, component: C) {
        if !self.valid(entity) {
            panic!("{:?}", error::DeadEntity { id: entity });
        }
        let index = self.assure::<C>();
        let pool = self.pools[index]
            .pool
            .as_any_mut()
            .downcast_mut::<SparseSet<C>>()
            .unwrap();
        if pool.contains(entity) {
            panic!(
                "{:?}",
                error::AlreadyPresent {
                    id: entity,
                    name: type_name::<C>(),
                }
            );
        }
        pool.insert(entity, component);
        group::handle_construct(self, TypeId::of::<C>(), entity);
        self.emit(index, SignalKind::Construct, entity);
    }
    /// Adds `component` to every entity of `entities`.
    #[track_caller]
    pub fn insert_many<C: Clone + 'static>(
        &mut self,
        entities: impl IntoIterator<Item = Entity>,
        component: C,
    ) {
        for entity in entities {
            self.insert(entity, component.clone());
        }
    }
    /// Adds one `(entity, component)` pair after the other.
    #[track_caller]
    pub fn insert_from<C: 'static>(&mut self, pairs: impl IntoIterator<Item = (Entity, C)>) {
        for (entity, component) in pairs {
            self.insert(entity, component);
        }
    }
    /// Adds or overwrites `entity`'s component, raising the construct or the
    /// update signal accordingly. Returns the previous component if any.
    #[track_caller]
    pub fn insert_or_replace<C: 'static>(&mut self, entity: Entity, component: C) -> Option<C> {
        if self.contains::<C>(entity) {
            Some(self.replace(entity, component))
        } else {
            self.insert(entity, component);
            None
        }
    }
    /// Overwrites `entity`'s component and raises the update signal,
    /// returning the previous value.
    ///
    /// ### Panics
    ///
    /// - `entity` does not have a component of this type.
    #[track_caller]
    pub fn replace<C: 'static>(&mut self, entity: Entity, component: C) -> C {
        let index = self.pool_of::<C>(entity);
        let pool = self.pools[index]
            .pool
            .as_any_mut()
            .downcast_mut::<SparseSet<C>>()
            .unwrap();
        let old = core::mem::replace(pool.get_mut(entity).unwrap(), component);
        self.emit(index, SignalKind::Update, entity);
        old
    }
    /// Applies `f` to `entity`'s component in place, then raises the update
    /// signal.
    ///
    /// ### Panics
    ///
    /// - `entity` does not have a component of this type.
    #[track_caller]
    pub fn patch<C: 'static, F: FnOnce(&mut C)>(&mut self, entity: Entity, f: F) {
        let index = self.pool_of::<C>(entity);
        let pool = self.pools[index]
            .pool
            .as_any_mut()
            .downcast_mut::<SparseSet<C>>()
            .unwrap();
        f(pool.get_mut(entity).unwrap());
        self.emit(index, SignalKind::Update, entity);
    }
    /// Removes `entity`'s component and returns it. The destroy signal fires
    /// **before** the erasure, listeners can still read the component.
    ///
    /// ### Panics
    ///
    /// - `entity` does not have a component of this type, use
    ///   [`remove_if_exists`](Registry::remove_if_exists) for the
    ///   best-effort flavor.
    #[track_caller]
    pub fn remove<C: 'static>(&mut self, entity: Entity) -> C {
        let index = self.pool_of::<C>(entity);
        group::handle_destroy(self, TypeId::of::<C>(), entity);
        self.emit(index, SignalKind::Destroy, entity);
        self.pools[index]
            .pool
            .as_any_mut()
            .downcast_mut::<SparseSet<C>>()
            .unwrap()
            .remove(entity)
            .unwrap()
    }
    /// Removes the components of `S` that `entity` actually has, returning
    /// how many were removed.
    pub fn remove_if_exists<S: ComponentSet>(&mut self, entity: Entity) -> usize {
        let mut type_ids = Vec::new();
        S::type_ids(&mut type_ids);
        let mut count = 0;
        for type_id in type_ids {
            count += usize::from(self.erase_one(type_id, entity));
        }
        count
    }
    /// Removes every component `entity` holds, sweeping the pools in reverse
    /// creation order.
    ///
    /// Destroy listeners may add components while the sweep runs; re-adding
    /// a component of an already swept type leaves it on the otherwise
    /// stripped entity, the result is unspecified.
    pub fn remove_all(&mut self, entity: Entity) {
        for index in (0..self.pools.len()).rev() {
            let type_id = self.pools[index].type_id;
            self.erase_one(type_id, entity);
        }
    }
    fn erase_one(&mut self, type_id: TypeId, entity: Entity) -> bool {
        let Some(index) = self.pool_id(type_id) else {
            return false;
        };
        if !self.pools[index].pool.contains(entity) {
            return false;
        }
        group::handle_destroy(self, type_id, entity);
        self.emit(index, SignalKind::Destroy, entity);
        self.pools[index].pool.erase(entity)
    }

    /// Returns `true` if `entity` holds no component at all.
    pub fn orphan(&self, entity: Entity) -> bool {
        !self
            .pools
            .iter()
            .any(|record| record.pool.contains(entity))
    }
    /// Returns `true` if `entity` has a component of type `C`.
    #[inline]
    pub fn contains<C: 'static>(&self, entity: Entity) -> bool {
        self.storage::<C>()
            .map_or(false, |pool| pool.contains(entity))
    }
    /// Returns `true` if `entity` has every component of the set.
    #[inline]
    pub fn contains_all<S: ComponentSet>(&self, entity: Entity) -> bool {
        S::refs(self, entity).is_some()
    }
    /// Returns `true` if `entity` has at least one component of the set.
    pub fn contains_any<S: ComponentSet>(&self, entity: Entity) -> bool {
        let mut type_ids = Vec::new();
        S::type_ids(&mut type_ids);
        type_ids
            .iter()
            .any(|&type_id| self.contains_id(type_id, entity))
    }
    /// Returns a reference to `entity`'s component.
    ///
    /// ### Panics
    ///
    /// - `entity` does not have a component of this type, use
    ///   [`try_get`](Registry::try_get) when absence is expected.
    #[track_caller]
    pub fn get<C: 'static>(&self, entity: Entity) -> &C {
        match self.try_get::<C>(entity) {
            Some(component) => component,
            None => panic!(
                "{:?}",
                error::MissingComponent {
                    id: entity,
                    name: type_name::<C>(),
                }
            ),
        }
    }
    /// Returns a reference to `entity`'s component if it has one.
    #[inline]
    pub fn try_get<C: 'static>(&self, entity: Entity) -> Option<&C> {
        self.storage::<C>()?.get(entity)
    }
    /// Returns a mutable reference to `entity`'s component.
    ///
    /// Mutating through it does not raise the update signal, use
    /// [`patch`](Registry::patch) when listeners matter.
    ///
    /// ### Panics
    ///
    /// - `entity` does not have a component of this type.
    #[track_caller]
    pub fn get_mut<C: 'static>(&mut self, entity: Entity) -> &mut C {
        match self.try_get_mut::<C>(entity) {
            Some(component) => component,
            None => panic!(
                "{:?}",
                error::MissingComponent {
                    id: entity,
                    name: type_name::<C>(),
                }
            ),
        }
    }
    /// Returns a mutable reference to `entity`'s component if it has one.
    pub fn try_get_mut<C: 'static>(&mut self, entity: Entity) -> Option<&mut C> {
        let index = self.pool_id(TypeId::of::<C>())?;
        self.pools[index]
            .pool
            .as_any_mut()
            .downcast_mut::<SparseSet<C>>()
            .unwrap()
            .get_mut(entity)
    }
    /// Looks up every component of the set for `entity`.
    #[inline]
    pub fn try_get_all<S: ComponentSet>(&self, entity: Entity) -> Option<S::Refs<'_>> {
        S::refs(self, entity)
    }
    /// Returns `entity`'s component, inserting the one made by `f` first if
    /// the entity has none.
    #[track_caller]
    pub fn get_or_insert_with<C: 'static, F: FnOnce() -> C>(
        &mut self,
        entity: Entity,
        f: F,
    ) -> &mut C {
        if !self.contains::<C>(entity) {
            self.insert(entity, f());
        }
        self.get_mut(entity)
    }

    /// Returns the sink of the signal raised after a `C` was added to an
    /// entity, with the pool in its new state.
    pub fn on_construct<C: 'static>(&mut self) -> Sink<'_, Registry> {
        let index = self.assure::<C>();
        self.pools[index].on_construct.sink()
    }
    /// Returns the sink of the signal raised after a `C` was replaced or
    /// patched.
    pub fn on_update<C: 'static>(&mut self) -> Sink<'_, Registry> {
        let index = self.assure::<C>();
        self.pools[index].on_update.sink()
    }
    /// Returns the sink of the signal raised right before a `C` is removed:
    /// listeners still observe the component.
    pub fn on_destroy<C: 'static>(&mut self) -> Sink<'_, Registry> {
        let index = self.assure::<C>();
        self.pools[index].on_destroy.sink()
    }

    /// Returns `C`'s storage if the type was ever used.
    ///
    /// The storage hands out component reads and value mutation; structural
    /// changes always go through the registry so signals and groups stay in
    /// sync.
    #[inline]
    pub fn storage<C: 'static>(&self) -> Option<&SparseSet<C>> {
        let index = self.pool_id(TypeId::of::<C>())?;
        Some(
            self.pools[index]
                .pool
                .as_any()
                .downcast_ref::<SparseSet<C>>()
                .unwrap(),
        )
    }
    /// Returns `C`'s storage, creating it if the type was never used.
    pub fn storage_mut<C: 'static>(&mut self) -> &mut SparseSet<C> {
        let index = self.assure::<C>();
        self.pools[index]
            .pool
            .as_any_mut()
            .downcast_mut::<SparseSet<C>>()
            .unwrap()
    }
    /// Mutably borrows several storages at once, for zip-style iteration.
    ///
    /// ### Example
    /// ```
    /// use rivet::Registry;
    ///
    /// let mut registry = Registry::new();
    /// let entity = registry.create();
    /// registry.insert(entity, 1.0f32);
    /// registry.insert(entity, 2u32);
    ///
    /// let (floats, ints) = registry.storages_mut::<(f32, u32)>();
    /// for (entity, value) in floats.iter_mut() {
    ///     if let Some(offset) = ints.get(entity) {
    ///         *value += *offset as f32;
    ///     }
    /// }
    /// ```
    ///
    /// ### Panics
    ///
    /// - Two component types of the tuple are the same.
    pub fn storages_mut<S: MultiStorage>(&mut self) -> S::Out<'_> {
        S::fetch(self)
    }

    /// Returns a view over the entities holding every component of `I`.
    ///
    /// The view is recomputed from the pools on demand and borrows the
    /// registry for as long as it lives. A component type never used yields
    /// an empty view.
    pub fn view<I: ViewTuple>(&self) -> View<'_, I, ()> {
        View::new(self)
    }
    /// Returns a view over the entities holding every component of `I` and
    /// none of `X`.
    ///
    /// ### Example
    /// ```
    /// use rivet::Registry;
    ///
    /// struct Tag;
    ///
    /// let mut registry = Registry::new();
    /// let entity = registry.create();
    /// registry.insert(entity, 7u32);
    ///
    /// let tagged = registry.create();
    /// registry.insert(tagged, 8u32);
    /// registry.insert(tagged, Tag);
    ///
    /// let view = registry.view_filtered::<(u32,), (Tag,)>();
    /// assert_eq!(view.iter().collect::<Vec<_>>(), vec![entity]);
    /// ```
    pub fn view_filtered<I: ViewTuple, X: ExcludeTuple>(&self) -> View<'_, I, X> {
        View::new(self)
    }
    /// Returns a view driven by runtime lists of component type ids instead
    /// of a compile-time tuple. It only yields entities, components are
    /// fetched separately.
    ///
    /// ### Panics
    ///
    /// - `include` is empty.
    #[track_caller]
    pub fn runtime_view(&self, include: &[TypeId], exclude: &[TypeId]) -> RuntimeView<'_> {
        RuntimeView::new(self, include, exclude)
    }
    /// Returns the group over `Owned`, `Get` and `Exclude`, creating it on
    /// first request. Creation is idempotent: an identical description hands
    /// back the existing group.
    ///
    /// With a non-empty `Owned` the group physically reorders those pools so
    /// members sit packed at their front; with an empty `Owned` it maintains
    /// a membership set on the side.
    ///
    /// ### Panics
    ///
    /// - Every list is empty.
    /// - `Owned` partially overlaps the owned components of an existing
    ///   group: overlapping groups must be strictly nested.
    #[track_caller]
    pub fn group<O, G, X>(&mut self) -> crate::group::Group<'_, O, G, X>
    where
        O: ComponentSet,
        G: ComponentSet,
        X: ComponentSet,
    {
        crate::group::Group::fetch(self)
    }
    /// Returns `true` if `C`'s pool can be sorted, i.e. no group owns it.
    pub fn sortable<C: 'static>(&self) -> bool {
        let type_id = TypeId::of::<C>();
        !self.groups.iter().any(|record| record.owns(type_id))
    }
    /// Sorts `C`'s pool comparing components.
    ///
    /// ### Panics
    ///
    /// - `C` is owned by a group, check [`sortable`](Registry::sortable).
    #[track_caller]
    pub fn sort_by<C: 'static, F: FnMut(&C, &C) -> Ordering>(&mut self, compare: F) {
        if !self.sortable::<C>() {
            panic!("{:?}", error::Group::OwnedSort(type_name::<C>()));
        }
        if let Some(index) = self.pool_id(TypeId::of::<C>()) {
            self.pools[index]
                .pool
                .as_any_mut()
                .downcast_mut::<SparseSet<C>>()
                .unwrap()
                .sort_by(compare);
        }
    }
    /// Sorts `C`'s pool comparing entities.
    ///
    /// ### Panics
    ///
    /// - `C` is owned by a group, check [`sortable`](Registry::sortable).
    #[track_caller]
    pub fn sort_by_id<C: 'static, F: FnMut(Entity, Entity) -> Ordering>(&mut self, compare: F) {
        if !self.sortable::<C>() {
            panic!("{:?}", error::Group::OwnedSort(type_name::<C>()));
        }
        if let Some(index) = self.pool_id(TypeId::of::<C>()) {
            self.pools[index]
                .pool
                .as_any_mut()
                .downcast_mut::<SparseSet<C>>()
                .unwrap()
                .sort_by_id(compare);
        }
    }
    /// Builds an observer out of `collector`'s matchers and connects it to
    /// the relevant signals.
    ///
    /// ### Panics
    ///
    /// - The collector holds more than 31 matchers.
    #[track_caller]
    pub fn observe(&mut self, collector: Collector) -> Observer {
        Observer::connect(self, collector)
    }
    /// Wraps an entity and this registry into a single handle forwarding
    /// component operations.
    pub fn handle(&mut self, entity: Entity) -> Handle<'_> {
        Handle::new(self, entity)
    }

    /// Sets the context variable of type `T`, replacing the previous one if
    /// any.
    ///
    /// Context variables are per-registry singletons looked up by type.
    pub fn set_ctx<T: 'static>(&mut self, value: T) {
        self.vars.insert(TypeId::of::<T>(), Box::new(value));
    }
    /// Returns the context variable of type `T`.
    ///
    /// ### Panics
    ///
    /// - No `T` was set.
    #[track_caller]
    pub fn ctx<T: 'static>(&self) -> &T {
        match self.try_ctx::<T>() {
            Some(value) => value,
            None => panic!(
                "{:?}",
                error::MissingContext {
                    name: type_name::<T>(),
                }
            ),
        }
    }
    /// Returns the context variable of type `T` mutably.
    ///
    /// ### Panics
    ///
    /// - No `T` was set.
    #[track_caller]
    pub fn ctx_mut<T: 'static>(&mut self) -> &mut T {
        match self.try_ctx_mut::<T>() {
            Some(value) => value,
            None => panic!(
                "{:?}",
                error::MissingContext {
                    name: type_name::<T>(),
                }
            ),
        }
    }
    /// Returns the context variable of type `T` if one was set.
    #[inline]
    pub fn try_ctx<T: 'static>(&self) -> Option<&T> {
        self.vars
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref())
    }
    /// Returns the context variable of type `T` mutably if one was set.
    #[inline]
    pub fn try_ctx_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.vars
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut())
    }
    /// Returns the context variable of type `T`, setting the one made by `f`
    /// first if none was set.
    pub fn ctx_or_set<T: 'static, F: FnOnce() -> T>(&mut self, f: F) -> &mut T {
        self.vars
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(f()))
            .downcast_mut()
            .unwrap()
    }
    /// Drops the context variable of type `T`, returning it.
    pub fn unset_ctx<T: 'static>(&mut self) -> Option<T> {
        self.vars
            .remove(&TypeId::of::<T>())
            .map(|value| *value.downcast::<T>().unwrap())
    }

    /// Creates `C`'s pool record if it does not exist yet and returns its
    /// position.
    pub(crate) fn assure<C: 'static>(&mut self) -> usize {
        let type_id = TypeId::of::<C>();
        if let Some(&index) = self.pool_index.get(&type_id) {
            return index;
        }
        let index = self.pools.len();
        self.pools.push(PoolRecord::new::<C>());
        self.pool_index.insert(type_id, index);
        #[cfg(feature = "tracing")]
        tracing::trace!(component = type_name::<C>(), "created component pool");
        index
    }
    #[inline]
    pub(crate) fn pool_id(&self, type_id: TypeId) -> Option<usize> {
        self.pool_index.get(&type_id).copied()
    }
    #[inline]
    pub(crate) fn contains_id(&self, type_id: TypeId, entity: Entity) -> bool {
        self.pool_id(type_id)
            .map_or(false, |index| self.pools[index].pool.contains(entity))
    }
    // Resolves `C`'s pool for an operation requiring the component.
    #[track_caller]
    fn pool_of<C: 'static>(&self, entity: Entity) -> usize {
        match self.pool_id(TypeId::of::<C>()) {
            Some(index) if self.pools[index].pool.contains(entity) => index,
            _ => panic!(
                "{:?}",
                error::MissingComponent {
                    id: entity,
                    name: type_name::<C>(),
                }
            ),
        }
    }
    // Fires one of a pool's signals over a snapshot of its listeners.
    pub(crate) fn emit(&self, pool: usize, kind: SignalKind, entity: Entity) {
        let snapshot = self.pools[pool].signal(kind).snapshot();
        for call in snapshot {
            (*call)(self, entity);
        }
    }
}
