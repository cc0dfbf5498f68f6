use crate::entity::Entity;
use crate::registry::Registry;
use crate::signal::Signal;
use crate::sparse_set::{EntitySet, SparseSet};
use alloc::boxed::Box;
use core::any::{Any, TypeId};

/// Type-erased surface of a component pool, the part the registry and the
/// groups can drive without knowing the component type.
pub(crate) trait AnyPool {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn ids(&self) -> &EntitySet;
    fn contains(&self, entity: Entity) -> bool;
    fn index_of(&self, entity: Entity) -> Option<usize>;
    fn id_at(&self, index: usize) -> Option<Entity>;
    fn len(&self) -> usize;
    /// Drops `entity`'s component without raising any signal.
    fn erase(&mut self, entity: Entity) -> bool;
    /// Swaps two dense positions, parallel data included.
    fn swap_at(&mut self, a: usize, b: usize);
}

impl<T: 'static> AnyPool for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn ids(&self) -> &EntitySet {
        &self.ids
    }
    fn contains(&self, entity: Entity) -> bool {
        SparseSet::contains(self, entity)
    }
    fn index_of(&self, entity: Entity) -> Option<usize> {
        SparseSet::index_of(self, entity)
    }
    fn id_at(&self, index: usize) -> Option<Entity> {
        SparseSet::id_at(self, index)
    }
    fn len(&self) -> usize {
        SparseSet::len(self)
    }
    fn erase(&mut self, entity: Entity) -> bool {
        SparseSet::remove(self, entity).is_some()
    }
    fn swap_at(&mut self, a: usize, b: usize) {
        SparseSet::swap_at(self, a, b);
    }
}

/// Which of a pool's three change signals an operation raises.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum SignalKind {
    Construct,
    Update,
    Destroy,
}

/// One component pool plus everything the registry keeps per type: the
/// erased pool itself and its three change signals.
pub(crate) struct PoolRecord {
    pub(crate) type_id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) pool: Box<dyn AnyPool>,
    pub(crate) on_construct: Signal<Registry>,
    pub(crate) on_update: Signal<Registry>,
    pub(crate) on_destroy: Signal<Registry>,
}

impl PoolRecord {
    pub(crate) fn new<T: 'static>() -> Self {
        PoolRecord {
            type_id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
            pool: Box::new(SparseSet::<T>::new()),
            on_construct: Signal::new(),
            on_update: Signal::new(),
            on_destroy: Signal::new(),
        }
    }
    pub(crate) fn signal_mut(&mut self, kind: SignalKind) -> &mut Signal<Registry> {
        match kind {
            SignalKind::Construct => &mut self.on_construct,
            SignalKind::Update => &mut self.on_update,
            SignalKind::Destroy => &mut self.on_destroy,
        }
    }
    pub(crate) fn signal(&self, kind: SignalKind) -> &Signal<Registry> {
        match kind {
            SignalKind::Construct => &self.on_construct,
            SignalKind::Update => &self.on_update,
            SignalKind::Destroy => &self.on_destroy,
        }
    }
}
