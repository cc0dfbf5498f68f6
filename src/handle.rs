use crate::component::ComponentSet;
use crate::entity::Entity;
use crate::registry::Registry;

/// An entity and its registry bundled together, forwarding the per-entity
/// component operations. Pure convenience, it has no state of its own.
///
/// ### Example
/// ```
/// use rivet::Registry;
///
/// let mut registry = Registry::new();
/// let entity = registry.create();
///
/// let mut handle = registry.handle(entity);
/// handle.insert(7u32);
/// assert_eq!(handle.get::<u32>(), &7);
/// ```
pub struct Handle<'a> {
    registry: &'a mut Registry,
    entity: Entity,
}

impl<'a> Handle<'a> {
    pub(crate) fn new(registry: &'a mut Registry, entity: Entity) -> Self {
        Handle { registry, entity }
    }
    /// Returns the wrapped entity.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.entity
    }
    /// Returns the wrapped registry.
    #[inline]
    pub fn registry(&mut self) -> &mut Registry {
        self.registry
    }
    /// Returns `true` if the entity is still alive.
    pub fn valid(&self) -> bool {
        self.registry.valid(self.entity)
    }
    /// Forwards to [`Registry::insert`].
    #[track_caller]
    pub fn insert<C: 'static>(&mut self, component: C) -> &mut Self {
        self.registry.insert(self.entity, component);
        self
    }
    /// Forwards to [`Registry::insert_or_replace`].
    #[track_caller]
    pub fn insert_or_replace<C: 'static>(&mut self, component: C) -> Option<C> {
        self.registry.insert_or_replace(self.entity, component)
    }
    /// Forwards to [`Registry::replace`].
    #[track_caller]
    pub fn replace<C: 'static>(&mut self, component: C) -> C {
        self.registry.replace(self.entity, component)
    }
    /// Forwards to [`Registry::patch`].
    #[track_caller]
    pub fn patch<C: 'static, F: FnOnce(&mut C)>(&mut self, f: F) -> &mut Self {
        self.registry.patch(self.entity, f);
        self
    }
    /// Forwards to [`Registry::remove`].
    #[track_caller]
    pub fn remove<C: 'static>(&mut self) -> C {
        self.registry.remove(self.entity)
    }
    /// Forwards to [`Registry::remove_if_exists`].
    pub fn remove_if_exists<S: ComponentSet>(&mut self) -> usize {
        self.registry.remove_if_exists::<S>(self.entity)
    }
    /// Forwards to [`Registry::contains`].
    pub fn contains<C: 'static>(&self) -> bool {
        self.registry.contains::<C>(self.entity)
    }
    /// Forwards to [`Registry::get`].
    #[track_caller]
    pub fn get<C: 'static>(&self) -> &C {
        self.registry.get(self.entity)
    }
    /// Forwards to [`Registry::try_get`].
    pub fn try_get<C: 'static>(&self) -> Option<&C> {
        self.registry.try_get(self.entity)
    }
    /// Forwards to [`Registry::get_mut`].
    #[track_caller]
    pub fn get_mut<C: 'static>(&mut self) -> &mut C {
        self.registry.get_mut(self.entity)
    }
    /// Destroys the entity, consuming the handle.
    #[track_caller]
    pub fn destroy(self) {
        self.registry.destroy(self.entity);
    }
}
