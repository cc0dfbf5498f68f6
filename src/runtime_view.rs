use crate::entity::Entity;
use crate::registry::Registry;
use alloc::vec::Vec;
use core::any::TypeId;

/// Dynamic counterpart of [`View`](crate::View): the include and exclude
/// lists are runtime `TypeId`s instead of compile-time tuples.
///
/// Only entities come out of it, component access goes through the registry
/// afterwards. Like its static sibling it drives iteration from the smallest
/// include pool, back to front.
pub struct RuntimeView<'a> {
    registry: &'a Registry,
    // pool positions; None as driver means an include type was never used
    driver: Option<usize>,
    include: Vec<usize>,
    exclude: Vec<usize>,
}

impl<'a> RuntimeView<'a> {
    #[track_caller]
    pub(crate) fn new(registry: &'a Registry, include: &[TypeId], exclude: &[TypeId]) -> Self {
        assert!(
            !include.is_empty(),
            "a runtime view has to include at least one component type"
        );

        let mut pools = Vec::with_capacity(include.len());
        let mut driver = None;
        for &type_id in include {
            match registry.pool_id(type_id) {
                Some(index) => {
                    let len = registry.pools[index].pool.len();
                    if driver.map_or(true, |(_, best)| len < best) {
                        driver = Some((index, len));
                    }
                    pools.push(index);
                }
                None => {
                    // never-used include type: nothing can match
                    return RuntimeView {
                        registry,
                        driver: None,
                        include: Vec::new(),
                        exclude: Vec::new(),
                    };
                }
            }
        }

        RuntimeView {
            registry,
            driver: driver.map(|(index, _)| index),
            include: pools,
            exclude: exclude
                .iter()
                .filter_map(|type_id| registry.pool_id(*type_id))
                .collect(),
        }
    }
    /// Returns `true` if `entity` is part of the view.
    pub fn contains(&self, entity: Entity) -> bool {
        self.driver.is_some()
            && self
                .include
                .iter()
                .all(|&index| self.registry.pools[index].pool.contains(entity))
            && !self
                .exclude
                .iter()
                .any(|&index| self.registry.pools[index].pool.contains(entity))
    }
    /// Iterates the matching entities.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        let driver = self.driver.map(|index| &self.registry.pools[index].pool);
        let len = driver.map_or(0, |pool| pool.len());
        (0..len)
            .rev()
            .filter_map(move |position| driver.unwrap().id_at(position))
            .filter(move |&entity| self.contains(entity))
    }
    /// Visits every matching entity.
    pub fn each(&self, f: impl FnMut(Entity)) {
        self.iter().for_each(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_like_a_static_view() {
        let mut registry = Registry::new();

        let plain = registry.create();
        registry.insert(plain, 0u32);
        let both = registry.create();
        registry.insert(both, 1u32);
        registry.insert(both, 1.0f32);
        let tagged = registry.create();
        registry.insert(tagged, 2u32);
        registry.insert(tagged, 2.0f32);
        registry.insert(tagged, ());

        let view = registry.runtime_view(
            &[TypeId::of::<u32>(), TypeId::of::<f32>()],
            &[TypeId::of::<()>()],
        );

        assert!(view.contains(both));
        assert!(!view.contains(plain));
        assert!(!view.contains(tagged));
        assert_eq!(view.iter().collect::<Vec<_>>(), [both]);
    }

    #[test]
    fn missing_include_pool_is_empty() {
        let mut registry = Registry::new();
        let entity = registry.create();
        registry.insert(entity, 0u32);

        let view = registry.runtime_view(&[TypeId::of::<u32>(), TypeId::of::<i64>()], &[]);

        assert_eq!(view.iter().count(), 0);
        assert!(!view.contains(entity));
    }

    #[test]
    #[should_panic(expected = "at least one component type")]
    fn empty_include_is_rejected() {
        let registry = Registry::new();
        let _ = registry.runtime_view(&[], &[]);
    }
}
