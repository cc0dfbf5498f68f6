use crate::entity::Entity;
use crate::registry::Registry;
use alloc::vec::Vec;
use core::any::TypeId;

/// Tuple of component types usable wherever the registry needs a static list
/// of types: multi-component lookups, group descriptors, observer matchers.
///
/// Implemented for tuples up to 8 component types, `()` included so that a
/// group or matcher side can be left empty.
pub trait ComponentSet {
    /// Shared references to every component of the set.
    type Refs<'a>;
    const LEN: usize;

    /// Appends the `TypeId` of every component of the set.
    fn type_ids(out: &mut Vec<TypeId>);
    /// Creates the pools of the set that don't exist yet.
    fn assure(registry: &mut Registry);
    /// Looks up every component of the set for `entity`.
    fn refs(registry: &Registry, entity: Entity) -> Option<Self::Refs<'_>>;
    /// Reads every component of the set at the same dense position.
    ///
    /// Only meaningful for pools kept in identical order, which is what
    /// owning groups maintain.
    fn refs_at(registry: &Registry, index: usize) -> Self::Refs<'_>;
}

impl ComponentSet for () {
    type Refs<'a> = ();
    const LEN: usize = 0;

    fn type_ids(_: &mut Vec<TypeId>) {}
    fn assure(_: &mut Registry) {}
    fn refs(_: &Registry, _: Entity) -> Option<()> {
        Some(())
    }
    fn refs_at(_: &Registry, _: usize) -> () {}
}

macro_rules! impl_component_set {
    ($count: expr; $(($type: ident, $index: tt))+) => {
        impl<$($type: 'static),+> ComponentSet for ($($type,)+) {
            type Refs<'a> = ($(&'a $type,)+);
            const LEN: usize = $count;

            fn type_ids(out: &mut Vec<TypeId>) {
                $(
                    out.push(TypeId::of::<$type>());
                )+
            }
            fn assure(registry: &mut Registry) {
                $(
                    registry.assure::<$type>();
                )+
            }
            fn refs(registry: &Registry, entity: Entity) -> Option<Self::Refs<'_>> {
                Some(($(registry.storage::<$type>()?.get(entity)?,)+))
            }
            fn refs_at(registry: &Registry, index: usize) -> Self::Refs<'_> {
                ($(&registry.storage::<$type>().unwrap().as_slice()[index],)+)
            }
        }
    }
}

macro_rules! component_set {
    ($count: expr; $(($type: ident, $index: tt))+; ($type1: ident, $index1: tt) $(($queue_type: ident, $queue_index: tt))*) => {
        impl_component_set![$count; $(($type, $index))+];
        component_set![$count + 1; $(($type, $index))+ ($type1, $index1); $(($queue_type, $queue_index))*];
    };
    ($count: expr; $(($type: ident, $index: tt))+;) => {
        impl_component_set![$count; $(($type, $index))+];
    }
}

component_set![1; (A, 0); (B, 1) (C, 2) (D, 3) (E, 4) (F, 5) (G, 6) (H, 7)];
