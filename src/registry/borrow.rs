use crate::registry::Registry;
use crate::sparse_set::SparseSet;
use core::any::TypeId;

/// Tuple of component types whose storages can be borrowed mutably at the
/// same time, see [`Registry::storages_mut`].
///
/// Implemented for tuples of up to 4 distinct component types.
pub trait MultiStorage {
    type Out<'a>;

    fn fetch(registry: &mut Registry) -> Self::Out<'_>;
}

macro_rules! impl_multi_storage {
    ($(($type: ident, $index: tt))+) => {
        impl<$($type: 'static),+> MultiStorage for ($($type,)+) {
            type Out<'a> = ($(&'a mut SparseSet<$type>,)+);

            #[track_caller]
            fn fetch(registry: &mut Registry) -> Self::Out<'_> {
                $(
                    registry.assure::<$type>();
                )+
                let type_ids = [$(TypeId::of::<$type>()),+];
                for a in 0..type_ids.len() {
                    for b in a + 1..type_ids.len() {
                        assert_ne!(
                            type_ids[a], type_ids[b],
                            "storages_mut requires distinct component types"
                        );
                    }
                }
                // SAFE distinct component types map to distinct pool records
                unsafe {
                    (
                        $(
                            &mut *(registry.storage_mut::<$type>() as *mut SparseSet<$type>),
                        )+
                    )
                }
            }
        }
    }
}

impl_multi_storage![(A, 0)];
impl_multi_storage![(A, 0) (B, 1)];
impl_multi_storage![(A, 0) (B, 1) (C, 2)];
impl_multi_storage![(A, 0) (B, 1) (C, 2) (D, 3)];
