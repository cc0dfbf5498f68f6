use core::any::TypeId;
use core::hash::{BuildHasherDefault, Hasher};

/// Since `TypeId`s are already unique there is no need to hash them.
/// This hasher keeps the last 64 bits the standard `Hash` impl feeds it.
#[derive(Default)]
pub(crate) struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    fn write(&mut self, bytes: &[u8]) {
        // `TypeId` became 16 bytes wide on newer compilers, fold whatever we get
        for chunk in bytes.chunks(8) {
            let mut buffer = [0u8; 8];
            buffer[..chunk.len()].copy_from_slice(chunk);
            self.0 ^= u64::from_ne_bytes(buffer);
        }
    }
    fn write_u64(&mut self, value: u64) {
        self.0 = value;
    }
    fn write_u128(&mut self, value: u128) {
        self.0 = value as u64;
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

pub(crate) type TypeIdMap<V> = hashbrown::HashMap<TypeId, V, BuildHasherDefault<TypeIdHasher>>;

#[test]
fn distinct_types_distinct_hashes() {
    use core::hash::Hash;

    fn hash_of<T: 'static>() -> u64 {
        let mut hasher = TypeIdHasher::default();
        TypeId::of::<T>().hash(&mut hasher);
        hasher.finish()
    }

    assert_ne!(hash_of::<usize>(), hash_of::<u32>());
    assert_ne!(hash_of::<()>(), hash_of::<u32>());
}
