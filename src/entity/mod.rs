mod repr;
#[cfg(feature = "serde1")]
mod serde;

pub use repr::Identifier;

/// Handle to an entity.
// the id is 64 bits long
// <- 32 version -> <- 32 index ->
// an index of !0 is the null sentinel, it never designates a live slot
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u64);

/// Allows [`Entity`] to be stored in collections requiring [`Default`].
impl Default for Entity {
    fn default() -> Self {
        Self::null()
    }
}

impl Entity {
    // Number of bits used by the index
    const INDEX_BITS: u32 = 32;
    const INDEX_MASK: u64 = !(!0u64 << Self::INDEX_BITS);
    pub(crate) const NULL_INDEX: u32 = u32::MAX;

    /// Returns the index part of the `Entity`.
    /// ⚠️ You shouldn't use it to index a storage.
    #[inline]
    pub fn index(self) -> u32 {
        (self.0 & Self::INDEX_MASK) as u32
    }
    /// Returns the index part of the `Entity` as an usize.
    /// ⚠️ You shouldn't use it to index a storage.
    #[inline]
    pub fn uindex(self) -> usize {
        self.index() as usize
    }
    /// Returns the version part of the `Entity`.
    #[inline]
    pub fn version(self) -> u32 {
        (self.0 >> Self::INDEX_BITS) as u32
    }
    /// Make a new `Entity` with the given index and version 0.
    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        Entity(index as u64)
    }
    /// Build an `Entity` from its index and version.
    #[inline]
    pub const fn from_parts(index: u32, version: u32) -> Self {
        Entity((index as u64) | ((version as u64) << Self::INDEX_BITS))
    }
    /// Modify the index, the version is left untouched.
    #[inline]
    pub(crate) fn set_index(&mut self, index: u32) {
        self.0 = (self.0 & !Self::INDEX_MASK) | index as u64;
    }
    /// Returns the null `Entity`.
    ///
    /// Null is an index of all ones; the version bits do not take part in
    /// nullity, use [`is_null`](Entity::is_null) rather than `==` to compare
    /// against null.
    #[inline]
    pub const fn null() -> Self {
        Entity(!0u64)
    }
    /// Returns `true` if the index bits are all ones, whatever the version.
    #[inline]
    pub fn is_null(self) -> bool {
        (self.0 & Self::INDEX_MASK) == Self::INDEX_MASK
    }
    /// Returns `Entity`'s inner representation.
    #[inline]
    pub fn to_integral(self) -> u64 {
        self.0
    }
    /// Build an `Entity` from its inner representation.
    #[inline]
    pub fn from_integral(inner: u64) -> Self {
        Entity(inner)
    }
    #[inline]
    pub(crate) fn page(self) -> usize {
        self.uindex() / crate::sparse_set::PAGE_SIZE
    }
    #[inline]
    pub(crate) fn page_offset(self) -> usize {
        self.uindex() % crate::sparse_set::PAGE_SIZE
    }
}

impl core::fmt::Debug for Entity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_null() {
            f.write_str("Entity(null)")
        } else {
            write!(f, "Entity({}.{})", self.index(), self.version())
        }
    }
}

#[test]
fn entity() {
    let mut entity = Entity::new(0);
    assert_eq!(entity.index(), 0);
    assert_eq!(entity.version(), 0);
    entity.set_index(701);
    assert_eq!(entity.index(), 701);
    assert_eq!(entity.version(), 0);
    let entity = Entity::from_parts(554, 3);
    assert_eq!(entity.index(), 554);
    assert_eq!(entity.version(), 3);
    assert_eq!(Entity::from_integral(entity.to_integral()), entity);
}

#[test]
fn null() {
    assert!(Entity::null().is_null());
    assert!(Entity::from_parts(u32::MAX, 12).is_null());
    assert!(!Entity::new(0).is_null());
}
