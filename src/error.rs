//! All error types.
//!
//! Contract violations don't return these as `Result`s: the hot-path
//! operations panic with one of these values instead, keeping the fast path
//! free of error plumbing. Use the `try_*` counterparts when absence is a
//! normal outcome.

use crate::entity::Entity;
use core::fmt::{Debug, Display, Formatter};
#[cfg(feature = "std")]
use std::error::Error;

/// Error when operating on an entity the registry does not consider alive.
///
/// Either the entity was destroyed or the identifier was forged.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DeadEntity {
    pub id: Entity,
}

#[cfg(feature = "std")]
impl Error for DeadEntity {}

impl Debug for DeadEntity {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        fmt.write_fmt(format_args!(
            "{:?} is not alive, its index was either recycled or never used.",
            self.id
        ))
    }
}

impl Display for DeadEntity {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

/// Error when inserting a component an entity already has.
///
/// Use `insert_or_replace` to overwrite instead.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AlreadyPresent {
    pub id: Entity,
    pub name: &'static str,
}

#[cfg(feature = "std")]
impl Error for AlreadyPresent {}

impl Debug for AlreadyPresent {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        fmt.write_fmt(format_args!(
            "{:?} already has a {} component.",
            self.id, self.name
        ))
    }
}

impl Display for AlreadyPresent {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

/// Error when accessing or removing a component an entity does not have.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MissingComponent {
    pub id: Entity,
    pub name: &'static str,
}

#[cfg(feature = "std")]
impl Error for MissingComponent {}

impl Debug for MissingComponent {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        fmt.write_fmt(format_args!(
            "{:?} does not have a {} component.",
            self.id, self.name
        ))
    }
}

impl Display for MissingComponent {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

/// Error when reading a context variable that was never set.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MissingContext {
    pub name: &'static str,
}

#[cfg(feature = "std")]
impl Error for MissingContext {}

impl Debug for MissingContext {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        fmt.write_fmt(format_args!(
            "No {} context variable is set. You can set one with: registry.set_ctx(value);",
            self.name
        ))
    }
}

impl Display for MissingContext {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

/// Error related to group creation and group-constrained operations.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// The owned set of a new group partially overlaps an existing group's.
    /// Overlapping groups must be strictly nested.
    PartialOverlap,
    /// A group has to observe at least one component type.
    Empty,
    /// Sorting a pool owned by a group would break its packing.
    OwnedSort(&'static str),
    /// The operation only applies to non-owning groups.
    NotOwning,
}

#[cfg(feature = "std")]
impl Error for Group {}

impl Debug for Group {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        match self {
            Self::PartialOverlap => fmt.write_str(
                "The owned components of this group partially overlap another group's. \
                 Groups owning common components must own a subset or a superset of each other.",
            ),
            Self::Empty => fmt.write_str("A group has to observe at least one component type."),
            Self::OwnedSort(name) => fmt.write_fmt(format_args!(
                "Cannot sort {} storage, it is owned by a group.",
                name
            )),
            Self::NotOwning => {
                fmt.write_str("This operation only applies to non-owning groups.")
            }
        }
    }
}

impl Display for Group {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        Debug::fmt(self, fmt)
    }
}

/// Error when an observer is built from more matchers than its bitmask holds.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TooManyMatchers {
    pub count: usize,
}

#[cfg(feature = "std")]
impl Error for TooManyMatchers {}

impl Debug for TooManyMatchers {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        fmt.write_fmt(format_args!(
            "An observer supports at most 31 matchers, this collector has {}.",
            self.count
        ))
    }
}

impl Display for TooManyMatchers {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), core::fmt::Error> {
        Debug::fmt(self, fmt)
    }
}
