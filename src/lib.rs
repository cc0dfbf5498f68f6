//! Entity Component System built around sparse sets.
//!
//! Entities are plain index+version identifiers, components live in packed
//! per-type pools, and a [`Registry`] ties everything together: entity
//! recycling, change signals, [`View`]s, [`Group`]s and [`Observer`]s.
//!
//! ```
//! use rivet::Registry;
//!
//! struct Position { x: f32, y: f32 }
//! struct Velocity { x: f32, y: f32 }
//!
//! let mut registry = Registry::new();
//!
//! let entity = registry.create();
//! registry.insert(entity, Position { x: 0.0, y: 0.0 });
//! registry.insert(entity, Velocity { x: 1.0, y: 2.0 });
//!
//! registry.view::<(Position, Velocity)>().each(|_entity, (position, velocity)| {
//!     let _ = (position.x + velocity.x, position.y + velocity.y);
//! });
//! ```
//!
//! A registry is strictly single-threaded, it contains no synchronization;
//! different registries are fully independent.
#![no_std]
#![deny(bare_trait_objects)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod component;
mod entity;
pub mod error;
mod group;
mod handle;
mod observer;
mod registry;
mod runtime_view;
mod signal;
mod sparse_set;
mod type_id;
mod view;

pub use component::ComponentSet;
pub use entity::{Entity, Identifier};
pub use group::{Group, GroupIter};
pub use handle::Handle;
pub use observer::{Collector, Observer};
pub use registry::{MultiStorage, Registry};
pub use runtime_view::RuntimeView;
pub use signal::{Delegate, DelegateKey, Signal, Sink};
pub use sparse_set::{EntitiesIter, EntitySet, SparseArray, SparseSet};
pub use view::{ExcludeTuple, View, ViewIter, ViewTuple};
