use crate::entity::Entity;
use alloc::vec::Vec;

/// Slab of every entity the registry ever produced: living, destroyed and
/// recyclable.
///
/// A living slot stores its own identifier, its index field equals its
/// position. Destroyed slots form an implicit singly linked list threaded
/// through their index fields, `next_free` holding the head; their version
/// field already carries the version the next incarnation will get.
pub(crate) struct Entities {
    data: Vec<Entity>,
    next_free: Option<u32>,
    alive: usize,
}

impl Entities {
    #[inline]
    pub(crate) fn new() -> Self {
        Entities {
            data: Vec::new(),
            next_free: None,
            alive: 0,
        }
    }
    /// Returns `true` if `entity` matches a living entity.
    #[inline]
    pub(crate) fn is_alive(&self, entity: Entity) -> bool {
        self.data.get(entity.uindex()) == Some(&entity)
    }
    /// Returns the version currently associated with an index, whether the
    /// slot is alive or pending recycling.
    #[inline]
    pub(crate) fn current(&self, index: u32) -> Option<u32> {
        self.data.get(index as usize).map(|slot| slot.version())
    }
    #[inline]
    pub(crate) fn alive(&self) -> usize {
        self.alive
    }
    /// Creates an entity, recycling the most recently destroyed index when
    /// one is available.
    pub(crate) fn create(&mut self) -> Entity {
        self.alive += 1;
        match self.next_free {
            Some(head) => {
                let slot = self.data[head as usize];
                let next = slot.index();
                self.next_free = (next != Entity::NULL_INDEX).then_some(next);
                let entity = Entity::from_parts(head, slot.version());
                self.data[head as usize] = entity;
                entity
            }
            None => {
                let entity = Entity::new(self.data.len() as u32);
                self.data.push(entity);
                entity
            }
        }
    }
    /// Creates the requested identifier if its index is free, falling back
    /// to a plain [`create`](Entities::create) when the index is in use.
    ///
    /// A hint past the end of the slab grows it, every in-between slot going
    /// onto the free list.
    pub(crate) fn create_hint(&mut self, hint: Entity) -> Entity {
        debug_assert!(!hint.is_null());
        let index = hint.uindex();

        if index < self.data.len() {
            if self.data[index].uindex() == index {
                // the index is in use, the hint is not honored
                return self.create();
            }
            self.unlink(hint.index());
            self.data[index] = hint;
            self.alive += 1;
            hint
        } else {
            while self.data.len() < index {
                let free = self.data.len() as u32;
                let next = self.next_free.unwrap_or(Entity::NULL_INDEX);
                self.data.push(Entity::from_parts(next, 0));
                self.next_free = Some(free);
            }
            self.data.push(hint);
            self.alive += 1;
            hint
        }
    }
    // Removes a destroyed index from the free list.
    fn unlink(&mut self, index: u32) {
        let mut current = self.next_free.unwrap();
        if current == index {
            let next = self.data[index as usize].index();
            self.next_free = (next != Entity::NULL_INDEX).then_some(next);
        } else {
            loop {
                let next = self.data[current as usize].index();
                if next == index {
                    break;
                }
                current = next;
            }
            let after = self.data[index as usize].index();
            self.data[current as usize].set_index(after);
        }
    }
    /// Destroys a living entity, prepending its index to the free list.
    ///
    /// The slot receives the bumped version, wrapping on overflow, unless a
    /// caller-supplied `version` overrides it.
    pub(crate) fn destroy(&mut self, entity: Entity, version: Option<u32>) {
        debug_assert!(self.is_alive(entity));
        let version = version.unwrap_or_else(|| entity.version().wrapping_add(1));
        let next = self.next_free.unwrap_or(Entity::NULL_INDEX);
        self.data[entity.uindex()] = Entity::from_parts(next, version);
        self.next_free = Some(entity.index());
        self.alive -= 1;
    }
    /// Iterates every living entity, oldest index first.
    pub(crate) fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(index, entity)| entity.uindex() == *index)
            .map(|(_, entity)| *entity)
    }
}
