use rivet::{Entity, Registry};

#[derive(Debug, Clone, Copy, PartialEq)]
struct A(i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct B(i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct C(i32);

struct Tag;

fn owned_front<T: 'static>(registry: &Registry, len: usize) -> Vec<Entity> {
    let storage = registry.storage::<T>().unwrap();
    (0..len).map(|i| storage.id_at(i).unwrap()).collect()
}

#[test]
fn owning_group_packs_the_pools() {
    let mut registry = Registry::new();

    let entities: Vec<Entity> = (0..10).map(|_| registry.create()).collect();
    for (i, &entity) in entities.iter().enumerate() {
        registry.insert(entity, A(i as i32));
    }
    for &entity in entities.iter().step_by(2) {
        registry.insert(entity, B(0));
    }

    {
        let group = registry.group::<(A, B), (), ()>();
        assert_eq!(group.len(), 5);
    }

    // the first five entries of both owned pools are the B-holders, in the
    // same order
    let front_a = owned_front::<A>(&registry, 5);
    let front_b = owned_front::<B>(&registry, 5);
    assert_eq!(front_a, front_b);

    let mut sorted = front_a.clone();
    sorted.sort_by_key(|entity| entity.index());
    let evens: Vec<Entity> = entities.iter().step_by(2).copied().collect();
    assert_eq!(sorted, evens);

    // components moved together with their entities
    for &entity in &front_a {
        assert_eq!(registry.get::<A>(entity).0, entity.index() as i32);
    }

    // dropping a B shrinks the packed range and expels the entity from it
    registry.remove::<B>(entities[0]);
    {
        let group = registry.group::<(A, B), (), ()>();
        assert_eq!(group.len(), 4);
        assert!(!group.contains(entities[0]));
    }
    assert!(registry.storage::<A>().unwrap().index_of(entities[0]).unwrap() >= 4);
}

#[test]
fn owning_group_follows_later_changes() {
    let mut registry = Registry::new();
    {
        registry.group::<(A, B), (), ()>();
    }

    let entity = registry.create();
    registry.insert(entity, A(0));
    {
        assert_eq!(registry.group::<(A, B), (), ()>().len(), 0);
    }

    registry.insert(entity, B(0));
    {
        let group = registry.group::<(A, B), (), ()>();
        assert_eq!(group.len(), 1);
        assert!(group.contains(entity));
        assert_eq!(group.iter().collect::<Vec<_>>(), [entity]);
    }

    registry.destroy(entity);
    assert_eq!(registry.group::<(A, B), (), ()>().len(), 0);
}

#[test]
fn group_each_reads_owned_and_observed() {
    let mut registry = Registry::new();

    for i in 0..4 {
        let entity = registry.create();
        registry.insert(entity, A(i));
        registry.insert(entity, B(i * 10));
        if i % 2 == 0 {
            registry.insert(entity, C(i * 100));
        }
    }

    let group = registry.group::<(A,), (B,), ()>();
    let mut visited = 0;
    group.each(|_, (a,), (b,)| {
        assert_eq!(a.0 * 10, b.0);
        visited += 1;
    });
    assert_eq!(visited, 4);
}

#[test]
fn non_owning_group_tracks_membership() {
    let mut registry = Registry::new();

    let a_only = registry.create();
    registry.insert(a_only, A(0));
    let both = registry.create();
    registry.insert(both, A(1));
    registry.insert(both, B(1));

    {
        let group = registry.group::<(), (A, B), ()>();
        assert_eq!(group.len(), 1);
        assert!(group.contains(both));
        assert!(!group.contains(a_only));
    }

    registry.insert(a_only, B(0));
    registry.remove::<B>(both);

    {
        let group = registry.group::<(), (A, B), ()>();
        assert_eq!(group.len(), 1);
        assert!(group.contains(a_only));
        assert!(!group.contains(both));
    }

    // the non-owning group never reorders the pools
    assert!(registry.sortable::<A>());
    assert!(registry.sortable::<B>());
}

#[test]
fn exclude_responds_to_both_transitions() {
    let mut registry = Registry::new();

    let entity = registry.create();
    registry.insert(entity, A(0));

    {
        let group = registry.group::<(A,), (), (Tag,)>();
        assert!(group.contains(entity));
    }

    registry.insert(entity, Tag);
    assert_eq!(registry.group::<(A,), (), (Tag,)>().len(), 0);

    registry.remove::<Tag>(entity);
    {
        let group = registry.group::<(A,), (), (Tag,)>();
        assert_eq!(group.len(), 1);
        assert!(group.contains(entity));
    }
}

#[test]
fn group_creation_is_idempotent() {
    let mut registry = Registry::new();

    let entity = registry.create();
    registry.insert(entity, A(0));
    registry.insert(entity, B(0));

    assert_eq!(registry.group::<(A, B), (), ()>().len(), 1);
    // requesting the same group again finds the existing one, the member is
    // not re-admitted or lost
    assert_eq!(registry.group::<(A, B), (), ()>().len(), 1);

    let other = registry.create();
    registry.insert(other, A(1));
    registry.insert(other, B(1));
    assert_eq!(registry.group::<(A, B), (), ()>().len(), 2);
}

#[test]
fn nested_groups_stay_consistent() {
    let mut registry = Registry::new();
    {
        registry.group::<(A,), (), ()>();
        registry.group::<(A, B), (), ()>();
    }

    let plain = registry.create();
    registry.insert(plain, A(0));
    let full = registry.create();
    registry.insert(full, A(1));
    registry.insert(full, B(1));

    {
        assert_eq!(registry.group::<(A,), (), ()>().len(), 2);
        assert_eq!(registry.group::<(A, B), (), ()>().len(), 1);
        assert!(registry.group::<(A, B), (), ()>().contains(full));
    }

    // the inner range keeps sitting inside the outer one
    let storage = registry.storage::<A>().unwrap();
    assert_eq!(storage.index_of(full), Some(0));

    registry.remove::<B>(full);
    {
        assert_eq!(registry.group::<(A,), (), ()>().len(), 2);
        assert_eq!(registry.group::<(A, B), (), ()>().len(), 0);
    }

    registry.destroy(plain);
    assert_eq!(registry.group::<(A,), (), ()>().len(), 1);
}

#[test]
#[should_panic(expected = "partially overlap")]
fn partial_overlap_is_refused() {
    let mut registry = Registry::new();
    {
        registry.group::<(A, B), (), ()>();
    }
    registry.group::<(B, C), (), ()>();
}

#[test]
#[should_panic(expected = "owned by a group")]
fn sorting_an_owned_pool_is_refused() {
    let mut registry = Registry::new();
    {
        registry.group::<(A,), (), ()>();
    }
    assert!(!registry.sortable::<A>());
    registry.sort_by::<A, _>(|left, right| left.0.cmp(&right.0));
}

#[test]
fn sorting_unowned_pools_is_fine() {
    let mut registry = Registry::new();
    {
        registry.group::<(A,), (B,), ()>();
    }

    for i in [3, 1, 2] {
        let entity = registry.create();
        registry.insert(entity, B(i));
    }

    assert!(registry.sortable::<B>());
    registry.sort_by::<B, _>(|left, right| left.0.cmp(&right.0));
    assert_eq!(registry.storage::<B>().unwrap().as_slice(), [B(1), B(2), B(3)]);
}

#[test]
fn owning_group_sort() {
    let mut registry = Registry::new();

    let entities: Vec<Entity> = (0..5).map(|_| registry.create()).collect();
    for (i, &entity) in entities.iter().enumerate() {
        registry.insert(entity, A(i as i32));
        if i != 2 {
            registry.insert(entity, B(i as i32));
        }
    }

    {
        let mut group = registry.group::<(A, B), (), ()>();
        assert_eq!(group.len(), 4);
        // highest index first
        group.sort_by(|left, right| right.index().cmp(&left.index()));
    }

    let front = owned_front::<A>(&registry, 4);
    let indices: Vec<u32> = front.iter().map(|entity| entity.index()).collect();
    assert_eq!(indices, [4, 3, 1, 0]);
    assert_eq!(front, owned_front::<B>(&registry, 4));
    // parallel data still lines up after the sort
    for &entity in &front {
        assert_eq!(registry.get::<A>(entity).0, entity.index() as i32);
        assert_eq!(registry.get::<B>(entity).0, entity.index() as i32);
    }
}

#[test]
fn non_owning_sort_as_mirrors_a_pool() {
    let mut registry = Registry::new();

    let entities: Vec<Entity> = (0..4).map(|_| registry.create()).collect();
    for &entity in &entities {
        registry.insert(entity, A(0));
        registry.insert(entity, B(0));
    }

    // reorder A by descending entity index, then mirror the handler on it
    registry.sort_by_id::<A, _>(|left, right| right.index().cmp(&left.index()));

    let handler_order: Vec<Entity> = {
        let mut group = registry.group::<(), (A, B), ()>();
        group.sort_as::<A>();
        group.iter().collect()
    };
    let pool_order: Vec<Entity> = registry.storage::<A>().unwrap().entities().collect();
    assert_eq!(handler_order, pool_order);
}

#[test]
#[should_panic(expected = "non-owning")]
fn sort_as_on_an_owning_group_is_refused() {
    let mut registry = Registry::new();
    let mut group = registry.group::<(A,), (), ()>();
    group.sort_as::<A>();
}
