use rivet::{Collector, Entity, Registry};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Health {
    hp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct A(i32);

#[derive(Debug, Clone, Copy, PartialEq)]
struct B(i32);

struct Shield;

struct Cursed;

#[test]
fn update_matcher() {
    let mut registry = Registry::new();
    let mut observer = registry.observe(Collector::new().update::<Health>());

    let entity = registry.create();
    registry.insert(entity, Health { hp: 10 });
    assert!(observer.is_empty());

    registry.patch(entity, |health: &mut Health| health.hp -= 1);
    assert!(observer.contains(entity));
    assert_eq!(observer.len(), 1);

    let mut drained = Vec::new();
    observer.drain(|entity| drained.push(entity));
    assert_eq!(drained, [entity]);
    assert!(observer.is_empty());

    registry.patch(entity, |health: &mut Health| health.hp -= 1);
    assert!(observer.contains(entity));
}

#[test]
fn replace_counts_as_an_update() {
    let mut registry = Registry::new();
    let observer = registry.observe(Collector::new().update::<Health>());

    let entity = registry.create();
    registry.insert(entity, Health { hp: 10 });
    registry.replace(entity, Health { hp: 9 });

    assert!(observer.contains(entity));
}

#[test]
fn update_matcher_forgets_on_removal() {
    let mut registry = Registry::new();
    let observer = registry.observe(Collector::new().update::<Health>());

    let entity = registry.create();
    registry.insert(entity, Health { hp: 10 });
    registry.patch(entity, |health: &mut Health| health.hp -= 1);
    assert!(observer.contains(entity));

    registry.remove::<Health>(entity);
    assert!(observer.is_empty());
}

#[test]
fn group_matcher_triggers_on_completion() {
    let mut registry = Registry::new();
    let observer = registry.observe(Collector::new().group::<(A, B), ()>());

    let entity = registry.create();
    registry.insert(entity, A(0));
    assert!(observer.is_empty());

    // the last piece falls into place
    registry.insert(entity, B(0));
    assert!(observer.contains(entity));

    // breaking the condition clears the entity
    registry.remove::<A>(entity);
    assert!(observer.is_empty());
}

#[test]
fn group_matcher_triggers_on_exclude_removal() {
    let mut registry = Registry::new();
    let observer = registry.observe(Collector::new().group::<(A,), (Cursed,)>());

    let entity = registry.create();
    registry.insert(entity, Cursed);
    registry.insert(entity, A(0));
    assert!(observer.is_empty());

    // removing the excluded component is the completing change
    registry.remove::<Cursed>(entity);
    assert!(observer.contains(entity));

    // and adding it back clears the entity
    registry.insert(entity, Cursed);
    assert!(observer.is_empty());
}

#[test]
fn require_and_reject_narrow_a_matcher() {
    let mut registry = Registry::new();
    let observer = registry.observe(
        Collector::new()
            .update::<Health>()
            .require::<(Shield,)>()
            .reject::<(Cursed,)>(),
    );

    let bare = registry.create();
    registry.insert(bare, Health { hp: 10 });
    registry.patch(bare, |health: &mut Health| health.hp -= 1);
    // no Shield: the matcher stays cold
    assert!(observer.is_empty());

    let shielded = registry.create();
    registry.insert(shielded, Health { hp: 10 });
    registry.insert(shielded, Shield);
    registry.patch(shielded, |health: &mut Health| health.hp -= 1);
    assert!(observer.contains(shielded));

    // gaining a rejected component disarms the match
    registry.insert(shielded, Cursed);
    assert!(observer.is_empty());

    registry.remove::<Cursed>(shielded);
    registry.patch(shielded, |health: &mut Health| health.hp -= 1);
    assert!(observer.contains(shielded));

    // losing a required component disarms it too
    registry.remove::<Shield>(shielded);
    assert!(observer.is_empty());
}

#[test]
fn matchers_get_independent_bits() {
    let mut registry = Registry::new();
    let mut observer = registry.observe(
        Collector::new()
            .group::<(A,), ()>()
            .update::<B>(),
    );

    let entity = registry.create();
    registry.insert(entity, A(0));
    assert!(observer.contains(entity));

    registry.insert(entity, B(0));
    registry.patch(entity, |b: &mut B| b.0 += 1);
    assert!(observer.contains(entity));

    // clearing one matcher leaves the other's bit set
    registry.remove::<A>(entity);
    assert!(observer.contains(entity));

    registry.remove::<B>(entity);
    assert!(observer.is_empty());

    // both again, then drain wipes the slate
    registry.insert(entity, A(1));
    registry.insert(entity, B(1));
    registry.patch(entity, |b: &mut B| b.0 += 1);
    let mut count = 0;
    observer.drain(|_| count += 1);
    assert_eq!(count, 1);
    assert!(observer.is_empty());
}

#[test]
fn destroying_the_entity_clears_it() {
    let mut registry = Registry::new();
    let observer = registry.observe(Collector::new().group::<(A,), ()>());

    let entity = registry.create();
    registry.insert(entity, A(0));
    assert!(observer.contains(entity));

    registry.destroy(entity);
    assert!(observer.is_empty());
}

#[test]
fn disconnect_stops_tracking() {
    let mut registry = Registry::new();
    let mut observer = registry.observe(Collector::new().update::<Health>());

    let entity = registry.create();
    registry.insert(entity, Health { hp: 10 });

    observer.disconnect(&mut registry);

    registry.patch(entity, |health: &mut Health| health.hp -= 1);
    assert!(observer.is_empty());
}

#[test]
fn each_does_not_clear() {
    let mut registry = Registry::new();
    let observer = registry.observe(Collector::new().update::<Health>());

    let entity = registry.create();
    registry.insert(entity, Health { hp: 10 });
    registry.patch(entity, |health: &mut Health| health.hp -= 1);

    let mut seen = Vec::new();
    observer.each(|entity| seen.push(entity));
    assert_eq!(seen, [entity]);
    assert!(observer.contains(entity));
}

#[test]
fn observed_entities_come_out_once() {
    let mut registry = Registry::new();
    let observer = registry.observe(Collector::new().update::<Health>());

    let entities: Vec<Entity> = (0..3).map(|_| registry.create()).collect();
    for &entity in &entities {
        registry.insert(entity, Health { hp: 1 });
        registry.patch(entity, |health: &mut Health| health.hp += 1);
        // patching twice must not duplicate the entity
        registry.patch(entity, |health: &mut Health| health.hp += 1);
    }

    let mut seen = Vec::new();
    observer.each(|entity| seen.push(entity));
    seen.sort_by_key(|entity| entity.index());
    assert_eq!(seen, entities);
}

#[test]
#[should_panic(expected = "at most 31 matchers")]
fn too_many_matchers_are_refused() {
    let mut registry = Registry::new();
    let mut collector = Collector::new();
    for _ in 0..32 {
        collector = collector.update::<Health>();
    }
    let _ = registry.observe(collector);
}
