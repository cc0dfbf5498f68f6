use crate::component::ComponentSet;
use crate::entity::Entity;
use crate::error;
use crate::registry::{Registry, SignalKind};
use crate::signal::DelegateKey;
use crate::sparse_set::SparseSet;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::cell::RefCell;

/// Description of what an [`Observer`] reacts to, a list of up to 31
/// matchers.
///
/// Two kinds of matchers exist:
/// - [`group`](Collector::group) fires when an entity starts satisfying
///   `AllOf ∧ ¬NoneOf`, i.e. when the last missing piece falls into place;
/// - [`update`](Collector::update) fires when a component is replaced or
///   patched.
///
/// Either kind can be narrowed with [`require`](Collector::require) and
/// [`reject`](Collector::reject), conditions the entity must keep satisfying
/// for the match to stay armed.
///
/// ### Example
/// ```
/// use rivet::{Collector, Registry};
///
/// struct Position(f32);
/// struct Velocity(f32);
///
/// let mut registry = Registry::new();
/// let observer = registry.observe(
///     Collector::new().group::<(Position, Velocity), ()>(),
/// );
///
/// let entity = registry.create();
/// registry.insert(entity, Position(0.0));
/// assert!(observer.is_empty());
/// registry.insert(entity, Velocity(1.0));
/// assert!(observer.contains(entity));
/// ```
#[derive(Default)]
pub struct Collector {
    matchers: Vec<Matcher>,
    assures: Vec<fn(&mut Registry)>,
}

enum MatcherKind {
    Group {
        all_of: Vec<TypeId>,
        none_of: Vec<TypeId>,
    },
    Update {
        any_of: TypeId,
    },
}

struct Matcher {
    kind: MatcherKind,
    require: Vec<TypeId>,
    reject: Vec<TypeId>,
}

impl Collector {
    pub fn new() -> Self {
        Default::default()
    }
    /// Adds a matcher firing when an entity acquires every component of
    /// `AllOf` while holding none of `NoneOf`, whichever change completes
    /// the condition: the last `AllOf` being added or the last `NoneOf`
    /// being removed.
    pub fn group<AllOf: ComponentSet, NoneOf: ComponentSet>(mut self) -> Self {
        let mut all_of = Vec::new();
        AllOf::type_ids(&mut all_of);
        let mut none_of = Vec::new();
        NoneOf::type_ids(&mut none_of);
        self.assures.push(AllOf::assure);
        self.assures.push(NoneOf::assure);
        self.matchers.push(Matcher {
            kind: MatcherKind::Group { all_of, none_of },
            require: Vec::new(),
            reject: Vec::new(),
        });
        self
    }
    /// Adds a matcher firing when a `AnyOf` component is replaced or
    /// patched.
    pub fn update<AnyOf: 'static>(mut self) -> Self {
        self.assures.push(|registry| {
            registry.assure::<AnyOf>();
        });
        self.matchers.push(Matcher {
            kind: MatcherKind::Update {
                any_of: TypeId::of::<AnyOf>(),
            },
            require: Vec::new(),
            reject: Vec::new(),
        });
        self
    }
    /// Narrows the last matcher: it only fires while the entity holds every
    /// component of `Req`, and losing one of them disarms it.
    ///
    /// ### Panics
    ///
    /// - No matcher was added yet.
    #[track_caller]
    pub fn require<Req: ComponentSet>(mut self) -> Self {
        self.assures.push(Req::assure);
        let matcher = self
            .matchers
            .last_mut()
            .expect("require refines a matcher, add one first");
        Req::type_ids(&mut matcher.require);
        self
    }
    /// Narrows the last matcher: it only fires while the entity holds no
    /// component of `Rej`, and gaining one of them disarms it.
    ///
    /// ### Panics
    ///
    /// - No matcher was added yet.
    #[track_caller]
    pub fn reject<Rej: ComponentSet>(mut self) -> Self {
        self.assures.push(Rej::assure);
        let matcher = self
            .matchers
            .last_mut()
            .expect("reject refines a matcher, add one first");
        Rej::type_ids(&mut matcher.reject);
        self
    }
}

// Per-entity bitmask, one bit per matcher currently satisfied.
type ObserverState = RefCell<SparseSet<u32>>;

enum Action {
    Set,
    Clear,
}

// One signal connection's worth of observer behavior: every connection gets
// its own payload so connections stay distinct in the delegate list.
struct ObserverListener {
    state: Rc<ObserverState>,
    mask: u32,
    action: Action,
    // membership condition, only read by `Action::Set`
    all_of: Box<[TypeId]>,
    none_of: Box<[TypeId]>,
    // type whose destroy signal this listener answers: the component is
    // still present while the signal runs, skip it in the none-of check
    ignore: Option<TypeId>,
}

impl ObserverListener {
    fn check(&self, registry: &Registry, entity: Entity) -> bool {
        self.all_of
            .iter()
            .all(|&type_id| registry.contains_id(type_id, entity))
            && self.none_of.iter().all(|&type_id| {
                Some(type_id) == self.ignore || !registry.contains_id(type_id, entity)
            })
    }
}

fn on_signal(listener: &ObserverListener, registry: &Registry, entity: Entity) {
    match listener.action {
        Action::Set => {
            if !listener.check(registry, entity) {
                return;
            }
            let mut state = listener.state.borrow_mut();
            match state.get_mut(entity) {
                Some(bits) => *bits |= listener.mask,
                None => state.insert(entity, listener.mask),
            }
        }
        Action::Clear => {
            let mut state = listener.state.borrow_mut();
            if let Some(bits) = state.get_mut(entity) {
                *bits &= !listener.mask;
                if *bits == 0 {
                    state.remove(entity);
                }
            }
        }
    }
}

/// Tracker revealing the entities that currently satisfy at least one of its
/// matchers, fed by signal listeners installed at creation.
///
/// Observers keep working for as long as their connections stay up; call
/// [`disconnect`](Observer::disconnect) to stop tracking. Dropping a
/// connected observer is safe, the listeners keep the shared state alive and
/// simply go on updating it unseen.
pub struct Observer {
    state: Rc<ObserverState>,
    connections: Vec<(TypeId, SignalKind, DelegateKey)>,
}

impl Observer {
    #[track_caller]
    pub(crate) fn connect(registry: &mut Registry, collector: Collector) -> Observer {
        if collector.matchers.len() > 31 {
            panic!(
                "{:?}",
                error::TooManyMatchers {
                    count: collector.matchers.len(),
                }
            );
        }
        for assure in &collector.assures {
            assure(registry);
        }

        let state: Rc<ObserverState> = Rc::new(RefCell::new(SparseSet::new()));
        let mut observer = Observer {
            state,
            connections: Vec::new(),
        };

        for (index, matcher) in collector.matchers.iter().enumerate() {
            let mask = 1u32 << index;
            match &matcher.kind {
                MatcherKind::Group { all_of, none_of } => {
                    let condition_all: Vec<TypeId> = all_of
                        .iter()
                        .chain(matcher.require.iter())
                        .copied()
                        .collect();
                    let condition_none: Vec<TypeId> = none_of
                        .iter()
                        .chain(matcher.reject.iter())
                        .copied()
                        .collect();

                    for &type_id in all_of {
                        observer.arm(
                            registry,
                            type_id,
                            SignalKind::Construct,
                            mask,
                            &condition_all,
                            &condition_none,
                            None,
                        );
                    }
                    for &type_id in none_of {
                        observer.arm(
                            registry,
                            type_id,
                            SignalKind::Destroy,
                            mask,
                            &condition_all,
                            &condition_none,
                            Some(type_id),
                        );
                    }
                    for &type_id in condition_all.iter() {
                        observer.disarm(registry, type_id, SignalKind::Destroy, mask);
                    }
                    for &type_id in condition_none.iter() {
                        observer.disarm(registry, type_id, SignalKind::Construct, mask);
                    }
                }
                MatcherKind::Update { any_of } => {
                    observer.arm(
                        registry,
                        *any_of,
                        SignalKind::Update,
                        mask,
                        &matcher.require,
                        &matcher.reject,
                        None,
                    );
                    observer.disarm(registry, *any_of, SignalKind::Destroy, mask);
                    for &type_id in matcher.require.iter() {
                        observer.disarm(registry, type_id, SignalKind::Destroy, mask);
                    }
                    for &type_id in matcher.reject.iter() {
                        observer.disarm(registry, type_id, SignalKind::Construct, mask);
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            matchers = collector.matchers.len(),
            connections = observer.connections.len(),
            "connected observer"
        );

        observer
    }
    #[allow(clippy::too_many_arguments)]
    fn arm(
        &mut self,
        registry: &mut Registry,
        type_id: TypeId,
        kind: SignalKind,
        mask: u32,
        all_of: &[TypeId],
        none_of: &[TypeId],
        ignore: Option<TypeId>,
    ) {
        let listener = ObserverListener {
            state: self.state.clone(),
            mask,
            action: Action::Set,
            all_of: all_of.into(),
            none_of: none_of.into(),
            ignore,
        };
        self.push_connection(registry, type_id, kind, listener);
    }
    fn disarm(&mut self, registry: &mut Registry, type_id: TypeId, kind: SignalKind, mask: u32) {
        let listener = ObserverListener {
            state: self.state.clone(),
            mask,
            action: Action::Clear,
            all_of: Box::new([]),
            none_of: Box::new([]),
            ignore: None,
        };
        self.push_connection(registry, type_id, kind, listener);
    }
    fn push_connection(
        &mut self,
        registry: &mut Registry,
        type_id: TypeId,
        kind: SignalKind,
        listener: ObserverListener,
    ) {
        let index = registry.pool_id(type_id).unwrap();
        let key = registry.pools[index]
            .signal_mut(kind)
            .sink()
            .connect_with(on_signal, Rc::new(listener));
        self.connections.push((type_id, kind, key));
    }
    /// Detaches every signal connection; the observer stops tracking and
    /// keeps its current content.
    pub fn disconnect(&mut self, registry: &mut Registry) {
        for (type_id, kind, key) in self.connections.drain(..) {
            if let Some(index) = registry.pool_id(type_id) {
                registry.pools[index]
                    .signal_mut(kind)
                    .sink()
                    .disconnect_key(key);
            }
        }
    }
    /// Returns the number of tracked entities.
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }
    /// Returns true if no entity is tracked.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }
    /// Returns `true` if `entity` currently satisfies one of the matchers.
    pub fn contains(&self, entity: Entity) -> bool {
        self.state.borrow().contains(entity)
    }
    /// Visits every tracked entity.
    pub fn each(&self, mut f: impl FnMut(Entity)) {
        let state = self.state.borrow();
        for entity in state.entities() {
            f(entity);
        }
    }
    /// Visits every tracked entity, then forgets them all.
    pub fn drain(&mut self, mut f: impl FnMut(Entity)) {
        let mut state = self.state.borrow_mut();
        for index in (0..state.len()).rev() {
            f(state.id_at(index).unwrap());
        }
        state.clear();
    }
    /// Forgets every tracked entity without visiting them.
    pub fn clear(&mut self) {
        self.state.borrow_mut().clear();
    }
}
