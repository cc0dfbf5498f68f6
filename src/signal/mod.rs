use crate::entity::Entity;
use alloc::rc::Rc;
use alloc::vec::Vec;

/// Identity of a connected listener: the function address plus the payload
/// address, zero when there is no payload.
///
/// Two delegates are equal iff both parts are equal, which is what makes
/// [`Sink::connect`] idempotent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DelegateKey {
    func: usize,
    payload: usize,
}

/// A connected listener: a plain function pointer, optionally bound to an
/// `Rc` payload.
///
/// The payload is owned by the delegate, disconnecting releases it; no
/// listener can outlive the data it was bound to.
pub struct Delegate<C, R = ()> {
    key: DelegateKey,
    call: Rc<dyn Fn(&C, Entity) -> R>,
}

impl<C, R> Clone for Delegate<C, R> {
    fn clone(&self) -> Self {
        Delegate {
            key: self.key,
            call: self.call.clone(),
        }
    }
}

impl<C: 'static, R: 'static> Delegate<C, R> {
    /// Wraps a free function.
    pub fn from_fn(f: fn(&C, Entity) -> R) -> Self {
        Delegate {
            key: DelegateKey {
                func: f as usize,
                payload: 0,
            },
            call: Rc::new(move |ctx: &C, entity: Entity| f(ctx, entity)),
        }
    }
    /// Wraps a function bound to a shared payload.
    pub fn with_payload<P: 'static>(f: fn(&P, &C, Entity) -> R, payload: Rc<P>) -> Self {
        Delegate {
            key: DelegateKey {
                func: f as usize,
                payload: Rc::as_ptr(&payload) as usize,
            },
            call: Rc::new(move |ctx: &C, entity: Entity| f(&payload, ctx, entity)),
        }
    }
    /// Returns this delegate's identity.
    #[inline]
    pub fn key(&self) -> DelegateKey {
        self.key
    }
    /// Invokes the wrapped function.
    #[inline]
    pub fn invoke(&self, ctx: &C, entity: Entity) -> R {
        (*self.call)(ctx, entity)
    }
}

/// Ordered list of listeners sharing a `(context, entity)` signature.
///
/// `C` is the borrowed context handed to every listener, `R` their return
/// type. The registry instantiates `Signal<Registry>` for its three
/// per-pool change signals.
pub struct Signal<C, R = ()> {
    delegates: Vec<Delegate<C, R>>,
}

impl<C, R> Default for Signal<C, R> {
    fn default() -> Self {
        Signal {
            delegates: Vec::new(),
        }
    }
}

impl<C: 'static, R: 'static> Signal<C, R> {
    pub fn new() -> Self {
        Default::default()
    }
    /// Returns the number of connected listeners.
    #[inline]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }
    /// Returns true if no listener is connected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
    /// Invokes every listener in connection order.
    ///
    /// Publishing walks a snapshot of the current list: listeners connected
    /// or disconnected while publishing take effect from the next publish.
    pub fn publish(&self, ctx: &C, entity: Entity) {
        for call in self.snapshot() {
            (*call)(ctx, entity);
        }
    }
    /// Invokes every listener in order, feeding each return value to `sieve`,
    /// and stops as soon as `sieve` returns `true`.
    pub fn collect(&self, ctx: &C, entity: Entity, mut sieve: impl FnMut(R) -> bool) {
        for call in self.snapshot() {
            if sieve((*call)(ctx, entity)) {
                break;
            }
        }
    }
    /// Returns the write-side handle of this signal.
    #[inline]
    pub fn sink(&mut self) -> Sink<'_, C, R> {
        Sink {
            signal: self,
            offset: 0,
        }
    }
    #[allow(clippy::type_complexity)]
    pub(crate) fn snapshot(&self) -> Vec<Rc<dyn Fn(&C, Entity) -> R>> {
        self.delegates.iter().map(|d| d.call.clone()).collect()
    }
}

/// Write-side handle over a [`Signal`].
///
/// A fresh sink appends at the end of the listener list; the `before_*`
/// adaptors move the insertion point in front of an existing listener. The
/// insertion point is an offset from the end of the list, so it keeps
/// pointing in front of the matched listener while later sinks append.
pub struct Sink<'a, C, R = ()> {
    signal: &'a mut Signal<C, R>,
    offset: usize,
}

impl<C: 'static, R: 'static> Sink<'_, C, R> {
    /// Connects a free function. If an identical listener is already
    /// connected it is removed first, connecting twice leaves one
    /// connection.
    pub fn connect(&mut self, f: fn(&C, Entity) -> R) -> DelegateKey {
        self.insert(Delegate::from_fn(f))
    }
    /// Connects a function bound to a shared payload. Idempotent on the
    /// `(function, payload)` pair.
    pub fn connect_with<P: 'static>(
        &mut self,
        f: fn(&P, &C, Entity) -> R,
        payload: Rc<P>,
    ) -> DelegateKey {
        self.insert(Delegate::with_payload(f, payload))
    }
    fn insert(&mut self, delegate: Delegate<C, R>) -> DelegateKey {
        let key = delegate.key();
        self.signal.delegates.retain(|d| d.key() != key);
        let at = self.signal.delegates.len() - self.offset.min(self.signal.delegates.len());
        self.signal.delegates.insert(at, delegate);
        key
    }
    /// Disconnects every listener wrapping `f`, whatever their payload.
    pub fn disconnect(&mut self, f: fn(&C, Entity) -> R) {
        let func = f as usize;
        self.signal.delegates.retain(|d| d.key().func != func);
    }
    /// Disconnects the listener matching `(f, payload)` exactly.
    pub fn disconnect_with<P: 'static>(&mut self, f: fn(&P, &C, Entity) -> R, payload: &Rc<P>) {
        let key = DelegateKey {
            func: f as usize,
            payload: Rc::as_ptr(payload) as usize,
        };
        self.disconnect_key(key);
    }
    /// Disconnects every listener bound to `payload`, whatever their
    /// function.
    pub fn disconnect_payload<P: 'static>(&mut self, payload: &Rc<P>) {
        let payload = Rc::as_ptr(payload) as usize;
        self.signal.delegates.retain(|d| d.key().payload != payload);
    }
    pub(crate) fn disconnect_key(&mut self, key: DelegateKey) {
        self.signal.delegates.retain(|d| d.key() != key);
    }
    /// Disconnects every listener.
    pub fn clear(&mut self) {
        self.signal.delegates.clear();
    }
    /// Returns a sink whose subsequent connections insert in front of the
    /// listener wrapping `f`. Without a match the insertion point stays at
    /// the end.
    pub fn before(self, f: fn(&C, Entity) -> R) -> Self {
        let func = f as usize;
        let position = self.signal.delegates.iter().position(|d| d.key().func == func);
        self.before_position(position)
    }
    /// Returns a sink whose subsequent connections insert in front of the
    /// listener identified by `key`.
    pub fn before_key(self, key: DelegateKey) -> Self {
        let position = self.signal.delegates.iter().position(|d| d.key() == key);
        self.before_position(position)
    }
    fn before_position(self, position: Option<usize>) -> Self {
        let offset = match position {
            Some(position) => self.signal.delegates.len() - position,
            None => 0,
        };
        Sink {
            signal: self.signal,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    fn push_one(log: &RefCell<Vec<u32>>, _: &u32, entity: Entity) {
        log.borrow_mut().push(entity.index());
    }

    #[test]
    fn connect_is_idempotent() {
        fn listener(_: &u32, _: Entity) {}

        let mut signal = Signal::<u32>::new();
        signal.sink().connect(listener);
        signal.sink().connect(listener);

        assert_eq!(signal.len(), 1);
    }

    #[test]
    fn distinct_payloads_are_distinct_listeners() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let other = Rc::new(RefCell::new(Vec::new()));

        let mut signal = Signal::<u32>::new();
        signal.sink().connect_with(push_one, log.clone());
        signal.sink().connect_with(push_one, other.clone());
        signal.sink().connect_with(push_one, log.clone());

        assert_eq!(signal.len(), 2);

        signal.publish(&0, Entity::new(4));
        assert_eq!(*log.borrow(), [4]);
        assert_eq!(*other.borrow(), [4]);
    }

    #[test]
    fn before_inserts_in_front() {
        fn first(ctx: &Rc<RefCell<Vec<u32>>>, _: Entity) {
            ctx.borrow_mut().push(1);
        }
        fn second(ctx: &Rc<RefCell<Vec<u32>>>, _: Entity) {
            ctx.borrow_mut().push(2);
        }

        let mut signal = Signal::<Rc<RefCell<Vec<u32>>>>::new();
        signal.sink().connect(first);
        signal.sink().before(first).connect(second);

        let log = Rc::new(RefCell::new(Vec::new()));
        signal.publish(&log, Entity::new(0));

        assert_eq!(*log.borrow(), [2, 1]);
    }

    #[test]
    fn collect_stops_early() {
        fn one(_: &u32, _: Entity) -> u32 {
            1
        }
        fn two(_: &u32, _: Entity) -> u32 {
            2
        }
        fn three(_: &u32, _: Entity) -> u32 {
            3
        }

        let mut signal = Signal::<u32, u32>::new();
        signal.sink().connect(one);
        signal.sink().connect(two);
        signal.sink().connect(three);

        let mut seen = Vec::new();
        signal.collect(&0, Entity::new(0), |value| {
            seen.push(value);
            value == 2
        });

        assert_eq!(seen, [1, 2]);
    }

    #[test]
    fn disconnect_by_payload() {
        let log = Rc::new(RefCell::new(Vec::new()));

        let mut signal = Signal::<u32>::new();
        signal.sink().connect_with(push_one, log.clone());
        signal.sink().disconnect_payload(&log);

        assert!(signal.is_empty());

        signal.publish(&0, Entity::new(0));
        assert!(log.borrow().is_empty());
    }
}
