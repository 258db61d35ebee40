//! Synchronous publish/subscribe with snapshot dispatch.
//!
//! - Dispatch iterates the listener list as it was when the dispatch started; listeners
//!   subscribed mid-dispatch are first notified by the next one.
//! - Unsubscribing mid-dispatch takes effect immediately for listeners whose turn has not
//!   come yet. A listener that already ran for the in-progress dispatch is unaffected.
//! - Subscribing the same `Arc` twice is a no-op (identity, not equality).
//! - A panicking listener is logged and skipped; the rest are still notified.
//! - Nesting is counted per thread: concurrent dispatches on other threads never count
//!   towards [`MAX_DISPATCH_DEPTH`].

use arc_swap::ArcSwap;
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{
    Arc, Mutex, Weak,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

/// Nested dispatch depth (a listener re-publishing from inside its own notification) at
/// which further notifications are dropped.
pub const MAX_DISPATCH_DEPTH: usize = 8;

pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct Entry<L: ?Sized> {
    id: u64,
    listener: Arc<L>,
    active: Arc<AtomicBool>,
}

struct SetInner<L: ?Sized> {
    name: &'static str,
    entries: ArcSwap<Vec<Arc<Entry<L>>>>,
    write_lock: Mutex<()>,
    next_id: AtomicU64,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<L: ?Sized + Send + Sync + 'static> Detach for SetInner<L> {
    fn detach(&self, id: u64) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = self.entries.load();
        if !current.iter().any(|e| e.id == id) {
            return;
        }
        let next: Vec<_> = current.iter().filter(|e| e.id != id).cloned().collect();
        self.entries.store(Arc::new(next));
    }
}

/// Ordered set of listeners of type `L` (usually a `dyn Fn(..)` trait object).
pub struct ListenerSet<L: ?Sized> {
    inner: Arc<SetInner<L>>,
}

impl<L: ?Sized + Send + Sync + 'static> ListenerSet<L> {
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(SetInner {
                name,
                entries: ArcSwap::from_pointee(Vec::new()),
                write_lock: Mutex::new(()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self, listener: Arc<L>) -> Subscription {
        let _guard = self
            .inner
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let current = self.inner.entries.load_full();
        // An entry already flagged inactive is on its way out; register a fresh one.
        if let Some(existing) = current
            .iter()
            .find(|e| e.active.load(Ordering::Acquire) && Arc::ptr_eq(&e.listener, &listener))
        {
            return self.subscription_for(existing);
        }

        let entry = Arc::new(Entry {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            listener,
            active: Arc::new(AtomicBool::new(true)),
        });
        let subscription = self.subscription_for(&entry);

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(entry);
        self.inner.entries.store(Arc::new(next));

        subscription
    }

    /// Invoke every listener registered at call time, in subscription order, through
    /// `invoke`.
    ///
    /// Returns how many listeners ran (including ones that panicked).
    pub fn dispatch(&self, mut invoke: impl FnMut(&L)) -> usize {
        let Some(_depth_guard) = DepthGuard::enter() else {
            log::warn!(
                "{}: nested dispatch depth {} reached, dropping notification (listener cycle?)",
                self.inner.name,
                MAX_DISPATCH_DEPTH
            );
            return 0;
        };

        let snapshot = self.inner.entries.load_full();
        let mut notified = 0usize;
        for entry in snapshot.iter() {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }
            notified += 1;
            let listener = &*entry.listener;
            if catch_unwind(AssertUnwindSafe(|| invoke(listener))).is_err() {
                log::error!(
                    "{}: listener #{} panicked during dispatch; continuing with the rest",
                    self.inner.name,
                    entry.id
                );
            }
        }
        notified
    }

    fn subscription_for(&self, entry: &Arc<Entry<L>>) -> Subscription {
        let inner: Arc<dyn Detach> = self.inner.clone();
        Subscription {
            id: entry.id,
            active: entry.active.clone(),
            set: Arc::downgrade(&inner),
        }
    }
}

impl<T: 'static> ListenerSet<dyn Fn(&T) + Send + Sync + 'static> {
    pub fn emit(&self, payload: &T) -> usize {
        self.dispatch(|listener| listener(payload))
    }
}

impl ListenerSet<dyn Fn() + Send + Sync + 'static> {
    pub fn notify(&self) -> usize {
        self.dispatch(|listener| listener())
    }
}

/// One level of dispatch on the current thread; released on drop (including unwinding).
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Option<Self> {
        DISPATCH_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= MAX_DISPATCH_DEPTH {
                return None;
            }
            depth.set(current + 1);
            Some(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Handle returned by `subscribe`. Dropping it does NOT unsubscribe.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    set: Weak<dyn Detach>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Remove the listener. Idempotent.
    pub fn unsubscribe(&self) {
        // Flag first so an in-progress dispatch skips it even before the list is rewritten.
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(set) = self.set.upgrade() {
            set.detach(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    type U32Set = ListenerSet<dyn Fn(&u32) + Send + Sync>;

    fn recorder() -> (Arc<StdMutex<Vec<String>>>, impl Fn(&str) -> Listener<u32>) {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let log_for_make = log.clone();
        let make = move |name: &str| -> Listener<u32> {
            let log = log_for_make.clone();
            let name = name.to_string();
            Arc::new(move |v: &u32| log.lock().unwrap().push(format!("{name}:{v}")))
        };
        (log, make)
    }

    #[test]
    fn notifies_in_subscription_order_once_each() {
        let set = U32Set::new("test");
        let (log, make) = recorder();
        set.subscribe(make("a"));
        set.subscribe(make("b"));
        set.subscribe(make("c"));

        assert_eq!(set.emit(&1), 3);
        assert_eq!(set.emit(&2), 3);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:1", "b:1", "c:1", "a:2", "b:2", "c:2"]
        );
    }

    #[test]
    fn duplicate_subscription_is_idempotent() {
        let set = U32Set::new("test");
        let (log, make) = recorder();
        let listener = make("a");
        let first = set.subscribe(listener.clone());
        let second = set.subscribe(listener);

        assert_eq!(first.id(), second.id());
        assert_eq!(set.len(), 1);
        set.emit(&7);
        assert_eq!(*log.lock().unwrap(), vec!["a:7"]);

        second.unsubscribe();
        assert!(!first.is_active());
        assert!(set.is_empty());
    }

    #[test]
    fn unsubscribe_before_turn_skips_listener() {
        let set = U32Set::new("test");
        let (log, make) = recorder();
        let victim: Arc<StdMutex<Option<Subscription>>> = Arc::new(StdMutex::new(None));

        let victim_for_a = victim.clone();
        let log_for_a = log.clone();
        set.subscribe(Arc::new(move |v: &u32| {
            log_for_a.lock().unwrap().push(format!("a:{v}"));
            if let Some(sub) = victim_for_a.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        }));
        let b = set.subscribe(make("b"));
        *victim.lock().unwrap() = Some(b);

        assert_eq!(set.emit(&1), 1);
        assert_eq!(*log.lock().unwrap(), vec!["a:1"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn subscribe_during_dispatch_waits_for_next_emit() {
        let set = Arc::new(U32Set::new("test"));
        let (log, make) = recorder();
        let late = make("late");

        let set_for_a = set.clone();
        set.subscribe(Arc::new(move |_: &u32| {
            set_for_a.subscribe(late.clone());
        }));

        set.emit(&1);
        assert!(log.lock().unwrap().is_empty());
        set.emit(&2);
        assert_eq!(*log.lock().unwrap(), vec!["late:2"]);
    }

    #[test]
    fn panicking_listener_does_not_stop_dispatch() {
        let set = U32Set::new("test");
        let (log, make) = recorder();
        set.subscribe(Arc::new(|_: &u32| panic!("listener failure")));
        set.subscribe(make("b"));

        assert_eq!(set.emit(&3), 2);
        assert_eq!(*log.lock().unwrap(), vec!["b:3"]);
    }

    #[test]
    fn recursive_emit_terminates() {
        let set = Arc::new(U32Set::new("test"));
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let set_for_listener = set.clone();
        let calls_for_listener = calls.clone();
        set.subscribe(Arc::new(move |v: &u32| {
            calls_for_listener.fetch_add(1, Ordering::SeqCst);
            set_for_listener.emit(&(v + 1));
        }));

        set.emit(&0);
        assert_eq!(calls.load(Ordering::SeqCst), MAX_DISPATCH_DEPTH);
    }

    #[test]
    fn unsubscribe_after_set_dropped_is_harmless() {
        let set = U32Set::new("test");
        let (_log, make) = recorder();
        let sub = set.subscribe(make("a"));
        drop(set);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn deactivated_entry_is_not_reused_by_subscribe() {
        let set = U32Set::new("test");
        let (log, make) = recorder();
        let listener = make("a");
        let stale = set.subscribe(listener.clone());
        // Flag cleared, list not yet rewritten: the window a concurrent unsubscribe leaves.
        stale.active.store(false, Ordering::Release);

        let fresh = set.subscribe(listener);
        assert_ne!(stale.id(), fresh.id());
        assert!(fresh.is_active());

        assert_eq!(set.emit(&1), 1);
        stale.set.upgrade().unwrap().detach(stale.id());
        assert_eq!(set.emit(&2), 1);
        assert_eq!(*log.lock().unwrap(), vec!["a:1", "a:2"]);
    }

    #[test]
    fn concurrent_dispatches_are_not_nesting() {
        const THREADS: usize = 10;
        let set = Arc::new(U32Set::new("test"));
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let calls_for_listener = calls.clone();
        set.subscribe(Arc::new(move |_: &u32| {
            std::thread::sleep(std::time::Duration::from_millis(50));
            calls_for_listener.fetch_add(1, Ordering::SeqCst);
        }));

        let barrier = std::sync::Barrier::new(THREADS);
        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let set = &set;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    assert_eq!(set.emit(&(t as u32)), 1);
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), THREADS);
    }

    #[test]
    fn unit_listeners_are_notified() {
        let set = ListenerSet::<dyn Fn() + Send + Sync>::new("test");
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let calls_for_listener = calls.clone();
        let listener: Arc<dyn Fn() + Send + Sync> = Arc::new(move || {
            calls_for_listener.fetch_add(1, Ordering::SeqCst);
        });
        set.subscribe(listener.clone());
        set.subscribe(listener);
        assert_eq!(set.notify(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
