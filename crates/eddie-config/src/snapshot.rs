//! Observable holder for the current resolved configuration.
//!
//! [`SnapshotStore`] is a constructed instance, shared by handle (usually an
//! `Arc`). Readers get clones; writers hand over a value that is compared with
//! the current one and only broadcast to listeners when it differs.
//!
//! Listeners run synchronously, in subscription order, on the thread that
//! called [`SnapshotStore::set_snapshot`], and never while the store's lock is
//! held. A listener may call `set_snapshot` itself: the nested value is queued
//! and delivered once the current round of notifications has finished.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct State<T> {
    current: T,
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
    pending: VecDeque<T>,
    dispatching: bool,
}

/// Holds the latest snapshot and notifies subscribers on real change.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use eddie_config::{ResolvedConfig, SnapshotStore};
///
/// let store = SnapshotStore::new(ResolvedConfig::default());
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&seen);
/// let _subscription = store.subscribe(move |_config: &ResolvedConfig| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// let mut next = store.get_snapshot();
/// next.model = "gpt-4o".to_string();
/// store.set_snapshot(next.clone());
/// store.set_snapshot(next);
///
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct SnapshotStore<T> {
    state: Arc<Mutex<State<T>>>,
}

impl<T> SnapshotStore<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Create a store holding `initial`. No notification is sent for it.
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                current: initial,
                listeners: Vec::new(),
                next_id: 0,
                pending: VecDeque::new(),
                dispatching: false,
            })),
        }
    }

    /// Clone of the current snapshot.
    pub fn get_snapshot(&self) -> T {
        self.state.lock().current.clone()
    }

    /// Replace the current snapshot.
    ///
    /// Returns `true` if the value differed from the previous snapshot and
    /// was (or, for a nested call from a listener, will be) broadcast.
    pub fn set_snapshot(&self, next: T) -> bool {
        {
            let mut state = self.state.lock();
            if state.dispatching {
                let changed = state.pending.back().unwrap_or(&state.current) != &next;
                if changed {
                    state.pending.push_back(next);
                }
                return changed;
            }
            if state.current == next {
                return false;
            }
            state.current = next;
            state.dispatching = true;
        }

        self.dispatch();
        true
    }

    /// Register `listener`; it runs for every change after this call.
    ///
    /// Dropping the returned [`Subscription`] does not unsubscribe; call
    /// [`Subscription::unsubscribe`] to stop receiving updates.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push((id, Arc::new(listener)));

        let weak: Weak<Mutex<State<T>>> = Arc::downgrade(&self.state);
        Subscription {
            remove: Some(Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.lock().listeners.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Number of active listeners.
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    // Runs with `dispatching` set; drains values queued by listeners.
    fn dispatch(&self) {
        let _reset = DispatchReset(&self.state);
        loop {
            let (value, listeners) = {
                let state = self.state.lock();
                let listeners: Vec<Listener<T>> = state
                    .listeners
                    .iter()
                    .map(|(_, listener)| Arc::clone(listener))
                    .collect();
                (state.current.clone(), listeners)
            };

            for listener in &listeners {
                listener(&value);
            }

            let mut state = self.state.lock();
            loop {
                match state.pending.pop_front() {
                    Some(next) if next == state.current => {}
                    Some(next) => {
                        state.current = next;
                        break;
                    }
                    None => {
                        state.dispatching = false;
                        return;
                    }
                }
            }
        }
    }
}

/// Ends a dispatch round if a listener unwinds out of it. The panicking
/// value stays current; values queued during the round are discarded.
struct DispatchReset<'a, T>(&'a Mutex<State<T>>);

impl<T> Drop for DispatchReset<'_, T> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        if state.dispatching {
            state.dispatching = false;
            state.pending.clear();
        }
    }
}

impl<T> Clone for SnapshotStore<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for SnapshotStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SnapshotStore")
            .field("listeners", &state.listeners.len())
            .field("pending", &state.pending.len())
            .finish_non_exhaustive()
    }
}

/// Handle returned by [`SnapshotStore::subscribe`].
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Stop delivering updates to this listener.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}
