//! Blocking FIFO shared between producer and consumer threads
//!
//! Besides plain FIFO traffic the queue supports removal of arbitrary items
//! by predicate, a full flush, and an abort switch that releases every
//! blocked reader at once. A `parking_lot` mutex and condition variable
//! cover all of it.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Outcome of [`Queue::get`]
#[derive(Debug, PartialEq, Eq)]
pub enum QueueRead<T> {
    Item(T),
    /// Nothing queued and the caller did not ask to block
    Empty,
    /// Nothing queued and the queue has been aborted
    Aborted,
}

impl<T> QueueRead<T> {
    pub fn into_item(self) -> Option<T> {
        match self {
            QueueRead::Item(item) => Some(item),
            _ => None,
        }
    }
}

/// Hook run on every item the queue discards through purge or flush.
///
/// Called after the queue lock has been released.
pub trait QueueHandler<T>: Send + Sync {
    fn cleanup(&self, item: T);
}

struct State<T> {
    items: VecDeque<T>,
    aborted: bool,
}

/// Thread-safe FIFO with abort, purge and flush
pub struct Queue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    handler: Option<Arc<dyn QueueHandler<T>>>,
}

impl<T> Queue<T> {
    /// Create a queue that simply drops discarded items
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                aborted: false,
            }),
            not_empty: Condvar::new(),
            handler: None,
        }
    }

    /// Create a queue that hands discarded items to `handler`
    pub fn with_handler(handler: Arc<dyn QueueHandler<T>>) -> Self {
        Self {
            handler: Some(handler),
            ..Self::new()
        }
    }

    /// Append an item and wake one waiting reader
    pub fn put(&self, item: T) {
        let mut state = self.state.lock();
        state.items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Remove the head item.
    ///
    /// With `block` the caller sleeps until an item arrives or the queue is
    /// aborted. Items queued before an abort are still handed out.
    pub fn get(&self, block: bool) -> QueueRead<T> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return QueueRead::Item(item);
            }
            if state.aborted {
                return QueueRead::Aborted;
            }
            if !block {
                return QueueRead::Empty;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Remove every item matching `predicate`, keeping the rest in order.
    ///
    /// Returns how many items were removed. Cleanup runs after the lock is
    /// released.
    pub fn purge<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let removed: Vec<T> = {
            let mut state = self.state.lock();
            let mut removed = Vec::new();
            let mut kept = VecDeque::with_capacity(state.items.len());
            for item in state.items.drain(..) {
                if predicate(&item) {
                    removed.push(item);
                } else {
                    kept.push_back(item);
                }
            }
            state.items = kept;
            removed
        };

        let count = removed.len();
        self.discard(removed);
        count
    }

    /// Remove and clean up every item
    pub fn flush(&self) -> usize {
        let removed: Vec<T> = self.state.lock().items.drain(..).collect();
        let count = removed.len();
        self.discard(removed);
        count
    }

    /// Release all waiting readers; blocking reads stop waiting until `reset`
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        self.not_empty.notify_all();
    }

    /// Clear the aborted flag
    pub fn reset(&self) {
        self.state.lock().aborted = false;
    }

    pub fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    fn discard(&self, removed: Vec<T>) {
        match &self.handler {
            Some(handler) => removed.into_iter().for_each(|item| handler.cleanup(item)),
            None => drop(removed),
        }
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}
