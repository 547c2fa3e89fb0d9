//! Shared, initialize-on-first-use slot for the model runtime.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::error::BackendError;

type PendingRuntime<L> = Shared<LocalBoxFuture<'static, Result<Rc<L>, BackendError>>>;

enum Slot<L> {
    Empty,
    Pending(PendingRuntime<L>),
    Ready(Rc<L>),
}

/// Cache for the loader runtime, shared by every session that holds a clone.
///
/// The first `get_or_init` starts initialization; callers arriving while it
/// is in flight await the same future. A failed initialization empties the
/// slot so the next caller tries again.
pub struct LoaderCache<L> {
    slot: Rc<RefCell<Slot<L>>>,
}

impl<L> Clone for LoaderCache<L> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<L: 'static> Default for LoaderCache<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> fmt::Debug for LoaderCache<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.slot.borrow() {
            Slot::Empty => "empty",
            Slot::Pending(_) => "pending",
            Slot::Ready(_) => "ready",
        };
        f.debug_struct("LoaderCache").field("state", &state).finish()
    }
}

impl<L: 'static> LoaderCache<L> {
    pub fn new() -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot::Empty)),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.slot.borrow(), Slot::Ready(_))
    }

    /// Return the cached runtime, starting `init` only if nothing is cached
    /// or in flight.
    pub fn get_or_init<F>(&self, init: F) -> LocalBoxFuture<'static, Result<Rc<L>, BackendError>>
    where
        F: FnOnce() -> LocalBoxFuture<'static, Result<L, BackendError>>,
    {
        let pending = {
            let mut slot = self.slot.borrow_mut();
            let in_flight = match &*slot {
                Slot::Ready(loader) => {
                    let loader = Rc::clone(loader);
                    return async move { Ok(loader) }.boxed_local();
                }
                Slot::Pending(fut) => Some(fut.clone()),
                Slot::Empty => None,
            };
            match in_flight {
                Some(fut) => fut,
                None => {
                    log::debug!("loader runtime: initializing");
                    let fut = init().map(|r| r.map(Rc::new)).boxed_local().shared();
                    *slot = Slot::Pending(fut.clone());
                    fut
                }
            }
        };

        let slot = Rc::clone(&self.slot);
        async move {
            let result = pending.clone().await;
            let mut slot = slot.borrow_mut();
            // Only the first waiter of the future still in the slot updates it;
            // a newer initialization may have replaced it meanwhile.
            if matches!(&*slot, Slot::Pending(current) if current.ptr_eq(&pending)) {
                match &result {
                    Ok(loader) => *slot = Slot::Ready(Rc::clone(loader)),
                    Err(e) => {
                        log::warn!("loader runtime failed to initialize: {e}");
                        *slot = Slot::Empty;
                    }
                }
            }
            result
        }
        .boxed_local()
    }
}
