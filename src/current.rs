// wglcore/src/current.rs
//
//! The calling thread's current context.
//!
//! Every `Wgl` keeps its own entry, keyed by instance. A missing entry is the null table: no
//! current context, and every GL query answers "nothing".
//!
//! Entries only hold the driver weakly. The handle table keeps the driver of a current context
//! alive, so an entry whose driver is gone belongs to a dropped `Wgl` and reads as missing.

use crate::driver::DriverTable;
use crate::handle::Handle;

use fnv::FnvHashMap;
use std::cell::RefCell;
use std::sync::{Arc, Weak};

/// What a thread has current for one `Wgl`.
#[derive(Clone)]
pub(crate) struct CurrentState {
    pub(crate) context: Handle,
    pub(crate) funcs: Arc<DriverTable>,
}

struct Entry {
    context: Handle,
    funcs: Weak<DriverTable>,
}

impl Entry {
    #[inline]
    fn is_live(&self) -> bool {
        self.funcs.strong_count() > 0
    }
}

thread_local! {
    static CURRENT: RefCell<FnvHashMap<u64, Entry>> = RefCell::new(FnvHashMap::default());
}

pub(crate) fn get(instance: u64) -> Option<CurrentState> {
    CURRENT
        .try_with(|current| {
            let current = current.borrow();
            let entry = current.get(&instance)?;
            Some(CurrentState { context: entry.context, funcs: entry.funcs.upgrade()? })
        })
        .ok()
        .flatten()
}

pub(crate) fn context(instance: u64) -> Option<Handle> {
    CURRENT
        .try_with(|current| {
            current.borrow().get(&instance).filter(|entry| entry.is_live()).map(|entry| entry.context)
        })
        .ok()
        .flatten()
}

pub(crate) fn set(instance: u64, state: CurrentState) {
    // Thread teardown may already have destroyed the map; there is nothing to record then.
    let _ = CURRENT.try_with(|current| {
        let mut current = current.borrow_mut();
        current.retain(|_, entry| entry.is_live());
        current.insert(instance, Entry { context: state.context, funcs: Arc::downgrade(&state.funcs) });
    });
}

/// Switches the thread back to the null table, returning the context that was current.
pub(crate) fn clear(instance: u64) -> Option<Handle> {
    CURRENT
        .try_with(|current| current.borrow_mut().remove(&instance).map(|entry| entry.context))
        .ok()
        .flatten()
}

#[cfg(test)]
pub(crate) fn entry_count() -> usize {
    CURRENT.try_with(|current| current.borrow().len()).unwrap_or(0)
}
