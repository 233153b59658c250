// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Context registry and thread binding
//!
//! Contexts generated here live in a process-wide registry, guarded by a
//! nestable lock. Each thread has at most one current context and each
//! context is current to at most one thread. A context deleted while current
//! is destroyed when it is released.
//!
//! The commands of [`crate::commands`] operate on the calling thread's
//! current context via [`with_current`].

use crate::env::catalogs_from_env;
use crate::fonts::Position;
use crate::raster::RecordingTarget;
use crate::{Context, GlcError};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::{Arc, Condvar, LazyLock, Mutex, PoisonError, TryLockError};
use std::thread::{self, ThreadId};

/// Context identifier
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub(crate) u32);

impl ContextId {
    /// Get the raw identifier
    pub fn get(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    depth: usize,
}

/// A mutex which may be locked again by the thread holding it
///
/// The lock is released when the outermost guard is dropped. Guards only
/// give shared access; use interior mutability for updates.
pub(crate) struct ReentrantMutex<T> {
    state: Mutex<LockState>,
    released: Condvar,
    data: T,
}

// SAFETY: `data` is only reachable through a guard, and guards exist on at
// most one thread at a time (the owner). Guards are not `Send`.
unsafe impl<T: Send> Sync for ReentrantMutex<T> {}

impl<T> ReentrantMutex<T> {
    pub(crate) fn new(data: T) -> Self {
        ReentrantMutex {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
            data,
        }
    }

    pub(crate) fn lock(&self) -> ReentrantGuard<'_, T> {
        let me = thread::current().id();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match state.owner {
                None => {
                    state.owner = Some(me);
                    state.depth = 1;
                    break;
                }
                Some(owner) if owner == me => {
                    state.depth += 1;
                    break;
                }
                Some(_) => {
                    state = self
                        .released
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        ReentrantGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).depth
    }
}

pub(crate) struct ReentrantGuard<'a, T> {
    lock: &'a ReentrantMutex<T>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, T> Deref for ReentrantGuard<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.lock.data
    }
}

impl<'a, T> Drop for ReentrantGuard<'a, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.lock.released.notify_one();
        }
    }
}

struct Entry {
    id: ContextId,
    context: Arc<Mutex<Context>>,
    owner: Option<ThreadId>,
    pending_delete: bool,
}

#[derive(Default)]
struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    fn entry_mut(&mut self, id: ContextId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

static REGISTRY: LazyLock<ReentrantMutex<RefCell<Registry>>> =
    LazyLock::new(|| ReentrantMutex::new(RefCell::new(Registry::default())));

/// The calling thread's binding; releases the context when dropped
struct Binding {
    id: ContextId,
    context: Arc<Mutex<Context>>,
}

impl Drop for Binding {
    fn drop(&mut self) {
        let guard = REGISTRY.lock();
        let mut registry = guard.borrow_mut();
        let Some(index) = registry.entries.iter().position(|e| e.id == self.id) else {
            return;
        };
        let entry = &mut registry.entries[index];
        entry.owner = None;
        if entry.pending_delete {
            log::debug!("releasing deleted context {:?}", self.id);
            // the context itself is dropped with the last Arc
            registry.entries.remove(index);
        }
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Binding>> = const { RefCell::new(None) };
}

/// Register a context, returning its identifier
///
/// The identifier is one more than that of the most recently registered
/// live context (starting at 1).
pub fn register(context: Context) -> ContextId {
    let guard = REGISTRY.lock();
    let mut registry = guard.borrow_mut();
    let id = ContextId(registry.entries.last().map_or(1, |e| e.id.0 + 1));
    registry.entries.push(Entry {
        id,
        context: Arc::new(Mutex::new(context)),
        owner: None,
        pending_delete: false,
    });
    log::debug!("register: context {id:?}");
    id
}

/// Generate a context
///
/// The context draws to a [`RecordingTarget`] with the default glyph engine
/// and scanner. Catalogs listed in the environment (see
/// [`catalogs_from_env`]) are appended; those which cannot be added are
/// skipped.
pub fn gen_context() -> ContextId {
    let mut context = Context::new(Box::new(RecordingTarget::new()));
    for path in catalogs_from_env() {
        if let Err(err) = context.add_catalog(&path, Position::Append) {
            log::warn!("gen_context: skipping catalog {}: {err}", path.display());
        }
    }
    register(context)
}

/// True if `id` names a live context
pub fn is_context(id: ContextId) -> bool {
    let guard = REGISTRY.lock();
    let registry = guard.borrow();
    registry.entries.iter().any(|e| e.id == id && !e.pending_delete)
}

/// Identifiers of all live contexts
pub fn all_contexts() -> Vec<ContextId> {
    let guard = REGISTRY.lock();
    let registry = guard.borrow();
    registry
        .entries
        .iter()
        .filter(|e| !e.pending_delete)
        .map(|e| e.id)
        .collect()
}

/// Delete a context
///
/// A context current to some thread is marked and destroyed on release.
/// Fails with [`GlcError::Parameter`] if `id` is not a live context.
pub fn delete_context(id: ContextId) -> Result<(), GlcError> {
    let guard = REGISTRY.lock();
    let mut registry = guard.borrow_mut();
    let Some(index) = registry
        .entries
        .iter()
        .position(|e| e.id == id && !e.pending_delete)
    else {
        return Err(GlcError::Parameter);
    };
    if registry.entries[index].owner.is_some() {
        log::debug!("delete_context: {id:?} is current; deferred");
        registry.entries[index].pending_delete = true;
    } else {
        let entry = registry.entries.remove(index);
        // drop the context outside the registry borrow
        drop(registry);
        drop(entry);
    }
    Ok(())
}

/// Make `id` current to the calling thread, or release the current context
///
/// Fails with [`GlcError::Parameter`] if `id` is not a live context and with
/// [`GlcError::State`] if it is current to another thread or if the calling
/// thread is inside a command of its current context (such as the
/// unmapped-code handler).
pub fn make_current(id: Option<ContextId>) -> Result<(), GlcError> {
    let guard = REGISTRY.lock();

    let busy = CURRENT.with(|current| match *current.borrow() {
        Some(ref binding) => matches!(binding.context.try_lock(), Err(TryLockError::WouldBlock)),
        None => false,
    });
    if busy {
        return Err(GlcError::State);
    }
    if id.is_some() && id == current_context() {
        return Ok(());
    }

    let binding = match id {
        None => None,
        Some(id) => {
            let mut registry = guard.borrow_mut();
            let me = thread::current().id();
            let entry = registry
                .entry_mut(id)
                .filter(|e| !e.pending_delete)
                .ok_or(GlcError::Parameter)?;
            if entry.owner.is_some_and(|owner| owner != me) {
                return Err(GlcError::State);
            }
            entry.owner = Some(me);
            Some(Binding {
                id,
                context: entry.context.clone(),
            })
        }
    };

    // the old binding (if any) releases its context on drop
    let old = CURRENT.with(|current| current.replace(binding));
    drop(old);
    drop(guard);
    Ok(())
}

/// The calling thread's current context
pub fn current_context() -> Option<ContextId> {
    CURRENT.with(|current| current.borrow().as_ref().map(|b| b.id))
}

/// Run `f` on the calling thread's current context
///
/// Fails with [`GlcError::State`] if there is no current context or if it
/// is already in use by this thread (for example from within the
/// unmapped-code handler).
pub fn with_current<R>(f: impl FnOnce(&mut Context) -> Result<R, GlcError>) -> Result<R, GlcError> {
    let context = CURRENT
        .with(|current| current.borrow().as_ref().map(|b| b.context.clone()))
        .ok_or(GlcError::State)?;
    let mut context = match context.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(err)) => err.into_inner(),
        Err(TryLockError::WouldBlock) => return Err(GlcError::State),
    };
    f(&mut context)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn reentrant_lock_nests() {
        let lock = Arc::new(ReentrantMutex::new(RefCell::new(0)));
        {
            let a = lock.lock();
            let b = lock.lock();
            *b.borrow_mut() += 1;
            assert_eq!(lock.depth(), 2);
            drop(b);
            assert_eq!(*a.borrow(), 1);
        }
        assert_eq!(lock.depth(), 0);
    }

    #[test]
    fn reentrant_lock_excludes_other_threads() {
        let lock = Arc::new(ReentrantMutex::new(RefCell::new(0)));
        let acquired = Arc::new(AtomicBool::new(false));
        let guard = lock.lock();
        let other = {
            let (lock, acquired) = (lock.clone(), acquired.clone());
            thread::spawn(move || {
                let guard = lock.lock();
                acquired.store(true, Ordering::SeqCst);
                *guard.borrow_mut() += 1;
            })
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!acquired.load(Ordering::SeqCst));
        drop(guard);
        other.join().unwrap();
        assert!(acquired.load(Ordering::SeqCst));
        assert_eq!(*lock.lock().borrow(), 1);
    }
}
