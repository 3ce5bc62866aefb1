//! Fixed-size pool of curl easy handles.
//!
//! libcurl keeps a connection cache per easy handle, so reusing handles across
//! requests reuses connections. The pool capacity is therefore the connection
//! pool size; checkout blocks while every handle is in use.

use curl::easy::Easy;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct PoolState {
    idle: Vec<Easy>,
    created: usize,
}

pub(crate) struct HandlePool {
    state: Mutex<PoolState>,
    returned: Condvar,
    capacity: usize,
}

impl HandlePool {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(PoolState {
                idle: Vec::with_capacity(capacity),
                created: 0,
            }),
            returned: Condvar::new(),
            capacity,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take an idle handle, create one if under capacity, or wait for a return.
    pub(crate) fn checkout(&self) -> PooledHandle<'_> {
        let mut state = self.lock();
        loop {
            if let Some(easy) = state.idle.pop() {
                return PooledHandle::new(self, easy);
            }
            if state.created < self.capacity {
                state.created += 1;
                return PooledHandle::new(self, Easy::new());
            }
            state = self
                .returned
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn give_back(&self, easy: Easy) {
        self.lock().idle.push(easy);
        self.returned.notify_one();
    }

    #[cfg(test)]
    fn created(&self) -> usize {
        self.lock().created
    }
}

/// Checked-out handle; returns itself to the pool on drop.
pub(crate) struct PooledHandle<'a> {
    pool: &'a HandlePool,
    easy: Option<Easy>,
}

impl<'a> PooledHandle<'a> {
    fn new(pool: &'a HandlePool, easy: Easy) -> Self {
        Self {
            pool,
            easy: Some(easy),
        }
    }
}

impl Deref for PooledHandle<'_> {
    type Target = Easy;

    fn deref(&self) -> &Easy {
        self.easy.as_ref().expect("handle present until drop")
    }
}

impl DerefMut for PooledHandle<'_> {
    fn deref_mut(&mut self) -> &mut Easy {
        self.easy.as_mut().expect("handle present until drop")
    }
}

impl Drop for PooledHandle<'_> {
    fn drop(&mut self) {
        if let Some(easy) = self.easy.take() {
            self.pool.give_back(easy);
        }
    }
}
