// SPDX-License-Identifier: MPL-2.0

//! A small pooling wrapper (§5) for reusing a scratch value (typically an
//! encode/decode buffer, or a whole [`crate::context::ContextOwned`]) across
//! threads without reallocating it on every call.
//!
//! Grounded on this crate's `TypeLoaderCollection`'s internal `Vec` guarded
//! by a single lock: the pool itself is only ever touched for the duration
//! of a push/pop, never held across the caller's actual use of the pooled
//! value.

use std::sync::Mutex;

/// A free-list of `T` values, handed out on [`Concurrent::acquire`] and
/// returned on drop of the guard. The mutex is only ever held across a
/// `Vec::pop`/`Vec::push`, never across use of the value itself — the
/// conservative rule SPEC_FULL.md's ambient-concurrency section calls for.
pub struct Concurrent<T> {
    pool: Mutex<Vec<T>>,
    build: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> Concurrent<T> {
    /// Build an empty pool; `build` constructs a fresh `T` whenever the pool
    /// is drained.
    pub fn new(build: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            pool: Mutex::new(Vec::new()),
            build: Box::new(build),
        }
    }

    /// Borrow a value from the pool, constructing a fresh one if the pool is
    /// empty. The value returns to the pool when the guard drops.
    pub fn acquire(&self) -> Lease<'_, T> {
        let value = {
            let mut pool = self.pool.lock().expect("concurrent pool lock poisoned");
            pool.pop()
        }
        .unwrap_or_else(|| (self.build)());
        Lease {
            pool: self,
            value: Some(value),
        }
    }

    fn release(&self, value: T) {
        let mut pool = self.pool.lock().expect("concurrent pool lock poisoned");
        pool.push(value);
    }
}

/// A pooled value on loan from a [`Concurrent`] pool. Derefs to `T`; returns
/// the value to the pool on drop.
pub struct Lease<'a, T> {
    pool: &'a Concurrent<T>,
    value: Option<T>,
}

impl<T> std::ops::Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("Lease value taken before drop")
    }
}

impl<T> std::ops::DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("Lease value taken before drop")
    }
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.release(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_reuses_released_values() {
        let pool = Concurrent::new(Vec::<u8>::new);
        {
            let mut lease = pool.acquire();
            lease.push(1);
            lease.push(2);
        }
        let lease = pool.acquire();
        assert_eq!(*lease, vec![1, 2]);
    }

    #[test]
    fn pool_builds_fresh_value_when_empty() {
        let pool = Concurrent::new(|| 42i32);
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(*a, 42);
        assert_eq!(*b, 42);
    }
}
