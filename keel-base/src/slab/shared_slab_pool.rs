use super::{Handle, SlabPool, TypeInfo};
use crate::error::PoolResult;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

/// A reference to a pooled value. Holds the pool lock for its lifetime, so
/// keep it short-lived; in particular never hold one across a call back into
/// the same pool.
pub type SlabPoolRef<'a, T> = MappedMutexGuard<'a, T>;

/// Thread-safe wrapper around [`SlabPool`].
///
/// Every public operation takes the pool lock for its entire duration and
/// operations are linearizable within one pool. The lock is *not*
/// re-entrant: visitor callbacks run while it is held and must not call
/// back into the same pool.
pub struct SharedSlabPool {
    inner: Mutex<SlabPool>,
}

impl SharedSlabPool {
    pub fn new(
        type_info: TypeInfo,
        alignment: usize,
    ) -> PoolResult<Self> {
        Ok(SharedSlabPool {
            inner: Mutex::new(SlabPool::new(type_info, alignment)?),
        })
    }

    pub fn for_type<T: 'static>(alignment: usize) -> PoolResult<Self> {
        Ok(SharedSlabPool {
            inner: Mutex::new(SlabPool::for_type::<T>(alignment)?),
        })
    }

    pub fn create<T: Send + 'static>(
        &self,
        value: T,
    ) -> PoolResult<Handle<T>> {
        self.inner.lock().create(value)
    }

    pub fn destroy<T: 'static>(
        &self,
        handle: Handle<T>,
    ) {
        self.inner.lock().destroy(handle)
    }

    /// Resolve a handle, keeping the pool locked while the reference is
    /// alive. The pool cannot grow under a live reference, which is what
    /// makes handing it out sound.
    pub fn get<T: 'static>(
        &self,
        handle: Handle<T>,
    ) -> SlabPoolRef<'_, T> {
        MutexGuard::map(self.inner.lock(), |pool| pool.get_mut(handle))
    }

    pub fn count_free(&self) -> usize {
        self.inner.lock().count_free()
    }

    pub fn count_used(&self) -> usize {
        self.inner.lock().count_used()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn slot_count(&self) -> usize {
        self.inner.lock().slot_count()
    }

    pub fn slot_size(&self) -> usize {
        self.inner.lock().slot_size()
    }

    /// Visit every live slot in ascending index order with the lock held.
    pub fn used_visitor<T: 'static, F: FnMut(&T)>(
        &self,
        f: F,
    ) {
        self.inner.lock().used_visitor(f)
    }

    /// Visit every live slot mutably with the lock held.
    pub fn used_visitor_mut<T: 'static, F: FnMut(&mut T)>(
        &self,
        f: F,
    ) {
        self.inner.lock().used_visitor_mut(f)
    }

    /// Run `f` against the locked pool. Useful for compound operations that
    /// must be atomic with respect to other callers.
    pub fn with_mut<R, F: FnOnce(&mut SlabPool) -> R>(
        &self,
        f: F,
    ) -> R {
        f(&mut self.inner.lock())
    }

    /// Debug dump of the locked pool state.
    pub fn dump(&self) -> String {
        self.inner.lock().to_string()
    }
}
