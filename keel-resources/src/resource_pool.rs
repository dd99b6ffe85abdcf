use fnv::FnvHashMap;
use keel_base::slab::{Handle, SlabPool, TypeInfo};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{ResourceError, ResourceResult};
use crate::guid::Guid;
use crate::version_map::VersionMap;

/// Marker for types that can live in a resource pool. Blanket-implemented
/// for everything sendable and shareable.
pub trait Resource: Send + Sync + 'static {}

impl<T> Resource for T where T: Send + Sync + 'static {}

/// A reference to a pooled resource. Holds the pool lock for its lifetime:
/// keep it short-lived, and never hold one while calling back into the same
/// pool.
pub type ResourceRef<'a, T> = MappedMutexGuard<'a, T>;

struct ResourcePoolInner<T: Resource> {
    pool: SlabPool,
    versions: VersionMap,
    ref_counts: Vec<u32>,

    guid_to_handle: FnvHashMap<Guid, Handle<T>>,
    handle_to_guid: FnvHashMap<Handle<T>, Guid>,
}

impl<T: Resource> Drop for ResourcePoolInner<T> {
    fn drop(&mut self) {
        self.pool.clear::<T>();
    }
}

/// A per-type resource store layering handle validity (generation
/// versions), lifetime (reference counts) and identity (optional GUID
/// binding) over a [`SlabPool`].
///
/// One mutex guards all pool state and every operation holds it for its
/// entire duration, so operations on one pool are linearizable. Pools of
/// different types are fully independent. The lock is not re-entrant:
/// `for_each` callbacks must not call back into the same pool.
pub struct ResourcePool<T: Resource> {
    inner: Mutex<ResourcePoolInner<T>>,
}

impl<T: Resource> ResourcePool<T> {
    /// Create an empty pool slotted for `T`'s natural alignment.
    pub fn new() -> ResourceResult<Self> {
        Self::with_alignment(std::mem::align_of::<T>())
    }

    /// Create an empty pool with an explicit slot alignment (e.g. for
    /// upload-friendly layouts).
    pub fn with_alignment(alignment: usize) -> ResourceResult<Self> {
        Ok(ResourcePool {
            inner: Mutex::new(ResourcePoolInner {
                pool: SlabPool::new(TypeInfo::of::<T>(), alignment)?,
                versions: VersionMap::new(),
                ref_counts: Vec::new(),
                guid_to_handle: Default::default(),
                handle_to_guid: Default::default(),
            }),
        })
    }

    /// Store a resource without binding a GUID. The new entry starts with a
    /// reference count of 1.
    pub fn add(
        &self,
        value: T,
    ) -> ResourceResult<Handle<T>> {
        let mut inner = self.inner.lock();
        Self::do_add(&mut inner, value)
    }

    /// Store a resource and bind it to `guid` in both directions.
    ///
    /// Fails with `InvalidGuid` for the invalid sentinel and
    /// `DuplicateGuid` if the GUID is already bound; the pool is unchanged
    /// on failure.
    pub fn add_with_guid(
        &self,
        guid: Guid,
        value: T,
    ) -> ResourceResult<Handle<T>> {
        let mut inner = self.inner.lock();

        if guid.is_invalid() {
            return Err(ResourceError::InvalidGuid);
        }
        if inner.guid_to_handle.contains_key(&guid) {
            return Err(ResourceError::DuplicateGuid(guid));
        }

        let handle = Self::do_add(&mut inner, value)?;
        inner.guid_to_handle.insert(guid, handle);
        inner.handle_to_guid.insert(handle, guid);
        Ok(handle)
    }

    /// Resolve a handle, keeping the pool locked while the reference is
    /// alive. Fails with `InvalidHandle` if the handle's generation is
    /// stale or was never issued.
    pub fn get(
        &self,
        handle: Handle<T>,
    ) -> ResourceResult<ResourceRef<'_, T>> {
        let inner = self.inner.lock();
        if !Self::do_validate(&inner, handle) {
            return Err(ResourceError::InvalidHandle {
                offset: handle.offset(),
                version: handle.version(),
            });
        }
        Ok(MutexGuard::map(inner, |inner| inner.pool.get_mut(handle)))
    }

    /// Destroy the resource now, regardless of its reference count.
    /// Idempotent: removing through a stale handle is a no-op.
    pub fn remove(
        &self,
        handle: Handle<T>,
    ) {
        let mut inner = self.inner.lock();
        Self::do_remove(&mut inner, handle);
    }

    /// Take an additional reference. No-op on an invalid handle.
    pub fn retain(
        &self,
        handle: Handle<T>,
    ) {
        let mut inner = self.inner.lock();
        if !Self::do_validate(&inner, handle) {
            return;
        }
        let slot = Self::slot_of(&inner, handle);
        inner.ref_counts[slot] += 1;
    }

    /// Drop a reference; the resource is destroyed when the count reaches
    /// zero. No-op on an invalid handle.
    pub fn release(
        &self,
        handle: Handle<T>,
    ) {
        let mut inner = self.inner.lock();
        if !Self::do_validate(&inner, handle) {
            return;
        }
        let slot = Self::slot_of(&inner, handle);
        inner.ref_counts[slot] -= 1;
        if inner.ref_counts[slot] == 0 {
            // Already locked; go through the inner removal path
            Self::do_remove(&mut inner, handle);
        }
    }

    /// Current reference count, or 0 for an invalid handle.
    pub fn use_count(
        &self,
        handle: Handle<T>,
    ) -> u32 {
        let inner = self.inner.lock();
        if !Self::do_validate(&inner, handle) {
            return 0;
        }
        inner.ref_counts[Self::slot_of(&inner, handle)]
    }

    /// True if the handle still refers to a live resource.
    pub fn valid(
        &self,
        handle: Handle<T>,
    ) -> bool {
        let inner = self.inner.lock();
        Self::do_validate(&inner, handle)
    }

    /// The GUID bound to this handle, or the invalid sentinel.
    pub fn guid_of(
        &self,
        handle: Handle<T>,
    ) -> Guid {
        let inner = self.inner.lock();
        inner
            .handle_to_guid
            .get(&handle)
            .copied()
            .unwrap_or_else(Guid::invalid)
    }

    /// The handle bound to this GUID, or the null handle.
    pub fn find_by_guid(
        &self,
        guid: Guid,
    ) -> Handle<T> {
        let inner = self.inner.lock();
        inner
            .guid_to_handle
            .get(&guid)
            .copied()
            .unwrap_or_else(Handle::null)
    }

    /// Visit every live resource in slot order with the pool lock held.
    pub fn for_each<F: FnMut(&T)>(
        &self,
        f: F,
    ) {
        self.inner.lock().pool.used_visitor(f)
    }

    /// Visit every live resource mutably with the pool lock held.
    pub fn for_each_mut<F: FnMut(&mut T)>(
        &self,
        f: F,
    ) {
        self.inner.lock().pool.used_visitor_mut(f)
    }

    /// Count of live resources.
    pub fn len(&self) -> usize {
        self.inner.lock().pool.count_used()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the backing slab in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.lock().pool.capacity()
    }

    fn do_add(
        inner: &mut ResourcePoolInner<T>,
        value: T,
    ) -> ResourceResult<Handle<T>> {
        let handle = inner.pool.create(value)?;

        // Metadata arrays track the slab's slot coverage
        let slot_count = inner.pool.slot_count();
        if inner.ref_counts.len() < slot_count {
            inner.ref_counts.resize(slot_count, 0);
        }
        inner.versions.resize(slot_count);

        let slot = Self::slot_of(inner, handle);
        let version = inner.versions.stamp(slot);
        inner.ref_counts[slot] = 1;

        log::trace!(
            "added {} resource at offset {} (version {})",
            core::any::type_name::<T>(),
            handle.offset(),
            version
        );
        Ok(handle.with_version(version))
    }

    fn do_remove(
        inner: &mut ResourcePoolInner<T>,
        handle: Handle<T>,
    ) {
        if !Self::do_validate(inner, handle) {
            return;
        }

        let slot = Self::slot_of(inner, handle);
        inner.pool.destroy(handle);
        inner.versions.bump(slot);
        inner.ref_counts[slot] = 0;
        if let Some(guid) = inner.handle_to_guid.remove(&handle) {
            inner.guid_to_handle.remove(&guid);
        }

        log::trace!(
            "removed {} resource at offset {}",
            core::any::type_name::<T>(),
            handle.offset()
        );
    }

    fn do_validate(
        inner: &ResourcePoolInner<T>,
        handle: Handle<T>,
    ) -> bool {
        if handle.is_null() {
            return false;
        }
        inner
            .versions
            .validate(Self::slot_of(inner, handle), handle.version())
    }

    fn slot_of(
        inner: &ResourcePoolInner<T>,
        handle: Handle<T>,
    ) -> usize {
        handle.offset() / inner.pool.slot_size()
    }
}
