use super::{Handle, SlabOffsetT, TypeInfo, NULL_OFFSET};
use crate::error::{PoolError, PoolResult};
use crate::memory::{is_power_of_two, round_size_up_to_alignment_usize};
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

/// Alignment floor for every pool. Free slots store a `SlabOffsetT` link in
/// their first bytes, so slots can never be less aligned than that.
pub const MIN_SLOT_ALIGNMENT: usize = std::mem::align_of::<SlabOffsetT>();

/// A type-erased slab of fixed-size, equally aligned slots with an embedded
/// singly-linked freelist.
///
/// Every slot is always in exactly one of two states: *live* (holds a value
/// of the pool's stored type) or *free* (its first bytes hold the offset of
/// the next free slot, or `NULL_OFFSET`). Freed slots are linked at the
/// freelist head; slots gained by growth are appended at the tail.
///
/// The slab grows so the slot count is the next power of two and never
/// shrinks. Growth keeps slot indices stable but moves the backing buffer,
/// so raw references obtained from `get` do not survive a `create`.
///
/// The type is checked at runtime against the `TypeInfo` the pool was
/// constructed with; using the wrong type is a programming error and fails
/// a debug assertion. This core is unlocked (`&mut self` mutators); see
/// [`SharedSlabPool`](super::SharedSlabPool) for the concurrent surface.
pub struct SlabPool {
    type_info: TypeInfo,
    alignment: usize,
    slot_size: usize,

    storage: Option<NonNull<u8>>,
    capacity: usize,

    free_first: SlabOffsetT,
    free_last: SlabOffsetT,
}

// The pool only ever holds values of its single stored type, and the typed
// entry points that put values in (`create`) require that type to be Send.
unsafe impl Send for SlabPool {}

impl SlabPool {
    /// Create an empty pool for the given type identity. Nothing is
    /// allocated until the first `create`.
    ///
    /// The requested alignment is rounded up to the type's own alignment
    /// and to [`MIN_SLOT_ALIGNMENT`], and must then be a power of two. The
    /// slot stride is rounded up to that alignment so *every* slot honors
    /// it, not just slot 0.
    pub fn new(
        type_info: TypeInfo,
        alignment: usize,
    ) -> PoolResult<Self> {
        if type_info.size() < std::mem::size_of::<SlabOffsetT>() {
            return Err(PoolError::SlotTooSmall {
                type_name: type_info.type_name(),
                size: type_info.size(),
            });
        }

        let alignment = alignment.max(type_info.align()).max(MIN_SLOT_ALIGNMENT);
        assert!(
            is_power_of_two(alignment),
            "pool alignment must be a power of two"
        );
        let slot_size = round_size_up_to_alignment_usize(type_info.size(), alignment);

        Ok(SlabPool {
            type_info,
            alignment,
            slot_size,
            storage: None,
            capacity: 0,
            free_first: NULL_OFFSET,
            free_last: NULL_OFFSET,
        })
    }

    /// Create an empty pool for `T` with the requested alignment.
    pub fn for_type<T: 'static>(alignment: usize) -> PoolResult<Self> {
        Self::new(TypeInfo::of::<T>(), alignment)
    }

    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// Capacity of the backing buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stride between slots in bytes; handle offsets are multiples of this.
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    pub fn slot_count(&self) -> usize {
        self.capacity / self.slot_size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Allocate a slot and move `value` into it, growing the slab if the
    /// freelist is empty. The returned handle carries version 0; stamping a
    /// generation is the resource layer's job.
    pub fn create<T: Send + 'static>(
        &mut self,
        value: T,
    ) -> PoolResult<Handle<T>> {
        self.debug_assert_type::<T>();

        if self.free_first == NULL_OFFSET {
            self.grow()?;
        }

        // Unlink the freelist head
        let offset = self.free_first;
        if self.free_first == self.free_last {
            self.free_first = NULL_OFFSET;
            self.free_last = NULL_OFFSET;
        } else {
            self.free_first = unsafe { self.free_link(offset) };
        }

        unsafe { (self.slot_ptr(offset) as *mut T).write(value) };
        Ok(Handle::new(offset))
    }

    /// Drop the value at the handle's slot and link the slot at the head of
    /// the freelist. It is fatal to destroy a null handle or a slot that is
    /// already free.
    pub fn destroy<T: 'static>(
        &mut self,
        handle: Handle<T>,
    ) {
        self.debug_assert_type::<T>();
        debug_assert!(!handle.is_null(), "tried to destroy a null handle");
        self.debug_assert_offset(handle.offset());

        let offset = handle.offset();
        unsafe {
            std::ptr::drop_in_place(self.slot_ptr(offset) as *mut T);

            if self.free_first == NULL_OFFSET {
                self.set_free_link(offset, NULL_OFFSET);
                self.free_first = offset;
                self.free_last = offset;
            } else {
                self.set_free_link(offset, self.free_first);
                self.free_first = offset;
            }
        }
    }

    /// Resolve a handle to the value at its slot.
    ///
    /// No version validation happens here; a stale handle to a reused slot
    /// will alias the new occupant. The resource layer validates versions
    /// before calling down.
    pub fn get<T: 'static>(
        &self,
        handle: Handle<T>,
    ) -> &T {
        self.debug_assert_type::<T>();
        self.debug_assert_offset(handle.offset());
        unsafe { &*(self.slot_ptr(handle.offset()) as *const T) }
    }

    pub fn get_mut<T: 'static>(
        &mut self,
        handle: Handle<T>,
    ) -> &mut T {
        self.debug_assert_type::<T>();
        self.debug_assert_offset(handle.offset());
        unsafe { &mut *(self.slot_ptr(handle.offset()) as *mut T) }
    }

    /// Walk the freelist and count the free slots. O(free count).
    pub fn count_free(&self) -> usize {
        let mut count = 0;
        self.freelist_visitor(|_| count += 1);
        count
    }

    /// Count of live slots.
    pub fn count_used(&self) -> usize {
        self.slot_count() - self.count_free()
    }

    /// Visit every live slot in ascending index order.
    ///
    /// Free slots are marked with one walk of the freelist first, so this is
    /// O(N) plus an allocation. Mainly intended for iteration and debug use.
    pub fn used_visitor<T: 'static, F: FnMut(&T)>(
        &self,
        mut f: F,
    ) {
        self.debug_assert_type::<T>();

        let free = self.free_slot_map();
        for slot in 0..self.slot_count() {
            if !free[slot] {
                let offset = slot * self.slot_size;
                f(unsafe { &*(self.slot_ptr(offset) as *const T) });
            }
        }
    }

    /// Visit every live slot in ascending index order, mutably.
    pub fn used_visitor_mut<T: 'static, F: FnMut(&mut T)>(
        &mut self,
        mut f: F,
    ) {
        self.debug_assert_type::<T>();

        let free = self.free_slot_map();
        for slot in 0..self.slot_count() {
            if !free[slot] {
                let offset = slot * self.slot_size;
                f(unsafe { &mut *(self.slot_ptr(offset) as *mut T) });
            }
        }
    }

    /// Drop every live value and relink all slots into one sequential
    /// freelist. Capacity is kept; the pool never shrinks.
    pub fn clear<T: 'static>(&mut self) {
        self.debug_assert_type::<T>();

        let free = self.free_slot_map();
        for slot in 0..self.slot_count() {
            if !free[slot] {
                let offset = slot * self.slot_size;
                unsafe { std::ptr::drop_in_place(self.slot_ptr(offset) as *mut T) };
            }
        }

        self.free_first = NULL_OFFSET;
        self.free_last = NULL_OFFSET;
        if self.capacity > 0 {
            self.link_new_slots(0, self.capacity);
        }
    }

    fn grow(&mut self) -> PoolResult<()> {
        let new_slot_count = (self.slot_count() + 1).next_power_of_two();
        let new_capacity = new_slot_count * self.slot_size;

        let layout = Layout::from_size_align(new_capacity, self.alignment).map_err(|_| {
            PoolError::AllocationFailed {
                capacity: new_capacity,
                alignment: self.alignment,
            }
        })?;
        let new_storage =
            NonNull::new(unsafe { alloc(layout) }).ok_or(PoolError::AllocationFailed {
                capacity: new_capacity,
                alignment: self.alignment,
            })?;

        let old_storage = self.storage;
        let old_capacity = self.capacity;
        self.storage = Some(new_storage);
        self.capacity = new_capacity;

        if let Some(old_storage) = old_storage {
            // Moves in Rust are bitwise, so copying the old buffer wholesale
            // migrates live values and embedded freelist links alike.
            unsafe {
                std::ptr::copy_nonoverlapping(
                    old_storage.as_ptr(),
                    new_storage.as_ptr(),
                    old_capacity,
                );
                dealloc(old_storage.as_ptr(), self.buffer_layout(old_capacity));
            }
        }

        log::trace!(
            "{} pool grew {} -> {} bytes (slot size {})",
            self.type_info.type_name(),
            old_capacity,
            new_capacity,
            self.slot_size
        );

        self.link_new_slots(old_capacity, new_capacity);
        Ok(())
    }

    // Link the slots in [old_capacity, new_capacity) at the freelist tail,
    // in ascending order. The last one links to null.
    fn link_new_slots(
        &mut self,
        old_capacity: usize,
        new_capacity: usize,
    ) {
        debug_assert!(new_capacity > old_capacity);

        if self.free_first == NULL_OFFSET {
            self.free_first = old_capacity;
        }

        let mut offset = old_capacity;
        while offset < new_capacity {
            if self.free_last != NULL_OFFSET {
                unsafe { self.set_free_link(self.free_last, offset) };
            }
            self.free_last = offset;
            offset += self.slot_size;
        }
        unsafe { self.set_free_link(self.free_last, NULL_OFFSET) };
    }

    // Visit free slots in list order (head first).
    fn freelist_visitor<F: FnMut(SlabOffsetT)>(
        &self,
        mut f: F,
    ) {
        let mut offset = self.free_first;
        while offset != NULL_OFFSET {
            f(offset);
            offset = unsafe { self.free_link(offset) };
        }
    }

    // One flag per slot, true when the slot is on the freelist.
    fn free_slot_map(&self) -> Vec<bool> {
        let mut free = vec![false; self.slot_count()];
        self.freelist_visitor(|offset| free[offset / self.slot_size] = true);
        free
    }

    fn buffer_layout(
        &self,
        capacity: usize,
    ) -> Layout {
        // Validated when the buffer was first allocated
        unsafe { Layout::from_size_align_unchecked(capacity, self.alignment) }
    }

    unsafe fn slot_ptr(
        &self,
        offset: SlabOffsetT,
    ) -> *mut u8 {
        debug_assert!(offset < self.capacity);
        self.storage.unwrap().as_ptr().add(offset)
    }

    unsafe fn free_link(
        &self,
        offset: SlabOffsetT,
    ) -> SlabOffsetT {
        (self.slot_ptr(offset) as *const SlabOffsetT).read()
    }

    unsafe fn set_free_link(
        &mut self,
        offset: SlabOffsetT,
        next: SlabOffsetT,
    ) {
        (self.slot_ptr(offset) as *mut SlabOffsetT).write(next)
    }

    fn debug_assert_type<T: 'static>(&self) {
        debug_assert!(
            self.type_info.matches::<T>(),
            "type mismatch: pool stores {}, got {}",
            self.type_info.type_name(),
            core::any::type_name::<T>()
        );
    }

    fn debug_assert_offset(
        &self,
        offset: SlabOffsetT,
    ) {
        debug_assert!(offset != NULL_OFFSET);
        debug_assert!(offset < self.capacity);
        debug_assert!(offset % self.slot_size == 0);
    }
}

impl Drop for SlabPool {
    fn drop(&mut self) {
        // Live values are not dropped here; the slab is type-erased and its
        // typed owner destroys entries before the pool goes away.
        if let Some(storage) = self.storage {
            unsafe { dealloc(storage.as_ptr(), self.buffer_layout(self.capacity)) };
        }
    }
}

impl std::fmt::Display for SlabPool {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        writeln!(
            f,
            "SlabPool<{}>: capacity={}, free={}, head={}",
            self.type_info.type_name(),
            self.slot_count(),
            self.count_free(),
            if self.free_first == NULL_OFFSET {
                "null".to_string()
            } else {
                (self.free_first / self.slot_size).to_string()
            }
        )?;

        write!(f, "  free-list: ")?;
        let mut offset = self.free_first;
        while offset != NULL_OFFSET {
            write!(f, "{} -> ", offset / self.slot_size)?;
            offset = unsafe { self.free_link(offset) };
        }
        writeln!(f, "null")?;

        write!(f, "  layout: ")?;
        for is_free in self.free_slot_map() {
            write!(f, "{}", if is_free { "[F]" } else { "[U]" })?;
        }
        Ok(())
    }
}
