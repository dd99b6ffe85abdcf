//! The type-erased slab allocator and its typed handles.
//!
//! `SlabPool` is the unlocked core: fixed-size aligned slots for a single
//! runtime type, with a singly-linked freelist embedded in the free slots
//! themselves. `SharedSlabPool` puts a mutex around it for concurrent use.
//!
//! Slot *indices* are stable across growth; raw references are not. Holders
//! keep a `Handle` and resolve through the pool each time.

/// Scalar type for byte offsets into a slab.
///
/// Offsets are multiples of the slot size, and double as the embedded
/// freelist link type, so a free slot must be able to host one.
pub type SlabOffsetT = usize;

/// Scalar type for tracking slot generations.
///
/// u32 should be enough. Even at 120fps, one reissue per frame, it would
/// take more than a year to exhaust a single slot.
pub type HandleVersionT = u32;

/// Sentinel for the null handle offset and the end of the freelist.
pub const NULL_OFFSET: SlabOffsetT = SlabOffsetT::MAX;

mod handle;
pub use handle::Handle;

mod type_info;
pub use type_info::TypeInfo;

mod slab_pool;
pub use slab_pool::SlabPool;
pub use slab_pool::MIN_SLOT_ALIGNMENT;

mod shared_slab_pool;
pub use shared_slab_pool::SharedSlabPool;
pub use shared_slab_pool::SlabPoolRef;
