pub type PoolResult<T> = Result<T, PoolError>;

/// Errors surfaced by slab construction and growth. Everything else the slab
/// can get wrong (type mismatch, null handle, shrink) is a programming error
/// and fails a debug assertion instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The stored type is smaller than a freelist link, so a free slot could
    /// not host the offset of the next free slot.
    SlotTooSmall {
        type_name: &'static str,
        size: usize,
    },
    /// The backing aligned allocation failed.
    AllocationFailed {
        capacity: usize,
        alignment: usize,
    },
}

impl std::error::Error for PoolError {}

impl core::fmt::Display for PoolError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            PoolError::SlotTooSmall { type_name, size } => write!(
                fmt,
                "{} is {} bytes, too small to host a freelist link",
                type_name, size
            ),
            PoolError::AllocationFailed {
                capacity,
                alignment,
            } => write!(
                fmt,
                "aligned allocation of {} bytes (alignment {}) failed",
                capacity, alignment
            ),
        }
    }
}
