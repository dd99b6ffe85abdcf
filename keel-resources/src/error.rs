use crate::guid::Guid;
use keel_base::slab::{HandleVersionT, SlabOffsetT};
use keel_base::PoolError;

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors surfaced by resource pools and the registry.
///
/// Each variant carries enough context for a caller to log; the core itself
/// does not log errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The handle's version does not match the slot's current generation.
    /// Either the resource was removed, or the handle was never issued.
    InvalidHandle {
        offset: SlabOffsetT,
        version: HandleVersionT,
    },
    /// The caller-provided GUID is already bound in this pool.
    DuplicateGuid(Guid),
    /// The invalid GUID sentinel was passed where a binding was required.
    InvalidGuid,
    /// No pool exists for the requested type; nothing of that type has been
    /// added yet.
    TypeNotRegistered { type_name: &'static str },
    /// The underlying slab failed.
    Pool(PoolError),
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            ResourceError::InvalidHandle { .. } => None,
            ResourceError::DuplicateGuid(_) => None,
            ResourceError::InvalidGuid => None,
            ResourceError::TypeNotRegistered { .. } => None,
            ResourceError::Pool(ref e) => Some(e),
        }
    }
}

impl core::fmt::Display for ResourceError {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        match *self {
            ResourceError::InvalidHandle { offset, version } => {
                write!(fmt, "invalid handle (offset {}, version {})", offset, version)
            }
            ResourceError::DuplicateGuid(ref guid) => {
                write!(fmt, "a resource with guid {} already exists", guid)
            }
            ResourceError::InvalidGuid => {
                "the invalid guid sentinel cannot be bound".fmt(fmt)
            }
            ResourceError::TypeNotRegistered { type_name } => {
                write!(fmt, "resource type {} is not registered", type_name)
            }
            ResourceError::Pool(ref e) => e.fmt(fmt),
        }
    }
}

impl From<PoolError> for ResourceError {
    fn from(error: PoolError) -> Self {
        ResourceError::Pool(error)
    }
}
