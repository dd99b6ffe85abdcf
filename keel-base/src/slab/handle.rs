use super::{HandleVersionT, SlabOffsetT, NULL_OFFSET};
use std::marker::PhantomData;

/// A stable logical reference to a slot in a slab: a byte offset plus the
/// generation version expected for that slot.
///
/// Handles are plain data. Holding one confers no ownership, and a handle
/// outliving its referent is expected; the owning pool detects it through
/// the version check. A handle fresh out of `SlabPool::create` carries
/// version 0 ("never issued") until the wrapping pool stamps it.
pub struct Handle<T> {
    offset: SlabOffsetT,
    version: HandleVersionT,

    phantom_data: PhantomData<T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(offset: SlabOffsetT) -> Self {
        Handle {
            offset,
            version: 0,
            phantom_data: PhantomData,
        }
    }

    /// The null handle. Never resolves.
    pub fn null() -> Self {
        Handle {
            offset: NULL_OFFSET,
            version: 0,
            phantom_data: PhantomData,
        }
    }

    pub fn offset(&self) -> SlabOffsetT {
        self.offset
    }

    pub fn version(&self) -> HandleVersionT {
        self.version
    }

    pub fn is_null(&self) -> bool {
        self.offset == NULL_OFFSET
    }

    /// Clear back to the null handle.
    pub fn reset(&mut self) {
        self.offset = NULL_OFFSET;
        self.version = 0;
    }

    /// Returns the same handle stamped with a generation version. Used by
    /// the resource layer when issuing handles; the slab itself never reads
    /// the version.
    pub fn with_version(
        self,
        version: HandleVersionT,
    ) -> Self {
        Handle {
            offset: self.offset,
            version,
            phantom_data: PhantomData,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Handle<T> {
        Handle {
            offset: self.offset,
            version: self.version,
            phantom_data: Default::default(),
        }
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.offset == other.offset && self.version == other.version
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(
        &self,
        state: &mut H,
    ) {
        self.offset.hash(state);
        self.version.hash(state);
    }
}

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter,
    ) -> std::fmt::Result {
        f.debug_struct("Handle")
            .field("offset", &self.offset)
            .field("version", &self.version)
            .finish()
    }
}
