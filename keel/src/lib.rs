pub use keel_base as base;

pub use keel_resources as resources;

pub use base::forest::VecForest;
pub use base::slab::{Handle, SharedSlabPool, SlabPool, TypeInfo};
pub use base::{PoolError, PoolResult};
pub use resources::{
    Guid, Resource, ResourceError, ResourcePool, ResourceRegistry, ResourceResult,
};
