//! Resource management layered over the `keel-base` slab: generation
//! versioned handles, reference-counted lifetimes, optional GUID identity
//! and a registry that routes operations by runtime type.
//!
//! Collaborators (loaders, renderers, serializers) hold [`Handle`]s and
//! resolve them through the registry each time; raw references are only
//! valid while a pool lock guard is alive.
//!
//! [`Handle`]: keel_base::slab::Handle

mod error;
pub use error::ResourceError;
pub use error::ResourceResult;

mod guid;
pub use guid::Guid;

mod version_map;
pub use version_map::VersionMap;
pub use version_map::VERSION_NULL;

mod resource_pool;
pub use resource_pool::Resource;
pub use resource_pool::ResourcePool;
pub use resource_pool::ResourceRef;

mod registry;
pub use registry::ResourceRegistry;
pub use registry::ResourceTypeId;
