use downcast_rs::{impl_downcast, Downcast};
use fnv::FnvHashMap;
use keel_base::slab::Handle;
use std::any::TypeId;

use crate::error::{ResourceError, ResourceResult};
use crate::guid::Guid;
use crate::resource_pool::{Resource, ResourcePool, ResourceRef};

/// Identity of a resource type within the registry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ResourceTypeId {
    type_id: TypeId,
}

impl ResourceTypeId {
    pub fn of<T: Resource>() -> Self {
        ResourceTypeId {
            type_id: TypeId::of::<T>(),
        }
    }
}

// Type-erased pool storage; concrete pools are recovered by downcast
trait PoolStorage: Downcast + Send + Sync {}

impl_downcast!(PoolStorage);

impl<T: Resource> PoolStorage for ResourcePool<T> {}

/// Routes resource operations to the per-type [`ResourcePool`] by runtime
/// type identity.
///
/// Pools are created on demand by the first `add`/`add_with_guid` for a
/// type, which is why those take `&mut self`; populate the registry during
/// initialization and share it immutably afterwards. Every other generic
/// call takes `&self` and fails with `TypeNotRegistered` for a type no pool
/// exists for. The registry itself takes no lock; each pool serializes its
/// own operations, so operations on different types proceed independently.
#[derive(Default)]
pub struct ResourceRegistry {
    pools: FnvHashMap<ResourceTypeId, Box<dyn PoolStorage>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Store a resource, creating the type's pool if this is the first use.
    pub fn add<T: Resource>(
        &mut self,
        value: T,
    ) -> ResourceResult<Handle<T>> {
        self.get_or_create_pool::<T>()?.add(value)
    }

    /// Store a resource bound to `guid`, creating the type's pool if this
    /// is the first use.
    pub fn add_with_guid<T: Resource>(
        &mut self,
        guid: Guid,
        value: T,
    ) -> ResourceResult<Handle<T>> {
        self.get_or_create_pool::<T>()?.add_with_guid(guid, value)
    }

    pub fn get<T: Resource>(
        &self,
        handle: Handle<T>,
    ) -> ResourceResult<ResourceRef<'_, T>> {
        self.pool::<T>()?.get(handle)
    }

    pub fn remove<T: Resource>(
        &self,
        handle: Handle<T>,
    ) -> ResourceResult<()> {
        self.pool::<T>()?.remove(handle);
        Ok(())
    }

    pub fn retain<T: Resource>(
        &self,
        handle: Handle<T>,
    ) -> ResourceResult<()> {
        self.pool::<T>()?.retain(handle);
        Ok(())
    }

    pub fn release<T: Resource>(
        &self,
        handle: Handle<T>,
    ) -> ResourceResult<()> {
        self.pool::<T>()?.release(handle);
        Ok(())
    }

    /// True if the handle refers to a live resource. A type with no pool
    /// has no live resources, so this is false rather than an error.
    pub fn valid<T: Resource>(
        &self,
        handle: Handle<T>,
    ) -> bool {
        self.pool::<T>().map_or(false, |pool| pool.valid(handle))
    }

    pub fn use_count<T: Resource>(
        &self,
        handle: Handle<T>,
    ) -> u32 {
        self.pool::<T>().map_or(0, |pool| pool.use_count(handle))
    }

    pub fn guid_of<T: Resource>(
        &self,
        handle: Handle<T>,
    ) -> Guid {
        self.pool::<T>()
            .map_or_else(|_| Guid::invalid(), |pool| pool.guid_of(handle))
    }

    pub fn find_by_guid<T: Resource>(
        &self,
        guid: Guid,
    ) -> Handle<T> {
        self.pool::<T>()
            .map_or_else(|_| Handle::null(), |pool| pool.find_by_guid(guid))
    }

    /// Visit every live resource of `T` with that pool's lock held.
    pub fn for_all<T: Resource, F: FnMut(&T)>(
        &self,
        f: F,
    ) -> ResourceResult<()> {
        self.pool::<T>()?.for_each(f);
        Ok(())
    }

    pub fn for_all_mut<T: Resource, F: FnMut(&mut T)>(
        &self,
        f: F,
    ) -> ResourceResult<()> {
        self.pool::<T>()?.for_each_mut(f);
        Ok(())
    }

    pub fn contains_type<T: Resource>(&self) -> bool {
        self.pools.contains_key(&ResourceTypeId::of::<T>())
    }

    /// Direct access to the pool for `T`, if one exists.
    pub fn pool<T: Resource>(&self) -> ResourceResult<&ResourcePool<T>> {
        self.pools
            .get(&ResourceTypeId::of::<T>())
            .and_then(|pool| pool.downcast_ref::<ResourcePool<T>>())
            .ok_or(ResourceError::TypeNotRegistered {
                type_name: core::any::type_name::<T>(),
            })
    }

    fn get_or_create_pool<T: Resource>(&mut self) -> ResourceResult<&ResourcePool<T>> {
        let id = ResourceTypeId::of::<T>();
        if !self.pools.contains_key(&id) {
            log::trace!(
                "creating resource pool for {}",
                core::any::type_name::<T>()
            );
            self.pools.insert(id, Box::new(ResourcePool::<T>::new()?));
        }
        self.pool::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mesh {
        vertex_count: u32,
    }

    struct Material {
        shininess: u32,
    }

    #[test]
    fn test_pool_created_on_first_add() {
        let mut registry = ResourceRegistry::new();
        assert!(!registry.contains_type::<Mesh>());

        let handle = registry.add(Mesh { vertex_count: 36 }).unwrap();
        assert!(registry.contains_type::<Mesh>());
        assert_eq!(36, registry.get(handle).unwrap().vertex_count);
    }

    #[test]
    fn test_unregistered_type_fails() {
        let registry = ResourceRegistry::new();
        let handle = Handle::<Mesh>::null();

        assert!(matches!(
            registry.get(handle),
            Err(ResourceError::TypeNotRegistered { .. })
        ));
        assert!(matches!(
            registry.remove(handle),
            Err(ResourceError::TypeNotRegistered { .. })
        ));
        assert!(!registry.valid(handle));
        assert_eq!(0, registry.use_count(handle));
        assert!(registry.find_by_guid::<Mesh>(Guid::generate()).is_null());
    }

    #[test]
    fn test_types_are_routed_independently() {
        let mut registry = ResourceRegistry::new();
        let mesh = registry.add(Mesh { vertex_count: 3 }).unwrap();
        let material = registry.add(Material { shininess: 8 }).unwrap();

        // Both pools started at slot 0; the typed handles stay distinct
        assert_eq!(mesh.offset(), material.offset());
        assert_eq!(3, registry.get(mesh).unwrap().vertex_count);
        assert_eq!(8, registry.get(material).unwrap().shininess);

        registry.remove(mesh).unwrap();
        assert!(!registry.valid(mesh));
        assert!(registry.valid(material));
    }

    #[test]
    fn test_retain_release_through_registry() {
        let mut registry = ResourceRegistry::new();
        let handle = registry.add(Mesh { vertex_count: 1 }).unwrap();

        registry.retain(handle).unwrap();
        assert_eq!(2, registry.use_count(handle));
        registry.release(handle).unwrap();
        registry.release(handle).unwrap();
        assert!(!registry.valid(handle));
    }

    #[test]
    fn test_guid_lookup_through_registry() {
        let mut registry = ResourceRegistry::new();
        let guid = Guid::generate();
        let handle = registry
            .add_with_guid(guid, Mesh { vertex_count: 12 })
            .unwrap();

        assert_eq!(handle, registry.find_by_guid::<Mesh>(guid));
        assert_eq!(guid, registry.guid_of(handle));
        // The same guid may bind in another type's pool
        let material = registry
            .add_with_guid(guid, Material { shininess: 1 })
            .unwrap();
        assert_eq!(material, registry.find_by_guid::<Material>(guid));
    }

    #[test]
    fn test_for_all() {
        let mut registry = ResourceRegistry::new();
        for i in 0..4 {
            registry.add(Mesh { vertex_count: i }).unwrap();
        }

        let mut total = 0;
        registry.for_all::<Mesh, _>(|mesh| total += mesh.vertex_count).unwrap();
        assert_eq!(6, total);

        registry
            .for_all_mut::<Mesh, _>(|mesh| mesh.vertex_count *= 2)
            .unwrap();
        let mut total = 0;
        registry.for_all::<Mesh, _>(|mesh| total += mesh.vertex_count).unwrap();
        assert_eq!(12, total);
    }
}
