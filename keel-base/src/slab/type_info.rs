use std::any::TypeId;

/// Runtime identity of the type a pool stores.
///
/// Two `TypeInfo`s compare equal iff they denote the same type. The name is
/// carried for diagnostics only; size and alignment drive slot arithmetic.
#[derive(Clone, Copy, Debug)]
pub struct TypeInfo {
    type_id: TypeId,
    type_name: &'static str,
    size: usize,
    align: usize,
}

impl TypeInfo {
    pub fn of<T: 'static>() -> Self {
        TypeInfo {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn align(&self) -> usize {
        self.align
    }

    /// True if `T` is the type this identity was created from.
    pub fn matches<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeInfo {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(TypeInfo::of::<u64>(), TypeInfo::of::<u64>());
        assert_ne!(TypeInfo::of::<u64>(), TypeInfo::of::<i64>());
        assert!(TypeInfo::of::<u64>().matches::<u64>());
        assert!(!TypeInfo::of::<u64>().matches::<u32>());
    }

    #[test]
    fn test_layout_fields() {
        let info = TypeInfo::of::<u64>();
        assert_eq!(8, info.size());
        assert_eq!(std::mem::align_of::<u64>(), info.align());
    }
}
