use keel_base::slab::HandleVersionT;

/// Version reserved for "never issued". Handles carrying it are always
/// invalid.
pub const VERSION_NULL: HandleVersionT = 0;

/// Dense per-slot generation counters, resized in lockstep with a slab.
///
/// A slot's version starts at [`VERSION_NULL`] and moves to 1 on first
/// issuance. Removal increments it, invalidating every outstanding handle
/// for that slot; re-issuing a reclaimed slot stamps the current value
/// without bumping it again.
#[derive(Default, Debug)]
pub struct VersionMap {
    versions: Vec<HandleVersionT>,
}

impl VersionMap {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Grow coverage to `slot_count` slots. New slots start never-issued.
    /// Coverage never shrinks, matching the slab it shadows.
    pub fn resize(
        &mut self,
        slot_count: usize,
    ) {
        if slot_count > self.versions.len() {
            self.versions.resize(slot_count, VERSION_NULL);
        }
    }

    /// Version to stamp into a handle minted for `slot`, issuing version 1
    /// the first time the slot is used.
    pub fn stamp(
        &mut self,
        slot: usize,
    ) -> HandleVersionT {
        assert!(slot < self.versions.len());
        if self.versions[slot] == VERSION_NULL {
            self.versions[slot] = 1;
        }
        self.versions[slot]
    }

    /// True if `version` is issued and matches the slot's current value.
    pub fn validate(
        &self,
        slot: usize,
        version: HandleVersionT,
    ) -> bool {
        version != VERSION_NULL && slot < self.versions.len() && self.versions[slot] == version
    }

    /// Invalidate every outstanding handle for `slot` by advancing its
    /// generation.
    pub fn bump(
        &mut self,
        slot: usize,
    ) {
        assert!(slot < self.versions.len());
        self.versions[slot] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_issue_is_one() {
        let mut versions = VersionMap::new();
        versions.resize(4);
        assert_eq!(1, versions.stamp(0));
        assert!(versions.validate(0, 1));
        assert!(!versions.validate(0, 0));
        assert!(!versions.validate(1, 0));
    }

    #[test]
    fn test_bump_invalidates() {
        let mut versions = VersionMap::new();
        versions.resize(1);
        let issued = versions.stamp(0);
        versions.bump(0);
        assert!(!versions.validate(0, issued));
    }

    #[test]
    fn test_reissue_stamps_current_without_bump() {
        let mut versions = VersionMap::new();
        versions.resize(1);
        versions.stamp(0);
        versions.bump(0);
        // The removal bump already advanced the generation; re-issue
        // stamps the current value
        assert_eq!(2, versions.stamp(0));
        assert_eq!(2, versions.stamp(0));
        assert!(versions.validate(0, 2));
    }

    #[test]
    fn test_resize_keeps_existing() {
        let mut versions = VersionMap::new();
        versions.resize(1);
        versions.stamp(0);
        versions.bump(0);
        versions.resize(8);
        assert_eq!(8, versions.len());
        assert_eq!(2, versions.stamp(0));
        assert_eq!(1, versions.stamp(7));
    }
}
