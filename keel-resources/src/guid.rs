use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque 128-bit identifier correlating a logical resource across
/// sessions. The nil value is the invalid sentinel; it never binds in a
/// pool's GUID map.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guid(Uuid);

impl Guid {
    /// Generate a fresh random GUID.
    pub fn generate() -> Self {
        Guid(Uuid::new_v4())
    }

    /// The invalid sentinel. Lookups that find nothing return this.
    pub const fn invalid() -> Self {
        Guid(Uuid::nil())
    }

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Guid(Uuid::from_bytes(bytes))
    }

    pub fn is_invalid(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for Guid {
    fn default() -> Self {
        Self::invalid()
    }
}

impl core::fmt::Display for Guid {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        self.0.fmt(fmt)
    }
}

impl core::fmt::Debug for Guid {
    fn fmt(
        &self,
        fmt: &mut core::fmt::Formatter,
    ) -> core::fmt::Result {
        write!(fmt, "Guid({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        assert!(Guid::invalid().is_invalid());
        assert_eq!(Guid::invalid(), Guid::default());
        assert!(!Guid::generate().is_invalid());
    }

    #[test]
    fn test_generated_guids_are_distinct() {
        assert_ne!(Guid::generate(), Guid::generate());
    }

    #[test]
    fn test_byte_round_trip() {
        let guid = Guid::generate();
        assert_eq!(guid, Guid::from_bytes(*guid.as_bytes()));
    }

    #[test]
    fn test_serde_round_trip() {
        let guid = Guid::generate();
        let json = serde_json::to_string(&guid).unwrap();
        let back: Guid = serde_json::from_str(&json).unwrap();
        assert_eq!(guid, back);
    }
}
