//! Service identity and definition
//!
//! The service and characteristic UUIDs are random (version 4) and built
//! once from bytes the embedding application supplies, normally from a
//! hardware RNG at boot. They stay fixed for the lifetime of the
//! [`ProfileIds`] value, so a central retrying a connection within one
//! advertising session finds the same service again.

use core::fmt;

use crate::gatt::characteristic::CharacteristicInfo;
use uuid::{Builder, Uuid};

/// 128-bit UUID of the calculator service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceIdentity(Uuid);

impl ServiceIdentity {
    /// Build a random (v4) identity from 16 random bytes
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(Builder::from_random_bytes(bytes).into_uuid())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// All identifiers of the calculator profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileIds {
    pub service: ServiceIdentity,
    pub write: Uuid,
    pub notify: Uuid,
}

impl ProfileIds {
    /// Build service, write and notify UUIDs from 48 random bytes
    pub fn from_random_bytes(bytes: [u8; 48]) -> Self {
        let mut chunks = [[0u8; 16]; 3];
        for (chunk, source) in chunks.iter_mut().zip(bytes.chunks_exact(16)) {
            chunk.copy_from_slice(source);
        }
        let [service, write, notify] = chunks;

        Self {
            service: ServiceIdentity::from_random_bytes(service),
            write: Builder::from_random_bytes(write).into_uuid(),
            notify: Builder::from_random_bytes(notify).into_uuid(),
        }
    }
}

/// What the platform needs to publish the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub identity: ServiceIdentity,
    /// Always primary
    pub primary: bool,
    pub characteristics: [CharacteristicInfo; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_v4() {
        let identity = ServiceIdentity::from_random_bytes([0x5A; 16]);
        assert_eq!(identity.uuid().get_version_num(), 4);
    }

    #[test]
    fn test_profile_ids_distinct() {
        let mut bytes = [0u8; 48];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let ids = ProfileIds::from_random_bytes(bytes);

        assert_ne!(ids.service.uuid(), &ids.write);
        assert_ne!(ids.write, ids.notify);
        assert_eq!(ids.notify.get_version_num(), 4);
    }

    #[test]
    fn test_same_bytes_same_identity() {
        let a = ProfileIds::from_random_bytes([7; 48]);
        let b = ProfileIds::from_random_bytes([7; 48]);
        assert_eq!(a, b);
    }
}
