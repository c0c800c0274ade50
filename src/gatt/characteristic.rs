//! Characteristic and descriptor model
//!
//! Pure data: UUID, fixed properties/permissions and a mutable value.
//! Values are not validated here; the evaluator decides what a write means.

use crate::config::ble::{CCCD_UUID, MAX_ATTRIBUTE_LEN};
use heapless::Vec;
use uuid::Uuid;

/// Characteristic properties (what the central is told it may do)
///
/// Bit values follow the characteristic declaration properties field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties(u8);

impl Properties {
    pub const READ: Properties = Properties(0x02);
    pub const WRITE: Properties = Properties(0x08);
    pub const NOTIFY: Properties = Properties(0x10);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn union(self, other: Properties) -> Properties {
        Properties(self.0 | other.0)
    }

    pub const fn contains(self, other: Properties) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Attribute permissions (what the server actually allows)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions(u8);

impl Permissions {
    pub const READ: Permissions = Permissions(0x01);
    pub const WRITE: Permissions = Permissions(0x10);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn union(self, other: Permissions) -> Permissions {
        Permissions(self.0 | other.0)
    }

    pub const fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Attribute value storage
pub type AttributeValue = Vec<u8, MAX_ATTRIBUTE_LEN>;

/// Copy `bytes` into an attribute value, truncating at the ATT maximum
fn store(value: &mut AttributeValue, bytes: &[u8]) {
    value.clear();
    let len = bytes.len().min(MAX_ATTRIBUTE_LEN);
    // Cannot fail, len is within capacity
    let _ = value.extend_from_slice(&bytes[..len]);
}

/// Characteristic descriptor
#[derive(Debug, Clone)]
pub struct Descriptor {
    uuid: Uuid,
    permissions: Permissions,
    value: AttributeValue,
}

impl Descriptor {
    pub fn new(uuid: Uuid, permissions: Permissions) -> Self {
        Self {
            uuid,
            permissions,
            value: Vec::new(),
        }
    }

    /// Client Characteristic Configuration descriptor, notifications off
    pub fn cccd() -> Self {
        let mut descriptor = Self::new(
            Uuid::from_u128(CCCD_UUID),
            Permissions::READ.union(Permissions::WRITE),
        );
        descriptor.set_value(&[0x00, 0x00]);
        descriptor
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn set_value(&mut self, bytes: &[u8]) {
        store(&mut self.value, bytes);
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// Metadata handed to the platform when registering the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicInfo {
    pub uuid: Uuid,
    pub properties: Properties,
    pub permissions: Permissions,
    /// UUID of the single descriptor, if any
    pub descriptor: Option<Uuid>,
}

/// GATT characteristic
#[derive(Debug, Clone)]
pub struct Characteristic {
    uuid: Uuid,
    properties: Properties,
    permissions: Permissions,
    value: AttributeValue,
    descriptor: Option<Descriptor>,
}

impl Characteristic {
    pub fn new(uuid: Uuid, properties: Properties, permissions: Permissions) -> Self {
        Self {
            uuid,
            properties,
            permissions,
            value: Vec::new(),
            descriptor: None,
        }
    }

    /// Characteristic the central writes expressions to
    pub fn write(uuid: Uuid) -> Self {
        Self::new(uuid, Properties::WRITE, Permissions::WRITE)
    }

    /// Characteristic the server notifies results on.
    ///
    /// Readable so a central can fetch the last result without waiting for
    /// a notification.
    pub fn notify(uuid: Uuid) -> Self {
        let mut characteristic = Self::new(uuid, Properties::NOTIFY, Permissions::READ);
        characteristic.descriptor = Some(Descriptor::cccd());
        characteristic
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn properties(&self) -> Properties {
        self.properties
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn set_value(&mut self, bytes: &[u8]) {
        store(&mut self.value, bytes);
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn can_read(&self) -> bool {
        self.permissions.contains(Permissions::READ)
    }

    pub fn can_write(&self) -> bool {
        self.permissions.contains(Permissions::WRITE)
            && self.properties.contains(Properties::WRITE)
    }

    pub fn can_notify(&self) -> bool {
        self.properties.contains(Properties::NOTIFY)
    }

    pub fn descriptor(&self, uuid: &Uuid) -> Option<&Descriptor> {
        self.descriptor.as_ref().filter(|d| d.uuid() == uuid)
    }

    pub fn descriptor_mut(&mut self, uuid: &Uuid) -> Option<&mut Descriptor> {
        self.descriptor.as_mut().filter(|d| d.uuid() == uuid)
    }

    pub fn info(&self) -> CharacteristicInfo {
        CharacteristicInfo {
            uuid: self.uuid,
            properties: self.properties,
            permissions: self.permissions,
            descriptor: self.descriptor.as_ref().map(|d| *d.uuid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRITE_UUID: Uuid = Uuid::from_u128(0x1111);
    const NOTIFY_UUID: Uuid = Uuid::from_u128(0x2222);

    #[test]
    fn test_write_characteristic_metadata() {
        let c = Characteristic::write(WRITE_UUID);
        assert_eq!(c.properties(), Properties::WRITE);
        assert_eq!(c.permissions(), Permissions::WRITE);
        assert!(c.can_write());
        assert!(!c.can_read());
        assert!(!c.can_notify());
        assert!(c.info().descriptor.is_none());
    }

    #[test]
    fn test_notify_characteristic_metadata() {
        let c = Characteristic::notify(NOTIFY_UUID);
        assert_eq!(c.properties(), Properties::NOTIFY);
        assert_eq!(c.permissions(), Permissions::READ);
        assert!(c.can_read());
        assert!(!c.can_write());
        assert!(c.can_notify());

        let cccd = Uuid::from_u128(CCCD_UUID);
        assert_eq!(c.info().descriptor, Some(cccd));
        assert_eq!(c.descriptor(&cccd).map(|d| d.value()), Some(&[0x00, 0x00][..]));
    }

    #[test]
    fn test_value_accessors() {
        let mut c = Characteristic::notify(NOTIFY_UUID);
        assert!(c.value().is_empty());

        c.set_value(b"48");
        assert_eq!(c.value(), b"48");

        c.set_value(b"ERROR");
        assert_eq!(c.value(), b"ERROR");
    }

    #[test]
    fn test_value_truncated_at_att_limit() {
        let mut c = Characteristic::write(WRITE_UUID);
        let long = [b'1'; MAX_ATTRIBUTE_LEN + 10];
        c.set_value(&long);
        assert_eq!(c.value().len(), MAX_ATTRIBUTE_LEN);
    }

    #[test]
    fn test_descriptor_lookup_by_uuid() {
        let mut c = Characteristic::notify(NOTIFY_UUID);
        let cccd = Uuid::from_u128(CCCD_UUID);

        assert!(c.descriptor(&Uuid::from_u128(0x2901)).is_none());

        let d = c.descriptor_mut(&cccd).expect("CCCD present");
        d.set_value(&[0x01, 0x00]);
        assert_eq!(c.descriptor(&cccd).map(|d| d.value()), Some(&[0x01, 0x00][..]));
    }

    #[test]
    fn test_flags() {
        let both = Properties::WRITE.union(Properties::NOTIFY);
        assert!(both.contains(Properties::WRITE));
        assert!(both.contains(Properties::NOTIFY));
        assert!(!both.contains(Properties::READ));
        assert_eq!(both.bits(), 0x18);
    }
}
