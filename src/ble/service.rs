//! Calculator service attribute table
//!
//! The service and characteristic UUIDs are only known at boot, so the table
//! is built at runtime instead of with `#[gatt_service]`:
//! - GAP service: device name, appearance
//! - Calculator service: Write characteristic, Notify characteristic (the
//!   stack adds its CCCD)

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use trouble_host::prelude::*;

use crate::config::firmware::DEVICE_NAME;
use crate::gatt::ProfileIds;

/// Attributes in the table (GAP 5, calculator 6, with headroom)
pub const ATTRIBUTE_TABLE_SIZE: usize = 16;
/// CCCD entries
pub const CCCD_TABLE_SIZE: usize = 2;
/// Concurrent connections served
pub const CONNECTIONS_MAX: usize = 1;
/// Storage for each characteristic value
pub const VALUE_LEN: usize = 64;

/// Variable-length characteristic value
pub type CalcValue = heapless::Vec<u8, VALUE_LEN>;

pub type CalcTable = AttributeTable<'static, CriticalSectionRawMutex, ATTRIBUTE_TABLE_SIZE>;

pub type CalcAttributeServer = AttributeServer<
    'static,
    CriticalSectionRawMutex,
    DefaultPacketPool,
    ATTRIBUTE_TABLE_SIZE,
    CCCD_TABLE_SIZE,
    CONNECTIONS_MAX,
>;

/// Handles of the calculator characteristics
pub struct CalcService {
    pub write: Characteristic<CalcValue>,
    pub notify: Characteristic<CalcValue>,
}

/// trouble-host stores 128-bit UUIDs little-endian
fn long_uuid(uuid: &uuid::Uuid) -> Uuid {
    Uuid::new_long(uuid.as_u128().to_le_bytes())
}

/// Build the attribute table for `profile`. Call once per boot.
pub fn build_table(profile: &ProfileIds) -> (CalcTable, CalcService) {
    static WRITE_STORE: StaticCell<[u8; VALUE_LEN]> = StaticCell::new();
    static NOTIFY_STORE: StaticCell<[u8; VALUE_LEN]> = StaticCell::new();

    let mut table = CalcTable::new();

    let mut gap = table.add_service(Service::new(service::GAP));
    gap.add_characteristic_ro(characteristic::DEVICE_NAME, DEVICE_NAME);
    gap.add_characteristic_ro(characteristic::APPEARANCE, &appearance::UNKNOWN);
    gap.build();

    let mut calc = table.add_service(Service::new(long_uuid(profile.service.uuid())));
    let write = calc
        .add_characteristic(
            long_uuid(&profile.write),
            [CharacteristicProp::Write],
            CalcValue::new(),
            WRITE_STORE.init([0; VALUE_LEN]),
        )
        .build();
    let notify = calc
        .add_characteristic(
            long_uuid(&profile.notify),
            [CharacteristicProp::Notify, CharacteristicProp::Read],
            CalcValue::new(),
            NOTIFY_STORE.init([0; VALUE_LEN]),
        )
        .build();
    calc.build();

    (table, CalcService { write, notify })
}
