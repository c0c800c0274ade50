//! Advertising settings, payload and outcomes

use core::fmt;

use crate::config::advertise::{
    AD_TYPE_COMPLETE_UUID128, AD_TYPE_FLAGS, FLAGS_GENERAL_DISCOVERABLE, HIGH_TX_POWER_DBM,
    LOW_LATENCY_INTERVAL_MS, MAX_PAYLOAD_LEN,
};
use crate::gatt::service::ServiceIdentity;

/// Advertising interval class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseMode {
    LowPower,
    Balanced,
    LowLatency,
}

impl AdvertiseMode {
    pub fn interval_ms(self) -> u32 {
        match self {
            AdvertiseMode::LowPower => 1000,
            AdvertiseMode::Balanced => 250,
            AdvertiseMode::LowLatency => LOW_LATENCY_INTERVAL_MS,
        }
    }
}

/// Transmit power class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPowerLevel {
    UltraLow,
    Low,
    Medium,
    High,
}

impl TxPowerLevel {
    pub fn dbm(self) -> i8 {
        match self {
            TxPowerLevel::UltraLow => -21,
            TxPowerLevel::Low => -15,
            TxPowerLevel::Medium => -7,
            TxPowerLevel::High => HIGH_TX_POWER_DBM,
        }
    }
}

/// Settings requested from (or reported back by) the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertiseSettings {
    pub connectable: bool,
    pub mode: AdvertiseMode,
    pub tx_power: TxPowerLevel,
}

impl AdvertiseSettings {
    /// Connectable, low latency, high power
    pub const fn calculator() -> Self {
        Self {
            connectable: true,
            mode: AdvertiseMode::LowLatency,
            tx_power: TxPowerLevel::High,
        }
    }
}

impl Default for AdvertiseSettings {
    fn default() -> Self {
        Self::calculator()
    }
}

/// Advertisement payload: the service UUID and nothing else.
///
/// The device name is left out so the 128-bit UUID fits in a legacy PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertiseData {
    service: ServiceIdentity,
}

impl AdvertiseData {
    pub const fn service_only(service: ServiceIdentity) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &ServiceIdentity {
        &self.service
    }

    /// Encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        // flags (len, type, value) + uuid list (len, type, 16 bytes)
        3 + 2 + 16
    }

    /// Write the AD structures into `buf`, returning the number of bytes
    /// used.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, AdvertiseError> {
        let len = self.encoded_len();
        if len > MAX_PAYLOAD_LEN || len > buf.len() {
            return Err(AdvertiseError::DataTooLarge);
        }

        buf[0] = 2;
        buf[1] = AD_TYPE_FLAGS;
        buf[2] = FLAGS_GENERAL_DISCOVERABLE;
        buf[3] = 17;
        buf[4] = AD_TYPE_COMPLETE_UUID128;
        buf[5..len].copy_from_slice(&self.service.uuid().as_u128().to_le_bytes());

        Ok(len)
    }
}

/// Why the platform refused to advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseError {
    FeatureUnsupported,
    TooManyAdvertisers,
    AlreadyStarted,
    DataTooLarge,
    InternalError,
    /// Status code the platform reported that has no known meaning
    Unknown(i32),
}

impl AdvertiseError {
    /// Map a platform advertise failure code
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => AdvertiseError::DataTooLarge,
            2 => AdvertiseError::TooManyAdvertisers,
            3 => AdvertiseError::AlreadyStarted,
            4 => AdvertiseError::InternalError,
            5 => AdvertiseError::FeatureUnsupported,
            other => AdvertiseError::Unknown(other),
        }
    }
}

impl fmt::Display for AdvertiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdvertiseError::FeatureUnsupported => write!(f, "advertising not supported"),
            AdvertiseError::TooManyAdvertisers => write!(f, "too many advertisers"),
            AdvertiseError::AlreadyStarted => write!(f, "already started"),
            AdvertiseError::DataTooLarge => write!(f, "data too large"),
            AdvertiseError::InternalError => write!(f, "internal error"),
            AdvertiseError::Unknown(code) => write!(f, "unknown error {}", code),
        }
    }
}

/// Result of one start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseOutcome {
    /// Advertising with the settings the platform actually applied
    Started(AdvertiseSettings),
    Failed(AdvertiseError),
}

/// Identifies one start request, so late platform callbacks can be matched
/// (or dropped)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
