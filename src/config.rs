//! Compile-time configuration for the calculator peripheral

/// GATT / ATT limits
pub mod ble {
    /// Maximum length of an attribute value (ATT limit)
    pub const MAX_ATTRIBUTE_LEN: usize = 512;

    /// Connections tracked by the server at once
    pub const MAX_CONNECTIONS: usize = 4;

    /// ATT MTU before any exchange
    pub const DEFAULT_MTU: u16 = 23;

    /// Client Characteristic Configuration descriptor (0x2902) in 128-bit form
    pub const CCCD_UUID: u128 = 0x00002902_0000_1000_8000_00805f9b34fb;
}

/// Advertising policy
pub mod advertise {
    /// Legacy advertising PDU payload limit
    pub const MAX_PAYLOAD_LEN: usize = 31;

    /// AD type: flags
    pub const AD_TYPE_FLAGS: u8 = 0x01;

    /// AD type: complete list of 128-bit service UUIDs
    pub const AD_TYPE_COMPLETE_UUID128: u8 = 0x07;

    /// LE General Discoverable | BR/EDR Not Supported
    pub const FLAGS_GENERAL_DISCOVERABLE: u8 = 0x06;

    /// Advertising interval for low-latency mode, in milliseconds
    pub const LOW_LATENCY_INTERVAL_MS: u32 = 100;

    /// Transmit power for the "high" level, in dBm
    pub const HIGH_TX_POWER_DBM: i8 = 9;

    /// Pause before advertising again after the radio failed a session
    pub const RETRY_DELAY_MS: u64 = 500;
}

/// Radio readiness gate
pub mod readiness {
    /// Attempts to enable a disabled adapter before giving up
    pub const MAX_ENABLE_ATTEMPTS: u8 = 3;
}

/// Expression evaluator
pub mod calc {
    /// Token notified when an expression cannot be evaluated
    pub const ERROR_TOKEN: &str = "ERROR";

    /// Room for the longest encoded result ("-2147483648")
    pub const RESULT_CAPACITY: usize = 16;
}

/// Firmware identity
pub mod firmware {
    /// GAP device name (not included in the advertisement payload)
    pub const DEVICE_NAME: &str = "CalcPeripheral";

    pub const VERSION_MAJOR: u8 = 0;
    pub const VERSION_MINOR: u8 = 1;
    pub const VERSION_PATCH: u8 = 0;
}
