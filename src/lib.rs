#![cfg_attr(not(test), no_std)]

pub mod advertise;
pub mod calc;
pub mod config;
pub mod gatt;
pub mod hooks;
pub mod readiness;

// Firmware binding, needs the esp/trouble-host stack
#[cfg(feature = "embedded")]
pub mod ble;
#[cfg(feature = "embedded")]
pub mod debug;
#[cfg(feature = "embedded")]
pub mod tasks;
