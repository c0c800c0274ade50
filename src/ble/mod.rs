//! Bluetooth Low Energy binding
//!
//! Connects the platform-independent engine to trouble-host: the attribute
//! table for the calculator service, and implementations of the engine's
//! platform traits on top of embassy channels and signals.

pub mod service;
pub mod transport;

pub use service::{build_table, CalcAttributeServer, CalcService};
pub use transport::{
    AdvertiseCommand, AdvertiseSignal, ChannelTransport, EspRadioPlatform, Outbound,
    OutboundChannel, SignalAdvertisingBackend,
};
