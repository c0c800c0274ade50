//! Advertising of the calculator service
//!
//! Fixed policy: connectable, low latency, high transmit power, and a payload
//! carrying only the service UUID. The controller turns the platform's
//! asynchronous start callbacks into exactly one [`AdvertiseOutcome`] per
//! start request.

pub mod controller;
pub mod traits;
pub mod types;

pub use controller::AdvertiserController;
pub use traits::AdvertisingBackend;
pub use types::{
    AdvertiseData, AdvertiseError, AdvertiseMode, AdvertiseOutcome, AdvertiseSettings,
    SessionId, TxPowerLevel,
};
