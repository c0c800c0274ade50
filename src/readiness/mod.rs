//! Radio readiness gate
//!
//! Advertising may only begin once the radio is present, enabled, capable of
//! multi-advertisement and permitted. [`ReadinessGate::check`] walks those
//! stages in order and hands out the [`RadioReady`] token the advertiser
//! requires.

pub mod gate;
pub mod traits;
pub mod types;

pub use gate::ReadinessGate;
pub use traits::RadioPlatform;
pub use types::{RadioReady, RadioUnavailable, ReadinessStage};
