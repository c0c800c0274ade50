//! Informational hooks for the embedding application
//!
//! The UI or OS layer around the peripheral can observe what the engine is
//! doing (to show toasts, status text, logs). Every method has a no-op
//! default, and the engine works the same with none of them implemented.

use crate::advertise::types::AdvertiseOutcome;
use crate::calc::Evaluation;
use crate::gatt::connection::DeviceAddress;
use crate::gatt::types::{GattOperation, GattStatus};
use crate::readiness::types::ReadinessStage;

pub trait PeripheralHooks {
    /// A readiness stage passed (`granted`) or stopped the chain
    fn on_readiness_changed(&self, _stage: ReadinessStage, _granted: bool) {}

    /// Exactly one call per advertise start request
    fn on_advertise_outcome(&self, _outcome: &AdvertiseOutcome) {}

    fn on_connection_event(&self, _device: &DeviceAddress, _connected: bool) {}

    /// A write to the Write characteristic was evaluated and notified
    fn on_write_handled(&self, _device: &DeviceAddress, _raw_payload: &[u8], _result: &Evaluation) {}

    /// The platform GATT layer reported a non-success status
    fn on_gatt_failure(&self, _operation: GattOperation, _status: GattStatus) {}
}

/// No hooks
impl PeripheralHooks for () {}

impl<H: PeripheralHooks + ?Sized> PeripheralHooks for &H {
    fn on_readiness_changed(&self, stage: ReadinessStage, granted: bool) {
        (**self).on_readiness_changed(stage, granted)
    }

    fn on_advertise_outcome(&self, outcome: &AdvertiseOutcome) {
        (**self).on_advertise_outcome(outcome)
    }

    fn on_connection_event(&self, device: &DeviceAddress, connected: bool) {
        (**self).on_connection_event(device, connected)
    }

    fn on_write_handled(&self, device: &DeviceAddress, raw_payload: &[u8], result: &Evaluation) {
        (**self).on_write_handled(device, raw_payload, result)
    }

    fn on_gatt_failure(&self, operation: GattOperation, status: GattStatus) {
        (**self).on_gatt_failure(operation, status)
    }
}
