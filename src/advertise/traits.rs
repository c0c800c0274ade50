//! Platform advertiser trait for abstraction and testability

use crate::advertise::types::{AdvertiseData, AdvertiseError, AdvertiseSettings, SessionId};

/// Abstract platform advertiser
///
/// Both calls are synchronous requests. The result of a start arrives later
/// through the controller's `on_start_success` / `on_start_failure`, and must
/// not be delivered from inside `request_start` itself.
pub trait AdvertisingBackend {
    /// Ask the platform to begin advertising. An `Err` means the request was
    /// rejected outright and no callback will follow.
    fn request_start(
        &mut self,
        session: SessionId,
        settings: &AdvertiseSettings,
        data: &AdvertiseData,
    ) -> Result<(), AdvertiseError>;

    /// Ask the platform to stop advertising for `session`
    fn request_stop(&mut self, session: SessionId);
}
