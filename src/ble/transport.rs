//! Platform trait implementations for the firmware
//!
//! The engine runs inside the connection loop, so its platform calls cannot
//! talk to the stack directly. Instead they queue work:
//! - GATT notifications and responses go into an [`OutboundChannel`] that the
//!   loop drains (in order) after each request
//! - advertise start/stop requests go into an [`AdvertiseSignal`] that the
//!   BLE task waits on

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use trouble_host::prelude::AttErrorCode;
use uuid::Uuid;

use crate::advertise::{AdvertiseData, AdvertiseError, AdvertiseSettings, AdvertisingBackend, SessionId};
use crate::ble::service::CalcValue;
use crate::gatt::{DeviceAddress, GattResponse, GattStatus, GattTransport, ServiceDefinition, ServiceIdentity};
use crate::readiness::RadioPlatform;

/// Queued work per request: at most one notification and one response
const OUTBOUND_DEPTH: usize = 4;

/// Work for the connection loop
pub enum Outbound {
    Notify(CalcValue),
    Response(GattStatus),
}

pub type OutboundChannel = Channel<CriticalSectionRawMutex, Outbound, OUTBOUND_DEPTH>;

/// `GattTransport` over the outbound channel
pub struct ChannelTransport<'a> {
    service: ServiceIdentity,
    outbound: &'a OutboundChannel,
}

impl<'a> ChannelTransport<'a> {
    /// `service` is the identity the attribute table was built with
    pub fn new(service: ServiceIdentity, outbound: &'a OutboundChannel) -> Self {
        Self { service, outbound }
    }
}

impl GattTransport for ChannelTransport<'_> {
    async fn add_service(&mut self, service: &ServiceDefinition) -> Result<(), GattStatus> {
        // The table is built before the stack starts, only check it matches
        if service.identity == self.service {
            Ok(())
        } else {
            Err(GattStatus::Failure)
        }
    }

    async fn notify(
        &mut self,
        _device: &DeviceAddress,
        _characteristic: &Uuid,
        value: &[u8],
    ) -> Result<(), GattStatus> {
        let mut buf = CalcValue::new();
        buf.extend_from_slice(value)
            .map_err(|_| GattStatus::InvalidAttributeLength)?;
        self.outbound
            .try_send(Outbound::Notify(buf))
            .map_err(|_| GattStatus::Failure)
    }

    async fn send_response(
        &mut self,
        _device: &DeviceAddress,
        response: &GattResponse<'_>,
    ) -> Result<(), GattStatus> {
        // The stack builds the ATT response itself, only the status matters
        self.outbound
            .try_send(Outbound::Response(response.status))
            .map_err(|_| GattStatus::Failure)
    }
}

/// ATT error code for a rejected request
pub fn att_error(status: GattStatus) -> AttErrorCode {
    match status {
        GattStatus::InvalidHandle => AttErrorCode::INVALID_HANDLE,
        GattStatus::ReadNotPermitted => AttErrorCode::READ_NOT_PERMITTED,
        GattStatus::WriteNotPermitted => AttErrorCode::WRITE_NOT_PERMITTED,
        GattStatus::InvalidOffset => AttErrorCode::INVALID_OFFSET,
        GattStatus::InvalidAttributeLength => AttErrorCode::INVALID_ATTRIBUTE_VALUE_LENGTH,
        _ => AttErrorCode::UNLIKELY_ERROR,
    }
}

/// Request for the BLE task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseCommand {
    Start(SessionId),
    Stop(SessionId),
}

pub type AdvertiseSignal = Signal<CriticalSectionRawMutex, AdvertiseCommand>;

/// `AdvertisingBackend` that hands requests to the BLE task.
///
/// The task reads settings and payload from the controller, so only the
/// session travels through the signal.
pub struct SignalAdvertisingBackend<'a> {
    commands: &'a AdvertiseSignal,
}

impl<'a> SignalAdvertisingBackend<'a> {
    pub fn new(commands: &'a AdvertiseSignal) -> Self {
        Self { commands }
    }
}

impl AdvertisingBackend for SignalAdvertisingBackend<'_> {
    fn request_start(
        &mut self,
        session: SessionId,
        _settings: &AdvertiseSettings,
        _data: &AdvertiseData,
    ) -> Result<(), AdvertiseError> {
        self.commands.signal(AdvertiseCommand::Start(session));
        Ok(())
    }

    fn request_stop(&mut self, session: SessionId) {
        self.commands.signal(AdvertiseCommand::Stop(session));
    }
}

/// The ESP32-S3 radio: always present and on once esp-radio is up, with no
/// runtime permissions to ask for
pub struct EspRadioPlatform;

impl RadioPlatform for EspRadioPlatform {
    fn adapter_present(&self) -> bool {
        true
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn request_enable(&mut self) {}

    fn multi_advertisement_supported(&self) -> bool {
        true
    }

    fn permission_granted(&self) -> bool {
        true
    }

    async fn request_permission(&mut self) -> bool {
        true
    }
}
