//! GATT server state machine
//!
//! Owns the calculator service and answers every callback the platform GATT
//! layer delivers. A write to the Write characteristic runs the exchange:
//!
//! 1. evaluate the payload
//! 2. store the encoded result as the Notify characteristic's value
//! 3. notify the writing device (unconfirmed)
//! 4. if the write asked for a response, acknowledge it with the *original*
//!    payload bytes and a success status
//!
//! Malformed expressions are not GATT errors: they go through the same
//! success path with `ERROR` as the notified value.
//!
//! All callbacks are serialised by one async mutex per server, held for the
//! whole exchange, so concurrent writers never interleave their
//! notify/response pairs or leave a mixed Notify value behind.

use crate::calc::{evaluate, Evaluation};
use crate::config::ble::MAX_ATTRIBUTE_LEN;
use crate::gatt::characteristic::{AttributeValue, Characteristic, Permissions};
use crate::gatt::connection::{Connection, ConnectionSet, DeviceAddress};
use crate::gatt::service::{ProfileIds, ServiceDefinition};
use crate::gatt::traits::{GattResponse, GattTransport};
use crate::gatt::types::{GattError, GattOperation, GattStatus};
use crate::hooks::PeripheralHooks;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use heapless::Vec;
use uuid::Uuid;

/// Lifecycle of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Service not yet published
    Idle,
    /// Service visible in the platform GATT database
    ServiceRegistered,
    /// Service registered and the peripheral is advertising
    Advertising,
}

/// Platform failures collected while the lock is held, reported after
type Failures = Vec<(GattOperation, GattStatus), 2>;

struct ServerInner<T> {
    state: ServerState,
    write_char: Characteristic,
    notify_char: Characteristic,
    connections: ConnectionSet,
    transport: T,
}

fn find<'a>(
    write_char: &'a Characteristic,
    notify_char: &'a Characteristic,
    uuid: &Uuid,
) -> Option<&'a Characteristic> {
    [write_char, notify_char]
        .into_iter()
        .find(|c| c.uuid() == uuid)
}

fn find_mut<'a>(
    write_char: &'a mut Characteristic,
    notify_char: &'a mut Characteristic,
    uuid: &Uuid,
) -> Option<&'a mut Characteristic> {
    if write_char.uuid() == uuid {
        Some(write_char)
    } else if notify_char.uuid() == uuid {
        Some(notify_char)
    } else {
        None
    }
}

/// Calculator GATT server
///
/// Generic over the raw mutex guarding its state, the platform transport and
/// the application hooks.
pub struct GattServer<M: RawMutex, T: GattTransport, H: PeripheralHooks> {
    profile: ProfileIds,
    inner: Mutex<M, ServerInner<T>>,
    hooks: H,
}

impl<M: RawMutex, T: GattTransport, H: PeripheralHooks> GattServer<M, T, H> {
    pub fn new(profile: ProfileIds, transport: T, hooks: H) -> Self {
        Self {
            profile,
            inner: Mutex::new(ServerInner {
                state: ServerState::Idle,
                write_char: Characteristic::write(profile.write),
                notify_char: Characteristic::notify(profile.notify),
                connections: ConnectionSet::new(),
                transport,
            }),
            hooks,
        }
    }

    pub fn profile(&self) -> &ProfileIds {
        &self.profile
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub async fn state(&self) -> ServerState {
        self.inner.lock().await.state
    }

    /// Publish the service to the platform.
    ///
    /// Only valid once per server. A platform failure leaves the server
    /// `Idle`; nothing is retried.
    pub async fn register_service(&self) -> Result<(), GattError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        if inner.state != ServerState::Idle {
            log::warn!("GATT: Service {} already registered", self.profile.service);
            return Err(GattError::AlreadyRegistered);
        }

        let definition = ServiceDefinition {
            identity: self.profile.service,
            primary: true,
            characteristics: [inner.write_char.info(), inner.notify_char.info()],
        };

        match inner.transport.add_service(&definition).await {
            Ok(()) => {
                inner.state = ServerState::ServiceRegistered;
                log::info!("GATT: Service {} registered", self.profile.service);
                Ok(())
            }
            Err(status) => {
                drop(guard);
                self.report(&[(GattOperation::RegisterService, status)]);
                Err(GattError::Operation(GattOperation::RegisterService, status))
            }
        }
    }

    /// Advertising began; the service is now connectable
    pub async fn advertising_started(&self) -> Result<(), GattError> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            ServerState::Idle => Err(GattError::NotRegistered),
            _ => {
                inner.state = ServerState::Advertising;
                Ok(())
            }
        }
    }

    /// Advertising was stopped; existing connections are unaffected
    pub async fn advertising_stopped(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == ServerState::Advertising {
            inner.state = ServerState::ServiceRegistered;
        }
    }

    pub async fn on_connection_state_change(&self, device: DeviceAddress, connected: bool) {
        {
            let mut inner = self.inner.lock().await;
            if connected {
                if !inner.connections.connect(device) {
                    log::warn!("GATT: Connection table full, {} not tracked", device);
                }
            } else {
                inner.connections.disconnect(&device);
            }
        }

        if connected {
            log::info!("GATT: {} connected", device);
        } else {
            log::info!("GATT: {} disconnected", device);
        }
        self.hooks.on_connection_event(&device, connected);
    }

    pub async fn on_mtu_changed(&self, device: DeviceAddress, mtu: u16) {
        let mut inner = self.inner.lock().await;
        if inner.connections.set_mtu(&device, mtu) {
            log::debug!("GATT: {} MTU {}", device, mtu);
        }
    }

    /// Handle a characteristic write
    pub async fn on_write_request(
        &self,
        device: DeviceAddress,
        request_id: u32,
        characteristic: &Uuid,
        payload: &[u8],
        response_needed: bool,
    ) {
        let mut failures = Failures::new();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let check = if inner.state == ServerState::Idle {
            Err(GattStatus::InvalidHandle)
        } else if payload.len() > MAX_ATTRIBUTE_LEN {
            Err(GattStatus::InvalidAttributeLength)
        } else {
            match find(&inner.write_char, &inner.notify_char, characteristic) {
                None => Err(GattStatus::InvalidHandle),
                Some(c) if !c.can_write() => Err(GattStatus::WriteNotPermitted),
                Some(_) => Ok(()),
            }
        };

        if let Err(status) = check {
            log::warn!(
                "GATT: Rejected write from {} to {}: {:?}",
                device,
                characteristic,
                status
            );
            if response_needed {
                let response = GattResponse {
                    request_id,
                    status,
                    offset: 0,
                    value: &[],
                };
                if let Err(status) = inner.transport.send_response(&device, &response).await {
                    let _ = failures.push((GattOperation::SendResponse, status));
                }
            }
            drop(guard);
            self.report(&failures);
            return;
        }

        // Only the Write characteristic is writable
        let evaluation = evaluate(payload);
        let encoded = evaluation.encode();
        inner.write_char.set_value(payload);
        inner.notify_char.set_value(encoded.as_bytes());

        if let Err(status) = inner
            .transport
            .notify(&device, &self.profile.notify, inner.notify_char.value())
            .await
        {
            let _ = failures.push((GattOperation::Notify, status));
        }

        if response_needed {
            let response = GattResponse {
                request_id,
                status: GattStatus::Success,
                offset: 0,
                value: payload,
            };
            if let Err(status) = inner.transport.send_response(&device, &response).await {
                let _ = failures.push((GattOperation::SendResponse, status));
            }
        }
        drop(guard);

        match &evaluation {
            Evaluation::Value(value) => log::info!("GATT: {} -> {}", device, value),
            Evaluation::Error(error) => log::info!("GATT: {} -> ERROR ({})", device, error),
        }
        self.report(&failures);
        self.hooks.on_write_handled(&device, payload, &evaluation);
    }

    /// Handle a characteristic read. Reads never trigger a computation.
    pub async fn on_read_request(
        &self,
        device: DeviceAddress,
        request_id: u32,
        characteristic: &Uuid,
        offset: u16,
    ) {
        let mut guard = self.inner.lock().await;
        let ServerInner {
            state,
            write_char,
            notify_char,
            transport,
            ..
        } = &mut *guard;

        let target = match state {
            ServerState::Idle => None,
            _ => find(write_char, notify_char, characteristic),
        };

        let (status, value): (GattStatus, &[u8]) = match target {
            None => (GattStatus::InvalidHandle, &[]),
            Some(c) if !c.can_read() => (GattStatus::ReadNotPermitted, &[]),
            Some(c) => match c.value().get(usize::from(offset)..) {
                Some(slice) => (GattStatus::Success, slice),
                None => (GattStatus::InvalidOffset, &[]),
            },
        };

        let response = GattResponse {
            request_id,
            status,
            offset,
            value,
        };
        let result = transport.send_response(&device, &response).await;
        drop(guard);

        if let Err(status) = result {
            self.report(&[(GattOperation::SendResponse, status)]);
        }
    }

    /// Descriptor read: answer with the stored value
    pub async fn on_descriptor_read_request(
        &self,
        device: DeviceAddress,
        request_id: u32,
        characteristic: &Uuid,
        descriptor: &Uuid,
        offset: u16,
    ) {
        let mut guard = self.inner.lock().await;
        let ServerInner {
            state,
            write_char,
            notify_char,
            transport,
            ..
        } = &mut *guard;

        let target = match state {
            ServerState::Idle => None,
            _ => find(write_char, notify_char, characteristic).and_then(|c| c.descriptor(descriptor)),
        };

        let (status, value): (GattStatus, &[u8]) = match target {
            None => (GattStatus::InvalidHandle, &[]),
            Some(d) if !d.permissions().contains(Permissions::READ) => {
                (GattStatus::ReadNotPermitted, &[])
            }
            Some(d) => match d.value().get(usize::from(offset)..) {
                Some(slice) => (GattStatus::Success, slice),
                None => (GattStatus::InvalidOffset, &[]),
            },
        };

        let response = GattResponse {
            request_id,
            status,
            offset,
            value,
        };
        let result = transport.send_response(&device, &response).await;
        drop(guard);

        if let Err(status) = result {
            self.report(&[(GattOperation::SendResponse, status)]);
        }
    }

    /// Descriptor write: record the value, nothing else
    pub async fn on_descriptor_write_request(
        &self,
        device: DeviceAddress,
        request_id: u32,
        characteristic: &Uuid,
        descriptor: &Uuid,
        value: &[u8],
        response_needed: bool,
    ) {
        let mut guard = self.inner.lock().await;
        let ServerInner {
            state,
            write_char,
            notify_char,
            transport,
            ..
        } = &mut *guard;

        let target = match state {
            ServerState::Idle => None,
            _ => find_mut(write_char, notify_char, characteristic)
                .and_then(|c| c.descriptor_mut(descriptor)),
        };

        let status = match target {
            None => GattStatus::InvalidHandle,
            Some(d) if !d.permissions().contains(Permissions::WRITE) => {
                GattStatus::WriteNotPermitted
            }
            Some(d) => {
                d.set_value(value);
                log::debug!("GATT: {} wrote descriptor {}", device, descriptor);
                GattStatus::Success
            }
        };

        let mut result = Ok(());
        if response_needed {
            let response = GattResponse {
                request_id,
                status,
                offset: 0,
                value: if status.is_success() { value } else { &[] },
            };
            result = transport.send_response(&device, &response).await;
        }
        drop(guard);

        if let Err(status) = result {
            self.report(&[(GattOperation::SendResponse, status)]);
        }
    }

    /// Execute (or cancel) queued prepared writes. Writes are applied
    /// immediately, so there is never anything queued.
    pub async fn on_execute_write(&self, device: DeviceAddress, request_id: u32, execute: bool) {
        log::debug!("GATT: {} execute write ({})", device, execute);

        let result = {
            let mut inner = self.inner.lock().await;
            let response = GattResponse {
                request_id,
                status: GattStatus::Success,
                offset: 0,
                value: &[],
            };
            inner.transport.send_response(&device, &response).await
        };

        if let Err(status) = result {
            self.report(&[(GattOperation::SendResponse, status)]);
        }
    }

    /// The platform finished sending a notification.
    ///
    /// Observational only: there is no retry and no timeout if this never
    /// arrives.
    pub fn on_notification_sent(&self, device: DeviceAddress, status: GattStatus) {
        if status.is_success() {
            log::debug!("GATT: Notification to {} sent", device);
        } else {
            self.report(&[(GattOperation::Notify, status)]);
        }
    }

    /// Current value of the Notify characteristic
    pub async fn notify_value(&self) -> AttributeValue {
        let inner = self.inner.lock().await;
        let mut value = AttributeValue::new();
        let _ = value.extend_from_slice(inner.notify_char.value());
        value
    }

    pub async fn connection(&self, device: &DeviceAddress) -> Option<Connection> {
        self.inner.lock().await.connections.get(device)
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.lock().await.connections.len()
    }

    fn report(&self, failures: &[(GattOperation, GattStatus)]) {
        for &(operation, status) in failures {
            log::warn!(
                "GATT: {:?} failed with status 0x{:04X}",
                operation,
                status.code()
            );
            self.hooks.on_gatt_failure(operation, status);
        }
    }
}
