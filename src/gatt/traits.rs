//! Platform GATT layer trait for abstraction and testability
//!
//! The server state machine talks to the host BLE stack only through this
//! trait, so the same engine runs on the trouble-host firmware binding or a
//! mock in tests.

use core::future::Future;

use crate::gatt::connection::DeviceAddress;
use crate::gatt::service::ServiceDefinition;
use crate::gatt::types::GattStatus;
use uuid::Uuid;

/// Response to a read, write or descriptor request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattResponse<'a> {
    /// Identifier of the request being answered
    pub request_id: u32,
    pub status: GattStatus,
    pub offset: u16,
    pub value: &'a [u8],
}

/// Abstract platform GATT server
pub trait GattTransport {
    /// Publish the service to the platform GATT database
    fn add_service(
        &mut self,
        service: &ServiceDefinition,
    ) -> impl Future<Output = Result<(), GattStatus>>;

    /// Send an unconfirmed notification of `value` on `characteristic`.
    ///
    /// Fire and forget: completion is reported later (if at all) through
    /// the server's `on_notification_sent`.
    fn notify(
        &mut self,
        device: &DeviceAddress,
        characteristic: &Uuid,
        value: &[u8],
    ) -> impl Future<Output = Result<(), GattStatus>>;

    /// Answer a request from `device`
    fn send_response(
        &mut self,
        device: &DeviceAddress,
        response: &GattResponse<'_>,
    ) -> impl Future<Output = Result<(), GattStatus>>;
}

#[cfg(test)]
pub mod mock {
    //! Mock GATT transport for testing

    use super::*;
    use std::sync::{Arc, Mutex};

    /// One call made on the transport
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TransportCall {
        AddService(ServiceDefinition),
        Notify {
            device: DeviceAddress,
            characteristic: Uuid,
            value: Vec<u8>,
        },
        Response {
            device: DeviceAddress,
            request_id: u32,
            status: GattStatus,
            offset: u16,
            value: Vec<u8>,
        },
    }

    #[derive(Default)]
    struct MockState {
        calls: Vec<TransportCall>,
        next_add_service_error: Option<GattStatus>,
        next_notify_error: Option<GattStatus>,
        next_response_error: Option<GattStatus>,
    }

    /// Mock transport. Clones share the same call log, so a test can keep a
    /// handle after moving one into the server.
    #[derive(Clone, Default)]
    pub struct MockGattTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockGattTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// All calls in the order they were made
        pub fn calls(&self) -> Vec<TransportCall> {
            self.state.lock().unwrap().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.state.lock().unwrap().calls.clear();
        }

        pub fn set_next_add_service_error(&self, status: GattStatus) {
            self.state.lock().unwrap().next_add_service_error = Some(status);
        }

        pub fn set_next_notify_error(&self, status: GattStatus) {
            self.state.lock().unwrap().next_notify_error = Some(status);
        }

        pub fn set_next_response_error(&self, status: GattStatus) {
            self.state.lock().unwrap().next_response_error = Some(status);
        }
    }

    impl GattTransport for MockGattTransport {
        async fn add_service(&mut self, service: &ServiceDefinition) -> Result<(), GattStatus> {
            let mut state = self.state.lock().unwrap();
            if let Some(status) = state.next_add_service_error.take() {
                return Err(status);
            }
            state.calls.push(TransportCall::AddService(*service));
            Ok(())
        }

        async fn notify(
            &mut self,
            device: &DeviceAddress,
            characteristic: &Uuid,
            value: &[u8],
        ) -> Result<(), GattStatus> {
            let mut state = self.state.lock().unwrap();
            if let Some(status) = state.next_notify_error.take() {
                return Err(status);
            }
            state.calls.push(TransportCall::Notify {
                device: *device,
                characteristic: *characteristic,
                value: value.to_vec(),
            });
            Ok(())
        }

        async fn send_response(
            &mut self,
            device: &DeviceAddress,
            response: &GattResponse<'_>,
        ) -> Result<(), GattStatus> {
            let mut state = self.state.lock().unwrap();
            if let Some(status) = state.next_response_error.take() {
                return Err(status);
            }
            state.calls.push(TransportCall::Response {
                device: *device,
                request_id: response.request_id,
                status: response.status,
                offset: response.offset,
                value: response.value.to_vec(),
            });
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const DEVICE: DeviceAddress = DeviceAddress::new([1, 2, 3, 4, 5, 6]);

        #[test]
        fn test_mock_records_calls() {
            let mut transport = MockGattTransport::new();
            let handle = transport.clone();

            futures::executor::block_on(async {
                transport
                    .notify(&DEVICE, &Uuid::from_u128(1), b"48")
                    .await
                    .unwrap();
            });

            assert_eq!(
                handle.calls(),
                [TransportCall::Notify {
                    device: DEVICE,
                    characteristic: Uuid::from_u128(1),
                    value: b"48".to_vec(),
                }]
            );
        }

        #[test]
        fn test_mock_error_cleared() {
            let mut transport = MockGattTransport::new();

            futures::executor::block_on(async {
                transport.set_next_notify_error(GattStatus::Failure);

                let result = transport.notify(&DEVICE, &Uuid::from_u128(1), b"1").await;
                assert_eq!(result, Err(GattStatus::Failure));

                // Error should be cleared
                transport
                    .notify(&DEVICE, &Uuid::from_u128(1), b"1")
                    .await
                    .unwrap();
            });

            assert_eq!(transport.calls().len(), 1);
        }
    }
}
