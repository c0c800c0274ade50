//! GATT server for the calculator service
//!
//! One primary service with two characteristics:
//! - Write characteristic: the central writes an expression here
//! - Notify characteristic: the server notifies the result here (also readable)

pub mod characteristic;
pub mod connection;
pub mod server;
pub mod service;
pub mod traits;
pub mod types;

pub use characteristic::{Characteristic, Descriptor, Permissions, Properties};
pub use connection::{Connection, DeviceAddress};
pub use server::{GattServer, ServerState};
pub use service::{ProfileIds, ServiceDefinition, ServiceIdentity};
pub use traits::{GattResponse, GattTransport};
pub use types::{GattError, GattOperation, GattStatus};
