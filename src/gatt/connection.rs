//! Connected centrals
//!
//! Connections are purely observational: the calculator keeps no state per
//! connection beyond the negotiated MTU.

use core::fmt;

use crate::config::ble::{DEFAULT_MTU, MAX_CONNECTIONS};
use heapless::Vec;

/// Bluetooth device address of a central
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress(pub [u8; 6]);

impl DeviceAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// One central's link to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub address: DeviceAddress,
    /// Negotiated ATT MTU
    pub mtu: u16,
}

/// Set of currently connected centrals
pub struct ConnectionSet {
    connections: Vec<Connection, MAX_CONNECTIONS>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
        }
    }

    /// Track a new connection.
    ///
    /// Returns false if the set is full; the device stays connected at the
    /// platform level, it is only not tracked here.
    pub fn connect(&mut self, address: DeviceAddress) -> bool {
        if self.contains(&address) {
            return true;
        }
        self.connections
            .push(Connection {
                address,
                mtu: DEFAULT_MTU,
            })
            .is_ok()
    }

    /// Forget a connection. Returns true if it was tracked.
    pub fn disconnect(&mut self, address: &DeviceAddress) -> bool {
        match self.connections.iter().position(|c| c.address == *address) {
            Some(index) => {
                self.connections.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn set_mtu(&mut self, address: &DeviceAddress, mtu: u16) -> bool {
        match self.connections.iter_mut().find(|c| c.address == *address) {
            Some(connection) => {
                connection.mtu = mtu;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, address: &DeviceAddress) -> Option<Connection> {
        self.connections.iter().find(|c| c.address == *address).copied()
    }

    pub fn contains(&self, address: &DeviceAddress) -> bool {
        self.get(address).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionSet {
    fn default() -> Self {
        Self::new()
    }
}
