//! GATT status codes and server errors

use core::fmt;

/// Status carried by a GATT response or reported by the platform GATT layer
///
/// Values follow the ATT error codes, with `Failure` using the generic
/// platform failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattStatus {
    /// Request completed (0x0000)
    Success,
    /// No attribute with that handle/UUID (0x0001)
    InvalidHandle,
    /// Attribute cannot be read (0x0002)
    ReadNotPermitted,
    /// Attribute cannot be written (0x0003)
    WriteNotPermitted,
    /// Read offset past the end of the value (0x0007)
    InvalidOffset,
    /// Value too long for the attribute (0x000D)
    InvalidAttributeLength,
    /// Generic platform failure (0x0101)
    Failure,
    /// Any other code reported by the platform
    Other(u16),
}

impl GattStatus {
    pub fn code(self) -> u16 {
        match self {
            GattStatus::Success => 0x0000,
            GattStatus::InvalidHandle => 0x0001,
            GattStatus::ReadNotPermitted => 0x0002,
            GattStatus::WriteNotPermitted => 0x0003,
            GattStatus::InvalidOffset => 0x0007,
            GattStatus::InvalidAttributeLength => 0x000D,
            GattStatus::Failure => 0x0101,
            GattStatus::Other(code) => code,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            0x0000 => GattStatus::Success,
            0x0001 => GattStatus::InvalidHandle,
            0x0002 => GattStatus::ReadNotPermitted,
            0x0003 => GattStatus::WriteNotPermitted,
            0x0007 => GattStatus::InvalidOffset,
            0x000D => GattStatus::InvalidAttributeLength,
            0x0101 => GattStatus::Failure,
            other => GattStatus::Other(other),
        }
    }

    pub fn is_success(self) -> bool {
        self == GattStatus::Success
    }
}

/// Platform operation that can report a failure status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattOperation {
    RegisterService,
    Notify,
    SendResponse,
}

/// Errors returned to the caller of the server's control operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GattError {
    /// `register_service` was already called successfully
    AlreadyRegistered,
    /// The service has not been registered yet
    NotRegistered,
    /// The platform rejected the operation
    Operation(GattOperation, GattStatus),
}

impl fmt::Display for GattError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GattError::AlreadyRegistered => f.write_str("service already registered"),
            GattError::NotRegistered => f.write_str("service not registered"),
            GattError::Operation(op, status) => {
                write!(f, "{:?} failed with status 0x{:04X}", op, status.code())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GattStatus::from_code(0x0000), GattStatus::Success);
        assert_eq!(GattStatus::from_code(0x0007), GattStatus::InvalidOffset);
        assert_eq!(GattStatus::from_code(0x0085), GattStatus::Other(0x0085));
        assert_eq!(GattStatus::Other(0x0085).code(), 0x0085);
        assert_eq!(GattStatus::Failure.code(), 0x0101);
    }
}
