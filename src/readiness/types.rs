//! Readiness stages, failures and the readiness token

use core::fmt;

/// Stage of the readiness chain, in check order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessStage {
    Adapter,
    Enabled,
    Advertising,
    Permission,
}

impl fmt::Display for ReadinessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadinessStage::Adapter => "adapter",
            ReadinessStage::Enabled => "enabled",
            ReadinessStage::Advertising => "advertising",
            ReadinessStage::Permission => "permission",
        };
        f.write_str(name)
    }
}

/// Why the radio cannot be used. Fatal to advertising for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioUnavailable {
    AdapterMissing,
    AdapterDisabled,
    AdvertisingUnsupported,
    PermissionDenied,
}

impl RadioUnavailable {
    /// Stage that failed
    pub fn stage(self) -> ReadinessStage {
        match self {
            RadioUnavailable::AdapterMissing => ReadinessStage::Adapter,
            RadioUnavailable::AdapterDisabled => ReadinessStage::Enabled,
            RadioUnavailable::AdvertisingUnsupported => ReadinessStage::Advertising,
            RadioUnavailable::PermissionDenied => ReadinessStage::Permission,
        }
    }

    /// Text suitable for showing to the user
    pub fn reason(self) -> &'static str {
        match self {
            RadioUnavailable::AdapterMissing => "Bluetooth is not available on this device",
            RadioUnavailable::AdapterDisabled => "Bluetooth could not be turned on",
            RadioUnavailable::AdvertisingUnsupported => {
                "Bluetooth advertising is not supported on this device"
            }
            RadioUnavailable::PermissionDenied => "Bluetooth permission was denied",
        }
    }
}

impl fmt::Display for RadioUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Proof that every readiness stage passed.
///
/// Only [`ReadinessGate`](crate::readiness::ReadinessGate) creates one.
#[derive(Debug)]
pub struct RadioReady {
    _private: (),
}

impl RadioReady {
    pub(in crate::readiness) fn granted() -> Self {
        Self { _private: () }
    }

    #[cfg(test)]
    pub(crate) fn assume_ready() -> Self {
        Self::granted()
    }
}
