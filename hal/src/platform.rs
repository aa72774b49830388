//! # Platform Bus
//!
//! Platform drivers and the platform bus that binds them to devices.
//! Devices are opaque handles owned by the bus.

use crate::HalResult;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

/// Bus-assigned identifier of a platform device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformDeviceId(u64);

impl PlatformDeviceId {
    /// Create from raw value
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw ID value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Handle to a platform device created by the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDevice {
    id: PlatformDeviceId,
    name: String,
}

impl PlatformDevice {
    /// Create a handle; called by bus implementations
    pub fn new(id: PlatformDeviceId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }

    /// Device identifier
    pub fn id(&self) -> PlatformDeviceId {
        self.id
    }

    /// Device name (the name of the driver it was created for)
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PlatformDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.id.0)
    }
}

/// A platform driver implementation
///
/// Implemented by each concrete per-model keyboard driver.
pub trait PlatformDriver: Send + Sync {
    /// Driver name; also the name of the device created for it
    fn name(&self) -> &str;

    /// Bind to a freshly created device
    ///
    /// An error rejects the device and fails bundle creation.
    fn probe(&self, device: &PlatformDevice) -> HalResult<()>;

    /// Device is going away; release per-device state
    fn remove(&self, _device: &PlatformDevice) {}
}

/// The platform bus of the host
pub trait PlatformBus: Send + Sync {
    /// Register `driver`, create a device for it and probe it, in one step
    ///
    /// On any failure nothing stays registered.
    fn create_bundle(&self, driver: Arc<dyn PlatformDriver>) -> HalResult<PlatformDevice>;

    /// Unregister a device created by [`PlatformBus::create_bundle`]
    fn unregister_device(&self, device: &PlatformDevice);

    /// Unregister a driver registered by [`PlatformBus::create_bundle`]
    fn unregister_driver(&self, driver: &dyn PlatformDriver);
}
