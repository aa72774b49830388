//! # Keyshim HAL - Host Abstraction Layer
//!
//! This crate defines the traits through which the keyboard shim talks to
//! its host environment. The shim never touches hardware or bus internals
//! itself; everything it needs is reached through these traits.
//!
//! ## Design Philosophy
//!
//! The HAL is designed to be:
//! - **Opaque**: Platform and input devices are handles with acquire/release operations
//! - **Minimal**: Only exposes what the registration core needs
//! - **Safe**: No unsafe code, every fallible call returns [`HalResult`]
//! - **Testable**: Every trait can be implemented by a recording test double
//!
//! ## Surfaces
//!
//! - [`cpu`]: CPU vendor/family/model identity and match tables
//! - [`firmware`]: DMI identity strings and DMI match tables
//! - [`platform`]: Platform bus and platform driver capability
//! - [`input`]: Input subsystem, event vocabulary and device identity

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod cpu;
pub mod firmware;
pub mod input;
pub mod platform;

#[cfg(feature = "std")]
pub mod host;

use alloc::string::String;
use core::fmt;

pub use cpu::{CpuIdentity, CpuMatch, CpuVendor};
pub use firmware::{DmiField, DmiMatch, DmiSystemId};

/// Result type for HAL operations
pub type HalResult<T> = Result<T, HalError>;

/// Errors that can be reported by a host implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The operation is not supported by this host
    NotSupported,
    /// Invalid parameter provided
    InvalidParameter,
    /// No device matched or the probe rejected the device
    NoDevice,
    /// Resource is not available
    ResourceBusy,
    /// Memory allocation failed
    OutOfMemory,
    /// The bus refused the registration
    RegistrationFailed,
    /// Device or driver is not registered
    NotRegistered,
    /// Hardware reported an error
    HardwareError,
}

impl HalError {
    /// Negative errno equivalent, for hosts that speak the kernel convention
    pub const fn errno(self) -> i32 {
        match self {
            HalError::NotSupported => -95,       // EOPNOTSUPP
            HalError::InvalidParameter => -22,   // EINVAL
            HalError::NoDevice => -19,           // ENODEV
            HalError::ResourceBusy => -16,       // EBUSY
            HalError::OutOfMemory => -12,        // ENOMEM
            HalError::RegistrationFailed => -5,  // EIO
            HalError::NotRegistered => -2,       // ENOENT
            HalError::HardwareError => -5,       // EIO
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            HalError::NotSupported => "operation not supported",
            HalError::InvalidParameter => "invalid parameter",
            HalError::NoDevice => "no such device",
            HalError::ResourceBusy => "resource busy",
            HalError::OutOfMemory => "out of memory",
            HalError::RegistrationFailed => "registration failed",
            HalError::NotRegistered => "not registered",
            HalError::HardwareError => "hardware error",
        };
        f.write_str(msg)
    }
}

/// Read-only view of the identity of the machine the shim is loaded on
///
/// Queried once at module load by the hardware gate.
pub trait MachineIdentity: Send + Sync {
    /// Get a DMI identity string, if the firmware provides it
    fn dmi_string(&self, field: DmiField) -> Option<&str>;

    /// Get the identity of the boot CPU
    fn cpu(&self) -> CpuIdentity;
}

/// Fixed machine identity
///
/// Used by hosts that learn the identity once at boot, and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticMachine {
    dmi: alloc::collections::BTreeMap<DmiField, String>,
    cpu: CpuIdentity,
}

impl StaticMachine {
    /// Create an identity with no DMI strings and an unknown CPU
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a DMI string
    pub fn with_dmi(mut self, field: DmiField, value: &str) -> Self {
        self.dmi.insert(field, String::from(value));
        self
    }

    /// Set the CPU identity
    pub fn with_cpu(mut self, cpu: CpuIdentity) -> Self {
        self.cpu = cpu;
        self
    }
}

impl MachineIdentity for StaticMachine {
    fn dmi_string(&self, field: DmiField) -> Option<&str> {
        self.dmi.get(&field).map(String::as_str)
    }

    fn cpu(&self) -> CpuIdentity {
        self.cpu
    }
}
