//! # Keyshim Module System
//!
//! The registration core shared by every per-model keyboard driver. It
//! provides:
//!
//! - A hardware gate deciding whether the module loads at all
//! - A single-slot driver registry binding one driver to the shared platform device
//! - The shared input device lifecycle, with an optional sparse keymap
//! - Event dispatch that drops unknown scancodes
//! - The shared colour table
//!
//! ## Module Lifecycle
//!
//! 1. Load: the hardware gate permits or denies ([`lifecycle::KeyboardModule::load`])
//! 2. Registration: a concrete driver binds itself ([`registry::DriverRegistry::register_driver`])
//! 3. Running: the driver reports events ([`events::report_known_event`])
//! 4. Removal: the driver, or the module exit path, tears the binding down
//! 5. Unload
//!
//! ## Registry States
//!
//! `Unbound` -> `Bound` (with or without input device) -> `Unbound`.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod colors;
pub mod config;
pub mod events;
pub mod gate;
pub mod input;
pub mod keymap;
pub mod lifecycle;
pub mod registry;

#[cfg(test)]
mod mock;

use alloc::string::String;
use bitflags::bitflags;
use core::fmt;
use keyshim_hal::HalError;

pub use colors::{Color, COLORS};
pub use config::ModuleConfig;
pub use events::report_known_event;
pub use gate::HardwareGate;
pub use input::{InputDevice, InputHandle, InputLifecycle};
pub use keymap::{KeyEntry, KeyKind, RawKeyEntry, SparseKeymap};
pub use lifecycle::KeyboardModule;
pub use registry::{DriverDescriptor, DriverRegistry, RegistryState};

/// Module version (semantic versioning)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModuleVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Patch version
    pub patch: u16,
}

impl ModuleVersion {
    /// Create a new version
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

bitflags! {
    /// Module flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModuleFlags: u32 {
        /// Module is a driver
        const DRIVER = 1 << 0;
        /// Module exports symbols to other modules
        const EXPORTS = 1 << 1;
    }
}

/// Static module metadata
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    /// Module name
    pub name: &'static str,
    /// Version
    pub version: ModuleVersion,
    /// Description
    pub description: &'static str,
    /// Author(s)
    pub author: &'static str,
    /// License
    pub license: &'static str,
    /// Module flags
    pub flags: ModuleFlags,
}

impl ModuleInfo {
    /// Create new module info with builder pattern
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            version: ModuleVersion::new(0, 1, 0),
            description: "",
            author: "Unknown",
            license: "GPL",
            flags: ModuleFlags::empty(),
        }
    }

    /// Set version
    pub const fn version(mut self, major: u16, minor: u16, patch: u16) -> Self {
        self.version = ModuleVersion::new(major, minor, patch);
        self
    }

    /// Set description
    pub const fn description(mut self, desc: &'static str) -> Self {
        self.description = desc;
        self
    }

    /// Set author
    pub const fn author(mut self, author: &'static str) -> Self {
        self.author = author;
        self
    }

    /// Set license
    pub const fn license(mut self, license: &'static str) -> Self {
        self.license = license;
        self
    }

    /// Set flags
    pub const fn flags(mut self, flags: ModuleFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Driver result type
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors surfaced by the registration core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Input device allocation failed
    OutOfMemory,
    /// The input subsystem refused the device
    Registration(HalError),
    /// Platform driver/device bundle could not be created
    BundleCreation(HalError),
    /// Keymap rejected during installation
    InvalidKeymap(String),
    /// Hardware gate denied loading on this machine
    NotApplicable,
    /// A module parameter could not be parsed
    InvalidConfig(String),
}

impl DriverError {
    /// Negative errno equivalent returned to the module loader
    pub fn errno(&self) -> i32 {
        match self {
            DriverError::OutOfMemory => HalError::OutOfMemory.errno(),
            DriverError::Registration(err) | DriverError::BundleCreation(err) => err.errno(),
            DriverError::InvalidKeymap(_) | DriverError::InvalidConfig(_) => {
                HalError::InvalidParameter.errno()
            }
            DriverError::NotApplicable => HalError::NoDevice.errno(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::OutOfMemory => f.write_str("error allocating input device"),
            DriverError::Registration(err) => write!(f, "error registering input device: {}", err),
            DriverError::BundleCreation(err) => write!(f, "platform bundle creation failed: {}", err),
            DriverError::InvalidKeymap(why) => write!(f, "failed to setup sparse keymap: {}", why),
            DriverError::NotApplicable => f.write_str("no such device"),
            DriverError::InvalidConfig(why) => write!(f, "invalid module parameter: {}", why),
        }
    }
}
