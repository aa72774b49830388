//! # Module Lifecycle
//!
//! Ties the hardware gate and the registry to module load and unload.
//! Loading creates no device; devices appear only when a concrete driver
//! registers. Unloading removes whatever driver is still bound.

use crate::config::ModuleConfig;
use crate::gate::HardwareGate;
use crate::registry::DriverRegistry;
use crate::{DriverError, DriverResult, ModuleFlags, ModuleInfo};
use alloc::sync::Arc;
use keyshim_hal::input::InputSubsystem;
use keyshim_hal::platform::PlatformBus;
use keyshim_hal::MachineIdentity;

/// Module metadata
pub const MODULE_INFO: ModuleInfo = ModuleInfo::new("tuxedo_keyboard")
    .version(3, 2, 10)
    .description("TUXEDO Computers keyboard & keyboard backlight Driver")
    .author("TUXEDO Computers GmbH <tux@tuxedocomputers.com>")
    .license("GPL")
    .flags(ModuleFlags::DRIVER.union(ModuleFlags::EXPORTS));

/// A loaded shim module
///
/// Owns the registry for its whole lifetime. Dropping the module runs the
/// exit path.
#[derive(Debug)]
pub struct KeyboardModule {
    registry: DriverRegistry,
}

impl KeyboardModule {
    /// Module entry point, with the built-in gate
    pub fn load(
        machine: &dyn MachineIdentity,
        platform: Arc<dyn PlatformBus>,
        input: Arc<dyn InputSubsystem>,
        config: ModuleConfig,
    ) -> DriverResult<Self> {
        Self::load_with_gate(&HardwareGate::new(), machine, platform, input, config)
    }

    /// Module entry point
    ///
    /// Fails with [`DriverError::NotApplicable`] when the gate denies,
    /// without creating any resource.
    pub fn load_with_gate(
        gate: &HardwareGate,
        machine: &dyn MachineIdentity,
        platform: Arc<dyn PlatformBus>,
        input: Arc<dyn InputSubsystem>,
        config: ModuleConfig,
    ) -> DriverResult<Self> {
        log::info!("module init");

        if !gate.should_activate(machine) {
            log::warn!("{}: unsupported machine, not loading", MODULE_INFO.name);
            return Err(DriverError::NotApplicable);
        }

        Ok(Self {
            registry: DriverRegistry::new(platform, input, &config),
        })
    }

    /// Registration API exported to the per-model drivers
    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Module exit hook
    pub fn unload(self) {
        drop(self);
    }
}

impl Drop for KeyboardModule {
    fn drop(&mut self) {
        log::info!("module exit");

        if self.registry.is_bound() {
            self.registry.remove_driver(None);
        }
    }
}
