//! # Driver Registry
//!
//! Binds exactly one driver implementation to the shared platform device.
//!
//! Registration runs entirely under the registry lock, so two concurrent
//! attempts can never both see an empty slot and both create a bundle.
//! Removal takes the same lock; see [`DriverRegistry::remove_driver`].

use crate::config::ModuleConfig;
use crate::input::{InputHandle, InputLifecycle};
use crate::keymap::SparseKeymap;
use crate::{DriverError, DriverResult};
use alloc::sync::Arc;
use core::fmt;
use keyshim_hal::input::InputSubsystem;
use keyshim_hal::platform::{PlatformBus, PlatformDevice, PlatformDriver};
use spin::{Mutex, RwLock};

/// A driver implementation offered for binding
///
/// Supplied by a concrete per-model driver. The registry only writes the
/// input device output field.
pub struct DriverDescriptor {
    driver: Arc<dyn PlatformDriver>,
    key_map: Option<SparseKeymap>,
    input_device: RwLock<Option<InputHandle>>,
}

impl DriverDescriptor {
    /// Describe a driver without key events
    pub fn new(driver: Arc<dyn PlatformDriver>) -> Self {
        Self {
            driver,
            key_map: None,
            input_device: RwLock::new(None),
        }
    }

    /// Attach the keymap for the shared input device
    pub fn with_key_map(mut self, key_map: SparseKeymap) -> Self {
        self.key_map = Some(key_map);
        self
    }

    /// Platform driver name
    pub fn name(&self) -> &str {
        self.driver.name()
    }

    /// Platform driver
    pub fn driver(&self) -> &Arc<dyn PlatformDriver> {
        &self.driver
    }

    /// Keymap, if the driver reports key events
    pub fn key_map(&self) -> Option<&SparseKeymap> {
        self.key_map.as_ref()
    }

    /// Input device created for this driver, if any
    pub fn input_device(&self) -> Option<InputHandle> {
        self.input_device.read().clone()
    }

    fn set_input_device(&self, device: Option<InputHandle>) {
        *self.input_device.write() = device;
    }
}

impl fmt::Debug for DriverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverDescriptor")
            .field("name", &self.name())
            .field("key_map", &self.key_map.as_ref().map(SparseKeymap::len))
            .field("input_device", &*self.input_device.read())
            .finish()
    }
}

/// Observable registry state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// No driver bound
    Unbound,
    /// Driver bound, shared input device present
    BoundWithInput,
    /// Driver bound without input device
    BoundNoInput,
}

#[derive(Default)]
struct Binding {
    device: Option<PlatformDevice>,
    active: Option<Arc<DriverDescriptor>>,
}

/// Single-slot driver registry
pub struct DriverRegistry {
    platform: Arc<dyn PlatformBus>,
    input: InputLifecycle,
    binding: Mutex<Binding>,
}

impl DriverRegistry {
    /// Create an unbound registry
    pub fn new(
        platform: Arc<dyn PlatformBus>,
        input: Arc<dyn InputSubsystem>,
        config: &ModuleConfig,
    ) -> Self {
        Self {
            platform,
            input: InputLifecycle::new(input, config),
            binding: Mutex::new(Binding::default()),
        }
    }

    /// Bind `descriptor` to the shared platform device
    ///
    /// If a driver is already bound this returns the existing device and
    /// does nothing else; `descriptor` is not probed. A failed bundle
    /// creation leaves the registry untouched. A failed input device is
    /// logged and absorbed: the driver is bound without key events.
    ///
    /// The registry lock is a spin lock held across the driver's `probe`.
    /// A probe must not call back into the registry, and should not block.
    pub fn register_driver(&self, descriptor: &Arc<DriverDescriptor>) -> DriverResult<PlatformDevice> {
        log::debug!("init driver start: {}", descriptor.name());

        let mut binding = self.binding.lock();

        if binding.active.is_some() {
            if let Some(device) = &binding.device {
                log::debug!("platform device already initialized");
                return Ok(device.clone());
            }
        }

        log::debug!("create platform bundle");
        let device = self
            .platform
            .create_bundle(descriptor.driver.clone())
            .map_err(|err| {
                log::error!("platform bundle for {} failed: {}", descriptor.name(), err);
                DriverError::BundleCreation(err)
            })?;

        if let Some(key_map) = descriptor.key_map() {
            log::debug!("initialize input device");
            match self.input.create(&device, Some(key_map)) {
                Ok(input) => {
                    log::debug!("input device registered");
                    descriptor.set_input_device(Some(input));
                }
                Err(err) => {
                    log::error!("Could not register input device: {}", err);
                    descriptor.set_input_device(None);
                }
            }
        }

        binding.device = Some(device.clone());
        binding.active = Some(descriptor.clone());
        log::info!("driver {} bound to {}", descriptor.name(), device);

        Ok(device)
    }

    /// Tear down the binding
    ///
    /// With `Some(descriptor)` only the descriptor's own binding is removed;
    /// a descriptor naming a different platform driver is silently ignored.
    /// `None` removes whoever is bound.
    ///
    /// Teardown is best effort and ordered: input device, platform device,
    /// platform driver. Each step runs only if its target is present.
    pub fn remove_driver(&self, descriptor: Option<&DriverDescriptor>) {
        let mut binding = self.binding.lock();

        if let Some(requested) = descriptor {
            let is_active = binding
                .active
                .as_ref()
                .is_some_and(|active| active.name() == requested.name());
            if !is_active {
                log::debug!("remove_driver: {} is not the active driver", requested.name());
                return;
            }
        }

        log::debug!("input device teardown");
        self.input.destroy();

        log::debug!("platform device unregister");
        if let Some(device) = binding.device.take() {
            self.platform.unregister_device(&device);
        }

        log::debug!("platform driver unregister");
        if let Some(active) = binding.active.take() {
            self.platform.unregister_driver(active.driver.as_ref());
            active.set_input_device(None);
            log::info!("driver {} removed", active.name());
        }
    }

    /// Whether a platform device is bound
    pub fn is_bound(&self) -> bool {
        self.binding.lock().device.is_some()
    }

    /// The shared platform device
    pub fn platform_device(&self) -> Option<PlatformDevice> {
        self.binding.lock().device.clone()
    }

    /// Name of the bound platform driver
    pub fn active_driver_name(&self) -> Option<alloc::string::String> {
        self.binding
            .lock()
            .active
            .as_ref()
            .map(|active| alloc::string::String::from(active.name()))
    }

    /// The shared input device
    pub fn input_device(&self) -> Option<InputHandle> {
        self.input.device()
    }

    /// Current state
    pub fn state(&self) -> RegistryState {
        let binding = self.binding.lock();
        match (&binding.active, self.input.device()) {
            (None, _) => RegistryState::Unbound,
            (Some(_), Some(_)) => RegistryState::BoundWithInput,
            (Some(_), None) => RegistryState::BoundNoInput,
        }
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = self.binding.lock();
        f.debug_struct("DriverRegistry")
            .field("device", &binding.device)
            .field("active", &binding.active.as_ref().map(|a| a.name()))
            .field("input", &self.input)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::KeyEntry;
    use crate::mock::{Call, Harness, MockPlatformDriver};
    use keyshim_hal::input::keys::*;
    use keyshim_hal::HalError;

    fn keymap() -> SparseKeymap {
        SparseKeymap::new([KeyEntry::key(0x81, KEY_KBDILLUMTOGGLE)])
    }

    #[test]
    fn test_register_binds_slot() {
        let h = Harness::new();
        let x = MockPlatformDriver::new("clevo_keyboard");
        let desc = Arc::new(DriverDescriptor::new(x.clone()).with_key_map(keymap()));

        let device = h.registry.register_driver(&desc).expect("register");

        assert_eq!(x.probes(), 1);
        assert_eq!(h.registry.platform_device(), Some(device));
        assert_eq!(h.registry.active_driver_name().as_deref(), Some("clevo_keyboard"));
        assert_eq!(h.registry.state(), RegistryState::BoundWithInput);
    }

    #[test]
    fn test_second_registration_returns_existing_device() {
        let h = Harness::new();
        let x = MockPlatformDriver::new("clevo_keyboard");
        let y = MockPlatformDriver::new("uniwill_keyboard");
        let dx = Arc::new(DriverDescriptor::new(x.clone()));
        let dy = Arc::new(DriverDescriptor::new(y.clone()).with_key_map(keymap()));

        let first = h.registry.register_driver(&dx).expect("register x");
        let second = h.registry.register_driver(&dy).expect("register y");

        assert_eq!(first, second);
        assert_eq!(y.probes(), 0);
        assert!(dy.input_device().is_none());
        assert_eq!(h.bus.bundles_created(), 1);
        assert_eq!(h.registry.active_driver_name().as_deref(), Some("clevo_keyboard"));
    }

    #[test]
    fn test_bundle_failure_leaves_state_untouched() {
        let h = Harness::new();
        let x = MockPlatformDriver::failing("clevo_keyboard", HalError::NoDevice);
        let desc = Arc::new(DriverDescriptor::new(x.clone()).with_key_map(keymap()));

        let err = h.registry.register_driver(&desc).unwrap_err();

        assert_eq!(err, DriverError::BundleCreation(HalError::NoDevice));
        assert_eq!(h.registry.state(), RegistryState::Unbound);
        assert!(h.registry.platform_device().is_none());
        assert!(desc.input_device().is_none());
        assert!(h.input.registered().is_empty());
    }

    #[test]
    fn test_registration_possible_after_bundle_failure() {
        let h = Harness::new();
        let bad = Arc::new(DriverDescriptor::new(MockPlatformDriver::failing(
            "clevo_keyboard",
            HalError::NoDevice,
        )));
        let good = Arc::new(DriverDescriptor::new(MockPlatformDriver::new("uniwill_keyboard")));

        assert!(h.registry.register_driver(&bad).is_err());
        assert!(h.registry.register_driver(&good).is_ok());
        assert_eq!(h.registry.active_driver_name().as_deref(), Some("uniwill_keyboard"));
    }

    #[test]
    fn test_remove_mismatch_is_noop() {
        let h = Harness::new();
        let dx = Arc::new(DriverDescriptor::new(MockPlatformDriver::new("clevo_keyboard")).with_key_map(keymap()));
        let dy = DriverDescriptor::new(MockPlatformDriver::new("uniwill_keyboard"));

        let device = h.registry.register_driver(&dx).expect("register");
        let input = h.registry.input_device();
        h.journal.clear();

        h.registry.remove_driver(Some(&dy));

        assert!(h.journal.calls().is_empty());
        assert_eq!(h.registry.platform_device(), Some(device));
        assert_eq!(h.registry.state(), RegistryState::BoundWithInput);
        assert_eq!(h.registry.input_device().map(|d| d.id()), input.map(|d| d.id()));
    }

    #[test]
    fn test_remove_with_nothing_bound_is_noop() {
        let h = Harness::new();
        let dx = DriverDescriptor::new(MockPlatformDriver::new("clevo_keyboard"));

        h.registry.remove_driver(Some(&dx));
        h.registry.remove_driver(None);

        assert!(h.journal.calls().is_empty());
        assert_eq!(h.registry.state(), RegistryState::Unbound);
    }

    #[test]
    fn test_remove_self_tears_down_in_order() {
        let h = Harness::new();
        let x = MockPlatformDriver::new("clevo_keyboard");
        let dx = Arc::new(DriverDescriptor::new(x.clone()).with_key_map(keymap()));

        let device = h.registry.register_driver(&dx).expect("register");
        let input = dx.input_device().expect("input device");
        h.journal.clear();

        h.registry.remove_driver(Some(&dx));

        assert_eq!(
            h.journal.calls(),
            [
                Call::UnregisterInput(input.id()),
                Call::UnregisterDevice(device.id()),
                Call::UnregisterDriver(alloc::string::String::from("clevo_keyboard")),
            ]
        );
        assert_eq!(x.removes(), 1);
        assert_eq!(h.registry.state(), RegistryState::Unbound);
        assert!(dx.input_device().is_none());
    }

    #[test]
    fn test_remove_matches_by_driver_name() {
        let h = Harness::new();
        let x = MockPlatformDriver::new("clevo_keyboard");
        let dx = Arc::new(DriverDescriptor::new(x.clone()).with_key_map(keymap()));

        let device = h.registry.register_driver(&dx).expect("register");
        let input = dx.input_device().expect("input device");
        h.journal.clear();

        // A distinct descriptor naming the same platform driver owns the binding
        let other = DriverDescriptor::new(MockPlatformDriver::new("clevo_keyboard"));
        h.registry.remove_driver(Some(&other));

        assert_eq!(
            h.journal.calls(),
            [
                Call::UnregisterInput(input.id()),
                Call::UnregisterDevice(device.id()),
                Call::UnregisterDriver(alloc::string::String::from("clevo_keyboard")),
            ]
        );
        assert_eq!(x.removes(), 1);
        assert_eq!(h.registry.state(), RegistryState::Unbound);
        assert!(dx.input_device().is_none());
    }

    #[test]
    fn test_rebind_after_removal() {
        let h = Harness::new();
        let dx = Arc::new(DriverDescriptor::new(MockPlatformDriver::new("clevo_keyboard")));
        let dy = Arc::new(DriverDescriptor::new(MockPlatformDriver::new("uniwill_keyboard")));

        let first = h.registry.register_driver(&dx).expect("register x");
        h.registry.remove_driver(None);
        let second = h.registry.register_driver(&dy).expect("register y");

        assert_ne!(first.id(), second.id());
        assert_eq!(h.registry.active_driver_name().as_deref(), Some("uniwill_keyboard"));
    }
}
