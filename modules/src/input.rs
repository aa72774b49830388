//! # Input Device Lifecycle
//!
//! Creates, configures and registers the single shared input device, and
//! withdraws it again. Only this component mutates the shared input slot;
//! the registry calls in here rather than touching it directly.

use crate::config::ModuleConfig;
use crate::keymap::{KeyEntry, SparseKeymap};
use crate::{DriverError, DriverResult};
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use keyshim_hal::input::{
    EventTypes, InputDeviceId, InputDeviceInfo, InputEvent, InputId, InputSubsystem,
};
use keyshim_hal::platform::PlatformDevice;
use spin::{Mutex, RwLock};

/// Shared handle to a registered input device
pub type InputHandle = Arc<InputDevice>;

/// A registered input device
pub struct InputDevice {
    id: InputDeviceId,
    info: InputDeviceInfo,
    keymap: RwLock<Option<SparseKeymap>>,
    subsystem: Arc<dyn InputSubsystem>,
}

impl InputDevice {
    /// Subsystem identifier
    pub fn id(&self) -> InputDeviceId {
        self.id
    }

    /// Identity as registered with the subsystem
    pub fn info(&self) -> &InputDeviceInfo {
        &self.info
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Physical path
    pub fn phys(&self) -> &str {
        &self.info.phys
    }

    /// Whether a sparse keymap is installed
    pub fn has_keymap(&self) -> bool {
        self.keymap.read().is_some()
    }

    /// Look up a scancode in the installed keymap
    pub fn entry_from_scancode(&self, scancode: u32) -> Option<KeyEntry> {
        self.keymap
            .read()
            .as_ref()
            .and_then(|map| map.entry_from_scancode(scancode).copied())
    }

    /// Remap a scancode to a new key code, returning the previous one
    pub fn set_keycode(&self, scancode: u32, keycode: u16) -> DriverResult<u16> {
        match self.keymap.write().as_mut() {
            Some(map) => map.set_keycode(scancode, keycode),
            None => Err(DriverError::InvalidKeymap(String::from("no keymap installed"))),
        }
    }

    /// Deliver one event packet
    pub fn emit(&self, events: &[InputEvent]) {
        self.subsystem.emit(self.id, events);
    }
}

impl fmt::Debug for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDevice")
            .field("id", &self.id)
            .field("name", &self.info.name)
            .field("phys", &self.info.phys)
            .field("has_keymap", &self.has_keymap())
            .finish()
    }
}

/// Owner of the shared input device slot
pub struct InputLifecycle {
    subsystem: Arc<dyn InputSubsystem>,
    name: String,
    phys: String,
    device: Mutex<Option<InputHandle>>,
}

impl InputLifecycle {
    /// Create an empty lifecycle bound to the host input subsystem
    pub fn new(subsystem: Arc<dyn InputSubsystem>, config: &ModuleConfig) -> Self {
        Self {
            subsystem,
            name: config.input_name.clone(),
            phys: config.input_phys(),
            device: Mutex::new(None),
        }
    }

    /// The shared input device, if one is registered
    pub fn device(&self) -> Option<InputHandle> {
        self.device.lock().clone()
    }

    /// Allocate, configure and register the shared input device
    ///
    /// Any failure after allocation releases the device before returning;
    /// the slot is only filled on success.
    pub fn create(
        &self,
        parent: &PlatformDevice,
        keymap: Option<&SparseKeymap>,
    ) -> DriverResult<InputHandle> {
        let mut slot = self.device.lock();
        if let Some(stale) = slot.take() {
            log::warn!("input: replacing stale device {:?}", stale.id());
            self.subsystem.unregister_device(stale.id());
        }

        let id = self.subsystem.allocate_device().map_err(|err| {
            log::error!("Error allocating input device: {}", err);
            DriverError::OutOfMemory
        })?;

        let mut info = InputDeviceInfo {
            name: self.name.clone(),
            phys: self.phys.clone(),
            id: InputId::host(),
            parent: Some(parent.id()),
            ev_bits: EventTypes::SYN,
            key_bits: alloc::vec::Vec::new(),
            sw_bits: alloc::vec::Vec::new(),
        };

        if let Some(map) = keymap {
            if let Err(err) = map.validate() {
                log::error!("Failed to setup sparse keymap: {}", err);
                self.subsystem.free_device(id);
                return Err(err);
            }
            info.ev_bits |= map.event_types();
            info.key_bits = map.key_codes();
            info.sw_bits = map.switch_codes();
        }

        if let Err(err) = self.subsystem.register_device(id, &info) {
            log::error!("Error registering input device: {}", err);
            self.subsystem.free_device(id);
            return Err(DriverError::Registration(err));
        }

        let device = Arc::new(InputDevice {
            id,
            info,
            keymap: RwLock::new(keymap.cloned()),
            subsystem: self.subsystem.clone(),
        });
        log::debug!("input: registered {:?} at {}", id, device.phys());

        *slot = Some(device.clone());
        Ok(device)
    }

    /// Withdraw the shared input device; no-op when absent
    pub fn destroy(&self) {
        if let Some(device) = self.device.lock().take() {
            self.subsystem.unregister_device(device.id());
            log::debug!("input: unregistered {:?}", device.id());
        }
    }
}

impl fmt::Debug for InputLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputLifecycle")
            .field("name", &self.name)
            .field("phys", &self.phys)
            .field("device", &*self.device.lock())
            .finish()
    }
}
