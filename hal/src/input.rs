//! # Input Subsystem
//!
//! Event vocabulary (evdev compatible), device identity and the input
//! subsystem trait through which input devices are allocated, registered
//! and fed with events.

use crate::platform::PlatformDeviceId;
use crate::HalResult;
use alloc::string::String;
use alloc::vec::Vec;
use bitflags::bitflags;
use static_assertions::{assert_eq_size, const_assert};

/// Synchronization marker
pub const EV_SYN: u16 = 0x00;
/// Key or button state change
pub const EV_KEY: u16 = 0x01;
/// Miscellaneous data
pub const EV_MSC: u16 = 0x04;
/// Binary switch state change
pub const EV_SW: u16 = 0x05;

/// End of an event packet
pub const SYN_REPORT: u16 = 0x00;
/// Raw scancode accompanying a key event
pub const MSC_SCAN: u16 = 0x04;

/// Highest valid key code
pub const KEY_MAX: u16 = 0x2FF;
/// Highest valid switch code
pub const SW_MAX: u16 = 0x10;

const_assert!(SW_MAX < KEY_MAX);

/// Key codes used by keyboard drivers
pub mod keys {
    #![allow(missing_docs)]

    pub const KEY_RESERVED: u16 = 0;
    pub const KEY_MUTE: u16 = 113;
    pub const KEY_VOLUMEDOWN: u16 = 114;
    pub const KEY_VOLUMEUP: u16 = 115;
    pub const KEY_PROG1: u16 = 148;
    pub const KEY_PROG2: u16 = 149;
    pub const KEY_F13: u16 = 183;
    pub const KEY_F14: u16 = 184;
    pub const KEY_F15: u16 = 185;
    pub const KEY_BRIGHTNESSDOWN: u16 = 224;
    pub const KEY_BRIGHTNESSUP: u16 = 225;
    pub const KEY_KBDILLUMTOGGLE: u16 = 228;
    pub const KEY_KBDILLUMDOWN: u16 = 229;
    pub const KEY_KBDILLUMUP: u16 = 230;
    pub const KEY_RFKILL: u16 = 247;
    pub const KEY_TOUCHPAD_TOGGLE: u16 = 0x212;
    pub const KEY_LIGHTS_TOGGLE: u16 = 0x21E;

    pub const SW_TABLET_MODE: u16 = 0x01;
}

bitflags! {
    /// Event types a device can generate (bit N is event type N)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventTypes: u32 {
        /// EV_SYN
        const SYN = 1 << EV_SYN;
        /// EV_KEY
        const KEY = 1 << EV_KEY;
        /// EV_MSC
        const MSC = 1 << EV_MSC;
        /// EV_SW
        const SW = 1 << EV_SW;
    }
}

/// Bus type reported in the device identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BusType {
    /// USB
    Usb = 0x03,
    /// i8042 keyboard controller
    I8042 = 0x11,
    /// Host (virtual, no physical bus)
    Host = 0x19,
}

/// Device identity (vendor, product, version)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputId {
    /// Bus the device sits on
    pub bustype: BusType,
    /// Vendor code
    pub vendor: u16,
    /// Product code
    pub product: u16,
    /// Version
    pub version: u16,
}

impl InputId {
    /// Identity of a host bus device with no vendor data
    pub const fn host() -> Self {
        Self { bustype: BusType::Host, vendor: 0, product: 0, version: 0 }
    }
}

/// A single input event
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    /// Event type (EV_*)
    pub event_type: u16,
    /// Event code
    pub code: u16,
    /// Event value
    pub value: i32,
}

assert_eq_size!(InputEvent, [u8; 8]);

impl InputEvent {
    /// Key event
    pub const fn key(code: u16, value: i32) -> Self {
        Self { event_type: EV_KEY, code, value }
    }

    /// Switch event
    pub const fn switch(code: u16, value: i32) -> Self {
        Self { event_type: EV_SW, code, value }
    }

    /// Scancode event
    pub const fn scan(scancode: u32) -> Self {
        Self { event_type: EV_MSC, code: MSC_SCAN, value: scancode as i32 }
    }

    /// End-of-packet marker
    pub const fn sync() -> Self {
        Self { event_type: EV_SYN, code: SYN_REPORT, value: 0 }
    }
}

/// Subsystem-assigned identifier of an input device
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InputDeviceId(u64);

impl InputDeviceId {
    /// Create from raw value
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw ID value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Everything the subsystem needs to expose a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    /// Display name
    pub name: String,
    /// Physical path
    pub phys: String,
    /// Identity
    pub id: InputId,
    /// Parent platform device
    pub parent: Option<PlatformDeviceId>,
    /// Event types generated
    pub ev_bits: EventTypes,
    /// Key codes generated
    pub key_bits: Vec<u16>,
    /// Switch codes generated
    pub sw_bits: Vec<u16>,
}

/// The input subsystem of the host
///
/// A device is allocated, then registered. A registered device is released
/// by [`InputSubsystem::unregister_device`] alone; a device that was never
/// registered is released with [`InputSubsystem::free_device`].
pub trait InputSubsystem: Send + Sync {
    /// Allocate a new, unregistered device
    fn allocate_device(&self) -> HalResult<InputDeviceId>;

    /// Expose an allocated device to consumers
    fn register_device(&self, id: InputDeviceId, info: &InputDeviceInfo) -> HalResult<()>;

    /// Withdraw and release a registered device
    fn unregister_device(&self, id: InputDeviceId);

    /// Release a device that was never registered
    fn free_device(&self, id: InputDeviceId);

    /// Deliver one event packet (terminated by a sync event)
    fn emit(&self, id: InputDeviceId, events: &[InputEvent]);
}
