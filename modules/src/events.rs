//! # Event Dispatch
//!
//! Reports scancodes through the installed sparse keymap, dropping codes the
//! keymap does not know instead of generating spurious events.

use crate::input::InputDevice;
use crate::keymap::{KeyEntry, KeyKind};
use alloc::vec::Vec;
use keyshim_hal::input::InputEvent;

/// Report `code` if the device's keymap knows it
///
/// Returns `false` without side effects for unknown codes, so callers can
/// fall back to other handling.
pub fn report_known_event(device: &InputDevice, code: u32, value: u32, autorelease: bool) -> bool {
    let Some(entry) = device.entry_from_scancode(code) else {
        return false;
    };

    let packet = entry_packet(&entry, value, autorelease);
    if !packet.is_empty() {
        device.emit(&packet);
    }
    true
}

/// Events produced by reporting `entry` with `value`
///
/// With autorelease, a non-zero key value is followed by a synthesized release.
pub fn entry_packet(entry: &KeyEntry, value: u32, autorelease: bool) -> Vec<InputEvent> {
    // Event values are signed; saturate rather than wrap to a negative value
    let value = i32::try_from(value).unwrap_or(i32::MAX);
    let mut events = Vec::with_capacity(5);

    match entry.kind {
        KeyKind::Key(keycode) => {
            events.push(InputEvent::scan(entry.scancode));
            events.push(InputEvent::key(keycode, value));
            events.push(InputEvent::sync());
            if value != 0 && autorelease {
                events.push(InputEvent::key(keycode, 0));
                events.push(InputEvent::sync());
            }
        }
        KeyKind::Switch { code, value: fixed } => {
            events.push(InputEvent::switch(code, i32::from(fixed)));
            events.push(InputEvent::sync());
        }
        KeyKind::VariableSwitch(code) => {
            events.push(InputEvent::switch(code, value));
            events.push(InputEvent::sync());
        }
        KeyKind::Ignore => {}
    }

    events
}
