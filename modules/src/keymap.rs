//! # Sparse Keymap
//!
//! Maps device-specific scancodes to key and switch codes. Drivers describe
//! their keymap as an ordered [`SparseKeymap`]; the sentinel-terminated
//! [`RawKeyEntry`] form exists only for exchange with tables written in the
//! host's native layout.

use crate::{DriverError, DriverResult};
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::vec::Vec;
use keyshim_hal::input::{EventTypes, KEY_MAX, SW_MAX};

/// What a scancode translates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Key with the given key code
    Key(u16),
    /// Switch reporting a fixed value
    Switch {
        /// Switch code
        code: u16,
        /// Value reported whenever the scancode arrives
        value: bool,
    },
    /// Switch reporting the value given at report time
    VariableSwitch(u16),
    /// Known scancode that produces no event
    Ignore,
}

/// One keymap entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEntry {
    /// Device scancode
    pub scancode: u32,
    /// Translation
    pub kind: KeyKind,
}

impl KeyEntry {
    /// Key entry
    pub const fn key(scancode: u32, keycode: u16) -> Self {
        Self { scancode, kind: KeyKind::Key(keycode) }
    }

    /// Fixed-value switch entry
    pub const fn switch(scancode: u32, code: u16, value: bool) -> Self {
        Self { scancode, kind: KeyKind::Switch { code, value } }
    }

    /// Ignored scancode
    pub const fn ignore(scancode: u32) -> Self {
        Self { scancode, kind: KeyKind::Ignore }
    }
}

/// End of table
pub const KE_END: u8 = 0;
/// Key entry
pub const KE_KEY: u8 = 1;
/// Fixed-value switch entry
pub const KE_SW: u8 = 2;
/// Variable switch entry
pub const KE_VSW: u8 = 3;
/// Ignored entry
pub const KE_IGNORE: u8 = 4;

/// Host-native keymap row
///
/// Tables of these are terminated by a row of type [`KE_END`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEntry {
    /// Entry type (KE_*)
    pub kind: u8,
    /// Scancode
    pub code: u32,
    /// Key or switch code
    pub keycode: u16,
    /// Switch value for KE_SW
    pub value: u8,
}

impl RawKeyEntry {
    /// Table terminator
    pub const END: Self = Self { kind: KE_END, code: 0, keycode: 0, value: 0 };

    /// KE_KEY row
    pub const fn key(code: u32, keycode: u16) -> Self {
        Self { kind: KE_KEY, code, keycode, value: 0 }
    }
}

/// Ordered scancode translation table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SparseKeymap {
    entries: Vec<KeyEntry>,
}

impl SparseKeymap {
    /// Create a keymap from entries, in lookup order
    pub fn new(entries: impl Into<Vec<KeyEntry>>) -> Self {
        Self { entries: entries.into() }
    }

    /// Build from a sentinel-terminated table
    ///
    /// Reading stops at the first [`KE_END`] row, or at the end of the slice.
    pub fn from_raw(table: &[RawKeyEntry]) -> DriverResult<Self> {
        let mut entries = Vec::new();
        for raw in table {
            let kind = match raw.kind {
                KE_END => break,
                KE_KEY => KeyKind::Key(raw.keycode),
                KE_SW => KeyKind::Switch { code: raw.keycode, value: raw.value != 0 },
                KE_VSW => KeyKind::VariableSwitch(raw.keycode),
                KE_IGNORE => KeyKind::Ignore,
                other => {
                    return Err(DriverError::InvalidKeymap(format!(
                        "unknown entry type {} for scancode {:#x}",
                        other, raw.code
                    )))
                }
            };
            entries.push(KeyEntry { scancode: raw.code, kind });
        }
        Ok(Self { entries })
    }

    /// Convert to a sentinel-terminated table
    pub fn to_raw(&self) -> Vec<RawKeyEntry> {
        let mut table: Vec<RawKeyEntry> = self
            .entries
            .iter()
            .map(|e| match e.kind {
                KeyKind::Key(keycode) => RawKeyEntry::key(e.scancode, keycode),
                KeyKind::Switch { code, value } => RawKeyEntry {
                    kind: KE_SW,
                    code: e.scancode,
                    keycode: code,
                    value: u8::from(value),
                },
                KeyKind::VariableSwitch(code) => RawKeyEntry {
                    kind: KE_VSW,
                    code: e.scancode,
                    keycode: code,
                    value: 0,
                },
                KeyKind::Ignore => RawKeyEntry { kind: KE_IGNORE, code: e.scancode, keycode: 0, value: 0 },
            })
            .collect();
        table.push(RawKeyEntry::END);
        table
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in lookup order
    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// Check the map can be installed on a device
    ///
    /// Rejects duplicate scancodes and codes outside the valid ranges.
    pub fn validate(&self) -> DriverResult<()> {
        let mut seen = BTreeSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.scancode) {
                return Err(DriverError::InvalidKeymap(format!(
                    "duplicate scancode {:#x}",
                    entry.scancode
                )));
            }
            match entry.kind {
                KeyKind::Key(code) if code > KEY_MAX => {
                    return Err(DriverError::InvalidKeymap(format!(
                        "key code {:#x} out of range",
                        code
                    )))
                }
                KeyKind::Switch { code, .. } | KeyKind::VariableSwitch(code) if code > SW_MAX => {
                    return Err(DriverError::InvalidKeymap(format!(
                        "switch code {:#x} out of range",
                        code
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Look up a scancode
    pub fn entry_from_scancode(&self, scancode: u32) -> Option<&KeyEntry> {
        self.entries.iter().find(|e| e.scancode == scancode)
    }

    /// Look up the first key entry producing `keycode`
    pub fn entry_from_keycode(&self, keycode: u16) -> Option<&KeyEntry> {
        self.entries
            .iter()
            .find(|e| matches!(e.kind, KeyKind::Key(code) if code == keycode))
    }

    /// Remap the key entry for `scancode`, returning the previous key code
    pub fn set_keycode(&mut self, scancode: u32, keycode: u16) -> DriverResult<u16> {
        if keycode > KEY_MAX {
            return Err(DriverError::InvalidKeymap(format!("key code {:#x} out of range", keycode)));
        }
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.scancode == scancode)
            .ok_or_else(|| DriverError::InvalidKeymap(format!("no entry for scancode {:#x}", scancode)))?;
        match entry.kind {
            KeyKind::Key(old) => {
                entry.kind = KeyKind::Key(keycode);
                Ok(old)
            }
            _ => Err(DriverError::InvalidKeymap(format!("scancode {:#x} is not a key", scancode))),
        }
    }

    /// Event types a device with this map generates
    pub fn event_types(&self) -> EventTypes {
        let mut types = EventTypes::SYN;
        for entry in &self.entries {
            match entry.kind {
                KeyKind::Key(_) => types |= EventTypes::KEY | EventTypes::MSC,
                KeyKind::Switch { .. } | KeyKind::VariableSwitch(_) => types |= EventTypes::SW,
                KeyKind::Ignore => {}
            }
        }
        types
    }

    /// Key codes generated, sorted and deduplicated
    pub fn key_codes(&self) -> Vec<u16> {
        let set: BTreeSet<u16> = self
            .entries
            .iter()
            .filter_map(|e| match e.kind {
                KeyKind::Key(code) => Some(code),
                _ => None,
            })
            .collect();
        set.into_iter().collect()
    }

    /// Switch codes generated, sorted and deduplicated
    pub fn switch_codes(&self) -> Vec<u16> {
        let set: BTreeSet<u16> = self
            .entries
            .iter()
            .filter_map(|e| match e.kind {
                KeyKind::Switch { code, .. } | KeyKind::VariableSwitch(code) => Some(code),
                _ => None,
            })
            .collect();
        set.into_iter().collect()
    }
}
