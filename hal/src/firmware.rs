//! # Firmware Identity
//!
//! DMI (SMBIOS) identity strings and the match tables used to recognise a
//! machine from them.

use crate::MachineIdentity;

/// DMI identity string selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DmiField {
    /// BIOS vendor
    BiosVendor,
    /// BIOS version
    BiosVersion,
    /// System manufacturer
    SysVendor,
    /// Product name
    ProductName,
    /// Product SKU
    ProductSku,
    /// Baseboard manufacturer
    BoardVendor,
    /// Baseboard product name
    BoardName,
    /// Chassis manufacturer
    ChassisVendor,
}

impl DmiField {
    /// Attribute file name under `/sys/class/dmi/id`
    pub const fn sysfs_name(self) -> &'static str {
        match self {
            DmiField::BiosVendor => "bios_vendor",
            DmiField::BiosVersion => "bios_version",
            DmiField::SysVendor => "sys_vendor",
            DmiField::ProductName => "product_name",
            DmiField::ProductSku => "product_sku",
            DmiField::BoardVendor => "board_vendor",
            DmiField::BoardName => "board_name",
            DmiField::ChassisVendor => "chassis_vendor",
        }
    }
}

/// Single condition on one DMI field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmiMatch {
    /// Field to inspect
    pub field: DmiField,
    /// Expected value
    pub value: &'static str,
    /// Require the whole string instead of a substring
    pub exact: bool,
}

impl DmiMatch {
    /// Field contains `value`
    pub const fn contains(field: DmiField, value: &'static str) -> Self {
        Self { field, value, exact: false }
    }

    /// Field equals `value`
    pub const fn exact(field: DmiField, value: &'static str) -> Self {
        Self { field, value, exact: true }
    }

    /// Evaluate against a machine; an absent field never matches
    pub fn matches(&self, machine: &dyn MachineIdentity) -> bool {
        match machine.dmi_string(self.field) {
            Some(actual) if self.exact => actual == self.value,
            Some(actual) => actual.contains(self.value),
            None => false,
        }
    }
}

/// One system entry of a DMI table
///
/// An entry matches when all of its conditions match.
#[derive(Debug, Clone, Copy)]
pub struct DmiSystemId {
    /// Name used in log output
    pub ident: &'static str,
    /// Conditions, all required
    pub matches: &'static [DmiMatch],
}

impl DmiSystemId {
    /// Evaluate the entry
    pub fn matches(&self, machine: &dyn MachineIdentity) -> bool {
        !self.matches.is_empty() && self.matches.iter().all(|m| m.matches(machine))
    }

    /// Find the first entry of `table` matching the machine
    pub fn check_system<'a>(
        table: &'a [DmiSystemId],
        machine: &dyn MachineIdentity,
    ) -> Option<&'a DmiSystemId> {
        table.iter().find(|entry| entry.matches(machine))
    }
}
