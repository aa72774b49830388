//! # Linux Host Identity
//!
//! Reads the machine identity of a running Linux system from
//! `/sys/class/dmi/id` and `/proc/cpuinfo`.

use crate::cpu::{CpuIdentity, CpuVendor};
use crate::firmware::DmiField;
use crate::MachineIdentity;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::string::String;

const DMI_FIELDS: [DmiField; 8] = [
    DmiField::BiosVendor,
    DmiField::BiosVersion,
    DmiField::SysVendor,
    DmiField::ProductName,
    DmiField::ProductSku,
    DmiField::BoardVendor,
    DmiField::BoardName,
    DmiField::ChassisVendor,
];

/// Machine identity snapshot taken from sysfs and procfs
#[derive(Debug, Clone, Default)]
pub struct SysfsMachine {
    dmi: BTreeMap<DmiField, String>,
    cpu: CpuIdentity,
}

impl SysfsMachine {
    /// Read the identity of the running system
    pub fn read() -> Self {
        Self::read_from(Path::new("/sys/class/dmi/id"), Path::new("/proc/cpuinfo"))
    }

    /// Read the identity from explicit locations
    pub fn read_from(dmi_dir: &Path, cpuinfo: &Path) -> Self {
        let mut dmi = BTreeMap::new();
        for field in DMI_FIELDS {
            let path: PathBuf = dmi_dir.join(field.sysfs_name());
            match std::fs::read_to_string(&path) {
                Ok(value) => {
                    dmi.insert(field, String::from(value.trim_end()));
                }
                Err(err) => log::debug!("dmi: {} unavailable: {}", path.display(), err),
            }
        }

        let cpu = match std::fs::read_to_string(cpuinfo) {
            Ok(text) => parse_cpuinfo(&text),
            Err(err) => {
                log::warn!("cpu: {} unavailable: {}", cpuinfo.display(), err);
                CpuIdentity::default()
            }
        };

        Self { dmi, cpu }
    }
}

impl MachineIdentity for SysfsMachine {
    fn dmi_string(&self, field: DmiField) -> Option<&str> {
        self.dmi.get(&field).map(String::as_str)
    }

    fn cpu(&self) -> CpuIdentity {
        self.cpu
    }
}

/// Parse the first processor block of `/proc/cpuinfo`
pub fn parse_cpuinfo(text: &str) -> CpuIdentity {
    let mut cpu = CpuIdentity::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "vendor_id" => cpu.vendor = CpuVendor::from_vendor_id(value),
            "cpu family" => cpu.family = value.parse().unwrap_or(0),
            "model" => cpu.model = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    cpu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpuinfo_first_block() {
        let text = "processor\t: 0\n\
                    vendor_id\t: GenuineIntel\n\
                    cpu family\t: 6\n\
                    model\t\t: 140\n\
                    model name\t: 11th Gen Intel(R) Core(TM) i7-1165G7\n\
                    \n\
                    processor\t: 1\n\
                    vendor_id\t: AuthenticAMD\n";

        let cpu = parse_cpuinfo(text);
        assert_eq!(cpu, CpuIdentity::new(CpuVendor::Intel, 6, 140));
    }

    #[test]
    fn test_missing_files_give_empty_identity() {
        let machine = SysfsMachine::read_from(
            Path::new("/nonexistent/dmi"),
            Path::new("/nonexistent/cpuinfo"),
        );
        assert_eq!(machine.dmi_string(DmiField::SysVendor), None);
        assert_eq!(machine.cpu(), CpuIdentity::default());
    }
}
