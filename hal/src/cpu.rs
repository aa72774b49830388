//! # CPU Identity
//!
//! Vendor/family/model identity of the boot CPU and the match tables used to
//! recognise CPU generations.

use core::fmt;

/// CPU vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CpuVendor {
    /// GenuineIntel
    Intel,
    /// AuthenticAMD
    Amd,
    /// HygonGenuine
    Hygon,
    /// Any other vendor string
    #[default]
    Unknown,
}

impl CpuVendor {
    /// Parse a CPUID vendor string
    pub fn from_vendor_id(vendor_id: &str) -> Self {
        match vendor_id.trim() {
            "GenuineIntel" => CpuVendor::Intel,
            "AuthenticAMD" => CpuVendor::Amd,
            "HygonGenuine" => CpuVendor::Hygon,
            _ => CpuVendor::Unknown,
        }
    }
}

/// Identity of a CPU as reported by CPUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CpuIdentity {
    /// Vendor
    pub vendor: CpuVendor,
    /// Display family (base + extended)
    pub family: u8,
    /// Display model (base + extended)
    pub model: u8,
}

impl CpuIdentity {
    /// Create a new identity
    pub const fn new(vendor: CpuVendor, family: u8, model: u8) -> Self {
        Self { vendor, family, model }
    }
}

impl fmt::Display for CpuIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} family {:#x} model {:#x}", self.vendor, self.family, self.model)
    }
}

/// One row of a CPU match table
///
/// A row without a model matches every model of the family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuMatch {
    /// Required vendor
    pub vendor: CpuVendor,
    /// Required family
    pub family: u8,
    /// Required model, `None` for any
    pub model: Option<u8>,
}

impl CpuMatch {
    /// Match a vendor and family, any model
    pub const fn family(vendor: CpuVendor, family: u8) -> Self {
        Self { vendor, family, model: None }
    }

    /// Match a vendor, family and model
    pub const fn model(vendor: CpuVendor, family: u8, model: u8) -> Self {
        Self { vendor, family, model: Some(model) }
    }

    /// Match an Intel family 6 model
    pub const fn intel_fam6(model: u8) -> Self {
        Self::model(CpuVendor::Intel, 6, model)
    }

    /// Check whether a CPU satisfies this row
    pub fn matches(&self, cpu: &CpuIdentity) -> bool {
        self.vendor == cpu.vendor
            && self.family == cpu.family
            && self.model.map_or(true, |m| m == cpu.model)
    }

    /// Find the first row of `table` matching `cpu`
    pub fn find<'a>(table: &'a [CpuMatch], cpu: &CpuIdentity) -> Option<&'a CpuMatch> {
        table.iter().find(|row| row.matches(cpu))
    }
}

/// Intel model numbers
pub mod intel {
    #![allow(missing_docs)]

    // Family 6
    pub const CORE_YONAH: u8 = 0x0E;
    pub const CORE2_MEROM: u8 = 0x0F;
    pub const CORE2_MEROM_L: u8 = 0x16;
    pub const CORE2_PENRYN: u8 = 0x17;
    pub const CORE2_DUNNINGTON: u8 = 0x1D;

    pub const NEHALEM: u8 = 0x1E;
    pub const NEHALEM_G: u8 = 0x1F;
    pub const NEHALEM_EP: u8 = 0x1A;
    pub const NEHALEM_EX: u8 = 0x2E;

    pub const WESTMERE: u8 = 0x25;
    pub const WESTMERE_EP: u8 = 0x2C;
    pub const WESTMERE_EX: u8 = 0x2F;

    pub const SANDYBRIDGE: u8 = 0x2A;
    pub const SANDYBRIDGE_X: u8 = 0x2D;
    pub const IVYBRIDGE: u8 = 0x3A;
    pub const IVYBRIDGE_X: u8 = 0x3E;

    pub const HASWELL: u8 = 0x3C;
    pub const HASWELL_X: u8 = 0x3F;
    pub const HASWELL_L: u8 = 0x45;
    pub const HASWELL_G: u8 = 0x46;

    pub const BROADWELL: u8 = 0x3D;
    pub const BROADWELL_G: u8 = 0x47;
    pub const BROADWELL_X: u8 = 0x4F;
    pub const BROADWELL_D: u8 = 0x56;

    pub const SKYLAKE_L: u8 = 0x4E;
    pub const SKYLAKE: u8 = 0x5E;
    pub const SKYLAKE_X: u8 = 0x55;
    pub const KABYLAKE_L: u8 = 0x8E;
    pub const KABYLAKE: u8 = 0x9E;
    pub const COMETLAKE: u8 = 0xA5;
    pub const COMETLAKE_L: u8 = 0xA6;
    pub const CANNONLAKE_L: u8 = 0x66;

    pub const ICELAKE_X: u8 = 0x6A;
    pub const ICELAKE_D: u8 = 0x6C;
    pub const ICELAKE: u8 = 0x7D;
    pub const ICELAKE_L: u8 = 0x7E;
    pub const ICELAKE_NNPI: u8 = 0x9D;

    pub const LAKEFIELD: u8 = 0x8A;
    pub const ROCKETLAKE: u8 = 0xA7;
    pub const TIGERLAKE_L: u8 = 0x8C;
    pub const TIGERLAKE: u8 = 0x8D;

    pub const SAPPHIRERAPIDS_X: u8 = 0x8F;
    pub const EMERALDRAPIDS_X: u8 = 0xCF;

    pub const ALDERLAKE: u8 = 0x97;
    pub const ALDERLAKE_L: u8 = 0x9A;
    pub const ALDERLAKE_N: u8 = 0xBE;

    pub const RAPTORLAKE: u8 = 0xB7;
    pub const RAPTORLAKE_P: u8 = 0xBA;
    pub const RAPTORLAKE_S: u8 = 0xBF;

    pub const ATOM_BONNELL: u8 = 0x1C;
    pub const ATOM_BONNELL_MID: u8 = 0x26;
    pub const ATOM_SALTWELL: u8 = 0x36;
    pub const ATOM_SALTWELL_MID: u8 = 0x27;
    pub const ATOM_SALTWELL_TABLET: u8 = 0x35;
    pub const ATOM_SILVERMONT: u8 = 0x37;
    pub const ATOM_SILVERMONT_D: u8 = 0x4D;
    pub const ATOM_SILVERMONT_MID: u8 = 0x4A;
    pub const ATOM_AIRMONT: u8 = 0x4C;
    /// Later renamed SILVERMONT_MID2, same model number
    pub const ATOM_AIRMONT_MID: u8 = 0x5A;
    pub const ATOM_AIRMONT_NP: u8 = 0x75;
    pub const ATOM_GOLDMONT: u8 = 0x5C;
    pub const ATOM_GOLDMONT_D: u8 = 0x5F;
    pub const ATOM_GOLDMONT_PLUS: u8 = 0x7A;
    pub const ATOM_TREMONT_D: u8 = 0x86;
    pub const ATOM_TREMONT: u8 = 0x96;
    pub const ATOM_TREMONT_L: u8 = 0x9C;

    pub const XEON_PHI_KNL: u8 = 0x57;
    pub const XEON_PHI_KNM: u8 = 0x85;

    // Family 5
    pub const QUARK_X1000: u8 = 0x09;
}
