//! # Hardware Gate
//!
//! Decides at load time whether the shim should activate on this machine.
//!
//! The module activates when the DMI strings identify the vendor's own
//! hardware, or when the CPU belongs to a known generation that is not
//! explicitly denied.

use alloc::vec::Vec;
use keyshim_hal::cpu::{intel, CpuMatch, CpuVendor};
use keyshim_hal::firmware::{DmiField, DmiMatch, DmiSystemId};
use keyshim_hal::MachineIdentity;

/// DMI identities of the vendor's hardware
pub static DMI_STRING_MATCH: [DmiSystemId; 3] = [
    DmiSystemId {
        ident: "sys_vendor",
        matches: &[DmiMatch::contains(DmiField::SysVendor, "Notebook")],
    },
    DmiSystemId {
        ident: "board_vendor",
        matches: &[DmiMatch::contains(DmiField::BoardVendor, "Notebook")],
    },
    DmiSystemId {
        ident: "chassis_vendor",
        matches: &[DmiMatch::contains(DmiField::ChassisVendor, "No Enclosure")],
    },
];

const fn fam6(model: u8) -> CpuMatch {
    CpuMatch::intel_fam6(model)
}

const fn amd(family: u8) -> CpuMatch {
    CpuMatch::family(CpuVendor::Amd, family)
}

const fn amd_model(family: u8, model: u8) -> CpuMatch {
    CpuMatch::model(CpuVendor::Amd, family, model)
}

/// CPU generations on which the DMI check is skipped
pub static CPU_ALLOW: &[CpuMatch] = &[
    fam6(intel::CORE_YONAH),
    fam6(intel::CORE2_MEROM),
    fam6(intel::CORE2_MEROM_L),
    fam6(intel::CORE2_PENRYN),
    fam6(intel::CORE2_DUNNINGTON),
    fam6(intel::NEHALEM),
    fam6(intel::NEHALEM_G),
    fam6(intel::NEHALEM_EP),
    fam6(intel::NEHALEM_EX),
    fam6(intel::WESTMERE),
    fam6(intel::WESTMERE_EP),
    fam6(intel::WESTMERE_EX),
    fam6(intel::SANDYBRIDGE),
    fam6(intel::SANDYBRIDGE_X),
    fam6(intel::IVYBRIDGE),
    fam6(intel::IVYBRIDGE_X),
    fam6(intel::HASWELL),
    fam6(intel::HASWELL_X),
    fam6(intel::HASWELL_L),
    fam6(intel::HASWELL_G),
    fam6(intel::BROADWELL),
    fam6(intel::BROADWELL_G),
    fam6(intel::BROADWELL_X),
    fam6(intel::BROADWELL_D),
    fam6(intel::SKYLAKE_L),
    fam6(intel::SKYLAKE),
    fam6(intel::SKYLAKE_X),
    fam6(intel::KABYLAKE_L),
    fam6(intel::KABYLAKE),
    fam6(intel::COMETLAKE),
    fam6(intel::COMETLAKE_L),
    fam6(intel::CANNONLAKE_L),
    fam6(intel::ICELAKE_X),
    fam6(intel::ICELAKE_D),
    fam6(intel::ICELAKE),
    fam6(intel::ICELAKE_L),
    fam6(intel::ICELAKE_NNPI),
    fam6(intel::LAKEFIELD),
    fam6(intel::ROCKETLAKE),
    fam6(intel::TIGERLAKE_L),
    fam6(intel::TIGERLAKE),
    fam6(intel::SAPPHIRERAPIDS_X), // 12th Gen Xeon
    fam6(intel::ALDERLAKE),        // 12th Gen
    fam6(intel::ALDERLAKE_L),      // 12th Gen
    fam6(intel::ALDERLAKE_N),      // 12th Gen Atom
    fam6(intel::RAPTORLAKE),       // 13th Gen
    fam6(intel::RAPTORLAKE_P),     // 13th Gen
    fam6(intel::RAPTORLAKE_S),     // 13th Gen
    fam6(intel::ATOM_BONNELL),
    fam6(intel::ATOM_BONNELL_MID),
    fam6(intel::ATOM_SALTWELL),
    fam6(intel::ATOM_SALTWELL_MID),
    fam6(intel::ATOM_SALTWELL_TABLET),
    fam6(intel::ATOM_SILVERMONT),
    fam6(intel::ATOM_SILVERMONT_D),
    fam6(intel::ATOM_SILVERMONT_MID),
    fam6(intel::ATOM_AIRMONT),
    fam6(intel::ATOM_AIRMONT_MID),
    fam6(intel::ATOM_AIRMONT_NP),
    fam6(intel::ATOM_GOLDMONT),
    fam6(intel::ATOM_GOLDMONT_D),
    fam6(intel::ATOM_GOLDMONT_PLUS),
    fam6(intel::ATOM_TREMONT_D),
    fam6(intel::ATOM_TREMONT),
    fam6(intel::ATOM_TREMONT_L),
    fam6(intel::XEON_PHI_KNL),
    fam6(intel::XEON_PHI_KNM),
    CpuMatch::model(CpuVendor::Intel, 5, intel::QUARK_X1000),
    amd(5),
    amd(6),
    amd(15),
    amd(16),
    amd(17),
    amd(18),
    amd(19),
    amd(20),
    amd(21),
    amd(22),
    amd(23), // Zen, Zen+, Zen 2
    amd(24), // Zen
    amd_model(25, 0x01), // Zen 3 Epyc
    amd_model(25, 0x08), // Zen 3 Threadripper
    amd_model(25, 0x21), // Zen 3 Vermeer
    amd_model(25, 0x40), // Zen 3+ Rembrandt
    amd_model(25, 0x44), // Zen 3+ Rembrandt
    amd_model(25, 0x50), // Zen 3 Cezanne
];

/// CPU generations that always require the DMI check
pub static CPU_DENY: &[CpuMatch] = &[];

/// Why the gate decided the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// A DMI entry matched
    Dmi(&'static str),
    /// The CPU is on the allow list and not denied
    CpuAllowed,
    /// The CPU is on the allow list but also denied
    CpuDenied,
    /// Nothing matched
    Unrecognized,
}

impl GateDecision {
    /// Whether the module should activate
    pub fn permits(self) -> bool {
        matches!(self, GateDecision::Dmi(_) | GateDecision::CpuAllowed)
    }
}

/// Load-time hardware gate
#[derive(Debug, Clone)]
pub struct HardwareGate {
    dmi: &'static [DmiSystemId],
    allow: &'static [CpuMatch],
    deny: Vec<CpuMatch>,
}

impl Default for HardwareGate {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareGate {
    /// Gate with the built-in tables
    pub fn new() -> Self {
        Self {
            dmi: &DMI_STRING_MATCH,
            allow: CPU_ALLOW,
            deny: CPU_DENY.to_vec(),
        }
    }

    /// Add CPU generations that must pass the DMI check
    pub fn with_denied(mut self, entries: &[CpuMatch]) -> Self {
        self.deny.extend_from_slice(entries);
        self
    }

    /// Evaluate the machine
    pub fn decide(&self, machine: &dyn MachineIdentity) -> GateDecision {
        if let Some(entry) = DmiSystemId::check_system(self.dmi, machine) {
            return GateDecision::Dmi(entry.ident);
        }

        let cpu = machine.cpu();
        match CpuMatch::find(self.allow, &cpu) {
            Some(_) if CpuMatch::find(&self.deny, &cpu).is_some() => GateDecision::CpuDenied,
            Some(_) => GateDecision::CpuAllowed,
            None => GateDecision::Unrecognized,
        }
    }

    /// Whether the module should activate on this machine
    pub fn should_activate(&self, machine: &dyn MachineIdentity) -> bool {
        let decision = self.decide(machine);
        match decision {
            GateDecision::Dmi(ident) => log::debug!("gate: dmi match on {}", ident),
            GateDecision::CpuAllowed => log::debug!("gate: cpu {} allowed", machine.cpu()),
            GateDecision::CpuDenied => log::info!("gate: cpu {} explicitly denied", machine.cpu()),
            GateDecision::Unrecognized => log::debug!("gate: machine not recognized"),
        }
        decision.permits()
    }
}
