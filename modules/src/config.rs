//! # Module Configuration
//!
//! Build-time knobs of the shim: the driver name used for the input device
//! path, the input device name and its index. Hosts that pass module
//! parameters can build the configuration from a key/value lookup.

use crate::{DriverError, DriverResult};
use alloc::format;
use alloc::string::String;

/// Default driver name
pub const DRIVER_NAME: &str = "tuxedo_keyboard";
/// Default input device name
pub const INPUT_NAME: &str = "TUXEDO Keyboard";

/// Shim configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleConfig {
    /// Driver name, prefix of the input device path
    pub driver_name: String,
    /// Input device display name
    pub input_name: String,
    /// Input device index in the physical path
    pub input_index: u32,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            driver_name: String::from(DRIVER_NAME),
            input_name: String::from(INPUT_NAME),
            input_index: 0,
        }
    }
}

impl ModuleConfig {
    /// Build from module parameters; absent keys keep their defaults
    ///
    /// Recognised keys: `driver_name`, `input_name`, `input_index`.
    pub fn from_params<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> DriverResult<Self> {
        let mut config = Self::default();

        if let Some(name) = lookup("driver_name") {
            if name.is_empty() {
                return Err(DriverError::InvalidConfig(String::from("driver_name is empty")));
            }
            config.driver_name = String::from(name);
        }
        if let Some(name) = lookup("input_name") {
            config.input_name = String::from(name);
        }
        if let Some(index) = lookup("input_index") {
            config.input_index = index
                .trim()
                .parse()
                .map_err(|_| DriverError::InvalidConfig(format!("input_index: {:?}", index)))?;
        }

        Ok(config)
    }

    /// Physical path of the input device, e.g. `tuxedo_keyboard/input0`
    pub fn input_phys(&self) -> String {
        format!("{}/input{}", self.driver_name, self.input_index)
    }
}
