//! # Colour Table
//!
//! Standard backlight colours shared with the per-model drivers.

use static_assertions::const_assert;

/// Named 24-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Upper-case name
    pub name: &'static str,
    /// 0xRRGGBB
    pub code: u32,
}

/// Commonly used standard colours, in table order
pub const COLORS: [Color; 8] = [
    Color { name: "BLACK", code: 0x000000 },
    Color { name: "RED", code: 0xFF0000 },
    Color { name: "GREEN", code: 0x00FF00 },
    Color { name: "BLUE", code: 0x0000FF },
    Color { name: "YELLOW", code: 0xFFFF00 },
    Color { name: "MAGENTA", code: 0xFF00FF },
    Color { name: "CYAN", code: 0x00FFFF },
    Color { name: "WHITE", code: 0xFFFFFF },
];

const fn all_codes_fit_24_bits() -> bool {
    let mut i = 0;
    while i < COLORS.len() {
        if COLORS[i].code > 0xFF_FFFF {
            return false;
        }
        i += 1;
    }
    true
}

const_assert!(all_codes_fit_24_bits());

impl Color {
    /// Find a colour by name, ignoring case
    pub fn by_name(name: &str) -> Option<&'static Color> {
        COLORS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Find a colour by code
    pub fn by_code(code: u32) -> Option<&'static Color> {
        COLORS.iter().find(|c| c.code == code)
    }

    /// Red component
    pub const fn red(&self) -> u8 {
        (self.code >> 16) as u8
    }

    /// Green component
    pub const fn green(&self) -> u8 {
        (self.code >> 8) as u8
    }

    /// Blue component
    pub const fn blue(&self) -> u8 {
        self.code as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        let names: alloc::vec::Vec<&str> = COLORS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            ["BLACK", "RED", "GREEN", "BLUE", "YELLOW", "MAGENTA", "CYAN", "WHITE"]
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Color::by_name("magenta").map(|c| c.code), Some(0xFF00FF));
        assert_eq!(Color::by_code(0x00FFFF).map(|c| c.name), Some("CYAN"));
        assert!(Color::by_name("ORANGE").is_none());
    }

    #[test]
    fn test_components() {
        let yellow = Color::by_name("YELLOW").expect("in table");
        assert_eq!((yellow.red(), yellow.green(), yellow.blue()), (0xFF, 0xFF, 0x00));
    }
}
