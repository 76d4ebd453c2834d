//! HID keyboard usage codes
//!
//! Keys are identified by their USB HID usage ID (page 0x07), the same code
//! the keyboard reports on the wire. Layout tables map these to grid positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A HID keyboard usage code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub const A: Self = Self(0x04);
    pub const B: Self = Self(0x05);
    pub const C: Self = Self(0x06);
    pub const D: Self = Self(0x07);
    pub const E: Self = Self(0x08);
    pub const F: Self = Self(0x09);
    pub const G: Self = Self(0x0A);
    pub const H: Self = Self(0x0B);
    pub const I: Self = Self(0x0C);
    pub const J: Self = Self(0x0D);
    pub const K: Self = Self(0x0E);
    pub const L: Self = Self(0x0F);
    pub const M: Self = Self(0x10);
    pub const N: Self = Self(0x11);
    pub const O: Self = Self(0x12);
    pub const P: Self = Self(0x13);
    pub const Q: Self = Self(0x14);
    pub const R: Self = Self(0x15);
    pub const S: Self = Self(0x16);
    pub const T: Self = Self(0x17);
    pub const U: Self = Self(0x18);
    pub const V: Self = Self(0x19);
    pub const W: Self = Self(0x1A);
    pub const X: Self = Self(0x1B);
    pub const Y: Self = Self(0x1C);
    pub const Z: Self = Self(0x1D);
    pub const N1: Self = Self(0x1E);
    pub const N2: Self = Self(0x1F);
    pub const N3: Self = Self(0x20);
    pub const N4: Self = Self(0x21);
    pub const N5: Self = Self(0x22);
    pub const N6: Self = Self(0x23);
    pub const N7: Self = Self(0x24);
    pub const N8: Self = Self(0x25);
    pub const N9: Self = Self(0x26);
    pub const N0: Self = Self(0x27);
    pub const ENTER: Self = Self(0x28);
    pub const ESC: Self = Self(0x29);
    pub const BACKSPACE: Self = Self(0x2A);
    pub const TAB: Self = Self(0x2B);
    pub const SPACE: Self = Self(0x2C);
    pub const MINUS: Self = Self(0x2D);
    pub const EQUAL: Self = Self(0x2E);
    pub const LEFT_BRACKET: Self = Self(0x2F);
    pub const RIGHT_BRACKET: Self = Self(0x30);
    pub const BACKSLASH: Self = Self(0x31);
    pub const SEMICOLON: Self = Self(0x33);
    pub const QUOTE: Self = Self(0x34);
    pub const GRAVE: Self = Self(0x35);
    pub const COMMA: Self = Self(0x36);
    pub const PERIOD: Self = Self(0x37);
    pub const SLASH: Self = Self(0x38);
    pub const CAPS_LOCK: Self = Self(0x39);
    pub const F1: Self = Self(0x3A);
    pub const F2: Self = Self(0x3B);
    pub const F3: Self = Self(0x3C);
    pub const F4: Self = Self(0x3D);
    pub const F5: Self = Self(0x3E);
    pub const F6: Self = Self(0x3F);
    pub const F7: Self = Self(0x40);
    pub const F8: Self = Self(0x41);
    pub const F9: Self = Self(0x42);
    pub const F10: Self = Self(0x43);
    pub const F11: Self = Self(0x44);
    pub const F12: Self = Self(0x45);
    pub const PRINT_SCREEN: Self = Self(0x46);
    pub const SCROLL_LOCK: Self = Self(0x47);
    pub const PAUSE: Self = Self(0x48);
    pub const INSERT: Self = Self(0x49);
    pub const HOME: Self = Self(0x4A);
    pub const PAGE_UP: Self = Self(0x4B);
    pub const DELETE: Self = Self(0x4C);
    pub const END: Self = Self(0x4D);
    pub const PAGE_DOWN: Self = Self(0x4E);
    pub const RIGHT: Self = Self(0x4F);
    pub const LEFT: Self = Self(0x50);
    pub const DOWN: Self = Self(0x51);
    pub const UP: Self = Self(0x52);
    pub const NUM_LOCK: Self = Self(0x53);
    pub const KP_SLASH: Self = Self(0x54);
    pub const KP_ASTERISK: Self = Self(0x55);
    pub const KP_MINUS: Self = Self(0x56);
    pub const KP_PLUS: Self = Self(0x57);
    pub const KP_ENTER: Self = Self(0x58);
    pub const KP_1: Self = Self(0x59);
    pub const KP_2: Self = Self(0x5A);
    pub const KP_3: Self = Self(0x5B);
    pub const KP_4: Self = Self(0x5C);
    pub const KP_5: Self = Self(0x5D);
    pub const KP_6: Self = Self(0x5E);
    pub const KP_7: Self = Self(0x5F);
    pub const KP_8: Self = Self(0x60);
    pub const KP_9: Self = Self(0x61);
    pub const KP_0: Self = Self(0x62);
    pub const KP_PERIOD: Self = Self(0x63);
    pub const MENU: Self = Self(0x65);
    pub const LEFT_CTRL: Self = Self(0xE0);
    pub const LEFT_SHIFT: Self = Self(0xE1);
    pub const LEFT_ALT: Self = Self(0xE2);
    pub const LEFT_GUI: Self = Self(0xE3);
    pub const RIGHT_CTRL: Self = Self(0xE4);
    pub const RIGHT_SHIFT: Self = Self(0xE5);
    pub const RIGHT_ALT: Self = Self(0xE6);
    pub const RIGHT_GUI: Self = Self(0xE7);

    /// Convert a typed character to the key that produces it (shift ignored)
    pub fn from_char(ch: char) -> Option<Self> {
        let code = match ch {
            'a'..='z' => 0x04 + (ch as u8 - b'a'),
            'A'..='Z' => 0x04 + (ch as u8 - b'A'),
            '1'..='9' => 0x1E + (ch as u8 - b'1'),
            '0' => 0x27,
            '\n' | '\r' => 0x28,
            '\t' => 0x2B,
            ' ' => 0x2C,
            '-' | '_' => 0x2D,
            '=' | '+' => 0x2E,
            '[' | '{' => 0x2F,
            ']' | '}' => 0x30,
            '\\' | '|' => 0x31,
            ';' | ':' => 0x33,
            '\'' | '"' => 0x34,
            '`' | '~' => 0x35,
            ',' | '<' => 0x36,
            '.' | '>' => 0x37,
            '/' | '?' => 0x38,
            '!' => 0x1E,
            '@' => 0x1F,
            '#' => 0x20,
            '$' => 0x21,
            '%' => 0x22,
            '^' => 0x23,
            '&' => 0x24,
            '*' => 0x25,
            '(' => 0x26,
            ')' => 0x27,
            _ => return None,
        };
        Some(Self(code))
    }

    /// Look up a key by its display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        KEY_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|&(code, _)| Self(code))
    }

    /// Display name, if the code is in the name table
    pub fn name(self) -> Option<&'static str> {
        KEY_NAMES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|&(_, n)| n)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Usage code → display name
const KEY_NAMES: &[(u8, &str)] = &[
    (0x04, "A"),
    (0x05, "B"),
    (0x06, "C"),
    (0x07, "D"),
    (0x08, "E"),
    (0x09, "F"),
    (0x0A, "G"),
    (0x0B, "H"),
    (0x0C, "I"),
    (0x0D, "J"),
    (0x0E, "K"),
    (0x0F, "L"),
    (0x10, "M"),
    (0x11, "N"),
    (0x12, "O"),
    (0x13, "P"),
    (0x14, "Q"),
    (0x15, "R"),
    (0x16, "S"),
    (0x17, "T"),
    (0x18, "U"),
    (0x19, "V"),
    (0x1A, "W"),
    (0x1B, "X"),
    (0x1C, "Y"),
    (0x1D, "Z"),
    (0x1E, "1"),
    (0x1F, "2"),
    (0x20, "3"),
    (0x21, "4"),
    (0x22, "5"),
    (0x23, "6"),
    (0x24, "7"),
    (0x25, "8"),
    (0x26, "9"),
    (0x27, "0"),
    (0x28, "Enter"),
    (0x29, "Esc"),
    (0x2A, "Bksp"),
    (0x2B, "Tab"),
    (0x2C, "Space"),
    (0x2D, "Minus"),
    (0x2E, "Equal"),
    (0x2F, "LBracket"),
    (0x30, "RBracket"),
    (0x31, "Backslash"),
    (0x33, "Semicolon"),
    (0x34, "Quote"),
    (0x35, "Grave"),
    (0x36, "Comma"),
    (0x37, "Period"),
    (0x38, "Slash"),
    (0x39, "Caps"),
    (0x3A, "F1"),
    (0x3B, "F2"),
    (0x3C, "F3"),
    (0x3D, "F4"),
    (0x3E, "F5"),
    (0x3F, "F6"),
    (0x40, "F7"),
    (0x41, "F8"),
    (0x42, "F9"),
    (0x43, "F10"),
    (0x44, "F11"),
    (0x45, "F12"),
    (0x46, "PrtSc"),
    (0x47, "ScrLk"),
    (0x48, "Pause"),
    (0x49, "Ins"),
    (0x4A, "Home"),
    (0x4B, "PgUp"),
    (0x4C, "Del"),
    (0x4D, "End"),
    (0x4E, "PgDn"),
    (0x4F, "Right"),
    (0x50, "Left"),
    (0x51, "Down"),
    (0x52, "Up"),
    (0x53, "NumLk"),
    (0x54, "KpSlash"),
    (0x55, "KpAsterisk"),
    (0x56, "KpMinus"),
    (0x57, "KpPlus"),
    (0x58, "KpEnter"),
    (0x59, "Kp1"),
    (0x5A, "Kp2"),
    (0x5B, "Kp3"),
    (0x5C, "Kp4"),
    (0x5D, "Kp5"),
    (0x5E, "Kp6"),
    (0x5F, "Kp7"),
    (0x60, "Kp8"),
    (0x61, "Kp9"),
    (0x62, "Kp0"),
    (0x63, "KpPeriod"),
    (0x65, "Menu"),
    (0xE0, "LCtrl"),
    (0xE1, "LShift"),
    (0xE2, "LAlt"),
    (0xE3, "LWin"),
    (0xE4, "RCtrl"),
    (0xE5, "RShift"),
    (0xE6, "RAlt"),
    (0xE7, "RWin"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_char() {
        assert_eq!(KeyCode::from_char('a'), Some(KeyCode::A));
        assert_eq!(KeyCode::from_char('Z'), Some(KeyCode::Z));
        assert_eq!(KeyCode::from_char('1'), Some(KeyCode::N1));
        assert_eq!(KeyCode::from_char('0'), Some(KeyCode::N0));
        assert_eq!(KeyCode::from_char(';'), Some(KeyCode::SEMICOLON));
        assert_eq!(KeyCode::from_char(':'), Some(KeyCode::SEMICOLON));
        assert_eq!(KeyCode::from_char('é'), None);
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(KeyCode::from_name("esc"), Some(KeyCode::ESC));
        assert_eq!(KeyCode::from_name("Semicolon"), Some(KeyCode::SEMICOLON));
        assert_eq!(KeyCode::F12.name(), Some("F12"));
        assert_eq!(KeyCode(0xFF).to_string(), "0xFF");
        assert_eq!(KeyCode::LEFT_GUI.to_string(), "LWin");
    }
}
