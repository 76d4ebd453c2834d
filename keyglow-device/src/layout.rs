//! Key position tables
//!
//! A [`KeyboardLayout`] places every key of a board on an integer grid
//! measured in keyboard units (one unit = one standard keycap). The builtin
//! tables describe a 21×6 full-size board: main block in columns 0-13,
//! navigation cluster in 14-16, numpad in 17-20.

use crate::keycode::KeyCode;

/// Grid of key positions for one physical board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardLayout {
    name: String,
    width: u32,
    height: u32,
    keys: Vec<(KeyCode, i32, i32)>,
}

impl KeyboardLayout {
    /// Create a layout from `(key, x, y)` entries
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        keys: Vec<(KeyCode, i32, i32)>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            keys,
        }
    }

    /// US ANSI key placement
    pub fn qwerty() -> Self {
        let mut keys = Vec::with_capacity(104);
        for (y, row) in QWERTY_ROWS.iter().enumerate() {
            for &(key, x) in row.iter() {
                keys.push((key, x, y as i32));
            }
        }
        Self::new("qwerty", 21, 6, keys)
    }

    /// French AZERTY placement: same physical board, letters and
    /// punctuation moved to where the AZERTY legends sit
    pub fn azerty() -> Self {
        let mut layout = Self::qwerty();
        layout.name = "azerty".to_string();
        for &(key, x, y) in AZERTY_MOVES {
            layout.place(key, x, y);
        }
        layout
    }

    /// Look up a builtin layout by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "qwerty" => Some(Self::qwerty()),
            "azerty" => Some(Self::azerty()),
            _ => None,
        }
    }

    /// Shift every key and grow the grid, for boards with extra
    /// rows or columns around the standard block
    pub fn offset(mut self, dx: i32, dy: i32, width: u32, height: u32) -> Self {
        for entry in &mut self.keys {
            entry.1 += dx;
            entry.2 += dy;
        }
        self.width = width;
        self.height = height;
        self
    }

    /// Drop keys at or beyond `max_x` (tenkeyless and smaller boards)
    pub fn truncate_columns(mut self, max_x: i32) -> Self {
        self.keys.retain(|&(_, x, _)| x < max_x);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Grid width in keyboard units
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in keyboard units
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Grid position of a key, or `None` if the board has no such key
    pub fn key_position(&self, key: KeyCode) -> Option<(i32, i32)> {
        self.keys
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|&(_, x, y)| (x, y))
    }

    /// Key sitting at a grid position
    pub fn key_at(&self, x: i32, y: i32) -> Option<KeyCode> {
        self.keys
            .iter()
            .find(|&&(_, kx, ky)| kx == x && ky == y)
            .map(|&(k, _, _)| k)
    }

    /// All `(key, x, y)` entries
    pub fn keys(&self) -> &[(KeyCode, i32, i32)] {
        &self.keys
    }

    fn place(&mut self, key: KeyCode, x: i32, y: i32) {
        if let Some(entry) = self.keys.iter_mut().find(|(k, _, _)| *k == key) {
            entry.1 = x;
            entry.2 = y;
        }
    }
}

type Row = &'static [(KeyCode, i32)];

const QWERTY_ROWS: &[Row] = &[
    &[
        (KeyCode::ESC, 0),
        (KeyCode::F1, 2),
        (KeyCode::F2, 3),
        (KeyCode::F3, 4),
        (KeyCode::F4, 5),
        (KeyCode::F5, 6),
        (KeyCode::F6, 7),
        (KeyCode::F7, 8),
        (KeyCode::F8, 9),
        (KeyCode::F9, 10),
        (KeyCode::F10, 11),
        (KeyCode::F11, 12),
        (KeyCode::F12, 13),
        (KeyCode::PRINT_SCREEN, 14),
        (KeyCode::SCROLL_LOCK, 15),
        (KeyCode::PAUSE, 16),
    ],
    &[
        (KeyCode::GRAVE, 0),
        (KeyCode::N1, 1),
        (KeyCode::N2, 2),
        (KeyCode::N3, 3),
        (KeyCode::N4, 4),
        (KeyCode::N5, 5),
        (KeyCode::N6, 6),
        (KeyCode::N7, 7),
        (KeyCode::N8, 8),
        (KeyCode::N9, 9),
        (KeyCode::N0, 10),
        (KeyCode::MINUS, 11),
        (KeyCode::EQUAL, 12),
        (KeyCode::BACKSPACE, 13),
        (KeyCode::INSERT, 14),
        (KeyCode::HOME, 15),
        (KeyCode::PAGE_UP, 16),
        (KeyCode::NUM_LOCK, 17),
        (KeyCode::KP_SLASH, 18),
        (KeyCode::KP_ASTERISK, 19),
        (KeyCode::KP_MINUS, 20),
    ],
    &[
        (KeyCode::TAB, 0),
        (KeyCode::Q, 1),
        (KeyCode::W, 2),
        (KeyCode::E, 3),
        (KeyCode::R, 4),
        (KeyCode::T, 5),
        (KeyCode::Y, 6),
        (KeyCode::U, 7),
        (KeyCode::I, 8),
        (KeyCode::O, 9),
        (KeyCode::P, 10),
        (KeyCode::LEFT_BRACKET, 11),
        (KeyCode::RIGHT_BRACKET, 12),
        (KeyCode::BACKSLASH, 13),
        (KeyCode::DELETE, 14),
        (KeyCode::END, 15),
        (KeyCode::PAGE_DOWN, 16),
        (KeyCode::KP_7, 17),
        (KeyCode::KP_8, 18),
        (KeyCode::KP_9, 19),
        (KeyCode::KP_PLUS, 20),
    ],
    &[
        (KeyCode::CAPS_LOCK, 0),
        (KeyCode::A, 1),
        (KeyCode::S, 2),
        (KeyCode::D, 3),
        (KeyCode::F, 4),
        (KeyCode::G, 5),
        (KeyCode::H, 6),
        (KeyCode::J, 7),
        (KeyCode::K, 8),
        (KeyCode::L, 9),
        (KeyCode::SEMICOLON, 10),
        (KeyCode::QUOTE, 11),
        (KeyCode::ENTER, 13),
        (KeyCode::KP_4, 17),
        (KeyCode::KP_5, 18),
        (KeyCode::KP_6, 19),
    ],
    &[
        (KeyCode::LEFT_SHIFT, 0),
        (KeyCode::Z, 1),
        (KeyCode::X, 2),
        (KeyCode::C, 3),
        (KeyCode::V, 4),
        (KeyCode::B, 5),
        (KeyCode::N, 6),
        (KeyCode::M, 7),
        (KeyCode::COMMA, 8),
        (KeyCode::PERIOD, 9),
        (KeyCode::SLASH, 10),
        (KeyCode::RIGHT_SHIFT, 12),
        (KeyCode::UP, 15),
        (KeyCode::KP_1, 17),
        (KeyCode::KP_2, 18),
        (KeyCode::KP_3, 19),
        (KeyCode::KP_ENTER, 20),
    ],
    &[
        (KeyCode::LEFT_CTRL, 0),
        (KeyCode::LEFT_GUI, 1),
        (KeyCode::LEFT_ALT, 2),
        (KeyCode::SPACE, 6),
        (KeyCode::RIGHT_ALT, 10),
        (KeyCode::RIGHT_GUI, 11),
        (KeyCode::MENU, 12),
        (KeyCode::RIGHT_CTRL, 13),
        (KeyCode::LEFT, 14),
        (KeyCode::DOWN, 15),
        (KeyCode::RIGHT, 16),
        (KeyCode::KP_0, 17),
        (KeyCode::KP_PERIOD, 19),
    ],
];

const AZERTY_MOVES: &[(KeyCode, i32, i32)] = &[
    (KeyCode::A, 1, 2),
    (KeyCode::Z, 2, 2),
    (KeyCode::Q, 1, 3),
    (KeyCode::M, 10, 3),
    (KeyCode::W, 1, 4),
    (KeyCode::COMMA, 7, 4),
    (KeyCode::SEMICOLON, 8, 4),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qwerty_dimensions() {
        let layout = KeyboardLayout::qwerty();
        assert_eq!(layout.width(), 21);
        assert_eq!(layout.height(), 6);
        for &(key, x, y) in layout.keys() {
            assert!(x >= 0 && x < 21, "{key} out of grid at x={x}");
            assert!(y >= 0 && y < 6, "{key} out of grid at y={y}");
        }
    }

    #[test]
    fn test_qwerty_positions() {
        let layout = KeyboardLayout::qwerty();
        assert_eq!(layout.key_position(KeyCode::ESC), Some((0, 0)));
        assert_eq!(layout.key_position(KeyCode::SEMICOLON), Some((10, 3)));
        assert_eq!(layout.key_position(KeyCode::KP_MINUS), Some((20, 1)));
        assert_eq!(layout.key_at(1, 2), Some(KeyCode::Q));
    }

    #[test]
    fn test_positions_unique() {
        let layout = KeyboardLayout::azerty();
        let keys = layout.keys();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert!(
                    (a.1, a.2) != (b.1, b.2),
                    "{} and {} share a position",
                    a.0,
                    b.0
                );
            }
        }
    }

    #[test]
    fn test_azerty_swaps() {
        let layout = KeyboardLayout::azerty();
        assert_eq!(layout.key_position(KeyCode::A), Some((1, 2)));
        assert_eq!(layout.key_position(KeyCode::Q), Some((1, 3)));
        assert_eq!(layout.key_position(KeyCode::ESC), Some((0, 0)));
    }

    #[test]
    fn test_offset_and_truncate() {
        let layout = KeyboardLayout::qwerty()
            .truncate_columns(17)
            .offset(0, 1, 18, 7);
        assert_eq!(layout.height(), 7);
        assert_eq!(layout.key_position(KeyCode::ESC), Some((0, 1)));
        assert_eq!(layout.key_position(KeyCode::KP_5), None);
    }
}
