//! Mapping from the keyboard action's primary byte to HID keyboard usages.
//!
//! The primary byte follows the Arduino `Keyboard` convention:
//!
//! ```text
//! 0x00        no key
//! 0x01..0x7F  US-layout ASCII; uppercase letters and shifted symbols add Shift
//! 0x80..0x87  modifier keys (L-Ctrl, L-Shift, L-Alt, L-GUI, R-Ctrl, ...)
//! 0x88..0xFF  raw HID usage + 0x88 (0xB0 = Enter, 0xC2 = F1, ...)
//! ```

/// Offset applied to raw HID usages in the primary byte.
pub const RAW_USAGE_OFFSET: u8 = 0x88;

/// First primary value naming a modifier key.
pub const MODIFIER_KEY_BASE: u8 = 0x80;

/// HID modifier bit for Left Shift.
const LEFT_SHIFT: u8 = 0x02;

/// A single keystroke: usage code plus modifier bits it implies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyStroke {
    /// HID keyboard usage (0 when the stroke is modifier-only).
    pub usage: u8,
    /// HID modifier bits (report byte 0 layout).
    pub modifiers: u8,
}

impl KeyStroke {
    const fn plain(usage: u8) -> Option<Self> {
        Some(Self {
            usage,
            modifiers: 0,
        })
    }

    const fn shifted(usage: u8) -> Option<Self> {
        Some(Self {
            usage,
            modifiers: LEFT_SHIFT,
        })
    }
}

/// Translate a primary byte into a keystroke.
///
/// Returns `None` for `0` and for control characters without a key.
#[must_use]
pub const fn keystroke(primary: u8) -> Option<KeyStroke> {
    match primary {
        0 => None,
        b'a'..=b'z' => KeyStroke::plain(0x04 + (primary - b'a')),
        b'A'..=b'Z' => KeyStroke::shifted(0x04 + (primary - b'A')),
        b'1'..=b'9' => KeyStroke::plain(0x1E + (primary - b'1')),
        b'0' => KeyStroke::plain(0x27),
        b'\n' | b'\r' => KeyStroke::plain(0x28),
        0x1B => KeyStroke::plain(0x29),
        0x08 => KeyStroke::plain(0x2A),
        b'\t' => KeyStroke::plain(0x2B),
        b' ' => KeyStroke::plain(0x2C),
        b'-' => KeyStroke::plain(0x2D),
        b'=' => KeyStroke::plain(0x2E),
        b'[' => KeyStroke::plain(0x2F),
        b']' => KeyStroke::plain(0x30),
        b'\\' => KeyStroke::plain(0x31),
        b';' => KeyStroke::plain(0x33),
        b'\'' => KeyStroke::plain(0x34),
        b'`' => KeyStroke::plain(0x35),
        b',' => KeyStroke::plain(0x36),
        b'.' => KeyStroke::plain(0x37),
        b'/' => KeyStroke::plain(0x38),
        b'!' => KeyStroke::shifted(0x1E),
        b'@' => KeyStroke::shifted(0x1F),
        b'#' => KeyStroke::shifted(0x20),
        b'$' => KeyStroke::shifted(0x21),
        b'%' => KeyStroke::shifted(0x22),
        b'^' => KeyStroke::shifted(0x23),
        b'&' => KeyStroke::shifted(0x24),
        b'*' => KeyStroke::shifted(0x25),
        b'(' => KeyStroke::shifted(0x26),
        b')' => KeyStroke::shifted(0x27),
        b'_' => KeyStroke::shifted(0x2D),
        b'+' => KeyStroke::shifted(0x2E),
        b'{' => KeyStroke::shifted(0x2F),
        b'}' => KeyStroke::shifted(0x30),
        b'|' => KeyStroke::shifted(0x31),
        b':' => KeyStroke::shifted(0x33),
        b'"' => KeyStroke::shifted(0x34),
        b'~' => KeyStroke::shifted(0x35),
        b'<' => KeyStroke::shifted(0x36),
        b'>' => KeyStroke::shifted(0x37),
        b'?' => KeyStroke::shifted(0x38),
        0x7F => KeyStroke::plain(0x4C),
        MODIFIER_KEY_BASE..=0x87 => Some(KeyStroke {
            usage: 0,
            modifiers: 1 << (primary - MODIFIER_KEY_BASE),
        }),
        RAW_USAGE_OFFSET..=0xFF => KeyStroke::plain(primary - RAW_USAGE_OFFSET),
        _ => None,
    }
}

/// Name of a special key in the raw-usage range, if it has a common one.
#[must_use]
pub const fn special_key_name(primary: u8) -> Option<&'static str> {
    Some(match primary {
        0xB0 => "Enter",
        0xB1 => "Esc",
        0xB2 => "Backspace",
        0xB3 => "Tab",
        0xD1 => "Insert",
        0xD2 => "Home",
        0xD3 => "Page Up",
        0xD4 => "Delete",
        0xD5 => "End",
        0xD6 => "Page Down",
        0xD7 => "Right",
        0xD8 => "Left",
        0xD9 => "Down",
        0xDA => "Up",
        0xC2 => "F1",
        0xC3 => "F2",
        0xC4 => "F3",
        0xC5 => "F4",
        0xC6 => "F5",
        0xC7 => "F6",
        0xC8 => "F7",
        0xC9 => "F8",
        0xCA => "F9",
        0xCB => "F10",
        0xCC => "F11",
        0xCD => "F12",
        b' ' => "Space",
        b'\n' | b'\r' => "Enter",
        b'\t' => "Tab",
        0x08 => "Backspace",
        0x1B => "Esc",
        0x7F => "Delete",
        _ => return None,
    })
}
