//! HID reports emitted by actions, and the sink they are sent to.

use core::future::Future;

/// Error type for HID output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
}

/// Boot-protocol keyboard report.
///
/// ```text
/// Byte 0: modifier bits (bit 0 = Left Ctrl .. bit 7 = Right GUI)
/// Byte 1: reserved
/// Byte 2-7: pressed key usages
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    pub const SIZE: usize = 8;

    #[must_use]
    pub const fn new(modifier: u8, key: u8) -> Self {
        Self {
            modifier,
            keycodes: [key, 0, 0, 0, 0, 0],
        }
    }

    /// All keys up.
    #[must_use]
    pub const fn released() -> Self {
        Self::new(0, 0)
    }

    /// Add `usage` to the pressed keys. Returns `false` if all six slots
    /// are taken.
    pub fn press(&mut self, usage: u8) -> bool {
        if usage == 0 || self.keycodes.contains(&usage) {
            return true;
        }
        match self.keycodes.iter_mut().find(|k| **k == 0) {
            Some(slot) => {
                *slot = usage;
                true
            }
            None => false,
        }
    }

    /// Remove `usage`, keeping the remaining keys packed at the front.
    pub fn release(&mut self, usage: u8) {
        if usage == 0 {
            return;
        }
        let mut packed = [0u8; 6];
        for (dst, &k) in packed
            .iter_mut()
            .zip(self.keycodes.iter().filter(|&&k| k != usage))
        {
            *dst = k;
        }
        self.keycodes = packed;
    }

    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let k = self.keycodes;
        [self.modifier, 0, k[0], k[1], k[2], k[3], k[4], k[5]]
    }
}

/// Relative mouse report: buttons, X, Y, wheel, horizontal pan.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    pub buttons: u8,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
    pub pan: i8,
}

impl MouseReport {
    pub const SIZE: usize = 5;

    #[must_use]
    pub const fn buttons(buttons: u8) -> Self {
        Self {
            buttons,
            x: 0,
            y: 0,
            wheel: 0,
            pan: 0,
        }
    }

    #[must_use]
    pub const fn wheel(delta: i8) -> Self {
        Self {
            wheel: delta,
            ..Self::buttons(0)
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.buttons,
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
            self.pan as u8,
        ]
    }
}

/// Consumer-control report: one 16-bit usage, 0 = released.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsumerReport {
    pub usage: u16,
}

impl ConsumerReport {
    pub const SIZE: usize = 2;

    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        self.usage.to_le_bytes()
    }
}

/// A report for one of the three HID interfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
    Consumer(ConsumerReport),
}

/// Async trait for HID report sinks.
///
/// Implemented by the USB HID writers on the device and by recording mocks in
/// tests.
pub trait HidSink {
    /// Send one report. May wait until the previous report went out.
    fn send(&mut self, report: &HidReport) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the host has enumerated the device.
    fn is_ready(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_layout() {
        let report = KeyboardReport::new(0x03, 0x10);
        assert_eq!(report.as_bytes(), [0x03, 0, 0x10, 0, 0, 0, 0, 0]);
        assert_eq!(KeyboardReport::released().as_bytes(), [0; 8]);
    }

    #[test]
    fn keyboard_tracks_six_keys() {
        let mut report = KeyboardReport::released();
        for usage in 0x04..0x0A {
            assert!(report.press(usage));
        }
        assert!(report.press(0x05));
        assert!(!report.press(0x0A));
        assert_eq!(report.keycodes, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);

        report.release(0x05);
        assert_eq!(report.keycodes, [0x04, 0x06, 0x07, 0x08, 0x09, 0]);
        assert!(report.press(0x0A));
        assert_eq!(report.keycodes[5], 0x0A);
    }

    #[test]
    fn mouse_wheel_is_signed() {
        assert_eq!(MouseReport::wheel(-1).as_bytes(), [0, 0, 0, 0xFF, 0]);
        assert_eq!(MouseReport::buttons(0x02).as_bytes(), [0x02, 0, 0, 0, 0]);
    }

    #[test]
    fn consumer_is_little_endian() {
        assert_eq!(ConsumerReport { usage: 0x0223 }.as_bytes(), [0x23, 0x02]);
    }
}
