//! Board constants for a Raspberry Pi Pico wired as a macro keypad.
//!
//! | Function        | GPIO | Notes                          |
//! |-----------------|------|--------------------------------|
//! | Button 1        | 2    | to GND, internal pull-up       |
//! | Button 2        | 3    | to GND, internal pull-up       |
//! | Button 3        | 4    | to GND, internal pull-up       |
//! | Encoder A       | 6    | internal pull-up               |
//! | Encoder B       | 7    | internal pull-up               |
//! | Encoder switch  | 8    | to GND, internal pull-up       |
//! | WS2812 data     | 16   | PIO0 state machine 0           |
//!
//! Pins are bound in `main.rs`; this module only names the numbers.

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0001;

pub const USB_MANUFACTURER: &str = "Rust Keypad";
pub const USB_PRODUCT: &str = "Macro Keypad";
pub const USB_SERIAL_NUMBER: &str = "001";

/// HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 1;

// Flash

/// Size of the Pico's QSPI flash.
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// One erase sector.
pub const FLASH_SECTOR_SIZE: usize = 4096;

/// The configuration sector is the last one; `memory.x` keeps code out of it.
pub const CONFIG_FLASH_OFFSET: u32 = (FLASH_SIZE - FLASH_SECTOR_SIZE) as u32;

// LEDs

/// Number of WS2812 LEDs in the chain, one per button.
pub const LED_COUNT: usize = keypad_proto::BUTTON_COUNT;
