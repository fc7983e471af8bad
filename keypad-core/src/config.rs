//! Compile-time configuration: timings and firmware identity.
//!
//! Centralised here so they can be tuned in one place.

use keypad_proto::DeviceInfo;

// Input timing

/// Minimum time between two accepted level changes of a button.
pub const DEBOUNCE_MS: u64 = 5;

/// Hold time after which the encoder switch counts as a long press.
pub const LONG_PRESS_MS: u64 = 500;

/// Period of the main polling cycle.
pub const POLL_INTERVAL_MS: u64 = 5;

/// Quadrature counts per detent.
pub const ENCODER_COUNTS_PER_DETENT: i8 = 4;

// Action timing

/// How long a mouse button stays down for one click.
pub const CLICK_HOLD_MS: u32 = 50;

/// Pause between consecutive clicks of a multi-click action.
pub const CLICK_GAP_MS: u32 = 100;

/// Pause between consecutive scroll ticks.
pub const SCROLL_TICK_GAP_MS: u32 = 10;

// Firmware identity

const fn parse_u8(s: &str) -> u8 {
    let bytes = s.as_bytes();
    let mut value: u8 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add(b - b'0');
        i += 1;
    }
    value
}

const fn parse_u16(s: &str) -> u16 {
    let bytes = s.as_bytes();
    let mut value: u16 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < b'0' || b > b'9' {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add((b - b'0') as u16);
        i += 1;
    }
    value
}

const fn env_or(value: Option<&'static str>, fallback: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => fallback,
    }
}

/// Firmware version from the package manifest.
pub const FIRMWARE_VERSION: (u8, u8, u8) = (
    parse_u8(env!("CARGO_PKG_VERSION_MAJOR")),
    parse_u8(env!("CARGO_PKG_VERSION_MINOR")),
    parse_u8(env!("CARGO_PKG_VERSION_PATCH")),
);

/// CI build number, `KEYPAD_BUILD_NUMBER` at compile time.
pub const BUILD_NUMBER: u16 = parse_u16(env_or(option_env!("KEYPAD_BUILD_NUMBER"), "0"));

/// Build date, `KEYPAD_BUILD_DATE` at compile time.
pub const BUILD_DATE: &str = env_or(option_env!("KEYPAD_BUILD_DATE"), "unknown");

/// Build identifier (e.g. a commit hash), `KEYPAD_BUILD_ID` at compile time.
pub const BUILD_ID: &str = env_or(option_env!("KEYPAD_BUILD_ID"), "dev");

/// What GET_INFO reports for this build.
pub const DEVICE_INFO: DeviceInfo = DeviceInfo::new(FIRMWARE_VERSION, BUILD_NUMBER, BUILD_DATE, BUILD_ID);
