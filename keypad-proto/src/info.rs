//! GET_INFO payload.

use crate::config::{CONFIG_VERSION, SLOT_COUNT};
use crate::report::Response;
use crate::types::{ActionKind, INPUT_COUNT};

/// Length of the NUL-padded build date field.
pub const BUILD_DATE_LEN: usize = 12;

/// Length of the NUL-padded build id field.
pub const BUILD_ID_LEN: usize = 16;

const OFFSET_VERSION: usize = 3;
const OFFSET_CONFIG_VERSION: usize = 6;
const OFFSET_BUILD_NUMBER: usize = 7;
const OFFSET_CAPABILITIES: usize = 9;
const OFFSET_SLOTS: usize = 10;
const OFFSET_INPUTS: usize = 11;
const OFFSET_ACTION_TYPES: usize = 12;
const OFFSET_BUILD_DATE: usize = 13;
const OFFSET_BUILD_ID: usize = OFFSET_BUILD_DATE + BUILD_DATE_LEN;

/// Feature bits advertised to the host.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities(u8);

impl Capabilities {
    pub const KEYBOARD: Self = Self(0x01);
    pub const MEDIA: Self = Self(0x02);
    pub const MOUSE: Self = Self(0x04);
    pub const SCROLL: Self = Self(0x08);
    pub const HOLD: Self = Self(0x10);
    pub const RGB_LEDS: Self = Self(0x20);
    pub const ENCODER: Self = Self(0x40);
    pub const SLOT_SWITCH: Self = Self(0x80);

    /// Everything this firmware implements.
    pub const ALL: Self = Self(0xFF);

    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// Firmware identity reported by GET_INFO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub config_version: u8,
    pub build_number: u16,
    pub capabilities: Capabilities,
    pub slots: u8,
    pub inputs: u8,
    pub action_types: u8,
    pub build_date: [u8; BUILD_DATE_LEN],
    pub build_id: [u8; BUILD_ID_LEN],
}

/// Copy `s` into a NUL-padded array, truncating at `N` bytes.
#[must_use]
pub const fn padded<const N: usize>(s: &str) -> [u8; N] {
    let bytes = s.as_bytes();
    let mut out = [0u8; N];
    let mut i = 0;
    while i < N && i < bytes.len() {
        out[i] = bytes[i];
        i += 1;
    }
    out
}

fn trim_nul(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    core::str::from_utf8(&bytes[..end]).unwrap_or("")
}

impl DeviceInfo {
    /// Info for this firmware build with the given version and build strings.
    #[must_use]
    pub const fn new(
        version: (u8, u8, u8),
        build_number: u16,
        build_date: &str,
        build_id: &str,
    ) -> Self {
        Self {
            major: version.0,
            minor: version.1,
            patch: version.2,
            config_version: CONFIG_VERSION,
            build_number,
            capabilities: Capabilities::ALL,
            slots: SLOT_COUNT as u8,
            inputs: INPUT_COUNT as u8,
            action_types: ActionKind::COUNT,
            build_date: padded(build_date),
            build_id: padded(build_id),
        }
    }

    /// Fill the payload of a GET_INFO response.
    pub fn write_to(&self, response: &mut Response) {
        response
            .put(OFFSET_VERSION, &[self.major, self.minor, self.patch])
            .put(OFFSET_CONFIG_VERSION, &[self.config_version])
            .put(OFFSET_BUILD_NUMBER, &self.build_number.to_le_bytes())
            .put(OFFSET_CAPABILITIES, &[self.capabilities.raw()])
            .put(OFFSET_SLOTS, &[self.slots, self.inputs, self.action_types])
            .put(OFFSET_BUILD_DATE, &self.build_date)
            .put(OFFSET_BUILD_ID, &self.build_id);
    }

    /// Decode a GET_INFO response payload.
    #[must_use]
    pub fn read_from(response: &Response) -> Self {
        let mut build_date = [0u8; BUILD_DATE_LEN];
        build_date.copy_from_slice(response.bytes(OFFSET_BUILD_DATE, BUILD_DATE_LEN));
        let mut build_id = [0u8; BUILD_ID_LEN];
        build_id.copy_from_slice(response.bytes(OFFSET_BUILD_ID, BUILD_ID_LEN));
        Self {
            major: response.byte(OFFSET_VERSION),
            minor: response.byte(OFFSET_VERSION + 1),
            patch: response.byte(OFFSET_VERSION + 2),
            config_version: response.byte(OFFSET_CONFIG_VERSION),
            build_number: u16::from_le_bytes([
                response.byte(OFFSET_BUILD_NUMBER),
                response.byte(OFFSET_BUILD_NUMBER + 1),
            ]),
            capabilities: Capabilities::from_raw(response.byte(OFFSET_CAPABILITIES)),
            slots: response.byte(OFFSET_SLOTS),
            inputs: response.byte(OFFSET_INPUTS),
            action_types: response.byte(OFFSET_ACTION_TYPES),
            build_date,
            build_id,
        }
    }

    #[must_use]
    pub fn build_date_str(&self) -> &str {
        trim_nul(&self.build_date)
    }

    #[must_use]
    pub fn build_id_str(&self) -> &str {
        trim_nul(&self.build_id)
    }
}
