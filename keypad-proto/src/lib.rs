//! Configuration image and Feature Report protocol for the macro keypad.
//!
//! This crate is everything a device and a host need to agree on:
//!
//! - **Types**: the keypad's data model
//!   - [`Action`] - 8-byte behavior descriptor for one input
//!   - [`Control`] - decoded control byte ([`ActionKind`], [`Modifiers`], hold flag)
//!   - [`Slot`] - five actions, one per [`Input`]
//!   - [`Configuration`] - three slots plus active slot and LED brightness
//!
//! - **Persistence**: the 128-byte configuration image
//!   - [`Configuration::to_image`] / [`Configuration::from_image`]
//!   - [`ConfigError`] - why a stored image was rejected
//!
//! - **Wire protocol**: 64-byte Feature Reports on report id 4
//!   - [`Request`] / [`Response`] - validated frames
//!   - [`Command`] / [`Status`] - command and status codes
//!   - [`DeviceInfo`] - GET_INFO payload
//!
//! - **Presentation**: [`keystroke`] maps a keyboard action's key byte to a
//!   HID usage, and every [`Action`] implements `Display`.
//!
//! # Example
//!
//! ```
//! use keypad_proto::{Action, Configuration, Input};
//!
//! let mut config = Configuration::defaults();
//! *config.slots[1].action_mut(Input::Button3) = Action::media(0x00CD);
//!
//! let image = config.to_image();
//! let restored = Configuration::from_image(&image).unwrap();
//! assert_eq!(restored.slots[1].action(Input::Button3).consumer_usage(), 0x00CD);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`heapless`**: Enable [`label`], rendering an action into a `heapless::String`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod checksum;
pub mod config;
pub mod describe;
pub mod info;
pub mod keycode;
pub mod report;
pub mod types;
pub mod usage;

pub use checksum::{xor_checksum, xor_checksum_skipping};
pub use config::{
    image_checksum, ConfigError, Configuration, CONFIG_SIZE, CONFIG_VERSION, DEFAULT_BRIGHTNESS,
    SLOT_COUNT,
};
#[cfg(feature = "heapless")]
pub use describe::label;
pub use info::{Capabilities, DeviceInfo};
pub use keycode::{keystroke, KeyStroke};
pub use report::{Command, Frame, FrameError, Request, Response, Status, REPORT_LEN};
pub use types::{
    Action, ActionKind, Color, Control, Input, Modifiers, Slot, ACTION_SIZE, BUTTON_COUNT,
    INPUT_COUNT,
};
pub use usage::ConsumerUsage;
