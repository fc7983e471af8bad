//! Platform-agnostic macro keypad behavior.
//!
//! Everything the firmware does that does not touch a peripheral lives here,
//! behind small traits so it runs unchanged on the device and on the host:
//!
//! - [`store`]: the persistent working configuration ([`ConfigStore`])
//! - [`eeprom`]: a byte-addressed [`Storage`](embedded_storage::Storage) over one flash sector ([`FlashEeprom`])
//! - [`protocol`]: Feature Report command handling ([`ProtocolHandler`])
//! - [`input`]: debouncing, quadrature decoding and long press ([`InputTracker`])
//! - [`action`]: turning actions into HID reports ([`ActionRunner`])
//! - [`led`]: per-button colours ([`LedPresenter`])
//! - [`session`]: the keypad as a whole ([`Keypad`])
//!
//! # Seams
//!
//! | Concern      | Trait                                   |
//! |--------------|-----------------------------------------|
//! | HID output   | [`HidSink`]                             |
//! | LED strip    | [`LedOutput`]                           |
//! | Persistence  | [`embedded_storage::Storage`]           |
//! | Time         | [`embedded_hal_async::delay::DelayNs`]  |
//! | Pins         | [`embedded_hal::digital::InputPin`]     |
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through `defmt` and derive `defmt::Format`
//! - **`log`**: Log through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod action;
pub mod config;
pub mod eeprom;
pub mod hid;
pub mod input;
pub mod led;
pub mod protocol;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_util;

pub use action::{ActionRunner, Phase};
pub use config::DEVICE_INFO;
pub use eeprom::{EepromError, FlashEeprom};
pub use hid::{ConsumerReport, HidReport, HidSink, KeyboardReport, MouseReport, OutputError};
pub use input::{Edge, InputEvents, InputSnapshot, InputTracker, KeypadPins, Rotation};
pub use led::{LedFrame, LedOutput, LedPresenter};
pub use protocol::{ProtocolHandler, Transfer};
pub use session::{Keypad, Mode};
pub use store::{ConfigStore, LoadError, StoreError};
