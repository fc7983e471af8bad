//! Macro keypad firmware for RP2040.
//!
//! Three buttons with WS2812 LEDs and a rotary encoder with a push switch,
//! presented to the host as a USB composite HID device. All behavior lives
//! in [`keypad_core`]; this crate provides the hardware seams:
//!
//! - [`usb`]: composite HID device, [`UsbHidOutput`] ([`HidSink`](keypad_core::HidSink))
//!   and the Feature Report request handler
//! - [`leds`]: [`Ws2812Leds`] ([`LedOutput`](keypad_core::LedOutput)) over a PIO state machine
//! - [`board`]: pin map, USB identity and flash layout
//!
//! Persistence uses [`keypad_core::FlashEeprom`] directly over the
//! blocking `embassy_rp::flash::Flash` driver.
//!
//! # Architecture
//!
//! Two Embassy tasks:
//!
//! - **USB Task**: runs the USB device stack; SET_REPORT frames are signalled
//!   to the keypad task
//! - **Keypad Task**: owns the [`Keypad`](keypad_core::Keypad) session, serves
//!   configuration requests as they arrive and polls the inputs every
//!   [`POLL_INTERVAL_MS`](keypad_core::config::POLL_INTERVAL_MS)
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

pub mod board;
pub mod leds;
pub mod usb;

pub use leds::Ws2812Leds;
pub use usb::{ConfigRequestHandler, UsbHid, UsbHidOutput};
