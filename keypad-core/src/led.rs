//! Per-button RGB feedback.

use core::future::Future;

use keypad_proto::{Color, Slot, BUTTON_COUNT};
use smart_leds::RGB8;

use crate::hid::OutputError;

/// One colour per button LED.
pub type LedFrame = [RGB8; BUTTON_COUNT];

/// Colour of the selected slot's LED in slot-switch mode.
pub const HIGHLIGHT: Color = Color::White;

const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Full-brightness palette value for a logical colour.
#[must_use]
pub const fn palette(color: Color) -> RGB8 {
    let (r, g, b) = match color {
        Color::Off => (0, 0, 0),
        Color::Red => (100, 0, 0),
        Color::Green => (0, 100, 0),
        Color::Blue => (0, 0, 100),
        Color::Yellow => (100, 80, 0),
        Color::Cyan => (0, 100, 100),
        Color::Magenta => (100, 0, 100),
        Color::White => (100, 100, 100),
    };
    RGB8 { r, g, b }
}

/// Scale each channel by `brightness / 255`.
#[must_use]
pub const fn scale(color: RGB8, brightness: u8) -> RGB8 {
    const fn channel(v: u8, brightness: u8) -> u8 {
        ((v as u16 * brightness as u16) / 255) as u8
    }
    RGB8 {
        r: channel(color.r, brightness),
        g: channel(color.g, brightness),
        b: channel(color.b, brightness),
    }
}

/// Palette lookup for a stored index followed by brightness scaling.
#[must_use]
pub const fn shade(index: u8, brightness: u8) -> RGB8 {
    scale(palette(Color::from_index(index)), brightness)
}

/// Normal mode: idle colour per button, active colour while pressed.
#[must_use]
pub fn render_slot(slot: &Slot, pressed: &[bool; BUTTON_COUNT], brightness: u8) -> LedFrame {
    let mut frame = [OFF; BUTTON_COUNT];
    for ((led, action), &down) in frame.iter_mut().zip(&slot.actions).zip(pressed) {
        let index = if down {
            action.color_active
        } else {
            action.color_idle
        };
        *led = shade(index, brightness);
    }
    frame
}

/// Slot-switch mode: only the LED at the selected slot index is lit.
#[must_use]
pub fn render_selection(selection: u8, brightness: u8) -> LedFrame {
    let mut frame = [OFF; BUTTON_COUNT];
    if let Some(led) = frame.get_mut(selection as usize) {
        *led = scale(palette(HIGHLIGHT), brightness);
    }
    frame
}

/// Async trait for the LED strip driver.
pub trait LedOutput {
    /// Latch a full frame onto the LEDs.
    fn write(&mut self, frame: &LedFrame) -> impl Future<Output = Result<(), OutputError>>;
}

/// Pushes frames to an [`LedOutput`] only when they change.
pub struct LedPresenter<L> {
    output: L,
    last: Option<LedFrame>,
}

impl<L: LedOutput> LedPresenter<L> {
    pub fn new(output: L) -> Self {
        Self { output, last: None }
    }

    /// Flush `frame` if it differs from the last flushed one.
    ///
    /// Returns whether anything was written. A failed write is retried on
    /// the next call.
    pub async fn show(&mut self, frame: LedFrame) -> Result<bool, OutputError> {
        if self.last == Some(frame) {
            return Ok(false);
        }
        self.output.write(&frame).await?;
        self.last = Some(frame);
        Ok(true)
    }

    pub fn output(&self) -> &L {
        &self.output
    }
}
