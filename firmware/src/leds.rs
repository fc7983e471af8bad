//! WS2812 button LEDs driven by a PIO state machine.

use embassy_rp::pio::Instance;
use embassy_rp::pio_programs::ws2812::PioWs2812;
use keypad_core::{LedFrame, LedOutput, OutputError};

use crate::board::LED_COUNT;

/// The three button LEDs.
pub struct Ws2812Leds<'d, P: Instance, const S: usize> {
    strip: PioWs2812<'d, P, S, LED_COUNT>,
}

impl<'d, P: Instance, const S: usize> Ws2812Leds<'d, P, S> {
    pub fn new(strip: PioWs2812<'d, P, S, LED_COUNT>) -> Self {
        Self { strip }
    }
}

impl<'d, P: Instance, const S: usize> LedOutput for Ws2812Leds<'d, P, S> {
    async fn write(&mut self, frame: &LedFrame) -> Result<(), OutputError> {
        // DMA into the PIO FIFO cannot fail.
        self.strip.write(frame).await;
        Ok(())
    }
}
