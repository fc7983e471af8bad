//! Turns an [`Action`] into HID reports.

use embedded_hal_async::delay::DelayNs;
use keypad_proto::{keystroke, Action, ActionKind};

use crate::config::{CLICK_GAP_MS, CLICK_HOLD_MS, SCROLL_TICK_GAP_MS};
use crate::hid::{ConsumerReport, HidReport, HidSink, KeyboardReport, MouseReport, OutputError};

/// Which half of an input's press/release cycle is being executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Press,
    Release,
}

/// Executes actions against a HID sink.
///
/// Non-hold actions do all their work on [`Phase::Press`]. Hold actions
/// press on [`Phase::Press`] and release on the paired [`Phase::Release`].
///
/// The runner owns the keyboard and mouse state the host sees, so held
/// keys and buttons from different inputs combine into one report. A
/// non-hold keystroke releases every key, a hold release only its own.
pub struct ActionRunner<H, D> {
    hid: H,
    delay: D,
    keys: KeyboardReport,
    buttons: u8,
}

impl<H: HidSink, D: DelayNs> ActionRunner<H, D> {
    pub fn new(hid: H, delay: D) -> Self {
        Self {
            hid,
            delay,
            keys: KeyboardReport::released(),
            buttons: 0,
        }
    }

    pub async fn execute(&mut self, action: &Action, phase: Phase) -> Result<(), OutputError> {
        let hold = action.control.hold;
        if phase == Phase::Release && !hold {
            return Ok(());
        }
        let modifiers = action.control.modifiers.hid_bits();

        match action.kind() {
            ActionKind::None => Ok(()),
            ActionKind::Keyboard => self.keyboard(action.primary, modifiers, hold, phase).await,
            ActionKind::Media => {
                self.media(action.consumer_usage(), modifiers, hold, phase)
                    .await
            }
            ActionKind::Mouse => {
                self.mouse(action.primary, action.repeat_count(), modifiers, hold, phase)
                    .await
            }
            ActionKind::Scroll => {
                let direction = if action.primary == 0 { 1 } else { -1 };
                self.scroll(direction, action.repeat_count(), modifiers, hold, phase)
                    .await
            }
        }
    }

    async fn keyboard(
        &mut self,
        primary: u8,
        modifiers: u8,
        hold: bool,
        phase: Phase,
    ) -> Result<(), OutputError> {
        let stroke = keystroke(primary);
        if phase == Phase::Release {
            let mut mask = modifiers;
            if let Some(stroke) = stroke {
                mask |= stroke.modifiers;
                self.keys.release(stroke.usage);
            }
            self.keys.modifier &= !mask;
            return self.send_keys().await;
        }
        self.press_modifiers(modifiers).await?;
        if let Some(stroke) = stroke {
            self.keys.modifier |= stroke.modifiers;
            if !self.keys.press(stroke.usage) {
                warn!("keyboard report full, dropping usage {}", stroke.usage);
            }
            self.send_keys().await?;
        }
        if !hold {
            self.keys = KeyboardReport::released();
            self.send_keys().await?;
        }
        Ok(())
    }

    async fn media(
        &mut self,
        usage: u16,
        modifiers: u8,
        hold: bool,
        phase: Phase,
    ) -> Result<(), OutputError> {
        if phase == Phase::Press {
            self.press_modifiers(modifiers).await?;
            self.send(HidReport::Consumer(ConsumerReport { usage }))
                .await?;
            if hold {
                return Ok(());
            }
        }
        self.send(HidReport::Consumer(ConsumerReport { usage: 0 }))
            .await?;
        self.release_modifiers(modifiers).await
    }

    async fn mouse(
        &mut self,
        buttons: u8,
        clicks: u8,
        modifiers: u8,
        hold: bool,
        phase: Phase,
    ) -> Result<(), OutputError> {
        match (phase, hold) {
            (Phase::Press, true) => {
                self.press_modifiers(modifiers).await?;
                self.buttons |= buttons;
                self.send_buttons(self.buttons).await
            }
            (Phase::Release, _) => {
                self.buttons &= !buttons;
                self.send_buttons(self.buttons).await?;
                self.release_modifiers(modifiers).await
            }
            (Phase::Press, false) => {
                self.press_modifiers(modifiers).await?;
                for click in 0..clicks {
                    if click > 0 {
                        self.delay.delay_ms(CLICK_GAP_MS).await;
                    }
                    self.send_buttons(self.buttons | buttons).await?;
                    self.delay.delay_ms(CLICK_HOLD_MS).await;
                    self.send_buttons(self.buttons).await?;
                }
                self.release_modifiers(modifiers).await
            }
        }
    }

    async fn scroll(
        &mut self,
        direction: i8,
        ticks: u8,
        modifiers: u8,
        hold: bool,
        phase: Phase,
    ) -> Result<(), OutputError> {
        if phase == Phase::Release {
            return self.release_modifiers(modifiers).await;
        }
        self.press_modifiers(modifiers).await?;
        let ticks = if hold { 1 } else { ticks };
        let report = MouseReport {
            wheel: direction,
            ..MouseReport::buttons(self.buttons)
        };
        for tick in 0..ticks {
            if tick > 0 {
                self.delay.delay_ms(SCROLL_TICK_GAP_MS).await;
            }
            self.send(HidReport::Mouse(report)).await?;
        }
        if hold {
            return Ok(());
        }
        self.release_modifiers(modifiers).await
    }

    async fn press_modifiers(&mut self, modifiers: u8) -> Result<(), OutputError> {
        if modifiers == 0 {
            return Ok(());
        }
        self.keys.modifier |= modifiers;
        self.send_keys().await
    }

    async fn release_modifiers(&mut self, modifiers: u8) -> Result<(), OutputError> {
        if modifiers == 0 {
            return Ok(());
        }
        self.keys.modifier &= !modifiers;
        self.send_keys().await
    }

    async fn send_keys(&mut self) -> Result<(), OutputError> {
        self.send(HidReport::Keyboard(self.keys)).await
    }

    async fn send_buttons(&mut self, buttons: u8) -> Result<(), OutputError> {
        self.send(HidReport::Mouse(MouseReport::buttons(buttons)))
            .await
    }

    async fn send(&mut self, report: HidReport) -> Result<(), OutputError> {
        trace!("hid report {:?}", report);
        self.hid.send(&report).await
    }

    pub fn hid(&self) -> &H {
        &self.hid
    }
}
