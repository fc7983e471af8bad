//! Input state machines: debounced buttons, quadrature decoding, long press.
//!
//! Everything here is driven by [`InputSnapshot`]s taken once per poll cycle
//! plus the current time, so it runs the same on the device and in tests.

use embedded_hal::digital::InputPin;
use keypad_proto::BUTTON_COUNT;

use crate::config::{DEBOUNCE_MS, ENCODER_COUNTS_PER_DETENT, LONG_PRESS_MS};

/// Logical pin levels for one poll cycle. `true` means pressed for switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSnapshot {
    pub buttons: [bool; BUTTON_COUNT],
    pub encoder_a: bool,
    pub encoder_b: bool,
    pub encoder_switch: bool,
}

/// A debounced level change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Pressed,
    Released,
}

/// Debounced push button.
#[derive(Clone, Copy, Debug, Default)]
pub struct Button {
    pressed: bool,
    last_change_ms: Option<u64>,
}

impl Button {
    pub const fn new() -> Self {
        Self {
            pressed: false,
            last_change_ms: None,
        }
    }

    /// Feed the current level. A change is accepted only once
    /// [`DEBOUNCE_MS`] have passed since the previous accepted change.
    pub fn update(&mut self, pressed: bool, now_ms: u64) -> Option<Edge> {
        if pressed == self.pressed {
            return None;
        }
        if let Some(last) = self.last_change_ms {
            if now_ms.saturating_sub(last) < DEBOUNCE_MS {
                return None;
            }
        }
        self.pressed = pressed;
        self.last_change_ms = Some(now_ms);
        Some(if pressed { Edge::Pressed } else { Edge::Released })
    }

    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// One encoder detent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// Quadrature step for each (previous, new) state pair, indexed by
/// `previous << 2 | new`. Invalid double steps count as 0.
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Full-step quadrature decoder.
///
/// The 2-bit state is `A << 1 | B`; clockwise runs 00 → 10 → 11 → 01 → 00.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuadratureDecoder {
    state: u8,
    count: i8,
}

impl QuadratureDecoder {
    pub const fn new(a: bool, b: bool) -> Self {
        Self {
            state: Self::encode(a, b),
            count: 0,
        }
    }

    const fn encode(a: bool, b: bool) -> u8 {
        ((a as u8) << 1) | b as u8
    }

    /// Feed the current A/B levels; returns a rotation every full detent.
    pub fn update(&mut self, a: bool, b: bool) -> Option<Rotation> {
        let new = Self::encode(a, b);
        let step = TRANSITIONS[usize::from((self.state << 2) | new)];
        self.state = new;
        self.count += step;

        if self.count >= ENCODER_COUNTS_PER_DETENT {
            self.count = 0;
            Some(Rotation::Clockwise)
        } else if self.count <= -ENCODER_COUNTS_PER_DETENT {
            self.count = 0;
            Some(Rotation::CounterClockwise)
        } else {
            None
        }
    }

    /// Net counts since the last detent.
    #[inline]
    pub fn count(&self) -> i8 {
        self.count
    }
}

/// Fires once per press when a switch is held longer than [`LONG_PRESS_MS`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LongPress {
    pressed_at: Option<u64>,
    fired: bool,
}

impl LongPress {
    pub const fn new() -> Self {
        Self {
            pressed_at: None,
            fired: false,
        }
    }

    pub fn update(&mut self, pressed: bool, now_ms: u64) -> bool {
        if !pressed {
            self.pressed_at = None;
            self.fired = false;
            return false;
        }
        let since = *self.pressed_at.get_or_insert(now_ms);
        if !self.fired && now_ms.saturating_sub(since) > LONG_PRESS_MS {
            self.fired = true;
            return true;
        }
        false
    }
}

/// Everything that happened during one poll cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputEvents {
    pub buttons: [Option<Edge>; BUTTON_COUNT],
    pub rotation: Option<Rotation>,
    pub long_press: bool,
}

/// All input state machines of the keypad.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputTracker {
    buttons: [Button; BUTTON_COUNT],
    encoder: QuadratureDecoder,
    switch: Button,
    long_press: LongPress,
}

impl InputTracker {
    /// Start tracking from the levels seen at boot.
    pub fn new(initial: &InputSnapshot) -> Self {
        Self {
            encoder: QuadratureDecoder::new(initial.encoder_a, initial.encoder_b),
            ..Self::default()
        }
    }

    pub fn update(&mut self, snapshot: &InputSnapshot, now_ms: u64) -> InputEvents {
        let mut events = InputEvents::default();
        for ((button, &level), edge) in self
            .buttons
            .iter_mut()
            .zip(&snapshot.buttons)
            .zip(&mut events.buttons)
        {
            *edge = button.update(level, now_ms);
        }
        events.rotation = self.encoder.update(snapshot.encoder_a, snapshot.encoder_b);
        self.switch.update(snapshot.encoder_switch, now_ms);
        events.long_press = self.long_press.update(self.switch.is_pressed(), now_ms);
        events
    }

    pub fn is_pressed(&self, button: usize) -> bool {
        self.buttons.get(button).is_some_and(Button::is_pressed)
    }
}

/// The keypad's GPIO inputs. Switches are active-low with pull-ups.
pub struct KeypadPins<P> {
    pub buttons: [P; BUTTON_COUNT],
    pub encoder_a: P,
    pub encoder_b: P,
    pub encoder_switch: P,
}

impl<P: InputPin> KeypadPins<P> {
    /// Read every pin. A pin that fails to read counts as released.
    pub fn sample(&mut self) -> InputSnapshot {
        let mut snapshot = InputSnapshot::default();
        for (pin, pressed) in self.buttons.iter_mut().zip(&mut snapshot.buttons) {
            *pressed = pin.is_low().unwrap_or(false);
        }
        snapshot.encoder_a = self.encoder_a.is_high().unwrap_or(false);
        snapshot.encoder_b = self.encoder_b.is_high().unwrap_or(false);
        snapshot.encoder_switch = self.encoder_switch.is_low().unwrap_or(false);
        snapshot
    }
}
