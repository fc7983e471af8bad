//! Core keypad types: Modifiers, ActionKind, Control, Action, Input, Slot, Color.

use core::ops::{BitOr, BitOrAssign};

/// Size of one packed [`Action`] record in bytes.
pub const ACTION_SIZE: usize = 8;

/// Number of configurable inputs per slot.
pub const INPUT_COUNT: usize = 5;

/// Number of physical buttons (the first three inputs).
pub const BUTTON_COUNT: usize = 3;

/// Modifier keys applied around an action.
///
/// Stored in the high nibble of the control byte. The nibble order matches
/// the left-hand modifiers of a USB boot keyboard report, so
/// [`Modifiers::hid_bits`] is a plain shift.
///
/// # Example
///
/// ```
/// use keypad_proto::Modifiers;
///
/// let mods = Modifiers::CTRL | Modifiers::SHIFT;
/// assert!(mods.contains(Modifiers::CTRL));
/// assert_eq!(mods.hid_bits(), 0x03);
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modifiers(u8);

impl Modifiers {
    pub const CTRL: Self = Self(0x10);
    pub const SHIFT: Self = Self(0x20);
    pub const ALT: Self = Self(0x40);
    pub const GUI: Self = Self(0x80);

    /// No modifiers.
    pub const NONE: Self = Self(0);

    const MASK: u8 = 0xF0;

    /// Build from a raw control byte, keeping only the modifier nibble.
    #[inline]
    #[must_use]
    pub const fn from_control(control: u8) -> Self {
        Self(control & Self::MASK)
    }

    /// Check if the given modifier(s) are set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Const-context equivalent of `|`.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Modifiers) -> Self {
        Self(self.0 | other.0)
    }

    /// Modifier bits in USB HID keyboard report order (bit 0 = Left Ctrl).
    #[inline]
    #[must_use]
    pub const fn hid_bits(self) -> u8 {
        self.0 >> 4
    }

    /// Raw high-nibble value as stored in the control byte.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl BitOr for Modifiers {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// What an action emits.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ActionKind {
    #[default]
    None = 0,
    Keyboard = 1,
    Media = 2,
    Mouse = 3,
    Scroll = 4,
}

impl ActionKind {
    /// Number of defined action kinds.
    pub const COUNT: u8 = 5;

    /// Decode the low three bits of a control byte.
    ///
    /// Values outside the defined range decode to [`ActionKind::None`].
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            1 => ActionKind::Keyboard,
            2 => ActionKind::Media,
            3 => ActionKind::Mouse,
            4 => ActionKind::Scroll,
            _ => ActionKind::None,
        }
    }
}

/// Decoded control byte.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Control {
    pub kind: ActionKind,
    pub modifiers: Modifiers,
    /// Effects start on press and end on the paired release.
    pub hold: bool,
}

impl Control {
    const HOLD_BIT: u8 = 0x08;

    #[must_use]
    pub const fn new(kind: ActionKind, modifiers: Modifiers, hold: bool) -> Self {
        Self {
            kind,
            modifiers,
            hold,
        }
    }

    #[must_use]
    pub const fn unpack(byte: u8) -> Self {
        Self {
            kind: ActionKind::from_bits(byte),
            modifiers: Modifiers::from_control(byte),
            hold: byte & Self::HOLD_BIT != 0,
        }
    }

    #[must_use]
    pub const fn pack(self) -> u8 {
        let hold = if self.hold { Self::HOLD_BIT } else { 0 };
        self.modifiers.raw() | hold | self.kind as u8
    }
}

/// One input's behavior descriptor.
///
/// The meaning of `primary` and `secondary` depends on the kind:
///
/// | Kind     | primary                 | secondary               |
/// |----------|-------------------------|-------------------------|
/// | Keyboard | ASCII / special key     | unused                  |
/// | Media    | consumer code low byte  | consumer code high byte |
/// | Mouse    | button mask             | click count             |
/// | Scroll   | 0 = up, otherwise down  | lines                   |
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Action {
    pub control: Control,
    pub primary: u8,
    pub secondary: u8,
    /// Palette index shown while the input is idle.
    pub color_idle: u8,
    /// Palette index shown while the input is pressed.
    pub color_active: u8,
}

impl Action {
    /// An action that does nothing and keeps its LED off.
    pub const NONE: Self = Self {
        control: Control::new(ActionKind::None, Modifiers::NONE, false),
        primary: 0,
        secondary: 0,
        color_idle: 0,
        color_active: 0,
    };

    /// Keyboard shortcut: `modifiers` + `key`.
    #[must_use]
    pub const fn key(modifiers: Modifiers, key: u8) -> Self {
        Self {
            control: Control::new(ActionKind::Keyboard, modifiers, false),
            primary: key,
            ..Self::NONE
        }
    }

    /// Consumer-control (media) key.
    #[must_use]
    pub const fn media(usage: u16) -> Self {
        let bytes = usage.to_le_bytes();
        Self {
            control: Control::new(ActionKind::Media, Modifiers::NONE, false),
            primary: bytes[0],
            secondary: bytes[1],
            ..Self::NONE
        }
    }

    /// Mouse click(s) with the given button mask.
    #[must_use]
    pub const fn click(buttons: u8, count: u8) -> Self {
        Self {
            control: Control::new(ActionKind::Mouse, Modifiers::NONE, false),
            primary: buttons,
            secondary: count,
            ..Self::NONE
        }
    }

    /// Scroll wheel ticks; `up` sends positive wheel steps.
    #[must_use]
    pub const fn scroll(up: bool, lines: u8) -> Self {
        Self {
            control: Control::new(ActionKind::Scroll, Modifiers::NONE, false),
            primary: if up { 0 } else { 1 },
            secondary: lines,
            ..Self::NONE
        }
    }

    #[must_use]
    pub const fn with_colors(mut self, idle: Color, active: Color) -> Self {
        self.color_idle = idle as u8;
        self.color_active = active as u8;
        self
    }

    #[must_use]
    pub const fn with_hold(mut self) -> Self {
        self.control.hold = true;
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        self.control.kind
    }

    /// 16-bit consumer usage for media actions.
    #[must_use]
    pub const fn consumer_usage(&self) -> u16 {
        u16::from_le_bytes([self.primary, self.secondary])
    }

    /// Click count or scroll lines, never zero.
    #[must_use]
    pub const fn repeat_count(&self) -> u8 {
        if self.secondary == 0 {
            1
        } else {
            self.secondary
        }
    }

    /// Encode into the 8-byte storage/wire record.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; ACTION_SIZE] {
        [
            self.control.pack(),
            self.primary,
            self.secondary,
            self.color_idle,
            self.color_active,
            0,
            0,
            0,
        ]
    }

    /// Decode an 8-byte record.
    ///
    /// Decoding normalises: reserved bytes 5..8 are dropped and an unknown
    /// kind (5..=7) becomes [`ActionKind::None`] with its hold and modifier
    /// bits kept. [`Action::to_bytes`] of the result can therefore differ
    /// from the stored record.
    #[must_use]
    pub const fn from_bytes(bytes: &[u8; ACTION_SIZE]) -> Self {
        Self {
            control: Control::unpack(bytes[0]),
            primary: bytes[1],
            secondary: bytes[2],
            color_idle: bytes[3],
            color_active: bytes[4],
        }
    }
}

/// Input index within a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Input {
    Button1 = 0,
    Button2 = 1,
    Button3 = 2,
    EncoderCw = 3,
    EncoderCcw = 4,
}

impl Input {
    pub const BUTTONS: [Input; BUTTON_COUNT] = [Input::Button1, Input::Button2, Input::Button3];

    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Input::Button1),
            1 => Some(Input::Button2),
            2 => Some(Input::Button3),
            3 => Some(Input::EncoderCw),
            4 => Some(Input::EncoderCcw),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A bundle of five input-to-action mappings.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slot {
    pub actions: [Action; INPUT_COUNT],
}

impl Slot {
    #[must_use]
    pub const fn new(actions: [Action; INPUT_COUNT]) -> Self {
        Self { actions }
    }

    #[inline]
    #[must_use]
    pub const fn action(&self, input: Input) -> &Action {
        &self.actions[input.index()]
    }

    #[inline]
    pub fn action_mut(&mut self, input: Input) -> &mut Action {
        &mut self.actions[input.index()]
    }
}

/// Logical LED colour (palette index).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Color {
    #[default]
    Off = 0,
    Red = 1,
    Green = 2,
    Blue = 3,
    Yellow = 4,
    Cyan = 5,
    Magenta = 6,
    White = 7,
}

impl Color {
    /// Map a stored palette index; anything out of range is [`Color::Off`].
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index {
            1 => Color::Red,
            2 => Color::Green,
            3 => Color::Blue,
            4 => Color::Yellow,
            5 => Color::Cyan,
            6 => Color::Magenta,
            7 => Color::White,
            _ => Color::Off,
        }
    }
}
