//! Human-readable action labels, as shown by the host application.
//!
//! ```
//! use keypad_proto::{Action, Modifiers};
//!
//! let mute = Action::key(Modifiers::CTRL | Modifiers::SHIFT, b'm');
//! assert_eq!(format!("{mute}"), "Ctrl+Shift+M");
//! ```

use core::fmt;

use crate::keycode::{special_key_name, MODIFIER_KEY_BASE, RAW_USAGE_OFFSET};
use crate::types::{Action, ActionKind, Modifiers};
use crate::usage::ConsumerUsage;

/// Writes `Ctrl+Shift+...` followed by `sep` when any modifier is set.
fn write_modifiers(f: &mut fmt::Formatter<'_>, modifiers: Modifiers, sep: &str) -> fmt::Result {
    let mut first = true;
    for (flag, name) in [
        (Modifiers::CTRL, "Ctrl"),
        (Modifiers::SHIFT, "Shift"),
        (Modifiers::ALT, "Alt"),
        (Modifiers::GUI, "Gui"),
    ] {
        if modifiers.contains(flag) {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(name)?;
            first = false;
        }
    }
    if !first {
        f.write_str(sep)?;
    }
    Ok(())
}

fn write_key(f: &mut fmt::Formatter<'_>, primary: u8) -> fmt::Result {
    if let Some(name) = special_key_name(primary) {
        return f.write_str(name);
    }
    match primary {
        b'!'..=b'~' => write!(f, "{}", primary.to_ascii_uppercase() as char),
        MODIFIER_KEY_BASE..=0x87 => {
            const NAMES: [&str; 8] = [
                "LCtrl", "LShift", "LAlt", "LGui", "RCtrl", "RShift", "RAlt", "RGui",
            ];
            f.write_str(NAMES[(primary - MODIFIER_KEY_BASE) as usize])
        }
        RAW_USAGE_OFFSET..=0xFF => write!(f, "Key 0x{:02X}", primary - RAW_USAGE_OFFSET),
        _ => write!(f, "0x{primary:02X}"),
    }
}

fn write_mouse_buttons(f: &mut fmt::Formatter<'_>, mask: u8) -> fmt::Result {
    match mask {
        0x01 => f.write_str("Left Click"),
        0x02 => f.write_str("Right Click"),
        0x04 => f.write_str("Middle Click"),
        _ => write!(f, "Click 0x{mask:02X}"),
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.control;
        if control.kind == ActionKind::None {
            return f.write_str("None");
        }
        let sep = if control.kind == ActionKind::Keyboard && self.primary == 0 {
            ""
        } else {
            "+"
        };
        write_modifiers(f, control.modifiers, sep)?;

        match control.kind {
            ActionKind::None => {}
            ActionKind::Keyboard => {
                if self.primary != 0 {
                    write_key(f, self.primary)?;
                } else if control.modifiers.is_empty() {
                    f.write_str("No Key")?;
                }
            }
            ActionKind::Media => match ConsumerUsage::from_code(self.consumer_usage()) {
                Some(usage) => f.write_str(usage.name())?,
                None => write!(f, "Media 0x{:04X}", self.consumer_usage())?,
            },
            ActionKind::Mouse => {
                write_mouse_buttons(f, self.primary)?;
                if self.repeat_count() > 1 {
                    write!(f, " x{}", self.repeat_count())?;
                }
            }
            ActionKind::Scroll => {
                let direction = if self.primary == 0 { "Up" } else { "Down" };
                write!(f, "Scroll {direction}")?;
                if self.repeat_count() > 1 {
                    write!(f, " x{}", self.repeat_count())?;
                }
            }
        }

        if control.hold {
            f.write_str(" [hold]")?;
        }
        Ok(())
    }
}

/// Render the label into a fixed-capacity string.
///
/// Labels longer than the capacity are truncated.
#[cfg(feature = "heapless")]
#[must_use]
pub fn label<const N: usize>(action: &Action) -> heapless::String<N> {
    use core::fmt::Write;

    struct Truncating<'a, const N: usize>(&'a mut heapless::String<N>);

    impl<const N: usize> Write for Truncating<'_, N> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for c in s.chars() {
                if self.0.push(c).is_err() {
                    break;
                }
            }
            Ok(())
        }
    }

    let mut out = heapless::String::new();
    let _ = write!(Truncating(&mut out), "{action}");
    out
}
