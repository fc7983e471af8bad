//! The persisted 128-byte configuration image.
//!
//! # Layout
//!
//! ```text
//! Offset  Size  Field
//! 0       2     magic "KP"
//! 2       1     format version
//! 3       1     active slot (0-2)
//! 4       1     checksum: XOR of all other 127 bytes
//! 5       1     write-complete marker (0xA5 when valid)
//! 6       1     LED brightness (0-255)
//! 7       1     unused
//! 8       120   3 slots x 5 actions x 8 bytes
//! ```

use crate::checksum::xor_checksum_skipping;
use crate::types::{Action, Color, Input, Modifiers, Slot, ACTION_SIZE, INPUT_COUNT};
use crate::usage::ConsumerUsage;

/// Total image size in bytes.
pub const CONFIG_SIZE: usize = 128;

/// Number of slots in a configuration.
pub const SLOT_COUNT: usize = 3;

/// Size of the action block (all slots, all inputs).
pub const ACTION_BLOCK_SIZE: usize = SLOT_COUNT * INPUT_COUNT * ACTION_SIZE;

/// Magic bytes at offset 0.
pub const CONFIG_MAGIC: [u8; 2] = *b"KP";

/// The only image format this firmware reads and writes.
pub const CONFIG_VERSION: u8 = 0x02;

/// Marker value written last by a completed save.
pub const WRITE_COMPLETE: u8 = 0xA5;

/// Marker value written first by a save in progress.
pub const WRITE_PENDING: u8 = 0x00;

/// Brightness used by the factory defaults (about 4%).
pub const DEFAULT_BRIGHTNESS: u8 = 10;

pub const OFFSET_MAGIC: usize = 0;
pub const OFFSET_VERSION: usize = 2;
pub const OFFSET_ACTIVE_SLOT: usize = 3;
pub const OFFSET_CHECKSUM: usize = 4;
pub const OFFSET_MARKER: usize = 5;
pub const OFFSET_BRIGHTNESS: usize = 6;
pub const OFFSET_ACTIONS: usize = 8;

/// Why a stored image was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The write-complete marker is missing: the last save was interrupted.
    Interrupted,
    /// Magic bytes do not match.
    BadMagic,
    /// Image was written by an incompatible format version.
    UnsupportedVersion(u8),
    /// Active slot index out of range.
    InvalidActiveSlot(u8),
    /// Stored checksum does not match the contents.
    ChecksumMismatch { stored: u8, computed: u8 },
}

/// Checksum of a raw image, excluding the checksum byte itself.
#[inline]
#[must_use]
pub fn image_checksum(image: &[u8; CONFIG_SIZE]) -> u8 {
    xor_checksum_skipping(image, OFFSET_CHECKSUM)
}

/// The working configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration {
    /// Index of the slot driving the inputs.
    pub active_slot: u8,
    /// Global LED brightness, 0 = off, 255 = full palette value.
    pub brightness: u8,
    pub slots: [Slot; SLOT_COUNT],
}

impl Default for Configuration {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Configuration {
    /// Factory configuration: three named presets.
    ///
    /// | Slot | Preset | Button 1      | Button 2     | Button 3     | Encoder         |
    /// |------|--------|---------------|--------------|--------------|-----------------|
    /// | 0    | Media  | Play/Pause    | Prev track   | Next track   | Volume up/down  |
    /// | 1    | Teams  | Ctrl+Shift+M  | Ctrl+Shift+O | Ctrl+Shift+H | Volume up/down  |
    /// | 2    | Edit   | Ctrl+C        | Ctrl+V       | Ctrl+Z       | Scroll down/up  |
    #[must_use]
    pub const fn defaults() -> Self {
        let ctrl_shift = Modifiers::CTRL.union(Modifiers::SHIFT);

        let media = Slot::new([
            Action::media(ConsumerUsage::PlayPause as u16).with_colors(Color::Green, Color::White),
            Action::media(ConsumerUsage::PrevTrack as u16).with_colors(Color::Green, Color::White),
            Action::media(ConsumerUsage::NextTrack as u16).with_colors(Color::Green, Color::White),
            Action::media(ConsumerUsage::VolumeUp as u16),
            Action::media(ConsumerUsage::VolumeDown as u16),
        ]);

        let teams = Slot::new([
            Action::key(ctrl_shift, b'm').with_colors(Color::Blue, Color::Red),
            Action::key(ctrl_shift, b'o').with_colors(Color::Blue, Color::Cyan),
            Action::key(ctrl_shift, b'h').with_colors(Color::Red, Color::White),
            Action::media(ConsumerUsage::VolumeUp as u16),
            Action::media(ConsumerUsage::VolumeDown as u16),
        ]);

        let edit = Slot::new([
            Action::key(Modifiers::CTRL, b'c').with_colors(Color::Yellow, Color::White),
            Action::key(Modifiers::CTRL, b'v').with_colors(Color::Yellow, Color::White),
            Action::key(Modifiers::CTRL, b'z').with_colors(Color::Magenta, Color::White),
            Action::scroll(false, 3),
            Action::scroll(true, 3),
        ]);

        Self {
            active_slot: 0,
            brightness: DEFAULT_BRIGHTNESS,
            slots: [media, teams, edit],
        }
    }

    /// Slot currently driving the inputs.
    #[inline]
    #[must_use]
    pub fn active(&self) -> &Slot {
        &self.slots[self.active_slot as usize % SLOT_COUNT]
    }

    #[must_use]
    pub fn action(&self, slot: usize, input: Input) -> Option<&Action> {
        self.slots.get(slot).map(|s| s.action(input))
    }

    /// Serialize the action block (slot-major, input-minor).
    #[must_use]
    pub fn action_block(&self) -> [u8; ACTION_BLOCK_SIZE] {
        let mut block = [0u8; ACTION_BLOCK_SIZE];
        for (chunk, action) in block
            .chunks_exact_mut(ACTION_SIZE)
            .zip(self.slots.iter().flat_map(|s| s.actions.iter()))
        {
            chunk.copy_from_slice(&action.to_bytes());
        }
        block
    }

    /// Replace every action from a serialized action block.
    pub fn set_action_block(&mut self, block: &[u8; ACTION_BLOCK_SIZE]) {
        for (chunk, action) in block
            .chunks_exact(ACTION_SIZE)
            .zip(self.slots.iter_mut().flat_map(|s| s.actions.iter_mut()))
        {
            let mut raw = [0u8; ACTION_SIZE];
            raw.copy_from_slice(chunk);
            *action = Action::from_bytes(&raw);
        }
    }

    /// Encode into a complete, valid image (marker set, checksum computed).
    #[must_use]
    pub fn to_image(&self) -> [u8; CONFIG_SIZE] {
        let mut image = [0u8; CONFIG_SIZE];
        image[OFFSET_MAGIC..OFFSET_MAGIC + 2].copy_from_slice(&CONFIG_MAGIC);
        image[OFFSET_VERSION] = CONFIG_VERSION;
        image[OFFSET_ACTIVE_SLOT] = self.active_slot;
        image[OFFSET_MARKER] = WRITE_COMPLETE;
        image[OFFSET_BRIGHTNESS] = self.brightness;
        image[OFFSET_ACTIONS..].copy_from_slice(&self.action_block());
        image[OFFSET_CHECKSUM] = image_checksum(&image);
        image
    }

    /// Validate and decode an image.
    ///
    /// The marker is checked first: an interrupted save may leave any other
    /// field half-written, so nothing else is trusted until it passes.
    pub fn from_image(image: &[u8; CONFIG_SIZE]) -> Result<Self, ConfigError> {
        if image[OFFSET_MARKER] != WRITE_COMPLETE {
            return Err(ConfigError::Interrupted);
        }
        if image[OFFSET_MAGIC..OFFSET_MAGIC + 2] != CONFIG_MAGIC {
            return Err(ConfigError::BadMagic);
        }
        if image[OFFSET_VERSION] != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(image[OFFSET_VERSION]));
        }
        let active_slot = image[OFFSET_ACTIVE_SLOT];
        if active_slot as usize >= SLOT_COUNT {
            return Err(ConfigError::InvalidActiveSlot(active_slot));
        }
        let stored = image[OFFSET_CHECKSUM];
        let computed = image_checksum(image);
        if stored != computed {
            return Err(ConfigError::ChecksumMismatch { stored, computed });
        }

        let mut block = [0u8; ACTION_BLOCK_SIZE];
        block.copy_from_slice(&image[OFFSET_ACTIONS..]);

        let mut config = Self {
            active_slot,
            brightness: image[OFFSET_BRIGHTNESS],
            slots: [Slot::new([Action::NONE; INPUT_COUNT]); SLOT_COUNT],
        };
        config.set_action_block(&block);
        Ok(config)
    }
}
