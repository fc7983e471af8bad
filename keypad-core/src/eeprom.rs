//! Byte-addressable storage for the configuration record on top of NOR flash.
//!
//! Flash can only be erased a sector at a time, so the record is mirrored in
//! RAM. Every write patches the mirror, erases the sector and programs the
//! whole record back. An erase interrupted by a reset leaves `0xFF` in the
//! marker byte, which fails validation on the next boot.

use embedded_storage::nor_flash::NorFlash;
use embedded_storage::{ReadStorage, Storage};
use keypad_proto::CONFIG_SIZE;

/// Error type for [`FlashEeprom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError<E> {
    /// Access beyond the end of the record.
    OutOfBounds,
    /// The underlying flash reported an error.
    Flash(E),
}

/// EEPROM emulation over one flash sector.
pub struct FlashEeprom<F> {
    flash: F,
    /// Start of the sector, relative to the flash base.
    offset: u32,
    shadow: [u8; CONFIG_SIZE],
}

impl<F: NorFlash> FlashEeprom<F> {
    /// Wrap `flash`, using the sector starting at `offset`.
    ///
    /// `offset` must be aligned to `F::ERASE_SIZE`.
    pub fn new(mut flash: F, offset: u32) -> Result<Self, EepromError<F::Error>> {
        if offset as usize % F::ERASE_SIZE != 0 {
            return Err(EepromError::OutOfBounds);
        }
        let mut shadow = [0u8; CONFIG_SIZE];
        flash.read(offset, &mut shadow).map_err(EepromError::Flash)?;
        Ok(Self {
            flash,
            offset,
            shadow,
        })
    }

    fn commit(&mut self) -> Result<(), EepromError<F::Error>> {
        let end = self.offset + F::ERASE_SIZE as u32;
        self.flash
            .erase(self.offset, end)
            .map_err(EepromError::Flash)?;
        self.flash
            .write(self.offset, &self.shadow)
            .map_err(EepromError::Flash)
    }

    pub fn into_inner(self) -> F {
        self.flash
    }
}

fn range(offset: u32, len: usize) -> Option<core::ops::Range<usize>> {
    let start = offset as usize;
    let end = start.checked_add(len)?;
    (end <= CONFIG_SIZE).then_some(start..end)
}

impl<F: NorFlash> ReadStorage for FlashEeprom<F> {
    type Error = EepromError<F::Error>;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = range(offset, bytes.len()).ok_or(EepromError::OutOfBounds)?;
        bytes.copy_from_slice(&self.shadow[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        CONFIG_SIZE
    }
}

impl<F: NorFlash> Storage for FlashEeprom<F> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let range = range(offset, bytes.len()).ok_or(EepromError::OutOfBounds)?;
        if self.shadow[range.clone()] == *bytes {
            return Ok(());
        }
        self.shadow[range].copy_from_slice(bytes);
        self.commit()
    }
}
