//! The single live [`Configuration`] and its power-loss-safe persistence.
//!
//! A save happens in three steps so that a reset at any point leaves an image whose
//! write-complete marker fails validation:
//!
//! 1. marker byte ← [`WRITE_PENDING`]
//! 2. every other byte of the new image
//! 3. marker byte ← [`WRITE_COMPLETE`]

use embedded_storage::Storage;
use keypad_proto::config::{OFFSET_MARKER, WRITE_COMPLETE, WRITE_PENDING};
use keypad_proto::{ConfigError, Configuration, CONFIG_SIZE};

/// Why [`ConfigStore::load`] did not produce a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// The stored image failed validation.
    Invalid(ConfigError),
    /// The storage could not be read.
    Storage,
}

/// Why a save did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// A storage write failed; the stored image is marked incomplete.
    Write,
}

/// Owns the configuration and the storage it is persisted to.
pub struct ConfigStore<S> {
    storage: S,
    config: Configuration,
}

impl<S: Storage> ConfigStore<S> {
    /// Boot path: load the stored image, or install and persist defaults.
    pub fn open(storage: S) -> Self {
        let mut store = Self {
            storage,
            config: Configuration::defaults(),
        };
        match store.load() {
            Ok(()) => {
                info!(
                    "configuration loaded, slot {} brightness {}",
                    store.config.active_slot,
                    store.config.brightness
                );
            }
            Err(e) => {
                warn!("stored configuration rejected ({:?}), writing defaults", e);
                store.config = Configuration::defaults();
                if store.save().is_err() {
                    error!("could not persist defaults");
                }
            }
        }
        store
    }

    /// Read and validate the stored image, replacing the live configuration
    /// on success. On failure the live configuration is unchanged.
    pub fn load(&mut self) -> Result<(), LoadError> {
        let mut image = [0u8; CONFIG_SIZE];
        self.storage
            .read(0, &mut image)
            .map_err(|_| LoadError::Storage)?;
        self.config = Configuration::from_image(&image).map_err(LoadError::Invalid)?;
        Ok(())
    }

    /// Persist the live configuration.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let image = self.config.to_image();
        self.write(OFFSET_MARKER, &[WRITE_PENDING])?;
        self.write(0, &image[..OFFSET_MARKER])?;
        self.write(OFFSET_MARKER + 1, &image[OFFSET_MARKER + 1..])?;
        self.write(OFFSET_MARKER, &[WRITE_COMPLETE])?;
        debug!("configuration saved");
        Ok(())
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<(), StoreError> {
        self.storage
            .write(offset as u32, bytes)
            .map_err(|_| StoreError::Write)
    }

    /// Apply `f` to the configuration, then persist if `persist` is set.
    ///
    /// If persisting fails the configuration is rolled back, so the change
    /// either fully applies or has no effect.
    pub fn update<R>(
        &mut self,
        persist: bool,
        f: impl FnOnce(&mut Configuration) -> R,
    ) -> Result<R, StoreError> {
        let snapshot = self.config;
        let result = f(&mut self.config);
        if persist {
            if let Err(e) = self.save() {
                self.config = snapshot;
                return Err(e);
            }
        }
        Ok(result)
    }

    /// Replace the configuration with factory defaults and persist them.
    pub fn reset_to_defaults(&mut self) -> Result<(), StoreError> {
        self.update(true, |config| *config = Configuration::defaults())
    }

    #[inline]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}
