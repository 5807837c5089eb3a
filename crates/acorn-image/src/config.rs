//! Image build configuration

use crate::error::{ImageError, ImageResult};
use crate::layout::{Address, SEGMENT_RECORD_BYTES, WORD_SIZE};

/// Base address and size for one segment.
#[derive(Debug, Clone, Copy)]
pub struct SegmentExtent {
    /// Base address of the segment.
    pub base: Address,
    /// Size of the segment in bytes.
    pub size: u32,
}

impl SegmentExtent {
    /// First address past the segment.
    pub fn end(&self) -> Address {
        self.base + self.size
    }

    fn disjoint(&self, other: &SegmentExtent) -> bool {
        self.end() <= other.base || other.end() <= self.base
    }
}

/// Configuration for one image-generation run.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// ROM extent.
    pub rom: SegmentExtent,
    /// EEPROM extent.
    pub eeprom: SegmentExtent,
    /// RAM extent.
    pub ram: SegmentExtent,
    /// Emit multi-byte values big-endian.
    pub big_endian: bool,
    /// Treat ROM as collectible and audit it after the build.
    pub collect_rom: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            rom: SegmentExtent {
                base: 0,
                size: 128 * 1024,
            },
            eeprom: SegmentExtent {
                base: 128 * 1024,
                size: 32 * 1024,
            },
            ram: SegmentExtent {
                base: 160 * 1024,
                size: 32 * 1024,
            },
            big_endian: false,
            collect_rom: false,
        }
    }
}

impl ImageConfig {
    /// Validate segment geometry.
    ///
    /// Segments must be word-aligned, disjoint, and large enough to hold
    /// their own records plus at least one allocatable word.
    pub fn validate(&self) -> ImageResult<()> {
        for (name, extent) in [
            ("ROM", &self.rom),
            ("EEPROM", &self.eeprom),
            ("RAM", &self.ram),
        ] {
            if extent.base % WORD_SIZE != 0 || extent.size % WORD_SIZE != 0 {
                return Err(ImageError::BadConfig(format!(
                    "{name} extent is not word-aligned"
                )));
            }
            if extent.size <= SEGMENT_RECORD_BYTES {
                return Err(ImageError::BadConfig(format!(
                    "{name} segment is too small for its records"
                )));
            }
            if extent.base.checked_add(extent.size).is_none() {
                return Err(ImageError::BadConfig(format!(
                    "{name} segment wraps the address space"
                )));
            }
        }
        if !self.rom.disjoint(&self.eeprom)
            || !self.rom.disjoint(&self.ram)
            || !self.eeprom.disjoint(&self.ram)
        {
            return Err(ImageError::BadConfig("segments overlap".to_string()));
        }
        Ok(())
    }
}
