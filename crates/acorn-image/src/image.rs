//! The three-segment image and its allocation machinery
//!
//! An [`Image`] owns the ROM, EEPROM and RAM buffers plus a "current
//! segment" cursor. Allocation is bump-pointer within the current
//! segment's partition; the free and end pointers live in-band in each
//! segment's GC info record, exactly where the runtime's collector
//! expects them.

use tracing::trace;

use crate::config::ImageConfig;
use crate::error::{ImageError, ImageResult};
use crate::layout::{self, Address, WORD_SIZE, gci, master};
use crate::segment::{Segment, SegmentKind};

/// The in-construction heap image.
#[derive(Debug)]
pub struct Image {
    config: ImageConfig,
    segments: [Segment; 3],
    current: SegmentKind,
}

impl Image {
    /// Create an image from a validated configuration.
    ///
    /// All three segment records are initialized and the current
    /// allocation segment is ROM, ready for romizing.
    pub fn new(config: ImageConfig) -> ImageResult<Self> {
        config.validate()?;
        let segments = [
            Segment::new(SegmentKind::Rom, config.rom.base, config.rom.size),
            Segment::new(SegmentKind::Eeprom, config.eeprom.base, config.eeprom.size),
            Segment::new(SegmentKind::Ram, config.ram.base, config.ram.size),
        ];
        let mut image = Self {
            config,
            segments,
            current: SegmentKind::Rom,
        };
        for kind in SegmentKind::ALL {
            image.init_segment_record(kind)?;
        }
        Ok(image)
    }

    /// The configuration this image was built with.
    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// The segment of the given kind.
    pub fn segment(&self, kind: SegmentKind) -> &Segment {
        &self.segments[Self::index(kind)]
    }

    /// The segment containing the given address, if any.
    pub fn segment_containing(&self, address: Address) -> Option<SegmentKind> {
        SegmentKind::ALL
            .into_iter()
            .find(|&kind| self.segment(kind).contains(address))
    }

    /// The segment allocation currently targets.
    pub fn current_segment(&self) -> SegmentKind {
        self.current
    }

    /// Switch the allocation context to another segment.
    pub fn set_current_segment(&mut self, kind: SegmentKind) {
        self.current = kind;
    }

    fn index(kind: SegmentKind) -> usize {
        match kind {
            SegmentKind::Rom => 0,
            SegmentKind::Eeprom => 1,
            SegmentKind::Ram => 2,
        }
    }

    /// Translate an absolute address range to a segment buffer range.
    fn locate(&self, address: Address, len: u32) -> ImageResult<(usize, usize)> {
        for (i, segment) in self.segments.iter().enumerate() {
            if segment.contains(address) {
                let offset = address - segment.base();
                if offset + len > segment.size() {
                    return Err(ImageError::AddressOutOfRange { address });
                }
                return Ok((i, offset as usize));
            }
        }
        Err(ImageError::AddressOutOfRange { address })
    }

    fn write(&mut self, address: Address, bytes: &[u8]) -> ImageResult<()> {
        let (i, offset) = self.locate(address, bytes.len() as u32)?;
        self.segments[i].bytes_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn read(&self, address: Address, len: usize) -> ImageResult<&[u8]> {
        let (i, offset) = self.locate(address, len as u32)?;
        Ok(&self.segments[i].bytes()[offset..offset + len])
    }

    /// Write one byte.
    pub fn set_byte(&mut self, address: Address, value: u8) -> ImageResult<()> {
        self.write(address, &[value])
    }

    /// Write a 16-bit value in the configured byte order.
    pub fn set_half(&mut self, address: Address, value: u16) -> ImageResult<()> {
        let bytes = if self.config.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.write(address, &bytes)
    }

    /// Write a word in the configured byte order.
    pub fn set_word(&mut self, address: Address, value: u32) -> ImageResult<()> {
        let bytes = if self.config.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.write(address, &bytes)
    }

    /// Write a 64-bit value in the configured byte order.
    pub fn set_long(&mut self, address: Address, value: u64) -> ImageResult<()> {
        let bytes = if self.config.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.write(address, &bytes)
    }

    /// Read one byte.
    pub fn get_byte(&self, address: Address) -> ImageResult<u8> {
        Ok(self.read(address, 1)?[0])
    }

    /// Read a 16-bit value in the configured byte order.
    pub fn get_half(&self, address: Address) -> ImageResult<u16> {
        let bytes: [u8; 2] = self
            .read(address, 2)?
            .try_into()
            .expect("read returns the requested length");
        Ok(if self.config.big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    }

    /// Read a word in the configured byte order.
    pub fn get_word(&self, address: Address) -> ImageResult<u32> {
        let bytes: [u8; 4] = self
            .read(address, 4)?
            .try_into()
            .expect("read returns the requested length");
        Ok(if self.config.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    /// Read a 64-bit value in the configured byte order.
    pub fn get_long(&self, address: Address) -> ImageResult<u64> {
        let bytes: [u8; 8] = self
            .read(address, 8)?
            .try_into()
            .expect("read returns the requested length");
        Ok(if self.config.big_endian {
            u64::from_be_bytes(bytes)
        } else {
            u64::from_le_bytes(bytes)
        })
    }

    /* ---------------- segment records ---------------- */

    fn record_word_address(&self, kind: SegmentKind, word_offset: u32) -> Address {
        self.segment(kind).base() + word_offset * WORD_SIZE
    }

    fn init_segment_record(&mut self, kind: SegmentKind) -> ImageResult<()> {
        let segment = self.segment(kind);
        let object_memory_start = segment.base() + layout::SEGMENT_RECORD_BYTES;
        let object_memory_size = segment.size() - layout::SEGMENT_RECORD_BYTES;
        let end = segment.end();
        self.set_gci(kind, gci::OBJECT_MEMORY_START, object_memory_start)?;
        self.set_gci(kind, gci::OBJECT_MEMORY_SIZE, object_memory_size)?;
        self.set_gci(kind, gci::PARTITION_START, object_memory_start)?;
        self.set_gci(kind, gci::PARTITION_FREE, object_memory_start)?;
        self.set_gci(kind, gci::PARTITION_END, end)?;
        Ok(())
    }

    /// Read a GC info record word.
    pub fn gci(&self, kind: SegmentKind, word_offset: u32) -> ImageResult<u32> {
        debug_assert!(word_offset < gci::SIZE);
        self.get_word(self.record_word_address(kind, word_offset))
    }

    /// Write a GC info record word.
    pub fn set_gci(&mut self, kind: SegmentKind, word_offset: u32, value: u32) -> ImageResult<()> {
        debug_assert!(word_offset < gci::SIZE);
        self.set_word(self.record_word_address(kind, word_offset), value)
    }

    /// Absolute address of a root table slot.
    pub fn root_address(&self, kind: SegmentKind, slot: u32) -> Address {
        debug_assert!(slot < layout::ROOT_SLOTS);
        self.record_word_address(kind, layout::ROOTS_OFFSET + slot)
    }

    /// Read a root table slot.
    pub fn root(&self, kind: SegmentKind, slot: u32) -> ImageResult<u32> {
        self.get_word(self.root_address(kind, slot))
    }

    /// Write a root table slot.
    pub fn set_root(&mut self, kind: SegmentKind, slot: u32, value: Address) -> ImageResult<()> {
        self.set_word(self.root_address(kind, slot), value)
    }

    /* ---------------- allocation ---------------- */

    /// Allocate `word_length` zero-filled words in the current segment.
    ///
    /// Returns the address of the new region. On exhaustion the free
    /// pointer is unchanged, the failed size is recorded in the segment's
    /// GC info record, and the error names the segment.
    pub fn allocate(&mut self, word_length: u32) -> ImageResult<Address> {
        let kind = self.current;
        let byte_length = word_length.saturating_mul(WORD_SIZE);
        let free = self.gci(kind, gci::PARTITION_FREE)?;
        let end = self.gci(kind, gci::PARTITION_END)?;
        debug_assert!(free % WORD_SIZE == 0);
        if free.checked_add(byte_length).is_none_or(|next| next > end) {
            self.set_gci(kind, gci::FAILED_ALLOCATION_SIZE, byte_length)?;
            return Err(ImageError::OutOfMemory {
                segment: kind,
                requested: byte_length,
                available: end - free,
            });
        }
        self.set_gci(kind, gci::PARTITION_FREE, free + byte_length)?;
        // Objects rely on starting out all-zero.
        let (i, offset) = self.locate(free, byte_length)?;
        self.segments[i].bytes_mut()[offset..offset + byte_length as usize].fill(0);
        trace!(segment = %kind, address = free, bytes = byte_length, "allocate");
        Ok(free)
    }

    /// Bytes consumed so far in a segment's allocation partition.
    pub fn used(&self, kind: SegmentKind) -> ImageResult<u32> {
        let start = self.gci(kind, gci::PARTITION_START)?;
        let free = self.gci(kind, gci::PARTITION_FREE)?;
        Ok(free - start)
    }

    /* ---------------- master record ---------------- */

    /// The 8-word master memory record for this image.
    pub fn master_record(&self) -> [u32; master::SIZE] {
        let mut record = [0u32; master::SIZE];
        record[master::MAGIC] = layout::IMAGE_MAGIC;
        record[master::VERSION] = layout::IMAGE_VERSION;
        record[master::ROM_START] = self.config.rom.base;
        record[master::ROM_SIZE] = self.config.rom.size;
        record[master::EEPROM_START] = self.config.eeprom.base;
        record[master::EEPROM_SIZE] = self.config.eeprom.size;
        record[master::RAM_START] = self.config.ram.base;
        record[master::RAM_SIZE] = self.config.ram.size;
        record
    }
}
