//! Image segments

use std::fmt;

use crate::layout::Address;

/// The three independently bounded address ranges of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Read-only memory; holds the romized suites.
    Rom,
    /// Persistent mutable memory.
    Eeprom,
    /// Volatile memory; the runtime allocates here after boot.
    Ram,
}

impl SegmentKind {
    /// All segment kinds in master-record order.
    pub const ALL: [SegmentKind; 3] = [SegmentKind::Rom, SegmentKind::Eeprom, SegmentKind::Ram];
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentKind::Rom => "ROM",
            SegmentKind::Eeprom => "EEPROM",
            SegmentKind::Ram => "RAM",
        };
        f.write_str(name)
    }
}

/// One segment's backing store: a byte buffer at a fixed base address.
#[derive(Debug)]
pub struct Segment {
    kind: SegmentKind,
    base: Address,
    bytes: Vec<u8>,
}

impl Segment {
    /// Create a zero-filled segment.
    pub fn new(kind: SegmentKind, base: Address, size: u32) -> Self {
        Self {
            kind,
            base,
            bytes: vec![0; size as usize],
        }
    }

    /// Segment kind.
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Base address.
    pub fn base(&self) -> Address {
        self.base
    }

    /// Size in bytes.
    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// First address past the segment.
    pub fn end(&self) -> Address {
        self.base + self.size()
    }

    /// Whether the address lies within this segment.
    pub fn contains(&self, address: Address) -> bool {
        address >= self.base && address < self.end()
    }

    /// The segment's bytes, for the external image writer.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_bounds() {
        let seg = Segment::new(SegmentKind::Rom, 0x1000, 0x100);
        assert!(seg.contains(0x1000));
        assert!(seg.contains(0x10ff));
        assert!(!seg.contains(0x0fff));
        assert!(!seg.contains(0x1100));
    }
}
