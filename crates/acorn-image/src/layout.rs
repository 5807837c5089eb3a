//! Fixed image layout constants
//!
//! Word offsets within the master memory record and the per-segment
//! records. These mirror what the runtime's boot and collector code reads;
//! changing any of them is an image format change.

/// Absolute byte address within the image.
pub type Address = u32;

/// Bytes per word.
pub const WORD_SIZE: u32 = 4;

/// Magic constant in word 0 of the master memory record.
pub const IMAGE_MAGIC: u32 = 0x0AC0_4E01;

/// The magic constant as read with the wrong byte order.
///
/// Never stored; the loader compares against it to diagnose an image built
/// for the opposite endianness.
pub const IMAGE_MAGIC_REVERSED: u32 = 0x014E_C00A;

/// Image format version in word 1 of the master memory record.
pub const IMAGE_VERSION: u32 = 1;

/// Master memory record word offsets.
pub mod master {
    /// Magic constant.
    pub const MAGIC: usize = 0;
    /// Format version.
    pub const VERSION: usize = 1;
    /// ROM segment start address.
    pub const ROM_START: usize = 2;
    /// ROM segment size in bytes.
    pub const ROM_SIZE: usize = 3;
    /// EEPROM segment start address.
    pub const EEPROM_START: usize = 4;
    /// EEPROM segment size in bytes.
    pub const EEPROM_SIZE: usize = 5;
    /// RAM segment start address.
    pub const RAM_START: usize = 6;
    /// RAM segment size in bytes.
    pub const RAM_SIZE: usize = 7;
    /// Record size in words.
    pub const SIZE: usize = 8;
}

/// GC info record word offsets, relative to the segment base.
pub mod gci {
    /// Start address of the segment's object memory.
    pub const OBJECT_MEMORY_START: u32 = 0;
    /// Size in bytes of the segment's object memory.
    pub const OBJECT_MEMORY_SIZE: u32 = 1;
    /// Start of the current allocation partition.
    pub const PARTITION_START: u32 = 2;
    /// Allocation point of the current partition.
    pub const PARTITION_FREE: u32 = 3;
    /// End of the current allocation partition.
    pub const PARTITION_END: u32 = 4;
    /// Size of the last failed allocation, zero if none.
    pub const FAILED_ALLOCATION_SIZE: u32 = 5;
    /// Reserved.
    pub const RESERVED_1: u32 = 6;
    /// Reserved.
    pub const RESERVED_2: u32 = 7;
    /// Record size in words.
    pub const SIZE: u32 = 8;
}

/// Number of root slots per segment.
pub const ROOT_SLOTS: u32 = 8;

/// Word offset of the root table relative to the segment base.
pub const ROOTS_OFFSET: u32 = gci::SIZE;

/// Per-segment record overhead in bytes (GC info record + root table).
pub const SEGMENT_RECORD_BYTES: u32 = (gci::SIZE + ROOT_SLOTS) * WORD_SIZE;

/// ROM root table slots.
pub mod rom_root {
    /// The `VmExtension` class, needed by runtime bootstrap but not
    /// otherwise reachable from the suites.
    pub const VM_EXTENSION: u32 = 1;
    /// The suite table array.
    pub const SUITE_TABLE: u32 = 2;
    /// The method debug table, when one was romized.
    pub const METHOD_DEBUG_TABLE: u32 = 3;
}

/// EEPROM root table slots.
pub mod eeprom_root {
    /// Head of the persistent free list.
    pub const FREE_LIST: u32 = 0;
    /// The suite table array for migrated suites.
    pub const SUITE_TABLE: u32 = 2;
    /// Hash table of persistent memory roots.
    pub const PERSISTENT_MEMORY_TABLE: u32 = 3;
}

/// RAM root table slots.
pub mod ram_root {
    /// Hash table of per-class runtime state.
    pub const CLASS_STATE_TABLE: u32 = 0;
    /// The interpreter's current stack chunk.
    pub const CURRENT_STACK_CHUNK: u32 = 1;
    /// List of all stack chunks.
    pub const STACK_CHUNK_LIST: u32 = 2;
    /// The method debug table, when loaded into RAM.
    pub const METHOD_DEBUG_TABLE: u32 = 3;
    /// Pre-built out-of-memory error object.
    pub const OUT_OF_MEMORY_OBJECT: u32 = 4;
    /// The fast lock stack.
    pub const FAST_LOCK_STACK: u32 = 5;
    /// The object association hash table.
    pub const ASSOCIATION_TABLE: u32 = 6;
    /// Head of the finalization queue.
    pub const FINALIZATION_QUEUE: u32 = 7;
}

/// Header size in bytes for a non-array object (class pointer).
pub const OBJECT_HEADER_BYTES: u32 = WORD_SIZE;

/// Header size in bytes for an array (element count + class pointer).
pub const ARRAY_HEADER_BYTES: u32 = 2 * WORD_SIZE;
