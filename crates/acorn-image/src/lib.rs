//! # Acorn Heap Image
//!
//! Memory geometry for the Acorn VM's boot image: three independently
//! bounded segments (ROM, EEPROM, RAM), each starting with a GC info
//! record and a root table, followed by word-aligned bump-allocated object
//! memory. A master memory record describes the whole image to the loader.
//!
//! Every byte offset here is contractual: the runtime reads these records
//! directly at boot without any parsing pass.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod image;
pub mod layout;
pub mod segment;

pub use config::{ImageConfig, SegmentExtent};
pub use error::{ImageError, ImageResult};
pub use image::Image;
pub use layout::{Address, IMAGE_MAGIC, IMAGE_MAGIC_REVERSED, IMAGE_VERSION, WORD_SIZE};
pub use segment::{Segment, SegmentKind};
