//! Error types for acorn-image

use thiserror::Error;

use crate::layout::Address;
use crate::segment::SegmentKind;

/// Image construction and access errors. All are fatal to a build.
#[derive(Debug, Error)]
pub enum ImageError {
    /// A segment's free pointer would pass its end. The free pointer is
    /// unchanged; the caller must re-run with a larger segment.
    #[error("out of memory in {segment}: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// The exhausted segment.
        segment: SegmentKind,
        /// Requested allocation size in bytes.
        requested: u32,
        /// Bytes remaining in the allocation partition.
        available: u32,
    },

    /// An address fell outside every configured segment.
    #[error("address {address:#010x} is outside every segment")]
    AddressOutOfRange {
        /// The offending address.
        address: Address,
    },

    /// The image configuration is unusable.
    #[error("bad image configuration: {0}")]
    BadConfig(String),
}

/// Result type using ImageError.
pub type ImageResult<T> = Result<T, ImageError>;
