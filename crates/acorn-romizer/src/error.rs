//! Error types for acorn-romizer
//!
//! Every variant is fatal: the build terminates and the partially written
//! image must be discarded. A silent inconsistency would corrupt the image
//! invisibly, so mismatches between the translator's metadata and the
//! actual object shapes are never tolerated.

use acorn_image::ImageError;
use acorn_image::layout::Address;
use thiserror::Error;

/// Romizer error type.
#[derive(Debug, Error)]
pub enum RomizeError {
    /// Segment allocation or addressing failure.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// A host type name did not resolve to any translated class.
    #[error("unknown class '{name}'")]
    UnknownClass {
        /// The unresolved class name.
        name: String,
    },

    /// A Class-instance was allocated twice for the same class.
    #[error("Class-instance for '{class}' allocated twice")]
    DoubleAllocation {
        /// The class with the duplicate allocation.
        class: String,
    },

    /// A class's address was requested before its Class-instance existed.
    #[error("Class-instance for '{class}' has not been allocated")]
    ClassUnallocated {
        /// The class without an allocation.
        class: String,
    },

    /// A bootstrap patch targeted a Class-instance that was already linked.
    #[error("Class-instance for '{class}' is already linked")]
    AlreadyLinked {
        /// The class with the already linked Class-instance.
        class: String,
    },

    /// An array object resolved to a non-array class, or vice versa.
    #[error("class '{class}' is not an array class")]
    NotAnArray {
        /// The offending class.
        class: String,
    },

    /// An array's elements disagree with its class's element type tag.
    #[error("element type mismatch for array class '{class}'")]
    ElementTypeMismatch {
        /// The array class whose tag disagrees with the element data.
        class: String,
    },

    /// A symbol-table-declared field could not be read from its object.
    #[error("field '{class}.{field}' cannot be read from the source object")]
    FieldResolution {
        /// Class declaring the field.
        class: String,
        /// The unreadable field.
        field: String,
    },

    /// A field's value disagrees with its declared type tag.
    #[error("field '{class}.{field}' value disagrees with its declared type")]
    FieldTypeMismatch {
        /// Class declaring the field.
        class: String,
        /// The mismatched field.
        field: String,
    },

    /// A symbol table entry is inconsistent with its class's layout.
    #[error("bad field table entry '{class}.{field}': {reason}")]
    BadFieldTable {
        /// Class declaring the field.
        class: String,
        /// The inconsistent field.
        field: String,
        /// Why the entry is unusable.
        reason: &'static str,
    },

    /// A symbol string contained characters wider than 8 bits.
    #[error("symbol string is not 8-bit")]
    WideSymbols,

    /// The collectible-ROM audit found an inconsistency.
    #[error("ROM audit failed: {detail} (address {address:#010x})")]
    AuditFailure {
        /// What the audit found.
        detail: &'static str,
        /// The address involved.
        address: Address,
    },

    /// The build input is unusable (e.g. no suites, missing bootstrap class).
    #[error("bad build input: {0}")]
    BadInput(String),
}

/// Result type using RomizeError.
pub type RomizeResult<T> = Result<T, RomizeError>;
