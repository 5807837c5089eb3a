//! # Acorn Romizer
//!
//! Converts a graph of translated class and instance metadata into the
//! flat, address-exact boot image consumed by the Acorn VM. This is a
//! static linker for object graphs: it assigns permanent addresses,
//! deduplicates immutable content, breaks reference cycles, resolves the
//! circular `Object`/`Class` bootstrap dependency, and records the named
//! roots the runtime reads at startup.
//!
//! The builder is constructed once per image-generation run and consumed
//! by [`ImageBuilder::build`]; any failure aborts the whole build and no
//! partial image is emitted.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod builder;
pub mod classtable;
pub mod collect;
pub mod error;
pub mod fields;
pub mod pools;
pub mod registry;
pub mod romize;

pub use builder::{BuildOutput, BuildReport, ImageBuilder};
pub use classtable::{ClassTable, LinkState};
pub use collect::{AuditSummary, PointerLog, audit_rom};
pub use error::{RomizeError, RomizeResult};
pub use fields::FieldTableCache;
pub use pools::{ContentKey, ContentPool, IdentityPool};
pub use registry::ClassRegistry;
