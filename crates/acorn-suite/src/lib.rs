//! # Acorn Suite Model
//!
//! This crate defines the boundary between the class translator and the
//! heap image builder: class descriptors ([`Klass`]), suite containers
//! ([`Suite`]), per-class field symbol tables, and the host object graph
//! ([`HostObject`]) that the romizer copies into the image.
//!
//! The translator produces these values; the romizer only reads them.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod klass;
pub mod object;
pub mod suite;
pub mod symbols;
pub mod tags;

pub use klass::{Klass, KlassKey, KlassRef};
pub use object::{ArrayData, ArrayObject, FieldSource, HostObject, HostRef, Instance, Value};
pub use suite::{Suite, SuiteRef};
pub use symbols::{FieldDescriptor, SymbolMap, SymbolTable};
pub use tags::ClassNumber;
