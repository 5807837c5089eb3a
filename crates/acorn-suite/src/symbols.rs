//! Per-class field symbol tables
//!
//! The translator derives, for every class, an ordered list of instance
//! field descriptors: name, type tag and byte offset within the instance.
//! The symbol table is assumed to exactly describe the objects it was
//! derived from; the field copier treats any disagreement as fatal.

use rustc_hash::FxHashMap;

use crate::klass::KlassKey;
use crate::tags::ClassNumber;

/// One instance field: name, type tag, byte offset within the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Declared field name.
    pub name: String,
    /// Type tag (a class number; non-primitive tags denote references).
    pub tag: ClassNumber,
    /// Byte offset of the field from the instance's addressable start.
    pub offset: u32,
}

impl FieldDescriptor {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, tag: ClassNumber, offset: u32) -> Self {
        Self {
            name: name.into(),
            tag,
            offset,
        }
    }
}

/// Ordered instance field descriptors declared directly by one class
/// (inherited fields live in the ancestor's table).
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    fields: Vec<FieldDescriptor>,
}

impl SymbolTable {
    /// Build a table from descriptors in declaration order.
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Number of declared instance fields.
    pub fn member_count(&self) -> usize {
        self.fields.len()
    }

    /// Descriptor at the given member index.
    pub fn member(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    /// Iterate descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }
}

/// Symbol tables keyed by class identity.
///
/// Classes without instance fields may be absent; the copier treats a
/// missing table as an empty one.
#[derive(Debug, Default)]
pub struct SymbolMap {
    tables: FxHashMap<KlassKey, SymbolTable>,
}

impl SymbolMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the symbol table for a class.
    pub fn insert(&mut self, key: KlassKey, table: SymbolTable) {
        self.tables.insert(key, table);
    }

    /// Look up the symbol table for a class.
    pub fn get(&self, key: KlassKey) -> Option<&SymbolTable> {
        self.tables.get(&key)
    }
}
