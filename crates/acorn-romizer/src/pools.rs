//! Canonicalization pools
//!
//! Two pools with deliberately different equality rules:
//!
//! - [`IdentityPool`] maps host objects to addresses by pointer identity.
//!   Two distinct source objects never share an address even if their
//!   fields are equal. Entries are written before an object's fields are
//!   copied, which is what guarantees cycle termination.
//! - [`ContentPool`] maps primitive-element arrays (and transcoded
//!   strings) to addresses by (target class name, canonical element dump),
//!   so structurally identical immutable content shares one address
//!   regardless of source identity.

use acorn_image::layout::Address;
use acorn_suite::{ArrayData, HostRef};
use rustc_hash::FxHashMap;

/// Identity-keyed pool for general instances and reference arrays.
///
/// Holds each pooled `HostRef` alive so a pointer identity can never be
/// recycled for a different object during the run.
#[derive(Debug, Default)]
pub struct IdentityPool {
    entries: FxHashMap<usize, (Address, HostRef)>,
}

impl IdentityPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of a previously pooled object.
    pub fn get(&self, object: &HostRef) -> Option<Address> {
        self.entries.get(&object.identity()).map(|(a, _)| *a)
    }

    /// Record an object's address. Must happen before its fields are
    /// copied so that cycles terminate.
    pub fn insert(&mut self, object: &HostRef, address: Address) {
        let existing = self
            .entries
            .insert(object.identity(), (address, object.clone()));
        debug_assert!(existing.is_none());
    }

    /// Number of pooled objects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical content signature: target class name plus element dump.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    /// Name of the array class the content romizes as.
    pub class_name: String,
    /// Canonical big-endian dump of the elements.
    pub bytes: Vec<u8>,
}

/// Content-keyed pool for primitive-element arrays and strings.
#[derive(Debug, Default)]
pub struct ContentPool {
    entries: FxHashMap<ContentKey, Address>,
}

impl ContentPool {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of previously pooled content.
    pub fn get(&self, key: &ContentKey) -> Option<Address> {
        self.entries.get(key).copied()
    }

    /// Record the address for a content signature.
    pub fn insert(&mut self, key: ContentKey, address: Address) {
        let existing = self.entries.insert(key, address);
        debug_assert!(existing.is_none());
    }

    /// Number of pooled signatures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical dump of primitive array elements: element size in bytes plus
/// each element's fixed-width big-endian bit pattern, in order.
///
/// Floats and doubles dump their raw IEEE bit patterns, so distinct NaN
/// encodings and +0.0/-0.0 are distinct content. Returns `None` for
/// reference arrays, which are pooled by identity instead.
pub fn canonical_dump(data: &ArrayData) -> Option<(u32, Vec<u8>)> {
    let dump = match data {
        ArrayData::Byte(v) => (1, v.iter().map(|b| *b as u8).collect()),
        ArrayData::Boolean(v) => (1, v.iter().map(|b| u8::from(*b)).collect()),
        ArrayData::Char(v) => (2, v.iter().flat_map(|c| c.to_be_bytes()).collect()),
        ArrayData::Short(v) => (2, v.iter().flat_map(|s| s.to_be_bytes()).collect()),
        ArrayData::Int(v) => (4, v.iter().flat_map(|i| i.to_be_bytes()).collect()),
        ArrayData::Long(v) => (8, v.iter().flat_map(|l| l.to_be_bytes()).collect()),
        ArrayData::Float(v) => (4, v.iter().flat_map(|f| f.to_bits().to_be_bytes()).collect()),
        ArrayData::Double(v) => (8, v.iter().flat_map(|d| d.to_bits().to_be_bytes()).collect()),
        ArrayData::Ref(_) => return None,
    };
    Some(dump)
}
