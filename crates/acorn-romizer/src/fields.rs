//! Field descriptor resolution
//!
//! The symbol tables arrive as per-class descriptor lists keyed by name.
//! Before any instance of a class is copied, its full descriptor chain
//! (own fields first, then each ancestor's) is resolved once, validated
//! against the class's declared layout, and cached. The copier then works
//! from the validated table only.

use std::rc::Rc;

use acorn_image::layout::WORD_SIZE;
use acorn_suite::{FieldDescriptor, KlassKey, KlassRef, SymbolMap, tags};
use rustc_hash::FxHashMap;

use crate::error::{RomizeError, RomizeResult};

/// Cache of resolved, validated per-class field tables.
#[derive(Debug, Default)]
pub struct FieldTableCache {
    resolved: FxHashMap<KlassKey, Rc<[FieldDescriptor]>>,
}

impl FieldTableCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the full instance-field table for a class, most-derived
    /// fields first, walking the superclass chain.
    pub fn resolve(
        &mut self,
        klass: &KlassRef,
        symbols: &SymbolMap,
    ) -> RomizeResult<Rc<[FieldDescriptor]>> {
        if let Some(table) = self.resolved.get(&klass.key()) {
            return Ok(table.clone());
        }

        let limit = klass.instance_words() * WORD_SIZE;
        let mut fields = Vec::new();
        let mut current = Some(klass.clone());
        while let Some(k) = current {
            if let Some(table) = symbols.get(k.key()) {
                for descriptor in table.iter() {
                    validate(klass, descriptor, limit)?;
                    fields.push(descriptor.clone());
                }
            }
            current = k.super_class().cloned();
        }

        let table: Rc<[FieldDescriptor]> = fields.into();
        self.resolved.insert(klass.key(), table.clone());
        Ok(table)
    }
}

fn validate(klass: &KlassRef, descriptor: &FieldDescriptor, limit: u32) -> RomizeResult<()> {
    let bad = |reason| RomizeError::BadFieldTable {
        class: klass.name().to_string(),
        field: descriptor.name.clone(),
        reason,
    };

    if descriptor.tag == tags::NULL || descriptor.tag == tags::VOID {
        return Err(bad("field has no storable type"));
    }
    // Second slots share storage with their pair and are never written.
    if tags::is_second_slot(descriptor.tag) {
        return Ok(());
    }
    let width = match descriptor.tag {
        tags::LONG | tags::DOUBLE => 2 * WORD_SIZE,
        other => tags::packed_size(other),
    };
    if descriptor.offset % width.min(WORD_SIZE) != 0 {
        return Err(bad("field offset is misaligned for its width"));
    }
    if descriptor.offset + width > limit {
        return Err(bad("field extends past the instance layout"));
    }
    Ok(())
}
