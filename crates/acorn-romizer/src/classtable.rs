//! Class address table
//!
//! Maps each translated class to the address of its Class-instance in the
//! image. An entry is created at most once per class; double allocation is
//! a fatal invariant violation. Entries carry an explicit link state so
//! the bootstrap protocol never has to rely on a sentinel class pointer.

use acorn_image::layout::{Address, OBJECT_HEADER_BYTES, WORD_SIZE};
use acorn_image::Image;
use acorn_suite::{KlassKey, KlassRef};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::collect::PointerLog;
use crate::error::{RomizeError, RomizeResult};

/// Link state of an allocated Class-instance.
///
/// Only `Object`'s and `Class`'s Class-instances ever exist unlinked, and
/// only between bootstrap steps; an unallocated class simply has no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Allocated with a zero class pointer, awaiting the bootstrap patch.
    Unlinked,
    /// Class pointer written; the instance is complete.
    Linked,
}

#[derive(Debug)]
struct ClassEntry {
    address: Address,
    link: LinkState,
    /// Whether the Class-instance's fields have been copied.
    copied: bool,
    /// Keeps the descriptor alive for the run so its key stays stable.
    _klass: KlassRef,
}

/// Memoized class-to-address mapping.
#[derive(Debug)]
pub struct ClassTable {
    entries: FxHashMap<KlassKey, ClassEntry>,
    object_klass: KlassRef,
    class_klass: KlassRef,
}

impl ClassTable {
    /// Create the table for a run rooted at the two meta-classes.
    pub fn new(object_klass: KlassRef, class_klass: KlassRef) -> Self {
        Self {
            entries: FxHashMap::default(),
            object_klass,
            class_klass,
        }
    }

    /// The `Class` descriptor this table allocates instances of.
    pub fn class_klass(&self) -> &KlassRef {
        &self.class_klass
    }

    /// Whether a class already has a Class-instance.
    pub fn is_allocated(&self, klass: &KlassRef) -> bool {
        self.entries.contains_key(&klass.key())
    }

    /// Address of an already allocated Class-instance.
    pub fn address(&self, klass: &KlassRef) -> RomizeResult<Address> {
        self.entries
            .get(&klass.key())
            .map(|e| e.address)
            .ok_or_else(|| RomizeError::ClassUnallocated {
                class: klass.name().to_string(),
            })
    }

    /// Link state of an allocated Class-instance.
    pub fn link_state(&self, klass: &KlassRef) -> Option<LinkState> {
        self.entries.get(&klass.key()).map(|e| e.link)
    }

    /// Return the cached address for a class, allocating its
    /// Class-instance on first use.
    pub fn address_of(
        &mut self,
        klass: &KlassRef,
        image: &mut Image,
        pointers: &mut PointerLog,
    ) -> RomizeResult<Address> {
        if let Some(entry) = self.entries.get(&klass.key()) {
            return Ok(entry.address);
        }
        self.allocate(klass, image, pointers)
    }

    /// Allocate a Class-shaped instance for a class.
    ///
    /// The two meta-classes are left unlinked for the bootstrap sequencer
    /// to patch; everything else gets its class pointer (to `Class`'s own
    /// Class-instance) immediately.
    pub fn allocate(
        &mut self,
        klass: &KlassRef,
        image: &mut Image,
        pointers: &mut PointerLog,
    ) -> RomizeResult<Address> {
        if self.entries.contains_key(&klass.key()) {
            return Err(RomizeError::DoubleAllocation {
                class: klass.name().to_string(),
            });
        }

        let words = self.class_klass.instance_words();
        let address = image.allocate(words + 1)? + OBJECT_HEADER_BYTES;
        pointers.record_object(address);

        let is_meta =
            klass.key() == self.object_klass.key() || klass.key() == self.class_klass.key();
        let link = if is_meta {
            LinkState::Unlinked
        } else {
            let class_address = self.address(&self.class_klass)?;
            image.set_word(address - WORD_SIZE, class_address)?;
            pointers.record_edge(address, class_address);
            LinkState::Linked
        };

        trace!(class = klass.name(), address, ?link, "allocated Class-instance");
        self.entries.insert(
            klass.key(),
            ClassEntry {
                address,
                link,
                copied: false,
                _klass: klass.clone(),
            },
        );
        Ok(address)
    }

    /// Patch the class pointer of an unlinked Class-instance.
    pub fn link(
        &mut self,
        klass: &KlassRef,
        class_address: Address,
        image: &mut Image,
        pointers: &mut PointerLog,
    ) -> RomizeResult<()> {
        let entry =
            self.entries
                .get_mut(&klass.key())
                .ok_or_else(|| RomizeError::ClassUnallocated {
                    class: klass.name().to_string(),
                })?;
        if entry.link == LinkState::Linked {
            return Err(RomizeError::AlreadyLinked {
                class: klass.name().to_string(),
            });
        }
        image.set_word(entry.address - WORD_SIZE, class_address)?;
        pointers.record_edge(entry.address, class_address);
        entry.link = LinkState::Linked;
        Ok(())
    }

    /// Mark a Class-instance's fields as copied; returns whether this call
    /// was the first to do so.
    pub fn mark_copied(&mut self, klass: &KlassRef) -> bool {
        match self.entries.get_mut(&klass.key()) {
            Some(entry) if !entry.copied => {
                entry.copied = true;
                true
            }
            _ => false,
        }
    }
}
