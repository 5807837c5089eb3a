//! Class descriptors
//!
//! A [`Klass`] is the read-only descriptor the translator produces for each
//! class: its name, instance layout size, array element typing and
//! superclass link. The romizer never mutates a `Klass`; it only maps each
//! one to the address of its Class-instance in the image.

use std::rc::Rc;

use crate::tags::ClassNumber;

/// Shared handle to a class descriptor.
pub type KlassRef = Rc<Klass>;

/// Identity key for a class descriptor, based on the descriptor's address.
///
/// Two `KlassRef` clones of the same descriptor compare equal; structurally
/// identical but distinct descriptors do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KlassKey(*const Klass);

/// Read-only class descriptor supplied by the translator.
#[derive(Debug)]
pub struct Klass {
    /// Class name; array classes use the bracket-prefixed element name
    /// (e.g. `[_byte_`, `[Class`).
    name: String,
    /// Instance field storage in words (excludes the object header).
    instance_words: u32,
    /// Element type tag when this is an array class.
    element: Option<ClassNumber>,
    /// Superclass, `None` only for `Object`.
    super_class: Option<KlassRef>,
}

impl Klass {
    /// Create a non-array class descriptor.
    pub fn new(name: impl Into<String>, instance_words: u32, super_class: Option<KlassRef>) -> Self {
        Self {
            name: name.into(),
            instance_words,
            element: None,
            super_class,
        }
    }

    /// Create an array class descriptor with the given element type tag.
    pub fn new_array(
        name: impl Into<String>,
        element: ClassNumber,
        super_class: Option<KlassRef>,
    ) -> Self {
        Self {
            name: name.into(),
            instance_words: 0,
            element: Some(element),
            super_class,
        }
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance field storage in words.
    pub fn instance_words(&self) -> u32 {
        self.instance_words
    }

    /// Whether this class is array-kind.
    pub fn is_array(&self) -> bool {
        self.element.is_some()
    }

    /// Element type tag, if this is an array class.
    pub fn element(&self) -> Option<ClassNumber> {
        self.element
    }

    /// Superclass link.
    pub fn super_class(&self) -> Option<&KlassRef> {
        self.super_class.as_ref()
    }

    /// Identity key for this descriptor.
    pub fn key(self: &Rc<Self>) -> KlassKey {
        KlassKey(Rc::as_ptr(self))
    }
}
