//! Suite containers
//!
//! A suite is the top-level unit the translator emits: a class table
//! indexed by class number. Suite 0 must carry the implicitly numbered
//! bootstrap classes at their fixed numbers.

use std::rc::Rc;

use crate::klass::KlassRef;
use crate::tags::ClassNumber;

/// Shared handle to a suite.
pub type SuiteRef = Rc<Suite>;

/// A translated suite: a named, class-number-indexed class table.
#[derive(Debug)]
pub struct Suite {
    name: String,
    /// Classes indexed by class number; unused numbers are `None`.
    classes: Vec<Option<KlassRef>>,
}

impl Suite {
    /// Create a suite from its class table.
    pub fn new(name: impl Into<String>, classes: Vec<Option<KlassRef>>) -> Self {
        Self {
            name: name.into(),
            classes,
        }
    }

    /// Suite name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class table indexed by class number.
    pub fn classes(&self) -> &[Option<KlassRef>] {
        &self.classes
    }

    /// Class registered at the given class number.
    pub fn class_at(&self, number: ClassNumber) -> Option<&KlassRef> {
        self.classes.get(number as usize).and_then(|c| c.as_ref())
    }

    /// Find a class in this suite by name.
    pub fn class_named(&self, name: &str) -> Option<&KlassRef> {
        self.classes
            .iter()
            .flatten()
            .find(|k| k.name() == name)
    }
}
