//! Bootstrap sequencing
//!
//! `Object` and `Class` refer to each other: every Class-instance needs a
//! class pointer to `Class`'s Class-instance, including `Class`'s own. The
//! sequencer breaks the cycle by allocating both unlinked, then patching
//! both class pointers once `Class`'s address is known. After that the
//! remaining implicit classes of suite 0 are pre-allocated so that their
//! image addresses follow their class numbers in a fixed order.

use acorn_suite::tags;
use tracing::debug;

use crate::builder::ImageBuilder;
use crate::error::RomizeResult;

impl ImageBuilder {
    /// Run the bootstrap protocol at the bottom of ROM.
    ///
    /// Must be called exactly once, before any other allocation.
    pub(crate) fn bootstrap(&mut self) -> RomizeResult<()> {
        let object = self.boot.object.clone();
        let class = self.boot.class.clone();

        self.classes
            .allocate(&object, &mut self.image, &mut self.pointers)?;
        let class_address = self
            .classes
            .allocate(&class, &mut self.image, &mut self.pointers)?;

        self.classes
            .link(&object, class_address, &mut self.image, &mut self.pointers)?;
        self.classes
            .link(&class, class_address, &mut self.image, &mut self.pointers)?;

        let suite0 = self.suites[0].clone();
        for number in tags::FIRST_IMPLICIT..=tags::LAST_IMPLICIT {
            if let Some(klass) = suite0.class_at(number) {
                if !self.classes.is_allocated(klass) {
                    self.classes
                        .allocate(klass, &mut self.image, &mut self.pointers)?;
                }
            }
        }

        debug!(class_address, "bootstrap complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn_image::layout::WORD_SIZE;
    use acorn_image::{ImageConfig, SegmentKind};
    use acorn_suite::{Klass, Suite, SymbolMap};
    use std::rc::Rc;

    fn builder() -> ImageBuilder {
        let object = Rc::new(Klass::new("Object", 0, None));
        let class = Rc::new(Klass::new("Class", 4, Some(object.clone())));
        let string = Rc::new(Klass::new_array("String", tags::CHAR, Some(object.clone())));
        let byte_string = Rc::new(Klass::new_array("ByteString", tags::BYTE, Some(object.clone())));
        let symbols = Rc::new(Klass::new_array("Symbols", tags::BYTE, Some(object.clone())));

        let mut classes = vec![None; (tags::LAST_IMPLICIT + 1) as usize];
        classes[tags::OBJECT as usize] = Some(object);
        classes[tags::CLASS as usize] = Some(class);
        classes[tags::STRING as usize] = Some(string);
        classes[tags::BYTE_STRING as usize] = Some(byte_string);
        classes[tags::SYMBOLS as usize] = Some(symbols);

        let suite = Rc::new(Suite::new("base", classes));
        ImageBuilder::new(ImageConfig::default(), vec![suite], SymbolMap::new()).unwrap()
    }

    #[test]
    fn test_mutual_reference_is_patched() {
        let mut b = builder();
        b.bootstrap().unwrap();

        let object_addr = b.classes.address(&b.boot.object).unwrap();
        let class_addr = b.classes.address(&b.boot.class).unwrap();
        assert_ne!(object_addr, class_addr);
        // both meta-instances point at Class's Class-instance
        assert_eq!(b.image.get_word(object_addr - WORD_SIZE).unwrap(), class_addr);
        assert_eq!(b.image.get_word(class_addr - WORD_SIZE).unwrap(), class_addr);
    }

    #[test]
    fn test_implicit_classes_are_preallocated() {
        let mut b = builder();
        b.bootstrap().unwrap();

        for klass in [&b.boot.string, &b.boot.byte_string, &b.boot.symbols] {
            assert!(b.classes.is_allocated(klass));
        }
        assert!(b.image.used(SegmentKind::Rom).unwrap() > 0);
    }
}
