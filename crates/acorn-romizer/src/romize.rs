//! Graph traversal and copying
//!
//! [`ImageBuilder::romize`] converts one host object graph into image
//! bytes. Traversal is a work list, not recursion: ensuring an object
//! allocates it, pools it, and queues a fill job; draining the queue copies
//! fields and elements, ensuring referenced objects as it goes. Because
//! addresses are final at allocation time, deferred fills are always safe,
//! and pooling before filling is what terminates cycles.

use acorn_image::layout::{ARRAY_HEADER_BYTES, Address, OBJECT_HEADER_BYTES, WORD_SIZE};
use acorn_suite::{ArrayData, FieldDescriptor, FieldSource, HostObject, HostRef, KlassRef, Value, tags};
use tracing::trace;

use crate::builder::ImageBuilder;
use crate::error::{RomizeError, RomizeResult};
use crate::pools::{ContentKey, canonical_dump};

/// Deferred copy of an allocated object's contents.
#[derive(Debug)]
pub(crate) enum FillJob {
    /// Copy the named fields of an instance (or Class-instance).
    Fields {
        address: Address,
        object: HostRef,
        klass: KlassRef,
    },
    /// Copy the element slots of a reference array.
    Elements { address: Address, object: HostRef },
}

impl ImageBuilder {
    /// Romize one object graph: ensure the root, then drain the work
    /// queue until every reachable object has been copied.
    pub fn romize(&mut self, object: &HostRef) -> RomizeResult<Address> {
        let address = self.ensure(object)?;
        self.drain()?;
        Ok(address)
    }

    /// Image address of an object, allocating (and queueing its fill) on
    /// first encounter.
    fn ensure(&mut self, object: &HostRef) -> RomizeResult<Address> {
        // Class descriptors route through the class table so that a class
        // reached as a field value shares the address bootstrap gave it.
        if let HostObject::Klass(klass) = object.object() {
            let klass = klass.clone();
            let address =
                self.classes
                    .address_of(&klass, &mut self.image, &mut self.pointers)?;
            if self.classes.mark_copied(&klass) {
                self.queue.push_back(FillJob::Fields {
                    address,
                    object: object.clone(),
                    klass: self.boot.class.clone(),
                });
            }
            return Ok(address);
        }

        let klass = self.registry.lookup(object.class_name())?;
        if klass.is_array() {
            return self.ensure_array(object, &klass);
        }

        if let Some(address) = self.identity.get(object) {
            return Ok(address);
        }
        let address = self.alloc_instance(&klass)?;
        // Pool before queueing the fill so cycles terminate.
        self.identity.insert(object, address);
        self.queue.push_back(FillJob::Fields {
            address,
            object: object.clone(),
            klass,
        });
        Ok(address)
    }

    fn ensure_array(&mut self, object: &HostRef, klass: &KlassRef) -> RomizeResult<Address> {
        let element = klass
            .element()
            .ok_or_else(|| RomizeError::NotAnArray {
                class: klass.name().to_string(),
            })?;

        match object.object() {
            // Strings transcode by content: all code units within 8 bits
            // narrows to the byte-string class, anything wider stays in
            // the two-byte string class.
            HostObject::Str(text) => {
                let units: Vec<u16> = text.encode_utf16().collect();
                if units.iter().all(|u| *u <= 0xff) {
                    let narrow: Vec<i8> = units.iter().map(|u| *u as u8 as i8).collect();
                    let target = self.boot.byte_string.clone();
                    self.primitive_array(&target, &ArrayData::Byte(narrow))
                } else {
                    let target = self.boot.string.clone();
                    self.primitive_array(&target, &ArrayData::Char(units))
                }
            }
            // Symbol blobs must fit in 8-bit storage; a wide code unit is
            // a translator bug, not something to narrow silently.
            HostObject::Symbols(text) => {
                let units: Vec<u16> = text.encode_utf16().collect();
                if units.iter().any(|u| *u > 0xff) {
                    return Err(RomizeError::WideSymbols);
                }
                let narrow: Vec<i8> = units.iter().map(|u| *u as u8 as i8).collect();
                let target = self.boot.symbols.clone();
                self.primitive_array(&target, &ArrayData::Byte(narrow))
            }
            HostObject::Array(array) => match array.data() {
                ArrayData::Ref(elements) => {
                    if tags::is_primitive(element) || tags::is_second_slot(element) {
                        return Err(RomizeError::ElementTypeMismatch {
                            class: klass.name().to_string(),
                        });
                    }
                    if let Some(address) = self.identity.get(object) {
                        return Ok(address);
                    }
                    let address =
                        self.alloc_array(klass, elements.len() as u32, WORD_SIZE)?;
                    self.identity.insert(object, address);
                    self.queue.push_back(FillJob::Elements {
                        address,
                        object: object.clone(),
                    });
                    Ok(address)
                }
                data => {
                    let actual = match data {
                        ArrayData::Byte(_) => tags::BYTE,
                        ArrayData::Boolean(_) => tags::BOOLEAN,
                        ArrayData::Char(_) => tags::CHAR,
                        ArrayData::Short(_) => tags::SHORT,
                        ArrayData::Int(_) => tags::INT,
                        ArrayData::Long(_) => tags::LONG,
                        ArrayData::Float(_) => tags::FLOAT,
                        ArrayData::Double(_) => tags::DOUBLE,
                        ArrayData::Ref(_) => unreachable!(),
                    };
                    if element != actual {
                        return Err(RomizeError::ElementTypeMismatch {
                            class: klass.name().to_string(),
                        });
                    }
                    self.primitive_array(klass, data)
                }
            },
            _ => Err(RomizeError::NotAnArray {
                class: klass.name().to_string(),
            }),
        }
    }

    /// Pool-or-copy for immutable primitive content. Elements are written
    /// immediately; no fill job is queued.
    fn primitive_array(&mut self, klass: &KlassRef, data: &ArrayData) -> RomizeResult<Address> {
        let Some((element_size, bytes)) = canonical_dump(data) else {
            return Err(RomizeError::NotAnArray {
                class: klass.name().to_string(),
            });
        };
        let key = ContentKey {
            class_name: klass.name().to_string(),
            bytes,
        };
        if let Some(address) = self.content.get(&key) {
            trace!(class = klass.name(), address, "content pool hit");
            return Ok(address);
        }

        let count = data.len() as u32;
        let address = self.alloc_array(klass, count, element_size)?;
        match element_size {
            1 => {
                for (i, byte) in key.bytes.iter().enumerate() {
                    self.image.set_byte(address + i as u32, *byte)?;
                }
            }
            2 => {
                for (i, pair) in key.bytes.chunks_exact(2).enumerate() {
                    let half = u16::from_be_bytes([pair[0], pair[1]]);
                    self.image.set_half(address + 2 * i as u32, half)?;
                }
            }
            4 => {
                for (i, quad) in key.bytes.chunks_exact(4).enumerate() {
                    let word = u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]]);
                    self.image.set_word(address + 4 * i as u32, word)?;
                }
            }
            _ => {
                for (i, oct) in key.bytes.chunks_exact(8).enumerate() {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(oct);
                    self.image.set_long(address + 8 * i as u32, u64::from_be_bytes(raw))?;
                }
            }
        }
        self.content.insert(key, address);
        Ok(address)
    }

    fn alloc_instance(&mut self, klass: &KlassRef) -> RomizeResult<Address> {
        let class_address =
            self.classes
                .address_of(klass, &mut self.image, &mut self.pointers)?;
        let address = self.image.allocate(klass.instance_words() + 1)? + OBJECT_HEADER_BYTES;
        self.pointers.record_object(address);
        self.image.set_word(address - WORD_SIZE, class_address)?;
        self.pointers.record_edge(address, class_address);
        trace!(class = klass.name(), address, "allocated instance");
        Ok(address)
    }

    fn alloc_array(
        &mut self,
        klass: &KlassRef,
        count: u32,
        element_size: u32,
    ) -> RomizeResult<Address> {
        let class_address =
            self.classes
                .address_of(klass, &mut self.image, &mut self.pointers)?;
        let data_words = count.saturating_mul(element_size).div_ceil(WORD_SIZE);
        let address = self.image.allocate(data_words + 2)? + ARRAY_HEADER_BYTES;
        self.pointers.record_object(address);
        self.image.set_word(address - 2 * WORD_SIZE, count)?;
        self.image.set_word(address - WORD_SIZE, class_address)?;
        self.pointers.record_edge(address, class_address);
        trace!(class = klass.name(), address, count, "allocated array");
        Ok(address)
    }

    fn drain(&mut self) -> RomizeResult<()> {
        while let Some(job) = self.queue.pop_front() {
            match job {
                FillJob::Fields {
                    address,
                    object,
                    klass,
                } => self.copy_fields(address, &object, &klass)?,
                FillJob::Elements { address, object } => {
                    self.copy_elements(address, &object)?;
                }
            }
        }
        Ok(())
    }

    fn copy_elements(&mut self, address: Address, object: &HostRef) -> RomizeResult<()> {
        let HostObject::Array(array) = object.object() else {
            return Err(RomizeError::NotAnArray {
                class: object.class_name().to_string(),
            });
        };
        let ArrayData::Ref(elements) = array.data() else {
            return Err(RomizeError::NotAnArray {
                class: object.class_name().to_string(),
            });
        };
        // Clone the slot list so ensure() can borrow the builder mutably.
        let elements = elements.clone();
        for (i, slot) in elements.iter().enumerate() {
            if let Some(target) = slot {
                let target_address = self.ensure(target)?;
                self.image
                    .set_word(address + WORD_SIZE * i as u32, target_address)?;
                self.pointers.record_edge(address, target_address);
            }
        }
        Ok(())
    }

    fn copy_fields(
        &mut self,
        address: Address,
        object: &HostRef,
        klass: &KlassRef,
    ) -> RomizeResult<()> {
        let table = self.field_tables.resolve(klass, &self.symbols)?;
        for descriptor in table.iter() {
            // The second slot of a two-word field is storage, not a field.
            if tags::is_second_slot(descriptor.tag) {
                continue;
            }
            let value = object.field(&descriptor.name).ok_or_else(|| {
                RomizeError::FieldResolution {
                    class: klass.name().to_string(),
                    field: descriptor.name.clone(),
                }
            })?;
            self.set_field(address, klass, descriptor, value)?;
        }
        Ok(())
    }

    fn set_field(
        &mut self,
        address: Address,
        klass: &KlassRef,
        descriptor: &FieldDescriptor,
        value: Value,
    ) -> RomizeResult<()> {
        let target = address + descriptor.offset;
        match (descriptor.tag, value) {
            (tags::BYTE, Value::Byte(v)) => self.image.set_byte(target, v as u8)?,
            (tags::BOOLEAN, Value::Boolean(v)) => self.image.set_byte(target, u8::from(v))?,
            (tags::CHAR, Value::Char(v)) => self.image.set_half(target, v)?,
            (tags::SHORT, Value::Short(v)) => self.image.set_half(target, v as u16)?,
            (tags::INT, Value::Int(v)) => self.image.set_word(target, v as u32)?,
            (tags::FLOAT, Value::Float(v)) => self.image.set_word(target, v.to_bits())?,
            (tags::LONG, Value::Long(v)) => self.image.set_long(target, v as u64)?,
            (tags::DOUBLE, Value::Double(v)) => self.image.set_long(target, v.to_bits())?,
            (tag, Value::Ref(referent)) if !tags::is_primitive(tag) => {
                let referent_address = self.ensure(&referent)?;
                self.image.set_word(target, referent_address)?;
                self.pointers.record_edge(address, referent_address);
            }
            // A null reference keeps its zero-filled slot.
            (tag, Value::Null) if !tags::is_primitive(tag) => {}
            _ => {
                return Err(RomizeError::FieldTypeMismatch {
                    class: klass.name().to_string(),
                    field: descriptor.name.clone(),
                });
            }
        }
        Ok(())
    }
}
