//! Host object graph
//!
//! The translator hands the romizer a graph of host objects: generic
//! metadata instances, class descriptors, suites, strings and arrays.
//! Field access goes through the [`FieldSource`] trait against declared
//! field descriptors, so the copier never guesses at an object's shape.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::klass::{Klass, KlassRef};
use crate::suite::{Suite, SuiteRef};

/// Well-known class name for character strings.
pub const STRING_NAME: &str = "String";
/// Well-known class name for 8-bit character strings.
pub const BYTE_STRING_NAME: &str = "ByteString";
/// Well-known class name for member-symbol strings.
pub const SYMBOLS_NAME: &str = "Symbols";
/// Well-known class name for Class-instances.
pub const CLASS_NAME: &str = "Class";
/// Well-known class name for suites.
pub const SUITE_NAME: &str = "Suite";

/// Shared handle to a host object; identity is pointer identity.
#[derive(Debug, Clone)]
pub struct HostRef(Rc<HostObject>);

impl HostRef {
    /// Wrap a host object.
    pub fn new(object: HostObject) -> Self {
        Self(Rc::new(object))
    }

    /// Pointer identity of the underlying object.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// The wrapped object.
    pub fn object(&self) -> &HostObject {
        &self.0
    }
}

impl std::ops::Deref for HostRef {
    type Target = HostObject;

    fn deref(&self) -> &HostObject {
        &self.0
    }
}

/// A value read from a host object field or array element.
#[derive(Debug, Clone)]
pub enum Value {
    /// 8-bit signed integer.
    Byte(i8),
    /// Boolean, stored as one byte.
    Boolean(bool),
    /// 16-bit unsigned character.
    Char(u16),
    /// 16-bit signed integer.
    Short(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit IEEE float.
    Float(f32),
    /// 64-bit IEEE float.
    Double(f64),
    /// Reference to another host object.
    Ref(HostRef),
    /// Null reference; the already-zeroed image encodes it correctly.
    Null,
}

/// Typed element storage for a host array.
#[derive(Debug)]
pub enum ArrayData {
    /// `[_byte_` elements.
    Byte(Vec<i8>),
    /// `[_boolean_` elements.
    Boolean(Vec<bool>),
    /// `[_char_` elements.
    Char(Vec<u16>),
    /// `[_short_` elements.
    Short(Vec<i16>),
    /// `[_int_` elements.
    Int(Vec<i32>),
    /// `[_long_` elements.
    Long(Vec<i64>),
    /// `[_float_` elements.
    Float(Vec<f32>),
    /// `[_double_` elements.
    Double(Vec<f64>),
    /// Reference elements; `None` is a null slot.
    Ref(Vec<Option<HostRef>>),
}

impl ArrayData {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Byte(v) => v.len(),
            ArrayData::Boolean(v) => v.len(),
            ArrayData::Char(v) => v.len(),
            ArrayData::Short(v) => v.len(),
            ArrayData::Int(v) => v.len(),
            ArrayData::Long(v) => v.len(),
            ArrayData::Float(v) => v.len(),
            ArrayData::Double(v) => v.len(),
            ArrayData::Ref(v) => v.len(),
        }
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A generic metadata instance with named field values.
///
/// Field values can be patched after construction, which is how the
/// translator closes reference cycles between instances: build one node
/// with a `Null` placeholder, then set the field once the other exists.
#[derive(Debug)]
pub struct Instance {
    class_name: String,
    fields: RefCell<FxHashMap<String, Value>>,
}

impl Instance {
    /// Create an instance of the named class with the given field values.
    pub fn new(class_name: impl Into<String>, fields: Vec<(&str, Value)>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: RefCell::new(
                fields
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect(),
            ),
        }
    }

    /// Class name of this instance.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Set or replace a field value.
    pub fn set_field(&self, name: impl Into<String>, value: Value) {
        self.fields.borrow_mut().insert(name.into(), value);
    }
}

/// A host array with its declared (bracket-prefixed) class name.
#[derive(Debug)]
pub struct ArrayObject {
    class_name: String,
    data: ArrayData,
}

impl ArrayObject {
    /// Create an array of the named array class.
    pub fn new(class_name: impl Into<String>, data: ArrayData) -> Self {
        Self {
            class_name: class_name.into(),
            data,
        }
    }

    /// Array class name (e.g. `[_byte_`).
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Element storage.
    pub fn data(&self) -> &ArrayData {
        &self.data
    }
}

/// One node of the host object graph.
#[derive(Debug)]
pub enum HostObject {
    /// A generic metadata instance.
    Instance(Instance),
    /// A class descriptor; romizes through the class address table.
    Klass(KlassRef),
    /// A suite container.
    Suite(SuiteRef),
    /// A character string; layout is chosen by content at romize time.
    Str(String),
    /// A member-symbol string; must narrow to 8-bit characters.
    Symbols(String),
    /// An array.
    Array(ArrayObject),
}

impl HostObject {
    /// The host type name used to resolve this object's `Klass`.
    pub fn class_name(&self) -> &str {
        match self {
            HostObject::Instance(i) => i.class_name(),
            HostObject::Klass(_) => CLASS_NAME,
            HostObject::Suite(_) => SUITE_NAME,
            HostObject::Str(_) => STRING_NAME,
            HostObject::Symbols(_) => SYMBOLS_NAME,
            HostObject::Array(a) => a.class_name(),
        }
    }
}

/// Field access for romizable metadata types.
///
/// Returns `None` when the named field does not exist on the source object;
/// the copier reports that as a fatal field-resolution failure.
pub trait FieldSource {
    /// Read the value of the named instance field.
    fn field(&self, name: &str) -> Option<Value>;
}

impl FieldSource for Instance {
    fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }
}

impl FieldSource for Klass {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::Ref(HostRef::new(HostObject::Str(
                self.name().to_string(),
            )))),
            "superType" => Some(match self.super_class() {
                Some(s) => Value::Ref(HostRef::new(HostObject::Klass(s.clone()))),
                None => Value::Null,
            }),
            "instanceWords" => Some(Value::Int(self.instance_words() as i32)),
            "elementTag" => Some(Value::Char(self.element().unwrap_or(crate::tags::NULL))),
            _ => None,
        }
    }
}

impl FieldSource for Suite {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::Ref(HostRef::new(HostObject::Str(
                self.name().to_string(),
            )))),
            "classes" => {
                let elements = self
                    .classes()
                    .iter()
                    .map(|slot| {
                        slot.as_ref()
                            .map(|k| HostRef::new(HostObject::Klass(k.clone())))
                    })
                    .collect();
                Some(Value::Ref(HostRef::new(HostObject::Array(
                    ArrayObject::new(format!("[{CLASS_NAME}"), ArrayData::Ref(elements)),
                ))))
            }
            _ => None,
        }
    }
}

impl FieldSource for HostObject {
    fn field(&self, name: &str) -> Option<Value> {
        match self {
            HostObject::Instance(i) => i.field(name),
            HostObject::Klass(k) => k.as_ref().field(name),
            HostObject::Suite(s) => s.as_ref().field(name),
            _ => None,
        }
    }
}
