//! Class numbers and type tags
//!
//! Field and array-element types are identified by the class number of the
//! type, drawn from a closed set of implicitly numbered bootstrap classes.
//! Any number outside the primitive range denotes a reference type.

/// Class number: index of a class within its suite's class table.
pub type ClassNumber = u16;

/// The null class number; never a valid field or element type.
pub const NULL: ClassNumber = 0;
/// `Object`, the root of the class hierarchy.
pub const OBJECT: ClassNumber = 1;
/// `Class`, the class of every Class-instance (including its own).
pub const CLASS: ClassNumber = 2;
/// `String`, a character sequence stored as 16-bit elements.
pub const STRING: ClassNumber = 3;
/// `ByteString`, a character sequence narrowed to 8-bit elements.
pub const BYTE_STRING: ClassNumber = 4;
/// `Symbols`, the packed member-symbol string of a class.
pub const SYMBOLS: ClassNumber = 5;
/// `_void_`.
pub const VOID: ClassNumber = 6;
/// `_boolean_`.
pub const BOOLEAN: ClassNumber = 7;
/// `_byte_`.
pub const BYTE: ClassNumber = 8;
/// `_char_`.
pub const CHAR: ClassNumber = 9;
/// `_short_`.
pub const SHORT: ClassNumber = 10;
/// `_int_`.
pub const INT: ClassNumber = 11;
/// `_long_`.
pub const LONG: ClassNumber = 12;
/// Second word of a `_long_` field; shares storage with the first.
pub const LONG2: ClassNumber = 13;
/// `_float_`.
pub const FLOAT: ClassNumber = 14;
/// `_double_`.
pub const DOUBLE: ClassNumber = 15;
/// Second word of a `_double_` field; shares storage with the first.
pub const DOUBLE2: ClassNumber = 16;

/// First class number allocated during bootstrap.
pub const FIRST_IMPLICIT: ClassNumber = OBJECT;
/// Last class number allocated during bootstrap.
pub const LAST_IMPLICIT: ClassNumber = DOUBLE2;

/// Size in bytes of a field of the given type when packed into an instance.
pub fn packed_size(tag: ClassNumber) -> u32 {
    match tag {
        BOOLEAN | BYTE => 1,
        CHAR | SHORT => 2,
        _ => 4,
    }
}

/// Size in bytes of an element of the given type when stored in an array.
///
/// References are stored as one-word pointers.
pub fn element_size(tag: ClassNumber) -> u32 {
    match tag {
        LONG | DOUBLE => 8,
        CHAR | SHORT => 2,
        BOOLEAN | BYTE => 1,
        _ => 4,
    }
}

/// Whether the tag denotes a primitive value type.
///
/// Arrays of primitive elements are canonicalized by content; everything
/// else is pooled by identity.
pub fn is_primitive(tag: ClassNumber) -> bool {
    matches!(
        tag,
        BOOLEAN | BYTE | CHAR | SHORT | INT | LONG | FLOAT | DOUBLE
    )
}

/// Whether the tag marks the second logical slot of a 64-bit field.
pub fn is_second_slot(tag: ClassNumber) -> bool {
    matches!(tag, LONG2 | DOUBLE2)
}
