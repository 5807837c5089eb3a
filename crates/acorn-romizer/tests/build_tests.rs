//! End-to-end builds against a small translated class set.

use std::rc::Rc;

use acorn_image::layout::{eeprom_root, rom_root, SEGMENT_RECORD_BYTES, WORD_SIZE};
use acorn_image::{ImageConfig, SegmentExtent, SegmentKind};
use acorn_romizer::{BuildOutput, ImageBuilder, RomizeError};
use acorn_suite::{
    tags, ArrayData, ArrayObject, FieldDescriptor, HostObject, HostRef, Instance, Klass, KlassRef,
    Suite, SuiteRef, SymbolMap, SymbolTable, Value,
};

// Bootstrap lays the two meta Class-instances down first, so with the
// default ROM base of 0 their addresses are fixed: each Class-instance is
// CLASS_WORDS + 1 words, and object memory starts right after the segment
// record.
const CLASS_WORDS: u32 = 4;
const OBJECT_CI: u32 = SEGMENT_RECORD_BYTES + WORD_SIZE;
const CLASS_CI: u32 = OBJECT_CI + (CLASS_WORDS + 1) * WORD_SIZE;

struct Fixture {
    suite: SuiteRef,
    symbols: SymbolMap,
}

fn fixture() -> Fixture {
    let object = Rc::new(Klass::new("Object", 0, None));
    let class = Rc::new(Klass::new("Class", CLASS_WORDS, Some(object.clone())));
    let array = |name: &str, element| Rc::new(Klass::new_array(name, element, Some(object.clone())));
    let plain = |name: &str, words| Rc::new(Klass::new(name, words, Some(object.clone())));

    let suite_klass = plain("Suite", 2);
    let boxed = plain("Box", 1);
    let wide = plain("Wide", 2);
    let node = plain("Node", 1);

    let mut classes: Vec<Option<KlassRef>> = vec![None; (tags::LAST_IMPLICIT + 1) as usize];
    classes[tags::OBJECT as usize] = Some(object.clone());
    classes[tags::CLASS as usize] = Some(class.clone());
    classes[tags::STRING as usize] = Some(array("String", tags::CHAR));
    classes[tags::BYTE_STRING as usize] = Some(array("ByteString", tags::BYTE));
    classes[tags::SYMBOLS as usize] = Some(array("Symbols", tags::BYTE));
    classes[tags::VOID as usize] = Some(plain("_void_", 0));
    classes[tags::BOOLEAN as usize] = Some(plain("_boolean_", 0));
    classes[tags::BYTE as usize] = Some(plain("_byte_", 0));
    classes[tags::CHAR as usize] = Some(plain("_char_", 0));
    classes[tags::SHORT as usize] = Some(plain("_short_", 0));
    classes[tags::INT as usize] = Some(plain("_int_", 0));
    classes[tags::LONG as usize] = Some(plain("_long_", 0));
    classes[tags::FLOAT as usize] = Some(plain("_float_", 0));
    classes[tags::DOUBLE as usize] = Some(plain("_double_", 0));
    classes.extend([
        Some(suite_klass.clone()),
        Some(plain("VmExtension", 0)),
        Some(array("[Class", tags::CLASS)),
        Some(array("[Suite", tags::OBJECT)),
        Some(array("[Object", tags::OBJECT)),
        Some(array("[_byte_", tags::BYTE)),
        Some(array("[_int_", tags::INT)),
        Some(boxed.clone()),
        Some(wide.clone()),
        Some(node.clone()),
    ]);

    let mut symbols = SymbolMap::new();
    symbols.insert(
        class.key(),
        SymbolTable::new(vec![
            FieldDescriptor::new("name", tags::STRING, 0),
            FieldDescriptor::new("superType", tags::CLASS, 4),
            FieldDescriptor::new("instanceWords", tags::INT, 8),
            FieldDescriptor::new("elementTag", tags::CHAR, 12),
        ]),
    );
    symbols.insert(
        suite_klass.key(),
        SymbolTable::new(vec![
            FieldDescriptor::new("name", tags::STRING, 0),
            FieldDescriptor::new("classes", tags::OBJECT, 4),
        ]),
    );
    symbols.insert(
        boxed.key(),
        SymbolTable::new(vec![FieldDescriptor::new("value", tags::STRING, 0)]),
    );
    symbols.insert(
        node.key(),
        SymbolTable::new(vec![FieldDescriptor::new("next", tags::OBJECT, 0)]),
    );
    symbols.insert(
        wide.key(),
        SymbolTable::new(vec![
            FieldDescriptor::new("v", tags::LONG, 0),
            FieldDescriptor::new("v2", tags::LONG2, 4),
        ]),
    );

    Fixture {
        suite: Rc::new(Suite::new("base", classes)),
        symbols,
    }
}

fn build(debug_table: Option<HostRef>) -> BuildOutput {
    build_with(ImageConfig::default(), debug_table).unwrap()
}

fn build_with(
    config: ImageConfig,
    debug_table: Option<HostRef>,
) -> Result<BuildOutput, RomizeError> {
    let f = fixture();
    ImageBuilder::new(config, vec![f.suite], f.symbols)?.build(debug_table)
}

fn ref_table(objects: Vec<HostRef>) -> HostRef {
    HostRef::new(HostObject::Array(ArrayObject::new(
        "[Object",
        ArrayData::Ref(objects.into_iter().map(Some).collect()),
    )))
}

#[test]
fn test_bootstrap_classes_reference_each_other() {
    let out = build(None);
    let image = &out.image;

    // Both meta Class-instances point at Class's own Class-instance.
    assert_eq!(image.get_word(OBJECT_CI - WORD_SIZE).unwrap(), CLASS_CI);
    assert_eq!(image.get_word(CLASS_CI - WORD_SIZE).unwrap(), CLASS_CI);
    // Class's superType field closes the cycle back to Object.
    assert_eq!(image.get_word(CLASS_CI + 4).unwrap(), OBJECT_CI);
}

#[test]
fn test_class_instance_fields_are_copied() {
    let out = build(None);
    let image = &out.image;

    // Object's name narrows to an 8-bit string.
    let name = image.get_word(OBJECT_CI).unwrap();
    assert_eq!(image.get_word(name - 2 * WORD_SIZE).unwrap(), 6);
    for (i, expected) in b"Object".iter().enumerate() {
        assert_eq!(image.get_byte(name + i as u32).unwrap(), *expected);
    }
    // Object has no superclass and is not an array.
    assert_eq!(image.get_word(OBJECT_CI + 4).unwrap(), 0);
    assert_eq!(image.get_half(OBJECT_CI + 12).unwrap(), tags::NULL);
    assert_eq!(image.get_word(CLASS_CI + 8).unwrap(), CLASS_WORDS);
}

#[test]
fn test_suite_table_root() {
    let out = build(None);
    let image = &out.image;

    let table = image.root(SegmentKind::Rom, rom_root::SUITE_TABLE).unwrap();
    assert_ne!(table, 0);
    assert_eq!(image.get_word(table - 2 * WORD_SIZE).unwrap(), 1);

    let suite = image.get_word(table).unwrap();
    let name = image.get_word(suite).unwrap();
    assert_eq!(image.get_word(name - 2 * WORD_SIZE).unwrap(), 4);
    for (i, expected) in b"base".iter().enumerate() {
        assert_eq!(image.get_byte(name + i as u32).unwrap(), *expected);
    }

    // The class table mirrors the implicit numbering: null slot, then the
    // two meta-classes at their fixed bootstrap addresses.
    let classes = image.get_word(suite + 4).unwrap();
    assert_eq!(image.get_word(classes).unwrap(), 0);
    assert_eq!(
        image.get_word(classes + WORD_SIZE * u32::from(tags::OBJECT)).unwrap(),
        OBJECT_CI
    );
    assert_eq!(
        image.get_word(classes + WORD_SIZE * u32::from(tags::CLASS)).unwrap(),
        CLASS_CI
    );
}

#[test]
fn test_vm_extension_root() {
    let out = build(None);
    let root = out
        .image
        .root(SegmentKind::Rom, rom_root::VM_EXTENSION)
        .unwrap();
    assert_ne!(root, 0);
    assert_ne!(
        root,
        out.image.root(SegmentKind::Rom, rom_root::SUITE_TABLE).unwrap()
    );
}

#[test]
fn test_string_content_is_pooled() {
    let narrow_a = HostRef::new(HostObject::Str("hello".into()));
    let narrow_b = HostRef::new(HostObject::Str("hello".into()));
    let wide = HostRef::new(HostObject::Str("h\u{4e16}llo".into()));
    let out = build(Some(ref_table(vec![narrow_a, narrow_b, wide.clone()])));
    let image = &out.image;

    let table = image
        .root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE)
        .unwrap();
    let a = image.get_word(table).unwrap();
    let b = image.get_word(table + 4).unwrap();
    let w = image.get_word(table + 8).unwrap();

    // Distinct host objects, same characters, one image array.
    assert_eq!(a, b);
    assert_ne!(a, w);
    // The wide string keeps two-byte characters.
    assert_eq!(image.get_word(w - 2 * WORD_SIZE).unwrap(), 5);
    assert_eq!(image.get_half(w).unwrap(), u16::from(b'h'));
    assert_eq!(image.get_half(w + 2).unwrap(), 0x4e16);
}

#[test]
fn test_primitive_arrays_are_pooled_by_content() {
    let first = HostRef::new(HostObject::Array(ArrayObject::new(
        "[_int_",
        ArrayData::Int(vec![1, 2, 3]),
    )));
    let second = HostRef::new(HostObject::Array(ArrayObject::new(
        "[_int_",
        ArrayData::Int(vec![1, 2, 3]),
    )));
    let other = HostRef::new(HostObject::Array(ArrayObject::new(
        "[_int_",
        ArrayData::Int(vec![1, 2, 4]),
    )));
    let out = build(Some(ref_table(vec![first, second, other])));
    let image = &out.image;

    let table = image
        .root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE)
        .unwrap();
    let a = image.get_word(table).unwrap();
    let b = image.get_word(table + 4).unwrap();
    let c = image.get_word(table + 8).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(image.get_word(a - 2 * WORD_SIZE).unwrap(), 3);
    assert_eq!(image.get_word(a).unwrap(), 1);
    assert_eq!(image.get_word(a + 8).unwrap(), 3);
    assert_eq!(image.get_word(c + 8).unwrap(), 4);
}

#[test]
fn test_reference_arrays_keep_identity() {
    let shared = HostRef::new(HostObject::Array(ArrayObject::new(
        "[Object",
        ArrayData::Ref(vec![None]),
    )));
    let out = build(Some(ref_table(vec![shared.clone(), shared])));
    let image = &out.image;

    let table = image
        .root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE)
        .unwrap();
    // Same host object twice means the same image array twice.
    assert_eq!(
        image.get_word(table).unwrap(),
        image.get_word(table + 4).unwrap()
    );
}

#[test]
fn test_mutually_referencing_instances_terminate() {
    let a = HostRef::new(HostObject::Instance(Instance::new(
        "Node",
        vec![("next", Value::Null)],
    )));
    let b = HostRef::new(HostObject::Instance(Instance::new(
        "Node",
        vec![("next", Value::Ref(a.clone()))],
    )));
    if let HostObject::Instance(node) = a.object() {
        node.set_field("next", Value::Ref(b.clone()));
    }

    let out = build(Some(ref_table(vec![a, b])));
    let image = &out.image;

    let table = image
        .root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE)
        .unwrap();
    let addr_a = image.get_word(table).unwrap();
    let addr_b = image.get_word(table + 4).unwrap();
    assert_ne!(addr_a, addr_b);
    // Each romized copy holds the other's final address.
    assert_eq!(image.get_word(addr_a).unwrap(), addr_b);
    assert_eq!(image.get_word(addr_b).unwrap(), addr_a);
}

#[test]
fn test_zero_length_arrays_take_header_only_storage() {
    let ints = HostRef::new(HostObject::Array(ArrayObject::new(
        "[_int_",
        ArrayData::Int(vec![]),
    )));
    let bytes = HostRef::new(HostObject::Array(ArrayObject::new(
        "[_byte_",
        ArrayData::Byte(vec![]),
    )));
    let out = build(Some(ref_table(vec![ints, bytes])));
    let image = &out.image;

    let table = image
        .root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE)
        .unwrap();
    let a = image.get_word(table).unwrap();
    let b = image.get_word(table + 4).unwrap();
    // Empty content of different element types never shares storage.
    assert_ne!(a, b);
    assert_eq!(image.get_word(a - 2 * WORD_SIZE).unwrap(), 0);
    assert_eq!(image.get_word(b - 2 * WORD_SIZE).unwrap(), 0);
    // Back-to-back allocations: each array is its two header words and
    // nothing else.
    assert_eq!(b - a, 2 * WORD_SIZE);
}

#[test]
fn test_null_field_keeps_zero_slot() {
    let empty = HostRef::new(HostObject::Instance(Instance::new(
        "Box",
        vec![("value", Value::Null)],
    )));
    let out = build(Some(ref_table(vec![empty])));
    let image = &out.image;

    let table = image
        .root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE)
        .unwrap();
    let boxed = image.get_word(table).unwrap();
    assert_ne!(boxed, 0);
    assert_eq!(image.get_word(boxed).unwrap(), 0);
}

#[test]
fn test_two_word_field_skips_second_slot() {
    let wide = HostRef::new(HostObject::Instance(Instance::new(
        "Wide",
        vec![("v", Value::Long(0x0123_4567_89ab_cdef))],
    )));
    let out = build(Some(ref_table(vec![wide])));
    let image = &out.image;

    let table = image
        .root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE)
        .unwrap();
    let addr = image.get_word(table).unwrap();
    assert_eq!(image.get_long(addr).unwrap(), 0x0123_4567_89ab_cdef);
}

#[test]
fn test_symbols_must_be_narrow() {
    let ok = HostRef::new(HostObject::Symbols("main()V".into()));
    assert!(build_with(ImageConfig::default(), Some(ref_table(vec![ok]))).is_ok());

    let wide = HostRef::new(HostObject::Symbols("bad\u{0100}".into()));
    assert!(matches!(
        build_with(ImageConfig::default(), Some(ref_table(vec![wide]))),
        Err(RomizeError::WideSymbols)
    ));
}

#[test]
fn test_unknown_class_is_fatal() {
    let ghost = HostRef::new(HostObject::Instance(Instance::new("Ghost", vec![])));
    assert!(matches!(
        build_with(ImageConfig::default(), Some(ref_table(vec![ghost]))),
        Err(RomizeError::UnknownClass { .. })
    ));
}

#[test]
fn test_rom_exhaustion_aborts_the_build() {
    let config = ImageConfig {
        rom: SegmentExtent { base: 0, size: 96 },
        eeprom: SegmentExtent { base: 96, size: 68 },
        ram: SegmentExtent {
            base: 164,
            size: 68,
        },
        big_endian: false,
        collect_rom: false,
    };
    assert!(matches!(
        build_with(config, None),
        Err(RomizeError::Image(_))
    ));
}

#[test]
fn test_collectible_rom_audit_passes() {
    let config = ImageConfig {
        collect_rom: true,
        ..ImageConfig::default()
    };
    assert!(build_with(config, None).is_ok());
}

#[test]
fn test_build_hands_allocation_to_ram() {
    let out = build(None);
    assert_eq!(out.image.current_segment(), SegmentKind::Ram);
    // The EEPROM free list starts at its empty object memory.
    let config = out.image.config();
    assert_eq!(
        out.image
            .root(SegmentKind::Eeprom, eeprom_root::FREE_LIST)
            .unwrap(),
        config.eeprom.base + SEGMENT_RECORD_BYTES
    );
}

#[test]
fn test_report_accounts_every_rom_byte() {
    let table = ref_table(vec![HostRef::new(HostObject::Str("dbg".into()))]);
    let out = build(Some(table));
    let report = &out.report;

    assert_eq!(report.suite_bytes.len(), 1);
    assert!(report.suite_bytes[0] > 0);
    assert!(report.debug_table_bytes > 0);
    assert_eq!(
        report.rom_used,
        report.suite_bytes[0] + report.debug_table_bytes
    );
    assert_eq!(
        report.rom_used,
        out.image.used(SegmentKind::Rom).unwrap()
    );
}

#[test]
fn test_endianness_changes_bytes_not_values() {
    let big = build_with(
        ImageConfig {
            big_endian: true,
            ..ImageConfig::default()
        },
        None,
    )
    .unwrap();
    let little = build(None);

    // Logical reads agree while the raw encodings differ.
    assert_eq!(
        big.image.get_word(CLASS_CI - WORD_SIZE).unwrap(),
        little.image.get_word(CLASS_CI - WORD_SIZE).unwrap()
    );
    let raw_big = big.image.segment(SegmentKind::Rom).bytes();
    let raw_little = little.image.segment(SegmentKind::Rom).bytes();
    assert_ne!(raw_big, raw_little);
}
