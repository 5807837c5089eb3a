//! Top-level image builder
//!
//! One [`ImageBuilder`] is constructed per image-generation run, owns all
//! mutable state for that run (segments, pools, class table, work queue),
//! and is consumed by [`ImageBuilder::build`]. There is no partial-success
//! return: any failure aborts the build and the image must be discarded.

use std::collections::VecDeque;

use acorn_image::layout::{eeprom_root, gci, rom_root};
use acorn_image::{Image, ImageConfig, SegmentKind};
use acorn_suite::{ArrayData, ArrayObject, HostObject, HostRef, KlassRef, SuiteRef, SymbolMap, tags};
use tracing::debug;

use crate::classtable::ClassTable;
use crate::collect::{PointerLog, audit_rom};
use crate::error::{RomizeError, RomizeResult};
use crate::fields::FieldTableCache;
use crate::pools::{ContentPool, IdentityPool};
use crate::registry::ClassRegistry;
use crate::romize::FillJob;

/// Name of the class recorded as the ROM bootstrap root.
const VM_EXTENSION_NAME: &str = "VmExtension";

/// The bootstrap classes resolved from suite 0 at their implicit numbers.
#[derive(Debug)]
pub(crate) struct BootKlasses {
    pub object: KlassRef,
    pub class: KlassRef,
    pub string: KlassRef,
    pub byte_string: KlassRef,
    pub symbols: KlassRef,
}

impl BootKlasses {
    fn resolve(suite0: &SuiteRef) -> RomizeResult<Self> {
        let required = |number: tags::ClassNumber, name: &str| {
            suite0.class_at(number).cloned().ok_or_else(|| {
                RomizeError::BadInput(format!("suite 0 lacks bootstrap class '{name}'"))
            })
        };
        let boot = Self {
            object: required(tags::OBJECT, "Object")?,
            class: required(tags::CLASS, "Class")?,
            string: required(tags::STRING, "String")?,
            byte_string: required(tags::BYTE_STRING, "ByteString")?,
            symbols: required(tags::SYMBOLS, "Symbols")?,
        };
        for (klass, element) in [
            (&boot.string, tags::CHAR),
            (&boot.byte_string, tags::BYTE),
            (&boot.symbols, tags::BYTE),
        ] {
            if klass.element() != Some(element) {
                return Err(RomizeError::BadInput(format!(
                    "bootstrap class '{}' has the wrong element type",
                    klass.name()
                )));
            }
        }
        Ok(boot)
    }
}

/// Per-suite byte accounting for one build.
///
/// Bootstrap and suite-table bytes are charged to suite 0.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Bytes consumed in ROM per input suite.
    pub suite_bytes: Vec<u32>,
    /// Bytes consumed by the method debug table, if one was romized.
    pub debug_table_bytes: u32,
    /// Total bytes allocated in ROM.
    pub rom_used: u32,
}

/// A finished build: the image plus its accounting.
#[derive(Debug)]
pub struct BuildOutput {
    /// The built image, ready for the external writer.
    pub image: Image,
    /// Per-suite accounting.
    pub report: BuildReport,
}

/// The heap image builder.
#[derive(Debug)]
pub struct ImageBuilder {
    pub(crate) image: Image,
    pub(crate) suites: Vec<SuiteRef>,
    pub(crate) symbols: SymbolMap,
    pub(crate) registry: ClassRegistry,
    pub(crate) classes: ClassTable,
    pub(crate) identity: IdentityPool,
    pub(crate) content: ContentPool,
    pub(crate) field_tables: FieldTableCache,
    pub(crate) queue: VecDeque<FillJob>,
    pub(crate) pointers: PointerLog,
    pub(crate) boot: BootKlasses,
}

impl ImageBuilder {
    /// Create a builder for one run.
    ///
    /// Validates the configuration and the presence of the bootstrap
    /// classes in suite 0. Allocation starts in ROM.
    pub fn new(
        config: ImageConfig,
        suites: Vec<SuiteRef>,
        symbols: SymbolMap,
    ) -> RomizeResult<Self> {
        let image = Image::new(config)?;
        let suite0 = suites
            .first()
            .ok_or_else(|| RomizeError::BadInput("no suites supplied".to_string()))?;
        let boot = BootKlasses::resolve(suite0)?;
        let registry = ClassRegistry::from_suites(&suites);
        let classes = ClassTable::new(boot.object.clone(), boot.class.clone());
        Ok(Self {
            image,
            suites,
            symbols,
            registry,
            classes,
            identity: IdentityPool::new(),
            content: ContentPool::new(),
            field_tables: FieldTableCache::new(),
            queue: VecDeque::new(),
            pointers: PointerLog::new(),
            boot,
        })
    }

    /// Build the image: bootstrap, romize the suites and the named roots,
    /// optionally audit collectible ROM, then hand allocation over to RAM.
    pub fn build(mut self, debug_table: Option<HostRef>) -> RomizeResult<BuildOutput> {
        self.bootstrap()?;

        let mut report = BuildReport {
            suite_bytes: vec![0; self.suites.len()],
            debug_table_bytes: 0,
            rom_used: 0,
        };
        // Bootstrap bytes are charged to suite 0.
        report.suite_bytes[0] = self.image.used(SegmentKind::Rom)?;

        let suite_refs: Vec<HostRef> = self
            .suites
            .iter()
            .map(|suite| HostRef::new(HostObject::Suite(suite.clone())))
            .collect();

        for (i, suite_ref) in suite_refs.iter().enumerate() {
            let name = self.suites[i].name().to_string();
            let before = self.image.used(SegmentKind::Rom)?;
            self.romize(suite_ref)?;
            let bytes = self.image.used(SegmentKind::Rom)? - before;
            report.suite_bytes[i] += bytes;
            debug!(suite = %name, bytes, "romized suite");
        }

        // The suite table is the runtime's entry point for class lookup.
        let suite_table = HostRef::new(HostObject::Array(ArrayObject::new(
            "[Suite",
            ArrayData::Ref(suite_refs.into_iter().map(Some).collect()),
        )));
        let before = self.image.used(SegmentKind::Rom)?;
        let suite_table_address = self.romize(&suite_table)?;
        report.suite_bytes[0] += self.image.used(SegmentKind::Rom)? - before;
        self.image
            .set_root(SegmentKind::Rom, rom_root::SUITE_TABLE, suite_table_address)?;

        // VmExtension is needed by runtime bootstrap but reached through
        // no suite field, so it gets its own root slot.
        let vm_extension = self.registry.lookup(VM_EXTENSION_NAME)?;
        let vm_extension_address = self.classes.address(&vm_extension)?;
        self.image.set_root(
            SegmentKind::Rom,
            rom_root::VM_EXTENSION,
            vm_extension_address,
        )?;

        if let Some(table) = debug_table {
            let before = self.image.used(SegmentKind::Rom)?;
            let address = self.romize(&table)?;
            report.debug_table_bytes = self.image.used(SegmentKind::Rom)? - before;
            self.image
                .set_root(SegmentKind::Rom, rom_root::METHOD_DEBUG_TABLE, address)?;
        }

        if self.image.config().collect_rom {
            let first = audit_rom(&self.image, &self.pointers)?;
            let second = audit_rom(&self.image, &self.pointers)?;
            if first != second {
                return Err(RomizeError::AuditFailure {
                    detail: "audit passes disagree",
                    address: 0,
                });
            }
        }

        report.rom_used = self.image.used(SegmentKind::Rom)?;
        debug!(
            rom_used = report.rom_used,
            objects = self.pointers.object_count(),
            "image build complete"
        );

        // Initialise the EEPROM free list and hand allocation over to RAM
        // for runtime initialization.
        let eeprom_free = self.image.gci(SegmentKind::Eeprom, gci::PARTITION_START)?;
        self.image
            .set_root(SegmentKind::Eeprom, eeprom_root::FREE_LIST, eeprom_free)?;
        self.image.set_current_segment(SegmentKind::Ram);

        Ok(BuildOutput {
            image: self.image,
            report,
        })
    }
}
