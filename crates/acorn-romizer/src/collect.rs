//! Collectible-ROM reachability audit
//!
//! The builder records every object it allocates and every pointer it
//! writes. When ROM is configured as collectible, the driver re-proves
//! from that side table that the image it just wrote hangs together: every
//! pointer lands on an allocated object and every ROM allocation is
//! reachable from the ROM root table. The audit runs twice and the second
//! pass must confirm the first.

use acorn_image::layout::{Address, ROOT_SLOTS};
use acorn_image::{Image, SegmentKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{RomizeError, RomizeResult};

/// Side table of allocated objects and the pointers written between them.
#[derive(Debug, Default)]
pub struct PointerLog {
    objects: FxHashSet<Address>,
    edges: FxHashMap<Address, Vec<Address>>,
}

impl PointerLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly allocated object address.
    pub fn record_object(&mut self, address: Address) {
        self.objects.insert(address);
    }

    /// Record a pointer written from one object to another.
    ///
    /// Class pointers count: they are how instances keep their
    /// Class-instances live.
    pub fn record_edge(&mut self, from: Address, to: Address) {
        self.edges.entry(from).or_default().push(to);
    }

    /// Number of recorded objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn is_object(&self, address: Address) -> bool {
        self.objects.contains(&address)
    }

    fn edges_from(&self, address: Address) -> &[Address] {
        self.edges.get(&address).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Outcome of one audit pass; two passes must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditSummary {
    /// Objects reached from the ROM roots.
    pub reachable: usize,
    /// Objects allocated in ROM.
    pub rom_objects: usize,
}

/// Mark from the ROM root table and verify the recorded graph.
pub fn audit_rom(image: &Image, log: &PointerLog) -> RomizeResult<AuditSummary> {
    let mut marked: FxHashSet<Address> = FxHashSet::default();
    let mut worklist: Vec<Address> = Vec::new();

    for slot in 0..ROOT_SLOTS {
        let target = image.root(SegmentKind::Rom, slot)?;
        if target != 0 {
            worklist.push(target);
        }
    }

    while let Some(address) = worklist.pop() {
        if !log.is_object(address) {
            return Err(RomizeError::AuditFailure {
                detail: "pointer target is not an allocated object",
                address,
            });
        }
        if image.segment_containing(address).is_none() {
            return Err(RomizeError::AuditFailure {
                detail: "pointer target is outside every segment",
                address,
            });
        }
        if marked.insert(address) {
            worklist.extend_from_slice(log.edges_from(address));
        }
    }

    let rom = image.segment(SegmentKind::Rom);
    let mut rom_objects = 0;
    for &object in &log.objects {
        if rom.contains(object) {
            rom_objects += 1;
            if !marked.contains(&object) {
                return Err(RomizeError::AuditFailure {
                    detail: "object in collectible ROM is unreachable from the roots",
                    address: object,
                });
            }
        }
    }

    let summary = AuditSummary {
        reachable: marked.len(),
        rom_objects,
    };
    debug!(
        reachable = summary.reachable,
        rom_objects = summary.rom_objects,
        "ROM audit pass"
    );
    Ok(summary)
}
