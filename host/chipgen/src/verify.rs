//! Model validation
//!
//! Every check runs independently and every violation is collected; nothing short-circuits. The
//! per-peripheral-type checks have no cross dependencies and run in parallel, but the resulting
//! list is in declaration order and identical to [`Device::violations_sequential`].

use core::ops::Deref;
use std::collections::{btree_map, BTreeMap, BTreeSet};

use heck::SnakeCase;
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    error::Report,
    fmt::Hex,
    ir::{Bitfield, Device, Item, MemoryRegion, Peripheral, Register, Slot, VectorTable},
};

/// Minimum alignment of a peripheral base address, in bytes
pub const PERIPHERAL_ALIGN: u64 = 4;

/// Items the register API declares next to the peripheral modules and instances
const ROOT_ITEMS: &[&str] = &[
    "Bits",
    "Interrupt",
    "NotSendOrSync",
    "Peripheral",
    "PhantomData",
    "core",
    "memory",
];

/// Methods of the read view besides the bitfield getters
const R_METHODS: &[&str] = &["bits"];

/// Methods of the write view besides the bitfield setters
const W_METHODS: &[&str] = &["copy", "zero"];

/// A broken invariant of the chip description
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("{kind} {name:?} in {scope} is not a valid identifier")]
    InvalidName {
        kind: &'static str,
        scope: String,
        name: String,
    },

    #[error("{kind} {name} is declared more than once in {scope}")]
    DuplicateName {
        kind: &'static str,
        scope: String,
        name: String,
    },

    #[error("bitfield {register}.{field} has a width of 0 bits")]
    ZeroWidthField { register: String, field: String },

    #[error(
        "bitfield {register}.{field} (offset: {offset}, width: {width}) exceeds register width ({register_width})"
    )]
    FieldOutOfRange {
        register: String,
        field: String,
        offset: u8,
        width: u8,
        register_width: u8,
    },

    #[error("bitfield {register}.{field} overlaps with bitfield {other}")]
    FieldOverlap {
        register: String,
        field: String,
        other: String,
    },

    #[error("bitfield {register}.{field} is {field_access} but its register is {register_access}")]
    FieldAccess {
        register: String,
        field: String,
        field_access: &'static str,
        register_access: &'static str,
    },

    #[error("value {value_name} ({value}) of bitfield {register}.{field} does not fit in {width} bits")]
    ValueTooWide {
        register: String,
        field: String,
        value_name: String,
        value: Hex<u64>,
        width: u8,
    },

    #[error("values {value_name} and {other} of bitfield {register}.{field} are both {value}")]
    DuplicateValue {
        register: String,
        field: String,
        value_name: String,
        other: String,
        value: Hex<u64>,
    },

    #[error("registers {other} and {register} of {peripheral} share offset {offset}")]
    DuplicateOffset {
        peripheral: String,
        register: String,
        other: String,
        offset: Hex<u64>,
    },

    #[error("register {peripheral}.{register} (offset {offset}) is not aligned to its width ({width} bytes)")]
    MisalignedRegister {
        peripheral: String,
        register: String,
        offset: Hex<u64>,
        width: u64,
    },

    #[error(
        "register {peripheral}.{register} (offset {offset}) is declared after {previous} (offset {previous_offset}); offsets must increase"
    )]
    OutOfOrder {
        peripheral: String,
        register: String,
        offset: Hex<u64>,
        previous: String,
        previous_offset: Hex<u64>,
    },

    #[error("register {peripheral}.{register} (offset {offset}) overlaps {previous}, which ends at {end}")]
    RegisterOverlap {
        peripheral: String,
        register: String,
        offset: Hex<u64>,
        previous: String,
        end: Hex<u64>,
    },

    #[error(
        "bytes {start}..{end} of {peripheral} before register {register} are not declared; add reserved padding"
    )]
    UndeclaredGap {
        peripheral: String,
        register: String,
        start: Hex<u64>,
        end: Hex<u64>,
    },

    #[error("peripheral {peripheral} declares a size of {size} bytes but its registers and padding span {span}")]
    SizeMismatch {
        peripheral: String,
        size: Hex<u64>,
        span: Hex<u64>,
    },

    #[error(
        "register array {peripheral}.{register} has {count} elements {stride} bytes apart; arrays must have at least one element and a stride equal to the register width ({width} bytes)"
    )]
    ArrayStride {
        peripheral: String,
        register: String,
        count: u32,
        stride: u64,
        width: u64,
    },

    #[error("base address {base} of instance {instance} is not aligned to {align} bytes")]
    MisalignedInstance {
        instance: String,
        base: Hex<u64>,
        align: u64,
    },

    #[error("instances {first} and {second} both claim base address {base}")]
    AddressConflict {
        first: String,
        second: String,
        base: Hex<u64>,
    },

    #[error("instance {second} ({second_start}..{second_end}) overlaps instance {first} ({first_start}..{first_end})")]
    InstanceOverlap {
        first: String,
        first_start: Hex<u64>,
        first_end: Hex<u64>,
        second: String,
        second_start: Hex<u64>,
        second_end: Hex<u64>,
    },

    #[error("interrupts {first} and {second} both use IRQ {irq}")]
    DuplicateIrq {
        irq: u16,
        first: String,
        second: String,
    },

    #[error("interrupt {interrupt} uses IRQ {irq} but {arch} supports at most {max} interrupts")]
    IrqOutOfRange {
        interrupt: String,
        irq: u16,
        arch: String,
        max: u16,
    },

    #[error("the vector table has {actual} slots; expected {expected}")]
    VectorTableLength { actual: usize, expected: usize },

    #[error("vector table slot {index} holds {found}; expected {expected}")]
    VectorSlot {
        index: usize,
        found: String,
        expected: String,
    },

    #[error("instance {instance} refers to undeclared peripheral type {peripheral}")]
    UnknownPeripheral { instance: String, peripheral: String },

    #[error("interrupt {interrupt} refers to undeclared instance {instance}")]
    UnknownInstance { interrupt: String, instance: String },

    #[error("memory regions {first} and {second} overlap")]
    RegionOverlap { first: String, second: String },

    #[error("instance {instance} ({start}..{end}) does not lie in a peripheral memory region")]
    OutsideMemoryMap {
        instance: String,
        start: Hex<u64>,
        end: Hex<u64>,
    },
}

/// A device that passed validation
///
/// It can't be mutated any more; emitters only accept this type.
pub struct Verified<'a> {
    device: Device<'a>,
}

impl<'a> Verified<'a> {
    pub fn into_inner(self) -> Device<'a> {
        self.device
    }
}

impl<'a> Deref for Verified<'a> {
    type Target = Device<'a>;

    fn deref(&self) -> &Device<'a> {
        &self.device
    }
}

impl<'a> Device<'a> {
    /// Checks every invariant of the model
    pub fn verify(self) -> Result<Verified<'a>, Report<Violation>> {
        Report::check(self.violations())?;
        Ok(Verified { device: self })
    }

    /// All violations; peripheral types are checked in parallel
    pub fn violations(&self) -> Vec<Violation> {
        self.collect(|peripherals| {
            peripherals
                .par_iter()
                .map(|p| p.violations())
                .collect()
        })
    }

    /// Same as [`Device::violations`] but on the calling thread
    pub fn violations_sequential(&self) -> Vec<Violation> {
        self.collect(|peripherals| peripherals.iter().map(|p| p.violations()).collect())
    }

    fn collect(
        &self,
        per_type: impl FnOnce(&[Peripheral<'a>]) -> Vec<Vec<Violation>>,
    ) -> Vec<Violation> {
        let mut out = vec![];
        self.verify_names(&mut out);
        out.extend(per_type(&self.peripherals).into_iter().flatten());
        self.verify_instances(&mut out);
        self.verify_interrupts(&mut out);
        self.verify_vectors(&mut out);
        self.verify_references(&mut out);
        self.verify_memory(&mut out);
        out
    }

    fn verify_names(&self, out: &mut Vec<Violation>) {
        let scope = format!("device {}", self.name);
        names(
            "peripheral type",
            &scope,
            self.peripherals.iter().map(|p| &*p.name),
            out,
        );
        names(
            "instance",
            &scope,
            self.instances.iter().map(|i| &*i.name),
            out,
        );
        names(
            "interrupt",
            &scope,
            self.interrupts.iter().map(|i| &*i.name),
            out,
        );
        names(
            "memory region",
            &scope,
            self.memory.iter().map(|r| &*r.name),
            out,
        );

        // peripheral modules and instance structs share the root namespace of the register API
        emitted(
            "the generated crate",
            ROOT_ITEMS,
            self.peripherals
                .iter()
                .map(|p| ("module", &*p.name, escape(&p.name.to_snake_case())))
                .chain(
                    self.instances
                        .iter()
                        .map(|i| ("struct", &*i.name, escape(&i.name))),
                ),
            out,
        );
        emitted(
            "enum Interrupt",
            &[],
            self.interrupts
                .iter()
                .map(|i| ("variant", &*i.name, escape(&i.name))),
            out,
        );
    }

    fn verify_instances(&self, out: &mut Vec<Violation>) {
        let mut ranges = vec![];
        for (i, instance) in self.instances.iter().enumerate() {
            let base = instance.base_address;
            if base % PERIPHERAL_ALIGN != 0 {
                out.push(Violation::MisalignedInstance {
                    instance: instance.name.to_string(),
                    base: Hex(base),
                    align: PERIPHERAL_ALIGN,
                });
            }

            // unresolved types are reported by `verify_references`
            if let Some(periph) = self.peripheral(&instance.peripheral) {
                ranges.push((base, base.saturating_add(periph.size), i));
            }
        }

        // sorted interval scan; ties keep declaration order
        ranges.sort_by_key(|&(start, _, i)| (start, i));

        let name = |i: usize| self.instances[i].name.to_string();
        let mut previous: Option<(u64, usize)> = None;
        // the range that reaches furthest so far
        let mut reach: Option<(u64, u64, usize)> = None;
        for &(start, end, i) in &ranges {
            match (previous, reach) {
                (Some((prev_start, j)), _) if prev_start == start => {
                    out.push(Violation::AddressConflict {
                        first: name(j),
                        second: name(i),
                        base: Hex(start),
                    });
                }

                (_, Some((first_start, first_end, j))) if start < first_end => {
                    out.push(Violation::InstanceOverlap {
                        first: name(j),
                        first_start: Hex(first_start),
                        first_end: Hex(first_end),
                        second: name(i),
                        second_start: Hex(start),
                        second_end: Hex(end),
                    });
                }

                _ => {}
            }

            previous = Some((start, i));
            match reach {
                Some((_, reach_end, _)) if reach_end >= end => {}
                _ => reach = Some((start, end, i)),
            }
        }
    }

    fn verify_interrupts(&self, out: &mut Vec<Violation>) {
        let max = self.arch.max_interrupts();
        let mut seen = BTreeMap::new();
        for interrupt in &self.interrupts {
            if interrupt.value >= max {
                out.push(Violation::IrqOutOfRange {
                    interrupt: interrupt.name.to_string(),
                    irq: interrupt.value,
                    arch: self.arch.to_string(),
                    max,
                });
            }

            match seen.entry(interrupt.value) {
                btree_map::Entry::Occupied(e) => out.push(Violation::DuplicateIrq {
                    irq: interrupt.value,
                    first: String::from(*e.get()),
                    second: interrupt.name.to_string(),
                }),
                btree_map::Entry::Vacant(e) => {
                    e.insert(&*interrupt.name);
                }
            }
        }
    }

    fn verify_vectors(&self, out: &mut Vec<Violation>) {
        let expected = VectorTable::new(self.arch, &self.interrupts);
        if self.vectors.len() != expected.len() {
            out.push(Violation::VectorTableLength {
                actual: self.vectors.len(),
                expected: expected.len(),
            });
        }

        for (index, (found, want)) in self.vectors.slots.iter().zip(&expected.slots).enumerate() {
            let ok = match (found, want) {
                // any of the interrupts that share an IRQ number may take the slot
                (Slot::Interrupt { irq, name }, Slot::Interrupt { irq: want_irq, .. }) => {
                    irq == want_irq
                        && self
                            .interrupts
                            .iter()
                            .any(|i| i.value == *irq && i.name == *name)
                }
                _ => found == want,
            };

            if !ok {
                out.push(Violation::VectorSlot {
                    index,
                    found: found.to_string(),
                    expected: want.to_string(),
                });
            }
        }
    }

    fn verify_references(&self, out: &mut Vec<Violation>) {
        for instance in &self.instances {
            if self.peripheral(&instance.peripheral).is_none() {
                out.push(Violation::UnknownPeripheral {
                    instance: instance.name.to_string(),
                    peripheral: instance.peripheral.to_string(),
                });
            }
        }

        for interrupt in &self.interrupts {
            for owner in &interrupt.owners {
                if self.instance(owner).is_none() {
                    out.push(Violation::UnknownInstance {
                        interrupt: interrupt.name.to_string(),
                        instance: owner.to_string(),
                    });
                }
            }
        }
    }

    fn verify_memory(&self, out: &mut Vec<Violation>) {
        if self.memory.is_empty() {
            return;
        }

        let mut regions = self.memory.iter().collect::<Vec<_>>();
        regions.sort_by_key(|r| r.start);
        // regions that extend past the start of the current one
        let mut open: Vec<&MemoryRegion<'_>> = vec![];
        for region in regions {
            open.retain(|r| r.end() > region.start);
            for first in &open {
                out.push(Violation::RegionOverlap {
                    first: first.name.to_string(),
                    second: region.name.to_string(),
                });
            }
            open.push(region);
        }

        for instance in &self.instances {
            if let Some(periph) = self.peripheral(&instance.peripheral) {
                let start = instance.base_address;
                let end = start.saturating_add(periph.size);
                if !self
                    .memory
                    .iter()
                    .any(|r| r.kind.holds_peripherals() && r.contains(start, end))
                {
                    out.push(Violation::OutsideMemoryMap {
                        instance: instance.name.to_string(),
                        start: Hex(start),
                        end: Hex(end),
                    });
                }
            }
        }
    }
}

impl Peripheral<'_> {
    fn violations(&self) -> Vec<Violation> {
        let mut out = vec![];
        let scope = format!("peripheral {}", self.name);
        names("register", &scope, self.registers().map(|r| &*r.name), &mut out);

        let module = self.name.to_snake_case();
        emitted(
            &format!("module {}", module),
            &[],
            self.registers()
                .map(|r| ("module", &*r.name, escape(&r.name.to_snake_case()))),
            &mut out,
        );
        emitted(
            &format!("struct {}::Registers", module),
            &[],
            self.registers()
                .map(|r| ("field", &*r.name, escape(&r.name))),
            &mut out,
        );

        for reg in self.registers() {
            reg.verify(&self.name, &mut out);
        }

        self.verify_layout(&mut out);
        out
    }

    /// Offsets must increase and every byte must be accounted for by a register or padding
    fn verify_layout(&self, out: &mut Vec<Violation>) {
        let periph = &*self.name;
        let mut offsets = BTreeMap::new();
        let mut cursor = 0u64;
        let mut last = String::from("the start of the block");
        let mut previous: Option<&Register<'_>> = None;

        for item in &self.items {
            let reg = match item {
                Item::Reserved { size } => {
                    cursor = cursor.saturating_add(*size);
                    last = String::from("reserved padding");
                    continue;
                }
                Item::Register(reg) => reg,
            };

            let offset = reg.offset;
            let width = reg.width.bytes();
            if offset % width != 0 {
                out.push(Violation::MisalignedRegister {
                    peripheral: periph.to_string(),
                    register: reg.name.to_string(),
                    offset: Hex(offset),
                    width,
                });
            }

            if let Some(dim) = reg.dim {
                if dim.count == 0 || dim.stride != width {
                    out.push(Violation::ArrayStride {
                        peripheral: periph.to_string(),
                        register: reg.name.to_string(),
                        count: dim.count,
                        stride: dim.stride,
                        width,
                    });
                }
            }

            match offsets.entry(offset) {
                btree_map::Entry::Occupied(e) => {
                    out.push(Violation::DuplicateOffset {
                        peripheral: periph.to_string(),
                        register: reg.name.to_string(),
                        other: String::from(*e.get()),
                        offset: Hex(offset),
                    });
                }

                btree_map::Entry::Vacant(e) => {
                    e.insert(&*reg.name);

                    match previous {
                        Some(prev) if offset < prev.offset => out.push(Violation::OutOfOrder {
                            peripheral: periph.to_string(),
                            register: reg.name.to_string(),
                            offset: Hex(offset),
                            previous: prev.name.to_string(),
                            previous_offset: Hex(prev.offset),
                        }),

                        _ if offset < cursor => out.push(Violation::RegisterOverlap {
                            peripheral: periph.to_string(),
                            register: reg.name.to_string(),
                            offset: Hex(offset),
                            previous: last.clone(),
                            end: Hex(cursor),
                        }),

                        _ if offset > cursor => out.push(Violation::UndeclaredGap {
                            peripheral: periph.to_string(),
                            register: reg.name.to_string(),
                            start: Hex(cursor),
                            end: Hex(offset),
                        }),

                        _ => {}
                    }
                }
            }

            cursor = cursor.max(offset.saturating_add(reg.span()));
            last = format!("register {}", reg.name);
            previous = Some(reg);
        }

        if cursor != self.size {
            out.push(Violation::SizeMismatch {
                peripheral: periph.to_string(),
                size: Hex(self.size),
                span: Hex(cursor),
            });
        }
    }
}

impl Register<'_> {
    fn verify(&self, peripheral: &str, out: &mut Vec<Violation>) {
        let path = format!("{}.{}", peripheral, self.name);
        let reg_width = self.width.bits();

        for field in &self.fields {
            if !is_ident(&field.name) {
                out.push(Violation::InvalidName {
                    kind: "bitfield",
                    scope: format!("register {}", path),
                    name: field.name.to_string(),
                });
            }

            if field.width == 0 {
                out.push(Violation::ZeroWidthField {
                    register: path.clone(),
                    field: field.name.to_string(),
                });
            } else if field.end() > u16::from(reg_width) {
                out.push(Violation::FieldOutOfRange {
                    register: path.clone(),
                    field: field.name.to_string(),
                    offset: field.offset,
                    width: field.width,
                    register_width: reg_width,
                });
            }

            if (field.access.can_read() && !self.access.can_read())
                || (field.access.can_write() && !self.access.can_write())
            {
                out.push(Violation::FieldAccess {
                    register: path.clone(),
                    field: field.name.to_string(),
                    field_access: field.access.as_str(),
                    register_access: self.access.as_str(),
                });
            }

            field.verify_values(&path, out);
        }

        // a read-only and a write-only bitfield may alias the same bits
        let mut overlaps = BTreeSet::new();
        for fields in [
            self.r_fields().collect::<Vec<_>>(),
            self.w_fields().collect::<Vec<_>>(),
        ]
        .iter()
        {
            let scope = format!("register {}", path);
            let mut seen = BTreeSet::new();
            for field in fields {
                if is_ident(&field.name) && !seen.insert(&*field.name) {
                    out.push(Violation::DuplicateName {
                        kind: "bitfield",
                        scope: scope.clone(),
                        name: field.name.to_string(),
                    });
                }
            }

            check_for_overlap(&path, fields, &mut overlaps, out);
        }

        let module = format!(
            "{}::{}",
            peripheral.to_snake_case(),
            self.name.to_snake_case()
        );
        emitted(
            &format!("impl {}::R", module),
            R_METHODS,
            self.r_fields().flat_map(|f| f.methods()),
            out,
        );
        emitted(
            &format!("impl {}::W", module),
            W_METHODS,
            self.w_fields().flat_map(|f| f.methods()),
            out,
        );
    }
}

fn check_for_overlap(
    path: &str,
    fields: &[&Bitfield<'_>],
    reported: &mut BTreeSet<(String, String)>,
    out: &mut Vec<Violation>,
) {
    let mut used: Vec<(u64, &str)> = vec![];
    for field in fields {
        let mask = field.shifted_mask();
        if field.width == 0 {
            continue;
        }

        if let Some((_, other)) = used.iter().find(|(m, _)| m & mask != 0) {
            let pair = (field.name.to_string(), other.to_string());
            // read-write fields are visited once per direction
            if reported.insert(pair.clone()) {
                out.push(Violation::FieldOverlap {
                    register: path.to_string(),
                    field: pair.0,
                    other: pair.1,
                });
            }
        }

        used.push((mask, &*field.name));
    }
}

impl Bitfield<'_> {
    /// Accessor methods of the bitfield; enumerated ones also get a raw `<NAME>_bits` method
    fn methods(&self) -> Vec<(&'static str, &str, String)> {
        let mut methods = vec![("method", &*self.name, escape(&self.name))];
        if self.is_enumerated() {
            methods.push(("method", &*self.name, format!("{}_bits", self.name)));
        }
        methods
    }

    fn verify_values(&self, register: &str, out: &mut Vec<Violation>) {
        let scope = format!("bitfield {}.{}", register, self.name);
        names(
            "enumerated value",
            &scope,
            self.values.iter().map(|v| &*v.name),
            out,
        );
        emitted(
            &format!("enum {}_A", self.name),
            &[],
            self.values
                .iter()
                .map(|v| ("variant", &*v.name, escape(&v.name))),
            out,
        );

        let mut seen = BTreeMap::new();
        for value in &self.values {
            if self.width != 0 && value.value > self.mask() {
                out.push(Violation::ValueTooWide {
                    register: register.to_string(),
                    field: self.name.to_string(),
                    value_name: value.name.to_string(),
                    value: Hex(value.value),
                    width: self.width,
                });
            }

            match seen.entry(value.value) {
                btree_map::Entry::Occupied(e) => out.push(Violation::DuplicateValue {
                    register: register.to_string(),
                    field: self.name.to_string(),
                    value_name: value.name.to_string(),
                    other: String::from(*e.get()),
                    value: Hex(value.value),
                }),
                btree_map::Entry::Vacant(e) => {
                    e.insert(&*value.name);
                }
            }
        }
    }
}

fn names<'n>(
    kind: &'static str,
    scope: &str,
    names: impl Iterator<Item = &'n str>,
    out: &mut Vec<Violation>,
) {
    let mut seen = BTreeSet::new();
    for name in names {
        if !is_ident(name) {
            out.push(Violation::InvalidName {
                kind,
                scope: scope.to_string(),
                name: name.to_string(),
            });
        } else if !seen.insert(name) {
            out.push(Violation::DuplicateName {
                kind,
                scope: scope.to_string(),
                name: name.to_string(),
            });
        }
    }
}

/// Checks the identifiers the register API declares in one namespace
///
/// `items` yields `(kind, name in the model, emitted identifier)`. Two items clash when they are
/// emitted as the same identifier, or as one of the `reserved` identifiers. Items declared twice
/// under the same name are left to [`names`].
fn emitted<'n>(
    scope: &str,
    reserved: &[&str],
    items: impl Iterator<Item = (&'static str, &'n str, String)>,
    out: &mut Vec<Violation>,
) {
    let mut seen: BTreeMap<String, (&'static str, &'n str)> = BTreeMap::new();
    for (kind, name, ident) in items {
        if !is_ident(name) {
            continue;
        }

        if !is_ident(&ident) {
            out.push(Violation::InvalidName {
                kind,
                scope: scope.to_string(),
                name: ident,
            });
        } else if reserved.contains(&&*ident) {
            out.push(Violation::DuplicateName {
                kind,
                scope: scope.to_string(),
                name: ident,
            });
        } else {
            match seen.entry(ident) {
                btree_map::Entry::Occupied(e) => {
                    if *e.get() != (kind, name) {
                        out.push(Violation::DuplicateName {
                            kind,
                            scope: scope.to_string(),
                            name: e.key().clone(),
                        });
                    }
                }
                btree_map::Entry::Vacant(e) => {
                    e.insert((kind, name));
                }
            }
        }
    }
}

/// Rust keywords; the register API appends `_` to identifiers that match one
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "do", "dyn", "else",
    "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in", "let", "loop", "macro",
    "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "self", "Self",
    "static", "struct", "super", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

pub(crate) fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

/// The identifier the register API declares for `name`
pub(crate) fn escape(name: &str) -> String {
    if is_keyword(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`, excluding a lone `_`
pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }

    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
