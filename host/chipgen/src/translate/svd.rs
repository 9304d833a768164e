//! CMSIS-SVD front-end
//!
//! Lowering rules:
//!
//! - peripherals without `derivedFrom` become peripheral types; every peripheral becomes an
//!   instance and derived ones share the type of their base
//! - a type is named after its peripheral minus the trailing instance number (`UART0` ->
//!   `UART`) unless that name is ambiguous
//! - clusters are flattened (`<CLUSTER>_<REGISTER>`); register arrays whose elements are
//!   contiguous stay arrays, other arrays are expanded into one register per element
//! - `read-writeOnce` and `writeOnce` lower to read-write and write-only
//! - bitfield access is narrowed to what the register allows

use core::convert::TryFrom;
use std::{borrow::Cow, collections::BTreeMap};

use anyhow::{anyhow, bail, Context};
use log::{debug, warn};
use svd_parser as svd;

use crate::{
    cm, ir,
    translate::svd as translate,
    verify::is_ident,
};

/// Parses a CMSIS-SVD document
pub fn parse(xml: &str) -> Result<svd::Device, anyhow::Error> {
    Ok(svd::parse(xml)?)
}

pub fn device(d: &svd::Device) -> Result<ir::Device<'_>, anyhow::Error> {
    let defaults = Defaults::default().inherit(&d.default_register_properties);

    let bases = d
        .peripherals
        .iter()
        .filter(|p| p.derived_from.is_none())
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>();
    let type_names = translate::type_names(&bases);

    let mut peripherals = vec![];
    let mut instances = vec![];
    for periph in &d.peripherals {
        let base = translate::base_of(&d.peripherals, periph)?;
        let type_name = type_names
            .get(base.name.as_str())
            .ok_or_else(|| anyhow!("peripheral {} has no type", base.name))?;

        if periph.derived_from.is_none() {
            peripherals.push(
                translate::peripheral(periph, type_name.clone(), defaults)
                    .with_context(|| format!("while translating peripheral {}", periph.name))?,
            );
        } else if periph.registers.is_some() {
            warn!(
                "{}: registers of a derived peripheral are ignored; using those of {}",
                periph.name, base.name
            );
        }

        instances.push(ir::Instance {
            base_address: u64::from(periph.base_address),
            description: periph
                .description
                .as_ref()
                .or_else(|| base.description.as_ref())
                .map(|s| s.as_str().into()),
            name: periph.name.as_str().into(),
            peripheral: type_name.clone().into(),
        });
    }

    let interrupts = translate::interrupts(&d.peripherals)?;
    let arch = match &d.cpu {
        Some(cpu) => ir::Arch::from_cpu_name(&cpu.name),
        None => {
            warn!("no <cpu> element; assuming {}", ir::Arch::ArmV7M);
            ir::Arch::ArmV7M
        }
    };
    debug!(
        "{}: {} peripheral types, {} instances, {} interrupts ({})",
        d.name,
        peripherals.len(),
        instances.len(),
        interrupts.len(),
        arch
    );

    Ok(ir::Device {
        arch,
        extra_docs: None,
        instances,
        memory: cm::memory_map(),
        name: d.name.as_str().into(),
        peripherals,
        vectors: ir::VectorTable::new(arch, &interrupts),
        interrupts,
    })
}

/// Register properties inherited from enclosing elements
#[derive(Clone, Copy, Default)]
struct Defaults {
    access: Option<svd::Access>,
    size: Option<u32>,
}

impl Defaults {
    fn inherit(self, props: &svd::RegisterProperties) -> Self {
        Defaults {
            access: props.access.or(self.access),
            size: props.size.or(self.size),
        }
    }
}

/// `peripheral name -> type name` for the non-derived peripherals
fn type_names<'p>(bases: &[&'p str]) -> BTreeMap<&'p str, String> {
    let strip = |name: &'p str| name.trim_end_matches(|c: char| c.is_ascii_digit());

    bases
        .iter()
        .map(|&name| {
            let short = strip(name);
            let unique = is_ident(short) && bases.iter().filter(|&&o| strip(o) == short).count() == 1;
            (name, if unique { short } else { name }.to_string())
        })
        .collect()
}

/// Follows the `derivedFrom` chain of `periph`
fn base_of<'d>(
    peripherals: &'d [svd::Peripheral],
    periph: &'d svd::Peripheral,
) -> Result<&'d svd::Peripheral, anyhow::Error> {
    let mut current = periph;
    // a longer chain must contain a cycle
    for _ in 0..=peripherals.len() {
        match &current.derived_from {
            None => return Ok(current),
            Some(base) => {
                current = peripherals
                    .iter()
                    .find(|p| p.name == *base)
                    .ok_or_else(|| {
                        anyhow!(
                            "peripheral {} is derived from unknown peripheral {}",
                            periph.name,
                            base
                        )
                    })?;
            }
        }
    }

    bail!("peripheral {} has a cyclic derivedFrom chain", periph.name)
}

fn peripheral(
    p: &svd::Peripheral,
    name: String,
    defaults: Defaults,
) -> Result<ir::Peripheral<'_>, anyhow::Error> {
    let defaults = defaults.inherit(&p.default_register_properties);

    let mut registers = vec![];
    match p.registers.as_ref() {
        Some(items) => translate::lower(items, "", 0, defaults, &mut registers)?,
        None => debug!("{}: no registers", p.name),
    }

    let span = registers
        .iter()
        .map(|r| r.offset + r.span())
        .max()
        .unwrap_or(0);
    // size of the register block as declared by `<addressBlock>`
    let block_end = p
        .address_block
        .as_ref()
        .map(|b| u64::from(b.offset) + u64::from(b.size));
    let size = match block_end {
        Some(end) if end >= span => Some(end),
        Some(end) => {
            warn!(
                "{}: the address block ({} bytes) is smaller than the registers ({} bytes)",
                p.name, end, span
            );
            None
        }
        None => None,
    };

    Ok(ir::Peripheral::from_registers(
        name.into(),
        p.description.as_ref().map(|s| s.as_str().into()),
        registers,
        size,
    ))
}

fn prefixed<'a>(prefix: &str, name: Cow<'a, str>) -> Cow<'a, str> {
    if prefix.is_empty() {
        name
    } else {
        format!("{}_{}", prefix, name).into()
    }
}

/// Element names of an array: `dimIndex` if given, `0..dim` otherwise
fn indices(dim: &svd::DimElement) -> Vec<String> {
    match &dim.dim_index {
        Some(index) if index.len() == dim.dim as usize => index.clone(),
        _ => (0..dim.dim).map(|i| i.to_string()).collect(),
    }
}

fn element_name(name: &str, index: &str) -> String {
    name.replace("[%s]", index).replace("%s", index)
}

/// Flattens registers and clusters into `out`; `base` is the offset of the enclosing cluster
fn lower<'a>(
    items: &'a [svd::RegisterCluster],
    prefix: &str,
    base: u64,
    defaults: Defaults,
    out: &mut Vec<ir::Register<'a>>,
) -> Result<(), anyhow::Error> {
    for item in items {
        match item {
            svd::RegisterCluster::Register(svd::Register::Single(info)) => {
                let name = prefixed(prefix, info.name.as_str().into());
                let offset = base + u64::from(info.address_offset);
                out.push(translate::register(info, name, offset, defaults)?);
            }

            svd::RegisterCluster::Register(svd::Register::Array(info, dim)) => {
                let offset = base + u64::from(info.address_offset);
                let stride = u64::from(dim.dim_increment);
                let width = translate::width(info, defaults)?;

                if info.name.contains("[%s]") && dim.dim > 0 && stride == width.bytes() {
                    let name = prefixed(prefix, info.name.replace("[%s]", "").into());
                    let mut reg = translate::register(info, name, offset, defaults)?;
                    reg.dim = Some(ir::Dim {
                        count: dim.dim,
                        stride,
                    });
                    out.push(reg);
                } else {
                    debug!("{}: expanding register array", info.name);
                    for (i, index) in (0..dim.dim).zip(translate::indices(dim)) {
                        let name = prefixed(prefix, element_name(&info.name, &index).into());
                        let offset = offset + u64::from(i) * stride;
                        out.push(translate::register(info, name, offset, defaults)?);
                    }
                }
            }

            svd::RegisterCluster::Cluster(svd::Cluster::Single(info)) => {
                let prefix = prefixed(prefix, info.name.as_str().into());
                let base = base + u64::from(info.address_offset);
                translate::lower(&info.children, &prefix, base, defaults, out)?;
            }

            svd::RegisterCluster::Cluster(svd::Cluster::Array(info, dim)) => {
                let stride = u64::from(dim.dim_increment);
                for (i, index) in (0..dim.dim).zip(translate::indices(dim)) {
                    let prefix = prefixed(prefix, element_name(&info.name, &index).into());
                    let base = base + u64::from(info.address_offset) + u64::from(i) * stride;
                    translate::lower(&info.children, &prefix, base, defaults, out)?;
                }
            }
        }
    }

    Ok(())
}

fn width(r: &svd::RegisterInfo, defaults: Defaults) -> Result<ir::Width, anyhow::Error> {
    let size = r
        .size
        .or(defaults.size)
        .ok_or_else(|| anyhow!("register {} has no size", r.name))?;

    ir::Width::from_bits(size)
        .ok_or_else(|| anyhow!("register {} has an unsupported size of {} bits", r.name, size))
}

pub fn access(access: svd::Access) -> ir::Access {
    match access {
        svd::Access::ReadOnly => ir::Access::ReadOnly,
        svd::Access::WriteOnly | svd::Access::WriteOnce => ir::Access::WriteOnly {
            unsafe_write: false,
        },
        // `read-write` and `read-writeOnce`
        _ => ir::Access::ReadWrite {
            unsafe_write: false,
        },
    }
}

fn register<'a>(
    r: &'a svd::RegisterInfo,
    name: Cow<'a, str>,
    offset: u64,
    defaults: Defaults,
) -> Result<ir::Register<'a>, anyhow::Error> {
    let width = translate::width(r, defaults)?;
    let access = match r.access.or(defaults.access) {
        Some(access) => translate::access(access),
        None => {
            debug!("{}: no access; assuming read-write", name);
            ir::Access::ReadWrite {
                unsafe_write: false,
            }
        }
    };

    let mut fields = vec![];
    for field in r.fields.iter().flatten() {
        match field {
            svd::Field::Single(info) => {
                fields.extend(translate::bitfield(
                    info,
                    info.name.as_str().into(),
                    0,
                    access,
                    &name,
                )?);
            }

            svd::Field::Array(info, dim) => {
                for (i, index) in (0..dim.dim).zip(translate::indices(dim)) {
                    fields.extend(translate::bitfield(
                        info,
                        element_name(&info.name, &index).into(),
                        i * dim.dim_increment,
                        access,
                        &name,
                    )?);
                }
            }
        }
    }

    Ok(ir::Register {
        access,
        description: r.description.as_ref().map(|s| s.as_str().into()),
        dim: None,
        fields,
        name,
        offset,
        width,
    })
}

/// Returns `None` if the field can't be accessed through its register at all
fn bitfield<'a>(
    f: &'a svd::FieldInfo,
    name: Cow<'a, str>,
    shift: u32,
    register: ir::Access,
    register_name: &str,
) -> Result<Option<ir::Bitfield<'a>>, anyhow::Error> {
    let offset = u8::try_from(f.bit_range.offset + shift)
        .with_context(|| format!("bit offset of {}.{}", register_name, name))?;
    let width = u8::try_from(f.bit_range.width)
        .with_context(|| format!("bit width of {}.{}", register_name, name))?;

    let declared = f
        .access
        .map(|a| ir::FieldAccess::from(translate::access(a)))
        .unwrap_or_else(|| register.into());
    let access = match (
        declared.can_read() && register.can_read(),
        declared.can_write() && register.can_write(),
    ) {
        (true, true) => ir::FieldAccess::ReadWrite,
        (true, false) => ir::FieldAccess::Read,
        (false, true) => ir::FieldAccess::Write,
        (false, false) => {
            warn!(
                "{}.{}: {} bitfield in a {} register; skipped",
                register_name,
                name,
                declared.as_str(),
                register.as_str()
            );
            return Ok(None);
        }
    };

    if access != declared {
        warn!(
            "{}.{}: narrowed from {} to {}",
            register_name,
            name,
            declared.as_str(),
            access.as_str()
        );
    }

    Ok(Some(ir::Bitfield {
        access,
        description: f.description.as_ref().map(|s| s.as_str().into()),
        values: translate::values(f),
        name,
        offset,
        width,
    }))
}

fn values(f: &svd::FieldInfo) -> Vec<ir::EnumeratedValue<'_>> {
    let set = match f.enumerated_values.iter().find(|e| e.derived_from.is_none()) {
        Some(set) => set,
        None => {
            if !f.enumerated_values.is_empty() {
                debug!("{}: derived enumerated values are not supported", f.name);
            }
            return vec![];
        }
    };

    let mut values: Vec<ir::EnumeratedValue<'_>> = vec![];
    for v in &set.values {
        let value = match v.value {
            Some(value) => u64::from(value),
            None => {
                debug!("{}.{}: default value; skipped", f.name, v.name);
                continue;
            }
        };

        let name = translate::variant_name(&v.name);
        if values.iter().any(|o| o.value == value || o.name == name) {
            debug!("{}.{}: duplicate value; skipped", f.name, v.name);
            continue;
        }

        values.push(ir::EnumeratedValue {
            description: v.description.as_ref().map(|s| s.as_str().into()),
            name,
            value,
        });
    }
    values
}

/// Turns an arbitrary value name (e.g. `8-bit`) into an identifier (`_8_bit`)
fn variant_name(name: &str) -> Cow<'_, str> {
    if is_ident(name) {
        return name.into();
    }

    let mut ident = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    if !ident.starts_with(|c: char| c.is_ascii_alphabetic()) {
        ident.insert(0, '_');
    }
    ident.into()
}

/// Interrupts of all peripherals, by IRQ number; entries that agree on name and number are merged
fn interrupts(peripherals: &[svd::Peripheral]) -> Result<Vec<ir::Interrupt<'_>>, anyhow::Error> {
    let mut out: Vec<ir::Interrupt<'_>> = vec![];
    for p in peripherals {
        for interrupt in &p.interrupt {
            let value = u16::try_from(interrupt.value).with_context(|| {
                format!(
                    "interrupt {} of {} has IRQ number {}",
                    interrupt.name, p.name, interrupt.value
                )
            })?;

            match out
                .iter_mut()
                .find(|o| o.name == interrupt.name && o.value == value)
            {
                Some(merged) => merged.owners.push(p.name.as_str().into()),
                None => out.push(ir::Interrupt {
                    description: interrupt.description.as_ref().map(|s| s.as_str().into()),
                    name: interrupt.name.as_str().into(),
                    owners: vec![p.name.as_str().into()],
                    value,
                }),
            }
        }
    }

    out.sort_by_key(|i| i.value);
    Ok(out)
}
