//! Register accessors as run-time descriptors
//!
//! The same rules as the generated code, enforced dynamically over any [`Bus`]: reads of
//! write-only registers, writes of read-only ones and values that don't fit are rejected.

use std::collections::BTreeMap;

use anyhow::bail;
use thiserror::Error;

use crate::{
    fmt::Hex,
    ir::{Bitfield, EnumeratedValue, Instance, Peripheral, Register, Width},
    verify::Verified,
};

/// Something registers can be read from and written to (a debug probe, an emulator, ..)
pub trait Bus {
    fn read(&mut self, address: u64, width: Width) -> Result<u64, anyhow::Error>;

    fn write(&mut self, address: u64, width: Width, value: u64) -> Result<(), anyhow::Error>;
}

/// Little-endian sparse memory; unwritten bytes read as zero
#[derive(Debug, Default)]
pub struct Memory {
    bytes: BTreeMap<u64, u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Bus for Memory {
    fn read(&mut self, address: u64, width: Width) -> Result<u64, anyhow::Error> {
        if address % width.bytes() != 0 {
            bail!("unaligned {}-bit read at {}", width.bits(), Hex(address));
        }

        Ok((0..width.bytes()).rev().fold(0, |value, i| {
            value << 8 | u64::from(self.bytes.get(&(address + i)).copied().unwrap_or(0))
        }))
    }

    fn write(&mut self, address: u64, width: Width, value: u64) -> Result<(), anyhow::Error> {
        if address % width.bytes() != 0 {
            bail!("unaligned {}-bit write at {}", width.bits(), Hex(address));
        }

        for i in 0..width.bytes() {
            self.bytes.insert(address + i, (value >> (8 * i)) as u8);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{0} is not readable")]
    NotReadable(String),

    #[error("{0} is not writable")]
    NotWritable(String),

    #[error("value {value} does not fit in {what} ({bits} bits)")]
    Overflow {
        what: String,
        value: Hex<u64>,
        bits: u8,
    },

    #[error("value {value} is not one of the documented values of {what}")]
    NotInSet { what: String, value: Hex<u64> },

    #[error("{what} has no value named {name}")]
    UnknownVariant { what: String, name: String },

    #[error("index {index} is out of bounds for {what} ({count} elements)")]
    IndexOutOfBounds {
        what: String,
        index: u32,
        count: u32,
    },

    #[error(transparent)]
    Bus(#[from] anyhow::Error),
}

/// One accessor block per instance of `device`, in declaration order
pub fn device<'d>(device: &'d Verified<'_>) -> Vec<Block<'d>> {
    device
        .instances
        .iter()
        .filter_map(move |instance| {
            device
                .peripheral(&instance.peripheral)
                .map(|peripheral| Block {
                    instance,
                    peripheral,
                })
        })
        .collect()
}

/// The registers of one peripheral instance
#[derive(Clone, Copy)]
pub struct Block<'d> {
    instance: &'d Instance<'d>,
    peripheral: &'d Peripheral<'d>,
}

impl<'d> Block<'d> {
    pub fn name(&self) -> &'d str {
        &self.instance.name
    }

    pub fn base_address(&self) -> u64 {
        self.instance.base_address
    }

    /// Name of the peripheral type
    pub fn peripheral(&self) -> &'d str {
        &self.peripheral.name
    }

    pub fn registers(&self) -> impl Iterator<Item = RegisterAccessor<'d>> {
        let instance = self.instance;
        self.peripheral
            .registers()
            .map(move |register| RegisterAccessor::new(instance, register))
    }

    pub fn register(&self, name: &str) -> Option<RegisterAccessor<'d>> {
        self.peripheral
            .register(name)
            .map(|register| RegisterAccessor::new(self.instance, register))
    }
}

/// A register, or one element of a register array
#[derive(Clone, Copy)]
pub struct RegisterAccessor<'d> {
    address: u64,
    index: u32,
    instance: &'d str,
    register: &'d Register<'d>,
}

impl<'d> RegisterAccessor<'d> {
    fn new(instance: &'d Instance<'d>, register: &'d Register<'d>) -> Self {
        RegisterAccessor {
            address: instance.base_address + register.offset,
            index: 0,
            instance: &instance.name,
            register,
        }
    }

    /// Absolute address
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn name(&self) -> &'d str {
        &self.register.name
    }

    pub fn width(&self) -> Width {
        self.register.width
    }

    pub fn is_write_unsafe(&self) -> bool {
        self.register.access.write_is_unsafe()
    }

    /// The `index`-th element of a register array; plain registers only have element `0`
    pub fn element(&self, index: u32) -> Result<Self, AccessError> {
        let count = self.register.count();
        if index >= count {
            return Err(AccessError::IndexOutOfBounds {
                what: self.path(),
                index,
                count,
            });
        }

        let base = self.address - self.register.element_offset(self.index);
        Ok(RegisterAccessor {
            address: base + self.register.element_offset(index),
            index,
            ..*self
        })
    }

    pub fn read(&self, bus: &mut impl Bus) -> Result<u64, AccessError> {
        if !self.register.access.can_read() {
            return Err(AccessError::NotReadable(self.path()));
        }

        let value = bus.read(self.address, self.register.width)?;
        log::trace!("{} -> {}", self.path(), Hex(value));
        Ok(value)
    }

    pub fn write(&self, bus: &mut impl Bus, value: u64) -> Result<(), AccessError> {
        if !self.register.access.can_write() {
            return Err(AccessError::NotWritable(self.path()));
        }

        let width = self.register.width;
        if value > width.max() {
            return Err(AccessError::Overflow {
                what: self.path(),
                value: Hex(value),
                bits: width.bits(),
            });
        }

        log::trace!("{} <- {}", self.path(), Hex(value));
        bus.write(self.address, width, value)?;
        Ok(())
    }

    /// Read-modify-write; read-only bits are cleared before `f` sees the value
    pub fn modify(
        &self,
        bus: &mut impl Bus,
        f: impl FnOnce(u64) -> u64,
    ) -> Result<(), AccessError> {
        let value = self.read(bus)? & !self.register.read_only_mask();
        self.write(bus, f(value))
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldAccessor<'d>> {
        let register = *self;
        self.register
            .fields
            .iter()
            .map(move |field| FieldAccessor { register, field })
    }

    pub fn field(&self, name: &str) -> Option<FieldAccessor<'d>> {
        self.register.field(name).map(|field| FieldAccessor {
            register: *self,
            field,
        })
    }

    fn path(&self) -> String {
        if self.register.dim.is_some() {
            format!("{}.{}[{}]", self.instance, self.register.name, self.index)
        } else {
            format!("{}.{}", self.instance, self.register.name)
        }
    }
}

/// A bitfield of a register
#[derive(Clone, Copy)]
pub struct FieldAccessor<'d> {
    register: RegisterAccessor<'d>,
    field: &'d Bitfield<'d>,
}

impl<'d> FieldAccessor<'d> {
    pub fn name(&self) -> &'d str {
        &self.field.name
    }

    pub fn values(&self) -> &'d [EnumeratedValue<'d>] {
        &self.field.values
    }

    pub fn get(&self, bus: &mut impl Bus) -> Result<u64, AccessError> {
        if !self.field.access.can_read() {
            return Err(AccessError::NotReadable(self.path()));
        }

        let value = self.register.read(bus)?;
        Ok((value >> self.field.offset) & self.field.mask())
    }

    /// Writes a raw value; any value that fits in the field is accepted
    ///
    /// Other fields keep their value if the register can be read back; otherwise they are
    /// written as zero.
    pub fn set(&self, bus: &mut impl Bus, value: u64) -> Result<(), AccessError> {
        if !self.field.access.can_write() {
            return Err(AccessError::NotWritable(self.path()));
        }

        if value > self.field.mask() {
            return Err(AccessError::Overflow {
                what: self.path(),
                value: Hex(value),
                bits: self.field.width,
            });
        }

        let offset = self.field.offset;
        let mask = self.field.shifted_mask();
        if self.register.register.access.can_read() {
            self.register
                .modify(bus, |old| (old & !mask) | (value << offset))
        } else {
            self.register.write(bus, value << offset)
        }
    }

    /// Reads the field and maps it to its documented value; `Err` holds undocumented values
    pub fn get_variant(
        &self,
        bus: &mut impl Bus,
    ) -> Result<Result<&'d EnumeratedValue<'d>, u64>, AccessError> {
        let bits = self.get(bus)?;
        let values = self.values();
        Ok(values.iter().find(|v| v.value == bits).ok_or(bits))
    }

    /// Writes a value that must be one of the documented ones
    pub fn set_enumerated(&self, bus: &mut impl Bus, value: u64) -> Result<(), AccessError> {
        self.variant(value)?;
        self.set(bus, value)
    }

    pub fn set_variant(&self, bus: &mut impl Bus, name: &str) -> Result<(), AccessError> {
        let value = self.variant_named(name)?.value;
        self.set(bus, value)
    }

    /// The documented variant whose value is `value`
    pub fn variant(&self, value: u64) -> Result<&'d EnumeratedValue<'d>, AccessError> {
        self.values()
            .iter()
            .find(|v| v.value == value)
            .ok_or_else(|| AccessError::NotInSet {
                what: self.path(),
                value: Hex(value),
            })
    }

    pub fn variant_named(&self, name: &str) -> Result<&'d EnumeratedValue<'d>, AccessError> {
        self.values()
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| AccessError::UnknownVariant {
                what: self.path(),
                name: name.to_string(),
            })
    }

    fn path(&self) -> String {
        format!("{}.{}", self.register.path(), self.field.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture;

    fn blocks<'d>(dev: &'d Verified<'_>) -> BTreeMap<String, Block<'d>> {
        device(dev)
            .into_iter()
            .map(|b| (b.name().to_string(), b))
            .collect()
    }

    #[test]
    fn direction_is_enforced() {
        let dev = fixture::device().verify().unwrap();
        let uart = blocks(&dev)["UART3"];
        let mut bus = Memory::new();

        let cr = uart.register("CR").unwrap();
        assert_eq!(cr.address(), 0x400E_1C00);
        assert!(matches!(cr.read(&mut bus), Err(AccessError::NotReadable(_))));
        cr.write(&mut bus, 1 << 4).unwrap();

        let sr = uart.register("SR").unwrap();
        assert_eq!(sr.address(), 0x400E_1C14);
        assert!(matches!(sr.write(&mut bus, 0), Err(AccessError::NotWritable(_))));
        assert_eq!(sr.read(&mut bus).unwrap(), 0);

        let mr = uart.register("MR").unwrap();
        mr.write(&mut bus, 0xdead_beef).unwrap();
        assert_eq!(mr.read(&mut bus).unwrap(), 0xdead_beef);
        assert!(matches!(
            mr.write(&mut bus, 1 << 32),
            Err(AccessError::Overflow { bits: 32, .. })
        ));
    }

    #[test]
    fn field_set_preserves_neighbours() {
        let dev = fixture::device().verify().unwrap();
        let uart = blocks(&dev)["UART4"];
        let mut bus = Memory::new();

        let mr = uart.register("MR").unwrap();
        mr.write(&mut bus, 0xffff_ffff).unwrap();

        let chmode = mr.field("CHMODE").unwrap();
        chmode.set(&mut bus, 2).unwrap();
        assert_eq!(chmode.get(&mut bus).unwrap(), 2);
        assert_eq!(mr.read(&mut bus).unwrap(), 0xffff_bfff);

        let err = chmode.set(&mut bus, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "value 0x04 does not fit in UART4.MR.CHMODE (2 bits)"
        );
    }

    #[test]
    fn enumerated_values() {
        let dev = fixture::device().verify().unwrap();
        let uart = blocks(&dev)["UART3"];
        let mut bus = Memory::new();
        let par = uart.register("MR").unwrap().field("PAR").unwrap();

        par.set_variant(&mut bus, "MARK").unwrap();
        assert_eq!(par.get_variant(&mut bus).unwrap().unwrap().name, "MARK");
        assert!(matches!(
            par.set_variant(&mut bus, "SOMETIMES"),
            Err(AccessError::UnknownVariant { .. })
        ));

        assert_eq!(par.variant(4).unwrap().name, "NO");
        // 7 fits in 3 bits but isn't documented
        assert!(matches!(par.variant(7), Err(AccessError::NotInSet { .. })));
        assert!(matches!(
            par.set_enumerated(&mut bus, 7),
            Err(AccessError::NotInSet { .. })
        ));
        par.set_enumerated(&mut bus, 1).unwrap();
        assert_eq!(par.get_variant(&mut bus).unwrap().unwrap().name, "ODD");
        par.set(&mut bus, 7).unwrap();
        assert_eq!(par.get_variant(&mut bus).unwrap(), Err(7));
    }

    #[test]
    fn write_only_register_fields() {
        let dev = fixture::device().verify().unwrap();
        let uart = blocks(&dev)["UART3"];
        let mut bus = Memory::new();
        let cr = uart.register("CR").unwrap();

        cr.field("TXEN").unwrap().set(&mut bus, 1).unwrap();
        cr.field("RXEN").unwrap().set(&mut bus, 1).unwrap();
        // no read back: the last write wins
        assert_eq!(bus.read(cr.address(), Width::U32).unwrap(), 1 << 4);
        assert!(matches!(
            cr.field("RXEN").unwrap().get(&mut bus),
            Err(AccessError::NotReadable(_))
        ));
    }

    #[test]
    fn modify_clears_read_only_bits() {
        let dev = crate::cm::device().verify().unwrap();
        let blocks = blocks(&dev);
        let mut bus = Memory::new();
        let aircr = blocks["SCB"].register("AIRCR").unwrap();

        // ENDIANNESS and VECTKEYSTAT read back as set
        bus.write(aircr.address(), Width::U32, 0xfa05_8000).unwrap();
        aircr.modify(&mut bus, |r| r | 1 << 2).unwrap();
        assert_eq!(aircr.read(&mut bus).unwrap(), 1 << 2);
    }

    #[test]
    fn array_elements() {
        let dev = fixture::device().verify().unwrap();
        let usbhs = blocks(&dev)["USBHS"];
        let mut bus = Memory::new();
        let cfg = usbhs.register("DEVEPTCFG").unwrap();

        let third = cfg.element(2).unwrap();
        assert_eq!(third.address(), 0x4003_8108);
        assert_eq!(third.element(9).unwrap().address(), 0x4003_8124);
        third
            .field("EPTYPE")
            .unwrap()
            .set_variant(&mut bus, "BLK")
            .unwrap();
        assert_eq!(bus.read(0x4003_8108, Width::U32).unwrap(), 2 << 11);
        assert_eq!(cfg.read(&mut bus).unwrap(), 0);

        let err = cfg.element(10).err().unwrap();
        assert_eq!(
            err.to_string(),
            "index 10 is out of bounds for USBHS.DEVEPTCFG[0] (10 elements)"
        );
    }

    #[test]
    fn bus_errors_propagate() {
        struct Faulty;

        impl Bus for Faulty {
            fn read(&mut self, address: u64, _: Width) -> Result<u64, anyhow::Error> {
                bail!("bus fault at {}", Hex(address))
            }

            fn write(&mut self, address: u64, _: Width, _: u64) -> Result<(), anyhow::Error> {
                bail!("bus fault at {}", Hex(address))
            }
        }

        let dev = fixture::device().verify().unwrap();
        let sr = blocks(&dev)["UART3"].register("SR").unwrap();
        let err = sr.read(&mut Faulty).unwrap_err();
        assert!(matches!(err, AccessError::Bus(_)));
        assert_eq!(err.to_string(), "bus fault at 0x400e_1c14");
    }
}
