//! Intermediate representation of a device
//!
//! Everything here is plain data. Invariants are checked by [`Device::verify`], not enforced by
//! construction, so that a malformed description can be reported in full.

use core::fmt;
use std::borrow::Cow;

use anyhow::bail;

/// Number of vector table slots used by the core: the initial stack pointer plus 15 exceptions
pub const CORE_SLOTS: usize = 16;

pub struct Device<'a> {
    pub arch: Arch,
    pub extra_docs: Option<Cow<'a, str>>,
    pub instances: Vec<Instance<'a>>,
    pub interrupts: Vec<Interrupt<'a>>,
    pub memory: Vec<MemoryRegion<'a>>,
    pub name: Cow<'a, str>,
    /// Peripheral *types*; shared by one or more [`Instance`]s
    pub peripherals: Vec<Peripheral<'a>>,
    pub vectors: VectorTable<'a>,
}

impl<'a> Device<'a> {
    pub fn peripheral(&self, name: &str) -> Option<&Peripheral<'a>> {
        self.peripherals.iter().find(|p| p.name == name)
    }

    pub fn instance(&self, name: &str) -> Option<&Instance<'a>> {
        self.instances.iter().find(|i| i.name == name)
    }

    pub fn interrupt(&self, name: &str) -> Option<&Interrupt<'a>> {
        self.interrupts.iter().find(|i| i.name == name)
    }

    /// Marks a register as write-unsafe, e.g. because it holds a DMA pointer
    pub fn make_write_unsafe(
        &mut self,
        peripheral: &str,
        register: &str,
    ) -> Result<(), anyhow::Error> {
        let periph = match self.peripherals.iter_mut().find(|p| p.name == peripheral) {
            Some(periph) => periph,
            None => bail!("no peripheral type named {}", peripheral),
        };

        let reg = match periph.registers_mut().find(|r| r.name == register) {
            Some(reg) => reg,
            None => bail!("peripheral {} has no register named {}", peripheral, register),
        };

        if !reg.access.make_write_unsafe() {
            bail!(
                "register {}.{} is read-only; its writes cannot be unsafe",
                peripheral,
                register
            );
        }

        Ok(())
    }
}

/// A concrete occurrence of a peripheral type at a base address
pub struct Instance<'a> {
    pub base_address: u64,
    pub description: Option<Cow<'a, str>>,
    pub name: Cow<'a, str>,
    /// Name of the peripheral type
    pub peripheral: Cow<'a, str>,
}

pub struct Peripheral<'a> {
    pub description: Option<Cow<'a, str>>,
    /// Registers and padding, in address order
    pub items: Vec<Item<'a>>,
    pub name: Cow<'a, str>,
    /// Size of the register block in bytes
    pub size: u64,
}

impl<'a> Peripheral<'a> {
    /// Lays out `registers` in offset order, declaring every gap as reserved padding
    ///
    /// When `size` is `None` the block ends right after the last register. Overlapping registers
    /// are kept as they are; they are reported by the validator.
    pub fn from_registers(
        name: Cow<'a, str>,
        description: Option<Cow<'a, str>>,
        mut registers: Vec<Register<'a>>,
        size: Option<u64>,
    ) -> Self {
        registers.sort_by_key(|r| r.offset);

        let mut items = vec![];
        let mut cursor = 0;
        for reg in registers {
            if reg.offset > cursor {
                items.push(Item::Reserved {
                    size: reg.offset - cursor,
                });
            }
            cursor = cursor.max(reg.offset + reg.span());
            items.push(Item::Register(reg));
        }

        let size = size.unwrap_or(cursor);
        if size > cursor {
            items.push(Item::Reserved {
                size: size - cursor,
            });
        }

        Peripheral {
            description,
            items,
            name,
            size,
        }
    }

    pub fn registers(&self) -> impl Iterator<Item = &Register<'a>> {
        self.items.iter().filter_map(|item| match item {
            Item::Register(reg) => Some(reg),
            Item::Reserved { .. } => None,
        })
    }

    pub fn registers_mut(&mut self) -> impl Iterator<Item = &mut Register<'a>> {
        self.items.iter_mut().filter_map(|item| match item {
            Item::Register(reg) => Some(reg),
            Item::Reserved { .. } => None,
        })
    }

    pub fn register(&self, name: &str) -> Option<&Register<'a>> {
        self.registers().find(|r| r.name == name)
    }
}

/// An entry of a register block
pub enum Item<'a> {
    Register(Register<'a>),
    /// Padding; `size` is in bytes
    Reserved { size: u64 },
}

pub struct Register<'a> {
    pub access: Access,
    pub description: Option<Cow<'a, str>>,
    /// `Some` if this is a register array
    pub dim: Option<Dim>,
    pub fields: Vec<Bitfield<'a>>,
    pub name: Cow<'a, str>,
    /// In bytes, relative to the base address of the peripheral
    pub offset: u64,
    pub width: Width,
}

impl<'a> Register<'a> {
    /// Number of bytes this register (or register array) occupies
    pub fn span(&self) -> u64 {
        let count = self.dim.map(|dim| u64::from(dim.count)).unwrap_or(1);
        match self.dim {
            Some(dim) if count > 0 => (count - 1) * dim.stride + self.width.bytes(),
            _ => self.width.bytes(),
        }
    }

    /// Number of elements; `1` for plain registers
    pub fn count(&self) -> u32 {
        self.dim.map(|dim| dim.count).unwrap_or(1)
    }

    /// Offset of the `index`-th array element
    pub fn element_offset(&self, index: u32) -> u64 {
        let stride = self.dim.map(|dim| dim.stride).unwrap_or(0);
        self.offset + u64::from(index) * stride
    }

    /// Bitfields visible through reads
    pub fn r_fields(&self) -> impl Iterator<Item = &Bitfield<'a>> {
        self.fields.iter().filter(|f| f.access.can_read())
    }

    /// Bitfields visible through writes
    pub fn w_fields(&self) -> impl Iterator<Item = &Bitfield<'a>> {
        self.fields.iter().filter(|f| f.access.can_write())
    }

    pub fn field(&self, name: &str) -> Option<&Bitfield<'a>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Bits only visible through reads; they are cleared when a read value is written back
    pub fn read_only_mask(&self) -> u64 {
        self.r_fields()
            .filter(|f| !f.access.can_write())
            .fold(0, |mask, f| mask | f.shifted_mask())
    }
}

/// Register array layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dim {
    pub count: u32,
    /// Distance between consecutive elements, in bytes
    pub stride: u64,
}

/// Register width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    U8,
    U16,
    U32,
}

impl Width {
    pub fn bits(self) -> u8 {
        match self {
            Width::U8 => 8,
            Width::U16 => 16,
            Width::U32 => 32,
        }
    }

    pub fn bytes(self) -> u64 {
        u64::from(self.bits() / 8)
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits {
            8 => Width::U8,
            16 => Width::U16,
            32 => Width::U32,
            _ => return None,
        })
    }

    /// Largest value a register of this width can hold
    pub fn max(self) -> u64 {
        (1 << self.bits()) - 1
    }
}

/// Register access
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly { unsafe_write: bool },
    ReadWrite { unsafe_write: bool },
}

impl Access {
    pub fn can_read(self) -> bool {
        match self {
            Access::ReadOnly | Access::ReadWrite { .. } => true,
            Access::WriteOnly { .. } => false,
        }
    }

    pub fn can_write(self) -> bool {
        match self {
            Access::WriteOnly { .. } | Access::ReadWrite { .. } => true,
            Access::ReadOnly => false,
        }
    }

    pub fn write_is_unsafe(self) -> bool {
        match self {
            Access::WriteOnly { unsafe_write } | Access::ReadWrite { unsafe_write } => {
                unsafe_write
            }
            Access::ReadOnly => false,
        }
    }

    /// Returns `false` if the register can't be written
    pub fn make_write_unsafe(&mut self) -> bool {
        match self {
            Access::WriteOnly { unsafe_write } | Access::ReadWrite { unsafe_write } => {
                *unsafe_write = true;
                true
            }
            Access::ReadOnly => false,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Access::ReadOnly => "read-only",
            Access::WriteOnly { .. } => "write-only",
            Access::ReadWrite { .. } => "read-write",
        }
    }
}

/// Bitfield access
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldAccess {
    Read,
    Write,
    ReadWrite,
}

impl FieldAccess {
    pub fn can_read(self) -> bool {
        self != FieldAccess::Write
    }

    pub fn can_write(self) -> bool {
        self != FieldAccess::Read
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            FieldAccess::Read => "read-only",
            FieldAccess::Write => "write-only",
            FieldAccess::ReadWrite => "read-write",
        }
    }
}

impl From<Access> for FieldAccess {
    fn from(access: Access) -> Self {
        match access {
            Access::ReadOnly => FieldAccess::Read,
            Access::WriteOnly { .. } => FieldAccess::Write,
            Access::ReadWrite { .. } => FieldAccess::ReadWrite,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bitfield<'a> {
    pub access: FieldAccess,
    pub description: Option<Cow<'a, str>>,
    pub name: Cow<'a, str>,
    /// In bits; must be less than the register width
    pub offset: u8,
    /// Documented values; empty if the field holds a plain integer
    pub values: Vec<EnumeratedValue<'a>>,
    /// In bits; must be greater than `0` and fit in the register
    pub width: u8,
}

impl<'a> Bitfield<'a> {
    /// A read-write field without documented values
    pub fn new(name: impl Into<Cow<'a, str>>, offset: u8, width: u8) -> Self {
        Bitfield {
            access: FieldAccess::ReadWrite,
            description: None,
            name: name.into(),
            offset,
            values: vec![],
            width,
        }
    }

    pub fn mask(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// `mask` moved to the position of the field
    pub fn shifted_mask(&self) -> u64 {
        self.mask().checked_shl(u32::from(self.offset)).unwrap_or(0)
    }

    /// One past the highest bit
    pub fn end(&self) -> u16 {
        u16::from(self.offset) + u16::from(self.width)
    }

    pub fn is_enumerated(&self) -> bool {
        !self.values.is_empty()
    }
}

/// A named value of a bitfield (e.g. `CHMODE = LOCAL_LOOPBACK`)
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumeratedValue<'a> {
    pub description: Option<Cow<'a, str>>,
    pub name: Cow<'a, str>,
    pub value: u64,
}

pub struct Interrupt<'a> {
    pub description: Option<Cow<'a, str>>,
    pub name: Cow<'a, str>,
    /// Instances that signal this interrupt
    pub owners: Vec<Cow<'a, str>>,
    /// IRQ number
    pub value: u16,
}

/// Architecture profile; determines the core exceptions and the interrupt limit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    /// Cortex-M0, M0+, M1 and M23
    ArmV6M,
    /// Cortex-M3, M4, M7 and M33
    ArmV7M,
}

impl Arch {
    /// Picks the architecture from a CMSIS-SVD `<cpu><name>` (e.g. `CM0PLUS`, `CM7`)
    pub fn from_cpu_name(name: &str) -> Self {
        if name.starts_with("CM0") || name == "CM1" || name == "CM23" {
            Arch::ArmV6M
        } else {
            Arch::ArmV7M
        }
    }

    /// Maximum number of external interrupts
    pub fn max_interrupts(self) -> u16 {
        match self {
            Arch::ArmV6M => 32,
            Arch::ArmV7M => 496,
        }
    }

    /// Slots 1..16 of the vector table; `None` marks a reserved slot
    pub fn exceptions(self) -> [Option<Exception>; CORE_SLOTS - 1] {
        let v7 = self == Arch::ArmV7M;
        let only_v7 = |e| if v7 { Some(e) } else { None };

        [
            Some(Exception::Reset),
            Some(Exception::NonMaskableInt),
            Some(Exception::HardFault),
            only_v7(Exception::MemoryManagement),
            only_v7(Exception::BusFault),
            only_v7(Exception::UsageFault),
            None,
            None,
            None,
            None,
            Some(Exception::SVCall),
            only_v7(Exception::DebugMonitor),
            None,
            Some(Exception::PendSV),
            Some(Exception::SysTick),
        ]
    }

    pub fn has(self, exception: Exception) -> bool {
        self.exceptions().iter().any(|e| *e == Some(exception))
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arch::ArmV6M => "ARMv6-M",
            Arch::ArmV7M => "ARMv7-M",
        })
    }
}

/// Core exceptions
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Exception {
    Reset,
    NonMaskableInt,
    HardFault,
    MemoryManagement,
    BusFault,
    UsageFault,
    SVCall,
    DebugMonitor,
    PendSV,
    SysTick,
}

impl Exception {
    pub const ALL: [Exception; 10] = [
        Exception::Reset,
        Exception::NonMaskableInt,
        Exception::HardFault,
        Exception::MemoryManagement,
        Exception::BusFault,
        Exception::UsageFault,
        Exception::SVCall,
        Exception::DebugMonitor,
        Exception::PendSV,
        Exception::SysTick,
    ];

    /// Name of the handler symbol
    pub fn name(self) -> &'static str {
        match self {
            Exception::Reset => "Reset",
            Exception::NonMaskableInt => "NMI",
            Exception::HardFault => "HardFault",
            Exception::MemoryManagement => "MemManage",
            Exception::BusFault => "BusFault",
            Exception::UsageFault => "UsageFault",
            Exception::SVCall => "SVCall",
            Exception::DebugMonitor => "DebugMonitor",
            Exception::PendSV => "PendSV",
            Exception::SysTick => "SysTick",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Exception::ALL.iter().copied().find(|e| e.name() == name)
    }

    /// Index in the vector table
    pub fn slot(self) -> usize {
        match self {
            Exception::Reset => 1,
            Exception::NonMaskableInt => 2,
            Exception::HardFault => 3,
            Exception::MemoryManagement => 4,
            Exception::BusFault => 5,
            Exception::UsageFault => 6,
            Exception::SVCall => 11,
            Exception::DebugMonitor => 12,
            Exception::PendSV => 14,
            Exception::SysTick => 15,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The processor's vector table, in slot order
pub struct VectorTable<'a> {
    pub slots: Vec<Slot<'a>>,
}

impl<'a> VectorTable<'a> {
    /// Builds the table for `arch` with one slot per IRQ number up to the highest one in
    /// `interrupts`; unused IRQ numbers get explicit reserved slots
    ///
    /// If two interrupts share an IRQ number the first one takes the slot.
    pub fn new(arch: Arch, interrupts: &[Interrupt<'a>]) -> Self {
        let mut slots = vec![Slot::StackPointer];
        slots.extend(arch.exceptions().iter().map(|e| match e {
            Some(e) => Slot::Exception(*e),
            None => Slot::Reserved,
        }));

        let n = VectorTable::expected_len(interrupts) - CORE_SLOTS;
        let mut irqs = vec![Slot::Reserved; n];
        for interrupt in interrupts.iter().rev() {
            irqs[usize::from(interrupt.value)] = Slot::Interrupt {
                irq: interrupt.value,
                name: interrupt.name.clone(),
            };
        }
        slots.extend(irqs);

        VectorTable { slots }
    }

    /// `16 + max(irq) + 1`, or `16` if there are no interrupts
    pub fn expected_len(interrupts: &[Interrupt<'_>]) -> usize {
        CORE_SLOTS
            + interrupts
                .iter()
                .map(|i| usize::from(i.value) + 1)
                .max()
                .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<'a> {
    /// Initial value of the main stack pointer (slot 0)
    StackPointer,
    Exception(Exception),
    Interrupt { irq: u16, name: Cow<'a, str> },
    /// Explicitly unused
    Reserved,
}

impl fmt::Display for Slot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::StackPointer => f.write_str("the initial stack pointer"),
            Slot::Exception(e) => write!(f, "exception {}", e),
            Slot::Interrupt { irq, name } => write!(f, "interrupt {} (IRQ {})", name, irq),
            Slot::Reserved => f.write_str("a reserved slot"),
        }
    }
}

/// An entry of the memory map
pub struct MemoryRegion<'a> {
    pub kind: RegionKind,
    pub name: Cow<'a, str>,
    pub size: u64,
    pub start: u64,
}

impl MemoryRegion<'_> {
    /// One past the last address
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    pub fn contains(&self, start: u64, end: u64) -> bool {
        self.start <= start && end <= self.end()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionKind {
    Code,
    Sram,
    Peripheral,
    ExternalRam,
    ExternalDevice,
    PrivatePeripheral,
    Vendor,
}

impl RegionKind {
    /// Whether memory-mapped peripherals may live in this region
    pub fn holds_peripherals(self) -> bool {
        match self {
            RegionKind::Peripheral | RegionKind::PrivatePeripheral | RegionKind::Vendor => true,
            RegionKind::Code
            | RegionKind::Sram
            | RegionKind::ExternalRam
            | RegionKind::ExternalDevice => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(name: &'static str, offset: u64, access: Access) -> Register<'static> {
        Register {
            access,
            description: None,
            dim: None,
            fields: vec![],
            name: name.into(),
            offset,
            width: Width::U32,
        }
    }

    fn irq(name: &'static str, value: u16) -> Interrupt<'static> {
        Interrupt {
            description: None,
            name: name.into(),
            owners: vec![],
            value,
        }
    }

    #[test]
    fn from_registers_declares_gaps() {
        let uart = Peripheral::from_registers(
            "Uart".into(),
            None,
            vec![
                reg("SR", 0x14, Access::ReadOnly),
                reg(
                    "CR",
                    0x00,
                    Access::WriteOnly {
                        unsafe_write: false,
                    },
                ),
            ],
            Some(0x100),
        );

        let layout = uart
            .items
            .iter()
            .map(|item| match item {
                Item::Register(r) => (r.name.to_string(), r.width.bytes()),
                Item::Reserved { size } => ("-".to_string(), *size),
            })
            .collect::<Vec<_>>();

        assert_eq!(
            layout,
            [
                ("CR".to_string(), 4),
                ("-".to_string(), 0x10),
                ("SR".to_string(), 4),
                ("-".to_string(), 0xe8),
            ]
        );
        assert_eq!(uart.size, 0x100);
    }

    #[test]
    fn array_span() {
        let mut r = reg(
            "DEVEPTCFG",
            0x100,
            Access::ReadWrite {
                unsafe_write: false,
            },
        );
        r.dim = Some(Dim {
            count: 10,
            stride: 4,
        });
        assert_eq!(r.span(), 40);
        assert_eq!(r.element_offset(9), 0x124);
    }

    #[test]
    fn v6m_has_no_fault_handlers() {
        assert!(!Arch::ArmV6M.has(Exception::BusFault));
        assert!(Arch::ArmV6M.has(Exception::SysTick));
        assert!(Arch::ArmV7M.has(Exception::DebugMonitor));
        assert_eq!(Arch::from_cpu_name("CM0PLUS"), Arch::ArmV6M);
        assert_eq!(Arch::from_cpu_name("CM7"), Arch::ArmV7M);
    }

    #[test]
    fn exception_slots_agree_with_layout() {
        for (i, e) in Arch::ArmV7M.exceptions().iter().enumerate() {
            if let Some(e) = e {
                assert_eq!(e.slot(), i + 1);
            }
        }
    }

    #[test]
    fn vector_table_has_explicit_holes() {
        let irqs = [irq("UART0", 7), irq("USBHS", 34)];
        let table = VectorTable::new(Arch::ArmV7M, &irqs);

        assert_eq!(table.len(), CORE_SLOTS + 35);
        assert_eq!(table.slots[0], Slot::StackPointer);
        assert_eq!(table.slots[7], Slot::Reserved);
        assert_eq!(table.slots[CORE_SLOTS], Slot::Reserved);
        assert_eq!(
            table.slots[CORE_SLOTS + 7],
            Slot::Interrupt {
                irq: 7,
                name: "UART0".into()
            }
        );
        assert_eq!(
            table.slots[CORE_SLOTS + 34],
            Slot::Interrupt {
                irq: 34,
                name: "USBHS".into()
            }
        );
    }

    #[test]
    fn make_write_unsafe_rejects_read_only() {
        let mut dev = Device {
            arch: Arch::ArmV7M,
            extra_docs: None,
            instances: vec![],
            interrupts: vec![],
            memory: vec![],
            name: "test".into(),
            peripherals: vec![Peripheral::from_registers(
                "DMA".into(),
                None,
                vec![
                    reg("STATUS", 0, Access::ReadOnly),
                    reg(
                        "PTR",
                        4,
                        Access::ReadWrite {
                            unsafe_write: false,
                        },
                    ),
                ],
                None,
            )],
            vectors: VectorTable { slots: vec![] },
        };

        assert!(dev.make_write_unsafe("DMA", "PTR").is_ok());
        assert!(dev.make_write_unsafe("DMA", "STATUS").is_err());
        assert!(dev.make_write_unsafe("DMA", "NOPE").is_err());
        assert!(dev.peripherals[0]
            .register("PTR")
            .map(|r| r.access.write_is_unsafe())
            .unwrap_or(false));
    }
}
