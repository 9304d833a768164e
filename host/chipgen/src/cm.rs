//! Cortex-M architecture data: the system address map and the core peripherals
//!
//! # References
//!
//! - (TRM) Cortex-M4 r0p0 Technical Reference Manual (ARM DDI 0439B)
//! - (ARM) ARMv7-M Architecture Reference Manual (ARM DDI 0403E.b)

use std::borrow::Cow;

use crate::ir::{
    Access, Arch, Bitfield, Device, EnumeratedValue, FieldAccess, Instance, MemoryRegion,
    Peripheral, RegionKind, Register, VectorTable, Width,
};

/// The Cortex-M core peripherals (DCB, DWT, NVIC, SCB) as a device of their own
pub fn device() -> Device<'static> {
    let peripherals = peripherals();
    let instances = vec![
        instance("DCB", "Debug Control Block", 0xE000_EDF0),
        instance("DWT", "Data Watchpoint and Trace", 0xE000_1000),
        instance("NVIC", "Nested Vector Interrupt Controller", 0xE000_E100),
        instance("SCB", "System Control Block", 0xE000_ED00),
    ];

    Device {
        arch: Arch::ArmV7M,
        extra_docs: Some(
            "# References
- ARMv7-M Architecture Reference Manual (ARM DDI 0403E.b)"
                .into(),
        ),
        instances,
        interrupts: vec![],
        memory: memory_map(),
        name: "Cortex-M".into(),
        peripherals,
        vectors: VectorTable::new(Arch::ArmV7M, &[]),
    }
}

/// System address map; section B3.1 of (ARM)
pub fn memory_map() -> Vec<MemoryRegion<'static>> {
    vec![
        region("CODE", RegionKind::Code, 0x0000_0000, 0x2000_0000),
        region("SRAM", RegionKind::Sram, 0x2000_0000, 0x2000_0000),
        region("PERIPHERAL", RegionKind::Peripheral, 0x4000_0000, 0x2000_0000),
        region("EXTERNAL_RAM", RegionKind::ExternalRam, 0x6000_0000, 0x4000_0000),
        region(
            "EXTERNAL_DEVICE",
            RegionKind::ExternalDevice,
            0xA000_0000,
            0x4000_0000,
        ),
        region("PPB", RegionKind::PrivatePeripheral, 0xE000_0000, 0x0010_0000),
        region("VENDOR", RegionKind::Vendor, 0xE010_0000, 0x1FF0_0000),
    ]
}

fn region(
    name: &'static str,
    kind: RegionKind,
    start: u64,
    size: u64,
) -> MemoryRegion<'static> {
    MemoryRegion {
        kind,
        name: name.into(),
        size,
        start,
    }
}

fn instance(name: &'static str, description: &'static str, base_address: u64) -> Instance<'static> {
    Instance {
        base_address,
        description: Some(description.into()),
        name: name.into(),
        peripheral: name.into(),
    }
}

fn peripheral(
    name: &'static str,
    description: &'static str,
    registers: Vec<Register<'static>>,
) -> Peripheral<'static> {
    Peripheral::from_registers(name.into(), Some(description.into()), registers, None)
}

fn register(
    name: &'static str,
    description: &'static str,
    offset: u64,
    access: Access,
    fields: Vec<Bitfield<'static>>,
) -> Register<'static> {
    Register {
        access,
        description: Some(description.into()),
        dim: None,
        fields,
        name: name.into(),
        offset,
        width: Width::U32,
    }
}

fn rw(name: &'static str, offset: u8, width: u8) -> Bitfield<'static> {
    Bitfield::new(name, offset, width)
}

fn r(name: &'static str, offset: u8, width: u8) -> Bitfield<'static> {
    Bitfield {
        access: FieldAccess::Read,
        ..Bitfield::new(name, offset, width)
    }
}

fn w(name: &'static str, offset: u8, width: u8) -> Bitfield<'static> {
    Bitfield {
        access: FieldAccess::Write,
        ..Bitfield::new(name, offset, width)
    }
}

/// Write-only key field that must hold `value` for the write to take effect
fn key(name: &'static str, offset: u8, value: u64) -> Bitfield<'static> {
    Bitfield {
        values: vec![EnumeratedValue {
            description: Some(Cow::from("Write key")),
            name: "KEY".into(),
            value,
        }],
        ..w(name, offset, 16)
    }
}

const RW: Access = Access::ReadWrite {
    unsafe_write: false,
};

fn peripherals() -> Vec<Peripheral<'static>> {
    vec![
        peripheral(
            "DCB",
            "Debug Control Block",
            vec![
                // section C1.6.2 of (ARM)
                register(
                    "DHCSR",
                    "Debug Halting Control and Status Register",
                    0x00,
                    RW,
                    vec![
                        rw("C_DEBUGEN", 0, 1),
                        rw("C_HALT", 1, 1),
                        rw("C_STEP", 2, 1),
                        rw("C_MASKINTS", 3, 1),
                        rw("C_SNAPSTALL", 5, 1),
                        r("S_REGRDY", 16, 1),
                        r("S_HALT", 17, 1),
                        r("S_SLEEP", 18, 1),
                        r("S_LOCKUP", 19, 1),
                        r("S_RETIRE_ST", 24, 1),
                        r("S_RESET_ST", 25, 1),
                        key("DBGKEY", 16, 0xA05F),
                    ],
                ),
                register(
                    "DCRSR",
                    "Debug Core Register Selector Register",
                    0x04,
                    Access::WriteOnly {
                        unsafe_write: false,
                    },
                    vec![w("REGSEL", 0, 7), w("REGWnR", 16, 1)],
                ),
                register(
                    "DCRDR",
                    "Debug Core Register Data Register",
                    0x08,
                    Access::ReadWrite { unsafe_write: true },
                    vec![],
                ),
                register(
                    "DEMCR",
                    "Debug Exception and Monitor Control Register",
                    0x0c,
                    RW,
                    vec![
                        rw("VC_CORERESET", 0, 1),
                        rw("VC_MMERR", 4, 1),
                        rw("VC_NOCPERR", 5, 1),
                        rw("VC_CHKERR", 6, 1),
                        rw("VC_STATERR", 7, 1),
                        rw("VC_BUSERR", 8, 1),
                        rw("VC_INTERR", 9, 1),
                        rw("VC_HARDERR", 10, 1),
                        rw("MON_EN", 16, 1),
                        rw("MON_PEND", 17, 1),
                        rw("MON_STEP", 18, 1),
                        rw("MON_REQ", 19, 1),
                        Bitfield {
                            description: Some("Global enable for the DWT and ITM".into()),
                            ..rw("TRCENA", 24, 1)
                        },
                    ],
                ),
            ],
        ),
        peripheral(
            "DWT",
            "Data Watchpoint and Trace",
            vec![
                register(
                    "CTRL",
                    "Control register",
                    0x0,
                    RW,
                    vec![
                        Bitfield {
                            description: Some("Enables the cycle counter".into()),
                            ..rw("CYCCNTENA", 0, 1)
                        },
                        rw("POSTPRESET", 1, 4),
                        rw("POSTINIT", 5, 4),
                        rw("CYCTAP", 9, 1),
                        rw("SYNCTAP", 10, 2),
                        rw("PCSAMPLENA", 12, 1),
                        rw("EXCTRCENA", 16, 1),
                        rw("CPIEVTENA", 17, 1),
                        rw("EXCEVTENA", 18, 1),
                        rw("SLEEPEVTENA", 19, 1),
                        rw("LSUEVTENA", 20, 1),
                        rw("FOLDEVTENA", 21, 1),
                        rw("CYCEVTENA", 22, 1),
                        r("NOPRFCNT", 24, 1),
                        r("NOCYCCNT", 25, 1),
                        r("NOEXTTRIG", 26, 1),
                        r("NOTRCPKT", 27, 1),
                        r("NUMCOMP", 28, 4),
                    ],
                ),
                // section C1.8.8 of (ARM)
                register("CYCCNT", "Cycle Count register", 0x4, RW, vec![]),
            ],
        ),
        peripheral(
            "NVIC",
            "Nested Vector Interrupt Controller",
            vec![
                // NOTE(unsafe_write) enabling interrupts can break critical sections
                register(
                    "ISER0",
                    "Interrupt Set-Enable Register 0",
                    0x0,
                    Access::ReadWrite { unsafe_write: true },
                    vec![],
                ),
                register(
                    "ISER1",
                    "Interrupt Set-Enable Register 1",
                    0x4,
                    Access::ReadWrite { unsafe_write: true },
                    vec![],
                ),
                register("ICER0", "Interrupt Clear-Enable Register 0", 0x80, RW, vec![]),
                register("ICER1", "Interrupt Clear-Enable Register 1", 0x84, RW, vec![]),
            ],
        ),
        peripheral(
            "SCB",
            "System Control Block",
            vec![
                // section B3.2.3 of (ARM)
                register(
                    "CPUID",
                    "CPUID Base register",
                    0x0,
                    Access::ReadOnly,
                    vec![
                        r("REVISION", 0, 4),
                        r("PARTNO", 4, 12),
                        r("ARCHITECTURE", 16, 4),
                        r("VARIANT", 20, 4),
                        r("IMPLEMENTER", 24, 8),
                    ],
                ),
                // section B3.2.4 of (ARM)
                register(
                    "ICSR",
                    "Interrupt Control and State Register",
                    0x4,
                    RW,
                    vec![
                        Bitfield {
                            description: Some(
                                "The vector table index of the exception currently being executed.\n0: Thread mode\n!0: Exception context"
                                    .into(),
                            ),
                            ..r("VECTACTIVE", 0, 9)
                        },
                        r("RETTOBASE", 11, 1),
                        r("VECTPENDING", 12, 9),
                        r("ISRPENDING", 22, 1),
                        r("ISRPREEMPT", 23, 1),
                        w("PENDSTCLR", 25, 1),
                        rw("PENDSTSET", 26, 1),
                        w("PENDSVCLR", 27, 1),
                        rw("PENDSVSET", 28, 1),
                        rw("NMIPENDSET", 31, 1),
                    ],
                ),
                // section B3.2.5 of (ARM)
                register(
                    "VTOR",
                    "Vector Table Offset Register",
                    0x8,
                    Access::ReadWrite { unsafe_write: true },
                    vec![rw("TBLOFF", 7, 25)],
                ),
                register(
                    "AIRCR",
                    "Application Interrupt and Reset Control Register",
                    0xc,
                    RW,
                    vec![
                        w("VECTRESET", 0, 1),
                        w("VECTCLRACTIVE", 1, 1),
                        rw("SYSRESETREQ", 2, 1),
                        rw("PRIGROUP", 8, 3),
                        r("ENDIANNESS", 15, 1),
                        r("VECTKEYSTAT", 16, 16),
                        key("VECTKEY", 16, 0x05FA),
                    ],
                ),
            ],
        ),
    ]
}
