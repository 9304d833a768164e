//! A small, valid device shared by the unit tests

use crate::{
    cm,
    ir::{
        Access, Arch, Bitfield, Device, Dim, EnumeratedValue, FieldAccess, Instance, Interrupt,
        Peripheral, Register, VectorTable, Width,
    },
};

pub(crate) fn register(name: &'static str, offset: u64, access: Access) -> Register<'static> {
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

fn with_fields(mut reg: Register<'static>, fields: Vec<Bitfield<'static>>) -> Register<'static> {
    reg.fields = fields;
    reg
}

fn enumerated(
    name: &'static str,
    offset: u8,
    width: u8,
    values: &[(&'static str, u64)],
) -> Bitfield<'static> {
    Bitfield {
        values: values
            .iter()
            .map(|&(name, value)| EnumeratedValue {
                description: None,
                name: name.into(),
                value,
            })
            .collect(),
        ..Bitfield::new(name, offset, width)
    }
}

fn access(field: Bitfield<'static>, access: FieldAccess) -> Bitfield<'static> {
    Bitfield { access, ..field }
}

const RW: Access = Access::ReadWrite {
    unsafe_write: false,
};
const WO: Access = Access::WriteOnly {
    unsafe_write: false,
};

fn uart() -> Peripheral<'static> {
    let w = |name: &'static str, offset: u8| {
        access(Bitfield::new(name, offset, 1), FieldAccess::Write)
    };
    let r = |name: &'static str, offset: u8| {
        access(Bitfield::new(name, offset, 1), FieldAccess::Read)
    };

    Peripheral::from_registers(
        "Uart".into(),
        Some("Universal Asynchronous Receiver Transmitter".into()),
        vec![
            with_fields(
                register("CR", 0x00, WO),
                vec![
                    w("RSTRX", 2),
                    w("RSTTX", 3),
                    w("RXEN", 4),
                    w("RXDIS", 5),
                    w("TXEN", 6),
                    w("TXDIS", 7),
                    w("RSTSTA", 8),
                ],
            ),
            with_fields(
                register("MR", 0x04, RW),
                vec![
                    enumerated(
                        "PAR",
                        9,
                        3,
                        &[("EVEN", 0), ("ODD", 1), ("SPACE", 2), ("MARK", 3), ("NO", 4)],
                    ),
                    enumerated(
                        "CHMODE",
                        14,
                        2,
                        &[
                            ("NORMAL", 0),
                            ("AUTOMATIC", 1),
                            ("LOCAL_LOOPBACK", 2),
                            ("REMOTE_LOOPBACK", 3),
                        ],
                    ),
                ],
            ),
            register("IER", 0x08, WO),
            register("IDR", 0x0c, WO),
            register("IMR", 0x10, Access::ReadOnly),
            with_fields(
                register("SR", 0x14, Access::ReadOnly),
                vec![r("RXRDY", 0), r("TXRDY", 1), r("OVRE", 5)],
            ),
            with_fields(
                register("RHR", 0x18, Access::ReadOnly),
                vec![access(Bitfield::new("RXCHR", 0, 8), FieldAccess::Read)],
            ),
            with_fields(
                register("THR", 0x1c, WO),
                vec![access(Bitfield::new("TXCHR", 0, 8), FieldAccess::Write)],
            ),
            with_fields(register("BRGR", 0x20, RW), vec![Bitfield::new("CD", 0, 16)]),
        ],
        Some(0x100),
    )
}

fn usbhs() -> Peripheral<'static> {
    let mut cfg = with_fields(
        register("DEVEPTCFG", 0x100, RW),
        vec![
            Bitfield::new("ALLOC", 1, 1),
            enumerated(
                "EPSIZE",
                4,
                3,
                &[
                    ("_8_BYTE", 0),
                    ("_16_BYTE", 1),
                    ("_32_BYTE", 2),
                    ("_64_BYTE", 3),
                ],
            ),
            enumerated(
                "EPTYPE",
                11,
                2,
                &[("CTRL", 0), ("ISO", 1), ("BLK", 2), ("INTRPT", 3)],
            ),
        ],
    );
    cfg.dim = Some(Dim {
        count: 10,
        stride: 4,
    });

    Peripheral::from_registers(
        "Usbhs".into(),
        Some("USB High-Speed Interface".into()),
        vec![
            with_fields(
                register("DEVCTRL", 0x00, RW),
                vec![Bitfield::new("UADD", 0, 7), Bitfield::new("ADDEN", 7, 1)],
            ),
            cfg,
        ],
        Some(0x4000),
    )
}

fn instance(name: &'static str, peripheral: &'static str, base_address: u64) -> Instance<'static> {
    Instance {
        base_address,
        description: None,
        name: name.into(),
        peripheral: peripheral.into(),
    }
}

fn interrupt(name: &'static str, value: u16) -> Interrupt<'static> {
    Interrupt {
        description: None,
        name: name.into(),
        owners: vec![name.into()],
        value,
    }
}

/// Two UARTs and a USB controller on an ARMv7-M core
pub(crate) fn device() -> Device<'static> {
    let interrupts = vec![
        interrupt("USBHS", 34),
        interrupt("UART3", 45),
        interrupt("UART4", 46),
    ];

    Device {
        arch: Arch::ArmV7M,
        extra_docs: None,
        instances: vec![
            instance("USBHS", "Usbhs", 0x4003_8000),
            instance("UART3", "Uart", 0x400E_1C00),
            instance("UART4", "Uart", 0x400E_1E00),
        ],
        memory: cm::memory_map(),
        name: "SAME70".into(),
        peripherals: vec![uart(), usbhs()],
        vectors: VectorTable::new(Arch::ArmV7M, &interrupts),
        interrupts,
    }
}
