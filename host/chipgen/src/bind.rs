//! Binding firmware handlers to vector table slots

use core::fmt;
use std::collections::{btree_map, BTreeMap};

use anyhow::bail;
use thiserror::Error;

use crate::{
    error::Report,
    ir::{Arch, Exception, Slot},
    verify::{is_ident, is_keyword, Verified},
};

/// Handler used for every slot without an explicit binding
pub const DEFAULT_HANDLER: &str = "DefaultHandler";

/// Linker symbol holding the initial stack pointer
pub const STACK_TOP: &str = "__stack_top__";

/// Items declared next to the symbols in the vector table source
const ITEMS: &[(&str, &str)] = &[("Vector", "union Vector"), ("VECTORS", "static VECTORS")];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Vector {
    Exception(Exception),
    /// IRQ number
    Interrupt(u16),
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vector::Exception(e) => write!(f, "exception {}", e),
            Vector::Interrupt(irq) => write!(f, "IRQ {}", irq),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("handler {symbol} is bound to IRQ {irq}, which the device does not declare")]
    StaleInterrupt { irq: u16, symbol: String },

    #[error("handler {symbol} is bound to exception {exception} but {arch} has no such exception")]
    UnsupportedException {
        exception: Exception,
        arch: Arch,
        symbol: String,
    },

    #[error("{name} is neither a core exception nor an interrupt of the device")]
    UnknownName { name: String },

    #[error("{vector} is bound to both {first} and {second}")]
    DuplicateBinding {
        vector: Vector,
        first: String,
        second: String,
    },

    #[error("{symbol:?} is not a valid symbol name")]
    InvalidSymbol { symbol: String },

    #[error("symbol {symbol} clashes with {other}")]
    SymbolClash { symbol: String, other: &'static str },
}

#[derive(Clone, Debug)]
enum Key {
    Vector(Vector),
    /// Resolved against the device when binding
    Name(String),
}

/// Handler assignments supplied by the firmware
#[derive(Clone, Debug, Default)]
pub struct Handlers {
    entries: Vec<(Key, String)>,
    stack_top: Option<String>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vector: Vector, symbol: impl Into<String>) {
        self.entries.push((Key::Vector(vector), symbol.into()));
    }

    /// Adds an assignment written as `NAME=SYMBOL` or `IRQ=SYMBOL`
    ///
    /// `NAME` is an exception (e.g. `SysTick`) or an interrupt of the device (e.g. `UART0`).
    pub fn parse_assignment(&mut self, assignment: &str) -> Result<(), anyhow::Error> {
        let (lhs, rhs) = match assignment.find('=') {
            Some(pos) => (assignment[..pos].trim(), assignment[pos + 1..].trim()),
            None => bail!("expected NAME=SYMBOL, found {:?}", assignment),
        };

        if lhs.is_empty() || rhs.is_empty() {
            bail!("expected NAME=SYMBOL, found {:?}", assignment);
        }

        let key = match lhs.parse::<u16>() {
            Ok(irq) => Key::Vector(Vector::Interrupt(irq)),
            Err(_) => Key::Name(lhs.to_string()),
        };
        self.entries.push((key, rhs.to_string()));
        Ok(())
    }

    /// Overrides the symbol placed in slot 0
    pub fn set_stack_top(&mut self, symbol: impl Into<String>) {
        self.stack_top = Some(symbol.into());
    }
}

/// The handler of a vector table slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Handler {
    Bound(String),
    Default,
}

impl Handler {
    pub fn symbol(&self) -> &str {
        match self {
            Handler::Bound(symbol) => symbol,
            Handler::Default => DEFAULT_HANDLER,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundSlot {
    /// What the slot is for, e.g. `interrupt UART0 (IRQ 7)`
    pub description: String,
    pub handler: Handler,
}

/// A vector table with every slot resolved to a symbol
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundTable {
    /// Slot 0
    pub stack_top: String,
    /// Slots 1 and up
    pub slots: Vec<BoundSlot>,
}

impl BoundTable {
    /// Number of slots, including the initial stack pointer
    pub fn len(&self) -> usize {
        self.slots.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Symbol of the `index`-th slot
    pub fn symbol(&self, index: usize) -> Option<&str> {
        if index == 0 {
            Some(&self.stack_top)
        } else {
            self.slots.get(index - 1).map(|s| s.handler.symbol())
        }
    }
}

/// Resolves `handlers` against the vector table of `device`
///
/// All binding errors are reported together.
pub fn bind(device: &Verified<'_>, handlers: &Handlers) -> Result<BoundTable, Report<BindError>> {
    let mut errors = vec![];
    let mut bound: BTreeMap<Vector, String> = BTreeMap::new();

    let stack_top = handlers.stack_top.as_deref().unwrap_or(STACK_TOP);
    if check_symbol(stack_top, &mut errors) && stack_top == DEFAULT_HANDLER {
        errors.push(BindError::SymbolClash {
            symbol: stack_top.to_string(),
            other: "the default handler",
        });
    }

    for (key, symbol) in &handlers.entries {
        if !check_symbol(symbol, &mut errors) {
            continue;
        }

        // the stack top is declared as a `static`, handlers as functions
        if symbol == stack_top {
            errors.push(BindError::SymbolClash {
                symbol: symbol.clone(),
                other: "the stack top",
            });
            continue;
        }

        let vector = match key {
            Key::Vector(vector) => *vector,
            Key::Name(name) => {
                if let Some(e) = Exception::from_name(name) {
                    Vector::Exception(e)
                } else if let Some(interrupt) = device.interrupt(name) {
                    Vector::Interrupt(interrupt.value)
                } else {
                    errors.push(BindError::UnknownName { name: name.clone() });
                    continue;
                }
            }
        };

        match vector {
            Vector::Exception(exception) if !device.arch.has(exception) => {
                errors.push(BindError::UnsupportedException {
                    exception,
                    arch: device.arch,
                    symbol: symbol.clone(),
                });
                continue;
            }

            Vector::Interrupt(irq) if !device.interrupts.iter().any(|i| i.value == irq) => {
                errors.push(BindError::StaleInterrupt {
                    irq,
                    symbol: symbol.clone(),
                });
                continue;
            }

            _ => {}
        }

        match bound.entry(vector) {
            btree_map::Entry::Occupied(e) => {
                // repeating the same assignment is harmless
                if e.get() != symbol {
                    errors.push(BindError::DuplicateBinding {
                        vector,
                        first: e.get().clone(),
                        second: symbol.clone(),
                    });
                }
            }

            btree_map::Entry::Vacant(e) => {
                log::debug!("{} -> {}", vector, symbol);
                e.insert(symbol.clone());
            }
        }
    }

    Report::check(errors)?;

    let slots = device
        .vectors
        .slots
        .iter()
        .skip(1)
        .map(|slot| {
            let vector = match slot {
                Slot::Exception(e) => Some(Vector::Exception(*e)),
                Slot::Interrupt { irq, .. } => Some(Vector::Interrupt(*irq)),
                Slot::StackPointer | Slot::Reserved => None,
            };

            let handler = match vector.and_then(|v| bound.get(&v)) {
                Some(symbol) => Handler::Bound(symbol.clone()),
                None => Handler::Default,
            };

            BoundSlot {
                description: slot.to_string(),
                handler,
            }
        })
        .collect();

    Ok(BoundTable {
        stack_top: stack_top.to_string(),
        slots,
    })
}

/// Checks that `symbol` can be declared in the vector table source
fn check_symbol(symbol: &str, errors: &mut Vec<BindError>) -> bool {
    if !is_ident(symbol) || is_keyword(symbol) {
        errors.push(BindError::InvalidSymbol {
            symbol: symbol.to_string(),
        });
        return false;
    }

    if let Some((_, item)) = ITEMS.iter().find(|(name, _)| *name == symbol) {
        errors.push(BindError::SymbolClash {
            symbol: symbol.to_string(),
            other: *item,
        });
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixture, ir::CORE_SLOTS};

    fn handlers(assignments: &[&str]) -> Handlers {
        let mut handlers = Handlers::new();
        for assignment in assignments {
            handlers.parse_assignment(assignment).unwrap();
        }
        handlers
    }

    #[test]
    fn unbound_slots_get_the_default_handler() {
        let dev = fixture::device().verify().unwrap();
        let table = bind(&dev, &handlers(&["UART3=uart3", "SysTick=tick", "34=usb"])).unwrap();

        assert_eq!(table.len(), CORE_SLOTS + 47);
        assert_eq!(table.symbol(0), Some(STACK_TOP));
        assert_eq!(table.symbol(Exception::SysTick.slot()), Some("tick"));
        assert_eq!(table.symbol(CORE_SLOTS + 45), Some("uart3"));
        assert_eq!(table.symbol(CORE_SLOTS + 34), Some("usb"));
        assert_eq!(table.symbol(CORE_SLOTS + 46), Some(DEFAULT_HANDLER));
        assert_eq!(table.symbol(CORE_SLOTS + 47), None);

        // reserved slots too
        assert_eq!(table.slots[6].description, "a reserved slot");
        assert_eq!(table.slots[6].handler, Handler::Default);

        assert_eq!(
            table
                .slots
                .iter()
                .filter(|s| s.handler != Handler::Default)
                .count(),
            3
        );
    }

    #[test]
    fn stack_top_override() {
        let dev = fixture::device().verify().unwrap();
        let mut h = Handlers::new();
        h.set_stack_top("_stack_start");
        h.insert(Vector::Exception(Exception::HardFault), "fault");

        let table = bind(&dev, &h).unwrap();
        assert_eq!(table.stack_top, "_stack_start");
        assert_eq!(table.symbol(3), Some("fault"));
    }

    #[test]
    fn errors_are_reported_together() {
        let mut dev = fixture::device();
        dev.arch = Arch::ArmV6M;
        for interrupt in &mut dev.interrupts {
            interrupt.value -= 30;
        }
        dev.vectors = crate::ir::VectorTable::new(dev.arch, &dev.interrupts);
        let dev = dev.verify().unwrap();

        let report = bind(
            &dev,
            &handlers(&["99=gone", "UART9=nope", "BusFault=bus", "USBHS=a", "4=b", "NMI=1x"]),
        )
        .unwrap_err();

        assert_eq!(
            report.errors(),
            [
                BindError::StaleInterrupt {
                    irq: 99,
                    symbol: "gone".into(),
                },
                BindError::UnknownName {
                    name: "UART9".into(),
                },
                BindError::UnsupportedException {
                    exception: Exception::BusFault,
                    arch: Arch::ArmV6M,
                    symbol: "bus".into(),
                },
                BindError::DuplicateBinding {
                    vector: Vector::Interrupt(4),
                    first: "a".into(),
                    second: "b".into(),
                },
                BindError::InvalidSymbol {
                    symbol: "1x".into(),
                },
            ]
        );
        assert_eq!(
            report.errors()[0].to_string(),
            "handler gone is bound to IRQ 99, which the device does not declare"
        );
    }

    #[test]
    fn repeated_assignment_is_accepted() {
        let dev = fixture::device().verify().unwrap();
        let table = bind(&dev, &handlers(&["UART4=uart", "46=uart"])).unwrap();
        assert_eq!(table.symbol(CORE_SLOTS + 46), Some("uart"));
    }

    #[test]
    fn symbols_that_cannot_be_declared() {
        let dev = fixture::device().verify().unwrap();
        let mut h = handlers(&[
            "UART3=loop",
            "SysTick=tick",
            "UART4=VECTORS",
            "USBHS=Vector",
        ]);
        h.set_stack_top("tick");

        assert_eq!(
            bind(&dev, &h).unwrap_err().errors(),
            [
                BindError::InvalidSymbol {
                    symbol: "loop".into(),
                },
                BindError::SymbolClash {
                    symbol: "tick".into(),
                    other: "the stack top",
                },
                BindError::SymbolClash {
                    symbol: "VECTORS".into(),
                    other: "static VECTORS",
                },
                BindError::SymbolClash {
                    symbol: "Vector".into(),
                    other: "union Vector",
                },
            ]
        );

        let mut h = Handlers::new();
        h.set_stack_top(DEFAULT_HANDLER);
        assert_eq!(
            bind(&dev, &h).unwrap_err().errors(),
            [BindError::SymbolClash {
                symbol: DEFAULT_HANDLER.into(),
                other: "the default handler",
            }]
        );

        // a handler may name the default handler explicitly
        assert!(bind(&dev, &handlers(&["UART3=DefaultHandler"])).is_ok());
    }

    #[test]
    fn malformed_assignments() {
        let mut h = Handlers::new();
        assert!(h.parse_assignment("UART3").is_err());
        assert!(h.parse_assignment("=uart3").is_err());
        assert!(h.parse_assignment("UART3=").is_err());
        assert!(h.parse_assignment(" UART3 = uart3 ").is_ok());
    }
}
