use std::collections::BTreeSet;

use quote::{format_ident, quote};

use crate::{bind::BoundTable, verify::Verified};

/// Source of the vector table (`vectors.rs`)
///
/// Every handler and the stack top are declared as `extern` symbols; the firmware (or its linker
/// script) provides them.
pub fn vectors(device: &Verified<'_>, table: &BoundTable) -> String {
    debug_assert_eq!(device.vectors.len(), table.len());

    let stack_top = format_ident!("{}", table.stack_top);
    let mut symbols = BTreeSet::new();
    let entries = table
        .slots
        .iter()
        .map(|slot| {
            let symbol = slot.handler.symbol();
            symbols.insert(symbol);
            let handler = format_ident!("{}", symbol);
            quote!(Vector { handler: #handler })
        })
        .collect::<Vec<_>>();
    let symbols = symbols.iter().map(|s| format_ident!("{}", s));

    let n = table.len();
    let doc = format!("{} vector table", device.name);
    quote!(
        #[repr(C)]
        union Vector {
            stack_pointer: *const u32,
            handler: unsafe extern "C" fn(),
        }

        extern "C" {
            static #stack_top: u32;

            #(fn #symbols();)*
        }

        #[doc = #doc]
        #[link_section = ".vectors"]
        #[no_mangle]
        static mut VECTORS: [Vector; #n] = [
            Vector {
                stack_pointer: unsafe { &#stack_top as *const u32 },
            },
            #(#entries,)*
        ];
    )
    .to_string()
}
