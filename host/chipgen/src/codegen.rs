//! Rust source emitters
//!
//! [`device`] emits a `no_std` register API crate; [`vectors`] emits the vector table

mod util;
mod vectors;

use std::borrow::Cow;

use heck::SnakeCase;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::Ident;

pub use self::vectors::vectors;
use crate::{
    codegen,
    ir::{Bitfield, Instance, Interrupt, MemoryRegion, Peripheral, Register},
    verify::Verified,
};

/// Source of the register API crate (`lib.rs`)
pub fn device(device: &Verified<'_>) -> String {
    let mut items = vec![];

    items.push(codegen::common(&device.name, &device.extra_docs));

    for periph in &device.peripherals {
        items.push(codegen::peripheral(periph));
    }

    for instance in &device.instances {
        if let Some(periph) = device.peripheral(&instance.peripheral) {
            items.push(codegen::instance(instance, periph));
        }
    }

    if !device.interrupts.is_empty() {
        items.push(codegen::interrupts(&device.interrupts));
    }

    items.push(codegen::memory(&device.memory));

    log::debug!(
        "generated {} peripheral types and {} instances",
        device.peripherals.len(),
        device.instances.len()
    );
    quote!(#(#items)*).to_string()
}

fn common(name: &str, extra_docs: &Option<Cow<'_, str>>) -> TokenStream2 {
    let mut doc = format!("{} register API", name);
    if let Some(extra_docs) = extra_docs {
        doc.push_str("\n\n");
        doc.push_str(extra_docs);
    }
    quote!(
        #![deny(missing_docs)]
        #![deny(rust_2018_compatibility)]
        #![deny(rust_2018_idioms)]
        #![doc = #doc]
        #![no_std]

        use core::marker::PhantomData;

        /// An instance of a peripheral
        pub trait Peripheral {
            /// The base address of the peripheral instance
            fn base_address() -> usize;
        }

        /// An integer that fits in `N` bits
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct Bits<const N: u8>(u32);

        impl<const N: u8> Bits<N> {
            /// Largest value that fits in `N` bits
            pub const MAX: u32 = if N >= 32 { u32::MAX } else { (1u32 << N) - 1 };

            /// Returns `None` if `value` doesn't fit in `N` bits
            pub const fn new(value: u32) -> Option<Self> {
                if value <= Self::MAX {
                    Some(Bits(value))
                } else {
                    None
                }
            }

            /// Like `new` but, when evaluated in a const context, a `value` that doesn't fit is
            /// a compile time error
            pub const fn from_const(value: u32) -> Self {
                assert!(value <= Self::MAX, "value doesn't fit in the bitfield");
                Bits(value)
            }

            /// Returns the value
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<bool> for Bits<1> {
            fn from(bit: bool) -> Self {
                Bits(bit as u32)
            }
        }

        #[allow(dead_code)]
        struct NotSendOrSync {
            inner: PhantomData<*mut ()>,
        }

        #[allow(dead_code)]
        impl NotSendOrSync {
            fn new() -> Self {
                Self {
                    inner: PhantomData,
                }
            }
        }
    )
}

fn peripheral(peripheral: &Peripheral<'_>) -> TokenStream2 {
    let mut items = vec![];
    let mut field_decls = vec![];
    let mut field_exprs = vec![];

    for reg in peripheral.registers() {
        items.push(codegen::register(reg));

        let doc = util::doc(&reg.description, || format!("{} register", reg.name));
        let name = util::ident(&reg.name);
        let mod_name = util::ident(&reg.name.to_snake_case());
        match reg.dim {
            Some(dim) => {
                let count = util::unsuffixed(u64::from(dim.count));
                let elements = (0..dim.count).map(|i| {
                    let offset = util::hex(reg.element_offset(i));
                    quote!(#mod_name::Register::new(base + #offset))
                });
                field_decls.push(quote!(
                    #[doc = #doc]
                    pub #name: [#mod_name::Register; #count]
                ));
                field_exprs.push(quote!(
                    #name: [#(#elements,)*]
                ));
            }

            None => {
                let offset = util::hex(reg.offset);
                field_decls.push(quote!(
                    #[doc = #doc]
                    pub #name: #mod_name::Register
                ));
                field_exprs.push(quote!(
                    #name: #mod_name::Register::new(base + #offset)
                ));
            }
        }
    }

    let size = util::hex(peripheral.size);
    let doc = util::doc(&peripheral.description, || {
        format!("{} peripheral", peripheral.name)
    });
    let mod_name = util::ident(&peripheral.name.to_snake_case());
    quote!(
        #[doc = #doc]
        pub mod #mod_name {
            /// Size of the register block in bytes
            pub const SIZE: usize = #size;

            /// Handles to the registers of one instance
            #[allow(non_snake_case)]
            pub struct Registers {
                #(#field_decls,)*
            }

            impl Registers {
                /// # Safety
                /// `base` must be the base address of an instance and the handles must not alias
                pub(crate) unsafe fn new(base: usize) -> Self {
                    Self {
                        #(#field_exprs,)*
                    }
                }
            }

            #(#items)*
        }
    )
}

fn instance(instance: &Instance<'_>, peripheral: &Peripheral<'_>) -> TokenStream2 {
    let name = util::ident(&instance.name);
    let mod_name = util::ident(&peripheral.name.to_snake_case());
    let base_addr = util::hex(instance.base_address);
    let doc = util::doc(&instance.description, || {
        format!("{} ({} instance)", instance.name, peripheral.name)
    });

    quote!(
        #[allow(non_camel_case_types)]
        #[doc = #doc]
        pub struct #name {
            registers: #mod_name::Registers,
        }

        unsafe impl Send for #name {}

        impl Peripheral for #name {
            fn base_address() -> usize {
                #base_addr
            }
        }

        impl core::ops::Deref for #name {
            type Target = #mod_name::Registers;

            fn deref(&self) -> &#mod_name::Registers {
                &self.registers
            }
        }

        impl #name {
            /// # Safety
            /// Singleton
            unsafe fn new() -> Self {
                Self {
                    registers: #mod_name::Registers::new(#base_addr),
                }
            }

            fn taken() -> &'static core::sync::atomic::AtomicBool {
                static TAKEN: core::sync::atomic::AtomicBool =
                    core::sync::atomic::AtomicBool::new(false);
                &TAKEN
            }

            /// Grants temporary access to the peripheral, without checking if it has already been
            /// taken
            #[inline(always)]
            pub fn borrow_unchecked<T>(f: impl FnOnce(&Self) -> T) -> T {
                f(unsafe { &Self::new() })
            }

            /// Seals the peripheral making it impossible to `take` it
            pub fn seal() {
                Self::taken().store(true, core::sync::atomic::Ordering::Relaxed)
            }

            /// Takes ownership of the peripheral
            ///
            /// This constructor returns the `Some` variant only once
            pub fn take() -> Option<Self> {
                use core::sync::atomic::Ordering;

                let taken = Self::taken();

                if taken
                    .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    Some(unsafe { Self::new() })
                } else {
                    None
                }
            }
        }
    )
}

fn interrupts(interrupts: &[Interrupt<'_>]) -> TokenStream2 {
    let variants = interrupts.iter().map(|interrupt| {
        let name = util::ident(&interrupt.name);
        let nr = util::unsuffixed(u64::from(interrupt.value));
        let doc = util::doc(&interrupt.description, || format!("IRQ {}", interrupt.value));
        quote!(
            #[doc = #doc]
            #name = #nr
        )
    });

    quote!(
        /// Device interrupts
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[repr(u16)]
        pub enum Interrupt {
            #(#variants,)*
        }

        impl Interrupt {
            /// The IRQ number
            pub fn nr(self) -> u16 {
                self as u16
            }
        }
    )
}

fn memory(regions: &[MemoryRegion<'_>]) -> TokenStream2 {
    let items = regions.iter().map(|region| {
        let start = format_ident!("{}_START", *region.name);
        let size = format_ident!("{}_SIZE", *region.name);
        let start_doc = format!("Start address of the {} region", region.name);
        let size_doc = format!("Size of the {} region in bytes", region.name);
        let start_val = util::hex(region.start);
        let size_val = util::hex(region.size);
        quote!(
            #[doc = #start_doc]
            pub const #start: usize = #start_val;
            #[doc = #size_doc]
            pub const #size: usize = #size_val;
        )
    });

    quote!(
        /// The system address map
        pub mod memory {
            #(#items)*
        }
    )
}

/// Name of the enum that holds the documented values of each bitfield
///
/// A read-only and a write-only bitfield may share a name; the second one gets an `_AW` suffix.
fn enum_names(register: &Register<'_>) -> Vec<Option<Ident>> {
    let mut used = vec![];
    register
        .fields
        .iter()
        .map(|field| {
            if !field.is_enumerated() {
                return None;
            }

            let mut name = format!("{}_A", field.name);
            if used.contains(&name) {
                name = format!("{}_AW", field.name);
            }
            used.push(name.clone());
            Some(format_ident!("{}", name))
        })
        .collect()
}

fn enumeration(field: &Bitfield<'_>, name: &Ident) -> TokenStream2 {
    let fty = util::bitwidth2ty(field.width);
    let width = util::unsuffixed(u64::from(field.width));

    let variants = field.values.iter().map(|value| {
        let variant = util::ident(&value.name);
        let bits = util::hex(value.value);
        let doc = util::doc(&value.description, || format!("`{}`", value.name));
        quote!(
            #[doc = #doc]
            #variant = #bits
        )
    });

    let arms = field.values.iter().map(|value| {
        let variant = util::ident(&value.name);
        let bits = util::hex(value.value);
        quote!(#bits => Ok(#name::#variant))
    });

    let doc = format!("Documented values of the {} bitfield", field.name);
    quote!(
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[doc = #doc]
        #[repr(#fty)]
        pub enum #name {
            #(#variants,)*
        }

        impl #name {
            /// Maps raw bits to a documented value; undocumented bits are returned as `Err`
            pub fn from_bits(bits: #fty) -> Result<Self, #fty> {
                match bits {
                    #(#arms,)*
                    _ => Err(bits),
                }
            }

            /// The raw bits of this value
            pub fn bits(self) -> crate::Bits<#width> {
                crate::Bits(self as u32)
            }
        }
    )
}

fn getter(field: &Bitfield<'_>, enum_name: Option<&Ident>) -> TokenStream2 {
    let fty = util::bitwidth2ty(field.width);
    let field_name = util::ident(&field.name);
    let offset = util::unsuffixed(u64::from(field.offset));
    let mask = util::hex(field.mask());
    let doc = util::field_docs(field);

    let raw = |name: &Ident, doc: &str| {
        quote!(
            #[allow(non_snake_case)]
            #[doc = #doc]
            pub fn #name(self) -> #fty {
                const OFFSET: u8 = #offset;
                const MASK: #fty = #mask;
                ((self.inner >> OFFSET) as #fty) & MASK
            }
        )
    };

    match enum_name {
        None => raw(&field_name, &doc),

        Some(enum_name) => {
            let bits_name = format_ident!("{}_bits", *field.name);
            let raw = raw(&bits_name, "Raw bits of the bitfield");
            quote!(
                #[allow(non_snake_case)]
                #[doc = #doc]
                pub fn #field_name(self) -> Result<#enum_name, #fty> {
                    #enum_name::from_bits(self.#bits_name())
                }

                #raw
            )
        }
    }
}

fn setter(field: &Bitfield<'_>, enum_name: Option<&Ident>, rty: &TokenStream2) -> TokenStream2 {
    let field_name = util::ident(&field.name);
    let offset = util::unsuffixed(u64::from(field.offset));
    let mask = util::hex(field.mask());
    let width = util::unsuffixed(u64::from(field.width));
    let doc = util::field_docs(field);

    let raw = |name: &Ident, doc: &str| {
        quote!(
            #[allow(non_snake_case)]
            #[doc = #doc]
            pub fn #name(&mut self, val: crate::Bits<#width>) -> &mut Self {
                const OFFSET: u8 = #offset;
                const MASK: #rty = #mask;
                self.inner &= !(MASK << OFFSET);
                self.inner |= (val.get() as #rty) << OFFSET;
                self
            }
        )
    };

    match enum_name {
        None => raw(&field_name, &doc),

        Some(enum_name) => {
            let bits_name = format_ident!("{}_bits", *field.name);
            let raw = raw(
                &bits_name,
                "Writes raw bits to the bitfield, including undocumented values",
            );
            quote!(
                #[allow(non_snake_case)]
                #[doc = #doc]
                pub fn #field_name(&mut self, val: #enum_name) -> &mut Self {
                    self.#bits_name(val.bits())
                }

                #raw
            )
        }
    }
}

fn register(register: &Register<'_>) -> TokenStream2 {
    let mod_name = util::ident(&register.name.to_snake_case());
    let rty = util::width2ty(register.width);
    let enums = enum_names(register);

    let mut mod_items = vec![];
    for (field, name) in register.fields.iter().zip(&enums) {
        if let Some(name) = name {
            mod_items.push(codegen::enumeration(field, name));
        }
    }

    let r_fields = register
        .fields
        .iter()
        .zip(&enums)
        .filter(|(f, _)| f.access.can_read())
        .collect::<Vec<_>>();
    let w_fields = register
        .fields
        .iter()
        .zip(&enums)
        .filter(|(f, _)| f.access.can_write())
        .collect::<Vec<_>>();

    let r_view = register.access.can_read() && !r_fields.is_empty();
    let w_view = register.access.can_write() && !w_fields.is_empty();

    let mut rmethods = vec![];
    if register.access.can_read() {
        if r_view {
            let methods = r_fields
                .iter()
                .map(|(field, name)| codegen::getter(field, name.as_ref()));

            mod_items.push(quote!(
                /// View into the readable bitfields
                #[derive(Clone, Copy)]
                pub struct R {
                    inner: #rty,
                }

                impl From<#rty> for R {
                    fn from(bits: #rty) -> Self {
                        R { inner: bits }
                    }
                }

                impl From<R> for #rty {
                    fn from(r: R) -> Self {
                        r.inner
                    }
                }

                impl R {
                    #(#methods)*

                    /// Returns the raw contents of the register
                    pub fn bits(self) -> #rty {
                        self.inner
                    }
                }
            ));

            rmethods.push(quote!(
                /// Reads the contents of the register in a single, volatile instruction
                pub fn read(&self) -> R {
                    R::from(unsafe { self.address().read_volatile() })
                }
            ));
        } else {
            rmethods.push(quote!(
                /// Reads the contents of the register in a single, volatile instruction
                pub fn read(&self) -> #rty {
                    unsafe {
                        self.address().read_volatile()
                    }
                }
            ));
        }
    }

    let (unsafety, safe) = if register.access.write_is_unsafe() {
        (quote!(unsafe), quote!())
    } else {
        (quote!(), quote!(unsafe))
    };

    if register.access.can_write() {
        if w_view {
            let methods = w_fields
                .iter()
                .map(|(field, name)| codegen::setter(field, name.as_ref(), &rty));

            mod_items.push(quote!(
                /// View into the writable bitfields
                #[derive(Clone, Copy)]
                pub struct W {
                    inner: #rty,
                }

                impl From<W> for #rty {
                    fn from(w: W) -> Self {
                        w.inner
                    }
                }

                impl W {
                    /// Writable view with all bitfields set to zero
                    pub fn zero() -> W {
                        W { inner: 0 }
                    }

                    #(#methods)*
                }
            ));

            rmethods.push(quote!(
                /// Writes the bits set by `f` to the register in a single, volatile instruction
                #[inline(always)]
                pub #unsafety fn write(&self, f: impl FnOnce(&mut W) -> &mut W) {
                    let mut w = W::zero();
                    f(&mut w);
                    #safe { self.address().write_volatile(w.into()) }
                }

                /// Writes zeros to the register
                #[inline(always)]
                pub #unsafety fn zero(&self) {
                    #safe { self.address().write_volatile(0) }
                }
            ));
        } else {
            rmethods.push(quote!(
                /// Writes `bits` to the register in a single, volatile instruction
                pub #unsafety fn write(&self, bits: #rty) {
                    #safe { self.address().write_volatile(bits) }
                }
            ));
        }
    }

    if register.access.can_read() && register.access.can_write() {
        let doc = quote!(
            /// Updates the contents of the register using the closure `f`
            ///
            /// This performs a `read` operation followed by a `write` operation
        );

        match (r_view, w_view) {
            (false, false) => {
                rmethods.push(quote!(
                    #doc
                    #[inline(always)]
                    pub #unsafety fn rmw(&self, f: impl FnOnce(#rty) -> #rty) {
                        self.write(f(self.read()))
                    }
                ));
            }

            (true, false) => {
                rmethods.push(quote!(
                    #doc
                    #[inline(always)]
                    pub #unsafety fn rmw(&self, f: impl FnOnce(R) -> #rty) {
                        let bits = f(self.read());
                        #safe { self.address().write_volatile(bits) }
                    }
                ));
            }

            (false, true) => {
                rmethods.push(quote!(
                    #doc
                    #[inline(always)]
                    pub #unsafety fn rmw(&self, f: impl FnOnce(#rty, &mut W) -> &mut W) {
                        let r = self.read();
                        let mut w = W { inner: r };
                        f(r, &mut w);
                        #safe { self.address().write_volatile(w.into()) }
                    }
                ));
            }

            (true, true) => {
                let r2wmask = util::r2wmask(register);
                let inner = if r2wmask == 0 {
                    quote!(r.inner)
                } else {
                    let r2wmask = util::hex(r2wmask);
                    quote!(r.inner & !(#r2wmask))
                };
                mod_items.push(quote!(
                    impl From<R> for W {
                        fn from(r: R) -> W {
                            W {
                                inner: #inner,
                            }
                        }
                    }

                    impl W {
                        /// Copies the contents of `R`
                        pub fn copy(&mut self, r: R) -> &mut Self {
                            *self = r.into();
                            self
                        }
                    }
                ));

                rmethods.push(quote!(
                    #doc
                    #[inline(always)]
                    pub #unsafety fn rmw(
                        &self,
                        f: impl FnOnce(R, &mut W) -> &mut W,
                    ) {
                        let r = self.read();
                        let mut w = r.into();
                        f(r, &mut w);
                        #safe { self.address().write_volatile(w.into()) }
                    }
                ));
            }
        }
    }

    let doc = util::doc(&register.description, || {
        format!("{} register", register.name)
    });
    let pty = if register.access.can_write() {
        quote!(*mut #rty)
    } else {
        quote!(*const #rty)
    };
    quote!(
        #[doc = #doc]
        pub mod #mod_name {
            use crate::NotSendOrSync;

            /// Handle to the register
            pub struct Register {
                address: usize,
                _not_send_or_sync: NotSendOrSync,
            }

            impl Register {
                /// # Safety
                /// Singleton
                pub(crate) unsafe fn new(address: usize) -> Self {
                    Self { address, _not_send_or_sync: NotSendOrSync::new() }
                }

                /// Returns the address of this register
                pub fn address(&self) -> #pty {
                    self.address as #pty
                }

                #(#rmethods)*
            }

            #(#mod_items)*
        }
    )
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;
    use crate::{cm, fixture, ir::Access};

    fn contains(code: &str, tokens: TokenStream2) -> bool {
        code.contains(&tokens.to_string())
    }

    #[test]
    fn emits_valid_rust() {
        let dev = fixture::device().verify().unwrap();
        let code = device(&dev);
        syn::parse_file(&code).unwrap();

        let core = cm::device().verify().unwrap();
        syn::parse_file(&device(&core)).unwrap();
    }

    #[test]
    fn instances_share_a_register_block() {
        let dev = fixture::device().verify().unwrap();
        let code = device(&dev);

        assert!(contains(&code, quote!(pub mod uart)));
        assert!(contains(&code, quote!(pub struct UART3 { registers: uart::Registers, })));
        assert!(contains(&code, quote!(pub struct UART4 { registers: uart::Registers, })));
        assert!(contains(
            &code,
            quote!(registers: uart::Registers::new(0x400e_1e00),)
        ));
        assert!(contains(&code, quote!(pub fn take() -> Option<Self>)));
        assert!(contains(&code, quote!(pub const SIZE: usize = 0x0100;)));
    }

    #[test]
    fn access_decides_the_methods() {
        let dev = fixture::device().verify().unwrap();
        let file = syn::parse_file(&device(&dev)).unwrap();

        let methods = |module: &str, register: &str| -> Vec<String> {
            let uart = file
                .items
                .iter()
                .find_map(|item| match item {
                    syn::Item::Mod(m) if m.ident == module => m.content.as_ref(),
                    _ => None,
                })
                .unwrap();
            let reg = uart
                .1
                .iter()
                .find_map(|item| match item {
                    syn::Item::Mod(m) if m.ident == register => m.content.as_ref(),
                    _ => None,
                })
                .unwrap();
            reg.1
                .iter()
                .filter_map(|item| match item {
                    syn::Item::Impl(i) if quote!(#i).to_string().starts_with("impl Register") => {
                        Some(i)
                    }
                    _ => None,
                })
                .flat_map(|i| i.items.iter())
                .filter_map(|item| match item {
                    syn::ImplItem::Method(m) if matches!(m.vis, syn::Visibility::Public(_)) => {
                        Some(m.sig.ident.to_string())
                    }
                    _ => None,
                })
                .filter(|name| name != "new" && name != "address")
                .collect()
        };

        assert_eq!(methods("uart", "sr"), ["read"]);
        assert_eq!(methods("uart", "cr"), ["write", "zero"]);
        assert_eq!(methods("uart", "mr"), ["read", "write", "zero", "rmw"]);
        assert_eq!(methods("uart", "ier"), ["write"]);
    }

    #[test]
    fn bitfields() {
        let dev = fixture::device().verify().unwrap();
        let code = device(&dev);

        // enumerated: typed accessors plus raw escape hatches
        assert!(contains(&code, quote!(pub enum CHMODE_A)));
        assert!(contains(&code, quote!(LOCAL_LOOPBACK = 0x02)));
        assert!(contains(
            &code,
            quote!(pub fn CHMODE(self) -> Result<CHMODE_A, u8>)
        ));
        assert!(contains(
            &code,
            quote!(pub fn CHMODE(&mut self, val: CHMODE_A) -> &mut Self)
        ));
        assert!(contains(
            &code,
            quote!(pub fn CHMODE_bits(&mut self, val: crate::Bits<2>) -> &mut Self)
        ));

        // plain integers
        assert!(contains(
            &code,
            quote!(pub fn CD(&mut self, val: crate::Bits<16>) -> &mut Self)
        ));
        assert!(contains(&code, quote!(pub fn CD(self) -> u16)));
        assert!(contains(&code, quote!(pub fn RXRDY(self) -> u8)));

        // arrays
        assert!(contains(
            &code,
            quote!(pub DEVEPTCFG: [deveptcfg::Register; 10])
        ));
        assert!(contains(
            &code,
            quote!(deveptcfg::Register::new(base + 0x0124),)
        ));
    }

    #[test]
    fn read_only_bits_are_not_written_back() {
        let core = cm::device().verify().unwrap();
        let code = device(&core);
        // AIRCR: ENDIANNESS and VECTKEYSTAT
        assert!(contains(&code, quote!(inner: r.inner & !(0xffff_8000),)));
    }

    #[test]
    fn unsafe_writes() {
        let mut dev = fixture::device();
        dev.make_write_unsafe("Uart", "BRGR").unwrap();
        let brgr = dev.peripheral("Uart").unwrap().register("BRGR").unwrap();
        assert_eq!(brgr.access, Access::ReadWrite { unsafe_write: true });

        let code = device(&dev.verify().unwrap());
        assert!(contains(
            &code,
            quote!(pub unsafe fn write(&self, f: impl FnOnce(&mut W) -> &mut W))
        ));
    }

    #[test]
    fn interrupts_and_memory_map() {
        let dev = fixture::device().verify().unwrap();
        let code = device(&dev);
        assert!(contains(&code, quote!(UART3 = 45)));
        assert!(contains(&code, quote!(pub const PERIPHERAL_START: usize = 0x4000_0000;)));

        // no interrupts, no enum
        let core = cm::device().verify().unwrap();
        assert!(!device(&core).contains("enum Interrupt"));
    }

    #[test]
    fn keywords_are_escaped() {
        assert_eq!(util::ident("in").to_string(), "in_");
        assert_eq!(util::ident("type").to_string(), "type_");
        assert_eq!(util::ident("UART0").to_string(), "UART0");
    }
}
