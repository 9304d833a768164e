use std::borrow::Cow;

use proc_macro2::{Span as Span2, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{Ident, LitInt};

use crate::{
    fmt::Hex,
    ir::{Bitfield, Register, Width},
    verify,
};

pub fn ident(s: &str) -> Ident {
    if verify::is_keyword(s) {
        format_ident!("{}_", s)
    } else {
        format_ident!("{}", s)
    }
}

/// Smallest unsigned integer that holds `width` bits; widths never exceed 32
pub fn bitwidth2ty(width: u8) -> TokenStream2 {
    if width <= 8 {
        quote!(u8)
    } else if width <= 16 {
        quote!(u16)
    } else {
        quote!(u32)
    }
}

pub fn hex(val: u64) -> LitInt {
    LitInt::new(&Hex(val).to_string(), Span2::call_site())
}

/// Bits that must be cleared when converting a read view into a write view
pub fn r2wmask(reg: &Register<'_>) -> u64 {
    reg.read_only_mask()
}

pub fn unsuffixed(val: u64) -> LitInt {
    LitInt::new(&val.to_string(), Span2::call_site())
}

pub fn width2ty(width: Width) -> TokenStream2 {
    match width {
        Width::U8 => quote!(u8),
        Width::U16 => quote!(u16),
        Width::U32 => quote!(u32),
    }
}

pub fn field_docs(field: &Bitfield<'_>) -> String {
    let mut doc = if field.width == 1 {
        format!("(Bit {})", field.offset)
    } else {
        format!("(Bits {}..={})", field.offset, field.end() - 1)
    };
    if let Some(desc) = field.description.as_ref() {
        doc.push(' ');
        doc.push_str(desc);
    }
    doc
}

pub fn doc<'a>(
    description: &'a Option<Cow<'_, str>>,
    fallback: impl FnOnce() -> String,
) -> Cow<'a, str> {
    match description {
        Some(desc) => Cow::from(&**desc),
        None => Cow::from(fallback()),
    }
}
