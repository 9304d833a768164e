//! Register and interrupt-vector model for Cortex-M devices
//!
//! A chip description (CMSIS-SVD) is lowered into an [`ir::Device`], checked by
//! [`ir::Device::verify`] and then consumed by the emitters. [`codegen`] produces the source of a
//! `no_std` register API plus the vector table; [`accessor`] offers the same accessors as
//! in-memory descriptors.

#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]

pub mod accessor;
pub mod bind;
pub mod cm;
pub mod codegen;
pub mod error;
pub mod fmt;
pub mod ir;
pub mod translate;
pub mod verify;

#[cfg(test)]
mod fixture;

pub use crate::{
    error::Report,
    verify::{Verified, Violation},
};
