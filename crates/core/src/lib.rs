//! Core primitives shared by every crate in the jvm2wasm compiler.
//!
//! This crate has no knowledge of JVM class files or of the Wasm binary
//! format; it only fixes the small closed vocabularies both ends of the
//! pipeline need to agree on: Wasm's primitive [`ValueType`]s, the
//! structural shape of a [`FunctionType`], the tagged instruction
//! vocabulary emitted by the branch manager and method translator
//! ([`BlockOp`], [`NumericOp`], [`CastOp`]), and the one domain error kind
//! ([`CompileError`]) every fallible operation in the pipeline returns.

#![cfg_attr(not(feature = "std"), no_std)]
#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

mod error;
mod func_type;
mod op;
mod value_type;

pub use self::{
    error::CompileError,
    func_type::FunctionType,
    op::{BlockOp, CastOp, NumericOp},
    value_type::ValueType,
};
