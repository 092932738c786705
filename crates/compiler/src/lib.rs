//! Compiles stack-machine bytecode methods into WebAssembly modules.
//!
//! A [`CompilerSession`] owns one in-progress module (either the binary
//! encoding or the textual S-expression form) and accepts a sequence of
//! classes via [`CompilerSession::compile_class`]. Each exported method is
//! run through two passes: [`BranchManager`](jvm2wasm_branch::BranchManager)
//! recovers a structured control-flow tree from the method's raw `if`/
//! `goto`/`switch` targets, then [`translator::translate_method`] walks the
//! bytecode a second time, emitting through the
//! [`ModuleWriter`](writer::ModuleWriter) protocol shared by the binary and
//! textual back-ends.
//!
//! ```
//! use jvm2wasm::{class_reader::{CodeAttribute, FixtureClass, FixtureMethod}, CompilerSession};
//! use jvm2wasm_core::ValueType;
//!
//! let class = FixtureClass {
//!     class_name: "Example".into(),
//!     methods: vec![FixtureMethod {
//!         name: "answer".into(),
//!         export_name: Some("answer".into()),
//!         params: vec![],
//!         result: Some(ValueType::I32),
//!         code: Some(CodeAttribute::new(0, vec![0x10, 42, 0xac], Default::default())), // bipush 42; ireturn
//!     }],
//!     constants: Default::default(),
//! };
//!
//! let mut session = CompilerSession::new_binary(Default::default());
//! session.compile_class(&class).unwrap();
//! let wasm = session.finish();
//! assert_eq!(&wasm[0..4], b"\0asm");
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(
    clippy::cast_lossless,
    clippy::missing_errors_doc,
    clippy::used_underscore_binding,
    clippy::redundant_closure_for_method_calls,
    clippy::type_repetition_in_bounds,
    clippy::inconsistent_struct_constructor,
    clippy::default_trait_access,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

pub mod class_reader;
mod config;
mod session;
mod translator;
pub mod writer;

pub use self::{config::CompilerConfig, session::CompilerSession};
pub use jvm2wasm_core::CompileError;
