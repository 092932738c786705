//! The supplementary class-file interface boundary (§6 of the governing
//! design): the compiler drives translation purely against these traits,
//! never against a concrete `.class` byte layout. `jvm2wasm_classfile`
//! implements them over real class-file bytes; tests in this crate
//! implement them directly over hand-built fixtures.

use alloc::{string::String, vec::Vec};

use jvm2wasm_core::ValueType;

/// A constant-pool entry this compiler knows how to interpret. Anything
/// else (`String`, `Class`, `MethodHandle`, …) is out of scope and a
/// [`ClassReader`] implementation should never hand one back for a `ldc`
/// site this compiler is asked to translate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ConstantValue {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

/// A method's `Code` attribute: raw bytecode plus the two pieces of
/// metadata the translator consults (`max_locals`, and an optional
/// pc-to-line mapping used only to tag [`CompileError`](jvm2wasm_core::CompileError)s).
#[derive(Debug, Clone)]
pub struct CodeAttribute {
    max_locals: u32,
    code: Vec<u8>,
    line_numbers: alloc::collections::BTreeMap<u32, u32>,
}

impl CodeAttribute {
    pub fn new(max_locals: u32, code: Vec<u8>, line_numbers: alloc::collections::BTreeMap<u32, u32>) -> Self {
        Self {
            max_locals,
            code,
            line_numbers,
        }
    }

    pub fn max_locals(&self) -> u32 {
        self.max_locals
    }

    pub fn bytes(&self) -> &[u8] {
        &self.code
    }

    /// Returns the source line number covering bytecode offset `pc`, if the
    /// class file carried a `LineNumberTable` entry for it. Used only to
    /// tag errors; never authoritative for translation.
    pub fn line_at(&self, pc: u32) -> Option<u32> {
        self.line_numbers.range(..=pc).next_back().map(|(_, &line)| line)
    }
}

/// A single method exposed by a [`ClassReader`].
///
/// `export_name` returns `Some(name)` when the method carries an `@Export`
/// annotation (the unqualified-name match described in §6); `name` is
/// always the overriding `name` element if present, defaulting to the
/// method's own simple name.
pub trait MethodView {
    fn name(&self) -> &str;
    fn export_name(&self) -> Option<&str>;
    fn params(&self) -> &[ValueType];
    fn result(&self) -> Option<ValueType>;
    fn code(&self) -> Option<&CodeAttribute>;
}

/// The parser service the compiler is driven against. A real
/// implementation parses a `.class` byte stream; this crate's tests
/// implement it directly as an in-memory fixture.
pub trait ClassReader {
    type Method: MethodView;

    /// The methods declared on the class, in declaration order — this
    /// order is preserved through to Wasm function indices (§5).
    fn methods(&self) -> &[Self::Method];

    /// Resolves a constant-pool entry referenced by a `ldc`/`ldc2_w` site.
    /// Returns `None` for an index this compiler cannot interpret (a
    /// `String` or `Class` constant, for instance) — the translator turns
    /// that into `CompileError::unsupported_opcode`.
    fn constant(&self, index: u16) -> Option<ConstantValue>;

    /// A human-readable name for the class, used only in error messages.
    fn name(&self) -> &str;
}

/// A minimal, self-contained [`ClassReader`]/[`MethodView`] pair for tests
/// and for hosts that already have parsed method bodies in memory and do
/// not want to round-trip through `.class` bytes.
#[derive(Debug, Clone, Default)]
pub struct FixtureMethod {
    pub name: String,
    pub export_name: Option<String>,
    pub params: Vec<ValueType>,
    pub result: Option<ValueType>,
    pub code: Option<CodeAttribute>,
}

impl MethodView for FixtureMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn export_name(&self) -> Option<&str> {
        self.export_name.as_deref()
    }

    fn params(&self) -> &[ValueType] {
        &self.params
    }

    fn result(&self) -> Option<ValueType> {
        self.result
    }

    fn code(&self) -> Option<&CodeAttribute> {
        self.code.as_ref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureClass {
    pub class_name: String,
    pub methods: Vec<FixtureMethod>,
    pub constants: alloc::collections::BTreeMap<u16, ConstantValue>,
}

impl ClassReader for FixtureClass {
    type Method = FixtureMethod;

    fn methods(&self) -> &[Self::Method] {
        &self.methods
    }

    fn constant(&self, index: u16) -> Option<ConstantValue> {
        self.constants.get(&index).copied()
    }

    fn name(&self) -> &str {
        &self.class_name
    }
}
