//! The tagged instruction vocabularies the branch manager and method
//! translator emit through.

/// A structured Wasm control-flow operator.
///
/// This is the closed set the branch manager's [`BranchNode`][node] tree is
/// built from: every node carries an optional open tag and an optional
/// close tag drawn from this enum.
///
/// # Note
///
/// `Else` is special: it simultaneously closes the if-true arm of an `if`
/// and opens the if-false arm, so a single `BranchNode` with `open:
/// Some(Else)` represents the entire else-arm interval.
///
/// [node]: https://docs.rs/jvm2wasm_branch
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockOp {
    Block,
    Loop,
    If,
    Else,
    End,
    Br,
    BrIf,
    BrTable,
    Return,
}

/// A numeric (arithmetic/comparison/bitwise) operator, dispatched against a
/// [`ValueType`](crate::ValueType) by the writer to pick the concrete Wasm
/// instruction (e.g. `Add` against `i32` becomes `i32.add`, against `f64`
/// becomes `f64.add`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NumericOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl NumericOp {
    /// Returns `true` for operators that exist only for integer types
    /// (`i32`/`i64`) in Wasm: bitwise and shift operators, and `rem`.
    pub const fn is_integer_only(self) -> bool {
        matches!(
            self,
            NumericOp::And
                | NumericOp::Or
                | NumericOp::Xor
                | NumericOp::Shl
                | NumericOp::ShrS
                | NumericOp::ShrU
                | NumericOp::Rem
        )
    }
}

/// A value-type conversion, named after its JVM mnemonic (`i2l`, `l2i`, …).
///
/// Each one maps onto exactly one Wasm conversion instruction; the mapping
/// lives with the writer since it is purely mechanical (see the
/// `writeCast` contract).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CastOp {
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
}

impl CastOp {
    /// Returns the Wasm text-format mnemonic this cast lowers to.
    pub const fn wasm_mnemonic(self) -> &'static str {
        match self {
            CastOp::I2L => "i64.extend_i32_s",
            CastOp::I2F => "f32.convert_i32_s",
            CastOp::I2D => "f64.convert_i32_s",
            CastOp::L2I => "i32.wrap_i64",
            CastOp::L2F => "f32.convert_i64_s",
            CastOp::L2D => "f64.convert_i64_s",
            CastOp::F2I => "i32.trunc_f32_s",
            CastOp::F2L => "i64.trunc_f32_s",
            CastOp::F2D => "f64.promote_f32",
            CastOp::D2I => "i32.trunc_f64_s",
            CastOp::D2L => "i64.trunc_f64_s",
            CastOp::D2F => "f32.demote_f64",
        }
    }
}
