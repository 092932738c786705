//! The textual back-end: renders the same emission protocol as the Wasm
//! text format's `(module ...)` S-expression, for diagnostics.

use alloc::{format, string::String, string::ToString, vec::Vec};

use jvm2wasm_arena::ArenaIndex;
use jvm2wasm_branch::Payload;
use jvm2wasm_core::{BlockOp, CastOp, FunctionType, NumericOp, ValueType};

use super::{FuncIdx, FunctionRecord, ModuleWriter, ParamKind, TypeTable};

/// Produces the `(module ...)` S-expression rendering of a compiled unit.
/// Mirrors [`BinaryWriter`](super::BinaryWriter)'s bookkeeping exactly, but
/// accumulates text lines instead of bytes.
pub struct TextWriter {
    types: TypeTable,
    functions: Vec<FunctionRecord>,
    name_to_func: alloc::collections::BTreeMap<String, FuncIdx>,
    pending_exports: Vec<(String, String)>,

    current_name: String,
    current_params: Vec<ValueType>,
    current_result: Option<ValueType>,
    code_lines: Vec<String>,
    indent: usize,

    function_texts: Vec<String>,
    last_text_len: u32,
}

impl TextWriter {
    pub fn new(dedup_function_types: bool) -> Self {
        Self {
            types: TypeTable::new(dedup_function_types),
            functions: Vec::new(),
            name_to_func: alloc::collections::BTreeMap::new(),
            pending_exports: Vec::new(),
            current_name: String::new(),
            current_params: Vec::new(),
            current_result: None,
            code_lines: Vec::new(),
            indent: 0,
            function_texts: Vec::new(),
            last_text_len: 0,
        }
    }

    /// The character length of the most recently completed function's
    /// rendered text. Consulted by `CompilerConfig::max_function_body_size`
    /// enforcement; not bytewise comparable to the binary back-end's
    /// count, but the same cap still catches runaway bodies.
    pub fn last_function_text_len(&self) -> u32 {
        self.last_text_len
    }

    fn push_line(&mut self, line: impl Into<String>) {
        let indent = "  ".repeat(self.indent + 3);
        self.code_lines.push(format!("{indent}{}", line.into()));
    }

    /// Assembles the final `(module ...)` text. Consumes `self`.
    pub fn finish(self) -> String {
        let mut out = String::from("(module");
        if !self.pending_exports.is_empty() {
            out.push('\n');
        }
        for (method_name, export_name) in &self.pending_exports {
            debug_assert!(self.name_to_func.contains_key(method_name), "export of undefined function {method_name}");
            out.push_str(&format!("  (export \"{export_name}\" (func ${method_name}))\n"));
        }
        for text in &self.function_texts {
            out.push('\n');
            out.push_str(text);
        }
        out.push_str("\n)");
        out
    }
}

impl ModuleWriter for TextWriter {
    fn write_export(&mut self, method_name: &str, export_name: &str) {
        self.pending_exports.push((method_name.to_string(), export_name.to_string()));
    }

    fn write_method_start(&mut self, name: &str) {
        self.current_name = name.to_string();
        self.current_params.clear();
        self.current_result = None;
        self.code_lines.clear();
        self.indent = 0;
    }

    fn write_method_param(&mut self, kind: ParamKind, ty: ValueType) {
        match kind {
            ParamKind::Param => self.current_params.push(ty),
            ParamKind::Return => self.current_result = Some(ty),
        }
    }

    fn write_method_finish(&mut self, locals: &[ValueType]) {
        let ty = FunctionType::new(self.current_params.clone(), self.current_result);
        let type_idx = self.types.alloc(ty);
        let func_idx = FuncIdx::from_usize(self.functions.len());
        let name = self.current_name.clone();
        self.functions.push(FunctionRecord {
            type_idx,
            name: name.clone(),
        });
        self.name_to_func.insert(name.clone(), func_idx);

        let mut header = format!("  (func ${name}");
        for param in &self.current_params {
            header.push_str(&format!(" (param {})", param.text_name()));
        }
        if let Some(result) = self.current_result {
            header.push_str(&format!(" (result {})", result.text_name()));
        }
        for local in locals {
            header.push_str(&format!(" (local {})", local.text_name()));
        }

        let mut text = header;
        if !self.code_lines.is_empty() {
            text.push('\n');
            text.push_str(&self.code_lines.join("\n"));
        }
        text.push(')');
        self.last_text_len = text.len() as u32;
        self.function_texts.push(text);
    }

    fn write_const_int(&mut self, value: i32) {
        self.push_line(format!("i32.const {value}"));
    }

    fn write_const_long(&mut self, value: i64) {
        self.push_line(format!("i64.const {value}"));
    }

    fn write_const_float(&mut self, value: f32) {
        self.push_line(format!("f32.const {value}"));
    }

    fn write_const_double(&mut self, value: f64) {
        self.push_line(format!("f64.const {value}"));
    }

    fn write_load(&mut self, index: u32) {
        self.push_line(format!("get_local {index}"));
    }

    fn write_store(&mut self, index: u32) {
        self.push_line(format!("set_local {index}"));
    }

    fn write_numeric_operator(&mut self, op: NumericOp, ty: ValueType) {
        self.push_line(format!("{}.{}", ty.text_name(), numeric_mnemonic(op, ty)));
    }

    fn write_cast(&mut self, op: CastOp) {
        self.push_line(op.wasm_mnemonic());
    }

    fn write_return(&mut self) {
        self.push_line("return");
    }

    fn write_block_code(&mut self, op: BlockOp, payload: Option<&Payload>) {
        match op {
            BlockOp::Block => {
                self.push_line("block");
                self.indent += 1;
            }
            BlockOp::Loop => {
                self.push_line("loop");
                self.indent += 1;
            }
            BlockOp::If => {
                self.push_line("if");
                self.indent += 1;
            }
            BlockOp::Else => {
                self.indent -= 1;
                self.push_line("else");
                self.indent += 1;
            }
            BlockOp::End => {
                self.indent -= 1;
                self.push_line("end");
            }
            BlockOp::Return => self.push_line("return"),
            BlockOp::Br => {
                let depth = expect_depth(payload);
                self.push_line(format!("br {depth}"));
            }
            BlockOp::BrIf => {
                let depth = expect_depth(payload);
                self.push_line(format!("br_if {depth}"));
            }
            BlockOp::BrTable => {
                let (block_indices, default_index) = expect_table_dispatch(payload);
                let targets = block_indices.iter().map(u32::to_string).collect::<Vec<_>>().join(" ");
                self.push_line(format!("br_table {targets} {default_index}"));
            }
        }
    }
}

fn expect_depth(payload: Option<&Payload>) -> u32 {
    match payload {
        Some(Payload::Depth(depth)) => *depth,
        other => panic!("br/br_if requires a Depth payload, got {other:?}"),
    }
}

fn expect_table_dispatch(payload: Option<&Payload>) -> (&Vec<u32>, u32) {
    match payload {
        Some(Payload::Dispatch {
            is_table_switch: true,
            block_indices,
            default_index,
            ..
        }) => (block_indices, *default_index),
        other => panic!("br_table requires a table-switch Dispatch payload, got {other:?}"),
    }
}

/// `div`/`rem`/the relational operators are only signed-vs-unsigned on the
/// integer types; floats have a single bare variant of each
/// (`f32.div`, `f32.lt`, ...). Mirrors the `(ty, op)` dispatch in
/// `binary.rs`'s `numeric_opcode` so the two back-ends never disagree on
/// signedness.
fn numeric_mnemonic(op: NumericOp, ty: ValueType) -> &'static str {
    let is_float = matches!(ty, ValueType::F32 | ValueType::F64);
    match op {
        NumericOp::Add => "add",
        NumericOp::Sub => "sub",
        NumericOp::Mul => "mul",
        NumericOp::Div => {
            if is_float {
                "div"
            } else {
                "div_s"
            }
        }
        NumericOp::Rem => "rem_s",
        NumericOp::Neg => "neg",
        NumericOp::And => "and",
        NumericOp::Or => "or",
        NumericOp::Xor => "xor",
        NumericOp::Shl => "shl",
        NumericOp::ShrS => "shr_s",
        NumericOp::ShrU => "shr_u",
        NumericOp::Eq => "eq",
        NumericOp::Ne => "ne",
        NumericOp::Lt => {
            if is_float {
                "lt"
            } else {
                "lt_s"
            }
        }
        NumericOp::Le => {
            if is_float {
                "le"
            } else {
                "le_s"
            }
        }
        NumericOp::Gt => {
            if is_float {
                "gt"
            } else {
                "gt_s"
            }
        }
        NumericOp::Ge => {
            if is_float {
                "ge"
            } else {
                "ge_s"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_module_renders_bare_form() {
        let writer = TextWriter::new(false);
        assert_eq!(writer.finish(), "(module\n)");
    }

    #[test]
    fn integer_div_and_relationals_get_signed_suffix() {
        assert_eq!(numeric_mnemonic(NumericOp::Div, ValueType::I32), "div_s");
        assert_eq!(numeric_mnemonic(NumericOp::Lt, ValueType::I64), "lt_s");
        assert_eq!(numeric_mnemonic(NumericOp::Ge, ValueType::I32), "ge_s");
    }

    #[test]
    fn float_div_and_relationals_have_no_signed_variant() {
        assert_eq!(numeric_mnemonic(NumericOp::Div, ValueType::F32), "div");
        assert_eq!(numeric_mnemonic(NumericOp::Lt, ValueType::F64), "lt");
        assert_eq!(numeric_mnemonic(NumericOp::Ge, ValueType::F32), "ge");
    }

    #[test]
    fn int_const_function_renders_body_and_export() {
        let mut writer = TextWriter::new(false);
        writer.write_method_start("intConst");
        writer.write_method_param(ParamKind::Return, ValueType::I32);
        writer.write_export("intConst", "intConst");
        writer.write_const_int(42);
        writer.write_method_finish(&[]);
        let text = writer.finish();
        assert!(text.contains("(export \"intConst\" (func $intConst))"));
        assert!(text.contains("(func $intConst (result i32)"));
        assert!(text.contains("i32.const 42"));
    }
}
