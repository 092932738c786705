use alloc::{string::ToString, vec::Vec};

use jvm2wasm_arena::ArenaIndex;
use jvm2wasm_branch::Payload;
use jvm2wasm_core::{BlockOp, CastOp, FunctionType, NumericOp, ValueType};

use super::{
    leb128::{write_float32_le, write_float64_le, write_int32_le, write_name, write_varint32, write_varint64, write_varuint32},
    FuncIdx,
    FunctionRecord,
    ModuleWriter,
    ParamKind,
    TypeTable,
};

const OP_BLOCK: u8 = 0x02;
const OP_LOOP: u8 = 0x03;
const OP_IF: u8 = 0x04;
const OP_ELSE: u8 = 0x05;
const OP_END: u8 = 0x0b;
const OP_BR: u8 = 0x0c;
const OP_BR_IF: u8 = 0x0d;
const OP_BR_TABLE: u8 = 0x0e;
const OP_RETURN: u8 = 0x0f;
const OP_LOCAL_GET: u8 = 0x20;
const OP_LOCAL_SET: u8 = 0x21;
const EMPTY_BLOCKTYPE: u8 = 0x40;

/// Produces a Wasm module conforming to the binary format: magic, version,
/// then the Type, Function, Export, and Code sections in canonical order.
/// Function and type indices are positional, backed by the arena tables in
/// [`super`] rather than a `HashMap`.
pub struct BinaryWriter {
    types: TypeTable,
    functions: Vec<FunctionRecord>,
    name_to_func: alloc::collections::BTreeMap<alloc::string::String, FuncIdx>,
    pending_exports: Vec<(alloc::string::String, alloc::string::String)>,
    emit_name_section: bool,

    current_name: alloc::string::String,
    current_params: Vec<ValueType>,
    current_result: Option<ValueType>,
    code_buf: Vec<u8>,

    function_bodies: Vec<Vec<u8>>,
    last_body_len: u32,
}

impl BinaryWriter {
    pub fn new(dedup_function_types: bool, emit_name_section: bool) -> Self {
        Self {
            types: TypeTable::new(dedup_function_types),
            functions: Vec::new(),
            name_to_func: alloc::collections::BTreeMap::new(),
            pending_exports: Vec::new(),
            emit_name_section,
            current_name: alloc::string::String::new(),
            current_params: Vec::new(),
            current_result: None,
            code_buf: Vec::new(),
            function_bodies: Vec::new(),
            last_body_len: 0,
        }
    }

    /// The byte length of the most recently completed function body
    /// (locals prologue + code, excluding the leading size prefix).
    /// Consulted by `CompilerConfig::max_function_body_size` enforcement.
    pub fn last_function_body_len(&self) -> u32 {
        self.last_body_len
    }

    /// Assembles the final module. Consumes `self`; an empty module (no
    /// functions registered) produces exactly the eight header bytes.
    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"\0asm");
        write_int32_le(&mut out, 1);

        self.write_type_section(&mut out);
        self.write_function_section(&mut out);
        self.write_export_section(&mut out);
        self.write_code_section(&mut out);
        if self.emit_name_section {
            self.write_name_section(&mut out);
        }
        out
    }

    fn write_type_section(&self, out: &mut Vec<u8>) {
        if self.types.len() == 0 {
            return;
        }
        let mut body = Vec::new();
        write_varuint32(&mut body, self.types.len() as u32);
        for (_, ty) in self.types.iter() {
            write_function_type(&mut body, ty);
        }
        write_section(out, 1, &body);
    }

    fn write_function_section(&self, out: &mut Vec<u8>) {
        if self.functions.is_empty() {
            return;
        }
        let mut body = Vec::new();
        write_varuint32(&mut body, self.functions.len() as u32);
        for record in &self.functions {
            write_varuint32(&mut body, record.type_idx.into_index());
        }
        write_section(out, 3, &body);
    }

    fn write_export_section(&self, out: &mut Vec<u8>) {
        if self.pending_exports.is_empty() {
            return;
        }
        let mut body = Vec::new();
        write_varuint32(&mut body, self.pending_exports.len() as u32);
        for (method_name, export_name) in &self.pending_exports {
            let func_idx = self.name_to_func[method_name];
            write_name(&mut body, export_name);
            body.push(0x00); // external kind: function
            write_varuint32(&mut body, func_idx.into_index());
        }
        write_section(out, 7, &body);
    }

    fn write_code_section(&self, out: &mut Vec<u8>) {
        if self.function_bodies.is_empty() {
            return;
        }
        let mut body = Vec::new();
        write_varuint32(&mut body, self.function_bodies.len() as u32);
        for function_body in &self.function_bodies {
            body.extend_from_slice(function_body);
        }
        write_section(out, 10, &body);
    }

    fn write_name_section(&self, out: &mut Vec<u8>) {
        let mut names = Vec::new();
        names.push(1u8); // function-names subsection id
        let mut subsection = Vec::new();
        write_varuint32(&mut subsection, self.functions.len() as u32);
        for (idx, record) in self.functions.iter().enumerate() {
            write_varuint32(&mut subsection, idx as u32);
            write_name(&mut subsection, &record.name);
        }
        write_varuint32(&mut names, subsection.len() as u32);
        names.extend_from_slice(&subsection);

        write_varuint32(out, 0); // section id 0: custom
        let mut body = Vec::new();
        write_name(&mut body, "name");
        body.extend_from_slice(&names);
        write_varuint32(out, body.len() as u32);
        out.extend_from_slice(&body);
    }
}

fn write_function_type(out: &mut Vec<u8>, ty: &FunctionType) {
    out.push(0x60);
    write_varuint32(out, ty.params().len() as u32);
    for param in ty.params() {
        out.push(param.encoding());
    }
    match ty.result() {
        Some(result) => {
            write_varuint32(out, 1);
            out.push(result.encoding());
        }
        None => write_varuint32(out, 0),
    }
}

fn write_section(out: &mut Vec<u8>, id: u8, body: &[u8]) {
    if body.is_empty() {
        return;
    }
    write_varuint32(out, id as u32);
    write_varuint32(out, body.len() as u32);
    out.extend_from_slice(body);
}

trait IntoIndex {
    fn into_index(self) -> u32;
}
impl IntoIndex for super::TypeIdx {
    fn into_index(self) -> u32 {
        jvm2wasm_arena::ArenaIndex::into_usize(self) as u32
    }
}
impl IntoIndex for FuncIdx {
    fn into_index(self) -> u32 {
        jvm2wasm_arena::ArenaIndex::into_usize(self) as u32
    }
}

impl ModuleWriter for BinaryWriter {
    fn write_export(&mut self, method_name: &str, export_name: &str) {
        self.pending_exports.push((method_name.to_string(), export_name.to_string()));
    }

    fn write_method_start(&mut self, name: &str) {
        self.current_name = name.to_string();
        self.current_params.clear();
        self.current_result = None;
        self.code_buf.clear();
    }

    fn write_method_param(&mut self, kind: ParamKind, ty: ValueType) {
        match kind {
            ParamKind::Param => self.current_params.push(ty),
            ParamKind::Return => self.current_result = Some(ty),
        }
    }

    fn write_method_finish(&mut self, locals: &[ValueType]) {
        let ty = FunctionType::new(core::mem::take(&mut self.current_params), self.current_result.take());
        let type_idx = self.types.alloc(ty);
        let func_idx = FuncIdx::from_usize(self.functions.len());
        let name = core::mem::take(&mut self.current_name);
        self.functions.push(FunctionRecord { type_idx, name: name.clone() });
        self.name_to_func.insert(name, func_idx);

        let mut body = Vec::new();
        write_locals_section(&mut body, locals);
        body.extend_from_slice(&self.code_buf);
        body.push(OP_END);

        self.last_body_len = body.len() as u32;
        let mut framed = Vec::new();
        write_varuint32(&mut framed, body.len() as u32);
        framed.extend_from_slice(&body);
        self.function_bodies.push(framed);
        self.code_buf.clear();
    }

    fn write_const_int(&mut self, value: i32) {
        self.code_buf.push(0x41);
        write_varint32(&mut self.code_buf, value);
    }

    fn write_const_long(&mut self, value: i64) {
        self.code_buf.push(0x42);
        write_varint64(&mut self.code_buf, value);
    }

    fn write_const_float(&mut self, value: f32) {
        self.code_buf.push(0x43);
        write_float32_le(&mut self.code_buf, value);
    }

    fn write_const_double(&mut self, value: f64) {
        self.code_buf.push(0x44);
        write_float64_le(&mut self.code_buf, value);
    }

    fn write_load(&mut self, index: u32) {
        self.code_buf.push(OP_LOCAL_GET);
        write_varuint32(&mut self.code_buf, index);
    }

    fn write_store(&mut self, index: u32) {
        self.code_buf.push(OP_LOCAL_SET);
        write_varuint32(&mut self.code_buf, index);
    }

    fn write_numeric_operator(&mut self, op: NumericOp, ty: ValueType) {
        self.code_buf.push(numeric_opcode(op, ty));
    }

    fn write_cast(&mut self, op: CastOp) {
        self.code_buf.push(cast_opcode(op));
    }

    fn write_return(&mut self) {
        self.code_buf.push(OP_RETURN);
    }

    fn write_block_code(&mut self, op: BlockOp, payload: Option<&Payload>) {
        match op {
            BlockOp::Block => {
                self.code_buf.push(OP_BLOCK);
                self.code_buf.push(EMPTY_BLOCKTYPE);
            }
            BlockOp::Loop => {
                self.code_buf.push(OP_LOOP);
                self.code_buf.push(EMPTY_BLOCKTYPE);
            }
            BlockOp::If => {
                self.code_buf.push(OP_IF);
                self.code_buf.push(EMPTY_BLOCKTYPE);
            }
            BlockOp::Else => self.code_buf.push(OP_ELSE),
            BlockOp::End => self.code_buf.push(OP_END),
            BlockOp::Return => self.code_buf.push(OP_RETURN),
            BlockOp::Br => {
                self.code_buf.push(OP_BR);
                write_varuint32(&mut self.code_buf, expect_depth(payload));
            }
            BlockOp::BrIf => {
                self.code_buf.push(OP_BR_IF);
                write_varuint32(&mut self.code_buf, expect_depth(payload));
            }
            BlockOp::BrTable => {
                let (block_indices, default_index) = expect_table_dispatch(payload);
                self.code_buf.push(OP_BR_TABLE);
                write_varuint32(&mut self.code_buf, block_indices.len() as u32);
                for target in block_indices {
                    write_varuint32(&mut self.code_buf, *target);
                }
                write_varuint32(&mut self.code_buf, default_index);
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

fn write_locals_section(out: &mut Vec<u8>, locals: &[ValueType]) {
    let mut groups: Vec<(ValueType, u32)> = Vec::new();
    for &local in locals {
        match groups.last_mut() {
            Some((ty, count)) if *ty == local => *count += 1,
            _ => groups.push((local, 1)),
        }
    }
    write_varuint32(out, groups.len() as u32);
    for (ty, count) in groups {
        write_varuint32(out, count);
        out.push(ty.encoding());
    }
}

fn numeric_opcode(op: NumericOp, ty: ValueType) -> u8 {
    use NumericOp::*;
    use ValueType::*;
    match (ty, op) {
        (I32, Add) => 0x6a,
        (I32, Sub) => 0x6b,
        (I32, Mul) => 0x6c,
        (I32, Div) => 0x6d,
        (I32, Rem) => 0x6f,
        (I32, And) => 0x71,
        (I32, Or) => 0x72,
        (I32, Xor) => 0x73,
        (I32, Shl) => 0x74,
        (I32, ShrS) => 0x75,
        (I32, ShrU) => 0x76,
        (I32, Eq) => 0x46,
        (I32, Ne) => 0x47,
        (I32, Lt) => 0x48,
        (I32, Gt) => 0x4a,
        (I32, Le) => 0x4c,
        (I32, Ge) => 0x4e,
        (I32, Neg) => panic!("i32 has no native neg instruction; lowered via 0 - x at the translator"),
        (I64, Add) => 0x7c,
        (I64, Sub) => 0x7d,
        (I64, Mul) => 0x7e,
        (I64, Div) => 0x7f,
        (I64, Rem) => 0x81,
        (I64, And) => 0x83,
        (I64, Or) => 0x84,
        (I64, Xor) => 0x85,
        (I64, Shl) => 0x86,
        (I64, ShrS) => 0x87,
        (I64, ShrU) => 0x88,
        (I64, Eq) => 0x51,
        (I64, Ne) => 0x52,
        (I64, Lt) => 0x53,
        (I64, Gt) => 0x55,
        (I64, Le) => 0x57,
        (I64, Ge) => 0x59,
        (I64, Neg) => panic!("i64 has no native neg instruction; lowered via 0 - x at the translator"),
        (F32, Add) => 0x92,
        (F32, Sub) => 0x93,
        (F32, Mul) => 0x94,
        (F32, Div) => 0x95,
        (F32, Neg) => 0x8c,
        (F32, Eq) => 0x5b,
        (F32, Ne) => 0x5c,
        (F32, Lt) => 0x5d,
        (F32, Gt) => 0x5e,
        (F32, Le) => 0x5f,
        (F32, Ge) => 0x60,
        (F64, Add) => 0xa0,
        (F64, Sub) => 0xa1,
        (F64, Mul) => 0xa2,
        (F64, Div) => 0xa3,
        (F64, Neg) => 0x9a,
        (F64, Eq) => 0x61,
        (F64, Ne) => 0x62,
        (F64, Lt) => 0x63,
        (F64, Gt) => 0x64,
        (F64, Le) => 0x65,
        (F64, Ge) => 0x66,
        (ty, op) => panic!("numeric operator {op:?} has no Wasm instruction for {ty:?}"),
    }
}

fn cast_opcode(op: CastOp) -> u8 {
    match op {
        CastOp::I2L => 0xac,
        CastOp::I2F => 0xb2,
        CastOp::I2D => 0xb7,
        CastOp::L2I => 0xa7,
        CastOp::L2F => 0xb4,
        CastOp::L2D => 0xb9,
        CastOp::F2I => 0xa8,
        CastOp::F2L => 0xae,
        CastOp::F2D => 0xbb,
        CastOp::D2I => 0xaa,
        CastOp::D2L => 0xb0,
        CastOp::D2F => 0xb6,
    }
}
