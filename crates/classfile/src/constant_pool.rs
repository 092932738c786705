//! Constant pool decoding.
//!
//! Only the tags this compiler ever needs to resolve are given a real
//! variant; everything else (`MethodHandle`, `InvokeDynamic`, …) is parsed
//! far enough to skip correctly and kept only as [`ConstantPoolEntry::Other`]
//! so indices downstream of it stay aligned.

use alloc::string::String;

use jvm2wasm_core::CompileError;

use crate::cursor::Cursor;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_INVOKE_DYNAMIC: u8 = 18;

#[derive(Debug, Clone)]
pub enum ConstantPoolEntry {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    /// A tag this compiler never resolves directly (`String`, `NameAndType`,
    /// `Fieldref`/`Methodref`, `MethodHandle`, `InvokeDynamic`, …), or the
    /// unusable second slot a `Long`/`Double` entry occupies. The class-file
    /// format still requires parsing these far enough to skip correctly so
    /// later indices stay aligned.
    Other,
}

/// The constant pool, indexed exactly as the class file does: 1-based,
/// with slot 0 unused and long/double entries occupying two slots.
pub struct ConstantPool {
    entries: alloc::vec::Vec<ConstantPoolEntry>,
}

impl ConstantPool {
    pub fn parse(cursor: &mut Cursor<'_>, count: u16) -> Result<Self, CompileError> {
        // count includes the unused slot 0 and the dead high slot of every
        // Long/Double, so entries.len() may be less than `count`.
        let mut entries = alloc::vec![ConstantPoolEntry::Other];
        let mut index = 1u16;
        while index < count {
            let tag = cursor.read_u8()?;
            let entry = match tag {
                TAG_UTF8 => {
                    let len = cursor.read_u16()?;
                    let bytes = cursor.slice(len as usize)?;
                    let text = core::str::from_utf8(bytes)
                        .map_err(|_| CompileError::unsupported_class_file("Utf8 constant is not valid UTF-8"))?;
                    ConstantPoolEntry::Utf8(String::from(text))
                }
                TAG_INTEGER => ConstantPoolEntry::Integer(cursor.read_i32()?),
                TAG_FLOAT => ConstantPoolEntry::Float(cursor.read_f32()?),
                TAG_LONG => ConstantPoolEntry::Long(cursor.read_i64()?),
                TAG_DOUBLE => ConstantPoolEntry::Double(cursor.read_f64()?),
                TAG_CLASS => ConstantPoolEntry::Class {
                    name_index: cursor.read_u16()?,
                },
                TAG_STRING => {
                    cursor.skip(2)?;
                    ConstantPoolEntry::Other
                }
                TAG_FIELDREF | TAG_METHODREF | TAG_INTERFACE_METHODREF => {
                    cursor.skip(4)?;
                    ConstantPoolEntry::Other
                }
                TAG_NAME_AND_TYPE => {
                    cursor.skip(4)?;
                    ConstantPoolEntry::Other
                }
                TAG_METHOD_HANDLE => {
                    cursor.skip(3)?;
                    ConstantPoolEntry::Other
                }
                TAG_METHOD_TYPE => {
                    cursor.skip(2)?;
                    ConstantPoolEntry::Other
                }
                TAG_INVOKE_DYNAMIC => {
                    cursor.skip(4)?;
                    ConstantPoolEntry::Other
                }
                other => return Err(CompileError::unsupported_class_file(alloc::format!("unrecognized constant pool tag {other}"))),
            };
            let is_wide = matches!(entry, ConstantPoolEntry::Long(_) | ConstantPoolEntry::Double(_));
            entries.push(entry);
            index += 1;
            if is_wide {
                entries.push(ConstantPoolEntry::Other);
                index += 1;
            }
        }
        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&ConstantPoolEntry, CompileError> {
        self.entries
            .get(index as usize)
            .ok_or_else(|| CompileError::unsupported_class_file(alloc::format!("constant pool index {index} out of range")))
    }

    pub fn utf8(&self, index: u16) -> Result<&str, CompileError> {
        match self.get(index)? {
            ConstantPoolEntry::Utf8(text) => Ok(text),
            _ => Err(CompileError::unsupported_class_file(alloc::format!("constant pool index {index} is not Utf8"))),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str, CompileError> {
        match self.get(index)? {
            ConstantPoolEntry::Class { name_index } => self.utf8(*name_index),
            _ => Err(CompileError::unsupported_class_file(alloc::format!("constant pool index {index} is not a Class"))),
        }
    }

    /// Every numeric constant this compiler's `ldc`/`ldc2_w` handling can
    /// resolve. `None` for anything else (`String`, `Class`, …) — the
    /// caller turns that into `CompileError::unsupported_opcode`.
    pub fn numeric_constant(&self, index: u16) -> Option<jvm2wasm::class_reader::ConstantValue> {
        use jvm2wasm::class_reader::ConstantValue;
        match self.entries.get(index as usize)? {
            ConstantPoolEntry::Integer(value) => Some(ConstantValue::Int(*value)),
            ConstantPoolEntry::Long(value) => Some(ConstantValue::Long(*value)),
            ConstantPoolEntry::Float(value) => Some(ConstantValue::Float(*value)),
            ConstantPoolEntry::Double(value) => Some(ConstantValue::Double(*value)),
            _ => None,
        }
    }
}
