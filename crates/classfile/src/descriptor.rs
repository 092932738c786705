//! JVM field/method descriptor parsing into [`ValueType`]s.
//!
//! Only the primitive descriptor characters have a [`ValueType`]
//! counterpart; object and array types (`L...;`, `[...`) are rejected, per
//! the reference/array-rejection scope decision.

use alloc::vec::Vec;

use jvm2wasm_core::{CompileError, ValueType};

/// Parses a method descriptor (`"(params)return"`) into its parameter
/// types and an optional result type (`None` for `void`).
pub fn parse_method_descriptor(descriptor: &str) -> Result<(Vec<ValueType>, Option<ValueType>), CompileError> {
    let mut chars = descriptor.chars().peekable();
    if chars.next() != Some('(') {
        return Err(bad(descriptor));
    }
    let mut params = Vec::new();
    loop {
        match chars.peek() {
            Some(')') => {
                chars.next();
                break;
            }
            Some(_) => params.push(parse_one(&mut chars, descriptor)?),
            None => return Err(bad(descriptor)),
        }
    }
    let result = match chars.peek() {
        Some('V') => {
            chars.next();
            None
        }
        Some(_) => Some(parse_one(&mut chars, descriptor)?),
        None => return Err(bad(descriptor)),
    };
    if chars.next().is_some() {
        return Err(bad(descriptor));
    }
    Ok((params, result))
}

fn parse_one(chars: &mut core::iter::Peekable<core::str::Chars<'_>>, descriptor: &str) -> Result<ValueType, CompileError> {
    match chars.next() {
        Some('B' | 'C' | 'S' | 'Z' | 'I') => Ok(ValueType::I32),
        Some('J') => Ok(ValueType::I64),
        Some('F') => Ok(ValueType::F32),
        Some('D') => Ok(ValueType::F64),
        Some('L') => Err(CompileError::unsupported_class_file(alloc::format!(
            "object reference types are not supported (descriptor `{descriptor}`)"
        ))),
        Some('[') => Err(CompileError::unsupported_class_file(alloc::format!(
            "array types are not supported (descriptor `{descriptor}`)"
        ))),
        _ => Err(bad(descriptor)),
    }
}

fn bad(descriptor: &str) -> CompileError {
    CompileError::unsupported_class_file(alloc::format!("malformed descriptor `{descriptor}`"))
}
