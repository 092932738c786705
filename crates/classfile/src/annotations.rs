//! `RuntimeVisibleAnnotations` parsing, solely to recognize the `@Export`
//! annotation (by unqualified type name, per §6) and its optional `name`
//! element override. Every other annotation, and every other element
//! value, is parsed only far enough to skip past correctly.

use alloc::string::String;

use jvm2wasm_core::CompileError;

use crate::{constant_pool::ConstantPool, cursor::Cursor};

/// The `@Export` annotation found on a method, with its optional `name`
/// element (`@Export("foo")` or `@Export(name = "foo")`-style override).
pub struct ExportAnnotation {
    pub name: Option<String>,
}

/// Scans a method's `RuntimeVisibleAnnotations` attribute body for an
/// `@Export` annotation. `bytes` is the attribute's `info` payload, not
/// including the attribute name/length header.
pub fn find_export_annotation(bytes: &[u8], pool: &ConstantPool) -> Result<Option<ExportAnnotation>, CompileError> {
    let mut cursor = Cursor::new(bytes);
    let count = cursor.read_u16()?;
    let mut found = None;
    for _ in 0..count {
        let annotation = parse_annotation(&mut cursor, pool)?;
        if unqualified_name(&annotation.type_descriptor) == "Export" {
            found = Some(ExportAnnotation { name: annotation.name_element });
        }
    }
    Ok(found)
}

struct ParsedAnnotation {
    type_descriptor: String,
    name_element: Option<String>,
}

fn parse_annotation(cursor: &mut Cursor<'_>, pool: &ConstantPool) -> Result<ParsedAnnotation, CompileError> {
    let type_index = cursor.read_u16()?;
    let type_descriptor = String::from(pool.utf8(type_index)?);
    let pair_count = cursor.read_u16()?;
    let mut name_element = None;
    for _ in 0..pair_count {
        let element_name_index = cursor.read_u16()?;
        let element_name = pool.utf8(element_name_index)?;
        let value = read_element_value(cursor, pool, element_name == "name")?;
        if element_name == "name" {
            name_element = value;
        }
    }
    Ok(ParsedAnnotation { type_descriptor, name_element })
}

/// Reads one `element_value` structure, returning its string payload only
/// when `want_string` is set and the tag is `s` (String). Every other tag
/// is consumed but discarded — this compiler never needs an `@Export`
/// element beyond the optional `name` override.
fn read_element_value(cursor: &mut Cursor<'_>, pool: &ConstantPool, want_string: bool) -> Result<Option<String>, CompileError> {
    let tag = cursor.read_u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => {
            cursor.skip(2)?;
            Ok(None)
        }
        b's' => {
            let index = cursor.read_u16()?;
            if want_string {
                Ok(Some(String::from(pool.utf8(index)?)))
            } else {
                Ok(None)
            }
        }
        b'e' => {
            cursor.skip(4)?;
            Ok(None)
        }
        b'c' => {
            cursor.skip(2)?;
            Ok(None)
        }
        b'@' => {
            parse_annotation(cursor, pool)?;
            Ok(None)
        }
        b'[' => {
            let count = cursor.read_u16()?;
            for _ in 0..count {
                read_element_value(cursor, pool, false)?;
            }
            Ok(None)
        }
        other => Err(CompileError::unsupported_class_file(alloc::format!("unrecognized annotation element_value tag '{}'", other as char))),
    }
}

/// Strips an annotation type descriptor (`"Lpkg/sub/Export;"`) down to its
/// unqualified name (`"Export"`).
fn unqualified_name(descriptor: &str) -> &str {
    let inner = descriptor.strip_prefix('L').and_then(|s| s.strip_suffix(';')).unwrap_or(descriptor);
    inner.rsplit('/').next().unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unqualified_name_strips_package_and_wrapper() {
        assert_eq!(unqualified_name("Ljvm2wasm/Export;"), "Export");
        assert_eq!(unqualified_name("LExport;"), "Export");
    }
}
