//! A minimal `.class` byte-stream reader, implementing
//! [`jvm2wasm::class_reader::ClassReader`]/[`MethodView`] over real class
//! file bytes so [`jvm2wasm::CompilerSession`] can be driven from files on
//! disk instead of hand-built fixtures.
//!
//! Parses exactly the subset of the class file format §6 names: the
//! constant pool tags the compiler can resolve a constant from, method
//! descriptors restricted to primitive types, the `Code` attribute (with
//! its `LineNumberTable`), and `RuntimeVisibleAnnotations` far enough to
//! recognize `@Export`. Anything else present in the file — other
//! attributes, fields, interfaces — is skipped by length, never
//! interpreted.
#![cfg_attr(not(feature = "std"), no_std)]
#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

mod annotations;
mod constant_pool;
mod cursor;
mod descriptor;

use alloc::{collections::BTreeMap, string::String, vec::Vec};

use jvm2wasm::class_reader::{ClassReader, CodeAttribute, ConstantValue, MethodView};
use jvm2wasm_core::CompileError;

use self::{annotations::find_export_annotation, constant_pool::ConstantPool, cursor::Cursor};

const MAGIC: u32 = 0xCAFE_BABE;

/// One method read out of a `.class` file.
pub struct ClassfileMethod {
    name: String,
    export_name: Option<String>,
    params: Vec<jvm2wasm_core::ValueType>,
    result: Option<jvm2wasm_core::ValueType>,
    code: Option<CodeAttribute>,
}

impl MethodView for ClassfileMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn export_name(&self) -> Option<&str> {
        self.export_name.as_deref()
    }

    fn params(&self) -> &[jvm2wasm_core::ValueType] {
        &self.params
    }

    fn result(&self) -> Option<jvm2wasm_core::ValueType> {
        self.result
    }

    fn code(&self) -> Option<&CodeAttribute> {
        self.code.as_ref()
    }
}

/// A parsed `.class` file.
pub struct ClassFile {
    name: String,
    methods: Vec<ClassfileMethod>,
    pool: ConstantPool,
}

impl ClassFile {
    /// Parses a complete `.class` file from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::unsupported_class_file`] if the file is
    /// truncated, carries a bad magic number, or uses a constant pool tag,
    /// descriptor type, or annotation element this reader does not
    /// understand.
    pub fn parse(bytes: &[u8]) -> Result<Self, CompileError> {
        let mut cursor = Cursor::new(bytes);
        let magic = cursor.read_u32()?;
        if magic != MAGIC {
            return Err(CompileError::unsupported_class_file(alloc::format!("bad magic number 0x{magic:08x}")));
        }
        cursor.skip(4)?; // minor_version, major_version

        let constant_pool_count = cursor.read_u16()?;
        let pool = ConstantPool::parse(&mut cursor, constant_pool_count)?;

        cursor.skip(2)?; // access_flags
        let this_class = cursor.read_u16()?;
        let name = String::from(pool.class_name(this_class)?);
        cursor.skip(2)?; // super_class

        let interfaces_count = cursor.read_u16()?;
        cursor.skip(usize::from(interfaces_count) * 2)?;

        skip_member_list(&mut cursor)?; // fields

        let methods_count = cursor.read_u16()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            methods.push(parse_method(&mut cursor, &pool)?);
        }

        skip_attributes(&mut cursor)?; // class-level attributes

        Ok(Self { name, methods, pool })
    }
}

impl ClassReader for ClassFile {
    type Method = ClassfileMethod;

    fn methods(&self) -> &[Self::Method] {
        &self.methods
    }

    fn constant(&self, index: u16) -> Option<ConstantValue> {
        self.pool.numeric_constant(index)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn skip_member_list(cursor: &mut Cursor<'_>) -> Result<(), CompileError> {
    let count = cursor.read_u16()?;
    for _ in 0..count {
        cursor.skip(6)?; // access_flags, name_index, descriptor_index
        skip_attributes(cursor)?;
    }
    Ok(())
}

fn skip_attributes(cursor: &mut Cursor<'_>) -> Result<(), CompileError> {
    let count = cursor.read_u16()?;
    for _ in 0..count {
        cursor.skip(2)?; // attribute_name_index
        let length = cursor.read_u32()?;
        cursor.skip(length as usize)?;
    }
    Ok(())
}

fn parse_method(cursor: &mut Cursor<'_>, pool: &ConstantPool) -> Result<ClassfileMethod, CompileError> {
    cursor.skip(2)?; // access_flags
    let name = String::from(pool.utf8(cursor.read_u16()?)?);
    let descriptor = pool.utf8(cursor.read_u16()?)?;
    let (params, result) = descriptor::parse_method_descriptor(descriptor)?;

    let mut code = None;
    let mut export_name = None;

    let attribute_count = cursor.read_u16()?;
    for _ in 0..attribute_count {
        let attr_name_index = cursor.read_u16()?;
        let attr_name = pool.utf8(attr_name_index)?;
        let length = cursor.read_u32()?;
        let body = cursor.slice(length as usize)?;
        match attr_name {
            "Code" => code = Some(parse_code(body, pool)?),
            "RuntimeVisibleAnnotations" => {
                if let Some(export) = find_export_annotation(body, pool)? {
                    export_name = Some(export.name.unwrap_or_else(|| name.clone()));
                }
            }
            _ => {}
        }
    }

    Ok(ClassfileMethod {
        name,
        export_name,
        params,
        result,
        code,
    })
}

fn parse_code(body: &[u8], pool: &ConstantPool) -> Result<CodeAttribute, CompileError> {
    let mut cursor = Cursor::new(body);
    cursor.skip(2)?; // max_stack
    let max_locals = u32::from(cursor.read_u16()?);
    let code_length = cursor.read_u32()?;
    let code = cursor.to_vec(code_length as usize)?;

    let exception_table_length = cursor.read_u16()?;
    cursor.skip(usize::from(exception_table_length) * 8)?;

    let mut line_numbers = BTreeMap::new();
    let attribute_count = cursor.read_u16()?;
    for _ in 0..attribute_count {
        let attr_name_index = cursor.read_u16()?;
        let length = cursor.read_u32()?;
        let attr_name = pool.utf8(attr_name_index)?;
        if attr_name == "LineNumberTable" {
            let entry_count = cursor.read_u16()?;
            for _ in 0..entry_count {
                let start_pc = u32::from(cursor.read_u16()?);
                let line = u32::from(cursor.read_u16()?);
                line_numbers.insert(start_pc, line);
            }
        } else {
            cursor.skip(length as usize)?;
        }
    }

    Ok(CodeAttribute::new(max_locals, code, line_numbers))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Builder {
        bytes: Vec<u8>,
    }

    impl Builder {
        fn new() -> Self {
            Self { bytes: Vec::new() }
        }
        fn u8(&mut self, v: u8) -> &mut Self {
            self.bytes.push(v);
            self
        }
        fn u16(&mut self, v: u16) -> &mut Self {
            self.bytes.extend_from_slice(&v.to_be_bytes());
            self
        }
        fn u32(&mut self, v: u32) -> &mut Self {
            self.bytes.extend_from_slice(&v.to_be_bytes());
            self
        }
        fn bytes(&mut self, v: &[u8]) -> &mut Self {
            self.bytes.extend_from_slice(v);
            self
        }
    }

    /// Builds a minimal one-method `.class` file by hand:
    ///
    /// ```java
    /// class Example {
    ///     @Export
    ///     static int answer() { return 42; }
    /// }
    /// ```
    fn build_example_class() -> Vec<u8> {
        let mut b = Builder::new();
        b.u32(MAGIC).u16(0).u16(61); // magic, minor, major

        // Constant pool: 1=Utf8 Example, 2=Class#1, 3=Utf8 java/lang/Object,
        // 4=Class#3, 5=Utf8 answer, 6=Utf8 ()I, 7=Utf8 Code,
        // 8=Utf8 RuntimeVisibleAnnotations, 9=Utf8 Ljvm2wasm/Export;
        b.u16(10); // constant_pool_count (highest index + 1)
        utf8(&mut b, "Example");
        b.u8(7).u16(1); // Class #2 -> #1
        utf8(&mut b, "java/lang/Object");
        b.u8(7).u16(3); // Class #4 -> #3
        utf8(&mut b, "answer");
        utf8(&mut b, "()I");
        utf8(&mut b, "Code");
        utf8(&mut b, "RuntimeVisibleAnnotations");
        utf8(&mut b, "Ljvm2wasm/Export;");

        b.u16(0x0021); // access_flags
        b.u16(2); // this_class
        b.u16(4); // super_class
        b.u16(0); // interfaces_count
        b.u16(0); // fields_count

        b.u16(1); // methods_count
        b.u16(0x0009); // access_flags: public static
        b.u16(5); // name_index: answer
        b.u16(6); // descriptor_index: ()I
        b.u16(2); // attributes_count

        // Code attribute: bipush 42; ireturn
        let code_body = {
            let mut c = Builder::new();
            c.u16(1).u16(0); // max_stack, max_locals
            c.u32(3).bytes(&[0x10, 42, 0xac]); // code_length, code
            c.u16(0); // exception_table_length
            c.u16(0); // attributes_count
            c.bytes
        };
        b.u16(7).u32(code_body.len() as u32).bytes(&code_body);

        // RuntimeVisibleAnnotations: one bare @Export
        let annotations_body = {
            let mut a = Builder::new();
            a.u16(1); // num_annotations
            a.u16(9); // type_index -> Ljvm2wasm/Export;
            a.u16(0); // num_element_value_pairs
            a.bytes
        };
        b.u16(8).u32(annotations_body.len() as u32).bytes(&annotations_body);

        b.u16(0); // class attributes_count
        b.bytes
    }

    fn utf8(b: &mut Builder, s: &str) {
        b.u8(1).u16(s.len() as u16).bytes(s.as_bytes());
    }

    #[test]
    fn parses_name_export_and_code_body() {
        let class = ClassFile::parse(&build_example_class()).unwrap();
        assert_eq!(class.name(), "Example");
        assert_eq!(class.methods().len(), 1);

        let method = &class.methods()[0];
        assert_eq!(method.name(), "answer");
        assert_eq!(method.export_name(), Some("answer"));
        assert!(method.params().is_empty());
        assert_eq!(method.result(), Some(jvm2wasm_core::ValueType::I32));

        let code = method.code().unwrap();
        assert_eq!(code.max_locals(), 0);
        assert_eq!(code.bytes(), &[0x10, 42, 0xac]);
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(ClassFile::parse(&[0, 0, 0, 0]).is_err());
    }
}
