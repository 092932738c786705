//! A position-tracking byte reader over a `.class` file's bytes.
//!
//! Mirrors the cursor-over-a-slice shape the rest of this workspace reads
//! binary formats with (see the compiler's writers), just running in
//! reverse: pulling big-endian fields out instead of pushing them.

use alloc::vec::Vec;

use jvm2wasm_core::CompileError;

pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CompileError> {
        let end = self.pos.checked_add(n).ok_or_else(|| eof())?;
        let slice = self.data.get(self.pos..end).ok_or_else(|| eof())?;
        self.pos = end;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), CompileError> {
        self.take(n).map(|_| ())
    }

    pub fn slice(&mut self, n: usize) -> Result<&'a [u8], CompileError> {
        self.take(n)
    }

    pub fn to_vec(&mut self, n: usize) -> Result<Vec<u8>, CompileError> {
        self.take(n).map(<[u8]>::to_vec)
    }

    pub fn read_u8(&mut self) -> Result<u8, CompileError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CompileError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, CompileError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, CompileError> {
        Ok(self.read_u32()? as i32)
    }

    pub fn read_u64(&mut self) -> Result<u64, CompileError> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn read_i64(&mut self) -> Result<i64, CompileError> {
        Ok(self.read_u64()? as i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, CompileError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, CompileError> {
        Ok(f64::from_bits(self.read_u64()?))
    }
}

fn eof() -> CompileError {
    CompileError::unsupported_class_file("unexpected end of class file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_fields_in_sequence() {
        let mut cursor = Cursor::new(&[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x01]);
        assert_eq!(cursor.read_u32().unwrap(), 0xCAFEBABE);
        assert_eq!(cursor.read_u16().unwrap(), 1);
    }

    #[test]
    fn reading_past_the_end_is_an_error() {
        let mut cursor = Cursor::new(&[0x00]);
        assert!(cursor.read_u16().is_err());
    }
}
