use crate::error::{NnError, Result};

/// Little-endian cursor over a byte slice. Every read past the end fails
/// with [`NnError::CorruptData`].
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> ByteReader<'a> {
        ByteReader { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(NnError::CorruptData(format!(
                "unexpected end of data: need {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let bytes = self.bytes;
        let slice = &bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_le_bytes(self.array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Reads a strictly positive `i32` size.
    pub fn read_size(&mut self, what: &str) -> Result<usize> {
        let value = self.read_i32()?;
        if value <= 0 {
            return Err(NnError::CorruptData(format!("{what} must be positive, got {value}")));
        }
        Ok(value as usize)
    }

    pub fn expect_magic(&mut self, magic: &[u8], what: &str) -> Result<()> {
        let found = self.take(magic.len())?;
        if found != magic {
            return Err(NnError::CorruptData(format!(
                "bad {what} magic {:?}, expected {:?}",
                String::from_utf8_lossy(found),
                String::from_utf8_lossy(magic)
            )));
        }
        Ok(())
    }
}
