use std::io::Cursor;

use byteorder::{ReadBytesExt, BE};

use crate::errors::ClassError;

/// Big-endian primitive decoder over a class file byte stream.
///
/// Every read past the end of the stream is reported as
/// [`ClassError::UnexpectedEof`] with the offset at which the stream ran dry.
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader {
            cursor: Cursor::new(bytes),
        }
    }

    fn eof(&self) -> ClassError {
        ClassError::UnexpectedEof(self.cursor.position())
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor.position() as usize >= self.cursor.get_ref().len()
    }

    pub fn read_u1(&mut self) -> Result<u8, ClassError> {
        self.cursor.read_u8().map_err(|_| self.eof())
    }

    pub fn read_u2(&mut self) -> Result<u16, ClassError> {
        self.cursor.read_u16::<BE>().map_err(|_| self.eof())
    }

    pub fn read_u4(&mut self) -> Result<u32, ClassError> {
        self.cursor.read_u32::<BE>().map_err(|_| self.eof())
    }

    pub fn read_u8(&mut self) -> Result<u64, ClassError> {
        self.cursor.read_u64::<BE>().map_err(|_| self.eof())
    }

    /// Reads exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, ClassError> {
        let start = self.cursor.position() as usize;
        let data = self.cursor.get_ref();
        let end = start.checked_add(count).ok_or_else(|| self.eof())?;
        if end > data.len() {
            return Err(self.eof());
        }
        let bytes = data[start..end].to_vec();
        self.cursor.set_position(end as u64);
        Ok(bytes)
    }

    /// Discards exactly `count` bytes, failing if the stream is shorter.
    pub fn skip(&mut self, count: usize) -> Result<(), ClassError> {
        let start = self.cursor.position() as usize;
        let end = start.checked_add(count).ok_or_else(|| self.eof())?;
        if end > self.cursor.get_ref().len() {
            return Err(self.eof());
        }
        self.cursor.set_position(end as u64);
        Ok(())
    }
}
