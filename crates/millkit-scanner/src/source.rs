//! Sequential byte sources
//!
//! The scanner only needs a forward cursor with an end-of-file signal.
//! [`ReaderSource`] wraps any reader (usually a program file) in a buffered
//! reader; [`SliceSource`] reads from memory.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{ScanError, ScanResult};

/// Read buffer for program files (16 KB)
const READ_BUFFER_SIZE: usize = 16 * 1024;

/// Forward-only byte cursor
pub trait ByteSource {
    /// Next byte, `Ok(None)` at end of file
    fn next_byte(&mut self) -> io::Result<Option<u8>>;

    /// Whether end of file has been reached
    fn is_at_end(&self) -> bool;
}

/// Byte source over a buffered reader
pub struct ReaderSource<R: Read> {
    reader: BufReader<R>,
    at_end: bool,
    bytes_read: u64,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, reader),
            at_end: false,
            bytes_read: 0,
        }
    }

    /// Number of bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl ReaderSource<File> {
    /// Open a program file
    pub fn open(path: impl AsRef<Path>) -> ScanResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ScanError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.at_end {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    self.at_end = true;
                    return Ok(None);
                }
                Ok(_) => {
                    self.bytes_read += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.at_end
    }
}

/// Byte source over an in-memory buffer
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Read from a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}
