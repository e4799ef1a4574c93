//! Bounds-checked story memory.

use crate::error::{Fault, FaultResult};

/// The story's memory map: dynamic memory is writable, everything from the
/// static base upwards is read-only.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
    static_base: usize,
}

impl Memory {
    /// Wrap a story image.
    pub fn new(bytes: Vec<u8>, static_base: usize) -> Self {
        Self { bytes, static_base }
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the image is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw view of the whole image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Read one byte.
    pub fn read_byte(&self, addr: usize) -> FaultResult<u8> {
        self.bytes.get(addr).copied().ok_or(Fault::OutOfBounds(addr))
    }

    /// Read a big-endian word.
    pub fn read_word(&self, addr: usize) -> FaultResult<u16> {
        let hi = self.read_byte(addr)?;
        let lo = self.read_byte(addr + 1)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    /// Write one byte into dynamic memory.
    pub fn write_byte(&mut self, addr: usize, value: u8) -> FaultResult<()> {
        if addr >= self.static_base {
            return Err(Fault::ReadOnly(addr));
        }
        let slot = self.bytes.get_mut(addr).ok_or(Fault::OutOfBounds(addr))?;
        *slot = value;
        Ok(())
    }

    /// Write a big-endian word into dynamic memory.
    pub fn write_word(&mut self, addr: usize, value: u16) -> FaultResult<()> {
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(addr, hi)?;
        self.write_byte(addr + 1, lo)
    }
}
