//! Story file header parsing and validation.

use crate::error::{LoadError, LoadResult};

/// Size of the story header in bytes.
pub const HEADER_SIZE: usize = 0x40;

/// The only Z-machine version this interpreter executes.
pub const SUPPORTED_VERSION: u8 = 3;

/// Parsed fields of a story header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Z-machine version (byte 0).
    pub version: u8,
    /// Release number.
    pub release: u16,
    /// Six-character serial code, usually a compile date.
    pub serial: String,
    /// Base of high memory.
    pub high_base: usize,
    /// Address of the first instruction.
    pub initial_pc: usize,
    /// Address of the dictionary.
    pub dictionary: usize,
    /// Address of the object table.
    pub object_table: usize,
    /// Address of the global variable table.
    pub globals: usize,
    /// Base of static memory; everything below is writable.
    pub static_base: usize,
    /// Address of the abbreviations table.
    pub abbreviations: usize,
    /// Story length in bytes as declared by the header.
    pub file_length: usize,
    /// Checksum over bytes `0x40..file_length`.
    pub checksum: u16,
}

impl Header {
    /// Parse and validate the header of a story image.
    pub fn parse(bytes: &[u8]) -> LoadResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(LoadError::TooSmall(bytes.len()));
        }

        let version = bytes[0];
        if version != SUPPORTED_VERSION {
            return Err(LoadError::UnsupportedVersion(version));
        }

        let word = |addr: usize| u16::from_be_bytes([bytes[addr], bytes[addr + 1]]);
        let serial = bytes[0x12..0x18]
            .iter()
            .map(|&b| if b.is_ascii_graphic() { b as char } else { '?' })
            .collect();

        // Very early stories leave the length field blank.
        let declared_length = usize::from(word(0x1A)) * 2;
        let file_length = if declared_length == 0 {
            bytes.len()
        } else {
            declared_length
        };

        let header = Self {
            version,
            release: word(0x02),
            serial,
            high_base: usize::from(word(0x04)),
            initial_pc: usize::from(word(0x06)),
            dictionary: usize::from(word(0x08)),
            object_table: usize::from(word(0x0A)),
            globals: usize::from(word(0x0C)),
            static_base: usize::from(word(0x0E)),
            abbreviations: usize::from(word(0x18)),
            file_length,
            checksum: word(0x1C),
        };
        header.validate(bytes.len())?;
        Ok(header)
    }

    fn validate(&self, len: usize) -> LoadResult<()> {
        if self.file_length > len {
            return Err(LoadError::CorruptHeader(format!(
                "declared length {} exceeds file size {len}",
                self.file_length
            )));
        }
        if self.static_base < HEADER_SIZE || self.static_base > len {
            return Err(LoadError::CorruptHeader(format!(
                "static memory base {:#06x} out of range",
                self.static_base
            )));
        }
        let tables = [
            ("initial pc", self.initial_pc),
            ("dictionary", self.dictionary),
            ("object table", self.object_table),
            ("globals", self.globals),
            ("abbreviations", self.abbreviations),
        ];
        for (name, addr) in tables {
            if addr < HEADER_SIZE || addr >= len {
                return Err(LoadError::CorruptHeader(format!(
                    "{name} address {addr:#06x} out of range"
                )));
            }
        }
        Ok(())
    }
}

/// Adjust the interpreter-owned header bits of a freshly loaded image.
pub(crate) fn configure(bytes: &mut [u8]) {
    // Flags 1: no status line, no split screen, fixed-pitch font.
    bytes[0x01] = (bytes[0x01] | 0x10) & !0x60;
    // Standard revision 1.0.
    bytes[0x32] = 1;
    bytes[0x33] = 0;
}
