//! Object tree and property tables (version 3 layout).
//!
//! Object 0 means "nothing". Tree queries on it return 0 and tree mutations
//! ignore it, which is how most interpreters tolerate sloppy story code.

use crate::error::{Fault, FaultResult};
use crate::memory::Memory;
use crate::text;

const DEFAULTS_WORDS: usize = 31;
const ENTRY_SIZE: usize = 9;
const MAX_OBJECT: u16 = 255;
const PARENT: usize = 4;
const SIBLING: usize = 5;
const CHILD: usize = 6;
const PROPERTIES: usize = 7;

/// View over the object table at a fixed address.
#[derive(Debug, Clone, Copy)]
pub struct Objects {
    table: usize,
}

impl Objects {
    /// Create a view over the table at `table`.
    pub fn new(table: usize) -> Self {
        Self { table }
    }

    fn entry(&self, object: u16) -> FaultResult<usize> {
        if object == 0 || object > MAX_OBJECT {
            return Err(Fault::InvalidObject(object));
        }
        Ok(self.table + DEFAULTS_WORDS * 2 + usize::from(object - 1) * ENTRY_SIZE)
    }

    /// Whether `attribute` is set on `object`.
    pub fn attribute(&self, memory: &Memory, object: u16, attribute: u16) -> FaultResult<bool> {
        if object == 0 {
            return Ok(false);
        }
        let (addr, mask) = self.attribute_slot(object, attribute)?;
        Ok(memory.read_byte(addr)? & mask != 0)
    }

    /// Set or clear `attribute` on `object`.
    pub fn set_attribute(
        &self,
        memory: &mut Memory,
        object: u16,
        attribute: u16,
        on: bool,
    ) -> FaultResult<()> {
        if object == 0 {
            return Ok(());
        }
        let (addr, mask) = self.attribute_slot(object, attribute)?;
        let byte = memory.read_byte(addr)?;
        memory.write_byte(addr, if on { byte | mask } else { byte & !mask })
    }

    fn attribute_slot(&self, object: u16, attribute: u16) -> FaultResult<(usize, u8)> {
        if attribute > 31 {
            return Err(Fault::InvalidAttribute(attribute));
        }
        let addr = self.entry(object)? + usize::from(attribute / 8);
        Ok((addr, 0x80 >> (attribute % 8)))
    }

    fn link(&self, memory: &Memory, object: u16, field: usize) -> FaultResult<u16> {
        if object == 0 {
            return Ok(0);
        }
        Ok(u16::from(memory.read_byte(self.entry(object)? + field)?))
    }

    fn set_link(&self, memory: &mut Memory, object: u16, field: usize, value: u16) -> FaultResult<()> {
        if object == 0 {
            return Ok(());
        }
        // Version 3 object numbers always fit in a byte.
        memory.write_byte(self.entry(object)? + field, value as u8)
    }

    /// Parent of `object`.
    pub fn parent(&self, memory: &Memory, object: u16) -> FaultResult<u16> {
        self.link(memory, object, PARENT)
    }

    /// Next sibling of `object`.
    pub fn sibling(&self, memory: &Memory, object: u16) -> FaultResult<u16> {
        self.link(memory, object, SIBLING)
    }

    /// First child of `object`.
    pub fn child(&self, memory: &Memory, object: u16) -> FaultResult<u16> {
        self.link(memory, object, CHILD)
    }

    /// Detach `object` from its parent.
    pub fn remove(&self, memory: &mut Memory, object: u16) -> FaultResult<()> {
        let parent = self.parent(memory, object)?;
        if parent != 0 {
            let next = self.sibling(memory, object)?;
            if self.child(memory, parent)? == object {
                self.set_link(memory, parent, CHILD, next)?;
            } else {
                let mut cursor = self.child(memory, parent)?;
                let mut steps = 0;
                while cursor != 0 {
                    if steps == MAX_OBJECT {
                        return Err(Fault::ObjectCycle(parent));
                    }
                    steps += 1;
                    let after = self.sibling(memory, cursor)?;
                    if after == object {
                        self.set_link(memory, cursor, SIBLING, next)?;
                        break;
                    }
                    cursor = after;
                }
            }
        }
        self.set_link(memory, object, PARENT, 0)?;
        self.set_link(memory, object, SIBLING, 0)
    }

    /// Make `object` the first child of `destination`.
    pub fn insert(&self, memory: &mut Memory, object: u16, destination: u16) -> FaultResult<()> {
        if object == 0 {
            return Ok(());
        }
        self.remove(memory, object)?;
        let first = self.child(memory, destination)?;
        self.set_link(memory, object, PARENT, destination)?;
        self.set_link(memory, object, SIBLING, first)?;
        self.set_link(memory, destination, CHILD, object)
    }

    fn property_table(&self, memory: &Memory, object: u16) -> FaultResult<usize> {
        Ok(usize::from(memory.read_word(self.entry(object)? + PROPERTIES)?))
    }

    /// The object's short name.
    pub fn short_name(&self, memory: &Memory, object: u16, abbreviations: usize) -> FaultResult<String> {
        if object == 0 {
            return Ok(String::new());
        }
        let table = self.property_table(memory, object)?;
        if memory.read_byte(table)? == 0 {
            return Ok(String::new());
        }
        text::decode(memory, table + 1, abbreviations).map(|(name, _)| name)
    }

    fn first_property(&self, memory: &Memory, object: u16) -> FaultResult<usize> {
        let table = self.property_table(memory, object)?;
        Ok(table + 1 + 2 * usize::from(memory.read_byte(table)?))
    }

    /// Locate `property` on `object`: `(data address, data length)`.
    pub fn find_property(
        &self,
        memory: &Memory,
        object: u16,
        property: u16,
    ) -> FaultResult<Option<(usize, usize)>> {
        let mut cursor = self.first_property(memory, object)?;
        loop {
            let size_byte = memory.read_byte(cursor)?;
            if size_byte == 0 {
                return Ok(None);
            }
            let number = u16::from(size_byte & 0x1F);
            let len = usize::from(size_byte >> 5) + 1;
            if number == property {
                return Ok(Some((cursor + 1, len)));
            }
            // Properties are stored in descending order.
            if number < property {
                return Ok(None);
            }
            cursor += 1 + len;
        }
    }

    /// Value of `property`, falling back to the table default.
    pub fn property(&self, memory: &Memory, object: u16, property: u16) -> FaultResult<u16> {
        match self.find_property(memory, object, property)? {
            Some((addr, 1)) => memory.read_byte(addr).map(u16::from),
            Some((addr, _)) => memory.read_word(addr),
            None => {
                if property == 0 || usize::from(property) > DEFAULTS_WORDS {
                    return Ok(0);
                }
                memory.read_word(self.table + 2 * usize::from(property - 1))
            }
        }
    }

    /// Overwrite `property` on `object`.
    pub fn put_property(
        &self,
        memory: &mut Memory,
        object: u16,
        property: u16,
        value: u16,
    ) -> FaultResult<()> {
        match self.find_property(memory, object, property)? {
            Some((addr, 1)) => memory.write_byte(addr, value as u8),
            Some((addr, _)) => memory.write_word(addr, value),
            None => Err(Fault::MissingProperty { object, property }),
        }
    }

    /// Address of the data for `property`, or 0 when absent.
    pub fn property_addr(&self, memory: &Memory, object: u16, property: u16) -> FaultResult<u16> {
        if object == 0 {
            return Ok(0);
        }
        Ok(self
            .find_property(memory, object, property)?
            .map_or(0, |(addr, _)| addr as u16))
    }

    /// Length of the property whose data starts at `addr`.
    pub fn property_len(&self, memory: &Memory, addr: u16) -> FaultResult<u16> {
        if addr == 0 {
            return Ok(0);
        }
        let size_byte = memory.read_byte(usize::from(addr) - 1)?;
        Ok(u16::from(size_byte >> 5) + 1)
    }

    /// The property number following `property` (0 starts the walk).
    pub fn next_property(&self, memory: &Memory, object: u16, property: u16) -> FaultResult<u16> {
        let next_addr = if property == 0 {
            self.first_property(memory, object)?
        } else {
            let (addr, len) = self
                .find_property(memory, object, property)?
                .ok_or(Fault::MissingProperty { object, property })?;
            addr + len
        };
        Ok(u16::from(memory.read_byte(next_addr)? & 0x1F))
    }
}
