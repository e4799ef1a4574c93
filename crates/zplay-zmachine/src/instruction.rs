//! Instruction decoding for version 3.

use crate::error::{Fault, FaultResult};
use crate::memory::Memory;
use crate::text;

/// Operand count class of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandCount {
    /// No operands.
    Op0,
    /// One operand.
    Op1,
    /// Two operands (long form, or variable form with the 2OP bit).
    Op2,
    /// Zero to four operands.
    Var,
}

/// A raw operand before variable lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// 16-bit constant.
    Large(u16),
    /// 8-bit constant.
    Small(u8),
    /// Variable number to read.
    Variable(u8),
}

/// Branch information following an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    /// Branch when the condition is true (otherwise when false).
    pub on_true: bool,
    /// 0 and 1 mean return false/true; anything else is a relative jump.
    pub offset: i16,
}

/// A fully decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Address of the opcode byte.
    pub addr: usize,
    /// The opcode byte as read.
    pub opcode: u8,
    /// Operand count class.
    pub count: OperandCount,
    /// Opcode number within its class.
    pub number: u8,
    /// Operands in order.
    pub operands: Vec<Operand>,
    /// Variable receiving the result.
    pub store: Option<u8>,
    /// Branch data, when the opcode branches.
    pub branch: Option<Branch>,
    /// Inline text for `print` and `print_ret`.
    pub text: Option<String>,
    /// Address of the following instruction.
    pub next: usize,
}

fn stores(count: OperandCount, number: u8) -> bool {
    match count {
        OperandCount::Op2 => matches!(number, 8 | 9 | 15..=25),
        OperandCount::Op1 => matches!(number, 1..=4 | 8 | 14 | 15),
        OperandCount::Op0 => false,
        OperandCount::Var => matches!(number, 0 | 7),
    }
}

fn branches(count: OperandCount, number: u8) -> bool {
    match count {
        OperandCount::Op2 => matches!(number, 1..=7 | 10),
        OperandCount::Op1 => matches!(number, 0..=2),
        OperandCount::Op0 => matches!(number, 5 | 6 | 13 | 15),
        OperandCount::Var => false,
    }
}

fn has_text(count: OperandCount, number: u8) -> bool {
    count == OperandCount::Op0 && matches!(number, 2 | 3)
}

fn operand_from_type(kind: u8) -> Option<u8> {
    // 0b11 means omitted.
    (kind != 0b11).then_some(kind)
}

/// Decode the instruction at `addr`.
pub fn decode(memory: &Memory, addr: usize, abbreviations: usize) -> FaultResult<Instruction> {
    let opcode = memory.read_byte(addr)?;
    let mut cursor = addr + 1;
    let mut kinds: Vec<u8> = Vec::with_capacity(4);

    let (count, number) = match opcode {
        0x00..=0x7F => {
            kinds.push(if opcode & 0x40 == 0 { 0b01 } else { 0b10 });
            kinds.push(if opcode & 0x20 == 0 { 0b01 } else { 0b10 });
            (OperandCount::Op2, opcode & 0x1F)
        }
        0x80..=0xBF => {
            let kind = (opcode >> 4) & 0b11;
            if kind == 0b11 {
                (OperandCount::Op0, opcode & 0x0F)
            } else {
                kinds.push(kind);
                (OperandCount::Op1, opcode & 0x0F)
            }
        }
        0xC0..=0xFF => {
            let types = memory.read_byte(cursor)?;
            cursor += 1;
            for shift in [6, 4, 2, 0] {
                match operand_from_type((types >> shift) & 0b11) {
                    Some(kind) => kinds.push(kind),
                    None => break,
                }
            }
            let count = if opcode & 0x20 == 0 {
                OperandCount::Op2
            } else {
                OperandCount::Var
            };
            (count, opcode & 0x1F)
        }
    };

    if count == OperandCount::Op2 && number == 0 {
        return Err(Fault::IllegalOpcode { opcode, pc: addr });
    }

    let mut operands = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let operand = match kind {
            0b00 => {
                let value = memory.read_word(cursor)?;
                cursor += 2;
                Operand::Large(value)
            }
            0b01 => {
                let value = memory.read_byte(cursor)?;
                cursor += 1;
                Operand::Small(value)
            }
            _ => {
                let value = memory.read_byte(cursor)?;
                cursor += 1;
                Operand::Variable(value)
            }
        };
        operands.push(operand);
    }

    let store = if stores(count, number) {
        let var = memory.read_byte(cursor)?;
        cursor += 1;
        Some(var)
    } else {
        None
    };

    let branch = if branches(count, number) {
        let first = memory.read_byte(cursor)?;
        cursor += 1;
        let on_true = first & 0x80 != 0;
        let offset = if first & 0x40 != 0 {
            i16::from(first & 0x3F)
        } else {
            let second = memory.read_byte(cursor)?;
            cursor += 1;
            let raw = (u16::from(first & 0x3F) << 8) | u16::from(second);
            // Sign-extend the 14-bit offset.
            if raw & 0x2000 != 0 {
                (raw | 0xC000) as i16
            } else {
                raw as i16
            }
        };
        Some(Branch { on_true, offset })
    } else {
        None
    };

    let text = if has_text(count, number) {
        let (text, end) = text::decode(memory, cursor, abbreviations)?;
        cursor = end;
        Some(text)
    } else {
        None
    };

    Ok(Instruction {
        addr,
        opcode,
        count,
        number,
        operands,
        store,
        branch,
        text,
        next: cursor,
    })
}
