//! Dictionary lookup and input tokenization.

use crate::error::FaultResult;
use crate::memory::Memory;
use crate::text::encode_dictionary_word;

/// The story dictionary header, parsed once at load.
#[derive(Debug, Clone)]
pub struct Dictionary {
    separators: Vec<u8>,
    entry_len: usize,
    count: usize,
    entries: usize,
}

/// One word found in the player's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position of the first letter within the text buffer.
    pub position: usize,
    /// The word as typed.
    pub word: String,
}

impl Dictionary {
    /// Parse the dictionary header at `addr`.
    pub fn parse(memory: &Memory, addr: usize) -> FaultResult<Self> {
        let separator_count = usize::from(memory.read_byte(addr)?);
        let separators = (0..separator_count)
            .map(|i| memory.read_byte(addr + 1 + i))
            .collect::<FaultResult<Vec<_>>>()?;
        let header = addr + 1 + separator_count;
        let entry_len = usize::from(memory.read_byte(header)?);
        // A negative count marks an unsorted dictionary; the scan below
        // does not care about ordering.
        let count = usize::from((memory.read_word(header + 1)? as i16).unsigned_abs());
        Ok(Self {
            separators,
            entry_len,
            count,
            entries: header + 3,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Address of the entry for `word`, or 0 when the word is unknown.
    pub fn lookup(&self, memory: &Memory, word: &str) -> FaultResult<u16> {
        let encoded = encode_dictionary_word(word);
        for n in 0..self.count {
            let addr = self.entries + n * self.entry_len;
            let matches = encoded
                .iter()
                .enumerate()
                .map(|(i, &b)| memory.read_byte(addr + i).map(|m| m == b))
                .collect::<FaultResult<Vec<_>>>()?
                .into_iter()
                .all(|m| m);
            if matches {
                return Ok(addr as u16);
            }
        }
        Ok(0)
    }

    /// Split input into words. Spaces separate words; separator characters
    /// are words of their own. Positions count from the start of the text
    /// buffer, so the first letter sits at position 1.
    pub fn split(&self, input: &[u8]) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;
        for (i, &byte) in input.iter().enumerate() {
            let is_separator = self.separators.contains(&byte);
            if byte == b' ' || is_separator {
                if let Some(s) = start.take() {
                    tokens.push(token(input, s, i));
                }
                if is_separator {
                    tokens.push(token(input, i, i + 1));
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            tokens.push(token(input, s, input.len()));
        }
        tokens
    }

    /// Tokenize the zero-terminated text at `text_buffer + 1` into the parse
    /// buffer at `parse_buffer`.
    pub fn tokenize(&self, memory: &mut Memory, text_buffer: usize, parse_buffer: usize) -> FaultResult<()> {
        let mut input = Vec::new();
        let mut cursor = text_buffer + 1;
        loop {
            let byte = memory.read_byte(cursor)?;
            if byte == 0 {
                break;
            }
            input.push(byte);
            cursor += 1;
        }

        let max_words = usize::from(memory.read_byte(parse_buffer)?);
        let tokens = self.split(&input);
        let found = tokens.len().min(max_words);
        memory.write_byte(parse_buffer + 1, found as u8)?;
        for (n, token) in tokens.iter().take(found).enumerate() {
            let block = parse_buffer + 2 + 4 * n;
            let entry = self.lookup(memory, &token.word)?;
            memory.write_word(block, entry)?;
            memory.write_byte(block + 2, token.word.len() as u8)?;
            memory.write_byte(block + 3, token.position as u8)?;
        }
        Ok(())
    }
}

fn token(input: &[u8], start: usize, end: usize) -> Token {
    Token {
        position: start + 1,
        word: String::from_utf8_lossy(&input[start..end]).into_owned(),
    }
}
