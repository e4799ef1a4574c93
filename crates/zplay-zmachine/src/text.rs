//! ZSCII text encoding and decoding for version 3 stories.

use crate::error::FaultResult;
use crate::memory::Memory;

const A0: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
const A1: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
// Slot 0 of A2 is the ten-bit escape and never printed.
const A2: &[u8; 26] = b" \n0123456789.,!?_#'\"/\\-:()";

/// Default translation of ZSCII codes 155..=223.
const EXTRA_CHARACTERS: [char; 69] = [
    'ä', 'ö', 'ü', 'Ä', 'Ö', 'Ü', 'ß', '»', '«', 'ë', 'ï', 'ÿ', 'Ë', 'Ï', 'á', 'é', 'í', 'ó', 'ú',
    'ý', 'Á', 'É', 'Í', 'Ó', 'Ú', 'Ý', 'à', 'è', 'ì', 'ò', 'ù', 'À', 'È', 'Ì', 'Ò', 'Ù', 'â', 'ê',
    'î', 'ô', 'û', 'Â', 'Ê', 'Î', 'Ô', 'Û', 'å', 'Å', 'ø', 'Ø', 'ã', 'ñ', 'õ', 'Ã', 'Ñ', 'Õ', 'æ',
    'Æ', 'ç', 'Ç', 'þ', 'ð', 'Þ', 'Ð', '£', 'œ', 'Œ', '¡', '¿',
];

/// Number of Z-characters in a version 3 dictionary word.
pub const DICTIONARY_WORD_ZCHARS: usize = 6;

/// Map a ZSCII output code to a character. Code 0 prints nothing.
pub fn zscii_to_char(code: u16) -> Option<char> {
    match code {
        0 => None,
        13 => Some('\n'),
        32..=126 => char::from_u32(u32::from(code)),
        155..=223 => Some(EXTRA_CHARACTERS[usize::from(code - 155)]),
        _ => Some('?'),
    }
}

/// Map a character to its ZSCII code, or `?` when it has none.
pub fn char_to_zscii(ch: char) -> u16 {
    match ch {
        '\n' => 13,
        ' '..='~' => ch as u16,
        _ => EXTRA_CHARACTERS
            .iter()
            .position(|&c| c == ch)
            .map_or(u16::from(b'?'), |i| 155 + i as u16),
    }
}

/// Decode the Z-string at `addr`, expanding abbreviations.
///
/// Returns the text and the address just past the string.
pub fn decode(memory: &Memory, addr: usize, abbreviations: usize) -> FaultResult<(String, usize)> {
    let (zchars, end) = read_zchars(memory, addr)?;
    let mut text = String::new();
    expand(memory, &zchars, abbreviations, true, &mut text)?;
    Ok((text, end))
}

fn read_zchars(memory: &Memory, addr: usize) -> FaultResult<(Vec<u8>, usize)> {
    let mut zchars = Vec::new();
    let mut cursor = addr;
    loop {
        let word = memory.read_word(cursor)?;
        cursor += 2;
        zchars.push(((word >> 10) & 0x1F) as u8);
        zchars.push(((word >> 5) & 0x1F) as u8);
        zchars.push((word & 0x1F) as u8);
        if word & 0x8000 != 0 {
            return Ok((zchars, cursor));
        }
    }
}

fn expand(
    memory: &Memory,
    zchars: &[u8],
    abbreviations: usize,
    allow_abbreviations: bool,
    out: &mut String,
) -> FaultResult<()> {
    let mut alphabet = 0;
    let mut i = 0;
    while i < zchars.len() {
        let z = zchars[i];
        match z {
            0 => out.push(' '),
            1..=3 => {
                let Some(&next) = zchars.get(i + 1) else {
                    break;
                };
                // Abbreviations may not nest.
                if allow_abbreviations {
                    let index = 32 * usize::from(z - 1) + usize::from(next);
                    let entry = usize::from(memory.read_word(abbreviations + 2 * index)?) * 2;
                    let (inner, _) = read_zchars(memory, entry)?;
                    expand(memory, &inner, abbreviations, false, out)?;
                }
                i += 1;
            }
            4 | 5 => {
                alphabet = z - 3;
                i += 1;
                continue;
            }
            _ if alphabet == 2 && z == 6 => {
                let (Some(&hi), Some(&lo)) = (zchars.get(i + 1), zchars.get(i + 2)) else {
                    break;
                };
                let code = (u16::from(hi) << 5) | u16::from(lo);
                if let Some(ch) = zscii_to_char(code) {
                    out.push(ch);
                }
                i += 2;
            }
            _ => {
                let table = match alphabet {
                    0 => A0,
                    1 => A1,
                    _ => A2,
                };
                out.push(char::from(table[usize::from(z - 6)]));
            }
        }
        alphabet = 0;
        i += 1;
    }
    Ok(())
}

fn push_zchars(ch: char, allow_upper: bool, out: &mut Vec<u8>) {
    if ch == ' ' {
        out.push(0);
        return;
    }
    let byte = u8::try_from(ch).ok();
    if let Some(i) = byte.and_then(|b| A0.iter().position(|&c| c == b)) {
        out.push(i as u8 + 6);
    } else if let Some(i) = byte
        .filter(|_| allow_upper)
        .and_then(|b| A1.iter().position(|&c| c == b))
    {
        out.extend([4, i as u8 + 6]);
    } else if let Some(i) = byte.and_then(|b| A2.iter().skip(1).position(|&c| c == b)) {
        out.extend([5, i as u8 + 7]);
    } else {
        let code = char_to_zscii(ch);
        out.extend([5, 6, ((code >> 5) & 0x1F) as u8, (code & 0x1F) as u8]);
    }
}

fn pack(zchars: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(zchars.len() / 3 * 2);
    let chunks: Vec<&[u8]> = zchars.chunks(3).collect();
    for (n, chunk) in chunks.iter().enumerate() {
        let mut word = (u16::from(chunk[0]) << 10) | (u16::from(chunk[1]) << 5) | u16::from(chunk[2]);
        if n + 1 == chunks.len() {
            word |= 0x8000;
        }
        bytes.extend(word.to_be_bytes());
    }
    bytes
}

/// Encode text as a complete Z-string, suitable for `print` literals and
/// object names.
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut zchars = Vec::with_capacity(text.len());
    for ch in text.chars() {
        push_zchars(ch, true, &mut zchars);
    }
    if zchars.is_empty() {
        zchars.push(5);
    }
    while zchars.len() % 3 != 0 {
        zchars.push(5);
    }
    pack(&zchars)
}

/// Encode a lowercase word the way version 3 dictionaries store it:
/// exactly six Z-characters, truncated or padded, in four bytes.
pub fn encode_dictionary_word(word: &str) -> [u8; 4] {
    let mut zchars = Vec::with_capacity(DICTIONARY_WORD_ZCHARS + 3);
    for ch in word.chars() {
        if zchars.len() >= DICTIONARY_WORD_ZCHARS {
            break;
        }
        push_zchars(ch.to_ascii_lowercase(), false, &mut zchars);
    }
    zchars.resize(DICTIONARY_WORD_ZCHARS, 5);
    let packed = pack(&zchars);
    [packed[0], packed[1], packed[2], packed[3]]
}
