//! Assembles tiny version 3 story images for integration tests.

#![allow(dead_code)]

use zplay_zmachine::encode_text;
use zplay_zmachine::text::encode_dictionary_word;

pub const ABBREVIATIONS: usize = 0x40;
pub const OBJECTS: usize = 0x100;
pub const GLOBALS: usize = 0x180;
pub const SCRATCH: u16 = 0x300;
pub const TEXT_BUFFER: u16 = 0x360;
pub const PARSE_BUFFER: u16 = 0x380;
pub const DICTIONARY: usize = 0x3A0;
pub const DICT_OPEN: u16 = 0x3A5;
pub const DICT_TAKE: u16 = 0x3AC;
pub const CODE: usize = 0x400;
pub const ROUTINE: usize = 0x500;
pub const ROUTINE_PACKED: u16 = 0x280;

/// Object 1 "mailbox" carries property 5 = 0x1234; object 2 "leaflet" has none.
fn write_objects(image: &mut [u8]) {
    let entries = OBJECTS + 62;
    let tables = [(0x150usize, "mailbox", true), (0x160, "leaflet", false)];
    for (n, (table, name, with_property)) in tables.into_iter().enumerate() {
        let entry = entries + n * 9;
        image[entry + 7..entry + 9].copy_from_slice(&(table as u16).to_be_bytes());

        let encoded = encode_text(name);
        image[table] = (encoded.len() / 2) as u8;
        image[table + 1..table + 1 + encoded.len()].copy_from_slice(&encoded);
        let mut cursor = table + 1 + encoded.len();
        if with_property {
            image[cursor] = 32 + 5;
            image[cursor + 1..cursor + 3].copy_from_slice(&0x1234u16.to_be_bytes());
            cursor += 3;
        }
        image[cursor] = 0;
    }
}

fn write_dictionary(image: &mut [u8]) {
    let mut dict = vec![1, b',', 7, 0, 2];
    for word in ["open", "take"] {
        dict.extend(encode_dictionary_word(word));
        dict.extend([0, 0, 0]);
    }
    image[DICTIONARY..DICTIONARY + dict.len()].copy_from_slice(&dict);
}

/// Build a complete story with `code` at the initial pc and `routine` at
/// [`ROUTINE`]. The checksum is correct.
pub fn story(code: &[u8], routine: &[u8]) -> Vec<u8> {
    assert!(CODE + code.len() <= ROUTINE, "test code too long");
    let mut image = vec![0u8; ROUTINE + routine.len()];
    if image.len() % 2 == 1 {
        image.push(0);
    }

    image[0x00] = 3;
    image[0x02..0x04].copy_from_slice(&1u16.to_be_bytes());
    image[0x04..0x06].copy_from_slice(&(CODE as u16).to_be_bytes());
    image[0x06..0x08].copy_from_slice(&(CODE as u16).to_be_bytes());
    image[0x08..0x0A].copy_from_slice(&(DICTIONARY as u16).to_be_bytes());
    image[0x0A..0x0C].copy_from_slice(&(OBJECTS as u16).to_be_bytes());
    image[0x0C..0x0E].copy_from_slice(&(GLOBALS as u16).to_be_bytes());
    image[0x0E..0x10].copy_from_slice(&(DICTIONARY as u16).to_be_bytes());
    image[0x12..0x18].copy_from_slice(b"261016");
    image[0x18..0x1A].copy_from_slice(&(ABBREVIATIONS as u16).to_be_bytes());
    let words = (image.len() / 2) as u16;
    image[0x1A..0x1C].copy_from_slice(&words.to_be_bytes());

    write_objects(&mut image);
    image[TEXT_BUFFER as usize] = 20;
    image[PARSE_BUFFER as usize] = 4;
    write_dictionary(&mut image);
    image[CODE..CODE + code.len()].copy_from_slice(code);
    image[ROUTINE..ROUTINE + routine.len()].copy_from_slice(routine);

    let checksum = image[0x40..]
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
    image[0x1C..0x1E].copy_from_slice(&checksum.to_be_bytes());
    image
}

/// `print "<text>"`
pub fn print(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xB2];
    bytes.extend(encode_text(text));
    bytes
}

/// `sread TEXT_BUFFER PARSE_BUFFER`
pub fn sread() -> Vec<u8> {
    let mut bytes = vec![0xE4, 0x0F];
    bytes.extend(TEXT_BUFFER.to_be_bytes());
    bytes.extend(PARSE_BUFFER.to_be_bytes());
    bytes
}

/// `quit`
pub const QUIT: u8 = 0xBA;

/// `new_line`
pub const NEW_LINE: u8 = 0xBB;

/// `print_num sp`
pub const PRINT_NUM_SP: [u8; 3] = [0xE6, 0xBF, 0x00];

/// Concatenate instruction fragments.
pub fn assemble(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}
