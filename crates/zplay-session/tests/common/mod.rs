//! Tiny story files for adapter tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use zplay_zmachine::encode_text;

const DICTIONARY: usize = 0x40;
const ABBREVIATIONS: usize = 0x44;
const OBJECTS: usize = 0x50;
const GLOBALS: usize = 0x100;
const TEXT_BUFFER: u16 = 0x2E0;
const PARSE_BUFFER: u16 = 0x310;
const CODE: usize = 0x340;

fn print(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xB2];
    bytes.extend(encode_text(text));
    bytes
}

fn sread() -> Vec<u8> {
    let mut bytes = vec![0xE4, 0x0F];
    bytes.extend(TEXT_BUFFER.to_be_bytes());
    bytes.extend(PARSE_BUFFER.to_be_bytes());
    bytes
}

/// `jump` from `at` back to `target`.
fn jump(at: usize, target: usize) -> Vec<u8> {
    let offset = target as i64 - (at as i64 + 3) + 2;
    let mut bytes = vec![0x8C];
    bytes.extend((offset as i16).to_be_bytes());
    bytes
}

fn image(code: &[u8]) -> Vec<u8> {
    let mut image = vec![0u8; CODE + code.len()];
    if image.len() % 2 == 1 {
        image.push(0);
    }
    image[0x00] = 3;
    let words: [(usize, usize); 8] = [
        (0x04, CODE),
        (0x06, CODE),
        (0x08, DICTIONARY),
        (0x0A, OBJECTS),
        (0x0C, GLOBALS),
        (0x0E, CODE),
        (0x18, ABBREVIATIONS),
        (0x1A, image.len() / 2),
    ];
    for (at, value) in words {
        image[at..at + 2].copy_from_slice(&(value as u16).to_be_bytes());
    }
    image[DICTIONARY..DICTIONARY + 4].copy_from_slice(&[0, 7, 0, 0]);
    image[usize::from(TEXT_BUFFER)] = 40;
    image[usize::from(PARSE_BUFFER)] = 4;
    image[CODE..CODE + code.len()].copy_from_slice(code);
    image
}

/// Prints a welcome, then answers every line with "Noted." forever.
pub fn echo_story() -> Vec<u8> {
    let welcome = print("Welcome to the test story.\n>");
    let loop_start = CODE + welcome.len();
    let body = [sread(), print("Noted.\n>")].concat();
    let back = jump(loop_start + body.len(), loop_start);
    image(&[welcome, body, back].concat())
}

/// Prints a welcome, reads once, then quits.
pub fn quitting_story() -> Vec<u8> {
    image(&[print("Short story.\n>"), sread(), print("The end.\n"), vec![0xBA]].concat())
}

/// Reads once, prints a little, then divides by zero.
pub fn faulting_story() -> Vec<u8> {
    image(&[print("Ready.\n>"), sread(), print("Partial."), vec![0x17, 0x01, 0x00, 0x00]].concat())
}

/// Write `bytes` to `name` inside `dir`.
pub fn write_story(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
