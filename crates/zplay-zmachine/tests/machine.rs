//! Integration tests.

mod common;

use common::*;
use zplay_zmachine::{Fault, LoadError, Machine, Progress, Suspended};

fn start(image: Vec<u8>) -> (Result<Progress, Fault>, String) {
    let machine = Machine::load(image).unwrap().with_seed(7);
    let mut screen = String::new();
    let progress = machine.start(&mut screen);
    (progress, screen)
}

fn awaiting(progress: Result<Progress, Fault>) -> Suspended {
    match progress.unwrap() {
        Progress::AwaitingInput(suspended) => suspended,
        Progress::Halted => panic!("expected the story to wait for input"),
    }
}

/// Code that branches on `condition` (its last byte is the branch byte slot)
/// to a "bad" message, otherwise prints `good`.
fn branch_to(condition: &[u8], good: &str, bad: &str) -> Vec<u8> {
    let good_block = assemble(&[&print(good), &[QUIT]]);
    let offset = good_block.len() + 2;
    assert!(offset < 64);
    let mut code = condition.to_vec();
    // Branch when false, short form.
    code.push(0x40 | offset as u8);
    code.extend(good_block);
    code.extend(print(bad));
    code.push(QUIT);
    code
}

#[test]
fn prints_then_waits_for_input() {
    let code = assemble(&[&print("Hello.\n"), &sread(), &print("Bye.\n"), &[QUIT]]);
    let (progress, screen) = start(story(&code, &[]));
    assert_eq!(screen, "Hello.\n");

    let suspended = awaiting(progress);
    assert_eq!(suspended.request().text_buffer, usize::from(TEXT_BUFFER));

    let mut screen = String::new();
    let progress = suspended.resume("look", &mut screen).unwrap();
    assert!(matches!(progress, Progress::Halted));
    assert_eq!(screen, "Bye.\n");
}

#[test]
fn input_is_lowercased_and_tokenized() {
    // loadw PARSE_BUFFER 1 -> sp ; je sp DICT_OPEN ?~bad
    let mut load = vec![0xCF, 0x1F];
    load.extend(PARSE_BUFFER.to_be_bytes());
    load.extend([0x01, 0x00]);
    let mut compare = vec![0xC1, 0x8F, 0x00];
    compare.extend(DICT_OPEN.to_be_bytes());
    let code = assemble(&[
        &sread(),
        &load,
        &branch_to(&compare, "Opened.\n", "Nothing.\n"),
    ]);
    let image = story(&code, &[]);

    let (progress, _) = start(image.clone());
    let mut screen = String::new();
    awaiting(progress).resume("OPEN Mailbox", &mut screen).unwrap();
    assert_eq!(screen, "Opened.\n");

    let (progress, _) = start(image);
    let mut screen = String::new();
    awaiting(progress).resume("xyzzy", &mut screen).unwrap();
    assert_eq!(screen, "Nothing.\n");
}

#[test]
fn resume_writes_text_buffer() {
    let code = assemble(&[&sread(), &sread()]);
    let (progress, _) = start(story(&code, &[]));
    let mut screen = String::new();
    let next = awaiting(awaiting(progress).resume("Take Lamp", &mut screen));

    let memory = next.machine().memory();
    let text = usize::from(TEXT_BUFFER);
    assert_eq!(&memory[text + 1..text + 10], b"take lamp");
    assert_eq!(memory[text + 10], 0);

    let parse = usize::from(PARSE_BUFFER);
    assert_eq!(memory[parse + 1], 2);
    assert_eq!(
        u16::from_be_bytes([memory[parse + 2], memory[parse + 3]]),
        DICT_TAKE
    );
    assert_eq!(memory[parse + 5], 1);
    assert_eq!(memory[parse + 9], 6);
}

#[test]
fn long_input_is_truncated_to_buffer() {
    let code = assemble(&[&sread(), &sread()]);
    let (progress, _) = start(story(&code, &[]));
    let mut screen = String::new();
    let next = awaiting(awaiting(progress).resume(&"a".repeat(40), &mut screen));

    let memory = next.machine().memory();
    let text = usize::from(TEXT_BUFFER);
    assert!(memory[text + 1..text + 20].iter().all(|&b| b == b'a'));
    assert_eq!(memory[text + 20], 0);
}

#[test]
fn only_the_first_line_is_read() {
    let code = assemble(&[&sread(), &sread()]);
    let (progress, _) = start(story(&code, &[]));
    let mut screen = String::new();
    let next = awaiting(awaiting(progress).resume("north\r\nsouth", &mut screen));

    let memory = next.machine().memory();
    let text = usize::from(TEXT_BUFFER);
    assert_eq!(&memory[text + 1..text + 6], b"north");
    assert_eq!(memory[text + 6], 0);
    assert_eq!(memory[usize::from(PARSE_BUFFER) + 1], 1);
}

#[test]
fn division_by_zero_faults_with_partial_output() {
    let code = assemble(&[&print("Partial."), &[0x17, 0x01, 0x00, 0x00]]);
    let divide_at = CODE + print("Partial.").len();
    let (progress, screen) = start(story(&code, &[]));
    assert_eq!(progress.unwrap_err(), Fault::DivisionByZero(divide_at));
    assert_eq!(screen, "Partial.");
}

#[test]
fn call_and_return_values() {
    let mut call = vec![0xE0, 0x1F];
    call.extend(ROUTINE_PACKED.to_be_bytes());
    call.extend([41, 0x00]);
    let code = assemble(&[&call, &PRINT_NUM_SP, &[NEW_LINE, QUIT]]);
    // One local; add local1 #1 -> sp ; ret_popped
    let routine = [0x01, 0x00, 0x00, 0x54, 0x01, 0x01, 0x00, 0xB8];

    let (progress, screen) = start(story(&code, &routine));
    assert!(matches!(progress.unwrap(), Progress::Halted));
    assert_eq!(screen, "42\n");
}

#[test]
fn object_names_and_properties() {
    let code = assemble(&[
        &[0x9A, 0x01, NEW_LINE],
        &[0x11, 0x01, 0x05, 0x00],
        &PRINT_NUM_SP,
        &[NEW_LINE, QUIT],
    ]);
    let (_, screen) = start(story(&code, &[]));
    assert_eq!(screen, "mailbox\n4660\n");
}

#[test]
fn object_tree_moves() {
    let code = assemble(&[
        // insert_obj 2 1
        &[0x0E, 0x02, 0x01],
        // get_parent 2 -> sp ; print_num sp
        &[0x93, 0x02, 0x00],
        &PRINT_NUM_SP,
        // get_child 1 -> sp ?(next) ; print_obj sp
        &[0x92, 0x01, 0x00, 0xC2],
        &[0xAA, 0x00, QUIT],
    ]);
    let (_, screen) = start(story(&code, &[]));
    assert_eq!(screen, "1leaflet");
}

#[test]
fn verify_checks_the_checksum() {
    let code = branch_to(&[0xBD], "ok", "bad");
    let image = story(&code, &[]);
    let (_, screen) = start(image.clone());
    assert_eq!(screen, "ok");

    let mut tampered = image;
    tampered[0x1D] ^= 0xFF;
    let (_, screen) = start(tampered);
    assert_eq!(screen, "bad");
}

#[test]
fn upper_window_text_is_suppressed() {
    let code = assemble(&[
        &[0xEB, 0x7F, 0x01],
        &print("Status"),
        &[0xEB, 0x7F, 0x00],
        &print("Room"),
        &[QUIT],
    ]);
    let (_, screen) = start(story(&code, &[]));
    assert_eq!(screen, "Room");
}

#[test]
fn memory_stream_captures_output() {
    let mut open = vec![0xF3, 0x4F, 0x03];
    open.extend(SCRATCH.to_be_bytes());
    let code = assemble(&[
        &open,
        &print("abc"),
        &[0xF3, 0x3F, 0xFF, 0xFD],
        &print("x"),
        &sread(),
    ]);
    let (progress, screen) = start(story(&code, &[]));
    assert_eq!(screen, "x");

    let suspended = awaiting(progress);
    let scratch = usize::from(SCRATCH);
    assert_eq!(&suspended.machine().memory()[scratch..scratch + 5], b"\0\x03abc");
}

#[test]
fn endless_loop_exhausts_budget() {
    // jump -1 (to itself)
    let code = [0x8C, 0xFF, 0xFF];
    let machine = Machine::load(story(&code, &[])).unwrap().with_step_budget(100);
    let err = machine.start(&mut String::new()).unwrap_err();
    assert_eq!(err, Fault::BudgetExhausted(100));
}

#[test]
fn returning_from_main_is_a_fault() {
    let (progress, _) = start(story(&[0xB0], &[]));
    assert_eq!(progress.unwrap_err(), Fault::ReturnFromMain);
}

#[test]
fn restart_runs_from_the_top() {
    // jz g00 ?~done ; store g00 1 ; print "A" ; restart ; done: print "B" ; quit
    let body = assemble(&[&[0x0D, 0x10, 0x01], &print("A"), &[0xB7]]);
    let mut code = vec![0xA0, 0x10, 0x40 | (body.len() + 2) as u8];
    code.extend(body);
    code.extend(print("B"));
    code.push(QUIT);

    let machine = Machine::load(story(&code, &[])).unwrap().with_step_budget(50);
    let mut screen = String::new();
    // Restart restores g00 to zero, so "B" is never reached.
    let err = machine.start(&mut screen).unwrap_err();
    assert_eq!(err, Fault::BudgetExhausted(50));
    assert!(screen.starts_with("AAA"));
    assert!(!screen.contains('B'));
}

#[test]
fn rejects_other_versions() {
    let mut image = story(&[QUIT], &[]);
    image[0] = 5;
    assert!(matches!(
        Machine::load(image),
        Err(LoadError::UnsupportedVersion(5))
    ));
}

#[test]
fn rejects_truncated_images() {
    assert!(matches!(
        Machine::load(vec![3; 10]),
        Err(LoadError::TooSmall(10))
    ));
}

#[test]
fn print_literal_round_trips_punctuation() {
    let text = "West of House\nYou are standing in an open field.";
    let code = assemble(&[&print(text), &[QUIT]]);
    let (_, screen) = start(story(&code, &[]));
    assert_eq!(screen, text);
}
