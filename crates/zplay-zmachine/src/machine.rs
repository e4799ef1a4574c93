//! Machine state and the execution loop.
//!
//! [`Machine::start`] runs the story until it first asks for input. Instead of
//! blocking, the machine moves itself into a [`Suspended`] continuation which
//! records the pending `sread` buffers. The host feeds the player's line back
//! with [`Suspended::resume`], which writes the text into story memory,
//! tokenizes it, and continues to the next read. Errors are reserved for
//! genuine faults; a fault consumes the machine.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dictionary::Dictionary;
use crate::error::{Fault, FaultResult, LoadError, LoadResult};
use crate::header::{self, HEADER_SIZE, Header};
use crate::instruction::{self, Instruction, Operand, OperandCount};
use crate::memory::Memory;
use crate::object::Objects;
use crate::screen::Screen;
use crate::text;

/// Default number of instructions one turn may execute before the machine
/// gives up with [`Fault::BudgetExhausted`].
pub const DEFAULT_STEP_BUDGET: u64 = 5_000_000;

const MAX_LOCALS: usize = 15;

#[derive(Debug, Clone)]
struct Frame {
    return_pc: usize,
    store: Option<u8>,
    locals: Vec<u16>,
    stack_base: usize,
}

impl Frame {
    /// The implicit frame the main routine runs in.
    fn main() -> Self {
        Self {
            return_pc: 0,
            store: None,
            locals: Vec::new(),
            stack_base: 0,
        }
    }
}

/// The buffers an `sread` instruction is waiting to have filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    /// Address of the text buffer (byte 0 holds its capacity).
    pub text_buffer: usize,
    /// Address of the parse buffer, or 0 when the story skips tokenizing.
    pub parse_buffer: usize,
}

/// Where execution stopped.
#[derive(Debug)]
pub enum Progress {
    /// The story is waiting for a line of input.
    AwaitingInput(Suspended),
    /// The story executed `quit`.
    Halted,
}

/// A story paused at `sread`. Owns the whole machine; resuming consumes it.
#[derive(Debug)]
#[must_use = "a suspended story does nothing until resumed"]
pub struct Suspended {
    machine: Machine,
    request: ReadRequest,
}

impl Suspended {
    /// The buffers the story is waiting on.
    pub fn request(&self) -> ReadRequest {
        self.request
    }

    /// The suspended machine.
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Deliver one line of input and run until the next read or `quit`.
    pub fn resume(self, line: &str, screen: &mut dyn Screen) -> FaultResult<Progress> {
        let Self {
            mut machine,
            request,
        } = self;
        machine.accept_input(request, line)?;
        machine.proceed(screen)
    }
}

enum Flow {
    Continue,
    Read(ReadRequest),
    Quit,
}

enum Stop {
    Read(ReadRequest),
    Quit,
}

/// A loaded version 3 story ready to run.
pub struct Machine {
    header: Header,
    story: Vec<u8>,
    memory: Memory,
    dictionary: Dictionary,
    objects: Objects,
    pc: usize,
    stack: Vec<u16>,
    frames: Vec<Frame>,
    rng: StdRng,
    window: u16,
    screen_enabled: bool,
    memory_streams: Vec<usize>,
    step_budget: u64,
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("release", &self.header.release)
            .field("serial", &self.header.serial)
            .field("pc", &self.pc)
            .field("depth", &self.frames.len())
            .finish_non_exhaustive()
    }
}

impl Machine {
    /// Validate a story image and prepare it to run.
    pub fn load(story: Vec<u8>) -> LoadResult<Self> {
        let header = Header::parse(&story)?;
        let mut image = story.clone();
        header::configure(&mut image);
        let memory = Memory::new(image, header.static_base);
        let dictionary = Dictionary::parse(&memory, header.dictionary)
            .map_err(|fault| LoadError::CorruptHeader(format!("dictionary: {fault}")))?;

        Ok(Self {
            objects: Objects::new(header.object_table),
            pc: header.initial_pc,
            header,
            story,
            memory,
            dictionary,
            stack: Vec::new(),
            frames: vec![Frame::main()],
            rng: StdRng::from_os_rng(),
            window: 0,
            screen_enabled: true,
            memory_streams: Vec::new(),
            step_budget: DEFAULT_STEP_BUDGET,
        })
    }

    /// Seed the random number generator for reproducible play.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Cap the number of instructions executed per turn.
    pub fn with_step_budget(mut self, steps: u64) -> Self {
        self.step_budget = steps.max(1);
        self
    }

    /// The story header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Current contents of story memory.
    pub fn memory(&self) -> &[u8] {
        self.memory.as_bytes()
    }

    /// Whether the story checksum matches its contents.
    pub fn verify(&self) -> bool {
        let end = self.header.file_length.min(self.story.len());
        let sum = self
            .story
            .get(HEADER_SIZE..end)
            .unwrap_or(&[])
            .iter()
            .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
        sum == self.header.checksum
    }

    /// Run from the initial program counter until the first read or `quit`.
    pub fn start(self, screen: &mut dyn Screen) -> FaultResult<Progress> {
        self.proceed(screen)
    }

    fn proceed(mut self, screen: &mut dyn Screen) -> FaultResult<Progress> {
        match self.run(screen)? {
            Stop::Read(request) => Ok(Progress::AwaitingInput(Suspended {
                machine: self,
                request,
            })),
            Stop::Quit => Ok(Progress::Halted),
        }
    }

    fn run(&mut self, screen: &mut dyn Screen) -> FaultResult<Stop> {
        for _ in 0..self.step_budget {
            let inst = instruction::decode(&self.memory, self.pc, self.header.abbreviations)?;
            self.pc = inst.next;
            match self.execute(&inst, screen)? {
                Flow::Continue => {}
                Flow::Read(request) => return Ok(Stop::Read(request)),
                Flow::Quit => return Ok(Stop::Quit),
            }
        }
        Err(Fault::BudgetExhausted(self.step_budget))
    }

    fn accept_input(&mut self, request: ReadRequest, line: &str) -> FaultResult<()> {
        let capacity = usize::from(self.memory.read_byte(request.text_buffer)?).saturating_sub(1);
        // One read takes one line; anything after a line break is dropped.
        let line = line.split(['\r', '\n']).next().unwrap_or_default();
        let typed: Vec<u8> = line
            .chars()
            .map(|c| u8::try_from(text::char_to_zscii(c.to_ascii_lowercase())).unwrap_or(b'?'))
            .take(capacity)
            .collect();

        for (i, &byte) in typed.iter().enumerate() {
            self.memory.write_byte(request.text_buffer + 1 + i, byte)?;
        }
        self.memory
            .write_byte(request.text_buffer + 1 + typed.len(), 0)?;

        if request.parse_buffer != 0 {
            self.dictionary
                .tokenize(&mut self.memory, request.text_buffer, request.parse_buffer)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Variables and the routine stack
    // -----------------------------------------------------------------------

    fn frame(&self) -> FaultResult<&Frame> {
        self.frames.last().ok_or(Fault::StackUnderflow)
    }

    fn pop(&mut self) -> FaultResult<u16> {
        if self.stack.len() <= self.frame()?.stack_base {
            return Err(Fault::StackUnderflow);
        }
        self.stack.pop().ok_or(Fault::StackUnderflow)
    }

    fn peek(&self) -> FaultResult<u16> {
        if self.stack.len() <= self.frame()?.stack_base {
            return Err(Fault::StackUnderflow);
        }
        self.stack.last().copied().ok_or(Fault::StackUnderflow)
    }

    fn global_addr(&self, var: u8) -> usize {
        self.header.globals + 2 * usize::from(var - 16)
    }

    fn read_var(&mut self, var: u8) -> FaultResult<u16> {
        match var {
            0 => self.pop(),
            1..=15 => self
                .frame()?
                .locals
                .get(usize::from(var - 1))
                .copied()
                .ok_or(Fault::InvalidVariable(var)),
            _ => self.memory.read_word(self.global_addr(var)),
        }
    }

    fn write_var(&mut self, var: u8, value: u16) -> FaultResult<()> {
        match var {
            0 => {
                self.stack.push(value);
                Ok(())
            }
            1..=15 => {
                let frame = self.frames.last_mut().ok_or(Fault::StackUnderflow)?;
                let slot = frame
                    .locals
                    .get_mut(usize::from(var - 1))
                    .ok_or(Fault::InvalidVariable(var))?;
                *slot = value;
                Ok(())
            }
            _ => self.memory.write_word(self.global_addr(var), value),
        }
    }

    /// Indirect variable read: the stack is peeked, not popped.
    fn peek_var(&mut self, var: u8) -> FaultResult<u16> {
        if var == 0 {
            self.peek()
        } else {
            self.read_var(var)
        }
    }

    /// Indirect variable write: the top of the stack is replaced.
    fn poke_var(&mut self, var: u8, value: u16) -> FaultResult<()> {
        if var == 0 {
            self.pop()?;
        }
        self.write_var(var, value)
    }

    fn operand_values(&mut self, inst: &Instruction) -> FaultResult<Vec<u16>> {
        inst.operands
            .iter()
            .map(|operand| match *operand {
                Operand::Large(value) => Ok(value),
                Operand::Small(value) => Ok(u16::from(value)),
                Operand::Variable(var) => self.read_var(var),
            })
            .collect()
    }

    fn call(&mut self, packed: u16, args: &[u16], store: Option<u8>) -> FaultResult<Flow> {
        if packed == 0 {
            return self.store_value(store, 0);
        }
        let addr = usize::from(packed) * 2;
        let count = usize::from(self.memory.read_byte(addr)?);
        if count > MAX_LOCALS {
            return Err(Fault::BadRoutine(addr));
        }
        let mut locals = (0..count)
            .map(|i| self.memory.read_word(addr + 1 + 2 * i))
            .collect::<FaultResult<Vec<_>>>()?;
        for (slot, &arg) in locals.iter_mut().zip(args) {
            *slot = arg;
        }
        self.frames.push(Frame {
            return_pc: self.pc,
            store,
            locals,
            stack_base: self.stack.len(),
        });
        self.pc = addr + 1 + 2 * count;
        Ok(Flow::Continue)
    }

    fn return_from(&mut self, value: u16) -> FaultResult<Flow> {
        if self.frames.len() <= 1 {
            return Err(Fault::ReturnFromMain);
        }
        let frame = self.frames.pop().ok_or(Fault::ReturnFromMain)?;
        self.stack.truncate(frame.stack_base);
        self.pc = frame.return_pc;
        self.store_value(frame.store, value)
    }

    fn store_value(&mut self, store: Option<u8>, value: u16) -> FaultResult<Flow> {
        if let Some(var) = store {
            self.write_var(var, value)?;
        }
        Ok(Flow::Continue)
    }

    fn store(&mut self, inst: &Instruction, value: u16) -> FaultResult<Flow> {
        self.store_value(inst.store, value)
    }

    fn jump(&mut self, offset: i16) {
        self.pc = (self.pc as i64 + i64::from(offset) - 2) as usize;
    }

    fn branch(&mut self, inst: &Instruction, condition: bool) -> FaultResult<Flow> {
        let Some(branch) = inst.branch else {
            return Ok(Flow::Continue);
        };
        if condition != branch.on_true {
            return Ok(Flow::Continue);
        }
        match branch.offset {
            0 => self.return_from(0),
            1 => self.return_from(1),
            offset => {
                self.jump(offset);
                Ok(Flow::Continue)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    fn output(&mut self, screen: &mut dyn Screen, text: &str) -> FaultResult<()> {
        if let Some(&table) = self.memory_streams.last() {
            let mut count = usize::from(self.memory.read_word(table)?);
            for ch in text.chars() {
                let code = u8::try_from(text::char_to_zscii(ch)).unwrap_or(b'?');
                self.memory.write_byte(table + 2 + count, code)?;
                count += 1;
            }
            return self.memory.write_word(table, count as u16);
        }
        // Upper-window text is the status area, not part of the transcript.
        if self.window == 0 && self.screen_enabled {
            screen.print(text);
        }
        Ok(())
    }

    fn select_stream(&mut self, stream: i16, table: u16) -> FaultResult<()> {
        match stream {
            1 => self.screen_enabled = true,
            -1 => self.screen_enabled = false,
            3 => {
                let table = usize::from(table);
                self.memory.write_word(table, 0)?;
                self.memory_streams.push(table);
            }
            -3 => {
                self.memory_streams.pop();
            }
            // Transcript and command-script streams are not kept.
            _ => {}
        }
        Ok(())
    }

    fn random(&mut self, range: u16) -> u16 {
        let range = range as i16;
        if range > 0 {
            return self.rng.random_range(1..=range as u16);
        }
        self.rng = if range == 0 {
            StdRng::from_os_rng()
        } else {
            StdRng::seed_from_u64(u64::from(range.unsigned_abs()))
        };
        0
    }

    fn restart(&mut self) {
        let mut image = self.story.clone();
        header::configure(&mut image);
        self.memory = Memory::new(image, self.header.static_base);
        self.pc = self.header.initial_pc;
        self.stack.clear();
        self.frames = vec![Frame::main()];
        self.window = 0;
        self.screen_enabled = true;
        self.memory_streams.clear();
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn execute(&mut self, inst: &Instruction, screen: &mut dyn Screen) -> FaultResult<Flow> {
        let ops = self.operand_values(inst)?;
        let arg = |n: usize| ops.get(n).copied().unwrap_or(0);
        let unsupported = |name: &'static str| -> FaultResult<Flow> {
            Err(Fault::Unsupported {
                name,
                pc: inst.addr,
            })
        };

        match (inst.count, inst.number) {
            // 2OP
            (OperandCount::Op2, 1) => {
                let first = arg(0);
                let equal = ops.iter().skip(1).any(|&other| other == first);
                self.branch(inst, equal)
            }
            (OperandCount::Op2, 2) => self.branch(inst, (arg(0) as i16) < (arg(1) as i16)),
            (OperandCount::Op2, 3) => self.branch(inst, (arg(0) as i16) > (arg(1) as i16)),
            (OperandCount::Op2, 4) => {
                let var = arg(0) as u8;
                let value = self.peek_var(var)?.wrapping_sub(1);
                self.poke_var(var, value)?;
                self.branch(inst, (value as i16) < (arg(1) as i16))
            }
            (OperandCount::Op2, 5) => {
                let var = arg(0) as u8;
                let value = self.peek_var(var)?.wrapping_add(1);
                self.poke_var(var, value)?;
                self.branch(inst, (value as i16) > (arg(1) as i16))
            }
            (OperandCount::Op2, 6) => {
                let parent = self.objects.parent(&self.memory, arg(0))?;
                self.branch(inst, parent == arg(1))
            }
            (OperandCount::Op2, 7) => self.branch(inst, arg(0) & arg(1) == arg(1)),
            (OperandCount::Op2, 8) => self.store(inst, arg(0) | arg(1)),
            (OperandCount::Op2, 9) => self.store(inst, arg(0) & arg(1)),
            (OperandCount::Op2, 10) => {
                let set = self.objects.attribute(&self.memory, arg(0), arg(1))?;
                self.branch(inst, set)
            }
            (OperandCount::Op2, 11) => {
                self.objects
                    .set_attribute(&mut self.memory, arg(0), arg(1), true)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op2, 12) => {
                self.objects
                    .set_attribute(&mut self.memory, arg(0), arg(1), false)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op2, 13) => {
                self.poke_var(arg(0) as u8, arg(1))?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op2, 14) => {
                self.objects.insert(&mut self.memory, arg(0), arg(1))?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op2, 15) => {
                let addr = arg(0).wrapping_add(arg(1).wrapping_mul(2));
                let value = self.memory.read_word(usize::from(addr))?;
                self.store(inst, value)
            }
            (OperandCount::Op2, 16) => {
                let addr = arg(0).wrapping_add(arg(1));
                let value = self.memory.read_byte(usize::from(addr))?;
                self.store(inst, u16::from(value))
            }
            (OperandCount::Op2, 17) => {
                let value = self.objects.property(&self.memory, arg(0), arg(1))?;
                self.store(inst, value)
            }
            (OperandCount::Op2, 18) => {
                let addr = self.objects.property_addr(&self.memory, arg(0), arg(1))?;
                self.store(inst, addr)
            }
            (OperandCount::Op2, 19) => {
                let next = self.objects.next_property(&self.memory, arg(0), arg(1))?;
                self.store(inst, next)
            }
            (OperandCount::Op2, 20) => self.store(inst, arg(0).wrapping_add(arg(1))),
            (OperandCount::Op2, 21) => self.store(inst, arg(0).wrapping_sub(arg(1))),
            (OperandCount::Op2, 22) => self.store(inst, arg(0).wrapping_mul(arg(1))),
            (OperandCount::Op2, 23 | 24) => {
                let (a, b) = (arg(0) as i16, arg(1) as i16);
                if b == 0 {
                    return Err(Fault::DivisionByZero(inst.addr));
                }
                let value = if inst.number == 23 {
                    a.wrapping_div(b)
                } else {
                    a.wrapping_rem(b)
                };
                self.store(inst, value as u16)
            }
            (OperandCount::Op2, 25) => unsupported("call_2s"),
            (OperandCount::Op2, _) => Err(Fault::IllegalOpcode {
                opcode: inst.opcode,
                pc: inst.addr,
            }),

            // 1OP
            (OperandCount::Op1, 0) => self.branch(inst, arg(0) == 0),
            (OperandCount::Op1, 1) => {
                let sibling = self.objects.sibling(&self.memory, arg(0))?;
                self.store(inst, sibling)?;
                self.branch(inst, sibling != 0)
            }
            (OperandCount::Op1, 2) => {
                let child = self.objects.child(&self.memory, arg(0))?;
                self.store(inst, child)?;
                self.branch(inst, child != 0)
            }
            (OperandCount::Op1, 3) => {
                let parent = self.objects.parent(&self.memory, arg(0))?;
                self.store(inst, parent)
            }
            (OperandCount::Op1, 4) => {
                let len = self.objects.property_len(&self.memory, arg(0))?;
                self.store(inst, len)
            }
            (OperandCount::Op1, 5 | 6) => {
                let var = arg(0) as u8;
                let current = self.peek_var(var)?;
                let value = if inst.number == 5 {
                    current.wrapping_add(1)
                } else {
                    current.wrapping_sub(1)
                };
                self.poke_var(var, value)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op1, 7) => {
                let (string, _) =
                    text::decode(&self.memory, usize::from(arg(0)), self.header.abbreviations)?;
                self.output(screen, &string)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op1, 8) => unsupported("call_1s"),
            (OperandCount::Op1, 9) => {
                self.objects.remove(&mut self.memory, arg(0))?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op1, 10) => {
                let name =
                    self.objects
                        .short_name(&self.memory, arg(0), self.header.abbreviations)?;
                self.output(screen, &name)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op1, 11) => self.return_from(arg(0)),
            (OperandCount::Op1, 12) => {
                self.jump(arg(0) as i16);
                Ok(Flow::Continue)
            }
            (OperandCount::Op1, 13) => {
                let addr = usize::from(arg(0)) * 2;
                let (string, _) = text::decode(&self.memory, addr, self.header.abbreviations)?;
                self.output(screen, &string)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op1, 14) => {
                let value = self.peek_var(arg(0) as u8)?;
                self.store(inst, value)
            }
            (OperandCount::Op1, 15) => self.store(inst, !arg(0)),
            (OperandCount::Op1, _) => Err(Fault::IllegalOpcode {
                opcode: inst.opcode,
                pc: inst.addr,
            }),

            // 0OP
            (OperandCount::Op0, 0) => self.return_from(1),
            (OperandCount::Op0, 1) => self.return_from(0),
            (OperandCount::Op0, 2) => {
                self.output(screen, inst.text.as_deref().unwrap_or_default())?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op0, 3) => {
                self.output(screen, inst.text.as_deref().unwrap_or_default())?;
                self.output(screen, "\n")?;
                self.return_from(1)
            }
            (OperandCount::Op0, 4 | 12) => Ok(Flow::Continue),
            // No persistence: save and restore always fail.
            (OperandCount::Op0, 5 | 6) => self.branch(inst, false),
            (OperandCount::Op0, 7) => {
                self.restart();
                Ok(Flow::Continue)
            }
            (OperandCount::Op0, 8) => {
                let value = self.pop()?;
                self.return_from(value)
            }
            (OperandCount::Op0, 9) => {
                self.pop()?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op0, 10) => Ok(Flow::Quit),
            (OperandCount::Op0, 11) => {
                self.output(screen, "\n")?;
                Ok(Flow::Continue)
            }
            (OperandCount::Op0, 13) => {
                let verified = self.verify();
                self.branch(inst, verified)
            }
            (OperandCount::Op0, 15) => self.branch(inst, true),
            (OperandCount::Op0, _) => Err(Fault::IllegalOpcode {
                opcode: inst.opcode,
                pc: inst.addr,
            }),

            // VAR
            (OperandCount::Var, 0) => self.call(arg(0), ops.get(1..).unwrap_or(&[]), inst.store),
            (OperandCount::Var, 1) => {
                let addr = arg(0).wrapping_add(arg(1).wrapping_mul(2));
                self.memory.write_word(usize::from(addr), arg(2))?;
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 2) => {
                let addr = arg(0).wrapping_add(arg(1));
                self.memory.write_byte(usize::from(addr), arg(2) as u8)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 3) => {
                self.objects
                    .put_property(&mut self.memory, arg(0), arg(1), arg(2))?;
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 4) => Ok(Flow::Read(ReadRequest {
                text_buffer: usize::from(arg(0)),
                parse_buffer: usize::from(arg(1)),
            })),
            (OperandCount::Var, 5) => {
                if let Some(ch) = text::zscii_to_char(arg(0)) {
                    self.output(screen, ch.encode_utf8(&mut [0; 4]))?;
                }
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 6) => {
                self.output(screen, &(arg(0) as i16).to_string())?;
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 7) => {
                let value = self.random(arg(0));
                self.store(inst, value)
            }
            (OperandCount::Var, 8) => {
                self.stack.push(arg(0));
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 9) => {
                let value = self.pop()?;
                self.poke_var(arg(0) as u8, value)?;
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 10) => Ok(Flow::Continue),
            (OperandCount::Var, 11) => {
                self.window = arg(0);
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 19) => {
                self.select_stream(arg(0) as i16, arg(1))?;
                Ok(Flow::Continue)
            }
            (OperandCount::Var, 20 | 21) => Ok(Flow::Continue),
            (OperandCount::Var, 12..=18) => unsupported("version 4+ instruction"),
            (OperandCount::Var, _) => Err(Fault::IllegalOpcode {
                opcode: inst.opcode,
                pc: inst.addr,
            }),
        }
    }
}
