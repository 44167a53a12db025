use miette::Severity;

use crate::{
    address::{Address, WORD_MASK},
    bank::BankRegister,
    table::OperandKind,
};

/// Upper bound on operands two packed interpretive opcodes can ask for.
pub const MAX_PENDING_OPERANDS: usize = 4;

/// Textual fields of one source line after tokenization.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Fields {
    pub label: String,
    pub false_label: String,
    pub operator: String,
    pub operand: String,
    pub mod1: String,
    pub mod2: String,
    pub extra: String,
    pub comment: String,
    /// Operator name this line was rewritten from (`NOOP` or an alias entry).
    pub alias: Option<String>,
}

/// Snapshot a line is assembled against.
#[derive(Clone, Debug)]
pub struct LineInput {
    pub pc: Address,
    pub ebank: BankRegister,
    pub sbank: BankRegister,
    pub index: i32,
    pub index_valid: bool,
    pub extend: bool,
    pub fields: Fields,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Result of assembling one line.
#[derive(Clone, Debug)]
pub struct LineOutput {
    pub pc: Address,
    pub ebank: BankRegister,
    pub sbank: BankRegister,
    pub words: [i32; 2],
    pub num_words: usize,
    /// Value shown in the listing's second column (`EQUALS` and friends).
    pub label_value: Option<Address>,
    /// The label takes `label_value` rather than the program counter.
    pub equals: bool,
    pub index: i32,
    pub index_valid: bool,
    pub extend: bool,
    /// Bias the resolver adds to the first word after the parser runs.
    pub opcode_offset: i32,
    pub diagnostic: Option<Diagnostic>,
}

impl LineOutput {
    pub fn for_input(input: &LineInput) -> Self {
        LineOutput {
            pc: Address::invalid(),
            ebank: input.ebank,
            sbank: input.sbank,
            words: [0; 2],
            num_words: 0,
            label_value: None,
            equals: false,
            index: 0,
            index_valid: false,
            extend: false,
            opcode_offset: 0,
            diagnostic: None,
        }
    }

    /// Emit `words` at `pc` and advance past them.
    pub fn emit(&mut self, pc: &Address, words: &[i32]) {
        for (slot, word) in self.words.iter_mut().zip(words) {
            *slot = *word;
        }
        self.num_words = words.len().min(2);
        self.pc = pc.advance(self.num_words as i32);
    }

    pub fn words(&self) -> &[i32] {
        &self.words[..self.num_words]
    }

    pub fn fatal(&mut self, message: impl Into<String>) {
        if self.is_fatal() {
            return;
        }
        self.diagnostic = Some(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        if self.is_fatal() {
            return;
        }
        self.diagnostic = Some(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    pub fn is_fatal(&self) -> bool {
        matches!(&self.diagnostic, Some(d) if d.severity == Severity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(&self.diagnostic, Some(d) if d.severity == Severity::Warning)
    }
}

/// One queued interpretive operand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PendingOperand {
    pub kind: OperandKind,
    pub nnnn: i32,
}

/// Operands still owed to the interpretive opcode(s) most recently seen.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InterpretiveCarry {
    pending: usize,
    raw: usize,
    kinds: [OperandKind; MAX_PENDING_OPERANDS],
    nnnn: [i32; MAX_PENDING_OPERANDS],
}

impl InterpretiveCarry {
    pub fn clear(&mut self) {
        *self = InterpretiveCarry::default();
    }

    pub fn push(&mut self, kind: OperandKind, nnnn: i32) {
        if self.raw == MAX_PENDING_OPERANDS {
            return;
        }
        self.kinds[self.raw] = kind;
        self.nnnn[self.raw] = nnnn;
        self.raw += 1;
        self.pending = self.raw;
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending > 0
    }

    /// Consume the next operand slot.
    pub fn take(&mut self) -> Option<PendingOperand> {
        if self.pending == 0 {
            return None;
        }
        let slot = self.raw - self.pending;
        self.pending -= 1;
        Some(PendingOperand {
            kind: self.kinds[slot],
            nnnn: self.nnnn[slot],
        })
    }

    /// Drop every pending operand.
    pub fn reset(&mut self) {
        self.pending = 0;
    }
}

/// Everything carried from one line to the next.
#[derive(Clone, Debug)]
pub struct LineState {
    pub pc: Address,
    pub ebank: BankRegister,
    pub sbank: BankRegister,
    pub index: i32,
    pub index_valid: bool,
    pub extend: bool,
    pub interpretive: InterpretiveCarry,
    /// Countdown armed by `STADR`; the word emitted when it reaches 1 is complemented.
    pub stadr_invert: u8,
}

impl Default for LineState {
    fn default() -> Self {
        LineState::initial()
    }
}

impl LineState {
    /// State at the top of every pass. SB starts set so that bank constants
    /// ahead of the first `SBANK=` address the superbanks correctly.
    pub fn initial() -> Self {
        LineState {
            pc: Address::invalid(),
            ebank: BankRegister::new(Address::invalid()),
            sbank: BankRegister::new(Address::fixed(0o30, 0o2000, true)),
            index: 0,
            index_valid: false,
            extend: false,
            interpretive: InterpretiveCarry::default(),
            stadr_invert: 0,
        }
    }

    pub fn input(&self, fields: Fields) -> LineInput {
        LineInput {
            pc: self.pc,
            ebank: self.ebank,
            sbank: self.sbank,
            index: self.index,
            index_valid: self.index_valid,
            extend: self.extend,
            fields,
        }
    }

    /// Pick up what `output` hands to the next line.
    pub fn advance(&mut self, output: &LineOutput) {
        self.pc = output.pc;
        self.ebank = output.ebank;
        self.sbank = output.sbank;
        self.index = output.index;
        self.index_valid = output.index_valid;
        self.extend = output.extend;
    }
}

/// Complement a word inside 15 bits.
pub fn complement(word: i32) -> i32 {
    WORD_MASK & !word
}

fn trace_index(value: i32, valid: bool) -> String {
    if valid {
        format!("X={:05o}", value & WORD_MASK)
    } else {
        "X=-----".to_string()
    }
}

pub fn trace_line(input: &LineInput, output: &LineOutput) -> String {
    format!(
        "--- in  {} {} {} {}\n--- out {} {} {} {}",
        input.pc.trace(),
        input.ebank.trace(),
        input.sbank.trace(),
        trace_index(input.index, input.index_valid),
        output.pc.trace(),
        output.ebank.trace(),
        output.sbank.trace(),
        trace_index(output.index, output.index_valid),
    )
}
