//! Lookup capability the resolver consults for operator names.
//!
//! Tables are plain data: each entry describes how a name assembles, and the
//! resolver drives the entry rather than the other way round. Anything that
//! implements [`OpcodeTable`] can stand in for the built-in Block II table.

use crate::{
    address::Address,
    image::BankUsage,
    line::{InterpretiveCarry, LineInput, LineOutput},
    operand::{self, OperandError},
    symbol::{FxMap, SymbolTable},
};

/// Parser hook for one instruction or pseudo-op.
pub type ParseFn = fn(&mut ParseContext<'_>);

/// Colour class of an operator in the HTML listing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OpClass {
    Basic,
    Pseudo,
    Interpretive,
    Downlink,
}

impl OpClass {
    pub fn css_class(&self) -> &'static str {
        match self {
            OpClass::Basic => "basic",
            OpClass::Pseudo => "pseudo",
            OpClass::Interpretive => "interpretive",
            OpClass::Downlink => "downlink",
        }
    }
}

/// How an entry interacts with the one-shot bank registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BankEffect {
    #[default]
    None,
    /// Double-address bank constants (`BBCON`, `2CADR`) that use up a pending switch.
    Consume,
    /// `EBANK=`
    SwitchErasable,
    /// `SBANK=`
    SwitchFixed,
}

/// What an interpretive operand slot expects.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum OperandKind {
    #[default]
    Address,
    Switch,
    Shift,
}

#[derive(Clone, Debug)]
pub struct Instruction {
    pub name: &'static str,
    pub class: OpClass,
    pub parse: Option<ParseFn>,
    /// Replacement operator and operand for alias entries.
    pub alias: Option<(&'static str, &'static str)>,
    /// Base word handed to the parser.
    pub opcode: i32,
    pub adder: i32,
    pub xmask: i32,
    pub adder2: i32,
    pub xmask2: i32,
    /// May appear where an interpretive operand is expected.
    pub pinch_hit: bool,
    /// Reads the second modifier field (scale factors).
    pub takes_mod2: bool,
    pub bank_effect: BankEffect,
}

impl Instruction {
    pub fn new(name: &'static str, class: OpClass, parse: ParseFn) -> Self {
        Instruction {
            name,
            class,
            parse: Some(parse),
            alias: None,
            opcode: 0,
            adder: 0,
            xmask: 0,
            adder2: 0,
            xmask2: 0,
            pinch_hit: false,
            takes_mod2: false,
            bank_effect: BankEffect::None,
        }
    }

    pub fn alias(name: &'static str, operator: &'static str, operand: &'static str) -> Self {
        Instruction {
            parse: None,
            alias: Some((operator, operand)),
            ..Instruction::discard(name, OpClass::Basic)
        }
    }

    /// An entry that is accepted and silently produces nothing.
    pub fn discard(name: &'static str, class: OpClass) -> Self {
        Instruction {
            name,
            class,
            parse: None,
            alias: None,
            opcode: 0,
            adder: 0,
            xmask: 0,
            adder2: 0,
            xmask2: 0,
            pinch_hit: false,
            takes_mod2: false,
            bank_effect: BankEffect::None,
        }
    }

    pub fn opcode(mut self, opcode: i32) -> Self {
        self.opcode = opcode;
        self
    }

    pub fn transform(mut self, adder: i32, xmask: i32) -> Self {
        self.adder = adder;
        self.xmask = xmask;
        self
    }

    pub fn transform2(mut self, adder2: i32, xmask2: i32) -> Self {
        self.adder2 = adder2;
        self.xmask2 = xmask2;
        self
    }

    pub fn pinch_hit(mut self) -> Self {
        self.pinch_hit = true;
        self
    }

    pub fn takes_mod2(mut self) -> Self {
        self.takes_mod2 = true;
        self
    }

    pub fn bank_effect(mut self, effect: BankEffect) -> Self {
        self.bank_effect = effect;
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InterpretiveOp {
    pub name: &'static str,
    pub code: i32,
    pub arity: usize,
    pub kinds: [OperandKind; 2],
    /// Added to the first operand word.
    pub nnnn: i32,
}

impl InterpretiveOp {
    pub fn new(name: &'static str, code: i32) -> Self {
        InterpretiveOp {
            name,
            code,
            arity: 0,
            kinds: [OperandKind::Address; 2],
            nnnn: 0,
        }
    }

    /// Declare the next operand. Anything past two is ignored.
    pub fn operand(mut self, kind: OperandKind) -> Self {
        if self.arity < 2 {
            self.kinds[self.arity] = kind;
            self.arity += 1;
        }
        self
    }

    pub fn nnnn(mut self, nnnn: i32) -> Self {
        self.nnnn = nnnn;
        self
    }

    /// Queue this opcode's operands onto `carry`.
    pub fn push_operands(&self, carry: &mut InterpretiveCarry) {
        for (i, kind) in self.kinds.iter().take(self.arity).enumerate() {
            carry.push(*kind, if i == 0 { self.nnnn } else { 0 });
        }
    }
}

/// Exact, case-sensitive lookup of operator names.
pub trait OpcodeTable {
    fn instruction(&self, name: &str) -> Option<&Instruction>;

    fn interpretive(&self, name: &str) -> Option<&InterpretiveOp>;

    /// Parser for a bare number in the operator field, which assembles with
    /// opcode `n << 12`. Tables without one reject numeric operators.
    fn numeric_parser(&self) -> Option<ParseFn> {
        None
    }

    fn classify(&self, name: &str) -> Option<OpClass> {
        if self.interpretive(name).is_some() {
            return Some(OpClass::Interpretive);
        }
        self.instruction(name).map(|ins| ins.class)
    }
}

/// Table built from entry lists at startup.
#[derive(Clone, Debug, Default)]
pub struct StaticTable {
    instructions: FxMap<&'static str, Instruction>,
    interpretive: FxMap<&'static str, InterpretiveOp>,
    numeric: Option<ParseFn>,
}

impl StaticTable {
    pub fn new(
        instructions: impl IntoIterator<Item = Instruction>,
        interpretive: impl IntoIterator<Item = InterpretiveOp>,
    ) -> Self {
        StaticTable {
            instructions: instructions.into_iter().map(|ins| (ins.name, ins)).collect(),
            interpretive: interpretive.into_iter().map(|op| (op.name, op)).collect(),
            numeric: None,
        }
    }

    pub fn numeric(mut self, parse: ParseFn) -> Self {
        self.numeric = Some(parse);
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len() + self.interpretive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OpcodeTable for StaticTable {
    fn instruction(&self, name: &str) -> Option<&Instruction> {
        self.instructions.get(name)
    }

    fn interpretive(&self, name: &str) -> Option<&InterpretiveOp> {
        self.interpretive.get(name)
    }

    fn numeric_parser(&self) -> Option<ParseFn> {
        self.numeric
    }
}

/// Everything a parser function may read or touch while assembling a line.
pub struct ParseContext<'a> {
    pub input: &'a LineInput,
    pub output: &'a mut LineOutput,
    pub symbols: &'a SymbolTable,
    pub interpretive: &'a mut InterpretiveCarry,
    pub bank_usage: &'a BankUsage,
    /// Base word from the table entry.
    pub opcode: i32,
    /// Final pass: unresolved references are errors rather than placeholders.
    pub emitting: bool,
}

impl<'a> ParseContext<'a> {
    pub fn operand(&self) -> &'a str {
        &self.input.fields.operand
    }

    pub fn emit(&mut self, words: &[i32]) {
        let pc = self.input.pc;
        self.output.emit(&pc, words);
    }

    /// Leave the program counter where it was, emitting nothing.
    pub fn hold(&mut self) {
        self.output.pc = self.input.pc;
        self.output.num_words = 0;
    }

    /// Evaluate the operand and its numeric modifier.
    ///
    /// `None` means the reference could not be resolved; the diagnostic (if
    /// any is due in this pass) has already been recorded.
    pub fn address(&mut self) -> Option<Address> {
        let input = self.input;
        self.evaluate(&input.fields.operand, &input.fields.mod1)
    }

    pub fn evaluate(&mut self, operand: &str, modifier: &str) -> Option<Address> {
        if operand.is_empty() {
            self.output.fatal("Missing operand.");
            return None;
        }
        match operand::evaluate(operand, modifier, &self.input.pc, self.symbols) {
            Ok(addr) if addr.is_valid() => Some(addr),
            Ok(_) => {
                if self.emitting {
                    self.output.fatal(format!("Operand \"{operand}\" has no address."));
                }
                None
            }
            Err(err @ OperandError::Undefined(_)) => {
                if self.emitting {
                    self.output.fatal(err.to_string());
                }
                None
            }
            Err(err) => {
                self.output.fatal(err.to_string());
                None
            }
        }
    }
}
