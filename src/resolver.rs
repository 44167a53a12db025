//! Per-line opcode resolution.
//!
//! One call to [`Resolver::line`] turns a split source line into its
//! [`LineOutput`], threading the cross-line [`LineState`] along the way.
//! Resolution order:
//!
//! 1. Nothing in the operator slot and no interpretive operands owed: the
//!    line carries state through untouched.
//! 2. `NOOP` is rewritten to `CA A` or `TCF +1` depending on where it lands.
//! 3. Interpretive opcodes, possibly two packed in one word.
//! 4. Operand lines owed to an earlier interpretive opcode.
//! 5. The instruction table: parser entries, aliases (which restart at 3),
//!    silently discarded entries, or numeric operators.

use crate::{
    address::{ILLEGAL_SYMBOL_VALUE, WORD_MASK},
    image::BankUsage,
    lexer::{self, RawLine},
    line::{complement, Fields, LineInput, LineOutput, LineState, PendingOperand},
    operand::{self, OperandError},
    symbol::SymbolTable,
    table::{
        BankEffect, Instruction, InterpretiveOp, OpcodeTable, OperandKind, ParseContext, ParseFn,
    },
};

/// Alias rewrites allowed on one line before giving up.
const MAX_ALIAS_DEPTH: usize = 8;

/// Bit 14 of a word, where the borrow correction looks.
const BIT_14: i32 = 0o40000;

#[derive(Clone, Debug)]
pub struct Resolved {
    pub input: LineInput,
    pub output: LineOutput,
}

pub struct Resolver<'a, T: ?Sized> {
    pub table: &'a T,
    pub symbols: &'a SymbolTable,
    pub bank_usage: &'a BankUsage,
    /// Unresolved references are reported rather than left as placeholders.
    pub emitting: bool,
}

impl<'a, T: OpcodeTable + ?Sized> Resolver<'a, T> {
    pub fn new(table: &'a T, symbols: &'a SymbolTable, bank_usage: &'a BankUsage) -> Self {
        Resolver {
            table,
            symbols,
            bank_usage,
            emitting: false,
        }
    }

    pub fn emitting(mut self, emitting: bool) -> Self {
        self.emitting = emitting;
        self
    }

    /// Assemble one line against `state` and leave `state` ready for the next.
    pub fn line(&self, state: &mut LineState, raw: &RawLine<'_>) -> Resolved {
        let (fields, pinch_hitting) = self.assign_fields(raw, state);
        let mut input = state.input(fields);
        let mut output = LineOutput::for_input(&input);

        self.resolve(&mut input, &mut output, state, pinch_hitting);
        finalize(&input, &mut output, state);

        state.advance(&output);
        Resolved { input, output }
    }

    /// Distribute tokens over the label, operator and operand slots.
    ///
    /// While interpretive operands are owed the operator slot is judged by
    /// what the token could be. Returns whether a store instruction is
    /// standing in for one of those operands.
    fn assign_fields(&self, raw: &RawLine<'_>, state: &mut LineState) -> (Fields, bool) {
        let mut fields = Fields {
            comment: raw.comment.to_string(),
            ..Fields::default()
        };
        let tokens = &raw.tokens;
        if tokens.is_empty() {
            return (fields, false);
        }

        let carry = &mut state.interpretive;
        let mut i = 0;
        let mut pinch_hitting = false;
        let mut has_operator_slot = true;

        if raw.label_in_col1 {
            fields.label = tokens[0].to_string();
            i = 1;
        } else if lexer::is_false_label(tokens[0]) {
            if tokens.len() == 1 {
                has_operator_slot = false;
            } else {
                fields.false_label = tokens[0].to_string();
                i = 1;
            }
        } else if raw.space_indented {
            // Anything else ahead of the operator is a fake label and dropped.
            i = 1;
        }

        if has_operator_slot {
            let token = tokens.get(i).copied().unwrap_or("");
            let interpretive = self.table.interpretive(token).is_some();
            let instruction = self.table.instruction(token);
            match instruction {
                _ if carry.is_pending() && !interpretive && instruction.is_none() => {}
                // An opcode name alone on the line is a data label used as an operand.
                Some(_) if carry.is_pending() && i + 1 >= tokens.len() => {}
                Some(ins) if ins.pinch_hit && carry.is_pending() => {
                    carry.take();
                    pinch_hitting = true;
                    fields.operator = token.to_string();
                    i += 1;
                }
                _ => {
                    if i < tokens.len() {
                        fields.operator = token.to_string();
                        i += 1;
                    }
                }
            }
        }

        let mut rest = tokens.iter().skip(i).map(|t| t.to_string());
        fields.operand = rest.next().unwrap_or_default();
        fields.mod1 = rest.next().unwrap_or_default();
        fields.mod2 = rest.next().unwrap_or_default();
        fields.extra = rest.next().unwrap_or_default();
        (fields, pinch_hitting)
    }

    fn resolve(
        &self,
        input: &mut LineInput,
        output: &mut LineOutput,
        state: &mut LineState,
        pinch_hitting: bool,
    ) {
        if input.fields.operator.is_empty() && !state.interpretive.is_pending() {
            output.pc = input.pc;
            output.extend = input.extend;
            output.index = input.index;
            output.index_valid = input.index_valid;
            return;
        }

        if input.fields.operator == "NOOP" && !state.interpretive.is_pending() {
            if !input.fields.operand.is_empty() {
                output.warn("Extra fields in line.");
            }
            let (operator, operand) = if input.pc.is_erasable() {
                ("CA", "A")
            } else {
                ("TCF", "+1")
            };
            input.fields.operator = operator.to_string();
            input.fields.operand = operand.to_string();
            input.fields.alias = Some("NOOP".to_string());
        }

        for _ in 0..MAX_ALIAS_DEPTH {
            if let Some(op) = self.table.interpretive(&input.fields.operator) {
                self.interpretive_opcode(*op, input, output, state);
                return;
            }

            if state.interpretive.is_pending() && !pinch_hitting {
                self.operand_line(input, output, state);
                return;
            }

            let Some(ins) = self.table.instruction(&input.fields.operator) else {
                self.unknown(input, output, state);
                return;
            };

            match (ins.parse, ins.alias) {
                (Some(parse), _) => {
                    self.parse(ins, parse, input, output, state);
                    return;
                }
                (None, Some((operator, operand))) => {
                    if !input.fields.operand.is_empty() {
                        output.warn("Extra fields are present.");
                    }
                    let alias = std::mem::replace(&mut input.fields.operator, operator.to_string());
                    input.fields.alias = Some(alias);
                    input.fields.operand = operand.to_string();
                    input.fields.mod1.clear();
                    input.fields.mod2.clear();
                }
                (None, None) => {
                    output.pc = input.pc;
                    return;
                }
            }
        }

        output.pc = input.pc;
        output.fatal(format!(
            "Alias expansion of \"{}\" does not terminate.",
            input.fields.operator
        ));
    }

    /// One word holding one or two interpretive opcodes. Their operands are
    /// queued for the following lines.
    fn interpretive_opcode(
        &self,
        op: InterpretiveOp,
        input: &LineInput,
        output: &mut LineOutput,
        state: &mut LineState,
    ) {
        if input.fields.operator == "STADR" || input.fields.operand == "STADR" {
            state.stadr_invert = 2;
        }

        let second = match input.fields.operand.as_str() {
            "" => None,
            name => match self.table.interpretive(name) {
                Some(op2) => Some(*op2),
                None => {
                    output.fatal(format!("Unrecognized interpretive opcode \"{name}\"."));
                    None
                }
            },
        };

        let carry = &mut state.interpretive;
        carry.clear();
        op.push_operands(carry);
        let mut word = (op.code + 1) & 0o177;
        if let Some(op2) = second {
            op2.push_operands(carry);
            word |= ((op2.code + 1) << 7) & 0o37600;
        }
        output.emit(&input.pc, &[complement(word)]);
    }

    fn operand_line(&self, input: &LineInput, output: &mut LineOutput, state: &mut LineState) {
        let fields = &input.fields;
        if fields.operator.is_empty() && fields.operand.is_empty() {
            output.pc = input.pc;
            return;
        }

        if fields.operator.is_empty() {
            if let Some(slot) = state.interpretive.take() {
                let mut ctx = self.context(input, output, state, 0);
                let word = interpretive_operand(&mut ctx, slot);
                ctx.emit(&[word]);
            }
            return;
        }

        output.fatal("Missing interpretive operands.");
        state.interpretive.reset();
        output.emit(&input.pc, &[0]);
    }

    fn unknown(&self, input: &LineInput, output: &mut LineOutput, state: &mut LineState) {
        let numeral = operand::oct_or_dec(&input.fields.operator);
        if let (Some(n), Some(parse)) = (numeral, self.table.numeric_parser()) {
            if has_extra_fields(input, false) {
                output.warn("Extra fields in line.");
            }
            // Only three bits of the operator survive in a word.
            let mut ctx = self.context(input, output, state, (n & 0o7) << 12);
            parse(&mut ctx);
            let word = output.words[0];
            if word != ILLEGAL_SYMBOL_VALUE {
                output.words[0] = (word + output.opcode_offset) & WORD_MASK;
            }
            output.ebank.clear_pending();
            output.sbank.clear_pending();
            return;
        }

        output.fatal(format!(
            "Unrecognized opcode/pseudo-op \"{}\".",
            input.fields.operator
        ));
        // Nearly everything is one word long.
        output.pc = input.pc.advance(1);
    }

    fn parse(
        &self,
        ins: &Instruction,
        parse: ParseFn,
        input: &LineInput,
        output: &mut LineOutput,
        state: &mut LineState,
    ) {
        if has_extra_fields(input, ins.takes_mod2) {
            output.warn("Extra fields in line.");
        }
        let mut ctx = self.context(input, output, state, ins.opcode);
        parse(&mut ctx);

        let raw = output.words[0];
        if raw != ILLEGAL_SYMBOL_VALUE {
            let mut word = (raw + output.opcode_offset) & WORD_MASK;
            if word & BIT_14 != 0 && raw & BIT_14 == 0 {
                word -= 1;
            }
            output.words[0] = ((word + ins.adder) ^ ins.xmask) & WORD_MASK;
        }
        if output.words[1] != ILLEGAL_SYMBOL_VALUE {
            output.words[1] = ((output.words[1] + ins.adder2) ^ ins.xmask2) & WORD_MASK;
        }

        if ins.bank_effect == BankEffect::Consume {
            if input.ebank.one_shot_pending {
                output.ebank.consume_one_shot();
            }
            if input.sbank.one_shot_pending {
                output.sbank.consume_one_shot();
            }
        }
        if ins.bank_effect != BankEffect::SwitchErasable {
            output.ebank.clear_pending();
        }
        if ins.bank_effect != BankEffect::SwitchFixed {
            output.sbank.clear_pending();
        }
    }

    fn context<'c>(
        &'c self,
        input: &'c LineInput,
        output: &'c mut LineOutput,
        state: &'c mut LineState,
        opcode: i32,
    ) -> ParseContext<'c> {
        ParseContext {
            input,
            output,
            symbols: self.symbols,
            interpretive: &mut state.interpretive,
            bank_usage: self.bank_usage,
            opcode,
            emitting: self.emitting,
        }
    }
}

/// Tokens past the last field the operator reads.
fn has_extra_fields(input: &LineInput, takes_mod2: bool) -> bool {
    !input.fields.extra.is_empty() || (!takes_mod2 && !input.fields.mod2.is_empty())
}

/// Word for one interpretive operand line.
///
/// Erasable targets use their flat address, fixed ones their S-register,
/// plus the slot's `nnnn` field. Indexing with `,2` complements the word.
fn interpretive_operand(ctx: &mut ParseContext<'_>, slot: PendingOperand) -> i32 {
    let input = ctx.input;
    let (operand, index) = operand::split_index(&input.fields.operand);
    let (modifier, mod_index) = operand::split_index(&input.fields.mod1);
    let index = if index == 0 { mod_index } else { index };

    let word = match slot.kind {
        OperandKind::Address => match ctx.evaluate(operand, modifier) {
            Some(addr) if addr.is_erasable() => addr.value,
            Some(addr) => addr.sreg().map_or(addr.value, i32::from),
            None => return ILLEGAL_SYMBOL_VALUE,
        },
        OperandKind::Switch | OperandKind::Shift => match operand::number(operand, ctx.symbols) {
            Ok(n) => n,
            Err(err @ OperandError::Undefined(_)) => {
                if ctx.emitting {
                    ctx.output.fatal(err.to_string());
                }
                return ILLEGAL_SYMBOL_VALUE;
            }
            Err(err) => {
                ctx.output.fatal(err.to_string());
                return ILLEGAL_SYMBOL_VALUE;
            }
        },
    };

    let word = (word + slot.nnnn) & WORD_MASK;
    if index == 2 {
        complement(word)
    } else {
        word
    }
}

/// Pending `STADR` inversion and the storage-overflow warning.
fn finalize(input: &LineInput, output: &mut LineOutput, state: &mut LineState) {
    if state.stadr_invert > 0 && output.num_words > 0 {
        if state.stadr_invert == 1 && output.words[0] != ILLEGAL_SYMBOL_VALUE {
            output.words[0] = complement(output.words[0]);
        }
        state.stadr_invert -= 1;
    }

    if output.pc.overflow && !input.pc.overflow {
        output.warn("Next code may overflow storage.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        address::Address,
        block2,
        symbol::SymbolKind,
        table::{OpClass, StaticTable},
    };

    struct Bench {
        table: StaticTable,
        symbols: SymbolTable,
        usage: BankUsage,
        state: LineState,
    }

    impl Bench {
        fn at(pc: Address) -> Self {
            let mut state = LineState::initial();
            state.pc = pc;
            Bench {
                table: block2::table(),
                symbols: SymbolTable::new(),
                usage: BankUsage::new(),
                state,
            }
        }

        fn define(&mut self, name: &str, value: Address) {
            self.symbols
                .define(name, value, SymbolKind::Label, "test.agc", 1)
                .unwrap();
        }

        fn line(&mut self, text: &str) -> Resolved {
            Resolver::new(&self.table, &self.symbols, &self.usage)
                .line(&mut self.state, &lexer::split_line(text))
        }

        fn word(&mut self, text: &str) -> i32 {
            let out = self.line(text).output;
            assert_eq!(out.num_words, 1, "{text}");
            out.words[0]
        }
    }

    fn packed(a: i32, b: i32) -> i32 {
        complement(((a + 1) & 0o177) | (((b + 1) & 0o177) << 7))
    }

    #[test]
    fn comment_line_passes_state_through() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.state.extend = true;
        let res = bench.line("# nothing to see");
        assert_eq!(res.output.pc, Address::unbanked(0o4000));
        assert_eq!(res.output.num_words, 0);
        assert!(res.output.extend);
        assert_eq!(res.input.fields.comment, " nothing to see");
    }

    #[test]
    fn interpretive_packing_and_operands() {
        let mut bench = Bench::at(Address::fixed(0o5, 0o2000, false));
        bench.define("X", Address::erasable(3, 0o1410));
        bench.define("Y", Address::unbanked(0o61));

        let word = bench.word("\tDLOAD\tDAD");
        assert_eq!(word, packed(0o060, 0o070));
        assert_eq!(bench.state.interpretive.pending(), 2);

        assert_eq!(bench.word("\tX"), 0o1410);
        assert_eq!(bench.state.interpretive.pending(), 1);
        assert_eq!(bench.word("\tY"), 0o61);
        assert!(!bench.state.interpretive.is_pending());
        assert_eq!(bench.state.pc, Address::fixed(0o5, 0o2003, false));
    }

    #[test]
    fn single_opcode_packs_low_bits_only() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        assert_eq!(bench.word("\tEXIT"), complement(1));
        assert!(!bench.state.interpretive.is_pending());
        assert_eq!(bench.word("\tSQRT\tEXIT"), packed(0o012, 0o000));
    }

    #[test]
    fn unexpected_instruction_ends_operands() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.define("X", Address::unbanked(0o100));
        bench.line("\tDLOAD\tDAD");
        bench.line("\tX");
        let out = bench.line("\tTC\tX").output;
        assert!(out.is_fatal());
        assert_eq!(out.diagnostic.as_ref().unwrap().message, "Missing interpretive operands.");
        assert_eq!(out.words(), &[0]);
        assert_eq!(out.pc, Address::unbanked(0o4003));
        assert!(!bench.state.interpretive.is_pending());
    }

    #[test]
    fn blank_line_inside_operands() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.line("\tDLOAD");
        let out = bench.line("").output;
        assert_eq!(out.num_words, 0);
        assert_eq!(out.pc, Address::unbanked(0o4001));
        assert_eq!(bench.state.interpretive.pending(), 1);
    }

    #[test]
    fn unknown_second_opcode() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let out = bench.line("\tDLOAD\tFROB").output;
        assert!(out.is_fatal());
        assert_eq!(out.words(), &[complement(0o061)]);
        assert_eq!(bench.state.interpretive.pending(), 1);
    }

    #[test]
    fn store_pinch_hits() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.define("X", Address::unbanked(0o100));
        bench.define("Y", Address::unbanked(0o101));
        bench.define("Z", Address::unbanked(0o102));
        bench.line("\tDLOAD\tDAD");
        bench.line("\tX");
        let res = bench.line("\tSTODL\tY");
        assert_eq!(res.input.fields.operator, "STODL");
        assert_eq!(res.output.words(), &[0o14101]);
        assert_eq!(bench.state.interpretive.pending(), 1);
        assert_eq!(bench.word("\tZ"), 0o102);
        assert!(!bench.state.interpretive.is_pending());
    }

    #[test]
    fn opcode_named_label_as_operand() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.define("TC", Address::unbanked(0o200));
        bench.line("\tDLOAD");
        let res = bench.line("\tTC");
        assert_eq!(res.input.fields.operator, "");
        assert_eq!(res.input.fields.operand, "TC");
        assert_eq!(res.output.words(), &[0o200]);
    }

    #[test]
    fn indexed_operands() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.define("X", Address::unbanked(0o100));
        bench.line("\tVLOAD\tDAD");
        assert_eq!(bench.word("\tX,1"), 0o100);
        assert_eq!(bench.word("\tX,2"), complement(0o100));
    }

    #[test]
    fn switch_operand_gets_nnnn() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.define("DONE", Address::unbanked(0o4100));
        bench.line("\tBON");
        assert_eq!(bench.word("\t12"), 0o0112);
        assert_eq!(bench.word("\tDONE"), 0o4100);
    }

    #[test]
    fn alias_rewrites_and_warns() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let res = bench.line("\tCOM");
        assert_eq!(res.output.words(), &[0o40000]);
        assert_eq!(res.input.fields.alias.as_deref(), Some("COM"));
        assert_eq!(res.input.fields.operator, "CS");

        let out = bench.line("\tDDOUBL\tX").output;
        assert!(out.is_warning());
        assert_eq!(out.words(), &[0o20001]);
        assert_eq!(bench.word("\tRESUME"), 0o50017);
    }

    #[test]
    fn alias_loop_is_cut_off() {
        let table = StaticTable::new(
            [
                Instruction::alias("PING", "PONG", ""),
                Instruction::alias("PONG", "PING", ""),
            ],
            Vec::<InterpretiveOp>::new(),
        );
        let symbols = SymbolTable::new();
        let usage = BankUsage::new();
        let mut state = LineState::initial();
        state.pc = Address::unbanked(0o4000);
        let res = Resolver::new(&table, &symbols, &usage)
            .line(&mut state, &lexer::split_line("\tPING"));
        assert!(res.output.is_fatal());
        assert_eq!(res.output.pc, Address::unbanked(0o4000));
    }

    #[test]
    fn discarded_operator() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let out = bench.line("\tCOUNT\t02/FOO").output;
        assert_eq!(out.num_words, 0);
        assert!(out.diagnostic.is_none());
        assert_eq!(out.pc, Address::unbanked(0o4000));
    }

    #[test]
    fn unknown_operator_still_advances() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let out = bench.line("\tFROB\tX").output;
        assert!(out.is_fatal());
        assert_eq!(
            out.diagnostic.unwrap().message,
            "Unrecognized opcode/pseudo-op \"FROB\"."
        );
        assert_eq!(out.num_words, 0);
        assert_eq!(out.pc, Address::unbanked(0o4001));
    }

    #[test]
    fn numeric_operator() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        assert_eq!(bench.word("\t5\t61"), 0o50061);
        assert_eq!(bench.word("\t15\t61"), 0o50061);
    }

    /// Numeric operators are parsed by whatever the table supplies.
    fn opcode_only(ctx: &mut ParseContext<'_>) {
        let opcode = ctx.opcode;
        ctx.emit(&[opcode]);
    }

    #[test]
    fn numeric_operator_follows_the_table() {
        let symbols = SymbolTable::new();
        let usage = BankUsage::new();
        let line = |table: &StaticTable| {
            let mut state = LineState::initial();
            state.pc = Address::unbanked(0o4000);
            Resolver::new(table, &symbols, &usage)
                .line(&mut state, &lexer::split_line("\t5\t61"))
                .output
        };

        let bare = StaticTable::new(Vec::<Instruction>::new(), Vec::<InterpretiveOp>::new());
        let out = line(&bare);
        assert!(out.is_fatal());
        assert_eq!(out.num_words, 0);

        let own = bare.numeric(opcode_only);
        let out = line(&own);
        assert!(out.diagnostic.is_none());
        assert_eq!(out.words(), &[0o50000]);
    }

    #[test]
    fn oversized_numbers_are_line_fatals() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let out = bench.line("\tTC\t+17777777777").output;
        assert!(out.is_fatal());
        assert_eq!(
            out.diagnostic.unwrap().message,
            "Malformed number \"+17777777777\"."
        );
        assert_eq!(out.pc, Address::unbanked(0o4001));

        let mut bench = Bench::at(Address::unbanked(0o100));
        let out = bench.line("X\tERASE\t17777777777").output;
        assert!(out.is_fatal());
        assert_eq!(
            out.diagnostic.unwrap().message,
            "Illegal ERASE size \"17777777777\"."
        );
        assert_eq!(out.pc, Address::unbanked(0o100));

        // The next line assembles as usual.
        assert_eq!(bench.word("\tCA\tA"), 0o30000);
    }

    #[test]
    fn extra_fields_warn() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let out = bench.line("\tTC\t4000\t+1\tJUNK\tMORE").output;
        assert!(out.is_warning());
        assert_eq!(out.diagnostic.as_ref().unwrap().message, "Extra fields in line.");
        assert_eq!(out.words(), &[0o4001]);

        let out = bench.line("\tCA\t100\t+1\tJUNK").output;
        assert!(out.is_warning());
        let out = bench.line("\t5\t61\t+1\tJUNK").output;
        assert!(out.is_warning());

        // Scale factors use the second modifier.
        let out = bench.line("\tDEC\t3\tB-2\tE0").output;
        assert!(out.diagnostic.is_none());
        let out = bench.line("\tDEC\t3\tB-2\tE0\tMORE").output;
        assert!(out.is_warning());

        let out = bench.line("\tTC\t4000\t+1").output;
        assert!(out.diagnostic.is_none());
    }

    #[test]
    fn space_indented_fake_label_is_dropped() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let res = bench.line("  FAKE\tTC\t4000");
        assert!(res.output.diagnostic.is_none());
        assert_eq!(res.input.fields.operator, "TC");
        assert_eq!(res.input.fields.operand, "4000");
        assert_eq!(res.output.words(), &[0o4000]);

        // Tab indentation goes straight to the operator.
        let res = bench.line("\tTC\t4000");
        assert_eq!(res.input.fields.operator, "TC");

        // Alone on the line, the fake label leaves nothing to assemble.
        let res = bench.line("  FAKE");
        assert_eq!(res.input.fields.operator, "");
        assert_eq!(res.output.num_words, 0);

        // False labels keep their own rule.
        let res = bench.line("  +2\tTC\t4000");
        assert_eq!(res.input.fields.false_label, "+2");
        assert_eq!(res.input.fields.operator, "TC");
    }

    #[test]
    fn double_instruction_borrow_correction() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.line("\tEXTEND");
        assert_eq!(bench.word("\tDCA\t7777"), 0o37777);
        bench.line("\tEXTEND");
        assert_eq!(bench.word("\tDCA\t100"), 0o30101);
        assert_eq!(bench.word("\tDXCH\t100"), 0o52101);
    }

    #[test]
    fn transforms_apply_after_offset() {
        let table = StaticTable::new(
            [Instruction::new("FLIP", OpClass::Basic, block2::parse_any)
                .opcode(0o10000)
                .transform(1, 0o77777)],
            Vec::<InterpretiveOp>::new(),
        );
        let symbols = SymbolTable::new();
        let usage = BankUsage::new();
        let mut state = LineState::initial();
        state.pc = Address::unbanked(0o4000);
        let res = Resolver::new(&table, &symbols, &usage)
            .line(&mut state, &lexer::split_line("\tFLIP\t5"));
        assert_eq!(res.output.words(), &[complement(0o10006)]);
    }

    #[test]
    fn extracode_needs_extend() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let out = bench.line("\tMP\t100").output;
        assert!(out.is_warning());
        bench.line("\tEXTEND");
        assert!(bench.state.extend);
        bench.line("\tINDEX\t100");
        assert!(bench.state.extend);
        assert!(bench.state.index_valid);
        let out = bench.line("\tMP\t101").output;
        assert!(out.diagnostic.is_none());
        assert!(!bench.state.extend);
    }

    #[test]
    fn ebank_one_shot_consumed_by_bbcon() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.define("TARGET", Address::fixed(0o12, 0o2000, false));
        let before = bench.state.ebank.current;

        let out = bench.line("\tEBANK=\t5").output;
        assert!(out.ebank.one_shot_pending);
        assert_eq!(out.ebank.current, Address::erasable(5, 0o1400));

        let out = bench.line("\tBBCON\tTARGET").output;
        assert_eq!(out.words(), &[(0o12 << 10) | 0o100 | 5]);
        assert!(!out.ebank.one_shot_pending);
        assert_eq!(out.ebank.current, before);
    }

    #[test]
    fn ebank_switch_made_permanent() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.line("\tEBANK=\t5");
        bench.line("\tTC\t4000");
        assert!(!bench.state.ebank.one_shot_pending);
        assert_eq!(bench.state.ebank.current, Address::erasable(5, 0o1400));
    }

    #[test]
    fn sbank_one_shot_selects_superbank_bits() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        bench.define("LOW", Address::fixed(0o12, 0o2000, false));
        bench.line("\tSBANK=\tLOWSUPER");
        let out = bench.line("\t2CADR\tLOW").output;
        assert_eq!(out.words(), &[0o12 << 10, (0o12 << 10) | 0o60]);
        // Reverted to the initial SB=1 register.
        assert!(bench.state.sbank.current.is_superbank());
    }

    #[test]
    fn stadr_inverts_next_word() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        assert_eq!(bench.word("\tSTADR"), complement(0o151));
        assert_eq!(bench.state.stadr_invert, 1);
        assert_eq!(bench.word("\tTC\t4000"), complement(0o4000));
        assert_eq!(bench.word("\tTC\t4000"), 0o4000);
    }

    #[test]
    fn noop_matches_its_expansion() {
        let mut fixed = Bench::at(Address::unbanked(0o4010));
        let noop = fixed.line("\tNOOP");
        assert_eq!(noop.input.fields.alias.as_deref(), Some("NOOP"));
        let mut fixed = Bench::at(Address::unbanked(0o4010));
        assert_eq!(noop.output.words(), &[fixed.word("\tTCF\t+1")]);
        assert_eq!(noop.output.words(), &[0o14011]);

        let mut erasable = Bench::at(Address::unbanked(0o100));
        let noop = erasable.word("\tNOOP");
        let mut erasable = Bench::at(Address::unbanked(0o100));
        assert_eq!(noop, erasable.word("\tCA\tA"));

        let mut fixed = Bench::at(Address::unbanked(0o4010));
        assert!(fixed.line("\tNOOP\tX").output.is_warning());
    }

    #[test]
    fn false_labels() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let res = bench.line("\t+2\tTC\t4000");
        assert_eq!(res.input.fields.false_label, "+2");
        assert_eq!(res.input.fields.operator, "TC");
        let res = bench.line("\t+3");
        assert_eq!(res.input.fields.operator, "");
        assert_eq!(res.input.fields.operand, "+3");
        assert_eq!(res.output.num_words, 0);
    }

    #[test]
    fn overflow_warns_once() {
        let mut bench = Bench::at(Address::fixed(0o5, 0o3777, false));
        let out = bench.line("\tTC\t4000").output;
        assert!(out.is_warning());
        assert_eq!(
            out.diagnostic.unwrap().message,
            "Next code may overflow storage."
        );
        let out = bench.line("\tTC\t4000").output;
        assert!(out.diagnostic.is_none());
    }

    #[test]
    fn unresolved_reference_is_placeholder_until_emitting() {
        let mut bench = Bench::at(Address::unbanked(0o4000));
        let out = bench.line("\tTC\tLATER").output;
        assert_eq!(out.words(), &[ILLEGAL_SYMBOL_VALUE]);
        assert!(out.diagnostic.is_none());

        let mut state = LineState::initial();
        state.pc = Address::unbanked(0o4000);
        let out = Resolver::new(&bench.table, &bench.symbols, &bench.usage)
            .emitting(true)
            .line(&mut state, &lexer::split_line("\tTC\tLATER"))
            .output;
        assert!(out.is_fatal());
    }
}
