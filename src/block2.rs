//! Built-in Block II opcode table.
//!
//! Covers the basic and extended instruction set, the common aliases, the
//! address-constant and storage pseudo-ops, downlink words, the interpretive
//! store family and a working subset of interpretive opcodes.

use crate::{
    address::{
        superbank_bits, Address, ILLEGAL_SYMBOL_VALUE, NUM_FIXED_BANKS, SWITCHED_ERASABLE,
        SWITCHED_FIXED, WORD_MASK,
    },
    line::complement,
    operand::{self, oct_or_dec},
    table::{
        BankEffect, Instruction, InterpretiveOp, OpClass, OperandKind, ParseContext, StaticTable,
    },
};

/// Largest magnitude one word can carry.
const MAX_SINGLE: i64 = 0o37777;
/// Largest magnitude a double-precision pair can carry.
const MAX_DOUBLE: i64 = 0o1777777777;

pub fn table() -> StaticTable {
    StaticTable::new(instructions(), interpretive()).numeric(parse_any)
}

fn instructions() -> Vec<Instruction> {
    use OpClass::{Basic, Downlink, Interpretive, Pseudo};

    vec![
        // Basic instructions
        Instruction::new("TC", Basic, parse_any).opcode(0o00000),
        Instruction::new("TCF", Basic, parse_fixed).opcode(0o10000),
        Instruction::new("CCS", Basic, parse_erasable).opcode(0o10000),
        Instruction::new("DAS", Basic, parse_double_erasable).opcode(0o20000),
        Instruction::new("LXCH", Basic, parse_erasable).opcode(0o22000),
        Instruction::new("INCR", Basic, parse_erasable).opcode(0o24000),
        Instruction::new("ADS", Basic, parse_erasable).opcode(0o26000),
        Instruction::new("CA", Basic, parse_any).opcode(0o30000),
        Instruction::new("CAF", Basic, parse_fixed).opcode(0o30000),
        Instruction::new("CAE", Basic, parse_erasable).opcode(0o30000),
        Instruction::new("CS", Basic, parse_any).opcode(0o40000),
        Instruction::new("INDEX", Basic, parse_index).opcode(0o50000),
        Instruction::new("DXCH", Basic, parse_double_erasable).opcode(0o52000),
        Instruction::new("TS", Basic, parse_erasable).opcode(0o54000),
        Instruction::new("XCH", Basic, parse_erasable).opcode(0o56000),
        Instruction::new("AD", Basic, parse_any).opcode(0o60000),
        Instruction::new("MASK", Basic, parse_any).opcode(0o70000),
        // Extracodes
        Instruction::new("DV", Basic, parse_extra_erasable).opcode(0o10000),
        Instruction::new("BZF", Basic, parse_extra_fixed).opcode(0o10000),
        Instruction::new("MSU", Basic, parse_extra_erasable).opcode(0o20000),
        Instruction::new("QXCH", Basic, parse_extra_erasable).opcode(0o22000),
        Instruction::new("AUG", Basic, parse_extra_erasable).opcode(0o24000),
        Instruction::new("DIM", Basic, parse_extra_erasable).opcode(0o26000),
        Instruction::new("DCA", Basic, parse_extra_double).opcode(0o30000),
        Instruction::new("DCS", Basic, parse_extra_double).opcode(0o40000),
        Instruction::new("SU", Basic, parse_extra_erasable).opcode(0o60000),
        Instruction::new("BZMF", Basic, parse_extra_fixed).opcode(0o60000),
        Instruction::new("MP", Basic, parse_extra_any).opcode(0o70000),
        // Implied-address instructions
        Instruction::new("EXTEND", Basic, parse_extend).opcode(0o00006),
        Instruction::new("INHINT", Basic, parse_no_operand).opcode(0o00004),
        Instruction::new("RELINT", Basic, parse_no_operand).opcode(0o00003),
        // Aliases
        Instruction::alias("COM", "CS", "A"),
        Instruction::alias("DOUBLE", "AD", "A"),
        Instruction::alias("RETURN", "TC", "Q"),
        Instruction::alias("XLQ", "TC", "L"),
        Instruction::alias("XXALQ", "TC", "A"),
        Instruction::alias("DDOUBL", "DAS", "A"),
        Instruction::alias("OVSK", "TS", "A"),
        Instruction::alias("TCAA", "TS", "Z"),
        Instruction::alias("ZL", "LXCH", "7"),
        Instruction::alias("ZQ", "QXCH", "7"),
        Instruction::alias("SQUARE", "MP", "A"),
        Instruction::alias("DCOM", "DCS", "A"),
        Instruction::alias("RESUME", "INDEX", "17"),
        // Accepted and ignored
        Instruction::discard("COUNT", Pseudo),
        Instruction::discard("COUNT*", Pseudo),
        Instruction::discard("SUBRO", Pseudo),
        Instruction::discard("MEMORY", Pseudo),
        // Location and storage
        Instruction::new("SETLOC", Pseudo, parse_setloc),
        Instruction::new("BANK", Pseudo, parse_bank),
        Instruction::new("ERASE", Pseudo, parse_erase),
        Instruction::new("DEC", Pseudo, parse_dec).takes_mod2(),
        Instruction::new("DEC*", Pseudo, parse_dec).takes_mod2(),
        Instruction::new("2DEC", Pseudo, parse_2dec).takes_mod2(),
        Instruction::new("2DEC*", Pseudo, parse_2dec).takes_mod2(),
        Instruction::new("OCT", Pseudo, parse_oct),
        // Symbol definition
        Instruction::new("EQUALS", Pseudo, parse_equals),
        Instruction::new("=", Pseudo, parse_equals),
        Instruction::new("CHECK=", Pseudo, parse_check_equals),
        // Bank registers
        Instruction::new("EBANK=", Pseudo, parse_ebank_equals)
            .bank_effect(BankEffect::SwitchErasable),
        Instruction::new("SBANK=", Pseudo, parse_sbank_equals)
            .bank_effect(BankEffect::SwitchFixed),
        // Address constants
        Instruction::new("BBCON", Pseudo, parse_bbcon).bank_effect(BankEffect::Consume),
        Instruction::new("2CADR", Pseudo, parse_2cadr).bank_effect(BankEffect::Consume),
        Instruction::new("2BCADR", Pseudo, parse_2cadr).bank_effect(BankEffect::Consume),
        Instruction::new("CADR", Pseudo, parse_cadr),
        Instruction::new("FCADR", Pseudo, parse_fcadr),
        Instruction::new("GENADR", Pseudo, parse_genadr),
        Instruction::new("ADRES", Pseudo, parse_genadr),
        Instruction::new("ECADR", Pseudo, parse_ecadr),
        // Downlink lists
        Instruction::new("1DNADR", Downlink, parse_dnadr).opcode(0o00000),
        Instruction::new("2DNADR", Downlink, parse_dnadr).opcode(0o04000),
        Instruction::new("3DNADR", Downlink, parse_dnadr).opcode(0o10000),
        Instruction::new("4DNADR", Downlink, parse_dnadr).opcode(0o14000),
        Instruction::new("5DNADR", Downlink, parse_dnadr).opcode(0o20000),
        Instruction::new("6DNADR", Downlink, parse_dnadr).opcode(0o24000),
        // Interpretive stores
        Instruction::new("STORE", Interpretive, parse_store)
            .opcode(0o00000)
            .pinch_hit(),
        Instruction::new("STODL", Interpretive, parse_store)
            .opcode(0o14000)
            .pinch_hit(),
        Instruction::new("STOVL", Interpretive, parse_store)
            .opcode(0o30000)
            .pinch_hit(),
        Instruction::new("STCALL", Interpretive, parse_store)
            .opcode(0o44000)
            .pinch_hit(),
    ]
}

fn interpretive() -> Vec<InterpretiveOp> {
    use OperandKind::{Address, Shift, Switch};

    vec![
        InterpretiveOp::new("EXIT", 0o000),
        InterpretiveOp::new("SQRT", 0o012),
        InterpretiveOp::new("SIN", 0o022),
        InterpretiveOp::new("COS", 0o026),
        InterpretiveOp::new("ABS", 0o130),
        InterpretiveOp::new("STADR", 0o150),
        InterpretiveOp::new("VLOAD", 0o001).operand(Address),
        InterpretiveOp::new("DLOAD", 0o060).operand(Address),
        InterpretiveOp::new("DAD", 0o070).operand(Address),
        InterpretiveOp::new("DSU", 0o074).operand(Address),
        InterpretiveOp::new("DMP", 0o104).operand(Address),
        InterpretiveOp::new("DDV", 0o110).operand(Address),
        InterpretiveOp::new("BDSU", 0o114).operand(Address),
        InterpretiveOp::new("BDDV", 0o120).operand(Address),
        InterpretiveOp::new("GOTO", 0o126).operand(Address),
        InterpretiveOp::new("CALL", 0o064).operand(Address),
        InterpretiveOp::new("RTB", 0o152).operand(Address),
        InterpretiveOp::new("BZE", 0o072).operand(Address),
        InterpretiveOp::new("BPL", 0o076).operand(Address),
        InterpretiveOp::new("BOV", 0o174).operand(Address),
        InterpretiveOp::new("AXT,1", 0o002).operand(Address),
        InterpretiveOp::new("AXT,2", 0o003).operand(Address),
        InterpretiveOp::new("SETPD", 0o175).operand(Address),
        InterpretiveOp::new("SL", 0o115).operand(Shift),
        InterpretiveOp::new("SR", 0o135).operand(Shift),
        InterpretiveOp::new("SET", 0o065).operand(Switch).nnnn(0o0400),
        InterpretiveOp::new("CLEAR", 0o065).operand(Switch).nnnn(0o0600),
        InterpretiveOp::new("BON", 0o065)
            .operand(Switch)
            .operand(Address)
            .nnnn(0o0100),
        InterpretiveOp::new("BOFF", 0o065)
            .operand(Switch)
            .operand(Address)
            .nnnn(0o0300),
    ]
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Memory {
    Any,
    Erasable,
    Fixed,
}

/// Address field of a basic instruction: ten bits for erasable-only
/// operations, twelve otherwise.
fn address_field(ctx: &mut ParseContext<'_>, memory: Memory) -> Option<i32> {
    let addr = ctx.address()?;
    match memory {
        Memory::Erasable if !addr.is_erasable() && !addr.is_constant() => {
            ctx.output.fatal("Erasable-memory address required.");
        }
        Memory::Fixed if !addr.is_fixed() && !addr.is_constant() => {
            ctx.output.fatal("Fixed-memory address required.");
        }
        _ => {}
    }
    let field = addr.sreg().map_or(addr.value, i32::from);
    Some(match memory {
        Memory::Erasable => field & 0o1777,
        Memory::Any | Memory::Fixed => field & 0o7777,
    })
}

fn general(ctx: &mut ParseContext<'_>, memory: Memory) {
    let word = match address_field(ctx, memory) {
        Some(field) => ctx.opcode + field,
        None => ILLEGAL_SYMBOL_VALUE,
    };
    ctx.emit(&[word]);
}

fn require_extend(ctx: &mut ParseContext<'_>) {
    if !ctx.input.extend {
        ctx.output.warn("Extracode without preceding EXTEND.");
    }
}

/// Opcode plus a twelve-bit address anywhere in memory. Also used for bare
/// numeric operators.
pub fn parse_any(ctx: &mut ParseContext<'_>) {
    general(ctx, Memory::Any);
}

fn parse_fixed(ctx: &mut ParseContext<'_>) {
    general(ctx, Memory::Fixed);
}

fn parse_erasable(ctx: &mut ParseContext<'_>) {
    general(ctx, Memory::Erasable);
}

// Double-precision instructions address the lower word of the pair.
fn parse_double_erasable(ctx: &mut ParseContext<'_>) {
    general(ctx, Memory::Erasable);
    ctx.output.opcode_offset = 1;
}

fn parse_extra_any(ctx: &mut ParseContext<'_>) {
    require_extend(ctx);
    general(ctx, Memory::Any);
}

fn parse_extra_erasable(ctx: &mut ParseContext<'_>) {
    require_extend(ctx);
    general(ctx, Memory::Erasable);
}

fn parse_extra_fixed(ctx: &mut ParseContext<'_>) {
    require_extend(ctx);
    general(ctx, Memory::Fixed);
}

fn parse_extra_double(ctx: &mut ParseContext<'_>) {
    require_extend(ctx);
    general(ctx, Memory::Any);
    ctx.output.opcode_offset = 1;
}

fn parse_no_operand(ctx: &mut ParseContext<'_>) {
    if !ctx.operand().is_empty() {
        ctx.output.warn("Extra fields in line.");
    }
    let opcode = ctx.opcode;
    ctx.emit(&[opcode]);
}

fn parse_extend(ctx: &mut ParseContext<'_>) {
    parse_no_operand(ctx);
    ctx.output.extend = true;
}

/// `INDEX` leaves a pending `EXTEND` in force for the instruction after it.
fn parse_index(ctx: &mut ParseContext<'_>) {
    general(ctx, Memory::Erasable);
    ctx.output.extend = ctx.input.extend;
    ctx.output.index_valid = true;
    ctx.output.index = ctx.output.words[0];
}

fn parse_setloc(ctx: &mut ParseContext<'_>) {
    ctx.hold();
    ctx.output.pc = match ctx.address() {
        Some(addr) if addr.is_address() => addr,
        Some(_) => {
            ctx.output.fatal("SETLOC needs a memory address.");
            Address::invalid()
        }
        None => Address::invalid(),
    };
}

/// Resume a fixed bank where it was left off.
fn parse_bank(ctx: &mut ParseContext<'_>) {
    ctx.hold();
    let operand = ctx.operand();
    let bank = if operand.is_empty() {
        match ctx.input.pc.image_bank() {
            Some(bank) => bank,
            None => {
                ctx.output.fatal("BANK without a number outside fixed memory.");
                return;
            }
        }
    } else {
        match oct_or_dec(operand) {
            Some(n) if (0..NUM_FIXED_BANKS as i32).contains(&n) => n as usize,
            _ => {
                ctx.output.fatal(format!("Illegal bank number \"{operand}\"."));
                return;
            }
        }
    };
    let (fb, superbank) = if bank >= 0o40 {
        (bank - 0o10, true)
    } else {
        (bank, false)
    };
    let used = ctx.bank_usage.used(bank) as i32;
    ctx.output.pc = Address::fixed(fb as u8, SWITCHED_FIXED, superbank).advance(used);
}

/// `ERASE` reserves one word, `ERASE n` reserves n+1.
fn parse_erase(ctx: &mut ParseContext<'_>) {
    ctx.hold();
    let operand = ctx.operand();
    let count = if operand.is_empty() {
        1
    } else {
        match oct_or_dec(operand) {
            Some(n) if n >= 0 => n + 1,
            _ => {
                ctx.output.fatal(format!("Illegal ERASE size \"{operand}\"."));
                return;
            }
        }
    };
    ctx.output.pc = ctx.input.pc.advance(count);
}

/// A decimal constant as a magnitude scaled to `fraction_bits` and a sign.
///
/// Integers are taken as-is; anything with a decimal point, or scaled with a
/// `Bn` or `En` modifier, is a fraction.
fn decimal(ctx: &mut ParseContext<'_>, fraction_bits: i32) -> Option<(i64, bool)> {
    let input = ctx.input;
    let text = input.fields.operand.as_str();
    if text.is_empty() {
        ctx.output.fatal("Missing operand.");
        return None;
    }
    let Some(mut value) = text.parse::<f64>().ok().filter(|v| v.is_finite()) else {
        ctx.output.fatal(format!("Malformed decimal constant \"{text}\"."));
        return None;
    };
    let mut fraction = text.contains('.');
    for modifier in [&input.fields.mod1, &input.fields.mod2] {
        if modifier.is_empty() {
            continue;
        }
        let scale = if let Some(exp) = modifier.strip_prefix('B') {
            exp.parse::<i32>().ok().map(|e| 2f64.powi(e))
        } else if let Some(exp) = modifier.strip_prefix('E') {
            exp.parse::<i32>().ok().map(|e| 10f64.powi(e))
        } else {
            None
        };
        match scale {
            Some(scale) => {
                value *= scale;
                fraction = true;
            }
            None => {
                ctx.output.fatal(format!("Unrecognized scale factor \"{modifier}\"."));
                return None;
            }
        }
    }
    let negative = value.is_sign_negative();
    let magnitude = if fraction {
        (value.abs() * 2f64.powi(fraction_bits)).round() as i64
    } else {
        value.abs() as i64
    };
    Some((magnitude, negative))
}

fn parse_dec(ctx: &mut ParseContext<'_>) {
    let word = match decimal(ctx, 14) {
        Some((magnitude, _)) if magnitude > MAX_SINGLE => {
            ctx.output.fatal("Decimal constant out of range.");
            ILLEGAL_SYMBOL_VALUE
        }
        Some((magnitude, negative)) => {
            let word = magnitude as i32;
            if negative {
                complement(word)
            } else {
                word
            }
        }
        None => ILLEGAL_SYMBOL_VALUE,
    };
    ctx.emit(&[word]);
}

fn parse_2dec(ctx: &mut ParseContext<'_>) {
    let words = match decimal(ctx, 28) {
        Some((magnitude, _)) if magnitude > MAX_DOUBLE => {
            ctx.output.fatal("Decimal constant out of range.");
            [ILLEGAL_SYMBOL_VALUE; 2]
        }
        Some((magnitude, negative)) => {
            let high = (magnitude >> 14) as i32;
            let low = (magnitude & MAX_SINGLE) as i32;
            if negative {
                [complement(high), complement(low)]
            } else {
                [high, low]
            }
        }
        None => [ILLEGAL_SYMBOL_VALUE; 2],
    };
    ctx.emit(&words);
}

fn parse_oct(ctx: &mut ParseContext<'_>) {
    let operand = ctx.operand();
    let (negative, digits) = match operand.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, operand.strip_prefix('+').unwrap_or(operand)),
    };
    let word = match i32::from_str_radix(digits, 8) {
        Ok(value) if value <= WORD_MASK && !digits.starts_with('+') => {
            if negative {
                complement(value)
            } else {
                value
            }
        }
        _ => {
            ctx.output.fatal(format!("Illegal octal constant \"{operand}\"."));
            ILLEGAL_SYMBOL_VALUE
        }
    };
    ctx.emit(&[word]);
}

/// `EQUALS` binds the label itself; with no operand it names the current location.
fn parse_equals(ctx: &mut ParseContext<'_>) {
    ctx.hold();
    ctx.output.equals = true;
    ctx.output.label_value = if ctx.operand().is_empty() {
        Some(ctx.input.pc)
    } else {
        ctx.address()
    };
}

fn parse_check_equals(ctx: &mut ParseContext<'_>) {
    ctx.hold();
    let value = ctx.address();
    ctx.output.label_value = value;
    let label = ctx.input.fields.label.as_str();
    if label.is_empty() || !ctx.emitting {
        return;
    }
    if let Some(value) = value {
        match ctx.symbols.lookup(label) {
            Some(bound) if bound.value == value.value => {}
            Some(_) => ctx
                .output
                .fatal(format!("CHECK= value of \"{label}\" does not match.")),
            None => ctx.output.fatal(format!("Symbol \"{label}\" undefined.")),
        }
    }
}

fn parse_ebank_equals(ctx: &mut ParseContext<'_>) {
    ctx.hold();
    let operand = ctx.operand();
    let bank = match oct_or_dec(operand) {
        Some(n) if (0..8).contains(&n) => Some(n as u8),
        _ => match ctx.address() {
            Some(addr) => match addr.erasable_bank() {
                Some(eb) => Some(eb),
                None => {
                    ctx.output.fatal("EBANK= needs an erasable address.");
                    None
                }
            },
            None => None,
        },
    };
    let register = match bank {
        Some(eb) => Address::erasable(eb, SWITCHED_ERASABLE),
        None => Address::invalid(),
    };
    ctx.output.ebank.switch_to(register);
}

fn parse_sbank_equals(ctx: &mut ParseContext<'_>) {
    ctx.hold();
    let superbank = match ctx.operand() {
        "LOWSUPER" => Some(false),
        "UPPERSUPER" => Some(true),
        operand => match oct_or_dec(operand) {
            Some(n) if (0..NUM_FIXED_BANKS as i32).contains(&n) => Some(n >= 0o40),
            _ => ctx.address().map(|addr| {
                addr.is_superbank() || addr.image_bank().is_some_and(|bank| bank >= 0o40)
            }),
        },
    };
    if let Some(superbank) = superbank {
        ctx.output
            .sbank
            .switch_to(Address::fixed(0o30, SWITCHED_FIXED, superbank));
    }
}

/// Bank-register image of `target`: FB in bits 14-11, superbank bits, EB in bits 3-1.
fn bank_constant(ctx: &ParseContext<'_>, target: &Address) -> i32 {
    let fb = target.fixed_bank().unwrap_or(0) as i32;
    let eb = target
        .erasable_bank()
        .filter(|_| target.is_banked())
        .or_else(|| ctx.input.ebank.current.erasable_bank())
        .unwrap_or(0) as i32;
    (fb << 10) | eb | superbank_bits(&ctx.input.pc, &ctx.input.sbank.current, target)
}

/// Complete address: bank number above the ten-bit offset.
fn complete_address(target: &Address) -> i32 {
    match (target.fixed_bank(), target.sreg()) {
        (Some(fb), Some(sreg)) if target.is_banked() => ((fb as i32) << 10) | (sreg as i32 & 0o1777),
        (_, Some(sreg)) if target.is_fixed() => sreg as i32,
        _ if target.is_erasable() => target.value & 0o3777,
        _ => target.value & WORD_MASK,
    }
}

fn parse_bbcon(ctx: &mut ParseContext<'_>) {
    let word = match ctx.address() {
        Some(target) if target.is_fixed() => bank_constant(ctx, &target),
        Some(_) => {
            ctx.output.fatal("BBCON needs a fixed-memory address.");
            ILLEGAL_SYMBOL_VALUE
        }
        None => ILLEGAL_SYMBOL_VALUE,
    };
    ctx.emit(&[word]);
}

fn parse_2cadr(ctx: &mut ParseContext<'_>) {
    let words = match ctx.address() {
        Some(target) => [complete_address(&target), bank_constant(ctx, &target)],
        None => [ILLEGAL_SYMBOL_VALUE; 2],
    };
    ctx.emit(&words);
}

fn parse_cadr(ctx: &mut ParseContext<'_>) {
    let word = ctx
        .address()
        .map_or(ILLEGAL_SYMBOL_VALUE, |target| complete_address(&target));
    ctx.emit(&[word]);
}

fn parse_fcadr(ctx: &mut ParseContext<'_>) {
    let word = match ctx.address() {
        Some(target) if target.is_fixed() => complete_address(&target),
        Some(_) => {
            ctx.output.fatal("FCADR needs a fixed-memory address.");
            ILLEGAL_SYMBOL_VALUE
        }
        None => ILLEGAL_SYMBOL_VALUE,
    };
    ctx.emit(&[word]);
}

fn parse_genadr(ctx: &mut ParseContext<'_>) {
    let word = match address_field(ctx, Memory::Any) {
        Some(field) => field,
        None => ILLEGAL_SYMBOL_VALUE,
    };
    ctx.emit(&[word]);
}

fn erasable_word(ctx: &mut ParseContext<'_>, operand: &str, modifier: &str) -> Option<i32> {
    let target = ctx.evaluate(operand, modifier)?;
    if target.is_erasable() {
        Some(target.value & 0o3777)
    } else {
        ctx.output.fatal("Erasable-memory address required.");
        None
    }
}

fn parse_ecadr(ctx: &mut ParseContext<'_>) {
    let input = ctx.input;
    let word = erasable_word(ctx, &input.fields.operand, &input.fields.mod1)
        .unwrap_or(ILLEGAL_SYMBOL_VALUE);
    ctx.emit(&[word]);
}

/// Downlink list entry: word count above an erasable address.
fn parse_dnadr(ctx: &mut ParseContext<'_>) {
    let input = ctx.input;
    let word = match erasable_word(ctx, &input.fields.operand, &input.fields.mod1) {
        Some(addr) => ctx.opcode | addr,
        None => ILLEGAL_SYMBOL_VALUE,
    };
    ctx.emit(&[word]);
}

/// Interpretive store. Index register 1 or 2 selects the next two codes
/// above the base; all but plain `STORE` then want one more operand for the
/// load or call that follows the store.
fn parse_store(ctx: &mut ParseContext<'_>) {
    let input = ctx.input;
    let (operand, index) = operand::split_index(&input.fields.operand);
    let word = match erasable_word(ctx, operand, &input.fields.mod1) {
        Some(addr) => ctx.opcode + index as i32 * 0o4000 + addr,
        None => ILLEGAL_SYMBOL_VALUE,
    };
    ctx.emit(&[word]);

    if ctx.opcode != 0 && !ctx.interpretive.is_pending() {
        ctx.interpretive.clear();
        ctx.interpretive.push(OperandKind::Address, 0);
    }
}
