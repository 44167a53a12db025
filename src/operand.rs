use std::fmt;

use crate::{address::Address, symbol::SymbolTable};

/// Central and special registers every program may name without defining.
const REGISTERS: [(&str, u16); 8] = [
    ("A", 0o0),
    ("L", 0o1),
    ("Q", 0o2),
    ("EB", 0o3),
    ("FB", 0o4),
    ("Z", 0o5),
    ("BB", 0o6),
    ("ZERO", 0o7),
];

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum OperandError {
    Undefined(String),
    BadModifier(String),
    BadNumber(String),
}

impl fmt::Display for OperandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandError::Undefined(name) => write!(f, "Symbol \"{name}\" undefined."),
            OperandError::BadModifier(m) => write!(f, "Unrecognized modifier \"{m}\"."),
            OperandError::BadNumber(n) => write!(f, "Malformed number \"{n}\"."),
        }
    }
}

/// Largest magnitude a numeral may have, the span of a double-precision pair.
pub const MAX_NUMERAL: i32 = 0o1777777777;

/// Parse an octal numeral, or a decimal one when it ends in `D`.
///
/// Anything past [`MAX_NUMERAL`] is rejected.
pub fn oct_or_dec(s: &str) -> Option<i32> {
    let (negative, body) = match s.as_bytes().first()? {
        b'+' => (false, &s[1..]),
        b'-' => (true, &s[1..]),
        _ => (false, s),
    };
    let (digits, radix) = match body.strip_suffix('D') {
        Some(digits) => (digits, 10),
        None => (body, 8),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = i32::from_str_radix(digits, radix)
        .ok()
        .filter(|v| *v <= MAX_NUMERAL)?;
    Some(if negative { -value } else { value })
}

fn is_signed(s: &str) -> bool {
    s.starts_with('+') || s.starts_with('-')
}

/// Written as a numeral, whether or not it parses as one.
fn is_numeric(s: &str) -> bool {
    if is_signed(s) {
        return true;
    }
    let digits = s.strip_suffix('D').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve an operand field and its optional numeric modifier to an address.
///
/// A signed numeral is relative to `pc`, an unsigned one is a pseudo-address,
/// anything else names a symbol or register.
pub fn evaluate(
    operand: &str,
    modifier: &str,
    pc: &Address,
    symbols: &SymbolTable,
) -> Result<Address, OperandError> {
    let base = match oct_or_dec(operand) {
        Some(n) if is_signed(operand) => pc.advance(n),
        Some(n) => Address::from_pseudo(n),
        None if is_numeric(operand) => return Err(OperandError::BadNumber(operand.to_string())),
        None => lookup(operand, symbols)?,
    };

    if modifier.is_empty() {
        return Ok(base);
    }
    let offset =
        oct_or_dec(modifier).ok_or_else(|| OperandError::BadModifier(modifier.to_string()))?;
    if base.is_address() {
        Ok(base.advance(offset))
    } else {
        let value = base
            .value
            .checked_add(offset)
            .ok_or_else(|| OperandError::BadModifier(modifier.to_string()))?;
        Ok(Address { value, ..base })
    }
}

fn lookup(name: &str, symbols: &SymbolTable) -> Result<Address, OperandError> {
    if let Some(sym) = symbols.get(name) {
        return Ok(sym.value);
    }
    REGISTERS
        .iter()
        .find(|(reg, _)| *reg == name)
        .map(|(_, sreg)| Address::unbanked(*sreg))
        .ok_or_else(|| OperandError::Undefined(name.to_string()))
}

/// Value of a numeric operand: a numeral or a symbol bound to a constant.
pub fn number(operand: &str, symbols: &SymbolTable) -> Result<i32, OperandError> {
    if let Some(n) = oct_or_dec(operand) {
        return Ok(n);
    }
    match symbols.lookup(operand) {
        Some(value) => Ok(value.value),
        None if is_numeric(operand) => Err(OperandError::BadNumber(operand.to_string())),
        None => Err(OperandError::Undefined(operand.to_string())),
    }
}

/// Split an interpretive index suffix (`,1` or `,2`) off `field`.
pub fn split_index(field: &str) -> (&str, u8) {
    if let Some(base) = field.strip_suffix(",1") {
        (base, 1)
    } else if let Some(base) = field.strip_suffix(",2") {
        (base, 2)
    } else {
        (field, 0)
    }
}
