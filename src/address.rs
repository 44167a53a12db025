//! Locations in the AGC's split erasable/fixed address space.
//!
//! An [`Address`] is what the program counter, symbol values and bank
//! registers are made of. The S-register (`sreg`) is the 12-bit address an
//! instruction actually carries; the bank selects which physical memory the
//! switched windows map onto.

use std::fmt;

/// Word value emitted for references that could not be resolved in this pass.
pub const ILLEGAL_SYMBOL_VALUE: i32 = 0o1000000;

/// Mask for one 15-bit AGC word.
pub const WORD_MASK: i32 = 0o77777;

/// Start of the switched erasable window.
pub const SWITCHED_ERASABLE: u16 = 0o1400;
/// Start of the switched fixed window.
pub const SWITCHED_FIXED: u16 = 0o2000;
/// Start of fixed-fixed memory (banks 2 and 3, always addressable).
pub const FIXED_FIXED: u16 = 0o4000;
/// End (exclusive) of the S-register range.
pub const SREG_END: u16 = 0o10000;

pub const ERASABLE_BANK_SIZE: u16 = 0o400;
pub const FIXED_BANK_SIZE: u16 = 0o2000;
/// Number of fixed banks including the superbank extension (0-043).
pub const NUM_FIXED_BANKS: usize = 0o44;

/// Pseudo-address where fixed memory begins.
const FIXED_PSEUDO_BASE: i32 = 0o10000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Bank {
    Erasable { eb: u8 },
    Fixed { fb: u8, superbank: bool },
}

impl Bank {
    /// Physical bank number, folding the superbank bit in for banks 020 and up.
    pub fn physical(&self) -> u8 {
        match *self {
            Bank::Erasable { eb } => eb,
            Bank::Fixed { fb, superbank } if superbank && fb >= 0o20 => fb + 0o10,
            Bank::Fixed { fb, .. } => fb,
        }
    }
}

/// Which of the mutually exclusive forms an address takes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Location {
    /// No meaningful location, e.g. before the first `SETLOC`.
    Invalid,
    /// A bare number rather than a memory reference.
    Constant,
    /// A raw S-register index with the bank implied.
    Unbanked { sreg: u16 },
    Banked { bank: Bank, sreg: u16 },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Address {
    pub loc: Location,
    /// Pseudo-address (or the constant itself).
    pub value: i32,
    /// Set once an advance has wrapped around a bank boundary.
    pub overflow: bool,
}

impl Default for Address {
    fn default() -> Self {
        Address::invalid()
    }
}

impl Address {
    pub const fn invalid() -> Self {
        Address {
            loc: Location::Invalid,
            value: 0,
            overflow: false,
        }
    }

    pub fn constant(value: i32) -> Self {
        Address {
            loc: Location::Constant,
            value,
            overflow: false,
        }
    }

    pub fn unbanked(sreg: u16) -> Self {
        Address {
            loc: Location::Unbanked { sreg },
            value: sreg as i32,
            overflow: false,
        }
    }

    pub fn erasable(eb: u8, sreg: u16) -> Self {
        let value = eb as i32 * ERASABLE_BANK_SIZE as i32 + (sreg % ERASABLE_BANK_SIZE) as i32;
        Address {
            loc: Location::Banked {
                bank: Bank::Erasable { eb },
                sreg,
            },
            value,
            overflow: false,
        }
    }

    pub fn fixed(fb: u8, sreg: u16, superbank: bool) -> Self {
        let bank = Bank::Fixed { fb, superbank };
        let value = FIXED_PSEUDO_BASE
            + bank.physical() as i32 * FIXED_BANK_SIZE as i32
            + (sreg % FIXED_BANK_SIZE) as i32;
        Address {
            loc: Location::Banked { bank, sreg },
            value,
            overflow: false,
        }
    }

    /// Convert a pseudo-address (the flat numbering used in operands) into
    /// its banked form.
    pub fn from_pseudo(value: i32) -> Self {
        match value {
            0..=0o1377 => Address::unbanked(value as u16),
            0o1400..=0o3777 => {
                let eb = (value / ERASABLE_BANK_SIZE as i32) as u8;
                let offs = (value % ERASABLE_BANK_SIZE as i32) as u16;
                Address::erasable(eb, SWITCHED_ERASABLE + offs)
            }
            0o4000..=0o7777 => Address::unbanked(value as u16),
            0o10000..=0o117777 => {
                let bank = (value - FIXED_PSEUDO_BASE) / FIXED_BANK_SIZE as i32;
                let offs = ((value - FIXED_PSEUDO_BASE) % FIXED_BANK_SIZE as i32) as u16;
                if bank >= 0o40 {
                    Address::fixed((bank - 0o10) as u8, SWITCHED_FIXED + offs, true)
                } else {
                    Address::fixed(bank as u8, SWITCHED_FIXED + offs, false)
                }
            }
            _ => Address::constant(value),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.loc != Location::Invalid
    }

    pub fn is_constant(&self) -> bool {
        self.loc == Location::Constant
    }

    /// True for the two forms that name a memory cell.
    pub fn is_address(&self) -> bool {
        matches!(self.loc, Location::Unbanked { .. } | Location::Banked { .. })
    }

    pub fn is_erasable(&self) -> bool {
        match self.loc {
            Location::Unbanked { sreg } => sreg < SWITCHED_FIXED,
            Location::Banked { bank, .. } => matches!(bank, Bank::Erasable { .. }),
            _ => false,
        }
    }

    pub fn is_fixed(&self) -> bool {
        match self.loc {
            Location::Unbanked { sreg } => sreg >= SWITCHED_FIXED,
            Location::Banked { bank, .. } => matches!(bank, Bank::Fixed { .. }),
            _ => false,
        }
    }

    pub fn is_banked(&self) -> bool {
        matches!(self.loc, Location::Banked { .. })
    }

    pub fn is_superbank(&self) -> bool {
        matches!(
            self.loc,
            Location::Banked {
                bank: Bank::Fixed {
                    superbank: true,
                    ..
                },
                ..
            }
        )
    }

    pub fn sreg(&self) -> Option<u16> {
        match self.loc {
            Location::Unbanked { sreg } | Location::Banked { sreg, .. } => Some(sreg),
            _ => None,
        }
    }

    /// Fixed bank number as written in the FB register (superbank bit not folded in).
    pub fn fixed_bank(&self) -> Option<u8> {
        match self.loc {
            Location::Banked {
                bank: Bank::Fixed { fb, .. },
                ..
            } => Some(fb),
            Location::Unbanked { sreg } if sreg >= SWITCHED_FIXED => {
                Some((sreg / FIXED_BANK_SIZE) as u8)
            }
            _ => None,
        }
    }

    pub fn erasable_bank(&self) -> Option<u8> {
        match self.loc {
            Location::Banked {
                bank: Bank::Erasable { eb },
                ..
            } => Some(eb),
            Location::Unbanked { sreg } if sreg < SWITCHED_FIXED => {
                Some((sreg / ERASABLE_BANK_SIZE) as u8)
            }
            _ => None,
        }
    }

    /// Index into the object image for a location in fixed memory.
    pub fn image_bank(&self) -> Option<usize> {
        match self.loc {
            Location::Banked {
                bank: bank @ Bank::Fixed { .. },
                ..
            } => Some(bank.physical() as usize),
            Location::Unbanked { sreg } if sreg >= SWITCHED_FIXED => {
                Some((sreg / FIXED_BANK_SIZE) as usize)
            }
            _ => None,
        }
    }

    /// Step `count` words forward (or backward) within the current bank.
    ///
    /// Leaving the bank wraps back into it and sets `overflow`; the tag of the
    /// address never changes.
    pub fn advance(self, count: i32) -> Address {
        let (lo, hi, rebuild): (u16, u16, fn(&Address, u16) -> Address) = match self.loc {
            Location::Invalid | Location::Constant => {
                return Address {
                    value: self.value.saturating_add(count),
                    ..self
                };
            }
            Location::Unbanked { sreg } => {
                let (lo, hi) = if sreg < SWITCHED_FIXED {
                    (0, SWITCHED_FIXED)
                } else if sreg < FIXED_FIXED {
                    (SWITCHED_FIXED, FIXED_FIXED)
                } else {
                    (FIXED_FIXED, SREG_END)
                };
                (lo, hi, |_: &Address, sreg: u16| Address::unbanked(sreg))
            }
            Location::Banked {
                bank: Bank::Erasable { .. },
                ..
            } => (SWITCHED_ERASABLE, SWITCHED_FIXED, |addr: &Address, sreg: u16| {
                Address::erasable(addr.erasable_bank().unwrap_or(0), sreg)
            }),
            Location::Banked {
                bank: Bank::Fixed { .. },
                ..
            } => (SWITCHED_FIXED, FIXED_FIXED, |addr: &Address, sreg: u16| {
                Address::fixed(
                    addr.fixed_bank().unwrap_or(0),
                    sreg,
                    addr.is_superbank(),
                )
            }),
        };

        let sreg = self.sreg().unwrap_or(lo) as i64 + count as i64;
        let wrapped = sreg < lo as i64 || sreg >= hi as i64;
        let sreg = lo as i64 + (sreg - lo as i64).rem_euclid((hi - lo) as i64);
        let mut next = rebuild(&self, sreg as u16);
        next.overflow = self.overflow || wrapped;
        next
    }

    /// Left-padded nine column field used by the listing.
    pub fn listing_field(&self) -> String {
        format!("{:>7}  ", self)
    }

    /// Flag-by-flag dump used by `YUL_TRACE`.
    pub fn trace(&self) -> String {
        let flag = |set: bool, c: char| if set { c } else { ' ' };
        let mut s = String::from("|");
        s.push(flag(!self.is_valid(), 'I'));
        s.push(flag(self.is_constant(), 'C'));
        s.push(flag(self.is_address(), 'A'));
        s.push(if self.is_erasable() {
            'E'
        } else if self.is_fixed() {
            'F'
        } else {
            ' '
        });
        s.push(flag(self.is_banked(), 'B'));
        s.push(flag(self.is_superbank(), 'S'));
        s.push(flag(self.overflow, 'O'));
        s.push_str(&format!("|SREG={:04o}|", self.sreg().unwrap_or(0)));
        match self.loc {
            Location::Banked {
                bank: Bank::Erasable { eb },
                ..
            } => s.push_str(&format!("EB={eb:03o}|")),
            Location::Banked {
                bank: Bank::Fixed { fb, .. },
                ..
            } => s.push_str(&format!("FB={fb:03o}|")),
            _ => s.push_str("      |"),
        }
        s.push_str(&format!("{:06o}|", self.value & 0o777777));
        s
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Location::Invalid => f.pad("???????"),
            Location::Constant => f.pad(&format!("{:07o}", self.value & 0o7777777)),
            Location::Unbanked { sreg } => f.pad(&format!("{sreg:04o}")),
            Location::Banked {
                bank: Bank::Erasable { eb },
                sreg,
            } => f.pad(&format!("E{eb:o},{sreg:04o}")),
            Location::Banked {
                bank: bank @ Bank::Fixed { .. },
                sreg,
            } => f.pad(&format!("{:02o},{sreg:04o}", bank.physical())),
        }
    }
}

/// Bits OR'd into a bank constant (BBCON, the second word of 2CADR) to pick
/// the superbank setting the target needs.
///
/// Depends on whether the referencing code sits in a superbank-eligible bank
/// (030-033 with SB set), the target's bank and superbank bit, and the SBANK
/// register currently in force.
pub fn superbank_bits(pc: &Address, sbank: &Address, target: &Address) -> i32 {
    const NORMAL: i32 = 0o60;
    const SUPER: i32 = 0o100;

    let referencing_super = matches!(
        pc.loc,
        Location::Banked {
            bank: Bank::Fixed { fb: 0o30..=0o33, superbank: true },
            ..
        }
    );

    match target.loc {
        Location::Banked {
            bank: Bank::Fixed { fb, superbank },
            ..
        } => {
            if referencing_super {
                // Banks 0-27 and 40-43 are reachable from here, 30-37 are not.
                if ((0o30..=0o33).contains(&fb) && !superbank) || (0o34..=0o37).contains(&fb) {
                    NORMAL
                } else {
                    SUPER
                }
            } else if ((0o30..=0o33).contains(&fb) && superbank)
                || (fb < 0o30 && sbank.is_superbank())
            {
                SUPER
            } else {
                NORMAL
            }
        }
        Location::Unbanked { sreg } if sreg >= SWITCHED_FIXED && sbank.is_superbank() => SUPER,
        _ => NORMAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_zero_is_identity() {
        for addr in [
            Address::fixed(0o5, 0o2000, false),
            Address::fixed(0o33, 0o3777, true),
            Address::erasable(0o4, 0o1500),
            Address::unbanked(0o4123),
        ] {
            assert_eq!(addr.advance(0), addr);
        }
    }

    #[test]
    fn advance_within_bank() {
        let next = Address::fixed(0o12, 0o2000, false).advance(3);
        assert_eq!(next, Address::fixed(0o12, 0o2003, false));
        assert_eq!(next.value, 0o10000 + 0o12 * 0o2000 + 3);
        assert!(!next.overflow);
    }

    #[test]
    fn advance_wraps_fixed_bank_with_overflow() {
        let next = Address::fixed(0o7, 0o3777, false).advance(1);
        assert_eq!(next.sreg(), Some(0o2000));
        assert_eq!(next.fixed_bank(), Some(0o7));
        assert!(next.overflow);
        assert!(next.is_valid());
    }

    #[test]
    fn advance_wraps_erasable_bank() {
        let next = Address::erasable(0o5, 0o1777).advance(2);
        assert_eq!(next.sreg(), Some(0o1401));
        assert_eq!(next.erasable_bank(), Some(0o5));
        assert!(next.overflow);
    }

    #[test]
    fn advance_fixed_fixed_region() {
        let next = Address::unbanked(0o7776).advance(1);
        assert_eq!(next, Address::unbanked(0o7777));
        let wrapped = next.advance(1);
        assert_eq!(wrapped.sreg(), Some(0o4000));
        assert!(wrapped.overflow);
    }

    #[test]
    fn advance_keeps_overflow_sticky() {
        let next = Address::fixed(0o7, 0o3777, false).advance(1).advance(1);
        assert!(next.overflow);
    }

    #[test]
    fn advance_invalid_stays_invalid() {
        let next = Address::invalid().advance(4);
        assert!(!next.is_valid());
        assert_eq!(next.value, 4);
    }

    #[test]
    fn advance_by_huge_counts() {
        let next = Address::fixed(0o7, 0o2000, false).advance(i32::MAX);
        assert_eq!(next.fixed_bank(), Some(0o7));
        assert!(next.overflow);
        let next = Address::unbanked(0o100).advance(i32::MIN);
        assert!(next.sreg().is_some_and(|sreg| sreg < 0o2000));
        assert!(next.overflow);
        assert_eq!(Address::constant(i32::MAX).advance(1).value, i32::MAX);
    }

    #[test]
    fn pseudo_address_conversion() {
        assert_eq!(Address::from_pseudo(0o61), Address::unbanked(0o61));
        assert_eq!(Address::from_pseudo(0o1777), Address::erasable(0o3, 0o1777));
        assert_eq!(Address::from_pseudo(0o3400), Address::erasable(0o7, 0o1400));
        assert_eq!(Address::from_pseudo(0o4000), Address::unbanked(0o4000));
        assert_eq!(Address::from_pseudo(0o22005), Address::fixed(0o5, 0o2005, false));
        assert_eq!(
            Address::from_pseudo(0o10000 + 0o41 * 0o2000),
            Address::fixed(0o31, 0o2000, true)
        );
        assert!(Address::from_pseudo(-1).is_constant());
    }

    #[test]
    fn pseudo_value_round_trips_through_constructors() {
        for pseudo in [0o100, 0o1400, 0o2377, 0o5000, 0o12000, 0o107777] {
            assert_eq!(Address::from_pseudo(pseudo).value, pseudo);
        }
    }

    #[test]
    fn listing_fields() {
        assert_eq!(Address::invalid().listing_field(), "???????  ");
        assert_eq!(Address::constant(0o17).listing_field(), "0000017  ");
        assert_eq!(Address::unbanked(0o4321).listing_field(), "   4321  ");
        assert_eq!(Address::erasable(0o3, 0o1400).listing_field(), "E3,1400  ");
        assert_eq!(Address::fixed(0o2, 0o2000, false).listing_field(), "02,2000  ");
        assert_eq!(Address::fixed(0o31, 0o2000, true).listing_field(), "41,2000  ");
    }

    #[test]
    fn image_bank_folds_superbank() {
        assert_eq!(Address::fixed(0o31, 0o2000, true).image_bank(), Some(0o41));
        assert_eq!(Address::fixed(0o31, 0o2000, false).image_bank(), Some(0o31));
        assert_eq!(Address::unbanked(0o6000).image_bank(), Some(3));
        assert_eq!(Address::erasable(1, 0o1400).image_bank(), None);
    }

    fn super_pc() -> Address {
        Address::fixed(0o30, 0o2000, true)
    }

    fn plain_pc() -> Address {
        Address::fixed(0o27, 0o2000, false)
    }

    #[test]
    fn superbank_from_superbank_code() {
        let sb = Address::fixed(0o30, 0o2000, false);
        let cases = [
            (0o27, false, 0o100),
            (0o30, false, 0o60),
            (0o33, false, 0o60),
            (0o30, true, 0o100),
            (0o33, true, 0o100),
            (0o34, false, 0o60),
            (0o37, false, 0o60),
        ];
        for (fb, sup, expected) in cases {
            let target = Address::fixed(fb, 0o2000, sup);
            assert_eq!(
                superbank_bits(&super_pc(), &sb, &target),
                expected,
                "target bank {fb:o} super {sup}"
            );
        }
        // Bank 040 is bank 030 with the superbank bit
        let b40 = Address::from_pseudo(0o10000 + 0o40 * 0o2000);
        assert_eq!(superbank_bits(&super_pc(), &sb, &b40), 0o100);
    }

    #[test]
    fn superbank_from_ordinary_code() {
        let sb_low = Address::fixed(0o30, 0o2000, false);
        let sb_high = Address::fixed(0o30, 0o2000, true);
        let cases = [
            (0o27, false, false, 0o60),
            (0o27, false, true, 0o100),
            (0o30, false, true, 0o60),
            (0o30, true, false, 0o100),
            (0o33, true, false, 0o100),
            (0o34, false, true, 0o60),
            (0o37, false, true, 0o60),
        ];
        for (fb, sup, sb_super, expected) in cases {
            let target = Address::fixed(fb, 0o2000, sup);
            let sb = if sb_super { &sb_high } else { &sb_low };
            assert_eq!(
                superbank_bits(&plain_pc(), sb, &target),
                expected,
                "target bank {fb:o} super {sup} sb {sb_super}"
            );
        }
        // Bank 033 without SB still counts as ordinary code
        let pc = Address::fixed(0o33, 0o2000, false);
        let target = Address::fixed(0o31, 0o2000, true);
        assert_eq!(superbank_bits(&pc, &sb_low, &target), 0o100);
    }

    #[test]
    fn superbank_unbanked_and_erasable_targets() {
        let sb_high = Address::fixed(0o30, 0o2000, true);
        let sb_low = Address::fixed(0o30, 0o2000, false);
        assert_eq!(
            superbank_bits(&plain_pc(), &sb_high, &Address::unbanked(0o4000)),
            0o100
        );
        assert_eq!(
            superbank_bits(&plain_pc(), &sb_low, &Address::unbanked(0o4000)),
            0o60
        );
        assert_eq!(
            superbank_bits(&super_pc(), &sb_high, &Address::erasable(3, 0o1400)),
            0o60
        );
    }
}
