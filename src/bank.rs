use crate::address::Address;

/// A bank register whose updates may be one-shot.
///
/// `EBANK=` and `SBANK=` move `current` and leave the old value in `last`
/// with `one_shot_pending` set. If the very next instruction is a
/// bank-consuming constant (`BBCON`, `2CADR`) it uses the new bank and the
/// register then falls back to `last`; any other instruction makes the
/// switch permanent by clearing the pending flag.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BankRegister {
    pub one_shot_pending: bool,
    pub current: Address,
    pub last: Address,
}

impl BankRegister {
    pub fn new(addr: Address) -> Self {
        BankRegister {
            one_shot_pending: false,
            current: addr,
            last: addr,
        }
    }

    pub fn switch_to(&mut self, addr: Address) {
        self.last = self.current;
        self.current = addr;
        self.one_shot_pending = true;
    }

    /// Fall back to the bank in force before the pending switch.
    pub fn consume_one_shot(&mut self) {
        self.current = self.last;
    }

    pub fn clear_pending(&mut self) {
        self.one_shot_pending = false;
    }

    pub fn trace(&self) -> String {
        format!(
            "|{}{}{}",
            self.one_shot_pending as u8,
            self.current.trace(),
            self.last.trace()
        )
    }
}
