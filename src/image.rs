use std::io::{self, Write};

use crate::address::{Address, FIXED_BANK_SIZE, NUM_FIXED_BANKS};

const BANK_WORDS: usize = FIXED_BANK_SIZE as usize;

/// Order banks appear in the rope binary: fixed-fixed first.
pub fn binary_bank_order() -> impl Iterator<Item = usize> {
    [2, 3, 0, 1].into_iter().chain(4..NUM_FIXED_BANKS)
}

/// Fixed-memory contents, one 02000-word array per physical bank.
#[derive(Clone, Debug)]
pub struct ObjectImage {
    banks: Vec<[u16; BANK_WORDS]>,
}

impl Default for ObjectImage {
    fn default() -> Self {
        ObjectImage {
            banks: vec![[0; BANK_WORDS]; NUM_FIXED_BANKS],
        }
    }
}

impl ObjectImage {
    pub fn new() -> Self {
        ObjectImage::default()
    }

    pub fn clear(&mut self) {
        for bank in self.banks.iter_mut() {
            bank.fill(0);
        }
    }

    pub fn is_clear(&self) -> bool {
        self.banks.iter().all(|bank| bank.iter().all(|w| *w == 0))
    }

    /// Store `words` starting at `pc`. Returns false if `pc` is not in
    /// fixed memory.
    pub fn write(&mut self, pc: &Address, words: &[i32]) -> bool {
        let (Some(bank), Some(sreg)) = (pc.image_bank(), pc.sreg()) else {
            return false;
        };
        if bank >= NUM_FIXED_BANKS {
            return false;
        }
        for (i, word) in words.iter().enumerate() {
            let offset = (sreg as usize + i) % BANK_WORDS;
            self.banks[bank][offset] = (*word & 0o77777) as u16;
        }
        true
    }

    pub fn get(&self, bank: usize, offset: usize) -> Option<u16> {
        self.banks.get(bank)?.get(offset).copied()
    }

    /// Serialize every bank as big-endian words shifted left one bit.
    pub fn write_binary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for bank in binary_bank_order() {
            let bytes: Vec<u8> = self.banks[bank]
                .iter()
                .flat_map(|word| (word << 1).to_be_bytes())
                .collect();
            out.write_all(&bytes)?;
        }
        Ok(())
    }
}

/// Per-bank high-water mark of the program counter.
#[derive(Clone, Debug)]
pub struct BankUsage {
    used: [u16; NUM_FIXED_BANKS],
}

impl Default for BankUsage {
    fn default() -> Self {
        BankUsage {
            used: [0; NUM_FIXED_BANKS],
        }
    }
}

impl BankUsage {
    pub fn new() -> Self {
        BankUsage::default()
    }

    pub fn clear(&mut self) {
        self.used = [0; NUM_FIXED_BANKS];
    }

    /// Record `pc` (the address after a line) in its fixed bank.
    pub fn update(&mut self, pc: &Address) {
        let (Some(bank), Some(sreg)) = (pc.image_bank(), pc.sreg()) else {
            return;
        };
        if bank >= NUM_FIXED_BANKS {
            return;
        }
        // A wrapped counter means the bank filled up.
        let offset = if pc.overflow {
            FIXED_BANK_SIZE
        } else {
            sreg % FIXED_BANK_SIZE
        };
        self.used[bank] = self.used[bank].max(offset);
    }

    /// Words used so far in `bank`.
    pub fn used(&self, bank: usize) -> u16 {
        self.used.get(bank).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.used
            .iter()
            .enumerate()
            .filter(|(_, used)| **used > 0)
            .map(|(bank, used)| (bank, *used))
    }
}
