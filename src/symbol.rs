use std::{
    fmt,
    io::{self, Write},
};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::address::Address;

pub type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Operators whose label names a data cell rather than a code location.
const EMBEDDED_CONSTANTS: [&str; 6] = ["ERASE", "DEC", "DEC*", "2DEC", "2DEC*", "OCT"];

pub fn is_embedded_constant(operator: &str) -> bool {
    EMBEDDED_CONSTANTS.contains(&operator)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SymbolKind {
    Label,
    Variable,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Label => f.pad("label"),
            SymbolKind::Variable => f.pad("variable"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Symbol {
    pub value: Address,
    pub kind: SymbolKind,
    pub file: String,
    pub line: usize,
    /// Pass that last bound this symbol.
    pass: usize,
}

/// A name bound a second time in the same pass.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Redefinition {
    pub name: String,
    pub file: String,
    pub line: usize,
}

impl fmt::Display for Redefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Symbol \"{}\" already defined at {}:{}.",
            self.name, self.file, self.line
        )
    }
}

/// Symbol table of name -> address, kept across passes.
///
/// Each pass may rebind a name once; values from earlier passes are
/// overwritten as forward references settle.
#[derive(Clone, Default, Debug)]
pub struct SymbolTable {
    symbols: FxMap<String, Symbol>,
    pass: usize,
    changed: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn begin_pass(&mut self) {
        self.pass += 1;
        self.changed = false;
    }

    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn define(
        &mut self,
        name: &str,
        value: Address,
        kind: SymbolKind,
        file: &str,
        line: usize,
    ) -> Result<(), Redefinition> {
        let pass = self.pass;
        match self.symbols.get_mut(name) {
            Some(sym) if sym.pass == pass => Err(Redefinition {
                name: name.to_string(),
                file: sym.file.clone(),
                line: sym.line,
            }),
            Some(sym) => {
                if sym.value != value || sym.kind != kind {
                    self.changed = true;
                }
                *sym = Symbol {
                    value,
                    kind,
                    file: file.to_string(),
                    line,
                    pass,
                };
                Ok(())
            }
            None => {
                self.symbols.insert(
                    name.to_string(),
                    Symbol {
                        value,
                        kind,
                        file: file.to_string(),
                        line,
                        pass,
                    },
                );
                self.changed = true;
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Value of `name` if it is bound to something meaningful.
    pub fn lookup(&self, name: &str) -> Option<Address> {
        self.get(name).map(|sym| sym.value).filter(Address::is_valid)
    }

    /// Whether any binding was added or moved during the current pass.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.symbols.iter()
    }

    /// Dump sorted by name.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut names: Vec<&String> = self.symbols.keys().collect();
        names.sort();
        for name in names {
            let sym = &self.symbols[name.as_str()];
            writeln!(
                out,
                "{:<10} {:>7}  {:<8} {}:{}",
                name, sym.value, sym.kind, sym.file, sym.line
            )?;
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LineRecord {
    pub address: Address,
    pub file: String,
    pub line: usize,
}

/// Address -> source line records for every committed word, used for
/// symbolic debugging.
#[derive(Clone, Default, Debug)]
pub struct LineTable {
    records: Vec<LineRecord>,
}

impl LineTable {
    pub fn new() -> Self {
        LineTable::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn add(&mut self, address: Address, file: &str, line: usize) {
        self.records.push(LineRecord {
            address,
            file: file.to_string(),
            line,
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    /// Records ordered by address, one per address.
    pub fn sorted(&self) -> Vec<LineRecord> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|rec| rec.address.value);
        sorted.dedup_by_key(|rec| rec.address.value);
        sorted
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for rec in self.sorted() {
            writeln!(out, "{:>7}  {}:{}", rec.address, rec.file, rec.line)?;
        }
        Ok(())
    }
}
