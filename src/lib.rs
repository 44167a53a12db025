// Addressing
pub mod address;
pub use address::Address;
pub mod bank;
pub use bank::BankRegister;
pub mod line;
pub use line::{LineInput, LineOutput, LineState};

// Lines
pub mod lexer;
pub mod operand;
pub mod resolver;
pub use resolver::Resolver;

// Tables
pub mod block2;
pub mod table;
pub use table::{OpcodeTable, StaticTable};

// Passes
pub mod assembler;
pub use assembler::{assemble, Assembled, AssemblerOptions};
pub mod pass;
pub use pass::{Assembly, FileLoader, MemoryLoader, PassOptions, SourceLoader};

// Output
pub mod image;
pub use image::ObjectImage;
pub mod listing;
pub mod symbol;
pub use symbol::SymbolTable;

mod error;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 2;
