//! Bytecode artifact model for the Marten scripting language.
//!
//! This crate contains:
//! - The stack-machine instruction set (`Opcode`)
//! - The compiled-function record and its constant pools (`Function`)
//! - The compiled module: a flat function table plus an entry id (`Module`)
//! - A human-readable bytecode listing (`dump`)
//!
//! The compiler that produces these artifacts lives in `marten-compiler`;
//! nothing here executes code.

pub mod dump;
pub mod function;
pub mod opcode;


pub use dump::{dump, format_number};
pub use function::{ANONYMOUS, FuncId, Function, Module};
pub use opcode::{Opcode, OperandKind};
