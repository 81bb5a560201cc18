//! Front-end for the Marten scripting language: parser and bytecode
//! compiler.
//!
//! The pipeline:
//! - `lexer` - one-token look-ahead tokenizer
//! - `parser` - recursive descent over the token stream into an AST arena
//! - `fold` - in-place numeric constant folding (runs as part of parsing)
//! - `codegen` - lowers the AST into stack-machine bytecode
//! - `diagnostics` - warning collection
//!
//! Execution of the emitted bytecode is out of scope; the compiled
//! [`Module`](marten_bytecode::Module) is handed to the embedder.
//!
//! Errors do not recover anywhere in between: every internal function
//! threads `Result`, and the public entry points ([`parse`], [`compile`],
//! [`compile_source`]) surface the first failure. No partial AST or
//! half-built function ever escapes.

pub mod ast;
pub mod codegen;
pub mod diagnostics;
mod fold;
pub mod lexer;
pub mod parser;


pub use ast::{Arena, Ast, Kind, Node, NodeId};
pub use codegen::compile;
pub use diagnostics::Diagnostics;
pub use lexer::{Lexer, Tok};
pub use parser::Parser;

use marten_bytecode::Module;

/// Errors produced by the front-end. Both variants render in the
/// diagnostic format `<filename>:<line>: error: <message>`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Unexpected input while lexing or parsing.
    #[error("{filename}:{line}: error: {message}")]
    Syntax {
        filename: String,
        line: u32,
        message: String,
    },
    /// A construct the code generator rejects.
    #[error("{filename}:{line}: error: {message}")]
    Compile {
        filename: String,
        line: u32,
        message: String,
    },
}

impl Error {
    pub fn line(&self) -> u32 {
        match self {
            Error::Syntax { line, .. } | Error::Compile { line, .. } => *line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Syntax { message, .. } | Error::Compile { message, .. } => message,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Parse a script in non-strict mode and fold numeric constants.
///
/// Use [`Parser`] directly to control strict mode.
pub fn parse(filename: &str, source: &str) -> Result<Ast> {
    Parser::new(filename, source).parse()
}

/// Parse and compile in one step, printing collected warnings to stderr.
pub fn compile_source(filename: &str, source: &str) -> Result<Module> {
    let ast = parse(filename, source)?;
    ast.diagnostics.eprint(ast.filename());
    codegen::compile(&ast)
}
