//! Command implementations.

pub mod ast;
pub mod check;
pub mod dump;

use std::path::PathBuf;
use std::{fs, process};

use clap::ArgMatches;
use marten_compiler::{Ast, Parser};

/// Read and parse the script named on the command line, printing warnings
/// to stderr. Exits with status 1 on any failure.
pub(crate) fn parse_file(m: &ArgMatches) -> Ast {
    let path: &PathBuf = m.get_one("file").expect("file is required");
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {}: {}", path.display(), err);
            process::exit(1);
        }
    };

    let filename = path.display().to_string();
    match Parser::new(&filename, &source)
        .strict(m.get_flag("strict"))
        .parse()
    {
        Ok(ast) => {
            ast.diagnostics.eprint(ast.filename());
            ast
        }
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}
