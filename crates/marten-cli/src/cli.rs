//! Command-line definition.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("marten")
        .about("Front-end tooling for the Marten scripting language")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("ast")
                .about("Parse a script and print its syntax tree")
                .arg(file_arg())
                .arg(strict_arg()),
        )
        .subcommand(
            Command::new("dump")
                .about("Compile a script and print the bytecode listing")
                .arg(file_arg())
                .arg(strict_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Emit the compiled module as JSON"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Parse and compile a script, reporting problems only")
                .arg(file_arg())
                .arg(strict_arg()),
        )
}

/// Script file to read (positional).
fn file_arg() -> Arg {
    Arg::new("file")
        .value_name("FILE")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Script file to read")
}

/// Strict-mode flag (--strict).
fn strict_arg() -> Arg {
    Arg::new("strict")
        .long("strict")
        .action(ArgAction::SetTrue)
        .help("Parse in strict mode")
}
