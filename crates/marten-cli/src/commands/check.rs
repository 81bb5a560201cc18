use std::process;

use clap::ArgMatches;

pub fn run(m: &ArgMatches) {
    let ast = super::parse_file(m);
    if let Err(err) = marten_compiler::compile(&ast) {
        eprintln!("{}", err);
        process::exit(1);
    }
}
