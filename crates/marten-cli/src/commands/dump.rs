use std::process;

use clap::ArgMatches;

pub fn run(m: &ArgMatches) {
    let ast = super::parse_file(m);
    let module = match marten_compiler::compile(&ast) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    if m.get_flag("json") {
        match serde_json::to_string_pretty(&module) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                eprintln!("error: {}", err);
                process::exit(1);
            }
        }
    } else {
        print!("{}", marten_bytecode::dump(&module));
    }
}
