mod cli;
mod commands;

fn main() {
    let matches = cli::build_cli().get_matches();

    match matches.subcommand() {
        Some(("ast", m)) => commands::ast::run(m),
        Some(("dump", m)) => commands::dump::run(m),
        Some(("check", m)) => commands::check::run(m),
        _ => unreachable!("clap should have caught this"),
    }
}
