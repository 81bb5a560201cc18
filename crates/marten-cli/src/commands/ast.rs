use clap::ArgMatches;

pub fn run(m: &ArgMatches) {
    let ast = super::parse_file(m);
    print!("{}", ast.dump());
}
