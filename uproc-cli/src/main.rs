use clap::Parser;
use uproc_cli::{run_build, run_classify, Arguments, Command};

fn main() {
    let Arguments { command } = Arguments::parse();

    let result = match command {
        Command::Classify(args) => run_classify(&args),
        Command::Build(args) => run_build(&args)
    };

    if let Err(err) = result {
        eprint_and_exit(err.to_string().as_str());
    }
}

fn eprint_and_exit(err: &str) -> ! {
    eprintln!("{}", err);
    std::process::exit(1);
}
