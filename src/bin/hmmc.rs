use clap::Parser;
use hmmc::cli::{run, Opts};

fn main() {
    env_logger::init();
    let opts: Opts = Opts::parse();
    if let Err(e) = run(&opts) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
