use clap::Parser;
use taskdeck::cli::commands::Cli;
use taskdeck::cli::{handlers, init_tracing};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
