use clap::Parser;
use ppdl_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_file);

    if let Err(err) = cli.run() {
        eprintln!("ppdl error: {:#}", err);
        std::process::exit(1);
    }
}
