//! csvnest CLI - parse and validate CSV files against column rules.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use logging::{LogConfig, init_logging};

fn main() {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose));

    let result = match cli.command {
        Commands::Parse {
            file,
            config,
            output,
            pretty,
            force,
        } => commands::parse::run(file, config, output, pretty, force),

        Commands::Check { file, config, json } => commands::check::run(file, config, json),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
