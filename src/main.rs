use std::process;

use clap::Parser;
use incprev::cli::commands::version;
use incprev::cli::{Cli, Commands};
use log::error;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = cli.log_level.as_deref() {
        builder.parse_filters(level);
    }
    builder.init();

    let exit_code = match execute_command(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("Command execution failed: {e:#}");
            eprintln!("Error: {e:#}");
            1
        }
    };

    process::exit(exit_code);
}

fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Version => Ok(version::execute()),
        Commands::Run(args) => args.execute(),
    }
}
