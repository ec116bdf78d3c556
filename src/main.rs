//! ShareSync CLI entry point.

use clap::Parser;
use ssync::cli::commands;
use ssync::cli::{Cli, Commands, OutputFormat};
use ssync::config::Config;
use ssync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR --format json OR non-TTY stdout
    let json = cli.json
        || cli.format == OutputFormat::Json
        || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    // Run the command and handle errors
    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Load config with the CLI timeout override applied.
fn load_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    Ok(config)
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Sync { dry_run } => {
            let config = load_config(cli)?;
            commands::sync::execute(&config, *dry_run, json)
        }

        Commands::Fetch { side } => {
            let config = load_config(cli)?;
            commands::fetch::execute(&config, (*side).into(), cli.format, json)
        }

        Commands::Report => commands::report::execute(json),

        Commands::Export { side, output } => {
            let config = load_config(cli)?;
            commands::export::execute(&config, (*side).into(), output, json)
        }

        Commands::Import { side, input } => {
            let config = load_config(cli)?;
            commands::import::execute(&config, (*side).into(), input, json)
        }

        Commands::Completions { shell } => commands::completions::execute(*shell),

        Commands::Version => commands::version::execute(json),
    }
}
