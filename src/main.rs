//! qsync CLI entry point.

use clap::Parser;
use qsync::cli::commands;
use qsync::cli::{Cli, Commands};
use qsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Credentials may live in a .env file next to the invocation
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

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
            2 => EnvFilter::new("debug,rusqlite=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Init { force } => commands::init::execute(cli.db.as_ref(), *force, json),

        Commands::Run { once, interval, export_deadline } => {
            commands::run::execute(cli.db.as_ref(), *once, *interval, *export_deadline, json)
        }

        Commands::Pending { limit } => commands::pending::execute(cli.db.as_ref(), *limit, json),

        Commands::Mark { id, status, error } => {
            commands::mark::execute(cli.db.as_ref(), id, status, error.as_deref(), json)
        }

        Commands::Status => commands::status::execute(cli.db.as_ref(), json),

        Commands::Webhook { port } => commands::webhook::execute(cli.db.as_ref(), *port),

        Commands::Version => commands::version::execute(json),

        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
