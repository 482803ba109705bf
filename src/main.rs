//! cmdset CLI: templated kubectl/helm command orchestration.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "cmdset",
    version,
    about = "Render YAML command templates and run them as ordered kubectl/helm invocations"
)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: cmdset::cli::Commands,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level.as_str())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cmdset::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
