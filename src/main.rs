use clap::Parser;
use form_inspector::cli::commands::{cmd_scan, cmd_simulate};
use form_inspector::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Scan { page, fingerprint } => {
            let forms = cmd_scan(&page, fingerprint.as_deref(), &config)?;
            println!("{}", serde_json::to_string_pretty(&forms)?);
        }
        Commands::Simulate {
            page,
            commits,
            tab,
            fingerprint,
            trace,
        } => {
            let report = cmd_simulate(
                &page,
                &commits,
                tab,
                fingerprint.as_deref(),
                trace.as_deref(),
                &config,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
