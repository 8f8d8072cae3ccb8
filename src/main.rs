//! aura-unbrick CLI
//!
//! Detects and repairs ASUS Aura LED controllers that stopped driving their
//! strips, and drives them safely afterwards.

use std::process::ExitCode;

use aura_controller::ControllerError;
use aura_transport::MonitorConfig;
use aura_unbrick::config::Config;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;
use commands::{CommandResult, Context};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level; --monitor needs the monitor's info lines
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.monitor {
            EnvFilter::new(format!("{},aura_transport::monitor=info", cli.log_level))
        } else {
            EnvFilter::new(&cli.log_level)
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CommandResult {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    info!("Loading config from {:?}", config_path);
    let config = Config::load(&config_path)?.with_overrides(cli.device, cli.topology);

    let monitor = cli.monitor.then(|| {
        MonitorConfig::default()
            .with_full_hex(cli.hex)
            .with_filter(cli.filter.unwrap_or_default())
    });

    let ctx = Context {
        config,
        monitor,
        #[cfg(feature = "simulate")]
        simulate: cli.simulate,
    };

    match cli.command {
        // === Recovery ===
        Commands::Unbrick => commands::recovery::unbrick(&ctx),
        Commands::Verify => commands::recovery::verify(&ctx),
        Commands::Test { commit } => commands::recovery::test(&ctx, commit),

        // === Query ===
        Commands::List => commands::query::list(&ctx),
        Commands::Info => commands::query::info(&ctx),

        // === Lighting ===
        Commands::SetColor {
            color,
            channel,
            led,
            commit,
        } => commands::set::set_color(&ctx, color, channel, led, commit),
        Commands::SetEffect {
            mode,
            color,
            brightness,
            channel,
            commit,
        } => commands::set::set_effect(&ctx, mode, color, brightness, channel, commit),
        Commands::Commit => commands::set::commit(&ctx),
    }
}

/// Print an error with its category and a remediation hint
fn report(e: &anyhow::Error) {
    match e.downcast_ref::<ControllerError>() {
        Some(ce) => {
            eprintln!("{}: {ce}", ce.kind());
            if let Some(hint) = ce.hint() {
                eprintln!("hint: {hint}");
            }
        }
        None => eprintln!("Error: {e:#}"),
    }
}
