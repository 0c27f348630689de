//! mz-notify CLI - relay Materialize view changes to Novu workflows.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use mz_notify::checkpoint::{CheckpointStore, now_millis};
use mz_notify::client::{Notifier, notifier_from_config};
use mz_notify::feed::{SubscribeFeed, connect};
use mz_notify::models::{Config, EXAMPLE_CONFIG, LoggingConfig, STALL_EXIT_CODE};
use mz_notify::pipeline::{Dispatcher, Engine, Shutdown};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Parser)]
#[command(name = "mz-notify")]
#[command(author = "Infernet <dev@infernet.org>")]
#[command(version)]
#[command(about = "Relay Materialize SUBSCRIBE changes to Novu notification workflows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Read configuration from MTZ_*/NOVU_* environment variables instead
    #[arg(long, global = true)]
    env: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream changes and dispatch notifications until stalled or failed
    Run {
        /// Record intended calls instead of contacting Novu
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration
    Validate,

    /// Show example configuration
    Example,

    /// Initialize the checkpoint store and show the resume position
    Checkpoint,
}

fn setup_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        Level::DEBUG
    } else {
        logging
            .level
            .parse::<Level>()
            .map_err(|_| anyhow!("Invalid log level '{}'", logging.level))?
    };

    match logging.output.as_str() {
        "stdout" => install_subscriber(level, std::io::stdout),
        "stderr" => install_subscriber(level, std::io::stderr),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {path}"))?;
            install_subscriber(level, Mutex::new(file))
        }
    }
}

fn install_subscriber<W>(level: Level, writer: W) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = if cli.env {
        Config::from_env().context("Failed to load config from environment")?
    } else {
        Config::from_file(&cli.config)
            .with_context(|| format!("Failed to load config from {:?}", cli.config))?
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn open_checkpoint(config: &Config) -> Result<CheckpointStore> {
    let store = CheckpointStore::from_config(config)
        .await
        .context("Failed to open checkpoint store")?;
    store
        .initialize()
        .await
        .context("Failed to initialize checkpoint store")?;
    Ok(store)
}

/// Fold command-line flags into the loaded configuration.
fn apply_overrides(config: &mut Config, command: &Commands) {
    if let Commands::Run { dry_run: true } = command {
        config.dispatch.dry_run = true;
    }
}

async fn run(config: Config) -> Result<()> {
    let notifier = notifier_from_config(&config).context("Failed to set up notifier")?;
    info!(notifier = notifier.name(), "Notifier ready");

    let store = open_checkpoint(&config).await?;
    let resume_from = store.resume_position().await;

    let client = connect(&config, "subscribe")
        .await
        .context("Failed to connect to Materialize")?;
    let feed = SubscribeFeed::open(client, &config.source, resume_from, config.fetch_timeout())
        .await
        .context("Failed to declare SUBSCRIBE cursor")?;

    let dispatcher = Dispatcher::from_config(&config, notifier, store, resume_from);
    let mut engine = Engine::new(feed, dispatcher, config.stall_timeout());

    match engine.run().await {
        Ok(Shutdown::Stalled { idle, .. }) => {
            error!(
                idle_secs = idle.as_secs(),
                exit_code = STALL_EXIT_CODE,
                "Exiting after stall, a restart will resume from the last checkpoint"
            );
            std::process::exit(STALL_EXIT_CODE);
        }
        Err(e) => {
            if e.is_misconfiguration() {
                error!(error = %e, "Stopping on a configuration problem, restarting will not help");
            } else {
                error!(error = %e, "Stopping on a fatal error");
            }
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Example = cli.command {
        println!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let mut config = load_config(&cli)?;
    apply_overrides(&mut config, &cli.command);
    setup_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Example => {}

        Commands::Validate => {
            config
                .resolve_api_key()
                .context("Failed to resolve API key")?;
            config
                .resolve_password()
                .context("Failed to resolve Materialize password")?;

            info!("Configuration is valid");
            println!("Configuration is valid");
            println!("  View:         {}", config.source.view);
            println!("  Columns:      {}", config.source.payload_columns.join(", "));
            println!("  Workflow:     {}", config.novu.workflow);
            println!("  Checkpoint:   {:?}", config.checkpoint.backend);
            println!("  Retention:    {} min", config.checkpoint.retention_minutes);
            println!("  Stall after:  {} min", config.dispatch.stall_timeout_minutes);
            println!("  Retractions:  {}", config.dispatch.send_retractions);
            println!("  Dry run:      {}", config.dispatch.dry_run);
        }

        Commands::Checkpoint => {
            let store = open_checkpoint(&config).await?;
            let stored = store
                .stored_value()
                .await
                .context("Failed to read checkpoint")?;
            let now = now_millis();
            let resume = store.resume_position_at(now).await;

            println!("Location:   {}", store.describe());
            println!("Stored:     {stored}");
            println!("Now:        {now}");
            if resume == now {
                println!("Resume at:  {resume} (stored value missing or outside retention)");
            } else {
                println!("Resume at:  {resume}");
            }
        }

        Commands::Run { .. } => {
            run(config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Config {
        toml::from_str(EXAMPLE_CONFIG).unwrap()
    }

    #[test]
    fn test_run_dry_run_flag_forces_dry_run() {
        let cli = Cli::try_parse_from(["mz-notify", "run", "--dry-run"]).unwrap();
        let mut config = example();
        assert!(!config.dispatch.dry_run);

        apply_overrides(&mut config, &cli.command);
        assert!(config.dispatch.dry_run);
    }

    #[test]
    fn test_run_without_flag_keeps_configured_mode() {
        let cli = Cli::try_parse_from(["mz-notify", "run"]).unwrap();
        let mut config = example();
        config.dispatch.dry_run = true;

        apply_overrides(&mut config, &cli.command);
        assert!(config.dispatch.dry_run);

        let mut config = example();
        apply_overrides(&mut config, &cli.command);
        assert!(!config.dispatch.dry_run);
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["mz-notify", "checkpoint", "--env", "-v"]).unwrap();
        assert!(cli.env);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Checkpoint));
    }
}
