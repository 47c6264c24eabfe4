mod analyze_cmd;
mod config;
mod config_cmd;
mod doctor_cmd;
mod recover_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use tenantlens_config::{config_dir, config_file_path, load_and_prepare, log_report, validate};

use analyze_cmd::AnalyzeArgs;
use recover_cmd::{RecoverArgs, ValidateArgs};

#[derive(Parser)]
#[command(name = "tenantlens")]
#[command(about = "TenantLens: plain-English fairness reports for residential leases")]
#[command(version)]
struct Cli {
    /// Config file (default: $TENANTLENS_CONFIG_DIR/config.yaml or ~/.tenantlens/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a lease and print its fairness report
    Analyze(AnalyzeArgs),
    /// Recover text from a scanned lease
    Recover(RecoverArgs),
    /// Check whether a text file looks like a lease
    Validate(ValidateArgs),
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
    /// Check the OCR tools and provider setup
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&config_path).await?;

    let logging = config.logging.clone().unwrap_or_default();
    tenantlens_logging::init_logger(
        logging.dir.as_deref(),
        logging.level.as_deref().unwrap_or("info"),
        logging.json.unwrap_or(false),
    )?;

    let report = validate(&config);
    log_report(&report);

    let needs_valid_config = matches!(
        cli.command,
        Commands::Analyze(_) | Commands::Recover(_)
    );
    if needs_valid_config && !report.is_valid() {
        anyhow::bail!(
            "invalid config at {} ({} error(s)); run `tenantlens doctor` for details",
            config_path.display(),
            report.errors.len()
        );
    }

    let result = match cli.command {
        Commands::Analyze(args) => analyze_cmd::run(&config, args).await,
        Commands::Recover(args) => recover_cmd::run_recover(&config, args).await,
        Commands::Validate(args) => recover_cmd::run_validate(args).await,
        Commands::Config { init } => config_cmd::run(&config, &config_path, init).await,
        Commands::Doctor => {
            if !doctor_cmd::run(&config).await? {
                std::process::exit(1);
            }
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Command failed");
    }
    result
}
