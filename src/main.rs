use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

use kiosk_etl::config::Config;
use kiosk_etl::constants::{COL_LOCATION, ENV_CONFIG_PATH};
use kiosk_etl::logging;
use kiosk_etl::tasks::{self, AuditParams, TemplateParams};

#[derive(Parser)]
#[command(name = "kiosk_etl")]
#[command(about = "Operations spreadsheet to kiosk JSON, with field normalization")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults to $KIOSK_ETL_CONFIG, then ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize the operations sheet and write operations_data.json
    Generate {
        /// Source workbook or CSV
        #[arg(long)]
        input: Option<PathBuf>,
        /// Worksheet name inside the workbook
        #[arg(long)]
        sheet: Option<String>,
        /// Destination for the JSON records
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also write the records as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write run metrics as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Directory for anomaly logs
        #[arg(long)]
        anomaly_dir: Option<PathBuf>,
    },
    /// Check an existing operations_data.json against the reference lists
    Audit {
        /// Records file (defaults to the configured output)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Write unknown lists into the anomaly directory
        #[arg(long)]
        write: bool,
    },
    /// Emit a {raw: raw} normalization template for a column
    Template {
        /// Source workbook or CSV
        #[arg(long)]
        input: Option<PathBuf>,
        /// Column to collect
        #[arg(long, default_value = COL_LOCATION)]
        column: String,
        /// Destination JSON
        #[arg(long, default_value = "known_cities.json")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let requested = cli
        .config
        .clone()
        .or_else(|| std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from));
    let config_source = Config::resolve_path(requested.as_deref());
    let mut config = match &config_source {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env_overrides();

    // log_dir is configurable, so logging starts once the config is read
    let _guard = logging::init_logging(&config.paths.log_dir);
    Config::log_source(config_source.as_deref());

    match cli.command {
        Commands::Generate {
            input,
            sheet,
            output,
            csv,
            summary,
            anomaly_dir,
        } => {
            if let Some(input) = input {
                config.paths.input = input;
            }
            if let Some(sheet) = sheet {
                config.paths.sheet_name = sheet;
            }
            if let Some(output) = output {
                config.paths.output_json = output;
            }
            if csv.is_some() {
                config.paths.output_csv = csv;
            }
            if summary.is_some() {
                config.paths.summary_json = summary;
            }
            if let Some(dir) = anomaly_dir {
                config.paths.anomaly_dir = dir;
            }

            let result = match tasks::generate(&config) {
                Ok(result) => result,
                Err(e) => {
                    error!("❌ Fatal error: {}", e);
                    return Err(e.into());
                }
            };

            println!("\n📊 Run {}:", result.summary.run_id);
            println!("   Records: {}", result.summary.total_records);
            println!("   Countries: {}", result.summary.countries);
            println!("   Systems: {}", result.summary.systems);
            println!("   Success rate: {:.1}%", result.summary.success_rate * 100.0);
            println!("   Fuzzy matches: {}", result.summary.fuzzy_matches);
            println!("   Unknown values: {}", result.summary.unknown_values);
            println!("   Output file: {}", result.output_file.display());

            if !result.failed_artifacts.is_empty() {
                for failure in &result.failed_artifacts {
                    warn!("   - {}", failure);
                }
                bail!(
                    "{} secondary artifact(s) could not be written",
                    result.failed_artifacts.len()
                );
            }
        }
        Commands::Audit { data, write } => {
            let params = AuditParams {
                data: data.unwrap_or_else(|| config.paths.output_json.clone()),
                write_logs: write,
            };
            let report = tasks::audit(&config, &params)
                .with_context(|| format!("audit of {} failed", params.data.display()))?;

            println!("\n🔍 Audited {} records", report.records);
            for country in &report.unknown_countries {
                println!("   unknown country: {}", country);
            }
            for location in &report.unknown_locations {
                println!("   unknown location: {}", location);
            }
            if report.is_clean() {
                info!("✅ No unknown values");
            }
        }
        Commands::Template {
            input,
            column,
            output,
        } => {
            if let Some(input) = input {
                config.paths.input = input;
            }
            let params = TemplateParams { column, output };
            let result = tasks::template(&config, &params)?;
            println!(
                "✅ {} entries written to {}",
                result.entries,
                result.output_file.display()
            );
        }
    }

    Ok(())
}
