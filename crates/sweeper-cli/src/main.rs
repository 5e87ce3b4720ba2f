//! Deletes the Service Catalog resources that acceptance tests leave behind.
//!
//! Every region is swept with the same set of sweepers, in dependency
//! order. Run with `RUST_LOG=info` to follow along.
//!
//! ```sh
//! sweep list
//! sweep run --region us-west-2,us-east-1
//! sweep run --sweeper aws_servicecatalog_product --allow-failures --json
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use sweep::{
    aws::{self, servicecatalog::Catalog},
    config::SweepConfig,
    servicecatalog::register_sweepers,
    RegionReport, Registry,
};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "sweep",
    version,
    about = "Delete leftover AWS Service Catalog test resources"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the sweepers and the order they run in.
    List {
        /// Only show these sweepers and their dependencies.
        #[arg(long = "sweeper")]
        sweepers: Vec<String>,
    },
    /// Sweep one or more regions.
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Regions to sweep. Overrides the config file.
    #[arg(long = "region", env = "SWEEP_REGIONS", value_delimiter = ',')]
    regions: Vec<String>,

    /// Only run these sweepers and their dependencies.
    #[arg(long = "sweeper")]
    sweepers: Vec<String>,

    /// A TOML sweep config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How many resources to delete at once.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Seconds before a single API call is abandoned.
    #[arg(long = "timeout", value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Keep running later sweepers when earlier ones fail.
    #[arg(long)]
    allow_failures: bool,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    async fn config(&self) -> anyhow::Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::from_file(path).await?,
            None => SweepConfig::default(),
        };
        if !self.regions.is_empty() {
            config.regions = self.regions.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(secs) = self.timeout_secs {
            config.call_timeout_secs = secs;
        }
        config.allow_failures |= self.allow_failures;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

fn print_report(report: &RegionReport) {
    println!("{}", report.region.bold());
    for (name, result) in report.results.iter() {
        match result {
            Ok(summary) => println!("  {} {name}: {summary}", "ok".green()),
            Err(e) => println!("  {} {name}: {e}", "failed".red()),
        }
    }
}

fn json_report(report: &RegionReport) -> serde_json::Value {
    let sweepers = report
        .results
        .iter()
        .map(|(name, result)| match result {
            Ok(summary) => serde_json::json!({ "sweeper": name, "summary": summary }),
            Err(e) => serde_json::json!({ "sweeper": name, "error": e.to_string() }),
        })
        .collect::<Vec<_>>();
    serde_json::json!({
        "region": report.region,
        "success": report.is_success(),
        "summary": report.summary(),
        "sweepers": sweepers,
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

async fn run(registry: &Registry<Catalog>, args: RunArgs) -> anyhow::Result<()> {
    let config = args.config().await?;
    log::info!(
        "sweeping {:?} with schedule:\n{}",
        config.regions,
        registry.schedule_string(&args.sweepers)?
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("interrupted, cancelling the sweep");
                cancel.cancel();
            }
        }
    });

    let mut failed_regions = vec![];
    let mut json = vec![];
    for region in config.regions.iter() {
        if cancel.is_cancelled() {
            log::warn!("not sweeping {region}");
            failed_regions.push(region.clone());
            continue;
        }
        let ctx = match aws::regional_context(region, &config, cancel.child_token()).await {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("{e}");
                if args.json {
                    json.push(serde_json::json!({
                        "region": region,
                        "success": false,
                        "error": e.to_string(),
                    }));
                } else {
                    println!("{}\n  {} {e}", region.bold(), "failed".red());
                }
                failed_regions.push(region.clone());
                continue;
            }
        };
        let report = registry
            .sweep_region(&ctx, &args.sweepers, config.allow_failures)
            .await?;
        if args.json {
            json.push(json_report(&report));
        } else {
            print_report(&report);
        }
        if !report.is_success() || ctx.is_cancelled() {
            failed_regions.push(region.clone());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json)?);
    }
    anyhow::ensure!(
        failed_regions.is_empty(),
        "sweep failed in {}",
        failed_regions.join(", ")
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut registry = Registry::<Catalog>::default();
    register_sweepers(&mut registry)?;

    match cli.command {
        Command::List { sweepers } => {
            for name in registry.names() {
                let dependencies = registry.dependencies(name).unwrap_or_default();
                if dependencies.is_empty() {
                    println!("{name}");
                } else {
                    println!("{name} (after {})", dependencies.join(", "));
                }
            }
            println!();
            println!("{}", registry.schedule_string(&sweepers)?);
            Ok(())
        }
        Command::Run(args) => run(&registry, args).await,
    }
}
