//! `sunyield`: recompute and inspect solar generation performance.
//!
//! Reads `sunyield.toml` (or the path given with `--config`), opens the
//! SQLite store it names, and runs one subcommand.
//!
//! ```
//! sunyield init
//! sunyield run
//! sunyield run --stage yearly-performance --with-upstream
//! sunyield report lifetime
//! ```

mod report;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use report::ReportKind;
use settings::Settings;
use sunyield_core::{
  pipeline::{Pipeline, Stage},
  site::SiteRegistry,
  store::GenerationStore,
};
use sunyield_store_sqlite::SqliteStore;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Solar generation performance pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sunyield.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the store if needed and register the configured sites.
  Init,
  /// Recompute derived tables.
  Run(StageArgs),
  /// Print the stage order `run` would use, without touching the store.
  Plan(StageArgs),
  /// Print a read model as JSON.
  Report {
    #[arg(value_enum)]
    kind: ReportKind,
  },
}

#[derive(Args)]
struct StageArgs {
  /// Stage to run; repeatable. Every stage runs when none is given.
  #[arg(short, long = "stage", value_name = "STAGE")]
  stages: Vec<Stage>,

  /// Also run every stage upstream of the named ones.
  #[arg(long)]
  with_upstream: bool,
}

impl StageArgs {
  fn pipeline(&self) -> Pipeline {
    let stages = self.stages.iter().copied();
    match (self.stages.is_empty(), self.with_upstream) {
      (true, _) => Pipeline::full(),
      (false, true) => Pipeline::with_upstream(stages),
      (false, false) => Pipeline::only(stages),
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  if let Command::Plan(args) = &cli.command {
    for stage in args.pipeline().stages() {
      println!("{stage}");
    }
    return Ok(());
  }

  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  match cli.command {
    Command::Init => {
      let registry =
        SiteRegistry::new(settings.sites).context("configured site catalogue is invalid")?;
      let count = registry.sites().len();
      store
        .register_sites(registry.sites().to_vec())
        .await
        .context("failed to register sites")?;
      info!(path = ?settings.store_path, sites = count, "store initialised");
    }

    Command::Run(args) => {
      let pipeline = args.pipeline();
      info!(stages = pipeline.stages().len(), "starting pipeline");
      let reports = pipeline.run(&store).await.context("pipeline run failed")?;
      println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Command::Report { kind } => {
      let value = report::render(kind, &store).await?;
      println!("{}", serde_json::to_string_pretty(&value)?);
    }

    Command::Plan(_) => {}
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_is_well_formed() {
    use clap::CommandFactory as _;
    Cli::command().debug_assert();
  }

  #[test]
  fn stage_flags_select_the_pipeline() {
    let cli = Cli::parse_from([
      "sunyield",
      "run",
      "--stage",
      "lifetime-performance",
      "--stage",
      "aggregate-site",
    ]);
    let Command::Run(args) = cli.command else { panic!("expected run") };
    assert_eq!(args.pipeline().stages(), [Stage::AggregateSite, Stage::LifetimePerformance]);

    let cli = Cli::parse_from(["sunyield", "plan", "-s", "yearly-performance", "--with-upstream"]);
    let Command::Plan(args) = cli.command else { panic!("expected plan") };
    assert_eq!(args.pipeline().stages().len(), 4);

    let cli = Cli::parse_from(["sunyield", "run"]);
    let Command::Run(args) = cli.command else { panic!("expected run") };
    assert_eq!(args.pipeline(), Pipeline::full());
  }

  #[test]
  fn unknown_stage_is_rejected() {
    assert!(Cli::try_parse_from(["sunyield", "run", "--stage", "forecast"]).is_err());
  }

  #[test]
  fn report_kinds_are_kebab_case() {
    let cli = Cli::parse_from(["sunyield", "report", "weather-impact"]);
    assert!(matches!(cli.command, Command::Report { kind: ReportKind::WeatherImpact }));
  }
}
