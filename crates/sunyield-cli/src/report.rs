//! Read models printed by `sunyield report`.

use anyhow::Context as _;
use clap::ValueEnum;
use serde_json::Value;
use sunyield_core::{
  environment::environmental_impact,
  site::SiteRegistry,
  store::GenerationStore,
  summary::generation_summaries,
  weather::weather_impact,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
  /// The registered site catalogue.
  Sites,
  /// Monthly actual, theoretical and predicted output per site.
  Generation,
  Monthly,
  Yearly,
  Lifetime,
  /// Monthly weather aggregates.
  Weather,
  /// Monthly weather next to the combined physical-site output.
  WeatherImpact,
  /// CO₂ offset and tree equivalents of lifetime output.
  Environment,
  /// Latest month, latest year and actual-vs-predicted series per site.
  Summary,
}

async fn registry<S: GenerationStore>(store: &S) -> anyhow::Result<SiteRegistry> {
  let sites = store.list_sites().await?;
  SiteRegistry::new(sites).context("stored site registry is invalid")
}

/// Build the JSON document for `kind`.
pub async fn render<S: GenerationStore>(kind: ReportKind, store: &S) -> anyhow::Result<Value> {
  let value = match kind {
    ReportKind::Sites => serde_json::to_value(store.list_sites().await?)?,
    ReportKind::Generation => serde_json::to_value(store.generation_report().await?)?,
    ReportKind::Monthly => serde_json::to_value(store.monthly_performance().await?)?,
    ReportKind::Yearly => serde_json::to_value(store.yearly_performance().await?)?,
    ReportKind::Lifetime => serde_json::to_value(store.lifetime_performance().await?)?,
    ReportKind::Weather => serde_json::to_value(store.monthly_weather().await?)?,

    ReportKind::WeatherImpact => {
      let registry = registry(store).await?;
      let weather = store.monthly_weather().await?;
      let facts = store.monthly_facts().await?;
      serde_json::to_value(weather_impact(&weather, &facts, &registry))?
    }

    ReportKind::Environment => {
      let registry = registry(store).await?;
      let facts = store.monthly_facts().await?;
      serde_json::to_value(environmental_impact(&facts, &registry))?
    }

    ReportKind::Summary => {
      let registry = registry(store).await?;
      let facts = store.monthly_facts().await?;
      serde_json::to_value(generation_summaries(&facts, &registry))?
    }
  };
  Ok(value)
}
