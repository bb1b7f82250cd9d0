//! The recomputation pipeline as an explicit stage graph.
//!
//! Each [`Stage`] declares its upstream stages. A [`Pipeline`] resolves a
//! selection of stages into dependency order and runs them one after the
//! other against a [`GenerationStore`]; every stage reads its inputs, computes
//! its output with the pure functions in this crate, and persists it with a
//! single atomic store call.
//!
//! Ordering only guards against reading stale or partial data: the monthly,
//! yearly and lifetime passes all read the base fact table, not each other.

use std::collections::BTreeSet;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
  estimate::theoretical_yield,
  fact::FactColumn,
  rollup::{lifetime_performance, monthly_performance, synthesize_aggregate, yearly_performance},
  site::SiteRegistry,
  store::GenerationStore,
  weather::{monthly_weather, solar_inputs},
};

// ─── Stages ──────────────────────────────────────────────────────────────────

/// One independently invocable recomputation pass.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Display,
  EnumIter,
  EnumString,
  Serialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
  /// Daily weather → `weather_monthly`.
  WeatherRollup,
  /// Physical-site actuals → aggregate-site actuals.
  AggregateSite,
  /// Daily weather × site capacity → `theoretical_kwh`.
  TheoreticalYield,
  /// Complete facts → `monthly_performance`.
  MonthlyPerformance,
  /// Year-summed facts → `yearly_performance`.
  YearlyPerformance,
  /// Range-summed facts → `lifetime_performance`.
  LifetimePerformance,
}

impl Stage {
  /// Stages that must have run before this one for its inputs to be
  /// current.
  pub fn upstream(self) -> &'static [Stage] {
    match self {
      Self::WeatherRollup | Self::AggregateSite => &[],
      Self::TheoreticalYield => &[Self::AggregateSite],
      Self::MonthlyPerformance => &[Self::AggregateSite, Self::TheoreticalYield],
      Self::YearlyPerformance => &[Self::MonthlyPerformance],
      Self::LifetimePerformance => &[Self::YearlyPerformance],
    }
  }
}

/// Outcome of one successful stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub stage:        Stage,
  pub rows_written: usize,
  /// Inputs left out because their site is not registered.
  pub skipped:      usize,
}

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("failed to load site registry: {0}")]
  LoadRegistry(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("site registry is unusable: {0}")]
  Registry(#[source] crate::Error),

  #[error("stage {stage} failed: {source}")]
  Stage {
    stage:  Stage,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

fn stage_error<E>(stage: Stage) -> impl FnOnce(E) -> PipelineError
where
  E: std::error::Error + Send + Sync + 'static,
{
  move |e| PipelineError::Stage { stage, source: Box::new(e) }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// An ordered selection of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
  stages: Vec<Stage>,
}

impl Pipeline {
  /// Every stage.
  pub fn full() -> Self { Self::only(Stage::iter()) }

  /// Exactly the given stages, in dependency order. Upstream stages that
  /// are not listed are not run.
  pub fn only(stages: impl IntoIterator<Item = Stage>) -> Self {
    let selected: BTreeSet<Stage> = stages.into_iter().collect();
    Self { stages: dependency_order(&selected) }
  }

  /// The given stages plus everything upstream of them.
  pub fn with_upstream(stages: impl IntoIterator<Item = Stage>) -> Self {
    let mut selected = BTreeSet::new();
    let mut pending: Vec<Stage> = stages.into_iter().collect();
    while let Some(stage) = pending.pop() {
      if selected.insert(stage) {
        pending.extend_from_slice(stage.upstream());
      }
    }
    Self { stages: dependency_order(&selected) }
  }

  pub fn stages(&self) -> &[Stage] { &self.stages }

  /// Load the site registry and run every stage in order, stopping at the
  /// first failure. A failed stage has already rolled back; tables written
  /// by earlier stages stay committed.
  pub async fn run<S: GenerationStore>(
    &self,
    store: &S,
  ) -> Result<Vec<StageReport>, PipelineError> {
    let sites = store
      .list_sites()
      .await
      .map_err(|e| PipelineError::LoadRegistry(Box::new(e)))?;
    let registry = SiteRegistry::new(sites).map_err(PipelineError::Registry)?;

    let mut reports = Vec::with_capacity(self.stages.len());
    for &stage in &self.stages {
      match run_stage(stage, store, &registry).await {
        Ok(report) => {
          if report.skipped > 0 {
            warn!(%stage, skipped = report.skipped, "stage skipped rows for unregistered sites");
          }
          info!(%stage, rows = report.rows_written, "stage complete");
          reports.push(report);
        }
        Err(e) => {
          error!(%stage, error = %e, "stage failed; its table was left unchanged");
          return Err(e);
        }
      }
    }
    Ok(reports)
  }
}

/// Emit `selected` so that every stage follows all of its (transitive)
/// upstream stages that are also selected.
fn dependency_order(selected: &BTreeSet<Stage>) -> Vec<Stage> {
  fn visit(
    stage: Stage,
    selected: &BTreeSet<Stage>,
    seen: &mut BTreeSet<Stage>,
    order: &mut Vec<Stage>,
  ) {
    if !seen.insert(stage) {
      return;
    }
    for &up in stage.upstream() {
      visit(up, selected, seen, order);
    }
    if selected.contains(&stage) {
      order.push(stage);
    }
  }

  let mut seen = BTreeSet::new();
  let mut order = Vec::with_capacity(selected.len());
  for &stage in selected {
    visit(stage, selected, &mut seen, &mut order);
  }
  order
}

// ─── Stage bodies ────────────────────────────────────────────────────────────

/// Run a single stage against `store` with an already-loaded registry.
pub async fn run_stage<S: GenerationStore>(
  stage: Stage,
  store: &S,
  registry: &SiteRegistry,
) -> Result<StageReport, PipelineError> {
  let err = stage_error::<S::Error>(stage);

  let (rows_written, skipped) = match stage {
    Stage::WeatherRollup => {
      let daily = store.daily_weather().await.map_err(err)?;
      let months = monthly_weather(&daily);
      (store.replace_monthly_weather(months).await.map_err(stage_error(stage))?, 0)
    }

    Stage::AggregateSite => {
      let facts = store.monthly_facts().await.map_err(err)?;
      let values = synthesize_aggregate(&facts, registry);
      let written = store
        .upsert_fact_values(FactColumn::Actual, values)
        .await
        .map_err(stage_error(stage))?;
      (written, 0)
    }

    Stage::TheoreticalYield => {
      let daily = store.daily_weather().await.map_err(err)?;
      let values = theoretical_yield(&solar_inputs(&daily), registry);
      let written = store
        .upsert_fact_values(FactColumn::Theoretical, values)
        .await
        .map_err(stage_error(stage))?;
      (written, 0)
    }

    Stage::MonthlyPerformance => {
      let facts = store.monthly_facts().await.map_err(err)?;
      let rebuild = monthly_performance(&facts, registry);
      let written = store
        .replace_monthly_performance(rebuild.rows)
        .await
        .map_err(stage_error(stage))?;
      (written, rebuild.skipped)
    }

    Stage::YearlyPerformance => {
      let facts = store.monthly_facts().await.map_err(err)?;
      let rebuild = yearly_performance(&facts, registry);
      let written = store
        .replace_yearly_performance(rebuild.rows)
        .await
        .map_err(stage_error(stage))?;
      (written, rebuild.skipped)
    }

    Stage::LifetimePerformance => {
      let facts = store.monthly_facts().await.map_err(err)?;
      let rebuild = lifetime_performance(&facts, registry).map_err(stage_error(stage))?;
      let written = store
        .replace_lifetime_performance(rebuild.rows)
        .await
        .map_err(stage_error(stage))?;
      (written, rebuild.skipped)
    }
  };

  Ok(StageReport { stage, rows_written, skipped })
}
