//! Derived tables as pure functions of the base facts.
//!
//! Each function here computes a whole table from scratch; the store then
//! swaps it in with a single transactional replace. Yearly and lifetime rows
//! are re-derived from summed actual and theoretical output, never from the
//! monthly ratios.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{
  calendar::{Period, hours_in_year, hours_in_years},
  fact::{FactValue, MonthlyFact},
  metrics::{LifetimePerformance, MonthlyPerformance, Ratios, YearlyPerformance},
  site::{SiteId, SiteRegistry},
  Error, Result,
};

/// A freshly computed table plus the number of input rows left out because
/// their site is not registered.
#[derive(Debug, Clone, PartialEq)]
pub struct Rebuild<T> {
  pub rows:    Vec<T>,
  pub skipped: usize,
}

/// Facts with both actual and theoretical output, in (period, site) order so
/// that floating-point sums are reproducible.
fn complete_facts(facts: &[MonthlyFact]) -> Vec<(Period, SiteId, f64, f64)> {
  let mut complete: Vec<_> = facts
    .iter()
    .filter_map(|f| {
      let (actual, theoretical) = f.complete()?;
      Some((f.period, f.site_id, actual, theoretical))
    })
    .collect();
  complete.sort_by_key(|&(period, site, ..)| (period, site));
  complete
}

// ─── Aggregate site ──────────────────────────────────────────────────────────

/// The aggregate site's actual output for every period in which at least
/// one physical site reported. Missing physical values count as zero.
pub fn synthesize_aggregate(facts: &[MonthlyFact], registry: &SiteRegistry) -> Vec<FactValue> {
  let mut physical: Vec<_> = facts
    .iter()
    .filter(|f| registry.is_physical(f.site_id))
    .filter_map(|f| Some((f.period, f.site_id, f.actual_kwh?)))
    .collect();
  physical.sort_by_key(|&(period, site, _)| (period, site));

  let mut totals: BTreeMap<Period, f64> = BTreeMap::new();
  for (period, _, actual) in physical {
    *totals.entry(period).or_default() += actual;
  }

  let aggregate = registry.aggregate().id;
  totals
    .into_iter()
    .map(|(period, kwh)| FactValue { period, site_id: aggregate, kwh })
    .collect()
}

// ─── Monthly ─────────────────────────────────────────────────────────────────

pub fn monthly_performance(
  facts: &[MonthlyFact],
  registry: &SiteRegistry,
) -> Rebuild<MonthlyPerformance> {
  let mut rows = Vec::new();
  let mut skipped = 0;

  for (period, site_id, actual, theoretical) in complete_facts(facts) {
    let Some(site) = registry.get(site_id) else {
      warn!(%period, %site_id, "skipping monthly fact for unregistered site");
      skipped += 1;
      continue;
    };
    let hours = f64::from(period.hours());
    rows.push(MonthlyPerformance {
      period,
      site_id,
      ratios: Ratios::derive(actual, theoretical, site, hours),
    });
  }

  Rebuild { rows, skipped }
}

// ─── Yearly ──────────────────────────────────────────────────────────────────

pub fn yearly_performance(
  facts: &[MonthlyFact],
  registry: &SiteRegistry,
) -> Rebuild<YearlyPerformance> {
  let mut sums: BTreeMap<(i32, SiteId), (f64, f64)> = BTreeMap::new();
  for (period, site_id, actual, theoretical) in complete_facts(facts) {
    let entry = sums.entry((period.year, site_id)).or_default();
    entry.0 += actual;
    entry.1 += theoretical;
  }

  let mut rows = Vec::new();
  let mut skipped = 0;

  for ((year, site_id), (actual, theoretical)) in sums {
    let Some(site) = registry.get(site_id) else {
      warn!(year, %site_id, "skipping yearly sums for unregistered site");
      skipped += 1;
      continue;
    };
    let hours = f64::from(hours_in_year(year));
    rows.push(YearlyPerformance {
      year,
      site_id,
      ratios: Ratios::derive(actual, theoretical, site, hours),
    });
  }

  // Rows come out of the map in (year, site) order.
  Rebuild { rows, skipped }
}

// ─── Lifetime ────────────────────────────────────────────────────────────────

/// The `[start_year, end_year]` range over all complete facts, shared by
/// every site.
pub fn observed_years(facts: &[MonthlyFact]) -> Option<(i32, i32)> {
  let complete = facts.iter().filter(|f| f.complete().is_some());
  let (min, max) = complete.fold((None, None), |(min, max), f| {
    let y = f.period.year;
    (
      Some(min.map_or(y, |m: i32| m.min(y))),
      Some(max.map_or(y, |m: i32| m.max(y))),
    )
  });
  min.zip(max)
}

/// Fails with [`Error::NoObservedYears`] when no fact is complete.
pub fn lifetime_performance(
  facts: &[MonthlyFact],
  registry: &SiteRegistry,
) -> Result<Rebuild<LifetimePerformance>> {
  let (start_year, end_year) = observed_years(facts).ok_or(Error::NoObservedYears)?;
  // Every site is measured against the full range, even one whose data
  // starts later.
  let total_hours = hours_in_years(start_year..=end_year) as f64;

  let mut sums: BTreeMap<SiteId, (f64, f64)> = BTreeMap::new();
  for (_, site_id, actual, theoretical) in complete_facts(facts) {
    let entry = sums.entry(site_id).or_default();
    entry.0 += actual;
    entry.1 += theoretical;
  }

  let mut rows = Vec::new();
  let mut skipped = 0;

  for (site_id, (actual, theoretical)) in sums {
    let Some(site) = registry.get(site_id) else {
      warn!(%site_id, "skipping lifetime sums for unregistered site");
      skipped += 1;
      continue;
    };
    rows.push(LifetimePerformance {
      site_id,
      start_year,
      end_year,
      ratios: Ratios::derive(actual, theoretical, site, total_hours),
    });
  }

  Ok(Rebuild { rows, skipped })
}
