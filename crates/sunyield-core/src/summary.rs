//! Per-site generation summaries: latest month, latest year, and the
//! actual-vs-predicted series.
//!
//! Predicted values are produced by an external forecasting step and are only
//! read here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  calendar::Period,
  fact::MonthlyFact,
  site::{Site, SiteId, SiteRegistry},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
  #[serde(flatten)]
  pub period:        Period,
  pub actual_kwh:    Option<f64>,
  pub predicted_kwh: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
  pub site_id:        SiteId,
  pub site_name:      String,
  /// Actual output of the most recent month that has one.
  pub last_month_kwh: Option<f64>,
  /// Summed actual output of the most recent year that has any.
  pub last_year_kwh:  Option<f64>,
  /// Newest first.
  pub series:         Vec<SeriesPoint>,
}

/// Summaries for every registered site, in registry order.
pub fn generation_summaries(facts: &[MonthlyFact], registry: &SiteRegistry) -> Vec<GenerationSummary> {
  registry
    .sites()
    .iter()
    .map(|site| generation_summary(site, facts, registry))
    .collect()
}

pub fn generation_summary(
  site: &Site,
  facts: &[MonthlyFact],
  registry: &SiteRegistry,
) -> GenerationSummary {
  let mut points: BTreeMap<Period, SeriesPoint> = facts
    .iter()
    .filter(|f| f.site_id == site.id)
    .map(|f| {
      (f.period, SeriesPoint {
        period:        f.period,
        actual_kwh:    f.actual_kwh,
        predicted_kwh: f.predicted_kwh,
      })
    })
    .collect();

  // The aggregate site has no forecast of its own; its prediction is the sum
  // of the physical sites' predictions.
  if site.is_aggregate() {
    let mut predicted: BTreeMap<Period, f64> = BTreeMap::new();
    for fact in facts.iter().filter(|f| registry.is_physical(f.site_id)) {
      if let Some(p) = fact.predicted_kwh {
        *predicted.entry(fact.period).or_default() += p;
      }
    }
    for point in points.values_mut() {
      point.predicted_kwh = predicted.get(&point.period).copied();
    }
  }

  let last_month_kwh = points.values().rev().find_map(|p| p.actual_kwh);

  let last_year = points
    .values()
    .rev()
    .find(|p| p.actual_kwh.is_some())
    .map(|p| p.period.year);
  let last_year_kwh = last_year.map(|year| {
    points
      .values()
      .filter(|p| p.period.year == year)
      .filter_map(|p| p.actual_kwh)
      .sum()
  });

  GenerationSummary {
    site_id: site.id,
    site_name: site.name.clone(),
    last_month_kwh,
    last_year_kwh,
    series: points.into_values().rev().collect(),
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  fn fact(year: i32, month: u32, site: u32, actual: Option<f64>, predicted: Option<f64>) -> MonthlyFact {
    MonthlyFact {
      period:          Period::new(year, month).unwrap(),
      site_id:         SiteId(site),
      actual_kwh:      actual,
      theoretical_kwh: None,
      predicted_kwh:   predicted,
    }
  }

  #[test]
  fn latest_month_and_year() {
    let reg = SiteRegistry::builtin();
    let facts = vec![
      fact(2018, 12, 1, Some(50.0), None),
      fact(2019, 1, 1, Some(10.0), None),
      fact(2019, 2, 1, Some(20.0), None),
      // Newest row without an actual is skipped.
      fact(2019, 3, 1, None, Some(25.0)),
    ];
    let summary = generation_summary(reg.get(SiteId(1)).unwrap(), &facts, &reg);
    assert_eq!(summary.last_month_kwh, Some(20.0));
    assert_relative_eq!(summary.last_year_kwh.unwrap(), 30.0);
    assert_eq!(summary.series.len(), 4);
    assert_eq!(summary.series[0].period, Period::new(2019, 3).unwrap());
    assert_eq!(summary.series[0].predicted_kwh, Some(25.0));
  }

  #[test]
  fn site_without_data() {
    let reg = SiteRegistry::builtin();
    let summary = generation_summary(reg.get(SiteId(3)).unwrap(), &[], &reg);
    assert_eq!(summary.last_month_kwh, None);
    assert_eq!(summary.last_year_kwh, None);
    assert!(summary.series.is_empty());
  }

  #[test]
  fn aggregate_prediction_is_sum_of_physical() {
    let reg = SiteRegistry::builtin();
    let facts = vec![
      fact(2019, 1, 1, Some(10.0), Some(11.0)),
      fact(2019, 1, 2, Some(20.0), Some(19.0)),
      fact(2019, 1, 3, Some(5.0), None),
      fact(2019, 1, 4, Some(35.0), Some(1.0)),
      fact(2019, 2, 4, Some(40.0), None),
    ];
    let summaries = generation_summaries(&facts, &reg);
    let total = &summaries[3];
    assert_eq!(total.site_name, "Total System");
    assert_eq!(total.series[1].predicted_kwh, Some(30.0));
    assert_eq!(total.series[0].predicted_kwh, None);
    assert_eq!(total.last_month_kwh, Some(40.0));
  }
}
