//! Performance ratios and the derived rows that carry them.
//!
//! Every granularity (month, year, lifetime) derives the same three ratios
//! from summed actual and theoretical output; ratios are never averaged.

use serde::{Deserialize, Serialize};

use crate::{calendar::Period, site::{Site, SiteId}};

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
  let scale = 10f64.powi(decimals);
  (value * scale).round() / scale
}

/// The three normalised indicators shared by every rollup level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratios {
  /// Actual ÷ theoretical output, 3 decimals.
  pub performance_ratio: f64,
  /// Actual ÷ (installed capacity × hours), 3 decimals.
  pub capacity_factor:   f64,
  /// Actual ÷ panel count, 2 decimals.
  pub output_per_panel:  f64,
}

impl Ratios {
  /// Derive the ratios for `site` over a period of `hours`.
  ///
  /// A zero (or negative) denominator yields 0 for that ratio; the row is
  /// still produced.
  pub fn derive(actual_kwh: f64, theoretical_kwh: f64, site: &Site, hours: f64) -> Self {
    let performance_ratio = if theoretical_kwh > 0.0 {
      round_to(actual_kwh / theoretical_kwh, 3)
    } else {
      0.0
    };

    let capacity_hours = site.installed_capacity_kw * hours;
    let capacity_factor = if site.installed_capacity_kw > 0.0 && capacity_hours > 0.0 {
      round_to(actual_kwh / capacity_hours, 3)
    } else {
      0.0
    };

    let output_per_panel = if site.panel_count > 0 {
      round_to(actual_kwh / f64::from(site.panel_count), 2)
    } else {
      0.0
    };

    Self { performance_ratio, capacity_factor, output_per_panel }
  }
}

// ─── Derived rows ────────────────────────────────────────────────────────────

/// One row of the `monthly_performance` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPerformance {
  #[serde(flatten)]
  pub period:  Period,
  pub site_id: SiteId,
  #[serde(flatten)]
  pub ratios:  Ratios,
}

/// One row of the `yearly_performance` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyPerformance {
  pub year:    i32,
  pub site_id: SiteId,
  #[serde(flatten)]
  pub ratios:  Ratios,
}

/// One row of the `lifetime_performance` table. The year range is shared by
/// every site in the same rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimePerformance {
  pub site_id:    SiteId,
  pub start_year: i32,
  pub end_year:   i32,
  #[serde(flatten)]
  pub ratios:     Ratios,
}
