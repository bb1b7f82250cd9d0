//! Monthly generation facts, the base table every pass reads.
//!
//! One row per (year, month, site). Each of the three values is optional and
//! written independently: actuals come from the spreadsheet import (and the
//! aggregate synthesiser), theoretical output from the estimator, predictions
//! from an external forecasting step.

use serde::{Deserialize, Serialize};

use crate::{calendar::Period, site::SiteId};

/// A `monthly_generation` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFact {
  #[serde(flatten)]
  pub period:          Period,
  pub site_id:         SiteId,
  pub actual_kwh:      Option<f64>,
  pub theoretical_kwh: Option<f64>,
  pub predicted_kwh:   Option<f64>,
}

impl MonthlyFact {
  /// Both actual and theoretical output, if both are present.
  pub fn complete(&self) -> Option<(f64, f64)> {
    self.actual_kwh.zip(self.theoretical_kwh)
  }
}

/// Which value of a [`MonthlyFact`] an upsert writes. The other columns of an
/// existing row are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactColumn {
  Actual,
  Theoretical,
  Predicted,
}

impl FactColumn {
  /// The column name in the `monthly_generation` table.
  pub fn column_name(self) -> &'static str {
    match self {
      Self::Actual => "actual_kwh",
      Self::Theoretical => "theoretical_kwh",
      Self::Predicted => "predicted_kwh",
    }
  }
}

/// A single value destined for one column of one fact row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactValue {
  pub period:  Period,
  pub site_id: SiteId,
  pub kwh:     f64,
}
