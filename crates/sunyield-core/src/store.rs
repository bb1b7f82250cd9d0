//! The `GenerationStore` trait.
//!
//! Implemented by storage backends (e.g. `sunyield-store-sqlite`). The
//! pipeline and the binary depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  fact::{FactColumn, FactValue, MonthlyFact},
  metrics::{LifetimePerformance, MonthlyPerformance, YearlyPerformance},
  report::SiteRow,
  site::Site,
  weather::{DailyWeather, MonthlyWeather},
};

/// Abstraction over a sunyield store backend.
///
/// Every write is atomic: a batch upsert or a table replace either commits
/// in full or leaves the store as it was. The `replace_*` methods clear the
/// target table and insert the given rows inside one transaction, so readers
/// never observe a half-rebuilt table.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait GenerationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sites ─────────────────────────────────────────────────────────────

  /// Replace the site catalogue with `sites`: listed sites are inserted or
  /// updated by id, unlisted ones removed. Fails and changes nothing if a
  /// removed site still has stored rows.
  fn register_sites(
    &self,
    sites: Vec<Site>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All registered sites, ordered by id.
  fn list_sites(&self) -> impl Future<Output = Result<Vec<Site>, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Upsert one column of `monthly_generation` for each value, keyed by
  /// (year, month, site). The other columns of existing rows are preserved.
  fn upsert_fact_values(
    &self,
    column: FactColumn,
    values: Vec<FactValue>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// All fact rows, ordered by (year, month, site).
  fn monthly_facts(
    &self,
  ) -> impl Future<Output = Result<Vec<MonthlyFact>, Self::Error>> + Send + '_;

  /// [`Self::monthly_facts`] joined with site names.
  fn generation_report(
    &self,
  ) -> impl Future<Output = Result<Vec<SiteRow<MonthlyFact>>, Self::Error>> + Send + '_;

  // ── Weather ───────────────────────────────────────────────────────────

  /// Insert or replace daily observations by date.
  fn record_daily_weather(
    &self,
    days: Vec<DailyWeather>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// All daily observations, ordered by date.
  fn daily_weather(
    &self,
  ) -> impl Future<Output = Result<Vec<DailyWeather>, Self::Error>> + Send + '_;

  fn replace_monthly_weather(
    &self,
    months: Vec<MonthlyWeather>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// All monthly weather rows, ordered by (year, month).
  fn monthly_weather(
    &self,
  ) -> impl Future<Output = Result<Vec<MonthlyWeather>, Self::Error>> + Send + '_;

  // ── Derived tables ────────────────────────────────────────────────────

  fn replace_monthly_performance(
    &self,
    rows: Vec<MonthlyPerformance>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn replace_yearly_performance(
    &self,
    rows: Vec<YearlyPerformance>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn replace_lifetime_performance(
    &self,
    rows: Vec<LifetimePerformance>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Ordered by (year, month, site).
  fn monthly_performance(
    &self,
  ) -> impl Future<Output = Result<Vec<SiteRow<MonthlyPerformance>>, Self::Error>> + Send + '_;

  /// Ordered by (year, site).
  fn yearly_performance(
    &self,
  ) -> impl Future<Output = Result<Vec<SiteRow<YearlyPerformance>>, Self::Error>> + Send + '_;

  /// Ordered by site.
  fn lifetime_performance(
    &self,
  ) -> impl Future<Output = Result<Vec<SiteRow<LifetimePerformance>>, Self::Error>> + Send + '_;
}
