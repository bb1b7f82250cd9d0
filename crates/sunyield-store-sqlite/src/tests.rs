//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveTime};
use sunyield_core::{
  calendar::Period,
  fact::{FactColumn, FactValue},
  metrics::{LifetimePerformance, Ratios, YearlyPerformance},
  pipeline::{Pipeline, Stage},
  site::{default_sites, Site, SiteId, SiteKind, SiteRegistry},
  store::GenerationStore,
  weather::{monthly_weather, DailyWeather},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  store.register_sites(default_sites()).await.unwrap();
  store
}

fn value(year: i32, month: u32, site: u32, kwh: f64) -> FactValue {
  FactValue {
    period: Period::new(year, month).unwrap(),
    site_id: SiteId(site),
    kwh,
  }
}

fn ratios(pr: f64) -> Ratios {
  Ratios { performance_ratio: pr, capacity_factor: 0.2, output_per_panel: 12.5 }
}

fn yearly(year: i32, site: u32, pr: f64) -> YearlyPerformance {
  YearlyPerformance { year, site_id: SiteId(site), ratios: ratios(pr) }
}

// ─── Sites ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sites_round_trip_in_id_order() {
  let s = store().await;
  let sites = s.list_sites().await.unwrap();
  assert_eq!(sites, default_sites());
  assert_eq!(sites[3].kind, SiteKind::Aggregate);
}

#[tokio::test]
async fn registering_again_updates_in_place() {
  let s = store().await;
  let mut sites = default_sites();
  sites[2].panel_count = 2200;
  s.register_sites(sites).await.unwrap();

  let stored = s.list_sites().await.unwrap();
  assert_eq!(stored.len(), 4);
  assert_eq!(stored[2].panel_count, 2200);
}

#[tokio::test]
async fn registering_a_new_catalogue_drops_unlisted_sites() {
  let s = store().await;
  let site = |id, name: &str, kind, capacity| Site {
    id: SiteId(id),
    name: name.to_owned(),
    kind,
    installed_capacity_kw: capacity,
    panel_count: 1000,
  };
  s.register_sites(vec![
    site(10, "North array", SiteKind::Physical, 250.0),
    site(99, "Campus", SiteKind::Aggregate, 250.0),
  ])
  .await
  .unwrap();

  let stored = s.list_sites().await.unwrap();
  assert_eq!(stored.iter().map(|s| s.id).collect::<Vec<_>>(), [SiteId(10), SiteId(99)]);
  assert!(SiteRegistry::new(stored).is_ok());
  // The stored catalogue loads as a registry again.
  assert!(Pipeline::only([Stage::AggregateSite]).run(&s).await.is_ok());
}

#[tokio::test]
async fn dropping_a_site_with_facts_is_rejected() {
  let s = store().await;
  s.upsert_fact_values(FactColumn::Actual, vec![value(2019, 1, 1, 100.0)])
    .await
    .unwrap();

  let without_awali: Vec<_> = default_sites().into_iter().skip(1).collect();
  let err = s.register_sites(without_awali).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)));
  assert_eq!(s.list_sites().await.unwrap(), default_sites());
}

// ─── Facts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upserting_one_column_preserves_the_others() {
  let s = store().await;
  s.upsert_fact_values(FactColumn::Actual, vec![value(2019, 1, 1, 100.0)])
    .await
    .unwrap();
  s.upsert_fact_values(FactColumn::Predicted, vec![value(2019, 1, 1, 95.0)])
    .await
    .unwrap();
  s.upsert_fact_values(FactColumn::Theoretical, vec![value(2019, 1, 1, 120.0)])
    .await
    .unwrap();

  let facts = s.monthly_facts().await.unwrap();
  assert_eq!(facts.len(), 1);
  assert_eq!(facts[0].actual_kwh, Some(100.0));
  assert_eq!(facts[0].theoretical_kwh, Some(120.0));
  assert_eq!(facts[0].predicted_kwh, Some(95.0));
}

#[tokio::test]
async fn upserting_the_same_column_overwrites() {
  let s = store().await;
  s.upsert_fact_values(FactColumn::Theoretical, vec![value(2019, 1, 2, 10.0)])
    .await
    .unwrap();
  s.upsert_fact_values(FactColumn::Theoretical, vec![value(2019, 1, 2, 11.5)])
    .await
    .unwrap();

  let facts = s.monthly_facts().await.unwrap();
  assert_eq!(facts.len(), 1);
  assert_eq!(facts[0].theoretical_kwh, Some(11.5));
  assert_eq!(facts[0].actual_kwh, None);
}

#[tokio::test]
async fn facts_are_ordered_by_period_then_site() {
  let s = store().await;
  s.upsert_fact_values(FactColumn::Actual, vec![
    value(2019, 2, 1, 1.0),
    value(2018, 12, 3, 2.0),
    value(2019, 1, 2, 3.0),
    value(2019, 1, 1, 4.0),
  ])
  .await
  .unwrap();

  let keys: Vec<_> = s
    .monthly_facts()
    .await
    .unwrap()
    .into_iter()
    .map(|f| (f.period.to_string(), f.site_id.0))
    .collect();
  assert_eq!(keys, [
    ("2018-12".to_owned(), 3),
    ("2019-01".to_owned(), 1),
    ("2019-01".to_owned(), 2),
    ("2019-02".to_owned(), 1),
  ]);
}

#[tokio::test]
async fn facts_for_unknown_sites_are_rejected() {
  let s = store().await;
  let err = s
    .upsert_fact_values(FactColumn::Actual, vec![value(2019, 1, 1, 1.0), value(2019, 1, 99, 1.0)])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));
  // The whole batch rolled back.
  assert!(s.monthly_facts().await.unwrap().is_empty());
}

#[tokio::test]
async fn generation_report_carries_site_names() {
  let s = store().await;
  s.upsert_fact_values(FactColumn::Actual, vec![value(2019, 1, 2, 5.0), value(2019, 1, 4, 5.0)])
    .await
    .unwrap();

  let report = s.generation_report().await.unwrap();
  let names: Vec<_> = report.iter().map(|r| r.site_name.as_str()).collect();
  assert_eq!(names, ["Refinery", "Total System"]);
  assert_eq!(report[0].row.actual_kwh, Some(5.0));
}

// ─── Weather ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn daily_weather_round_trips_optional_fields() {
  let s = store().await;
  let day = DailyWeather {
    date: NaiveDate::from_ymd_opt(2019, 7, 14).unwrap(),
    sunrise: NaiveTime::from_hms_opt(4, 51, 0),
    sunset: NaiveTime::from_hms_opt(18, 33, 12),
    sunshine_duration_seconds: Some(41_200.0),
    avg_solar_irradiance_wm2: Some(312.5),
    max_temperature_c: Some(46.1),
    ..Default::default()
  };
  let bare = DailyWeather {
    date: NaiveDate::from_ymd_opt(2019, 7, 13).unwrap(),
    ..Default::default()
  };
  s.record_daily_weather(vec![day.clone(), bare.clone()]).await.unwrap();

  assert_eq!(s.daily_weather().await.unwrap(), [bare, day]);
}

#[tokio::test]
async fn recording_a_date_twice_replaces_it() {
  let s = store().await;
  let date = NaiveDate::from_ymd_opt(2019, 7, 14).unwrap();
  let first = DailyWeather { date, rainfall_mm: Some(3.0), ..Default::default() };
  let second = DailyWeather { date, rainfall_mm: Some(0.0), ..Default::default() };
  s.record_daily_weather(vec![first]).await.unwrap();
  s.record_daily_weather(vec![second.clone()]).await.unwrap();

  assert_eq!(s.daily_weather().await.unwrap(), [second]);
}

#[tokio::test]
async fn monthly_weather_replace_round_trips() {
  let s = store().await;
  let days: Vec<_> = (1..=3)
    .map(|d| DailyWeather {
      date: NaiveDate::from_ymd_opt(2019, 8, d).unwrap(),
      sunshine_duration_seconds: Some(40_000.0 + f64::from(d)),
      rainfall_mm: Some(0.5),
      ..Default::default()
    })
    .collect();
  let months = monthly_weather(&days);

  assert_eq!(s.replace_monthly_weather(months.clone()).await.unwrap(), 1);
  assert_eq!(s.monthly_weather().await.unwrap(), months);
}

// ─── Derived tables ──────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_discards_previous_rows() {
  let s = store().await;
  s.replace_yearly_performance(vec![yearly(2018, 1, 0.8), yearly(2018, 2, 0.7)])
    .await
    .unwrap();
  s.replace_yearly_performance(vec![yearly(2019, 3, 0.9)])
    .await
    .unwrap();

  let rows = s.yearly_performance().await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].site_name, "UOB");
  assert_eq!(rows[0].row, yearly(2019, 3, 0.9));
}

#[tokio::test]
async fn failed_replace_leaves_previous_table_intact() {
  let s = store().await;
  let before = vec![yearly(2018, 1, 0.8), yearly(2018, 2, 0.7)];
  s.replace_yearly_performance(before.clone()).await.unwrap();

  // Duplicate (year, site) violates the table's uniqueness constraint
  // after the delete has already run inside the transaction.
  let err = s
    .replace_yearly_performance(vec![yearly(2019, 1, 0.5), yearly(2019, 1, 0.6)])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));

  let rows: Vec<_> = s
    .yearly_performance()
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.row)
    .collect();
  assert_eq!(rows, before);
}

#[tokio::test]
async fn lifetime_rows_round_trip() {
  let s = store().await;
  let row = LifetimePerformance {
    site_id:    SiteId(4),
    start_year: 2017,
    end_year:   2020,
    ratios:     ratios(0.812),
  };
  assert_eq!(s.replace_lifetime_performance(vec![row.clone()]).await.unwrap(), 1);

  let rows = s.lifetime_performance().await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].site_name, "Total System");
  assert_eq!(rows[0].row, row);
}

#[tokio::test]
async fn reopening_a_file_store_keeps_data() {
  let dir = std::env::temp_dir().join(format!("sunyield-test-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("reopen.db");
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.register_sites(default_sites()).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.list_sites().await.unwrap().len(), 4);

  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}
