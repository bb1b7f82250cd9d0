//! Weather observations and their monthly aggregates.
//!
//! Daily rows arrive from the weather archive import with every measurement
//! optional. Two aggregates are derived from them: [`MonthlyWeather`] for
//! reporting, and [`SolarInputs`] for the theoretical yield estimator.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{calendar::Period, fact::MonthlyFact, site::SiteRegistry};

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One `weather_daily` row, keyed by date. Site-independent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyWeather {
  pub date:                          NaiveDate,
  pub sunrise:                       Option<NaiveTime>,
  pub sunset:                        Option<NaiveTime>,
  pub sunshine_duration_seconds:     Option<f64>,
  pub daylight_duration_seconds:     Option<f64>,
  pub min_temperature_c:             Option<f64>,
  pub avg_temperature_c:             Option<f64>,
  pub max_temperature_c:             Option<f64>,
  pub avg_solar_irradiance_wm2:      Option<f64>,
  pub avg_relative_humidity_percent: Option<f64>,
  pub avg_cloud_cover_percent:       Option<f64>,
  pub avg_wind_speed_kmh:            Option<f64>,
  pub rainfall_mm:                   Option<f64>,
}

/// One `weather_monthly` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyWeather {
  #[serde(flatten)]
  pub period:                        Period,
  /// Number of daily rows observed in the month.
  pub day_count:                     u32,
  /// Rounded to whole seconds.
  pub avg_sunshine_duration_seconds: Option<f64>,
  /// Rounded to whole seconds.
  pub avg_daylight_duration_seconds: Option<f64>,
  pub min_temperature_c:             Option<f64>,
  pub avg_temperature_c:             Option<f64>,
  pub max_temperature_c:             Option<f64>,
  pub avg_solar_irradiance_wm2:      Option<f64>,
  pub avg_relative_humidity_percent: Option<f64>,
  pub avg_cloud_cover_percent:       Option<f64>,
  pub avg_wind_speed_kmh:            Option<f64>,
  pub total_rainfall_mm:             Option<f64>,
}

/// Estimator input for one month. Each mean is taken over the days that
/// report that field; `days` counts every daily row in the month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarInputs {
  pub period:               Period,
  pub avg_sunshine_seconds: f64,
  pub avg_irradiance_wm2:   f64,
  pub days:                 u32,
}

// ─── Accumulators ────────────────────────────────────────────────────────────

/// Running aggregate of an optional series; absent values are ignored.
#[derive(Debug, Clone, Copy, Default)]
struct Series {
  sum:   f64,
  count: u32,
  min:   Option<f64>,
  max:   Option<f64>,
}

impl Series {
  fn push(&mut self, value: Option<f64>) {
    let Some(v) = value else { return };
    self.sum += v;
    self.count += 1;
    self.min = Some(self.min.map_or(v, |m| m.min(v)));
    self.max = Some(self.max.map_or(v, |m| m.max(v)));
  }

  fn mean(&self) -> Option<f64> {
    (self.count > 0).then(|| self.sum / f64::from(self.count))
  }

  fn total(&self) -> Option<f64> { (self.count > 0).then_some(self.sum) }
}

#[derive(Debug, Default)]
struct MonthAccumulator {
  days:       u32,
  sunshine:   Series,
  daylight:   Series,
  min_temp:   Series,
  avg_temp:   Series,
  max_temp:   Series,
  irradiance: Series,
  humidity:   Series,
  cloud:      Series,
  wind:       Series,
  rainfall:   Series,
}

impl MonthAccumulator {
  fn push(&mut self, day: &DailyWeather) {
    self.days += 1;
    self.sunshine.push(day.sunshine_duration_seconds);
    self.daylight.push(day.daylight_duration_seconds);
    self.min_temp.push(day.min_temperature_c);
    self.avg_temp.push(day.avg_temperature_c);
    self.max_temp.push(day.max_temperature_c);
    self.irradiance.push(day.avg_solar_irradiance_wm2);
    self.humidity.push(day.avg_relative_humidity_percent);
    self.cloud.push(day.avg_cloud_cover_percent);
    self.wind.push(day.avg_wind_speed_kmh);
    self.rainfall.push(day.rainfall_mm);
  }

  fn finish(self, period: Period) -> MonthlyWeather {
    MonthlyWeather {
      period,
      day_count: self.days,
      avg_sunshine_duration_seconds: self.sunshine.mean().map(f64::round),
      avg_daylight_duration_seconds: self.daylight.mean().map(f64::round),
      min_temperature_c: self.min_temp.min,
      avg_temperature_c: self.avg_temp.mean(),
      max_temperature_c: self.max_temp.max,
      avg_solar_irradiance_wm2: self.irradiance.mean(),
      avg_relative_humidity_percent: self.humidity.mean(),
      avg_cloud_cover_percent: self.cloud.mean(),
      avg_wind_speed_kmh: self.wind.mean(),
      total_rainfall_mm: self.rainfall.total(),
    }
  }
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Aggregate daily rows into one [`MonthlyWeather`] per observed month,
/// ordered by period.
pub fn monthly_weather(daily: &[DailyWeather]) -> Vec<MonthlyWeather> {
  let mut months: BTreeMap<Period, MonthAccumulator> = BTreeMap::new();
  for day in daily {
    months.entry(Period::of(day.date)).or_default().push(day);
  }
  months
    .into_iter()
    .map(|(period, acc)| acc.finish(period))
    .collect()
}

/// Group daily weather by month. A month with no sunshine reading or no
/// irradiance reading is absent from the result, so the estimator writes
/// nothing for it.
pub fn solar_inputs(daily: &[DailyWeather]) -> Vec<SolarInputs> {
  let mut months: BTreeMap<Period, (u32, Series, Series)> = BTreeMap::new();
  for day in daily {
    let (days, sunshine, irradiance) = months.entry(Period::of(day.date)).or_default();
    *days += 1;
    sunshine.push(day.sunshine_duration_seconds);
    irradiance.push(day.avg_solar_irradiance_wm2);
  }

  months
    .into_iter()
    .filter_map(|(period, (days, sunshine, irradiance))| {
      Some(SolarInputs {
        period,
        avg_sunshine_seconds: sunshine.mean()?,
        avg_irradiance_wm2: irradiance.mean()?,
        days,
      })
    })
    .collect()
}

// ─── Weather impact ──────────────────────────────────────────────────────────

/// A monthly weather row paired with the physical sites' combined output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherImpact {
  #[serde(flatten)]
  pub weather:          MonthlyWeather,
  /// Sum of physical-site actual output; absent if no site reported.
  pub total_actual_kwh: Option<f64>,
}

/// Join monthly weather with the summed physical-site actuals per period.
/// The aggregate site is excluded so its synthesised total is not counted
/// twice.
pub fn weather_impact(
  weather: &[MonthlyWeather],
  facts: &[MonthlyFact],
  registry: &SiteRegistry,
) -> Vec<WeatherImpact> {
  let mut totals: BTreeMap<Period, f64> = BTreeMap::new();
  for fact in facts {
    if let Some(actual) = fact.actual_kwh
      && registry.is_physical(fact.site_id)
    {
      *totals.entry(fact.period).or_default() += actual;
    }
  }

  weather
    .iter()
    .map(|w| WeatherImpact {
      weather:          w.clone(),
      total_actual_kwh: totals.get(&w.period).copied(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::site::SiteId;

  fn day(y: i32, m: u32, d: u32, sunshine: Option<f64>, irradiance: Option<f64>) -> DailyWeather {
    DailyWeather {
      date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
      sunshine_duration_seconds: sunshine,
      avg_solar_irradiance_wm2: irradiance,
      ..Default::default()
    }
  }

  #[test]
  fn solar_inputs_average_each_field_over_its_own_readings() {
    let daily = vec![
      day(2019, 1, 1, Some(30_000.0), Some(200.0)),
      day(2019, 1, 2, Some(20_000.0), Some(300.0)),
      day(2019, 1, 3, None, Some(900.0)),
      day(2019, 2, 1, Some(10_000.0), Some(100.0)),
    ];
    let inputs = solar_inputs(&daily);
    assert_eq!(inputs.len(), 2);

    let jan = inputs[0];
    assert_eq!(jan.period, Period::new(2019, 1).unwrap());
    assert_eq!(jan.days, 3);
    assert_relative_eq!(jan.avg_sunshine_seconds, 25_000.0);
    assert_relative_eq!(jan.avg_irradiance_wm2, 1400.0 / 3.0);
    assert_eq!(inputs[1].days, 1);
  }

  #[test]
  fn day_missing_irradiance_still_counts() {
    let daily = vec![
      day(2019, 1, 1, Some(30_000.0), Some(200.0)),
      day(2019, 1, 2, Some(20_000.0), None),
    ];
    let inputs = solar_inputs(&daily);
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].days, 2);
    assert_relative_eq!(inputs[0].avg_sunshine_seconds, 25_000.0);
    assert_relative_eq!(inputs[0].avg_irradiance_wm2, 200.0);
  }

  #[test]
  fn month_missing_a_field_entirely_has_no_inputs() {
    let daily = vec![day(2019, 3, 1, Some(30_000.0), None), day(2019, 3, 2, None, None)];
    assert!(solar_inputs(&daily).is_empty());
  }

  #[test]
  fn monthly_weather_aggregates_each_field() {
    let mut a = day(2018, 6, 1, Some(40_000.4), Some(500.0));
    a.min_temperature_c = Some(30.0);
    a.max_temperature_c = Some(41.0);
    a.avg_temperature_c = Some(35.0);
    a.rainfall_mm = Some(1.5);
    let mut b = day(2018, 6, 2, Some(40_001.0), None);
    b.min_temperature_c = Some(28.5);
    b.max_temperature_c = Some(44.0);
    b.avg_temperature_c = Some(36.0);
    b.rainfall_mm = Some(0.5);

    let months = monthly_weather(&[a, b]);
    assert_eq!(months.len(), 1);
    let june = &months[0];
    assert_eq!(june.day_count, 2);
    assert_eq!(june.avg_sunshine_duration_seconds, Some(40_001.0));
    assert_eq!(june.min_temperature_c, Some(28.5));
    assert_eq!(june.max_temperature_c, Some(44.0));
    assert_eq!(june.avg_temperature_c, Some(35.5));
    assert_eq!(june.avg_solar_irradiance_wm2, Some(500.0));
    assert_eq!(june.total_rainfall_mm, Some(2.0));
    assert_eq!(june.avg_wind_speed_kmh, None);
  }

  #[test]
  fn weather_impact_sums_physical_sites_only() {
    let period = Period::new(2018, 6).unwrap();
    let weather = monthly_weather(&[day(2018, 6, 1, None, None)]);
    let fact = |site, kwh| MonthlyFact {
      period,
      site_id: SiteId(site),
      actual_kwh: Some(kwh),
      theoretical_kwh: None,
      predicted_kwh: None,
    };
    let facts = vec![fact(1, 10.0), fact(2, 20.0), fact(4, 30.0)];

    let impact = weather_impact(&weather, &facts, &SiteRegistry::builtin());
    assert_eq!(impact.len(), 1);
    assert_eq!(impact[0].total_actual_kwh, Some(30.0));
  }
}
