//! Encoding and decoding helpers between domain types and the values stored
//! in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text and times of day as `HH:MM:SS`.
//! Periods are split into integer `year` and `month` columns.

use chrono::{NaiveDate, NaiveTime};
use sunyield_core::{
  calendar::Period,
  fact::MonthlyFact,
  metrics::{LifetimePerformance, MonthlyPerformance, Ratios, YearlyPerformance},
  report::SiteRow,
  site::{Site, SiteId, SiteKind},
  weather::{DailyWeather, MonthlyWeather},
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

// ─── Dates and times ─────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_time(time: NaiveTime) -> String { time.format(TIME_FORMAT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FORMAT)
    .map_err(|e| Error::Decode(format!("time {s:?}: {e}")))
}

/// Rejects out-of-range months that slipped past the schema's CHECK.
pub fn decode_period(year: i32, month: u32) -> Result<Period> {
  Ok(Period::new(year, month)?)
}

// ─── SiteKind ────────────────────────────────────────────────────────────────

pub fn encode_site_kind(kind: SiteKind) -> &'static str {
  match kind {
    SiteKind::Physical => "physical",
    SiteKind::Aggregate => "aggregate",
  }
}

pub fn decode_site_kind(s: &str) -> Result<SiteKind> {
  match s {
    "physical" => Ok(SiteKind::Physical),
    "aggregate" => Ok(SiteKind::Aggregate),
    other => Err(sunyield_core::Error::UnknownSiteKind(other.to_owned()).into()),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `sites` row.
pub struct RawSite {
  pub site_id:               u32,
  pub name:                  String,
  pub kind:                  String,
  pub installed_capacity_kw: f64,
  pub panel_count:           u32,
}

impl RawSite {
  pub fn into_site(self) -> Result<Site> {
    Ok(Site {
      id:                    SiteId(self.site_id),
      name:                  self.name,
      kind:                  decode_site_kind(&self.kind)?,
      installed_capacity_kw: self.installed_capacity_kw,
      panel_count:           self.panel_count,
    })
  }
}

/// Raw values read from a `monthly_generation` row.
pub struct RawFact {
  pub year:            i32,
  pub month:           u32,
  pub site_id:         u32,
  pub actual_kwh:      Option<f64>,
  pub theoretical_kwh: Option<f64>,
  pub predicted_kwh:   Option<f64>,
}

impl RawFact {
  pub fn into_fact(self) -> Result<MonthlyFact> {
    Ok(MonthlyFact {
      period:          decode_period(self.year, self.month)?,
      site_id:         SiteId(self.site_id),
      actual_kwh:      self.actual_kwh,
      theoretical_kwh: self.theoretical_kwh,
      predicted_kwh:   self.predicted_kwh,
    })
  }
}

/// Number of optional measurement columns in both weather tables.
pub const WEATHER_MEASURES: usize = 10;

/// Read the [`WEATHER_MEASURES`] consecutive measurement columns starting at
/// `first`.
pub fn read_measures(
  row: &rusqlite::Row<'_>,
  first: usize,
) -> rusqlite::Result<[Option<f64>; WEATHER_MEASURES]> {
  let mut measures = [None; WEATHER_MEASURES];
  for (offset, slot) in measures.iter_mut().enumerate() {
    *slot = row.get(first + offset)?;
  }
  Ok(measures)
}

/// Raw values read from a `weather_daily` row.
pub struct RawDailyWeather {
  pub date:     String,
  pub sunrise:  Option<String>,
  pub sunset:   Option<String>,
  /// Measurements in column order, sunshine duration through rainfall.
  pub measures: [Option<f64>; WEATHER_MEASURES],
}

impl RawDailyWeather {
  pub fn into_daily(self) -> Result<DailyWeather> {
    let [
      sunshine,
      daylight,
      min_temp,
      avg_temp,
      max_temp,
      irradiance,
      humidity,
      cloud,
      wind,
      rainfall,
    ] = self.measures;

    Ok(DailyWeather {
      date:                          decode_date(&self.date)?,
      sunrise:                       self.sunrise.as_deref().map(decode_time).transpose()?,
      sunset:                        self.sunset.as_deref().map(decode_time).transpose()?,
      sunshine_duration_seconds:     sunshine,
      daylight_duration_seconds:     daylight,
      min_temperature_c:             min_temp,
      avg_temperature_c:             avg_temp,
      max_temperature_c:             max_temp,
      avg_solar_irradiance_wm2:      irradiance,
      avg_relative_humidity_percent: humidity,
      avg_cloud_cover_percent:       cloud,
      avg_wind_speed_kmh:            wind,
      rainfall_mm:                   rainfall,
    })
  }
}

/// Raw values read from a `weather_monthly` row.
pub struct RawMonthlyWeather {
  pub year:      i32,
  pub month:     u32,
  pub day_count: u32,
  /// Measurements in column order, average sunshine through total rainfall.
  pub measures:  [Option<f64>; WEATHER_MEASURES],
}

impl RawMonthlyWeather {
  pub fn into_monthly(self) -> Result<MonthlyWeather> {
    let [
      sunshine,
      daylight,
      min_temp,
      avg_temp,
      max_temp,
      irradiance,
      humidity,
      cloud,
      wind,
      rainfall,
    ] = self.measures;

    Ok(MonthlyWeather {
      period:                        decode_period(self.year, self.month)?,
      day_count:                     self.day_count,
      avg_sunshine_duration_seconds: sunshine,
      avg_daylight_duration_seconds: daylight,
      min_temperature_c:             min_temp,
      avg_temperature_c:             avg_temp,
      max_temperature_c:             max_temp,
      avg_solar_irradiance_wm2:      irradiance,
      avg_relative_humidity_percent: humidity,
      avg_cloud_cover_percent:       cloud,
      avg_wind_speed_kmh:            wind,
      total_rainfall_mm:             rainfall,
    })
  }
}

/// A derived-table row joined with its site name. `K` holds the row's time
/// key: `(year, month)`, `year`, or `(start_year, end_year)`.
pub struct RawPerformance<K> {
  pub site_name: String,
  pub site_id:   u32,
  pub key:       K,
  pub ratios:    Ratios,
}

/// Read `performance_ratio`, `capacity_factor` and `output_per_panel` from
/// three consecutive columns starting at `first`.
pub fn read_ratios(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<Ratios> {
  Ok(Ratios {
    performance_ratio: row.get(first)?,
    capacity_factor:   row.get(first + 1)?,
    output_per_panel:  row.get(first + 2)?,
  })
}

impl RawPerformance<(i32, u32)> {
  pub fn into_monthly(self) -> Result<SiteRow<MonthlyPerformance>> {
    let (year, month) = self.key;
    Ok(SiteRow {
      site_name: self.site_name,
      row:       MonthlyPerformance {
        period:  decode_period(year, month)?,
        site_id: SiteId(self.site_id),
        ratios:  self.ratios,
      },
    })
  }
}

impl RawPerformance<i32> {
  pub fn into_yearly(self) -> SiteRow<YearlyPerformance> {
    SiteRow {
      site_name: self.site_name,
      row:       YearlyPerformance {
        year:    self.key,
        site_id: SiteId(self.site_id),
        ratios:  self.ratios,
      },
    }
  }
}

impl RawPerformance<(i32, i32)> {
  pub fn into_lifetime(self) -> SiteRow<LifetimePerformance> {
    let (start_year, end_year) = self.key;
    SiteRow {
      site_name: self.site_name,
      row:       LifetimePerformance {
        site_id: SiteId(self.site_id),
        start_year,
        end_year,
        ratios: self.ratios,
      },
    }
  }
}
