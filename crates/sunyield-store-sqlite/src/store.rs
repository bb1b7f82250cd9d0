//! [`SqliteStore`], the SQLite implementation of [`GenerationStore`].

use std::path::Path;

use tracing::debug;

use sunyield_core::{
  fact::{FactColumn, FactValue, MonthlyFact},
  metrics::{LifetimePerformance, MonthlyPerformance, YearlyPerformance},
  report::SiteRow,
  site::Site,
  store::GenerationStore,
  weather::{DailyWeather, MonthlyWeather},
};

use crate::{
  encode::{
    encode_date, encode_site_kind, encode_time, read_measures, read_ratios, RawDailyWeather,
    RawFact, RawMonthlyWeather, RawPerformance, RawSite,
  },
  schema::SCHEMA,
  Error, Result,
};

const FACT_COLUMNS: &str = "g.year, g.month, g.site_id, g.actual_kwh, g.theoretical_kwh, g.predicted_kwh";

fn read_fact(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<RawFact> {
  Ok(RawFact {
    year:            row.get(first)?,
    month:           row.get(first + 1)?,
    site_id:         row.get(first + 2)?,
    actual_kwh:      row.get(first + 3)?,
    theoretical_kwh: row.get(first + 4)?,
    predicted_kwh:   row.get(first + 5)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A generation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Clear `table` and insert `rows` with `insert`, all in one transaction.
  /// Any failure rolls the table back to its previous contents.
  async fn replace_table<T, F>(
    &self,
    table: &'static str,
    insert: &'static str,
    rows: Vec<T>,
    bind: F,
  ) -> Result<usize>
  where
    T: Send + 'static,
    F: Fn(&mut rusqlite::Statement<'_>, &T) -> rusqlite::Result<usize> + Send + 'static,
  {
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {table}"), [])?;
        let mut written = 0;
        {
          let mut stmt = tx.prepare(insert)?;
          for row in &rows {
            written += bind(&mut stmt, row)?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    debug!(table, rows = written, "replaced table");
    Ok(written)
  }
}

// ─── GenerationStore impl ────────────────────────────────────────────────────

impl GenerationStore for SqliteStore {
  type Error = Error;

  // ── Sites ─────────────────────────────────────────────────────────────────

  async fn register_sites(&self, sites: Vec<Site>) -> Result<()> {
    let count = sites.len();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut existing = tx.prepare("SELECT site_id FROM sites")?;
          let stale: Vec<u32> = existing
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<u32>>>()?
            .into_iter()
            .filter(|id| !sites.iter().any(|site| site.id.0 == *id))
            .collect();
          let mut delete = tx.prepare("DELETE FROM sites WHERE site_id = ?1")?;
          for id in stale {
            delete.execute([id])?;
          }

          let mut stmt = tx.prepare(
            "INSERT INTO sites (site_id, name, kind, installed_capacity_kw, panel_count)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (site_id) DO UPDATE SET
               name                  = excluded.name,
               kind                  = excluded.kind,
               installed_capacity_kw = excluded.installed_capacity_kw,
               panel_count           = excluded.panel_count",
          )?;
          for site in &sites {
            stmt.execute(rusqlite::params![
              site.id.0,
              site.name,
              encode_site_kind(site.kind),
              site.installed_capacity_kw,
              site.panel_count,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(count, "registered sites");
    Ok(())
  }

  async fn list_sites(&self) -> Result<Vec<Site>> {
    let raws: Vec<RawSite> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT site_id, name, kind, installed_capacity_kw, panel_count
           FROM sites ORDER BY site_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSite {
              site_id:               row.get(0)?,
              name:                  row.get(1)?,
              kind:                  row.get(2)?,
              installed_capacity_kw: row.get(3)?,
              panel_count:           row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSite::into_site).collect()
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn upsert_fact_values(&self, column: FactColumn, values: Vec<FactValue>) -> Result<usize> {
    let col = column.column_name();
    let sql = format!(
      "INSERT INTO monthly_generation (year, month, site_id, {col})
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT (year, month, site_id) DO UPDATE SET {col} = excluded.{col}"
    );

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
          let mut stmt = tx.prepare(&sql)?;
          for v in &values {
            written += stmt.execute(rusqlite::params![
              v.period.year,
              v.period.month,
              v.site_id.0,
              v.kwh,
            ])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    debug!(column = col, rows = written, "upserted fact values");
    Ok(written)
  }

  async fn monthly_facts(&self) -> Result<Vec<MonthlyFact>> {
    let raws: Vec<RawFact> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FACT_COLUMNS} FROM monthly_generation g
           ORDER BY g.year, g.month, g.site_id"
        ))?;
        let rows = stmt
          .query_map([], |row| read_fact(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  async fn generation_report(&self) -> Result<Vec<SiteRow<MonthlyFact>>> {
    let raws: Vec<(String, RawFact)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT s.name, {FACT_COLUMNS}
           FROM monthly_generation g JOIN sites s ON s.site_id = g.site_id
           ORDER BY g.year, g.month, g.site_id"
        ))?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, read_fact(row, 1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(site_name, raw)| Ok(SiteRow { site_name, row: raw.into_fact()? }))
      .collect()
  }

  // ── Weather ───────────────────────────────────────────────────────────────

  async fn record_daily_weather(&self, days: Vec<DailyWeather>) -> Result<usize> {
    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO weather_daily (
               date, sunrise, sunset,
               sunshine_duration_seconds, daylight_duration_seconds,
               min_temperature_c, avg_temperature_c, max_temperature_c,
               avg_solar_irradiance_wm2, avg_relative_humidity_percent,
               avg_cloud_cover_percent, avg_wind_speed_kmh, rainfall_mm
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          )?;
          for d in &days {
            written += stmt.execute(rusqlite::params![
              encode_date(d.date),
              d.sunrise.map(encode_time),
              d.sunset.map(encode_time),
              d.sunshine_duration_seconds,
              d.daylight_duration_seconds,
              d.min_temperature_c,
              d.avg_temperature_c,
              d.max_temperature_c,
              d.avg_solar_irradiance_wm2,
              d.avg_relative_humidity_percent,
              d.avg_cloud_cover_percent,
              d.avg_wind_speed_kmh,
              d.rainfall_mm,
            ])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    debug!(rows = written, "recorded daily weather");
    Ok(written)
  }

  async fn daily_weather(&self) -> Result<Vec<DailyWeather>> {
    let raws: Vec<RawDailyWeather> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT date, sunrise, sunset,
                  sunshine_duration_seconds, daylight_duration_seconds,
                  min_temperature_c, avg_temperature_c, max_temperature_c,
                  avg_solar_irradiance_wm2, avg_relative_humidity_percent,
                  avg_cloud_cover_percent, avg_wind_speed_kmh, rainfall_mm
           FROM weather_daily ORDER BY date",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDailyWeather {
              date:     row.get(0)?,
              sunrise:  row.get(1)?,
              sunset:   row.get(2)?,
              measures: read_measures(row, 3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDailyWeather::into_daily).collect()
  }

  async fn replace_monthly_weather(&self, months: Vec<MonthlyWeather>) -> Result<usize> {
    self
      .replace_table(
        "weather_monthly",
        "INSERT INTO weather_monthly (
           year, month, day_count,
           avg_sunshine_duration_seconds, avg_daylight_duration_seconds,
           min_temperature_c, avg_temperature_c, max_temperature_c,
           avg_solar_irradiance_wm2, avg_relative_humidity_percent,
           avg_cloud_cover_percent, avg_wind_speed_kmh, total_rainfall_mm
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        months,
        |stmt, m: &MonthlyWeather| {
          stmt.execute(rusqlite::params![
            m.period.year,
            m.period.month,
            m.day_count,
            m.avg_sunshine_duration_seconds,
            m.avg_daylight_duration_seconds,
            m.min_temperature_c,
            m.avg_temperature_c,
            m.max_temperature_c,
            m.avg_solar_irradiance_wm2,
            m.avg_relative_humidity_percent,
            m.avg_cloud_cover_percent,
            m.avg_wind_speed_kmh,
            m.total_rainfall_mm,
          ])
        },
      )
      .await
  }

  async fn monthly_weather(&self) -> Result<Vec<MonthlyWeather>> {
    let raws: Vec<RawMonthlyWeather> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT year, month, day_count,
                  avg_sunshine_duration_seconds, avg_daylight_duration_seconds,
                  min_temperature_c, avg_temperature_c, max_temperature_c,
                  avg_solar_irradiance_wm2, avg_relative_humidity_percent,
                  avg_cloud_cover_percent, avg_wind_speed_kmh, total_rainfall_mm
           FROM weather_monthly ORDER BY year, month",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawMonthlyWeather {
              year:      row.get(0)?,
              month:     row.get(1)?,
              day_count: row.get(2)?,
              measures:  read_measures(row, 3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMonthlyWeather::into_monthly).collect()
  }

  // ── Derived tables ────────────────────────────────────────────────────────

  async fn replace_monthly_performance(&self, rows: Vec<MonthlyPerformance>) -> Result<usize> {
    self
      .replace_table(
        "monthly_performance",
        "INSERT INTO monthly_performance (
           year, month, site_id, performance_ratio, capacity_factor, output_per_panel
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rows,
        |stmt, r: &MonthlyPerformance| {
          stmt.execute(rusqlite::params![
            r.period.year,
            r.period.month,
            r.site_id.0,
            r.ratios.performance_ratio,
            r.ratios.capacity_factor,
            r.ratios.output_per_panel,
          ])
        },
      )
      .await
  }

  async fn replace_yearly_performance(&self, rows: Vec<YearlyPerformance>) -> Result<usize> {
    self
      .replace_table(
        "yearly_performance",
        "INSERT INTO yearly_performance (
           year, site_id, performance_ratio, capacity_factor, output_per_panel
         ) VALUES (?1, ?2, ?3, ?4, ?5)",
        rows,
        |stmt, r: &YearlyPerformance| {
          stmt.execute(rusqlite::params![
            r.year,
            r.site_id.0,
            r.ratios.performance_ratio,
            r.ratios.capacity_factor,
            r.ratios.output_per_panel,
          ])
        },
      )
      .await
  }

  async fn replace_lifetime_performance(&self, rows: Vec<LifetimePerformance>) -> Result<usize> {
    self
      .replace_table(
        "lifetime_performance",
        "INSERT INTO lifetime_performance (
           site_id, start_year, end_year, performance_ratio, capacity_factor, output_per_panel
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rows,
        |stmt, r: &LifetimePerformance| {
          stmt.execute(rusqlite::params![
            r.site_id.0,
            r.start_year,
            r.end_year,
            r.ratios.performance_ratio,
            r.ratios.capacity_factor,
            r.ratios.output_per_panel,
          ])
        },
      )
      .await
  }

  async fn monthly_performance(&self) -> Result<Vec<SiteRow<MonthlyPerformance>>> {
    let raws: Vec<RawPerformance<(i32, u32)>> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT s.name, p.site_id, p.year, p.month,
                  p.performance_ratio, p.capacity_factor, p.output_per_panel
           FROM monthly_performance p JOIN sites s ON s.site_id = p.site_id
           ORDER BY p.year, p.month, p.site_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPerformance {
              site_name: row.get(0)?,
              site_id:   row.get(1)?,
              key:       (row.get(2)?, row.get(3)?),
              ratios:    read_ratios(row, 4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerformance::into_monthly).collect()
  }

  async fn yearly_performance(&self) -> Result<Vec<SiteRow<YearlyPerformance>>> {
    let raws: Vec<RawPerformance<i32>> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT s.name, p.site_id, p.year,
                  p.performance_ratio, p.capacity_factor, p.output_per_panel
           FROM yearly_performance p JOIN sites s ON s.site_id = p.site_id
           ORDER BY p.year, p.site_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPerformance {
              site_name: row.get(0)?,
              site_id:   row.get(1)?,
              key:       row.get(2)?,
              ratios:    read_ratios(row, 3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawPerformance::into_yearly).collect())
  }

  async fn lifetime_performance(&self) -> Result<Vec<SiteRow<LifetimePerformance>>> {
    let raws: Vec<RawPerformance<(i32, i32)>> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT s.name, p.site_id, p.start_year, p.end_year,
                  p.performance_ratio, p.capacity_factor, p.output_per_panel
           FROM lifetime_performance p JOIN sites s ON s.site_id = p.site_id
           ORDER BY p.site_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPerformance {
              site_name: row.get(0)?,
              site_id:   row.get(1)?,
              key:       (row.get(2)?, row.get(3)?),
              ratios:    read_ratios(row, 4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawPerformance::into_lifetime).collect())
  }
}
