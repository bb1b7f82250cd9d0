//! Theoretical yield estimation from monthly solar inputs.

use crate::{
  fact::FactValue,
  metrics::round_to,
  site::{Site, SiteRegistry},
  weather::SolarInputs,
};

/// Fraction of DC output surviving inverter conversion.
pub const INVERTER_EFFICIENCY: f64 = 0.915;

/// W·s → kWh.
const WATT_SECONDS_PER_KWH: f64 = 1000.0 * 3600.0;

/// Expected output of one average day, in kWh.
///
/// `capacity_kw × efficiency × (sunshine_s × irradiance_W/m²) / 3.6e6`
pub fn daily_output_kwh(capacity_kw: f64, avg_sunshine_seconds: f64, avg_irradiance_wm2: f64) -> f64 {
  capacity_kw * INVERTER_EFFICIENCY * (avg_sunshine_seconds * avg_irradiance_wm2)
    / WATT_SECONDS_PER_KWH
}

/// Expected output of `site` for the month described by `inputs`, rounded
/// to 2 decimals. The daily figure is not rounded before scaling.
pub fn monthly_output_kwh(site: &Site, inputs: &SolarInputs) -> f64 {
  let daily = daily_output_kwh(
    site.installed_capacity_kw,
    inputs.avg_sunshine_seconds,
    inputs.avg_irradiance_wm2,
  );
  round_to(daily * f64::from(inputs.days), 2)
}

/// One theoretical value per (site, month), every site included. The
/// aggregate site uses its own provisioned capacity.
pub fn theoretical_yield(inputs: &[SolarInputs], registry: &SiteRegistry) -> Vec<FactValue> {
  inputs
    .iter()
    .flat_map(|month| {
      registry.sites().iter().map(move |site| FactValue {
        period:  month.period,
        site_id: site.id,
        kwh:     monthly_output_kwh(site, month),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::{
    calendar::Period,
    site::SiteId,
    weather::{DailyWeather, solar_inputs},
  };

  fn inputs(days: u32) -> SolarInputs {
    SolarInputs {
      period:               Period::new(2019, 1).unwrap(),
      avg_sunshine_seconds: 30_000.0,
      avg_irradiance_wm2:   200.0,
      days,
    }
  }

  #[test]
  fn daily_output_formula() {
    // 1590 × 0.915 × 6e6 / 3.6e6
    assert_relative_eq!(daily_output_kwh(1590.0, 30_000.0, 200.0), 2424.75, epsilon = 1e-9);
  }

  #[test]
  fn monthly_output_scales_by_days_and_rounds() {
    let reg = SiteRegistry::builtin();
    let awali = reg.get(SiteId(1)).unwrap();
    assert_relative_eq!(monthly_output_kwh(awali, &inputs(31)), 75_167.25, epsilon = 1e-9);
  }

  #[test]
  fn every_site_gets_an_estimate_per_month() {
    let reg = SiteRegistry::builtin();
    let values = theoretical_yield(&[inputs(31), inputs(28)], &reg);
    assert_eq!(values.len(), 2 * reg.sites().len());

    let aggregate = values
      .iter()
      .find(|v| v.site_id == reg.aggregate().id)
      .unwrap();
    // Uses the provisioned 5000 kW, not the sum of the physical sites.
    assert_relative_eq!(aggregate.kwh, round_to(daily_output_kwh(5000.0, 30_000.0, 200.0) * 31.0, 2));
  }

  #[test]
  fn day_without_irradiance_still_scales_the_month() {
    let day = |d, irradiance| DailyWeather {
      date: chrono::NaiveDate::from_ymd_opt(2019, 1, d).unwrap(),
      sunshine_duration_seconds: Some(if d == 1 { 30_000.0 } else { 20_000.0 }),
      avg_solar_irradiance_wm2: irradiance,
      ..Default::default()
    };
    let months = solar_inputs(&[day(1, Some(200.0)), day(2, None)]);
    let reg = SiteRegistry::builtin();
    let awali = reg.get(SiteId(1)).unwrap();
    // 1590 × 0.915 × 25000 × 200 / 3.6e6 × 2 days
    assert_relative_eq!(monthly_output_kwh(awali, &months[0]), 4041.25, epsilon = 1e-9);
  }

  #[test]
  fn no_inputs_no_estimates() {
    assert!(theoretical_yield(&[], &SiteRegistry::builtin()).is_empty());
  }
}
