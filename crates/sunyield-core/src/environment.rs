//! Environmental impact of the generated energy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  fact::MonthlyFact,
  site::{SiteId, SiteRegistry},
};

/// Grid intensity displaced by solar output (natural gas), gCO₂/kWh.
pub const CARBON_INTENSITY_G_PER_KWH: f64 = 400.0;

/// CO₂ absorbed by one tree per year, kg.
pub const TREE_ABSORPTION_KG_PER_YEAR: f64 = 21.0;

/// Horizon over which tree absorption is counted, years.
pub const TREE_HORIZON_YEARS: f64 = 5.0;

pub fn co2_offset_kg(generation_kwh: f64) -> f64 {
  generation_kwh * CARBON_INTENSITY_G_PER_KWH / 1000.0
}

pub fn equivalent_trees(co2_offset_kg: f64) -> f64 {
  co2_offset_kg / (TREE_ABSORPTION_KG_PER_YEAR * TREE_HORIZON_YEARS)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteImpact {
  pub site_id:          SiteId,
  pub site_name:        String,
  pub generation_kwh:   f64,
  pub co2_offset_kg:    f64,
  pub equivalent_trees: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalImpact {
  pub sites:                  Vec<SiteImpact>,
  pub total_co2_offset_kg:    f64,
  pub total_equivalent_trees: f64,
}

/// Impact of every physical site's lifetime actual output. The aggregate
/// site is left out; its figures are the totals.
pub fn environmental_impact(facts: &[MonthlyFact], registry: &SiteRegistry) -> EnvironmentalImpact {
  let mut generation: BTreeMap<SiteId, f64> = BTreeMap::new();
  for fact in facts {
    if let Some(actual) = fact.actual_kwh {
      *generation.entry(fact.site_id).or_default() += actual;
    }
  }

  let sites: Vec<SiteImpact> = registry
    .physical()
    .map(|site| {
      let generation_kwh = generation.get(&site.id).copied().unwrap_or_default();
      let co2 = co2_offset_kg(generation_kwh);
      SiteImpact {
        site_id: site.id,
        site_name: site.name.clone(),
        generation_kwh,
        co2_offset_kg: co2,
        equivalent_trees: equivalent_trees(co2),
      }
    })
    .collect();

  EnvironmentalImpact {
    total_co2_offset_kg: sites.iter().map(|s| s.co2_offset_kg).sum(),
    total_equivalent_trees: sites.iter().map(|s| s.equivalent_trees).sum(),
    sites,
  }
}
