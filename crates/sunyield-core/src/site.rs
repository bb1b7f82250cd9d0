//! Site registry: the static catalogue of generation sites.
//!
//! A registry holds the physical sites plus exactly one synthetic aggregate
//! site. The aggregate's output series is the sum of the physical sites', but
//! its capacity and panel count are provisioned independently and are only
//! used for its own ratios.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Stable numeric identifier of a site; also the ordering key in reports.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SiteId(pub u32);

impl fmt::Display for SiteId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Whether a site meters its own output or aggregates the physical sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKind {
  #[default]
  Physical,
  Aggregate,
}

/// A generation site with its nameplate figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
  pub id:                    SiteId,
  pub name:                  String,
  #[serde(default)]
  pub kind:                  SiteKind,
  pub installed_capacity_kw: f64,
  pub panel_count:           u32,
}

impl Site {
  pub fn is_aggregate(&self) -> bool { self.kind == SiteKind::Aggregate }
}

/// The catalogue shipped with the system: Awali, Refinery, UOB and the
/// "Total System" aggregate.
pub fn default_sites() -> Vec<Site> {
  let site = |id, name: &str, kind, capacity, panels| Site {
    id: SiteId(id),
    name: name.to_owned(),
    kind,
    installed_capacity_kw: capacity,
    panel_count: panels,
  };
  vec![
    site(1, "Awali", SiteKind::Physical, 1590.0, 6625),
    site(2, "Refinery", SiteKind::Physical, 2892.0, 12050),
    site(3, "UOB", SiteKind::Physical, 518.4, 2160),
    site(4, "Total System", SiteKind::Aggregate, 5000.0, 20835),
  ]
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// A validated, id-ordered set of sites. Immutable for the duration of a
/// pipeline run.
#[derive(Debug, Clone)]
pub struct SiteRegistry {
  sites:     Vec<Site>,
  /// Index of the aggregate site within `sites`.
  aggregate: usize,
}

impl SiteRegistry {
  /// Validate and order `sites`.
  ///
  /// Fails if the set is empty, if an id or name repeats, if there is not
  /// exactly one aggregate site, or if there are no physical sites.
  pub fn new(mut sites: Vec<Site>) -> Result<Self> {
    if sites.is_empty() {
      return Err(Error::EmptyRegistry);
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for site in &sites {
      if !ids.insert(site.id) {
        return Err(Error::DuplicateSite(site.id));
      }
      if !names.insert(site.name.as_str()) {
        return Err(Error::DuplicateSiteName(site.name.clone()));
      }
    }

    let aggregates = sites.iter().filter(|s| s.is_aggregate()).count();
    if aggregates != 1 {
      return Err(Error::AggregateSiteCount(aggregates));
    }
    if sites.len() == aggregates {
      return Err(Error::NoPhysicalSites);
    }

    sites.sort_by_key(|s| s.id);
    Ok(Self::from_sorted(sites))
  }

  /// The registry built from [`default_sites`].
  pub fn builtin() -> Self {
    let mut sites = default_sites();
    sites.sort_by_key(|s| s.id);
    Self::from_sorted(sites)
  }

  fn from_sorted(sites: Vec<Site>) -> Self {
    let aggregate = sites.iter().position(Site::is_aggregate).unwrap_or_default();
    Self { sites, aggregate }
  }

  /// All sites, ordered by id.
  pub fn sites(&self) -> &[Site] { &self.sites }

  pub fn get(&self, id: SiteId) -> Option<&Site> {
    self.sites.iter().find(|s| s.id == id)
  }

  /// The single aggregate site.
  pub fn aggregate(&self) -> &Site { &self.sites[self.aggregate] }

  /// Physical sites in id order.
  pub fn physical(&self) -> impl Iterator<Item = &Site> + '_ {
    self.sites.iter().filter(|s| !s.is_aggregate())
  }

  pub fn is_physical(&self, id: SiteId) -> bool {
    self.get(id).is_some_and(|s| !s.is_aggregate())
  }
}
