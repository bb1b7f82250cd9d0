//! Error types for `sunyield-core`.

use thiserror::Error;

use crate::site::SiteId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid month {month} in year {year}")]
  InvalidMonth { year: i32, month: u32 },

  #[error("site registry is empty")]
  EmptyRegistry,

  #[error("site id {0} is registered more than once")]
  DuplicateSite(SiteId),

  #[error("site name {0:?} is registered more than once")]
  DuplicateSiteName(String),

  #[error("expected exactly one aggregate site, found {0}")]
  AggregateSiteCount(usize),

  #[error("site registry has no physical sites")]
  NoPhysicalSites,

  /// The lifetime pass needs at least one month with both actual and
  /// theoretical output to fix its year range.
  #[error("no month has both actual and theoretical output")]
  NoObservedYears,

  #[error("unknown site kind discriminant: {0:?}")]
  UnknownSiteKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
