//! Read models handed to the reporting layer.

use serde::{Deserialize, Serialize};

/// A stored row joined with the name of its site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRow<T> {
  pub site_name: String,
  #[serde(flatten)]
  pub row:       T,
}
