//! Site records: job postings owned by an employer.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, identity::PhoneNumber};

/// Review status of a posted site. Only approved sites are listed to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl fmt::Display for SiteStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    })
  }
}

impl FromStr for SiteStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "approved" => Ok(Self::Approved),
      "rejected" => Ok(Self::Rejected),
      other => Err(Error::UnknownSiteStatus(other.to_owned())),
    }
  }
}

/// A job site posted by exactly one employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
  pub id:               String,
  /// Phone of the owning employer.
  pub owner_id:         PhoneNumber,
  pub name:             String,
  pub address:          String,
  pub supervisor_name:  String,
  pub supervisor_phone: PhoneNumber,
  pub job_type:         String,
  pub status:           SiteStatus,
  pub created_at:       DateTime<Utc>,
}

/// Input to a site submission. `id`, `owner_id`, `status` and `created_at`
/// are assigned by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSite {
  pub name:             String,
  pub address:          String,
  pub supervisor_name:  String,
  pub supervisor_phone: PhoneNumber,
  pub job_type:         String,
}
