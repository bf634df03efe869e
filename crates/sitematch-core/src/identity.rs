//! Role-scoped identities: the records a person or organisation is known by.
//!
//! Workers and employers are keyed by phone number; each role has its own
//! partition, so the same phone may be both a worker and an employer.
//! Admins are keyed by username instead.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── PhoneNumber ─────────────────────────────────────────────────────────────

/// The primary external identifier for worker and employer identities.
///
/// Not validated beyond what the input layer already does; equality is plain
/// string equality.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PhoneNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for PhoneNumber {
  fn from(raw: &str) -> Self { Self::new(raw) }
}

impl From<String> for PhoneNumber {
  fn from(raw: String) -> Self { Self(raw) }
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// Which application surface an identity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Worker,
  Employer,
  Admin,
}

impl Role {
  /// Roles that log in with a phone number and a verification step.
  pub const PHONE_ROLES: [Role; 2] = [Role::Worker, Role::Employer];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Worker => "worker",
      Self::Employer => "employer",
      Self::Admin => "admin",
    }
  }

  /// Label shown on the landing role selector.
  pub fn label(self) -> &'static str {
    match self {
      Self::Worker => "근로자",
      Self::Employer => "구인자",
      Self::Admin => "관리자",
    }
  }

  /// Test account hint shown under the login form.
  pub fn test_hint(self) -> &'static str {
    match self {
      Self::Worker => "01011112222",
      Self::Employer => "01099998888",
      Self::Admin => "master / 1",
    }
  }

  pub fn uses_phone_login(self) -> bool { !matches!(self, Self::Admin) }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "worker" | "user" => Ok(Self::Worker),
      "employer" => Ok(Self::Employer),
      "admin" => Ok(Self::Admin),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

// ─── Variants ────────────────────────────────────────────────────────────────

/// A worker looking for site jobs.
///
/// `name` stays `None` until registration completes; only registered workers
/// are ever written to the worker index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
  pub phone:         PhoneNumber,
  pub name:          Option<String>,
  pub is_registered: bool,
}

impl Worker {
  /// Placeholder for a verified phone with no registration yet.
  pub fn unregistered(phone: PhoneNumber) -> Self {
    Self { phone, name: None, is_registered: false }
  }

  pub fn registered(phone: PhoneNumber, name: impl Into<String>) -> Self {
    Self { phone, name: Some(name.into()), is_registered: true }
  }
}

/// An employer (site owner / supervisor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employer {
  pub phone:         PhoneNumber,
  pub name:          String,
  pub company_name:  String,
  pub is_registered: bool,
}

impl Employer {
  pub fn unregistered(phone: PhoneNumber) -> Self {
    Self {
      phone,
      name: String::new(),
      company_name: String::new(),
      is_registered: false,
    }
  }

  pub fn registered(
    phone: PhoneNumber,
    name: impl Into<String>,
    company_name: impl Into<String>,
  ) -> Self {
    Self {
      phone,
      name: name.into(),
      company_name: company_name.into(),
      is_registered: true,
    }
  }
}

/// The session-facing projection of an admin account. Never carries the
/// credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
  pub username: String,
  pub name:     String,
  /// Free-form role label, e.g. `super` or `manager`.
  pub role:     String,
}

/// A stored admin account: the admin identity plus its argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
  pub username:      String,
  pub name:          String,
  pub role:          String,
  pub password_hash: String,
}

impl AdminAccount {
  pub fn identity(&self) -> Admin {
    Admin {
      username: self.username.clone(),
      name:     self.name.clone(),
      role:     self.role.clone(),
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// A role-scoped identity record. The variant is tagged as `kind`, since
/// admin records carry their own `role` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
  Worker(Worker),
  Employer(Employer),
  Admin(Admin),
}

impl Identity {
  pub fn role(&self) -> Role {
    match self {
      Self::Worker(_) => Role::Worker,
      Self::Employer(_) => Role::Employer,
      Self::Admin(_) => Role::Admin,
    }
  }

  /// The phone key, for the phone-based roles.
  pub fn phone(&self) -> Option<&PhoneNumber> {
    match self {
      Self::Worker(w) => Some(&w.phone),
      Self::Employer(e) => Some(&e.phone),
      Self::Admin(_) => None,
    }
  }

  pub fn display_name(&self) -> Option<&str> {
    match self {
      Self::Worker(w) => w.name.as_deref(),
      Self::Employer(e) => (!e.name.is_empty()).then_some(e.name.as_str()),
      Self::Admin(a) => Some(a.name.as_str()),
    }
  }

  /// Admins exist only as registered accounts.
  pub fn is_registered(&self) -> bool {
    match self {
      Self::Worker(w) => w.is_registered,
      Self::Employer(e) => e.is_registered,
      Self::Admin(_) => true,
    }
  }

  /// Serialise the bare variant. This is the shape stored under the session keys.
  pub fn projection_json(&self) -> crate::Result<String> {
    Ok(match self {
      Self::Worker(w) => serde_json::to_string(w)?,
      Self::Employer(e) => serde_json::to_string(e)?,
      Self::Admin(a) => serde_json::to_string(a)?,
    })
  }

  /// Inverse of [`Identity::projection_json`] for a known role.
  pub fn from_projection_json(role: Role, raw: &str) -> crate::Result<Self> {
    Ok(match role {
      Role::Worker => Self::Worker(serde_json::from_str(raw)?),
      Role::Employer => Self::Employer(serde_json::from_str(raw)?),
      Role::Admin => Self::Admin(serde_json::from_str(raw)?),
    })
  }
}
