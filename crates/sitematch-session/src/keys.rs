//! Logical storage keys. Only [`crate::repository`] reads or writes them.

use sitematch_core::identity::Role;

/// Worker index: ordered `[{phone, name}]`.
pub const WORKERS: &str = "registeredUsers";
/// Worker profiles: `{ phone: Profile }`.
pub const PROFILES: &str = "userProfiles";
/// Employer identities, ordered.
pub const EMPLOYERS: &str = "employers";
/// Site records, ordered.
pub const SITES: &str = "employerSites";
/// Admin accounts; absent means "use the default fixtures".
pub const ADMINS: &str = "adminUsers";
/// Last site a worker applied to. Durable only.
pub const APPLIED_SITE: &str = "appliedSiteId";

/// Where the active session projection for `role` is stored.
pub fn session_key(role: Role) -> &'static str {
  match role {
    Role::Worker => "currentUser",
    Role::Employer => "currentEmployer",
    Role::Admin => "currentAdmin",
  }
}

/// Where an undecodable value under `key` is moved to.
pub fn quarantine_key(key: &str) -> String { format!("quarantine:{key}") }
