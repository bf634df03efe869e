//! [`Repository`] owns every persisted record.
//!
//! Each role has its own partition stored under one key. Every mutation reads
//! the partition, changes it in memory, and writes the whole partition back;
//! last write wins.
//!
//! A value that fails to decode is quarantined (moved to
//! `quarantine:<key>` in the same tier) and treated as absent. Unrelated keys
//! are never touched.

use std::{collections::BTreeMap, sync::Arc};

use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sitematch_core::{
  identity::{AdminAccount, Employer, Identity, PhoneNumber, Role, Worker},
  profile::{Profile, ProfilePatch},
  session::Session,
  site::{NewSite, SiteRecord, SiteStatus},
  store::{KeyValueStore, Tier},
};
use uuid::Uuid;

use crate::{Error, Result, keys, seed};

// ─── Stored shapes ───────────────────────────────────────────────────────────

/// One row of the worker index. Presence implies registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WorkerEntry {
  pub phone: PhoneNumber,
  pub name:  String,
}

pub(crate) type Profiles = BTreeMap<PhoneNumber, Profile>;

// ─── Repository ──────────────────────────────────────────────────────────────

/// Identity, profile, site, and session records over a [`KeyValueStore`].
pub struct Repository<S> {
  store: Arc<S>,
}

impl<S> Clone for Repository<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: KeyValueStore> Repository<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  // ── Raw JSON access ───────────────────────────────────────────────────────

  async fn read_json<T: DeserializeOwned>(
    &self,
    tier: Tier,
    key: &str,
  ) -> Result<Option<T>> {
    let Some(raw) = self.store.get(tier, key).await.map_err(Error::store)? else {
      return Ok(None);
    };
    match serde_json::from_str(&raw) {
      Ok(value) => Ok(Some(value)),
      Err(e) => {
        self.quarantine(tier, key, &raw, &e).await?;
        Ok(None)
      }
    }
  }

  async fn write_json<T: Serialize + ?Sized>(
    &self,
    tier: Tier,
    key: &str,
    value: &T,
  ) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    self.store.set(tier, key, &raw).await.map_err(Error::store)
  }

  async fn quarantine(
    &self,
    tier: Tier,
    key: &str,
    raw: &str,
    cause: &(dyn std::error::Error + Send + Sync),
  ) -> Result<()> {
    tracing::warn!(%tier, key, error = %cause, "quarantining undecodable value");
    let target = keys::quarantine_key(key);
    self.store.set(tier, &target, raw).await.map_err(Error::store)?;
    self.store.remove(tier, key).await.map_err(Error::store)
  }

  // ── Partitions ────────────────────────────────────────────────────────────

  pub(crate) async fn worker_index(&self) -> Result<Vec<WorkerEntry>> {
    Ok(self.read_json(Tier::Durable, keys::WORKERS).await?.unwrap_or_default())
  }

  pub(crate) async fn save_worker_index(&self, entries: &[WorkerEntry]) -> Result<()> {
    self.write_json(Tier::Durable, keys::WORKERS, entries).await
  }

  pub(crate) async fn profiles(&self) -> Result<Profiles> {
    Ok(self.read_json(Tier::Durable, keys::PROFILES).await?.unwrap_or_default())
  }

  pub(crate) async fn save_profiles(&self, profiles: &Profiles) -> Result<()> {
    self.write_json(Tier::Durable, keys::PROFILES, profiles).await
  }

  pub(crate) async fn employers(&self) -> Result<Vec<Employer>> {
    Ok(self.read_json(Tier::Durable, keys::EMPLOYERS).await?.unwrap_or_default())
  }

  pub(crate) async fn save_employers(&self, employers: &[Employer]) -> Result<()> {
    self.write_json(Tier::Durable, keys::EMPLOYERS, employers).await
  }

  /// `None` when nothing (decodable) is stored.
  pub(crate) async fn stored_sites(&self) -> Result<Option<Vec<SiteRecord>>> {
    self.read_json(Tier::Durable, keys::SITES).await
  }

  pub(crate) async fn save_sites(&self, sites: &[SiteRecord]) -> Result<()> {
    self.write_json(Tier::Durable, keys::SITES, sites).await
  }

  // ── Identities ────────────────────────────────────────────────────────────

  /// Look up an identity by phone within `role`'s partition.
  ///
  /// Admins are not phone-keyed; for [`Role::Admin`] this always returns
  /// `None` (see [`Repository::find_admin`]).
  pub async fn find_by_phone(
    &self,
    role: Role,
    phone: &PhoneNumber,
  ) -> Result<Option<Identity>> {
    Ok(match role {
      Role::Worker => self
        .worker_index()
        .await?
        .into_iter()
        .find(|e| &e.phone == phone)
        .map(|e| Identity::Worker(Worker::registered(e.phone, e.name))),
      Role::Employer => self
        .employers()
        .await?
        .into_iter()
        .find(|e| &e.phone == phone)
        .map(Identity::Employer),
      Role::Admin => None,
    })
  }

  /// Create or replace `identity`, keyed by phone (admins: by username).
  ///
  /// Unregistered workers are rejected: the worker index only ever holds
  /// registered workers. Admin upserts replace the name and role label of an
  /// existing account; while no admin list is stored, the default accounts
  /// are the existing ones and the edited list is written out. New admin
  /// accounts need a credential and go through [`Repository::upsert_admin`].
  pub async fn upsert(&self, identity: &Identity) -> Result<()> {
    match identity {
      Identity::Worker(worker) => {
        let name = match (&worker.name, worker.is_registered) {
          (Some(name), true) => name.clone(),
          _ => return Err(Error::WorkerNotRegistered(worker.phone.clone())),
        };
        let mut index = self.worker_index().await?;
        let entry = WorkerEntry { phone: worker.phone.clone(), name };
        match index.iter_mut().find(|e| e.phone == worker.phone) {
          Some(slot) => *slot = entry,
          None => index.push(entry),
        }
        self.save_worker_index(&index).await
      }
      Identity::Employer(employer) => {
        let mut employers = self.employers().await?;
        match employers.iter_mut().find(|e| e.phone == employer.phone) {
          Some(slot) => *slot = employer.clone(),
          None => employers.push(employer.clone()),
        }
        self.save_employers(&employers).await
      }
      Identity::Admin(admin) => {
        let mut accounts = match self.admin_accounts().await? {
          Some(stored) => stored,
          None => seed::default_admins()?,
        };
        let slot = accounts
          .iter_mut()
          .find(|a| a.username == admin.username)
          .ok_or_else(|| Error::UnknownAdmin(admin.username.clone()))?;
        slot.name = admin.name.clone();
        slot.role = admin.role.clone();
        self.save_admin_accounts(&accounts).await
      }
    }
  }

  /// All identities in `role`'s partition, in stored order.
  pub async fn list(&self, role: Role) -> Result<Vec<Identity>> {
    Ok(match role {
      Role::Worker => self
        .worker_index()
        .await?
        .into_iter()
        .map(|e| Identity::Worker(Worker::registered(e.phone, e.name)))
        .collect(),
      Role::Employer => {
        self.employers().await?.into_iter().map(Identity::Employer).collect()
      }
      Role::Admin => self
        .admin_accounts()
        .await?
        .unwrap_or_default()
        .iter()
        .map(|a| Identity::Admin(a.identity()))
        .collect(),
    })
  }

  pub async fn count(&self, role: Role) -> Result<usize> {
    Ok(match role {
      Role::Worker => self.worker_index().await?.len(),
      Role::Employer => self.employers().await?.len(),
      Role::Admin => self.admin_accounts().await?.map_or(0, |a| a.len()),
    })
  }

  // ── Admin accounts ────────────────────────────────────────────────────────

  /// The stored admin list, or `None` if none is stored.
  pub async fn admin_accounts(&self) -> Result<Option<Vec<AdminAccount>>> {
    self.read_json(Tier::Durable, keys::ADMINS).await
  }

  pub async fn save_admin_accounts(&self, accounts: &[AdminAccount]) -> Result<()> {
    self.write_json(Tier::Durable, keys::ADMINS, accounts).await
  }

  pub async fn find_admin(&self, username: &str) -> Result<Option<AdminAccount>> {
    Ok(
      self
        .admin_accounts()
        .await?
        .unwrap_or_default()
        .into_iter()
        .find(|a| a.username == username),
    )
  }

  /// Create or replace an admin account keyed by username.
  pub async fn upsert_admin(&self, account: AdminAccount) -> Result<()> {
    let mut accounts = self.admin_accounts().await?.unwrap_or_default();
    match accounts.iter_mut().find(|a| a.username == account.username) {
      Some(slot) => *slot = account,
      None => accounts.push(account),
    }
    self.save_admin_accounts(&accounts).await
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  pub async fn profile(&self, phone: &PhoneNumber) -> Result<Option<Profile>> {
    Ok(self.profiles().await?.remove(phone))
  }

  /// Store the profile for a registered worker.
  ///
  /// The worker must already be in the index, and must not have a profile
  /// yet.
  pub async fn create_profile(&self, phone: &PhoneNumber, profile: Profile) -> Result<()> {
    if &profile.phone != phone {
      return Err(Error::ProfilePhoneMismatch {
        expected: phone.clone(),
        found:    profile.phone,
      });
    }
    if self.find_by_phone(Role::Worker, phone).await?.is_none() {
      return Err(Error::WorkerNotRegistered(phone.clone()));
    }
    let mut profiles = self.profiles().await?;
    if profiles.contains_key(phone) {
      return Err(Error::ProfileExists(phone.clone()));
    }
    profiles.insert(phone.clone(), profile);
    self.save_profiles(&profiles).await
  }

  /// Register a worker: store the profile, then index the worker.
  ///
  /// Registration always wins over leftovers. A profile already stored for
  /// the phone, such as one orphaned by a quarantined index, is replaced.
  /// The profile is written first so a failed index write leaves nothing a
  /// retry would trip over.
  pub async fn register_worker(&self, worker: &Worker, profile: Profile) -> Result<()> {
    if profile.phone != worker.phone {
      return Err(Error::ProfilePhoneMismatch {
        expected: worker.phone.clone(),
        found:    profile.phone,
      });
    }
    if !worker.is_registered || worker.name.is_none() {
      return Err(Error::WorkerNotRegistered(worker.phone.clone()));
    }
    let mut profiles = self.profiles().await?;
    if profiles.insert(worker.phone.clone(), profile).is_some() {
      tracing::warn!(phone = %worker.phone, "replacing existing profile at registration");
    }
    self.save_profiles(&profiles).await?;
    self.upsert(&Identity::Worker(worker.clone())).await
  }

  /// Apply `patch` to the profile for `phone`. Returns the updated profile,
  /// or `None` if no profile exists.
  pub async fn update_profile(
    &self,
    phone: &PhoneNumber,
    patch: ProfilePatch,
  ) -> Result<Option<Profile>> {
    let mut profiles = self.profiles().await?;
    let Some(profile) = profiles.get_mut(phone) else {
      return Ok(None);
    };
    profile.apply(patch);
    let updated = profile.clone();
    self.save_profiles(&profiles).await?;
    Ok(Some(updated))
  }

  // ── Sites ─────────────────────────────────────────────────────────────────

  pub async fn sites(&self) -> Result<Vec<SiteRecord>> {
    Ok(self.stored_sites().await?.unwrap_or_default())
  }

  /// Sites open to workers.
  pub async fn approved_sites(&self) -> Result<Vec<SiteRecord>> {
    let mut sites = self.sites().await?;
    sites.retain(|s| s.status == SiteStatus::Approved);
    Ok(sites)
  }

  pub async fn site(&self, id: &str) -> Result<Option<SiteRecord>> {
    Ok(self.sites().await?.into_iter().find(|s| s.id == id))
  }

  pub async fn sites_owned_by(&self, owner: &PhoneNumber) -> Result<Vec<SiteRecord>> {
    let mut sites = self.sites().await?;
    sites.retain(|s| &s.owner_id == owner);
    Ok(sites)
  }

  /// Record a new site for `owner`. New sites start out pending review.
  pub async fn add_site(&self, owner: &PhoneNumber, input: NewSite) -> Result<SiteRecord> {
    let site = SiteRecord {
      id:               format!("site_req_{}", Uuid::new_v4().simple()),
      owner_id:         owner.clone(),
      name:             input.name,
      address:          input.address,
      supervisor_name:  input.supervisor_name,
      supervisor_phone: input.supervisor_phone,
      job_type:         input.job_type,
      status:           SiteStatus::Pending,
      created_at:       Utc::now(),
    };
    let mut sites = self.sites().await?;
    sites.push(site.clone());
    self.save_sites(&sites).await?;
    Ok(site)
  }

  // ── Applied site ──────────────────────────────────────────────────────────

  pub async fn applied_site(&self) -> Result<Option<String>> {
    self
      .store
      .get(Tier::Durable, keys::APPLIED_SITE)
      .await
      .map_err(Error::store)
  }

  pub async fn set_applied_site(&self, site_id: &str) -> Result<()> {
    self
      .store
      .set(Tier::Durable, keys::APPLIED_SITE, site_id)
      .await
      .map_err(Error::store)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  /// Write the session projection to the tier chosen by `remember_me`.
  /// Admin sessions always go to the durable tier.
  pub async fn persist_session(&self, session: &Session) -> Result<()> {
    let raw      = session.identity.projection_json()?;
    let remember = session.remember_me || session.role == Role::Admin;
    self
      .store
      .set_session(keys::session_key(session.role), &raw, remember)
      .await
      .map_err(Error::store)
  }

  /// Load a persisted session for `role`. The ephemeral tier is checked
  /// first; `remember_me` reflects the tier the record came from.
  pub async fn load_session(&self, role: Role) -> Result<Option<Session>> {
    let key = keys::session_key(role);
    for tier in [Tier::Ephemeral, Tier::Durable] {
      let Some(raw) = self.store.get(tier, key).await.map_err(Error::store)? else {
        continue;
      };
      match Identity::from_projection_json(role, &raw) {
        Ok(identity) => {
          return Ok(Some(Session::new(identity, tier == Tier::Durable)));
        }
        Err(e) => self.quarantine(tier, key, &raw, &e).await?,
      }
    }
    Ok(None)
  }

  pub async fn has_durable_session(&self, role: Role) -> Result<bool> {
    Ok(
      self
        .store
        .get(Tier::Durable, keys::session_key(role))
        .await
        .map_err(Error::store)?
        .is_some(),
    )
  }

  /// Remove `role`'s session from both tiers. Idempotent.
  pub async fn clear_session(&self, role: Role) -> Result<()> {
    self
      .store
      .remove_session(keys::session_key(role))
      .await
      .map_err(Error::store)
  }
}
