//! The role router: decides which surface is mounted and mediates every
//! action that crosses role boundaries.
//!
//! Routing itself is [`surface_for`], a pure function of the session state.
//! [`RoleRouter`] wraps the [`SessionMachine`] with the load-time work
//! (seeding, admin fixtures, rehydration) and the per-role actions child
//! surfaces may trigger. Children see a [`SurfaceContext`], never the
//! repository.

use std::sync::Arc;

use serde::Serialize;
use sitematch_core::{
  identity::{AdminAccount, Identity, PhoneNumber, Role},
  profile::{Profile, ProfilePatch, Registration},
  session::Session,
  site::{NewSite, SiteRecord, SiteStatus},
  store::KeyValueStore,
};

use crate::{
  Result,
  completion::{Completion, Latency},
  machine::{SessionMachine, SessionState},
  repository::Repository,
  seed,
};

// ─── Surfaces ────────────────────────────────────────────────────────────────

/// The application surface mounted for a given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "surface", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Surface {
  Landing {
    role:      Role,
    /// Set while a phone is awaiting verification.
    verifying: Option<PhoneNumber>,
    /// The remember-me choice made with the phone, to prefill the verify
    /// step.
    remember:  bool,
  },
  Worker {
    needs_registration: bool,
  },
  Employer {
    needs_registration: bool,
  },
  Admin,
}

pub fn surface_for(state: &SessionState) -> Surface {
  match state {
    SessionState::Anonymous | SessionState::RoleSelected(_) => Surface::Landing {
      role:      state.landing_role(),
      verifying: None,
      remember:  false,
    },
    SessionState::PendingVerification { role, phone, remember } => Surface::Landing {
      role:      *role,
      verifying: Some(phone.clone()),
      remember:  *remember,
    },
    SessionState::Authenticated(session) => match &session.identity {
      Identity::Worker(w) => Surface::Worker { needs_registration: !w.is_registered },
      Identity::Employer(e) => Surface::Employer { needs_registration: !e.is_registered },
      Identity::Admin(_) => Surface::Admin,
    },
  }
}

/// A form submission waiting out its delay.
enum Pending {
  Registration(Completion<Registration>),
  EmployerRegistration(Completion<(String, String)>),
  ProfileUpdate(Completion<ProfilePatch>),
}

/// What a mounted role surface is allowed to see.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceContext<'a> {
  pub surface:      Surface,
  pub session:      Option<&'a Session>,
  pub profile:      Option<&'a Profile>,
  pub applied_site: Option<&'a str>,
  pub loading:      bool,
}

// ─── Router ──────────────────────────────────────────────────────────────────

pub struct RoleRouter<S> {
  repo:           Arc<Repository<S>>,
  machine:        SessionMachine<S>,
  latency:        Latency,
  admins:         Vec<AdminAccount>,
  default_admins: Option<Vec<AdminAccount>>,
  pending:        Option<Pending>,
  profile:        Option<Profile>,
  applied_site:   Option<String>,
}

impl<S: KeyValueStore> RoleRouter<S> {
  pub fn new(store: Arc<S>, latency: Latency) -> Self {
    let repo = Arc::new(Repository::new(store));
    Self {
      machine: SessionMachine::new(Arc::clone(&repo)),
      repo,
      latency,
      admins: Vec::new(),
      default_admins: None,
      pending: None,
      profile: None,
      applied_site: None,
    }
  }

  /// Application load: seed fixtures, load the admin list, and restore any
  /// persisted session.
  pub async fn mount(&mut self) -> Result<Surface> {
    seed::seed(self.repo.as_ref()).await?;
    self.reload_admins().await?;
    self.machine.rehydrate().await?;
    self.refresh_worker_view().await?;
    Ok(self.surface())
  }

  pub fn surface(&self) -> Surface { surface_for(self.machine.state()) }

  pub fn state(&self) -> &SessionState { self.machine.state() }

  pub fn session(&self) -> Option<&Session> { self.machine.session() }

  pub fn profile(&self) -> Option<&Profile> { self.profile.as_ref() }

  pub fn applied_site(&self) -> Option<&str> { self.applied_site.as_deref() }

  /// True between beginning a submission and finishing it.
  pub fn is_loading(&self) -> bool { self.pending.is_some() }

  pub fn admins(&self) -> &[AdminAccount] { &self.admins }

  pub fn context(&self) -> SurfaceContext<'_> {
    SurfaceContext {
      surface:      self.surface(),
      session:      self.session(),
      profile:      self.profile(),
      applied_site: self.applied_site(),
      loading:      self.is_loading(),
    }
  }

  /// Replace the in-memory admin list with the stored one, or with the
  /// defaults when nothing is stored. Defaults are not written back.
  async fn reload_admins(&mut self) -> Result<()> {
    self.admins = match self.repo.admin_accounts().await? {
      Some(stored) => stored,
      None => match &self.default_admins {
        Some(defaults) => defaults.clone(),
        None => {
          let defaults = seed::default_admins()?;
          self.default_admins = Some(defaults.clone());
          defaults
        }
      },
    };
    tracing::debug!(count = self.admins.len(), "loaded admin list");
    Ok(())
  }

  /// Reload the profile and applied site for a worker session; clear them
  /// otherwise. A missing profile is left as `None`.
  async fn refresh_worker_view(&mut self) -> Result<()> {
    let phone = match self.session().map(|s| &s.identity) {
      Some(Identity::Worker(w)) if w.is_registered => Some(w.phone.clone()),
      _ => None,
    };
    match phone {
      Some(phone) => {
        self.profile = self.repo.profile(&phone).await?;
        if self.profile.is_none() {
          tracing::warn!(%phone, "registered worker has no profile");
        }
        self.applied_site = self.repo.applied_site().await?;
      }
      None => {
        self.profile = None;
        self.applied_site = None;
      }
    }
    Ok(())
  }

  // ── Landing ───────────────────────────────────────────────────────────────

  pub fn select_role(&mut self, role: Role) -> Surface {
    self.machine.select_role(role);
    self.surface()
  }

  pub fn submit_phone(&mut self, phone: PhoneNumber, remember: bool) -> Surface {
    self.machine.submit_phone(phone, remember);
    self.surface()
  }

  pub fn back(&mut self) -> Surface {
    self.machine.back();
    self.surface()
  }

  pub async fn confirm_verification(&mut self, remember: bool) -> Result<Surface> {
    self.machine.confirm_verification(remember).await?;
    self.refresh_worker_view().await?;
    Ok(self.surface())
  }

  /// Check admin credentials against the loaded admin list.
  pub async fn admin_login(&mut self, username: &str, password: &str) -> Result<bool> {
    self.machine.admin_login(&self.admins, username, password).await
  }

  /// Tear down the session and return to landing.
  pub async fn logout(&mut self) -> Result<Surface> {
    self.machine.logout().await?;
    self.profile = None;
    self.applied_site = None;
    self.reload_admins().await?;
    Ok(self.surface())
  }

  // ── Worker ────────────────────────────────────────────────────────────────

  /// Start the registration delay. Returns `false` if a submission is
  /// already in flight.
  pub fn begin_registration(&mut self, registration: Registration) -> bool {
    let delay = self.latency.registration;
    self.begin(|| Pending::Registration(Completion::schedule(delay, registration)))
  }

  /// Start the profile-update delay. Returns `false` if a submission is
  /// already in flight.
  pub fn begin_profile_update(&mut self, patch: ProfilePatch) -> bool {
    let delay = self.latency.profile_update;
    self.begin(|| Pending::ProfileUpdate(Completion::schedule(delay, patch)))
  }

  fn begin(&mut self, schedule: impl FnOnce() -> Pending) -> bool {
    if self.pending.is_some() {
      tracing::debug!("submission ignored: another one is in flight");
      return false;
    }
    self.pending = Some(schedule());
    true
  }

  /// Wait for the in-flight submission and commit it. Returns whether
  /// anything was committed; `false` when nothing was pending or the session
  /// no longer fits the form.
  pub async fn finish_submission(&mut self) -> Result<bool> {
    let Some(pending) = self.pending.take() else {
      return Ok(false);
    };
    self.commit(pending).await
  }

  async fn commit(&mut self, pending: Pending) -> Result<bool> {
    match pending {
      Pending::Registration(completion) => {
        let registration = completion.wait().await?;
        let Some(profile) = self.machine.complete_registration(registration).await? else {
          return Ok(false);
        };
        self.profile = Some(profile);
        self.applied_site = self.repo.applied_site().await?;
        Ok(true)
      }
      Pending::EmployerRegistration(completion) => {
        let (name, company) = completion.wait().await?;
        let session = self.machine.complete_employer_registration(name, company).await?;
        Ok(session.is_some())
      }
      Pending::ProfileUpdate(completion) => {
        let patch = completion.wait().await?;
        let Some(profile) = self.machine.complete_profile_update(patch).await? else {
          return Ok(false);
        };
        self.profile = Some(profile);
        Ok(true)
      }
    }
  }

  /// Submit the registration form and wait for it to commit.
  pub async fn submit_registration(
    &mut self,
    registration: Registration,
  ) -> Result<Option<&Profile>> {
    if !self.begin_registration(registration) || !self.finish_submission().await? {
      return Ok(None);
    }
    Ok(self.profile.as_ref())
  }

  /// Submit a profile edit and wait for it to commit.
  pub async fn submit_profile_update(
    &mut self,
    patch: ProfilePatch,
  ) -> Result<Option<&Profile>> {
    if !self.begin_profile_update(patch) || !self.finish_submission().await? {
      return Ok(None);
    }
    Ok(self.profile.as_ref())
  }

  /// Approved sites, open to workers.
  pub async fn sites(&self) -> Result<Vec<SiteRecord>> { self.repo.approved_sites().await }

  /// Record an application to `site_id`. Only a registered worker may apply,
  /// and only to an approved site that exists.
  pub async fn apply_for_site(&mut self, site_id: &str) -> Result<bool> {
    let registered_worker = matches!(
      self.session().map(|s| &s.identity),
      Some(Identity::Worker(w)) if w.is_registered
    );
    if !registered_worker {
      tracing::debug!(site_id, "application ignored: no registered worker session");
      return Ok(false);
    }
    match self.repo.site(site_id).await? {
      Some(site) if site.status == SiteStatus::Approved => {
        self.repo.set_applied_site(site_id).await?;
        self.applied_site = Some(site_id.to_owned());
        tracing::info!(site_id, "applied for site");
        Ok(true)
      }
      _ => {
        tracing::debug!(site_id, "application ignored: no such open site");
        Ok(false)
      }
    }
  }

  // ── Employer ──────────────────────────────────────────────────────────────

  /// Start the employer registration delay. Returns `false` if a
  /// submission is already in flight.
  pub fn begin_employer_registration(&mut self, name: String, company_name: String) -> bool {
    let delay = self.latency.registration;
    self.begin(|| Pending::EmployerRegistration(Completion::schedule(delay, (name, company_name))))
  }

  /// Submit the employer registration form and wait for it to commit.
  pub async fn submit_employer_registration(
    &mut self,
    name: String,
    company_name: String,
  ) -> Result<Option<&Session>> {
    if !self.begin_employer_registration(name, company_name) || !self.finish_submission().await? {
      return Ok(None);
    }
    Ok(self.session())
  }

  fn registered_employer(&self) -> Option<PhoneNumber> {
    match self.session().map(|s| &s.identity) {
      Some(Identity::Employer(e)) if e.is_registered => Some(e.phone.clone()),
      _ => None,
    }
  }

  /// Sites owned by the logged-in employer. Empty for any other session.
  pub async fn my_sites(&self) -> Result<Vec<SiteRecord>> {
    match self.registered_employer() {
      Some(owner) => self.repo.sites_owned_by(&owner).await,
      None => Ok(Vec::new()),
    }
  }

  /// Submit a new site for review. Requires a registered employer.
  pub async fn submit_site(&self, site: NewSite) -> Result<Option<SiteRecord>> {
    let Some(owner) = self.registered_employer() else {
      tracing::debug!("site submission ignored: no registered employer session");
      return Ok(None);
    };
    let record = self.repo.add_site(&owner, site).await?;
    tracing::info!(id = %record.id, "site submitted for review");
    Ok(Some(record))
  }
}
