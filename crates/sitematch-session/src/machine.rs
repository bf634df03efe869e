//! The session state machine.
//!
//! ```text
//!   Anonymous ──select_role──▶ RoleSelected(role)
//!       │                          │
//!       └────────submit_phone──────┴──▶ PendingVerification(role, phone)
//!                                          │            │
//!                                        back     confirm_verification
//!                                          ▼            ▼
//!                                   RoleSelected   Authenticated(session)
//!                                                       │
//!                                                    logout ──▶ Anonymous
//! ```
//!
//! Calls that do not apply to the current state are ignored: they are logged
//! at `debug` and leave the state unchanged. Only storage failures surface as
//! errors.

use std::sync::Arc;

use chrono::Utc;
use sitematch_core::{
  identity::{AdminAccount, Employer, Identity, PhoneNumber, Role, Worker},
  profile::{Profile, ProfilePatch, Registration},
  session::Session,
  store::KeyValueStore,
};

use crate::{Result, credentials, repository::Repository};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
  Anonymous,
  RoleSelected(Role),
  /// A phone has been submitted and awaits verification.
  PendingVerification {
    role:     Role,
    phone:    PhoneNumber,
    remember: bool,
  },
  Authenticated(Session),
}

impl SessionState {
  /// The role the landing form is set to. Workers are the default.
  pub fn landing_role(&self) -> Role {
    match self {
      Self::Anonymous => Role::Worker,
      Self::RoleSelected(role) => *role,
      Self::PendingVerification { role, .. } => *role,
      Self::Authenticated(session) => session.role,
    }
  }
}

// ─── Machine ─────────────────────────────────────────────────────────────────

pub struct SessionMachine<S> {
  repo:  Arc<Repository<S>>,
  state: SessionState,
}

impl<S: KeyValueStore> SessionMachine<S> {
  pub fn new(repo: Arc<Repository<S>>) -> Self {
    Self { repo, state: SessionState::Anonymous }
  }

  pub fn state(&self) -> &SessionState { &self.state }

  pub fn session(&self) -> Option<&Session> {
    match &self.state {
      SessionState::Authenticated(session) => Some(session),
      _ => None,
    }
  }

  /// Restore a persisted session, if any. Roles are checked in the order
  /// worker, employer, admin; the first hit wins.
  ///
  /// The restored identity is trusted as stored and is not checked against
  /// the repository.
  pub async fn rehydrate(&mut self) -> Result<&SessionState> {
    if matches!(self.state, SessionState::Authenticated(_)) {
      return Ok(&self.state);
    }
    for role in [Role::Worker, Role::Employer, Role::Admin] {
      if let Some(session) = self.repo.load_session(role).await? {
        tracing::info!(%role, remember = session.remember_me, "restored session");
        self.state = SessionState::Authenticated(session);
        break;
      }
    }
    Ok(&self.state)
  }

  /// Choose the role for the next login. Refused while authenticated; a
  /// pending phone is discarded.
  pub fn select_role(&mut self, role: Role) -> &SessionState {
    if matches!(self.state, SessionState::Authenticated(_)) {
      tracing::debug!(%role, "role switch refused while authenticated");
      return &self.state;
    }
    self.state = SessionState::RoleSelected(role);
    &self.state
  }

  /// Submit a phone for verification. Nothing is read or written yet.
  pub fn submit_phone(&mut self, phone: PhoneNumber, remember: bool) -> &SessionState {
    let role = match &self.state {
      SessionState::Anonymous | SessionState::RoleSelected(_) => self.state.landing_role(),
      _ => {
        tracing::debug!("phone submission ignored outside landing");
        return &self.state;
      }
    };
    if !role.uses_phone_login() {
      tracing::debug!(%role, "phone submission ignored for non-phone role");
      return &self.state;
    }
    self.state = SessionState::PendingVerification { role, phone, remember };
    &self.state
  }

  /// Abandon verification and return to the role selector.
  pub fn back(&mut self) -> &SessionState {
    if let SessionState::PendingVerification { role, .. } = self.state {
      self.state = SessionState::RoleSelected(role);
    }
    &self.state
  }

  /// Complete verification. The check itself always succeeds.
  ///
  /// A phone already in the role's partition yields a session for that
  /// record; an unknown phone yields an unregistered placeholder which is
  /// *not* written to the repository. Either way the session is persisted
  /// right away, to the tier chosen by `remember`.
  pub async fn confirm_verification(&mut self, remember: bool) -> Result<&SessionState> {
    let SessionState::PendingVerification { role, phone, .. } = &self.state else {
      tracing::debug!("verification confirmed with no pending phone");
      return Ok(&self.state);
    };
    let (role, phone) = (*role, phone.clone());

    let identity = match self.repo.find_by_phone(role, &phone).await? {
      Some(existing) => existing,
      None => match role {
        Role::Employer => Identity::Employer(Employer::unregistered(phone)),
        _ => Identity::Worker(Worker::unregistered(phone)),
      },
    };

    let session = Session::new(identity, remember);
    self.repo.persist_session(&session).await?;
    tracing::info!(
      %role,
      registered = session.is_registered(),
      remember,
      "phone verified"
    );
    self.state = SessionState::Authenticated(session);
    Ok(&self.state)
  }

  /// Log in as an admin. Returns `false` (and changes nothing) for bad
  /// credentials or while already authenticated. Admin sessions are always
  /// durable.
  pub async fn admin_login(
    &mut self,
    accounts: &[AdminAccount],
    username: &str,
    password: &str,
  ) -> Result<bool> {
    if matches!(self.state, SessionState::Authenticated(_)) {
      tracing::debug!("admin login refused while authenticated");
      return Ok(false);
    }
    let Some(admin) = credentials::authenticate(accounts, username, password) else {
      tracing::info!(username, "admin login rejected");
      return Ok(false);
    };
    let session = Session::new(Identity::Admin(admin), true);
    self.repo.persist_session(&session).await?;
    tracing::info!(username, "admin logged in");
    self.state = SessionState::Authenticated(session);
    Ok(true)
  }

  /// Drop the session from memory and from both tiers.
  pub async fn logout(&mut self) -> Result<()> {
    if let SessionState::Authenticated(session) = &self.state {
      self.repo.clear_session(session.role).await?;
      tracing::info!(role = %session.role, "logged out");
    }
    self.state = SessionState::Anonymous;
    Ok(())
  }

  // ── Registration and profile edits ────────────────────────────────────────

  /// Re-persist the session after its identity changed. It goes durable if
  /// it was remembered or a durable copy already exists; otherwise the
  /// ephemeral copy is refreshed.
  async fn repersist(&mut self) -> Result<()> {
    let SessionState::Authenticated(session) = &mut self.state else {
      return Ok(());
    };
    let durable = session.remember_me || self.repo.has_durable_session(session.role).await?;
    session.remember_me = durable;
    self.repo.persist_session(session).await
  }

  fn authenticated_worker(&self) -> Option<&Worker> {
    match self.session().map(|s| &s.identity) {
      Some(Identity::Worker(worker)) => Some(worker),
      _ => None,
    }
  }

  /// Commit a worker registration: store the profile, index the worker, and
  /// mark the session registered. Ignored unless an unregistered worker is
  /// logged in.
  pub async fn complete_registration(
    &mut self,
    registration: Registration,
  ) -> Result<Option<Profile>> {
    let Some(worker) = self.authenticated_worker().filter(|w| !w.is_registered) else {
      tracing::debug!("registration ignored: no unregistered worker session");
      return Ok(None);
    };
    let phone = worker.phone.clone();
    let registered = Worker::registered(phone.clone(), registration.name.clone());

    let profile = Profile::from_registration(phone.clone(), registration, Utc::now());
    self.repo.register_worker(&registered, profile.clone()).await?;

    if let SessionState::Authenticated(session) = &mut self.state {
      session.identity = Identity::Worker(registered);
    }
    self.repersist().await?;
    tracing::info!(%phone, "worker registered");
    Ok(Some(profile))
  }

  /// Commit an employer registration. Ignored unless an employer is logged
  /// in.
  pub async fn complete_employer_registration(
    &mut self,
    name: String,
    company_name: String,
  ) -> Result<Option<&Session>> {
    let Some(Identity::Employer(employer)) = self.session().map(|s| &s.identity) else {
      tracing::debug!("employer registration ignored: no employer session");
      return Ok(None);
    };
    let registered = Employer::registered(employer.phone.clone(), name, company_name);

    self.repo.upsert(&Identity::Employer(registered.clone())).await?;
    if let SessionState::Authenticated(session) = &mut self.state {
      session.identity = Identity::Employer(registered);
    }
    self.repersist().await?;
    tracing::info!("employer registered");
    Ok(self.session())
  }

  /// Apply a profile edit for the logged-in worker. Returns `None` when
  /// there is no registered worker session or no stored profile.
  pub async fn complete_profile_update(
    &mut self,
    patch: ProfilePatch,
  ) -> Result<Option<Profile>> {
    let Some(worker) = self.authenticated_worker().filter(|w| w.is_registered) else {
      tracing::debug!("profile update ignored: no registered worker session");
      return Ok(None);
    };
    let phone = worker.phone.clone();
    let old_name = worker.name.clone();

    let Some(profile) = self.repo.update_profile(&phone, patch).await? else {
      tracing::warn!(%phone, "profile update for a worker with no profile");
      return Ok(None);
    };

    if old_name.as_deref() != Some(profile.name.as_str()) {
      let renamed = Worker::registered(phone.clone(), profile.name.clone());
      self.repo.upsert(&Identity::Worker(renamed.clone())).await?;
      if let SessionState::Authenticated(session) = &mut self.state {
        session.identity = Identity::Worker(renamed);
      }
      self.repersist().await?;
    }
    Ok(Some(profile))
  }
}
