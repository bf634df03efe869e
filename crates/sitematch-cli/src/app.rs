//! Command execution against a mounted [`RoleRouter`].

use std::{io::Read as _, path::Path, sync::Arc};

use anyhow::{Context as _, bail};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use sitematch_core::{
  identity::{PhoneNumber, Role},
  profile::{ProfilePatch, Registration},
  site::{NewSite, SiteRecord},
};
use sitematch_session::{
  completion::Latency,
  repository::Repository,
  router::{RoleRouter, Surface},
  seed,
};
use sitematch_store_sqlite::SqliteStore;

use crate::Command;

pub struct App {
  store:  Arc<SqliteStore>,
  router: RoleRouter<SqliteStore>,
}

impl App {
  pub fn new(store: SqliteStore, latency: Latency) -> Self {
    let store = Arc::new(store);
    Self { router: RoleRouter::new(store.clone(), latency), store }
  }

  /// Run one command and return its JSON report.
  pub async fn run(&mut self, command: Command) -> anyhow::Result<Value> {
    if !matches!(command, Command::Seed) {
      self.router.mount().await.context("failed to load session")?;
    }

    match command {
      Command::Seed => self.seed().await,
      Command::Landing => Ok(self.landing()),
      Command::Whoami => self.context(),
      Command::Login { role, phone, remember } => {
        self.router.select_role(role);
        self.router.submit_phone(PhoneNumber::new(phone), remember);
        self.router.confirm_verification(remember).await?;
        self.context()
      }
      Command::AdminLogin { username, password } => {
        if !self.router.admin_login(&username, &password).await? {
          bail!("invalid admin credentials for {username:?}");
        }
        self.context()
      }
      Command::Register { file } => {
        let registration: Registration = read_json(&file)?;
        if self.router.submit_registration(registration).await?.is_none() {
          bail!("registration needs an unregistered worker session");
        }
        self.context()
      }
      Command::RegisterEmployer { name, company } => {
        if self.router.submit_employer_registration(name, company).await?.is_none() {
          bail!("registration needs an employer session");
        }
        self.context()
      }
      Command::EditProfile { file } => {
        let patch: ProfilePatch = read_json(&file)?;
        if self.router.submit_profile_update(patch).await?.is_none() {
          bail!("profile edits need a registered worker session with a profile");
        }
        self.context()
      }
      Command::Sites { filter } => {
        let sites = filter_sites(self.router.sites().await?, filter.as_deref());
        Ok(serde_json::to_value(sites)?)
      }
      Command::MySites => {
        self.require_surface(|s| matches!(s, Surface::Employer { needs_registration: false }))?;
        Ok(serde_json::to_value(self.router.my_sites().await?)?)
      }
      Command::AddSite { name, address, supervisor_name, supervisor_phone, job_type } => {
        let site = NewSite {
          name,
          address,
          supervisor_name,
          supervisor_phone: PhoneNumber::new(supervisor_phone),
          job_type,
        };
        match self.router.submit_site(site).await? {
          Some(record) => Ok(serde_json::to_value(record)?),
          None => bail!("adding a site needs a registered employer session"),
        }
      }
      Command::Apply { site_id } => {
        if !self.router.apply_for_site(&site_id).await? {
          bail!("cannot apply to {site_id:?}: needs a registered worker and an open site");
        }
        self.context()
      }
      Command::Logout => {
        self.router.logout().await?;
        self.context()
      }
    }
  }

  async fn seed(&self) -> anyhow::Result<Value> {
    let repo = Repository::new(self.store.clone());
    let report = seed::seed(&repo).await?;
    let counts = seed::counts(&repo)
      .await?
      .into_iter()
      .map(|(role, count)| (role.as_str().to_owned(), json!(count)))
      .collect::<serde_json::Map<_, _>>();
    Ok(json!({
      "added": {
        "workers":   report.workers,
        "employers": report.employers,
        "sites":     report.sites,
      },
      "totals": counts,
    }))
  }

  fn landing(&self) -> Value {
    let roles: Vec<Value> = Role::PHONE_ROLES
      .iter()
      .map(|role| {
        json!({
          "role":     role,
          "label":    role.label(),
          "testHint": role.test_hint(),
        })
      })
      .collect();
    let admins: Vec<&str> = self.router.admins().iter().map(|a| a.username.as_str()).collect();
    json!({
      "surface": self.router.surface(),
      "roles":   roles,
      "admins":  admins,
    })
  }

  fn context(&self) -> anyhow::Result<Value> { Ok(serde_json::to_value(self.router.context())?) }

  fn require_surface(&self, pred: impl Fn(&Surface) -> bool) -> anyhow::Result<()> {
    let surface = self.router.surface();
    if !pred(&surface) {
      bail!("not available from the current surface: {surface:?}");
    }
    Ok(())
  }
}

/// Read a JSON document from `path`, or from stdin when `path` is `-`.
fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
  let raw = if path == Path::new("-") {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
    buf
  } else {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
  };
  serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Keep the sites whose name, address, or job type fuzzy-matches `filter`.
fn filter_sites(sites: Vec<SiteRecord>, filter: Option<&str>) -> Vec<SiteRecord> {
  let Some(filter) = filter.filter(|f| !f.is_empty()) else {
    return sites;
  };
  let matcher = SkimMatcherV2::default();
  sites
    .into_iter()
    .filter(|s| {
      [&s.name, &s.address, &s.job_type]
        .iter()
        .any(|field| matcher.fuzzy_match(field, filter).is_some())
    })
    .collect()
}
