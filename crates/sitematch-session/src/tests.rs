use std::sync::Arc;

use sitematch_core::{
  identity::{Identity, PhoneNumber, Role},
  profile::{Gender, Nationality, ProfilePatch, Registration},
  site::{NewSite, SiteStatus},
  store::{KeyValueStore, Tier},
};
use sitematch_store_sqlite::SqliteStore;

use crate::{
  completion::Latency,
  keys,
  machine::SessionState,
  repository::Repository,
  router::{RoleRouter, Surface, surface_for},
  seed::{TEST_EMPLOYER_COMPANY, TEST_EMPLOYER_PHONE, TEST_WORKER_NAME, TEST_WORKER_PHONE},
};

async fn mounted() -> (Arc<SqliteStore>, RoleRouter<SqliteStore>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let mut router = RoleRouter::new(store.clone(), Latency::NONE);
  router.mount().await.unwrap();
  (store, router)
}

/// A second load against the same storage.
async fn remount(store: &Arc<SqliteStore>) -> RoleRouter<SqliteStore> {
  let mut router = RoleRouter::new(store.clone(), Latency::NONE);
  router.mount().await.unwrap();
  router
}

async fn login(router: &mut RoleRouter<SqliteStore>, role: Role, phone: &str, remember: bool) {
  router.select_role(role);
  router.submit_phone(PhoneNumber::new(phone), remember);
  router.confirm_verification(remember).await.unwrap();
}

fn registration(name: &str) -> Registration {
  Registration {
    name:                      name.into(),
    rrn:                       "850505-1******".into(),
    gender:                    Gender::Male,
    nationality:               Nationality::Korean,
    country:                   None,
    country_other:             None,
    visa_type:                 None,
    visa_type_other:           None,
    preferred_areas:           vec!["서울 강남구".into(), "경기 성남시".into()],
    bank:                      "신한은행".into(),
    account_number:            "110-555-123456".into(),
    account_holder:            name.into(),
    signature_data_url:        "data:image/png;base64,AAAA".into(),
    bank_account_file_name:    "bank.jpg".into(),
    id_card_file_name:         "id.jpg".into(),
    safety_cert_file_name:     "cert.jpg".into(),
    profile_picture_file_name: None,
  }
}

async fn session_tiers(store: &SqliteStore, key: &str) -> (bool, bool) {
  (
    store.get(Tier::Durable, key).await.unwrap().is_some(),
    store.get(Tier::Ephemeral, key).await.unwrap().is_some(),
  )
}

// ─── Landing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_mount_lands_on_worker_role() {
  let (_, router) = mounted().await;
  assert_eq!(router.surface(), Surface::Landing { role: Role::Worker, verifying: None, remember: false });
  assert!(router.session().is_none());
  assert_eq!(router.admins().len(), 2);
}

#[test]
fn surface_follows_state() {
  assert_eq!(
    surface_for(&SessionState::RoleSelected(Role::Employer)),
    Surface::Landing { role: Role::Employer, verifying: None, remember: false }
  );
  assert_eq!(
    surface_for(&SessionState::PendingVerification {
      role:     Role::Worker,
      phone:    PhoneNumber::new("01012345678"),
      remember: true,
    }),
    Surface::Landing {
      role:      Role::Worker,
      verifying: Some(PhoneNumber::new("01012345678")),
      remember:  true,
    }
  );
}

#[tokio::test]
async fn back_discards_pending_phone() {
  let (store, mut router) = mounted().await;
  router.select_role(Role::Employer);
  router.submit_phone(PhoneNumber::new(TEST_EMPLOYER_PHONE), true);

  assert_eq!(router.back(), Surface::Landing { role: Role::Employer, verifying: None, remember: false });
  assert_eq!(session_tiers(&store, keys::session_key(Role::Employer)).await, (false, false));
}

#[tokio::test]
async fn pending_phone_carries_remember_choice() {
  let (_, mut router) = mounted().await;
  router.select_role(Role::Employer);
  router.submit_phone(PhoneNumber::new(TEST_EMPLOYER_PHONE), true);

  assert_eq!(
    router.surface(),
    Surface::Landing {
      role:      Role::Employer,
      verifying: Some(PhoneNumber::new(TEST_EMPLOYER_PHONE)),
      remember:  true,
    }
  );
}

#[tokio::test]
async fn confirming_without_pending_phone_is_ignored() {
  let (store, mut router) = mounted().await;
  let surface = router.confirm_verification(true).await.unwrap();

  assert_eq!(surface, Surface::Landing { role: Role::Worker, verifying: None, remember: false });
  assert_eq!(session_tiers(&store, keys::session_key(Role::Worker)).await, (false, false));
}

// ─── Phone login ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn fixture_worker_logs_in_registered() {
  let (_, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, false).await;

  let session = router.session().unwrap();
  assert!(session.is_registered());
  assert_eq!(session.identity.display_name(), Some(TEST_WORKER_NAME));
  assert_eq!(router.surface(), Surface::Worker { needs_registration: false });
  assert_eq!(router.profile().unwrap().name, TEST_WORKER_NAME);
}

#[tokio::test]
async fn fixture_employer_carries_company() {
  let (_, mut router) = mounted().await;
  login(&mut router, Role::Employer, TEST_EMPLOYER_PHONE, false).await;

  let Some(Identity::Employer(employer)) = router.session().map(|s| &s.identity) else {
    panic!("expected an employer session");
  };
  assert_eq!(employer.company_name, TEST_EMPLOYER_COMPANY);
  assert_eq!(router.surface(), Surface::Employer { needs_registration: false });
}

#[tokio::test]
async fn unknown_phone_is_unregistered_and_not_stored() {
  let (store, mut router) = mounted().await;
  let repo = Repository::new(store.clone());
  let before = repo.count(Role::Worker).await.unwrap();

  login(&mut router, Role::Worker, "01055551234", false).await;

  assert!(!router.session().unwrap().is_registered());
  assert_eq!(router.surface(), Surface::Worker { needs_registration: true });
  assert!(router.profile().is_none());
  assert_eq!(repo.count(Role::Worker).await.unwrap(), before);
  assert!(
    repo
      .find_by_phone(Role::Worker, &PhoneNumber::new("01055551234"))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn phone_defaults_to_worker_role() {
  let (_, mut router) = mounted().await;
  router.submit_phone(PhoneNumber::new(TEST_WORKER_PHONE), false);
  router.confirm_verification(false).await.unwrap();

  assert_eq!(router.session().unwrap().role, Role::Worker);
}

#[tokio::test]
async fn role_switch_refused_while_authenticated() {
  let (_, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, false).await;

  assert_eq!(router.select_role(Role::Employer), Surface::Worker { needs_registration: false });
  assert_eq!(router.session().unwrap().role, Role::Worker);
}

// ─── Remember-me ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn remembered_session_is_durable_only() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, true).await;

  assert_eq!(session_tiers(&store, keys::session_key(Role::Worker)).await, (true, false));
}

#[tokio::test]
async fn unremembered_session_is_ephemeral_only() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, false).await;

  assert_eq!(session_tiers(&store, keys::session_key(Role::Worker)).await, (false, true));
}

#[tokio::test]
async fn remount_restores_persisted_session() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Employer, TEST_EMPLOYER_PHONE, true).await;

  let restored = remount(&store).await;
  let session = restored.session().unwrap();
  assert_eq!(session.role, Role::Employer);
  assert!(session.remember_me);
  assert_eq!(restored.surface(), Surface::Employer { needs_registration: false });
}

// ─── Registration ────────────────────────────────────────────────────────────

#[tokio::test]
async fn new_worker_registers() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Worker, "01055551234", false).await;

  let profile = router.submit_registration(registration("홍길동")).await.unwrap().unwrap();
  assert_eq!(profile.name, "홍길동");
  assert_eq!(profile.phone.as_str(), "01055551234");
  assert!(profile.registration_date.is_some());
  assert!(!router.is_loading());

  let session = router.session().unwrap();
  assert!(session.is_registered());
  assert_eq!(session.identity.display_name(), Some("홍길동"));
  assert_eq!(router.surface(), Surface::Worker { needs_registration: false });

  let repo = Repository::new(store.clone());
  let phone = PhoneNumber::new("01055551234");
  let stored = repo.find_by_phone(Role::Worker, &phone).await.unwrap().unwrap();
  assert_eq!(stored.display_name(), Some("홍길동"));
  assert!(repo.profile(&phone).await.unwrap().is_some());

  // The ephemeral copy carries the new registration.
  let restored = repo.load_session(Role::Worker).await.unwrap().unwrap();
  assert!(restored.is_registered());
  assert!(!restored.remember_me);
}

#[tokio::test]
async fn registration_with_registration_delay_commits() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let mut router = RoleRouter::new(store.clone(), Latency::from_millis(20, 20));
  router.mount().await.unwrap();
  login(&mut router, Role::Worker, "01055550000", true).await;

  assert!(router.submit_registration(registration("이순신")).await.unwrap().is_some());
  assert!(router.session().unwrap().is_registered());

  let raw = store
    .get(Tier::Durable, keys::session_key(Role::Worker))
    .await
    .unwrap()
    .unwrap();
  let durable = Identity::from_projection_json(Role::Worker, &raw).unwrap();
  assert!(durable.is_registered());
  assert_eq!(durable.display_name(), Some("이순신"));
  assert!(store.get(Tier::Ephemeral, keys::session_key(Role::Worker)).await.unwrap().is_none());
}

#[tokio::test]
async fn loading_is_visible_until_the_submission_finishes() {
  let (_, mut router) = mounted().await;
  login(&mut router, Role::Worker, "01055551234", false).await;
  assert!(!router.is_loading());

  assert!(router.begin_registration(registration("홍길동")));
  assert!(router.is_loading());
  assert!(router.context().loading);
  assert!(!router.begin_registration(registration("중복")));

  assert!(router.finish_submission().await.unwrap());
  assert!(!router.is_loading());
  assert!(!router.context().loading);
  assert_eq!(router.profile().unwrap().name, "홍길동");
  assert!(!router.finish_submission().await.unwrap());
}

#[tokio::test]
async fn registration_recovers_from_quarantined_worker_index() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Worker, "01055551234", false).await;
  router.submit_registration(registration("홍길동")).await.unwrap().unwrap();
  router.logout().await.unwrap();

  // The index is lost; the profile for the phone survives as an orphan.
  store.set(Tier::Durable, keys::WORKERS, "{not json").await.unwrap();
  let mut router = remount(&store).await;
  login(&mut router, Role::Worker, "01055551234", false).await;
  assert!(!router.session().unwrap().is_registered());

  let profile = router.submit_registration(registration("홍길순")).await.unwrap().unwrap();
  assert_eq!(profile.name, "홍길순");
  assert!(router.session().unwrap().is_registered());

  let repo = Repository::new(store.clone());
  let phone = PhoneNumber::new("01055551234");
  let indexed = repo.find_by_phone(Role::Worker, &phone).await.unwrap().unwrap();
  assert_eq!(indexed.display_name(), Some("홍길순"));
  assert_eq!(repo.profile(&phone).await.unwrap().unwrap().name, "홍길순");
}

#[tokio::test]
async fn registered_worker_cannot_register_again() {
  let (_, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, false).await;

  assert!(router.submit_registration(registration("홍길동")).await.unwrap().is_none());
  assert_eq!(router.profile().unwrap().name, TEST_WORKER_NAME);
}

#[tokio::test]
async fn profile_rename_updates_session_and_index() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, true).await;

  let patch = ProfilePatch {
    name: Some("김수정".into()),
    preferred_areas: Some(vec!["부산 해운대구".into()]),
    ..Default::default()
  };
  let profile = router.submit_profile_update(patch).await.unwrap().unwrap();
  assert_eq!(profile.name, "김수정");
  assert_eq!(profile.preferred_areas, vec!["부산 해운대구".to_owned()]);
  assert_eq!(profile.bank, "KB국민은행");

  assert_eq!(router.session().unwrap().identity.display_name(), Some("김수정"));

  let repo = Repository::new(store.clone());
  let indexed = repo
    .find_by_phone(Role::Worker, &PhoneNumber::new(TEST_WORKER_PHONE))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(indexed.display_name(), Some("김수정"));

  let restored = repo.load_session(Role::Worker).await.unwrap().unwrap();
  assert_eq!(restored.identity.display_name(), Some("김수정"));
  assert!(restored.remember_me);
}

#[tokio::test]
async fn new_employer_registers() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Employer, "01077776666", false).await;
  assert_eq!(router.surface(), Surface::Employer { needs_registration: true });

  let session = router
    .submit_employer_registration("최반장".into(), "든든토건".into())
    .await
    .unwrap()
    .unwrap();
  assert!(session.is_registered());

  let repo = Repository::new(store);
  let Some(Identity::Employer(stored)) = repo
    .find_by_phone(Role::Employer, &PhoneNumber::new("01077776666"))
    .await
    .unwrap()
  else {
    panic!("employer not stored");
  };
  assert_eq!(stored.company_name, "든든토건");
}

// ─── Sites ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn worker_applies_to_approved_site() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, false).await;

  let sites = router.sites().await.unwrap();
  assert!(sites.iter().all(|s| s.status == SiteStatus::Approved));
  let target = sites[0].id.clone();

  assert!(router.apply_for_site(&target).await.unwrap());
  assert_eq!(router.applied_site(), Some(target.as_str()));
  assert_eq!(
    store.get(Tier::Durable, keys::APPLIED_SITE).await.unwrap().as_deref(),
    Some(target.as_str())
  );

  assert!(!router.apply_for_site("site_req_missing").await.unwrap());
  assert_eq!(router.applied_site(), Some(target.as_str()));
}

#[tokio::test]
async fn unregistered_worker_cannot_apply() {
  let (_, mut router) = mounted().await;
  login(&mut router, Role::Worker, "01055551234", false).await;

  let target = router.sites().await.unwrap()[0].id.clone();
  assert!(!router.apply_for_site(&target).await.unwrap());
  assert!(router.applied_site().is_none());
}

#[tokio::test]
async fn employer_submits_and_lists_sites() {
  let (_, mut router) = mounted().await;
  login(&mut router, Role::Employer, TEST_EMPLOYER_PHONE, false).await;

  let before = router.my_sites().await.unwrap().len();
  let record = router
    .submit_site(NewSite {
      name:             "송도 물류센터".into(),
      address:          "인천 연수구 송도동".into(),
      supervisor_name:  "박소장".into(),
      supervisor_phone: PhoneNumber::new(TEST_EMPLOYER_PHONE),
      job_type:         "형틀목공".into(),
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(record.status, SiteStatus::Pending);
  assert!(record.id.starts_with("site_req_"));
  assert_eq!(router.my_sites().await.unwrap().len(), before + 1);
  assert!(router.sites().await.unwrap().iter().all(|s| s.id != record.id));
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_login_is_durable() {
  let (store, mut router) = mounted().await;

  assert!(!router.admin_login("master", "wrong").await.unwrap());
  assert!(router.session().is_none());

  assert!(router.admin_login("master", "1").await.unwrap());
  assert_eq!(router.surface(), Surface::Admin);
  assert_eq!(session_tiers(&store, keys::session_key(Role::Admin)).await, (true, false));
}

// ─── Logout & seeding ────────────────────────────────────────────────────────

#[tokio::test]
async fn logout_clears_both_tiers() {
  let (store, mut router) = mounted().await;
  login(&mut router, Role::Worker, TEST_WORKER_PHONE, true).await;

  let surface = router.logout().await.unwrap();
  assert_eq!(surface, Surface::Landing { role: Role::Worker, verifying: None, remember: false });
  assert!(router.profile().is_none());
  assert_eq!(session_tiers(&store, keys::session_key(Role::Worker)).await, (false, false));

  let restored = remount(&store).await;
  assert_eq!(restored.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn logout_when_anonymous_is_harmless() {
  let (_, mut router) = mounted().await;
  router.select_role(Role::Employer);

  router.logout().await.unwrap();
  assert_eq!(router.state(), &SessionState::Anonymous);
}

#[tokio::test]
async fn repeated_mounts_do_not_duplicate_fixtures() {
  let (store, _) = mounted().await;
  let repo = Repository::new(store.clone());
  let workers = repo.count(Role::Worker).await.unwrap();
  let employers = repo.count(Role::Employer).await.unwrap();
  let sites = repo.sites().await.unwrap().len();

  remount(&store).await;

  assert_eq!(repo.count(Role::Worker).await.unwrap(), workers);
  assert_eq!(repo.count(Role::Employer).await.unwrap(), employers);
  assert_eq!(repo.sites().await.unwrap().len(), sites);
}
