//! Idempotent fixture seeding.
//!
//! Each phone-role partition is seeded only while it is empty or near-empty
//! (at most one identity). Within the gate, every fixture is checked by phone
//! before insert, so a second run on a seeded store adds nothing.
//!
//! Admin accounts are not seeded into storage; [`default_admins`] supplies the
//! fallback list used whenever `adminUsers` is absent.

use chrono::{DateTime, TimeZone, Utc};
use sitematch_core::{
  identity::{AdminAccount, Employer, PhoneNumber, Role},
  profile::{Gender, Nationality, Profile},
  site::{SiteRecord, SiteStatus},
  store::KeyValueStore,
};

use crate::{
  Result, credentials,
  repository::{Repository, WorkerEntry},
};

// ─── Fixture data ────────────────────────────────────────────────────────────

pub const TEST_WORKER_PHONE: &str = "01011112222";
pub const TEST_WORKER_NAME: &str = "김테스트";
pub const TEST_EMPLOYER_PHONE: &str = "01099998888";
pub const TEST_EMPLOYER_NAME: &str = "박소장";
pub const TEST_EMPLOYER_COMPANY: &str = "튼튼건설";

/// Seeding stops once a partition holds more than this many identities.
const NEAR_EMPTY: usize = 1;

const PLACEHOLDER_SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

const WORKER_NAMES: [&str; 10] = [
  "이철수", "박지영", "최민호", "정수빈", "강현우", "조은지", "윤성민", "장미란", "임재범", "한예슬",
];
const WORKER_AREAS: [&str; 5] =
  ["서울 강남구", "서울 마포구", "경기 성남시", "경기 수원시", "인천 부평구"];

const EMPLOYER_NAMES: [&str; 10] = [
  "김대표", "이팀장", "최부장", "정소장", "강실장", "조반장", "윤이사", "장사장", "임전무", "한상무",
];
const COMPANIES: [&str; 10] = [
  "대박건설", "미래건축", "성실인테리어", "제일설비", "하늘공영", "바른시공", "태양전기", "푸른조경",
  "한마음종합", "우리디자인",
];
const SITE_NAMES: [&str; 10] = [
  "강남 오피스텔", "판교 IT센터", "분당 아파트", "성수동 카페", "홍대 리모델링", "부산 해운대 호텔",
  "대구 복합단지", "광주 아파트", "대전 연구소", "인천 물류센터",
];
const SITE_LOCATIONS: [&str; 10] = [
  "서울 강남구", "경기 성남시", "경기 성남시", "서울 성동구", "서울 마포구", "부산 해운대구",
  "대구 수성구", "광주 서구", "대전 유성구", "인천 중구",
];

/// `(username, password, name, role)` for the fallback admin accounts.
const DEFAULT_ADMINS: [(&str, &str, &str, &str); 2] = [
  ("master", "1", "최고관리자", "super"),
  ("manager", "1", "운영관리자", "manager"),
];

fn fixture_time(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
  Utc
    .with_ymd_and_hms(2024, month, day, hour, minute, 0)
    .single()
    .unwrap_or_default()
}

fn mock_worker_phone(index: usize) -> PhoneNumber {
  PhoneNumber::new(format!("0108000{index:04}"))
}

fn mock_employer_phone(index: usize) -> PhoneNumber {
  PhoneNumber::new(format!("0109000{index:04}"))
}

fn test_worker_profile() -> Profile {
  Profile {
    name: TEST_WORKER_NAME.into(),
    rrn: "900101-1234567".into(),
    gender: Gender::Male,
    nationality: Nationality::Korean,
    country: None,
    country_other: None,
    visa_type: None,
    visa_type_other: None,
    phone: TEST_WORKER_PHONE.into(),
    preferred_areas: vec!["서울 강남구".into()],
    bank: "KB국민은행".into(),
    account_number: "111-222-333444".into(),
    account_holder: TEST_WORKER_NAME.into(),
    signature_data_url: PLACEHOLDER_SIGNATURE.into(),
    bank_account_file_name: "통장사본.jpg".into(),
    id_card_file_name: "신분증.jpg".into(),
    safety_cert_file_name: "이수증.jpg".into(),
    profile_picture_file_name: Some("프로필사진.jpg".into()),
    registration_date: Some(fixture_time(7, 20, 9, 0)),
  }
}

fn mock_worker_profile(index: usize, name: &str) -> Profile {
  let is_male = index % 2 == 0;
  let birth_year = 80 + index;
  let gender_digit = if is_male { '1' } else { '2' };
  Profile {
    name: name.into(),
    rrn: format!("{birth_year}0101-{gender_digit}******"),
    gender: if is_male { Gender::Male } else { Gender::Female },
    nationality: Nationality::Korean,
    country: None,
    country_other: None,
    visa_type: None,
    visa_type_other: None,
    phone: mock_worker_phone(index),
    preferred_areas: vec![WORKER_AREAS[index % WORKER_AREAS.len()].into()],
    bank: "신한은행".into(),
    account_number: format!("110-{index}{index}{index}-123456"),
    account_holder: name.into(),
    signature_data_url: PLACEHOLDER_SIGNATURE.into(),
    bank_account_file_name: "sample_bank.jpg".into(),
    id_card_file_name: "sample_id.jpg".into(),
    safety_cert_file_name: "sample_cert.jpg".into(),
    profile_picture_file_name: None,
    registration_date: Some(fixture_time(8, index as u32 + 1, 10, index as u32 * 5)),
  }
}

fn sample_site() -> SiteRecord {
  SiteRecord {
    id:               "site_req_sample_1".into(),
    owner_id:         TEST_EMPLOYER_PHONE.into(),
    name:             "서초 아파트 재건축".into(),
    address:          "서울 서초구 반포동".into(),
    supervisor_name:  TEST_EMPLOYER_NAME.into(),
    supervisor_phone: TEST_EMPLOYER_PHONE.into(),
    job_type:         "조공".into(),
    status:           SiteStatus::Approved,
    created_at:       fixture_time(7, 25, 10, 0),
  }
}

fn mock_site(index: usize, owner: &Employer) -> SiteRecord {
  SiteRecord {
    id:               format!("site_req_mock_{index}"),
    owner_id:         owner.phone.clone(),
    name:             SITE_NAMES[index].into(),
    address:          SITE_LOCATIONS[index].into(),
    supervisor_name:  owner.name.clone(),
    supervisor_phone: owner.phone.clone(),
    job_type:         "보통인부".into(),
    status:           SiteStatus::Approved,
    created_at:       fixture_time(8, (index % 9) as u32 + 1, 9, index as u32 * 3),
  }
}

/// The fallback admin list, with freshly hashed credentials.
pub fn default_admins() -> Result<Vec<AdminAccount>> {
  DEFAULT_ADMINS
    .iter()
    .map(|(username, password, name, role)| {
      Ok(AdminAccount {
        username:      (*username).into(),
        name:          (*name).into(),
        role:          (*role).into(),
        password_hash: credentials::hash_password(password)?,
      })
    })
    .collect()
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

/// What a seeding run added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub workers:   usize,
  pub employers: usize,
  pub sites:     usize,
}

impl SeedReport {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

/// Seed both phone-role partitions. Safe to call on every load.
pub async fn seed<S: KeyValueStore>(repo: &Repository<S>) -> Result<SeedReport> {
  let workers = seed_workers(repo).await?;
  let (employers, sites) = seed_employers(repo).await?;
  let report = SeedReport { workers, employers, sites };
  if report.is_empty() {
    tracing::debug!("seed gate closed; nothing added");
  } else {
    tracing::info!(workers, employers, sites, "seeded fixture data");
  }
  Ok(report)
}

async fn seed_workers<S: KeyValueStore>(repo: &Repository<S>) -> Result<usize> {
  let mut index = repo.worker_index().await?;
  if index.len() > NEAR_EMPTY {
    return Ok(0);
  }
  let mut profiles = repo.profiles().await?;
  let before = index.len();

  let test_phone = PhoneNumber::new(TEST_WORKER_PHONE);
  if !index.iter().any(|e| e.phone == test_phone) {
    index.push(WorkerEntry { phone: test_phone.clone(), name: TEST_WORKER_NAME.into() });
    profiles.insert(test_phone, test_worker_profile());
  }

  for (i, name) in WORKER_NAMES.iter().enumerate() {
    let phone = mock_worker_phone(i);
    if index.iter().any(|e| e.phone == phone) {
      continue;
    }
    index.push(WorkerEntry { phone: phone.clone(), name: (*name).into() });
    profiles.insert(phone, mock_worker_profile(i, name));
  }

  repo.save_worker_index(&index).await?;
  repo.save_profiles(&profiles).await?;
  Ok(index.len() - before)
}

async fn seed_employers<S: KeyValueStore>(repo: &Repository<S>) -> Result<(usize, usize)> {
  let mut employers = repo.employers().await?;
  if employers.len() > NEAR_EMPTY {
    return Ok((0, 0));
  }
  let before = employers.len();

  let test_phone = PhoneNumber::new(TEST_EMPLOYER_PHONE);
  if !employers.iter().any(|e| e.phone == test_phone) {
    employers.push(Employer::registered(
      test_phone,
      TEST_EMPLOYER_NAME,
      TEST_EMPLOYER_COMPANY,
    ));
  }

  let stored = repo.stored_sites().await?;
  let sites_before = stored.as_ref().map_or(0, Vec::len);
  let mut sites = stored.unwrap_or_else(|| vec![sample_site()]);

  for (i, name) in EMPLOYER_NAMES.iter().enumerate() {
    let phone = mock_employer_phone(i);
    if employers.iter().any(|e| e.phone == phone) {
      continue;
    }
    let employer = Employer::registered(phone, *name, COMPANIES[i]);
    let site = mock_site(i, &employer);
    if !sites.iter().any(|s| s.id == site.id) {
      sites.push(site);
    }
    employers.push(employer);
  }

  repo.save_employers(&employers).await?;
  repo.save_sites(&sites).await?;
  Ok((employers.len() - before, sites.len() - sites_before))
}

/// Current identity count per phone role, for reporting.
pub async fn counts<S: KeyValueStore>(repo: &Repository<S>) -> Result<Vec<(Role, usize)>> {
  let mut out = Vec::with_capacity(Role::PHONE_ROLES.len());
  for role in Role::PHONE_ROLES {
    out.push((role, repo.count(role).await?));
  }
  Ok(out)
}
