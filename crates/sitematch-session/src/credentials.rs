//! Admin credential hashing and verification (argon2 PHC strings).

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;
use sitematch_core::identity::{Admin, AdminAccount};

use crate::{Error, Result};

/// Hash `password` into an argon2id PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// Check `password` against a stored PHC string. Malformed hashes never
/// verify.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Find the account for `username` in `accounts` and check its password.
pub fn authenticate(accounts: &[AdminAccount], username: &str, password: &str) -> Option<Admin> {
  accounts
    .iter()
    .find(|a| a.username == username)
    .filter(|a| verify_password(password, &a.password_hash))
    .map(AdminAccount::identity)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn account(username: &str, password: &str) -> AdminAccount {
    AdminAccount {
      username:      username.into(),
      name:          "최고관리자".into(),
      role:          "super".into(),
      password_hash: hash_password(password).unwrap(),
    }
  }

  #[test]
  fn correct_password_verifies() {
    let hash = hash_password("secret").unwrap();
    assert!(verify_password("secret", &hash));
  }

  #[test]
  fn wrong_password_fails() {
    let hash = hash_password("secret").unwrap();
    assert!(!verify_password("wrong", &hash));
  }

  #[test]
  fn malformed_hash_fails() {
    assert!(!verify_password("1", "plaintext-not-a-phc-string"));
  }

  #[test]
  fn authenticate_matches_username_and_password() {
    let accounts = vec![account("master", "1")];

    let admin = authenticate(&accounts, "master", "1").unwrap();
    assert_eq!(admin.username, "master");
    assert_eq!(admin.role, "super");

    assert!(authenticate(&accounts, "master", "2").is_none());
    assert!(authenticate(&accounts, "nobody", "1").is_none());
  }
}
