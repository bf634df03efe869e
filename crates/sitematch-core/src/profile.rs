//! Worker profiles: personal details, bank account, and document references.
//!
//! A profile exists only for a registered worker and is keyed by the
//! worker's phone. Document fields hold uploaded file *names*; no binary data
//! lives in storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::PhoneNumber;

// ─── Enumerations ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nationality {
  Korean,
  Foreign,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The extended record for a registered worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub name:                      String,
  /// Resident registration number, masked as entered.
  pub rrn:                       String,
  pub gender:                    Gender,
  pub nationality:               Nationality,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country:                   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country_other:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visa_type:                 Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub visa_type_other:           Option<String>,
  pub phone:                     PhoneNumber,
  #[serde(default)]
  pub preferred_areas:           Vec<String>,
  pub bank:                      String,
  pub account_number:            String,
  pub account_holder:            String,
  #[serde(default)]
  pub signature_data_url:        String,
  pub bank_account_file_name:    String,
  pub id_card_file_name:         String,
  pub safety_cert_file_name:     String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub profile_picture_file_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub registration_date:         Option<DateTime<Utc>>,
}

impl Profile {
  /// Build the profile written when `registration` completes for `phone`.
  pub fn from_registration(
    phone: PhoneNumber,
    registration: Registration,
    registered_at: DateTime<Utc>,
  ) -> Self {
    Self {
      name: registration.name,
      rrn: registration.rrn,
      gender: registration.gender,
      nationality: registration.nationality,
      country: registration.country,
      country_other: registration.country_other,
      visa_type: registration.visa_type,
      visa_type_other: registration.visa_type_other,
      phone,
      preferred_areas: registration.preferred_areas,
      bank: registration.bank,
      account_number: registration.account_number,
      account_holder: registration.account_holder,
      signature_data_url: registration.signature_data_url,
      bank_account_file_name: registration.bank_account_file_name,
      id_card_file_name: registration.id_card_file_name,
      safety_cert_file_name: registration.safety_cert_file_name,
      profile_picture_file_name: registration.profile_picture_file_name,
      registration_date: Some(registered_at),
    }
  }

  /// Apply an edit. Present fields overwrite; absent fields are left alone.
  /// `preferred_areas` is replaced wholesale, never merged.
  pub fn apply(&mut self, patch: ProfilePatch) {
    fn set<T>(slot: &mut T, value: Option<T>) {
      if let Some(v) = value {
        *slot = v;
      }
    }
    fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
      if value.is_some() {
        *slot = value;
      }
    }

    set(&mut self.name, patch.name);
    set(&mut self.gender, patch.gender);
    set(&mut self.nationality, patch.nationality);
    set_opt(&mut self.country, patch.country);
    set_opt(&mut self.country_other, patch.country_other);
    set_opt(&mut self.visa_type, patch.visa_type);
    set_opt(&mut self.visa_type_other, patch.visa_type_other);
    set(&mut self.preferred_areas, patch.preferred_areas);
    set(&mut self.bank, patch.bank);
    set(&mut self.account_number, patch.account_number);
    set(&mut self.account_holder, patch.account_holder);
    set_opt(&mut self.profile_picture_file_name, patch.profile_picture_file_name);
    set(&mut self.id_card_file_name, patch.id_card_file_name);
    set(&mut self.safety_cert_file_name, patch.safety_cert_file_name);
    set(&mut self.bank_account_file_name, patch.bank_account_file_name);
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

/// The full payload produced by the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub name:                      String,
  pub rrn:                       String,
  pub gender:                    Gender,
  pub nationality:               Nationality,
  #[serde(default)]
  pub country:                   Option<String>,
  #[serde(default)]
  pub country_other:             Option<String>,
  #[serde(default)]
  pub visa_type:                 Option<String>,
  #[serde(default)]
  pub visa_type_other:           Option<String>,
  #[serde(default)]
  pub preferred_areas:           Vec<String>,
  pub bank:                      String,
  pub account_number:            String,
  pub account_holder:            String,
  #[serde(default)]
  pub signature_data_url:        String,
  pub bank_account_file_name:    String,
  pub id_card_file_name:         String,
  pub safety_cert_file_name:     String,
  #[serde(default)]
  pub profile_picture_file_name: Option<String>,
}

// ─── ProfilePatch ────────────────────────────────────────────────────────────

/// The partial payload produced by the edit-profile form. `None` means
/// "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePatch {
  pub name:                      Option<String>,
  pub gender:                    Option<Gender>,
  pub nationality:               Option<Nationality>,
  pub country:                   Option<String>,
  pub country_other:             Option<String>,
  pub visa_type:                 Option<String>,
  pub visa_type_other:           Option<String>,
  pub preferred_areas:           Option<Vec<String>>,
  pub bank:                      Option<String>,
  pub account_number:            Option<String>,
  pub account_holder:            Option<String>,
  pub profile_picture_file_name: Option<String>,
  pub id_card_file_name:         Option<String>,
  pub safety_cert_file_name:     Option<String>,
  pub bank_account_file_name:    Option<String>,
}
