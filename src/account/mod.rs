pub mod auth;
pub mod credential;
pub mod manage;
pub mod otp;
pub mod registration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use gaam_shared::account::*;
use gaam_shared::Id;

use crate::{
    store::{self, Conflict, Store},
    Error,
};

/// An account, of any role.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Id,
    pub full_name: String,
    /// Unique across every role.
    pub email: lettre::Address,
    /// Unique across every role.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: Role,
    pub status: Status,
    /// The gaam a member registered under.
    pub gaam: Option<Id>,
    pub created_at: DateTime<Utc>,
    /// The pending one-time password, if any.
    pub otp: Option<otp::Otp>,
    /// Set once a registration has been decided.
    pub verification: Option<Verification>,
}

/// Who decided a registration, and when.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub at: DateTime<Utc>,
    pub by: Id,
    pub notes: Option<String>,
}

/// Role and status folded into the variants login and review dispatch on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Standing {
    SuperAdmin,
    GaamAdmin,
    Member(Status),
}

impl Account {
    #[inline]
    pub fn standing(&self) -> Standing {
        match self.role {
            Role::SuperAdmin => Standing::SuperAdmin,
            Role::GaamAdmin => Standing::GaamAdmin,
            Role::Member => Standing::Member(self.status),
        }
    }

    /// Get the public view of this account.
    pub fn info(&self) -> AccountInfo {
        AccountInfo {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            role: self.role,
            status: self.status,
            gaam: self.gaam.clone(),
            verified_at: self.verification.as_ref().map(|v| v.at),
            verified_by: self.verification.as_ref().map(|v| v.by.clone()),
            verification_notes: self.verification.as_ref().and_then(|v| v.notes.clone()),
            created_at: self.created_at,
        }
    }
}

/// Validates a registration status change.
///
/// The only legal edges are `PENDING -> APPROVED` and `PENDING -> REJECTED`.
pub fn transition(from: Status, to: Status) -> Result<Status, Error> {
    match (from, to) {
        (Status::Pending, Status::Approved | Status::Rejected) => Ok(to),
        _ => Err(Error::InvalidTransition { from, to }),
    }
}

/// Loads the acting account and checks it is a super admin.
pub(crate) fn require_super_admin(store: &dyn Store, actor: &Id) -> Result<Account, Error> {
    match store.account(actor) {
        Some(account) if account.standing() == Standing::SuperAdmin => Ok(account),
        _ => Err(Error::Forbidden),
    }
}

/// Inserts an account built around the first free username derived from `base`.
///
/// The probe and the insert are separate steps, so a concurrent writer may
/// take the probed username first; the insert is then retried with the next
/// free one.
///
/// # Errors
///
/// - [`Error::DuplicateAccount`] if the email is taken.
pub(crate) fn insert_with_username(
    store: &dyn Store,
    base: &str,
    mut build: impl FnMut(String) -> Account,
) -> Result<Account, Error> {
    const ATTEMPTS: usize = 8;
    for _ in 0..ATTEMPTS {
        let account = build(store::first_free(base, "", |u| store.username_exists(u)));
        match store.insert_account(account.clone()) {
            Ok(()) => return Ok(account),
            Err(Error::Conflict(Conflict::Username)) => continue,
            Err(Error::Conflict(Conflict::Email)) => return Err(Error::DuplicateAccount),
            Err(err) => return Err(err),
        }
    }
    Err(Conflict::Username.into())
}

/// Trims a required text field, rejecting it if blank.
pub(crate) fn required(field: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::Validation(format!("{field} is required")))
    } else {
        Ok(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 3] = [Status::Pending, Status::Approved, Status::Rejected];

    #[test]
    fn only_pending_transitions_are_legal() {
        for from in ALL {
            for to in ALL {
                let legal = from == Status::Pending && to != Status::Pending;
                assert_eq!(transition(from, to).is_ok(), legal, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn invalid_transition_names_both_ends() {
        let err = transition(Status::Approved, Status::Rejected).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: Status::Approved,
                to: Status::Rejected
            }
        ));
        assert_eq!(
            err.to_string(),
            "registration status cannot change from APPROVED to REJECTED"
        );
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(required("full name", "  Asha  ").unwrap(), "Asha");
        assert!(matches!(
            required("full name", " \t"),
            Err(Error::Validation(_))
        ));
    }
}
