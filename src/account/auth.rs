//! Resolving login attempts to accounts.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

use super::{credential, otp, Account, Standing, Status};
use crate::{Error, Global};

/// Unknown identifiers are checked against this hash so they take as long
/// as a wrong password.
static DECOY_HASH: Lazy<Option<String>> =
    Lazy::new(|| credential::hash_password("decoy password").ok());

/// Resolves an identifier and a password or one-time code to an account.
///
/// Approved members log in with a one-time code, taken from `otp` or, for
/// older clients, from `password`. Admins log in with their password.
///
/// # Errors
///
/// - [`Error::InvalidCredentials`] for an unknown identifier or a wrong or
/// missing admin password, indistinguishably.
/// - [`Error::OtpRequired`], [`Error::InvalidOtp`] or [`Error::OtpExpired`]
/// for approved members.
/// - [`Error::PendingVerification`] or [`Error::RegistrationRejected`] for
/// members whose registration is not approved.
pub fn authenticate(
    global: &Global,
    identifier: &str,
    password: Option<&str>,
    otp: Option<&str>,
) -> Result<Account, Error> {
    authenticate_at(global, identifier, password, otp, Utc::now())
}

pub fn authenticate_at(
    global: &Global,
    identifier: &str,
    password: Option<&str>,
    otp: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Account, Error> {
    let password = password.filter(|p| !p.is_empty());
    let Some(account) = global.store.account_by_identifier(identifier) else {
        if let Some(hash) = DECOY_HASH.as_deref() {
            let _ = credential::verify_password(password.unwrap_or_default(), hash);
        }
        return Err(Error::InvalidCredentials);
    };

    match account.standing() {
        Standing::Member(Status::Approved) => {
            let code = otp
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .or(password)
                .ok_or(Error::OtpRequired)?;
            otp::verify_at(global, &account.id, code, now)
        }
        Standing::Member(Status::Pending) => Err(Error::PendingVerification),
        Standing::Member(Status::Rejected) => Err(Error::RegistrationRejected),
        Standing::SuperAdmin | Standing::GaamAdmin => {
            let password = password.ok_or(Error::InvalidCredentials)?;
            let matches = credential::verify_password(password, &account.password_hash)
                .unwrap_or_else(|err| {
                    tracing::error!("stored password hash of {} is unusable: {err}", account.id);
                    false
                });
            if matches {
                Ok(account)
            } else {
                Err(Error::InvalidCredentials)
            }
        }
    }
}
