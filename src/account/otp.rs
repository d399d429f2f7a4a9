//! One-time passwords for member login.

use std::fmt::Display;

use chrono::{DateTime, Duration, Utc};
use gaam_shared::Id;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Account, Standing, Status};
use crate::{
    mail::{self, Notification},
    Error, Global,
};

/// A six digit one-time code.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(transparent)]
pub struct Code(u32);

impl Code {
    const DIGITS: usize = 6;
    const MIN: u32 = 100_000;
    const MAX: u32 = 999_999;

    /// Creates a new code randomly.
    fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self(rng.gen_range(Self::MIN..=Self::MAX))
    }

    /// Parses user input, which must be exactly six ascii digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() != Self::DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().map(Self)
    }
}

impl Display for Code {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$}", self.0, width = Self::DIGITS)
    }
}

/// A pending one-time password of an account.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Otp {
    pub code: Code,
    pub expire_at: DateTime<Utc>,
}

impl Otp {
    /// How long an issued code stays valid.
    pub const TTL_MINUTES: i64 = 15;

    /// Issues a fresh code valid for [`Self::TTL_MINUTES`] after `now`.
    pub fn issue(now: DateTime<Utc>) -> Self {
        Self {
            code: Code::new(),
            expire_at: now + Duration::minutes(Self::TTL_MINUTES),
        }
    }

    /// Whether this code is past its expiry at `now`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expire_at
    }
}

/// Checks a supplied code against the pending one and clears it on success.
///
/// # Errors
///
/// - [`Error::InvalidOtp`] if nothing is pending or the code differs.
/// - [`Error::OtpExpired`] if the code matches but has expired.
pub fn consume(slot: &mut Option<Otp>, supplied: &str, now: DateTime<Utc>) -> Result<(), Error> {
    let otp = slot.as_ref().ok_or(Error::InvalidOtp)?;
    if Code::parse(supplied) != Some(otp.code) {
        return Err(Error::InvalidOtp);
    }
    if otp.is_expired(now) {
        return Err(Error::OtpExpired);
    }
    *slot = None;
    Ok(())
}

/// Requests a code for the account behind `identifier`.
///
/// Answers the same way whether the identifier is unknown, belongs to an
/// account that may not log in with a code, or got a code sent.
pub async fn request(global: &Global, identifier: &str) -> Result<(), Error> {
    request_at(global, identifier, Utc::now()).await
}

pub async fn request_at(
    global: &Global,
    identifier: &str,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    match global.store.account_by_identifier(identifier) {
        Some(account) => issue_at(global, &account.id, now).await,
        None => {
            tracing::debug!("otp requested for unknown identifier");
            Ok(())
        }
    }
}

/// Issues a code to an approved member and mails it.
///
/// Calls for any other account are silent no-ops.
///
/// # Errors
///
/// - Errors if the mail could not be delivered, since an undelivered
/// code is useless. The undelivered code is withdrawn and a code pending
/// before the call stays valid.
pub async fn issue(global: &Global, account: &Id) -> Result<(), Error> {
    issue_at(global, account, Utc::now()).await
}

pub async fn issue_at(global: &Global, account: &Id, now: DateTime<Utc>) -> Result<(), Error> {
    let mut issued = None;
    let mut previous = None;
    let result = global.store.update_account(account, &mut |a: &mut Account| {
        if a.standing() == Standing::Member(Status::Approved) {
            let otp = Otp::issue(now);
            previous = a.otp.replace(otp);
            issued = Some(otp);
        }
        Ok(())
    });
    let account = match result {
        Ok(account) => account,
        Err(Error::AccountNotFound) => return Ok(()),
        Err(err) => return Err(err),
    };
    let Some(otp) = issued else {
        tracing::debug!("otp requested for ineligible account {}", account.id);
        return Ok(());
    };

    let sent = mail::notify(
        global.mailer.as_ref(),
        &account.email,
        Notification::Otp {
            name: account.full_name.clone(),
            code: otp.code,
        },
    )
    .await;
    if let Err(err) = sent {
        // Withdraw the undelivered code unless a newer one replaced it meanwhile.
        let restored = global.store.update_account(&account.id, &mut |a: &mut Account| {
            if a.otp == Some(otp) {
                a.otp = previous;
            }
            Ok(())
        });
        if let Err(restore) = restored {
            tracing::error!("failed to withdraw undelivered otp of {}: {restore}", account.id);
        }
        return Err(err);
    }
    tracing::info!("otp issued for account {}", account.id);
    Ok(())
}

/// Verifies and consumes the pending code of an account.
///
/// Check and clear happen in one store update, so two concurrent
/// attempts with the same code cannot both succeed.
pub fn verify(global: &Global, account: &Id, supplied: &str) -> Result<Account, Error> {
    verify_at(global, account, supplied, Utc::now())
}

pub fn verify_at(
    global: &Global,
    account: &Id,
    supplied: &str,
    now: DateTime<Utc>,
) -> Result<Account, Error> {
    global
        .store
        .update_account(account, &mut |a: &mut Account| consume(&mut a.otp, supplied, now))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..1000 {
            let code = Code::new();
            assert!((Code::MIN..=Code::MAX).contains(&code.0));
            assert_eq!(code.to_string().len(), 6);
        }
    }

    #[test]
    fn code_parsing() {
        assert_eq!(Code::parse("123456"), Some(Code(123456)));
        assert_eq!(Code::parse(" 123456 "), Some(Code(123456)));
        assert_eq!(Code::parse("12345"), None);
        assert_eq!(Code::parse("1234567"), None);
        assert_eq!(Code::parse("12345a"), None);
        assert_eq!(Code::parse("+12345"), None);
    }

    #[test]
    fn expiry_is_fifteen_minutes() {
        let otp = Otp::issue(now());
        assert_eq!(otp.expire_at - now(), Duration::minutes(15));
    }

    #[test]
    fn consume_around_expiry() {
        let otp = Otp::issue(now());
        let code = otp.code.to_string();

        let mut slot = Some(otp);
        assert!(matches!(
            consume(&mut slot, &code, otp.expire_at + Duration::seconds(1)),
            Err(Error::OtpExpired)
        ));
        assert!(slot.is_some());

        consume(&mut slot, &code, otp.expire_at - Duration::seconds(1)).unwrap();
        assert!(slot.is_none());
    }

    #[test]
    fn consume_is_single_use() {
        let otp = Otp::issue(now());
        let code = otp.code.to_string();
        let mut slot = Some(otp);

        consume(&mut slot, &code, now()).unwrap();
        assert!(matches!(
            consume(&mut slot, &code, now()),
            Err(Error::InvalidOtp)
        ));
    }

    #[test]
    fn wrong_code_is_invalid_even_when_expired() {
        let otp = Otp { code: Code(111111), expire_at: now() };
        let mut slot = Some(otp);
        assert!(matches!(
            consume(&mut slot, "222222", now() + Duration::hours(1)),
            Err(Error::InvalidOtp)
        ));
        assert_eq!(slot, Some(otp));
    }
}
