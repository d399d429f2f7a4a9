//! Login sessions and the request extractor resolving them.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use gaam_shared::Id;
use rand::Rng;

use crate::{Error, Global};

#[derive(Debug, Clone)]
struct Session {
    account: Id,
    expire_at: Option<DateTime<Utc>>,
}

impl Session {
    #[inline]
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.map_or(false, |at| at <= now)
    }
}

/// Session tokens issued on login.
pub struct Sessions {
    inner: DashMap<String, Session>,
    /// `0` means tokens never expire.
    expire_hours: u64,
}

impl Sessions {
    pub fn new(expire_hours: u64) -> Self {
        Self {
            inner: DashMap::new(),
            expire_hours,
        }
    }

    /// Issues a token for `account`, returning it with its expiry.
    pub fn issue(&self, account: &Id) -> (String, Option<DateTime<Utc>>) {
        self.issue_at(account, Utc::now())
    }

    pub fn issue_at(&self, account: &Id, now: DateTime<Utc>) -> (String, Option<DateTime<Utc>>) {
        // Lifetimes past a century are treated as never expiring.
        const MAX_EXPIRE_HOURS: u64 = 24 * 365 * 100;
        let expire_at = if self.expire_hours > 0 && self.expire_hours <= MAX_EXPIRE_HOURS {
            now.checked_add_signed(Duration::hours(self.expire_hours as i64))
        } else {
            None
        };
        let salt: u64 = rand::thread_rng().gen();
        let token = sha256::digest(format!("{account}-{now:?}-{salt:x}"));
        self.inner.insert(
            token.clone(),
            Session {
                account: account.clone(),
                expire_at,
            },
        );
        (token, expire_at)
    }

    /// Whether `token` is a live session of `account`.
    ///
    /// An expired token is dropped on the way.
    pub fn resolve(&self, account: &Id, token: &str) -> bool {
        self.resolve_at(account, token, Utc::now())
    }

    pub fn resolve_at(&self, account: &Id, token: &str, now: DateTime<Utc>) -> bool {
        if self
            .inner
            .remove_if(token, |_, session| session.is_expired(now))
            .is_some()
        {
            return false;
        }
        self.inner
            .get(token)
            .map_or(false, |session| &session.account == account)
    }

    /// Ends a session, returning whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.inner.remove(token).is_some()
    }

    /// Drops every expired session.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, session| !session.is_expired(now));
        before.saturating_sub(self.inner.len())
    }
}

/// The logged-in caller of a request, read from the `AccountId` and
/// `Token` headers.
#[derive(Debug, Clone)]
pub struct Auth {
    pub account: Id,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Global> for Auth {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &Global) -> Result<Self, Self::Rejection> {
        let (Some(account), Some(token)) =
            (parts.headers.get("AccountId"), parts.headers.get("Token"))
        else {
            return Err(Error::NotLoggedIn);
        };
        let account = Id::parse(account.to_str()?).ok_or(Error::InvalidAuthHeader)?;
        let token = token.to_str()?.trim().to_owned();
        if token.is_empty() {
            return Err(Error::InvalidAuthHeader);
        }

        if state.sessions.resolve(&account, &token) {
            Ok(Self { account, token })
        } else {
            Err(Error::NotLoggedIn)
        }
    }
}
