//! The member registration workflow.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use gaam_shared::{Id, Page};

use super::{credential, transition, Account, AccountInfo, Role, Standing, Status, Verification};
use crate::{
    mail::{self, Credentials, Notification},
    store::MemberQuery,
    Error, Global,
};

/// The largest page [`list`] returns.
pub const MAX_LIMIT: usize = 100;

/// Filters and position of a registration listing.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub status: Option<Status>,
    /// Raw gaam id to narrow the listing to.
    pub gaam: Option<String>,
    /// 1-based.
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            status: None,
            gaam: None,
            page: 1,
            limit: 10,
        }
    }
}

/// Stores a pending member registration under a gaam.
///
/// The account gets a derived username and a random password that is
/// replaced on approval. The "registration received" mail is best-effort.
///
/// # Errors
///
/// - [`Error::GaamNotFound`] if the gaam does not exist.
/// - [`Error::DuplicateAccount`] if the email or the username derived from
/// it is taken.
pub async fn submit(
    global: &Global,
    full_name: &str,
    email: &lettre::Address,
    gaam: &str,
) -> Result<Account, Error> {
    let store = global.store.as_ref();
    let full_name = super::required("full name", full_name)?;
    let gaam = Id::parse(gaam).ok_or_else(|| Error::Validation("malformed gaam id".to_owned()))?;
    if store.gaam(&gaam).is_none() {
        return Err(Error::GaamNotFound {
            requested: 1,
            resolved: 0,
        });
    }

    let base = credential::username_from_email(email);
    if store.account_by_email(email).is_some() || store.username_exists(&base) {
        return Err(Error::DuplicateAccount);
    }
    let password_hash = credential::hash_password(&credential::generate_password(
        global.config.credentials.password_length,
    ))?;

    let now = Utc::now();
    let account = super::insert_with_username(store, &base, |username| Account {
        id: crate::new_id(),
        full_name: full_name.clone(),
        email: email.clone(),
        username,
        password_hash: password_hash.clone(),
        role: Role::Member,
        status: Status::Pending,
        gaam: Some(gaam.clone()),
        created_at: now,
        otp: None,
        verification: None,
    })?;
    tracing::info!("registration {} received for gaam {gaam}", account.id);

    mail::notify(
        global.mailer.as_ref(),
        &account.email,
        Notification::RegistrationReceived {
            name: account.full_name.clone(),
        },
    )
    .await?;
    Ok(account)
}

/// Decides a pending registration.
///
/// Approval replaces the password with a freshly generated one and mails
/// it; rejection keeps the password. Either mail is best-effort, the
/// committed status is the outcome.
///
/// # Errors
///
/// - [`Error::Forbidden`] unless `actor` is a super admin, or a gaam admin
/// assigned to the target's gaam.
/// - [`Error::AccountNotFound`] if the target is not a member.
/// - [`Error::MissingGaamAssignment`] if the target has no gaam.
/// - [`Error::InvalidTransition`] if the target is not pending or the
/// decision is `PENDING`.
pub async fn review(
    global: &Global,
    actor: &Id,
    target: &str,
    decision: Status,
    notes: Option<&str>,
) -> Result<Account, Error> {
    review_at(global, actor, target, decision, notes, Utc::now()).await
}

pub async fn review_at(
    global: &Global,
    actor: &Id,
    target: &str,
    decision: Status,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Account, Error> {
    let store = global.store.as_ref();
    let acting = store.account(actor).ok_or(Error::Forbidden)?;
    if acting.role == Role::Member {
        return Err(Error::Forbidden);
    }
    let target = Id::parse(target)
        .and_then(|id| store.account(&id))
        .filter(|a| a.role == Role::Member)
        .ok_or(Error::AccountNotFound)?;
    let gaam = target.gaam.clone().ok_or(Error::MissingGaamAssignment)?;
    match acting.standing() {
        Standing::SuperAdmin => {}
        Standing::GaamAdmin if store.is_assigned(&acting.id, &gaam) => {}
        _ => return Err(Error::Forbidden),
    }

    // Checked again under the store lock below; this one spares the hashing.
    transition(target.status, decision)?;

    let notes = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned);
    let password = (decision == Status::Approved)
        .then(|| credential::generate_password(global.config.credentials.password_length));
    let password_hash = password
        .as_deref()
        .map(credential::hash_password)
        .transpose()?;

    let account = store.update_account(&target.id, &mut |a: &mut Account| {
        a.status = transition(a.status, decision)?;
        if let Some(ref hash) = password_hash {
            a.password_hash = hash.clone();
        }
        a.verification = Some(Verification {
            at: now,
            by: acting.id.clone(),
            notes: notes.clone(),
        });
        Ok(())
    })?;
    tracing::info!(
        "registration {} marked {} by {}",
        account.id,
        account.status,
        acting.id
    );

    mail::notify(
        global.mailer.as_ref(),
        &account.email,
        Notification::StatusChange {
            name: account.full_name.clone(),
            status: account.status,
            credentials: password.map(|password| Credentials {
                username: account.username.clone(),
                password,
            }),
            notes,
        },
    )
    .await?;
    Ok(account)
}

/// Lists member registrations visible to `actor`.
///
/// Super admins see every gaam; gaam admins see the union of their
/// assigned gaams, which is an empty page if they have none.
///
/// # Errors
///
/// - [`Error::Forbidden`] if `actor` is not an admin.
pub fn list(global: &Global, actor: &Id, query: ListQuery) -> Result<Page<AccountInfo>, Error> {
    let store = global.store.as_ref();
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, MAX_LIMIT);
    let gaam = match query.gaam.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        Some(raw) => Some(
            Id::parse(raw).ok_or_else(|| Error::Validation("malformed gaam id".to_owned()))?,
        ),
        None => None,
    };

    let acting = store.account(actor).ok_or(Error::Forbidden)?;
    let scope = match acting.standing() {
        Standing::SuperAdmin => None,
        Standing::GaamAdmin => {
            let assigned: HashSet<Id> = store.assigned_gaams(&acting.id).into_iter().collect();
            if assigned.is_empty() {
                return Ok(Page::empty(page, limit));
            }
            Some(assigned)
        }
        Standing::Member(_) => return Err(Error::Forbidden),
    };

    let members = store.members(&MemberQuery {
        status: query.status,
        gaam,
        scope,
    });
    Ok(Page {
        total: members.len(),
        items: members
            .iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .map(Account::info)
            .collect(),
        page,
        limit,
    })
}
