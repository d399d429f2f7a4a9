//! Admin account management.

use chrono::Utc;
use gaam_shared::Id;

use super::{credential, Account, Role, Status};
use crate::{
    mail::{self, Credentials, Notification},
    Error, Global,
};

fn admin_account(
    username: String,
    full_name: &str,
    email: &lettre::Address,
    role: Role,
    password_hash: &str,
) -> Account {
    Account {
        id: crate::new_id(),
        full_name: full_name.to_owned(),
        email: email.clone(),
        username,
        password_hash: password_hash.to_owned(),
        role,
        status: Status::Approved,
        gaam: None,
        created_at: Utc::now(),
        otp: None,
        verification: None,
    }
}

/// Creates an approved admin account with a generated password and
/// mails the credentials, best-effort.
///
/// # Errors
///
/// - [`Error::Forbidden`] unless `actor` is a super admin.
/// - [`Error::Validation`] if `role` is [`Role::Member`].
/// - [`Error::DuplicateAccount`] if the email is taken.
pub async fn create_admin(
    global: &Global,
    actor: &Id,
    full_name: &str,
    email: &lettre::Address,
    role: Role,
) -> Result<Account, Error> {
    let store = global.store.as_ref();
    super::require_super_admin(store, actor)?;
    if role == Role::Member {
        return Err(Error::Validation(
            "members are created through registration".to_owned(),
        ));
    }
    let full_name = super::required("full name", full_name)?;
    if store.account_by_email(email).is_some() {
        return Err(Error::DuplicateAccount);
    }

    let password = credential::generate_password(global.config.credentials.password_length);
    let password_hash = credential::hash_password(&password)?;
    let account = super::insert_with_username(
        store,
        &credential::username_from_email(email),
        |username| admin_account(username, &full_name, email, role, &password_hash),
    )?;
    tracing::info!("{role} account {} created by {actor}", account.id);

    mail::notify(
        global.mailer.as_ref(),
        &account.email,
        Notification::AdminCredentials {
            name: account.full_name.clone(),
            credentials: Credentials {
                username: account.username.clone(),
                password,
            },
        },
    )
    .await?;
    Ok(account)
}

/// Creates the configured super admin unless its email is registered.
pub fn bootstrap_super_admin(global: &Global) -> Result<Option<Account>, Error> {
    let Some(ref config) = global.config.super_admin else {
        return Ok(None);
    };
    let store = global.store.as_ref();
    if store.account_by_email(&config.email).is_some() {
        tracing::debug!("super admin {} already present", config.email);
        return Ok(None);
    }

    let full_name = super::required("super admin full name", &config.full_name)?;
    let password_hash = credential::hash_password(&config.password)?;
    let account = super::insert_with_username(
        store,
        &credential::username_from_email(&config.email),
        |username| {
            admin_account(
                username,
                &full_name,
                &config.email,
                Role::SuperAdmin,
                &password_hash,
            )
        },
    )?;
    tracing::info!("bootstrapped super admin {} as {}", account.id, account.username);
    Ok(Some(account))
}
