//! Gaams and the admin assignment relation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use gaam_shared::gaam::*;
use gaam_shared::Id;

use crate::{
    account::{self, Account, Role},
    store::{self, Conflict, Store},
    Error, Global,
};

/// A community unit members register under.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Gaam {
    pub id: Id,
    /// Unique, case-insensitively.
    pub name: String,
    /// Unique, derived from the name.
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Gaam {
    /// Get the public view of this gaam.
    ///
    /// The legacy single-admin field is filled with the assigned admin
    /// with the smallest id.
    pub fn info(&self, store: &dyn Store) -> GaamInfo {
        GaamInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
            admin: store.gaam_admins(&self.id).into_iter().next(),
            created_at: self.created_at,
        }
    }
}

/// "This gaam admin may review registrations of this gaam."
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Assignment {
    pub gaam: Id,
    pub admin: Id,
}

/// Derives a slug from a gaam name.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `-` and trims separators from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Every gaam, for the registration form.
pub fn list(global: &Global) -> Vec<GaamInfo> {
    let store = global.store.as_ref();
    store.gaams().iter().map(|g| g.info(store)).collect()
}

/// Creates a gaam, optionally assigning an initial admin to it.
///
/// # Errors
///
/// - [`Error::Forbidden`] unless `actor` is a super admin.
/// - [`Error::AccountNotFound`] if `admin` is not a gaam admin.
/// - [`Conflict::GaamName`] if the name is taken.
pub fn create(
    global: &Global,
    actor: &Id,
    name: &str,
    admin: Option<&str>,
) -> Result<Gaam, Error> {
    let store = global.store.as_ref();
    account::require_super_admin(store, actor)?;
    let name = account::required("gaam name", name)?;
    let base = slugify(&name);
    if base.is_empty() {
        return Err(Error::Validation(
            "gaam name needs at least one letter or digit".to_owned(),
        ));
    }
    let admin = match admin.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(gaam_admin(store, raw)?.id),
        None => None,
    };

    // The slug probe and the insert are separate steps, so a concurrent
    // creation may take the probed slug first.
    const ATTEMPTS: usize = 8;
    for _ in 0..ATTEMPTS {
        let gaam = Gaam {
            id: crate::new_id(),
            name: name.clone(),
            slug: store::first_free(&base, "-", |s| store.slug_exists(s)),
            created_at: Utc::now(),
        };
        match store.insert_gaam(gaam.clone(), admin.as_ref()) {
            Ok(()) => {
                tracing::info!("gaam {} created as {} by {actor}", gaam.id, gaam.slug);
                return Ok(gaam);
            }
            Err(Error::Conflict(Conflict::Slug)) => continue,
            Err(err) => return Err(err),
        }
    }
    Err(Conflict::Slug.into())
}

/// Replaces the whole set of gaams assigned to a gaam admin.
///
/// Ids without a plausible shape are dropped first; an empty remainder
/// clears every assignment of the admin.
///
/// # Errors
///
/// - [`Error::Forbidden`] unless `actor` is a super admin.
/// - [`Error::AccountNotFound`] if `admin` is not a gaam admin.
/// - [`Error::GaamNotFound`] if any remaining id is unknown, in which
/// case no assignment changes.
pub fn set_assignments(
    global: &Global,
    actor: &Id,
    admin: &str,
    gaams: &[String],
) -> Result<Vec<Gaam>, Error> {
    let store = global.store.as_ref();
    account::require_super_admin(store, actor)?;
    let admin = gaam_admin(store, admin)?;

    let mut ids: Vec<Id> = gaams.iter().filter_map(|raw| Id::parse(raw)).collect();
    ids.sort();
    ids.dedup();
    store.replace_assignments(&admin.id, &ids)?;

    tracing::info!(
        "assignments of {} replaced with {} gaams by {actor}",
        admin.id,
        ids.len()
    );
    Ok(ids.iter().filter_map(|id| store.gaam(id)).collect())
}

/// The gaams assigned to a gaam admin.
///
/// Readable by the admin itself and by super admins.
pub fn admin_gaams(global: &Global, actor: &Id, admin: &str) -> Result<Vec<Gaam>, Error> {
    let store = global.store.as_ref();
    let acting = store.account(actor).ok_or(Error::Forbidden)?;
    let admin = gaam_admin(store, admin)?;
    if acting.role != Role::SuperAdmin && acting.id != admin.id {
        return Err(Error::Forbidden);
    }

    let mut gaams: Vec<Gaam> = store
        .assigned_gaams(&admin.id)
        .iter()
        .filter_map(|id| store.gaam(id))
        .collect();
    gaams.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(gaams)
}

/// Resolves a raw id to a gaam admin account.
fn gaam_admin(store: &dyn Store, raw: &str) -> Result<Account, Error> {
    Id::parse(raw)
        .and_then(|id| store.account(&id))
        .filter(|a| a.role == Role::GaamAdmin)
        .ok_or(Error::AccountNotFound)
}
