//! The record store the workflow runs against.

mod memory;

use std::{collections::HashSet, fmt::Display};

use gaam_shared::Id;

pub use memory::MemoryStore;

use crate::{
    account::{Account, Role, Status},
    gaam::Gaam,
    Error,
};

/// A uniqueness constraint a write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Email,
    Username,
    GaamName,
    Slug,
}

impl Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Conflict::Email => "email is already registered",
            Conflict::Username => "username is already taken",
            Conflict::GaamName => "a gaam with this name already exists",
            Conflict::Slug => "gaam slug is already taken",
        })
    }
}

/// Filters for listing member accounts.
#[derive(Debug, Default, Clone)]
pub struct MemberQuery {
    pub status: Option<Status>,
    pub gaam: Option<Id>,
    /// Restricts the listing to these gaams. `None` means every gaam.
    pub scope: Option<HashSet<Id>>,
}

impl MemberQuery {
    /// Whether `account` is a member matching this query.
    pub fn matches(&self, account: &Account) -> bool {
        account.role == Role::Member
            && self.status.map_or(true, |s| s == account.status)
            && self
                .gaam
                .as_ref()
                .map_or(true, |g| account.gaam.as_ref() == Some(g))
            && self.scope.as_ref().map_or(true, |scope| {
                account.gaam.as_ref().map_or(false, |g| scope.contains(g))
            })
    }
}

/// Accounts, gaams and the admin assignment relation.
///
/// Every write is atomic: a reader observes either none or all of it.
pub trait Store: Send + Sync {
    fn account(&self, id: &Id) -> Option<Account>;

    /// Looks an account up by username or email, case-insensitively.
    fn account_by_identifier(&self, identifier: &str) -> Option<Account>;

    fn account_by_email(&self, email: &lettre::Address) -> Option<Account>;

    fn username_exists(&self, username: &str) -> bool;

    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// - [`Conflict::Email`] or [`Conflict::Username`] if either is taken.
    fn insert_account(&self, account: Account) -> Result<(), Error>;

    /// Applies `f` to a copy of an account and commits the copy if `f`
    /// succeeds, returning the committed account.
    ///
    /// # Errors
    ///
    /// - [`Error::AccountNotFound`] if there is no such account.
    /// - Any error `f` returns, in which case nothing is committed.
    fn update_account(
        &self,
        id: &Id,
        f: &mut dyn FnMut(&mut Account) -> Result<(), Error>,
    ) -> Result<Account, Error>;

    /// Member accounts matching `query`, newest first.
    fn members(&self, query: &MemberQuery) -> Vec<Account>;

    fn gaam(&self, id: &Id) -> Option<Gaam>;

    /// Every gaam, ordered by name.
    fn gaams(&self) -> Vec<Gaam>;

    fn slug_exists(&self, slug: &str) -> bool;

    /// Inserts a gaam, assigning `admin` to it in the same write.
    ///
    /// # Errors
    ///
    /// - [`Conflict::GaamName`] or [`Conflict::Slug`] if either is taken.
    fn insert_gaam(&self, gaam: Gaam, admin: Option<&Id>) -> Result<(), Error>;

    /// Ids of the gaams assigned to an admin.
    fn assigned_gaams(&self, admin: &Id) -> Vec<Id>;

    /// Ids of the admins assigned to a gaam, ascending.
    fn gaam_admins(&self, gaam: &Id) -> Vec<Id>;

    fn is_assigned(&self, admin: &Id, gaam: &Id) -> bool;

    /// Replaces the whole assignment set of an admin.
    ///
    /// # Errors
    ///
    /// - [`Error::GaamNotFound`] if any of `gaams` does not exist,
    /// in which case the previous set is kept.
    fn replace_assignments(&self, admin: &Id, gaams: &[Id]) -> Result<(), Error>;
}

/// Returns `base` if it is free, otherwise `base` followed by `separator`
/// and the smallest integer from 1 that makes it free.
pub fn first_free(base: &str, separator: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_owned();
    }
    (1u64..)
        .map(|n| format!("{base}{separator}{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_owned())
}
