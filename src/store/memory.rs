use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use gaam_shared::Id;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{Conflict, MemberQuery, Store};
use crate::{
    account::Account,
    gaam::{Assignment, Gaam},
    Error,
};

const ACCOUNTS_DIR: &str = "accounts";
const GAAMS_DIR: &str = "gaams";
const ASSIGNMENTS_FILE: &str = "assignments.toml";

/// Every table and its unique indexes.
#[derive(Default)]
struct Tables {
    accounts: HashMap<Id, Account>,
    /// Lowercased username to account.
    usernames: HashMap<String, Id>,
    /// Lowercased email to account.
    emails: HashMap<String, Id>,
    gaams: HashMap<Id, Gaam>,
    /// Lowercased gaam name to gaam.
    gaam_names: HashMap<String, Id>,
    slugs: HashMap<String, Id>,
    assignments: BTreeSet<Assignment>,
}

impl Tables {
    fn index_account(&mut self, account: Account) {
        self.usernames
            .insert(key(&account.username), account.id.clone());
        self.emails
            .insert(email_key(&account.email), account.id.clone());
        self.accounts.insert(account.id.clone(), account);
    }

    fn index_gaam(&mut self, gaam: Gaam) {
        self.gaam_names.insert(key(&gaam.name), gaam.id.clone());
        self.slugs.insert(gaam.slug.clone(), gaam.id.clone());
        self.gaams.insert(gaam.id.clone(), gaam);
    }
}

#[derive(Serialize, Deserialize, Default)]
struct AssignmentFile {
    #[serde(default)]
    assignment: Vec<Assignment>,
}

#[inline]
fn key(value: &str) -> String {
    value.trim().to_lowercase()
}

#[inline]
fn email_key(email: &lettre::Address) -> String {
    key(email.as_ref())
}

/// A store holding every table in memory behind a single lock.
///
/// With a data directory, each committed record is also written to disk as
/// toml before the write becomes visible, and read back by [`Self::open`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    dir: Option<PathBuf>,
}

impl MemoryStore {
    /// Creates an empty store that never touches the filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store persisted in `dir`, creating the directory layout if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_owned();
        fs::create_dir_all(dir.join(ACCOUNTS_DIR))?;
        fs::create_dir_all(dir.join(GAAMS_DIR))?;

        let mut tables = Tables::default();
        for account in read_records::<Account>(&dir.join(ACCOUNTS_DIR))? {
            tables.index_account(account);
        }
        for gaam in read_records::<Gaam>(&dir.join(GAAMS_DIR))? {
            tables.index_gaam(gaam);
        }
        let path = dir.join(ASSIGNMENTS_FILE);
        if path.exists() {
            let file: AssignmentFile = toml::from_str(&fs::read_to_string(path)?)?;
            tables.assignments = file.assignment.into_iter().collect();
        }

        tracing::info!(
            "loaded {} accounts, {} gaams and {} assignments from {}",
            tables.accounts.len(),
            tables.gaams.len(),
            tables.assignments.len(),
            dir.display()
        );
        Ok(Self {
            tables: RwLock::new(tables),
            dir: Some(dir),
        })
    }

    fn save_account(&self, account: &Account) -> Result<(), Error> {
        match self.dir {
            Some(ref dir) => write_record(
                &dir.join(ACCOUNTS_DIR).join(format!("{}.toml", account.id)),
                account,
            ),
            None => Ok(()),
        }
    }

    fn save_gaam(&self, gaam: &Gaam) -> Result<(), Error> {
        match self.dir {
            Some(ref dir) => write_record(
                &dir.join(GAAMS_DIR).join(format!("{}.toml", gaam.id)),
                gaam,
            ),
            None => Ok(()),
        }
    }

    fn save_assignments(&self, assignments: &BTreeSet<Assignment>) -> Result<(), Error> {
        match self.dir {
            Some(ref dir) => write_record(
                &dir.join(ASSIGNMENTS_FILE),
                &AssignmentFile {
                    assignment: assignments.iter().cloned().collect(),
                },
            ),
            None => Ok(()),
        }
    }
}

fn read_records<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, Error> {
    let mut records = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "toml") {
            records.push(toml::from_str(&fs::read_to_string(&path)?)?);
        }
    }
    Ok(records)
}

/// Writes a record through a temporary file so a crash never leaves it half written.
fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, toml::to_string(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl Store for MemoryStore {
    fn account(&self, id: &Id) -> Option<Account> {
        self.tables.read().accounts.get(id).cloned()
    }

    fn account_by_identifier(&self, identifier: &str) -> Option<Account> {
        let k = key(identifier);
        let tables = self.tables.read();
        tables
            .usernames
            .get(&k)
            .or_else(|| tables.emails.get(&k))
            .and_then(|id| tables.accounts.get(id))
            .cloned()
    }

    fn account_by_email(&self, email: &lettre::Address) -> Option<Account> {
        let tables = self.tables.read();
        tables
            .emails
            .get(&email_key(email))
            .and_then(|id| tables.accounts.get(id))
            .cloned()
    }

    fn username_exists(&self, username: &str) -> bool {
        self.tables.read().usernames.contains_key(&key(username))
    }

    fn insert_account(&self, account: Account) -> Result<(), Error> {
        let mut tables = self.tables.write();
        if tables.emails.contains_key(&email_key(&account.email)) {
            return Err(Conflict::Email.into());
        }
        if tables.usernames.contains_key(&key(&account.username)) {
            return Err(Conflict::Username.into());
        }
        self.save_account(&account)?;
        tables.index_account(account);
        Ok(())
    }

    fn update_account(
        &self,
        id: &Id,
        f: &mut dyn FnMut(&mut Account) -> Result<(), Error>,
    ) -> Result<Account, Error> {
        let mut tables = self.tables.write();
        let current = tables.accounts.get(id).ok_or(Error::AccountNotFound)?;
        let mut copy = current.clone();
        f(&mut copy)?;
        if copy.id != current.id || copy.email != current.email || copy.username != current.username
        {
            return Err(Error::Validation(
                "account identity fields cannot be updated".to_owned(),
            ));
        }
        if copy != *current {
            self.save_account(&copy)?;
            tables.accounts.insert(id.clone(), copy.clone());
        }
        Ok(copy)
    }

    fn members(&self, query: &MemberQuery) -> Vec<Account> {
        let mut members: Vec<Account> = self
            .tables
            .read()
            .accounts
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        members
    }

    fn gaam(&self, id: &Id) -> Option<Gaam> {
        self.tables.read().gaams.get(id).cloned()
    }

    fn gaams(&self) -> Vec<Gaam> {
        let mut gaams: Vec<Gaam> = self.tables.read().gaams.values().cloned().collect();
        gaams.sort_by(|a, b| a.name.cmp(&b.name));
        gaams
    }

    fn slug_exists(&self, slug: &str) -> bool {
        self.tables.read().slugs.contains_key(slug)
    }

    fn insert_gaam(&self, gaam: Gaam, admin: Option<&Id>) -> Result<(), Error> {
        let mut tables = self.tables.write();
        if tables.gaam_names.contains_key(&key(&gaam.name)) {
            return Err(Conflict::GaamName.into());
        }
        if tables.slugs.contains_key(&gaam.slug) {
            return Err(Conflict::Slug.into());
        }
        if let Some(admin) = admin {
            if !tables.accounts.contains_key(admin) {
                return Err(Error::AccountNotFound);
            }
        }

        self.save_gaam(&gaam)?;
        if let Some(admin) = admin {
            let mut assignments = tables.assignments.clone();
            assignments.insert(Assignment {
                gaam: gaam.id.clone(),
                admin: admin.clone(),
            });
            self.save_assignments(&assignments)?;
            tables.assignments = assignments;
        }
        tables.index_gaam(gaam);
        Ok(())
    }

    fn assigned_gaams(&self, admin: &Id) -> Vec<Id> {
        self.tables
            .read()
            .assignments
            .iter()
            .filter(|a| a.admin == *admin)
            .map(|a| a.gaam.clone())
            .collect()
    }

    fn gaam_admins(&self, gaam: &Id) -> Vec<Id> {
        self.tables
            .read()
            .assignments
            .iter()
            .filter(|a| a.gaam == *gaam)
            .map(|a| a.admin.clone())
            .collect()
    }

    fn is_assigned(&self, admin: &Id, gaam: &Id) -> bool {
        self.tables.read().assignments.contains(&Assignment {
            gaam: gaam.clone(),
            admin: admin.clone(),
        })
    }

    fn replace_assignments(&self, admin: &Id, gaams: &[Id]) -> Result<(), Error> {
        let requested: HashSet<&Id> = gaams.iter().collect();
        let mut tables = self.tables.write();
        let resolved = requested
            .iter()
            .filter(|g| tables.gaams.contains_key(**g))
            .count();
        if resolved != requested.len() {
            return Err(Error::GaamNotFound {
                requested: requested.len(),
                resolved,
            });
        }

        let assignments: BTreeSet<Assignment> = tables
            .assignments
            .iter()
            .filter(|a| a.admin != *admin)
            .cloned()
            .chain(requested.into_iter().map(|gaam| Assignment {
                gaam: gaam.clone(),
                admin: admin.clone(),
            }))
            .collect();
        self.save_assignments(&assignments)?;
        tables.assignments = assignments;
        Ok(())
    }
}
