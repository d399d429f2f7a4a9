//! Workflow tests running against an in-memory store and a recording mailer.

mod auth;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use axum::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::{
    account::{credential, otp::Code, Account, Role, Status},
    config::Config,
    gaam::Gaam,
    mail::{Mailer, Notification},
    session::Sessions,
    store::{MemoryStore, Store},
    Error, Global,
};

/// A mailer keeping what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(lettre::Address, Notification)>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    /// Makes every following send fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(lettre::Address, Notification)> {
        self.sent.lock().clone()
    }

    /// The last one-time code mailed to `to`.
    pub fn last_otp(&self, to: &str) -> Option<Code> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find_map(|(address, notification)| match notification {
                Notification::Otp { code, .. } if address.to_string() == to => Some(*code),
                _ => None,
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &lettre::Address, notification: &Notification) -> Result<(), Error> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "relay unreachable",
            )
            .into());
        }
        self.sent.lock().push((to.clone(), notification.clone()));
        Ok(())
    }
}

pub struct Fixture {
    pub global: Global,
    pub mailer: Arc<RecordingMailer>,
}

impl Fixture {
    pub fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let config = Config::default();
        Self {
            global: Global {
                store: Arc::new(MemoryStore::new()),
                mailer: mailer.clone(),
                sessions: Arc::new(Sessions::new(config.session.expire_hours)),
                config: Arc::new(config),
            },
            mailer,
        }
    }

    #[inline]
    pub fn store(&self) -> &dyn Store {
        self.global.store.as_ref()
    }

    /// Inserts an approved admin logging in as `username` with `password`.
    pub fn admin(&self, username: &str, role: Role, password: &str) -> Account {
        let account = Account {
            id: crate::new_id(),
            full_name: username.to_owned(),
            email: format!("{username}@gaam.test").parse().unwrap(),
            username: username.to_owned(),
            password_hash: credential::hash_password(password).unwrap(),
            role,
            status: Status::Approved,
            gaam: None,
            created_at: Utc::now(),
            otp: None,
            verification: None,
        };
        self.store().insert_account(account.clone()).unwrap();
        account
    }

    pub fn gaam(&self, name: &str, admin: Option<&Account>) -> Gaam {
        let gaam = Gaam {
            id: crate::new_id(),
            name: name.to_owned(),
            slug: crate::gaam::slugify(name),
            created_at: Utc::now(),
        };
        self.store()
            .insert_gaam(gaam.clone(), admin.map(|a| &a.id))
            .unwrap();
        gaam
    }

    pub async fn register(&self, full_name: &str, email: &str, gaam: &Gaam) -> Account {
        crate::account::registration::submit(
            &self.global,
            full_name,
            &email.parse().unwrap(),
            gaam.id.as_str(),
        )
        .await
        .unwrap()
    }

    /// Registers a member and approves it as `reviewer`.
    pub async fn approved_member(
        &self,
        full_name: &str,
        email: &str,
        gaam: &Gaam,
        reviewer: &Account,
    ) -> Account {
        let member = self.register(full_name, email, gaam).await;
        crate::account::registration::review(
            &self.global,
            &reviewer.id,
            member.id.as_str(),
            Status::Approved,
            None,
        )
        .await
        .unwrap()
    }
}
